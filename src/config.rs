// ⚙️ Configuration - optional dashboard.toml, every field defaulted

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::engine::RenderOptions;
use crate::export::DEFAULT_COUNTRY_SUFFIX;
use crate::selection::ChartKinds;

pub const CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Raw HDX export read by `clean`
    pub raw_input: PathBuf,
    /// Cleaned table written by `clean`, read by every view
    pub cleaned_output: PathBuf,
    /// Where exports land
    pub export_dir: PathBuf,
    pub country_suffix: String,
    pub chart_kinds: ChartKinds,
    pub server_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            raw_input: PathBuf::from("social-protection-and-labor_lka.csv"),
            cleaned_output: PathBuf::from("cleaned_data.csv"),
            export_dir: PathBuf::from("exports"),
            country_suffix: DEFAULT_COUNTRY_SUFFIX.to_string(),
            chart_kinds: ChartKinds::All,
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl DashboardConfig {
    /// `dashboard.toml` from the working directory, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            chart_kinds: self.chart_kinds,
            country_suffix: self.country_suffix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = DashboardConfig::from_toml(
            r#"
            cleaned_output = "data/cleaned.csv"
            chart_kinds = "line-bar"
            "#,
        )
        .unwrap();

        assert_eq!(config.cleaned_output, PathBuf::from("data/cleaned.csv"));
        assert_eq!(config.chart_kinds, ChartKinds::LineBar);
        assert_eq!(config.country_suffix, "SriLanka");
        assert_eq!(config.render_options().chart_kinds, ChartKinds::LineBar);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(DashboardConfig::from_toml("colour = \"red\"").is_err());
    }
}
