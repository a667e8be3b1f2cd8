// ⬇️ Export - filtered detail rows as a downloadable CSV

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::table::{write_rows, CleanedRecord, TableSchema};
use crate::taxonomy::Indicator;

pub const DEFAULT_COUNTRY_SUFFIX: &str = "SriLanka";

/// `{indicator name, whitespace → '_'}_{suffix}.csv`
pub fn export_filename(indicator: Indicator, country_suffix: &str) -> String {
    let stem: String = indicator
        .name()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{}_{}.csv", stem, country_suffix)
}

/// An export ready to hand out: file name plus UTF-8 CSV body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportFile {
    pub filename: String,
    pub mime: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn build(filename: String, schema: &TableSchema, rows: &[CleanedRecord]) -> Result<ExportFile> {
        let mut bytes = Vec::new();
        write_rows(schema, rows, &mut bytes)?;
        Ok(ExportFile {
            filename,
            mime: "text/csv",
            bytes,
        })
    }

    /// Write into `dir` under the export's own name.
    pub fn write_into(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), "export written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_replaces_every_space() {
        let name = export_filename(Indicator::LaborForceParticipation, DEFAULT_COUNTRY_SUFFIX);
        assert_eq!(
            name,
            "Labor_force_participation_rate,_total_(%_of_total_population_ages_15+)_(modeled_ILO_estimate)_SriLanka.csv"
        );
        assert!(!name.contains(' '));
    }

    #[test]
    fn test_build_and_write() {
        let rows = vec![
            CleanedRecord::new(Indicator::CoverageUrban.name(), 2019, Some(41.5)),
            CleanedRecord::new(Indicator::CoverageUrban.name(), 2020, None),
        ];
        let export = ExportFile::build(
            export_filename(Indicator::CoverageUrban, "LKA"),
            &TableSchema::canonical(),
            &rows,
        )
        .unwrap();

        let body = String::from_utf8(export.bytes.clone()).unwrap();
        assert_eq!(
            body,
            "Indicator Name,Year,Value\n\
             Coverage (%) -All Social Protection and Labor -urban,2019,41.5\n\
             Coverage (%) -All Social Protection and Labor -urban,2020,\n"
        );

        let dir = tempfile::tempdir().unwrap();
        let path = export.write_into(dir.path()).unwrap();
        assert!(path.ends_with("Coverage_(%)_-All_Social_Protection_and_Labor_-urban_LKA.csv"));
        assert_eq!(std::fs::read(path).unwrap(), export.bytes);
    }
}
