// 🗂️ Indicator Taxonomy - sections, indicators and their descriptions
//
// Closed vocabulary: every indicator the dashboard can chart is a variant here,
// so a selection can never name something outside the taxonomy.

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

/// Shown when an indicator name has no entry in the description table.
pub const NO_DESCRIPTION: &str = "No description available for this indicator.";

// ============================================================================
// SECTIONS
// ============================================================================

/// Thematic grouping, the first-level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    UnemploymentLaborParticipation,
    EmploymentBySector,
    SocialProtectionCoverage,
    PovertyReductionImpact,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::UnemploymentLaborParticipation,
        Section::EmploymentBySector,
        Section::SocialProtectionCoverage,
        Section::PovertyReductionImpact,
    ];

    /// Human-readable name for display
    pub fn title(&self) -> &'static str {
        match self {
            Section::UnemploymentLaborParticipation => "Unemployment & Labor Participation",
            Section::EmploymentBySector => "Employment by Sector",
            Section::SocialProtectionCoverage => "Social Protection Coverage",
            Section::PovertyReductionImpact => "Poverty Reduction Impact",
        }
    }

    /// Short code used on the command line and in query strings
    pub fn slug(&self) -> &'static str {
        match self {
            Section::UnemploymentLaborParticipation => "unemployment-labor-participation",
            Section::EmploymentBySector => "employment-by-sector",
            Section::SocialProtectionCoverage => "social-protection-coverage",
            Section::PovertyReductionImpact => "poverty-reduction-impact",
        }
    }

    /// Members in taxonomy order (the order the overview charts use).
    pub fn indicators(&self) -> &'static [Indicator] {
        use Indicator::*;
        match self {
            Section::UnemploymentLaborParticipation => {
                &[UnemploymentTotal, LaborForceParticipation]
            }
            Section::EmploymentBySector => {
                &[EmploymentAgriculture, EmploymentIndustry, EmploymentServices]
            }
            Section::SocialProtectionCoverage => {
                &[CoverageTotal, CoverageExtremePoor, CoverageRural, CoverageUrban]
            }
            Section::PovertyReductionImpact => {
                &[PovertyGapReduction, PovertyHeadcountReduction, GiniReduction]
            }
        }
    }

    /// Options offered once this section is chosen: members sorted by name.
    pub fn indicator_options(&self) -> Vec<Indicator> {
        let mut options = self.indicators().to_vec();
        options.sort_by_key(|i| i.name());
        options
    }

    pub fn contains(&self, indicator: Indicator) -> bool {
        self.indicators().contains(&indicator)
    }

    /// Accepts the slug or the display title.
    pub fn parse(s: &str) -> Result<Section, SelectionError> {
        let s = s.trim();
        Section::ALL
            .into_iter()
            .find(|sec| sec.slug() == s || sec.title() == s)
            .ok_or_else(|| SelectionError::UnknownSection(s.to_string()))
    }
}

// ============================================================================
// INDICATORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Indicator {
    UnemploymentTotal,
    LaborForceParticipation,
    EmploymentAgriculture,
    EmploymentIndustry,
    EmploymentServices,
    CoverageTotal,
    CoverageExtremePoor,
    CoverageRural,
    CoverageUrban,
    PovertyGapReduction,
    PovertyHeadcountReduction,
    GiniReduction,
}

impl Indicator {
    pub const ALL: [Indicator; 12] = [
        Indicator::UnemploymentTotal,
        Indicator::LaborForceParticipation,
        Indicator::EmploymentAgriculture,
        Indicator::EmploymentIndustry,
        Indicator::EmploymentServices,
        Indicator::CoverageTotal,
        Indicator::CoverageExtremePoor,
        Indicator::CoverageRural,
        Indicator::CoverageUrban,
        Indicator::PovertyGapReduction,
        Indicator::PovertyHeadcountReduction,
        Indicator::GiniReduction,
    ];

    /// Exact `Indicator Name` as stored in the cleaned table
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::UnemploymentTotal => {
                "Unemployment, total (% of total labor force) (modeled ILO estimate)"
            }
            Indicator::LaborForceParticipation => {
                "Labor force participation rate, total (% of total population ages 15+) (modeled ILO estimate)"
            }
            Indicator::EmploymentAgriculture => {
                "Employment in agriculture (% of total employment) (modeled ILO estimate)"
            }
            Indicator::EmploymentIndustry => {
                "Employment in industry (% of total employment) (modeled ILO estimate)"
            }
            Indicator::EmploymentServices => {
                "Employment in services (% of total employment) (modeled ILO estimate)"
            }
            Indicator::CoverageTotal => {
                "Coverage of social protection and labor programs (% of population)"
            }
            Indicator::CoverageExtremePoor => {
                "Coverage in extreme poor (<$2.15 a day) (%) -All Social Protection and Labor"
            }
            Indicator::CoverageRural => "Coverage (%) -All Social Protection and Labor -rural",
            Indicator::CoverageUrban => "Coverage (%) -All Social Protection and Labor -urban",
            Indicator::PovertyGapReduction => {
                "Poverty Gap reduction (%) - All Social Protection and Labor -1st quintile (poorest)"
            }
            Indicator::PovertyHeadcountReduction => {
                "Poverty Headcount reduction (%) - All Social Protection and Labor -1st quintile (poorest)"
            }
            Indicator::GiniReduction => {
                "Gini inequality index reduction (%) - All Social Protection and Labor"
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Indicator::UnemploymentTotal => {
                "This shows the share of the labor force that is unemployed, based on ILO modeling."
            }
            Indicator::LaborForceParticipation => {
                "This represents the percentage of the working-age population (15+) that is actively working or seeking work."
            }
            Indicator::EmploymentAgriculture => {
                "This measures the proportion of employed people working in the agriculture sector."
            }
            Indicator::EmploymentIndustry => {
                "This indicates the share of jobs in the industrial sector, including manufacturing and construction."
            }
            Indicator::EmploymentServices => {
                "This shows the portion of the workforce employed in services such as retail, finance, and education."
            }
            Indicator::CoverageTotal => {
                "This shows the percentage of the population covered by at least one social protection or labor program."
            }
            Indicator::CoverageExtremePoor => {
                "This shows what percentage of people living below $2.15/day are covered by social protection programs."
            }
            Indicator::CoverageRural => {
                "This represents social protection coverage for people in rural areas."
            }
            Indicator::CoverageUrban => {
                "This represents social protection coverage for people in urban areas."
            }
            Indicator::PovertyGapReduction => {
                "This measures the poverty gap reduction for the bottom 20% of the income distribution — the 'poorest' quintile in the country."
            }
            Indicator::PovertyHeadcountReduction => {
                "This shows how social protection programs reduce the number of people living in poverty (headcount) in the poorest 20%."
            }
            Indicator::GiniReduction => {
                "This shows how much social protection programs reduce income inequality, using the Gini index."
            }
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Indicator::UnemploymentTotal => "unemployment-total",
            Indicator::LaborForceParticipation => "labor-force-participation",
            Indicator::EmploymentAgriculture => "employment-agriculture",
            Indicator::EmploymentIndustry => "employment-industry",
            Indicator::EmploymentServices => "employment-services",
            Indicator::CoverageTotal => "coverage-total",
            Indicator::CoverageExtremePoor => "coverage-extreme-poor",
            Indicator::CoverageRural => "coverage-rural",
            Indicator::CoverageUrban => "coverage-urban",
            Indicator::PovertyGapReduction => "poverty-gap-reduction",
            Indicator::PovertyHeadcountReduction => "poverty-headcount-reduction",
            Indicator::GiniReduction => "gini-reduction",
        }
    }

    /// The one section listing this indicator.
    pub fn section(&self) -> Section {
        use Indicator::*;
        match self {
            UnemploymentTotal | LaborForceParticipation => Section::UnemploymentLaborParticipation,
            EmploymentAgriculture | EmploymentIndustry | EmploymentServices => {
                Section::EmploymentBySector
            }
            CoverageTotal | CoverageExtremePoor | CoverageRural | CoverageUrban => {
                Section::SocialProtectionCoverage
            }
            PovertyGapReduction | PovertyHeadcountReduction | GiniReduction => {
                Section::PovertyReductionImpact
            }
        }
    }

    /// Exact, untrimmed match against the stored `Indicator Name`.
    pub fn from_name(name: &str) -> Option<Indicator> {
        Indicator::ALL.into_iter().find(|i| i.name() == name)
    }

    /// Accepts the slug or the exact indicator name.
    pub fn parse(s: &str) -> Result<Indicator, SelectionError> {
        Indicator::ALL
            .into_iter()
            .find(|i| i.slug() == s.trim() || i.name() == s)
            .ok_or_else(|| SelectionError::UnknownIndicator(s.to_string()))
    }
}

/// Description lookup by free-form name: trimmed, then exact match.
///
/// Note the asymmetry with row filtering, which compares untrimmed names.
pub fn describe(name: &str) -> &'static str {
    Indicator::from_name(name.trim())
        .map(|i| i.description())
        .unwrap_or(NO_DESCRIPTION)
}

/// Taxonomy indicators that do not occur among `names`.
pub fn missing_from<'a, I>(names: I) -> Vec<Indicator>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: std::collections::HashSet<&str> = names.into_iter().collect();
    Indicator::ALL
        .into_iter()
        .filter(|i| !present.contains(i.name()))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_every_indicator_in_exactly_one_section() {
        let mut seen: HashMap<Indicator, usize> = HashMap::new();
        for section in Section::ALL {
            for ind in section.indicators() {
                *seen.entry(*ind).or_default() += 1;
                assert_eq!(ind.section(), section);
            }
        }
        assert_eq!(seen.len(), Indicator::ALL.len());
        assert!(seen.values().all(|&n| n == 1));
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = Indicator::ALL.iter().map(|i| i.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn test_indicator_options_sorted() {
        let options = Section::SocialProtectionCoverage.indicator_options();
        assert_eq!(options.len(), 4);
        assert_eq!(options[0], Indicator::CoverageRural);
        assert_eq!(options[1], Indicator::CoverageUrban);
        assert!(options.windows(2).all(|w| w[0].name() <= w[1].name()));
    }

    #[test]
    fn test_describe_trims_and_falls_back() {
        let padded = format!("  {}  ", Indicator::CoverageRural.name());
        assert_eq!(describe(&padded), Indicator::CoverageRural.description());
        assert_eq!(describe("GDP per capita"), NO_DESCRIPTION);
    }

    #[test]
    fn test_descriptions_keep_source_wording() {
        let poverty_gap = describe(Indicator::PovertyGapReduction.name());
        assert_eq!(
            poverty_gap,
            "This measures the poverty gap reduction for the bottom 20% of the income distribution — the 'poorest' quintile in the country."
        );
    }

    #[test]
    fn test_from_name_is_exact() {
        let padded = format!("{} ", Indicator::GiniReduction.name());
        assert_eq!(Indicator::from_name(Indicator::GiniReduction.name()), Some(Indicator::GiniReduction));
        assert_eq!(Indicator::from_name(&padded), None);
    }

    #[test]
    fn test_parse_slug_and_title() {
        assert_eq!(Section::parse("employment-by-sector"), Ok(Section::EmploymentBySector));
        assert_eq!(Section::parse("Poverty Reduction Impact"), Ok(Section::PovertyReductionImpact));
        assert!(Section::parse("weather").is_err());
        assert_eq!(Indicator::parse("coverage-urban"), Ok(Indicator::CoverageUrban));
    }

    #[test]
    fn test_missing_from() {
        let names = vec![Indicator::UnemploymentTotal.name()];
        let missing = missing_from(names);
        assert_eq!(missing.len(), 11);
        assert!(!missing.contains(&Indicator::UnemploymentTotal));
    }

    #[test]
    fn test_serde_uses_slugs() {
        for ind in Indicator::ALL {
            let json = serde_json::to_string(&ind).unwrap();
            assert_eq!(json, format!("\"{}\"", ind.slug()));
        }
        for sec in Section::ALL {
            let json = serde_json::to_string(&sec).unwrap();
            assert_eq!(json, format!("\"{}\"", sec.slug()));
        }
    }
}
