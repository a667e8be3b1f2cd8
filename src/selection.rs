// 🎛️ Selection - what the user has picked in the current render cycle

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;
use crate::taxonomy::{Indicator, Section};

// ============================================================================
// CHART KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Scatter,
    Box,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [ChartKind::Line, ChartKind::Bar, ChartKind::Scatter, ChartKind::Box];

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line Chart",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Box => "Box Plot",
        }
    }

    pub fn parse(s: &str) -> Result<ChartKind, SelectionError> {
        match s.trim().to_lowercase().as_str() {
            "line" | "line chart" => Ok(ChartKind::Line),
            "bar" | "bar chart" => Ok(ChartKind::Bar),
            "scatter" | "scatter plot" => Ok(ChartKind::Scatter),
            "box" | "box plot" => Ok(ChartKind::Box),
            other => Err(SelectionError::UnknownChartKind(other.to_string())),
        }
    }
}

/// Which chart kinds a deployment offers. Some deployments only show Line/Bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKinds {
    #[default]
    All,
    LineBar,
}

impl ChartKinds {
    pub fn offered(&self) -> &'static [ChartKind] {
        match self {
            ChartKinds::All => &ChartKind::ALL,
            ChartKinds::LineBar => &[ChartKind::Line, ChartKind::Bar],
        }
    }

    pub fn allows(&self, kind: ChartKind) -> bool {
        self.offered().contains(&kind)
    }

    /// Kinds outside the offered set render as a plain line chart.
    pub fn resolve(&self, kind: ChartKind) -> ChartKind {
        if self.allows(kind) {
            kind
        } else {
            ChartKind::Line
        }
    }

    /// Next offered kind after `kind`, wrapping around.
    pub fn cycle(&self, kind: ChartKind) -> ChartKind {
        let offered = self.offered();
        let pos = offered.iter().position(|k| *k == kind).unwrap_or(0);
        offered[(pos + 1) % offered.len()]
    }
}

// ============================================================================
// YEAR RANGE
// ============================================================================

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<YearRange, SelectionError> {
        if start > end {
            return Err(SelectionError::InvertedYearRange { start, end });
        }
        Ok(YearRange { start, end })
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    /// Years shared with `bounds`, or `None` when the two do not overlap.
    pub fn intersect(&self, bounds: YearRange) -> Option<YearRange> {
        let start = self.start.max(bounds.start);
        let end = self.end.min(bounds.end);
        (start <= end).then_some(YearRange { start, end })
    }

    /// Number of years covered. Open-ended ranges reach past `i32`.
    pub fn span(&self) -> u64 {
        (self.end as i64 - self.start as i64 + 1) as u64
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// Rendering mode implied by a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Overview,
    Detail(Section, Indicator),
}

/// Section → indicator → chart kind → year range.
///
/// The indicator is always a member of the section; `with_section` clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Selection {
    section: Option<Section>,
    indicator: Option<Indicator>,
    pub chart: ChartKind,
    pub years: Option<YearRange>,
}

impl Selection {
    pub fn new() -> Self {
        Selection::default()
    }

    /// Detail selection for `indicator` in its own section.
    pub fn detail(indicator: Indicator) -> Self {
        Selection {
            section: Some(indicator.section()),
            indicator: Some(indicator),
            ..Selection::default()
        }
    }

    pub fn section(&self) -> Option<Section> {
        self.section
    }

    pub fn indicator(&self) -> Option<Indicator> {
        self.indicator
    }

    /// Choosing (or clearing) a section resets the indicator and year range.
    pub fn with_section(mut self, section: Option<Section>) -> Self {
        if self.section != section {
            self.indicator = None;
            self.years = None;
        }
        self.section = section;
        self
    }

    pub fn with_indicator(mut self, indicator: Option<Indicator>) -> Result<Self, SelectionError> {
        if let Some(ind) = indicator {
            let section = self.section.ok_or(SelectionError::NoSection)?;
            if !section.contains(ind) {
                return Err(SelectionError::IndicatorNotInSection {
                    section: section.title().to_string(),
                    indicator: ind.name().to_string(),
                });
            }
        }
        if self.indicator != indicator {
            self.years = None;
        }
        self.indicator = indicator;
        Ok(self)
    }

    pub fn with_chart(mut self, chart: ChartKind) -> Self {
        self.chart = chart;
        self
    }

    pub fn with_years(mut self, years: Option<YearRange>) -> Self {
        self.years = years;
        self
    }

    /// Indicator choices for the current section (empty before one is picked).
    pub fn indicator_options(&self) -> Vec<Indicator> {
        self.section.map(|s| s.indicator_options()).unwrap_or_default()
    }

    pub fn mode(&self) -> Mode {
        match (self.section, self.indicator) {
            (Some(section), Some(indicator)) => Mode::Detail(section, indicator),
            _ => Mode::Overview,
        }
    }
}

/// Selection from loosely-typed front-end input (CLI args, query strings).
///
/// `None`, empty or `-` means unselected. An indicator given without a section
/// implies its own section. A single year bound leaves the other end open.
pub fn parse_selection(
    section: Option<&str>,
    indicator: Option<&str>,
    chart: Option<&str>,
    from: Option<i32>,
    to: Option<i32>,
) -> Result<Selection, SelectionError> {
    fn given(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty() && *s != "-")
    }

    let section = given(section).map(Section::parse).transpose()?;
    let indicator = given(indicator).map(Indicator::parse).transpose()?;
    let chart = given(chart).map(ChartKind::parse).transpose()?.unwrap_or_default();

    let mut selection = Selection::new().with_section(section.or(indicator.map(|i| i.section())));
    selection = selection.with_indicator(indicator)?;

    let years = match (from, to) {
        (None, None) => None,
        (start, end) => Some(YearRange::new(start.unwrap_or(i32::MIN), end.unwrap_or(i32::MAX))?),
    };

    Ok(selection.with_chart(chart).with_years(years))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_transitions() {
        let sel = Selection::new();
        assert_eq!(sel.mode(), Mode::Overview);

        let sel = sel.with_section(Some(Section::EmploymentBySector));
        assert_eq!(sel.mode(), Mode::Overview);
        assert_eq!(sel.indicator_options().len(), 3);

        let sel = sel.with_indicator(Some(Indicator::EmploymentIndustry)).unwrap();
        assert_eq!(
            sel.mode(),
            Mode::Detail(Section::EmploymentBySector, Indicator::EmploymentIndustry)
        );

        let sel = sel.with_indicator(None).unwrap();
        assert_eq!(sel.mode(), Mode::Overview);
    }

    #[test]
    fn test_section_change_resets_indicator() {
        let sel = Selection::detail(Indicator::CoverageRural)
            .with_years(Some(YearRange::new(2010, 2012).unwrap()))
            .with_section(Some(Section::PovertyReductionImpact));

        assert_eq!(sel.indicator(), None);
        assert_eq!(sel.years, None);
        assert_eq!(sel.mode(), Mode::Overview);
    }

    #[test]
    fn test_same_section_keeps_indicator() {
        let sel = Selection::detail(Indicator::CoverageRural).with_section(Some(Section::SocialProtectionCoverage));
        assert_eq!(sel.indicator(), Some(Indicator::CoverageRural));
    }

    #[test]
    fn test_indicator_outside_section_rejected() {
        let sel = Selection::new().with_section(Some(Section::EmploymentBySector));
        let err = sel.with_indicator(Some(Indicator::GiniReduction)).unwrap_err();
        assert!(matches!(err, SelectionError::IndicatorNotInSection { .. }));

        let err = Selection::new().with_indicator(Some(Indicator::GiniReduction)).unwrap_err();
        assert_eq!(err, SelectionError::NoSection);
    }

    #[test]
    fn test_year_range_rules() {
        assert!(YearRange::new(2020, 2015).is_err());

        let bounds = YearRange::new(2010, 2022).unwrap();
        let r = YearRange::new(2015, 2020).unwrap();
        assert_eq!(r.intersect(bounds), Some(r));
        assert_eq!(r.span(), 6);
        assert!(r.contains(2015) && r.contains(2020) && !r.contains(2021));

        let wide = YearRange::new(1990, 2030).unwrap();
        assert_eq!(wide.intersect(bounds), Some(bounds));

        let partial = YearRange::new(2005, 2012).unwrap();
        assert_eq!(partial.intersect(bounds), Some(YearRange { start: 2010, end: 2012 }));
    }

    #[test]
    fn test_disjoint_range_has_no_intersection() {
        let bounds = YearRange::new(2010, 2022).unwrap();
        assert_eq!(YearRange::new(1990, 1995).unwrap().intersect(bounds), None);
        assert_eq!(YearRange::new(2023, 2030).unwrap().intersect(bounds), None);
        assert_eq!(YearRange::new(2022, 2030).unwrap().intersect(bounds), Some(YearRange { start: 2022, end: 2022 }));
    }

    #[test]
    fn test_span_of_open_range_does_not_overflow() {
        let open = parse_selection(None, Some("gini-reduction"), None, Some(2015), None)
            .unwrap()
            .years
            .unwrap();
        assert_eq!(open.span(), (i32::MAX as i64 - 2015 + 1) as u64);

        let everything = YearRange::new(i32::MIN, i32::MAX).unwrap();
        assert_eq!(everything.span(), 1u64 << 32);
    }

    #[test]
    fn test_chart_kind_restriction() {
        assert!(ChartKinds::All.allows(ChartKind::Box));
        assert!(!ChartKinds::LineBar.allows(ChartKind::Scatter));
        assert_eq!(ChartKinds::LineBar.resolve(ChartKind::Box), ChartKind::Line);
        assert_eq!(ChartKinds::LineBar.cycle(ChartKind::Bar), ChartKind::Line);
        assert_eq!(ChartKinds::All.cycle(ChartKind::Scatter), ChartKind::Box);
    }

    #[test]
    fn test_parse_selection() {
        let sel = parse_selection(None, Some("coverage-urban"), Some("bar"), Some(2015), None).unwrap();
        assert_eq!(sel.section(), Some(Section::SocialProtectionCoverage));
        assert_eq!(sel.indicator(), Some(Indicator::CoverageUrban));
        assert_eq!(sel.chart, ChartKind::Bar);
        assert_eq!(sel.years, Some(YearRange { start: 2015, end: i32::MAX }));

        let overview = parse_selection(Some("-"), Some(""), None, None, None).unwrap();
        assert_eq!(overview.mode(), Mode::Overview);

        let err = parse_selection(Some("employment-by-sector"), Some("gini-reduction"), None, None, None);
        assert!(matches!(err, Err(SelectionError::IndicatorNotInSection { .. })));

        assert!(parse_selection(None, None, None, Some(2020), Some(2010)).is_err());
    }

    #[test]
    fn test_chart_kind_parse() {
        assert_eq!(ChartKind::parse("Box Plot"), Ok(ChartKind::Box));
        assert_eq!(ChartKind::parse("scatter"), Ok(ChartKind::Scatter));
        assert!(ChartKind::parse("pie").is_err());
    }
}
