// 🔭 Exploration Engine - pure derivation of a view from (table, selection)
//
// Every user interaction calls `render` again from scratch. Nothing here
// mutates the table or keeps state between calls.

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::export::{export_filename, ExportFile, DEFAULT_COUNTRY_SUFFIX};
use crate::selection::{ChartKind, ChartKinds, Mode, Selection, YearRange};
use crate::stats::{mean, BoxSummary, SummaryStats};
use crate::table::{CleanedRecord, CleanedTable};
use crate::taxonomy::{describe, Indicator, Section};

// ============================================================================
// CHART MODEL
// ============================================================================

/// One (Year, Value) observation; `value: None` is a gap, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub year: i32,
    pub value: Option<f64>,
}

impl From<&CleanedRecord> for Point {
    fn from(r: &CleanedRecord) -> Self {
        Point {
            year: r.year,
            value: r.value,
        }
    }
}

/// Observations of one indicator, in Year order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub indicator: Indicator,
    pub label: &'static str,
    pub points: Vec<Point>,
}

/// Mean value of one indicator over every year present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareSlice {
    pub indicator: Indicator,
    pub label: &'static str,
    pub mean: Option<f64>,
    /// Fraction of the sum of all slice means
    pub share: Option<f64>,
}

/// Bars for one year, one entry per observation (grouped side by side).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarGroup {
    pub year: i32,
    pub bars: Vec<(Indicator, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Chart {
    /// Multi- or single-series time lines
    Line {
        title: String,
        series: Vec<Series>,
        markers: bool,
    },
    /// Pie-style proportions
    Share { title: String, slices: Vec<ShareSlice> },
    /// Side-by-side bars per year
    GroupedBar { title: String, groups: Vec<BarGroup> },
    /// One bar per year, keyed by year
    Bar { title: String, bars: Vec<Point> },
    /// Unconnected points
    Scatter { title: String, points: Vec<Point> },
    /// Distribution of all included values
    Box {
        title: String,
        summary: Option<BoxSummary>,
        points: Vec<f64>,
    },
}

impl Chart {
    pub fn title(&self) -> &str {
        match self {
            Chart::Line { title, .. }
            | Chart::Share { title, .. }
            | Chart::GroupedBar { title, .. }
            | Chart::Bar { title, .. }
            | Chart::Scatter { title, .. }
            | Chart::Box { title, .. } => title,
        }
    }

    /// Axis captions: the box plot has no x axis.
    pub fn axis_titles(&self) -> (Option<&'static str>, &'static str) {
        match self {
            Chart::Box { .. } | Chart::Share { .. } => (None, "Value"),
            _ => (Some("Year"), "Value"),
        }
    }
}

// ============================================================================
// VIEW MODEL
// ============================================================================

/// Charts for one section tab of the overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewPanel {
    pub section: Section,
    pub title: &'static str,
    pub charts: Vec<Chart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub panels: Vec<OverviewPanel>,
}

impl Overview {
    pub fn panel(&self, section: Section) -> Option<&OverviewPanel> {
        self.panels.iter().find(|p| p.section == section)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub section: Section,
    pub indicator: Indicator,
    pub title: String,
    pub description: &'static str,
    /// Observed years of the indicator
    pub bounds: YearRange,
    /// Requested years intersected with `bounds`; the rows are limited to it
    pub range: YearRange,
    pub chart_kind: ChartKind,
    pub chart: Chart,
    pub stats: SummaryStats,
    pub columns: Vec<String>,
    pub rows: Vec<CleanedRecord>,
    pub export_filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoDataView {
    pub section: Section,
    pub indicator: Indicator,
    /// Set when the indicator has rows but none inside the requested years
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<YearRange>,
    pub message: String,
}

/// Everything a front-end needs to draw one render cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ViewModel {
    Overview(Overview),
    Detail(Box<DetailView>),
    NoData(NoDataView),
}

/// Deployment knobs that shape rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub chart_kinds: ChartKinds,
    pub country_suffix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            chart_kinds: ChartKinds::All,
            country_suffix: DEFAULT_COUNTRY_SUFFIX.to_string(),
        }
    }
}

// ============================================================================
// RENDER
// ============================================================================

pub fn render(table: &CleanedTable, selection: &Selection, options: &RenderOptions) -> ViewModel {
    match selection.mode() {
        Mode::Overview => ViewModel::Overview(overview(table)),
        Mode::Detail(section, indicator) => detail(table, section, indicator, selection, options),
    }
}

// ----------------------------------------------------------------------------
// Overview
// ----------------------------------------------------------------------------

pub fn overview(table: &CleanedTable) -> Overview {
    let panels = Section::ALL
        .into_iter()
        .map(|section| OverviewPanel {
            section,
            title: section.title(),
            charts: overview_charts(table, section),
        })
        .collect();
    Overview { panels }
}

fn overview_charts(table: &CleanedTable, section: Section) -> Vec<Chart> {
    let members = section.indicators();
    match section {
        Section::UnemploymentLaborParticipation => vec![time_lines(
            table,
            members,
            "Unemployment & Participation Over Time",
        )],
        Section::EmploymentBySector => vec![
            mean_share(table, members, "Average Employment Share by Sector"),
            time_lines(table, members, "Employment Trends by Sector Over Time"),
        ],
        Section::SocialProtectionCoverage => vec![
            time_lines(table, members, "Social Protection Coverage by Type"),
            grouped_bars(
                table,
                &[Indicator::CoverageRural, Indicator::CoverageUrban],
                "Urban vs Rural Social Protection Coverage",
            ),
        ],
        Section::PovertyReductionImpact => {
            vec![time_lines(table, members, "Poverty Impact Indicators")]
        }
    }
}

/// Rows of one indicator, exact name match, stably sorted by year.
pub fn indicator_rows(table: &CleanedTable, indicator: Indicator) -> Vec<&CleanedRecord> {
    let mut rows: Vec<&CleanedRecord> = table
        .records
        .iter()
        .filter(|r| r.indicator == indicator.name())
        .collect();
    rows.sort_by_key(|r| r.year);
    rows
}

/// One series per indicator that has rows; no aggregation.
pub fn time_lines(table: &CleanedTable, indicators: &[Indicator], title: &str) -> Chart {
    let series = indicators
        .iter()
        .filter_map(|&indicator| {
            let points: Vec<Point> = indicator_rows(table, indicator)
                .into_iter()
                .map(Point::from)
                .collect();
            (!points.is_empty()).then_some(Series {
                indicator,
                label: indicator.name(),
                points,
            })
        })
        .collect();

    Chart::Line {
        title: title.to_string(),
        series,
        markers: false,
    }
}

/// Simple (not year-weighted) mean per indicator over all its years.
pub fn mean_share(table: &CleanedTable, indicators: &[Indicator], title: &str) -> Chart {
    let means: Vec<(Indicator, Option<f64>)> = indicators
        .iter()
        .filter_map(|&indicator| {
            let rows = indicator_rows(table, indicator);
            if rows.is_empty() {
                return None;
            }
            Some((indicator, mean(rows.iter().map(|r| r.value))))
        })
        .collect();

    let total: f64 = means.iter().filter_map(|(_, m)| *m).sum();
    let slices = means
        .into_iter()
        .map(|(indicator, mean)| ShareSlice {
            indicator,
            label: indicator.name(),
            mean,
            share: mean.filter(|_| total > 0.0).map(|m| m / total),
        })
        .collect();

    Chart::Share {
        title: title.to_string(),
        slices,
    }
}

/// Year-grouped bars, indicators side by side in the order given.
pub fn grouped_bars(table: &CleanedTable, indicators: &[Indicator], title: &str) -> Chart {
    let mut groups: Vec<BarGroup> = Vec::new();
    for &indicator in indicators {
        for row in indicator_rows(table, indicator) {
            match groups.iter_mut().find(|g| g.year == row.year) {
                Some(group) => group.bars.push((indicator, row.value)),
                None => groups.push(BarGroup {
                    year: row.year,
                    bars: vec![(indicator, row.value)],
                }),
            }
        }
    }
    groups.sort_by_key(|g| g.year);

    Chart::GroupedBar {
        title: title.to_string(),
        groups,
    }
}

// ----------------------------------------------------------------------------
// Detail
// ----------------------------------------------------------------------------

fn detail(
    table: &CleanedTable,
    section: Section,
    indicator: Indicator,
    selection: &Selection,
    options: &RenderOptions,
) -> ViewModel {
    let rows = indicator_rows(table, indicator);

    let bounds = match year_bounds(&rows) {
        Some(bounds) => bounds,
        None => {
            debug!(indicator = indicator.name(), "no rows for indicator");
            return ViewModel::NoData(NoDataView {
                section,
                indicator,
                requested: None,
                message: format!("No data available for {}", indicator.name()),
            });
        }
    };

    let range = match selection.years {
        None => bounds,
        Some(requested) => match requested.intersect(bounds) {
            Some(range) => range,
            None => {
                debug!(indicator = indicator.name(), ?requested, ?bounds, "requested years outside data");
                return ViewModel::NoData(NoDataView {
                    section,
                    indicator,
                    requested: Some(requested),
                    message: format!(
                        "No data available for {} in {} (observed {}-{})",
                        indicator.name(),
                        years_label(requested),
                        bounds.start,
                        bounds.end
                    ),
                });
            }
        },
    };
    let rows: Vec<CleanedRecord> = rows
        .into_iter()
        .filter(|r| range.contains(r.year))
        .cloned()
        .collect();

    let chart_kind = options.chart_kinds.resolve(selection.chart);
    let title = indicator.name().to_string();
    let chart = detail_chart(indicator, chart_kind, &rows);
    let stats = SummaryStats::from_values(rows.iter().map(|r| r.value));

    debug!(
        indicator = indicator.name(),
        start = range.start,
        end = range.end,
        rows = rows.len(),
        "detail view"
    );

    ViewModel::Detail(Box::new(DetailView {
        section,
        indicator,
        title,
        description: describe(indicator.name()),
        bounds,
        range,
        chart_kind,
        chart,
        stats,
        columns: table.schema.columns.clone(),
        rows,
        export_filename: export_filename(indicator, &options.country_suffix),
    }))
}

/// `1990-1995`, `from 2030` or `up to 1995` for open-ended ranges.
fn years_label(range: YearRange) -> String {
    match (range.start == i32::MIN, range.end == i32::MAX) {
        (true, true) => "any year".to_string(),
        (true, false) => format!("up to {}", range.end),
        (false, true) => format!("from {}", range.start),
        (false, false) => format!("{}-{}", range.start, range.end),
    }
}

/// Bounds from the distinct years present.
fn year_bounds(rows: &[&CleanedRecord]) -> Option<YearRange> {
    let min = rows.iter().map(|r| r.year).min()?;
    let max = rows.iter().map(|r| r.year).max()?;
    Some(YearRange { start: min, end: max })
}

fn detail_chart(indicator: Indicator, kind: ChartKind, rows: &[CleanedRecord]) -> Chart {
    let points: Vec<Point> = rows.iter().map(Point::from).collect();
    let title = indicator.name().to_string();

    match kind {
        ChartKind::Line => Chart::Line {
            title,
            series: vec![Series {
                indicator,
                label: indicator.name(),
                points,
            }],
            markers: true,
        },
        ChartKind::Bar => Chart::Bar { title, bars: points },
        ChartKind::Scatter => Chart::Scatter {
            title,
            points: points.into_iter().filter(|p| p.value.is_some()).collect(),
        },
        ChartKind::Box => {
            let values: Vec<f64> = rows.iter().filter_map(|r| r.value).collect();
            Chart::Box {
                title: format!("Distribution of {} (All Years)", indicator.name()),
                summary: BoxSummary::from_values(&values),
                points: values,
            }
        }
    }
}

impl DetailView {
    /// CSV of exactly the rows shown.
    pub fn export(&self) -> Result<ExportFile> {
        let schema = crate::table::TableSchema {
            columns: self.columns.clone(),
            extra: Vec::new(),
        };
        ExportFile::build(self.export_filename.clone(), &schema, &self.rows)
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// The loaded table plus deployment options: the explicit context every
/// render cycle runs against.
#[derive(Debug, Clone)]
pub struct Session {
    table: CleanedTable,
    options: RenderOptions,
}

impl Session {
    pub fn new(table: CleanedTable, options: RenderOptions) -> Self {
        let missing = crate::taxonomy::missing_from(table.indicator_names());
        for ind in &missing {
            tracing::warn!(indicator = ind.name(), "taxonomy indicator has no rows; its views will be empty");
        }
        Session { table, options }
    }

    pub fn table(&self) -> &CleanedTable {
        &self.table
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn render(&self, selection: &Selection) -> ViewModel {
        render(&self.table, selection, &self.options)
    }
}

// ============================================================================
// TESTS
// ============================================================================
