// 🧹 Cleaning Pipeline - raw HDX indicator export → canonical cleaned table
//
// Structural problems (no metadata row, missing columns, bad years) abort the run.
// Data-quality problems (duplicates, missing values, vocabulary gaps) are reported.

use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{DataError, Result};
use crate::table::{parse_value, parse_year, CleanedRecord, CleanedTable, TableSchema};
use crate::taxonomy::{self, Indicator};

/// Number of distinct indicator names echoed in the report
const SAMPLE_INDICATORS: usize = 10;

// ============================================================================
// RAW TABLE
// ============================================================================

/// Raw export as read: header labels plus untyped rows (metadata row included).
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn load(path: &Path) -> Result<RawTable> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<RawTable> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        Ok(RawTable { headers, rows })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }
}

// ============================================================================
// CLEANING REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Severity {
    Warning, // Data is questionable; charts may be skewed or empty
    Info,    // Expected imperfection, recorded for the record
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub field: String,
    pub issue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// Everything the pipeline observed along the way.
#[derive(Debug, Clone, Serialize)]
pub struct CleaningReport {
    pub generated_at: DateTime<Utc>,
    /// Data rows in the source, metadata row included
    pub source_rows: usize,
    pub rows: usize,
    pub columns: Vec<String>,
    pub dropped_columns: Vec<String>,
    pub duplicate_rows: usize,
    pub missing_values: Vec<MissingCount>,
    pub distinct_indicators: usize,
    pub sample_indicators: Vec<String>,
    pub year_range: Option<(i32, i32)>,
    pub absent_indicators: Vec<Indicator>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CleaningReport {
    pub fn summary(&self) -> String {
        let years = match self.year_range {
            Some((min, max)) => format!("{}-{}", min, max),
            None => "none".to_string(),
        };
        format!(
            "Rows: {}, Indicators: {}, Years: {}, Duplicates: {}, Missing values: {}",
            self.rows,
            self.distinct_indicators,
            years,
            self.duplicate_rows,
            self.missing_total()
        )
    }

    pub fn missing_total(&self) -> usize {
        self.missing_values.iter().map(|m| m.missing).sum()
    }

    pub fn missing_in(&self, column: &str) -> usize {
        self.missing_values
            .iter()
            .find(|m| m.column == column)
            .map(|m| m.missing)
            .unwrap_or(0)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Warning)
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct CleaningPipeline {
    /// Columns that only identify the (single) country
    identifying_columns: Vec<String>,
}

impl Default for CleaningPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl CleaningPipeline {
    pub fn new() -> Self {
        CleaningPipeline {
            identifying_columns: vec!["Country Name".to_string(), "Country ISO3".to_string()],
        }
    }

    /// Read `input`, clean it, write `output`. Nothing is written on error.
    pub fn run(&self, input: &Path, output: &Path) -> Result<CleaningReport> {
        info!(input = %input.display(), "cleaning raw export");
        let raw = RawTable::load(input)?;
        let (table, report) = self.clean(raw)?;
        table.save(output)?;
        Ok(report)
    }

    /// All steps except persistence.
    pub fn clean(&self, mut raw: RawTable) -> Result<(CleanedTable, CleaningReport)> {
        let source_rows = raw.rows.len();
        let mut diagnostics = Vec::new();

        // Step 1: metadata row
        let meta = drop_metadata_row(&mut raw)?;
        if let Some(diag) = check_metadata_row(&meta) {
            diagnostics.push(diag);
        }

        // Step 2: header labels
        normalize_headers(&mut raw);

        // Step 3: identifying columns
        let dropped_columns = self.drop_identifying_columns(&mut raw)?;

        // Step 4: duplicates (reported, kept)
        let duplicate_rows = count_duplicates(&raw.rows);
        info!(duplicate_rows, "duplicate check");
        if duplicate_rows > 0 {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                field: "row".to_string(),
                issue: format!(
                    "{} exact duplicate rows kept; aggregates will count them twice",
                    duplicate_rows
                ),
            });
        }

        // Step 5: types
        let table = coerce(&raw)?;

        // Step 6: missing values
        let missing_values = count_missing(&table);
        for m in missing_values.iter().filter(|m| m.missing > 0) {
            info!(column = %m.column, missing = m.missing, "missing values");
            diagnostics.push(Diagnostic {
                severity: Severity::Info,
                field: m.column.clone(),
                issue: format!("{} missing values", m.missing),
            });
        }

        // Step 7: vocabulary and range
        let names = table.indicator_names();
        let distinct_indicators = names.len();
        let sample_indicators = names
            .iter()
            .take(SAMPLE_INDICATORS)
            .map(|n| n.to_string())
            .collect();
        let absent_indicators = taxonomy::missing_from(names.iter().copied());
        let year_range = table.year_bounds();

        info!(distinct_indicators, ?year_range, "vocabulary check");
        for ind in &absent_indicators {
            warn!(indicator = ind.name(), "taxonomy indicator absent from data");
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                field: "Indicator Name".to_string(),
                issue: format!("'{}' not present; its charts will be empty", ind.name()),
            });
        }

        let report = CleaningReport {
            generated_at: Utc::now(),
            source_rows,
            rows: table.len(),
            columns: table.schema.columns.clone(),
            dropped_columns,
            duplicate_rows,
            missing_values,
            distinct_indicators,
            sample_indicators,
            year_range,
            absent_indicators,
            diagnostics,
        };

        Ok((table, report))
    }

    fn drop_identifying_columns(&self, raw: &mut RawTable) -> Result<Vec<String>> {
        // Resolve every position first so a missing column aborts before any change
        let mut positions = self
            .identifying_columns
            .iter()
            .map(|name| raw.column(name))
            .collect::<Result<Vec<usize>>>()?;
        positions.sort_unstable_by(|a, b| b.cmp(a));

        for &pos in &positions {
            raw.headers.remove(pos);
            for row in raw.rows.iter_mut() {
                if pos < row.len() {
                    row.remove(pos);
                }
            }
        }

        debug!(columns = ?raw.headers, "identifying columns dropped");
        Ok(self.identifying_columns.clone())
    }
}

// ============================================================================
// STEPS
// ============================================================================

/// Remove data row 0 and hand it back; the remaining rows shift down by one.
fn drop_metadata_row(raw: &mut RawTable) -> Result<Vec<String>> {
    if raw.rows.is_empty() {
        return Err(DataError::MissingMetadataRow);
    }
    Ok(raw.rows.remove(0))
}

/// HDX exports carry HXL hashtags (`#country+name`, ...) in the metadata row.
fn check_metadata_row(meta: &[String]) -> Option<Diagnostic> {
    debug!(row = ?meta, "dropped metadata row");
    if meta.iter().any(|f| f.trim_start().starts_with('#')) {
        return None;
    }
    warn!("first data row carries no HXL tags; dropped anyway");
    Some(Diagnostic {
        severity: Severity::Warning,
        field: "row 0".to_string(),
        issue: "metadata row has no '#' tags; a real observation may have been dropped".to_string(),
    })
}

fn normalize_headers(raw: &mut RawTable) {
    for header in raw.headers.iter_mut() {
        *header = header.trim().to_string();
    }
}

/// Rows that repeat an earlier row exactly, counted once per repeat.
pub fn count_duplicates(rows: &[Vec<String>]) -> usize {
    let mut seen: HashSet<[u8; 32]> = HashSet::with_capacity(rows.len());
    rows.iter().filter(|row| !seen.insert(row_fingerprint(row))).count()
}

fn row_fingerprint(row: &[String]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for field in row {
        hasher.update(field.as_bytes());
        hasher.update([0x1fu8]); // unit separator keeps ("ab","c") != ("a","bc")
    }
    hasher.finalize().into()
}

/// Typed conversion. `line` numbers refer to the source file: header is line 1,
/// the dropped metadata row line 2.
fn coerce(raw: &RawTable) -> Result<CleanedTable> {
    let (schema, index): (TableSchema, _) = TableSchema::from_headers(&raw.headers)?;

    let mut records = Vec::with_capacity(raw.rows.len());
    for (i, row) in raw.rows.iter().enumerate() {
        let field = |pos: usize| row.get(pos).map(String::as_str).unwrap_or("");

        let year = parse_year(field(index.year)).ok_or_else(|| DataError::InvalidYear {
            line: i + 3,
            value: field(index.year).to_string(),
        })?;

        records.push(CleanedRecord {
            indicator: field(index.indicator).to_string(),
            year,
            value: parse_value(field(index.value)),
            extra: index.extra.iter().map(|&p| field(p).to_string()).collect(),
        });
    }

    Ok(CleanedTable::new(schema, records))
}

/// Per-column missing counts in column order.
pub fn count_missing(table: &CleanedTable) -> Vec<MissingCount> {
    let mut extra_pos = 0;
    table
        .schema
        .columns
        .iter()
        .map(|column| {
            let missing = match column.as_str() {
                crate::table::COL_INDICATOR => {
                    table.records.iter().filter(|r| r.indicator.is_empty()).count()
                }
                crate::table::COL_YEAR => 0,
                crate::table::COL_VALUE => table.records.iter().filter(|r| r.value.is_none()).count(),
                _ => {
                    let pos = extra_pos;
                    extra_pos += 1;
                    table
                        .records
                        .iter()
                        .filter(|r| r.extra.get(pos).map_or(true, |f| f.is_empty()))
                        .count()
                }
            };
            MissingCount {
                column: column.clone(),
                missing,
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::COL_VALUE;

    const HEADER: &str = " Country Name,Country ISO3 ,Year,Indicator Name,Indicator Code,Value";
    const META: &str = "#country+name,#country+code,#date+year,#indicator+name,#indicator+code,#indicator+value+num";

    fn raw_csv(rows: &[&str]) -> String {
        let mut text = format!("{}\n{}\n", HEADER, META);
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    fn clean_csv(rows: &[&str]) -> Result<(CleanedTable, CleaningReport)> {
        let raw = RawTable::from_reader(raw_csv(rows).as_bytes())?;
        CleaningPipeline::new().clean(raw)
    }

    #[test]
    fn test_values_coerced_with_missing_marker() {
        let (table, report) = clean_csv(&[
            "Sri Lanka,LKA,2010,Unemployment,SL.UEM,5.2",
            "Sri Lanka,LKA,2011,Unemployment,SL.UEM,n/a",
            "Sri Lanka,LKA,2012,Unemployment,SL.UEM,7.1",
        ])
        .unwrap();

        let values: Vec<Option<f64>> = table.records.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![Some(5.2), None, Some(7.1)]);
        assert_eq!(report.missing_in(COL_VALUE), 1);
        assert_eq!(report.missing_total(), 1);
    }

    #[test]
    fn test_non_numeric_year_fails_whole_run() {
        let err = clean_csv(&[
            "Sri Lanka,LKA,2010,Unemployment,SL.UEM,5.2",
            "Sri Lanka,LKA,2011,Unemployment,SL.UEM,5.0",
            "Sri Lanka,LKA,abc,Unemployment,SL.UEM,4.8",
        ])
        .unwrap_err();

        match err {
            DataError::InvalidYear { line, value } => {
                assert_eq!(value, "abc");
                assert_eq!(line, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identifying_columns_dropped_and_headers_trimmed() {
        let (table, report) = clean_csv(&["Sri Lanka,LKA,2010,Unemployment,SL.UEM,5.2"]).unwrap();

        assert_eq!(
            table.schema.columns,
            vec!["Year", "Indicator Name", "Indicator Code", "Value"]
        );
        assert_eq!(report.dropped_columns, vec!["Country Name", "Country ISO3"]);
        assert_eq!(report.source_rows, 2);
        assert_eq!(report.rows, 1);
    }

    #[test]
    fn test_missing_identifying_column_is_fatal() {
        let text = "Country Name,Year,Indicator Name,Value\n#meta,#y,#i,#v\nSri Lanka,2010,X,1\n";
        let raw = RawTable::from_reader(text.as_bytes()).unwrap();
        let err = CleaningPipeline::new().clean(raw).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(ref c) if c == "Country ISO3"));
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let raw = RawTable::from_reader(format!("{}\n", HEADER).as_bytes()).unwrap();
        let err = CleaningPipeline::new().clean(raw).unwrap_err();
        assert!(matches!(err, DataError::MissingMetadataRow));
    }

    #[test]
    fn test_duplicates_reported_not_removed() {
        let (table, report) = clean_csv(&[
            "Sri Lanka,LKA,2010,Unemployment,SL.UEM,5.2",
            "Sri Lanka,LKA,2010,Unemployment,SL.UEM,5.2",
            "Sri Lanka,LKA,2010,Unemployment,SL.UEM,5.2",
            "Sri Lanka,LKA,2011,Unemployment,SL.UEM,5.2",
        ])
        .unwrap();

        assert_eq!(report.duplicate_rows, 2);
        assert_eq!(table.len(), 4);
        assert!(report.has_warnings());
    }

    #[test]
    fn test_fingerprint_separates_fields() {
        let rows = vec![
            vec!["ab".to_string(), "c".to_string()],
            vec!["a".to_string(), "bc".to_string()],
        ];
        assert_eq!(count_duplicates(&rows), 0);
    }

    #[test]
    fn test_vocabulary_and_range_diagnostics() {
        let (_, report) = clean_csv(&[
            "Sri Lanka,LKA,2015,Coverage (%) -All Social Protection and Labor -rural,X,30",
            "Sri Lanka,LKA,2009,Coverage (%) -All Social Protection and Labor -urban,X,40",
            "Sri Lanka,LKA,2019,Coverage (%) -All Social Protection and Labor -rural,X,32",
        ])
        .unwrap();

        assert_eq!(report.distinct_indicators, 2);
        assert_eq!(report.year_range, Some((2009, 2019)));
        assert_eq!(report.absent_indicators.len(), 10);
        assert!(!report.absent_indicators.contains(&Indicator::CoverageRural));
        assert!(report.summary().contains("Years: 2009-2019"));
    }

    #[test]
    fn test_metadata_row_without_tags_is_flagged() {
        let text = format!("{}\nSri Lanka,LKA,2009,X,X,1\nSri Lanka,LKA,2010,X,X,2\n", HEADER);
        let raw = RawTable::from_reader(text.as_bytes()).unwrap();
        let (table, report) = CleaningPipeline::new().clean(raw).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].year, 2010);
        assert!(report.diagnostics.iter().any(|d| d.field == "row 0"));
    }

    #[test]
    fn test_cleaning_clean_data_is_idempotent() {
        let (first, _) = clean_csv(&[
            "Sri Lanka,LKA,2010,Unemployment,SL.UEM,5.2",
            "Sri Lanka,LKA,2011,Unemployment,SL.UEM,",
            "Sri Lanka,LKA,2012,Unemployment,SL.UEM,7",
        ])
        .unwrap();

        // Re-run the typed stages over the serialized cleaned table
        let mut out = Vec::new();
        first.write_to(&mut out).unwrap();
        let reread = RawTable::from_reader(out.as_slice()).unwrap();
        let second = coerce(&reread).unwrap();

        assert_eq!(second, first);
    }

    #[test]
    fn test_run_writes_output_only_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        let output = dir.path().join("cleaned_data.csv");

        std::fs::write(&input, raw_csv(&["Sri Lanka,LKA,20x0,X,X,1"])).unwrap();
        assert!(CleaningPipeline::new().run(&input, &output).is_err());
        assert!(!output.exists());

        std::fs::write(&input, raw_csv(&["Sri Lanka,LKA,2010,X,X,1"])).unwrap();
        let report = CleaningPipeline::new().run(&input, &output).unwrap();
        assert_eq!(report.rows, 1);

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, "Year,Indicator Name,Indicator Code,Value\n2010,X,X,1\n");
    }
}
