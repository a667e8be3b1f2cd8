// 📄 Cleaned Record table - canonical (Indicator Name, Year, Value) rows
//
// Produced once by the cleaning pipeline, loaded once per session, never mutated.

use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

use crate::error::{DataError, Result};

pub const COL_INDICATOR: &str = "Indicator Name";
pub const COL_YEAR: &str = "Year";
pub const COL_VALUE: &str = "Value";

// ============================================================================
// CORE TYPES
// ============================================================================

/// One observation in canonical typed form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedRecord {
    pub indicator: String,
    pub year: i32,
    /// `None` when the source value was empty or non-numeric
    pub value: Option<f64>,
    /// Pass-through columns, aligned with `TableSchema::extra`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

impl CleanedRecord {
    pub fn new(indicator: impl Into<String>, year: i32, value: Option<f64>) -> Self {
        CleanedRecord {
            indicator: indicator.into(),
            year,
            value,
            extra: Vec::new(),
        }
    }

    /// Text of each field in `columns` order; pass-through values fill the
    /// non-typed columns in sequence.
    pub fn fields(&self, columns: &[String]) -> Vec<String> {
        let mut extra = self.extra.iter();
        columns
            .iter()
            .map(|col| match col.as_str() {
                COL_INDICATOR => self.indicator.clone(),
                COL_YEAR => self.year.to_string(),
                COL_VALUE => format_value(self.value),
                _ => extra.next().cloned().unwrap_or_default(),
            })
            .collect()
    }
}

/// Column layout of a cleaned table, in output order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSchema {
    pub columns: Vec<String>,
    /// Names of the pass-through columns, in the order they appear in `columns`
    pub extra: Vec<String>,
}

impl TableSchema {
    /// Locate the three typed columns; everything else becomes pass-through.
    pub fn from_headers(headers: &[String]) -> Result<(TableSchema, ColumnIndex)> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DataError::MissingColumn(name.to_string()))
        };

        let index = ColumnIndex {
            indicator: find(COL_INDICATOR)?,
            year: find(COL_YEAR)?,
            value: find(COL_VALUE)?,
            extra: headers
                .iter()
                .enumerate()
                .filter(|(_, h)| !matches!(h.as_str(), COL_INDICATOR | COL_YEAR | COL_VALUE))
                .map(|(i, _)| i)
                .collect(),
        };

        let schema = TableSchema {
            columns: headers.to_vec(),
            extra: index.extra.iter().map(|&i| headers[i].clone()).collect(),
        };

        Ok((schema, index))
    }

    /// Default layout when only the canonical columns exist.
    pub fn canonical() -> Self {
        TableSchema {
            columns: vec![
                COL_INDICATOR.to_string(),
                COL_YEAR.to_string(),
                COL_VALUE.to_string(),
            ],
            extra: Vec::new(),
        }
    }
}

/// Positions of the typed columns inside a raw header row.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    pub indicator: usize,
    pub year: usize,
    pub value: usize,
    pub extra: Vec<usize>,
}

/// The immutable dataset the exploration engine derives every view from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedTable {
    pub schema: TableSchema,
    pub records: Vec<CleanedRecord>,
}

impl CleanedTable {
    pub fn new(schema: TableSchema, records: Vec<CleanedRecord>) -> Self {
        CleanedTable { schema, records }
    }

    /// Table with only the canonical columns (handy for tests and fixtures).
    pub fn from_records(records: Vec<CleanedRecord>) -> Self {
        CleanedTable::new(TableSchema::canonical(), records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct indicator names in first-seen order.
    pub fn indicator_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .map(|r| r.indicator.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Min and max year present, if any rows exist.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Load a cleaned CSV file written by the cleaning pipeline.
    pub fn load(path: &Path) -> Result<CleanedTable> {
        let file = File::open(path)?;
        let table = Self::from_reader(file)?;
        info!(path = %path.display(), rows = table.len(), "loaded cleaned table");
        Ok(table)
    }

    /// Parse cleaned CSV. Stricter than the cleaning pipeline: a Value that is
    /// neither empty nor numeric means the file was not produced by it.
    pub fn from_reader<R: Read>(reader: R) -> Result<CleanedTable> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let (schema, index) = TableSchema::from_headers(&headers)?;

        let mut records = Vec::new();
        for (row_num, result) in reader.records().enumerate() {
            let record = result?;
            let line = row_num + 2; // 1-indexed + header row
            let field = |i: usize| record.get(i).unwrap_or("");

            let year = parse_year(field(index.year))
                .ok_or_else(|| DataError::InvalidYear {
                    line,
                    value: field(index.year).to_string(),
                })?;

            let raw_value = field(index.value).trim();
            let value = if raw_value.is_empty() {
                None
            } else {
                Some(parse_value(raw_value).ok_or_else(|| DataError::InvalidValue {
                    line,
                    value: raw_value.to_string(),
                })?)
            };

            records.push(CleanedRecord {
                indicator: field(index.indicator).to_string(),
                year,
                value,
                extra: index.extra.iter().map(|&i| field(i).to_string()).collect(),
            });
        }

        Ok(CleanedTable { schema, records })
    }

    // ========================================================================
    // WRITING
    // ========================================================================

    /// Write header + all rows, no index column.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        write_rows(&self.schema, self.records.iter(), writer)
    }

    /// Write to `path` through a sibling temp file, so a failure never
    /// leaves a truncated table behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("csv.tmp");
        {
            let file = File::create(&tmp)?;
            if let Err(e) = self.write_to(file) {
                let _ = std::fs::remove_file(&tmp);
                return Err(e);
            }
        }
        std::fs::rename(&tmp, path)?;
        info!(path = %path.display(), rows = self.len(), "saved cleaned table");
        Ok(())
    }
}

/// Serialize rows under `schema`. Shared by `save` and the detail export.
pub fn write_rows<'a, W, I>(schema: &TableSchema, rows: I, writer: W) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a CleanedRecord>,
{
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(&schema.columns)?;

    for row in rows {
        wtr.write_record(row.fields(&schema.columns))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Decimal text for a value, empty for missing.
pub fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Integer year that is also a representable calendar year.
pub fn parse_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.trim().parse().ok()?;
    chrono::NaiveDate::from_ymd_opt(year, 1, 1).map(|_| year)
}

/// Finite float, or `None` ("n/a", "..", "", "NaN", "inf" all count as missing).
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Indicator Name,Indicator Code,Year,Value
Unemployment rate,SL.UEM,2010,4.9
Unemployment rate,SL.UEM,2011,
Unemployment rate,SL.UEM,2012,4.0
";

    #[test]
    fn test_load_keeps_pass_through_columns() {
        let table = CleanedTable::from_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.schema.extra, vec!["Indicator Code".to_string()]);
        assert_eq!(table.records[0].extra, vec!["SL.UEM".to_string()]);
        assert_eq!(table.records[1].value, None);
        assert_eq!(table.records[2].value, Some(4.0));
    }

    #[test]
    fn test_write_then_load_is_stable() {
        let table = CleanedTable::from_reader(SAMPLE.as_bytes()).unwrap();

        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("Indicator Name,Indicator Code,Year,Value\n"));
        assert!(text.contains("Unemployment rate,SL.UEM,2011,\n"));

        let reloaded = CleanedTable::from_reader(out.as_slice()).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn test_load_rejects_non_numeric_value() {
        let csv = "Indicator Name,Year,Value\nX,2010,abc\n";
        let err = CleanedTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::InvalidValue { line: 2, .. }));
    }

    #[test]
    fn test_load_requires_typed_columns() {
        let csv = "Indicator Name,Year\nX,2010\n";
        let err = CleanedTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(ref c) if c == "Value"));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_year(" 2015 "), Some(2015));
        assert_eq!(parse_year("2015.0"), None);
        assert_eq!(parse_year("abc"), None);
        assert_eq!(parse_value("5.2"), Some(5.2));
        assert_eq!(parse_value("n/a"), None);
        assert_eq!(parse_value("NaN"), None);
        assert_eq!(parse_value("inf"), None);
        assert_eq!(format_value(None), "");
        assert_eq!(format_value(Some(7.1)), "7.1");
    }

    #[test]
    fn test_save_via_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned_data.csv");
        let table = CleanedTable::from_records(vec![CleanedRecord::new("X", 2020, Some(1.5))]);

        table.save(&path).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("cleaned_data.csv.tmp").exists());
        assert_eq!(CleanedTable::load(&path).unwrap(), table);
    }

    #[test]
    fn test_indicator_names_and_bounds() {
        let table = CleanedTable::from_records(vec![
            CleanedRecord::new("B", 2012, None),
            CleanedRecord::new("A", 2009, Some(1.0)),
            CleanedRecord::new("B", 2015, Some(2.0)),
        ]);
        assert_eq!(table.indicator_names(), vec!["B", "A"]);
        assert_eq!(table.year_bounds(), Some((2009, 2015)));
        assert_eq!(CleanedTable::from_records(vec![]).year_bounds(), None);
    }
}
