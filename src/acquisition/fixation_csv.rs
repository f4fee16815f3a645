//! Fixation CSV Reader
//!
//! Parses the eye-tracker fixation export (`;`-separated, header row) into
//! [`FixationRecord`]s. Loading is all-or-nothing: the first malformed row
//! aborts the load with a [`DataLoadError`] naming the file, line and column.
//!
//! ## Columns
//!
//! Required: `user`, `CityMap`, `description`, `FixationDuration`,
//! `FixationIndex`, `MappedFixationPointX`, `MappedFixationPointY`.
//!
//! Optional: `City` (derived from `CityMap` when absent), `Timestamp`,
//! `StimuliName`, `NormalizedXFixationPointX`, `SaccadeLength`.

use crate::types::{Condition, FixationRecord};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Fatal input error. There is no partial or degraded load.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is empty: no header row", .path.display())]
    Empty { path: PathBuf },

    #[error("{}: header is not '{expected}'-separated (looks '{found}'-separated)", .path.display())]
    SeparatorMismatch {
        path: PathBuf,
        expected: char,
        found: char,
    },

    #[error("{}: missing required column(s): {}", .path.display(), .columns.join(", "))]
    MissingColumns {
        path: PathBuf,
        columns: Vec<&'static str>,
    },

    #[error("{}, line {line}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("{}, line {line}, column {column}: {reason} (value '{value}')", .path.display())]
    InvalidField {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{} has a header but no fixation rows", .path.display())]
    NoRecords { path: PathBuf },
}

// ============================================================================
// Column Names
// ============================================================================

pub const COL_USER: &str = "user";
pub const COL_CITY_MAP: &str = "CityMap";
pub const COL_CITY: &str = "City";
pub const COL_DESCRIPTION: &str = "description";
pub const COL_TIMESTAMP: &str = "Timestamp";
pub const COL_STIMULUS: &str = "StimuliName";
pub const COL_FIXATION_INDEX: &str = "FixationIndex";
pub const COL_FIXATION_DURATION: &str = "FixationDuration";
pub const COL_MAPPED_X: &str = "MappedFixationPointX";
pub const COL_MAPPED_Y: &str = "MappedFixationPointY";
pub const COL_NORMALIZED_X: &str = "NormalizedXFixationPointX";
pub const COL_SACCADE_LENGTH: &str = "SaccadeLength";

/// Reader options.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    /// Field separator byte
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

// ============================================================================
// Column Mapping
// ============================================================================

/// Maps the export's column names to field indices
#[derive(Debug, Clone, Default)]
struct ColumnMap {
    user: Option<usize>,
    city_map: Option<usize>,
    city: Option<usize>,
    description: Option<usize>,
    timestamp: Option<usize>,
    stimulus: Option<usize>,
    fixation_index: Option<usize>,
    fixation_duration: Option<usize>,
    mapped_x: Option<usize>,
    mapped_y: Option<usize>,
    normalized_x: Option<usize>,
    saccade_length: Option<usize>,
}

/// Indices of the required columns, known to be present after validation
#[derive(Debug, Clone, Copy)]
struct RequiredColumns {
    user: usize,
    city_map: usize,
    description: usize,
    fixation_index: usize,
    fixation_duration: usize,
    mapped_x: usize,
    mapped_y: usize,
}

impl ColumnMap {
    /// Build from header names. Matching is exact (case-sensitive) as the
    /// exporting tool writes them; a leading byte-order mark is ignored.
    fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut map = Self::default();
        for (idx, name) in headers.into_iter().enumerate() {
            let slot = match name.trim().trim_start_matches('\u{feff}') {
                COL_USER => &mut map.user,
                COL_CITY_MAP => &mut map.city_map,
                COL_CITY => &mut map.city,
                COL_DESCRIPTION => &mut map.description,
                COL_TIMESTAMP => &mut map.timestamp,
                COL_STIMULUS => &mut map.stimulus,
                COL_FIXATION_INDEX => &mut map.fixation_index,
                COL_FIXATION_DURATION => &mut map.fixation_duration,
                COL_MAPPED_X => &mut map.mapped_x,
                COL_MAPPED_Y => &mut map.mapped_y,
                COL_NORMALIZED_X => &mut map.normalized_x,
                COL_SACCADE_LENGTH => &mut map.saccade_length,
                _ => continue,
            };
            // First occurrence wins on duplicated headers
            if slot.is_none() {
                *slot = Some(idx);
            }
        }
        map
    }

    /// Required column indices, or the names of all missing ones.
    fn required(&self) -> Result<RequiredColumns, Vec<&'static str>> {
        let mut missing = Vec::new();
        let mut need = |idx: Option<usize>, name: &'static str| {
            if idx.is_none() {
                missing.push(name);
            }
            idx.unwrap_or_default()
        };

        let required = RequiredColumns {
            user: need(self.user, COL_USER),
            city_map: need(self.city_map, COL_CITY_MAP),
            description: need(self.description, COL_DESCRIPTION),
            fixation_index: need(self.fixation_index, COL_FIXATION_INDEX),
            fixation_duration: need(self.fixation_duration, COL_FIXATION_DURATION),
            mapped_x: need(self.mapped_x, COL_MAPPED_X),
            mapped_y: need(self.mapped_y, COL_MAPPED_Y),
        };

        if missing.is_empty() {
            Ok(required)
        } else {
            Err(missing)
        }
    }

    /// Optional columns that were not found, for the load log line
    fn missing_optional(&self) -> Vec<&'static str> {
        [
            (self.city, COL_CITY),
            (self.timestamp, COL_TIMESTAMP),
            (self.stimulus, COL_STIMULUS),
            (self.normalized_x, COL_NORMALIZED_X),
            (self.saccade_length, COL_SACCADE_LENGTH),
        ]
        .into_iter()
        .filter(|(idx, _)| idx.is_none())
        .map(|(_, name)| name)
        .collect()
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Read every fixation row of a CSV export.
///
/// Fails on the first problem; never skips rows.
pub fn read_fixations(path: impl AsRef<Path>, options: CsvOptions) -> Result<Vec<FixationRecord>, DataLoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv {
            path: path.to_path_buf(),
            line: 1,
            source,
        })?
        .clone();

    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(DataLoadError::Empty { path: path.to_path_buf() });
    }

    if headers.len() == 1 {
        let sole = &headers[0];
        if let Some(found) = [',', '\t', ';'].into_iter().find(|c| sole.contains(*c)) {
            return Err(DataLoadError::SeparatorMismatch {
                path: path.to_path_buf(),
                expected: char::from(options.delimiter),
                found,
            });
        }
    }

    let col_map = ColumnMap::from_headers(headers.iter());
    let required = col_map.required().map_err(|columns| DataLoadError::MissingColumns {
        path: path.to_path_buf(),
        columns,
    })?;

    let missing_optional = col_map.missing_optional();
    if !missing_optional.is_empty() {
        tracing::debug!(file = %path.display(), missing = ?missing_optional, "Optional columns absent");
    }

    let mut records = Vec::new();
    let mut gray_aliases = 0usize;

    for (i, result) in reader.records().enumerate() {
        // Header occupies line 1
        let line = i as u64 + 2;
        let row = result.map_err(|source| DataLoadError::Csv {
            path: path.to_path_buf(),
            line,
            source,
        })?;

        let fields = RowFields { row: &row, path, line };
        let raw_condition = fields.required_str(required.description, COL_DESCRIPTION)?;
        if Condition::is_gray_alias(raw_condition) {
            gray_aliases += 1;
        }

        records.push(parse_row(&fields, &col_map, required)?);
    }

    if records.is_empty() {
        return Err(DataLoadError::NoRecords { path: path.to_path_buf() });
    }

    if gray_aliases > 0 {
        tracing::warn!(
            file = %path.display(),
            rows = gray_aliases,
            "'gray' condition labels folded into 'grey'"
        );
    }

    Ok(records)
}

// ============================================================================
// Row Parsing
// ============================================================================

/// One data row plus its location, for error reporting
struct RowFields<'a> {
    row: &'a csv::StringRecord,
    path: &'a Path,
    line: u64,
}

impl<'a> RowFields<'a> {
    fn invalid(&self, column: &'static str, value: &str, reason: &'static str) -> DataLoadError {
        DataLoadError::InvalidField {
            path: self.path.to_path_buf(),
            line: self.line,
            column,
            value: value.to_string(),
            reason,
        }
    }

    fn raw(&self, idx: usize) -> &'a str {
        // flexible(false) guarantees every row has the header's width
        self.row.get(idx).unwrap_or("")
    }

    fn required_str(&self, idx: usize, column: &'static str) -> Result<&'a str, DataLoadError> {
        let value = self.raw(idx);
        if is_missing(value) {
            return Err(self.invalid(column, value, "required value is empty"));
        }
        Ok(value)
    }

    fn optional_str(&self, idx: Option<usize>) -> Option<String> {
        idx.map(|i| self.raw(i))
            .filter(|s| !is_missing(s))
            .map(str::to_string)
    }

    fn required_f64(&self, idx: usize, column: &'static str) -> Result<f64, DataLoadError> {
        let value = self.required_str(idx, column)?;
        parse_finite(value).ok_or_else(|| self.invalid(column, value, "not a finite number"))
    }

    fn optional_f64(&self, idx: Option<usize>, column: &'static str) -> Result<Option<f64>, DataLoadError> {
        let Some(i) = idx else { return Ok(None) };
        let value = self.raw(i);
        if is_missing(value) {
            return Ok(None);
        }
        parse_finite(value)
            .map(Some)
            .ok_or_else(|| self.invalid(column, value, "not a finite number"))
    }

    fn required_index(&self, idx: usize, column: &'static str) -> Result<u32, DataLoadError> {
        let value = self.required_str(idx, column)?;
        if let Ok(n) = value.parse::<u32>() {
            return Ok(n);
        }
        // Some exports write integral columns as floats ("12.0")
        match parse_finite(value) {
            Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) => Ok(f as u32),
            _ => Err(self.invalid(column, value, "not a non-negative integer")),
        }
    }
}

fn parse_row(
    fields: &RowFields<'_>,
    col_map: &ColumnMap,
    required: RequiredColumns,
) -> Result<FixationRecord, DataLoadError> {
    let user = fields.required_str(required.user, COL_USER)?.to_string();
    let city_map = fields.required_str(required.city_map, COL_CITY_MAP)?.to_string();

    let raw_condition = fields.required_str(required.description, COL_DESCRIPTION)?;
    let condition = Condition::parse(raw_condition)
        .ok_or_else(|| fields.invalid(COL_DESCRIPTION, raw_condition, "expected color, grey or gray"))?;

    let fixation_duration = fields.required_f64(required.fixation_duration, COL_FIXATION_DURATION)?;
    if fixation_duration < 0.0 {
        return Err(fields.invalid(
            COL_FIXATION_DURATION,
            fields.raw(required.fixation_duration),
            "duration cannot be negative",
        ));
    }

    let city = match col_map.city {
        Some(idx) => fields.required_str(idx, COL_CITY)?.to_string(),
        None => derive_city(&city_map).to_string(),
    };

    Ok(FixationRecord {
        timestamp: fields.optional_str(col_map.timestamp),
        stimulus_name: fields.optional_str(col_map.stimulus),
        fixation_index: fields.required_index(required.fixation_index, COL_FIXATION_INDEX)?,
        fixation_duration,
        mapped_x: fields.required_f64(required.mapped_x, COL_MAPPED_X)?,
        mapped_y: fields.required_f64(required.mapped_y, COL_MAPPED_Y)?,
        normalized_x: fields.optional_f64(col_map.normalized_x, COL_NORMALIZED_X)?,
        saccade_length: fields.optional_f64(col_map.saccade_length, COL_SACCADE_LENGTH)?,
        user,
        city_map,
        city,
        condition,
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Empty cells and the usual NaN spellings count as missing.
fn is_missing(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("na")
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Base city of a map variant: `Antwerpen_S1` -> `Antwerpen`.
///
/// Only a trailing `_S<digits>` session suffix is stripped.
pub fn derive_city(city_map: &str) -> &str {
    if let Some((base, suffix)) = city_map.rsplit_once('_') {
        let session = suffix.strip_prefix('S').or_else(|| suffix.strip_prefix('s'));
        if let Some(digits) = session {
            if !base.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return base;
            }
        }
    }
    city_map
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Timestamp;StimuliName;FixationIndex;FixationDuration;MappedFixationPointX;MappedFixationPointY;NormalizedXFixationPointX;SaccadeLength;user;CityMap;City;description";

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_reads_full_header() {
        let file = write_csv(&format!(
            "{HEADER}\n\
             100;01_Antwerpen_S1_Color.jpg;1;250;100.5;200;110;;p1;Antwerpen_S1;Antwerpen;color\n\
             350;01_Antwerpen_S1_Color.jpg;2;300;150;220;160;55.2;p1;Antwerpen_S1;Antwerpen;color\n"
        ));
        let records = read_fixations(file.path(), CsvOptions::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user, "p1");
        assert_eq!(records[0].fixation_duration, 250.0);
        assert_eq!(records[0].saccade_length, None);
        assert_eq!(records[0].normalized_x, Some(110.0));
        assert_eq!(records[1].saccade_length, Some(55.2));
        assert_eq!(records[1].timestamp.as_deref(), Some("350"));
        assert_eq!(records[1].condition, Condition::Color);
    }

    #[test]
    fn test_gray_alias_and_derived_city() {
        let file = write_csv(
            "user;CityMap;description;FixationIndex;FixationDuration;MappedFixationPointX;MappedFixationPointY\n\
             p2;Zürich_S2;Gray;4;120;1;2\n",
        );
        let records = read_fixations(file.path(), CsvOptions::default()).unwrap();
        assert_eq!(records[0].condition, Condition::Grey);
        assert_eq!(records[0].city, "Zürich");
        assert_eq!(records[0].fixation_index, 4);
    }

    #[test]
    fn test_missing_required_columns_lists_all() {
        let file = write_csv("user;City;FixationIndex;MappedFixationPointX;MappedFixationPointY\np1;X;1;1;1\n");
        match read_fixations(file.path(), CsvOptions::default()) {
            Err(DataLoadError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec![COL_CITY_MAP, COL_DESCRIPTION, COL_FIXATION_DURATION]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_comma_separated_file_rejected() {
        let file = write_csv("user,CityMap,description,FixationDuration\np1,A_S1,color,100\n");
        assert!(matches!(
            read_fixations(file.path(), CsvOptions::default()),
            Err(DataLoadError::SeparatorMismatch { expected: ';', found: ',', .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = read_fixations("/definitely/not/here.csv", CsvOptions::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
        assert!(err.to_string().contains("here.csv"));
    }

    #[test]
    fn test_empty_and_header_only() {
        let empty = write_csv("");
        assert!(matches!(
            read_fixations(empty.path(), CsvOptions::default()),
            Err(DataLoadError::Empty { .. })
        ));

        let header_only = write_csv(&format!("{HEADER}\n"));
        assert!(matches!(
            read_fixations(header_only.path(), CsvOptions::default()),
            Err(DataLoadError::NoRecords { .. })
        ));
    }

    #[test]
    fn test_bad_rows_fail_whole_load() {
        let negative = write_csv(&format!(
            "{HEADER}\n\
             1;s;1;100;1;1;;;p1;A_S1;A;color\n\
             2;s;2;-5;1;1;;;p1;A_S1;A;color\n"
        ));
        match read_fixations(negative.path(), CsvOptions::default()) {
            Err(DataLoadError::InvalidField { line, column, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, COL_FIXATION_DURATION);
            }
            other => panic!("expected InvalidField, got {other:?}"),
        }

        let unknown_condition = write_csv(&format!("{HEADER}\n1;s;1;100;1;1;;;p1;A_S1;A;sepia\n"));
        assert!(matches!(
            read_fixations(unknown_condition.path(), CsvOptions::default()),
            Err(DataLoadError::InvalidField { column: COL_DESCRIPTION, .. })
        ));

        let empty_user = write_csv(&format!("{HEADER}\n1;s;1;100;1;1;;;;A_S1;A;color\n"));
        assert!(matches!(
            read_fixations(empty_user.path(), CsvOptions::default()),
            Err(DataLoadError::InvalidField { column: COL_USER, .. })
        ));

        let ragged = write_csv(&format!("{HEADER}\n1;s;1;100;1;1;;;p1;A_S1;A\n"));
        assert!(matches!(
            read_fixations(ragged.path(), CsvOptions::default()),
            Err(DataLoadError::Csv { line: 2, .. })
        ));
    }

    #[test]
    fn test_float_written_index() {
        let file = write_csv(
            "user;CityMap;description;FixationIndex;FixationDuration;MappedFixationPointX;MappedFixationPointY;SaccadeLength\n\
             p1;A_S1;color;7.0;100;1;1;NaN\n",
        );
        let records = read_fixations(file.path(), CsvOptions::default()).unwrap();
        assert_eq!(records[0].fixation_index, 7);
        assert_eq!(records[0].saccade_length, None);
    }

    #[test]
    fn test_derive_city() {
        assert_eq!(derive_city("Antwerpen_S1"), "Antwerpen");
        assert_eq!(derive_city("Hong_Kong_S12"), "Hong_Kong");
        assert_eq!(derive_city("Antwerpen"), "Antwerpen");
        assert_eq!(derive_city("Bordeaux_Sud"), "Bordeaux_Sud");
        assert_eq!(derive_city("_S1"), "_S1");
    }
}
