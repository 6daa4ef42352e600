//! CSV ingest and schema validation.
//!
//! This module turns the raw housing CSV into `RawRecord`s:
//! - **Strict schema**: every expected column must be present in the header
//! - **Typed cells**: a non-empty numeric cell that does not parse aborts the load
//! - **Blank numeric cells** become `None` and are imputed later
//! - No splitting or feature logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{CATEGORICAL_COLUMN, LABEL_COLUMN, NUMERIC_COLUMNS, RawRecord};
use crate::error::{HousingError, Result};

/// Load the housing CSV at `path`.
pub fn load_housing_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path)
        .map_err(|e| HousingError::io(format!("Failed to open housing CSV '{}'", path.display()), e))?;
    let records = read_housing_records(file, &path.display().to_string())?;
    info!(path = %path.display(), rows = records.len(), "loaded housing dataset");
    Ok(records)
}

/// Parse housing rows from any reader. `source` only labels error messages.
pub fn read_housing_records<R: Read>(reader: R, source: &str) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| HousingError::schema(source, "<header>", format!("could not be read: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    let columns = ColumnIndex::resolve(&header_map, source)?;
    debug!(source, columns = headers.len(), "housing CSV header validated");

    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, CSV lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| {
            HousingError::schema(source, "<row>", format!("line {line} could not be parsed: {e}"))
        })?;
        out.push(parse_row(&record, &columns, source, line)?);
    }
    Ok(out)
}

/// Positions of the expected columns inside a CSV row.
struct ColumnIndex {
    numeric: [usize; 8],
    label: usize,
    categorical: usize,
}

impl ColumnIndex {
    fn resolve(header_map: &HashMap<String, usize>, source: &str) -> Result<Self> {
        let lookup = |name: &str| {
            header_map
                .get(name)
                .copied()
                .ok_or_else(|| HousingError::schema(source, name, "is missing from the header"))
        };

        let mut numeric = [0usize; 8];
        for (slot, name) in numeric.iter_mut().zip(NUMERIC_COLUMNS) {
            *slot = lookup(name)?;
        }

        Ok(Self {
            numeric,
            label: lookup(LABEL_COLUMN)?,
            categorical: lookup(CATEGORICAL_COLUMN)?,
        })
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, columns: &ColumnIndex, source: &str, line: usize) -> Result<RawRecord> {
    let mut numeric = [None; 8];
    for ((slot, idx), name) in numeric.iter_mut().zip(columns.numeric).zip(NUMERIC_COLUMNS) {
        *slot = parse_opt_f64(record.get(idx), name, source, line)?;
    }

    let median_house_value = parse_opt_f64(record.get(columns.label), LABEL_COLUMN, source, line)?
        .ok_or_else(|| HousingError::schema(source, LABEL_COLUMN, format!("has no value on line {line}")))?;

    let ocean_proximity = record
        .get(columns.categorical)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HousingError::schema(source, CATEGORICAL_COLUMN, format!("has no value on line {line}")))?
        .to_string();

    let [
        longitude,
        latitude,
        housing_median_age,
        total_rooms,
        total_bedrooms,
        population,
        households,
        median_income,
    ] = numeric;

    Ok(RawRecord {
        longitude,
        latitude,
        housing_median_age,
        total_rooms,
        total_bedrooms,
        population,
        households,
        median_income,
        median_house_value,
        ocean_proximity,
    })
}

/// Blank cells are missing values; anything else must be a finite number.
fn parse_opt_f64(cell: Option<&str>, column: &str, source: &str, line: usize) -> Result<Option<f64>> {
    let Some(s) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Err(HousingError::schema(
            source,
            column,
            format!("has non-finite value '{s}' on line {line}"),
        )),
        Err(_) => Err(HousingError::schema(
            source,
            column,
            format!("has non-numeric value '{s}' on line {line}"),
        )),
    }
}
