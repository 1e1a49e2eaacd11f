use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, UInt64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{
    CellValue, DISASTER_TYPE_COLUMN, DisasterRecord, GeoCollection, ISO_COLUMN, START_YEAR_COLUMN,
};

const REQUIRED_COLUMNS: [&str; 3] = [ISO_COLUMN, DISASTER_TYPE_COLUMN, START_YEAR_COLUMN];

/// Why a dataset could not be loaded at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

impl LoadError {
    fn parse(path: &Path, err: anyhow::Error) -> Self {
        LoadError::Parse {
            path: path.to_path_buf(),
            message: format!("{err:#}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the disaster events table.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one event per line (recommended)
/// * `.json`    – `[{ "ISO": "FRA", "Disaster Type": "Flood", "Start Year": 2001, ... }, ...]`
/// * `.parquet` – columnar file with the same column names
///
/// Every format must carry the `ISO`, `Disaster Type` and `Start Year`
/// columns; all other columns are kept as pass-through attributes.
pub fn load_records(path: &Path) -> Result<Vec<DisasterRecord>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let result = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(anyhow::anyhow!("Unsupported file extension: .{other}")),
    };
    result.map_err(|err| LoadError::parse(path, err))
}

/// Load the country boundary FeatureCollection.
pub fn load_geometry(path: &Path) -> Result<GeoCollection, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    parse_geometry(path).map_err(|err| LoadError::parse(path, err))
}

fn parse_geometry(path: &Path) -> Result<GeoCollection> {
    let file = File::open(path).context("opening GeoJSON file")?;
    let collection: GeoCollection =
        serde_json::from_reader(BufReader::new(file)).context("parsing FeatureCollection")?;

    let without_id = collection
        .features
        .iter()
        .filter(|f| f.country_code().is_none())
        .count();
    if without_id > 0 {
        log::warn!(
            "{} of {} features in {} have no string id and will never match a lookup",
            without_id,
            collection.features.len(),
            path.display()
        );
    }
    Ok(collection)
}

fn build_record(cells: BTreeMap<String, CellValue>, row: usize) -> Result<DisasterRecord> {
    DisasterRecord::from_cells(cells).map_err(|col| anyhow::anyhow!("Row {row}: missing '{col}'"))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one event per line.
/// Every cell is typed the way a dataframe reader would guess it.
fn load_csv(path: &Path) -> Result<Vec<DisasterRecord>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() {
        bail!("CSV has no header row");
    }
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            bail!("CSV missing '{required}' column");
        }
    }

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let cells: BTreeMap<String, CellValue> = headers
            .iter()
            .zip(row.iter())
            .map(|(col, value)| (col.clone(), guess_cell_type(value)))
            .collect();

        records.push(build_record(cells, row_no)?);
    }

    Ok(records)
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        // "NaN" / "inf" stay text rather than turning into JSON null.
        if f.is_finite() {
            return CellValue::Float(f);
        }
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "ISO": "FRA", "Disaster Type": "Flood", "Start Year": 2001, "Total Deaths": 3 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<DisasterRecord>> {
    let file = File::open(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_reader(BufReader::new(file)).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let obj = row
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            let cells = obj
                .iter()
                .map(|(key, val)| (key.clone(), CellValue::from(val)))
                .collect();
            build_record(cells, i)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of disaster events.
///
/// Dictionary-encoded (categorical) and view columns are decoded, every
/// integer and float width is widened, and any other type (dates, timestamps,
/// decimals) is carried as its display text.  Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<DisasterRecord>> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema();
    for required in REQUIRED_COLUMNS {
        if schema.index_of(required).is_err() {
            bail!("Parquet file missing '{required}' column");
        }
    }

    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let columns: Vec<ArrayRef> = batch
            .columns()
            .iter()
            .zip(schema.fields())
            .map(|(col, field)| {
                normalize_column(col).with_context(|| format!("decoding column '{}'", field.name()))
            })
            .collect::<Result<_>>()?;

        let options = FormatOptions::default();
        let formatters: Vec<Option<ArrayFormatter>> = columns
            .iter()
            .map(|col| ArrayFormatter::try_new(col.as_ref(), &options).ok())
            .collect();

        for row in 0..batch.num_rows() {
            let cells = schema
                .fields()
                .iter()
                .zip(columns.iter().zip(&formatters))
                .map(|(field, (col, formatter))| {
                    let cell = extract_cell(col.as_ref(), formatter.as_ref(), row);
                    (field.name().clone(), cell)
                })
                .collect();
            let row_no = records.len();
            records.push(build_record(cells, row_no)?);
        }
    }

    Ok(records)
}

/// Decode dictionaries and widen narrow numeric types so [`extract_cell`]
/// only has to handle a handful of physical types.
fn normalize_column(col: &ArrayRef) -> Result<ArrayRef> {
    let target = match col.data_type() {
        DataType::Dictionary(_, values) => {
            let decoded = cast(col.as_ref(), values.as_ref())?;
            return normalize_column(&decoded);
        }
        DataType::Utf8View | DataType::LargeUtf8 => DataType::Utf8,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => DataType::Int64,
        DataType::Float16 | DataType::Float32 => DataType::Float64,
        _ => return Ok(Arc::clone(col)),
    };
    Ok(cast(col.as_ref(), &target)?)
}

/// Extract a single cell from a normalized Arrow column at a given row.
fn extract_cell(col: &dyn Array, formatter: Option<&ArrayFormatter<'_>>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let value = match col.data_type() {
        DataType::Null => Some(CellValue::Null),
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::UInt64 => col.as_primitive_opt::<UInt64Type>().map(|a| {
            let v = a.value(row);
            i64::try_from(v)
                .map(CellValue::Integer)
                .unwrap_or_else(|_| CellValue::String(v.to_string()))
        }),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| CellValue::Bool(a.value(row))),
        _ => formatter.map(|f| CellValue::String(f.value(row).to_string())),
    };
    value.unwrap_or(CellValue::Null)
}
