//! Dataset loading from JSON and CSV files.
//!
//! JSON documents carry their own schema:
//!
//! ```json
//! {
//!   "attributes": [
//!     { "name": "name", "type": "nominal", "label": true },
//!     { "name": "age",  "type": "integer" }
//!   ],
//!   "records": [ { "name": "A", "age": 1 }, { "name": "B", "age": 2 } ]
//! }
//! ```
//!
//! CSV files take their schema from `name:type[:label]` declarations; without
//! declarations every header column is a nominal attribute. Empty cells and
//! `?` are missing values.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, DatasetResult};

use super::{
    Attribute, AttributeKind, AttributeSchema, Dataset, Record, Value, ValueType,
    has_four_digit_year,
};

/// Declaration of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub label: bool,
}

/// Parses `name:type` or `name:type:label`. The name may itself contain `:`.
impl FromStr for AttributeDecl {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DatasetError::InvalidDeclaration {
            declaration: s.to_string(),
        };
        let (rest, label) = match s.strip_suffix(":label") {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let (name, value_type) = rest.rsplit_once(':').ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            name: name.to_string(),
            value_type: value_type.parse()?,
            label,
        })
    }
}

/// Build a schema from declarations, in order.
pub fn schema_from_decls(decls: &[AttributeDecl]) -> DatasetResult<AttributeSchema> {
    decls
        .iter()
        .fold(AttributeSchema::builder(), |builder, decl| {
            builder.push(decl.name.clone(), decl.value_type, decl.label)
        })
        .build()
}

/// Load a `.json` or `.csv` dataset. `decls` applies to CSV only.
pub fn load(path: &Path, decls: &[AttributeDecl]) -> DatasetResult<Dataset> {
    let origin = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => {
            let text = std::fs::read_to_string(path).map_err(|e| DatasetError::Read {
                path: origin.clone(),
                source: e,
            })?;
            parse_json(&text, &origin)
        }
        Some("csv") => {
            let file = std::fs::File::open(path).map_err(|e| DatasetError::Read {
                path: origin.clone(),
                source: e,
            })?;
            parse_csv(file, decls, &origin)
        }
        _ => Err(DatasetError::UnsupportedFormat { path: origin }),
    }
}

/// Parse a JSON dataset document.
pub fn from_json_str(text: &str) -> DatasetResult<Dataset> {
    parse_json(text, "<input>")
}

/// Parse CSV with a header row.
pub fn from_csv_reader<R: Read>(reader: R, decls: &[AttributeDecl]) -> DatasetResult<Dataset> {
    parse_csv(reader, decls, "<input>")
}

#[derive(Deserialize)]
struct JsonDataset {
    attributes: Vec<AttributeDecl>,
    #[serde(default)]
    records: Vec<serde_json::Map<String, serde_json::Value>>,
}

fn parse_json(text: &str, origin: &str) -> DatasetResult<Dataset> {
    let doc: JsonDataset = serde_json::from_str(text).map_err(|e| DatasetError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })?;

    let mut dataset = Dataset::new(schema_from_decls(&doc.attributes)?);
    for row in doc.records {
        let mut record = Record::new();
        for (name, raw) in &row {
            let attribute =
                dataset
                    .schema()
                    .get(name)
                    .ok_or_else(|| DatasetError::UnknownAttribute {
                        name: name.clone(),
                    })?;
            if let Some(value) = json_value(attribute, raw)? {
                record.set(name.clone(), value);
            }
        }
        dataset.push(record)?;
    }
    Ok(dataset)
}

fn parse_csv<R: Read>(reader: R, decls: &[AttributeDecl], origin: &str) -> DatasetResult<Dataset> {
    let parse_error = |e: csv::Error| DatasetError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers = reader.headers().map_err(parse_error)?.clone();

    let schema = if decls.is_empty() {
        headers
            .iter()
            .fold(AttributeSchema::builder(), |builder, column| {
                builder.attribute(column, ValueType::Nominal)
            })
            .build()?
    } else {
        schema_from_decls(decls)?
    };

    let mut columns = Vec::with_capacity(headers.len());
    for column in headers.iter() {
        let attribute = schema
            .get(column)
            .ok_or_else(|| DatasetError::UnknownAttribute {
                name: column.to_string(),
            })?;
        columns.push(attribute.clone());
    }

    let mut dataset = Dataset::new(schema);
    for row in reader.records() {
        let row = row.map_err(parse_error)?;
        let mut record = Record::new();
        for (attribute, raw) in columns.iter().zip(row.iter()) {
            if let Some(value) = parse_value(attribute, raw)? {
                record.set(attribute.name(), value);
            }
        }
        dataset.push(record)?;
    }
    Ok(dataset)
}

/// Parse a textual cell according to the attribute's kind.
///
/// Nominal cells are kept verbatim; numeric and date/time cells ignore
/// surrounding whitespace.
pub fn parse_value(attribute: &Attribute, raw: &str) -> DatasetResult<Option<Value>> {
    let cell = match attribute.kind() {
        AttributeKind::Nominal => raw,
        _ => raw.trim(),
    };
    if cell.is_empty() || cell == "?" {
        return Ok(None);
    }
    let invalid = || DatasetError::InvalidValue {
        attribute: attribute.name().to_string(),
        value: raw.to_string(),
        expected: attribute.kind(),
    };
    match attribute.kind() {
        AttributeKind::Nominal => Ok(Some(Value::Text(cell.to_string()))),
        AttributeKind::Numeric => cell
            .parse::<f64>()
            .map(|n| Some(Value::Number(n)))
            .map_err(|_| invalid()),
        AttributeKind::DateTime => parse_timestamp(cell)
            .filter(has_four_digit_year)
            .map(|ts| Some(Value::Timestamp(ts)))
            .ok_or_else(invalid),
    }
}

fn json_value(attribute: &Attribute, raw: &serde_json::Value) -> DatasetResult<Option<Value>> {
    use serde_json::Value as Json;

    let invalid = || DatasetError::InvalidValue {
        attribute: attribute.name().to_string(),
        value: raw.to_string(),
        expected: attribute.kind(),
    };
    match (attribute.kind(), raw) {
        (_, Json::Null) => Ok(None),
        (_, Json::String(s)) => parse_value(attribute, s),
        (AttributeKind::Nominal, Json::Bool(b)) => Ok(Some(Value::Text(b.to_string()))),
        (AttributeKind::Nominal, Json::Number(n)) => Ok(Some(Value::Text(n.to_string()))),
        (AttributeKind::Numeric, Json::Number(n)) => {
            n.as_f64().map(|n| Some(Value::Number(n))).ok_or_else(invalid)
        }
        // Epoch milliseconds.
        (AttributeKind::DateTime, Json::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .filter(has_four_digit_year)
            .map(|ts| Some(Value::Timestamp(ts)))
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// RFC 3339, `YYYY-MM-DD[ HH:MM:SS[.f]]` (UTC), `HH:MM:SS[.f]` (on the epoch
/// date), or epoch milliseconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M:%S%.f") {
        return Some(NaiveDate::from_ymd_opt(1970, 1, 1)?.and_time(time).and_utc());
    }
    raw.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}
