//! Tabular datasets: attribute schemas, typed values, and records.
//!
//! A [`Dataset`] is an ordered sequence of [`Record`]s sharing one
//! [`AttributeSchema`]. Each attribute carries its declared [`ValueType`]
//! and the [`AttributeKind`] the classifier derived from it when the schema
//! was built, so every row of a write encodes its values the same way.

pub mod load;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::error::{DatasetError, DatasetResult};

/// Largest integer an `f64` represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Semantic kind of an attribute. Selects the literal form of its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Categorical or free text; encoded as a plain text literal.
    Nominal,
    /// An instant in time; encoded as an `xsd:dateTime` literal.
    DateTime,
    /// A number; encoded as an `xsd:double` literal.
    Numeric,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Nominal => write!(f, "nominal"),
            AttributeKind::DateTime => write!(f, "date/time"),
            AttributeKind::Numeric => write!(f, "numeric"),
        }
    }
}

/// Declared column type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Nominal,
    Binominal,
    Polynominal,
    Text,
    FilePath,
    DateTime,
    Date,
    Time,
    Numeric,
    Integer,
    Real,
}

impl ValueType {
    /// Whether this type belongs to the nominal family.
    pub fn is_nominal(self) -> bool {
        matches!(
            self,
            ValueType::Nominal
                | ValueType::Binominal
                | ValueType::Polynominal
                | ValueType::Text
                | ValueType::FilePath
        )
    }

    /// Whether this type belongs to the date/time family.
    pub fn is_date_time(self) -> bool {
        matches!(self, ValueType::DateTime | ValueType::Date | ValueType::Time)
    }
}

impl FromStr for ValueType {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nominal" => Ok(ValueType::Nominal),
            "binominal" => Ok(ValueType::Binominal),
            "polynominal" => Ok(ValueType::Polynominal),
            "text" | "string" => Ok(ValueType::Text),
            "file_path" => Ok(ValueType::FilePath),
            "date_time" | "datetime" => Ok(ValueType::DateTime),
            "date" => Ok(ValueType::Date),
            "time" => Ok(ValueType::Time),
            "numeric" | "number" => Ok(ValueType::Numeric),
            "integer" => Ok(ValueType::Integer),
            "real" => Ok(ValueType::Real),
            other => Err(DatasetError::UnknownValueType {
                name: other.to_string(),
            }),
        }
    }
}

/// A column of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
    label: bool,
}

impl Attribute {
    fn new(name: String, value_type: ValueType, label: bool) -> Self {
        Self {
            name,
            kind: classify(value_type),
            label,
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic kind, classified once when the schema was built.
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Whether this attribute identifies the subject of each row.
    pub fn is_label(&self) -> bool {
        self.label
    }
}

/// Ordered, immutable set of attributes with at most one label.
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    attributes: Vec<Attribute>,
    by_name: HashMap<String, usize>,
    label: Option<usize>,
}

impl AttributeSchema {
    /// Start building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// All attributes in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.by_name.get(name).map(|&i| &self.attributes[i])
    }

    /// The label attribute, if one is declared.
    pub fn label(&self) -> Option<&Attribute> {
        self.label.map(|i| &self.attributes[i])
    }

    /// Attributes that become properties: everything except the label.
    pub fn properties(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| !a.is_label())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Builder for [`AttributeSchema`]. Validation happens in [`SchemaBuilder::build`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    attributes: Vec<(String, ValueType, bool)>,
}

impl SchemaBuilder {
    /// Append a regular attribute.
    pub fn attribute(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.attributes.push((name.into(), value_type, false));
        self
    }

    /// Append the label attribute.
    pub fn label(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.attributes.push((name.into(), value_type, true));
        self
    }

    /// Append an attribute with an explicit label flag.
    pub fn push(mut self, name: impl Into<String>, value_type: ValueType, label: bool) -> Self {
        self.attributes.push((name.into(), value_type, label));
        self
    }

    pub fn build(self) -> DatasetResult<AttributeSchema> {
        let mut attributes = Vec::with_capacity(self.attributes.len());
        let mut by_name = HashMap::with_capacity(self.attributes.len());
        let mut label: Option<usize> = None;

        for (index, (name, value_type, is_label)) in self.attributes.into_iter().enumerate() {
            if name.is_empty() {
                return Err(DatasetError::EmptyAttributeName);
            }
            if by_name.contains_key(&name) {
                return Err(DatasetError::DuplicateAttribute { name });
            }
            if is_label {
                if let Some(first) = label {
                    let first: &Attribute = &attributes[first];
                    return Err(DatasetError::MultipleLabels {
                        first: first.name.clone(),
                        second: name,
                    });
                }
                label = Some(index);
            }
            by_name.insert(name.clone(), index);
            attributes.push(Attribute::new(name, value_type, is_label));
        }

        Ok(AttributeSchema {
            attributes,
            by_name,
            label,
        })
    }
}

// ---------------------------------------------------------------------------
// Values and records
// ---------------------------------------------------------------------------

/// A typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Number(_) => "numeric",
            Value::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Generic string rendering used for labels of non-nominal attributes.
///
/// Non-finite numbers use their `xsd:double` lexical forms (`NaN`, `INF`, `-INF`).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) if n.is_nan() => f.write_str("NaN"),
            Value::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "INF" } else { "-INF" })
            }
            Value::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) => write!(f, "{n}"),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

/// Whether `ts` falls in years `0000..=9999`, the range whose RFC 3339 form
/// parses back without loss.
pub fn has_four_digit_year(ts: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}

/// One row: attribute name to value. Absent attributes are missing values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Value of `name`, or `None` when missing.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered records sharing one schema.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: AttributeSchema,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(schema: AttributeSchema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    /// Append a record, rejecting values for attributes outside the schema.
    pub fn push(&mut self, record: Record) -> DatasetResult<()> {
        if let Some(unknown) = record.names().find(|n| self.schema.get(n).is_none()) {
            return Err(DatasetError::UnknownAttribute {
                name: unknown.to_string(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Build a dataset from a schema and records in one step.
    pub fn with_records(
        schema: AttributeSchema,
        records: impl IntoIterator<Item = Record>,
    ) -> DatasetResult<Self> {
        let mut dataset = Self::new(schema);
        for record in records {
            dataset.push(record)?;
        }
        Ok(dataset)
    }

    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
