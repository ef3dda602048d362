//! Statements and the per-record statement builder.
//!
//! [`StatementBuilder`] mints one predicate IRI per property attribute when
//! it is created, then turns each record into statements in schema order.
//! The label attribute is consumed by identity resolution and never becomes
//! a property.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use oxigraph::model::vocab::xsd;
use oxigraph::model::{Literal, NamedNode, Quad};

use crate::dataset::{AttributeKind, AttributeSchema, Record, Value, has_four_digit_year};
use crate::error::{BuildError, BuildResult};
use crate::identity::Subject;
use crate::iri::Namespace;

/// One `(subject, predicate, literal)` fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Subject,
    pub predicate: NamedNode,
    pub object: Literal,
}

impl Statement {
    /// Place this statement in a named graph.
    pub fn in_graph(&self, graph: &NamedNode) -> Quad {
        match &self.subject {
            Subject::Iri(iri) => Quad::new(
                iri.clone(),
                self.predicate.clone(),
                self.object.clone(),
                graph.clone(),
            ),
            Subject::Anonymous(node) => Quad::new(
                node.clone(),
                self.predicate.clone(),
                self.object.clone(),
                graph.clone(),
            ),
        }
    }
}

/// N-Triples form, including the terminating ` .`.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// Accumulating set of statements, flushed to the store after each record.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    statements: Vec<Statement>,
    seen: HashSet<Statement>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a statement. Returns `false` if it was already present.
    pub fn insert(&mut self, statement: Statement) -> bool {
        if self.seen.contains(&statement) {
            return false;
        }
        self.seen.insert(statement.clone());
        self.statements.push(statement);
        true
    }

    pub fn extend(&mut self, statements: impl IntoIterator<Item = Statement>) {
        for statement in statements {
            self.insert(statement);
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn clear(&mut self) {
        self.statements.clear();
        self.seen.clear();
    }

    /// Serialize as an N-Triples document.
    pub fn to_ntriples(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(&statement.to_string());
            out.push('\n');
        }
        out
    }

    /// All statements placed in `graph`.
    pub fn quads<'a>(&'a self, graph: &'a NamedNode) -> impl Iterator<Item = Quad> + 'a {
        self.statements.iter().map(move |s| s.in_graph(graph))
    }
}

// ---------------------------------------------------------------------------
// Literal encoding
// ---------------------------------------------------------------------------

/// Encode `value` in the literal form selected by `kind`.
pub fn encode_literal(attribute: &str, kind: AttributeKind, value: &Value) -> BuildResult<Literal> {
    match (kind, value) {
        (AttributeKind::Nominal, value) => Ok(Literal::new_simple_literal(value.to_string())),
        (AttributeKind::DateTime, Value::Timestamp(ts)) if !has_four_digit_year(ts) => {
            Err(BuildError::TimestampOutOfRange {
                attribute: attribute.to_string(),
                value: ts.to_rfc3339(),
            })
        }
        (AttributeKind::DateTime, Value::Timestamp(ts)) => Ok(Literal::new_typed_literal(
            ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            xsd::DATE_TIME,
        )),
        (AttributeKind::Numeric, Value::Number(n)) => Ok(Literal::from(*n)),
        (expected, found) => Err(BuildError::KindMismatch {
            attribute: attribute.to_string(),
            expected,
            found: found.type_name(),
        }),
    }
}

/// Decode an `xsd:dateTime` literal produced by [`encode_literal`].
pub fn decode_timestamp(literal: &Literal) -> Option<DateTime<Utc>> {
    if literal.datatype() != xsd::DATE_TIME {
        return None;
    }
    DateTime::parse_from_rfc3339(literal.value())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Property {
    name: String,
    kind: AttributeKind,
    predicate: NamedNode,
}

/// Converts records into statements about their subject.
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    properties: Vec<Property>,
}

impl StatementBuilder {
    /// Mint predicates for every non-label attribute of `schema`.
    pub fn new(schema: &AttributeSchema, namespace: &Namespace) -> BuildResult<Self> {
        let properties = schema
            .properties()
            .map(|attr| {
                Ok(Property {
                    name: attr.name().to_string(),
                    kind: attr.kind(),
                    predicate: namespace.mint(attr.name())?,
                })
            })
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(Self { properties })
    }

    /// Predicate minted for attribute `name`, if it is a property.
    pub fn predicate(&self, name: &str) -> Option<&NamedNode> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.predicate)
    }

    /// Statements for `record`, in schema order. Missing values are skipped.
    pub fn build(&self, record: &Record, subject: &Subject) -> BuildResult<Vec<Statement>> {
        let mut statements = Vec::with_capacity(self.properties.len());
        for property in &self.properties {
            let Some(value) = record.get(&property.name) else {
                continue;
            };
            statements.push(Statement {
                subject: subject.clone(),
                predicate: property.predicate.clone(),
                object: encode_literal(&property.name, property.kind, value)?,
            });
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};
    use oxigraph::model::BlankNode;

    use super::*;
    use crate::dataset::ValueType;

    fn ns() -> Namespace {
        Namespace::new("http://example.com/").unwrap()
    }

    #[test]
    fn label_is_not_emitted_as_property() {
        let schema = AttributeSchema::builder()
            .label("name", ValueType::Nominal)
            .attribute("age", ValueType::Integer)
            .build()
            .unwrap();
        let builder = StatementBuilder::new(&schema, &ns()).unwrap();
        assert!(builder.predicate("name").is_none());

        let subject = Subject::Iri(ns().mint("A").unwrap());
        let record = Record::new().with("name", "A").with("age", 1);
        let statements = builder.build(&record, &subject).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].predicate.as_str(), "http://example.com/age");
        assert_eq!(statements[0].subject, subject);
    }

    #[test]
    fn statements_follow_schema_order_and_skip_missing() {
        let schema = AttributeSchema::builder()
            .attribute("z", ValueType::Nominal)
            .attribute("a", ValueType::Real)
            .attribute("m", ValueType::Nominal)
            .build()
            .unwrap();
        let builder = StatementBuilder::new(&schema, &ns()).unwrap();
        let subject = Subject::Anonymous(BlankNode::default());
        let record = Record::new().with("m", "x").with("z", "y");
        let predicates: Vec<_> = builder
            .build(&record, &subject)
            .unwrap()
            .into_iter()
            .map(|s| s.predicate.as_str().to_string())
            .collect();
        assert_eq!(
            predicates,
            vec!["http://example.com/z", "http://example.com/m"]
        );
    }

    #[test]
    fn literal_forms_by_kind() {
        let text = encode_literal("n", AttributeKind::Nominal, &Value::from("Alice")).unwrap();
        assert_eq!(text, Literal::new_simple_literal("Alice"));

        let number = encode_literal("x", AttributeKind::Numeric, &Value::from(0.1)).unwrap();
        assert_eq!(number.datatype(), xsd::DOUBLE);
        assert_eq!(number.value().parse::<f64>().unwrap(), 0.1);

        let nominal_number = encode_literal("n", AttributeKind::Nominal, &Value::from(3)).unwrap();
        assert_eq!(nominal_number.value(), "3");

        for n in [f64::INFINITY, f64::NEG_INFINITY] {
            let literal = encode_literal("x", AttributeKind::Numeric, &Value::from(n)).unwrap();
            assert_eq!(literal.value(), Value::from(n).to_string());
        }
    }

    #[test]
    fn date_time_keeps_the_instant() {
        let ts = Utc.timestamp_opt(1_577_934_245, 123_456_789).unwrap();
        let literal = encode_literal("at", AttributeKind::DateTime, &Value::from(ts)).unwrap();
        assert_eq!(literal.datatype(), xsd::DATE_TIME);
        assert_eq!(literal.value(), "2020-01-02T03:04:05.123456789Z");
        assert_eq!(decode_timestamp(&literal), Some(ts));
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let err = encode_literal("at", AttributeKind::DateTime, &Value::from("soon")).unwrap_err();
        assert!(matches!(
            err,
            BuildError::KindMismatch { ref attribute, expected: AttributeKind::DateTime, found: "text" }
                if attribute == "at"
        ));
    }

    #[test]
    fn graph_deduplicates_and_serializes() {
        let subject = Subject::Iri(ns().mint("A").unwrap());
        let statement = Statement {
            subject,
            predicate: ns().mint("age").unwrap(),
            object: Literal::from(1.5),
        };
        let mut graph = Graph::new();
        assert!(graph.insert(statement.clone()));
        assert!(!graph.insert(statement));
        assert_eq!(graph.len(), 1);
        assert_eq!(
            graph.to_ntriples(),
            "<http://example.com/A> <http://example.com/age> \
             \"1.5\"^^<http://www.w3.org/2001/XMLSchema#double> .\n"
        );
    }

    #[test]
    fn date_time_literals_stay_within_four_digit_years() {
        let last = Utc
            .with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
            .unwrap()
            .with_nanosecond(999_999_999)
            .unwrap();
        let literal = encode_literal("at", AttributeKind::DateTime, &Value::from(last)).unwrap();
        assert_eq!(decode_timestamp(&literal), Some(last));

        let beyond = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            encode_literal("at", AttributeKind::DateTime, &Value::from(beyond)),
            Err(BuildError::TimestampOutOfRange { .. })
        ));
    }
}
