//! Subject identity for dataset rows.
//!
//! With a label attribute, a row's subject is `namespace + encode(label)`: a
//! pure function of the label text, so rows sharing a label merge onto one
//! node. Without one (or when the row's label value is missing or empty), each
//! row gets a fresh blank node.

use std::fmt;

use oxigraph::model::{BlankNode, NamedNode};

use crate::dataset::{Attribute, AttributeKind, Record};
use crate::error::BuildResult;
use crate::iri::Namespace;

/// The node all statements of one record attach to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// Minted from a label value.
    Iri(NamedNode),
    /// Anonymous, unique to this write.
    Anonymous(BlankNode),
}

impl Subject {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Subject::Anonymous(_))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Iri(iri) => write!(f, "{iri}"),
            Subject::Anonymous(node) => write!(f, "{node}"),
        }
    }
}

/// Resolves the subject of each record of one write.
#[derive(Debug)]
pub struct IdentityResolver<'a> {
    namespace: &'a Namespace,
    label: Option<&'a Attribute>,
    anonymous: usize,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(namespace: &'a Namespace, label: Option<&'a Attribute>) -> Self {
        Self {
            namespace,
            label,
            anonymous: 0,
        }
    }

    /// Resolve the subject for `record`.
    pub fn resolve(&mut self, record: &Record) -> BuildResult<Subject> {
        let label_text = self
            .label
            .and_then(|attr| record.get(attr.name()).map(|value| (attr, value)))
            .map(|(attr, value)| match (attr.kind(), value.as_text()) {
                (AttributeKind::Nominal, Some(text)) => text.to_string(),
                _ => value.to_string(),
            })
            .filter(|text| !text.is_empty());

        match label_text {
            Some(text) => Ok(Subject::Iri(self.namespace.mint(&text)?)),
            None => {
                self.anonymous += 1;
                Ok(Subject::Anonymous(BlankNode::default()))
            }
        }
    }

    /// Number of anonymous subjects issued so far.
    pub fn anonymous_issued(&self) -> usize {
        self.anonymous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{AttributeSchema, ValueType};

    fn ns() -> Namespace {
        Namespace::new("http://example.com/").unwrap()
    }

    fn iri(subject: &Subject) -> &str {
        match subject {
            Subject::Iri(iri) => iri.as_str(),
            Subject::Anonymous(node) => panic!("expected an IRI, got {node}"),
        }
    }

    #[test]
    fn equal_labels_give_identical_iris() {
        let ns = ns();
        let schema = AttributeSchema::builder()
            .label("name", ValueType::Nominal)
            .build()
            .unwrap();
        let mut resolver = IdentityResolver::new(&ns, schema.label());

        let a = resolver.resolve(&Record::new().with("name", "Alice")).unwrap();
        let b = resolver.resolve(&Record::new().with("name", "Alice")).unwrap();
        assert_eq!(a, b);
        assert_eq!(iri(&a), "http://example.com/Alice");
        assert_eq!(resolver.anonymous_issued(), 0);
    }

    #[test]
    fn label_text_is_escaped() {
        let ns = ns();
        let schema = AttributeSchema::builder()
            .label("name", ValueType::Text)
            .build()
            .unwrap();
        let mut resolver = IdentityResolver::new(&ns, schema.label());
        let subject = resolver
            .resolve(&Record::new().with("name", "Ada Lovelace/1815"))
            .unwrap();
        assert_eq!(
            iri(&subject),
            "http://example.com/Ada%20Lovelace%2F1815"
        );
    }

    #[test]
    fn numeric_label_uses_generic_rendering() {
        let ns = ns();
        let schema = AttributeSchema::builder()
            .label("id", ValueType::Integer)
            .build()
            .unwrap();
        let mut resolver = IdentityResolver::new(&ns, schema.label());
        let subject = resolver.resolve(&Record::new().with("id", 7)).unwrap();
        assert_eq!(iri(&subject), "http://example.com/7");
    }

    #[test]
    fn no_label_gives_fresh_blank_nodes() {
        let ns = ns();
        let mut resolver = IdentityResolver::new(&ns, None);
        let record = Record::new().with("name", "A");
        let a = resolver.resolve(&record).unwrap();
        let b = resolver.resolve(&record).unwrap();
        assert!(a.is_anonymous() && b.is_anonymous());
        assert_ne!(a, b);
        assert_eq!(resolver.anonymous_issued(), 2);
    }

    #[test]
    fn missing_label_value_falls_back_to_blank_node() {
        let ns = ns();
        let schema = AttributeSchema::builder()
            .label("name", ValueType::Nominal)
            .attribute("age", ValueType::Integer)
            .build()
            .unwrap();
        let mut resolver = IdentityResolver::new(&ns, schema.label());
        let subject = resolver.resolve(&Record::new().with("age", 3)).unwrap();
        assert!(subject.is_anonymous());
    }

    #[test]
    fn empty_label_is_treated_as_missing() {
        let ns = ns();
        let schema = AttributeSchema::builder()
            .label("name", ValueType::Nominal)
            .build()
            .unwrap();
        let mut resolver = IdentityResolver::new(&ns, schema.label());
        let a = resolver.resolve(&Record::new().with("name", "")).unwrap();
        let b = resolver.resolve(&Record::new().with("name", "")).unwrap();
        assert!(a.is_anonymous());
        assert_ne!(a, b);
        assert_eq!(resolver.anonymous_issued(), 2);
    }
}
