//! IRI minting: URI-component percent-encoding under a base namespace.
//!
//! Attribute names and label values are escaped with the RFC 3986
//! unreserved set kept verbatim (`A-Z a-z 0-9 - . _ ~`); every other byte of
//! the UTF-8 encoding becomes `%XX`. The escaping is reversible, so distinct
//! names never collide and [`decode`] recovers the original text.

use oxigraph::model::NamedNode;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::{BuildError, BuildResult};

/// Everything except RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode `text` for use as an IRI local name.
pub fn encode(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

/// Reverse [`encode`]. Returns `None` if the bytes are not valid UTF-8.
pub fn decode(encoded: &str) -> Option<String> {
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// Base IRI under which subjects and predicates are minted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    base: String,
}

impl Namespace {
    /// Validate `base` as an absolute IRI.
    pub fn new(base: impl Into<String>) -> BuildResult<Self> {
        let base = base.into();
        NamedNode::new(base.as_str()).map_err(|e| BuildError::InvalidIri {
            iri: base.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { base })
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Mint `base + encode(local)`.
    pub fn mint(&self, local: &str) -> BuildResult<NamedNode> {
        let iri = format!("{}{}", self.base, encode(local));
        NamedNode::new(iri.as_str()).map_err(|e| BuildError::InvalidIri {
            iri: iri.clone(),
            message: e.to_string(),
        })
    }

    /// Recover the local name of an IRI minted under this namespace.
    pub fn local_name(&self, iri: &str) -> Option<String> {
        decode(iri.strip_prefix(self.base.as_str())?)
    }
}
