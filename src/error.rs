//! Rich diagnostic error types for rowgraph.
//!
//! Each area defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::dataset::AttributeKind;

/// Top-level error type for the rowgraph binary.
///
/// Each variant wraps an area-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum RowgraphError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Write(#[from] WriteError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("required parameter `{parameter}` is missing")]
    #[diagnostic(
        code(rowgraph::config::missing),
        help("Set `{parameter}` in the config file or pass it on the command line.")
    )]
    Missing { parameter: &'static str },

    #[error("invalid value for `{parameter}`: \"{value}\" ({message})")]
    #[diagnostic(
        code(rowgraph::config::invalid),
        help(
            "The endpoint URL must start with http:// or https://; \
             the graph name and namespace must be absolute IRIs."
        )
    )]
    Invalid {
        parameter: &'static str,
        value: String,
        message: String,
    },

    #[error("failed to read config file: {path}")]
    #[diagnostic(
        code(rowgraph::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    #[diagnostic(
        code(rowgraph::config::parse),
        help("Check the TOML syntax. `rowgraph config` prints a valid template.")
    )]
    Parse { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Dataset errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DatasetError {
    #[error("attribute names must not be empty")]
    #[diagnostic(code(rowgraph::dataset::empty_name))]
    EmptyAttributeName,

    #[error("attribute \"{name}\" is declared more than once")]
    #[diagnostic(
        code(rowgraph::dataset::duplicate_attribute),
        help("Attribute names form the predicate IRIs and must be unique within a schema.")
    )]
    DuplicateAttribute { name: String },

    #[error("attributes \"{first}\" and \"{second}\" are both marked as label")]
    #[diagnostic(
        code(rowgraph::dataset::multiple_labels),
        help("At most one attribute may carry the label role.")
    )]
    MultipleLabels { first: String, second: String },

    #[error("record refers to unknown attribute \"{name}\"")]
    #[diagnostic(
        code(rowgraph::dataset::unknown_attribute),
        help("Every value in a record must belong to an attribute of the dataset schema.")
    )]
    UnknownAttribute { name: String },

    #[error("unknown value type \"{name}\"")]
    #[diagnostic(
        code(rowgraph::dataset::unknown_type),
        help(
            "Valid types are: nominal, binominal, polynominal, text, file_path, \
             date_time, date, time, numeric, integer, real."
        )
    )]
    UnknownValueType { name: String },

    #[error("invalid attribute declaration \"{declaration}\"")]
    #[diagnostic(
        code(rowgraph::dataset::declaration),
        help("Declare columns as `name:type` or `name:type:label`.")
    )]
    InvalidDeclaration { declaration: String },

    #[error("value \"{value}\" of attribute \"{attribute}\" is not a valid {expected} value")]
    #[diagnostic(
        code(rowgraph::dataset::invalid_value),
        help(
            "Numeric values must parse as numbers; date/time values must be RFC 3339 \
             timestamps, `YYYY-MM-DD[ HH:MM:SS]` dates, or epoch milliseconds."
        )
    )]
    InvalidValue {
        attribute: String,
        value: String,
        expected: AttributeKind,
    },

    #[error("failed to read dataset file: {path}")]
    #[diagnostic(code(rowgraph::dataset::read))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dataset {path}: {message}")]
    #[diagnostic(
        code(rowgraph::dataset::parse),
        help("JSON datasets need `attributes` and `records`; CSV datasets need a header row.")
    )]
    Parse { path: String, message: String },

    #[error("unsupported dataset format: {path}")]
    #[diagnostic(
        code(rowgraph::dataset::format),
        help("Use a `.json` or `.csv` file.")
    )]
    UnsupportedFormat { path: String },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("graph store at {url} is unreachable: {message}")]
    #[diagnostic(
        code(rowgraph::store::unreachable),
        help("Check that the database server is running and the URL is correct.")
    )]
    Unreachable { url: String, message: String },

    #[error("graph store at {url} rejected the credentials (HTTP {status})")]
    #[diagnostic(
        code(rowgraph::store::auth),
        help("Check the username and password, and that the user may write to the database.")
    )]
    AuthenticationRejected { url: String, status: u16 },

    #[error("{operation} failed with HTTP {status}: {message}")]
    #[diagnostic(code(rowgraph::store::request))]
    Request {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("unexpected response to {operation}: {message}")]
    #[diagnostic(code(rowgraph::store::response))]
    Response {
        operation: &'static str,
        message: String,
    },

    #[error("store backend error: {message}")]
    #[diagnostic(code(rowgraph::store::backend))]
    Backend { message: String },

    #[error("{operation} requires an open transaction")]
    #[diagnostic(
        code(rowgraph::store::no_transaction),
        help("Call `begin()` before staging, committing, or rolling back.")
    )]
    NoTransaction { operation: &'static str },

    #[error("a transaction is already open on this connection")]
    #[diagnostic(code(rowgraph::store::transaction_active))]
    TransactionActive,

    #[error("connection is closed")]
    #[diagnostic(code(rowgraph::store::closed))]
    Closed,
}

// ---------------------------------------------------------------------------
// Statement building errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("invalid IRI <{iri}>: {message}")]
    #[diagnostic(
        code(rowgraph::build::iri),
        help("The namespace must be an absolute IRI such as `http://example.com/`.")
    )]
    InvalidIri { iri: String, message: String },

    #[error("attribute \"{attribute}\" is {expected} but holds a {found} value")]
    #[diagnostic(
        code(rowgraph::build::kind_mismatch),
        help("Values must match the semantic kind their attribute was classified as.")
    )]
    KindMismatch {
        attribute: String,
        expected: AttributeKind,
        found: &'static str,
    },

    #[error("attribute \"{attribute}\" holds {value}, outside years 0000-9999")]
    #[diagnostic(
        code(rowgraph::build::timestamp_range),
        help("xsd:dateTime literals are written with four-digit years.")
    )]
    TimestampOutOfRange { attribute: String, value: String },
}

// ---------------------------------------------------------------------------
// Write errors
// ---------------------------------------------------------------------------

/// Failure of a whole dataset write. Every variant past `Connection` means the
/// transaction was rolled back (or never opened) before the error surfaced.
#[derive(Debug, Error, Diagnostic)]
pub enum WriteError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigError),

    #[error("failed to connect to {url}")]
    #[diagnostic(code(rowgraph::write::connection))]
    Connection {
        url: String,
        #[source]
        #[diagnostic_source]
        source: StoreError,
    },

    #[error("failed to open a transaction")]
    #[diagnostic(code(rowgraph::write::begin))]
    Begin {
        #[source]
        #[diagnostic_source]
        source: StoreError,
    },

    #[error("failed to build statements for record {record}")]
    #[diagnostic(
        code(rowgraph::write::build),
        help("The transaction was rolled back; nothing was written.")
    )]
    Build {
        record: usize,
        #[source]
        #[diagnostic_source]
        source: BuildError,
    },

    #[error("failed to stage record {record}")]
    #[diagnostic(
        code(rowgraph::write::staging),
        help("The transaction was rolled back; nothing was written.")
    )]
    Staging {
        record: usize,
        #[source]
        #[diagnostic_source]
        source: StoreError,
    },

    #[error("commit failed")]
    #[diagnostic(
        code(rowgraph::write::commit),
        help("Whether the store applied the transaction is store-defined; verify before retrying.")
    )]
    Commit {
        #[source]
        #[diagnostic_source]
        source: StoreError,
    },
}

/// Result type for configuration handling.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type for dataset construction and loading.
pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

/// Result type for graph store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for subject resolution and statement building.
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Result type for dataset writes.
pub type WriteResult<T> = std::result::Result<T, WriteError>;

/// Result type for the binary.
pub type RowgraphResult<T> = std::result::Result<T, RowgraphError>;
