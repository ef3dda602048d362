// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # rowgraph
//!
//! Writes tabular datasets into an RDF graph store as a single transaction.
//!
//! ## Architecture
//!
//! - **Datasets** (`dataset`): typed attribute schemas, records, JSON/CSV loading
//! - **Classification** (`classify`): column type → {nominal, date/time, numeric}
//! - **Identity** (`identity`): label-derived IRIs or fresh blank nodes per row
//! - **Statements** (`statement`): predicate minting and literal encoding
//! - **Stores** (`store`): the `GraphStore`/`Connection` boundary, in-memory and HTTP
//! - **Writer** (`writer`): connect → begin → stage each row → commit once
//!
//! ## Library usage
//!
//! ```no_run
//! use rowgraph::config::WriteConfig;
//! use rowgraph::dataset::{AttributeSchema, Dataset, Record, ValueType};
//! use rowgraph::store::HttpGraphStore;
//! use rowgraph::writer::TransactionCoordinator;
//!
//! let schema = AttributeSchema::builder()
//!     .label("name", ValueType::Nominal)
//!     .attribute("age", ValueType::Integer)
//!     .build()
//!     .unwrap();
//! let dataset = Dataset::with_records(
//!     schema,
//!     [Record::new().with("name", "Alice").with("age", 36)],
//! )
//! .unwrap();
//!
//! let coordinator = TransactionCoordinator::new(HttpGraphStore::new());
//! coordinator.write(&dataset, &WriteConfig::default()).unwrap();
//! ```

pub mod classify;
pub mod config;
pub mod dataset;
pub mod error;
pub mod identity;
pub mod iri;
pub mod statement;
pub mod store;
pub mod writer;
