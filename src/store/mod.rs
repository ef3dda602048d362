//! Graph store boundary.
//!
//! The writer talks to a database through two traits:
//!
//! - [`GraphStore`]: opens a [`Connection`] for an endpoint and credentials
//! - [`Connection`]: a transactional session (`begin`, `add`, `commit`,
//!   `rollback`, `close`)
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryGraphStore`]: in-process, backed by an oxigraph `Store`
//! - [`HttpGraphStore`]: a remote database over its HTTP transaction API

pub mod http;
pub mod mem;

use std::fmt;

use oxigraph::model::NamedNode;

use crate::error::StoreResult;
use crate::statement::Graph;

pub use http::{HttpConnection, HttpGraphStore};
pub use mem::{MemoryConnection, MemoryGraphStore};

/// Username and password for a store endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opens connections to a graph database.
pub trait GraphStore {
    type Connection: Connection;

    /// Connect and authenticate. Fails with
    /// [`StoreError::Unreachable`](crate::error::StoreError::Unreachable) or
    /// [`StoreError::AuthenticationRejected`](crate::error::StoreError::AuthenticationRejected).
    fn connect(&self, url: &str, credentials: &Credentials) -> StoreResult<Self::Connection>;
}

impl<T: GraphStore + ?Sized> GraphStore for &T {
    type Connection = T::Connection;

    fn connect(&self, url: &str, credentials: &Credentials) -> StoreResult<Self::Connection> {
        (**self).connect(url, credentials)
    }
}

/// A transactional session with a graph database.
///
/// At most one transaction is open at a time. Statements added inside a
/// transaction become visible only after [`Connection::commit`].
pub trait Connection {
    /// Open a transaction.
    fn begin(&mut self) -> StoreResult<()>;

    /// Stage `graph` into the named graph `target` within the open transaction.
    fn add(&mut self, graph: &Graph, target: &NamedNode) -> StoreResult<()>;

    /// Apply everything staged since `begin`.
    fn commit(&mut self) -> StoreResult<()>;

    /// Discard everything staged since `begin`.
    fn rollback(&mut self) -> StoreResult<()>;

    /// Release the connection. Further calls fail with `StoreError::Closed`.
    fn close(&mut self) -> StoreResult<()>;

    /// Whether a transaction is currently open.
    fn in_transaction(&self) -> bool;
}
