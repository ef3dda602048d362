//! In-memory graph store backed by oxigraph.
//!
//! Staged quads are buffered per connection and applied to the shared
//! oxigraph `Store` in one atomic `extend` on commit. All data is lost on
//! process exit.

use oxigraph::model::{NamedNode, Quad};
use oxigraph::store::Store;

use crate::error::{StoreError, StoreResult};
use crate::statement::Graph;

use super::{Connection, Credentials, GraphStore};

/// In-process graph database. Clones share the same underlying store.
#[derive(Clone)]
pub struct MemoryGraphStore {
    store: Store,
    credentials: Option<Credentials>,
}

impl MemoryGraphStore {
    /// Create an empty store that accepts any credentials.
    pub fn new() -> StoreResult<Self> {
        let store = Store::new().map_err(|e| StoreError::Backend {
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        Ok(Self {
            store,
            credentials: None,
        })
    }

    /// Only accept connections presenting `credentials`.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// All quads in the named graph `graph`.
    pub fn quads_in(&self, graph: &NamedNode) -> StoreResult<Vec<Quad>> {
        self.store
            .quads_for_pattern(None, None, None, Some(graph.as_ref().into()))
            .map(|q| {
                q.map_err(|e| StoreError::Backend {
                    message: format!("quad scan failed: {e}"),
                })
            })
            .collect()
    }

    /// Total number of quads across all graphs.
    pub fn len(&self) -> StoreResult<usize> {
        self.store.len().map_err(|e| StoreError::Backend {
            message: format!("count failed: {e}"),
        })
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        self.len().map(|n| n == 0)
    }
}

impl std::fmt::Debug for MemoryGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGraphStore")
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl GraphStore for MemoryGraphStore {
    type Connection = MemoryConnection;

    fn connect(&self, url: &str, credentials: &Credentials) -> StoreResult<MemoryConnection> {
        if let Some(expected) = &self.credentials
            && expected != credentials
        {
            return Err(StoreError::AuthenticationRejected {
                url: url.to_string(),
                status: 401,
            });
        }
        Ok(MemoryConnection {
            store: self.store.clone(),
            staged: None,
            closed: false,
        })
    }
}

/// Session on a [`MemoryGraphStore`].
pub struct MemoryConnection {
    store: Store,
    staged: Option<Vec<Quad>>,
    closed: bool,
}

impl MemoryConnection {
    fn check_open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    fn staged_mut(&mut self, operation: &'static str) -> StoreResult<&mut Vec<Quad>> {
        self.check_open()?;
        self.staged
            .as_mut()
            .ok_or(StoreError::NoTransaction { operation })
    }

    /// Number of quads staged in the open transaction.
    pub fn staged_len(&self) -> usize {
        self.staged.as_ref().map_or(0, Vec::len)
    }
}

impl Connection for MemoryConnection {
    fn begin(&mut self) -> StoreResult<()> {
        self.check_open()?;
        if self.staged.is_some() {
            return Err(StoreError::TransactionActive);
        }
        self.staged = Some(Vec::new());
        Ok(())
    }

    fn add(&mut self, graph: &Graph, target: &NamedNode) -> StoreResult<()> {
        let staged = self.staged_mut("add")?;
        staged.extend(graph.quads(target));
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.staged_mut("commit")?;
        let quads = self.staged.take().unwrap_or_default();
        self.store.extend(quads).map_err(|e| StoreError::Backend {
            message: format!("commit failed: {e}"),
        })
    }

    fn rollback(&mut self) -> StoreResult<()> {
        self.staged_mut("rollback")?;
        self.staged = None;
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        self.staged = None;
        self.closed = true;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.staged.is_some()
    }
}

#[cfg(test)]
mod tests {
    use oxigraph::model::Literal;

    use super::*;
    use crate::identity::Subject;
    use crate::statement::Statement;

    fn graph_name() -> NamedNode {
        NamedNode::new("http://example.com/g").unwrap()
    }

    fn one_statement() -> Graph {
        let mut graph = Graph::new();
        graph.insert(Statement {
            subject: Subject::Iri(NamedNode::new("http://example.com/A").unwrap()),
            predicate: NamedNode::new("http://example.com/age").unwrap(),
            object: Literal::from(1.0),
        });
        graph
    }

    fn creds() -> Credentials {
        Credentials::new("admin", "admin")
    }

    #[test]
    fn commit_makes_staged_quads_visible() {
        let store = MemoryGraphStore::new().unwrap();
        let mut conn = store.connect("mem:", &creds()).unwrap();
        conn.begin().unwrap();
        conn.add(&one_statement(), &graph_name()).unwrap();
        assert_eq!(conn.staged_len(), 1);
        assert!(store.is_empty().unwrap());

        conn.commit().unwrap();
        assert!(!conn.in_transaction());
        assert_eq!(store.quads_in(&graph_name()).unwrap().len(), 1);
    }

    #[test]
    fn rollback_discards_staged_quads() {
        let store = MemoryGraphStore::new().unwrap();
        let mut conn = store.connect("mem:", &creds()).unwrap();
        conn.begin().unwrap();
        conn.add(&one_statement(), &graph_name()).unwrap();
        conn.rollback().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn add_without_transaction_fails() {
        let store = MemoryGraphStore::new().unwrap();
        let mut conn = store.connect("mem:", &creds()).unwrap();
        let err = conn.add(&one_statement(), &graph_name()).unwrap_err();
        assert!(matches!(err, StoreError::NoTransaction { operation: "add" }));
    }

    #[test]
    fn double_begin_fails() {
        let store = MemoryGraphStore::new().unwrap();
        let mut conn = store.connect("mem:", &creds()).unwrap();
        conn.begin().unwrap();
        assert!(matches!(conn.begin(), Err(StoreError::TransactionActive)));
    }

    #[test]
    fn closed_connection_rejects_calls() {
        let store = MemoryGraphStore::new().unwrap();
        let mut conn = store.connect("mem:", &creds()).unwrap();
        conn.close().unwrap();
        assert!(matches!(conn.begin(), Err(StoreError::Closed)));
    }

    #[test]
    fn wrong_credentials_are_rejected() {
        let store = MemoryGraphStore::new().unwrap().with_credentials(creds());
        assert!(store.connect("mem:", &creds()).is_ok());
        let err = store
            .connect("mem:", &Credentials::new("admin", "nope"))
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::AuthenticationRejected { status: 401, .. }));
    }
}
