//! Transactional dataset writes.
//!
//! [`TransactionCoordinator::write`] drives one connection through
//! `connect → begin → add* → commit`, staging each record's statements as
//! soon as they are built. Any failure after `begin` rolls the whole
//! transaction back, so the target graph sees all records or none. The
//! connection is owned by a [`ScopedConnection`] guard that rolls back and
//! closes on every exit path, including unwinding.
//!
//! The coordinator holds no staging state between calls; concurrent writers
//! to the same named graph get whatever isolation the store provides.

use oxigraph::model::NamedNode;

use crate::config::WriteConfig;
use crate::dataset::Dataset;
use crate::error::{ConfigError, StoreResult, WriteError, WriteResult};
use crate::identity::IdentityResolver;
use crate::statement::{Graph, StatementBuilder};
use crate::store::{Connection, GraphStore};

/// Summary of a committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// Records staged.
    pub records: usize,
    /// Statements staged (after per-record deduplication).
    pub statements: usize,
    /// Records that received an anonymous subject.
    pub anonymous_subjects: usize,
    /// Target named graph IRI.
    pub graph: String,
}

/// Writes datasets into a [`GraphStore`], one transaction per call.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator<S> {
    store: S,
}

impl<S: GraphStore> TransactionCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Write every record of `dataset` into the configured named graph.
    ///
    /// Commits exactly once on success. On failure nothing is committed and
    /// the typed error names the stage that failed.
    pub fn write(&self, dataset: &Dataset, config: &WriteConfig) -> WriteResult<WriteReport> {
        config.validate()?;
        let namespace = config.namespace()?;
        let target = config.graph_name()?;
        let builder = StatementBuilder::new(dataset.schema(), &namespace).map_err(|e| {
            WriteError::Configuration(ConfigError::Invalid {
                parameter: "namespace",
                value: config.namespace.clone(),
                message: e.to_string(),
            })
        })?;

        let connection = self
            .store
            .connect(&config.url, &config.credentials())
            .map_err(|source| WriteError::Connection {
                url: config.url.clone(),
                source,
            })?;
        let mut session = ScopedConnection::new(connection);

        session
            .begin()
            .map_err(|source| WriteError::Begin { source })?;
        tracing::info!(
            records = dataset.len(),
            graph = %target,
            "transaction opened"
        );

        let mut resolver = IdentityResolver::new(&namespace, dataset.schema().label());
        let mut graph = Graph::new();
        let mut statements = 0;

        for (index, record) in dataset.records().iter().enumerate() {
            let staged = resolver
                .resolve(record)
                .and_then(|subject| builder.build(record, &subject))
                .map_err(|source| WriteError::Build {
                    record: index,
                    source,
                })
                .and_then(|built| {
                    graph.extend(built);
                    session
                        .add(&graph, &target)
                        .map_err(|source| WriteError::Staging {
                            record: index,
                            source,
                        })
                });
            if let Err(e) = staged {
                session.abort(&e);
                return Err(e);
            }
            tracing::debug!(record = index, statements = graph.len(), "record staged");
            statements += graph.len();
            graph.clear();
        }

        if let Err(source) = session.commit() {
            let e = WriteError::Commit { source };
            session.abort(&e);
            return Err(e);
        }
        tracing::info!(
            records = dataset.len(),
            statements,
            graph = %target,
            "transaction committed"
        );

        session.release();

        Ok(WriteReport {
            records: dataset.len(),
            statements,
            anonymous_subjects: resolver.anonymous_issued(),
            graph: target.into_string(),
        })
    }
}

/// Owns a connection for the duration of one write.
///
/// Dropping the guard rolls back a transaction that is still open and then
/// closes the connection. Errors on that path are logged, never raised.
pub struct ScopedConnection<C: Connection> {
    inner: C,
    aborted: bool,
    released: bool,
}

impl<C: Connection> ScopedConnection<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            aborted: false,
            released: false,
        }
    }

    pub fn begin(&mut self) -> StoreResult<()> {
        self.inner.begin()
    }

    pub fn add(&mut self, graph: &Graph, target: &NamedNode) -> StoreResult<()> {
        self.inner.add(graph, target)
    }

    pub fn commit(&mut self) -> StoreResult<()> {
        self.inner.commit()
    }

    /// Roll back after `cause`, keeping `cause` as the reported error.
    ///
    /// Rolls back at most once; a failed rollback is not retried on release.
    pub fn abort(&mut self, cause: &WriteError) {
        if self.aborted || !self.inner.in_transaction() {
            return;
        }
        self.aborted = true;
        match self.inner.rollback() {
            Ok(()) => tracing::warn!(cause = %cause, "transaction rolled back"),
            Err(e) => tracing::error!(
                cause = %cause,
                error = %e,
                "rollback failed; store state is store-defined"
            ),
        }
    }

    /// Close the connection now.
    pub fn release(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if !self.aborted
            && self.inner.in_transaction()
            && let Err(e) = self.inner.rollback()
        {
            tracing::error!(error = %e, "rollback on release failed");
        }
        if let Err(e) = self.inner.close() {
            tracing::warn!(error = %e, "failed to close connection");
        }
    }
}

impl<C: Connection> Drop for ScopedConnection<C> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{AttributeSchema, Record, ValueType};
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    use crate::error::StoreError;
    use crate::identity::Subject;
    use crate::statement::Statement;
    use crate::store::{Credentials, MemoryConnection, MemoryGraphStore};

    /// Memory connection that reports rollback and close through shared flags.
    struct Tracked {
        inner: MemoryConnection,
        rolled_back: Rc<Cell<bool>>,
        closed: Rc<Cell<bool>>,
    }

    impl Connection for Tracked {
        fn begin(&mut self) -> StoreResult<()> {
            self.inner.begin()
        }

        fn add(&mut self, graph: &Graph, target: &NamedNode) -> StoreResult<()> {
            self.inner.add(graph, target)
        }

        fn commit(&mut self) -> StoreResult<()> {
            self.inner.commit()
        }

        fn rollback(&mut self) -> StoreResult<()> {
            self.rolled_back.set(true);
            self.inner.rollback()
        }

        fn close(&mut self) -> StoreResult<()> {
            self.closed.set(true);
            self.inner.close()
        }

        fn in_transaction(&self) -> bool {
            self.inner.in_transaction()
        }
    }

    /// Connection whose rollback always fails and leaves the transaction open.
    #[derive(Default)]
    struct StuckRollback {
        open: bool,
        rollbacks: Rc<Cell<usize>>,
        closed: Rc<Cell<bool>>,
    }

    impl Connection for StuckRollback {
        fn begin(&mut self) -> StoreResult<()> {
            self.open = true;
            Ok(())
        }

        fn add(&mut self, _graph: &Graph, _target: &NamedNode) -> StoreResult<()> {
            Ok(())
        }

        fn commit(&mut self) -> StoreResult<()> {
            self.open = false;
            Ok(())
        }

        fn rollback(&mut self) -> StoreResult<()> {
            self.rollbacks.set(self.rollbacks.get() + 1);
            Err(StoreError::Backend {
                message: "rollback refused".into(),
            })
        }

        fn close(&mut self) -> StoreResult<()> {
            self.closed.set(true);
            Ok(())
        }

        fn in_transaction(&self) -> bool {
            self.open
        }
    }

    fn dataset() -> Dataset {
        let schema = AttributeSchema::builder()
            .label("name", ValueType::Nominal)
            .attribute("age", ValueType::Integer)
            .build()
            .unwrap();
        Dataset::with_records(
            schema,
            [
                Record::new().with("name", "A").with("age", 1),
                Record::new().with("name", "B").with("age", 2),
            ],
        )
        .unwrap()
    }

    #[test]
    fn invalid_config_fails_before_connecting() {
        let store = MemoryGraphStore::new().unwrap();
        let coordinator = TransactionCoordinator::new(&store);
        let config = WriteConfig {
            url: String::new(),
            ..Default::default()
        };
        let err = coordinator.write(&dataset(), &config).unwrap_err();
        assert!(matches!(err, WriteError::Configuration(_)));
    }

    #[test]
    fn rejected_credentials_surface_as_connection_error() {
        let store = MemoryGraphStore::new()
            .unwrap()
            .with_credentials(crate::store::Credentials::new("admin", "secret"));
        let coordinator = TransactionCoordinator::new(&store);
        let err = coordinator
            .write(&dataset(), &WriteConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            WriteError::Connection {
                source: StoreError::AuthenticationRejected { .. },
                ..
            }
        ));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn report_counts_records_and_statements() {
        let store = MemoryGraphStore::new().unwrap();
        let coordinator = TransactionCoordinator::new(&store);
        let report = coordinator
            .write(&dataset(), &WriteConfig::default())
            .unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.statements, 2);
        assert_eq!(report.anonymous_subjects, 0);
        assert_eq!(report.graph, "http://example.com/rapidminer");
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn unwinding_rolls_back_and_closes() {
        let store = MemoryGraphStore::new().unwrap();
        let rolled_back = Rc::new(Cell::new(false));
        let closed = Rc::new(Cell::new(false));
        let conn = Tracked {
            inner: store
                .connect("mem:", &Credentials::new("admin", "admin"))
                .unwrap(),
            rolled_back: Rc::clone(&rolled_back),
            closed: Rc::clone(&closed),
        };
        let target = NamedNode::new("http://example.com/g").unwrap();
        let mut graph = Graph::new();
        graph.insert(Statement {
            subject: Subject::Iri(NamedNode::new("http://example.com/A").unwrap()),
            predicate: NamedNode::new("http://example.com/age").unwrap(),
            object: oxigraph::model::Literal::from(1.0),
        });

        let outcome = panic::catch_unwind(AssertUnwindSafe(move || {
            let mut session = ScopedConnection::new(conn);
            session.begin().unwrap();
            session.add(&graph, &target).unwrap();
            panic!("interrupted mid-write");
        }));

        assert!(outcome.is_err());
        assert!(rolled_back.get());
        assert!(closed.get());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn release_after_commit_only_closes() {
        let store = MemoryGraphStore::new().unwrap();
        let rolled_back = Rc::new(Cell::new(false));
        let closed = Rc::new(Cell::new(false));
        let mut session = ScopedConnection::new(Tracked {
            inner: store
                .connect("mem:", &Credentials::new("admin", "admin"))
                .unwrap(),
            rolled_back: Rc::clone(&rolled_back),
            closed: Rc::clone(&closed),
        });
        session.begin().unwrap();
        session.commit().unwrap();
        session.release();

        assert!(!rolled_back.get());
        assert!(closed.get());
    }

    #[test]
    fn failed_rollback_is_not_retried_on_release() {
        let conn = StuckRollback::default();
        let rollbacks = Rc::clone(&conn.rollbacks);
        let closed = Rc::clone(&conn.closed);

        let mut session = ScopedConnection::new(conn);
        session.begin().unwrap();
        let cause = WriteError::Staging {
            record: 0,
            source: StoreError::Backend {
                message: "add refused".into(),
            },
        };
        session.abort(&cause);
        session.abort(&cause);
        drop(session);

        assert_eq!(rollbacks.get(), 1);
        assert!(closed.get());
    }
}
