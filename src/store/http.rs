//! Remote graph store over HTTP.
//!
//! Speaks the transaction API of Stardog-style databases, rooted at the
//! database URL (e.g. `http://localhost:5820/myDb`):
//!
//! | operation | request                                         |
//! |-----------|-------------------------------------------------|
//! | connect   | `GET  {db}/size`                                |
//! | begin     | `POST {db}/transaction/begin` → transaction id  |
//! | add       | `POST {db}/{tx}/add?graph-uri={graph}` (N-Triples body) |
//! | commit    | `POST {db}/transaction/commit/{tx}`             |
//! | rollback  | `POST {db}/transaction/rollback/{tx}`           |
//!
//! All calls are blocking (`ureq`) and carry HTTP Basic credentials.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use oxigraph::model::NamedNode;

use crate::error::{StoreError, StoreResult};
use crate::statement::Graph;

use super::{Connection, Credentials, GraphStore};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const NTRIPLES: &str = "application/n-triples";

/// Maximum number of response body bytes quoted in error messages.
const ERROR_PREVIEW: usize = 500;

/// Connects to remote databases over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGraphStore {
    timeout: Duration,
}

impl HttpGraphStore {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for HttpGraphStore {
    type Connection = HttpConnection;

    fn connect(&self, url: &str, credentials: &Credentials) -> StoreResult<HttpConnection> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let conn = HttpConnection {
            agent,
            base: url.trim_end_matches('/').to_string(),
            authorization: basic_auth(credentials),
            transaction: None,
            closed: false,
        };

        // Probe the database so bad URLs and credentials surface before begin.
        let probe = conn.endpoint("size");
        match conn
            .agent
            .get(&probe)
            .set("Authorization", &conn.authorization)
            .call()
        {
            Ok(_) => {
                tracing::debug!(url = %conn.base, "connected to graph store");
                Ok(conn)
            }
            Err(e) => Err(map_error("connect", &conn.base, e)),
        }
    }
}

/// Session on a remote database.
pub struct HttpConnection {
    agent: ureq::Agent,
    base: String,
    authorization: String,
    transaction: Option<String>,
    closed: bool,
}

impl HttpConnection {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    fn transaction(&self, operation: &'static str) -> StoreResult<&str> {
        self.check_open()?;
        self.transaction
            .as_deref()
            .ok_or(StoreError::NoTransaction { operation })
    }

    fn post(&self, operation: &'static str, url: &str) -> StoreResult<ureq::Response> {
        self.agent
            .post(url)
            .set("Authorization", &self.authorization)
            .call()
            .map_err(|e| map_error(operation, &self.base, e))
    }

    /// Identifier of the open transaction, if any.
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction.as_deref()
    }
}

impl Connection for HttpConnection {
    fn begin(&mut self) -> StoreResult<()> {
        self.check_open()?;
        if self.transaction.is_some() {
            return Err(StoreError::TransactionActive);
        }
        let response = self.post("begin", &self.endpoint("transaction/begin"))?;
        let body = response.into_string().map_err(|e| StoreError::Response {
            operation: "begin",
            message: e.to_string(),
        })?;
        let id = parse_transaction_id(&body)?;
        tracing::debug!(transaction = %id, "transaction opened");
        self.transaction = Some(id);
        Ok(())
    }

    fn add(&mut self, graph: &Graph, target: &NamedNode) -> StoreResult<()> {
        let tx = self.transaction("add")?;
        let url = self.endpoint(&format!("{tx}/add"));
        self.agent
            .post(&url)
            .query("graph-uri", target.as_str())
            .set("Authorization", &self.authorization)
            .set("Content-Type", NTRIPLES)
            .send_string(&graph.to_ntriples())
            .map_err(|e| map_error("add", &self.base, e))?;
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        let tx = self.transaction("commit")?;
        let url = self.endpoint(&format!("transaction/commit/{tx}"));
        let result = self.post("commit", &url).map(|_| ());
        // Any other failure leaves the transaction open so it can be rolled back.
        if matches!(result, Ok(()) | Err(StoreError::Request { status: 404, .. })) {
            self.transaction = None;
        }
        result
    }

    fn rollback(&mut self) -> StoreResult<()> {
        let tx = self.transaction("rollback")?;
        let url = self.endpoint(&format!("transaction/rollback/{tx}"));
        let result = self.post("rollback", &url).map(|_| ());
        self.transaction = None;
        result
    }

    fn close(&mut self) -> StoreResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = if self.transaction.is_some() {
            self.rollback()
        } else {
            Ok(())
        };
        self.closed = true;
        result
    }

    fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }
}

/// `Authorization` header value for HTTP Basic authentication.
fn basic_auth(credentials: &Credentials) -> String {
    let raw = format!("{}:{}", credentials.username, credentials.password);
    format!("Basic {}", STANDARD.encode(raw.as_bytes()))
}

fn parse_transaction_id(body: &str) -> StoreResult<String> {
    let id = body.trim();
    if id.is_empty() || id.contains(char::is_whitespace) || id.contains('/') {
        return Err(StoreError::Response {
            operation: "begin",
            message: format!("invalid transaction id \"{id}\""),
        });
    }
    Ok(id.to_string())
}

fn map_error(operation: &'static str, base: &str, error: ureq::Error) -> StoreError {
    match error {
        ureq::Error::Status(status @ (401 | 403), _) => StoreError::AuthenticationRejected {
            url: base.to_string(),
            status,
        },
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            let message = if body.len() > ERROR_PREVIEW {
                let cut = (0..=ERROR_PREVIEW)
                    .rev()
                    .find(|&i| body.is_char_boundary(i))
                    .unwrap_or(0);
                format!("{}...", &body[..cut])
            } else {
                body
            };
            StoreError::Request {
                operation,
                status,
                message,
            }
        }
        ureq::Error::Transport(transport) => StoreError::Unreachable {
            url: base.to_string(),
            message: transport.to_string(),
        },
    }
}
