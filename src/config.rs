//! Write configuration, persisted as TOML.
//!
//! Every field has a default so a partial file is valid. [`WriteConfig::validate`]
//! runs before any connection attempt.

use std::path::Path;
use std::time::Duration;

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::iri::Namespace;
use crate::store::Credentials;

/// Parameters of a dataset write.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteConfig {
    /// Database endpoint URL.
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    /// Named graph the dataset is written into.
    #[serde(default = "default_graph")]
    pub graph: String,
    /// Base IRI for subjects and predicates.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Per-request timeout for remote stores.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:5820/myDb".into()
}
fn default_username() -> String {
    "admin".into()
}
fn default_password() -> String {
    "admin".into()
}
fn default_graph() -> String {
    "http://example.com/rapidminer".into()
}
fn default_namespace() -> String {
    "http://example.com/".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_username(),
            password: default_password(),
            graph: default_graph(),
            namespace: default_namespace(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for WriteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("graph", &self.graph)
            .field("namespace", &self.namespace)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl WriteConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: "<memory>".into(),
            message: e.to_string(),
        })
    }

    /// Check every parameter without touching the network.
    pub fn validate(&self) -> ConfigResult<()> {
        require("url", &self.url)?;
        require("username", &self.username)?;
        require("graph", &self.graph)?;
        require("namespace", &self.namespace)?;

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                parameter: "url",
                value: self.url.clone(),
                message: "must start with http:// or https://".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                parameter: "timeout_secs",
                value: "0".into(),
                message: "must be at least one second".into(),
            });
        }
        self.graph_name()?;
        self.namespace()?;
        Ok(())
    }

    /// The target named graph as an IRI. A name that is not an absolute IRI
    /// (e.g. `g1`) is minted under the namespace.
    pub fn graph_name(&self) -> ConfigResult<NamedNode> {
        if let Ok(iri) = NamedNode::new(self.graph.as_str()) {
            return Ok(iri);
        }
        self.namespace()?
            .mint(&self.graph)
            .map_err(|e| ConfigError::Invalid {
                parameter: "graph",
                value: self.graph.clone(),
                message: e.to_string(),
            })
    }

    /// The base namespace.
    pub fn namespace(&self) -> ConfigResult<Namespace> {
        Namespace::new(self.namespace.as_str()).map_err(|e| ConfigError::Invalid {
            parameter: "namespace",
            value: self.namespace.clone(),
            message: e.to_string(),
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub graph: Option<String>,
    pub namespace: Option<String>,
}

impl WriteConfig {
    /// Replace every field for which `overrides` carries a value.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        let ConfigOverrides {
            url,
            username,
            password,
            graph,
            namespace,
        } = overrides;
        if let Some(url) = url {
            self.url = url;
        }
        if let Some(username) = username {
            self.username = username;
        }
        if let Some(password) = password {
            self.password = password;
        }
        if let Some(graph) = graph {
            self.graph = graph;
        }
        if let Some(namespace) = namespace {
            self.namespace = namespace;
        }
        self
    }
}

fn require(parameter: &'static str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing { parameter })
    } else {
        Ok(())
    }
}
