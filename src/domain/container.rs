// Copyright (c) 2025 - Cowboy AI, Inc.
//! Container Task Specifications
//!
//! Workload environments are derived from upstream endpoint references at
//! composition time. The same store always yields the same connection string
//! regardless of which workload consumes it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::names::ResourceName;
use super::value::{AttrRef, Value};
use crate::secrets::SecretValue;

/// Environment variable names of the container environment contract
pub mod env_keys {
    pub const DATABASE_URL: &str = "REDASH_DATABASE_URL";
    pub const CACHE_URL: &str = "REDASH_REDIS_URL";
    pub const LOG_LEVEL: &str = "REDASH_LOG_LEVEL";
    pub const COOKIE_SECRET: &str = "REDASH_COOKIE_SECRET";
    pub const QUEUE_NAMES: &str = "QUEUES";
    pub const WORKER_COUNT: &str = "WORKERS_COUNT";
    pub const PYTHON_UNBUFFERED: &str = "PYTHONUNBUFFERED";
    pub const PASSWORD_LOGIN_ENABLED: &str = "REDASH_PASSWORD_LOGIN_ENABLED";
    pub const ALLOW_SCRIPTS_IN_USER_INPUT: &str = "REDASH_ALLOW_SCRIPTS_IN_USER_INPUT";
    pub const DATE_FORMAT: &str = "REDASH_DATE_FORMAT";
}

/// Kind of containerized workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    /// Internet-facing application front end
    Server,
    /// Background queue processor
    Worker,
    /// One-shot schema creation
    Initialization,
}

impl WorkloadKind {
    /// Entry mode passed as the container command
    pub fn command(&self) -> &'static str {
        match self {
            WorkloadKind::Server => "server",
            WorkloadKind::Worker => "scheduler",
            WorkloadKind::Initialization => "create_db",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadKind::Server => write!(f, "server"),
            WorkloadKind::Worker => write!(f, "worker"),
            WorkloadKind::Initialization => write!(f, "initialization"),
        }
    }
}

/// Declared container environment, ordered by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(BTreeMap<String, Value>);

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve every value through `lookup`; `None` if any reference is unknown
    pub fn resolve<F>(&self, lookup: &F) -> Option<BTreeMap<String, String>>
    where
        F: Fn(&AttrRef) -> Option<String>,
    {
        self.0
            .iter()
            .map(|(key, value)| value.resolve(lookup).map(|resolved| (key.clone(), resolved)))
            .collect()
    }
}

/// Host and port of a managed store, as attribute references
///
/// Implemented by [`crate::stack::EndpointReference`]; kept as a trait so
/// URL synthesis never needs the producing stack.
pub trait Endpoint {
    fn address(&self) -> &AttrRef;
    fn port(&self) -> &AttrRef;
}

/// Connection string `scheme://[user:password@]host:port[/path]`
///
/// User and password are percent-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionUrl {
    scheme: &'static str,
    credentials: Option<(String, SecretValue)>,
    host: AttrRef,
    port: AttrRef,
    path: Option<String>,
}

impl ConnectionUrl {
    /// `postgresql://{user}:{password}@{host}:{port}/{database}`
    pub fn postgres(
        endpoint: &impl Endpoint,
        user: &str,
        password: &SecretValue,
        database: &str,
    ) -> Self {
        Self {
            scheme: "postgresql",
            credentials: Some((user.to_string(), password.clone())),
            host: endpoint.address().clone(),
            port: endpoint.port().clone(),
            path: Some(database.to_string()),
        }
    }

    /// `redis://{host}:{port}/{db}`
    pub fn redis(endpoint: &impl Endpoint, db: u8) -> Self {
        Self {
            scheme: "redis",
            credentials: None,
            host: endpoint.address().clone(),
            port: endpoint.port().clone(),
            path: Some(db.to_string()),
        }
    }

    pub fn scheme(&self) -> &str {
        self.scheme
    }

    pub fn host(&self) -> &AttrRef {
        &self.host
    }

    pub fn port(&self) -> &AttrRef {
        &self.port
    }

    /// Declared value, joined from literals and endpoint references
    pub fn to_value(&self) -> Value {
        let mut prefix = format!("{}://", self.scheme);
        if let Some((user, password)) = &self.credentials {
            prefix.push_str(&format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(password.expose())
            ));
        }

        let mut parts = vec![
            Value::Literal(prefix),
            Value::from(&self.host),
            Value::literal(":"),
            Value::from(&self.port),
        ];
        if let Some(path) = &self.path {
            parts.push(Value::Literal(format!("/{}", path)));
        }

        Value::join(parts)
    }
}

impl fmt::Debug for ConnectionUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionUrl")
            .field("scheme", &self.scheme)
            .field("user", &self.credentials.as_ref().map(|(user, _)| user))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .finish()
    }
}

impl From<ConnectionUrl> for Value {
    fn from(url: ConnectionUrl) -> Self {
        url.to_value()
    }
}

/// Container port exposed by a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: Option<u16>,
}

/// Log shipping of a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfiguration {
    pub log_group: Value,
    pub stream_prefix: String,
}

/// One container inside a task definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerTaskSpec {
    pub name: ResourceName,
    pub image: String,
    pub memory_mib: u32,
    pub environment: Environment,
    pub command: Vec<String>,
    pub port_mappings: Vec<PortMapping>,
    pub logging: LogConfiguration,
}
