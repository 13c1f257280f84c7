// Copyright (c) 2025 - Cowboy AI, Inc.
//! Secret Resolution
//!
//! Secrets are looked up once, at composition time, before any stack is
//! declared. A missing or empty secret is fatal; there is no fallback value.
//!
//! Resolved values are injected into container environments as plain text.
//! They are redacted from `Debug` output but not from synthesized templates.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, error};

/// Secret lookup error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("Secret '{0}' not found")]
    Missing(String),

    #[error("Secret '{0}' is empty")]
    Empty(String),

    #[error("Secret store unavailable: {0}")]
    Unavailable(String),
}

/// A resolved secret value
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plain secret text
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Source of secret values
pub trait SecretStore: Send + Sync {
    /// Look up a secret by name
    fn lookup(&self, name: &str) -> Result<SecretValue, SecretError>;
}

/// Reject empty values, so every store behaves the same
fn non_empty(name: &str, value: String) -> Result<SecretValue, SecretError> {
    if value.trim().is_empty() {
        return Err(SecretError::Empty(name.to_string()));
    }
    Ok(SecretValue(value))
}

/// Secrets read from process environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    prefix: Option<String>,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `{prefix}{name}` instead of `{name}`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn variable(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, name),
            None => name.to_string(),
        }
    }
}

impl SecretStore for EnvSecretStore {
    fn lookup(&self, name: &str) -> Result<SecretValue, SecretError> {
        let variable = self.variable(name);
        match std::env::var(&variable) {
            Ok(value) => non_empty(name, value),
            Err(std::env::VarError::NotPresent) => Err(SecretError::Missing(name.to_string())),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::Unavailable(format!(
                "{} is not valid unicode",
                variable
            ))),
        }
    }
}

/// Secrets held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    values: HashMap<String, SecretValue>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), SecretValue::new(value));
        self
    }
}

impl SecretStore for StaticSecretStore {
    fn lookup(&self, name: &str) -> Result<SecretValue, SecretError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| SecretError::Missing(name.to_string()))?;
        non_empty(name, value.expose().to_string())
    }
}

/// Names under which the platform's secrets are stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SecretNames {
    pub database_password: String,
    pub cookie_secret: String,
}

impl Default for SecretNames {
    fn default() -> Self {
        Self {
            database_password: "REDASH_DB_PASSWORD".to_string(),
            cookie_secret: "REDASH_COOKIE_SECRET".to_string(),
        }
    }
}

/// Every secret the platform needs, resolved up front
#[derive(Debug, Clone)]
pub struct PlatformSecrets {
    pub database_password: SecretValue,
    pub cookie_secret: SecretValue,
}

impl PlatformSecrets {
    /// Resolve all platform secrets; the first failure aborts
    pub fn resolve(store: &dyn SecretStore, names: &SecretNames) -> Result<Self, SecretError> {
        let lookup = |name: &str| {
            store
                .lookup(name)
                .inspect(|_| debug!("Resolved secret {}", name))
                .inspect_err(|e| error!("Secret resolution failed: {}", e))
        };

        Ok(Self {
            database_password: lookup(&names.database_password)?,
            cookie_secret: lookup(&names.cookie_secret)?,
        })
    }
}
