// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Capability
//!
//! The declare-and-realize boundary. A [`Provisioner`] receives one
//! [`StackTemplate`] whose cross-stack references are already replaced by
//! realized values, creates the resources, and reports the physical
//! attribute values of every exported attribute.
//!
//! # Implementations
//!
//! - [`InMemoryProvisioner`]: deterministic attribute shapes with fresh
//!   physical ids, call recording and injectable failures
//! - [`NatsProvisioner`]: request-reply over `provisioning.stack.{stack}.realize`

pub mod memory;
pub mod nats;
pub mod subjects;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::{AttrRef, Attribute, LogicalId, StackName};
use crate::stack::{template, StackTemplate};

pub use memory::InMemoryProvisioner;
pub use nats::{NatsConfig, NatsProvisioner, RealizationReply};

/// Failures reported by a provisioning capability
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProvisioningError {
    #[error("Quota exceeded for {resource}: {message}")]
    QuotaExceeded { resource: String, message: String },

    /// A physical name is already taken
    #[error("Naming conflict: {name}")]
    NamingConflict { name: String },

    #[error("Invalid parameter on {resource}: {message}")]
    InvalidParameter { resource: String, message: String },

    /// The capability could not be reached
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Realization rejected: {message}")]
    Rejected { message: String },
}

/// Attribute values of one realized stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedStack {
    pub stack: StackName,
    pub attributes: BTreeMap<LogicalId, BTreeMap<Attribute, String>>,
    pub outputs: BTreeMap<String, String>,
    pub realized_at: DateTime<Utc>,
}

impl RealizedStack {
    /// Realized value of a reference into this stack
    pub fn attribute(&self, reference: &AttrRef) -> Option<&str> {
        if reference.stack != self.stack {
            return None;
        }
        self.attributes
            .get(&reference.resource)?
            .get(&reference.attribute)
            .map(String::as_str)
    }

    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }
}

/// Resolve a template's outputs against the stack's own realized attributes
pub fn resolve_outputs(
    template: &StackTemplate,
    attributes: &BTreeMap<LogicalId, BTreeMap<Attribute, String>>,
) -> Result<BTreeMap<String, String>, ProvisioningError> {
    let mut outputs = BTreeMap::new();
    for (name, json) in &template.outputs {
        let mut json = json.clone();
        template::substitute(&mut json, &|reference: &AttrRef| {
            Ok(attributes
                .get(&reference.resource)
                .and_then(|values| values.get(&reference.attribute))
                .cloned())
        })
        .map_err(|e| ProvisioningError::InvalidParameter {
            resource: name.clone(),
            message: e.to_string(),
        })?;

        let value = json
            .as_str()
            .ok_or_else(|| ProvisioningError::InvalidParameter {
                resource: name.clone(),
                message: format!("output does not resolve to a string: {}", json),
            })?;
        outputs.insert(name.clone(), value.to_string());
    }
    Ok(outputs)
}

/// Declare-and-realize capability
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Realize every resource of one stack
    async fn realize(&self, template: &StackTemplate) -> Result<RealizedStack, ProvisioningError>;

    /// Provisioner name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn realized() -> RealizedStack {
        RealizedStack {
            stack: StackName::new("RedashRdsStack").unwrap(),
            attributes: BTreeMap::from([(
                LogicalId::new("RedashDB").unwrap(),
                BTreeMap::from([(Attribute::EndpointPort, "5432".to_string())]),
            )]),
            outputs: BTreeMap::new(),
            realized_at: Utc::now(),
        }
    }

    #[test]
    fn test_attribute_lookup_is_scoped_to_stack() {
        let stack = realized();
        let port = AttrRef::new(
            StackName::new("RedashRdsStack").unwrap(),
            LogicalId::new("RedashDB").unwrap(),
            Attribute::EndpointPort,
        );
        let foreign = AttrRef::new(
            StackName::new("RedashElastiCacheStack").unwrap(),
            LogicalId::new("RedashDB").unwrap(),
            Attribute::EndpointPort,
        );

        assert_eq!(stack.attribute(&port), Some("5432"));
        assert_eq!(stack.attribute(&foreign), None);
    }

    #[test]
    fn test_error_wire_format() {
        let error = ProvisioningError::QuotaExceeded {
            resource: "RedashDB".to_string(),
            message: "instance limit".to_string(),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["kind"], "quota_exceeded");
        assert_eq!(serde_json::from_value::<ProvisioningError>(json).unwrap(), error);
    }

    #[test]
    fn test_realized_stack_wire_format() {
        let stack = realized();
        let json = serde_json::to_value(&stack).unwrap();
        assert_eq!(json["attributes"]["RedashDB"]["endpoint_port"], "5432");
    }
}
