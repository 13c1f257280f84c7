// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack realization events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::StackName;
use crate::provision::ProvisioningError;

/// Current schema version of every deployment event
pub const EVENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeploymentEvent {
    /// A stack template was handed to the provisioner
    StackRealizationStarted(StackRealizationStarted),

    /// The provisioner reported every attribute of the stack
    StackRealized(StackRealized),

    /// The provisioner refused or failed; the deployment halts
    StackRealizationFailed(StackRealizationFailed),
}

impl DeploymentEvent {
    pub fn event_id(&self) -> Uuid {
        match self {
            DeploymentEvent::StackRealizationStarted(e) => e.event_id,
            DeploymentEvent::StackRealized(e) => e.event_id,
            DeploymentEvent::StackRealizationFailed(e) => e.event_id,
        }
    }

    pub fn deployment_id(&self) -> Uuid {
        match self {
            DeploymentEvent::StackRealizationStarted(e) => e.deployment_id,
            DeploymentEvent::StackRealized(e) => e.deployment_id,
            DeploymentEvent::StackRealizationFailed(e) => e.deployment_id,
        }
    }

    pub fn causation_id(&self) -> Option<Uuid> {
        match self {
            DeploymentEvent::StackRealizationStarted(e) => e.causation_id,
            DeploymentEvent::StackRealized(e) => e.causation_id,
            DeploymentEvent::StackRealizationFailed(e) => e.causation_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DeploymentEvent::StackRealizationStarted(e) => e.timestamp,
            DeploymentEvent::StackRealized(e) => e.timestamp,
            DeploymentEvent::StackRealizationFailed(e) => e.timestamp,
        }
    }

    pub fn stack(&self) -> &StackName {
        match self {
            DeploymentEvent::StackRealizationStarted(e) => &e.stack,
            DeploymentEvent::StackRealized(e) => &e.stack,
            DeploymentEvent::StackRealizationFailed(e) => &e.stack,
        }
    }

    /// Human-readable event type name
    pub fn event_type_name(&self) -> &str {
        match self {
            DeploymentEvent::StackRealizationStarted(_) => "StackRealizationStarted",
            DeploymentEvent::StackRealized(_) => "StackRealized",
            DeploymentEvent::StackRealizationFailed(_) => "StackRealizationFailed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRealizationStarted {
    /// Event version for schema evolution
    pub event_version: u32,

    /// Unique event identifier (UUID v7 for time ordering)
    pub event_id: Uuid,

    /// Correlation id of the deployment
    pub deployment_id: Uuid,

    pub timestamp: DateTime<Utc>,

    /// Event that caused this event
    pub causation_id: Option<Uuid>,

    pub stack: StackName,

    /// Provisioner handling the request
    pub provisioner: String,
}

impl StackRealizationStarted {
    pub fn new(
        deployment_id: Uuid,
        causation_id: Option<Uuid>,
        stack: StackName,
        provisioner: impl Into<String>,
    ) -> Self {
        Self {
            event_version: EVENT_VERSION,
            event_id: Uuid::now_v7(),
            deployment_id,
            timestamp: Utc::now(),
            causation_id,
            stack,
            provisioner: provisioner.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRealized {
    pub event_version: u32,
    pub event_id: Uuid,
    pub deployment_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub causation_id: Option<Uuid>,
    pub stack: StackName,

    /// Number of realized resources
    pub resource_count: usize,

    /// Resolved stack outputs
    pub outputs: BTreeMap<String, String>,
}

impl StackRealized {
    pub fn new(
        deployment_id: Uuid,
        causation_id: Option<Uuid>,
        stack: StackName,
        resource_count: usize,
        outputs: BTreeMap<String, String>,
    ) -> Self {
        Self {
            event_version: EVENT_VERSION,
            event_id: Uuid::now_v7(),
            deployment_id,
            timestamp: Utc::now(),
            causation_id,
            stack,
            resource_count,
            outputs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRealizationFailed {
    pub event_version: u32,
    pub event_id: Uuid,
    pub deployment_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub causation_id: Option<Uuid>,
    pub stack: StackName,
    pub error: ProvisioningError,
}

impl StackRealizationFailed {
    pub fn new(
        deployment_id: Uuid,
        causation_id: Option<Uuid>,
        stack: StackName,
        error: ProvisioningError,
    ) -> Self {
        Self {
            event_version: EVENT_VERSION,
            event_id: Uuid::now_v7(),
            deployment_id,
            timestamp: Utc::now(),
            causation_id,
            stack,
            error,
        }
    }
}
