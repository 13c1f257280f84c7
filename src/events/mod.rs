// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Events
//!
//! Immutable facts recorded while a deployment realizes its stacks.
//!
//! # Correlation and Causation
//!
//! - **deployment_id**: correlation id shared by every event of one deployment
//! - **causation_id**: the event that directly led to this one
//!
//! ```text
//! StackRealizationStarted   VpcStack       causation_id: None
//!   ↓
//! StackRealized             VpcStack       causation_id: evt-1
//!   ↓
//! StackRealizationStarted   RedashRdsStack causation_id: evt-2
//!   ↓
//! StackRealizationFailed    RedashRdsStack causation_id: evt-3
//! ```

pub mod deployment;

pub use deployment::{
    DeploymentEvent, StackRealizationFailed, StackRealizationStarted, StackRealized,
    EVENT_VERSION,
};
