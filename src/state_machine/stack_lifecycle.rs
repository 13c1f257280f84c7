// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Lifecycle State Machine
//!
//! Realization status of one stack within one deployment. Each stack is
//! realized at most once: `Realized` and `Failed` are terminal.
//!
//! # States
//!
//! - Declared: composed, not yet handed to the provisioner
//! - Realizing: provisioner call in flight
//! - Realized: attributes known (terminal)
//! - Failed: provisioner refused or failed (terminal)
//!
//! # Inputs
//!
//! - BeginRealization: Declared → Realizing
//! - RealizationSucceeded: Realizing → Realized
//! - RealizationFailed: Realizing → Failed

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{StateMachine, TransitionError, TransitionResult};

/// Realization status of a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackStatus {
    Declared,
    Realizing,
    Realized,
    Failed,
}

impl StackStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StackStatus::Realized | StackStatus::Failed)
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackStatus::Declared => write!(f, "declared"),
            StackStatus::Realizing => write!(f, "realizing"),
            StackStatus::Realized => write!(f, "realized"),
            StackStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Lifecycle input (FSM input)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackInput {
    BeginRealization,
    RealizationSucceeded,
    /// Carries the provisioner's reason
    RealizationFailed(String),
}

impl StateMachine for StackStatus {
    type Input = StackInput;
    type Output = ();

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use StackInput::*;
        use StackStatus::*;

        match (self, input) {
            (Declared, BeginRealization) => Ok((Realizing, ())),
            (Realizing, RealizationSucceeded) => Ok((Realized, ())),
            (Realizing, RealizationFailed(_)) => Ok((Failed, ())),

            (Realized, BeginRealization) => Err(TransitionError::PreconditionFailed(
                "stack is already realized in this deployment".to_string(),
            )),
            (Failed, _) | (Realized, _) => Err(TransitionError::InvalidTransition {
                from: self.to_string(),
                to: "any state".to_string(),
            }),

            (Declared, RealizationSucceeded) | (Declared, RealizationFailed(_)) => {
                Err(TransitionError::InvalidTransition {
                    from: Declared.to_string(),
                    to: "a realization outcome".to_string(),
                })
            }
            (Realizing, BeginRealization) => Err(TransitionError::InvalidTransition {
                from: Realizing.to_string(),
                to: Realizing.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_realization() {
        let (realizing, _) = StackStatus::Declared
            .transition(&StackInput::BeginRealization)
            .unwrap();
        let (realized, ()) = realizing
            .transition(&StackInput::RealizationSucceeded)
            .unwrap();

        assert_eq!(realized, StackStatus::Realized);
        assert!(realized.is_terminal());
    }

    #[test]
    fn test_failed_realization_is_terminal() {
        let (failed, ()) = StackStatus::Realizing
            .transition(&StackInput::RealizationFailed("quota".to_string()))
            .unwrap();

        assert_eq!(failed, StackStatus::Failed);
        assert!(failed.is_terminal());
        assert!(!failed.can_transition(&StackInput::RealizationSucceeded));
    }

    #[test]
    fn test_realize_once() {
        assert!(matches!(
            StackStatus::Realized.transition(&StackInput::BeginRealization),
            Err(TransitionError::PreconditionFailed(_))
        ));
        assert!(!StackStatus::Failed.can_transition(&StackInput::BeginRealization));
    }

    #[test]
    fn test_outcome_requires_realizing() {
        assert!(!StackStatus::Declared.can_transition(&StackInput::RealizationSucceeded));
        assert!(!StackStatus::Realizing.can_transition(&StackInput::BeginRealization));
    }
}
