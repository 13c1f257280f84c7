//! Error types for stack composition and deployment

use thiserror::Error;

use crate::domain::{AttrRef, LogicalId, NameError, NetworkError, SecurityError, StackName};
use crate::provision::ProvisioningError;
use crate::secrets::SecretError;
use crate::state_machine::TransitionError;

/// Errors that can occur while composing or deploying stacks
#[derive(Debug, Error)]
pub enum StackError {
    /// A consumed handle belongs to a stack that is not in the composition root
    #[error("Stack '{stack}' depends on '{dependency}', which has not been added")]
    MissingDependency {
        stack: StackName,
        dependency: StackName,
    },

    /// A reference points into a stack whose handle was never passed in
    #[error("Stack '{stack}' references {reference} but does not declare '{producer}' as a dependency")]
    UndeclaredDependency {
        stack: StackName,
        producer: StackName,
        reference: AttrRef,
    },

    /// A reference names a resource or attribute the producer does not export
    #[error("Stack '{stack}' references {reference}, which is not exported")]
    UnresolvableReference { stack: StackName, reference: AttrRef },

    /// Stack names are unique within a composition root
    #[error("Stack '{0}' already exists")]
    DuplicateStack(StackName),

    /// Logical ids are unique within a stack
    #[error("Stack '{stack}' declares resource '{logical_id}' twice")]
    DuplicateResource {
        stack: StackName,
        logical_id: LogicalId,
    },

    /// Removal refused while dependents exist
    #[error("Stack '{stack}' is still referenced by {dependents:?}")]
    StillReferenced {
        stack: StackName,
        dependents: Vec<StackName>,
    },

    #[error("Unknown stack: {0}")]
    UnknownStack(StackName),

    /// The dependency graph is not acyclic
    #[error("Dependency cycle between stacks: {0:?}")]
    Cycle(Vec<StackName>),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error("Secret resolution failed: {0}")]
    Secret(#[from] SecretError),

    /// Realization of a stack was refused or failed
    #[error("Provisioning of stack '{stack}' failed: {source}")]
    Provisioning {
        stack: StackName,
        #[source]
        source: ProvisioningError,
    },

    /// A cross-stack reference had no realized value at deploy time
    #[error("Unresolved reference at deploy time: {0}")]
    UnresolvedReference(String),

    #[error("Stack lifecycle error: {0}")]
    Lifecycle(#[from] TransitionError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for stack operations
pub type StackResult<T> = Result<T, StackError>;
