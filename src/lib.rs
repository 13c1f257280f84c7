//! Stack composition for the CIM analytics platform deployment
//!
//! Independently defined infrastructure units declare typed outputs, consume
//! each other's outputs as typed inputs, and are realized in dependency order
//! with consistent identifiers, network wiring and environment injection into
//! containerized workloads.
//!
//! ```text
//! Unit → StackBuilder → Stack → CompositionRoot → StackTemplate → Provisioner
//!        (declare)      (validate) (order)         (resolve imports) (realize)
//! ```

pub mod composition;
pub mod config;
pub mod deploy;
pub mod domain;
pub mod errors;
pub mod events;
pub mod platform;
pub mod provision;
pub mod secrets;
pub mod stack;
pub mod state_machine;
pub mod units;

// Re-export commonly used types
pub use composition::{CompositionRoot, Unit};
pub use config::DeploymentConfig;
pub use deploy::{deploy, Deployment, DeploymentReport};
pub use errors::{StackError, StackResult};
pub use platform::AnalyticsPlatform;
pub use provision::{InMemoryProvisioner, NatsProvisioner, Provisioner, RealizedStack};
pub use secrets::{EnvSecretStore, SecretStore, SecretValue, StaticSecretStore};
pub use stack::{Stack, StackBuilder, StackEnv, StackTemplate};
