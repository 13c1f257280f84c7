// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Domain Models
//!
//! Value objects shared by every stack of the analytics platform deployment.
//!
//! # Value Objects with Invariants
//!
//! - [`StackName`], [`LogicalId`], [`ResourceName`], [`DnsName`] - stable deployment identifiers
//! - [`Ipv4Cidr`] - IPv4 address blocks with subnet partitioning
//! - [`AvailabilityZone`] - zones of the target region
//! - [`IngressRule`] - security boundary permissions with the data-store ingress policy
//!
//! # Declared Values
//!
//! - [`AttrRef`] - `(stack, logical id, attribute)` reference to a realized resource
//! - [`Value`] - literal, reference, or join of values
//! - [`ConnectionUrl`] - connection strings derived from endpoint references
//! - [`ContainerTaskSpec`] - one container of a workload task

pub mod container;
pub mod names;
pub mod network;
pub mod security;
pub mod value;

pub use container::{
    env_keys, ConnectionUrl, ContainerTaskSpec, Endpoint, Environment, LogConfiguration,
    PortMapping, WorkloadKind,
};
pub use names::{DnsName, LogicalId, NameError, ResourceName, StackName};
pub use network::{AvailabilityZone, Ipv4Cidr, NetworkError, SubnetTier};
pub use security::{
    validate_store_ingress, EgressPolicy, IngressRule, Peer, PortRange, Protocol,
    SecurityError, SecurityGroupSpec,
};
pub use value::{AttrRef, Attribute, Value};
