// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure Units
//!
//! One [`Unit`](crate::composition::Unit) per stack of the analytics platform:
//!
//! | Unit | Stack | Consumes |
//! |---|---|---|
//! | [`NetworkTopology`] | `VpcStack` | - |
//! | [`ServiceDiscovery`] | `ServiceDiscoveryStack` | network |
//! | [`RelationalStore`] | `RedashRdsStack` | network |
//! | [`CacheStore`] | `RedashElastiCacheStack` | network |
//! | [`Initialization`] | `RedashInitializeStack` | network, database, cache |
//! | [`Server`] | `RedashServerStack` | network, namespace, database, cache, ready signal |
//! | [`Worker`] | `RedashWorkerStack` | network, database, cache, ready signal |
//! | [`AuxiliaryAccess`] | `Ec2StepServerStack` | network |

pub mod access;
pub mod cache;
pub mod discovery;
pub mod initialize;
pub mod network;
pub mod relational;
pub mod server;
pub mod worker;
pub mod workload;

pub use access::AuxiliaryAccess;
pub use cache::CacheStore;
pub use discovery::ServiceDiscovery;
pub use initialize::Initialization;
pub use network::NetworkTopology;
pub use relational::RelationalStore;
pub use server::Server;
pub use worker::Worker;
pub use workload::StoreConnections;
