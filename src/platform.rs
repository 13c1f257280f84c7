// Copyright (c) 2025 - Cowboy AI, Inc.
//! Analytics Platform Composition
//!
//! Wires the eight units of the platform into one [`CompositionRoot`]:
//!
//! ```text
//! VpcStack ─┬─ RedashRdsStack ─────────┬─ RedashInitializeStack ─┐
//!           ├─ ServiceDiscoveryStack   │                         ├─ RedashServerStack
//!           ├─ Ec2StepServerStack      │                         └─ RedashWorkerStack
//!           └─ RedashElastiCacheStack ─┘
//! ```
//!
//! Secrets are resolved before any unit is declared; a missing secret
//! leaves nothing composed.

use tracing::{info, warn};

use crate::composition::CompositionRoot;
use crate::config::DeploymentConfig;
use crate::domain::{IngressRule, Peer};
use crate::errors::StackResult;
use crate::secrets::{PlatformSecrets, SecretStore};
use crate::stack::{
    InstanceHandle, NamespaceHandle, NetworkHandle, ServiceHandle, StoreOutputs, TaskRunHandle,
};
use crate::units::{
    AuxiliaryAccess, CacheStore, Initialization, NetworkTopology, RelationalStore, Server,
    ServiceDiscovery, StoreConnections, Worker,
};

/// A composed platform: the root plus every handle it produced
#[derive(Debug, Clone)]
pub struct AnalyticsPlatform {
    pub root: CompositionRoot,
    pub network: NetworkHandle,
    pub namespace: NamespaceHandle,
    pub database: StoreOutputs,
    pub cache: StoreOutputs,
    pub connections: StoreConnections,
    pub initialization: TaskRunHandle,
    pub server: ServiceHandle,
    pub worker: ServiceHandle,
    /// Absent when the step server is disabled
    pub access: Option<InstanceHandle>,
}

impl AnalyticsPlatform {
    /// Resolve secrets, then declare every unit
    pub fn compose(config: &DeploymentConfig, secrets: &dyn SecretStore) -> StackResult<Self> {
        let secrets = PlatformSecrets::resolve(secrets, &config.secrets)?;
        let env = &config.env;
        let workloads = &config.workloads;

        let mut root = CompositionRoot::new().with_tags(config.tags.clone());

        let network = root.compose(
            env,
            NetworkTopology::new(config.network.cidr, config.network.max_azs),
        )?;

        let database = root.compose(
            env,
            RelationalStore::new(&network, &config.database, &secrets.database_password)
                .with_ingress(store_ingress(&network, config, config.database.port)),
        )?;

        let namespace = root.compose(
            env,
            ServiceDiscovery::new(&network, config.discovery.namespace.clone()),
        )?;

        let access = if config.access.enabled {
            Some(root.compose(env, AuxiliaryAccess::new(&network, &config.access))?)
        } else {
            None
        };

        let cache = root.compose(
            env,
            CacheStore::new(&network, &config.cache)
                .with_ingress(store_ingress(&network, config, config.cache.port)),
        )?;

        let connections = StoreConnections::new(
            &database.endpoint,
            &cache.endpoint,
            &config.database,
            &secrets.database_password,
        );

        let initialization = root.compose(
            env,
            Initialization::new(&network, &connections, &workloads.image, &workloads.initialize),
        )?;

        let mut server = Server::new(
            &network,
            &namespace,
            &connections,
            &secrets.cookie_secret,
            &workloads.image,
            &workloads.server,
        );
        let mut worker = Worker::new(&network, &connections, &workloads.image, &workloads.worker);
        if workloads.gate_on_initialization {
            server = server.after(&initialization);
            worker = worker.after(&initialization);
        } else {
            warn!(
                "Server and worker are not ordered after {}; the schema must exist before they start",
                initialization.task_arn().stack
            );
        }

        let server = root.compose(env, server)?;
        let worker = root.compose(env, worker)?;

        info!(
            "Composed analytics platform: {} stacks in {}",
            root.len(),
            env.region
        );

        Ok(Self {
            root,
            network,
            namespace,
            database,
            cache,
            connections,
            initialization,
            server,
            worker,
            access,
        })
    }
}

/// Rules admitting the private subnets to a store port, plus the step
/// server's subnet when operator access is enabled
fn store_ingress(network: &NetworkHandle, config: &DeploymentConfig, port: u16) -> Vec<IngressRule> {
    let mut rules: Vec<IngressRule> = network
        .private_peers()
        .into_iter()
        .map(|peer| IngressRule::tcp(peer, port, "Redash workloads"))
        .collect();

    if config.access.enabled {
        if let Some(subnet) = network.public_subnets().first() {
            rules.push(IngressRule::tcp(
                Peer::Cidr(subnet.cidr()),
                port,
                "Step server",
            ));
        }
    }
    rules
}
