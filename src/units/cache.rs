// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cache Store Unit
//!
//! A single-node Redis replication group on a subnet group spanning every
//! private subnet.

use tracing::{info, warn};

use crate::composition::Unit;
use crate::config::CacheConfig;
use crate::domain::{
    validate_store_ingress, Attribute, EgressPolicy, IngressRule, ResourceName,
    SecurityGroupSpec, Value,
};
use crate::errors::StackResult;
use crate::stack::resource::{CacheSubnetGroupSpec, ReplicationGroupSpec};
use crate::stack::{
    EndpointReference, NetworkHandle, ResourceSpec, SecurityGroupHandle, StackBuilder,
    StoreOutputs,
};

pub const STACK_NAME: &str = "RedashElastiCacheStack";

#[derive(Debug, Clone)]
pub struct CacheStore {
    network: NetworkHandle,
    config: CacheConfig,
    ingress: Vec<IngressRule>,
}

impl CacheStore {
    pub fn new(network: &NetworkHandle, config: &CacheConfig) -> Self {
        Self {
            network: network.clone(),
            config: config.clone(),
            ingress: Vec::new(),
        }
    }

    pub fn with_ingress(mut self, rules: Vec<IngressRule>) -> Self {
        self.ingress = rules;
        self
    }
}

impl Unit for CacheStore {
    type Output = StoreOutputs;

    fn stack_name(&self) -> &str {
        STACK_NAME
    }

    fn declare(self, stack: &mut StackBuilder) -> StackResult<StoreOutputs> {
        let config = &self.config;
        validate_store_ingress(config.port, &self.ingress)?;
        if self.ingress.is_empty() {
            warn!("{} has no ingress rules; the cache is unreachable", STACK_NAME);
        }

        stack.consume(&self.network);

        let group_name = ResourceName::new(config.security_group_name.as_str())?;
        let group = stack.add_resource(
            "RedisSg",
            ResourceSpec::SecurityGroup(SecurityGroupSpec {
                name: group_name.clone(),
                description: "security group for Redash Redis".to_string(),
                vpc: Value::from(self.network.vpc_id()),
                ingress: self.ingress.clone(),
                egress: EgressPolicy::AllowAll,
            }),
        )?;
        let group_id = stack.reference(&group, Attribute::GroupId);

        let subnet_group = stack.add_resource(
            "RedisSubnetGroup",
            ResourceSpec::CacheSubnetGroup(CacheSubnetGroupSpec {
                name: ResourceName::new(config.subnet_group_name.as_str())?,
                description: "Redash Redis SubnetGroup".to_string(),
                subnets: self.network.private_subnet_ids(),
            }),
        )?;
        let subnet_group_name = stack.reference(&subnet_group, Attribute::Name);

        let cache = stack.add_resource(
            "ElastiCache",
            ResourceSpec::ReplicationGroup(ReplicationGroupSpec {
                id: ResourceName::new(config.replication_group_id.as_str())?,
                description: "Redis for Redash".to_string(),
                engine: "redis".to_string(),
                node_type: config.node_type.clone(),
                num_cache_clusters: config.num_cache_clusters,
                automatic_failover: false,
                auto_minor_version_upgrade: false,
                port: config.port,
                subnet_group: Value::from(subnet_group_name),
                security_groups: vec![Value::from(&group_id)],
                snapshot_window: config.snapshot_window.clone(),
                snapshot_retention_limit: config.snapshot_retention_limit,
                removal_policy: config.removal_policy,
            }),
        )?;

        info!(
            "Cache {} on port {} across {} private subnets",
            config.replication_group_id,
            config.port,
            self.network.private_subnets().len()
        );

        Ok(StoreOutputs {
            endpoint: EndpointReference::new(
                stack.reference(&cache, Attribute::PrimaryEndpointAddress),
                stack.reference(&cache, Attribute::PrimaryEndpointPort),
                config.port,
            ),
            security_group: SecurityGroupHandle::new(group_id, group_name),
        })
    }
}
