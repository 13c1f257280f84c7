// Copyright (c) 2025 - Cowboy AI, Inc.
//! Relational Store Unit
//!
//! A single-instance PostgreSQL database in the private subnets behind its
//! own security group.

use tracing::{info, warn};

use crate::composition::Unit;
use crate::config::DatabaseConfig;
use crate::domain::{
    validate_store_ingress, Attribute, EgressPolicy, IngressRule, ResourceName,
    SecurityGroupSpec, Value,
};
use crate::errors::StackResult;
use crate::secrets::SecretValue;
use crate::stack::resource::DatabaseInstanceSpec;
use crate::stack::{
    EndpointReference, NetworkHandle, ResourceSpec, SecurityGroupHandle, StackBuilder,
    StoreOutputs,
};

pub const STACK_NAME: &str = "RedashRdsStack";

#[derive(Debug, Clone)]
pub struct RelationalStore {
    network: NetworkHandle,
    config: DatabaseConfig,
    password: SecretValue,
    ingress: Vec<IngressRule>,
}

impl RelationalStore {
    pub fn new(network: &NetworkHandle, config: &DatabaseConfig, password: &SecretValue) -> Self {
        Self {
            network: network.clone(),
            config: config.clone(),
            password: password.clone(),
            ingress: Vec::new(),
        }
    }

    /// Ingress rules of the store's security group
    pub fn with_ingress(mut self, rules: Vec<IngressRule>) -> Self {
        self.ingress = rules;
        self
    }
}

impl Unit for RelationalStore {
    type Output = StoreOutputs;

    fn stack_name(&self) -> &str {
        STACK_NAME
    }

    fn declare(self, stack: &mut StackBuilder) -> StackResult<StoreOutputs> {
        let config = &self.config;
        validate_store_ingress(config.port, &self.ingress)?;
        if self.ingress.is_empty() {
            warn!("{} has no ingress rules; the database is unreachable", STACK_NAME);
        }

        stack.consume(&self.network);

        let group_name = ResourceName::new(config.security_group_name.as_str())?;
        let group = stack.add_resource(
            "DbSg",
            ResourceSpec::SecurityGroup(SecurityGroupSpec {
                name: group_name.clone(),
                description: "security group for Redash RDS".to_string(),
                vpc: Value::from(self.network.vpc_id()),
                ingress: self.ingress.clone(),
                egress: EgressPolicy::AllowAll,
            }),
        )?;
        let group_id = stack.reference(&group, Attribute::GroupId);

        let database = stack.add_resource(
            "RedashDB",
            ResourceSpec::DatabaseInstance(DatabaseInstanceSpec {
                identifier: ResourceName::new(config.instance_identifier.as_str())?,
                engine: "postgres".to_string(),
                engine_version: config.engine_version.clone(),
                instance_class: config.instance_class.clone(),
                database_name: config.database_name.clone(),
                master_username: config.master_username.clone(),
                master_password: self.password.expose().to_string(),
                port: config.port,
                subnets: self.network.private_subnet_ids(),
                security_groups: vec![Value::from(&group_id)],
                iam_authentication: true,
                performance_insights: true,
                auto_minor_version_upgrade: true,
                multi_az: false,
                backup_retention_days: config.backup_retention_days,
                deletion_protection: false,
                storage_type: config.storage_type.clone(),
                allocated_storage_gib: config.allocated_storage_gib,
                removal_policy: config.removal_policy,
            }),
        )?;

        info!(
            "Database {} on port {} with {} ingress rules",
            config.instance_identifier,
            config.port,
            self.ingress.len()
        );

        Ok(StoreOutputs {
            endpoint: EndpointReference::new(
                stack.reference(&database, Attribute::EndpointAddress),
                stack.reference(&database, Attribute::EndpointPort),
                config.port,
            ),
            security_group: SecurityGroupHandle::new(group_id, group_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ipv4Cidr, Peer, SecurityError, StackName};
    use crate::errors::StackError;
    use crate::stack::StackEnv;
    use crate::units::NetworkTopology;

    fn network() -> NetworkHandle {
        let mut vpc = StackBuilder::new(
            StackName::new("VpcStack").unwrap(),
            StackEnv::new("000000000000", "ap-northeast-1"),
        );
        NetworkTopology::new(Ipv4Cidr::new("10.0.0.0/16").unwrap(), 2)
            .declare(&mut vpc)
            .unwrap()
    }

    fn builder() -> StackBuilder {
        StackBuilder::new(
            StackName::new(STACK_NAME).unwrap(),
            StackEnv::new("000000000000", "ap-northeast-1"),
        )
    }

    #[test]
    fn test_declares_endpoint_on_configured_port() {
        let network = network();
        let rules = network
            .private_peers()
            .into_iter()
            .map(|peer| IngressRule::tcp(peer, 5432, "Redash Postgres Port"))
            .collect();

        let mut stack = builder();
        let outputs = RelationalStore::new(&network, &DatabaseConfig::default(), &SecretValue::new("pw"))
            .with_ingress(rules)
            .declare(&mut stack)
            .unwrap();

        assert_eq!(outputs.endpoint.declared_port(), 5432);
        assert_eq!(outputs.security_group.name().as_str(), "DBSecurityGroup");

        let stack = stack.build().unwrap();
        assert_eq!(stack.dependencies().len(), 1);
    }

    #[test]
    fn test_rejects_wildcard_ingress() {
        let network = network();
        let result = RelationalStore::new(&network, &DatabaseConfig::default(), &SecretValue::new("pw"))
            .with_ingress(vec![IngressRule::tcp(Peer::AnyIpv4, 5432, "Redash Postgres Port")])
            .declare(&mut builder());

        assert!(matches!(
            result,
            Err(StackError::Security(SecurityError::WildcardIngress { port: 5432, .. }))
        ));
    }
}
