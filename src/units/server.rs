// Copyright (c) 2025 - Cowboy AI, Inc.
//! Server Unit
//!
//! The internet-facing application service: a Fargate service behind a
//! public load balancer, registered in the private namespace under an alias
//! to that load balancer.

use tracing::info;

use super::workload::{self, StoreConnections};
use crate::composition::Unit;
use crate::config::ServerConfig;
use crate::domain::{
    env_keys, Attribute, EgressPolicy, IngressRule, ResourceName, SecurityGroupSpec, Value,
    WorkloadKind,
};
use crate::errors::StackResult;
use crate::secrets::SecretValue;
use crate::stack::resource::{
    DiscoveryServiceSpec, DnsRecordType, FargateServiceSpec, LoadBalancerSpec, LoadBalancerTarget,
};
use crate::stack::{
    NamespaceHandle, NetworkHandle, ResourceSpec, ServiceHandle, ServiceRegistration,
    StackBuilder, TaskRunHandle,
};

pub const STACK_NAME: &str = "RedashServerStack";

#[derive(Debug, Clone)]
pub struct Server {
    network: NetworkHandle,
    namespace: NamespaceHandle,
    connections: StoreConnections,
    cookie_secret: SecretValue,
    image: String,
    config: ServerConfig,
    ready: Option<TaskRunHandle>,
}

impl Server {
    pub fn new(
        network: &NetworkHandle,
        namespace: &NamespaceHandle,
        connections: &StoreConnections,
        cookie_secret: &SecretValue,
        image: &str,
        config: &ServerConfig,
    ) -> Self {
        Self {
            network: network.clone(),
            namespace: namespace.clone(),
            connections: connections.clone(),
            cookie_secret: cookie_secret.clone(),
            image: image.to_string(),
            config: config.clone(),
            ready: None,
        }
    }

    /// Order this stack after the initialization run
    pub fn after(mut self, ready: &TaskRunHandle) -> Self {
        self.ready = Some(ready.clone());
        self
    }
}

impl Unit for Server {
    type Output = ServiceHandle;

    fn stack_name(&self) -> &str {
        STACK_NAME
    }

    fn declare(self, stack: &mut StackBuilder) -> StackResult<ServiceHandle> {
        let kind = WorkloadKind::Server;
        let config = &self.config;

        stack
            .consume(&self.network)
            .consume(&self.namespace)
            .consume(self.connections.database())
            .consume(self.connections.cache());
        if let Some(ready) = &self.ready {
            stack.consume(ready);
        }

        let security_group = workload::declare_security_group(
            stack,
            &self.network,
            &config.security_group_name,
            "security group for Redash ECS Service",
            vec![IngressRule::public(config.container_port, "Redash Server Port")],
        )?;

        let mut environment =
            workload::base_environment(kind, &config.task.log_level, &self.connections);
        environment.set(env_keys::COOKIE_SECRET, self.cookie_secret.expose());

        let task = workload::declare_task(
            stack,
            &self.network,
            &self.image,
            &config.task,
            kind,
            environment,
            Some(config.container_port),
        )?;

        let service_name = ResourceName::new(config.service_name.as_str())?;
        let cluster = stack.reference(&task.cluster, Attribute::Arn);
        let task_definition = stack.reference(&task.task_definition, Attribute::Arn);
        let service = stack.add_resource(
            "ECSService",
            ResourceSpec::FargateService(FargateServiceSpec {
                name: service_name.clone(),
                cluster: Value::from(cluster),
                task_definition: Value::from(task_definition),
                desired_count: config.desired_count,
                networking: workload::private_networking(&self.network, &security_group),
            }),
        )?;
        let service_arn = stack.reference(&service, Attribute::ServiceArn);

        let load_balancer_group = stack.add_resource(
            "AlbSg",
            ResourceSpec::SecurityGroup(SecurityGroupSpec {
                name: ResourceName::new(config.load_balancer_security_group_name.as_str())?,
                description: "security group for the Redash load balancer".to_string(),
                vpc: Value::from(self.network.vpc_id()),
                ingress: vec![IngressRule::public(config.listener_port, "Redash Listener Port")],
                egress: EgressPolicy::AllowAll,
            }),
        )?;
        let load_balancer_group = stack.reference(&load_balancer_group, Attribute::GroupId);

        let load_balancer = stack.add_resource(
            "LoadBalancer",
            ResourceSpec::LoadBalancer(LoadBalancerSpec {
                internet_facing: true,
                subnets: self.network.public_subnet_ids(),
                security_groups: vec![Value::from(&load_balancer_group)],
                listener_port: config.listener_port,
                target: LoadBalancerTarget {
                    service: Value::from(&service_arn),
                    container_name: task.container_name.clone(),
                    container_port: config.container_port,
                },
            }),
        )?;
        let load_balancer_dns = stack.reference(&load_balancer, Attribute::DnsName);

        let discovery_name = ResourceName::new(config.discovery_name.as_str())?;
        let fqdn = self.namespace.name().child(discovery_name.as_str())?;
        stack.add_resource(
            "RedashService",
            ResourceSpec::DiscoveryService(DiscoveryServiceSpec {
                name: discovery_name,
                namespace: Value::from(self.namespace.namespace_id()),
                record_type: DnsRecordType::AAndAaaa,
                ttl_seconds: config.dns_ttl_seconds,
                alias_target: Some(Value::from(&load_balancer_dns)),
            }),
        )?;

        info!(
            "Server {} listens on {} behind port {}, registered as {}",
            service_name, config.container_port, config.listener_port, fqdn
        );

        Ok(ServiceHandle::new(service_name, service_arn)
            .with_load_balancer(load_balancer_dns)
            .with_registration(ServiceRegistration::new(
                self.namespace.name().clone(),
                fqdn,
                config.dns_ttl_seconds,
            )))
    }
}
