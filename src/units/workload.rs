// Copyright (c) 2025 - Cowboy AI, Inc.
//! Shared Container Workload Declarations
//!
//! Server, worker and initialization all run the same image with the same
//! data-store connection strings. The strings are built once, from the
//! stores' endpoint references, and handed to every workload unchanged.

use crate::config::{DatabaseConfig, TaskConfig};
use crate::domain::{
    env_keys, AttrRef, Attribute, ConnectionUrl, ContainerTaskSpec, EgressPolicy, Environment,
    IngressRule, LogConfiguration, LogicalId, PortMapping, ResourceName, SecurityGroupSpec, Value,
    WorkloadKind,
};
use crate::errors::StackResult;
use crate::secrets::SecretValue;
use crate::stack::resource::{
    ClusterSpec, LogGroupSpec, TaskDefinitionSpec, TaskNetworking,
};
use crate::stack::{EndpointReference, NetworkHandle, RemovalPolicy, ResourceSpec, StackBuilder};

/// Connection strings of the platform's data stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConnections {
    database: EndpointReference,
    cache: EndpointReference,
    database_url: ConnectionUrl,
    cache_url: ConnectionUrl,
}

impl StoreConnections {
    /// `postgresql://{user}:{password}@{host}:{port}/{db}` and `redis://{host}:{port}/0`
    pub fn new(
        database: &EndpointReference,
        cache: &EndpointReference,
        config: &DatabaseConfig,
        password: &SecretValue,
    ) -> Self {
        Self {
            database: database.clone(),
            cache: cache.clone(),
            database_url: ConnectionUrl::postgres(
                database,
                &config.master_username,
                password,
                &config.database_name,
            ),
            cache_url: ConnectionUrl::redis(cache, 0),
        }
    }

    pub fn database(&self) -> &EndpointReference {
        &self.database
    }

    pub fn cache(&self) -> &EndpointReference {
        &self.cache
    }

    pub fn database_url(&self) -> &ConnectionUrl {
        &self.database_url
    }

    pub fn cache_url(&self) -> &ConnectionUrl {
        &self.cache_url
    }
}

/// Environment every workload of `kind` starts from
pub(crate) fn base_environment(
    kind: WorkloadKind,
    log_level: &str,
    connections: &StoreConnections,
) -> Environment {
    let mut env = Environment::new();
    env.set(env_keys::PYTHON_UNBUFFERED, "0")
        .set(env_keys::LOG_LEVEL, log_level)
        .set(env_keys::DATABASE_URL, connections.database_url().to_value())
        .set(env_keys::CACHE_URL, connections.cache_url().to_value());

    if kind != WorkloadKind::Worker {
        env.set(env_keys::PASSWORD_LOGIN_ENABLED, "false")
            .set(env_keys::ALLOW_SCRIPTS_IN_USER_INPUT, "true")
            .set(env_keys::DATE_FORMAT, "YY/MM/DD");
    }
    env
}

/// Logical ids of a declared workload's task resources
pub(crate) struct TaskResources {
    pub cluster: LogicalId,
    pub task_definition: LogicalId,
    pub container_name: ResourceName,
}

/// Cluster, log group and single-container task definition
pub(crate) fn declare_task(
    stack: &mut StackBuilder,
    network: &NetworkHandle,
    image: &str,
    task: &TaskConfig,
    kind: WorkloadKind,
    environment: Environment,
    container_port: Option<u16>,
) -> StackResult<TaskResources> {
    let cluster = stack.add_resource(
        "EcsCluster",
        ResourceSpec::Cluster(ClusterSpec {
            name: ResourceName::new(task.cluster_name.as_str())?,
            vpc: Value::from(network.vpc_id()),
        }),
    )?;

    let log_group = stack.add_resource(
        "LogGroup",
        ResourceSpec::LogGroup(LogGroupSpec {
            name: ResourceName::new(task.log_group_name.as_str())?,
            removal_policy: RemovalPolicy::Destroy,
        }),
    )?;
    let log_group_name = stack.reference(&log_group, Attribute::Name);

    let container_name = ResourceName::new(task.container_name.as_str())?;
    let container = ContainerTaskSpec {
        name: container_name.clone(),
        image: image.to_string(),
        memory_mib: task.memory_mib,
        environment,
        command: vec![kind.command().to_string()],
        port_mappings: container_port
            .map(|port| PortMapping {
                container_port: port,
                host_port: Some(port),
            })
            .into_iter()
            .collect(),
        logging: LogConfiguration {
            log_group: Value::from(log_group_name),
            stream_prefix: task.log_group_name.clone(),
        },
    };

    let task_definition = stack.add_resource(
        "TaskDefinition",
        ResourceSpec::TaskDefinition(TaskDefinitionSpec {
            cpu: task.cpu,
            memory_mib: task.memory_mib,
            containers: vec![container],
        }),
    )?;

    Ok(TaskResources {
        cluster,
        task_definition,
        container_name,
    })
}

/// Security group of a workload; returns its group id reference
pub(crate) fn declare_security_group(
    stack: &mut StackBuilder,
    network: &NetworkHandle,
    name: &str,
    description: &str,
    ingress: Vec<IngressRule>,
) -> StackResult<AttrRef> {
    let group = stack.add_resource(
        "EcsSg",
        ResourceSpec::SecurityGroup(SecurityGroupSpec {
            name: ResourceName::new(name)?,
            description: description.to_string(),
            vpc: Value::from(network.vpc_id()),
            ingress,
            egress: EgressPolicy::AllowAll,
        }),
    )?;
    Ok(stack.reference(&group, Attribute::GroupId))
}

/// Task placement in the private subnets
pub(crate) fn private_networking(network: &NetworkHandle, security_group: &AttrRef) -> TaskNetworking {
    TaskNetworking {
        subnets: network.private_subnet_ids(),
        security_groups: vec![Value::from(security_group)],
        assign_public_ip: false,
    }
}
