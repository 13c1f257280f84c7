// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Configuration
//!
//! Defaults describe the reference deployment: a two-zone `10.0.0.0/16`
//! network in `ap-northeast-1`, PostgreSQL 12 and single-node Redis, and the
//! server, worker and initialization workloads of `redash/redash:latest`.
//!
//! # Environment Overrides
//!
//! | Variable | Field |
//! |---|---|
//! | `CIM_STACKS_ACCOUNT` | `env.account` |
//! | `CIM_STACKS_REGION` | `env.region` |
//! | `CIM_STACKS_VPC_CIDR` | `network.cidr` |
//! | `CIM_STACKS_MAX_AZS` | `network.max_azs` |
//! | `CIM_STACKS_NAMESPACE` | `discovery.namespace` |
//! | `CIM_STACKS_IMAGE` | `workloads.image` |
//! | `CIM_STACKS_REMOVAL_POLICY` | `database.removal_policy`, `cache.removal_policy` |
//! | `CIM_STACKS_GATE_ON_INIT` | `workloads.gate_on_initialization` |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;

use crate::domain::{DnsName, Ipv4Cidr};
use crate::errors::{StackError, StackResult};
use crate::secrets::SecretNames;
use crate::stack::{RemovalPolicy, StackEnv};

/// Complete configuration of one deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub env: StackEnv,
    pub tags: BTreeMap<String, String>,
    pub network: NetworkConfig,
    pub discovery: DiscoveryConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub workloads: WorkloadsConfig,
    pub access: AccessConfig,
    pub secrets: SecretNames,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            env: StackEnv::new("000000000000", "ap-northeast-1"),
            tags: BTreeMap::from([("ServiceName".to_string(), "morningcode".to_string())]),
            network: NetworkConfig::default(),
            discovery: DiscoveryConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            workloads: WorkloadsConfig::default(),
            access: AccessConfig::default(),
            secrets: SecretNames::default(),
        }
    }
}

impl DeploymentConfig {
    /// Defaults overridden by `CIM_STACKS_*` environment variables
    pub fn from_env() -> StackResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Load a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> StackResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            StackError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Apply `CIM_STACKS_*` environment variables on top of this configuration
    pub fn with_env_overrides(mut self) -> StackResult<Self> {
        if let Some(account) = env_var("CIM_STACKS_ACCOUNT") {
            self.env.account = account;
        }
        if let Some(region) = env_var("CIM_STACKS_REGION") {
            self.env.region = region;
        }
        if let Some(cidr) = parsed_env_var::<Ipv4Cidr>("CIM_STACKS_VPC_CIDR")? {
            self.network.cidr = cidr;
        }
        if let Some(max_azs) = parsed_env_var::<u8>("CIM_STACKS_MAX_AZS")? {
            self.network.max_azs = max_azs;
        }
        if let Some(namespace) = parsed_env_var::<DnsName>("CIM_STACKS_NAMESPACE")? {
            self.discovery.namespace = namespace;
        }
        if let Some(image) = env_var("CIM_STACKS_IMAGE") {
            self.workloads.image = image;
        }
        if let Some(policy) = parsed_env_var::<RemovalPolicy>("CIM_STACKS_REMOVAL_POLICY")? {
            self.database.removal_policy = policy;
            self.cache.removal_policy = policy;
        }
        if let Some(gate) = parsed_env_var::<bool>("CIM_STACKS_GATE_ON_INIT")? {
            self.workloads.gate_on_initialization = gate;
        }
        Ok(self)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed_env_var<T>(name: &str) -> StackResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| StackError::Configuration(format!("{}={}: {}", name, value, e)))
        })
        .transpose()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub cidr: Ipv4Cidr,
    pub max_azs: u8,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cidr: Ipv4Cidr::aligned(Ipv4Addr::new(10, 0, 0, 0), 16),
            max_azs: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Private namespace; a stable deployment identifier, kept as deployed
    pub namespace: DnsName,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            namespace: DnsName::from_static("internal.mornigcode.io"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub security_group_name: String,
    pub instance_identifier: String,
    pub engine_version: String,
    pub instance_class: String,
    pub database_name: String,
    pub master_username: String,
    pub port: u16,
    pub backup_retention_days: u16,
    pub storage_type: String,
    pub allocated_storage_gib: u32,
    pub removal_policy: RemovalPolicy,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            security_group_name: "DBSecurityGroup".to_string(),
            instance_identifier: "redash-db".to_string(),
            engine_version: "12".to_string(),
            instance_class: "db.t3.micro".to_string(),
            database_name: "redash".to_string(),
            master_username: "root".to_string(),
            port: 5432,
            backup_retention_days: 7,
            storage_type: "gp2".to_string(),
            allocated_storage_gib: 100,
            removal_policy: RemovalPolicy::Destroy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub security_group_name: String,
    pub subnet_group_name: String,
    pub replication_group_id: String,
    pub node_type: String,
    pub num_cache_clusters: u8,
    pub port: u16,
    pub snapshot_window: String,
    pub snapshot_retention_limit: u8,
    pub removal_policy: RemovalPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            security_group_name: "RedisSecurityGroup".to_string(),
            subnet_group_name: "redash-redis-subnet-group".to_string(),
            replication_group_id: "redash-redis-cluster".to_string(),
            node_type: "cache.t2.micro".to_string(),
            num_cache_clusters: 1,
            port: 6379,
            snapshot_window: "02:00-04:00".to_string(),
            snapshot_retention_limit: 7,
            removal_policy: RemovalPolicy::Destroy,
        }
    }
}

/// Cluster, logging and sizing of one containerized workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub cluster_name: String,
    pub log_group_name: String,
    pub container_name: String,
    pub cpu: u32,
    pub memory_mib: u32,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub task: TaskConfig,
    pub service_name: String,
    pub security_group_name: String,
    pub load_balancer_security_group_name: String,
    pub container_port: u16,
    pub listener_port: u16,
    pub desired_count: u32,
    pub discovery_name: String,
    pub dns_ttl_seconds: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            task: TaskConfig {
                cluster_name: "redash-server-cluster".to_string(),
                log_group_name: "redash-server".to_string(),
                container_name: "RedashServerContainer".to_string(),
                cpu: 256,
                memory_mib: 2048,
                log_level: "DEBUG".to_string(),
            },
            service_name: "redash-server".to_string(),
            security_group_name: "EcsSecurityGroup".to_string(),
            load_balancer_security_group_name: "ALBSecurityGroup".to_string(),
            container_port: 5000,
            listener_port: 80,
            desired_count: 1,
            discovery_name: "redash".to_string(),
            dns_ttl_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub task: TaskConfig,
    pub service_name: String,
    pub security_group_name: String,
    pub desired_count: u32,
    pub queues: Vec<String>,
    pub worker_count: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            task: TaskConfig {
                cluster_name: "redash-worker-cluster".to_string(),
                log_group_name: "redash-worker".to_string(),
                container_name: "RedashWorkerContainer".to_string(),
                cpu: 256,
                memory_mib: 2048,
                log_level: "DEBUG".to_string(),
            },
            service_name: "redash-worker".to_string(),
            security_group_name: "RedashWorkerSecurityGroup".to_string(),
            desired_count: 1,
            queues: ["queries", "scheduled_queries", "celery"]
                .into_iter()
                .map(String::from)
                .collect(),
            worker_count: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitializeConfig {
    pub task: TaskConfig,
    pub security_group_name: String,
}

impl Default for InitializeConfig {
    fn default() -> Self {
        Self {
            task: TaskConfig {
                cluster_name: "redash-initialize-cluster".to_string(),
                log_group_name: "redash-initialize".to_string(),
                container_name: "RedashInitializeContainer".to_string(),
                cpu: 256,
                memory_mib: 512,
                log_level: "INFO".to_string(),
            },
            security_group_name: "RedashInitializeSecurityGroup".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadsConfig {
    pub image: String,
    /// Order server and worker after the initialization run
    pub gate_on_initialization: bool,
    pub server: ServerConfig,
    pub worker: WorkerConfig,
    pub initialize: InitializeConfig,
}

impl Default for WorkloadsConfig {
    fn default() -> Self {
        Self {
            image: "redash/redash:latest".to_string(),
            gate_on_initialization: true,
            server: ServerConfig::default(),
            worker: WorkerConfig::default(),
            initialize: InitializeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub enabled: bool,
    pub security_group_name: String,
    pub instance_name: String,
    pub instance_type: String,
    pub machine_image: String,
    pub key_name: String,
    pub ssh_cidr: Ipv4Cidr,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            security_group_name: "Ec2StepServerSecurityGroup".to_string(),
            instance_name: "step-server".to_string(),
            instance_type: "t3.micro".to_string(),
            machine_image: "amazon-linux".to_string(),
            key_name: "ec2-step-server".to_string(),
            ssh_cidr: Ipv4Cidr::any(),
        }
    }
}
