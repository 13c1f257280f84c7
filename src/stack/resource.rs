// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declared Resource Specifications
//!
//! Every resource a stack can declare, with the attributes it exports once
//! realized. Resources render as `{"type": .., "properties": {..}}` in stack
//! templates.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Attribute, AvailabilityZone, ContainerTaskSpec, DnsName, Ipv4Cidr, ResourceName,
    SecurityGroupSpec, SubnetTier, Value,
};

/// What happens to a stateful resource when its stack is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    #[default]
    Destroy,
    Retain,
}

impl std::str::FromStr for RemovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "destroy" => Ok(RemovalPolicy::Destroy),
            "retain" => Ok(RemovalPolicy::Retain),
            other => Err(format!("unknown removal policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcSpec {
    pub cidr: Ipv4Cidr,
    pub max_azs: u8,
    pub enable_dns_support: bool,
    pub enable_dns_hostnames: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub vpc: Value,
    pub tier: SubnetTier,
    pub cidr: Ipv4Cidr,
    pub availability_zone: AvailabilityZone,
    pub map_public_ip_on_launch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateDnsNamespaceSpec {
    pub name: DnsName,
    pub vpc: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInstanceSpec {
    pub identifier: ResourceName,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub database_name: String,
    pub master_username: String,
    pub master_password: String,
    pub port: u16,
    pub subnets: Vec<Value>,
    pub security_groups: Vec<Value>,
    pub iam_authentication: bool,
    pub performance_insights: bool,
    pub auto_minor_version_upgrade: bool,
    pub multi_az: bool,
    pub backup_retention_days: u16,
    pub deletion_protection: bool,
    pub storage_type: String,
    pub allocated_storage_gib: u32,
    pub removal_policy: RemovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSubnetGroupSpec {
    pub name: ResourceName,
    pub description: String,
    pub subnets: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationGroupSpec {
    pub id: ResourceName,
    pub description: String,
    pub engine: String,
    pub node_type: String,
    pub num_cache_clusters: u8,
    pub automatic_failover: bool,
    pub auto_minor_version_upgrade: bool,
    pub port: u16,
    pub subnet_group: Value,
    pub security_groups: Vec<Value>,
    pub snapshot_window: String,
    pub snapshot_retention_limit: u8,
    pub removal_policy: RemovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub name: ResourceName,
    pub vpc: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroupSpec {
    pub name: ResourceName,
    pub removal_policy: RemovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinitionSpec {
    pub cpu: u32,
    pub memory_mib: u32,
    pub containers: Vec<ContainerTaskSpec>,
}

/// Placement of tasks inside the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNetworking {
    pub subnets: Vec<Value>,
    pub security_groups: Vec<Value>,
    pub assign_public_ip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FargateServiceSpec {
    pub name: ResourceName,
    pub cluster: Value,
    pub task_definition: Value,
    pub desired_count: u32,
    pub networking: TaskNetworking,
}

/// One-shot run of a task definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunSpec {
    pub cluster: Value,
    pub task_definition: Value,
    pub count: u32,
    pub networking: TaskNetworking,
}

/// Load balancer target: a container port of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerTarget {
    pub service: Value,
    pub container_name: ResourceName,
    pub container_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerSpec {
    pub internet_facing: bool,
    pub subnets: Vec<Value>,
    pub security_groups: Vec<Value>,
    pub listener_port: u16,
    pub target: LoadBalancerTarget,
}

/// DNS record kinds of a discovery service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DnsRecordType {
    A,
    #[serde(rename = "A_AAAA")]
    AAndAaaa,
    Srv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryServiceSpec {
    pub name: ResourceName,
    pub namespace: Value,
    pub record_type: DnsRecordType,
    pub ttl_seconds: u32,
    /// Load balancer the registration aliases, if any
    pub alias_target: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub name: ResourceName,
    pub instance_type: String,
    pub machine_image: String,
    pub key_name: String,
    pub subnet: Value,
    pub security_groups: Vec<Value>,
}

/// A declared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "snake_case")]
pub enum ResourceSpec {
    Vpc(VpcSpec),
    Subnet(SubnetSpec),
    SecurityGroup(SecurityGroupSpec),
    PrivateDnsNamespace(PrivateDnsNamespaceSpec),
    DatabaseInstance(DatabaseInstanceSpec),
    CacheSubnetGroup(CacheSubnetGroupSpec),
    ReplicationGroup(ReplicationGroupSpec),
    Cluster(ClusterSpec),
    LogGroup(LogGroupSpec),
    TaskDefinition(TaskDefinitionSpec),
    FargateService(FargateServiceSpec),
    TaskRun(TaskRunSpec),
    LoadBalancer(LoadBalancerSpec),
    DiscoveryService(DiscoveryServiceSpec),
    Instance(InstanceSpec),
}

impl ResourceSpec {
    /// Resource kind as rendered in templates
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceSpec::Vpc(_) => "vpc",
            ResourceSpec::Subnet(_) => "subnet",
            ResourceSpec::SecurityGroup(_) => "security_group",
            ResourceSpec::PrivateDnsNamespace(_) => "private_dns_namespace",
            ResourceSpec::DatabaseInstance(_) => "database_instance",
            ResourceSpec::CacheSubnetGroup(_) => "cache_subnet_group",
            ResourceSpec::ReplicationGroup(_) => "replication_group",
            ResourceSpec::Cluster(_) => "cluster",
            ResourceSpec::LogGroup(_) => "log_group",
            ResourceSpec::TaskDefinition(_) => "task_definition",
            ResourceSpec::FargateService(_) => "fargate_service",
            ResourceSpec::TaskRun(_) => "task_run",
            ResourceSpec::LoadBalancer(_) => "load_balancer",
            ResourceSpec::DiscoveryService(_) => "discovery_service",
            ResourceSpec::Instance(_) => "instance",
        }
    }

    /// Attributes available once the resource is realized
    pub fn exports(&self) -> &'static [Attribute] {
        use Attribute as A;

        match self {
            ResourceSpec::Vpc(_) => &[A::Id, A::VpcId, A::CidrBlock],
            ResourceSpec::Subnet(_) => &[A::Id, A::SubnetId, A::CidrBlock, A::AvailabilityZone],
            ResourceSpec::SecurityGroup(_) => &[A::Id, A::GroupId],
            ResourceSpec::PrivateDnsNamespace(_) => &[A::Id, A::NamespaceId, A::Arn],
            ResourceSpec::DatabaseInstance(_) => {
                &[A::Id, A::Arn, A::EndpointAddress, A::EndpointPort]
            }
            ResourceSpec::CacheSubnetGroup(_) => &[A::Id, A::Name],
            ResourceSpec::ReplicationGroup(_) => {
                &[A::Id, A::PrimaryEndpointAddress, A::PrimaryEndpointPort]
            }
            ResourceSpec::Cluster(_) => &[A::Arn, A::Name],
            ResourceSpec::LogGroup(_) => &[A::Arn, A::Name],
            ResourceSpec::TaskDefinition(_) => &[A::Arn],
            ResourceSpec::FargateService(_) => &[A::ServiceArn, A::Name],
            ResourceSpec::TaskRun(_) => &[A::TaskArn],
            ResourceSpec::LoadBalancer(_) => &[A::Arn, A::DnsName],
            ResourceSpec::DiscoveryService(_) => &[A::Id, A::Arn, A::Name],
            ResourceSpec::Instance(_) => &[A::Id, A::PublicIp, A::PublicDnsName],
        }
    }

    /// Whether the realized resource exposes `attribute`
    pub fn exports_attribute(&self, attribute: Attribute) -> bool {
        self.exports().contains(&attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_group() -> ResourceSpec {
        ResourceSpec::LogGroup(LogGroupSpec {
            name: ResourceName::new("redash-server").unwrap(),
            removal_policy: RemovalPolicy::Destroy,
        })
    }

    #[test]
    fn test_template_rendering() {
        let json = serde_json::to_value(log_group()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "log_group",
                "properties": {"name": "redash-server", "removal_policy": "destroy"}
            })
        );
        assert_eq!(log_group().kind(), "log_group");
    }

    #[test]
    fn test_exports() {
        let spec = log_group();
        assert!(spec.exports_attribute(Attribute::Arn));
        assert!(!spec.exports_attribute(Attribute::EndpointAddress));
    }

    #[test]
    fn test_removal_policy_parse() {
        assert_eq!("RETAIN".parse::<RemovalPolicy>(), Ok(RemovalPolicy::Retain));
        assert_eq!("destroy".parse::<RemovalPolicy>(), Ok(RemovalPolicy::Destroy));
        assert!("snapshot".parse::<RemovalPolicy>().is_err());
    }
}
