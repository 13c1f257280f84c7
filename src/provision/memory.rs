// Copyright (c) 2025 - Cowboy AI, Inc.

//! In-memory provisioner
//!
//! Realizes templates without touching a cloud account. Attribute values
//! have the shape of the real ones (ARNs, endpoint host names, subnet ids)
//! with a fresh physical id per resource and run. Every received template
//! is recorded, and failures can be injected per stack.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{resolve_outputs, Provisioner, ProvisioningError, RealizedStack};
use crate::domain::{Attribute, LogicalId, StackName};
use crate::stack::{ResourceSpec, StackEnv, StackTemplate};

#[derive(Debug, Default)]
struct State {
    received: Vec<StackTemplate>,
    realized: BTreeSet<StackName>,
    physical_names: BTreeSet<(&'static str, String)>,
    failures: BTreeMap<StackName, ProvisioningError>,
}

#[derive(Debug, Default)]
pub struct InMemoryProvisioner {
    state: Mutex<State>,
}

impl InMemoryProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every realization of `stack` fail with `error`
    pub fn fail_on(&self, stack: StackName, error: ProvisioningError) {
        self.state().failures.insert(stack, error);
    }

    /// Stacks in the order realization was requested
    pub fn calls(&self) -> Vec<StackName> {
        self.state()
            .received
            .iter()
            .map(|template| template.stack.clone())
            .collect()
    }

    /// The template received for `stack`, as resolved by the caller
    pub fn received(&self, stack: &StackName) -> Option<StackTemplate> {
        self.state()
            .received
            .iter()
            .find(|template| &template.stack == stack)
            .cloned()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Provisioner for InMemoryProvisioner {
    async fn realize(&self, template: &StackTemplate) -> Result<RealizedStack, ProvisioningError> {
        let mut state = self.state();
        state.received.push(template.clone());

        if let Some(error) = state.failures.get(&template.stack) {
            warn!("Injected failure for {}: {}", template.stack, error);
            return Err(error.clone());
        }
        if state.realized.contains(&template.stack) {
            return Err(ProvisioningError::Rejected {
                message: format!("stack '{}' is already realized", template.stack),
            });
        }
        if let Some(import) = template.imports().into_iter().next() {
            return Err(ProvisioningError::InvalidParameter {
                resource: import.resource.to_string(),
                message: format!("unresolved cross-stack reference {}", import),
            });
        }

        let mut claimed = Vec::new();
        let mut attributes = BTreeMap::new();
        for (key, json) in &template.resources {
            let logical_id =
                LogicalId::new(key.as_str()).map_err(|e| ProvisioningError::InvalidParameter {
                    resource: key.clone(),
                    message: e.to_string(),
                })?;
            let spec: ResourceSpec = serde_json::from_value(json.clone()).map_err(|e| {
                ProvisioningError::InvalidParameter {
                    resource: key.clone(),
                    message: e.to_string(),
                }
            })?;

            if let Some(name) = physical_name(&spec) {
                if state.physical_names.contains(&name) || claimed.contains(&name) {
                    return Err(ProvisioningError::NamingConflict { name: name.1 });
                }
                claimed.push(name);
            }

            let resource = RealizedResource::new(&template.env, &logical_id);
            let values = spec
                .exports()
                .iter()
                .map(|attribute| (*attribute, resource.attribute(&spec, *attribute)))
                .collect::<BTreeMap<_, _>>();
            debug!("{}: realized {} {}", template.stack, spec.kind(), logical_id);
            attributes.insert(logical_id, values);
        }

        let outputs = resolve_outputs(template, &attributes)?;

        state.physical_names.extend(claimed);
        state.realized.insert(template.stack.clone());
        info!(
            "Realized {} with {} resources",
            template.stack,
            attributes.len()
        );

        Ok(RealizedStack {
            stack: template.stack.clone(),
            attributes,
            outputs,
            realized_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Names that must be unique per account and region
fn physical_name(spec: &ResourceSpec) -> Option<(&'static str, String)> {
    let name = match spec {
        ResourceSpec::DatabaseInstance(db) => db.identifier.to_string(),
        ResourceSpec::ReplicationGroup(group) => group.id.to_string(),
        ResourceSpec::CacheSubnetGroup(group) => group.name.to_string(),
        ResourceSpec::Cluster(cluster) => cluster.name.to_string(),
        ResourceSpec::LogGroup(group) => group.name.to_string(),
        _ => return None,
    };
    Some((spec.kind(), name))
}

struct RealizedResource<'a> {
    env: &'a StackEnv,
    logical_id: &'a LogicalId,
    uuid: Uuid,
}

impl<'a> RealizedResource<'a> {
    fn new(env: &'a StackEnv, logical_id: &'a LogicalId) -> Self {
        Self {
            env,
            logical_id,
            uuid: Uuid::now_v7(),
        }
    }

    /// Trailing random part of the id
    fn suffix(&self) -> String {
        let simple = self.uuid.simple().to_string();
        simple[simple.len() - 12..].to_string()
    }

    fn arn(&self, service: &str, resource: &str) -> String {
        format!(
            "arn:aws:{}:{}:{}:{}",
            service, self.env.region, self.env.account, resource
        )
    }

    fn physical_id(&self, spec: &ResourceSpec) -> String {
        let prefix = match spec {
            ResourceSpec::Vpc(_) => "vpc",
            ResourceSpec::Subnet(_) => "subnet",
            ResourceSpec::SecurityGroup(_) => "sg",
            ResourceSpec::PrivateDnsNamespace(_) => "ns",
            ResourceSpec::DatabaseInstance(db) => return db.identifier.to_string(),
            ResourceSpec::CacheSubnetGroup(group) => return group.name.to_string(),
            ResourceSpec::ReplicationGroup(group) => return group.id.to_string(),
            ResourceSpec::DiscoveryService(_) => "srv",
            ResourceSpec::Instance(_) => "i",
            _ => return format!("{}-{}", self.logical_id, self.suffix()),
        };
        format!("{}-{}", prefix, self.suffix())
    }

    fn public_ip(&self) -> String {
        let bytes = self.uuid.as_bytes();
        format!("54.{}.{}.{}", bytes[13], bytes[14], bytes[15].max(1))
    }

    fn attribute(&self, spec: &ResourceSpec, attribute: Attribute) -> String {
        use Attribute as A;

        let region = &self.env.region;
        match (spec, attribute) {
            (ResourceSpec::Vpc(vpc), A::CidrBlock) => vpc.cidr.to_string(),
            (ResourceSpec::Subnet(subnet), A::CidrBlock) => subnet.cidr.to_string(),
            (ResourceSpec::Subnet(subnet), A::AvailabilityZone) => {
                subnet.availability_zone.to_string()
            }

            (ResourceSpec::DatabaseInstance(db), A::Arn) => {
                self.arn("rds", &format!("db:{}", db.identifier))
            }
            (ResourceSpec::DatabaseInstance(db), A::EndpointAddress) => format!(
                "{}.{}.{}.rds.amazonaws.com",
                db.identifier,
                self.suffix(),
                region
            ),
            (ResourceSpec::DatabaseInstance(db), A::EndpointPort) => db.port.to_string(),

            (ResourceSpec::ReplicationGroup(group), A::PrimaryEndpointAddress) => format!(
                "{}.{}.ng.0001.{}.cache.amazonaws.com",
                group.id,
                self.suffix(),
                region
            ),
            (ResourceSpec::ReplicationGroup(group), A::PrimaryEndpointPort) => {
                group.port.to_string()
            }

            (ResourceSpec::CacheSubnetGroup(group), A::Name) => group.name.to_string(),
            (ResourceSpec::Cluster(cluster), A::Name) => cluster.name.to_string(),
            (ResourceSpec::Cluster(cluster), A::Arn) => {
                self.arn("ecs", &format!("cluster/{}", cluster.name))
            }
            (ResourceSpec::LogGroup(group), A::Name) => group.name.to_string(),
            (ResourceSpec::LogGroup(group), A::Arn) => {
                self.arn("logs", &format!("log-group:{}", group.name))
            }
            (ResourceSpec::TaskDefinition(_), A::Arn) => {
                self.arn("ecs", &format!("task-definition/{}:1", self.logical_id))
            }
            (ResourceSpec::FargateService(service), A::Name) => service.name.to_string(),
            (ResourceSpec::FargateService(service), A::ServiceArn) => {
                self.arn("ecs", &format!("service/{}", service.name))
            }
            (ResourceSpec::TaskRun(_), A::TaskArn) => {
                self.arn("ecs", &format!("task/{}", self.uuid.simple()))
            }
            (ResourceSpec::LoadBalancer(_), A::Arn) => self.arn(
                "elasticloadbalancing",
                &format!("loadbalancer/app/{}/{}", self.logical_id, self.suffix()),
            ),
            (ResourceSpec::LoadBalancer(_), A::DnsName) => format!(
                "{}-{}.{}.elb.amazonaws.com",
                self.logical_id.as_str().to_ascii_lowercase(),
                self.suffix(),
                region
            ),
            (ResourceSpec::DiscoveryService(service), A::Name) => service.name.to_string(),
            (ResourceSpec::PrivateDnsNamespace(_), A::Arn) => self.arn(
                "servicediscovery",
                &format!("namespace/{}", self.physical_id(spec)),
            ),
            (ResourceSpec::DiscoveryService(_), A::Arn) => self.arn(
                "servicediscovery",
                &format!("service/{}", self.physical_id(spec)),
            ),
            (ResourceSpec::Instance(_), A::PublicIp) => self.public_ip(),
            (ResourceSpec::Instance(_), A::PublicDnsName) => format!(
                "ec2-{}.{}.compute.amazonaws.com",
                self.public_ip().replace('.', "-"),
                region
            ),

            // Id, VpcId, SubnetId, GroupId, NamespaceId
            _ => self.physical_id(spec),
        }
    }
}
