// Copyright (c) 2025 - Cowboy AI, Inc.
//! Auxiliary Access Unit
//!
//! A step server in the first public subnet for operator SSH access.

use tracing::{info, warn};

use crate::composition::Unit;
use crate::config::AccessConfig;
use crate::domain::{
    Attribute, EgressPolicy, IngressRule, Peer, ResourceName, SecurityGroupSpec, Value,
};
use crate::errors::{StackError, StackResult};
use crate::stack::resource::InstanceSpec;
use crate::stack::{InstanceHandle, NetworkHandle, ResourceSpec, StackBuilder};

pub const STACK_NAME: &str = "Ec2StepServerStack";

const SSH_PORT: u16 = 22;

#[derive(Debug, Clone)]
pub struct AuxiliaryAccess {
    network: NetworkHandle,
    config: AccessConfig,
}

impl AuxiliaryAccess {
    pub fn new(network: &NetworkHandle, config: &AccessConfig) -> Self {
        Self {
            network: network.clone(),
            config: config.clone(),
        }
    }
}

impl Unit for AuxiliaryAccess {
    type Output = InstanceHandle;

    fn stack_name(&self) -> &str {
        STACK_NAME
    }

    fn declare(self, stack: &mut StackBuilder) -> StackResult<InstanceHandle> {
        let config = &self.config;
        stack.consume(&self.network);

        let subnet = self.network.public_subnets().first().ok_or_else(|| {
            StackError::Configuration("step server needs a public subnet".to_string())
        })?;

        let ssh = if config.ssh_cidr.is_any() {
            warn!("SSH on the step server is open to any IPv4 address");
            IngressRule::public(SSH_PORT, "SSH")
        } else {
            IngressRule::tcp(Peer::Cidr(config.ssh_cidr), SSH_PORT, "SSH")
        };

        let group = stack.add_resource(
            "Ec2StepServerSg",
            ResourceSpec::SecurityGroup(SecurityGroupSpec {
                name: ResourceName::new(config.security_group_name.as_str())?,
                description: "security group for EC2 Step Server".to_string(),
                vpc: Value::from(self.network.vpc_id()),
                ingress: vec![ssh],
                egress: EgressPolicy::AllowAll,
            }),
        )?;
        let group_id = stack.reference(&group, Attribute::GroupId);

        let instance = stack.add_resource(
            "Ec2StepServer",
            ResourceSpec::Instance(InstanceSpec {
                name: ResourceName::new(config.instance_name.as_str())?,
                instance_type: config.instance_type.clone(),
                machine_image: config.machine_image.clone(),
                key_name: config.key_name.clone(),
                subnet: Value::from(subnet.subnet_id()),
                security_groups: vec![Value::from(group_id)],
            }),
        )?;

        let handle = InstanceHandle::new(
            stack.reference(&instance, Attribute::Id),
            stack.reference(&instance, Attribute::PublicIp),
            stack.reference(&instance, Attribute::PublicDnsName),
        );
        stack.add_output("PublicIp", handle.public_ip())?;
        stack.add_output("PublicDnsName", handle.public_dns_name())?;

        info!(
            "Step server {} in {}",
            config.instance_name,
            subnet.availability_zone()
        );

        Ok(handle)
    }
}
