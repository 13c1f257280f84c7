// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Topology Unit
//!
//! One address space split into `2 * azs` equal blocks: all public subnets
//! first, then all private subnets, one of each per availability zone.

use tracing::info;

use crate::composition::Unit;
use crate::domain::{Attribute, AvailabilityZone, Ipv4Cidr, SubnetTier, Value};
use crate::errors::StackResult;
use crate::stack::resource::{SubnetSpec, VpcSpec};
use crate::stack::{NetworkHandle, ResourceSpec, StackBuilder, SubnetHandle};

pub const STACK_NAME: &str = "VpcStack";

#[derive(Debug, Clone)]
pub struct NetworkTopology {
    cidr: Ipv4Cidr,
    max_azs: u8,
}

impl NetworkTopology {
    pub fn new(cidr: Ipv4Cidr, max_azs: u8) -> Self {
        Self { cidr, max_azs }
    }
}

impl Unit for NetworkTopology {
    type Output = NetworkHandle;

    fn stack_name(&self) -> &str {
        STACK_NAME
    }

    fn declare(self, stack: &mut StackBuilder) -> StackResult<NetworkHandle> {
        let zones = AvailabilityZone::for_region(&stack.env().region, self.max_azs)?;
        let blocks = self.cidr.split(zones.len() * 2)?;
        let (public_blocks, private_blocks) = blocks.split_at(zones.len());

        let vpc = stack.add_resource(
            "Vpc",
            ResourceSpec::Vpc(VpcSpec {
                cidr: self.cidr,
                max_azs: self.max_azs,
                enable_dns_support: true,
                enable_dns_hostnames: true,
            }),
        )?;
        let vpc_id = stack.reference(&vpc, Attribute::VpcId);

        let mut declare_tier = |tier: SubnetTier, blocks: &[Ipv4Cidr]| -> StackResult<Vec<SubnetHandle>> {
            zones
                .iter()
                .zip(blocks)
                .enumerate()
                .map(|(index, (zone, block))| {
                    let id = stack.add_resource(
                        &format!("{}Subnet{}", tier.label(), index + 1),
                        ResourceSpec::Subnet(SubnetSpec {
                            vpc: Value::from(&vpc_id),
                            tier,
                            cidr: *block,
                            availability_zone: zone.clone(),
                            map_public_ip_on_launch: tier == SubnetTier::Public,
                        }),
                    )?;
                    Ok(SubnetHandle::new(
                        stack.reference(&id, Attribute::SubnetId),
                        tier,
                        zone.clone(),
                        *block,
                    ))
                })
                .collect()
        };

        let public = declare_tier(SubnetTier::Public, public_blocks)?;
        let private = declare_tier(SubnetTier::Private, private_blocks)?;

        info!(
            "Network {} spans {} zones: public {:?}, private {:?}",
            self.cidr,
            zones.len(),
            public.iter().map(|s| s.cidr().to_string()).collect::<Vec<_>>(),
            private.iter().map(|s| s.cidr().to_string()).collect::<Vec<_>>()
        );

        Ok(NetworkHandle::new(vpc_id, self.cidr, public, private))
    }
}
