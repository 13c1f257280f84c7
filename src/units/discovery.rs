// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Discovery Unit
//!
//! A private DNS namespace bound to the VPC. Registrations belong to the
//! services that make them, not to this stack.

use crate::composition::Unit;
use crate::domain::{Attribute, DnsName, Value};
use crate::errors::StackResult;
use crate::stack::resource::PrivateDnsNamespaceSpec;
use crate::stack::{NamespaceHandle, NetworkHandle, ResourceSpec, StackBuilder};

pub const STACK_NAME: &str = "ServiceDiscoveryStack";

#[derive(Debug, Clone)]
pub struct ServiceDiscovery {
    network: NetworkHandle,
    namespace: DnsName,
}

impl ServiceDiscovery {
    pub fn new(network: &NetworkHandle, namespace: DnsName) -> Self {
        Self {
            network: network.clone(),
            namespace,
        }
    }
}

impl Unit for ServiceDiscovery {
    type Output = NamespaceHandle;

    fn stack_name(&self) -> &str {
        STACK_NAME
    }

    fn declare(self, stack: &mut StackBuilder) -> StackResult<NamespaceHandle> {
        stack.consume(&self.network);

        let namespace = stack.add_resource(
            "NameSpace",
            ResourceSpec::PrivateDnsNamespace(PrivateDnsNamespaceSpec {
                name: self.namespace.clone(),
                vpc: Value::from(self.network.vpc_id()),
            }),
        )?;

        Ok(NamespaceHandle::new(
            stack.reference(&namespace, Attribute::NamespaceId),
            self.namespace,
        ))
    }
}
