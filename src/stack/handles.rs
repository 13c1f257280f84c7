// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed Output Handles
//!
//! Handles are what a unit hands to its consumers. They are read-only
//! references into the producing stack; their concrete values only exist once
//! the producer has been realized. Only the declaring unit can construct them.

use crate::domain::{
    AttrRef, AvailabilityZone, DnsName, Endpoint, Ipv4Cidr, Peer, ResourceName, StackName,
    SubnetTier, Value,
};

/// Anything that refers back to the stack that produced it
pub trait OutputHandle {
    /// Stack owning the referenced resources
    fn producer(&self) -> &StackName;
}

/// One subnet of the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetHandle {
    subnet_id: AttrRef,
    tier: SubnetTier,
    availability_zone: AvailabilityZone,
    cidr: Ipv4Cidr,
}

impl SubnetHandle {
    pub(crate) fn new(
        subnet_id: AttrRef,
        tier: SubnetTier,
        availability_zone: AvailabilityZone,
        cidr: Ipv4Cidr,
    ) -> Self {
        Self {
            subnet_id,
            tier,
            availability_zone,
            cidr,
        }
    }

    pub fn subnet_id(&self) -> &AttrRef {
        &self.subnet_id
    }

    pub fn tier(&self) -> SubnetTier {
        self.tier
    }

    pub fn availability_zone(&self) -> &AvailabilityZone {
        &self.availability_zone
    }

    pub fn cidr(&self) -> Ipv4Cidr {
        self.cidr
    }
}

impl OutputHandle for SubnetHandle {
    fn producer(&self) -> &StackName {
        &self.subnet_id.stack
    }
}

/// VPC with its public and private subnets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkHandle {
    vpc_id: AttrRef,
    cidr: Ipv4Cidr,
    public_subnets: Vec<SubnetHandle>,
    private_subnets: Vec<SubnetHandle>,
    dns_support: bool,
    dns_hostnames: bool,
}

impl NetworkHandle {
    pub(crate) fn new(
        vpc_id: AttrRef,
        cidr: Ipv4Cidr,
        public_subnets: Vec<SubnetHandle>,
        private_subnets: Vec<SubnetHandle>,
    ) -> Self {
        Self {
            vpc_id,
            cidr,
            public_subnets,
            private_subnets,
            dns_support: true,
            dns_hostnames: true,
        }
    }

    pub fn vpc_id(&self) -> &AttrRef {
        &self.vpc_id
    }

    /// Address space of the whole network
    pub fn cidr(&self) -> Ipv4Cidr {
        self.cidr
    }

    pub fn public_subnets(&self) -> &[SubnetHandle] {
        &self.public_subnets
    }

    pub fn private_subnets(&self) -> &[SubnetHandle] {
        &self.private_subnets
    }

    pub fn dns_support(&self) -> bool {
        self.dns_support
    }

    pub fn dns_hostnames(&self) -> bool {
        self.dns_hostnames
    }

    /// Zones the network spans, in allocation order
    pub fn availability_zones(&self) -> Vec<&AvailabilityZone> {
        self.private_subnets
            .iter()
            .map(SubnetHandle::availability_zone)
            .collect()
    }

    pub fn public_subnet_ids(&self) -> Vec<Value> {
        self.public_subnets
            .iter()
            .map(|subnet| Value::from(subnet.subnet_id()))
            .collect()
    }

    pub fn private_subnet_ids(&self) -> Vec<Value> {
        self.private_subnets
            .iter()
            .map(|subnet| Value::from(subnet.subnet_id()))
            .collect()
    }

    /// Peers covering every private subnet, used for data-store ingress
    pub fn private_peers(&self) -> Vec<Peer> {
        self.private_subnets
            .iter()
            .map(|subnet| Peer::Cidr(subnet.cidr()))
            .collect()
    }
}

impl OutputHandle for NetworkHandle {
    fn producer(&self) -> &StackName {
        &self.vpc_id.stack
    }
}

/// Private DNS namespace bound to a VPC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceHandle {
    namespace_id: AttrRef,
    name: DnsName,
}

impl NamespaceHandle {
    pub(crate) fn new(namespace_id: AttrRef, name: DnsName) -> Self {
        Self { namespace_id, name }
    }

    pub fn namespace_id(&self) -> &AttrRef {
        &self.namespace_id
    }

    pub fn name(&self) -> &DnsName {
        &self.name
    }
}

impl OutputHandle for NamespaceHandle {
    fn producer(&self) -> &StackName {
        &self.namespace_id.stack
    }
}

/// Address and port of a managed store
///
/// `declared_port` is the port the store was declared with; the realized
/// port attribute is what connection strings use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReference {
    address: AttrRef,
    port: AttrRef,
    declared_port: u16,
}

impl EndpointReference {
    pub(crate) fn new(address: AttrRef, port: AttrRef, declared_port: u16) -> Self {
        Self {
            address,
            port,
            declared_port,
        }
    }

    pub fn declared_port(&self) -> u16 {
        self.declared_port
    }
}

impl Endpoint for EndpointReference {
    fn address(&self) -> &AttrRef {
        &self.address
    }

    fn port(&self) -> &AttrRef {
        &self.port
    }
}

impl OutputHandle for EndpointReference {
    fn producer(&self) -> &StackName {
        &self.address.stack
    }
}

/// A security boundary other stacks may name as an ingress peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupHandle {
    group_id: AttrRef,
    name: ResourceName,
}

impl SecurityGroupHandle {
    pub(crate) fn new(group_id: AttrRef, name: ResourceName) -> Self {
        Self { group_id, name }
    }

    pub fn group_id(&self) -> &AttrRef {
        &self.group_id
    }

    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    /// This group as an ingress peer
    pub fn as_peer(&self) -> Peer {
        Peer::SecurityGroup(Value::from(&self.group_id))
    }
}

impl OutputHandle for SecurityGroupHandle {
    fn producer(&self) -> &StackName {
        &self.group_id.stack
    }
}

/// Outputs of a data-store unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOutputs {
    pub endpoint: EndpointReference,
    pub security_group: SecurityGroupHandle,
}

/// Ready signal of the one-shot initialization run
///
/// Carries no attribute a consumer could use; consuming it only orders the
/// consumer after the initialization stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRunHandle {
    task_arn: AttrRef,
}

impl TaskRunHandle {
    pub(crate) fn new(task_arn: AttrRef) -> Self {
        Self { task_arn }
    }

    pub fn task_arn(&self) -> &AttrRef {
        &self.task_arn
    }
}

impl OutputHandle for TaskRunHandle {
    fn producer(&self) -> &StackName {
        &self.task_arn.stack
    }
}

/// Service-discovery registration of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistration {
    namespace: DnsName,
    fqdn: DnsName,
    ttl_seconds: u32,
}

impl ServiceRegistration {
    pub(crate) fn new(namespace: DnsName, fqdn: DnsName, ttl_seconds: u32) -> Self {
        Self {
            namespace,
            fqdn,
            ttl_seconds,
        }
    }

    pub fn namespace(&self) -> &DnsName {
        &self.namespace
    }

    /// `{service}.{namespace}`
    pub fn fqdn(&self) -> &DnsName {
        &self.fqdn
    }

    pub fn ttl_seconds(&self) -> u32 {
        self.ttl_seconds
    }
}

/// A long-running container service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    service_name: ResourceName,
    service_arn: AttrRef,
    load_balancer_dns: Option<AttrRef>,
    registration: Option<ServiceRegistration>,
}

impl ServiceHandle {
    pub(crate) fn new(service_name: ResourceName, service_arn: AttrRef) -> Self {
        Self {
            service_name,
            service_arn,
            load_balancer_dns: None,
            registration: None,
        }
    }

    pub(crate) fn with_load_balancer(mut self, dns_name: AttrRef) -> Self {
        self.load_balancer_dns = Some(dns_name);
        self
    }

    pub(crate) fn with_registration(mut self, registration: ServiceRegistration) -> Self {
        self.registration = Some(registration);
        self
    }

    pub fn service_name(&self) -> &ResourceName {
        &self.service_name
    }

    pub fn service_arn(&self) -> &AttrRef {
        &self.service_arn
    }

    pub fn load_balancer_dns(&self) -> Option<&AttrRef> {
        self.load_balancer_dns.as_ref()
    }

    pub fn registration(&self) -> Option<&ServiceRegistration> {
        self.registration.as_ref()
    }
}

impl OutputHandle for ServiceHandle {
    fn producer(&self) -> &StackName {
        &self.service_arn.stack
    }
}

/// Auxiliary access instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceHandle {
    instance_id: AttrRef,
    public_ip: AttrRef,
    public_dns_name: AttrRef,
}

impl InstanceHandle {
    pub(crate) fn new(instance_id: AttrRef, public_ip: AttrRef, public_dns_name: AttrRef) -> Self {
        Self {
            instance_id,
            public_ip,
            public_dns_name,
        }
    }

    pub fn instance_id(&self) -> &AttrRef {
        &self.instance_id
    }

    pub fn public_ip(&self) -> &AttrRef {
        &self.public_ip
    }

    pub fn public_dns_name(&self) -> &AttrRef {
        &self.public_dns_name
    }
}

impl OutputHandle for InstanceHandle {
    fn producer(&self) -> &StackName {
        &self.instance_id.stack
    }
}
