// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security Boundary Value Objects
//!
//! Security groups, ingress rules and the data-store ingress policy.
//!
//! # Data-Store Ingress Policy
//!
//! A managed store is default-deny on ingress. Every declared rule must:
//! 1. Use TCP and target exactly the store's own port
//! 2. Name a concrete peer (CIDR block or security group)
//!
//! A rule open to any IPv4 address on the store port is rejected unless it
//! was built with [`IngressRule::public`], the explicit opt-in.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::names::ResourceName;
use super::network::Ipv4Cidr;
use super::value::Value;

/// Security policy violation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Ingress rule '{description}' is open to any address on data-store port {port} without an explicit public opt-in")]
    WildcardIngress { port: u16, description: String },

    #[error("Ingress rule '{description}' targets {rule_ports}, but the data store only listens on {port}")]
    PortMismatch {
        port: u16,
        rule_ports: String,
        description: String,
    },

    #[error("Invalid port range: {from}-{to}")]
    InvalidPortRange { from: u16, to: u16 },
}

/// Transport protocol of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
    All,
}

/// Inclusive port range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    from: u16,
    to: u16,
}

impl PortRange {
    /// A range of ports, `from <= to`
    pub fn new(from: u16, to: u16) -> Result<Self, SecurityError> {
        if from > to {
            return Err(SecurityError::InvalidPortRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// A single port
    pub fn single(port: u16) -> Self {
        Self { from: port, to: port }
    }

    /// Every port
    pub fn all() -> Self {
        Self {
            from: 0,
            to: u16::MAX,
        }
    }

    pub fn start(&self) -> u16 {
        self.from
    }

    pub fn end(&self) -> u16 {
        self.to
    }

    /// Whether `port` falls inside the range
    pub fn contains(&self, port: u16) -> bool {
        (self.from..=self.to).contains(&port)
    }

    /// Whether the range is exactly one port
    pub fn is_single(&self, port: u16) -> bool {
        self.from == port && self.to == port
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "port {}", self.from)
        } else {
            write!(f, "ports {}-{}", self.from, self.to)
        }
    }
}

/// Source of inbound traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Peer {
    /// Any IPv4 address
    AnyIpv4,
    /// An address block
    Cidr(Ipv4Cidr),
    /// Members of another security group
    SecurityGroup(Value),
}

impl Peer {
    /// Whether the peer admits every IPv4 address
    pub fn is_wildcard(&self) -> bool {
        match self {
            Peer::AnyIpv4 => true,
            Peer::Cidr(cidr) => cidr.is_any(),
            Peer::SecurityGroup(_) => false,
        }
    }
}

/// Inbound permission on a security boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub peer: Peer,
    pub protocol: Protocol,
    pub ports: PortRange,
    pub description: String,
    /// Set only by [`IngressRule::public`]
    pub public: bool,
}

impl IngressRule {
    /// TCP access to one port from a concrete peer
    pub fn tcp(peer: Peer, port: u16, description: impl Into<String>) -> Self {
        Self {
            peer,
            protocol: Protocol::Tcp,
            ports: PortRange::single(port),
            description: description.into(),
            public: false,
        }
    }

    /// TCP access to one port from any IPv4 address, explicitly opted in
    pub fn public(port: u16, description: impl Into<String>) -> Self {
        Self {
            peer: Peer::AnyIpv4,
            protocol: Protocol::Tcp,
            ports: PortRange::single(port),
            description: description.into(),
            public: true,
        }
    }

    /// Whether the rule admits every IPv4 address
    pub fn is_wildcard(&self) -> bool {
        self.peer.is_wildcard()
    }

    /// Whether the rule lets traffic reach `port`
    pub fn admits_port(&self, port: u16) -> bool {
        self.protocol != Protocol::Udp && self.ports.contains(port)
    }
}

/// Outbound policy of a security boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EgressPolicy {
    AllowAll,
    DenyAll,
}

/// Declared security group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    pub name: ResourceName,
    pub description: String,
    pub vpc: Value,
    pub ingress: Vec<IngressRule>,
    pub egress: EgressPolicy,
}

/// Check a data store's declared ingress rules against the store policy
pub fn validate_store_ingress(port: u16, rules: &[IngressRule]) -> Result<(), SecurityError> {
    for rule in rules {
        if rule.protocol != Protocol::Tcp || !rule.ports.is_single(port) {
            return Err(SecurityError::PortMismatch {
                port,
                rule_ports: rule.ports.to_string(),
                description: rule.description.clone(),
            });
        }

        if rule.is_wildcard() && !rule.public {
            return Err(SecurityError::WildcardIngress {
                port,
                description: rule.description.clone(),
            });
        }
    }
    Ok(())
}
