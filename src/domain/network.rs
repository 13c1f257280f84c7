// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants
//!
//! Address spaces, subnet tiers and availability zones used by the network
//! topology unit and by ingress rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Host bits set in network address: {0}")]
    HostBitsSet(String),

    #[error("Address space {cidr} is too small to split into {count} subnets")]
    AddressSpaceTooSmall { cidr: String, count: usize },

    #[error("Invalid availability zone count: {0} (must be {min}-{max})", min = AvailabilityZone::MIN_COUNT, max = AvailabilityZone::MAX_COUNT)]
    InvalidZoneCount(u8),
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - No host bits set (canonical network address)
///
/// # Examples
///
/// ```rust
/// use cim_stacks::domain::Ipv4Cidr;
///
/// let vpc = Ipv4Cidr::new("10.0.0.0/16").unwrap();
/// let subnets = vpc.split(4).unwrap();
/// assert_eq!(subnets[1].to_string(), "10.0.64.0/18");
/// assert!(vpc.contains(&subnets[3]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_length: u8,
}

impl Ipv4Cidr {
    /// Smallest subnet the provisioning capability accepts
    pub const MIN_SUBNET_PREFIX: u8 = 28;

    /// Parse a CIDR block such as `10.0.0.0/16`
    ///
    /// # Invariants
    /// - Prefix is mandatory
    /// - Prefix length 0-32
    /// - Address is the network address of the block
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();
        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;
        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from a network address and prefix length
    pub fn from_parts(network: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        if u32::from(network) & !Self::mask(prefix_length) != 0 {
            return Err(NetworkError::HostBitsSet(format!(
                "{}/{}",
                network, prefix_length
            )));
        }

        Ok(Self {
            network,
            prefix_length,
        })
    }

    /// Caller guarantees `network` is aligned to `prefix_length`
    pub(crate) const fn aligned(network: Ipv4Addr, prefix_length: u8) -> Self {
        Self {
            network,
            prefix_length,
        }
    }

    /// The whole IPv4 space, `0.0.0.0/0`
    pub fn any() -> Self {
        Self {
            network: Ipv4Addr::UNSPECIFIED,
            prefix_length: 0,
        }
    }

    fn mask(prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_length))
        }
    }

    /// Network address
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_length))
    }

    /// Whether this block is `0.0.0.0/0`
    pub fn is_any(&self) -> bool {
        self.prefix_length == 0
    }

    /// Whether `other` lies entirely inside this block
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix_length >= self.prefix_length
            && u32::from(other.network) & Self::mask(self.prefix_length) == u32::from(self.network)
    }

    /// Whether a single address lies inside this block
    pub fn contains_address(&self, address: Ipv4Addr) -> bool {
        u32::from(address) & Self::mask(self.prefix_length) == u32::from(self.network)
    }

    /// Partition the block into `count` equal subnets
    ///
    /// The block is divided into the next power of two of `count` pieces and
    /// the first `count` are returned, in address order.
    pub fn split(&self, count: usize) -> Result<Vec<Ipv4Cidr>, NetworkError> {
        let too_small = || NetworkError::AddressSpaceTooSmall {
            cidr: self.to_string(),
            count,
        };

        if count == 0 {
            return Err(too_small());
        }

        let extra_bits = count.next_power_of_two().trailing_zeros();
        let prefix_length = u32::from(self.prefix_length) + extra_bits;
        if prefix_length > u32::from(Self::MIN_SUBNET_PREFIX) {
            return Err(too_small());
        }
        let prefix_length = prefix_length as u8;

        let block_size = 1u64 << (32 - u32::from(prefix_length));
        let base = u64::from(u32::from(self.network));

        (0..count as u64)
            .map(|index| {
                let network = Ipv4Addr::from((base + index * block_size) as u32);
                Self::from_parts(network, prefix_length)
            })
            .collect()
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_length)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ipv4Cidr> for String {
    fn from(value: Ipv4Cidr) -> Self {
        value.to_string()
    }
}

/// Subnet tier within a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetTier {
    /// Routed to the internet gateway; instances may carry public addresses
    Public,
    /// No inbound route from the internet
    Private,
}

impl SubnetTier {
    /// Label used in logical ids (`PublicSubnet1`, `PrivateSubnet2`)
    pub fn label(&self) -> &'static str {
        match self {
            SubnetTier::Public => "Public",
            SubnetTier::Private => "Private",
        }
    }
}

impl fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetTier::Public => write!(f, "public"),
            SubnetTier::Private => write!(f, "private"),
        }
    }
}

/// Availability zone inside a region (e.g. `ap-northeast-1a`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilityZone(String);

impl AvailabilityZone {
    /// Minimum number of zones a network spans
    pub const MIN_COUNT: u8 = 1;

    /// Maximum number of zones a network spans
    pub const MAX_COUNT: u8 = 6;

    const LETTERS: [char; 6] = ['a', 'b', 'c', 'd', 'e', 'f'];

    /// The first `count` zones of a region, in letter order
    pub fn for_region(region: &str, count: u8) -> Result<Vec<Self>, NetworkError> {
        if !(Self::MIN_COUNT..=Self::MAX_COUNT).contains(&count) {
            return Err(NetworkError::InvalidZoneCount(count));
        }

        Ok(Self::LETTERS[..usize::from(count)]
            .iter()
            .map(|letter| Self(format!("{}{}", region, letter)))
            .collect())
    }

    /// Zone name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AvailabilityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cidr_parsing() {
        let cidr = Ipv4Cidr::new("10.0.0.0/16").unwrap();
        assert_eq!(cidr.network(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(cidr.prefix_length(), 16);
        assert_eq!(cidr.size(), 65536);
        assert_eq!(cidr.to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_invalid_cidr() {
        assert!(Ipv4Cidr::new("10.0.0.0").is_err()); // Missing prefix
        assert!(Ipv4Cidr::new("10.0.0.0/33").is_err());
        assert!(Ipv4Cidr::new("999.0.0.0/8").is_err());
        assert!(Ipv4Cidr::new("10.0.0.1/16").is_err()); // Host bits
        assert!(Ipv4Cidr::new("10.0.0.0/x").is_err());
    }

    #[test]
    fn test_any() {
        let any = Ipv4Cidr::new("0.0.0.0/0").unwrap();
        assert_eq!(any, Ipv4Cidr::any());
        assert!(any.is_any());
        assert!(any.contains(&Ipv4Cidr::new("10.0.0.0/16").unwrap()));
    }

    #[test]
    fn test_split_two_zones() {
        let vpc = Ipv4Cidr::new("10.0.0.0/16").unwrap();
        let blocks: Vec<String> = vpc.split(4).unwrap().iter().map(|b| b.to_string()).collect();
        assert_eq!(
            blocks,
            vec!["10.0.0.0/18", "10.0.64.0/18", "10.0.128.0/18", "10.0.192.0/18"]
        );
    }

    #[test]
    fn test_split_non_power_of_two() {
        let vpc = Ipv4Cidr::new("10.0.0.0/16").unwrap();
        let blocks = vpc.split(6).unwrap();
        assert_eq!(blocks.len(), 6);
        assert!(blocks.iter().all(|b| b.prefix_length() == 19));
        assert!(blocks.iter().all(|b| vpc.contains(b)));
    }

    #[test]
    fn test_split_too_small() {
        let tiny = Ipv4Cidr::new("10.0.0.0/27").unwrap();
        assert!(matches!(
            tiny.split(2),
            Err(NetworkError::AddressSpaceTooSmall { .. })
        ));
        assert!(Ipv4Cidr::new("10.0.0.0/16").unwrap().split(0).is_err());
    }

    #[test]
    fn test_contains_address() {
        let block = Ipv4Cidr::new("10.0.128.0/18").unwrap();
        assert!(block.contains_address(Ipv4Addr::new(10, 0, 130, 7)));
        assert!(!block.contains_address(Ipv4Addr::new(10, 0, 0, 7)));
    }

    #[test]
    fn test_availability_zones() {
        let zones = AvailabilityZone::for_region("ap-northeast-1", 2).unwrap();
        assert_eq!(zones[0].as_str(), "ap-northeast-1a");
        assert_eq!(zones[1].as_str(), "ap-northeast-1b");

        assert!(AvailabilityZone::for_region("ap-northeast-1", 0).is_err());
        assert!(AvailabilityZone::for_region("ap-northeast-1", 7).is_err());
    }

    #[test]
    fn test_cidr_serde() {
        let cidr = Ipv4Cidr::new("10.0.0.0/16").unwrap();
        assert_eq!(serde_json::to_string(&cidr).unwrap(), "\"10.0.0.0/16\"");
        assert!(serde_json::from_str::<Ipv4Cidr>("\"10.0.0.1/16\"").is_err());
    }
}
