// Copyright (c) 2025 - Cowboy AI, Inc.

//! Property-Based Tests for Synthesized Store Ingress
//!
//! Whatever address space, zone count and access setting the platform is
//! composed with, the data stores sit in the private subnets and admit only
//! addresses inside the VPC on their own port.

use cim_stacks::domain::{IngressRule, Ipv4Cidr, LogicalId, Peer, Protocol, StackName};
use cim_stacks::stack::{NetworkHandle, ResourceSpec, Stack};
use cim_stacks::{AnalyticsPlatform, DeploymentConfig, StaticSecretStore};
use proptest::prelude::*;
use std::net::Ipv4Addr;

// ============================================================================
// Helpers
// ============================================================================

fn secrets() -> StaticSecretStore {
    StaticSecretStore::new()
        .with("REDASH_DB_PASSWORD", "db-password")
        .with("REDASH_COOKIE_SECRET", "cookie")
}

fn stack<'a>(platform: &'a AnalyticsPlatform, name: &str) -> &'a Stack {
    platform.root.get(&StackName::new(name).unwrap()).unwrap()
}

fn ingress<'a>(stack: &'a Stack, logical_id: &str) -> &'a [IngressRule] {
    match stack.resource(&LogicalId::new(logical_id).unwrap()) {
        Some(ResourceSpec::SecurityGroup(group)) => &group.ingress,
        other => panic!("{} is not a security group: {:?}", logical_id, other),
    }
}

fn assert_store_rules(
    rules: &[IngressRule],
    port: u16,
    network: &NetworkHandle,
    access_enabled: bool,
) -> Result<(), TestCaseError> {
    let mut admitted = Vec::new();
    for rule in rules {
        prop_assert_eq!(rule.protocol, Protocol::Tcp);
        prop_assert!(rule.ports.is_single(port), "{:?} targets another port", rule);
        prop_assert!(!rule.is_wildcard());
        match &rule.peer {
            Peer::Cidr(cidr) => {
                prop_assert!(network.cidr().contains(cidr), "{} outside the VPC", cidr);
                admitted.push(*cidr);
            }
            other => prop_assert!(false, "unexpected peer {:?}", other),
        }
    }

    for subnet in network.private_subnets() {
        prop_assert!(admitted.contains(&subnet.cidr()));
    }
    let step_server = network.public_subnets()[0].cidr();
    prop_assert_eq!(admitted.contains(&step_server), access_enabled);
    Ok(())
}

// ============================================================================
// Strategies
// ============================================================================

/// A /16 to /20 block inside 10.0.0.0/8
fn arb_vpc() -> impl Strategy<Value = Ipv4Cidr> {
    (any::<u8>(), 16u8..=20).prop_map(|(second, prefix_length)| {
        Ipv4Cidr::from_parts(Ipv4Addr::new(10, second, 0, 0), prefix_length).unwrap()
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_store_ingress_stays_inside_vpc(
        cidr in arb_vpc(),
        max_azs in 1u8..=3,
        access_enabled in any::<bool>(),
    ) {
        let mut config = DeploymentConfig::default();
        config.network.cidr = cidr;
        config.network.max_azs = max_azs;
        config.access.enabled = access_enabled;

        let platform = AnalyticsPlatform::compose(&config, &secrets()).unwrap();
        let network = &platform.network;

        let database = stack(&platform, "RedashRdsStack");
        assert_store_rules(ingress(database, "DbSg"), config.database.port, network, access_enabled)?;
        match database.resource(&LogicalId::new("RedashDB").unwrap()) {
            Some(ResourceSpec::DatabaseInstance(db)) => {
                prop_assert_eq!(&db.subnets, &network.private_subnet_ids());
                prop_assert_eq!(db.port, config.database.port);
            }
            other => prop_assert!(false, "unexpected database resource {:?}", other),
        }

        let cache = stack(&platform, "RedashElastiCacheStack");
        assert_store_rules(ingress(cache, "RedisSg"), config.cache.port, network, access_enabled)?;
        match cache.resource(&LogicalId::new("RedisSubnetGroup").unwrap()) {
            Some(ResourceSpec::CacheSubnetGroup(group)) => {
                prop_assert_eq!(&group.subnets, &network.private_subnet_ids());
            }
            other => prop_assert!(false, "unexpected subnet group resource {:?}", other),
        }

        prop_assert_eq!(network.private_subnets().len(), usize::from(max_azs));
    }
}
