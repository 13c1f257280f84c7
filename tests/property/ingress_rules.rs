// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Store Ingress Policy
//!
//! A data store never admits the whole IPv4 space unless the rule was
//! built as an explicit public opt-in.

use cim_stacks::domain::{validate_store_ingress, IngressRule, Ipv4Cidr, Peer, SecurityError};
use proptest::prelude::*;
use std::net::Ipv4Addr;

// ============================================================================
// Strategies
// ============================================================================

fn arb_port() -> impl Strategy<Value = u16> {
    1u16..=u16::MAX
}

/// A /16 to /28 block inside 10.0.0.0/8
fn arb_private_block() -> impl Strategy<Value = Ipv4Cidr> {
    (any::<u32>(), 16u8..=28).prop_map(|(bits, prefix_length)| {
        let mask = u32::MAX << (32 - u32::from(prefix_length));
        let address = (0x0A00_0000 | (bits & 0x00FF_FFFF)) & mask;
        Ipv4Cidr::from_parts(Ipv4Addr::from(address), prefix_length).unwrap()
    })
}

fn arb_wildcard_peer() -> impl Strategy<Value = Peer> {
    prop_oneof![Just(Peer::AnyIpv4), Just(Peer::Cidr(Ipv4Cidr::any()))]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// A wildcard peer without the public opt-in is always rejected
    #[test]
    fn prop_wildcard_rejected(
        port in arb_port(),
        peer in arb_wildcard_peer(),
        private in proptest::collection::vec(arb_private_block(), 0..4),
    ) {
        let mut rules: Vec<IngressRule> = private
            .into_iter()
            .map(|cidr| IngressRule::tcp(Peer::Cidr(cidr), port, "private"))
            .collect();
        rules.push(IngressRule::tcp(peer, port, "wildcard"));

        let result = validate_store_ingress(port, &rules);

        let rejected = matches!(result, Err(SecurityError::WildcardIngress { port: p, .. }) if p == port);
        prop_assert!(rejected);
    }

    /// Explicit public rules pass the policy
    #[test]
    fn prop_public_opt_in_accepted(port in arb_port()) {
        let rules = vec![IngressRule::public(port, "public")];

        prop_assert!(validate_store_ingress(port, &rules).is_ok());
    }

    /// Private address blocks on the store port pass the policy
    #[test]
    fn prop_private_blocks_accepted(
        port in arb_port(),
        blocks in proptest::collection::vec(arb_private_block(), 0..6),
    ) {
        let rules: Vec<IngressRule> = blocks
            .into_iter()
            .map(|cidr| IngressRule::tcp(Peer::Cidr(cidr), port, "private"))
            .collect();

        prop_assert!(validate_store_ingress(port, &rules).is_ok());
    }

    /// A rule for any other port is refused
    #[test]
    fn prop_other_port_refused(port in arb_port(), other in arb_port(), block in arb_private_block()) {
        prop_assume!(port != other);
        let rules = vec![IngressRule::tcp(Peer::Cidr(block), other, "misplaced")];

        let refused = matches!(
            validate_store_ingress(port, &rules),
            Err(SecurityError::PortMismatch { .. })
        );
        prop_assert!(refused);
    }
}
