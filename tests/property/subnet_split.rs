// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Address Space Partitioning
//!
//! Subnets carved from a block stay inside it, never overlap, and all have
//! the same size.

use cim_stacks::domain::Ipv4Cidr;
use proptest::prelude::*;
use std::net::Ipv4Addr;

// ============================================================================
// Strategies
// ============================================================================

fn mask(prefix_length: u8) -> u32 {
    if prefix_length == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_length))
    }
}

/// An aligned block with a prefix between /8 and /24
fn arb_block() -> impl Strategy<Value = Ipv4Cidr> {
    (any::<u32>(), 8u8..=24).prop_map(|(address, prefix_length)| {
        Ipv4Cidr::from_parts(Ipv4Addr::from(address & mask(prefix_length)), prefix_length)
            .unwrap()
    })
}

fn overlaps(a: &Ipv4Cidr, b: &Ipv4Cidr) -> bool {
    a.contains(b) || b.contains(a)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Every subnet lies inside the parent block
    #[test]
    fn prop_subnets_inside_parent(block in arb_block(), count in 1usize..=8) {
        let subnets = block.split(count).unwrap();

        prop_assert_eq!(subnets.len(), count);
        for subnet in &subnets {
            prop_assert!(block.contains(subnet), "{} not inside {}", subnet, block);
        }
    }

    /// Subnets are pairwise disjoint, equally sized and in address order
    #[test]
    fn prop_subnets_disjoint(block in arb_block(), count in 2usize..=8) {
        let subnets = block.split(count).unwrap();

        for (index, subnet) in subnets.iter().enumerate() {
            prop_assert_eq!(subnet.size(), subnets[0].size());
            for other in &subnets[index + 1..] {
                prop_assert!(!overlaps(subnet, other), "{} overlaps {}", subnet, other);
                prop_assert!(subnet.network() < other.network());
            }
        }
    }

    /// Splitting is a pure function of the block and the count
    #[test]
    fn prop_split_is_deterministic(block in arb_block(), count in 1usize..=8) {
        prop_assert_eq!(block.split(count).unwrap(), block.split(count).unwrap());
    }

    /// Blocks too small for the requested subnets are refused
    #[test]
    fn prop_small_blocks_refused(address in any::<u32>(), count in 2usize..=8) {
        let block = Ipv4Cidr::from_parts(Ipv4Addr::from(address & mask(28)), 28).unwrap();

        prop_assert!(block.split(count).is_err());
    }
}
