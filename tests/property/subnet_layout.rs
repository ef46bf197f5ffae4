// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Subnet Planner

use proptest::prelude::*;
use std::collections::BTreeMap;

use tgw_topology::domain::{Ipv4Network, SubnetTier};
use tgw_topology::planner::{plan_subnets, MAX_SUBNET_NETMASK};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Arbitrary parent block between /16 and /26 inside 10.0.0.0/8
fn parent_block() -> impl Strategy<Value = Ipv4Network> {
    (16u8..=26, any::<u32>()).prop_map(|(prefix, bits)| {
        let mask = u32::MAX << (32 - u32::from(prefix));
        let address = (0x0A00_0000 | (bits & 0x00FF_FFFF)) & mask;
        Ipv4Network::new(address.into(), prefix).expect("aligned block")
    })
}

/// Parent block with AZ count and tier requests that fit the netmask range
fn layout_request() -> impl Strategy<Value = (Ipv4Network, u8, BTreeMap<String, SubnetTier>)> {
    parent_block().prop_flat_map(|parent| {
        let min = parent.prefix_len();
        (
            Just(parent),
            1u8..=4,
            prop::collection::btree_map(
                "[a-z]{1,8}",
                (min..=MAX_SUBNET_NETMASK).prop_map(|netmask| SubnetTier { netmask }),
                0..5,
            ),
        )
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: every allocated subnet lies inside the parent block
    /// and no two allocated subnets overlap
    #[test]
    fn prop_subnets_disjoint_and_contained((parent, az_count, tiers) in layout_request()) {
        if let Ok(plan) = plan_subnets(parent, az_count, &tiers) {
            let all: Vec<&Ipv4Network> = plan.all().collect();

            for subnet in &all {
                prop_assert!(parent.contains(subnet), "{} not in {}", subnet, parent);
            }
            for (i, a) in all.iter().enumerate() {
                for b in &all[i + 1..] {
                    prop_assert!(!a.overlaps(*b), "{} overlaps {}", a, b);
                }
            }
        }
    }

    /// Property: a successful layout has one block per AZ per tier,
    /// each of the requested size
    #[test]
    fn prop_one_block_per_az((parent, az_count, tiers) in layout_request()) {
        if let Ok(plan) = plan_subnets(parent, az_count, &tiers) {
            prop_assert_eq!(plan.tiers.len(), tiers.len());
            for (name, tier) in &tiers {
                let blocks = plan.tier(name).expect("planned tier");
                prop_assert_eq!(blocks.len(), usize::from(az_count));
                prop_assert!(blocks.iter().all(|b| b.prefix_len() == tier.netmask));
            }
        }
    }

    /// Property: a request that fits by size is never rejected
    #[test]
    fn prop_fitting_request_succeeds((parent, az_count, tiers) in layout_request()) {
        let demand: u64 = tiers
            .values()
            .map(|t| u64::from(az_count) << (32 - u32::from(t.netmask)))
            .sum();
        // largest-first allocation leaves no alignment gaps
        if demand <= parent.size() {
            prop_assert!(plan_subnets(parent, az_count, &tiers).is_ok());
        }
    }

    /// Property: identical inputs give identical layouts
    #[test]
    fn prop_layout_is_deterministic((parent, az_count, tiers) in layout_request()) {
        prop_assert_eq!(
            plan_subnets(parent, az_count, &tiers),
            plan_subnets(parent, az_count, &tiers)
        );
    }
}
