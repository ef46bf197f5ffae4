// Copyright (c) 2025 - Cowboy AI, Inc.
//! Subnet Planner
//!
//! Partitions a VPC CIDR block into per-AZ subnets for each requested tier.
//!
//! Tiers are laid out largest block first (ties broken by tier name), and
//! within a tier one block per AZ. A single allocation cursor runs across all
//! tiers and AZs; each block starts at the next free offset aligned to its
//! size. The cursor lives in a [`SubnetAllocator`] created per call, so the
//! planner is reentrant and identical inputs always yield identical layouts.

use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::{Ipv4Network, SubnetTier};
use crate::errors::ConfigError;

/// Smallest subnet AWS allows in a VPC
pub const MAX_SUBNET_NETMASK: u8 = 28;

/// Allocation cursor over one parent block
#[derive(Debug, Clone)]
pub struct SubnetAllocator {
    parent: Ipv4Network,
    next_offset: u64,
}

impl SubnetAllocator {
    pub fn new(parent: Ipv4Network) -> Self {
        Self {
            parent,
            next_offset: 0,
        }
    }

    /// Allocate the next free `/netmask` block, or `None` when the parent is full
    pub fn allocate(&mut self, netmask: u8) -> Option<Ipv4Network> {
        let block = 1u64 << (32 - u32::from(netmask));
        let aligned = self.next_offset.div_ceil(block) * block;
        let subnet = self.parent.sub_block(aligned, netmask)?;
        self.next_offset = aligned + block;
        Some(subnet)
    }

    /// Addresses handed out so far, alignment gaps included
    pub fn consumed(&self) -> u64 {
        self.next_offset
    }
}

/// Subnet layout of one VPC
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubnetPlan {
    /// Tier → one block per AZ, in AZ order
    pub tiers: BTreeMap<String, Vec<Ipv4Network>>,
}

impl SubnetPlan {
    /// Every allocated block, tier by tier
    pub fn all(&self) -> impl Iterator<Item = &Ipv4Network> {
        self.tiers.values().flatten()
    }

    pub fn tier(&self, name: &str) -> Option<&[Ipv4Network]> {
        self.tiers.get(name).map(Vec::as_slice)
    }
}

/// Lay out `tiers` across `az_count` AZs inside `cidr_block`
///
/// # Errors
/// - [`ConfigError::InvalidNetmask`] when a tier's netmask is shorter than
///   the block's prefix or longer than [`MAX_SUBNET_NETMASK`]
/// - [`ConfigError::AzCountExceeded`] when a tier splits into fewer blocks
///   than there are AZs
/// - [`ConfigError::AddressSpaceExhausted`] when the tiers cannot all fit
///   without overlapping
pub fn plan_subnets(
    cidr_block: Ipv4Network,
    az_count: u8,
    tiers: &BTreeMap<String, SubnetTier>,
) -> Result<SubnetPlan, ConfigError> {
    let parent = cidr_block.to_string();
    let max = MAX_SUBNET_NETMASK.max(cidr_block.prefix_len());

    for (name, tier) in tiers {
        if tier.netmask < cidr_block.prefix_len() || tier.netmask > max {
            return Err(ConfigError::InvalidNetmask {
                tier: name.clone(),
                netmask: tier.netmask,
                parent: parent.clone(),
                min: cidr_block.prefix_len(),
                max,
            });
        }

        let partitions = cidr_block.partitions(tier.netmask).unwrap_or(0);
        if u64::from(az_count) > partitions {
            return Err(ConfigError::AzCountExceeded {
                tier: name.clone(),
                parent: parent.clone(),
                partitions,
                az_count,
            });
        }
    }

    let mut ordered: Vec<(&String, &SubnetTier)> = tiers.iter().collect();
    ordered.sort_by(|(a_name, a), (b_name, b)| {
        a.netmask.cmp(&b.netmask).then(a_name.cmp(b_name))
    });

    let mut allocator = SubnetAllocator::new(cidr_block);
    let mut plan = SubnetPlan::default();

    for (name, tier) in ordered {
        let mut blocks = Vec::with_capacity(usize::from(az_count));
        for _ in 0..az_count {
            let subnet = allocator.allocate(tier.netmask).ok_or_else(|| {
                ConfigError::AddressSpaceExhausted {
                    tier: name.clone(),
                    parent: parent.clone(),
                }
            })?;
            blocks.push(subnet);
        }
        plan.tiers.insert(name.clone(), blocks);
    }

    debug!(
        parent = %cidr_block,
        tiers = plan.tiers.len(),
        consumed = allocator.consumed(),
        "Subnets laid out"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tiers(requested: &[(&str, u8)]) -> BTreeMap<String, SubnetTier> {
        requested
            .iter()
            .map(|(name, netmask)| (name.to_string(), SubnetTier { netmask: *netmask }))
            .collect()
    }

    fn strings(blocks: &[Ipv4Network]) -> Vec<String> {
        blocks.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_inspection_layout() {
        let cidr: Ipv4Network = "10.10.0.0/24".parse().unwrap();
        let plan = plan_subnets(
            cidr,
            2,
            &tiers(&[("public", 28), ("endpoints", 28), ("transit_gateway", 28)]),
        )
        .unwrap();

        assert_eq!(
            strings(plan.tier("endpoints").unwrap()),
            ["10.10.0.0/28", "10.10.0.16/28"]
        );
        assert_eq!(
            strings(plan.tier("public").unwrap()),
            ["10.10.0.32/28", "10.10.0.48/28"]
        );
        assert_eq!(
            strings(plan.tier("transit_gateway").unwrap()),
            ["10.10.0.64/28", "10.10.0.80/28"]
        );
    }

    #[test]
    fn test_larger_tiers_first_then_aligned() {
        let cidr: Ipv4Network = "10.0.0.0/16".parse().unwrap();
        let plan = plan_subnets(
            cidr,
            3,
            &tiers(&[("transit_gateway", 28), ("private", 20), ("public", 24)]),
        )
        .unwrap();

        assert_eq!(
            strings(plan.tier("private").unwrap()),
            ["10.0.0.0/20", "10.0.16.0/20", "10.0.32.0/20"]
        );
        assert_eq!(
            strings(plan.tier("public").unwrap()),
            ["10.0.48.0/24", "10.0.49.0/24", "10.0.50.0/24"]
        );
        assert_eq!(
            strings(plan.tier("transit_gateway").unwrap()),
            ["10.0.51.0/28", "10.0.51.16/28", "10.0.51.32/28"]
        );
    }

    #[test]
    fn test_netmask_shorter_than_parent() {
        let cidr: Ipv4Network = "10.10.0.0/24".parse().unwrap();
        let result = plan_subnets(cidr, 2, &tiers(&[("public", 20)]));
        assert!(matches!(result, Err(ConfigError::InvalidNetmask { netmask: 20, .. })));
    }

    #[test]
    fn test_netmask_too_long() {
        let cidr: Ipv4Network = "10.10.0.0/24".parse().unwrap();
        let result = plan_subnets(cidr, 2, &tiers(&[("public", 30)]));
        assert!(matches!(result, Err(ConfigError::InvalidNetmask { netmask: 30, .. })));
    }

    #[test]
    fn test_az_count_exceeds_partitions() {
        let cidr: Ipv4Network = "10.10.0.0/24".parse().unwrap();
        let result = plan_subnets(cidr, 3, &tiers(&[("public", 25)]));
        assert!(matches!(
            result,
            Err(ConfigError::AzCountExceeded {
                partitions: 2,
                az_count: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_tiers_that_would_overlap() {
        let cidr: Ipv4Network = "10.10.0.0/24".parse().unwrap();
        let result = plan_subnets(cidr, 2, &tiers(&[("private", 25), ("public", 26)]));
        assert!(matches!(
            result,
            Err(ConfigError::AddressSpaceExhausted { ref tier, .. }) if tier == "public"
        ));
    }

    #[test]
    fn test_deterministic() {
        let cidr: Ipv4Network = "10.20.0.0/22".parse().unwrap();
        let requested = tiers(&[("a", 26), ("b", 24), ("c", 28)]);
        let first = plan_subnets(cidr, 2, &requested).unwrap();
        let second = plan_subnets(cidr, 2, &requested).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_allocator_alignment() {
        let mut allocator = SubnetAllocator::new("10.0.0.0/24".parse().unwrap());
        assert_eq!(allocator.allocate(28).unwrap().to_string(), "10.0.0.0/28");
        assert_eq!(allocator.allocate(26).unwrap().to_string(), "10.0.0.64/26");
        assert_eq!(allocator.consumed(), 128);
        assert_eq!(allocator.allocate(25).unwrap().to_string(), "10.0.0.128/25");
        assert!(allocator.allocate(28).is_none());
    }
}
