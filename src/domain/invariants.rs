// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Topology Invariants
//!
//! Business rules checked once, at the boundary where configuration becomes
//! a [`Topology`](super::Topology). The planners downstream rely on these
//! having held and never re-check shapes.
//!
//! # Invariant Categories
//!
//! 1. **Structural**: names, AZ counts, hub reference
//! 2. **Role compatibility**: fields and subnet tiers each role may or must carry
//! 3. **Cross-VPC**: unique names, non-overlapping CIDR blocks, spoke count

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::ConfigError;

use super::network::Ipv4Network;
use super::vpc::{CentralRole, TIER_ENDPOINTS, TIER_PUBLIC, TIER_TRANSIT_GATEWAY};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ConfigError>;

/// Most availability zones a VPC may span
pub const MAX_AZ_COUNT: u8 = 6;

/// Validate a required, non-blank name
pub fn validate_name(field: &str, name: &str) -> ValidationResult {
    if name.trim().is_empty() {
        return Err(ConfigError::MissingField(field.to_string()));
    }
    Ok(())
}

/// Validate the AZ count of a VPC
///
/// # Rules
/// - At least one AZ
/// - At most [`MAX_AZ_COUNT`]
pub fn validate_az_count(vpc: &str, az_count: u8) -> ValidationResult {
    if az_count == 0 || az_count > MAX_AZ_COUNT {
        return Err(ConfigError::InvalidAzCount {
            vpc: vpc.to_string(),
            az_count,
            max: MAX_AZ_COUNT,
        });
    }
    Ok(())
}

/// Validate exactly one hub reference was given
pub fn validate_transit_gateway_reference(has_id: bool, has_attributes: bool) -> ValidationResult {
    match (has_id, has_attributes) {
        (true, false) | (false, true) => Ok(()),
        (false, false) => Err(ConfigError::TransitGatewayReference(
            "either transit_gateway_id or transit_gateway_attributes is required".to_string(),
        )),
        (true, true) => Err(ConfigError::TransitGatewayReference(
            "transit_gateway_id and transit_gateway_attributes are mutually exclusive".to_string(),
        )),
    }
}

/// Validate inspection-only fields appear on inspection VPCs only
pub fn validate_role_fields(
    role: CentralRole,
    vpc: &str,
    has_inspection_flow: bool,
    has_firewall: bool,
) -> ValidationResult {
    if role == CentralRole::Inspection {
        return Ok(());
    }

    let offending = if has_inspection_flow {
        Some("inspection_flow")
    } else if has_firewall {
        Some("aws_network_firewall")
    } else {
        None
    };

    match offending {
        Some(field) => Err(ConfigError::FieldNotAllowed {
            field: field.to_string(),
            role: role.to_string(),
            vpc: vpc.to_string(),
        }),
        None => Ok(()),
    }
}

/// Subnet tiers a central role cannot work without
pub fn required_tiers(role: CentralRole, has_firewall: bool) -> Vec<&'static str> {
    let mut tiers = vec![TIER_TRANSIT_GATEWAY];
    match role {
        CentralRole::Egress | CentralRole::Ingress => tiers.push(TIER_PUBLIC),
        CentralRole::Inspection if has_firewall => tiers.push(TIER_ENDPOINTS),
        CentralRole::Inspection => {}
        CentralRole::SharedServices => tiers.push(TIER_ENDPOINTS),
    }
    tiers
}

/// Validate a central VPC declares the subnet tiers its role needs
///
/// # Rules
/// - Every central VPC needs `transit_gateway`
/// - Egress and ingress need `public`
/// - Inspection with a firewall needs `endpoints`
/// - Shared services need `endpoints`
pub fn validate_role_tiers<V>(
    role: CentralRole,
    vpc: &str,
    tiers: &BTreeMap<String, V>,
    has_firewall: bool,
) -> ValidationResult {
    for tier in required_tiers(role, has_firewall) {
        if !tiers.contains_key(tier) {
            return Err(ConfigError::MissingSubnetTier {
                role: role.to_string(),
                vpc: vpc.to_string(),
                tier: tier.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate the declared spoke count matches the described spokes
pub fn validate_spoke_count(declared: usize, actual: usize) -> ValidationResult {
    if declared != actual {
        return Err(ConfigError::SpokeCountMismatch { declared, actual });
    }
    Ok(())
}

/// Validate VPC names are unique across central and spoke VPCs
pub fn validate_unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> ValidationResult {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
    }
    Ok(())
}

/// Validate no two VPC CIDR blocks overlap
pub fn validate_disjoint_cidrs(blocks: &[(&str, Ipv4Network)]) -> ValidationResult {
    for (i, (first, first_cidr)) in blocks.iter().enumerate() {
        for (second, second_cidr) in &blocks[i + 1..] {
            if first_cidr.overlaps(second_cidr) {
                return Err(ConfigError::OverlappingCidr {
                    first: first.to_string(),
                    first_cidr: first_cidr.to_string(),
                    second: second.to_string(),
                    second_cidr: second_cidr.to_string(),
                });
            }
        }
    }
    Ok(())
}
