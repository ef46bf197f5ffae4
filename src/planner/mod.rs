// Copyright (c) 2025 - Cowboy AI, Inc.
//! Planning Core
//!
//! Pure, deterministic planning of a validated [`Topology`]:
//!
//! ```text
//! Topology ─> subnets (per VPC) ─> attachments (per VPC) ─> route tables ─> Plan
//! ```
//!
//! Every step is a function of its inputs only. Planning the same topology
//! twice yields equal plans, and planned identifiers are derived from the
//! deployment identifier, so serialized plans are byte-identical.

pub mod attachments;
pub mod plan;
pub mod route_tables;
pub mod subnets;

pub use attachments::{attachment_address, resolve, resolve_all};
pub use plan::{
    resource_address, Attachment, FirewallPlan, Plan, RouteDestination, RouteEntry, RouteTarget,
    TgwRouteTable, VpcPlan,
};
pub use route_tables::{route_table_address, verify, RouteTablePlanner};
pub use subnets::{plan_subnets, SubnetAllocator, SubnetPlan, MAX_SUBNET_NETMASK};

use std::collections::BTreeMap;
use tracing::info;

use crate::domain::{Provisioning, Topology, Vpc, VpcId, VpcKind, TIER_ENDPOINTS};
use crate::errors::PlannerResult;

/// Logical address of a VPC, used to derive planned ids
pub fn vpc_address(vpc: &Vpc) -> String {
    resource_address("vpc", &vpc.purpose(), &vpc.name)
}

/// Plan a validated topology
///
/// # Errors
/// - [`ConfigError`](crate::errors::ConfigError) when a VPC's subnet tiers do
///   not fit its CIDR block, or the firewall policy is unresolved
/// - [`PlanningInvariantError`](crate::errors::PlanningInvariantError) when the
///   produced route tables fail verification
pub fn plan(topology: &Topology) -> PlannerResult<Plan> {
    let mut vpcs = BTreeMap::new();
    for vpc in topology.vpcs() {
        vpcs.insert(vpc.name.clone(), plan_vpc(&topology.identifier, vpc)?);
    }

    let resolved = resolve_all(topology)?;
    let tables = RouteTablePlanner::new(&topology.identifier)
        .build(&resolved, &topology.network_definition)?;

    let firewall = topology.vpcs().find_map(|vpc| match &vpc.kind {
        VpcKind::Inspection {
            firewall: Some(firewall),
            ..
        } => Some(FirewallPlan {
            vpc: vpc.name.clone(),
            firewall: firewall.clone(),
            subnets: vpcs
                .get(&vpc.name)
                .and_then(|p: &VpcPlan| p.subnets.get(TIER_ENDPOINTS))
                .cloned()
                .unwrap_or_default(),
        }),
        _ => None,
    });

    let attachments: BTreeMap<String, Attachment> = resolved
        .into_iter()
        .map(|attachment| (attachment.vpc.clone(), attachment))
        .collect();

    info!(
        identifier = %topology.identifier,
        vpcs = vpcs.len(),
        attachments = attachments.len(),
        route_tables = tables.len(),
        firewall = firewall.is_some(),
        inspection = ?topology.inspection_flow(),
        "Plan computed"
    );

    Ok(Plan {
        identifier: topology.identifier.clone(),
        transit_gateway: topology.transit_gateway.clone(),
        network_definition: topology.network_definition.clone(),
        vpcs,
        attachments,
        route_tables: tables,
        firewall,
    })
}

fn plan_vpc(identifier: &str, vpc: &Vpc) -> PlannerResult<VpcPlan> {
    let layout = plan_subnets(vpc.cidr_block, vpc.az_count, &vpc.subnets)?;

    let (vpc_id, provisioning) = match &vpc.kind {
        VpcKind::Spoke {
            vpc_id: Some(existing),
            ..
        } => (existing.clone(), Provisioning::Existing),
        _ => (
            VpcId::planned(identifier, &vpc_address(vpc)),
            Provisioning::Planned,
        ),
    };

    Ok(VpcPlan {
        name: vpc.name.clone(),
        vpc_id,
        provisioning,
        purpose: vpc.purpose(),
        cidr_block: vpc.cidr_block,
        az_count: vpc.az_count,
        subnets: layout.tiers,
        tags: vpc.tags.clone(),
    })
}
