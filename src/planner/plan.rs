// Copyright (c) 2025 - Cowboy AI, Inc.
//! Plan Aggregate
//!
//! The resolved control-plane topology: hub, VPCs with their subnet
//! allocation, attachments with their resolved policy, and the purpose route
//! tables. A plan is pure data; the [`emitter`](crate::emitter) projects it
//! into outputs and declarative changes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::{
    AttachmentId, InspectionFlow, Ipv4Network, NetworkDefinition, NetworkFirewall, PrefixListId,
    Provisioning, Purpose, RouteTableId, TransitGateway, VpcId,
};

/// Logical address of a resource: `<kind>.<group>.<name>`
///
/// Addresses name resources in the change set and seed planned identifiers.
pub fn resource_address(kind: &str, purpose: &Purpose, name: &str) -> String {
    format!("{}.{}.{}", kind, purpose.group(), name)
}

/// A VPC with its subnets laid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcPlan {
    pub name: String,
    pub vpc_id: VpcId,
    pub provisioning: Provisioning,
    pub purpose: Purpose,
    pub cidr_block: Ipv4Network,
    pub az_count: u8,
    /// Tier → one block per AZ, in AZ order
    pub subnets: BTreeMap<String, Vec<Ipv4Network>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub tags: BTreeMap<String, String>,
}

impl VpcPlan {
    pub fn address(&self) -> String {
        resource_address("vpc", &self.purpose, &self.name)
    }

    /// Address of the `az`-th subnet of `tier`
    pub fn subnet_address(&self, tier: &str, az: usize) -> String {
        format!("subnet.{}.{}.{}.{}", self.purpose.group(), self.name, tier, az)
    }
}

/// A VPC's connection into the hub with its resolved policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    /// Owning VPC
    pub vpc: String,
    pub purpose: Purpose,
    pub provisioning: Provisioning,
    pub associate: bool,
    pub propagate: bool,
    /// Set on the inspection VPC's attachment only
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inspection_flow: Option<InspectionFlow>,
}

impl Attachment {
    pub fn address(&self) -> String {
        resource_address("attachment", &self.purpose, &self.vpc)
    }
}

/// Where a static route sends matching traffic
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDestination {
    Cidr(Ipv4Network),
    /// Managed prefix list, referenced but never expanded
    PrefixList(PrefixListId),
}

impl From<&NetworkDefinition> for RouteDestination {
    fn from(definition: &NetworkDefinition) -> Self {
        match definition {
            NetworkDefinition::Cidr(cidr) => RouteDestination::Cidr(*cidr),
            NetworkDefinition::PrefixList(id) => RouteDestination::PrefixList(id.clone()),
        }
    }
}

impl fmt::Display for RouteDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteDestination::Cidr(cidr) => write!(f, "{}", cidr),
            RouteDestination::PrefixList(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    Attachment(AttachmentId),
    Blackhole,
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Attachment(id) => write!(f, "{}", id),
            RouteTarget::Blackhole => write!(f, "blackhole"),
        }
    }
}

/// Static route in a transit gateway route table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteEntry {
    pub destination: RouteDestination,
    pub target: RouteTarget,
}

/// One purpose route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TgwRouteTable {
    pub id: RouteTableId,
    pub purpose: Purpose,
    pub associations: BTreeSet<AttachmentId>,
    pub propagations: BTreeSet<AttachmentId>,
    pub routes: BTreeSet<RouteEntry>,
}

impl TgwRouteTable {
    pub fn new(id: RouteTableId, purpose: Purpose) -> Self {
        Self {
            id,
            purpose,
            associations: BTreeSet::new(),
            propagations: BTreeSet::new(),
            routes: BTreeSet::new(),
        }
    }

    pub fn address(&self) -> String {
        resource_address("route_table", &self.purpose, self.purpose.key())
    }

    /// No associations, propagations or routes
    pub fn is_empty(&self) -> bool {
        self.associations.is_empty() && self.propagations.is_empty() && self.routes.is_empty()
    }
}

/// Firewall placed in the inspection VPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallPlan {
    pub vpc: String,
    pub firewall: NetworkFirewall,
    /// Endpoint subnets, one per AZ
    pub subnets: Vec<Ipv4Network>,
}

/// Aggregate root of a planning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub identifier: String,
    pub transit_gateway: TransitGateway,
    pub network_definition: NetworkDefinition,
    /// Keyed by VPC name
    pub vpcs: BTreeMap<String, VpcPlan>,
    /// Keyed by owning VPC name
    pub attachments: BTreeMap<String, Attachment>,
    /// Sorted by purpose; only purposes that produced a table
    pub route_tables: Vec<TgwRouteTable>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub firewall: Option<FirewallPlan>,
}

impl Plan {
    pub fn route_table(&self, purpose: &Purpose) -> Option<&TgwRouteTable> {
        self.route_tables.iter().find(|t| &t.purpose == purpose)
    }

    pub fn attachment(&self, vpc: &str) -> Option<&Attachment> {
        self.attachments.get(vpc)
    }

    pub fn attachment_by_id(&self, id: &AttachmentId) -> Option<&Attachment> {
        self.attachments.values().find(|a| &a.id == id)
    }
}
