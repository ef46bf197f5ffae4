// Copyright (c) 2025 - Cowboy AI, Inc.
//! VPC Entities
//!
//! A VPC is either one of the central roles hanging off the hub or a spoke.
//! Each variant of [`VpcKind`] carries only the fields that make sense for
//! it, so an east-west flow on an egress VPC is unrepresentable once a
//! [`Vpc`] exists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::identifiers::{AttachmentId, PolicyArn, VpcId};
use super::network::Ipv4Network;

/// Subnet tier holding the transit gateway attachment ENIs
pub const TIER_TRANSIT_GATEWAY: &str = "transit_gateway";
/// Public subnet tier (NAT gateways, load balancers)
pub const TIER_PUBLIC: &str = "public";
/// Endpoint subnet tier (firewall endpoints, interface endpoints)
pub const TIER_ENDPOINTS: &str = "endpoints";

/// Routing domain spokes land in when none is declared
pub const DEFAULT_ROUTING_DOMAIN: &str = "spokes";

/// Role of a central VPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentralRole {
    Egress,
    Ingress,
    Inspection,
    SharedServices,
}

impl CentralRole {
    pub const ALL: [CentralRole; 4] = [
        CentralRole::Egress,
        CentralRole::Ingress,
        CentralRole::Inspection,
        CentralRole::SharedServices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CentralRole::Egress => "egress",
            CentralRole::Ingress => "ingress",
            CentralRole::Inspection => "inspection",
            CentralRole::SharedServices => "shared_services",
        }
    }
}

impl fmt::Display for CentralRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Traffic the inspection VPC sits in the path of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InspectionFlow {
    /// Internet-bound and return traffic; inspection is the spokes' exit
    #[default]
    #[serde(rename = "north-south")]
    NorthSouth,
    /// Spoke-to-spoke traffic; inspection is a mid-path hop only
    #[serde(rename = "east-west")]
    EastWest,
}

impl fmt::Display for InspectionFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectionFlow::NorthSouth => write!(f, "north-south"),
            InspectionFlow::EastWest => write!(f, "east-west"),
        }
    }
}

/// AWS Network Firewall placed in the inspection VPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFirewall {
    pub name: String,
    pub description: String,
    /// `None` when the reference could not be resolved to an ARN
    pub policy_arn: Option<PolicyArn>,
    pub delete_protection: bool,
}

/// Requested subnet tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetTier {
    pub netmask: u8,
}

/// Whether an attachment is associated with and propagated into its tables
///
/// The two knobs are independent; neither implies the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentPolicy {
    pub associate: bool,
    pub propagate: bool,
}

impl AttachmentPolicy {
    /// Policy from a single `associate_and_propagate_to_tgw` toggle
    pub fn combined(flag: bool) -> Self {
        Self {
            associate: flag,
            propagate: flag,
        }
    }

    pub fn is_detached(&self) -> bool {
        !self.associate && !self.propagate
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self::combined(true)
    }
}

/// What a VPC is for, with the fields only that role can carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum VpcKind {
    Egress,
    Ingress,
    Inspection {
        flow: InspectionFlow,
        firewall: Option<NetworkFirewall>,
    },
    SharedServices,
    Spoke {
        routing_domain: String,
        /// Already provisioned VPC, if any
        vpc_id: Option<VpcId>,
        /// Already provisioned attachment, if any
        attachment_id: Option<AttachmentId>,
    },
}

impl VpcKind {
    /// Central role, or `None` for spokes
    pub fn central_role(&self) -> Option<CentralRole> {
        match self {
            VpcKind::Egress => Some(CentralRole::Egress),
            VpcKind::Ingress => Some(CentralRole::Ingress),
            VpcKind::Inspection { .. } => Some(CentralRole::Inspection),
            VpcKind::SharedServices => Some(CentralRole::SharedServices),
            VpcKind::Spoke { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.central_role().map(|r| r.as_str()).unwrap_or("spoke")
    }
}

/// Functional purpose a transit gateway route table serves
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "group", content = "key", rename_all = "snake_case")]
pub enum Purpose {
    /// Table of one central VPC role
    Central(CentralRole),
    /// Shared table of one spoke routing domain
    Spokes(String),
}

impl Purpose {
    /// Output group this purpose is reported under
    pub fn group(&self) -> &'static str {
        match self {
            Purpose::Central(_) => "central_vpcs",
            Purpose::Spokes(_) => "spoke_vpcs",
        }
    }

    /// Key inside the output group
    pub fn key(&self) -> &str {
        match self {
            Purpose::Central(role) => role.as_str(),
            Purpose::Spokes(domain) => domain,
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group(), self.key())
    }
}

/// A VPC declared in the topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub name: String,
    pub cidr_block: Ipv4Network,
    pub az_count: u8,
    /// Tier name → requested netmask; empty for spokes that bring their own attachment
    pub subnets: BTreeMap<String, SubnetTier>,
    pub kind: VpcKind,
    pub policy: AttachmentPolicy,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub tags: BTreeMap<String, String>,
}

impl Vpc {
    /// Purpose table this VPC's attachment belongs to
    pub fn purpose(&self) -> Purpose {
        match &self.kind {
            VpcKind::Spoke { routing_domain, .. } => Purpose::Spokes(routing_domain.clone()),
            kind => match kind.central_role() {
                Some(role) => Purpose::Central(role),
                None => Purpose::Spokes(DEFAULT_ROUTING_DOMAIN.to_string()),
            },
        }
    }

    pub fn is_spoke(&self) -> bool {
        matches!(self.kind, VpcKind::Spoke { .. })
    }

    pub fn has_tier(&self, tier: &str) -> bool {
        self.subnets.contains_key(tier)
    }
}
