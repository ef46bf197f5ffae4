// Copyright (c) 2025 - Cowboy AI, Inc.
//! Named Outputs
//!
//! The values downstream stages read by name after a deployment is realized.
//! Key names are part of the contract and never change.
//!
//! A purpose that produced no route table has no key in
//! `transit_gateway_route_tables`; consumers tell "no table" apart from
//! "table with no entries" by key presence.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{
    AttachmentId, Ipv4Network, PolicyArn, PrefixListId, Purpose, RouteTableId, TransitGatewayId,
    VpcId,
};
use crate::planner::{Plan, RouteDestination, RouteEntry, RouteTarget, TgwRouteTable, VpcPlan};

pub const TRANSIT_GATEWAY_ID: &str = "transit_gateway_id";
pub const NETWORK_PREFIX_LIST_ID: &str = "network_prefix_list_id";
pub const NETWORK_FIREWALL_POLICY_ARN: &str = "network_firewall_policy_arn";
pub const TRANSIT_GATEWAY_ROUTE_TABLES: &str = "transit_gateway_route_tables";
pub const SPOKE_VPCS_ATTRIBUTES: &str = "spoke_vpcs_attributes";
pub const CENTRAL_VPCS_ATTRIBUTES: &str = "central_vpcs_attributes";

/// Static route as reported to consumers
///
/// Exactly one destination field and one target field is set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteSummary {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub destination_cidr_block: Option<Ipv4Network>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prefix_list_id: Option<PrefixListId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transit_gateway_attachment_id: Option<AttachmentId>,
    #[serde(default)]
    pub blackhole: bool,
}

impl From<&RouteEntry> for RouteSummary {
    fn from(route: &RouteEntry) -> Self {
        let (destination_cidr_block, prefix_list_id) = match &route.destination {
            RouteDestination::Cidr(cidr) => (Some(*cidr), None),
            RouteDestination::PrefixList(id) => (None, Some(id.clone())),
        };
        let (transit_gateway_attachment_id, blackhole) = match &route.target {
            RouteTarget::Attachment(id) => (Some(id.clone()), false),
            RouteTarget::Blackhole => (None, true),
        };
        Self {
            destination_cidr_block,
            prefix_list_id,
            transit_gateway_attachment_id,
            blackhole,
        }
    }
}

/// One purpose route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTableSummary {
    pub id: RouteTableId,
    pub associations: BTreeSet<AttachmentId>,
    pub propagations: BTreeSet<AttachmentId>,
    pub routes: Vec<RouteSummary>,
}

impl From<&TgwRouteTable> for RouteTableSummary {
    fn from(table: &TgwRouteTable) -> Self {
        Self {
            id: table.id.clone(),
            associations: table.associations.clone(),
            propagations: table.propagations.clone(),
            routes: table.routes.iter().map(RouteSummary::from).collect(),
        }
    }
}

/// `transit_gateway_route_tables`
///
/// Both groups are always present; keys inside them only for purposes that
/// produced a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTableOutputs {
    /// Central role → table
    pub central_vpcs: BTreeMap<String, RouteTableSummary>,
    /// Routing domain → table
    pub spoke_vpcs: BTreeMap<String, RouteTableSummary>,
}

impl RouteTableOutputs {
    pub fn get(&self, purpose: &Purpose) -> Option<&RouteTableSummary> {
        match purpose {
            Purpose::Central(role) => self.central_vpcs.get(role.as_str()),
            Purpose::Spokes(domain) => self.spoke_vpcs.get(domain),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.central_vpcs.is_empty() && self.spoke_vpcs.is_empty()
    }
}

/// Per-VPC attribute map
///
/// A spoke's attributes can be fed back as its `vpc_information` entry: the
/// field names match the spoke configuration, and the realized attachment
/// makes the next run reference it instead of creating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcAttributes {
    pub name: String,
    pub vpc_id: VpcId,
    pub cidr_block: Ipv4Network,
    pub az_count: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transit_gateway_attachment_id: Option<AttachmentId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub routing_domain: Option<String>,
    pub associate_with_tgw: bool,
    pub propagate_to_tgw: bool,
    /// Tier → one block per AZ
    pub subnet_cidr_blocks: BTreeMap<String, Vec<Ipv4Network>>,
}

/// Every named output of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOutputs {
    pub transit_gateway_id: TransitGatewayId,
    pub network_prefix_list_id: Option<PrefixListId>,
    pub network_firewall_policy_arn: Option<PolicyArn>,
    pub transit_gateway_route_tables: RouteTableOutputs,
    /// Keyed by spoke name
    pub spoke_vpcs_attributes: BTreeMap<String, VpcAttributes>,
    /// Keyed by central role
    pub central_vpcs_attributes: BTreeMap<String, VpcAttributes>,
}

impl PlanOutputs {
    /// Outputs as a name → value map
    pub fn to_named(&self) -> serde_json::Result<BTreeMap<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Ok(BTreeMap::new()),
        }
    }
}

fn vpc_attributes(plan: &Plan, vpc: &VpcPlan) -> VpcAttributes {
    let attachment = plan.attachment(&vpc.name);
    VpcAttributes {
        name: vpc.name.clone(),
        vpc_id: vpc.vpc_id.clone(),
        cidr_block: vpc.cidr_block,
        az_count: vpc.az_count,
        transit_gateway_attachment_id: attachment.map(|a| a.id.clone()),
        routing_domain: match &vpc.purpose {
            Purpose::Spokes(domain) => Some(domain.clone()),
            Purpose::Central(_) => None,
        },
        associate_with_tgw: attachment.map(|a| a.associate).unwrap_or(false),
        propagate_to_tgw: attachment.map(|a| a.propagate).unwrap_or(false),
        subnet_cidr_blocks: vpc.subnets.clone(),
    }
}

/// Project a plan onto its named outputs
pub fn render_outputs(plan: &Plan) -> PlanOutputs {
    let mut route_tables = RouteTableOutputs::default();
    for table in &plan.route_tables {
        let summary = RouteTableSummary::from(table);
        match &table.purpose {
            Purpose::Central(role) => {
                route_tables
                    .central_vpcs
                    .insert(role.as_str().to_string(), summary);
            }
            Purpose::Spokes(domain) => {
                route_tables.spoke_vpcs.insert(domain.clone(), summary);
            }
        }
    }

    let mut spoke_vpcs_attributes = BTreeMap::new();
    let mut central_vpcs_attributes = BTreeMap::new();
    for vpc in plan.vpcs.values() {
        let attributes = vpc_attributes(plan, vpc);
        match &vpc.purpose {
            Purpose::Central(role) => {
                central_vpcs_attributes.insert(role.as_str().to_string(), attributes);
            }
            Purpose::Spokes(_) => {
                spoke_vpcs_attributes.insert(vpc.name.clone(), attributes);
            }
        }
    }

    PlanOutputs {
        transit_gateway_id: plan.transit_gateway.id.clone(),
        network_prefix_list_id: plan.network_definition.prefix_list_id().cloned(),
        network_firewall_policy_arn: plan
            .firewall
            .as_ref()
            .and_then(|f| f.firewall.policy_arn.clone()),
        transit_gateway_route_tables: route_tables,
        spoke_vpcs_attributes,
        central_vpcs_attributes,
    }
}
