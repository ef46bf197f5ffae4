// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment configuration
//!
//! The raw, serde-facing shape of a deployment. Nothing here is trusted:
//! [`crate::domain::Topology::from_config`] validates it once and turns it
//! into the typed topology model the planners work on.
//!
//! ```json
//! {
//!   "identifier": "central-inspection",
//!   "transit_gateway_attributes": { "name": "tgw", "amazon_side_asn": 65000 },
//!   "network_definition": { "type": "CIDR", "value": "10.0.0.0/8" },
//!   "central_vpcs": {
//!     "inspection": {
//!       "name": "inspection-vpc",
//!       "cidr_block": "10.10.0.0/24",
//!       "az_count": 2,
//!       "subnets": { "endpoints": { "netmask": 28 }, "transit_gateway": { "netmask": 28 } }
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::InspectionFlow;
use crate::errors::PlannerResult;

fn default_true() -> bool {
    true
}

/// Top-level deployment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Name prefix for everything this deployment plans
    pub identifier: String,

    /// Existing hub to attach to (mutually exclusive with `transit_gateway_attributes`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_gateway_id: Option<String>,

    /// Hub to create (mutually exclusive with `transit_gateway_id`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_gateway_attributes: Option<TransitGatewayAttributes>,

    /// Address space the spokes' default routes are built from
    pub network_definition: NetworkDefinitionConfig,

    /// Central VPCs keyed by role
    #[serde(default)]
    pub central_vpcs: BTreeMap<String, CentralVpcConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spoke_vpcs: Option<SpokeVpcsConfig>,
}

impl DeploymentConfig {
    /// Parse configuration from JSON text
    pub fn from_json_str(json: &str) -> PlannerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> PlannerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Attributes of a hub the deployment creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitGatewayAttributes {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amazon_side_asn: Option<u64>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Representation of the network definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkDefinitionType {
    #[serde(rename = "CIDR")]
    Cidr,
    #[serde(rename = "PREFIX_LIST")]
    PrefixList,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDefinitionConfig {
    #[serde(rename = "type")]
    pub kind: NetworkDefinitionType,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetTierConfig {
    pub netmask: u8,
}

/// Network firewall reference of an inspection VPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFirewallConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub policy_arn: Option<String>,
    #[serde(default)]
    pub delete_protection: bool,
}

/// One central VPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralVpcConfig {
    pub name: String,
    pub cidr_block: String,
    pub az_count: u8,
    #[serde(default)]
    pub subnets: BTreeMap<String, SubnetTierConfig>,
    #[serde(default = "default_true")]
    pub associate_and_propagate_to_tgw: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_flow: Option<InspectionFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_network_firewall: Option<NetworkFirewallConfig>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Spoke VPCs attached to the hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpokeVpcsConfig {
    pub number_vpcs: usize,
    #[serde(default)]
    pub vpc_information: BTreeMap<String, SpokeVpcConfig>,
}

/// One spoke VPC
///
/// Unknown attributes are ignored so the attribute map of a previous stage
/// can be passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpokeVpcConfig {
    pub cidr_block: String,
    #[serde(alias = "number_azs")]
    pub az_count: u8,
    #[serde(default)]
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub transit_gateway_attachment_id: Option<String>,
    #[serde(default)]
    pub routing_domain: Option<String>,
    #[serde(default)]
    pub subnets: BTreeMap<String, SubnetTierConfig>,
    /// Combined toggle; overridden by the two specific knobs below
    #[serde(default)]
    pub associate_and_propagate_to_tgw: Option<bool>,
    #[serde(default)]
    pub associate_with_tgw: Option<bool>,
    #[serde(default)]
    pub propagate_to_tgw: Option<bool>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}
