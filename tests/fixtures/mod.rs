// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for tgw-topology
//!
//! Deterministic deployment configurations for the scenario and property
//! tests. Identifiers, hub ids and ARNs are fixed constants so every test is
//! reproducible.
//!
//! # Design Principles
//! - Fixtures are the only place that spells out configuration JSON
//! - Tests use fixtures, never ad-hoc configuration literals
//! - No randomness: planned ids derive from the fixed identifiers

#![allow(dead_code)]

use serde_json::{json, Value};

use tgw_topology::config::DeploymentConfig;

pub const EXISTING_TGW_ID: &str = "tgw-0a1b2c3d4e5f60718";
pub const PREFIX_LIST_ID: &str = "pl-0a1b2c3d4e5f60718";
pub const POLICY_ARN: &str =
    "arn:aws:network-firewall:eu-west-1:123456789012:firewall-policy/anfw-fixture";

/// Parse a configuration fixture
pub fn config(value: Value) -> DeploymentConfig {
    serde_json::from_value(value).expect("Invalid configuration fixture")
}

/// Hub to create, as the scenarios declare it
pub fn transit_gateway_attributes(identifier: &str) -> Value {
    json!({
        "name": format!("tgw-{}", identifier),
        "description": format!("Transit_Gateway-{}", identifier),
        "amazon_side_asn": 65000,
        "tags": { "team": "networking", "owner": "fixtures" }
    })
}

fn tiers(names: &[&str]) -> Value {
    let map: serde_json::Map<String, Value> = names
        .iter()
        .map(|name| (name.to_string(), json!({ "netmask": 28 })))
        .collect();
    Value::Object(map)
}

/// Central VPC with the given role's tiers
pub fn central_vpc(name: &str, cidr_block: &str, tier_names: &[&str], flag: bool) -> Value {
    json!({
        "name": name,
        "cidr_block": cidr_block,
        "az_count": 2,
        "subnets": tiers(tier_names),
        "associate_and_propagate_to_tgw": flag
    })
}

pub fn egress_vpc(flag: bool) -> Value {
    central_vpc("egress-vpc", "10.10.0.0/24", &["public", "transit_gateway"], flag)
}

pub fn ingress_vpc(flag: bool) -> Value {
    central_vpc("ingress-vpc", "10.20.0.0/24", &["public", "transit_gateway"], flag)
}

pub fn shared_services_vpc(flag: bool) -> Value {
    central_vpc(
        "shared-services-vpc",
        "10.30.0.0/24",
        &["endpoints", "transit_gateway"],
        flag,
    )
}

/// Inspection VPC with a firewall
pub fn inspection_vpc(flag: bool, flow: &str) -> Value {
    let mut vpc = central_vpc(
        "inspection-vpc",
        "10.40.0.0/24",
        &["public", "endpoints", "transit_gateway"],
        flag,
    );
    vpc["inspection_flow"] = json!(flow);
    vpc["aws_network_firewall"] = json!({
        "name": "anfw-fixture",
        "description": "AWS Network Firewall - fixture",
        "policy_arn": POLICY_ARN
    });
    vpc["tags"] = json!({ "team": "security" });
    vpc
}

/// Two spokes with default policy
pub fn two_spokes() -> Value {
    json!({
        "number_vpcs": 2,
        "vpc_information": {
            "vpc1": { "cidr_block": "10.0.0.0/24", "number_azs": 2 },
            "vpc2": { "cidr_block": "10.0.1.0/24", "number_azs": 2 }
        }
    })
}

/// Egress and ingress, both detached, over an existing hub and a prefix list
pub fn central_egress_ingress_no_association() -> DeploymentConfig {
    config(json!({
        "identifier": "central-egress-ingress-fixture",
        "transit_gateway_id": EXISTING_TGW_ID,
        "network_definition": { "type": "PREFIX_LIST", "value": PREFIX_LIST_ID },
        "central_vpcs": {
            "egress": egress_vpc(false),
            "ingress": ingress_vpc(false)
        }
    }))
}

/// Detached inspection VPC with a firewall over a CIDR network definition
pub fn central_inspection_no_association() -> DeploymentConfig {
    let identifier = "central-inspection-fixture";
    config(json!({
        "identifier": identifier,
        "transit_gateway_attributes": transit_gateway_attributes(identifier),
        "network_definition": { "type": "CIDR", "value": "10.0.0.0/8" },
        "central_vpcs": {
            "inspection": inspection_vpc(false, "north-south")
        }
    }))
}

/// First stage of the shared services scenario: hub and two spokes
pub fn spokes_stage() -> DeploymentConfig {
    let identifier = "central-shared-services-fixture";
    config(json!({
        "identifier": identifier,
        "transit_gateway_attributes": transit_gateway_attributes(identifier),
        "network_definition": { "type": "CIDR", "value": "10.0.0.0/8" },
        "spoke_vpcs": two_spokes()
    }))
}

/// Second stage: detached shared services VPC next to the realized spokes
pub fn central_shared_services_no_association(
    transit_gateway_id: &Value,
    spoke_vpcs_attributes: &Value,
) -> DeploymentConfig {
    let number_vpcs = spoke_vpcs_attributes
        .as_object()
        .map(|spokes| spokes.len())
        .unwrap_or(0);
    config(json!({
        "identifier": "central-shared-services-fixture",
        "transit_gateway_id": transit_gateway_id,
        "network_definition": { "type": "CIDR", "value": "10.0.0.0/24" },
        "central_vpcs": {
            "shared_services": shared_services_vpc(false)
        },
        "spoke_vpcs": {
            "number_vpcs": number_vpcs,
            "vpc_information": spoke_vpcs_attributes
        }
    }))
}

/// Egress and ingress attached, with two spokes
pub fn central_egress_ingress() -> DeploymentConfig {
    let identifier = "egress-ingress-fixture";
    config(json!({
        "identifier": identifier,
        "transit_gateway_attributes": transit_gateway_attributes(identifier),
        "network_definition": { "type": "CIDR", "value": "10.0.0.0/8" },
        "central_vpcs": {
            "egress": egress_vpc(true),
            "ingress": ingress_vpc(true)
        },
        "spoke_vpcs": two_spokes()
    }))
}

/// Inspection with egress and two spokes
pub fn central_inspection(flow: &str) -> DeploymentConfig {
    let identifier = "inspection-fixture";
    config(json!({
        "identifier": identifier,
        "transit_gateway_attributes": transit_gateway_attributes(identifier),
        "network_definition": { "type": "PREFIX_LIST", "value": PREFIX_LIST_ID },
        "central_vpcs": {
            "inspection": inspection_vpc(true, flow),
            "egress": egress_vpc(true)
        },
        "spoke_vpcs": two_spokes()
    }))
}

/// Spokes only, split into two routing domains
pub fn spokes_routing_only() -> DeploymentConfig {
    let identifier = "spokes-routing-fixture";
    config(json!({
        "identifier": identifier,
        "transit_gateway_attributes": transit_gateway_attributes(identifier),
        "network_definition": { "type": "CIDR", "value": "10.0.0.0/8" },
        "spoke_vpcs": {
            "number_vpcs": 4,
            "vpc_information": {
                "prod1": { "cidr_block": "10.1.0.0/24", "az_count": 2, "routing_domain": "prod" },
                "prod2": { "cidr_block": "10.1.1.0/24", "az_count": 2, "routing_domain": "prod" },
                "dev1": {
                    "cidr_block": "10.2.0.0/24",
                    "az_count": 2,
                    "routing_domain": "dev",
                    "subnets": { "workload": { "netmask": 26 }, "transit_gateway": { "netmask": 28 } }
                },
                "legacy": {
                    "cidr_block": "10.3.0.0/24",
                    "az_count": 2,
                    "routing_domain": "dev",
                    "vpc_id": "vpc-0legacy0000000001",
                    "transit_gateway_attachment_id": "tgw-attach-0legacy000000001",
                    "associate_with_tgw": true,
                    "propagate_to_tgw": false
                }
            }
        }
    }))
}
