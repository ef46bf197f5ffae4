// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Route Table Planning
//!
//! Random deployments of central roles and spokes, each with random
//! association and propagation settings, planned end to end.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use tgw_topology::emitter::RouteTableOutputs;
use tgw_topology::service::plan_deployment;

use crate::fixtures::{config, egress_vpc, ingress_vpc, shared_services_vpc};

// ============================================================================
// Test Deployment Definition
// ============================================================================

#[derive(Debug, Clone)]
struct SpokeSetup {
    domain: &'static str,
    combined: Option<bool>,
    associate: Option<bool>,
    propagate: Option<bool>,
}

impl SpokeSetup {
    fn associate(&self) -> bool {
        self.associate.or(self.combined).unwrap_or(true)
    }

    fn propagate(&self) -> bool {
        self.propagate.or(self.combined).unwrap_or(true)
    }

    fn detached(&self) -> bool {
        !self.associate() && !self.propagate()
    }
}

#[derive(Debug, Clone)]
struct DeploymentSetup {
    /// role → associate_and_propagate_to_tgw
    central: Vec<(&'static str, bool)>,
    /// `Some(flow)` when an inspection VPC is declared
    inspection: Option<(&'static str, bool)>,
    spokes: Vec<SpokeSetup>,
}

impl DeploymentSetup {
    fn to_config(&self) -> Value {
        let mut central = Map::new();
        for (role, flag) in &self.central {
            let vpc = match *role {
                "egress" => egress_vpc(*flag),
                "ingress" => ingress_vpc(*flag),
                _ => shared_services_vpc(*flag),
            };
            central.insert(role.to_string(), vpc);
        }
        if let Some((flow, flag)) = self.inspection {
            central.insert(
                "inspection".to_string(),
                json!({
                    "name": "inspection-vpc",
                    "cidr_block": "10.40.0.0/24",
                    "az_count": 2,
                    "inspection_flow": flow,
                    "subnets": { "transit_gateway": { "netmask": 28 } },
                    "associate_and_propagate_to_tgw": flag
                }),
            );
        }

        let mut spokes = Map::new();
        for (i, spoke) in self.spokes.iter().enumerate() {
            let mut entry = json!({
                "cidr_block": format!("10.{}.0.0/24", 100 + i),
                "az_count": 2,
                "routing_domain": spoke.domain
            });
            if let Some(flag) = spoke.combined {
                entry["associate_and_propagate_to_tgw"] = json!(flag);
            }
            if let Some(flag) = spoke.associate {
                entry["associate_with_tgw"] = json!(flag);
            }
            if let Some(flag) = spoke.propagate {
                entry["propagate_to_tgw"] = json!(flag);
            }
            spokes.insert(format!("spoke{}", i), entry);
        }

        json!({
            "identifier": "property",
            "transit_gateway_attributes": { "name": "tgw-property" },
            "network_definition": { "type": "CIDR", "value": "10.0.0.0/8" },
            "central_vpcs": central,
            "spoke_vpcs": {
                "number_vpcs": self.spokes.len(),
                "vpc_information": spokes
            }
        })
    }

    fn plan(&self) -> RouteTableOutputs {
        let planned = plan_deployment(&config(self.to_config())).expect("valid deployment");
        planned.emission.outputs.transit_gateway_route_tables
    }
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn spoke_setup() -> impl Strategy<Value = SpokeSetup> {
    (
        prop_oneof![Just("spokes"), Just("prod"), Just("dev")],
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(domain, combined, associate, propagate)| SpokeSetup {
            domain,
            combined,
            associate,
            propagate,
        })
}

fn deployment_setup() -> impl Strategy<Value = DeploymentSetup> {
    (
        proptest::sample::subsequence(vec!["egress", "ingress", "shared_services"], 0..=3),
        prop::collection::vec(any::<bool>(), 3),
        proptest::option::of((
            prop_oneof![Just("north-south"), Just("east-west")],
            any::<bool>(),
        )),
        prop::collection::vec(spoke_setup(), 0..6),
    )
        .prop_map(|(roles, flags, inspection, spokes)| DeploymentSetup {
            central: roles.into_iter().zip(flags).collect(),
            inspection,
            spokes,
        })
}

/// Deployments in which every attachment is detached
fn detached_deployment_setup() -> impl Strategy<Value = DeploymentSetup> {
    deployment_setup().prop_map(|mut setup| {
        setup.inspection = None;
        for (_, flag) in setup.central.iter_mut() {
            *flag = false;
        }
        for spoke in setup.spokes.iter_mut() {
            spoke.combined = Some(false);
            spoke.associate = None;
            spoke.propagate = None;
        }
        setup
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: when every attachment is detached, no purpose has a table
    #[test]
    fn prop_detached_deployment_has_no_tables(setup in detached_deployment_setup()) {
        let tables = setup.plan();
        prop_assert!(tables.central_vpcs.is_empty());
        prop_assert!(tables.spoke_vpcs.is_empty());
    }

    /// Property: a purpose has a table exactly when one of its attachments
    /// associates or propagates, and that table is never empty
    #[test]
    fn prop_flagged_purposes_have_non_empty_tables(setup in deployment_setup()) {
        let tables = setup.plan();

        for (role, flag) in &setup.central {
            prop_assert_eq!(tables.central_vpcs.contains_key(*role), *flag, "role {}", role);
        }
        // the inspection VPC is always associated
        prop_assert_eq!(
            tables.central_vpcs.contains_key("inspection"),
            setup.inspection.is_some()
        );

        for domain in ["spokes", "prod", "dev"] {
            let members: Vec<&SpokeSetup> =
                setup.spokes.iter().filter(|s| s.domain == domain).collect();
            let expected = members.iter().any(|s| !s.detached());
            prop_assert_eq!(tables.spoke_vpcs.contains_key(domain), expected, "domain {}", domain);
        }

        for table in tables.central_vpcs.values().chain(tables.spoke_vpcs.values()) {
            prop_assert!(
                !table.associations.is_empty()
                    || !table.propagations.is_empty()
                    || !table.routes.is_empty()
            );
        }
    }

    /// Property: planning the same deployment twice is byte-identical
    #[test]
    fn prop_planning_is_deterministic(setup in deployment_setup()) {
        let config = config(setup.to_config());
        let first = serde_json::to_string(&plan_deployment(&config).expect("valid").emission)
            .expect("serializable");
        let second = serde_json::to_string(&plan_deployment(&config).expect("valid").emission)
            .expect("serializable");
        prop_assert_eq!(first, second);
    }
}
