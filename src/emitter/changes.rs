// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declarative Change Set
//!
//! A plan is projected into resource changes returned as data, never
//! performed here. An [`ApplyExecutor`](crate::apply::ApplyExecutor)
//! interprets them.
//!
//! ```text
//! Plan ──render_changes()──> ChangeSet ──stages()──> [[change]] ──> executor
//! ```
//!
//! Every change names the changes it depends on. [`ChangeSet::stages`] layers
//! them so that a change only appears after everything it depends on:
//!
//! ```text
//! stage 0   transit_gateway, vpc.*, prefix_list.*
//! stage 1   subnet.*, route_table.*
//! stage 2   attachment.*, network_firewall.*
//! stage 3   association.*, propagation.*, route.*
//! ```
//!
//! Resources that already exist (a referenced hub, a spoke's own VPC or
//! attachment) produce no change, and nothing depends on them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::{
    AttachmentId, CentralRole, NetworkDefinition, Provisioning, Purpose, SubnetId, TIER_ENDPOINTS,
    TIER_TRANSIT_GATEWAY,
};
use crate::errors::PlanningInvariantError;
use crate::planner::{resource_address, Plan, RouteDestination, RouteTarget};

use super::outputs::RouteSummary;

/// Address of the hub
pub const TRANSIT_GATEWAY_ADDRESS: &str = "transit_gateway";
/// Address of the network definition's prefix list reference
pub const PREFIX_LIST_ADDRESS: &str = "prefix_list.network_definition";

/// Kind of resource a change creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    TransitGateway,
    /// Lookup of an externally managed prefix list
    PrefixListReference,
    Vpc,
    Subnet,
    NetworkFirewall,
    Attachment,
    RouteTable,
    Association,
    Propagation,
    Route,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::TransitGateway => "transit_gateway",
            ResourceKind::PrefixListReference => "prefix_list_reference",
            ResourceKind::Vpc => "vpc",
            ResourceKind::Subnet => "subnet",
            ResourceKind::NetworkFirewall => "network_firewall",
            ResourceKind::Attachment => "attachment",
            ResourceKind::RouteTable => "route_table",
            ResourceKind::Association => "association",
            ResourceKind::Propagation => "propagation",
            ResourceKind::Route => "route",
        };
        write!(f, "{}", name)
    }
}

/// One resource to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChange {
    /// Unique logical address
    pub address: String,
    pub kind: ResourceKind,
    /// Identifier the resource is known by, when it has one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    pub attributes: Value,
    /// Addresses that must be realized first
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub depends_on: Vec<String>,
}

impl ResourceChange {
    fn new(address: impl Into<String>, kind: ResourceKind, attributes: Value) -> Self {
        Self {
            address: address.into(),
            kind,
            id: None,
            attributes,
            depends_on: Vec::new(),
        }
    }

    fn with_id(mut self, id: impl fmt::Display) -> Self {
        self.id = Some(id.to_string());
        self
    }

    fn depends_on<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(addresses.into_iter().map(Into::into));
        self
    }
}

/// Ordered changes of one deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub identifier: String,
    /// In emission order; dependencies always precede dependents
    pub changes: Vec<ResourceChange>,
}

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&ResourceChange> {
        self.changes.iter().find(|c| c.address == address)
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceChange> {
        self.changes.iter().filter(move |c| c.kind == kind)
    }

    /// Layer the changes into stages
    ///
    /// A change lands in the first stage after all its dependencies. Changes
    /// in one stage are independent of each other and may be applied
    /// concurrently.
    ///
    /// # Errors
    /// Duplicate addresses, dependencies on addresses outside the set, and
    /// dependency cycles are planner defects.
    pub fn stages(&self) -> Result<Vec<Vec<&ResourceChange>>, PlanningInvariantError> {
        let mut known = BTreeSet::new();
        for change in &self.changes {
            if !known.insert(change.address.as_str()) {
                return Err(PlanningInvariantError::new(
                    "change_set",
                    format!("duplicate address {}", change.address),
                ));
            }
        }
        for change in &self.changes {
            if let Some(missing) = change
                .depends_on
                .iter()
                .find(|d| !known.contains(d.as_str()))
            {
                return Err(PlanningInvariantError::new(
                    "change_set",
                    format!("{} depends on unknown {}", change.address, missing),
                ));
            }
        }

        let mut done: BTreeSet<&str> = BTreeSet::new();
        let mut remaining: Vec<&ResourceChange> = self.changes.iter().collect();
        let mut stages = Vec::new();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<&ResourceChange>, Vec<&ResourceChange>) = remaining
                .into_iter()
                .partition(|c| c.depends_on.iter().all(|d| done.contains(d.as_str())));

            if ready.is_empty() {
                let stuck = blocked
                    .first()
                    .map(|c| c.address.clone())
                    .unwrap_or_default();
                return Err(PlanningInvariantError::new(
                    "change_set",
                    format!("dependency cycle through {}", stuck),
                ));
            }

            done.extend(ready.iter().copied().map(|c| c.address.as_str()));
            stages.push(ready);
            remaining = blocked;
        }

        Ok(stages)
    }

    /// Stages in teardown order
    pub fn destroy_stages(&self) -> Result<Vec<Vec<&ResourceChange>>, PlanningInvariantError> {
        let mut stages = self.stages()?;
        stages.reverse();
        Ok(stages)
    }
}

/// Project a plan into its change set
///
/// The result is layered with [`ChangeSet::stages`] before it is returned,
/// so an executor is never handed a set it cannot order.
pub fn render_changes(plan: &Plan) -> Result<ChangeSet, PlanningInvariantError> {
    let identifier = plan.identifier.as_str();
    let tgw = &plan.transit_gateway;
    let mut changes = Vec::new();

    let tgw_dependency: Vec<String> = match tgw.provisioning {
        Provisioning::Planned => {
            changes.push(
                ResourceChange::new(
                    TRANSIT_GATEWAY_ADDRESS,
                    ResourceKind::TransitGateway,
                    json!({
                        "name": tgw.name,
                        "description": tgw.description,
                        "amazon_side_asn": tgw.amazon_side_asn.value(),
                        "default_route_table_association": "disable",
                        "default_route_table_propagation": "disable",
                        "tags": tgw.tags,
                    }),
                )
                .with_id(&tgw.id),
            );
            vec![TRANSIT_GATEWAY_ADDRESS.to_string()]
        }
        Provisioning::Existing => Vec::new(),
    };

    let prefix_list_dependency: Vec<String> = match &plan.network_definition {
        NetworkDefinition::PrefixList(id) => {
            changes.push(
                ResourceChange::new(
                    PREFIX_LIST_ADDRESS,
                    ResourceKind::PrefixListReference,
                    json!({ "prefix_list_id": id }),
                )
                .with_id(id),
            );
            vec![PREFIX_LIST_ADDRESS.to_string()]
        }
        NetworkDefinition::Cidr(_) => Vec::new(),
    };

    // vpc name -> (dependency on the VPC, tier -> subnet (address, id) per AZ)
    let mut vpc_dependencies: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut subnet_refs: BTreeMap<&str, BTreeMap<&str, Vec<(String, SubnetId)>>> =
        BTreeMap::new();

    for vpc in plan.vpcs.values() {
        let dependency = match vpc.provisioning {
            Provisioning::Planned => {
                changes.push(
                    ResourceChange::new(
                        vpc.address(),
                        ResourceKind::Vpc,
                        json!({
                            "name": vpc.name,
                            "purpose": vpc.purpose.to_string(),
                            "cidr_block": vpc.cidr_block,
                            "az_count": vpc.az_count,
                            "tags": vpc.tags,
                        }),
                    )
                    .with_id(&vpc.vpc_id),
                );
                vec![vpc.address()]
            }
            Provisioning::Existing => Vec::new(),
        };

        let tiers = subnet_refs.entry(vpc.name.as_str()).or_default();
        for (tier, blocks) in &vpc.subnets {
            let refs = tiers.entry(tier.as_str()).or_default();
            for (az, block) in blocks.iter().enumerate() {
                let address = vpc.subnet_address(tier, az);
                let id = SubnetId::planned(identifier, &address);
                changes.push(
                    ResourceChange::new(
                        address.clone(),
                        ResourceKind::Subnet,
                        json!({
                            "vpc_id": vpc.vpc_id,
                            "tier": tier,
                            "cidr_block": block,
                            "availability_zone_index": az,
                        }),
                    )
                    .with_id(&id)
                    .depends_on(dependency.clone()),
                );
                refs.push((address, id));
            }
        }

        vpc_dependencies.insert(vpc.name.as_str(), dependency);
    }

    let subnets_of = |vpc: &str, tier: &str| -> Vec<(String, SubnetId)> {
        subnet_refs
            .get(vpc)
            .and_then(|tiers| tiers.get(tier))
            .cloned()
            .unwrap_or_default()
    };

    if let Some(firewall) = &plan.firewall {
        let endpoints = subnets_of(&firewall.vpc, TIER_ENDPOINTS);
        let vpc_id = plan.vpcs.get(&firewall.vpc).map(|v| v.vpc_id.clone());
        changes.push(
            ResourceChange::new(
                resource_address(
                    "network_firewall",
                    &Purpose::Central(CentralRole::Inspection),
                    &firewall.firewall.name,
                ),
                ResourceKind::NetworkFirewall,
                json!({
                    "name": firewall.firewall.name,
                    "description": firewall.firewall.description,
                    "firewall_policy_arn": firewall.firewall.policy_arn,
                    "delete_protection": firewall.firewall.delete_protection,
                    "vpc_id": vpc_id,
                    "subnet_ids": endpoints.iter().map(|(_, id)| id).collect::<Vec<_>>(),
                }),
            )
            .depends_on(
                vpc_dependencies
                    .get(firewall.vpc.as_str())
                    .cloned()
                    .unwrap_or_default(),
            )
            .depends_on(endpoints.into_iter().map(|(address, _)| address)),
        );
    }

    // attachment id -> dependency on the attachment
    let mut attachment_dependencies: BTreeMap<&AttachmentId, Vec<String>> = BTreeMap::new();

    for attachment in plan.attachments.values() {
        let dependency = match attachment.provisioning {
            Provisioning::Planned => {
                let vpc_id = plan.vpcs.get(&attachment.vpc).map(|v| v.vpc_id.clone());
                let subnets = subnets_of(&attachment.vpc, TIER_TRANSIT_GATEWAY);
                let appliance_mode = match attachment.inspection_flow {
                    Some(_) => "enable",
                    None => "disable",
                };
                changes.push(
                    ResourceChange::new(
                        attachment.address(),
                        ResourceKind::Attachment,
                        json!({
                            "transit_gateway_id": tgw.id,
                            "vpc_id": vpc_id,
                            "subnet_ids": subnets.iter().map(|(_, id)| id).collect::<Vec<_>>(),
                            "appliance_mode_support": appliance_mode,
                            "transit_gateway_default_route_table_association": false,
                            "transit_gateway_default_route_table_propagation": false,
                        }),
                    )
                    .with_id(&attachment.id)
                    .depends_on(tgw_dependency.clone())
                    .depends_on(
                        vpc_dependencies
                            .get(attachment.vpc.as_str())
                            .cloned()
                            .unwrap_or_default(),
                    )
                    .depends_on(subnets.into_iter().map(|(address, _)| address)),
                );
                vec![attachment.address()]
            }
            Provisioning::Existing => Vec::new(),
        };
        attachment_dependencies.insert(&attachment.id, dependency);
    }

    let attachment_dependency = |id: &AttachmentId, table: &str| {
        attachment_dependencies.get(id).cloned().ok_or_else(|| {
            PlanningInvariantError::new(table, format!("references unknown attachment {}", id))
        })
    };

    for table in &plan.route_tables {
        let purpose = table.purpose.to_string();
        changes.push(
            ResourceChange::new(
                table.address(),
                ResourceKind::RouteTable,
                json!({
                    "name": format!("{}-{}", identifier, table.purpose.key()),
                    "transit_gateway_id": tgw.id,
                    "purpose": purpose,
                }),
            )
            .with_id(&table.id)
            .depends_on(tgw_dependency.clone()),
        );
    }

    for table in &plan.route_tables {
        let purpose = table.purpose.to_string();
        let vpc_of = |id: &AttachmentId| {
            plan.attachment_by_id(id)
                .map(|a| a.vpc.clone())
                .ok_or_else(|| {
                    PlanningInvariantError::new(
                        purpose.as_str(),
                        format!("references unknown attachment {}", id),
                    )
                })
        };

        for id in &table.associations {
            changes.push(
                ResourceChange::new(
                    format!("association.{}.{}", purpose, vpc_of(id)?),
                    ResourceKind::Association,
                    json!({
                        "transit_gateway_route_table_id": table.id,
                        "transit_gateway_attachment_id": id,
                    }),
                )
                .depends_on([table.address()])
                .depends_on(attachment_dependency(id, purpose.as_str())?),
            );
        }

        for id in &table.propagations {
            changes.push(
                ResourceChange::new(
                    format!("propagation.{}.{}", purpose, vpc_of(id)?),
                    ResourceKind::Propagation,
                    json!({
                        "transit_gateway_route_table_id": table.id,
                        "transit_gateway_attachment_id": id,
                    }),
                )
                .depends_on([table.address()])
                .depends_on(attachment_dependency(id, purpose.as_str())?),
            );
        }

        for route in &table.routes {
            let mut attributes = serde_json::to_value(RouteSummary::from(route))
                .map_err(|e| PlanningInvariantError::new(purpose.as_str(), e.to_string()))?;
            if let Value::Object(map) = &mut attributes {
                map.insert(
                    "transit_gateway_route_table_id".to_string(),
                    json!(table.id),
                );
            }

            let mut change = ResourceChange::new(
                format!("route.{}.{}", purpose, route.destination),
                ResourceKind::Route,
                attributes,
            )
            .depends_on([table.address()]);
            if let RouteTarget::Attachment(id) = &route.target {
                change = change.depends_on(attachment_dependency(id, purpose.as_str())?);
            }
            if let RouteDestination::PrefixList(_) = route.destination {
                change = change.depends_on(prefix_list_dependency.clone());
            }
            changes.push(change);
        }
    }

    let change_set = ChangeSet {
        identifier: plan.identifier.clone(),
        changes,
    };
    change_set.stages()?;
    Ok(change_set)
}
