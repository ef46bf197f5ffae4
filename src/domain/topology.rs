// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Aggregate
//!
//! The typed, validated model of one hub-and-spoke deployment: the transit
//! gateway, the network definition and every VPC attached to the hub. Built
//! once from [`DeploymentConfig`]; every business rule in
//! [`invariants`](super::invariants) is checked during that conversion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{
    CentralVpcConfig, DeploymentConfig, NetworkDefinitionConfig, NetworkDefinitionType,
    NetworkFirewallConfig, SpokeVpcConfig, SubnetTierConfig,
};
use crate::errors::ConfigError;

use super::identifiers::{AttachmentId, Asn, PolicyArn, PrefixListId, TransitGatewayId, VpcId};
use super::invariants::*;
use super::network::Ipv4Network;
use super::vpc::{
    AttachmentPolicy, CentralRole, InspectionFlow, NetworkFirewall, SubnetTier, Vpc, VpcKind,
    DEFAULT_ROUTING_DOMAIN, TIER_TRANSIT_GATEWAY,
};

/// Netmask of the attachment tier planned for spokes that declare no tiers
pub const DEFAULT_SPOKE_ATTACHMENT_NETMASK: u8 = 28;

/// Whether a resource already exists or is created by the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provisioning {
    Existing,
    Planned,
}

/// The hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitGateway {
    pub id: TransitGatewayId,
    pub provisioning: Provisioning,
    pub name: String,
    pub description: String,
    pub amazon_side_asn: Asn,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub tags: BTreeMap<String, String>,
}

/// Address space spokes route towards the hub
///
/// Invariant: exactly one representation, matching the declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NetworkDefinition {
    #[serde(rename = "CIDR")]
    Cidr(Ipv4Network),
    #[serde(rename = "PREFIX_LIST")]
    PrefixList(PrefixListId),
}

impl NetworkDefinition {
    pub fn prefix_list_id(&self) -> Option<&PrefixListId> {
        match self {
            NetworkDefinition::PrefixList(id) => Some(id),
            NetworkDefinition::Cidr(_) => None,
        }
    }
}

impl TryFrom<&NetworkDefinitionConfig> for NetworkDefinition {
    type Error = ConfigError;

    fn try_from(config: &NetworkDefinitionConfig) -> Result<Self, Self::Error> {
        let value = config.value.trim();
        match config.kind {
            NetworkDefinitionType::Cidr => {
                let network = value.parse::<Ipv4Network>().map_err(|e| {
                    ConfigError::InvalidNetworkDefinition(format!("CIDR value '{}': {}", value, e))
                })?;
                // network routes would collide with the 0.0.0.0/0 routes in the same table
                if network.contains(&Ipv4Network::DEFAULT_ROUTE) {
                    return Err(ConfigError::InvalidNetworkDefinition(format!(
                        "CIDR value '{}' covers the default route",
                        value
                    )));
                }
                Ok(Self::Cidr(network))
            }
            NetworkDefinitionType::PrefixList => PrefixListId::new(value)
                .map(Self::PrefixList)
                .map_err(|_| {
                    ConfigError::InvalidNetworkDefinition(format!(
                        "PREFIX_LIST value '{}' is not a prefix list id",
                        value
                    ))
                }),
        }
    }
}

/// One hub-and-spoke deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub identifier: String,
    pub transit_gateway: TransitGateway,
    pub network_definition: NetworkDefinition,
    pub central_vpcs: BTreeMap<CentralRole, Vpc>,
    pub spoke_vpcs: BTreeMap<String, Vpc>,
}

impl Topology {
    /// Validate configuration and build the topology model
    pub fn from_config(config: &DeploymentConfig) -> Result<Self, ConfigError> {
        validate_name("identifier", &config.identifier)?;

        let transit_gateway = transit_gateway_from_config(config)?;
        let network_definition = NetworkDefinition::try_from(&config.network_definition)?;

        let mut central_vpcs = BTreeMap::new();
        for (role_name, vpc_config) in &config.central_vpcs {
            let role: CentralRole = serde_json::from_value(serde_json::Value::String(
                role_name.clone(),
            ))
            .map_err(|_| ConfigError::UnknownRole(role_name.clone()))?;
            central_vpcs.insert(role, central_vpc_from_config(role, vpc_config)?);
        }

        let mut spoke_vpcs = BTreeMap::new();
        if let Some(spokes) = &config.spoke_vpcs {
            validate_spoke_count(spokes.number_vpcs, spokes.vpc_information.len())?;
            for (name, spoke_config) in &spokes.vpc_information {
                spoke_vpcs.insert(name.clone(), spoke_vpc_from_config(name, spoke_config)?);
            }
        }

        let all: Vec<&Vpc> = central_vpcs.values().chain(spoke_vpcs.values()).collect();
        validate_unique_names(all.iter().map(|v| v.name.as_str()))?;
        let blocks: Vec<(&str, Ipv4Network)> =
            all.iter().map(|v| (v.name.as_str(), v.cidr_block)).collect();
        validate_disjoint_cidrs(&blocks)?;

        debug!(
            identifier = %config.identifier,
            central = central_vpcs.len(),
            spokes = spoke_vpcs.len(),
            "Topology validated"
        );

        Ok(Self {
            identifier: config.identifier.clone(),
            transit_gateway,
            network_definition,
            central_vpcs,
            spoke_vpcs,
        })
    }

    /// All VPCs, central roles first, then spokes by name
    pub fn vpcs(&self) -> impl Iterator<Item = &Vpc> {
        self.central_vpcs.values().chain(self.spoke_vpcs.values())
    }

    pub fn central(&self, role: CentralRole) -> Option<&Vpc> {
        self.central_vpcs.get(&role)
    }

    /// Inspection flow, if an inspection VPC is declared
    pub fn inspection_flow(&self) -> Option<InspectionFlow> {
        match self.central(CentralRole::Inspection).map(|v| &v.kind) {
            Some(VpcKind::Inspection { flow, .. }) => Some(*flow),
            _ => None,
        }
    }

    /// Firewall policy of the inspection VPC, if any
    pub fn firewall_policy_arn(&self) -> Option<&PolicyArn> {
        match self.central(CentralRole::Inspection).map(|v| &v.kind) {
            Some(VpcKind::Inspection {
                firewall: Some(firewall),
                ..
            }) => firewall.policy_arn.as_ref(),
            _ => None,
        }
    }
}

fn transit_gateway_from_config(config: &DeploymentConfig) -> Result<TransitGateway, ConfigError> {
    validate_transit_gateway_reference(
        config.transit_gateway_id.is_some(),
        config.transit_gateway_attributes.is_some(),
    )?;

    if let Some(id) = &config.transit_gateway_id {
        let id = TransitGatewayId::new(id.trim())?;
        return Ok(TransitGateway {
            name: id.to_string(),
            id,
            provisioning: Provisioning::Existing,
            description: String::new(),
            amazon_side_asn: Asn::default(),
            tags: BTreeMap::new(),
        });
    }

    let attributes = config
        .transit_gateway_attributes
        .as_ref()
        .ok_or_else(|| ConfigError::MissingField("transit_gateway_attributes".to_string()))?;
    validate_name("transit_gateway_attributes.name", &attributes.name)?;

    let amazon_side_asn = match attributes.amazon_side_asn {
        Some(asn) => Asn::new(asn)?,
        None => Asn::default(),
    };

    Ok(TransitGateway {
        id: TransitGatewayId::planned(&config.identifier, "transit_gateway"),
        provisioning: Provisioning::Planned,
        name: attributes.name.clone(),
        description: attributes.description.clone().unwrap_or_default(),
        amazon_side_asn,
        tags: attributes.tags.clone(),
    })
}

fn parse_cidr(vpc: &str, cidr: &str) -> Result<Ipv4Network, ConfigError> {
    cidr.trim()
        .parse()
        .map_err(|source| ConfigError::InvalidCidr {
            context: format!("VPC '{}'", vpc),
            source,
        })
}

fn tiers_from_config(tiers: &BTreeMap<String, SubnetTierConfig>) -> BTreeMap<String, SubnetTier> {
    tiers
        .iter()
        .map(|(name, tier)| {
            (
                name.clone(),
                SubnetTier {
                    netmask: tier.netmask,
                },
            )
        })
        .collect()
}

fn firewall_from_config(config: &NetworkFirewallConfig) -> Result<NetworkFirewall, ConfigError> {
    validate_name("aws_network_firewall.name", &config.name)?;

    // a blank ARN is an unresolved reference, reported by the attachment resolver
    let policy_arn = match config.policy_arn.as_deref().map(str::trim) {
        Some(arn) if !arn.is_empty() => Some(PolicyArn::new(arn)?),
        _ => None,
    };

    Ok(NetworkFirewall {
        name: config.name.clone(),
        description: config.description.clone().unwrap_or_default(),
        policy_arn,
        delete_protection: config.delete_protection,
    })
}

fn central_vpc_from_config(
    role: CentralRole,
    config: &CentralVpcConfig,
) -> Result<Vpc, ConfigError> {
    validate_name(&format!("central_vpcs.{}.name", role), &config.name)?;
    validate_az_count(&config.name, config.az_count)?;
    validate_role_fields(
        role,
        &config.name,
        config.inspection_flow.is_some(),
        config.aws_network_firewall.is_some(),
    )?;
    validate_role_tiers(
        role,
        &config.name,
        &config.subnets,
        config.aws_network_firewall.is_some(),
    )?;

    let kind = match role {
        CentralRole::Egress => VpcKind::Egress,
        CentralRole::Ingress => VpcKind::Ingress,
        CentralRole::SharedServices => VpcKind::SharedServices,
        CentralRole::Inspection => VpcKind::Inspection {
            flow: config.inspection_flow.unwrap_or_default(),
            firewall: config
                .aws_network_firewall
                .as_ref()
                .map(firewall_from_config)
                .transpose()?,
        },
    };

    Ok(Vpc {
        name: config.name.clone(),
        cidr_block: parse_cidr(&config.name, &config.cidr_block)?,
        az_count: config.az_count,
        subnets: tiers_from_config(&config.subnets),
        kind,
        policy: AttachmentPolicy::combined(config.associate_and_propagate_to_tgw),
        tags: config.tags.clone(),
    })
}

fn spoke_vpc_from_config(name: &str, config: &SpokeVpcConfig) -> Result<Vpc, ConfigError> {
    validate_name("spoke_vpcs.vpc_information key", name)?;
    validate_az_count(name, config.az_count)?;

    let attachment_id = config
        .transit_gateway_attachment_id
        .as_deref()
        .map(AttachmentId::new)
        .transpose()?;
    let vpc_id = config.vpc_id.as_deref().map(VpcId::new).transpose()?;

    let routing_domain = match config.routing_domain.as_deref().map(str::trim) {
        Some(domain) if !domain.is_empty() => domain.to_string(),
        _ => DEFAULT_ROUTING_DOMAIN.to_string(),
    };

    // specific knobs win over the combined toggle, which wins over the default
    let base = config
        .associate_and_propagate_to_tgw
        .map(AttachmentPolicy::combined)
        .unwrap_or_default();
    let policy = AttachmentPolicy {
        associate: config.associate_with_tgw.unwrap_or(base.associate),
        propagate: config.propagate_to_tgw.unwrap_or(base.propagate),
    };

    let mut subnets = tiers_from_config(&config.subnets);
    if attachment_id.is_some() {
        subnets.clear();
    } else if subnets.is_empty() {
        subnets.insert(
            TIER_TRANSIT_GATEWAY.to_string(),
            SubnetTier {
                netmask: DEFAULT_SPOKE_ATTACHMENT_NETMASK,
            },
        );
    }

    Ok(Vpc {
        name: name.to_string(),
        cidr_block: parse_cidr(name, &config.cidr_block)?,
        az_count: config.az_count,
        subnets,
        kind: VpcKind::Spoke {
            routing_domain,
            vpc_id,
            attachment_id,
        },
        policy,
        tags: config.tags.clone(),
    })
}
