// Copyright (c) 2025 - Cowboy AI, Inc.
//! Attachment Resolver
//!
//! Decides, per VPC, whether the plan creates its hub attachment or reuses
//! an existing one, and resolves the attachment's association/propagation
//! pair from the VPC's policy.
//!
//! # Precedence
//!
//! | VPC | associate | propagate |
//! |-----|-----------|-----------|
//! | inspection | always | policy |
//! | other central roles | policy | policy |
//! | spoke | policy | policy |
//!
//! The inspection VPC must always be associated with its own table: the
//! firewall's return path is built on that association.

use tracing::{debug, warn};

use crate::domain::{AttachmentId, AttachmentPolicy, Provisioning, Topology, Vpc, VpcKind};
use crate::errors::ConfigError;

use super::plan::{resource_address, Attachment};

/// Logical address of a VPC's attachment, used to derive planned ids
pub fn attachment_address(vpc: &Vpc) -> String {
    resource_address("attachment", &vpc.purpose(), &vpc.name)
}

/// Resolve the attachment of one VPC
///
/// # Errors
/// - [`ConfigError::MissingPolicyArn`] when the inspection VPC references a
///   firewall whose policy ARN could not be resolved
pub fn resolve(identifier: &str, vpc: &Vpc) -> Result<Attachment, ConfigError> {
    let mut associate = vpc.policy.associate;
    let propagate = vpc.policy.propagate;
    let mut inspection_flow = None;

    let (id, provisioning) = match &vpc.kind {
        VpcKind::Spoke {
            attachment_id: Some(existing),
            ..
        } => (existing.clone(), Provisioning::Existing),
        _ => (
            AttachmentId::planned(identifier, &attachment_address(vpc)),
            Provisioning::Planned,
        ),
    };

    if let VpcKind::Inspection { flow, firewall } = &vpc.kind {
        if let Some(firewall) = firewall {
            if firewall.policy_arn.is_none() {
                return Err(ConfigError::MissingPolicyArn {
                    firewall: firewall.name.clone(),
                });
            }
        }

        if !associate {
            warn!(
                vpc = %vpc.name,
                "Inspection VPC is always associated with its route table; ignoring associate=false"
            );
            associate = true;
        }
        inspection_flow = Some(*flow);
    }

    let resolved = AttachmentPolicy {
        associate,
        propagate,
    };
    if resolved.is_detached() {
        debug!(vpc = %vpc.name, "Attachment is in no route table");
    }

    debug!(
        vpc = %vpc.name,
        role = vpc.kind.label(),
        attachment = %id,
        associate,
        propagate,
        "Attachment resolved"
    );

    Ok(Attachment {
        id,
        vpc: vpc.name.clone(),
        purpose: vpc.purpose(),
        provisioning,
        associate,
        propagate,
        inspection_flow,
    })
}

/// Resolve every attachment of the topology, central roles first
pub fn resolve_all(topology: &Topology) -> Result<Vec<Attachment>, ConfigError> {
    topology
        .vpcs()
        .map(|vpc| resolve(&topology.identifier, vpc))
        .collect()
}
