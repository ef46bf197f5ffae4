// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Typed representation of a hub-and-spoke deployment: the transit gateway,
//! the network definition, the central VPC roles and the spokes.
//!
//! # Value Objects with Invariants
//!
//! - [`Ipv4Network`] - IPv4 CIDR block without host bits
//! - [`TransitGatewayId`], [`AttachmentId`], [`RouteTableId`], [`VpcId`],
//!   [`SubnetId`], [`PrefixListId`] - prefix-validated AWS identifiers
//! - [`PolicyArn`] - network firewall policy ARN
//! - [`Asn`] - private BGP ASN of the hub
//!
//! # Entities
//!
//! - [`Vpc`] with its [`VpcKind`] tagged variant
//! - [`Topology`] - aggregate root, validated once at construction

pub mod identifiers;
pub mod invariants;
pub mod network;
pub mod topology;
pub mod vpc;

pub use identifiers::{
    Asn, AttachmentId, PolicyArn, PrefixListId, RouteTableId, SubnetId, TransitGatewayId, VpcId,
};
pub use invariants::ValidationResult;
pub use network::{Ipv4Network, NetworkError};
pub use topology::{NetworkDefinition, Provisioning, Topology, TransitGateway};
pub use vpc::{
    AttachmentPolicy, CentralRole, InspectionFlow, NetworkFirewall, Purpose, SubnetTier, Vpc,
    VpcKind, DEFAULT_ROUTING_DOMAIN, TIER_ENDPOINTS, TIER_PUBLIC, TIER_TRANSIT_GATEWAY,
};
