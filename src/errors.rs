// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology planning
//!
//! Three families of failure reach callers:
//!
//! - [`ConfigError`] - the declared topology is malformed or contradictory.
//!   Raised before any apply is attempted.
//! - [`PlanningInvariantError`] - the planner produced a plan that violates
//!   one of its own invariants. This is a defect signal.
//! - [`ExecutionError`] - whatever the apply/destroy collaborator reported.
//!   Opaque to the core and never retried here.

use thiserror::Error;

use crate::domain::network::NetworkError;

/// Malformed or contradictory topology
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// CIDR notation could not be parsed or has host bits set
    #[error("Invalid CIDR block for {context}: {source}")]
    InvalidCidr {
        context: String,
        #[source]
        source: NetworkError,
    },

    /// Subnet netmask outside the range allowed by the parent block
    #[error("Invalid netmask /{netmask} for tier '{tier}' in {parent} (must be between /{min} and /{max})")]
    InvalidNetmask {
        tier: String,
        netmask: u8,
        parent: String,
        min: u8,
        max: u8,
    },

    /// More availability zones requested than the tier can be split into
    #[error("Tier '{tier}' in {parent} yields {partitions} blocks, cannot serve {az_count} availability zones")]
    AzCountExceeded {
        tier: String,
        parent: String,
        partitions: u64,
        az_count: u8,
    },

    /// Tiers do not fit into the parent block without overlapping
    #[error("Address space of {parent} exhausted while allocating tier '{tier}'")]
    AddressSpaceExhausted { tier: String, parent: String },

    /// Availability zone count is out of range
    #[error("Invalid AZ count {az_count} for VPC '{vpc}' (must be 1-{max})")]
    InvalidAzCount { vpc: String, az_count: u8, max: u8 },

    /// A field was supplied on a VPC role that cannot carry it
    #[error("Field '{field}' is not allowed on {role} VPC '{vpc}'")]
    FieldNotAllowed {
        field: String,
        role: String,
        vpc: String,
    },

    /// The role requires a subnet tier that was not declared
    #[error("{role} VPC '{vpc}' requires a '{tier}' subnet tier")]
    MissingSubnetTier {
        role: String,
        vpc: String,
        tier: String,
    },

    /// Firewall referenced without a resolvable policy ARN
    #[error("Network firewall '{firewall}' has no resolvable policy ARN")]
    MissingPolicyArn { firewall: String },

    /// Policy ARN is not a network firewall policy ARN
    #[error("Invalid firewall policy ARN: {0}")]
    InvalidPolicyArn(String),

    /// Amazon side ASN outside the private ranges
    #[error("Invalid Amazon side ASN {0} (must be 64512-65534 or 4200000000-4294967294)")]
    InvalidAsn(u64),

    /// Network definition type and value disagree
    #[error("Invalid network definition: {0}")]
    InvalidNetworkDefinition(String),

    /// Neither or both of the hub reference and hub attributes were given
    #[error("Transit gateway: {0}")]
    TransitGatewayReference(String),

    /// Declared spoke count does not match the supplied spoke information
    #[error("spoke_vpcs.number_vpcs is {declared} but {actual} VPCs were described")]
    SpokeCountMismatch { declared: usize, actual: usize },

    /// Two VPCs share a name
    #[error("Duplicate VPC name: {0}")]
    DuplicateName(String),

    /// Two VPC CIDR blocks overlap, so their propagated routes would collide
    #[error("CIDR {first_cidr} of VPC '{first}' overlaps {second_cidr} of VPC '{second}'")]
    OverlappingCidr {
        first: String,
        first_cidr: String,
        second: String,
        second_cidr: String,
    },

    /// Central VPC keyed by a role that does not exist
    #[error("Unknown central VPC role: {0}")]
    UnknownRole(String),

    /// Identifier value object rejected its input
    #[error("Invalid {kind}: {value}")]
    InvalidIdentifier { kind: &'static str, value: String },

    /// A required field is missing
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Internal planning defect
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Planning invariant violated in {purpose}: {detail}")]
pub struct PlanningInvariantError {
    /// Purpose table (or plan area) where the violation was found
    pub purpose: String,
    /// What went wrong
    pub detail: String,
}

impl PlanningInvariantError {
    pub fn new(purpose: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            purpose: purpose.into(),
            detail: detail.into(),
        }
    }
}

/// Failure reported by the apply/destroy collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Execution failed{}: {message}", .address.as_ref().map(|a| format!(" at {}", a)).unwrap_or_default())]
pub struct ExecutionError {
    /// Logical address of the resource being applied, when known
    pub address: Option<String>,
    /// Collaborator's message, passed through untouched
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            address: None,
            message: message.into(),
        }
    }

    pub fn at(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the planner crate
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Topology configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Planner defect
    #[error(transparent)]
    Invariant(#[from] PlanningInvariantError),

    /// Apply/destroy collaborator failure
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local state I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
