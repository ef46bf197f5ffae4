// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identifier Value Objects
//!
//! AWS resource identifiers carried through the plan. Each identifier is
//! validated on construction against its resource prefix. Identifiers for
//! resources the plan creates are derived deterministically from the
//! deployment identifier and the resource's logical address, so re-planning
//! an unchanged topology yields the same identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ConfigError;

/// Namespace for planned identifiers
const PLANNED_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_8b3d_4c5f_9e7a_1d2b_3c4d_5e6f);

/// Number of hex characters in an AWS long-format resource id
const ID_HEX_LEN: usize = 17;

/// Derive the hex suffix of a planned resource id
fn planned_suffix(identifier: &str, address: &str) -> String {
    let uuid = Uuid::new_v5(
        &PLANNED_ID_NAMESPACE,
        format!("{}/{}", identifier, address).as_bytes(),
    );
    uuid.simple().to_string()[..ID_HEX_LEN].to_string()
}

macro_rules! aws_identifier {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Resource prefix
            pub const PREFIX: &'static str = $prefix;

            /// Create with validation of the resource prefix
            pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
                let id = id.into();
                let valid = id
                    .strip_prefix(Self::PREFIX)
                    .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()))
                    .unwrap_or(false);
                if !valid {
                    return Err(ConfigError::InvalidIdentifier {
                        kind: $kind,
                        value: id,
                    });
                }
                Ok(Self(id))
            }

            /// Deterministic identifier for a resource the plan creates
            pub fn planned(identifier: &str, address: &str) -> Self {
                Self(format!("{}{}", Self::PREFIX, planned_suffix(identifier, address)))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ConfigError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

aws_identifier!(
    /// Transit gateway identifier (`tgw-…`)
    TransitGatewayId,
    "tgw-",
    "transit gateway id"
);

aws_identifier!(
    /// Transit gateway attachment identifier (`tgw-attach-…`)
    AttachmentId,
    "tgw-attach-",
    "transit gateway attachment id"
);

aws_identifier!(
    /// Transit gateway route table identifier (`tgw-rtb-…`)
    RouteTableId,
    "tgw-rtb-",
    "transit gateway route table id"
);

aws_identifier!(
    /// VPC identifier (`vpc-…`)
    VpcId,
    "vpc-",
    "VPC id"
);

aws_identifier!(
    /// Subnet identifier (`subnet-…`)
    SubnetId,
    "subnet-",
    "subnet id"
);

aws_identifier!(
    /// Managed prefix list identifier (`pl-…`)
    PrefixListId,
    "pl-",
    "prefix list id"
);

/// AWS Network Firewall policy ARN
///
/// Shape: `arn:<partition>:network-firewall:<region>:<account>:firewall-policy/<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PolicyArn(String);

impl PolicyArn {
    pub fn new(arn: impl Into<String>) -> Result<Self, ConfigError> {
        let arn = arn.into();
        let parts: Vec<&str> = arn.splitn(6, ':').collect();

        let valid = parts.len() == 6
            && parts[0] == "arn"
            && !parts[1].is_empty()
            && parts[2] == "network-firewall"
            && !parts[3].is_empty()
            && !parts[4].is_empty()
            && parts[5]
                .strip_prefix("firewall-policy/")
                .map(|name| !name.is_empty())
                .unwrap_or(false);

        if !valid {
            return Err(ConfigError::InvalidPolicyArn(arn));
        }
        Ok(Self(arn))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PolicyArn {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PolicyArn> for String {
    fn from(value: PolicyArn) -> Self {
        value.0
    }
}

/// Amazon side BGP ASN of a transit gateway
///
/// Invariants:
/// - 16-bit private range 64512-65534, or
/// - 32-bit private range 4200000000-4294967294
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Asn(u64);

impl Asn {
    pub const PRIVATE_16: (u64, u64) = (64512, 65534);
    pub const PRIVATE_32: (u64, u64) = (4_200_000_000, 4_294_967_294);

    /// AWS default when no ASN is supplied
    pub const DEFAULT: Asn = Asn(64512);

    pub fn new(asn: u64) -> Result<Self, ConfigError> {
        let in_range = |(lo, hi): (u64, u64)| asn >= lo && asn <= hi;
        if !in_range(Self::PRIVATE_16) && !in_range(Self::PRIVATE_32) {
            return Err(ConfigError::InvalidAsn(asn));
        }
        Ok(Self(asn))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Default for Asn {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Asn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for Asn {
    type Error = ConfigError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Asn> for u64 {
    fn from(value: Asn) -> Self {
        value.0
    }
}
