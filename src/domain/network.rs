// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Host bits set in {0} (expected network address {1})")]
    HostBitsSet(String, String),
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - Address is the network address (no host bits set)
///
/// # Examples
///
/// ```rust
/// use tgw_topology::domain::Ipv4Network;
///
/// let net: Ipv4Network = "10.10.0.0/24".parse().unwrap();
/// assert_eq!(net.prefix_len(), 24);
/// assert_eq!(net.size(), 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Network {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Network {
    /// The default route, `0.0.0.0/0`
    pub const DEFAULT_ROUTE: Ipv4Network = Ipv4Network {
        address: Ipv4Addr::UNSPECIFIED,
        prefix_len: 0,
    };

    /// Create a network, rejecting addresses with host bits set
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, NetworkError> {
        if prefix_len > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_len));
        }

        let network = Ipv4Addr::from(u32::from(address) & Self::mask(prefix_len));
        if network != address {
            return Err(NetworkError::HostBitsSet(
                format!("{}/{}", address, prefix_len),
                format!("{}/{}", network, prefix_len),
            ));
        }

        Ok(Self {
            address,
            prefix_len,
        })
    }

    fn mask(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_len))
        }
    }

    /// Network address
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len))
    }

    fn first(&self) -> u64 {
        u64::from(u32::from(self.address))
    }

    fn last(&self) -> u64 {
        self.first() + self.size() - 1
    }

    /// Whether `other` lies entirely inside this block
    pub fn contains(&self, other: &Ipv4Network) -> bool {
        other.first() >= self.first() && other.last() <= self.last()
    }

    /// Whether the two blocks share any address
    pub fn overlaps(&self, other: &Ipv4Network) -> bool {
        self.first() <= other.last() && other.first() <= self.last()
    }

    /// Number of `/prefix_len` blocks this network splits into
    pub fn partitions(&self, prefix_len: u8) -> Option<u64> {
        if prefix_len < self.prefix_len || prefix_len > 32 {
            return None;
        }
        Some(1u64 << (prefix_len - self.prefix_len))
    }

    /// The `/prefix_len` block starting `offset` addresses into this network
    ///
    /// Returns `None` when the block is misaligned or falls outside.
    pub fn sub_block(&self, offset: u64, prefix_len: u8) -> Option<Ipv4Network> {
        self.partitions(prefix_len)?;
        let block = 1u64 << (32 - u32::from(prefix_len));
        if offset % block != 0 || offset + block > self.size() {
            return None;
        }
        let start = u32::try_from(self.first() + offset).ok()?;
        Ipv4Network::new(Ipv4Addr::from(start), prefix_len).ok()
    }
}

impl fmt::Display for Ipv4Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Ipv4Network {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(s.to_string()))?;

        let address = addr_str
            .parse::<Ipv4Addr>()
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(s.to_string()))?;

        Self::new(address, prefix_len)
    }
}

impl Serialize for Ipv4Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ipv4Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
