//! Composite identifiers for network subnets.
//!
//! Subnets have no ID of their own; they are addressed by their network and
//! IP range, encoded as `<network id>-<ip range>`:
//!
//! ```
//! use hcloud_network_provider::network::subnet_id::SubnetId;
//!
//! let id: SubnetId = "123-192.168.100.1/32".parse().unwrap();
//! assert_eq!(id.network_id, 123);
//! assert_eq!(id.to_string(), "123-192.168.100.1/32");
//! ```

use std::fmt;
use std::str::FromStr;

use ipnet::IpNet;
use thiserror::Error;

/// The string is not a valid composite subnet ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid network subnet id")]
pub struct InvalidSubnetId;

/// A subnet addressed by its network and IP range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetId {
    /// ID of the parent network.
    pub network_id: i64,
    /// IP range of the subnet.
    pub ip_range: IpNet,
}

impl SubnetId {
    /// Create an ID for the subnet `ip_range` of network `network_id`.
    pub fn new(network_id: i64, ip_range: IpNet) -> Self {
        Self {
            network_id,
            ip_range,
        }
    }
}

impl fmt::Display for SubnetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.network_id, self.ip_range)
    }
}

impl FromStr for SubnetId {
    type Err = InvalidSubnetId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (network_id, ip_range) = decode(s)?;
        Ok(Self::new(network_id, ip_range))
    }
}

/// Encode a network ID and IP range into a composite ID.
pub fn encode(network_id: i64, ip_range: &IpNet) -> String {
    format!("{}-{}", network_id, ip_range)
}

/// Decode a composite ID into its network ID and IP range.
///
/// Only the first `-` separates the parts. The network ID must be a plain
/// decimal number and the remainder a CIDR block.
pub fn decode(s: &str) -> Result<(i64, IpNet), InvalidSubnetId> {
    let (network_id, ip_range) = s.split_once('-').ok_or(InvalidSubnetId)?;

    if network_id.is_empty() || !network_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidSubnetId);
    }
    let network_id = network_id.parse::<i64>().map_err(|_| InvalidSubnetId)?;
    let ip_range = parse_cidr(ip_range).ok_or(InvalidSubnetId)?;

    Ok((network_id, ip_range))
}

/// Parse a CIDR block, reducing the address to the network address.
///
/// `10.0.0.5/24` parses as `10.0.0.0/24`.
pub fn parse_cidr(s: &str) -> Option<IpNet> {
    s.parse::<IpNet>().ok().map(|net| net.trunc())
}
