//! The Hetzner Cloud API surface consumed by the provider.
//!
//! HTTP transport, authentication and pagination live behind [`HcloudApi`].
//! The provider receives an implementation explicitly (as `Arc<C>`) and never
//! builds or caches a client of its own.

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::Context;

/// Structured error code returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The resource was modified concurrently (optimistic locking).
    Conflict,
    /// The vSwitch is still held by another subnet.
    VSwitchAlreadyUsed,
    /// The resource does not exist.
    NotFound,
    /// The resource is locked by a running action.
    Locked,
    /// Generic service error; the message carries the detail.
    ServiceError,
    /// Any other code, kept verbatim.
    Other(String),
}

impl ErrorCode {
    /// The wire representation of the code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Conflict => "conflict",
            Self::VSwitchAlreadyUsed => "vswitch_id_already_used",
            Self::NotFound => "not_found",
            Self::Locked => "locked",
            Self::ServiceError => "service_error",
            Self::Other(code) => code,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "conflict" => Self::Conflict,
            "vswitch_id_already_used" => Self::VSwitchAlreadyUsed,
            "not_found" => Self::NotFound,
            "locked" => Self::Locked,
            "service_error" => Self::ServiceError,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error response from the API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({code})")]
pub struct ApiError {
    /// The structured error code.
    pub code: ErrorCode,
    /// Human-readable message from the API.
    pub message: String,
}

impl ApiError {
    /// Create an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Whether the error carries `code`.
    pub fn is(&self, code: &ErrorCode) -> bool {
        &self.code == code
    }

    /// Whether this is a `service_error` complaining about resources still
    /// attached to the network.
    ///
    /// These clear up on their own while sibling resources finish deleting.
    pub fn is_attached_resources(&self) -> bool {
        self.code == ErrorCode::ServiceError
            && (self.message.contains("servers are attached")
                || self.message.contains("network has attached resources"))
    }
}

/// The type of a network subnet.
///
/// `vswitch_id` only exists for vSwitch subnets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubnetKind {
    /// Subnet for cloud servers.
    Cloud,
    /// Legacy subnet type for servers.
    Server,
    /// Subnet coupled to a Robot vSwitch.
    VSwitch {
        /// ID of the coupled vSwitch.
        vswitch_id: i64,
    },
}

impl SubnetKind {
    /// All accepted type names.
    pub const NAMES: [&'static str; 3] = ["cloud", "server", "vswitch"];

    /// Build a kind from its type name and the optional vSwitch ID.
    ///
    /// Returns `None` for unknown names or a `vswitch` type without an ID.
    /// A vSwitch ID passed with any other type is ignored.
    pub fn from_parts(name: &str, vswitch_id: Option<i64>) -> Option<Self> {
        match name {
            "cloud" => Some(Self::Cloud),
            "server" => Some(Self::Server),
            "vswitch" => vswitch_id.map(|vswitch_id| Self::VSwitch { vswitch_id }),
            _ => None,
        }
    }

    /// The type name as used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Server => "server",
            Self::VSwitch { .. } => "vswitch",
        }
    }

    /// The coupled vSwitch, if any.
    pub fn vswitch_id(&self) -> Option<i64> {
        match self {
            Self::VSwitch { vswitch_id } => Some(*vswitch_id),
            _ => None,
        }
    }
}

impl fmt::Display for SubnetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subnet as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSubnet {
    /// Subnet type.
    pub kind: SubnetKind,
    /// Network zone the subnet lives in.
    pub network_zone: String,
    /// IP range of the subnet.
    pub ip_range: IpNet,
    /// Gateway address, assigned by the API.
    pub gateway: Option<IpAddr>,
}

/// A private network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    /// Network ID.
    pub id: i64,
    /// Network name.
    pub name: String,
    /// IP range of the whole network.
    pub ip_range: Option<IpNet>,
    /// Subnets of the network.
    pub subnets: Vec<NetworkSubnet>,
}

/// Request body for adding a subnet to a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSubnetOpts {
    /// Subnet type (and vSwitch for `vswitch`).
    pub kind: SubnetKind,
    /// Network zone of the new subnet.
    pub network_zone: String,
    /// IP range of the new subnet.
    pub ip_range: IpNet,
}

/// State of an asynchronous action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Still in progress.
    Running,
    /// Finished successfully.
    Success,
    /// Finished with an error.
    Error,
}

/// Error details of a failed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

/// An asynchronous remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Action ID.
    pub id: i64,
    /// Command the action executes, e.g. `add_subnet`.
    pub command: String,
    /// Current status.
    pub status: ActionStatus,
    /// Progress in percent.
    pub progress: u8,
    /// Set when `status` is `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

/// A datacenter location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Location ID.
    pub id: i64,
    /// Unique name, e.g. `fsn1`.
    pub name: String,
    /// Description of the location.
    pub description: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    /// Closest city.
    pub city: String,
    /// Latitude of the closest city.
    pub latitude: f64,
    /// Longitude of the closest city.
    pub longitude: f64,
    /// Network zone the location belongs to.
    pub network_zone: String,
}

/// The Hetzner Cloud operations used by the provider.
///
/// Lookups return `Ok(None)` when the API answers "not found"; any other
/// failure is an [`ApiError`].
#[async_trait::async_trait]
pub trait HcloudApi: Send + Sync + 'static {
    /// Fetch a network by ID.
    async fn get_network_by_id(&self, ctx: &Context, id: i64) -> Result<Option<Network>, ApiError>;

    /// Add a subnet to the network `network_id`.
    async fn add_subnet(
        &self,
        ctx: &Context,
        network_id: i64,
        opts: AddSubnetOpts,
    ) -> Result<Action, ApiError>;

    /// Remove `subnet` from `network`.
    async fn delete_subnet(
        &self,
        ctx: &Context,
        network: &Network,
        subnet: &NetworkSubnet,
    ) -> Result<Action, ApiError>;

    /// Fetch the current state of an action.
    async fn get_action_by_id(&self, ctx: &Context, id: i64) -> Result<Option<Action>, ApiError>;

    /// Fetch a location by ID.
    async fn get_location_by_id(&self, ctx: &Context, id: i64)
        -> Result<Option<Location>, ApiError>;

    /// Fetch a location by name.
    async fn get_location_by_name(
        &self,
        ctx: &Context,
        name: &str,
    ) -> Result<Option<Location>, ApiError>;

    /// Fetch all locations.
    async fn all_locations(&self, ctx: &Context) -> Result<Vec<Location>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_names() {
        for code in [
            ErrorCode::Conflict,
            ErrorCode::VSwitchAlreadyUsed,
            ErrorCode::NotFound,
            ErrorCode::Locked,
            ErrorCode::ServiceError,
        ] {
            assert_eq!(ErrorCode::from(code.as_str()), code);
        }
        assert_eq!(
            ErrorCode::from("rate_limit_exceeded"),
            ErrorCode::Other("rate_limit_exceeded".to_string())
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::new(ErrorCode::Conflict, "network changed");
        assert_eq!(err.to_string(), "network changed (conflict)");
        assert!(err.is(&ErrorCode::Conflict));
        assert!(!err.is(&ErrorCode::Locked));
    }

    #[test]
    fn test_attached_resources_detection() {
        let attached = ApiError::new(ErrorCode::ServiceError, "network has attached resources");
        assert!(attached.is_attached_resources());

        let servers = ApiError::new(ErrorCode::ServiceError, "cannot delete: servers are attached");
        assert!(servers.is_attached_resources());

        let other = ApiError::new(ErrorCode::ServiceError, "internal failure");
        assert!(!other.is_attached_resources());

        let wrong_code = ApiError::new(ErrorCode::Conflict, "network has attached resources");
        assert!(!wrong_code.is_attached_resources());
    }

    #[test]
    fn test_subnet_kind_from_parts() {
        assert_eq!(SubnetKind::from_parts("cloud", None), Some(SubnetKind::Cloud));
        assert_eq!(SubnetKind::from_parts("server", Some(7)), Some(SubnetKind::Server));
        assert_eq!(
            SubnetKind::from_parts("vswitch", Some(42)),
            Some(SubnetKind::VSwitch { vswitch_id: 42 })
        );
        assert_eq!(SubnetKind::from_parts("vswitch", None), None);
        assert_eq!(SubnetKind::from_parts("robot", None), None);
    }

    #[test]
    fn test_subnet_kind_vswitch_id() {
        assert_eq!(SubnetKind::VSwitch { vswitch_id: 3 }.vswitch_id(), Some(3));
        assert_eq!(SubnetKind::Cloud.vswitch_id(), None);
        assert_eq!(SubnetKind::VSwitch { vswitch_id: 3 }.to_string(), "vswitch");
    }

    #[test]
    fn test_action_deserialize() {
        let action: Action = serde_json::from_value(serde_json::json!({
            "id": 1,
            "command": "add_subnet",
            "status": "error",
            "progress": 100,
            "error": {"code": "action_failed", "message": "boom"}
        }))
        .unwrap();
        assert_eq!(action.status, ActionStatus::Error);
        assert_eq!(action.error.unwrap().code, "action_failed");
    }
}
