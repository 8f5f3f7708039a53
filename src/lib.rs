//! Hetzner Cloud network provider
//!
//! This crate implements the `hcloud_network_subnet` resource and the
//! `hcloud_location` / `hcloud_locations` data sources for Hemmer.
//!
//! # Overview
//!
//! - **Composite IDs**: subnets have no remote ID of their own and are
//!   addressed as `<network id>-<ip range>` ([`network::subnet_id`])
//! - **Subnet lifecycle**: create and delete run in bounded retry loops that
//!   tolerate the API's transient lock errors, then wait for the remote
//!   action to finish ([`network::subnet`])
//! - **Locations**: lookup by ID or name, and the full listing ([`location`])
//! - **ProviderService**: the schema, plan and CRUD surface a host drives
//! - **Logging**: `tracing` to stderr, filtered by `RUST_LOG`
//!
//! The HTTP client is not part of this crate. Callers supply an
//! implementation of [`HcloudApi`], and every remote operation takes a
//! [`Context`] carrying cancellation and an optional deadline.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use hcloud_network_provider::{init_logging, Context, HcloudProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = HcloudProvider::new(Arc::new(MyHcloudClient::from_env()?));
//!     provider.configure(json!({"max_retries": 5})).await?;
//!
//!     let ctx = Context::background().with_timeout(std::time::Duration::from_secs(300));
//!     let state = provider
//!         .create(&ctx, "hcloud_network_subnet", json!({
//!             "network_id": 123,
//!             "type": "cloud",
//!             "network_zone": "eu-central",
//!             "ip_range": "10.0.1.0/24"
//!         }))
//!         .await?;
//!     tracing::info!(id = %state["id"], "Subnet ready");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod location;
pub mod logging;
pub mod network;
pub mod provider;
pub mod retry;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use api::{ApiError, ErrorCode, HcloudApi};
pub use config::{ProviderConfig, Settings};
pub use context::Context;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use network::subnet_id::SubnetId;
pub use provider::HcloudProvider;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
