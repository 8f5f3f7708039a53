//! The provider-facing operations trait.
//!
//! [`ProviderService`] is the surface an orchestrator drives: schema,
//! validation, planning, the resource lifecycle and data source reads. States
//! travel as `serde_json::Value`. Operations that reach the remote API take a
//! [`Context`] so the caller controls cancellation and deadlines.

use serde_json::Value;

use crate::context::Context;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};

/// Trait that provider implementations must implement.
///
/// # Example
///
/// ```ignore
/// use hcloud_network_provider::{Context, HcloudProvider, ProviderService};
/// use serde_json::json;
///
/// let provider = HcloudProvider::new(client);
/// provider.configure(json!({"max_retries": 3})).await?;
///
/// let ctx = Context::background();
/// let state = provider
///     .create(&ctx, "hcloud_network_subnet", json!({
///         "network_id": 123,
///         "type": "cloud",
///         "network_zone": "eu-central",
///         "ip_range": "10.0.1.0/24",
///     }))
///     .await?;
/// assert_eq!(state["id"], "123-10.0.1.0/24");
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Return the resource and data source type names, sorted.
    /// By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        let mut resources: Vec<String> = schema.resources.keys().cloned().collect();
        let mut data_sources: Vec<String> = schema.data_sources.keys().cloned().collect();
        resources.sort();
        data_sources.sort();
        ProviderMetadata {
            resources,
            data_sources,
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    /// Returns diagnostics (errors and warnings).
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider.
    /// Returns diagnostics (errors and warnings).
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Plan changes for a resource.
    ///
    /// `prior_state` is `None` for a create; a `null` `proposed_state` plans
    /// a delete.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(
        &self,
        ctx: &Context,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Read the current state of a resource.
    ///
    /// Returns `Value::Null` when the resource no longer exists and should be
    /// removed from state.
    async fn read(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        ctx: &Context,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        ctx: &Context,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let _ = ctx;
        Err(ProviderError::Unimplemented(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source's configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(vec![])
    }

    /// Read data from an external source.
    async fn read_data_source(
        &self,
        ctx: &Context,
        data_source_type: &str,
        _config: Value,
    ) -> Result<Value, ProviderError> {
        let _ = ctx;
        Err(ProviderError::UnknownResource(format!(
            "Unknown data source type: {}",
            data_source_type
        )))
    }
}
