//! The Hetzner Cloud provider: `hcloud_network_subnet` plus the location
//! data sources.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::api::HcloudApi;
use crate::config::{ProviderConfig, Settings};
use crate::context::Context;
use crate::error::ProviderError;
use crate::location;
use crate::network::subnet::{self, CreateError, SubnetSpec, SubnetState};
use crate::network::{plan_subnet, subnet_schema, validate_subnet_config, SUBNET_RESOURCE_TYPE};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Provider backed by an injected API client.
///
/// The client's lifecycle belongs to the caller; the provider only holds a
/// shared handle to it.
pub struct HcloudProvider<C: HcloudApi> {
    client: Arc<C>,
    settings: RwLock<Settings>,
}

impl<C: HcloudApi> HcloudProvider<C> {
    /// Create a provider with default settings.
    pub fn new(client: Arc<C>) -> Self {
        Self::with_settings(client, Settings::default())
    }

    /// Create a provider with explicit settings.
    pub fn with_settings(client: Arc<C>, settings: Settings) -> Self {
        Self {
            client,
            settings: RwLock::new(settings),
        }
    }

    /// The API client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The settings currently in effect.
    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }
}

fn ensure_subnet(resource_type: &str) -> Result<(), ProviderError> {
    if resource_type == SUBNET_RESOURCE_TYPE {
        Ok(())
    } else {
        Err(ProviderError::UnknownResource(resource_type.to_string()))
    }
}

fn state_id(state: &Value) -> Option<&str> {
    state.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())
}

fn to_state(state: Option<SubnetState>) -> Result<Value, ProviderError> {
    match state {
        Some(state) => Ok(serde_json::to_value(state)?),
        None => Ok(Value::Null),
    }
}

#[async_trait::async_trait]
impl<C: HcloudApi> ProviderService for HcloudProvider<C> {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(ProviderConfig::schema())
            .with_resource(SUBNET_RESOURCE_TYPE, subnet_schema())
            .with_data_source(location::DATA_SOURCE_TYPE, location::schema())
            .with_data_source(location::DATA_SOURCE_LIST_TYPE, location::list_schema())
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        match ProviderConfig::from_value(config) {
            Ok(config) => Ok(config.validate()),
            Err(e) => Ok(vec![Diagnostic::error("Invalid provider configuration").with_detail(e.to_string())]),
        }
    }

    #[instrument(skip(self, config))]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!("Configure called");
        let config = ProviderConfig::from_value(config)
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        let diagnostics = config.validate();
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(diagnostics = diagnostics.len(), "Configure completed with errors");
            return Ok(diagnostics);
        }

        let settings = config.settings();
        info!(
            max_attempts = settings.retry.max_attempts,
            poll_interval_ms = settings.poll_interval.as_millis() as u64,
            "Configure completed successfully"
        );
        *self.settings.write().await = settings;
        Ok(diagnostics)
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        ensure_subnet(resource_type)?;
        Ok(validate_subnet_config(&config))
    }

    #[instrument(skip(self, prior_state, proposed_state, _config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        ensure_subnet(resource_type)?;
        let result = plan_subnet(prior_state.as_ref(), &proposed_state);
        info!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "Plan completed"
        );
        Ok(result)
    }

    #[instrument(skip(self, ctx, planned_state))]
    async fn create(
        &self,
        ctx: &Context,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        ensure_subnet(resource_type)?;
        let planned: SubnetState = serde_json::from_value(planned_state)?;
        let spec = SubnetSpec::try_from(&planned)?;
        let settings = self.settings().await;

        match subnet::create(ctx, self.client.as_ref(), &settings, &spec).await {
            Ok(state) => {
                info!(id = ?state.id, "Create completed");
                to_state(Some(state))
            }
            Err(CreateError::Incomplete { id, source }) => {
                error!(id = %id, error = %source, "Subnet created but not ready");
                Err(ProviderError::Incomplete {
                    id: id.to_string(),
                    source: Box::new(source),
                })
            }
            Err(CreateError::NotSubmitted(e)) => {
                error!(error = %e, "Create failed");
                Err(e)
            }
        }
    }

    #[instrument(skip(self, ctx, current_state))]
    async fn read(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        ensure_subnet(resource_type)?;
        let Some(id) = state_id(&current_state) else {
            return Ok(Value::Null);
        };
        to_state(subnet::read(ctx, self.client.as_ref(), id).await?)
    }

    async fn update(
        &self,
        _ctx: &Context,
        resource_type: &str,
        _prior_state: Value,
        _planned_state: Value,
    ) -> Result<Value, ProviderError> {
        ensure_subnet(resource_type)?;
        Err(ProviderError::Unimplemented(format!(
            "{} cannot be updated in place; all attributes force replacement",
            resource_type
        )))
    }

    #[instrument(skip(self, ctx, current_state))]
    async fn delete(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        ensure_subnet(resource_type)?;
        let Some(id) = state_id(&current_state) else {
            debug!("Delete called without id, nothing to do");
            return Ok(());
        };
        let settings = self.settings().await;
        subnet::delete(ctx, self.client.as_ref(), &settings, id).await?;
        info!(id, "Delete completed");
        Ok(())
    }

    #[instrument(skip(self, ctx))]
    async fn import_resource(
        &self,
        ctx: &Context,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        ensure_subnet(resource_type)?;
        match subnet::read(ctx, self.client.as_ref(), id).await? {
            Some(state) => Ok(vec![ImportedResource::new(
                resource_type,
                serde_json::to_value(state)?,
            )]),
            None => Err(ProviderError::NotFound(format!("network subnet {} not found", id))),
        }
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        match data_source_type {
            location::DATA_SOURCE_TYPE => Ok(location::validate_config(&config)),
            location::DATA_SOURCE_LIST_TYPE => Ok(vec![]),
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    #[instrument(skip(self, ctx, config))]
    async fn read_data_source(
        &self,
        ctx: &Context,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client.as_ref();
        let data = match data_source_type {
            location::DATA_SOURCE_TYPE => serde_json::to_value(location::read(ctx, client, &config).await?)?,
            location::DATA_SOURCE_LIST_TYPE => serde_json::to_value(location::read_list(ctx, client).await?)?,
            other => {
                return Err(ProviderError::UnknownResource(format!(
                    "Unknown data source type: {}",
                    other
                )))
            }
        };
        debug!("ReadDataSource completed");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ActionError, ApiError, ErrorCode, SubnetKind};
    use crate::retry::RetryPolicy;
    use crate::testing::{
        assert_error_contains, assert_no_errors, assert_plan_no_changes, MockHcloud, ProviderTester,
    };
    use serde_json::json;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn fast_provider(mock: Arc<MockHcloud>) -> HcloudProvider<MockHcloud> {
        HcloudProvider::with_settings(
            mock,
            Settings {
                poll_interval: Duration::from_millis(1),
                retry: RetryPolicy {
                    max_attempts: 2,
                    initial_delay: Duration::from_millis(1),
                    max_delay: Duration::from_millis(2),
                    backoff_multiplier: 2.0,
                },
            },
        )
    }

    fn subnet_config() -> Value {
        json!({
            "network_id": 123,
            "type": "cloud",
            "network_zone": "eu-central",
            "ip_range": "192.168.100.1/32"
        })
    }

    #[test]
    fn test_metadata() {
        let tester = ProviderTester::new(HcloudProvider::new(Arc::new(MockHcloud::new())));
        assert_eq!(tester.resource_types(), vec!["hcloud_network_subnet"]);
        assert_eq!(
            tester.data_source_types(),
            vec!["hcloud_location", "hcloud_locations"]
        );
    }

    #[tokio::test]
    async fn test_configure() {
        let provider = HcloudProvider::new(Arc::new(MockHcloud::new()));
        let diagnostics = assert_ok!(
            provider
                .configure(json!({"max_retries": 1, "poll_interval_ms": 10}))
                .await
        );
        assert_no_errors(&diagnostics);

        let settings = provider.settings().await;
        assert_eq!(settings.retry.max_attempts, 1);
        assert_eq!(settings.poll_interval, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_values() {
        let provider = HcloudProvider::new(Arc::new(MockHcloud::new()));
        let diagnostics = provider
            .configure(json!({"poll_interval_ms": 0}))
            .await
            .unwrap();
        assert_error_contains(&diagnostics, "Poll interval");
        assert_eq!(provider.settings().await, Settings::default());

        let err = assert_err!(provider.configure(json!({"token": "x"})).await);
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_subnet_lifecycle() {
        let mock = Arc::new(MockHcloud::new());
        mock.add_network(123, "192.168.0.0/16");
        let tester = ProviderTester::new(fast_provider(mock.clone()));

        let state = tester
            .lifecycle_create("hcloud_network_subnet", subnet_config())
            .await
            .unwrap();
        assert_eq!(state["id"], "123-192.168.100.1/32");
        assert_eq!(state["gateway"], "192.168.0.1");
        assert_eq!(state["type"], "cloud");

        tester
            .lifecycle_delete("hcloud_network_subnet", state.clone())
            .await
            .unwrap();
        assert!(mock.network(123).unwrap().subnets.is_empty());

        let gone = tester.read("hcloud_network_subnet", state).await.unwrap();
        assert!(gone.is_null());
    }

    #[tokio::test]
    async fn test_ignored_vswitch_id_is_stable_across_plans() {
        let mock = Arc::new(MockHcloud::new());
        mock.add_network(123, "192.168.0.0/16");
        let tester = ProviderTester::new(fast_provider(mock));

        let mut config = subnet_config();
        config["vswitch_id"] = json!(1000);
        let state = tester
            .lifecycle_create("hcloud_network_subnet", config.clone())
            .await
            .unwrap();
        assert!(state["vswitch_id"].is_null());

        let plan = tester
            .plan_update("hcloud_network_subnet", state, config)
            .await
            .unwrap();
        assert_plan_no_changes(&plan);
        assert!(!plan.requires_replace);
    }

    #[tokio::test]
    async fn test_create_surfaces_fatal_error() {
        let mock = Arc::new(MockHcloud::new());
        mock.fail_add_subnet(ApiError::new(ErrorCode::NotFound, "network not found"));
        let tester = ProviderTester::new(fast_provider(mock.clone()));

        let err = tester
            .create("hcloud_network_subnet", subnet_config())
            .await
            .unwrap_err();
        assert!(err.is_api_code(&ErrorCode::NotFound));
        assert_eq!(mock.calls().add_subnet, 1);
    }

    #[tokio::test]
    async fn test_create_action_failure_returns_id() {
        let mock = Arc::new(MockHcloud::new());
        mock.add_network(1, "10.0.0.0/16");
        mock.fail_next_action(ActionError {
            code: "action_failed".to_string(),
            message: "boom".to_string(),
        });
        let tester = ProviderTester::new(fast_provider(mock.clone()));

        let mut config = subnet_config();
        config["network_id"] = json!(1);
        config["ip_range"] = json!("10.0.4.0/24");
        let err = assert_err!(tester.create("hcloud_network_subnet", config).await);

        assert_eq!(err.incomplete_id(), Some("1-10.0.4.0/24"));
        assert!(err.to_string().contains("1-10.0.4.0/24"));
        match err {
            ProviderError::Incomplete { source, .. } => {
                assert!(matches!(*source, ProviderError::ActionFailed { .. }))
            }
            other => panic!("unexpected error: {other}"),
        }

        let imported = tester
            .import_resource("hcloud_network_subnet", "1-10.0.4.0/24")
            .await
            .unwrap();
        assert_eq!(imported[0].state["ip_range"], "10.0.4.0/24");
    }

    #[tokio::test]
    async fn test_create_requires_vswitch_id() {
        let tester = ProviderTester::new(fast_provider(Arc::new(MockHcloud::new())));
        let mut config = subnet_config();
        config["type"] = json!("vswitch");

        let err = tester
            .create("hcloud_network_subnet", config)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_import() {
        let mock = Arc::new(MockHcloud::new());
        mock.add_network(7, "10.0.0.0/8");
        mock.add_existing_subnet(7, SubnetKind::VSwitch { vswitch_id: 1000 }, "10.1.0.0/24");
        let tester = ProviderTester::new(fast_provider(mock));

        let imported = tester
            .import_resource("hcloud_network_subnet", "7-10.1.0.0/24")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].state["vswitch_id"], 1000);
        assert_eq!(imported[0].state["network_id"], 7);

        let err = tester
            .import_resource("hcloud_network_subnet", "7-10.2.0.0/24")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_is_rejected() {
        let tester = ProviderTester::new(fast_provider(Arc::new(MockHcloud::new())));
        let err = tester
            .update("hcloud_network_subnet", subnet_config(), subnet_config())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unimplemented(_)));
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let tester = ProviderTester::new(fast_provider(Arc::new(MockHcloud::new())));
        let err = tester.read("hcloud_server", json!({"id": "1"})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_validate_resource_config() {
        let tester = ProviderTester::new(fast_provider(Arc::new(MockHcloud::new())));
        assert_ok!(
            tester
                .validate_resource_config("hcloud_network_subnet", subnet_config())
                .await
        );

        let mut config = subnet_config();
        config["ip_range"] = json!("not-a-cidr");
        assert_err!(
            tester
                .validate_resource_config("hcloud_network_subnet", config)
                .await
        );
    }

    #[tokio::test]
    async fn test_location_data_sources() {
        let tester = ProviderTester::new(fast_provider(Arc::new(MockHcloud::with_default_locations())));

        let location = tester
            .read_data_source("hcloud_location", json!({"name": "nbg1"}))
            .await
            .unwrap();
        assert_eq!(location["id"], 2);
        assert_eq!(location["city"], "Nuremberg");

        let list = tester
            .read_data_source("hcloud_locations", json!({}))
            .await
            .unwrap();
        assert_eq!(list["locations"].as_array().unwrap().len(), 3);

        assert!(tester
            .validate_data_source_config("hcloud_location", json!({}))
            .await
            .is_err());
    }
}
