//! Testing utilities for the provider.
//!
//! [`ProviderTester`] drives a `ProviderService` directly, and [`MockHcloud`]
//! is an in-memory [`HcloudApi`] with scriptable failures.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hcloud_network_provider::testing::{MockHcloud, ProviderTester};
//! use hcloud_network_provider::HcloudProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_subnet() {
//!     let mock = Arc::new(MockHcloud::new());
//!     mock.add_network(1, "10.0.0.0/16");
//!     let tester = ProviderTester::new(HcloudProvider::new(mock));
//!
//!     let state = tester.lifecycle_create("hcloud_network_subnet", json!({
//!         "network_id": 1,
//!         "type": "cloud",
//!         "network_zone": "eu-central",
//!         "ip_range": "10.0.1.0/24"
//!     })).await.unwrap();
//!
//!     assert_eq!(state["id"], "1-10.0.1.0/24");
//! }
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard};

use ipnet::IpNet;
use serde_json::Value;

use crate::api::{
    Action, ActionError, ActionStatus, AddSubnetOpts, ApiError, ErrorCode, HcloudApi, Location,
    Network, NetworkSubnet, SubnetKind,
};
use crate::context::Context;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// A test harness for provider implementations.
///
/// Every remote operation runs under the tester's [`Context`], which is
/// [`Context::background`] unless replaced with [`ProviderTester::with_context`].
pub struct ProviderTester<P: ProviderService> {
    provider: P,
    ctx: Context,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            ctx: Context::background(),
        }
    }

    /// Run operations under `ctx` instead of a background context.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The context operations run under.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration.
    ///
    /// Returns `Err` with the error diagnostics if there are any.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan a change to an existing resource.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .create(&self.ctx, resource_type, planned_state)
            .await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read(&self.ctx, resource_type, current_state)
            .await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(&self.ctx, resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider
            .delete(&self.ctx, resource_type, current_state)
            .await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider
            .import_resource(&self.ctx, resource_type, id)
            .await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source configuration.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(&self.ctx, data_source_type, config)
            .await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a full create lifecycle: plan → create → read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self.plan_create(resource_type, config).await?;
        let created_state = self
            .create(resource_type, plan_result.planned_state)
            .await?;
        self.read(resource_type, created_state).await
    }

    /// Run a change lifecycle: plan, then replace or update in place.
    ///
    /// A plan that requires replacement deletes the prior resource before
    /// creating the new one. Returns the final state after read.
    pub async fn lifecycle_change(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;

        if plan_result.changes.is_empty() {
            return self.read(resource_type, prior_state).await;
        }

        let new_state = if plan_result.requires_replace {
            self.delete(resource_type, prior_state).await?;
            self.create(resource_type, plan_result.planned_state).await?
        } else {
            self.update(resource_type, prior_state, plan_result.planned_state)
                .await?
        };

        self.read(resource_type, new_state).await
    }

    /// Run a full delete lifecycle: plan → delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let _ = self
            .plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan result indicates the resource will be created.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(
        !plan.requires_replace,
        "Expected plan to create, not replace"
    );
}

/// Assert that a plan result indicates no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan requires resource replacement.
///
/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan has a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    let has_errors = diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error));

    assert!(has_errors, "Expected at least one error, but got none");
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| d.is_error() && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

// =========================================================================
// Mock API
// =========================================================================

/// Number of calls [`MockHcloud`] received, per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MockCalls {
    /// `get_network_by_id` calls.
    pub get_network: usize,
    /// `add_subnet` calls.
    pub add_subnet: usize,
    /// `delete_subnet` calls.
    pub delete_subnet: usize,
    /// `get_action_by_id` calls.
    pub get_action: usize,
    /// Location lookups of any kind.
    pub get_location: usize,
}

#[derive(Debug)]
struct ScriptedAction {
    action: Action,
    running_polls: u32,
    error: Option<ActionError>,
}

#[derive(Debug, Default)]
struct MockState {
    networks: BTreeMap<i64, Network>,
    locations: Vec<Location>,
    actions: HashMap<i64, ScriptedAction>,
    next_action_id: i64,
    get_network_failures: VecDeque<ApiError>,
    add_subnet_failures: VecDeque<ApiError>,
    delete_subnet_failures: VecDeque<ApiError>,
    next_action_error: Option<ActionError>,
    calls: MockCalls,
}

impl MockState {
    /// Record a new action. Finished immediately unless a failure is queued.
    fn start_action(&mut self, command: &str) -> Action {
        self.next_action_id += 1;
        let mut action = Action {
            id: self.next_action_id,
            command: command.to_string(),
            status: ActionStatus::Success,
            progress: 100,
            error: None,
        };

        if let Some(error) = self.next_action_error.take() {
            action.status = ActionStatus::Running;
            action.progress = 0;
            self.actions.insert(
                action.id,
                ScriptedAction {
                    action: action.clone(),
                    running_polls: 0,
                    error: Some(error),
                },
            );
        }
        action
    }
}

/// In-memory Hetzner Cloud API.
///
/// Subnet changes apply immediately. Failures queued with the `fail_*`
/// methods are returned in order before the mock behaves normally again.
#[derive(Debug, Default)]
pub struct MockHcloud {
    state: Mutex<MockState>,
}

impl MockHcloud {
    /// An empty mock: no networks, no locations.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock serving [`MockHcloud::default_locations`].
    pub fn with_default_locations() -> Self {
        let mock = Self::new();
        mock.state().locations = Self::default_locations();
        mock
    }

    /// A small set of real locations, ordered by ID.
    pub fn default_locations() -> Vec<Location> {
        vec![
            Location {
                id: 1,
                name: "fsn1".to_string(),
                description: "Falkenstein DC Park 1".to_string(),
                country: "DE".to_string(),
                city: "Falkenstein".to_string(),
                latitude: 50.47612,
                longitude: 12.370071,
                network_zone: "eu-central".to_string(),
            },
            Location {
                id: 2,
                name: "nbg1".to_string(),
                description: "Nuremberg DC Park 1".to_string(),
                country: "DE".to_string(),
                city: "Nuremberg".to_string(),
                latitude: 49.452102,
                longitude: 11.076665,
                network_zone: "eu-central".to_string(),
            },
            Location {
                id: 4,
                name: "ash".to_string(),
                description: "Ashburn, VA".to_string(),
                country: "US".to_string(),
                city: "Ashburn, VA".to_string(),
                latitude: 39.045821,
                longitude: -77.487073,
                network_zone: "us-east".to_string(),
            },
        ]
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an empty network covering `ip_range`.
    ///
    /// # Panics
    ///
    /// Panics if `ip_range` is not a CIDR.
    pub fn add_network(&self, id: i64, ip_range: &str) {
        let ip_range: IpNet = ip_range.parse().expect("network ip range");
        self.state().networks.insert(
            id,
            Network {
                id,
                name: format!("network-{}", id),
                ip_range: Some(ip_range),
                subnets: Vec::new(),
            },
        );
    }

    /// Add a subnet to an existing network, bypassing the action flow.
    ///
    /// # Panics
    ///
    /// Panics if the network is unknown or `ip_range` is not a CIDR.
    pub fn add_existing_subnet(&self, network_id: i64, kind: SubnetKind, ip_range: &str) {
        let ip_range: IpNet = ip_range.parse().expect("subnet ip range");
        let mut state = self.state();
        let network = state.networks.get_mut(&network_id).expect("network exists");
        let gateway = gateway_of(network);
        network.subnets.push(NetworkSubnet {
            kind,
            network_zone: "eu-central".to_string(),
            ip_range,
            gateway,
        });
    }

    /// Snapshot of a network.
    pub fn network(&self, id: i64) -> Option<Network> {
        self.state().networks.get(&id).cloned()
    }

    /// Fail the next `get_network_by_id` call with `err`.
    pub fn fail_get_network(&self, err: ApiError) {
        self.state().get_network_failures.push_back(err);
    }

    /// Queue a failure for `add_subnet`.
    pub fn fail_add_subnet(&self, err: ApiError) {
        self.state().add_subnet_failures.push_back(err);
    }

    /// Queue a failure for `delete_subnet`.
    pub fn fail_delete_subnet(&self, err: ApiError) {
        self.state().delete_subnet_failures.push_back(err);
    }

    /// Make the next submitted action fail on its first poll.
    pub fn fail_next_action(&self, error: ActionError) {
        self.state().next_action_error = Some(error);
    }

    /// Script action `id`: it reports `running` for `running_polls` polls,
    /// then finishes with `error`, or successfully if `None`.
    pub fn script_action(&self, id: i64, running_polls: u32, error: Option<ActionError>) {
        let action = Action {
            id,
            command: "scripted".to_string(),
            status: ActionStatus::Running,
            progress: 0,
            error: None,
        };
        self.state().actions.insert(
            id,
            ScriptedAction {
                action,
                running_polls,
                error,
            },
        );
    }

    /// Calls received so far.
    pub fn calls(&self) -> MockCalls {
        self.state().calls
    }
}

fn gateway_of(network: &Network) -> Option<IpAddr> {
    network.ip_range.and_then(|range| match range {
        IpNet::V4(v4) => v4.hosts().next().map(IpAddr::V4),
        IpNet::V6(v6) => v6.hosts().nth(1).map(IpAddr::V6),
    })
}

fn network_not_found(id: i64) -> ApiError {
    ApiError::new(ErrorCode::NotFound, format!("network with ID {} not found", id))
}

#[async_trait::async_trait]
impl HcloudApi for MockHcloud {
    async fn get_network_by_id(&self, _ctx: &Context, id: i64) -> Result<Option<Network>, ApiError> {
        let mut state = self.state();
        state.calls.get_network += 1;
        if let Some(err) = state.get_network_failures.pop_front() {
            return Err(err);
        }
        Ok(state.networks.get(&id).cloned())
    }

    async fn add_subnet(
        &self,
        _ctx: &Context,
        network_id: i64,
        opts: AddSubnetOpts,
    ) -> Result<Action, ApiError> {
        let mut state = self.state();
        state.calls.add_subnet += 1;
        if let Some(err) = state.add_subnet_failures.pop_front() {
            return Err(err);
        }

        let network = state
            .networks
            .get_mut(&network_id)
            .ok_or_else(|| network_not_found(network_id))?;
        if network.subnets.iter().any(|s| s.ip_range == opts.ip_range) {
            return Err(ApiError::new(
                ErrorCode::Other("invalid_input".to_string()),
                "ip range overlaps with existing subnet",
            ));
        }
        let gateway = gateway_of(network);
        network.subnets.push(NetworkSubnet {
            kind: opts.kind,
            network_zone: opts.network_zone,
            ip_range: opts.ip_range,
            gateway,
        });

        Ok(state.start_action("add_subnet"))
    }

    async fn delete_subnet(
        &self,
        _ctx: &Context,
        network: &Network,
        subnet: &NetworkSubnet,
    ) -> Result<Action, ApiError> {
        let mut state = self.state();
        state.calls.delete_subnet += 1;
        if let Some(err) = state.delete_subnet_failures.pop_front() {
            return Err(err);
        }

        let stored = state
            .networks
            .get_mut(&network.id)
            .ok_or_else(|| network_not_found(network.id))?;
        let before = stored.subnets.len();
        stored.subnets.retain(|s| s.ip_range != subnet.ip_range);
        if stored.subnets.len() == before {
            return Err(ApiError::new(ErrorCode::NotFound, "subnet not found"));
        }

        Ok(state.start_action("delete_subnet"))
    }

    async fn get_action_by_id(&self, _ctx: &Context, id: i64) -> Result<Option<Action>, ApiError> {
        let mut state = self.state();
        state.calls.get_action += 1;

        let Some(scripted) = state.actions.get_mut(&id) else {
            return Ok(None);
        };
        let mut action = scripted.action.clone();
        if scripted.running_polls > 0 {
            scripted.running_polls -= 1;
            return Ok(Some(action));
        }

        action.progress = 100;
        match &scripted.error {
            Some(error) => {
                action.status = ActionStatus::Error;
                action.error = Some(error.clone());
            }
            None => action.status = ActionStatus::Success,
        }
        Ok(Some(action))
    }

    async fn get_location_by_id(&self, _ctx: &Context, id: i64) -> Result<Option<Location>, ApiError> {
        let mut state = self.state();
        state.calls.get_location += 1;
        Ok(state.locations.iter().find(|l| l.id == id).cloned())
    }

    async fn get_location_by_name(
        &self,
        _ctx: &Context,
        name: &str,
    ) -> Result<Option<Location>, ApiError> {
        let mut state = self.state();
        state.calls.get_location += 1;
        Ok(state.locations.iter().find(|l| l.name == name).cloned())
    }

    async fn all_locations(&self, _ctx: &Context) -> Result<Vec<Location>, ApiError> {
        let mut state = self.state();
        state.calls.get_location += 1;
        Ok(state.locations.clone())
    }
}
