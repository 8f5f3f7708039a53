//! Reconciliation of `hcloud_network_subnet` resources.
//!
//! Subnets are managed through their parent network. The API serializes
//! concurrent changes to a network with `conflict` and `locked` errors, so
//! submissions run in a bounded retry loop that only tolerates those
//! transient codes; everything else aborts on the first attempt.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::action::wait_for_action;
use crate::api::{AddSubnetOpts, ApiError, ErrorCode, HcloudApi, Network, NetworkSubnet, SubnetKind};
use crate::config::Settings;
use crate::context::Context;
use crate::error::ProviderError;
use crate::network::subnet_id::{decode, parse_cidr, SubnetId};
use crate::retry::{retry, RetryError};

/// Persisted state of a subnet resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetState {
    /// Composite ID, `<network id>-<ip range>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// ID of the parent network.
    pub network_id: i64,
    /// Subnet type: `cloud`, `server` or `vswitch`.
    #[serde(rename = "type")]
    pub subnet_type: String,
    /// Network zone of the subnet.
    pub network_zone: String,
    /// IP range in CIDR notation.
    pub ip_range: String,
    /// Gateway address assigned by the API.
    #[serde(default)]
    pub gateway: Option<String>,
    /// vSwitch ID, only set for `vswitch` subnets.
    #[serde(default)]
    pub vswitch_id: Option<i64>,
}

impl SubnetState {
    /// Mirror a subnet as reported by the API.
    pub fn from_remote(network: &Network, subnet: &NetworkSubnet) -> Self {
        Self {
            id: Some(SubnetId::new(network.id, subnet.ip_range).to_string()),
            network_id: network.id,
            subnet_type: subnet.kind.as_str().to_string(),
            network_zone: subnet.network_zone.clone(),
            ip_range: subnet.ip_range.to_string(),
            gateway: subnet.gateway.map(|gateway| gateway.to_string()),
            vswitch_id: subnet.kind.vswitch_id(),
        }
    }
}

/// A validated request to create a subnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSpec {
    /// ID of the parent network.
    pub network_id: i64,
    /// Subnet type, carrying the vSwitch for `vswitch` subnets.
    pub kind: SubnetKind,
    /// Network zone of the subnet.
    pub network_zone: String,
    /// Requested IP range, parsed on submission.
    pub ip_range: String,
}

impl TryFrom<&SubnetState> for SubnetSpec {
    type Error = ProviderError;

    fn try_from(state: &SubnetState) -> Result<Self, Self::Error> {
        let kind = SubnetKind::from_parts(&state.subnet_type, state.vswitch_id).ok_or_else(|| {
            ProviderError::Validation(match state.subnet_type.as_str() {
                "vswitch" => "vswitch_id is required for subnets of type vswitch".to_string(),
                other => format!("unsupported subnet type '{}'", other),
            })
        })?;

        Ok(Self {
            network_id: state.network_id,
            kind,
            network_zone: state.network_zone.clone(),
            ip_range: state.ip_range.clone(),
        })
    }
}

/// Failure of [`create`].
#[derive(Debug, Error)]
pub enum CreateError {
    /// The subnet was never created.
    #[error(transparent)]
    NotSubmitted(ProviderError),
    /// The API accepted the subnet but its action did not finish cleanly.
    ///
    /// `id` already addresses the remote subnet and can be imported.
    #[error("subnet {id} was submitted but did not complete: {source}")]
    Incomplete {
        /// Composite ID of the submitted subnet.
        id: SubnetId,
        /// Why completion failed.
        #[source]
        source: ProviderError,
    },
}

impl CreateError {
    /// The composite ID, if the subnet reached the API.
    pub fn id(&self) -> Option<&SubnetId> {
        match self {
            Self::NotSubmitted(_) => None,
            Self::Incomplete { id, .. } => Some(id),
        }
    }

    /// The underlying error.
    pub fn into_inner(self) -> ProviderError {
        match self {
            Self::NotSubmitted(err) | Self::Incomplete { source: err, .. } => err,
        }
    }
}

/// Resolve a composite ID to its network and subnet.
///
/// Returns `Ok(None)` when the network exists but has no subnet with this IP
/// range. A missing network makes the ID itself invalid.
#[instrument(skip(ctx, client))]
pub async fn lookup<C: HcloudApi + ?Sized>(
    ctx: &Context,
    client: &C,
    id: &str,
) -> Result<Option<(Network, NetworkSubnet)>, ProviderError> {
    let (network_id, ip_range) = decode(id)?;

    let network = client
        .get_network_by_id(ctx, network_id)
        .await?
        .ok_or_else(|| ProviderError::InvalidId(format!("network {} of subnet {} does not exist", network_id, id)))?;

    let wanted = ip_range.to_string();
    let subnet = network
        .subnets
        .iter()
        .find(|subnet| subnet.ip_range.to_string() == wanted)
        .cloned();

    Ok(subnet.map(|subnet| (network, subnet)))
}

/// Create a subnet and wait for it to become ready.
///
/// The returned state is re-read from the API after the action finished.
#[instrument(skip(ctx, client, settings, spec), fields(network_id = spec.network_id, ip_range = %spec.ip_range))]
pub async fn create<C: HcloudApi + ?Sized>(
    ctx: &Context,
    client: &C,
    settings: &Settings,
    spec: &SubnetSpec,
) -> Result<SubnetState, CreateError> {
    let ip_range = parse_cidr(&spec.ip_range).ok_or_else(|| {
        CreateError::NotSubmitted(ProviderError::Validation(format!(
            "invalid CIDR address: {}",
            spec.ip_range
        )))
    })?;

    let opts = AddSubnetOpts {
        kind: spec.kind,
        network_zone: spec.network_zone.clone(),
        ip_range,
    };
    let network_id = spec.network_id;
    let opts = &opts;

    let action = retry(ctx, &settings.retry, "add_subnet", move || async move {
        client
            .add_subnet(ctx, network_id, opts.clone())
            .await
            .map_err(classify_create_error)
    })
    .await
    .map_err(CreateError::NotSubmitted)?;

    let id = SubnetId::new(network_id, ip_range);
    info!(subnet = %id, action_id = action.id, "Subnet submitted");

    let incomplete = |source| CreateError::Incomplete { id, source };

    wait_for_action(ctx, client, &action, settings.poll_interval)
        .await
        .map_err(incomplete)?;

    match read(ctx, client, &id.to_string()).await.map_err(incomplete)? {
        Some(state) => Ok(state),
        None => Err(incomplete(ProviderError::NotFound(format!(
            "network subnet {} not found after creation",
            id
        )))),
    }
}

/// Read the current state of a subnet.
///
/// Returns `Ok(None)` when the subnet is gone, including when its ID no
/// longer resolves; the caller should drop it from state.
#[instrument(skip(ctx, client))]
pub async fn read<C: HcloudApi + ?Sized>(
    ctx: &Context,
    client: &C,
    id: &str,
) -> Result<Option<SubnetState>, ProviderError> {
    match lookup(ctx, client, id).await {
        Ok(Some((network, subnet))) => Ok(Some(SubnetState::from_remote(&network, &subnet))),
        Ok(None) => {
            warn!(id, "Network subnet not found, removing from state");
            Ok(None)
        }
        Err(ProviderError::InvalidId(reason)) => {
            warn!(id, reason = %reason, "Invalid network subnet id, removing from state");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Delete a subnet.
///
/// Deleting something that is already gone succeeds. A subnet whose network
/// still has attached resources after the whole retry budget is assumed to
/// go away together with its network.
#[instrument(skip(ctx, client, settings))]
pub async fn delete<C: HcloudApi + ?Sized>(
    ctx: &Context,
    client: &C,
    settings: &Settings,
    id: &str,
) -> Result<(), ProviderError> {
    let result = retry(ctx, &settings.delete_retry(), "delete_subnet", move || async move {
        let (network, subnet) = match lookup(ctx, client, id).await {
            Ok(Some(found)) => found,
            Ok(None) => return Ok(None),
            Err(err) => return Err(RetryError::Abort(err)),
        };

        client
            .delete_subnet(ctx, &network, &subnet)
            .await
            .map(Some)
            .map_err(classify_delete_error)
    })
    .await;

    let action = match result {
        Ok(Some(action)) => action,
        Ok(None) => {
            debug!(id, "Network subnet already deleted");
            return Ok(());
        }
        Err(err) if err.is_gone() => {
            debug!(id, error = %err, "Network subnet already deleted");
            return Ok(());
        }
        Err(err) if err.is_attached_resources() => {
            warn!(
                id,
                error = %err,
                "Network subnet still has resources attached; assuming the network is being deleted, removing from state"
            );
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    wait_for_action(ctx, client, &action, settings.poll_interval).await
}

fn classify_create_error(err: ApiError) -> RetryError<ProviderError> {
    if err.is(&ErrorCode::Conflict) || err.is(&ErrorCode::VSwitchAlreadyUsed) {
        RetryError::Retry(err.into())
    } else {
        RetryError::Abort(err.into())
    }
}

fn classify_delete_error(err: ApiError) -> RetryError<ProviderError> {
    if err.is(&ErrorCode::Conflict) || err.is(&ErrorCode::Locked) || err.is_attached_resources() {
        RetryError::Retry(err.into())
    } else {
        RetryError::Abort(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ActionError;
    use crate::retry::RetryPolicy;
    use crate::testing::MockHcloud;
    use std::time::Duration;

    fn fast_settings(max_attempts: u32) -> Settings {
        Settings {
            poll_interval: Duration::from_millis(1),
            retry: RetryPolicy {
                max_attempts,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                backoff_multiplier: 2.0,
            },
        }
    }

    fn cloud_spec(network_id: i64, ip_range: &str) -> SubnetSpec {
        SubnetSpec {
            network_id,
            kind: SubnetKind::Cloud,
            network_zone: "eu-central".to_string(),
            ip_range: ip_range.to_string(),
        }
    }

    fn api_error(code: ErrorCode) -> ApiError {
        ApiError::new(code, "scripted")
    }

    #[tokio::test]
    async fn test_lookup_finds_subnet() {
        let mock = MockHcloud::new();
        mock.add_network(123, "10.0.0.0/16");
        mock.add_existing_subnet(123, SubnetKind::Cloud, "10.0.1.0/24");

        let ctx = Context::background();
        let (network, subnet) = lookup(&ctx, &mock, "123-10.0.1.0/24").await.unwrap().unwrap();
        assert_eq!(network.id, 123);
        assert_eq!(subnet.ip_range.to_string(), "10.0.1.0/24");
    }

    #[tokio::test]
    async fn test_lookup_missing_network_is_invalid_id() {
        let mock = MockHcloud::new();
        let ctx = Context::background();
        let err = lookup(&ctx, &mock, "404-10.0.1.0/24").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidId(_)));
    }

    #[tokio::test]
    async fn test_lookup_without_match_is_none() {
        let mock = MockHcloud::new();
        mock.add_network(123, "10.0.0.0/16");
        mock.add_existing_subnet(123, SubnetKind::Cloud, "10.0.1.0/24");

        let ctx = Context::background();
        assert!(lookup(&ctx, &mock, "123-10.0.2.0/24").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_malformed_id() {
        let mock = MockHcloud::new();
        let ctx = Context::background();
        for id in ["", "123", "abc-10.0.0.0/24", "123-not-a-cidr"] {
            let err = lookup(&ctx, &mock, id).await.unwrap_err();
            assert!(matches!(err, ProviderError::InvalidId(_)), "id {id:?}");
        }
        assert_eq!(mock.calls().get_network, 0);
    }

    #[tokio::test]
    async fn test_lookup_propagates_fetch_error() {
        let mock = MockHcloud::new();
        mock.fail_get_network(api_error(ErrorCode::Other("unavailable".to_string())));

        let ctx = Context::background();
        let err = lookup(&ctx, &mock, "1-10.0.0.0/24").await.unwrap_err();
        assert!(err.is_api_code(&ErrorCode::Other("unavailable".to_string())));
    }

    #[tokio::test]
    async fn test_create() {
        let mock = MockHcloud::new();
        mock.add_network(123, "10.0.0.0/16");

        let ctx = Context::background();
        let state = create(&ctx, &mock, &fast_settings(5), &cloud_spec(123, "10.0.1.0/24"))
            .await
            .unwrap();

        assert_eq!(state.id.as_deref(), Some("123-10.0.1.0/24"));
        assert_eq!(state.subnet_type, "cloud");
        assert_eq!(state.gateway.as_deref(), Some("10.0.0.1"));
        assert_eq!(state.vswitch_id, None);
        assert_eq!(mock.calls().add_subnet, 1);
    }

    #[tokio::test]
    async fn test_create_vswitch_subnet() {
        let mock = MockHcloud::new();
        mock.add_network(5, "10.0.0.0/8");

        let spec = SubnetSpec {
            kind: SubnetKind::VSwitch { vswitch_id: 77 },
            ..cloud_spec(5, "10.1.0.0/24")
        };
        let ctx = Context::background();
        let state = create(&ctx, &mock, &fast_settings(5), &spec).await.unwrap();

        assert_eq!(state.subnet_type, "vswitch");
        assert_eq!(state.vswitch_id, Some(77));
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_ip_range() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");

        let ctx = Context::background();
        let err = create(&ctx, &mock, &fast_settings(5), &cloud_spec(1, "10.0.0.0"))
            .await
            .unwrap_err();

        assert!(err.id().is_none());
        assert!(matches!(err.into_inner(), ProviderError::Validation(_)));
        assert_eq!(mock.calls().add_subnet, 0);
    }

    #[tokio::test]
    async fn test_create_retries_transient_errors() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.fail_add_subnet(api_error(ErrorCode::Conflict));
        mock.fail_add_subnet(api_error(ErrorCode::VSwitchAlreadyUsed));
        mock.fail_add_subnet(api_error(ErrorCode::Conflict));

        let ctx = Context::background();
        let state = create(&ctx, &mock, &fast_settings(5), &cloud_spec(1, "10.0.3.0/24"))
            .await
            .unwrap();

        assert_eq!(state.id.as_deref(), Some("1-10.0.3.0/24"));
        assert_eq!(mock.calls().add_subnet, 4);
    }

    #[tokio::test]
    async fn test_create_aborts_on_not_found() {
        let mock = MockHcloud::new();
        mock.fail_add_subnet(api_error(ErrorCode::NotFound));
        mock.fail_add_subnet(api_error(ErrorCode::Conflict));

        let ctx = Context::background();
        let err = create(&ctx, &mock, &fast_settings(5), &cloud_spec(1, "10.0.3.0/24"))
            .await
            .unwrap_err();

        assert!(err.into_inner().is_api_code(&ErrorCode::NotFound));
        assert_eq!(mock.calls().add_subnet, 1);
    }

    #[tokio::test]
    async fn test_create_aborts_on_locked() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.fail_add_subnet(api_error(ErrorCode::Locked));
        mock.fail_add_subnet(api_error(ErrorCode::Conflict));

        let ctx = Context::background();
        let err = create(&ctx, &mock, &fast_settings(5), &cloud_spec(1, "10.0.3.0/24"))
            .await
            .unwrap_err();

        assert!(err.id().is_none());
        assert!(err.into_inner().is_api_code(&ErrorCode::Locked));
        assert_eq!(mock.calls().add_subnet, 1);
        assert!(mock.network(1).unwrap().subnets.is_empty());
    }

    #[tokio::test]
    async fn test_create_gives_up_after_budget() {
        let mock = MockHcloud::new();
        for _ in 0..10 {
            mock.fail_add_subnet(api_error(ErrorCode::Conflict));
        }

        let ctx = Context::background();
        let err = create(&ctx, &mock, &fast_settings(2), &cloud_spec(1, "10.0.3.0/24"))
            .await
            .unwrap_err();

        assert!(err.into_inner().is_api_code(&ErrorCode::Conflict));
        assert_eq!(mock.calls().add_subnet, 2);
    }

    #[tokio::test]
    async fn test_create_action_failure_keeps_id() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.fail_next_action(ActionError {
            code: "action_failed".to_string(),
            message: "ip range overlaps".to_string(),
        });

        let ctx = Context::background();
        let err = create(&ctx, &mock, &fast_settings(5), &cloud_spec(1, "10.0.4.0/24"))
            .await
            .unwrap_err();

        assert_eq!(err.id().map(|id| id.to_string()).as_deref(), Some("1-10.0.4.0/24"));
        assert!(matches!(err.into_inner(), ProviderError::ActionFailed { .. }));
        assert_eq!(mock.calls().add_subnet, 1);
    }

    #[tokio::test]
    async fn test_read_gone_subnet() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");

        let ctx = Context::background();
        assert!(read(&ctx, &mock, "1-10.0.9.0/24").await.unwrap().is_none());
        assert!(read(&ctx, &mock, "2-10.0.9.0/24").await.unwrap().is_none());
        assert!(read(&ctx, &mock, "garbage").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.add_existing_subnet(1, SubnetKind::Server, "10.0.1.0/24");

        let ctx = Context::background();
        delete(&ctx, &mock, &fast_settings(5), "1-10.0.1.0/24").await.unwrap();

        assert_eq!(mock.calls().delete_subnet, 1);
        assert!(mock.network(1).unwrap().subnets.is_empty());
    }

    #[tokio::test]
    async fn test_delete_invalid_id_succeeds() {
        let mock = MockHcloud::new();
        let ctx = Context::background();

        delete(&ctx, &mock, &fast_settings(5), "not-an-id").await.unwrap();
        delete(&ctx, &mock, &fast_settings(5), "42-10.0.0.0/24").await.unwrap();
        assert_eq!(mock.calls().delete_subnet, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_subnet_succeeds() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");

        let ctx = Context::background();
        delete(&ctx, &mock, &fast_settings(5), "1-10.0.1.0/24").await.unwrap();
        assert_eq!(mock.calls().delete_subnet, 0);
    }

    #[tokio::test]
    async fn test_delete_not_found_succeeds() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.add_existing_subnet(1, SubnetKind::Cloud, "10.0.1.0/24");
        mock.fail_delete_subnet(api_error(ErrorCode::NotFound));

        let ctx = Context::background();
        delete(&ctx, &mock, &fast_settings(5), "1-10.0.1.0/24").await.unwrap();
        assert_eq!(mock.calls().delete_subnet, 1);
    }

    #[tokio::test]
    async fn test_delete_retries_conflict_and_lock() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.add_existing_subnet(1, SubnetKind::Cloud, "10.0.1.0/24");
        mock.fail_delete_subnet(api_error(ErrorCode::Conflict));
        mock.fail_delete_subnet(api_error(ErrorCode::Locked));

        let ctx = Context::background();
        delete(&ctx, &mock, &fast_settings(1), "1-10.0.1.0/24").await.unwrap();

        assert_eq!(mock.calls().delete_subnet, 3);
        assert_eq!(mock.calls().get_network, 3);
        assert!(mock.network(1).unwrap().subnets.is_empty());
    }

    #[tokio::test]
    async fn test_delete_attached_resources_after_budget_succeeds() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.add_existing_subnet(1, SubnetKind::Cloud, "10.0.1.0/24");
        for _ in 0..20 {
            mock.fail_delete_subnet(ApiError::new(
                ErrorCode::ServiceError,
                "network has attached resources",
            ));
        }

        let ctx = Context::background();
        delete(&ctx, &mock, &fast_settings(1), "1-10.0.1.0/24").await.unwrap();

        // Ten times the create budget of one attempt.
        assert_eq!(mock.calls().delete_subnet, 10);
    }

    #[tokio::test]
    async fn test_delete_servers_attached_after_budget_succeeds() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.add_existing_subnet(1, SubnetKind::Server, "10.0.1.0/24");
        for _ in 0..20 {
            mock.fail_delete_subnet(ApiError::new(
                ErrorCode::ServiceError,
                "cannot delete subnet because servers are attached",
            ));
        }

        let ctx = Context::background();
        delete(&ctx, &mock, &fast_settings(2), "1-10.0.1.0/24").await.unwrap();

        assert_eq!(mock.calls().delete_subnet, 20);
        assert_eq!(mock.calls().get_network, 20);
        assert_eq!(mock.network(1).unwrap().subnets.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_fatal_error_surfaces() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.add_existing_subnet(1, SubnetKind::Cloud, "10.0.1.0/24");
        mock.fail_delete_subnet(ApiError::new(ErrorCode::ServiceError, "internal failure"));

        let ctx = Context::background();
        let err = delete(&ctx, &mock, &fast_settings(5), "1-10.0.1.0/24")
            .await
            .unwrap_err();

        assert!(err.is_api_code(&ErrorCode::ServiceError));
        assert_eq!(mock.calls().delete_subnet, 1);
    }

    #[tokio::test]
    async fn test_delete_action_failure_surfaces() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.add_existing_subnet(1, SubnetKind::Cloud, "10.0.1.0/24");
        mock.fail_next_action(ActionError {
            code: "action_failed".to_string(),
            message: "locked by another action".to_string(),
        });

        let ctx = Context::background();
        let err = delete(&ctx, &mock, &fast_settings(5), "1-10.0.1.0/24")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ActionFailed { .. }));
        assert_eq!(mock.calls().delete_subnet, 1);
    }

    #[tokio::test]
    async fn test_delete_stops_when_cancelled() {
        let mock = MockHcloud::new();
        mock.add_network(1, "10.0.0.0/16");
        mock.add_existing_subnet(1, SubnetKind::Cloud, "10.0.1.0/24");
        for _ in 0..100 {
            mock.fail_delete_subnet(api_error(ErrorCode::Locked));
        }

        let settings = Settings {
            poll_interval: Duration::from_millis(1),
            retry: RetryPolicy {
                max_attempts: 10,
                initial_delay: Duration::from_secs(60),
                max_delay: Duration::from_secs(60),
                backoff_multiplier: 1.0,
            },
        };
        let ctx = Context::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = delete(&ctx, &mock, &settings, "1-10.0.1.0/24").await.unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled(_)));
        assert_eq!(mock.calls().delete_subnet, 1);
    }

    #[test]
    fn test_spec_from_state() {
        let state = SubnetState {
            id: None,
            network_id: 3,
            subnet_type: "vswitch".to_string(),
            network_zone: "eu-central".to_string(),
            ip_range: "10.0.0.0/24".to_string(),
            gateway: None,
            vswitch_id: Some(9),
        };
        let spec = SubnetSpec::try_from(&state).unwrap();
        assert_eq!(spec.kind, SubnetKind::VSwitch { vswitch_id: 9 });

        let missing_vswitch = SubnetState {
            vswitch_id: None,
            ..state.clone()
        };
        assert!(SubnetSpec::try_from(&missing_vswitch).is_err());

        let unknown = SubnetState {
            subnet_type: "robot".to_string(),
            ..state
        };
        assert!(SubnetSpec::try_from(&unknown).is_err());
    }
}
