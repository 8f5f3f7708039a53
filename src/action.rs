//! Waiting for asynchronous actions.

use std::time::Duration;

use tracing::{debug, instrument};

use crate::api::{Action, ActionStatus, HcloudApi};
use crate::context::Context;
use crate::error::ProviderError;

/// Default interval between action polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll `action` until it reaches a terminal state.
///
/// An action that vanishes while being polled is treated as finished. A
/// failed action surfaces as [`ProviderError::ActionFailed`].
#[instrument(skip(ctx, client, action), fields(action_id = action.id, command = %action.command))]
pub async fn wait_for_action<C: HcloudApi + ?Sized>(
    ctx: &Context,
    client: &C,
    action: &Action,
    poll_interval: Duration,
) -> Result<(), ProviderError> {
    let mut current = action.clone();

    loop {
        match current.status {
            ActionStatus::Success => {
                debug!("Action completed");
                return Ok(());
            }
            ActionStatus::Error => return Err(action_failed(&current)),
            ActionStatus::Running => {}
        }

        ctx.sleep(poll_interval).await?;

        current = match client.get_action_by_id(ctx, action.id).await? {
            Some(next) => next,
            None => {
                debug!("Action no longer exists, assuming completion");
                return Ok(());
            }
        };
        debug!(progress = current.progress, "Polled action");
    }
}

fn action_failed(action: &Action) -> ProviderError {
    let (code, message) = match &action.error {
        Some(err) => (err.code.clone(), err.message.clone()),
        None => ("unknown".to_string(), "action failed".to_string()),
    };
    ProviderError::ActionFailed {
        id: action.id,
        command: action.command.clone(),
        code,
        message,
    }
}
