//! Provider configuration.
//!
//! The provider block only tunes how patiently the provider talks to the API;
//! credentials belong to the injected [`HcloudApi`](crate::api::HcloudApi)
//! implementation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::DEFAULT_POLL_INTERVAL;
use crate::retry::{RetryPolicy, DEFAULT_RETRIES};
use crate::schema::{Attribute, Diagnostic, Schema};

/// Delete gets this many times the create attempt budget.
pub const DELETE_RETRY_FACTOR: u32 = 10;

/// Raw provider configuration as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Interval between action polls, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    /// Attempt budget for subnet creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// First backoff delay, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_initial_delay_ms: Option<u64>,
    /// Backoff ceiling, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_max_delay_ms: Option<u64>,
}

impl ProviderConfig {
    /// Schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "poll_interval_ms",
                Attribute::optional_int64()
                    .with_description("Interval between action polls in milliseconds.")
                    .with_default(Value::from(DEFAULT_POLL_INTERVAL.as_millis() as u64)),
            )
            .with_attribute(
                "max_retries",
                Attribute::optional_int64()
                    .with_description("Maximum attempts on transient API errors when creating subnets. Deletion uses ten times this budget.")
                    .with_default(Value::from(DEFAULT_RETRIES)),
            )
            .with_attribute(
                "retry_initial_delay_ms",
                Attribute::optional_int64().with_description("First backoff delay in milliseconds."),
            )
            .with_attribute(
                "retry_max_delay_ms",
                Attribute::optional_int64().with_description("Backoff ceiling in milliseconds."),
            )
    }

    /// Parse the configuration block; `null` yields the defaults.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    /// Check value ranges. Returns error diagnostics for each problem.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let settings = self.settings();

        if settings.poll_interval.is_zero() {
            diagnostics.push(
                Diagnostic::error("Poll interval must be positive")
                    .with_attribute("poll_interval_ms"),
            );
        }
        if settings.retry.initial_delay > settings.retry.max_delay {
            diagnostics.push(
                Diagnostic::error("Initial retry delay exceeds the maximum delay")
                    .with_detail(format!(
                        "retry_initial_delay_ms = {}, retry_max_delay_ms = {}",
                        settings.retry.initial_delay.as_millis(),
                        settings.retry.max_delay.as_millis()
                    ))
                    .with_attribute("retry_initial_delay_ms"),
            );
        }

        diagnostics
    }

    /// Resolve the configuration into effective settings.
    pub fn settings(&self) -> Settings {
        let defaults = RetryPolicy::default();
        Settings {
            poll_interval: self
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            retry: RetryPolicy {
                max_attempts: self.max_retries.unwrap_or(defaults.max_attempts),
                initial_delay: self
                    .retry_initial_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.initial_delay),
                max_delay: self
                    .retry_max_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.max_delay),
                backoff_multiplier: defaults.backoff_multiplier,
            },
        }
    }
}

/// Effective settings used by every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Interval between action polls.
    pub poll_interval: Duration,
    /// Retry policy for subnet creation.
    pub retry: RetryPolicy,
}

impl Settings {
    /// Retry policy for subnet deletion.
    pub fn delete_retry(&self) -> RetryPolicy {
        self.retry.scaled(DELETE_RETRY_FACTOR)
    }
}

impl Default for Settings {
    fn default() -> Self {
        ProviderConfig::default().settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = ProviderConfig::from_value(Value::Null).unwrap().settings();
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.delete_retry().max_attempts, 50);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_overrides() {
        let config = ProviderConfig::from_value(json!({
            "poll_interval_ms": 50,
            "max_retries": 2,
            "retry_initial_delay_ms": 10,
            "retry_max_delay_ms": 100
        }))
        .unwrap();
        let settings = config.settings();
        assert_eq!(settings.poll_interval, Duration::from_millis(50));
        assert_eq!(settings.retry.max_attempts, 2);
        assert_eq!(settings.retry.initial_delay, Duration::from_millis(10));
        assert_eq!(settings.delete_retry().max_attempts, 20);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(ProviderConfig::from_value(json!({"token": "secret"})).is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let config = ProviderConfig {
            poll_interval_ms: Some(0),
            retry_initial_delay_ms: Some(5000),
            retry_max_delay_ms: Some(100),
            ..Default::default()
        };
        let diagnostics = config.validate();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].attribute, Some("poll_interval_ms".to_string()));
    }

    #[test]
    fn test_schema_accepts_config() {
        let schema = ProviderConfig::schema();
        assert!(validate(&schema, &json!({"max_retries": 3})).is_empty());
        assert_eq!(validate(&schema, &json!({"max_retries": "three"})).len(), 1);
    }
}
