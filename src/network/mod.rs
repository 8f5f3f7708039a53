//! The `hcloud_network_subnet` resource.
//!
//! Subnets cannot be updated in place; every configurable attribute forces
//! replacement, so planning only ever creates, replaces or keeps a subnet.

pub mod subnet;
pub mod subnet_id;

use serde_json::{Map, Value};

use crate::api::SubnetKind;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::types::{AttributeChange, PlanResult};
use crate::validation::{cidr, validate};

/// Type name of the network subnet resource.
pub const SUBNET_RESOURCE_TYPE: &str = "hcloud_network_subnet";

/// Attributes computed by the provider.
const COMPUTED_ATTRIBUTES: [&str; 2] = ["id", "gateway"];

/// Schema of `hcloud_network_subnet`.
pub fn subnet_schema() -> Schema {
    Schema::v0()
        .with_description("Provides a Hetzner Cloud Network Subnet to represent a Subnet in the Hetzner Cloud.")
        .with_attribute(
            "id",
            Attribute::computed_string()
                .with_description("Composite ID of the subnet: `<network id>-<ip range>`."),
        )
        .with_attribute(
            "network_id",
            Attribute::required_int64()
                .with_description("ID of the Network the subnet should be added to.")
                .with_force_new(),
        )
        .with_attribute(
            "type",
            Attribute::required_string()
                .with_description("Type of subnet.")
                .with_allowed_values(SubnetKind::NAMES)
                .with_force_new(),
        )
        .with_attribute(
            "network_zone",
            Attribute::required_string()
                .with_description("Name of network zone.")
                .with_force_new(),
        )
        .with_attribute(
            "ip_range",
            Attribute::required_string()
                .with_description("Range to allocate IPs from. Must be a subnet of the ip_range of the Network and must not overlap with any other subnets or with any destinations in routes.")
                .with_force_new(),
        )
        .with_attribute(
            "gateway",
            Attribute::computed_string().with_description("Gateway of the subnet."),
        )
        .with_attribute(
            "vswitch_id",
            Attribute::optional_int64()
                .with_description("ID of the vSwitch. Required if type is `vswitch`.")
                .with_force_new(),
        )
}

/// Validate a subnet configuration.
pub fn validate_subnet_config(config: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = validate(&subnet_schema(), config);
    diagnostics.extend(cidr(config, "ip_range"));

    let vswitch_id = config.get("vswitch_id").filter(|v| !v.is_null());
    match config.get("type").and_then(Value::as_str) {
        Some("vswitch") if vswitch_id.is_none() => diagnostics.push(
            Diagnostic::error("Missing vswitch_id")
                .with_detail("vswitch_id is required for subnets of type vswitch")
                .with_attribute("vswitch_id"),
        ),
        Some(other) if other != "vswitch" && vswitch_id.is_some() => diagnostics.push(
            Diagnostic::warning("vswitch_id is ignored")
                .with_detail(format!("vswitch_id only applies to subnets of type vswitch, not {}", other))
                .with_attribute("vswitch_id"),
        ),
        _ => {}
    }

    diagnostics
}

/// Plan a subnet change.
///
/// `proposed_state` of `null` plans a deletion.
pub fn plan_subnet(prior_state: Option<&Value>, proposed_state: &Value) -> PlanResult {
    let schema = subnet_schema();

    let prior = match prior_state.filter(|v| !v.is_null()) {
        Some(prior) => prior,
        None => {
            let changes = schema
                .block
                .attributes
                .keys()
                .filter_map(|name| {
                    proposed_state
                        .get(name)
                        .filter(|v| !v.is_null())
                        .map(|v| AttributeChange::added(name.clone(), v.clone()))
                })
                .collect();
            return PlanResult::with_changes(with_unknown_computed(proposed_state), changes, false);
        }
    };

    if proposed_state.is_null() {
        let changes = prior
            .get("id")
            .map(|id| vec![AttributeChange::removed("id", id.clone())])
            .unwrap_or_default();
        return PlanResult::with_changes(Value::Null, changes, false);
    }

    // vswitch_id is never read back for other subnet types.
    let is_vswitch = proposed_state.get("type").and_then(Value::as_str) == Some("vswitch");

    let changes: Vec<AttributeChange> = schema
        .force_new_attributes()
        .into_iter()
        .filter(|name| is_vswitch || *name != "vswitch_id")
        .filter_map(|name| {
            let before = prior.get(name).cloned().unwrap_or(Value::Null);
            let after = proposed_state.get(name).cloned().unwrap_or(Value::Null);
            (before != after).then(|| AttributeChange::modified(name, before, after))
        })
        .collect();

    if changes.is_empty() {
        PlanResult::no_change(prior.clone())
    } else {
        PlanResult::with_changes(with_unknown_computed(proposed_state), changes, true)
    }
}

fn with_unknown_computed(state: &Value) -> Value {
    let mut planned = state.as_object().cloned().unwrap_or_else(Map::new);
    for name in COMPUTED_ATTRIBUTES {
        planned.insert(name.to_string(), Value::Null);
    }
    Value::Object(planned)
}
