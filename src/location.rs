//! The `hcloud_location` and `hcloud_locations` data sources.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::api::{HcloudApi, Location};
use crate::context::Context;
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Diagnostic, Schema};
use crate::validation::exactly_one_of;

/// Type name of the single location data source.
pub const DATA_SOURCE_TYPE: &str = "hcloud_location";

/// Type name of the location list data source.
pub const DATA_SOURCE_LIST_TYPE: &str = "hcloud_locations";

/// State of a single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    /// Location ID.
    pub id: i64,
    /// Location name.
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
    /// Network zone of the location.
    pub network_zone: String,
}

impl From<Location> for LocationData {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            name: location.name,
            description: location.description,
            country: location.country,
            city: location.city,
            latitude: location.latitude,
            longitude: location.longitude,
            network_zone: location.network_zone,
        }
    }
}

/// State of the location list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationListData {
    /// Digest of all listed location IDs.
    pub id: String,
    /// IDs of all locations (deprecated).
    pub location_ids: Vec<String>,
    /// Names of all locations (deprecated).
    pub names: Vec<String>,
    /// Descriptions of all locations (deprecated).
    pub descriptions: Vec<String>,
    /// All locations.
    pub locations: Vec<LocationData>,
}

impl From<Vec<Location>> for LocationListData {
    fn from(locations: Vec<Location>) -> Self {
        let location_ids: Vec<String> = locations.iter().map(|l| l.id.to_string()).collect();
        Self {
            id: list_id(&location_ids),
            names: locations.iter().map(|l| l.name.clone()).collect(),
            descriptions: locations.iter().map(|l| l.description.clone()).collect(),
            location_ids,
            locations: locations.into_iter().map(LocationData::from).collect(),
        }
    }
}

/// Stable ID for a list data source: hex SHA-256 of the joined item IDs.
pub fn list_id(ids: &[String]) -> String {
    format!("{:x}", Sha256::digest(ids.join(",").as_bytes()))
}

fn common_attributes(schema: Schema, read_only: bool) -> Schema {
    let lookup_key = |description: &str, attr_type: AttributeType| {
        let attr = if read_only {
            Attribute::new(attr_type, AttributeFlags::computed())
        } else {
            Attribute::new(attr_type, AttributeFlags::optional())
        };
        attr.with_description(description)
    };

    schema
        .with_attribute("id", lookup_key("ID of the Location.", AttributeType::Int64))
        .with_attribute("name", lookup_key("Name of the Location.", AttributeType::String))
        .with_attribute(
            "description",
            Attribute::computed_string().with_description("Description of the Location."),
        )
        .with_attribute(
            "country",
            Attribute::computed_string().with_description(
                "Country the Location resides in. ISO 3166-1 alpha-2 code of the country.",
            ),
        )
        .with_attribute(
            "city",
            Attribute::computed_string().with_description(
                "Name of the closest city to the Location. City name and optionally state in short form.",
            ),
        )
        .with_attribute(
            "latitude",
            Attribute::computed_float64()
                .with_description("Latitude of the city closest to the Location."),
        )
        .with_attribute(
            "longitude",
            Attribute::computed_float64()
                .with_description("Longitude of the city closest to the Location."),
        )
        .with_attribute(
            "network_zone",
            Attribute::computed_string()
                .with_description("Name of the Network Zone this Location resides in."),
        )
}

fn location_object_type() -> AttributeType {
    AttributeType::object(
        [
            ("id", AttributeType::Int64),
            ("name", AttributeType::String),
            ("description", AttributeType::String),
            ("country", AttributeType::String),
            ("city", AttributeType::String),
            ("latitude", AttributeType::Float64),
            ("longitude", AttributeType::Float64),
            ("network_zone", AttributeType::String),
        ]
        .into_iter()
        .map(|(name, attr_type)| (name.to_string(), attr_type))
        .collect(),
    )
}

/// Schema of `hcloud_location`.
pub fn schema() -> Schema {
    common_attributes(Schema::v0(), false)
        .with_description("Provides details about a specific Hetzner Cloud Location.")
}

/// Schema of `hcloud_locations`.
pub fn list_schema() -> Schema {
    let deprecated_list = |what: &str| {
        Attribute::new(
            AttributeType::list(AttributeType::String),
            AttributeFlags::computed(),
        )
        .with_description(format!("{} of all Locations.", what))
        .with_deprecation("Use locations list instead")
    };

    Schema::v0()
        .with_description("Provides a list of available Hetzner Cloud Locations.")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("location_ids", deprecated_list("IDs"))
        .with_attribute("names", deprecated_list("Names"))
        .with_attribute("descriptions", deprecated_list("Descriptions"))
        .with_attribute(
            "locations",
            Attribute::new(
                AttributeType::list(location_object_type()),
                AttributeFlags::computed(),
            ),
        )
}

/// Exactly one of `id` and `name` selects the location.
pub fn validate_config(config: &Value) -> Vec<Diagnostic> {
    exactly_one_of(config, &["id", "name"])
}

/// Read a single location by `id` or `name`.
#[instrument(skip(ctx, client, config))]
pub async fn read<C: HcloudApi + ?Sized>(
    ctx: &Context,
    client: &C,
    config: &Value,
) -> Result<LocationData, ProviderError> {
    if let Some(diagnostic) = validate_config(config).into_iter().next() {
        return Err(ProviderError::Validation(diagnostic.summary));
    }

    let location = if let Some(id) = config.get("id").filter(|v| !v.is_null()) {
        let id = id
            .as_i64()
            .ok_or_else(|| ProviderError::Validation(format!("id must be an integer, got {}", id)))?;
        client
            .get_location_by_id(ctx, id)
            .await?
            .ok_or_else(|| not_found("id", &id.to_string()))?
    } else {
        let name = config
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Validation("name must be a string".to_string()))?;
        client
            .get_location_by_name(ctx, name)
            .await?
            .ok_or_else(|| not_found("name", &format!("{:?}", name)))?
    };

    Ok(location.into())
}

/// Read all locations.
#[instrument(skip(ctx, client))]
pub async fn read_list<C: HcloudApi + ?Sized>(
    ctx: &Context,
    client: &C,
) -> Result<LocationListData, ProviderError> {
    Ok(client.all_locations(ctx).await?.into())
}

fn not_found(attribute: &str, value: &str) -> ProviderError {
    ProviderError::NotFound(format!("location with {} {} not found", attribute, value))
}
