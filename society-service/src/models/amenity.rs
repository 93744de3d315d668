use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A facility configured for a society during setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(rename = "_id")]
    pub amenity_id: String,
    pub society_id: String,
    pub amenity_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenity_type: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Amenity {
    pub fn new(society_id: String, amenity_name: String, amenity_type: Option<String>) -> Self {
        Self {
            amenity_id: Uuid::new_v4().to_string(),
            society_id,
            amenity_name,
            amenity_type,
            created_at: Utc::now(),
        }
    }
}
