use serde::{Deserialize, Serialize};

use crate::models::Amenity;
use crate::services::{AmenityInput, SetupStatus};

#[derive(Debug, Serialize)]
pub struct SetupStatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub status: SetupStatus,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct SetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetPasswordResponse {
    pub success: bool,
    pub message: String,
    pub redirect_to: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigureRequest {
    /// Absent or `null` means nothing to configure.
    pub amenities: Option<Vec<AmenityRequest>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AmenityRequest {
    #[serde(alias = "amenity_name")]
    pub name: String,
    #[serde(rename = "type", alias = "amenity_type")]
    pub amenity_type: Option<String>,
}

impl From<AmenityRequest> for AmenityInput {
    fn from(req: AmenityRequest) -> Self {
        Self {
            name: req.name,
            amenity_type: req.amenity_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AmenityResponse {
    pub amenity_id: String,
    pub society_id: String,
    pub amenity_name: String,
    pub amenity_type: Option<String>,
    pub created_at: String,
}

impl From<Amenity> for AmenityResponse {
    fn from(amenity: Amenity) -> Self {
        Self {
            amenity_id: amenity.amenity_id,
            society_id: amenity.society_id,
            amenity_name: amenity.amenity_name,
            amenity_type: amenity.amenity_type,
            created_at: amenity.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigureResponse {
    pub success: bool,
    pub message: String,
    pub amenities: Vec<AmenityResponse>,
}
