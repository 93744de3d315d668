use serde::{Deserialize, Serialize};

use crate::models::SocietyDetails;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterSocietyRequest {
    pub society_name: String,
    pub city: String,
    pub address: String,
    pub email: String,
    pub contact_number: String,
}

impl From<RegisterSocietyRequest> for SocietyDetails {
    fn from(req: RegisterSocietyRequest) -> Self {
        Self {
            society_name: req.society_name,
            city: req.city,
            address: req.address,
            email: req.email,
            contact_number: req.contact_number,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterSocietyResponse {
    pub success: bool,
    pub message: String,
    pub society_id: String,
    pub admin_secret_key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegenerateKeyRequest {
    pub society_id: String,
    pub email: String,
    pub previous_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegenerateKeyResponse {
    pub success: bool,
    pub message: String,
    pub admin_secret_key: String,
}
