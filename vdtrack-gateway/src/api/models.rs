use serde::{Deserialize, Serialize};
use vdtrack_core::Thing;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ThingResponse {
    pub id: String,
    pub device_id: String,
    pub org: Option<String>,
    pub enabled: bool,
    pub location_topic: String,
    pub registered_at: String,
}

impl From<Thing> for ThingResponse {
    fn from(thing: Thing) -> Self {
        Self {
            id: thing.id.0.to_string(),
            device_id: thing.device_id.to_string(),
            org: thing.org.map(|org| org.0.to_string()),
            enabled: thing.enabled,
            location_topic: thing.location_topic.to_string(),
            registered_at: thing.registered_at.to_string(),
        }
    }
}

/// Fields absent from the request are left unchanged.
#[derive(Debug, Deserialize)]
pub struct ThingUpdateRequest {
    /// Organization to assign (ULID text)
    pub org: Option<String>,
    pub enabled: Option<bool>,
    pub location_topic: Option<String>,
}
