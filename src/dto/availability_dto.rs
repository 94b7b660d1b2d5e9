use serde::{Deserialize, Serialize};

/// Client portal availability payloads keep the snake_case keys of the
/// portal UI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CreateAvailabilityPayload {
    pub available_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UpdateAvailabilityPayload {
    pub id: Option<String>,
    pub available_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AvailabilityDeleteQuery {
    pub id: Option<String>,
}
