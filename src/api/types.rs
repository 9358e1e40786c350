use serde::{Deserialize, Serialize};

/// Request payload for the generate endpoint
#[derive(Deserialize, Serialize, Debug)]
pub struct GenerateRequest {
    /// Theme name, e.g. "wholesome" or "dark"
    pub theme: String,
}

/// Error body returned with non-2xx responses
#[derive(Deserialize, Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
