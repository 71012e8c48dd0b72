use serde::{Deserialize, Serialize};

/// A fare quote for a prospective ride. Not persisted anywhere; it
/// lives only for the duration of the current form-filling session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Estimate {
    pub distance_km: f64,
    pub duration_minutes: i64,
    pub estimated_fare: f64,
    pub traffic_status: String,
    pub traffic_factor: Option<f64>,
}
