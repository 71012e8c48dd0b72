use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Bid;

pub type RideId = i64;

/// A ride as the remote service reports it. The client never mutates
/// these fields directly; it only ever replaces a held `Ride` with a
/// freshly fetched one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ride {
    pub id: RideId,
    pub passenger: String,
    pub driver: Option<String>,
    pub pickup_address: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_address: String,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub status: Status,
    pub estimated_fare: Option<f64>,
    pub actual_fare: Option<f64>,
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub bids: Vec<Bid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Requested,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Requested => "requested".into(),
            Self::Accepted => "accepted".into(),
            Self::InProgress => "in_progress".into(),
            Self::Completed => "completed".into(),
            Self::Cancelled => "cancelled".into(),
        }
    }

    /// Position in the lifecycle. A ride never moves to a lower rank,
    /// which is what lets reconciliation refuse stale fetches.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Requested => 0,
            Self::Accepted => 1,
            Self::InProgress => 2,
            Self::Completed | Self::Cancelled => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Accepted or underway, with a driver attached.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Accepted | Self::InProgress)
    }
}

impl Ride {
    pub fn is_driven_by(&self, username: &str) -> bool {
        match &self.driver {
            Some(driver) => driver == username,
            None => false,
        }
    }

    pub fn pending_bids(&self) -> impl Iterator<Item = &Bid> {
        self.bids.iter().filter(|bid| bid.is_pending())
    }
}

/// Pickup and dropoff of a prospective ride, as submitted to the
/// estimate and create endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RideSpec {
    pub pickup_address: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_address: String,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ranks_are_monotonic() {
        assert!(Status::Requested.rank() < Status::Accepted.rank());
        assert!(Status::Accepted.rank() < Status::InProgress.rank());
        assert!(Status::InProgress.rank() < Status::Completed.rank());
        assert!(Status::Completed.is_terminal());
        assert!(Status::Cancelled.is_terminal());
    }

    #[test]
    fn deserializes_wire_ride() {
        let body = r#"{
            "id": 7,
            "passenger": "verify_pax",
            "driver": null,
            "pickup_address": "Test Pickup",
            "pickup_latitude": 23.81,
            "pickup_longitude": 90.41,
            "dropoff_address": "Test Dropoff",
            "dropoff_latitude": 23.82,
            "dropoff_longitude": 90.42,
            "status": "requested",
            "estimated_fare": 150.0,
            "actual_fare": null,
            "distance_km": 5.0,
            "duration_minutes": 12,
            "bids": [
                {"id": 1, "driver": "driver1", "amount": 100.0, "status": "pending"}
            ]
        }"#;

        let ride: Ride = serde_json::from_str(body).unwrap();
        assert_eq!(ride.id, 7);
        assert_eq!(ride.status, Status::Requested);
        assert!(ride.driver.is_none());
        assert_eq!(ride.pending_bids().count(), 1);
    }
}
