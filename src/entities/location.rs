use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Car,
    Bike,
    Rickshaw,
}

/// An online driver's last reported position. Snapshots of these are
/// replaced wholesale on every poll, never merged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverLocation {
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    pub vehicle_type: VehicleType,
}

impl DriverLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Payload a driver submits to report its own position.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PositionReport {
    pub latitude: f64,
    pub longitude: f64,
    pub vehicle_type: VehicleType,
}
