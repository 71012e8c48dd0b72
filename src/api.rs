use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{
    Bid, ChatMessage, DriverLocation, Estimate, PositionReport, Ride, RideId, RideSpec,
};
use crate::error::Error;
use crate::session::{Credentials, Principal, Registration};

#[async_trait]
pub trait RideAPI {
    async fn create_estimate(&self, spec: &RideSpec) -> Result<Estimate, Error>;

    async fn create_ride(&self, spec: &RideSpec) -> Result<Ride, Error>;

    async fn find_ride(&self, id: RideId) -> Result<Ride, Error>;

    async fn list_rides(&self) -> Result<Vec<Ride>, Error>;

    async fn accept_ride(&self, id: RideId) -> Result<Ride, Error>;

    async fn start_ride(&self, id: RideId) -> Result<Ride, Error>;

    async fn complete_ride(&self, id: RideId) -> Result<Ride, Error>;

    async fn place_bid(&self, id: RideId, amount: f64) -> Result<Bid, Error>;

    async fn accept_bid(&self, id: RideId, bid_id: i64) -> Result<Ride, Error>;
}

#[async_trait]
pub trait LocationAPI {
    async fn list_driver_locations(&self) -> Result<Vec<DriverLocation>, Error>;

    async fn report_driver_location(&self, report: &PositionReport) -> Result<(), Error>;
}

#[async_trait]
pub trait ChatAPI {
    async fn list_messages(&self, ride_id: RideId) -> Result<Vec<ChatMessage>, Error>;

    async fn send_message(&self, ride_id: RideId, content: &str) -> Result<ChatMessage, Error>;
}

#[async_trait]
pub trait AuthAPI {
    async fn issue_token(&self, username: &str, password: &str) -> Result<Credentials, Error>;

    async fn register(&self, registration: &Registration) -> Result<Principal, Error>;

    async fn current_user(&self) -> Result<Principal, Error>;
}

pub trait API: RideAPI + LocationAPI + ChatAPI + AuthAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
