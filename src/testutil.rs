//! In-memory stand-in for the remote ride service, used by the unit
//! tests. Mimics just enough of the server's transition rules to let
//! the client machines run end to end.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::api::{AuthAPI, ChatAPI, LocationAPI, RideAPI, API};
use crate::entities::{
    Bid, BidStatus, ChatMessage, DriverLocation, Estimate, PositionReport, Ride, RideId, RideSpec,
    RideStatus,
};
use crate::error::Error;
use crate::session::{Credentials, Principal, Registration, Role};

const MUTATING_CALLS: &[&str] = &[
    "create_ride",
    "accept_ride",
    "start_ride",
    "complete_ride",
    "place_bid",
    "accept_bid",
    "send_message",
    "report_driver_location",
    "issue_token",
    "register",
];

#[derive(Default)]
pub struct StubState {
    pub rides: Vec<Ride>,
    pub estimate: Option<Estimate>,
    pub drivers: Vec<DriverLocation>,
    pub messages: Vec<ChatMessage>,
    pub reports: Vec<PositionReport>,
    pub driver_name: String,
    pub fail_next: Option<i32>,
    pub fail_all: Option<i32>,
    pub fail_calls: HashMap<String, i32>,
    pub calls: Vec<String>,
    pub next_id: i64,
}

pub struct StubAPI {
    state: Mutex<StubState>,
}

impl StubAPI {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StubState {
                driver_name: "driver1".into(),
                next_id: 100,
                ..StubState::default()
            }),
        }
    }

    pub fn with_state(&self, mutate: impl FnOnce(&mut StubState)) {
        mutate(&mut self.state.lock().unwrap());
    }

    pub fn fail_next(&self, code: i32) {
        self.state.lock().unwrap().fail_next = Some(code);
    }

    pub fn fail_all(&self, code: i32) {
        self.state.lock().unwrap().fail_all = Some(code);
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().fail_all = None;
    }

    pub fn fail_call(&self, name: &str, code: i32) {
        self.state.lock().unwrap().fail_calls.insert(name.into(), code);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| *call == name).count()
    }

    pub fn mutating_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| MUTATING_CALLS.contains(&call.as_str()))
            .count()
    }

    fn begin(&self, name: &str) -> Result<MutexGuard<'_, StubState>, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(name.into());

        if let Some(code) = state.fail_next.take() {
            return Err(stub_error(code));
        }

        if let Some(code) = state.fail_all {
            return Err(stub_error(code));
        }

        if let Some(code) = state.fail_calls.get(name) {
            return Err(stub_error(*code));
        }

        Ok(state)
    }
}

fn stub_error(code: i32) -> Error {
    Error {
        code,
        message: "stub failure".into(),
    }
}

fn not_found() -> Error {
    Error {
        code: 101,
        message: "no such ride".into(),
    }
}

fn rejected() -> Error {
    Error {
        code: 300,
        message: "action rejected".into(),
    }
}

pub fn ride(id: RideId, status: RideStatus) -> Ride {
    Ride {
        id,
        passenger: "verify_pax".into(),
        driver: None,
        pickup_address: "A".into(),
        pickup_latitude: 23.81,
        pickup_longitude: 90.41,
        dropoff_address: "B".into(),
        dropoff_latitude: 23.82,
        dropoff_longitude: 90.42,
        status,
        estimated_fare: Some(150.0),
        actual_fare: None,
        distance_km: Some(5.0),
        duration_minutes: Some(12),
        bids: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

pub fn bid(id: i64, driver: &str, amount: f64) -> Bid {
    Bid {
        id,
        driver: driver.into(),
        amount,
        status: BidStatus::Pending,
    }
}

pub fn spec() -> RideSpec {
    RideSpec {
        pickup_address: "A".into(),
        pickup_latitude: 23.81,
        pickup_longitude: 90.41,
        dropoff_address: "B".into(),
        dropoff_latitude: 23.82,
        dropoff_longitude: 90.42,
    }
}

pub fn estimate() -> Estimate {
    Estimate {
        distance_km: 5.0,
        duration_minutes: 12,
        estimated_fare: 150.0,
        traffic_status: "Light".into(),
        traffic_factor: Some(1.0),
    }
}

#[async_trait]
impl RideAPI for StubAPI {
    async fn create_estimate(&self, _spec: &RideSpec) -> Result<Estimate, Error> {
        let state = self.begin("create_estimate")?;
        Ok(state.estimate.clone().unwrap_or_else(estimate))
    }

    async fn create_ride(&self, spec: &RideSpec) -> Result<Ride, Error> {
        let mut state = self.begin("create_ride")?;

        state.next_id += 1;
        let mut created = ride(state.next_id, RideStatus::Requested);
        created.pickup_address = spec.pickup_address.clone();
        created.dropoff_address = spec.dropoff_address.clone();

        state.rides.push(created.clone());
        Ok(created)
    }

    async fn find_ride(&self, id: RideId) -> Result<Ride, Error> {
        let state = self.begin("find_ride")?;

        state
            .rides
            .iter()
            .find(|ride| ride.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn list_rides(&self) -> Result<Vec<Ride>, Error> {
        let state = self.begin("list_rides")?;
        Ok(state.rides.clone())
    }

    async fn accept_ride(&self, id: RideId) -> Result<Ride, Error> {
        let mut state = self.begin("accept_ride")?;
        let driver = state.driver_name.clone();

        let ride = state
            .rides
            .iter_mut()
            .find(|ride| ride.id == id)
            .ok_or_else(not_found)?;

        if ride.status != RideStatus::Requested {
            return Err(rejected());
        }

        ride.status = RideStatus::Accepted;
        ride.driver = Some(driver);

        Ok(ride.clone())
    }

    async fn start_ride(&self, id: RideId) -> Result<Ride, Error> {
        let mut state = self.begin("start_ride")?;

        let ride = state
            .rides
            .iter_mut()
            .find(|ride| ride.id == id)
            .ok_or_else(not_found)?;

        if ride.status != RideStatus::Accepted {
            return Err(rejected());
        }

        ride.status = RideStatus::InProgress;
        Ok(ride.clone())
    }

    async fn complete_ride(&self, id: RideId) -> Result<Ride, Error> {
        let mut state = self.begin("complete_ride")?;

        let ride = state
            .rides
            .iter_mut()
            .find(|ride| ride.id == id)
            .ok_or_else(not_found)?;

        if ride.status != RideStatus::InProgress {
            return Err(rejected());
        }

        ride.status = RideStatus::Completed;
        Ok(ride.clone())
    }

    async fn place_bid(&self, id: RideId, amount: f64) -> Result<Bid, Error> {
        let mut state = self.begin("place_bid")?;

        state.next_id += 1;
        let new_bid = bid(state.next_id, &state.driver_name.clone(), amount);

        let ride = state
            .rides
            .iter_mut()
            .find(|ride| ride.id == id)
            .ok_or_else(not_found)?;

        if ride.status != RideStatus::Requested {
            return Err(rejected());
        }

        ride.bids.push(new_bid.clone());
        Ok(new_bid)
    }

    async fn accept_bid(&self, id: RideId, bid_id: i64) -> Result<Ride, Error> {
        let mut state = self.begin("accept_bid")?;

        let ride = state
            .rides
            .iter_mut()
            .find(|ride| ride.id == id)
            .ok_or_else(not_found)?;

        if ride.status != RideStatus::Requested {
            return Err(rejected());
        }

        let (driver, amount) = {
            let accepted = ride
                .bids
                .iter()
                .find(|bid| bid.id == bid_id && bid.is_pending())
                .ok_or_else(rejected)?;

            (accepted.driver.clone(), accepted.amount)
        };

        for bid in ride.bids.iter_mut() {
            bid.status = if bid.id == bid_id {
                BidStatus::Accepted
            } else {
                BidStatus::Rejected
            };
        }

        ride.driver = Some(driver);
        ride.actual_fare = Some(amount);
        ride.status = RideStatus::Accepted;

        Ok(ride.clone())
    }
}

#[async_trait]
impl LocationAPI for StubAPI {
    async fn list_driver_locations(&self) -> Result<Vec<DriverLocation>, Error> {
        let state = self.begin("list_driver_locations")?;
        Ok(state.drivers.clone())
    }

    async fn report_driver_location(&self, report: &PositionReport) -> Result<(), Error> {
        let mut state = self.begin("report_driver_location")?;
        state.reports.push(report.clone());
        Ok(())
    }
}

#[async_trait]
impl ChatAPI for StubAPI {
    async fn list_messages(&self, _ride_id: RideId) -> Result<Vec<ChatMessage>, Error> {
        let state = self.begin("list_messages")?;
        Ok(state.messages.clone())
    }

    async fn send_message(&self, _ride_id: RideId, content: &str) -> Result<ChatMessage, Error> {
        let mut state = self.begin("send_message")?;

        state.next_id += 1;
        let message = ChatMessage {
            id: state.next_id,
            sender: "verify_pax".into(),
            content: content.into(),
            created_at: None,
        };

        state.messages.push(message.clone());
        Ok(message)
    }
}

#[async_trait]
impl AuthAPI for StubAPI {
    async fn issue_token(&self, username: &str, _password: &str) -> Result<Credentials, Error> {
        self.begin("issue_token")?;

        Ok(Credentials {
            access: format!("access-{}", username),
            refresh: format!("refresh-{}", username),
        })
    }

    async fn register(&self, registration: &Registration) -> Result<Principal, Error> {
        self.begin("register")?;

        Ok(Principal {
            id: 1,
            username: registration.username.clone(),
            email: Some(registration.email.clone()),
            role: registration.role,
        })
    }

    async fn current_user(&self) -> Result<Principal, Error> {
        self.begin("current_user")?;

        Ok(Principal {
            id: 1,
            username: "verify_pax".into(),
            email: None,
            role: Role::Rider,
        })
    }
}

impl API for StubAPI {}
