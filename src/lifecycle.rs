use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::api::DynAPI;
use crate::entities::{Bid, Estimate, Ride, RideId, RideSpec, RideStatus};
use crate::error::{invalid_invocation_error, Error};
use crate::poll::Repeater;

/// Client-side phase of the ride lifecycle. The pre-submission phases
/// (`Estimating`, `Estimated`, `Requesting`) exist only locally; from
/// `Requested` onward the phase mirrors the server's ride status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Estimating,
    Estimated,
    Requesting,
    Requested,
    Accepted,
    InProgress,
    Completed,
}

impl Phase {
    fn from_status(status: RideStatus) -> Self {
        match status {
            RideStatus::Requested => Self::Requested,
            RideStatus::Accepted => Self::Accepted,
            RideStatus::InProgress => Self::InProgress,
            RideStatus::Completed | RideStatus::Cancelled => Self::Completed,
        }
    }
}

/// What reconciliation decided about a fetched ride.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Different ride, or an older status than what we hold.
    Ignore,
    /// Same status; refresh attributes without firing a transition.
    Refresh,
    /// The server moved on; replace wholesale and advance.
    Advance(RideStatus),
}

/// The reconciliation rule, as a pure function of (held ride, fetched
/// ride). Every update path, action result or poll result alike, goes
/// through this.
pub fn reconcile(held: Option<&Ride>, fetched: &Ride) -> Verdict {
    let held = match held {
        Some(held) => held,
        None => return Verdict::Advance(fetched.status),
    };

    if held.id != fetched.id {
        return Verdict::Ignore;
    }

    if fetched.status.rank() < held.status.rank() {
        // no demotion: the lifecycle is monotonic per ride id
        return Verdict::Ignore;
    }

    if fetched.status == held.status {
        Verdict::Refresh
    } else {
        Verdict::Advance(fetched.status)
    }
}

/// Holds "my current ride" and its derived phase. Both machines embed
/// one of these so that action results and poll results converge on
/// the single reconciliation path.
#[derive(Debug)]
pub struct RideSlot {
    phase: Phase,
    ride: Option<Ride>,
}

impl RideSlot {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            ride: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ride(&self) -> Option<&Ride> {
        self.ride.as_ref()
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    fn clear(&mut self) {
        self.phase = Phase::Idle;
        self.ride = None;
    }

    fn apply_remote(&mut self, fetched: Ride) -> Verdict {
        let verdict = reconcile(self.ride.as_ref(), &fetched);

        match verdict {
            Verdict::Ignore => {}
            Verdict::Refresh => {
                self.ride = Some(fetched);
            }
            Verdict::Advance(status) => {
                tracing::info!(ride_id = fetched.id, status = %status.name(), "ride advanced");
                self.phase = Phase::from_status(status);

                if status.is_terminal() {
                    self.ride = None;
                } else {
                    self.ride = Some(fetched);
                }
            }
        }

        verdict
    }
}

/// Drives a machine's poll on a fixed interval until cancelled. The
/// repeater re-arms only after the prior poll settles, which is what
/// keeps two polls of the same kind from running concurrently.
#[async_trait]
pub trait Polling: Send {
    async fn poll_once(&mut self) -> Result<(), Error>;

    fn is_polling(&self) -> bool;
}

pub fn spawn_poller<M>(name: &'static str, interval: Duration, machine: Arc<Mutex<M>>) -> Repeater
where
    M: Polling + 'static,
{
    Repeater::spawn(name, interval, move || {
        let machine = machine.clone();

        async move {
            let mut machine = machine.lock().await;

            if !machine.is_polling() {
                return;
            }

            if let Err(err) = machine.poll_once().await {
                // display only; the next scheduled poll is the retry
                tracing::warn!(name, code = err.code, "poll failed");
            }
        }
    })
}

/// The passenger's side of the lifecycle: estimate, confirm, then
/// watch the server move the ride through acceptance and completion,
/// optionally short-circuiting acceptance by taking a driver's bid.
pub struct PassengerLifecycle {
    api: DynAPI,
    slot: RideSlot,
    spec: Option<RideSpec>,
    estimate: Option<Estimate>,
    notices: Vec<String>,
}

impl PassengerLifecycle {
    pub fn new(api: DynAPI) -> Self {
        Self {
            api,
            slot: RideSlot::new(),
            spec: None,
            estimate: None,
            notices: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.slot.phase()
    }

    pub fn ride(&self) -> Option<&Ride> {
        self.slot.ride()
    }

    pub fn estimate(&self) -> Option<&Estimate> {
        self.estimate.as_ref()
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn dismiss_notice(&mut self, index: usize) {
        if index < self.notices.len() {
            self.notices.remove(index);
        }
    }

    /// Back to a blank form after a completed ride.
    pub fn reset(&mut self) {
        self.slot.clear();
        self.spec = None;
        self.estimate = None;
    }

    #[tracing::instrument(skip(self, spec))]
    pub async fn request_estimate(&mut self, spec: RideSpec) -> Result<Estimate, Error> {
        if !matches!(self.phase(), Phase::Idle | Phase::Estimated) {
            return Err(invalid_invocation_error());
        }

        self.slot.set_phase(Phase::Estimating);

        match self.api.create_estimate(&spec).await {
            Ok(estimate) => {
                self.spec = Some(spec);
                self.estimate = Some(estimate.clone());
                self.slot.set_phase(Phase::Estimated);

                Ok(estimate)
            }
            Err(err) => {
                self.slot.set_phase(Phase::Idle);
                self.push_notice("failed to get estimate, please try again");

                Err(err)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn confirm_ride(&mut self) -> Result<(), Error> {
        if self.phase() != Phase::Estimated {
            return Err(invalid_invocation_error());
        }

        let spec = match self.spec.clone() {
            Some(spec) => spec,
            None => return Err(invalid_invocation_error()),
        };

        self.slot.set_phase(Phase::Requesting);

        match self.api.create_ride(&spec).await {
            Ok(ride) => {
                self.slot.apply_remote(ride);
                Ok(())
            }
            Err(err) => {
                self.slot.set_phase(Phase::Idle);
                self.push_notice("failed to request ride, please try again");

                Err(err)
            }
        }
    }

    /// Accepts one of the pending bids on the requested ride. The bid
    /// must still be pending locally; once any bid has been accepted
    /// the phase has advanced and no bid remains actionable.
    #[tracing::instrument(skip(self))]
    pub async fn accept_bid(&mut self, bid_id: i64) -> Result<(), Error> {
        if self.phase() != Phase::Requested {
            return Err(invalid_invocation_error());
        }

        let ride_id = match self.slot.ride() {
            Some(ride) if ride.bids.iter().any(|b| b.id == bid_id && b.is_pending()) => ride.id,
            _ => return Err(invalid_invocation_error()),
        };

        match self.api.accept_bid(ride_id, bid_id).await {
            Ok(ride) => {
                self.slot.apply_remote(ride);
                Ok(())
            }
            Err(err) => {
                // hold state; the next poll reflects what the server committed
                self.push_notice("failed to accept bid");
                Err(err)
            }
        }
    }

    /// Picks up an unfinished ride after a restart. Reads only; no
    /// mutating call is ever issued while rehydrating.
    #[tracing::instrument(skip(self))]
    pub async fn resume(&mut self) -> Result<(), Error> {
        let rides = self.api.list_rides().await?;

        let unfinished = rides
            .into_iter()
            .filter(|ride| !ride.status.is_terminal())
            .max_by_key(|ride| ride.id);

        if let Some(ride) = unfinished {
            tracing::info!(ride_id = ride.id, "resuming unfinished ride");
            self.slot.apply_remote(ride);
        }

        Ok(())
    }

    fn push_notice(&mut self, message: &str) {
        self.notices.push(message.into());
    }
}

#[async_trait]
impl Polling for PassengerLifecycle {
    async fn poll_once(&mut self) -> Result<(), Error> {
        let id = match self.slot.ride() {
            Some(ride) => ride.id,
            None => return Ok(()),
        };

        let fetched = self.api.find_ride(id).await?;
        self.slot.apply_remote(fetched);

        Ok(())
    }

    fn is_polling(&self) -> bool {
        matches!(
            self.phase(),
            Phase::Requested | Phase::Accepted | Phase::InProgress
        )
    }
}

/// The driver's side: watch the pool of open requests, claim or bid on
/// one, then drive the claimed ride to completion.
pub struct DriverLifecycle {
    api: DynAPI,
    username: String,
    slot: RideSlot,
    open_requests: Vec<Ride>,
    notices: Vec<String>,
}

impl DriverLifecycle {
    pub fn new(api: DynAPI, username: impl Into<String>) -> Self {
        Self {
            api,
            username: username.into(),
            slot: RideSlot::new(),
            open_requests: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.slot.phase()
    }

    pub fn active_ride(&self) -> Option<&Ride> {
        self.slot.ride()
    }

    pub fn open_requests(&self) -> &[Ride] {
        &self.open_requests
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn dismiss_notice(&mut self, index: usize) {
        if index < self.notices.len() {
            self.notices.remove(index);
        }
    }

    pub fn reset(&mut self) {
        self.slot.clear();
    }

    /// Claims an open request. Refused locally while another ride is
    /// active, or for rides not currently visible as open.
    #[tracing::instrument(skip(self))]
    pub async fn accept_ride(&mut self, id: RideId) -> Result<(), Error> {
        if self.slot.ride().is_some() {
            return Err(invalid_invocation_error());
        }

        if !self.open_requests.iter().any(|ride| ride.id == id) {
            return Err(invalid_invocation_error());
        }

        match self.api.accept_ride(id).await {
            Ok(ride) => {
                self.open_requests.retain(|open| open.id != id);
                self.slot.apply_remote(ride);

                Ok(())
            }
            Err(err) => {
                // likely claimed by another driver; the next poll
                // drops it from the open list
                self.push_notice("failed to accept ride");
                Err(err)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn start_ride(&mut self) -> Result<(), Error> {
        if self.phase() != Phase::Accepted {
            return Err(invalid_invocation_error());
        }

        let id = match self.slot.ride() {
            Some(ride) => ride.id,
            None => return Err(invalid_invocation_error()),
        };

        match self.api.start_ride(id).await {
            Ok(ride) => {
                self.slot.apply_remote(ride);
                Ok(())
            }
            Err(err) => {
                self.push_notice("failed to start ride");
                Err(err)
            }
        }
    }

    /// Completes the active ride and clears it locally, which stops
    /// the lifecycle's interest in it before the next poll would
    /// re-confirm the terminal status.
    #[tracing::instrument(skip(self))]
    pub async fn complete_ride(&mut self) -> Result<(), Error> {
        if self.phase() != Phase::InProgress {
            return Err(invalid_invocation_error());
        }

        let id = match self.slot.ride() {
            Some(ride) => ride.id,
            None => return Err(invalid_invocation_error()),
        };

        match self.api.complete_ride(id).await {
            Ok(ride) => {
                self.slot.apply_remote(ride);
                Ok(())
            }
            Err(err) => {
                self.push_notice("failed to complete ride");
                Err(err)
            }
        }
    }

    /// Proposes a fare for an open request instead of accepting the
    /// estimate outright. The ride stays an open request until the
    /// passenger takes a bid.
    #[tracing::instrument(skip(self))]
    pub async fn place_bid(&mut self, id: RideId, amount: f64) -> Result<Bid, Error> {
        if !self.open_requests.iter().any(|ride| ride.id == id) {
            return Err(invalid_invocation_error());
        }

        match self.api.place_bid(id, amount).await {
            Ok(bid) => Ok(bid),
            Err(err) => {
                self.push_notice("failed to place bid");
                Err(err)
            }
        }
    }

    fn push_notice(&mut self, message: &str) {
        self.notices.push(message.into());
    }
}

#[async_trait]
impl Polling for DriverLifecycle {
    /// One pass of the driver's reconciliation: fetch the requester's
    /// view, reconcile my active ride against it, and replace the open
    /// request pool.
    async fn poll_once(&mut self) -> Result<(), Error> {
        let rides = self.api.list_rides().await?;

        if let Some(id) = self.slot.ride().map(|ride| ride.id) {
            if let Some(fetched) = rides.iter().find(|ride| ride.id == id) {
                self.slot.apply_remote(fetched.clone());
            }
        } else if self.phase() == Phase::Idle {
            // restart recovery: an assignment of mine already exists
            let mine = rides
                .iter()
                .find(|ride| ride.status.is_active() && ride.is_driven_by(&self.username));

            if let Some(ride) = mine {
                tracing::info!(ride_id = ride.id, "resuming active assignment");
                self.slot.apply_remote(ride.clone());
            }
        }

        self.open_requests = rides
            .into_iter()
            .filter(|ride| ride.status == RideStatus::Requested)
            .collect();

        Ok(())
    }

    fn is_polling(&self) -> bool {
        true
    }
}
