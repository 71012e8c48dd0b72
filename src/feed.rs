//! Live position feed: a periodic snapshot of online drivers, plus the
//! client's own position fix, broadcast back to the server when running
//! as a driver.

use async_trait::async_trait;
use rand::Rng;
use rand_distr::Uniform;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::api::DynAPI;
use crate::entities::{Coordinates, DriverLocation, PositionReport, VehicleType};
use crate::error::Error;
use crate::poll::Repeater;

/// How long a position fix may take before it is reported as timed out.
const ACQUISITION_TIMEOUT: Duration = Duration::from_secs(20);

/// Simulated fixes land within this many degrees of the origin.
const JITTER_DEGREES: f64 = 0.005;

/// The closed set of ways a position fix can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeolocationError {
    PermissionDenied,
    PositionUnavailable,
    TimedOut,
    Unsupported,
}

impl From<GeolocationError> for Error {
    fn from(err: GeolocationError) -> Self {
        let (code, message) = match err {
            GeolocationError::PermissionDenied => (500, "location permission denied"),
            GeolocationError::PositionUnavailable => (501, "position unavailable"),
            GeolocationError::TimedOut => (502, "timed out waiting for a position fix"),
            GeolocationError::Unsupported => (503, "no position source available"),
        };

        Error {
            code,
            message: message.into(),
        }
    }
}

/// Where position fixes come from. The feed only ever sees this trait,
/// so a simulated source and a real sensor are interchangeable.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

pub type DynPositionSource = Arc<dyn PositionSource>;

/// Takes one fix from the source, converting a hang into `TimedOut`.
pub async fn acquire_position(source: &dyn PositionSource) -> Result<Coordinates, GeolocationError> {
    match tokio::time::timeout(ACQUISITION_TIMEOUT, source.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::TimedOut),
    }
}

/// Jitters fixes uniformly around a fixed origin. Stands in for a real
/// sensor in development and demo environments.
pub struct SimulatedPosition {
    origin: Coordinates,
}

impl SimulatedPosition {
    pub fn new(origin: Coordinates) -> Self {
        Self { origin }
    }
}

#[async_trait]
impl PositionSource for SimulatedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        let jitter = Uniform::new(-JITTER_DEGREES, JITTER_DEGREES);
        let mut rng = rand::thread_rng();

        Ok(Coordinates {
            latitude: self.origin.latitude + rng.sample(jitter),
            longitude: self.origin.longitude + rng.sample(jitter),
        })
    }
}

/// The source of last resort, for builds with no sensor and simulation
/// disabled.
pub struct UnsupportedPosition;

#[async_trait]
impl PositionSource for UnsupportedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// The client's own fix, as last observed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelfPosition {
    Unknown,
    Located(Coordinates),
    Unavailable(GeolocationError),
}

/// Periodically refreshes the driver snapshot, and either takes a
/// single own fix (passenger) or reports one every tick (driver).
///
/// A failed snapshot refresh keeps the previous snapshot; the feed
/// never clears on error.
pub struct PositionFeed {
    drivers: watch::Receiver<Vec<DriverLocation>>,
    position: watch::Receiver<SelfPosition>,
    repeater: Repeater,
}

impl PositionFeed {
    /// Passenger mode: watch the drivers, fix own position once.
    pub fn observe(api: DynAPI, interval: Duration, source: DynPositionSource) -> Self {
        Self::spawn(api, interval, source, None)
    }

    /// Driver mode: watch the drivers and report own position on every
    /// tick as the given vehicle.
    pub fn broadcast(
        api: DynAPI,
        interval: Duration,
        source: DynPositionSource,
        vehicle: VehicleType,
    ) -> Self {
        Self::spawn(api, interval, source, Some(vehicle))
    }

    fn spawn(
        api: DynAPI,
        interval: Duration,
        source: DynPositionSource,
        broadcast: Option<VehicleType>,
    ) -> Self {
        let (drivers_tx, drivers_rx) = watch::channel(Vec::new());
        let (position_tx, position_rx) = watch::channel(SelfPosition::Unknown);

        let drivers_tx = Arc::new(drivers_tx);
        let position_tx = Arc::new(position_tx);
        let mut fix_pending = true;

        let repeater = Repeater::spawn("positions", interval, move || {
            let take_fix = broadcast.is_some() || std::mem::replace(&mut fix_pending, false);

            let api = api.clone();
            let source = source.clone();
            let drivers_tx = drivers_tx.clone();
            let position_tx = position_tx.clone();

            async move {
                if take_fix {
                    match acquire_position(source.as_ref()).await {
                        Ok(coords) => {
                            let _ = position_tx.send(SelfPosition::Located(coords));

                            if let Some(vehicle_type) = broadcast {
                                let report = PositionReport {
                                    latitude: coords.latitude,
                                    longitude: coords.longitude,
                                    vehicle_type,
                                };

                                if let Err(err) = api.report_driver_location(&report).await {
                                    tracing::warn!(code = err.code, "failed to report position");
                                }
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error = ?err, "position fix failed");
                            let _ = position_tx.send(SelfPosition::Unavailable(err));
                        }
                    }
                }

                match api.list_driver_locations().await {
                    Ok(drivers) => {
                        let _ = drivers_tx.send(drivers);
                    }
                    Err(err) => {
                        tracing::warn!(code = err.code, "failed to refresh driver snapshot");
                    }
                }
            }
        });

        Self {
            drivers: drivers_rx,
            position: position_rx,
            repeater,
        }
    }

    /// The latest snapshot of online drivers.
    pub fn drivers(&self) -> Vec<DriverLocation> {
        self.drivers.borrow().clone()
    }

    pub fn position(&self) -> SelfPosition {
        *self.position.borrow()
    }

    pub async fn stop(self) {
        self.repeater.cancel().await;
    }
}
