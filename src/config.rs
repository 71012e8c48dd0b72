use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::entities::Coordinates;
use crate::error::{invalid_input_error, Error};

/// Environment-driven configuration. `RICKSHARE_API_BASE` is the only
/// required variable; everything else has the defaults the remote
/// service was observed with.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub credential_path: PathBuf,
    pub lifecycle_interval: Duration,
    pub chat_interval: Duration,
    pub position_interval: Duration,
    pub simulate_location: bool,
    pub simulation_origin: Coordinates,
}

impl Config {
    #[tracing::instrument]
    pub fn from_env() -> Result<Self, Error> {
        let api_base = env::var("RICKSHARE_API_BASE")?
            .trim_end_matches('/')
            .to_string();

        let credential_path = env::var("RICKSHARE_CREDENTIALS")
            .unwrap_or_else(|_| ".rickshare/credentials.json".into())
            .into();

        Ok(Self {
            api_base,
            credential_path,
            lifecycle_interval: seconds_var("RICKSHARE_LIFECYCLE_INTERVAL", 3)?,
            chat_interval: seconds_var("RICKSHARE_CHAT_INTERVAL", 3)?,
            position_interval: seconds_var("RICKSHARE_POSITION_INTERVAL", 5)?,
            simulate_location: flag_var("RICKSHARE_SIMULATE_LOCATION"),
            simulation_origin: Coordinates {
                latitude: float_var("RICKSHARE_ORIGIN_LATITUDE", 23.8103)?,
                longitude: float_var("RICKSHARE_ORIGIN_LONGITUDE", 90.4125)?,
            },
        })
    }
}

fn seconds_var(name: &str, default: u64) -> Result<Duration, Error> {
    match env::var(name) {
        Ok(raw) => {
            let seconds = raw.parse().map_err(|_| invalid_input_error())?;
            Ok(Duration::from_secs(seconds))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

fn float_var(name: &str, default: f64) -> Result<f64, Error> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| invalid_input_error()),
        Err(_) => Ok(default),
    }
}

fn flag_var(name: &str) -> bool {
    matches!(env::var(name).as_deref(), Ok("1") | Ok("true"))
}
