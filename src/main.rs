use std::sync::Arc;

use tokio::sync::Mutex;

use rickshare::api::DynAPI;
use rickshare::chat::ChatFeed;
use rickshare::config::Config;
use rickshare::entities::VehicleType;
use rickshare::error::Error;
use rickshare::feed::{DynPositionSource, PositionFeed, SimulatedPosition, UnsupportedPosition};
use rickshare::gateway::Gateway;
use rickshare::lifecycle::{spawn_poller, DriverLifecycle, PassengerLifecycle};
use rickshare::session::{FileStore, Principal, Restore, Role, SessionStore};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let mut session = SessionStore::new(Box::new(FileStore::new(config.credential_path.clone())));
    let api: DynAPI = Arc::new(Gateway::new(&config, session.handle()));

    let principal = authenticate(&mut session, &api).await?;
    tracing::info!(username = %principal.username, role = %principal.role.name(), "signed in");

    let source: DynPositionSource = if config.simulate_location {
        Arc::new(SimulatedPosition::new(config.simulation_origin))
    } else {
        Arc::new(UnsupportedPosition)
    };

    match principal.role {
        Role::Driver => run_driver(api, &config, source, principal.username).await,
        Role::Rider => run_passenger(api, &config, source).await,
    }
}

/// Restores the persisted session, falling back to a fresh login with
/// the credentials from the environment.
async fn authenticate(session: &mut SessionStore, api: &DynAPI) -> Result<Principal, Error> {
    if session.restore(api.as_ref()).await? == Restore::Authenticated {
        if let Some(principal) = session.principal() {
            return Ok(principal.clone());
        }
    }

    let username = std::env::var("RICKSHARE_USERNAME")?;
    let password = std::env::var("RICKSHARE_PASSWORD")?;

    session.login(api.as_ref(), &username, &password).await
}

async fn run_driver(
    api: DynAPI,
    config: &Config,
    source: DynPositionSource,
    username: String,
) -> Result<(), Error> {
    let machine = Arc::new(Mutex::new(DriverLifecycle::new(api.clone(), username)));

    let poller = spawn_poller("driver", config.lifecycle_interval, machine.clone());
    let feed = PositionFeed::broadcast(
        api,
        config.position_interval,
        source,
        VehicleType::Rickshaw,
    );

    wait_for_shutdown().await?;

    futures::future::join(poller.cancel(), feed.stop()).await;

    Ok(())
}

async fn run_passenger(
    api: DynAPI,
    config: &Config,
    source: DynPositionSource,
) -> Result<(), Error> {
    let mut machine = PassengerLifecycle::new(api.clone());
    machine.resume().await?;

    let chat = machine
        .ride()
        .map(|ride| ChatFeed::start(api.clone(), ride.id, config.chat_interval));

    let machine = Arc::new(Mutex::new(machine));
    let poller = spawn_poller("passenger", config.lifecycle_interval, machine.clone());
    let feed = PositionFeed::observe(api, config.position_interval, source);

    wait_for_shutdown().await?;

    futures::future::join(poller.cancel(), feed.stop()).await;

    if let Some(chat) = chat {
        chat.stop().await;
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<(), Error> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    Ok(())
}
