//! Wiring: logging, API client, login, store, then the polling loop.

use std::future::Future;
use std::sync::Arc;

use qbweb_api::{ApiClient, ClientConfig};
use qbweb_store::{FileStorage, Store, StoreChange};
use qbweb_telemetry::LoggingConfig;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::settings::AppSettings;

/// Entry point for the runner: read the environment, install logging and
/// poll until Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration, logging, login or the initial
/// requests fail.
pub async fn run_app() -> AppResult<()> {
    let settings = AppSettings::from_env()?;
    let logging = LoggingConfig {
        format: settings.log_format,
        ..LoggingConfig::default()
    };
    qbweb_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    run_until(&settings, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c; stopping");
        }
    })
    .await?;
    info!("qbweb runner stopped");
    Ok(())
}

/// Connect with `settings` and keep the store current until `shutdown`
/// resolves. Returns the store for inspection.
///
/// Poll failures are logged and retried at the next tick.
///
/// # Errors
///
/// Returns an error if the client cannot be built, the daemon rejects the
/// login, or the initial version/preferences requests fail.
pub async fn run_until(
    settings: &AppSettings,
    shutdown: impl Future<Output = ()>,
) -> AppResult<Arc<Store>> {
    let client_config = ClientConfig::parse(&settings.base_url)
        .map_err(|err| AppError::api("client.config", err))?
        .with_timeout(settings.timeout);
    let api = Arc::new(
        ApiClient::new(&client_config).map_err(|err| AppError::api("client.new", err))?,
    );

    if let Some(credentials) = &settings.credentials {
        let response = api
            .login(credentials)
            .await
            .map_err(|err| AppError::api("auth.login", err))?;
        if !response.is_authenticated() {
            return Err(AppError::LoginRejected {
                status: response.status,
                body: response.body,
            });
        }
        info!(username = %credentials.username, "logged in");
    }

    let version = api
        .app_version()
        .await
        .map_err(|err| AppError::api("app.version", err))?;
    info!(daemon = %client_config.base_url, version = %version, "connected");

    let storage = Arc::new(FileStorage::new(&settings.state_dir));
    let store = Arc::new(Store::new(Arc::clone(&api), storage));
    store
        .fetch_preferences()
        .await
        .map_err(|err| AppError::store("store.fetch_preferences", err))?;

    let watcher = spawn_change_logger(store.subscribe());
    poll_loop(&store, shutdown).await;
    watcher.abort();

    Ok(store)
}

async fn poll_loop(store: &Store, shutdown: impl Future<Output = ()>) {
    let period = store.config().poll_interval();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_ms = period.as_millis(), "polling main data");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                match store.poll_main_data().await {
                    Ok(()) => log_summary(store),
                    Err(err) => warn!(error = %err, "main data poll failed"),
                }
            }
        }
    }
}

fn log_summary(store: &Store) {
    let Some(data) = store.main_data() else {
        return;
    };
    debug!(
        rid = data.rid,
        torrents = data.torrents.len(),
        categories = data.categories.len(),
        tags = data.tags.len(),
        connection = %data.server_state.connection_status,
        dl_speed = data.server_state.dl_info_speed,
        up_speed = data.server_state.up_info_speed,
        "main data current"
    );
}

fn spawn_change_logger(mut changes: broadcast::Receiver<StoreChange>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => debug!(?change, "store changed"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "store change logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
