//! Runs the BirdLens API.
//!
//! `BIRDLENS_DATA_DIR` picks where the config, database, and media live
//! (default: `./birdlens-data`). `BIRDLENS_BIND` overrides the bind address.

use std::{env, str::FromStr as _};

use camino::Utf8PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

use birdlens::{
    api::{build_router, AppState},
    config::Config,
    database::Database,
    error::{BirdLensError, MediaError},
};

const DEFAULT_DATA_DIR: &str = "birdlens-data";
const DEFAULT_LOG_FILTER: &str = "INFO,sqlx=WARN";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str(DEFAULT_LOG_FILTER))
        .unwrap_or_else(|_| EnvFilter::new("INFO"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), BirdLensError> {
    init_tracing();

    let data_dir = Utf8PathBuf::from(
        env::var("BIRDLENS_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()),
    );

    let mut config = Config::load_or_default(&data_dir)
        .await
        .inspect_err(|e| tracing::error!("Couldn't load the config! err: {e}"))?;
    if let Ok(bind) = env::var("BIRDLENS_BIND") {
        config.bind_addr = bind;
    }

    let media_dir = config.media_dir();
    tokio::fs::create_dir_all(&media_dir)
        .await
        .map_err(|err| MediaError::WriteFailed {
            path: media_dir.to_string(),
            err,
        })?;

    let db = Database::connect(&config.database_path()).await?;

    let addr = config.bind_addr.clone();
    let app = build_router(AppState::new(db, config));

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|err| BirdLensError::ServeFailed {
            addr: addr.clone(),
            err,
        })?;
    tracing::info!("birdlens listening on `{addr}`");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("couldn't listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down...");
        })
        .await
        .map_err(|err| BirdLensError::ServeFailed { addr, err })
}
