//! The parent of the other tests.
//!
//! Mostly to import the setup stuff below.

use std::str::FromStr as _;

use birdlens::{
    api::{build_router, AppState},
    config::Config,
    database::Database,
};
use camino::Utf8PathBuf;
use temp_dir::TempDir;
use tracing_subscriber::{filter, layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer};

/// Everything a test needs. Keep it alive for the whole test, or the data
/// directory vanishes.
#[allow(dead_code, reason = "it's used in the other tests")]
pub struct Setup {
    pub dir: TempDir,
    pub config: Config,
    pub db: Database,
}

impl Setup {
    #[allow(dead_code, reason = "it's used in the other tests")]
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(self.db.clone(), self.config.clone()))
    }
}

/// call this at the top of any new test func! :)
#[allow(dead_code, reason = "it's used in the other tests")]
pub async fn setup() -> Setup {
    // start logging. other tests in this binary may have done it already
    _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_test_writer()
                .with_filter(filter::EnvFilter::from_str("DEBUG,sqlx=INFO").unwrap()),
        )
        .try_init();

    let dir = TempDir::new().expect("make temp dir");
    let data_dir = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");

    let config = Config::with_defaults(data_dir);
    let db = Database::connect(&config.database_path())
        .await
        .expect("connect to test db");

    Setup { dir, config, db }
}
