use crate::errors::Error;
use libris_core::config::{AppConfig, ConfigError};
use libris_core::database::Db;
use libris_core::notify::{LogNavigator, LogNotifier};
use std::path::Path;
use tracing::info;

/// Everything a command runs against
pub struct AppState {
    pub db: Db,
    /// Only commands that upload files need the media host settings, so a missing configuration
    /// is reported when one of them runs
    config: Result<AppConfig, ConfigError>,
    pub notifier: LogNotifier,
    pub navigator: LogNavigator,
}

impl AppState {
    pub async fn open(database_path: &Path) -> Result<Self, Error> {
        info!("Opening catalog database at {}", database_path.display());
        let db = Db::init(database_path).await?;

        let config = AppConfig::from_env();
        if let Some(err) = config.as_ref().err() {
            info!("Uploads disabled: {err}");
        }

        Ok(Self::new(db, config))
    }

    pub fn new(db: Db, config: Result<AppConfig, ConfigError>) -> Self {
        Self {
            db,
            config,
            notifier: LogNotifier::default(),
            navigator: LogNavigator::default(),
        }
    }

    pub fn config(&self) -> Result<&AppConfig, Error> {
        self.config.as_ref().map_err(|err| Error::Config(err.clone()))
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}
