//! Process-wide service wiring
//!
//! The coordination layer is a set of explicitly constructed instances, built
//! once at application start and handed to the view layer. Nothing here is a
//! global.

use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use tracing::info;

use crate::config::ClientConfig;
use crate::loading::{BusyIndicator, LoadingCoordinator};
use crate::passport::{FilePassportStorage, PassportStore};
use crate::pipeline::RequestPipeline;

/// The wired coordination layer
pub struct Services {
    pub loading: LoadingCoordinator,
    pub pipeline: Arc<RequestPipeline>,
    pub passport: PassportStore,
}

impl Services {
    /// Build and start the layer: coordinator, pipeline, then passport store
    /// (restore plus session probe)
    pub async fn bootstrap(config: &ClientConfig, indicator: Arc<dyn BusyIndicator>) -> Result<Self> {
        config.validate()?;

        let loading = LoadingCoordinator::new(
            indicator,
            Duration::from_millis(config.loading.watchdog_timeout_ms),
        );

        let pipeline = Arc::new(
            RequestPipeline::new(&config.api, loading.clone()).context("Failed to build the request pipeline")?,
        );

        let storage = Arc::new(FilePassportStorage::new(config.storage.passport_path.clone()));
        let passport = PassportStore::bootstrap(pipeline.clone(), storage).await;

        info!(base_url = %config.api.base_url, "Coordination layer started");
        Ok(Self {
            loading,
            pipeline,
            passport,
        })
    }
}
