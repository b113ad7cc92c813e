//! HTTP prediction service.
//!
//! `POST /predict` scores one feature vector, `GET /health` reports whether
//! a model is loaded. The fitted model is loaded (or trained) once at
//! startup and then shared read-only by every request.
pub mod api;
pub mod error;
pub mod handlers;
pub mod schema;
pub mod state;

pub use api::create_router;
pub use state::AppState;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use croprec_classifiers::config::ForestConfig;
use croprec_classifiers::io::read_dataset;
use croprec_classifiers::CropPredictor;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_MODEL_PATH: &str = "crop_predictor_model.bin";
pub const DEFAULT_DATA_PATH: &str = "Crop_recommendation.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Bundle loaded at startup, written there when training is needed.
    pub model_path: PathBuf,
    /// Dataset used when no bundle exists yet.
    pub data_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl ServiceConfig {
    /// Build a config from `HOST`, `PORT`, `CROPREC_MODEL_PATH` and
    /// `CROPREC_DATA_PATH` as returned by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        ServiceConfig {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            model_path: lookup("CROPREC_MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
            data_path: lookup("CROPREC_DATA_PATH")
                .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())
                .into(),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

/// Load the bundle at `model_path`, or train one from `data_path` and save
/// it there when the bundle does not exist yet.
pub fn load_or_train(model_path: &Path, data_path: &Path) -> Result<CropPredictor> {
    let mut predictor = CropPredictor::new(ForestConfig::default());

    if model_path.exists() {
        predictor
            .load_model(model_path)
            .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
        log::info!("Loaded model from {}", model_path.display());
        return Ok(predictor);
    }

    log::warn!(
        "No model found at {}, training from {}",
        model_path.display(),
        data_path.display()
    );
    let dataset = read_dataset(data_path)
        .with_context(|| format!("Failed to load training data: {}", data_path.display()))?;
    dataset.log_input_data_summary();

    let report = predictor.train_with_report(&dataset).context("Training failed")?;
    report.log_summary();
    predictor
        .save_model(model_path)
        .with_context(|| format!("Failed to save model to {}", model_path.display()))?;
    log::info!("Model saved to {}", model_path.display());

    Ok(predictor)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for ctrl+c: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received, stopping server");
}

pub async fn run_server(config: ServiceConfig, state: AppState) -> Result<()> {
    let addr = config.socket_addr()?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Crop recommendation service listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server shut down cleanly");
    Ok(())
}

/// Prepare the model, then serve on a multi-threaded tokio runtime until
/// ctrl+c.
pub fn run_service(config: ServiceConfig) -> Result<()> {
    let predictor = load_or_train(&config.model_path, &config.data_path)?;
    let state = AppState::from_predictor(&predictor);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    runtime.block_on(run_server(config, state))
}
