use axum::Router;
use axum::http::{HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::calendar::DateResolver;
use crate::config::{ConfigError, Settings};
use crate::epoch::read_epoch;
use crate::error::StartupError;
use crate::forecaster::Forecaster;
use crate::models::regressor::ModelPair;
use crate::routes::predict;

// Anything that goes in here must be a handle or pointer that can be cloned.
// The underlying state itself should be shared.
#[derive(Clone)]
pub struct AppState {
    pub forecaster: Arc<Forecaster>,
}

pub fn create_forecaster(settings: &Settings) -> Result<Forecaster, StartupError> {
    let timezone = settings.timezone()?;
    let epoch = read_epoch(&settings.dataset_path)?;
    log::info!(
        "using epoch {} from {}",
        epoch,
        settings.dataset_path.display()
    );
    let anchored_epoch = epoch.anchor(timezone)?;
    let models = ModelPair::load(&settings.model_max_path, &settings.model_min_path)?;
    log::info!("forecasting tomorrow as seen from {}", timezone);
    Ok(Forecaster::new(
        DateResolver::new(timezone, anchored_epoch),
        models,
    ))
}

/// Browsers may only call with GET. An empty origin list allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, ConfigError> {
    let cors = CorsLayer::new().allow_methods([Method::GET]);
    if allowed_origins.is_empty() {
        return Ok(cors.allow_origin(Any));
    }
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cors.allow_origin(AllowOrigin::list(origins)))
}

pub fn create_app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(predict::routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
