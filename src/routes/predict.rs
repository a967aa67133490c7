use crate::app::AppState;
use crate::error::InternalError;
use crate::models::forecast::{DEFAULT_CITY, Forecast};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/predict", get(get_forecast))
        .with_state(state)
}

// Raw pairs so that a repeated parameter is not an error; the first one wins.
type QueryPairs = Vec<(String, String)>;

fn first_city(pairs: &[(String, String)]) -> Option<&str> {
    pairs
        .iter()
        .find(|(key, _)| key == "city")
        .map(|(_, value)| value.as_str())
}

async fn get_forecast(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<Forecast>, InternalError> {
    // An empty `city=` is kept as is, only a missing parameter falls back.
    let city = first_city(&pairs).unwrap_or(DEFAULT_CITY);
    Ok(Json(state.forecaster.forecast(city)?))
}
