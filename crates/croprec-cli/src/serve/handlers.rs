//! Route handlers.
use axum::{body::Bytes, extract::State, Json};

use croprec_classifiers::PredictorError;

use super::error::ApiResult;
use super::schema::{HealthResponse, PredictRequest, PredictResponse};
use super::state::AppState;

pub async fn predict(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<PredictResponse>> {
    let model = state.model().ok_or(PredictorError::Untrained)?;
    let request = PredictRequest::from_slice(&body)?;

    let prediction = model.predict(&request.features)?;
    log::debug!(
        "Predicted {} ({:.3}) for {:?}",
        prediction.recommended_crop,
        prediction.top_probability(),
        request.features
    );
    Ok(Json(prediction.into()))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.model().is_some(),
        classes: state.model().map_or(0, |m| m.classes().len()),
    })
}
