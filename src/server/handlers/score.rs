use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::server::schema::ValidationErrors;
use crate::server::services::scoring::{self, ScoreRequest, ScoreResponse};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: ValidationErrors,
}

/// Takes the body as a raw JSON value so blank and mistyped fields come
/// back as field errors rather than an extractor rejection.
pub async fn score(
    Json(body): Json<Value>,
) -> Result<Json<ScoreResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request: ScoreRequest = scoring::request_shape().parse_value(&body).map_err(|fields| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: fields.to_string(),
                fields,
            }),
        )
    })?;

    let response = scoring::score(&request);
    info!(
        molecule = %response.molecule,
        disease = %response.disease,
        score = response.repurpose_score,
        analysis_id = %response.analysis_id,
        "scored repurposing candidate"
    );
    Ok(Json(response))
}
