use axum::{extract::State, http::StatusCode, Form, Json};
use serde::Serialize;

use crate::server::config::AppState;
use crate::server::schema::RawFields;
use crate::server::services::actions::{ActionError, ActionState};
use crate::server::services::flows::{
    competitor_filings::CompetitorFilingAlert, molecule_what_if::MoleculeWhatIfOutput,
    off_label_signals::OffLabelSignalSet,
};

type ActionResponse<T> = (StatusCode, Json<ActionState<T>>);

fn respond<T: Serialize>(state: ActionState<T>) -> ActionResponse<T> {
    let status = match &state.error {
        None => StatusCode::OK,
        Some(ActionError::Validation { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(ActionError::Flow { .. }) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(state))
}

pub async fn simulator(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> ActionResponse<MoleculeWhatIfOutput> {
    let raw = RawFields::from(pairs);
    respond(state.actions.simulator.run(&state.backend, &raw).await)
}

pub async fn repurpose_bot(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> ActionResponse<OffLabelSignalSet> {
    let raw = RawFields::from(pairs);
    respond(state.actions.repurpose.run(&state.backend, &raw).await)
}

pub async fn radar(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> ActionResponse<CompetitorFilingAlert> {
    let raw = RawFields::from(pairs);
    respond(state.actions.radar.run(&state.backend, &raw).await)
}
