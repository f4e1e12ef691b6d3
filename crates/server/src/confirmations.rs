//! Daily confirmation API endpoints

use api_types::confirmation::{ConfirmationAck, ConfirmationStatusView};
use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use chrono::NaiveDate;

use crate::{ServerError, balances::snapshot_view, require_actor, server::ServerState};

pub async fn status(
    State(state): State<ServerState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<ConfirmationStatusView>, ServerError> {
    let status = state.engine.confirmation_status(date).await?;
    Ok(Json(ConfirmationStatusView {
        confirmed: status.confirmed,
        needs_confirmation: status.needs_confirmation,
        previous_snapshot: snapshot_view(status.previous_snapshot),
    }))
}

pub async fn confirm(
    State(state): State<ServerState>,
    Path(date): Path<NaiveDate>,
    headers: HeaderMap,
) -> Result<Json<ConfirmationAck>, ServerError> {
    let actor = require_actor(&headers)?;
    let confirmation = state.engine.confirm(date, &actor).await?;
    Ok(Json(ConfirmationAck {
        date: confirmation.date,
        confirmed_by: confirmation.confirmed_by,
        confirmed_at: confirmation.confirmed_at,
    }))
}
