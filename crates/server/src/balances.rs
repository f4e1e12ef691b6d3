//! Closing balance API endpoint

use api_types::balance::{ClosingBalanceView, TargetBalance};
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::NaiveDate;

use engine::ClosingBalanceSnapshot;

use crate::{ServerError, server::ServerState};

pub(crate) fn snapshot_view(snapshot: ClosingBalanceSnapshot) -> ClosingBalanceView {
    let mut banks: Vec<TargetBalance> = snapshot
        .banks
        .into_iter()
        .map(|(id, balance)| TargetBalance {
            id,
            balance: balance.to_string(),
        })
        .collect();
    banks.sort_by_key(|b| b.id);

    let mut cards: Vec<TargetBalance> = snapshot
        .cards
        .into_iter()
        .map(|(id, balance)| TargetBalance {
            id,
            balance: balance.to_string(),
        })
        .collect();
    cards.sort_by_key(|c| c.id);

    ClosingBalanceView {
        date: snapshot.date,
        cash: snapshot.cash.to_string(),
        banks,
        cards,
    }
}

pub async fn get(
    State(state): State<ServerState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<ClosingBalanceView>, ServerError> {
    let snapshot = state.engine.closing_balance(date).await?;
    Ok(Json(snapshot_view(snapshot)))
}
