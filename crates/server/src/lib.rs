use axum::{Json, http::HeaderMap, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, run, run_with_listener};

mod balances;
mod confirmations;
mod server;
mod transactions;

pub mod types {
    pub mod transaction {
        pub use api_types::transaction::{
            Adjustment, AdjustmentKind, LineItemNew, LineItemView, PaymentNew, PaymentTarget,
            PaymentView, PriceMode, StockDeltaView, StockLocation, TransactionCancel,
            TransactionCreated, TransactionKind, TransactionList, TransactionListResponse,
            TransactionNew, TransactionStatus, TransactionUpdate, TransactionView,
        };
    }

    pub mod balance {
        pub use api_types::balance::{ClosingBalanceView, TargetBalance};
    }

    pub mod confirmation {
        pub use api_types::confirmation::{ConfirmationAck, ConfirmationStatusView};
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// The `x-actor` header was missing or empty.
    MissingActor,
    /// The day still needs its confirmation before money can move.
    ConfirmationRequired,
    Generic(String),
}

//TODO: Find a better solution
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::AlreadyCancelled(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Validation(_)
        | EngineError::QuantityInvalid(_)
        | EngineError::PaymentExceedsTotal(_)
        | EngineError::InsufficientBalance(_)
        | EngineError::EditWindowExpired(_)
        | EngineError::CostImmutable(_)
        | EngineError::CancelWindowExpired(_)
        | EngineError::RefundRequired(_)
        | EngineError::RefundTargetInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::MissingActor => (
                StatusCode::BAD_REQUEST,
                "missing x-actor header".to_string(),
            ),
            ServerError::ConfirmationRequired => (
                StatusCode::CONFLICT,
                "daily confirmation required before new transactions".to_string(),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// The acting user, taken from the `x-actor` header. Identity is the
/// surrounding system's concern; this surface only needs a name to stamp
/// on writes.
pub(crate) fn require_actor(headers: &HeaderMap) -> Result<String, ServerError> {
    headers
        .get("x-actor")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .ok_or(ServerError::MissingActor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_already_cancelled_maps_to_409() {
        let res =
            ServerError::from(EngineError::AlreadyCancelled("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::Validation("x".to_string()),
            EngineError::QuantityInvalid("x".to_string()),
            EngineError::PaymentExceedsTotal("x".to_string()),
            EngineError::InsufficientBalance("x".to_string()),
            EngineError::EditWindowExpired("x".to_string()),
            EngineError::CostImmutable("x".to_string()),
            EngineError::CancelWindowExpired("x".to_string()),
            EngineError::RefundRequired("x".to_string()),
            EngineError::RefundTargetInvalid("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn missing_actor_maps_to_400() {
        let res = ServerError::MissingActor.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn confirmation_required_maps_to_409() {
        let res = ServerError::ConfirmationRequired.into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn actor_header_is_trimmed_and_required() {
        let mut headers = HeaderMap::new();
        assert!(require_actor(&headers).is_err());

        headers.insert("x-actor", " giulia ".parse().unwrap());
        assert_eq!(require_actor(&headers).unwrap(), "giulia");
    }
}
