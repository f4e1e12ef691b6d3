use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{balances, confirmations, transactions};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/v1/transactions", post(transactions::create))
        .route("/v1/transactions/list", post(transactions::list))
        .route(
            "/v1/transactions/{id}",
            get(transactions::get).put(transactions::update),
        )
        .route("/v1/transactions/{id}/cancel", post(transactions::cancel))
        .route(
            "/v1/transactions/{id}/payments",
            post(transactions::add_payment),
        )
        .route("/v1/balances/{date}", get(balances::get))
        .route(
            "/v1/confirmations/{date}",
            get(confirmations::status).post(confirmations::confirm),
        )
        .with_state(state)
}

pub async fn run(engine: Engine) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let state = ServerState {
        engine: Arc::new(engine),
    };
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use engine::{FixedClock, MoneyCents, PaymentTarget};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::Database;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const ACTOR: &str = "giulia";

    async fn state_at(now: &str) -> ServerState {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let clock = FixedClock::at(
            chrono::NaiveDateTime::parse_from_str(now, "%Y-%m-%d %H:%M").unwrap(),
        );
        let engine = Engine::builder()
            .database(db)
            .clock(clock)
            .build()
            .await
            .unwrap();
        ServerState {
            engine: Arc::new(engine),
        }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-actor", ACTOR)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_is_gated_until_the_day_is_confirmed() {
        let state = state_at("2026-03-02 09:00").await;
        let engine = Arc::clone(&state.engine);
        let app = router(state);

        // Yesterday's opening balance means there is something to reconcile.
        let yesterday = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        engine
            .record_opening_balance(yesterday, PaymentTarget::Cash, MoneyCents::new(10_000), ACTOR)
            .await
            .unwrap();
        let product_id = engine.new_product("Farina 00", 0, 0).await.unwrap();

        let payload = json!({
            "kind": "purchase",
            "counterparty_name": "Molino Rossi",
            "trade_date": "2026-03-02",
            "items": [{
                "product_id": product_id,
                "quantity_front": 5,
                "quantity_warehouse": 0,
                "price_mode": "per_unit",
                "price": "10.00",
                "discount": null,
            }],
            "payments": [{"target": "cash", "amount": "50.00"}],
            "discount": null,
            "tax": null,
            "idempotency_key": null,
        });

        let response = app
            .clone()
            .oneshot(post_json("/v1/transactions", payload.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(post_json("/v1/confirmations/2026-03-02", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(post_json("/v1/transactions", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["transaction"]["status"], "completed");
        assert_eq!(body["transaction"]["remaining_balance"], "0.00");
        assert_eq!(body["applied_stock_deltas"][0]["delta"], 5);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/balances/2026-03-02")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["cash"], "50.00");
    }

    #[tokio::test]
    async fn create_without_actor_is_rejected() {
        let state = state_at("2026-03-02 09:00").await;
        let app = router(state);

        let payload = json!({
            "kind": "sale",
            "counterparty_name": "Banco 3",
            "trade_date": "2026-03-02",
            "items": [],
        });
        let request = Request::builder()
            .method("POST")
            .uri("/v1/transactions")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_transaction_is_404() {
        let state = state_at("2026-03-02 09:00").await;
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!(
                        "/v1/transactions/{}",
                        uuid::Uuid::new_v4()
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
