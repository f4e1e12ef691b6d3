use chrono::{Duration, NaiveDate, NaiveDateTime};
use sea_orm::{ConnectionTrait, Database, Statement};

use engine::{
    AddPaymentCmd, CreateTransactionCmd, Engine, EngineError, FixedClock, LineItemDraft,
    MoneyCents, PaymentDraft, PaymentTarget, PriceMode, TradeKind, TransactionStatus,
};
use migration::MigratorTrait;

const ACTOR: &str = "alice";

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0).unwrap()
}

async fn engine_at(now: NaiveDateTime) -> (Engine, FixedClock, sea_orm::DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let clock = FixedClock::at(now);
    let engine = Engine::builder()
        .database(db.clone())
        .clock(clock.clone())
        .build()
        .await
        .unwrap();
    (engine, clock, db)
}

fn unit_item(product_id: uuid::Uuid, front: i64, price_cents: i64) -> LineItemDraft {
    LineItemDraft::new(product_id, PriceMode::PerUnit, MoneyCents::new(price_cents)).front(front)
}

fn cash(cents: i64) -> PaymentDraft {
    PaymentDraft::new(PaymentTarget::Cash, MoneyCents::new(cents))
}

#[tokio::test]
async fn closing_balance_rolls_forward_day_by_day() {
    let d1 = day(2026, 3, 2);
    let d2 = d1 + Duration::days(1);
    let (engine, clock, _db) = engine_at(at(d1, 9, 0)).await;

    engine
        .record_opening_balance(d1, PaymentTarget::Cash, MoneyCents::new(100_000), ACTOR)
        .await
        .unwrap();
    let product_id = engine.new_product("Acqua", 100, 0).await.unwrap();

    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Bar Centrale", d1, ACTOR)
        .item(unit_item(product_id, 10, 2_000))
        .payment(cash(20_000));
    engine.create_transaction(cmd).await.unwrap();

    clock.set(at(d2, 10, 0));
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Enoteca Blu", d2, ACTOR)
        .item(unit_item(product_id, 15, 2_000))
        .payment(cash(30_000));
    engine.create_transaction(cmd).await.unwrap();

    let s1 = engine.closing_balance(d1).await.unwrap();
    let s2 = engine.closing_balance(d2).await.unwrap();
    assert_eq!(s1.cash.cents(), 120_000);
    assert_eq!(s2.cash.cents(), 150_000);

    // snapshot(d).balance(t) == snapshot(d-1).balance(t) + net(d, t)
    let net_d2: i64 = engine
        .ledger_entries(d2)
        .await
        .unwrap()
        .iter()
        .filter(|e| e.target == PaymentTarget::Cash)
        .map(|e| e.signed_cents())
        .sum();
    assert_eq!(s2.cash.cents(), s1.cash.cents() + net_d2);

    // A quiet day carries yesterday's closing balance unchanged.
    let s3 = engine.closing_balance(d2 + Duration::days(1)).await.unwrap();
    assert_eq!(s3.cash, s2.cash);
}

#[tokio::test]
async fn late_payment_on_an_old_date_heals_later_snapshots() {
    let d1 = day(2026, 3, 2);
    let d2 = d1 + Duration::days(1);
    let (engine, clock, _db) = engine_at(at(d1, 9, 0)).await;

    let product_id = engine.new_product("Olio EVO", 20, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Bar Centrale", d1, ACTOR)
        .item(unit_item(product_id, 5, 10_000))
        .payment(cash(30_000));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);

    // Cache the later day before the ledger changes under it.
    clock.set(at(d2, 9, 0));
    let stale = engine.closing_balance(d2).await.unwrap();
    assert_eq!(stale.cash.cents(), 30_000);

    // The late payment attributes to the transaction's business date, so
    // the cached day after it is dropped and re-derives.
    engine
        .add_payment(AddPaymentCmd::new(tx.id, cash(20_000), ACTOR))
        .await
        .unwrap();

    let healed_d1 = engine.closing_balance(d1).await.unwrap();
    let healed_d2 = engine.closing_balance(d2).await.unwrap();
    assert_eq!(healed_d1.cash.cents(), 50_000);
    assert_eq!(healed_d2.cash.cents(), 50_000);
}

#[tokio::test]
async fn recompute_rebuilds_the_requested_date() {
    let d1 = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(at(d1, 9, 0)).await;

    let product_id = engine.new_product("Caffè", 30, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Bar Centrale", d1, ACTOR)
        .item(unit_item(product_id, 3, 5_000))
        .payment(cash(15_000));
    engine.create_transaction(cmd).await.unwrap();

    let recomputed = engine.recompute_closing_balance(d1).await.unwrap();
    assert_eq!(recomputed.cash.cents(), 15_000);
    assert_eq!(engine.closing_balance(d1).await.unwrap().cash.cents(), 15_000);
}

#[tokio::test]
async fn snapshots_track_bank_and_card_targets_separately() {
    let d1 = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(at(d1, 9, 0)).await;

    let product_id = engine.new_product("Vino", 50, 0).await.unwrap();
    let account_id = engine.new_bank_account("Intesa").await.unwrap();
    let card_id = engine.new_card("POS 1").await.unwrap();

    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Enoteca Blu", d1, ACTOR)
        .item(unit_item(product_id, 10, 8_000))
        .payment(PaymentDraft::new(
            PaymentTarget::Bank { account_id },
            MoneyCents::new(50_000),
        ))
        .payment(PaymentDraft::new(
            PaymentTarget::Card { card_id },
            MoneyCents::new(30_000),
        ));
    engine.create_transaction(cmd).await.unwrap();

    let snapshot = engine.closing_balance(d1).await.unwrap();
    assert_eq!(snapshot.cash, MoneyCents::ZERO);
    assert_eq!(
        snapshot.balance(&PaymentTarget::Bank { account_id }).cents(),
        50_000
    );
    assert_eq!(
        snapshot.balance(&PaymentTarget::Card { card_id }).cents(),
        30_000
    );
}

#[tokio::test]
async fn opening_balance_is_a_one_time_addend() {
    let d1 = day(2026, 3, 2);
    let d2 = d1 + Duration::days(1);
    let (engine, _clock, _db) = engine_at(at(d1, 9, 0)).await;

    engine
        .record_opening_balance(d2, PaymentTarget::Cash, MoneyCents::new(5_000), ACTOR)
        .await
        .unwrap();

    assert_eq!(engine.closing_balance(d1).await.unwrap().cash.cents(), 0);
    assert_eq!(engine.closing_balance(d2).await.unwrap().cash.cents(), 5_000);

    let err = engine
        .record_opening_balance(d2, PaymentTarget::Cash, MoneyCents::new(1), ACTOR)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .record_opening_balance(
            d2,
            PaymentTarget::Bank {
                account_id: uuid::Uuid::new_v4(),
            },
            MoneyCents::new(1_000),
            ACTOR,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn confirming_twice_is_a_no_op() {
    let d1 = day(2026, 3, 2);
    let d2 = d1 + Duration::days(1);
    let (engine, clock, db) = engine_at(at(d1, 9, 0)).await;

    engine
        .record_opening_balance(d1, PaymentTarget::Cash, MoneyCents::new(10_000), ACTOR)
        .await
        .unwrap();

    clock.set(at(d2, 9, 0));
    assert!(engine.needs_confirmation(d2).await.unwrap());

    let first = engine.confirm(d2, ACTOR).await.unwrap();
    assert!(!engine.needs_confirmation(d2).await.unwrap());

    clock.set(at(d2, 11, 0));
    let second = engine.confirm(d2, "bruno").await.unwrap();
    assert_eq!(second, first);
    assert!(!engine.needs_confirmation(d2).await.unwrap());

    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM daily_confirmations;",
        ))
        .await
        .unwrap()
        .unwrap();
    let count: i64 = row.try_get("", "n").unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn confirmation_waits_for_the_cutoff_and_for_history() {
    let d1 = day(2026, 3, 2);
    let d2 = d1 + Duration::days(1);
    let (engine, clock, _db) = engine_at(at(d2, 5, 0)).await;

    // Nothing booked yet anywhere: nothing to reconcile.
    assert!(!engine.needs_confirmation(d2).await.unwrap());

    let (seeded, seeded_clock, _db2) = engine_at(at(d1, 9, 0)).await;
    seeded
        .record_opening_balance(d1, PaymentTarget::Cash, MoneyCents::new(10_000), ACTOR)
        .await
        .unwrap();

    // Before the 06:00 cutoff the day does not gate yet.
    seeded_clock.set(at(d2, 5, 30));
    assert!(!seeded.needs_confirmation(d2).await.unwrap());
    seeded_clock.set(at(d2, 6, 0));
    assert!(seeded.needs_confirmation(d2).await.unwrap());

    // Future dates never need confirming.
    assert!(!seeded.needs_confirmation(d2 + Duration::days(1)).await.unwrap());

    let _ = clock;
}

#[tokio::test]
async fn confirmation_status_carries_the_previous_snapshot() {
    let d1 = day(2026, 3, 2);
    let d2 = d1 + Duration::days(1);
    let (engine, clock, _db) = engine_at(at(d1, 9, 0)).await;

    engine
        .record_opening_balance(d1, PaymentTarget::Cash, MoneyCents::new(80_000), ACTOR)
        .await
        .unwrap();
    let product_id = engine.new_product("Pane", 50, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Mensa Scuola", d1, ACTOR)
        .item(unit_item(product_id, 20, 300))
        .payment(cash(6_000));
    engine.create_transaction(cmd).await.unwrap();

    clock.set(at(d2, 9, 0));
    let status = engine.confirmation_status(d2).await.unwrap();
    assert!(!status.confirmed);
    assert!(status.needs_confirmation);
    assert_eq!(status.previous_snapshot.date, d1);
    assert_eq!(status.previous_snapshot.cash.cents(), 86_000);

    engine.confirm(d2, ACTOR).await.unwrap();
    let status = engine.confirmation_status(d2).await.unwrap();
    assert!(status.confirmed);
    assert!(!status.needs_confirmation);
}
