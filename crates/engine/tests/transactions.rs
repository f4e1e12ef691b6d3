use chrono::{Duration, NaiveDate, NaiveDateTime};
use sea_orm::{ConnectionTrait, Database, Statement};

use engine::{
    AddPaymentCmd, CancelTransactionCmd, CreateTransactionCmd, Engine, EngineError, FixedClock,
    LineItemDraft, MoneyCents, PaymentDraft, PaymentTarget, PriceMode, TradeKind,
    TransactionStatus,
};
use migration::MigratorTrait;

const ACTOR: &str = "alice";

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn morning(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(9, 30, 0).unwrap()
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

fn unit_item(product_id: uuid::Uuid, front: i64, warehouse: i64, price_cents: i64) -> LineItemDraft {
    LineItemDraft::new(product_id, PriceMode::PerUnit, MoneyCents::new(price_cents))
        .front(front)
        .warehouse(warehouse)
}

fn cash(cents: i64) -> PaymentDraft {
    PaymentDraft::new(PaymentTarget::Cash, MoneyCents::new(cents))
}

#[tokio::test]
async fn purchase_fully_paid_in_cash_completes_with_one_ledger_entry() {
    // Scenario: subtotal 1200.00, tax 0, one cash payment of 1200.00.
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    engine
        .record_opening_balance(today, PaymentTarget::Cash, MoneyCents::new(200_000), ACTOR)
        .await
        .unwrap();
    let product_id = engine.new_product("Farina 00", 0, 0).await.unwrap();

    let cmd = CreateTransactionCmd::new(TradeKind::Purchase, "Molino Rossi", today, ACTOR)
        .item(unit_item(product_id, 12, 0, 10_000))
        .payment(cash(120_000));
    let (tx, deltas) = engine.create_transaction(cmd).await.unwrap();

    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.subtotal.cents(), 120_000);
    assert_eq!(tx.total.cents(), 120_000);
    assert_eq!(tx.remaining_balance(), MoneyCents::ZERO);
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].delta, 12);

    let entries = engine.ledger_entries(today).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].target, PaymentTarget::Cash);
    assert_eq!(entries[0].amount.cents(), 120_000);
    assert_eq!(entries[0].direction, engine::EntryDirection::Expense);
    assert_eq!(entries[0].entry_date, today);

    let product = engine.product(product_id).await.unwrap();
    assert_eq!(product.front_quantity, 12);
}

#[tokio::test]
async fn partially_paid_sale_completes_after_add_payment() {
    // Scenario: total 500.00, 300.00 by bank, then 200.00 cash.
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Olio EVO", 10, 0).await.unwrap();
    let account_id = engine.new_bank_account("Intesa").await.unwrap();

    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Bar Centrale", today, ACTOR)
        .item(unit_item(product_id, 5, 0, 10_000))
        .payment(PaymentDraft::new(
            PaymentTarget::Bank { account_id },
            MoneyCents::new(30_000),
        ));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();

    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.remaining_balance().cents(), 20_000);

    let tx = engine
        .add_payment(AddPaymentCmd::new(tx.id, cash(20_000), ACTOR))
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.remaining_balance(), MoneyCents::ZERO);
    assert_eq!(tx.payments.len(), 2);

    let entries = engine.ledger_entries_for_transaction(tx.id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries
        .iter()
        .all(|e| e.direction == engine::EntryDirection::Income));

    let snapshot = engine.closing_balance(today).await.unwrap();
    assert_eq!(snapshot.cash.cents(), 20_000);
    assert_eq!(
        snapshot.balance(&PaymentTarget::Bank { account_id }).cents(),
        30_000
    );
}

#[tokio::test]
async fn insufficient_cash_leaves_nothing_behind() {
    // Scenario: cash payment of 5000.00 against a cash balance of 1000.00.
    let today = day(2026, 3, 2);
    let (engine, _clock, db) = engine_at(morning(today)).await;

    engine
        .record_opening_balance(today, PaymentTarget::Cash, MoneyCents::new(100_000), ACTOR)
        .await
        .unwrap();
    let product_id = engine.new_product("Caffè", 4, 0).await.unwrap();

    let cmd = CreateTransactionCmd::new(TradeKind::Purchase, "Torrefazione Nord", today, ACTOR)
        .item(unit_item(product_id, 50, 0, 10_000))
        .payment(cash(500_000));
    let err = engine.create_transaction(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance(_)));

    // Nothing persisted, nothing booked, no stock moved.
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM transactions;",
        ))
        .await
        .unwrap()
        .unwrap();
    let count: i64 = row.try_get("", "n").unwrap();
    assert_eq!(count, 0);

    assert!(engine.ledger_entries(today).await.unwrap().is_empty());
    let product = engine.product(product_id).await.unwrap();
    assert_eq!(product.front_quantity, 4);
}

#[tokio::test]
async fn two_payments_against_the_same_target_are_checked_together() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    engine
        .record_opening_balance(today, PaymentTarget::Cash, MoneyCents::new(100_000), ACTOR)
        .await
        .unwrap();
    let product_id = engine.new_product("Zucchero", 0, 0).await.unwrap();

    // Each 600.00 payment fits the 1000.00 balance alone; together they do not.
    let cmd = CreateTransactionCmd::new(TradeKind::Purchase, "Grossista Sud", today, ACTOR)
        .item(unit_item(product_id, 12, 0, 10_000))
        .payment(cash(60_000))
        .payment(cash(60_000));
    let err = engine.create_transaction(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance(_)));
}

#[tokio::test]
async fn cancelling_a_purchase_restores_stock_and_refunds_cash() {
    // Scenario: front +5, warehouse +3 of one product, refund to cash.
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    engine
        .record_opening_balance(today, PaymentTarget::Cash, MoneyCents::new(200_000), ACTOR)
        .await
        .unwrap();
    let product_id = engine.new_product("Passata", 2, 1).await.unwrap();

    let cmd = CreateTransactionCmd::new(TradeKind::Purchase, "Molino Rossi", today, ACTOR)
        .item(unit_item(product_id, 5, 3, 5_000))
        .payment(cash(40_000));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();

    let product = engine.product(product_id).await.unwrap();
    assert_eq!(product.front_quantity, 7);
    assert_eq!(product.warehouse_quantity, 4);

    let cancelled = engine
        .cancel_transaction(
            CancelTransactionCmd::new(tx.id, ACTOR).refund_to(PaymentTarget::Cash),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);

    let product = engine.product(product_id).await.unwrap();
    assert_eq!(product.front_quantity, 2);
    assert_eq!(product.warehouse_quantity, 1);

    let entries = engine.ledger_entries_for_transaction(tx.id).await.unwrap();
    let refunds: Vec<_> = entries
        .iter()
        .filter(|e| e.direction == engine::EntryDirection::Income)
        .collect();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount.cents(), 40_000);

    // Creation then cancellation nets out to the opening balance.
    let snapshot = engine.closing_balance(today).await.unwrap();
    assert_eq!(snapshot.cash.cents(), 200_000);
}

#[tokio::test]
async fn cancel_with_money_paid_requires_a_refund_target() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Vino", 20, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Enoteca Blu", today, ACTOR)
        .item(unit_item(product_id, 2, 0, 8_000))
        .payment(cash(16_000));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();

    let err = engine
        .cancel_transaction(CancelTransactionCmd::new(tx.id, ACTOR))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RefundRequired(_)));

    let err = engine
        .cancel_transaction(CancelTransactionCmd::new(tx.id, ACTOR).refund_to(
            PaymentTarget::Card {
                card_id: uuid::Uuid::new_v4(),
            },
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RefundTargetInvalid(_)));

    // Nothing was paid back yet, so the sale still stands.
    let tx = engine.transaction(tx.id).await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
}

#[tokio::test]
async fn cancel_of_an_unpaid_sale_needs_no_refund_target() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Pane", 6, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Mensa Scuola", today, ACTOR)
        .item(unit_item(product_id, 6, 0, 300));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);

    let cancelled = engine
        .cancel_transaction(CancelTransactionCmd::new(tx.id, ACTOR))
        .await
        .unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);
    assert!(engine
        .ledger_entries_for_transaction(tx.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn cancel_window_expires_after_seven_days() {
    let start = day(2026, 3, 2);
    let (engine, clock, _db) = engine_at(morning(start)).await;

    let product_id = engine.new_product("Sale grosso", 10, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Bar Centrale", start, ACTOR)
        .item(unit_item(product_id, 1, 0, 500));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();

    clock.set(morning(start + Duration::days(8)));
    let err = engine
        .cancel_transaction(CancelTransactionCmd::new(tx.id, ACTOR))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CancelWindowExpired(_)));
}

#[tokio::test]
async fn completed_transactions_stop_being_editable_after_seven_days() {
    let start = day(2026, 3, 2);
    let (engine, clock, _db) = engine_at(morning(start)).await;

    let product_id = engine.new_product("Biscotti", 30, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Bar Centrale", start, ACTOR)
        .item(unit_item(product_id, 10, 0, 200))
        .payment(cash(2_000));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);

    clock.set(morning(start + Duration::days(8)));
    let err = engine
        .update_transaction(
            engine::UpdateTransactionCmd::new(tx.id, ACTOR)
                .item(unit_item(product_id, 9, 0, 200))
                .payment(cash(2_000)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EditWindowExpired(_)));
}

#[tokio::test]
async fn editing_quantities_reapplies_stock_but_leaves_the_ledger_alone() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Riso", 50, 10).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Trattoria Da Ugo", today, ACTOR)
        .item(unit_item(product_id, 10, 0, 400))
        .payment(cash(1_000));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();

    let before = engine.ledger_entries_for_transaction(tx.id).await.unwrap();

    let updated = engine
        .update_transaction(
            engine::UpdateTransactionCmd::new(tx.id, ACTOR)
                .item(unit_item(product_id, 4, 2, 400))
                .payment(cash(1_000)),
        )
        .await
        .unwrap();
    assert_eq!(updated.subtotal.cents(), 2_400);

    // Old deltas reverted (front back to 50), new ones applied.
    let product = engine.product(product_id).await.unwrap();
    assert_eq!(product.front_quantity, 46);
    assert_eq!(product.warehouse_quantity, 8);

    let after = engine.ledger_entries_for_transaction(tx.id).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn editing_payments_only_appends_ledger_entries() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Latte", 40, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Bar Centrale", today, ACTOR)
        .item(unit_item(product_id, 10, 0, 150))
        .payment(cash(500));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();

    let before = engine.ledger_entries_for_transaction(tx.id).await.unwrap();

    let updated = engine
        .update_transaction(
            engine::UpdateTransactionCmd::new(tx.id, ACTOR)
                .item(unit_item(product_id, 10, 0, 150))
                .payment(cash(500))
                .payment(cash(1_000)),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, TransactionStatus::Completed);

    let after = engine.ledger_entries_for_transaction(tx.id).await.unwrap();
    assert_eq!(after.len(), before.len() + 1);
    for entry in &before {
        assert!(after.contains(entry));
    }
}

#[tokio::test]
async fn stored_payments_cannot_be_removed_or_modified() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Uova", 100, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Pasticceria Sud", today, ACTOR)
        .item(unit_item(product_id, 30, 0, 40))
        .payment(cash(600));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();

    let err = engine
        .update_transaction(
            engine::UpdateTransactionCmd::new(tx.id, ACTOR)
                .item(unit_item(product_id, 30, 0, 40)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .update_transaction(
            engine::UpdateTransactionCmd::new(tx.id, ACTOR)
                .item(unit_item(product_id, 30, 0, 40))
                .payment(cash(599)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn line_cost_is_immutable_on_edit() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Burro", 25, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Bar Centrale", today, ACTOR)
        .item(unit_item(product_id, 5, 0, 250));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();

    let err = engine
        .update_transaction(
            engine::UpdateTransactionCmd::new(tx.id, ACTOR)
                .item(unit_item(product_id, 5, 0, 300)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CostImmutable(_)));
}

#[tokio::test]
async fn add_payment_is_rejected_outside_pending() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Miele", 10, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Mercato Bio", today, ACTOR)
        .item(unit_item(product_id, 2, 0, 700))
        .payment(cash(1_400));
    let (tx, _) = engine.create_transaction(cmd).await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);

    let err = engine
        .add_payment(AddPaymentCmd::new(tx.id, cash(100), ACTOR))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let cancelled = engine
        .cancel_transaction(
            CancelTransactionCmd::new(tx.id, ACTOR).refund_to(PaymentTarget::Cash),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);
    let err = engine
        .add_payment(AddPaymentCmd::new(tx.id, cash(100), ACTOR))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyCancelled(_)));
}

#[tokio::test]
async fn payments_beyond_the_total_are_rejected() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Tè verde", 10, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Erboristeria", today, ACTOR)
        .item(unit_item(product_id, 2, 0, 1_000))
        .payment(cash(2_500));
    let err = engine.create_transaction(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::PaymentExceedsTotal(_)));
}

#[tokio::test]
async fn sale_cannot_drive_stock_negative() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Aceto", 3, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(TradeKind::Sale, "Osteria Nuova", today, ACTOR)
        .item(unit_item(product_id, 5, 0, 600));
    let err = engine.create_transaction(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::QuantityInvalid(_)));

    let product = engine.product(product_id).await.unwrap();
    assert_eq!(product.front_quantity, 3);
}

#[tokio::test]
async fn transactions_may_only_be_dated_today() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Ceci", 10, 0).await.unwrap();
    let cmd = CreateTransactionCmd::new(
        TradeKind::Sale,
        "Mensa Scuola",
        today - Duration::days(1),
        ACTOR,
    )
    .item(unit_item(product_id, 1, 0, 200));
    let err = engine.create_transaction(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn idempotency_key_replays_the_stored_transaction() {
    let today = day(2026, 3, 2);
    let (engine, _clock, db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Farro", 20, 0).await.unwrap();
    let cmd = || {
        CreateTransactionCmd::new(TradeKind::Sale, "Bar Centrale", today, ACTOR)
            .item(unit_item(product_id, 2, 0, 450))
            .payment(cash(900))
            .idempotency_key("order-7781")
    };

    let (first, first_deltas) = engine.create_transaction(cmd()).await.unwrap();
    let (replay, replay_deltas) = engine.create_transaction(cmd()).await.unwrap();

    assert_eq!(first.id, replay.id);
    assert_eq!(first_deltas.len(), 1);
    assert!(replay_deltas.is_empty());

    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM transactions;",
        ))
        .await
        .unwrap()
        .unwrap();
    let count: i64 = row.try_get("", "n").unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn per_dozen_lines_move_twelve_units_per_entry() {
    let today = day(2026, 3, 2);
    let (engine, _clock, _db) = engine_at(morning(today)).await;

    engine
        .record_opening_balance(today, PaymentTarget::Cash, MoneyCents::new(100_000), ACTOR)
        .await
        .unwrap();
    let product_id = engine.new_product("Grissini", 0, 0).await.unwrap();

    // 2 dozen at the front, 1 dozen in the warehouse, 25.00 a dozen.
    let item = LineItemDraft::new(product_id, PriceMode::PerDozen, MoneyCents::new(2_500))
        .front(2)
        .warehouse(1);
    let cmd = CreateTransactionCmd::new(TradeKind::Purchase, "Forno Bianchi", today, ACTOR)
        .item(item)
        .payment(cash(7_500));
    let (tx, deltas) = engine.create_transaction(cmd).await.unwrap();

    assert_eq!(tx.total.cents(), 7_500);
    assert_eq!(tx.items[0].unit_price.cents(), 208);
    assert_eq!(tx.items[0].dozen_price.cents(), 2_500);

    let product = engine.product(product_id).await.unwrap();
    assert_eq!(product.front_quantity, 24);
    assert_eq!(product.warehouse_quantity, 12);
    assert_eq!(deltas.len(), 2);
}

#[tokio::test]
async fn listing_pages_newest_first_and_hides_cancelled() {
    let today = day(2026, 3, 2);
    let (engine, clock, _db) = engine_at(morning(today)).await;

    let product_id = engine.new_product("Acqua", 100, 0).await.unwrap();
    let mut ids = Vec::new();
    for n in 0..3i64 {
        clock.set(morning(today) + Duration::minutes(n));
        let cmd = CreateTransactionCmd::new(TradeKind::Sale, format!("Cliente {n}"), today, ACTOR)
            .item(unit_item(product_id, 1, 0, 100));
        let (tx, _) = engine.create_transaction(cmd).await.unwrap();
        ids.push(tx.id);
    }
    engine
        .cancel_transaction(CancelTransactionCmd::new(ids[1], ACTOR))
        .await
        .unwrap();

    let filter = engine::TransactionListFilter::default();
    let page = engine.list_transactions(&filter, 1, None).await.unwrap();
    assert_eq!(page.transactions.len(), 1);
    assert_eq!(page.transactions[0].id, ids[2]);
    let cursor = page.next_cursor.expect("more pages");

    let page = engine
        .list_transactions(&filter, 10, Some(&cursor))
        .await
        .unwrap();
    assert_eq!(page.transactions.len(), 1);
    assert_eq!(page.transactions[0].id, ids[0]);

    let all = engine
        .list_transactions(
            &engine::TransactionListFilter {
                include_cancelled: true,
                ..Default::default()
            },
            10,
            None,
        )
        .await
        .unwrap();
    assert_eq!(all.transactions.len(), 3);
}
