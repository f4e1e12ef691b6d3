//! Transactions API endpoints

use api_types::transaction::{
    Adjustment as ApiAdjustment, AdjustmentKind, LineItemNew, LineItemView,
    PaymentNew, PaymentTarget as ApiTarget, PaymentView, PriceMode as ApiPriceMode,
    StockDeltaView, StockLocation as ApiLocation, TransactionCancel, TransactionCreated,
    TransactionKind as ApiKind, TransactionList, TransactionListResponse, TransactionNew,
    TransactionStatus as ApiStatus, TransactionUpdate, TransactionView,
};
use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use uuid::Uuid;

use engine::{
    AddPaymentCmd, Adjustment, CancelTransactionCmd, CreateTransactionCmd, LineItemDraft,
    MoneyCents, PaymentDraft, PaymentTarget, Percent, PriceMode, StockDelta, TradeKind,
    Transaction, TransactionListFilter,
};

use crate::{ServerError, require_actor, server::ServerState};

fn map_kind(kind: ApiKind) -> TradeKind {
    match kind {
        ApiKind::Purchase => TradeKind::Purchase,
        ApiKind::Sale => TradeKind::Sale,
    }
}

fn kind_view(kind: TradeKind) -> ApiKind {
    match kind {
        TradeKind::Purchase => ApiKind::Purchase,
        TradeKind::Sale => ApiKind::Sale,
    }
}

fn status_view(status: engine::TransactionStatus) -> ApiStatus {
    match status {
        engine::TransactionStatus::Pending => ApiStatus::Pending,
        engine::TransactionStatus::Completed => ApiStatus::Completed,
        engine::TransactionStatus::Cancelled => ApiStatus::Cancelled,
    }
}

fn map_price_mode(mode: ApiPriceMode) -> PriceMode {
    match mode {
        ApiPriceMode::PerUnit => PriceMode::PerUnit,
        ApiPriceMode::PerDozen => PriceMode::PerDozen,
    }
}

fn price_mode_view(mode: PriceMode) -> ApiPriceMode {
    match mode {
        PriceMode::PerUnit => ApiPriceMode::PerUnit,
        PriceMode::PerDozen => ApiPriceMode::PerDozen,
    }
}

fn map_target(target: ApiTarget) -> PaymentTarget {
    match target {
        ApiTarget::Cash => PaymentTarget::Cash,
        ApiTarget::Bank { account_id } => PaymentTarget::Bank { account_id },
        ApiTarget::Card { card_id } => PaymentTarget::Card { card_id },
    }
}

fn target_view(target: PaymentTarget) -> ApiTarget {
    match target {
        PaymentTarget::Cash => ApiTarget::Cash,
        PaymentTarget::Bank { account_id } => ApiTarget::Bank { account_id },
        PaymentTarget::Card { card_id } => ApiTarget::Card { card_id },
    }
}

fn location_view(location: engine::StockLocation) -> ApiLocation {
    match location {
        engine::StockLocation::Front => ApiLocation::Front,
        engine::StockLocation::Warehouse => ApiLocation::Warehouse,
    }
}

fn parse_money(raw: &str) -> Result<MoneyCents, ServerError> {
    raw.parse::<MoneyCents>().map_err(ServerError::from)
}

fn parse_adjustment(adjustment: Option<&ApiAdjustment>) -> Result<Adjustment, ServerError> {
    match adjustment {
        None => Ok(Adjustment::NONE),
        Some(adj) => match adj.kind {
            AdjustmentKind::Percent => Ok(Adjustment::Percent(
                adj.value.parse::<Percent>().map_err(ServerError::from)?,
            )),
            AdjustmentKind::Absolute => Ok(Adjustment::Absolute(parse_money(&adj.value)?)),
        },
    }
}

fn adjustment_view(adjustment: Adjustment) -> ApiAdjustment {
    match adjustment {
        Adjustment::Percent(pct) => ApiAdjustment {
            kind: AdjustmentKind::Percent,
            value: pct.to_string(),
        },
        Adjustment::Absolute(amount) => ApiAdjustment {
            kind: AdjustmentKind::Absolute,
            value: amount.to_string(),
        },
    }
}

fn item_draft(item: &LineItemNew) -> Result<LineItemDraft, ServerError> {
    let mut draft = LineItemDraft::new(
        item.product_id,
        map_price_mode(item.price_mode),
        parse_money(&item.price)?,
    );
    draft.quantity_front = item.quantity_front;
    draft.quantity_warehouse = item.quantity_warehouse;
    draft.discount = parse_adjustment(item.discount.as_ref())?;
    Ok(draft)
}

fn payment_draft(payment: &PaymentNew) -> Result<PaymentDraft, ServerError> {
    Ok(PaymentDraft::new(
        map_target(payment.target),
        parse_money(&payment.amount)?,
    ))
}

fn delta_view(delta: &StockDelta) -> StockDeltaView {
    StockDeltaView {
        product_id: delta.product_id,
        location: location_view(delta.location),
        delta: delta.delta,
    }
}

pub(crate) fn transaction_view(tx: Transaction) -> TransactionView {
    let remaining_balance = tx.remaining_balance();
    TransactionView {
        id: tx.id,
        kind: kind_view(tx.kind),
        counterparty_name: tx.counterparty_name,
        counterparty_phone: tx.counterparty_phone,
        trade_date: tx.trade_date,
        subtotal: tx.subtotal.to_string(),
        discount: adjustment_view(tx.discount),
        tax: adjustment_view(tx.tax),
        total: tx.total.to_string(),
        remaining_balance: remaining_balance.to_string(),
        status: status_view(tx.status),
        created_by: tx.created_by,
        created_at: tx.created_at,
        cancelled_at: tx.cancelled_at,
        cancelled_by: tx.cancelled_by,
        items: tx
            .items
            .into_iter()
            .map(|item| LineItemView {
                id: item.id,
                product_id: item.product_id,
                position: item.position,
                quantity_front: item.quantity_front,
                quantity_warehouse: item.quantity_warehouse,
                price_mode: price_mode_view(item.price_mode),
                unit_price: item.unit_price.to_string(),
                dozen_price: item.dozen_price.to_string(),
                discount: adjustment_view(item.discount),
                line_total: item.line_total.to_string(),
            })
            .collect(),
        payments: tx
            .payments
            .into_iter()
            .map(|payment| PaymentView {
                id: payment.id,
                position: payment.position,
                target: target_view(payment.target),
                amount: payment.amount.to_string(),
                paid_at: payment.paid_at,
            })
            .collect(),
    }
}

/// New money-moving transactions are gated on the day's confirmation; the
/// engine reports the gate, this surface enforces it.
async fn ensure_day_confirmed(state: &ServerState) -> Result<(), ServerError> {
    let today = state.engine.today();
    if state.engine.needs_confirmation(today).await? {
        return Err(ServerError::ConfirmationRequired);
    }
    Ok(())
}

pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<TransactionNew>,
) -> Result<Json<TransactionCreated>, ServerError> {
    let actor = require_actor(&headers)?;
    ensure_day_confirmed(&state).await?;

    let mut cmd = CreateTransactionCmd::new(
        map_kind(payload.kind),
        payload.counterparty_name.clone(),
        payload.trade_date,
        actor,
    );
    cmd.counterparty_phone = payload.counterparty_phone.clone();
    cmd.discount = parse_adjustment(payload.discount.as_ref())?;
    cmd.tax = parse_adjustment(payload.tax.as_ref())?;
    cmd.idempotency_key = payload.idempotency_key.clone();
    for item in &payload.items {
        cmd.items.push(item_draft(item)?);
    }
    for payment in &payload.payments {
        cmd.payments.push(payment_draft(payment)?);
    }

    let (tx, deltas) = state.engine.create_transaction(cmd).await?;
    Ok(Json(TransactionCreated {
        transaction: transaction_view(tx),
        applied_stock_deltas: deltas.iter().map(delta_view).collect(),
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(id).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let actor = require_actor(&headers)?;

    let mut cmd = engine::UpdateTransactionCmd::new(id, actor);
    cmd.discount = parse_adjustment(payload.discount.as_ref())?;
    cmd.tax = parse_adjustment(payload.tax.as_ref())?;
    for item in &payload.items {
        cmd.items.push(item_draft(item)?);
    }
    for payment in &payload.payments {
        cmd.payments.push(payment_draft(payment)?);
    }

    let tx = state.engine.update_transaction(cmd).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<TransactionCancel>,
) -> Result<Json<TransactionView>, ServerError> {
    let actor = require_actor(&headers)?;

    let mut cmd = CancelTransactionCmd::new(id, actor);
    cmd.refund_to = payload.refund_to.map(map_target);

    let tx = state.engine.cancel_transaction(cmd).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn add_payment(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<PaymentNew>,
) -> Result<Json<TransactionView>, ServerError> {
    let actor = require_actor(&headers)?;
    ensure_day_confirmed(&state).await?;

    let cmd = AddPaymentCmd::new(id, payment_draft(&payload)?, actor);
    let tx = state.engine.add_payment(cmd).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn list(
    State(state): State<ServerState>,
    Json(payload): Json<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = TransactionListFilter {
        kinds: payload
            .kinds
            .map(|kinds| kinds.into_iter().map(map_kind).collect()),
        from: payload.from,
        to: payload.to,
        include_cancelled: payload.include_cancelled.unwrap_or(false),
    };
    let limit = payload.limit.unwrap_or(50);

    let page = state
        .engine
        .list_transactions(&filter, limit, payload.cursor.as_deref())
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: page
            .transactions
            .into_iter()
            .map(transaction_view)
            .collect(),
        next_cursor: page.next_cursor,
    }))
}
