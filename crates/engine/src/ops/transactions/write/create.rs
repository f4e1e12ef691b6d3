//! Transaction creation.
//!
//! The whole pipeline — validation, balance check, persistence, stock
//! deltas, ledger entries — runs inside one DB transaction. Either all of
//! it commits or none of it does, which also closes the window between the
//! balance check and the ledger write for concurrent callers.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CreateTransactionCmd, EngineError, Payment, ResultEngine, StockDelta, TradeKind, Transaction,
    line_items, payments, transactions,
    util::{normalize_optional_text, normalize_required_name, parse_uuid},
};

use super::super::super::{Engine, with_tx};
use super::super::helpers::{
    clean_payments, compute_totals, ensure_within_total, payment_direction, payment_source,
    payments_total, price_line, status_for, stock_deltas,
};

impl Engine {
    /// Creates a purchase or sale with its items, payments, stock deltas
    /// and ledger entries.
    ///
    /// Returns the stored transaction and the stock deltas applied by this
    /// call (empty on an idempotency-key replay).
    pub async fn create_transaction(
        &self,
        cmd: CreateTransactionCmd,
    ) -> ResultEngine<(Transaction, Vec<StockDelta>)> {
        let today = self.clock.today();
        if cmd.trade_date != today {
            return Err(EngineError::Validation(format!(
                "money-moving transactions must be dated today ({today})"
            )));
        }

        let counterparty_name = normalize_required_name(&cmd.counterparty_name, "counterparty")?;
        let counterparty_phone = normalize_optional_text(cmd.counterparty_phone.as_deref());

        // Replaying the same (actor, key) returns the stored transaction.
        if let Some(key) = cmd.idempotency_key.as_deref() {
            let existing = transactions::Entity::find()
                .filter(transactions::Column::CreatedBy.eq(cmd.actor.clone()))
                .filter(transactions::Column::IdempotencyKey.eq(key))
                .one(&self.database)
                .await?;
            if let Some(existing) = existing {
                let id = parse_uuid(&existing.id, "transaction")?;
                let tx = self.transaction(id).await?;
                return Ok((tx, Vec::new()));
            }
        }

        let trade_date = cmd.trade_date;
        let result = with_tx!(self, |db_tx| {
            let tx_id = Uuid::new_v4();

            let mut items = Vec::with_capacity(cmd.items.len());
            for (position, draft) in cmd.items.iter().enumerate() {
                self.require_product(&db_tx, draft.product_id).await?;
                items.push(price_line(draft, tx_id, position as i32)?);
            }
            if items.is_empty() {
                return Err(EngineError::Validation(
                    "transaction must have at least one line item".to_string(),
                ));
            }

            let (subtotal, total) = compute_totals(&items, cmd.discount, cmd.tax)?;

            let payment_drafts = clean_payments(&cmd.payments);
            let paid = payments_total(&payment_drafts);
            ensure_within_total(paid, total)?;
            self.require_payment_targets(&db_tx, &payment_drafts).await?;
            if cmd.kind == TradeKind::Purchase {
                self.ensure_sufficient_balance(&db_tx, trade_date, &payment_drafts)
                    .await?;
            }

            let now = self.clock.now();
            let tx_payments: Vec<Payment> = payment_drafts
                .iter()
                .enumerate()
                .map(|(position, draft)| {
                    Payment::new(tx_id, position as i32, draft.target, draft.amount, now)
                })
                .collect();

            let tx = Transaction {
                id: tx_id,
                kind: cmd.kind,
                counterparty_name: counterparty_name.clone(),
                counterparty_phone: counterparty_phone.clone(),
                trade_date,
                subtotal,
                discount: cmd.discount,
                tax: cmd.tax,
                total,
                status: status_for(total, paid),
                created_by: cmd.actor.clone(),
                created_at: now,
                cancelled_at: None,
                cancelled_by: None,
                idempotency_key: cmd.idempotency_key.clone(),
                items: items.clone(),
                payments: tx_payments.clone(),
            };

            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            for item in &items {
                line_items::ActiveModel::from(item).insert(&db_tx).await?;
            }
            for payment in &tx_payments {
                payments::ActiveModel::from(payment).insert(&db_tx).await?;
            }

            let deltas = stock_deltas(cmd.kind, &items);
            for delta in &deltas {
                self.apply_stock_delta(&db_tx, delta.product_id, delta.location, delta.delta)
                    .await?;
            }

            for payment in &tx_payments {
                self.record_entry(
                    &db_tx,
                    trade_date,
                    payment.target,
                    payment.amount,
                    payment_direction(cmd.kind),
                    payment_source(cmd.kind),
                    tx_id,
                    &cmd.actor,
                )
                .await?;
            }

            Ok::<_, EngineError>((tx, deltas))
        })?;

        self.recompute_best_effort(trade_date).await;
        Ok(result)
    }
}
