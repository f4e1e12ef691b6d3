//! Transaction edits.
//!
//! An edit replaces the item set and may append payments; it never touches
//! a line's cost or any stored payment. Old stock deltas are reverted and
//! the new set re-applied, all inside one DB transaction.

use std::collections::HashMap;

use sea_orm::{
    ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, Payment, PaymentDraft, ResultEngine, TradeKind, Transaction,
    TransactionStatus, UpdateTransactionCmd, line_items, payments, transactions,
};

use super::super::super::{Engine, with_tx};
use super::super::helpers::{
    EDIT_WINDOW_DAYS, compute_totals, days_since, ensure_within_total, payment_direction,
    payment_source, payments_total, price_line, status_for, stock_deltas,
};

impl Engine {
    /// Replaces a transaction's items and appends any new payments.
    ///
    /// Permitted while pending, or completed no more than seven days past
    /// the business date. Line costs are immutable: a product kept from the
    /// stored set must keep its unit price.
    pub async fn update_transaction(
        &self,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let today = self.clock.today();
        let tx_id = cmd.transaction_id;

        let result = with_tx!(self, |db_tx| {
            let tx_model = transactions::Entity::find_by_id(tx_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("transaction {tx_id}")))?;
            let status = TransactionStatus::try_from(tx_model.status.as_str())?;
            let kind = TradeKind::try_from(tx_model.kind.as_str())?;
            let trade_date = tx_model.trade_date;

            if status == TransactionStatus::Cancelled {
                return Err(EngineError::AlreadyCancelled(format!(
                    "transaction {tx_id}"
                )));
            }
            if status == TransactionStatus::Completed
                && days_since(trade_date, today) > EDIT_WINDOW_DAYS
            {
                return Err(EngineError::EditWindowExpired(format!(
                    "completed transactions may only be edited within {EDIT_WINDOW_DAYS} days"
                )));
            }

            let old_item_models = line_items::Entity::find()
                .filter(line_items::Column::TransactionId.eq(tx_id.to_string()))
                .order_by_asc(line_items::Column::Position)
                .all(&db_tx)
                .await?;
            let old_items = old_item_models
                .into_iter()
                .map(crate::LineItem::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            // A product carried over from the stored set keeps its cost.
            let mut stored_prices: HashMap<Uuid, MoneyCents> = HashMap::new();
            for item in &old_items {
                stored_prices.entry(item.product_id).or_insert(item.unit_price);
            }

            let mut new_items = Vec::with_capacity(cmd.items.len());
            for (position, draft) in cmd.items.iter().enumerate() {
                self.require_product(&db_tx, draft.product_id).await?;
                let priced = price_line(draft, tx_id, position as i32)?;
                if let Some(stored) = stored_prices.get(&priced.product_id)
                    && *stored != priced.unit_price
                {
                    return Err(EngineError::CostImmutable(format!(
                        "cost of product {} cannot change on edit",
                        priced.product_id
                    )));
                }
                new_items.push(priced);
            }
            if new_items.is_empty() {
                return Err(EngineError::Validation(
                    "transaction must have at least one line item".to_string(),
                ));
            }

            // Payments are append-only: the stored prefix must come back
            // unchanged, anything beyond it is new.
            let old_payment_models = payments::Entity::find()
                .filter(payments::Column::TransactionId.eq(tx_id.to_string()))
                .order_by_asc(payments::Column::Position)
                .all(&db_tx)
                .await?;
            let old_payments = old_payment_models
                .into_iter()
                .map(Payment::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            if cmd.payments.len() < old_payments.len() {
                return Err(EngineError::Validation(
                    "payments are append-only; stored payments cannot be removed".to_string(),
                ));
            }
            for (stored, submitted) in old_payments.iter().zip(cmd.payments.iter()) {
                if stored.target != submitted.target || stored.amount != submitted.amount {
                    return Err(EngineError::Validation(
                        "payments are append-only; stored payments cannot be modified"
                            .to_string(),
                    ));
                }
            }
            let appended: Vec<PaymentDraft> = cmd.payments[old_payments.len()..]
                .iter()
                .filter(|p| p.amount.is_positive())
                .cloned()
                .collect();

            let (subtotal, total) = compute_totals(&new_items, cmd.discount, cmd.tax)?;
            let paid = old_payments
                .iter()
                .fold(MoneyCents::ZERO, |acc, p| acc + p.amount)
                + payments_total(&appended);
            ensure_within_total(paid, total)?;

            self.require_payment_targets(&db_tx, &appended).await?;
            if kind == TradeKind::Purchase {
                self.ensure_sufficient_balance(&db_tx, trade_date, &appended)
                    .await?;
            }

            // Revert the old stock deltas, then apply the new item set.
            for delta in stock_deltas(kind, &old_items) {
                self.apply_stock_delta(&db_tx, delta.product_id, delta.location, -delta.delta)
                    .await?;
            }
            for delta in stock_deltas(kind, &new_items) {
                self.apply_stock_delta(&db_tx, delta.product_id, delta.location, delta.delta)
                    .await?;
            }

            line_items::Entity::delete_many()
                .filter(line_items::Column::TransactionId.eq(tx_id.to_string()))
                .exec(&db_tx)
                .await?;
            for item in &new_items {
                line_items::ActiveModel::from(item).insert(&db_tx).await?;
            }

            let now = self.clock.now();
            let mut all_payments = old_payments.clone();
            for (offset, draft) in appended.iter().enumerate() {
                let payment = Payment::new(
                    tx_id,
                    (old_payments.len() + offset) as i32,
                    draft.target,
                    draft.amount,
                    now,
                );
                payments::ActiveModel::from(&payment).insert(&db_tx).await?;
                self.record_entry(
                    &db_tx,
                    trade_date,
                    payment.target,
                    payment.amount,
                    payment_direction(kind),
                    payment_source(kind),
                    tx_id,
                    &cmd.actor,
                )
                .await?;
                all_payments.push(payment);
            }

            let new_status = status_for(total, paid);
            let tx_active = transactions::ActiveModel {
                id: ActiveValue::Set(tx_id.to_string()),
                subtotal_minor: ActiveValue::Set(subtotal.cents()),
                discount_kind: ActiveValue::Set(cmd.discount.kind().to_string()),
                discount_value: ActiveValue::Set(cmd.discount.raw_value()),
                tax_kind: ActiveValue::Set(cmd.tax.kind().to_string()),
                tax_value: ActiveValue::Set(cmd.tax.raw_value()),
                total_minor: ActiveValue::Set(total.cents()),
                status: ActiveValue::Set(new_status.as_str().to_string()),
                ..Default::default()
            };
            tx_active.update(&db_tx).await?;

            let mut tx = Transaction::try_from(tx_model)?;
            tx.subtotal = subtotal;
            tx.discount = cmd.discount;
            tx.tax = cmd.tax;
            tx.total = total;
            tx.status = new_status;
            tx.items = new_items;
            tx.payments = all_payments;
            Ok::<_, EngineError>(tx)
        })?;

        self.recompute_best_effort(result.trade_date).await;
        Ok(result)
    }
}
