//! Transaction cancellation.
//!
//! Cancellation reverses a transaction within its window: one refund
//! ledger entry for everything paid, stock put back, status flipped to the
//! terminal `cancelled`. The refund needs an explicit destination — cash
//! or a bank account, never a card, and never a default.

use sea_orm::{
    ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    CancelTransactionCmd, EngineError, MoneyCents, Payment, PaymentTarget, ResultEngine,
    TradeKind, Transaction, TransactionStatus, line_items, payments, transactions,
};

use super::super::super::{Engine, with_tx};
use super::super::helpers::{
    CANCEL_WINDOW_DAYS, days_since, payment_direction, refund_source, stock_deltas,
};

impl Engine {
    /// Cancels a transaction, refunding what was paid and restoring stock.
    pub async fn cancel_transaction(
        &self,
        cmd: CancelTransactionCmd,
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
            if days_since(trade_date, today) > CANCEL_WINDOW_DAYS {
                return Err(EngineError::CancelWindowExpired(format!(
                    "transactions may only be cancelled within {CANCEL_WINDOW_DAYS} days"
                )));
            }

            let payment_models = payments::Entity::find()
                .filter(payments::Column::TransactionId.eq(tx_id.to_string()))
                .order_by_asc(payments::Column::Position)
                .all(&db_tx)
                .await?;
            let tx_payments = payment_models
                .into_iter()
                .map(Payment::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let paid = tx_payments
                .iter()
                .fold(MoneyCents::ZERO, |acc, p| acc + p.amount);

            if paid.is_positive() {
                let refund_to = cmd.refund_to.ok_or_else(|| {
                    EngineError::RefundRequired(format!(
                        "{paid} was paid; a refund target is required"
                    ))
                })?;
                match refund_to {
                    PaymentTarget::Cash => {}
                    PaymentTarget::Bank { account_id } => {
                        if self.require_bank_account(&db_tx, account_id).await.is_err() {
                            return Err(EngineError::RefundTargetInvalid(format!(
                                "bank account {account_id} does not exist"
                            )));
                        }
                    }
                    PaymentTarget::Card { .. } => {
                        return Err(EngineError::RefundTargetInvalid(
                            "refunds go to cash or a bank account, not a card".to_string(),
                        ));
                    }
                }

                self.record_entry(
                    &db_tx,
                    today,
                    refund_to,
                    paid,
                    payment_direction(kind).reversed(),
                    refund_source(kind),
                    tx_id,
                    &cmd.actor,
                )
                .await?;
            }

            let item_models = line_items::Entity::find()
                .filter(line_items::Column::TransactionId.eq(tx_id.to_string()))
                .order_by_asc(line_items::Column::Position)
                .all(&db_tx)
                .await?;
            let items = item_models
                .into_iter()
                .map(crate::LineItem::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            for delta in stock_deltas(kind, &items) {
                self.apply_stock_delta(&db_tx, delta.product_id, delta.location, -delta.delta)
                    .await?;
            }

            let now = self.clock.now();
            let tx_active = transactions::ActiveModel {
                id: ActiveValue::Set(tx_id.to_string()),
                status: ActiveValue::Set(TransactionStatus::Cancelled.as_str().to_string()),
                cancelled_at: ActiveValue::Set(Some(now)),
                cancelled_by: ActiveValue::Set(Some(cmd.actor.clone())),
                ..Default::default()
            };
            tx_active.update(&db_tx).await?;

            let mut tx = Transaction::try_from(tx_model)?;
            tx.status = TransactionStatus::Cancelled;
            tx.cancelled_at = Some(now);
            tx.cancelled_by = Some(cmd.actor.clone());
            tx.items = items;
            tx.payments = tx_payments;
            Ok::<_, EngineError>(tx)
        })?;

        // The refund is booked on the cancellation day.
        self.recompute_best_effort(today).await;
        Ok(result)
    }
}
