//! Appending a payment to a pending transaction.

use sea_orm::{
    ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    AddPaymentCmd, EngineError, MoneyCents, Payment, PaymentDraft, ResultEngine, TradeKind,
    Transaction, TransactionStatus, payments, transactions,
};

use super::super::super::{Engine, with_tx};
use super::super::helpers::{
    ensure_within_total, payment_direction, payment_source, status_for,
};

impl Engine {
    /// Appends one payment, re-deriving the remaining balance and status.
    ///
    /// Only pending transactions accept payments; a completed one has
    /// nothing left to pay and a cancelled one is terminal.
    pub async fn add_payment(&self, cmd: AddPaymentCmd) -> ResultEngine<Transaction> {
        let tx_id = cmd.transaction_id;
        let PaymentDraft { target, amount } = cmd.payment;

        if !amount.is_positive() {
            return Err(EngineError::Validation(
                "payment amount must be > 0".to_string(),
            ));
        }

        let result = with_tx!(self, |db_tx| {
            let tx_model = transactions::Entity::find_by_id(tx_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("transaction {tx_id}")))?;
            let status = TransactionStatus::try_from(tx_model.status.as_str())?;
            let kind = TradeKind::try_from(tx_model.kind.as_str())?;
            let trade_date = tx_model.trade_date;

            match status {
                TransactionStatus::Pending => {}
                TransactionStatus::Cancelled => {
                    return Err(EngineError::AlreadyCancelled(format!(
                        "transaction {tx_id}"
                    )));
                }
                TransactionStatus::Completed => {
                    return Err(EngineError::Validation(
                        "only pending transactions accept payments".to_string(),
                    ));
                }
            }

            let payment_models = payments::Entity::find()
                .filter(payments::Column::TransactionId.eq(tx_id.to_string()))
                .order_by_asc(payments::Column::Position)
                .all(&db_tx)
                .await?;
            let mut tx_payments = payment_models
                .into_iter()
                .map(Payment::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let paid = tx_payments
                .iter()
                .fold(MoneyCents::ZERO, |acc, p| acc + p.amount);

            let total = MoneyCents::new(tx_model.total_minor);
            ensure_within_total(paid + amount, total)?;

            let draft = PaymentDraft::new(target, amount);
            self.require_payment_targets(&db_tx, std::slice::from_ref(&draft))
                .await?;
            if kind == TradeKind::Purchase {
                self.ensure_sufficient_balance(&db_tx, trade_date, std::slice::from_ref(&draft))
                    .await?;
            }

            let payment = Payment::new(
                tx_id,
                tx_payments.len() as i32,
                target,
                amount,
                self.clock.now(),
            );
            payments::ActiveModel::from(&payment).insert(&db_tx).await?;

            self.record_entry(
                &db_tx,
                trade_date,
                target,
                amount,
                payment_direction(kind),
                payment_source(kind),
                tx_id,
                &cmd.actor,
            )
            .await?;

            let new_status = status_for(total, paid + amount);
            let tx_active = transactions::ActiveModel {
                id: ActiveValue::Set(tx_id.to_string()),
                status: ActiveValue::Set(new_status.as_str().to_string()),
                ..Default::default()
            };
            tx_active.update(&db_tx).await?;

            tx_payments.push(payment);
            let mut tx = Transaction::try_from(tx_model)?;
            tx.status = new_status;
            tx.payments = tx_payments;
            tx.items = self
                .transaction_on(&db_tx, tx_id)
                .await
                .map(|loaded| loaded.items)?;
            Ok::<_, EngineError>(tx)
        })?;

        self.recompute_best_effort(result.trade_date).await;
        Ok(result)
    }
}
