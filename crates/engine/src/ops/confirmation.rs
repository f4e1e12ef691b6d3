//! Daily confirmation gate.
//!
//! A per-date, system-wide acknowledgment that yesterday's balances were
//! looked at. The gate itself never blocks writes; the surrounding layer
//! checks it before accepting new money-moving transactions for the day.

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};

use crate::{
    ConfirmationStatus, DailyConfirmation, EngineError, ResultEngine, confirmations, ledger,
    opening_balances,
};

use super::{Engine, with_tx};

impl Engine {
    /// Confirms `date`. Idempotent: a second confirmation returns the
    /// existing row untouched.
    pub async fn confirm(&self, date: NaiveDate, actor: &str) -> ResultEngine<DailyConfirmation> {
        let actor = actor.to_string();
        with_tx!(self, |db_tx| {
            if let Some(existing) = confirmations::Entity::find_by_id(date)
                .one(&db_tx)
                .await?
            {
                return Ok(existing.into());
            }

            let model = confirmations::ActiveModel {
                confirmed_date: ActiveValue::Set(date),
                confirmed_by: ActiveValue::Set(actor.clone()),
                confirmed_at: ActiveValue::Set(self.clock.now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(model.into())
        })
    }

    /// Whether `date` still needs its confirmation.
    ///
    /// True only when the day is unconfirmed, the cutoff time of day has
    /// passed, and there is ledger history before `date` (something to
    /// reconcile).
    pub async fn needs_confirmation(&self, date: NaiveDate) -> ResultEngine<bool> {
        if confirmations::Entity::find_by_id(date)
            .one(&self.database)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let now = self.clock.now();
        let past_cutoff = match date.cmp(&now.date()) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Equal => now.time() >= self.confirmation_cutoff,
            std::cmp::Ordering::Greater => false,
        };
        if !past_cutoff {
            return Ok(false);
        }

        let has_entries = ledger::Entity::find()
            .filter(ledger::Column::EntryDate.lt(date))
            .one(&self.database)
            .await?
            .is_some();
        if has_entries {
            return Ok(true);
        }
        let has_openings = opening_balances::Entity::find()
            .filter(opening_balances::Column::BalanceDate.lt(date))
            .one(&self.database)
            .await?
            .is_some();
        Ok(has_openings)
    }

    /// Gate status plus the prior day's snapshot for whoever reconciles.
    pub async fn confirmation_status(&self, date: NaiveDate) -> ResultEngine<ConfirmationStatus> {
        let confirmed = confirmations::Entity::find_by_id(date)
            .one(&self.database)
            .await?
            .is_some();
        let needs_confirmation = self.needs_confirmation(date).await?;
        let previous_date = date
            .pred_opt()
            .ok_or_else(|| EngineError::Validation("date out of range".to_string()))?;
        let previous_snapshot = self.closing_balance(previous_date).await?;

        Ok(ConfirmationStatus {
            confirmed,
            needs_confirmation,
            previous_snapshot,
        })
    }
}
