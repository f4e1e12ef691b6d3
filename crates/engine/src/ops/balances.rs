//! Closing-balance calculator.
//!
//! The end-of-day balance for a date is the previous day's closing balance
//! plus the net of that day's ledger entries (plus any opening-balance
//! override recorded for the day). Computed snapshots are cached as rows;
//! the cache is derived state and is dropped whenever an earlier day
//! changes, so stale days re-derive on the next query.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    ClosingBalanceSnapshot, EngineError, LedgerEntry, MoneyCents, PaymentTarget, ResultEngine,
    closing_balances, ledger, opening_balances,
};

use super::{Engine, with_tx};

fn assemble(
    date: NaiveDate,
    rows: Vec<closing_balances::Model>,
) -> ResultEngine<ClosingBalanceSnapshot> {
    let mut snapshot = ClosingBalanceSnapshot::empty(date);
    for row in rows {
        let target = PaymentTarget::from_columns(&row.target_kind, row.target_id.as_deref())?;
        snapshot.add_cents(&target, row.balance_minor);
    }
    Ok(snapshot)
}

impl Engine {
    /// End-of-day balances for `date`, computing and caching them if needed.
    pub async fn closing_balance(&self, date: NaiveDate) -> ResultEngine<ClosingBalanceSnapshot> {
        with_tx!(self, |db_tx| {
            let snapshot = self.snapshot_in_tx(&db_tx, date).await?;
            Ok(snapshot)
        })
    }

    /// Forces recomputation of `date` and drops every cached later day.
    ///
    /// Called after any ledger mutation affecting `date`; later days are
    /// derived from this one, so their cached rows are stale and re-derive
    /// lazily.
    pub async fn recompute_closing_balance(
        &self,
        date: NaiveDate,
    ) -> ResultEngine<ClosingBalanceSnapshot> {
        with_tx!(self, |db_tx| {
            closing_balances::Entity::delete_many()
                .filter(closing_balances::Column::BalanceDate.gte(date))
                .exec(&db_tx)
                .await?;
            let snapshot = self.snapshot_in_tx(&db_tx, date).await?;
            Ok(snapshot)
        })
    }

    /// Best-effort recompute after a committed write: the ledger is already
    /// correct, so a failure here only leaves a stale cache. Logged, never
    /// propagated.
    pub(crate) async fn recompute_best_effort(&self, date: NaiveDate) {
        if let Err(err) = self.recompute_closing_balance(date).await {
            tracing::warn!("closing balance recompute for {date} failed: {err}");
        }
    }

    /// Records a one-time opening balance for (date, target).
    pub async fn record_opening_balance(
        &self,
        date: NaiveDate,
        target: PaymentTarget,
        amount: MoneyCents,
        actor: &str,
    ) -> ResultEngine<()> {
        if !amount.is_positive() {
            return Err(EngineError::Validation(
                "opening balance must be > 0".to_string(),
            ));
        }
        match target {
            PaymentTarget::Cash => {}
            PaymentTarget::Bank { account_id } => {
                self.require_bank_account(&self.database, account_id).await?;
            }
            PaymentTarget::Card { card_id } => {
                self.require_card(&self.database, card_id).await?;
            }
        }

        let actor = actor.to_string();
        with_tx!(self, |db_tx| {
            let (target_kind, target_id) = target.columns();
            let mut existing = opening_balances::Entity::find()
                .filter(opening_balances::Column::BalanceDate.eq(date))
                .filter(opening_balances::Column::TargetKind.eq(target_kind.clone()));
            existing = match target_id.clone() {
                Some(id) => existing.filter(opening_balances::Column::TargetId.eq(id)),
                None => existing.filter(opening_balances::Column::TargetId.is_null()),
            };
            if existing.one(&db_tx).await?.is_some() {
                return Err(EngineError::Validation(format!(
                    "opening balance already recorded for {} on {date}",
                    target.describe()
                )));
            }

            opening_balances::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                balance_date: ActiveValue::Set(date),
                target_kind: ActiveValue::Set(target_kind),
                target_id: ActiveValue::Set(target_id),
                amount_minor: ActiveValue::Set(amount.cents()),
                recorded_by: ActiveValue::Set(actor.clone()),
            }
            .insert(&db_tx)
            .await?;

            // Cached closing balances from this day on are stale now.
            closing_balances::Entity::delete_many()
                .filter(closing_balances::Column::BalanceDate.gte(date))
                .exec(&db_tx)
                .await?;

            Ok(())
        })
    }

    /// Snapshot computation shared with the orchestrator, which needs the
    /// balance check and the ledger write to commit atomically.
    pub(crate) async fn snapshot_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        date: NaiveDate,
    ) -> ResultEngine<ClosingBalanceSnapshot> {
        let stored = closing_balances::Entity::find()
            .filter(closing_balances::Column::BalanceDate.eq(date))
            .all(db_tx)
            .await?;
        if !stored.is_empty() {
            return assemble(date, stored);
        }

        // Latest cached day strictly before `date` anchors the walk back.
        let anchor = closing_balances::Entity::find()
            .filter(closing_balances::Column::BalanceDate.lt(date))
            .order_by_desc(closing_balances::Column::BalanceDate)
            .one(db_tx)
            .await?
            .map(|row| row.balance_date);

        let mut snapshot = match anchor {
            Some(anchor_date) => {
                let rows = closing_balances::Entity::find()
                    .filter(closing_balances::Column::BalanceDate.eq(anchor_date))
                    .all(db_tx)
                    .await?;
                let mut base = assemble(anchor_date, rows)?;
                base.date = date;
                base
            }
            None => ClosingBalanceSnapshot::empty(date),
        };

        let mut entries_query = ledger::Entity::find().filter(ledger::Column::EntryDate.lte(date));
        if let Some(anchor_date) = anchor {
            entries_query = entries_query.filter(ledger::Column::EntryDate.gt(anchor_date));
        }
        for model in entries_query.all(db_tx).await? {
            let entry = LedgerEntry::try_from(model)?;
            snapshot.add_cents(&entry.target, entry.signed_cents());
        }

        let mut openings_query =
            opening_balances::Entity::find().filter(opening_balances::Column::BalanceDate.lte(date));
        if let Some(anchor_date) = anchor {
            openings_query =
                openings_query.filter(opening_balances::Column::BalanceDate.gt(anchor_date));
        }
        for model in openings_query.all(db_tx).await? {
            let target =
                PaymentTarget::from_columns(&model.target_kind, model.target_id.as_deref())?;
            snapshot.add_cents(&target, model.amount_minor);
        }

        // Cache the result. Cash is always present, so a computed date
        // always leaves at least one row behind.
        let computed_at = self.clock.now();
        for (target, balance) in snapshot.entries() {
            let (target_kind, target_id) = target.columns();
            closing_balances::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                balance_date: ActiveValue::Set(date),
                target_kind: ActiveValue::Set(target_kind),
                target_id: ActiveValue::Set(target_id),
                balance_minor: ActiveValue::Set(balance.cents()),
                computed_at: ActiveValue::Set(computed_at),
            }
            .insert(db_tx)
            .await?;
        }

        Ok(snapshot)
    }
}
