//! Ledger writer.
//!
//! Appends immutable signed entries keyed by (payment target, business
//! date). The writer does not check fund sufficiency; the orchestrator does
//! that against the closing-balance calculator before calling in. Several
//! entries per source transaction are normal (one per payment).

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    EngineError, EntryDirection, EntrySource, LedgerEntry, MoneyCents, PaymentTarget,
    ResultEngine, ledger,
};

use super::Engine;

impl Engine {
    /// Appends one ledger entry.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn record_entry(
        &self,
        db_tx: &DatabaseTransaction,
        entry_date: NaiveDate,
        target: PaymentTarget,
        amount: MoneyCents,
        direction: EntryDirection,
        source: EntrySource,
        transaction_id: Uuid,
        actor: &str,
    ) -> ResultEngine<LedgerEntry> {
        if !amount.is_positive() {
            return Err(EngineError::Validation(
                "ledger amount must be > 0".to_string(),
            ));
        }

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            entry_date,
            target,
            amount,
            direction,
            source,
            transaction_id,
            recorded_by: actor.to_string(),
            recorded_at: self.clock.now(),
        };
        ledger::ActiveModel::from(&entry).insert(db_tx).await?;
        Ok(entry)
    }

    /// All entries booked on `date`, in append order.
    pub async fn ledger_entries(&self, date: NaiveDate) -> ResultEngine<Vec<LedgerEntry>> {
        let models = ledger::Entity::find()
            .filter(ledger::Column::EntryDate.eq(date))
            .order_by_asc(ledger::Column::RecordedAt)
            .order_by_asc(ledger::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(LedgerEntry::try_from).collect()
    }

    /// All entries backing one transaction, in append order.
    pub async fn ledger_entries_for_transaction(
        &self,
        transaction_id: Uuid,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let models = ledger::Entity::find()
            .filter(ledger::Column::TransactionId.eq(transaction_id.to_string()))
            .order_by_asc(ledger::Column::RecordedAt)
            .order_by_asc(ledger::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(LedgerEntry::try_from).collect()
    }
}
