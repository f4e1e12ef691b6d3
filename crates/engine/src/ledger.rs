//! Ledger entries.
//!
//! A [`LedgerEntry`] is a single immutable monetary movement against one
//! payment target on one business date. Entries are append-only: edits add
//! new entries and cancellations add a reversing entry, nothing is ever
//! rewritten. The sum of signed entries for a (date, target) pair is that
//! day's net movement for the target.

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, PaymentTarget, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryDirection {
    Income,
    Expense,
}

impl EntryDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// The opposite direction, used for refunds.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Income => Self::Expense,
            Self::Expense => Self::Income,
        }
    }
}

impl TryFrom<&str> for EntryDirection {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid entry direction: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    PurchasePayment,
    SalePayment,
    PurchaseRefund,
    SaleRefund,
}

impl EntrySource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PurchasePayment => "purchase_payment",
            Self::SalePayment => "sale_payment",
            Self::PurchaseRefund => "purchase_refund",
            Self::SaleRefund => "sale_refund",
        }
    }
}

impl TryFrom<&str> for EntrySource {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "purchase_payment" => Ok(Self::PurchasePayment),
            "sale_payment" => Ok(Self::SalePayment),
            "purchase_refund" => Ok(Self::PurchaseRefund),
            "sale_refund" => Ok(Self::SaleRefund),
            other => Err(EngineError::Validation(format!(
                "invalid entry source: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub entry_date: NaiveDate,
    pub target: PaymentTarget,
    /// Always positive; the sign lives in `direction`.
    pub amount: MoneyCents,
    pub direction: EntryDirection,
    pub source: EntrySource,
    pub transaction_id: Uuid,
    pub recorded_by: String,
    pub recorded_at: NaiveDateTime,
}

impl LedgerEntry {
    /// Signed cents: income counts up, expense counts down.
    #[must_use]
    pub fn signed_cents(&self) -> i64 {
        match self.direction {
            EntryDirection::Income => self.amount.cents(),
            EntryDirection::Expense => -self.amount.cents(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub entry_date: chrono::NaiveDate,
    pub target_kind: String,
    pub target_id: Option<String>,
    pub amount_minor: i64,
    pub direction: String,
    pub source: String,
    pub transaction_id: String,
    pub recorded_by: String,
    pub recorded_at: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        let (target_kind, target_id) = entry.target.columns();
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            entry_date: ActiveValue::Set(entry.entry_date),
            target_kind: ActiveValue::Set(target_kind),
            target_id: ActiveValue::Set(target_id),
            amount_minor: ActiveValue::Set(entry.amount.cents()),
            direction: ActiveValue::Set(entry.direction.as_str().to_string()),
            source: ActiveValue::Set(entry.source.as_str().to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            recorded_by: ActiveValue::Set(entry.recorded_by.clone()),
            recorded_at: ActiveValue::Set(entry.recorded_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "ledger entry")?,
            entry_date: model.entry_date,
            target: PaymentTarget::from_columns(&model.target_kind, model.target_id.as_deref())?,
            amount: MoneyCents::new(model.amount_minor),
            direction: EntryDirection::try_from(model.direction.as_str())?,
            source: EntrySource::try_from(model.source.as_str())?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            recorded_by: model.recorded_by,
            recorded_at: model.recorded_at,
        })
    }
}
