//! Trade transactions.
//!
//! A `Transaction` is a purchase or a sale: the two are structurally
//! identical and differ only in the direction stock and money move. Line
//! items and payments hang off it; ledger entries reference it by id.

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Adjustment, EngineError, MoneyCents, ResultEngine, util::parse_uuid};

use super::{line_items, payments};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeKind {
    Purchase,
    Sale,
}

impl TradeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
        }
    }
}

impl TryFrom<&str> for TradeKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "purchase" => Ok(Self::Purchase),
            "sale" => Ok(Self::Sale),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

/// Status from the money actually received: anything outstanding is
/// pending, fully paid is completed. Cancelled is only ever set explicitly.
pub(crate) fn derive_status(total: MoneyCents, paid: MoneyCents) -> TransactionStatus {
    if paid >= total {
        TransactionStatus::Completed
    } else {
        TransactionStatus::Pending
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TradeKind,
    /// Denormalized counterparty data; counterparty records live elsewhere.
    pub counterparty_name: String,
    pub counterparty_phone: Option<String>,
    /// Business date, used for ledger and closing-balance attribution.
    pub trade_date: NaiveDate,
    pub subtotal: MoneyCents,
    pub discount: Adjustment,
    pub tax: Adjustment,
    pub total: MoneyCents,
    pub status: TransactionStatus,
    pub created_by: String,
    /// Local wall-clock creation time, distinct from the business date.
    pub created_at: NaiveDateTime,
    pub cancelled_at: Option<NaiveDateTime>,
    pub cancelled_by: Option<String>,
    pub idempotency_key: Option<String>,
    pub items: Vec<line_items::LineItem>,
    pub payments: Vec<payments::Payment>,
}

impl Transaction {
    /// Total received so far across all payments.
    #[must_use]
    pub fn paid(&self) -> MoneyCents {
        self.payments
            .iter()
            .fold(MoneyCents::ZERO, |acc, p| acc + p.amount)
    }

    /// `total − Σ payments`; never negative for a committed transaction.
    #[must_use]
    pub fn remaining_balance(&self) -> MoneyCents {
        self.total - self.paid()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub counterparty_name: String,
    pub counterparty_phone: Option<String>,
    pub trade_date: chrono::NaiveDate,
    pub subtotal_minor: i64,
    pub discount_kind: String,
    pub discount_value: i64,
    pub tax_kind: String,
    pub tax_value: i64,
    pub total_minor: i64,
    pub status: String,
    pub created_by: String,
    pub created_at: chrono::NaiveDateTime,
    pub cancelled_at: Option<chrono::NaiveDateTime>,
    pub cancelled_by: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::line_items::Entity")]
    LineItems,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_many = "super::ledger::Entity")]
    LedgerEntries,
}

impl Related<super::line_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            counterparty_name: ActiveValue::Set(tx.counterparty_name.clone()),
            counterparty_phone: ActiveValue::Set(tx.counterparty_phone.clone()),
            trade_date: ActiveValue::Set(tx.trade_date),
            subtotal_minor: ActiveValue::Set(tx.subtotal.cents()),
            discount_kind: ActiveValue::Set(tx.discount.kind().to_string()),
            discount_value: ActiveValue::Set(tx.discount.raw_value()),
            tax_kind: ActiveValue::Set(tx.tax.kind().to_string()),
            tax_value: ActiveValue::Set(tx.tax.raw_value()),
            total_minor: ActiveValue::Set(tx.total.cents()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            cancelled_at: ActiveValue::Set(tx.cancelled_at),
            cancelled_by: ActiveValue::Set(tx.cancelled_by.clone()),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            kind: TradeKind::try_from(model.kind.as_str())?,
            counterparty_name: model.counterparty_name,
            counterparty_phone: model.counterparty_phone,
            trade_date: model.trade_date,
            subtotal: MoneyCents::new(model.subtotal_minor),
            discount: Adjustment::from_columns(&model.discount_kind, model.discount_value)?,
            tax: Adjustment::from_columns(&model.tax_kind, model.tax_value)?,
            total: MoneyCents::new(model.total_minor),
            status: TransactionStatus::try_from(model.status.as_str())?,
            created_by: model.created_by,
            created_at: model.created_at,
            cancelled_at: model.cancelled_at,
            cancelled_by: model.cancelled_by,
            idempotency_key: model.idempotency_key,
            items: Vec::new(),
            payments: Vec::new(),
        })
    }
}
