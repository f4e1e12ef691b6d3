//! Daily confirmations.
//!
//! One row per business date, system-wide: the first user to confirm a day
//! satisfies the gate for everyone. Confirming an already-confirmed day is
//! a no-op.

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;

use crate::ClosingBalanceSnapshot;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyConfirmation {
    pub date: NaiveDate,
    pub confirmed_by: String,
    pub confirmed_at: NaiveDateTime,
}

/// Gate status for one date, as reported to callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmationStatus {
    pub confirmed: bool,
    pub needs_confirmation: bool,
    /// The prior day's closing balances, shown to whoever reconciles.
    pub previous_snapshot: ClosingBalanceSnapshot,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "daily_confirmations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub confirmed_date: chrono::NaiveDate,
    pub confirmed_by: String,
    pub confirmed_at: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DailyConfirmation {
    fn from(model: Model) -> Self {
        Self {
            date: model.confirmed_date,
            confirmed_by: model.confirmed_by,
            confirmed_at: model.confirmed_at,
        }
    }
}
