//! Opening-balance overrides.
//!
//! An opening balance seeds a target on a given date, recorded once by the
//! back office when a till or account enters the system with money already
//! in it. The closing-balance calculator consumes it as a one-time addend
//! on that date.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "opening_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub balance_date: chrono::NaiveDate,
    pub target_kind: String,
    pub target_id: Option<String>,
    pub amount_minor: i64,
    pub recorded_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
