//! Wire types for the Bancone HTTP surface.
//!
//! All monetary fields travel as strings with two decimal places
//! (`"1200.00"`); dates are plain calendar dates, timestamps are local
//! wall-clock values without a timezone component.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Purchase,
        Sale,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Pending,
        Completed,
        Cancelled,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PriceMode {
        PerUnit,
        PerDozen,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum StockLocation {
        Front,
        Warehouse,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AdjustmentKind {
        Percent,
        Absolute,
    }

    /// A discount or tax: a percentage (`"10.00"` = 10%) or an absolute
    /// amount, selected by `kind`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Adjustment {
        pub kind: AdjustmentKind,
        pub value: String,
    }

    /// Payment-method target, tagged by `target`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "target", rename_all = "snake_case")]
    pub enum PaymentTarget {
        Cash,
        Bank { account_id: Uuid },
        Card { card_id: Uuid },
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct LineItemNew {
        pub product_id: Uuid,
        /// Entered quantity at the front counter (units, or dozens in
        /// per-dozen mode).
        pub quantity_front: i64,
        pub quantity_warehouse: i64,
        pub price_mode: PriceMode,
        /// Authoritative price in the entry mode.
        pub price: String,
        pub discount: Option<Adjustment>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PaymentNew {
        #[serde(flatten)]
        pub target: PaymentTarget,
        pub amount: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        pub counterparty_name: String,
        pub counterparty_phone: Option<String>,
        /// Business date; must be today.
        pub trade_date: NaiveDate,
        pub items: Vec<LineItemNew>,
        #[serde(default)]
        pub payments: Vec<PaymentNew>,
        pub discount: Option<Adjustment>,
        pub tax: Option<Adjustment>,
        pub idempotency_key: Option<String>,
    }

    /// Full replacement of the item set; the payment list must start with
    /// the stored payments unchanged, new ones are appended.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub items: Vec<LineItemNew>,
        #[serde(default)]
        pub payments: Vec<PaymentNew>,
        pub discount: Option<Adjustment>,
        pub tax: Option<Adjustment>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionCancel {
        /// Required when anything was paid; cash or a bank account.
        pub refund_to: Option<PaymentTarget>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct LineItemView {
        pub id: Uuid,
        pub product_id: Uuid,
        pub position: i32,
        pub quantity_front: i64,
        pub quantity_warehouse: i64,
        pub price_mode: PriceMode,
        pub unit_price: String,
        pub dozen_price: String,
        pub discount: Adjustment,
        pub line_total: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        pub id: Uuid,
        pub position: i32,
        #[serde(flatten)]
        pub target: PaymentTarget,
        pub amount: String,
        pub paid_at: NaiveDateTime,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub counterparty_name: String,
        pub counterparty_phone: Option<String>,
        pub trade_date: NaiveDate,
        pub subtotal: String,
        pub discount: Adjustment,
        pub tax: Adjustment,
        pub total: String,
        pub remaining_balance: String,
        pub status: TransactionStatus,
        pub created_by: String,
        pub created_at: NaiveDateTime,
        pub cancelled_at: Option<NaiveDateTime>,
        pub cancelled_by: Option<String>,
        pub items: Vec<LineItemView>,
        pub payments: Vec<PaymentView>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct StockDeltaView {
        pub product_id: Uuid,
        pub location: StockLocation,
        pub delta: i64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub transaction: TransactionView,
        pub applied_stock_deltas: Vec<StockDeltaView>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        pub kinds: Option<Vec<TransactionKind>>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub include_cancelled: Option<bool>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor from `next_cursor`. Newest → older.
        pub cursor: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub next_cursor: Option<String>,
    }
}

pub mod balance {
    use super::*;

    /// Balance of one bank account or card.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TargetBalance {
        pub id: Uuid,
        pub balance: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ClosingBalanceView {
        pub date: NaiveDate,
        pub cash: String,
        pub banks: Vec<TargetBalance>,
        pub cards: Vec<TargetBalance>,
    }
}

pub mod confirmation {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ConfirmationStatusView {
        pub confirmed: bool,
        pub needs_confirmation: bool,
        pub previous_snapshot: super::balance::ClosingBalanceView,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ConfirmationAck {
        pub date: NaiveDate,
        pub confirmed_by: String,
        pub confirmed_at: NaiveDateTime,
    }
}
