//! Command structs for engine operations.
//!
//! These types group parameters for the write operations (create, update,
//! cancel, add payment), keeping call sites readable and avoiding long
//! argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Adjustment, MoneyCents, PaymentTarget, PriceMode, TradeKind};

/// One line item as submitted by the caller, before pricing.
#[derive(Clone, Debug)]
pub struct LineItemDraft {
    pub product_id: Uuid,
    /// Entered quantity at the front counter (units, or dozens in per-dozen
    /// mode).
    pub quantity_front: i64,
    /// Entered quantity at the warehouse.
    pub quantity_warehouse: i64,
    pub price_mode: PriceMode,
    /// The authoritative price in the entry mode (per unit or per dozen).
    pub price: MoneyCents,
    pub discount: Adjustment,
}

impl LineItemDraft {
    #[must_use]
    pub fn new(product_id: Uuid, price_mode: PriceMode, price: MoneyCents) -> Self {
        Self {
            product_id,
            quantity_front: 0,
            quantity_warehouse: 0,
            price_mode,
            price,
            discount: Adjustment::NONE,
        }
    }

    #[must_use]
    pub fn front(mut self, quantity: i64) -> Self {
        self.quantity_front = quantity;
        self
    }

    #[must_use]
    pub fn warehouse(mut self, quantity: i64) -> Self {
        self.quantity_warehouse = quantity;
        self
    }

    #[must_use]
    pub fn discount(mut self, discount: Adjustment) -> Self {
        self.discount = discount;
        self
    }
}

/// One payment as submitted by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentDraft {
    pub target: PaymentTarget,
    pub amount: MoneyCents,
}

impl PaymentDraft {
    #[must_use]
    pub fn new(target: PaymentTarget, amount: MoneyCents) -> Self {
        Self { target, amount }
    }
}

/// Create a purchase or sale.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub kind: TradeKind,
    pub counterparty_name: String,
    pub counterparty_phone: Option<String>,
    /// Business date; must be "today" on the engine clock.
    pub trade_date: NaiveDate,
    pub items: Vec<LineItemDraft>,
    pub payments: Vec<PaymentDraft>,
    pub discount: Adjustment,
    pub tax: Adjustment,
    pub actor: String,
    pub idempotency_key: Option<String>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        kind: TradeKind,
        counterparty_name: impl Into<String>,
        trade_date: NaiveDate,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            counterparty_name: counterparty_name.into(),
            counterparty_phone: None,
            trade_date,
            items: Vec::new(),
            payments: Vec::new(),
            discount: Adjustment::NONE,
            tax: Adjustment::NONE,
            actor: actor.into(),
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.counterparty_phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn item(mut self, item: LineItemDraft) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn payment(mut self, payment: PaymentDraft) -> Self {
        self.payments.push(payment);
        self
    }

    #[must_use]
    pub fn discount(mut self, discount: Adjustment) -> Self {
        self.discount = discount;
        self
    }

    #[must_use]
    pub fn tax(mut self, tax: Adjustment) -> Self {
        self.tax = tax;
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Replace a transaction's item set and/or append payments.
///
/// The submitted payment list must start with the stored payments
/// unchanged; anything beyond the stored length is appended.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub transaction_id: Uuid,
    pub items: Vec<LineItemDraft>,
    pub payments: Vec<PaymentDraft>,
    pub discount: Adjustment,
    pub tax: Adjustment,
    pub actor: String,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid, actor: impl Into<String>) -> Self {
        Self {
            transaction_id,
            items: Vec::new(),
            payments: Vec::new(),
            discount: Adjustment::NONE,
            tax: Adjustment::NONE,
            actor: actor.into(),
        }
    }

    #[must_use]
    pub fn item(mut self, item: LineItemDraft) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn payment(mut self, payment: PaymentDraft) -> Self {
        self.payments.push(payment);
        self
    }

    #[must_use]
    pub fn discount(mut self, discount: Adjustment) -> Self {
        self.discount = discount;
        self
    }

    #[must_use]
    pub fn tax(mut self, tax: Adjustment) -> Self {
        self.tax = tax;
        self
    }
}

/// Cancel a transaction within the cancellation window.
#[derive(Clone, Debug)]
pub struct CancelTransactionCmd {
    pub transaction_id: Uuid,
    /// Where the refund goes when anything was paid. Cash or a bank
    /// account; there is no default.
    pub refund_to: Option<PaymentTarget>,
    pub actor: String,
}

impl CancelTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid, actor: impl Into<String>) -> Self {
        Self {
            transaction_id,
            refund_to: None,
            actor: actor.into(),
        }
    }

    #[must_use]
    pub fn refund_to(mut self, target: PaymentTarget) -> Self {
        self.refund_to = Some(target);
        self
    }
}

/// Append one payment to a pending transaction.
#[derive(Clone, Debug)]
pub struct AddPaymentCmd {
    pub transaction_id: Uuid,
    pub payment: PaymentDraft,
    pub actor: String,
}

impl AddPaymentCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid, payment: PaymentDraft, actor: impl Into<String>) -> Self {
        Self {
            transaction_id,
            payment,
            actor: actor.into(),
        }
    }
}
