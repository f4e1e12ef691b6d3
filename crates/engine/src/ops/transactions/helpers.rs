//! Pricing and validation shared by the transaction writes.

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::DatabaseTransaction;
use uuid::Uuid;

use crate::{
    Adjustment, EngineError, EntryDirection, EntrySource, LineItem, LineItemDraft, MoneyCents,
    PaymentDraft, PaymentTarget, PriceMode, ResultEngine, StockDelta, StockLocation, TradeKind,
    TransactionStatus, transactions::derive_status,
};

use super::super::Engine;

/// Days after the business date during which a transaction may still be
/// edited (when completed) or cancelled.
pub(super) const EDIT_WINDOW_DAYS: i64 = 7;
pub(super) const CANCEL_WINDOW_DAYS: i64 = 7;

pub(super) fn days_since(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days()
}

/// Prices one submitted line: derives the missing price representation,
/// applies the line discount, and rounds the total exactly once.
pub(super) fn price_line(
    draft: &LineItemDraft,
    transaction_id: Uuid,
    position: i32,
) -> ResultEngine<LineItem> {
    if draft.quantity_front < 0 || draft.quantity_warehouse < 0 {
        return Err(EngineError::QuantityInvalid(
            "line quantities must not be negative".to_string(),
        ));
    }
    if draft.quantity_front == 0 && draft.quantity_warehouse == 0 {
        return Err(EngineError::QuantityInvalid(
            "line must carry a quantity at the front or the warehouse".to_string(),
        ));
    }
    if !draft.price.is_positive() {
        return Err(EngineError::Validation(
            "line price must be > 0".to_string(),
        ));
    }

    let (unit_price, dozen_price) = match draft.price_mode {
        PriceMode::PerUnit => (draft.price, draft.price.times(12)?),
        PriceMode::PerDozen => (draft.price.div_round(12), draft.price),
    };

    // Gross is authoritative-price × entered-quantity: both operands are
    // exact, so the only rounding happens inside the discount.
    let entered = draft.quantity_front + draft.quantity_warehouse;
    let gross = draft.price.times(entered)?;
    let discount_amount = draft.discount.amount_on(gross);
    if discount_amount.is_negative() {
        return Err(EngineError::Validation(
            "line discount must not be negative".to_string(),
        ));
    }
    let line_total = gross - discount_amount;
    if line_total.is_negative() {
        return Err(EngineError::Validation(
            "line discount exceeds the line amount".to_string(),
        ));
    }

    Ok(LineItem {
        id: Uuid::new_v4(),
        transaction_id,
        product_id: draft.product_id,
        position,
        quantity_front: draft.quantity_front,
        quantity_warehouse: draft.quantity_warehouse,
        price_mode: draft.price_mode,
        unit_price,
        dozen_price,
        discount: draft.discount,
        line_total,
    })
}

/// Subtotal and grand total: subtotal → transaction discount → tax.
pub(super) fn compute_totals(
    items: &[LineItem],
    discount: Adjustment,
    tax: Adjustment,
) -> ResultEngine<(MoneyCents, MoneyCents)> {
    let subtotal = items
        .iter()
        .fold(MoneyCents::ZERO, |acc, item| acc + item.line_total);

    let discount_amount = discount.amount_on(subtotal);
    if discount_amount.is_negative() {
        return Err(EngineError::Validation(
            "discount must not be negative".to_string(),
        ));
    }
    let after_discount = subtotal - discount_amount;
    if after_discount.is_negative() {
        return Err(EngineError::Validation(
            "discount exceeds the subtotal".to_string(),
        ));
    }

    let tax_amount = tax.amount_on(after_discount);
    if tax_amount.is_negative() {
        return Err(EngineError::Validation(
            "tax must not be negative".to_string(),
        ));
    }

    Ok((subtotal, after_discount + tax_amount))
}

/// Submitted payments with empty/zero rows dropped.
pub(super) fn clean_payments(drafts: &[PaymentDraft]) -> Vec<PaymentDraft> {
    drafts
        .iter()
        .filter(|p| p.amount.is_positive())
        .cloned()
        .collect()
}

pub(super) fn payments_total(drafts: &[PaymentDraft]) -> MoneyCents {
    drafts
        .iter()
        .fold(MoneyCents::ZERO, |acc, p| acc + p.amount)
}

pub(super) fn ensure_within_total(paid: MoneyCents, total: MoneyCents) -> ResultEngine<()> {
    if paid > total {
        return Err(EngineError::PaymentExceedsTotal(format!(
            "payments sum to {paid} against a total of {total}"
        )));
    }
    Ok(())
}

/// Sums payments per target, so two payments against the same near-empty
/// target cannot each pass the balance check individually.
pub(super) fn aggregate_by_target(
    drafts: &[PaymentDraft],
) -> Vec<(PaymentTarget, MoneyCents)> {
    let mut totals: HashMap<PaymentTarget, MoneyCents> = HashMap::new();
    for draft in drafts {
        let entry = totals.entry(draft.target).or_insert(MoneyCents::ZERO);
        *entry += draft.amount;
    }
    totals.into_iter().collect()
}

/// Purchases add stock, sales remove it.
pub(super) fn stock_sign(kind: TradeKind) -> i64 {
    match kind {
        TradeKind::Purchase => 1,
        TradeKind::Sale => -1,
    }
}

/// One delta per (line, location) with a nonzero quantity.
pub(super) fn stock_deltas(kind: TradeKind, items: &[LineItem]) -> Vec<StockDelta> {
    let sign = stock_sign(kind);
    let mut deltas = Vec::new();
    for item in items {
        for location in [StockLocation::Front, StockLocation::Warehouse] {
            let units = item.unit_count(location);
            if units != 0 {
                deltas.push(StockDelta {
                    product_id: item.product_id,
                    location,
                    delta: sign * units,
                });
            }
        }
    }
    deltas
}

/// Money leaves on a purchase and arrives on a sale.
pub(super) fn payment_direction(kind: TradeKind) -> EntryDirection {
    match kind {
        TradeKind::Purchase => EntryDirection::Expense,
        TradeKind::Sale => EntryDirection::Income,
    }
}

pub(super) fn payment_source(kind: TradeKind) -> EntrySource {
    match kind {
        TradeKind::Purchase => EntrySource::PurchasePayment,
        TradeKind::Sale => EntrySource::SalePayment,
    }
}

pub(super) fn refund_source(kind: TradeKind) -> EntrySource {
    match kind {
        TradeKind::Purchase => EntrySource::PurchaseRefund,
        TradeKind::Sale => EntrySource::SaleRefund,
    }
}

pub(super) fn status_for(total: MoneyCents, paid: MoneyCents) -> TransactionStatus {
    derive_status(total, paid)
}

impl Engine {
    /// Every bank/card payment target must reference an existing record.
    pub(super) async fn require_payment_targets(
        &self,
        db_tx: &DatabaseTransaction,
        drafts: &[PaymentDraft],
    ) -> ResultEngine<()> {
        for draft in drafts {
            match draft.target {
                PaymentTarget::Cash => {}
                PaymentTarget::Bank { account_id } => {
                    self.require_bank_account(db_tx, account_id).await?;
                }
                PaymentTarget::Card { card_id } => {
                    self.require_card(db_tx, card_id).await?;
                }
            }
        }
        Ok(())
    }

    /// Outflow sufficiency: every target must hold at least the summed
    /// payment amount as of `date`'s snapshot. Runs inside the same DB
    /// transaction as the ledger write, so check and write commit together.
    pub(super) async fn ensure_sufficient_balance(
        &self,
        db_tx: &DatabaseTransaction,
        date: NaiveDate,
        drafts: &[PaymentDraft],
    ) -> ResultEngine<()> {
        if drafts.is_empty() {
            return Ok(());
        }
        let snapshot = self.snapshot_in_tx(db_tx, date).await?;
        for (target, amount) in aggregate_by_target(drafts) {
            let available = snapshot.balance(&target);
            if available < amount {
                return Err(EngineError::InsufficientBalance(format!(
                    "{} holds {available} on {date}, {amount} required",
                    target.describe()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Percent;

    fn draft(front: i64, warehouse: i64, mode: PriceMode, price_cents: i64) -> LineItemDraft {
        let mut d = LineItemDraft::new(Uuid::new_v4(), mode, MoneyCents::new(price_cents));
        d.quantity_front = front;
        d.quantity_warehouse = warehouse;
        d
    }

    #[test]
    fn per_unit_line_derives_dozen_price() {
        let item = price_line(&draft(5, 3, PriceMode::PerUnit, 150), Uuid::new_v4(), 0).unwrap();
        assert_eq!(item.unit_price.cents(), 150);
        assert_eq!(item.dozen_price.cents(), 1800);
        assert_eq!(item.line_total.cents(), 8 * 150);
    }

    #[test]
    fn per_dozen_line_counts_units_by_twelve() {
        let item = price_line(&draft(2, 0, PriceMode::PerDozen, 2500), Uuid::new_v4(), 0).unwrap();
        assert_eq!(item.dozen_price.cents(), 2500);
        assert_eq!(item.unit_price.cents(), 208);
        assert_eq!(item.line_total.cents(), 5000);
        assert_eq!(item.unit_count(StockLocation::Front), 24);
        assert_eq!(item.unit_count(StockLocation::Warehouse), 0);
    }

    #[test]
    fn percent_discount_rounds_once() {
        let mut d = draft(3, 0, PriceMode::PerUnit, 333);
        d.discount = Adjustment::Percent(Percent::new(1000));
        // gross 9.99, 10% = 0.999 -> 1.00, total 8.99
        let item = price_line(&d, Uuid::new_v4(), 0).unwrap();
        assert_eq!(item.line_total.cents(), 899);
    }

    #[test]
    fn empty_line_is_rejected() {
        let err = price_line(&draft(0, 0, PriceMode::PerUnit, 100), Uuid::new_v4(), 0)
            .unwrap_err();
        assert!(matches!(err, EngineError::QuantityInvalid(_)));
    }

    #[test]
    fn totals_apply_discount_then_tax() {
        let items = vec![
            price_line(&draft(10, 0, PriceMode::PerUnit, 100), Uuid::new_v4(), 0).unwrap(),
            price_line(&draft(0, 5, PriceMode::PerUnit, 200), Uuid::new_v4(), 1).unwrap(),
        ];
        // subtotal 20.00, -10% = 18.00, +5% tax = 18.90
        let (subtotal, total) = compute_totals(
            &items,
            Adjustment::Percent(Percent::new(1000)),
            Adjustment::Percent(Percent::new(500)),
        )
        .unwrap();
        assert_eq!(subtotal.cents(), 2000);
        assert_eq!(total.cents(), 1890);
    }

    #[test]
    fn aggregation_merges_same_target() {
        let target = PaymentTarget::Cash;
        let drafts = vec![
            PaymentDraft::new(target, MoneyCents::new(600)),
            PaymentDraft::new(target, MoneyCents::new(500)),
        ];
        let aggregated = aggregate_by_target(&drafts);
        assert_eq!(aggregated.len(), 1);
        assert_eq!(aggregated[0].1.cents(), 1100);
    }
}
