//! Closing-balance snapshots.
//!
//! One cached row per (date, target) holds the end-of-day balance. Rows are
//! derived state: always re-derivable from the ledger plus the prior day's
//! snapshot, never the source of truth.

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{MoneyCents, PaymentTarget};

/// End-of-day balances for one business date, across every target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosingBalanceSnapshot {
    pub date: NaiveDate,
    pub cash: MoneyCents,
    pub banks: HashMap<Uuid, MoneyCents>,
    pub cards: HashMap<Uuid, MoneyCents>,
}

impl ClosingBalanceSnapshot {
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            cash: MoneyCents::ZERO,
            banks: HashMap::new(),
            cards: HashMap::new(),
        }
    }

    /// Balance for a target; targets with no history are zero.
    #[must_use]
    pub fn balance(&self, target: &PaymentTarget) -> MoneyCents {
        match target {
            PaymentTarget::Cash => self.cash,
            PaymentTarget::Bank { account_id } => {
                self.banks.get(account_id).copied().unwrap_or(MoneyCents::ZERO)
            }
            PaymentTarget::Card { card_id } => {
                self.cards.get(card_id).copied().unwrap_or(MoneyCents::ZERO)
            }
        }
    }

    pub(crate) fn add_cents(&mut self, target: &PaymentTarget, delta: i64) {
        match target {
            PaymentTarget::Cash => self.cash += MoneyCents::new(delta),
            PaymentTarget::Bank { account_id } => {
                let entry = self.banks.entry(*account_id).or_insert(MoneyCents::ZERO);
                *entry += MoneyCents::new(delta);
            }
            PaymentTarget::Card { card_id } => {
                let entry = self.cards.entry(*card_id).or_insert(MoneyCents::ZERO);
                *entry += MoneyCents::new(delta);
            }
        }
    }

    /// All (target, balance) pairs held by the snapshot.
    pub(crate) fn entries(&self) -> Vec<(PaymentTarget, MoneyCents)> {
        let mut out = vec![(PaymentTarget::Cash, self.cash)];
        for (account_id, balance) in &self.banks {
            out.push((
                PaymentTarget::Bank {
                    account_id: *account_id,
                },
                *balance,
            ));
        }
        for (card_id, balance) in &self.cards {
            out.push((PaymentTarget::Card { card_id: *card_id }, *balance));
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "closing_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub balance_date: chrono::NaiveDate,
    pub target_kind: String,
    pub target_id: Option<String>,
    pub balance_minor: i64,
    pub computed_at: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
