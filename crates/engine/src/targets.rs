//! Payment-method targets.
//!
//! A [`PaymentTarget`] names the place money moves against: the cash
//! drawer, a specific bank account, or a specific card. Ledger entries and
//! closing balances are keyed by (date, target), so every consumer matches
//! the variants exhaustively instead of sniffing optional id fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TargetKind {
    Cash,
    Bank,
    Card,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::Card => "card",
        }
    }
}

impl TryFrom<&str> for TargetKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            "card" => Ok(Self::Card),
            other => Err(EngineError::Validation(format!(
                "invalid payment target kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum PaymentTarget {
    Cash,
    Bank { account_id: Uuid },
    Card { card_id: Uuid },
}

impl PaymentTarget {
    pub(crate) fn kind(&self) -> TargetKind {
        match self {
            Self::Cash => TargetKind::Cash,
            Self::Bank { .. } => TargetKind::Bank,
            Self::Card { .. } => TargetKind::Card,
        }
    }

    pub(crate) fn target_id(&self) -> Option<Uuid> {
        match self {
            Self::Cash => None,
            Self::Bank { account_id } => Some(*account_id),
            Self::Card { card_id } => Some(*card_id),
        }
    }

    /// Storage columns: (`target_kind`, `target_id`).
    pub(crate) fn columns(&self) -> (String, Option<String>) {
        (
            self.kind().as_str().to_string(),
            self.target_id().map(|id| id.to_string()),
        )
    }

    /// Rebuilds a target from its storage columns.
    pub(crate) fn from_columns(kind: &str, target_id: Option<&str>) -> ResultEngine<Self> {
        let kind = TargetKind::try_from(kind)?;
        match kind {
            TargetKind::Cash => Ok(Self::Cash),
            TargetKind::Bank => {
                let raw = target_id.ok_or_else(|| {
                    EngineError::Validation("bank target missing account id".to_string())
                })?;
                let account_id = Uuid::parse_str(raw).map_err(|_| {
                    EngineError::Validation("invalid bank account id".to_string())
                })?;
                Ok(Self::Bank { account_id })
            }
            TargetKind::Card => {
                let raw = target_id.ok_or_else(|| {
                    EngineError::Validation("card target missing card id".to_string())
                })?;
                let card_id = Uuid::parse_str(raw)
                    .map_err(|_| EngineError::Validation("invalid card id".to_string()))?;
                Ok(Self::Card { card_id })
            }
        }
    }

    /// Human label used in error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Cash => "cash".to_string(),
            Self::Bank { account_id } => format!("bank account {account_id}"),
            Self::Card { card_id } => format!("card {card_id}"),
        }
    }
}
