//! Transaction payments.
//!
//! Payments are append-only while a transaction is pending: "editing" a
//! payment is modeled as the caller re-sending the stored prefix unchanged
//! and appending new ones. `position` preserves the append order.

use chrono::NaiveDateTime;
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, PaymentTarget, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub position: i32,
    pub target: PaymentTarget,
    pub amount: MoneyCents,
    pub paid_at: NaiveDateTime,
}

impl Payment {
    pub fn new(
        transaction_id: Uuid,
        position: i32,
        target: PaymentTarget,
        amount: MoneyCents,
        paid_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            position,
            target,
            amount,
            paid_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub position: i32,
    pub target_kind: String,
    pub target_id: Option<String>,
    pub amount_minor: i64,
    pub paid_at: chrono::NaiveDateTime,
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

impl From<&Payment> for ActiveModel {
    fn from(payment: &Payment) -> Self {
        let (target_kind, target_id) = payment.target.columns();
        Self {
            id: ActiveValue::Set(payment.id.to_string()),
            transaction_id: ActiveValue::Set(payment.transaction_id.to_string()),
            position: ActiveValue::Set(payment.position),
            target_kind: ActiveValue::Set(target_kind),
            target_id: ActiveValue::Set(target_id),
            amount_minor: ActiveValue::Set(payment.amount.cents()),
            paid_at: ActiveValue::Set(payment.paid_at),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "payment")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            position: model.position,
            target: PaymentTarget::from_columns(&model.target_kind, model.target_id.as_deref())?,
            amount: MoneyCents::new(model.amount_minor),
            paid_at: model.paid_at,
        })
    }
}
