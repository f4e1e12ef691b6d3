//! Transaction line items.
//!
//! Quantities are entered per location (front counter or warehouse) in the
//! unit of the price mode: plain units, or dozens when the line is priced
//! per dozen. Both price representations are stored; the entry mode decides
//! which one is authoritative and the other is derived (`dozen = unit × 12`).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Adjustment, EngineError, MoneyCents, ResultEngine, StockLocation, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMode {
    PerUnit,
    PerDozen,
}

impl PriceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerUnit => "per_unit",
            Self::PerDozen => "per_dozen",
        }
    }

    /// How many stock units one entered quantity represents.
    #[must_use]
    pub fn units_per_entry(self) -> i64 {
        match self {
            Self::PerUnit => 1,
            Self::PerDozen => 12,
        }
    }
}

impl TryFrom<&str> for PriceMode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "per_unit" => Ok(Self::PerUnit),
            "per_dozen" => Ok(Self::PerDozen),
            other => Err(EngineError::Validation(format!(
                "invalid price mode: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineItem {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub product_id: Uuid,
    /// Order within the transaction.
    pub position: i32,
    /// Entered quantity at the front counter (units or dozens per mode).
    pub quantity_front: i64,
    /// Entered quantity at the warehouse (units or dozens per mode).
    pub quantity_warehouse: i64,
    pub price_mode: PriceMode,
    pub unit_price: MoneyCents,
    pub dozen_price: MoneyCents,
    pub discount: Adjustment,
    pub line_total: MoneyCents,
}

impl LineItem {
    /// Stock units this line moves at `location`.
    #[must_use]
    pub fn unit_count(&self, location: StockLocation) -> i64 {
        let entered = match location {
            StockLocation::Front => self.quantity_front,
            StockLocation::Warehouse => self.quantity_warehouse,
        };
        entered * self.price_mode.units_per_entry()
    }

    /// The price the operator actually entered for this line.
    #[must_use]
    pub fn entered_price(&self) -> MoneyCents {
        match self.price_mode {
            PriceMode::PerUnit => self.unit_price,
            PriceMode::PerDozen => self.dozen_price,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "line_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    pub position: i32,
    pub quantity_front: i64,
    pub quantity_warehouse: i64,
    pub price_mode: String,
    pub unit_price_minor: i64,
    pub dozen_price_minor: i64,
    pub discount_kind: String,
    pub discount_value: i64,
    pub line_total_minor: i64,
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
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Products,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LineItem> for ActiveModel {
    fn from(item: &LineItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            transaction_id: ActiveValue::Set(item.transaction_id.to_string()),
            product_id: ActiveValue::Set(item.product_id.to_string()),
            position: ActiveValue::Set(item.position),
            quantity_front: ActiveValue::Set(item.quantity_front),
            quantity_warehouse: ActiveValue::Set(item.quantity_warehouse),
            price_mode: ActiveValue::Set(item.price_mode.as_str().to_string()),
            unit_price_minor: ActiveValue::Set(item.unit_price.cents()),
            dozen_price_minor: ActiveValue::Set(item.dozen_price.cents()),
            discount_kind: ActiveValue::Set(item.discount.kind().to_string()),
            discount_value: ActiveValue::Set(item.discount.raw_value()),
            line_total_minor: ActiveValue::Set(item.line_total.cents()),
        }
    }
}

impl TryFrom<Model> for LineItem {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "line item")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            product_id: parse_uuid(&model.product_id, "product")?,
            position: model.position,
            quantity_front: model.quantity_front,
            quantity_warehouse: model.quantity_warehouse,
            price_mode: PriceMode::try_from(model.price_mode.as_str())?,
            unit_price: MoneyCents::new(model.unit_price_minor),
            dozen_price: MoneyCents::new(model.dozen_price_minor),
            discount: Adjustment::from_columns(&model.discount_kind, model.discount_value)?,
            line_total: MoneyCents::new(model.line_total_minor),
        })
    }
}
