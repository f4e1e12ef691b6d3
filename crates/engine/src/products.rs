//! Product stock state.
//!
//! Products are maintained by the catalog side of the system; the engine
//! only touches their two per-location quantities, and never drives either
//! below zero.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLocation {
    Front,
    Warehouse,
}

impl StockLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Warehouse => "warehouse",
        }
    }
}

impl TryFrom<&str> for StockLocation {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "front" => Ok(Self::Front),
            "warehouse" => Ok(Self::Warehouse),
            other => Err(EngineError::Validation(format!(
                "invalid stock location: {other}"
            ))),
        }
    }
}

/// One stock mutation applied by a transaction, reported back to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDelta {
    pub product_id: Uuid,
    pub location: StockLocation,
    pub delta: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub front_quantity: i64,
    pub warehouse_quantity: i64,
}

impl Product {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            front_quantity: 0,
            warehouse_quantity: 0,
        }
    }

    #[must_use]
    pub fn quantity(&self, location: StockLocation) -> i64 {
        match location {
            StockLocation::Front => self.front_quantity,
            StockLocation::Warehouse => self.warehouse_quantity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub front_quantity: i64,
    pub warehouse_quantity: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::line_items::Entity")]
    LineItems,
}

impl Related<super::line_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Product> for ActiveModel {
    fn from(product: &Product) -> Self {
        Self {
            id: ActiveValue::Set(product.id.to_string()),
            name: ActiveValue::Set(product.name.clone()),
            front_quantity: ActiveValue::Set(product.front_quantity),
            warehouse_quantity: ActiveValue::Set(product.warehouse_quantity),
        }
    }
}

impl TryFrom<Model> for Product {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "product")?,
            name: model.name,
            front_quantity: model.front_quantity,
            warehouse_quantity: model.warehouse_quantity,
        })
    }
}
