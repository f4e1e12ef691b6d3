//! Stock adjuster.
//!
//! Applies one signed per-location quantity delta against a product row.
//! Pure delta application: no cross-product knowledge, no awareness of why
//! the stock moves. Callers decide the sign (creation, edit reversal,
//! cancellation).

use sea_orm::{ActiveValue, DatabaseTransaction, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, StockLocation, products};

use super::Engine;

impl Engine {
    /// Applies `delta` units to one product location, refusing to drive the
    /// quantity negative.
    pub(crate) async fn apply_stock_delta(
        &self,
        db_tx: &DatabaseTransaction,
        product_id: Uuid,
        location: StockLocation,
        delta: i64,
    ) -> ResultEngine<()> {
        if delta == 0 {
            return Ok(());
        }

        let model = products::Entity::find_by_id(product_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("product {product_id}")))?;

        let current = match location {
            StockLocation::Front => model.front_quantity,
            StockLocation::Warehouse => model.warehouse_quantity,
        };
        let next = current + delta;
        if next < 0 {
            return Err(EngineError::QuantityInvalid(format!(
                "stock of '{}' at {} would go negative ({current} on hand, change {delta})",
                model.name,
                location.as_str(),
            )));
        }

        let mut active = products::ActiveModel {
            id: ActiveValue::Set(model.id),
            ..Default::default()
        };
        match location {
            StockLocation::Front => active.front_quantity = ActiveValue::Set(next),
            StockLocation::Warehouse => active.warehouse_quantity = ActiveValue::Set(next),
        }
        active.update(db_tx).await?;
        Ok(())
    }
}
