//! Minimal catalog seam.
//!
//! Products, bank accounts and cards are owned by the surrounding system;
//! the engine needs just enough of them to resolve payment targets, check
//! stock and assemble snapshots. Full catalog CRUD stays outside.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    BankAccount, Card, EngineError, Product, ResultEngine, bank_accounts, cards, products,
    util::normalize_required_name,
};

use super::Engine;

impl Engine {
    /// Registers a product with its starting stock.
    pub async fn new_product(
        &self,
        name: &str,
        front_quantity: i64,
        warehouse_quantity: i64,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "product")?;
        if front_quantity < 0 || warehouse_quantity < 0 {
            return Err(EngineError::QuantityInvalid(
                "starting stock must not be negative".to_string(),
            ));
        }

        let mut product = Product::new(name);
        product.front_quantity = front_quantity;
        product.warehouse_quantity = warehouse_quantity;
        let id = product.id;
        products::ActiveModel::from(&product)
            .insert(&self.database)
            .await?;
        Ok(id)
    }

    /// Return a [`Product`] with its current per-location stock.
    pub async fn product(&self, product_id: Uuid) -> ResultEngine<Product> {
        self.require_product(&self.database, product_id).await
    }

    /// Registers a bank account balances can be tracked against.
    pub async fn new_bank_account(&self, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "bank account")?;
        let existing = bank_accounts::Entity::find()
            .filter(bank_accounts::Column::Name.eq(name.clone()))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(EngineError::Validation(format!(
                "bank account '{name}' already exists"
            )));
        }

        let account = BankAccount::new(name);
        let id = account.id;
        bank_accounts::ActiveModel::from(&account)
            .insert(&self.database)
            .await?;
        Ok(id)
    }

    pub async fn bank_account(&self, account_id: Uuid) -> ResultEngine<BankAccount> {
        self.require_bank_account(&self.database, account_id).await
    }

    /// Registers a card terminal balances can be tracked against.
    pub async fn new_card(&self, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "card")?;
        let existing = cards::Entity::find()
            .filter(cards::Column::Name.eq(name.clone()))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(EngineError::Validation(format!(
                "card '{name}' already exists"
            )));
        }

        let card = Card::new(name);
        let id = card.id;
        cards::ActiveModel::from(&card)
            .insert(&self.database)
            .await?;
        Ok(id)
    }

    pub async fn card(&self, card_id: Uuid) -> ResultEngine<Card> {
        self.require_card(&self.database, card_id).await
    }

    pub async fn bank_accounts(&self) -> ResultEngine<Vec<BankAccount>> {
        let models = bank_accounts::Entity::find()
            .order_by_asc(bank_accounts::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(BankAccount::try_from).collect()
    }

    pub async fn cards(&self) -> ResultEngine<Vec<Card>> {
        let models = cards::Entity::find()
            .order_by_asc(cards::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Card::try_from).collect()
    }
}
