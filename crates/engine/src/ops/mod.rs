use chrono::NaiveTime;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::{
    BankAccount, Card, Clock, EngineError, Product, ResultEngine, SystemClock, bank_accounts,
    cards, products,
};

mod balances;
mod catalog;
mod confirmation;
mod ledger;
mod stock;
mod transactions;

pub use transactions::{TransactionListFilter, TransactionPage};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    clock: Box<dyn Clock>,
    confirmation_cutoff: NaiveTime,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The business date on the engine clock.
    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    pub(crate) async fn require_product<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
    ) -> ResultEngine<Product> {
        let model = products::Entity::find_by_id(product_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("product {product_id}")))?;
        Product::try_from(model)
    }

    pub(crate) async fn require_bank_account<C: ConnectionTrait>(
        &self,
        conn: &C,
        account_id: Uuid,
    ) -> ResultEngine<BankAccount> {
        let model = bank_accounts::Entity::find_by_id(account_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("bank account {account_id}")))?;
        BankAccount::try_from(model)
    }

    pub(crate) async fn require_card<C: ConnectionTrait>(
        &self,
        conn: &C,
        card_id: Uuid,
    ) -> ResultEngine<Card> {
        let model = cards::Entity::find_by_id(card_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("card {card_id}")))?;
        Card::try_from(model)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    clock: Option<Box<dyn Clock>>,
    confirmation_cutoff: Option<NaiveTime>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the business clock (tests, or a non-default timezone).
    pub fn clock(mut self, clock: impl Clock + 'static) -> EngineBuilder {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Time of day after which an unconfirmed day starts gating new
    /// transactions. Defaults to 06:00 local.
    pub fn confirmation_cutoff(mut self, cutoff: NaiveTime) -> EngineBuilder {
        self.confirmation_cutoff = Some(cutoff);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            clock: self
                .clock
                .unwrap_or_else(|| Box::new(SystemClock::default())),
            confirmation_cutoff: self
                .confirmation_cutoff
                .unwrap_or_else(|| NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN)),
        })
    }
}
