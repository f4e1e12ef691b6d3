//! Transaction reads: single lookup and newest-first listing.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    EngineError, LineItem, Payment, ResultEngine, TradeKind, Transaction, TransactionStatus,
    line_items, payments, transactions,
};

use super::super::Engine;

/// Filters for [`Engine::list_transactions`]. Cancelled transactions are
/// hidden unless asked for.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub kinds: Option<Vec<TradeKind>>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_cancelled: bool,
}

/// One page of transaction headers (items and payments not loaded).
#[derive(Clone, Debug)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    /// Opaque cursor for the next (older) page.
    pub next_cursor: Option<String>,
}

fn encode_cursor(created_at: chrono::NaiveDateTime, id: &str) -> String {
    URL_SAFE_NO_PAD.encode(format!("{}|{id}", created_at.and_utc().timestamp_micros()))
}

fn decode_cursor(raw: &str) -> ResultEngine<(chrono::NaiveDateTime, String)> {
    let invalid = || EngineError::Validation("invalid cursor".to_string());
    let bytes = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    let (micros, id) = text.split_once('|').ok_or_else(invalid)?;
    let micros: i64 = micros.parse().map_err(|_| invalid())?;
    let created_at = chrono::DateTime::from_timestamp_micros(micros)
        .ok_or_else(invalid)?
        .naive_utc();
    Ok((created_at, id.to_string()))
}

impl Engine {
    /// Loads a transaction with its ordered items and payments.
    pub async fn transaction(&self, transaction_id: Uuid) -> ResultEngine<Transaction> {
        self.transaction_on(&self.database, transaction_id).await
    }

    pub(crate) async fn transaction_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("transaction {transaction_id}")))?;
        let mut tx = Transaction::try_from(model)?;

        let item_models = line_items::Entity::find()
            .filter(line_items::Column::TransactionId.eq(transaction_id.to_string()))
            .order_by_asc(line_items::Column::Position)
            .all(conn)
            .await?;
        tx.items = item_models
            .into_iter()
            .map(LineItem::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let payment_models = payments::Entity::find()
            .filter(payments::Column::TransactionId.eq(transaction_id.to_string()))
            .order_by_asc(payments::Column::Position)
            .all(conn)
            .await?;
        tx.payments = payment_models
            .into_iter()
            .map(Payment::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(tx)
    }

    /// Newest-first page of transaction headers with keyset pagination.
    pub async fn list_transactions(
        &self,
        filter: &TransactionListFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<TransactionPage> {
        let mut query = transactions::Entity::find();

        if !filter.include_cancelled {
            query = query.filter(
                transactions::Column::Status.ne(TransactionStatus::Cancelled.as_str()),
            );
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            query = query.filter(transactions::Column::Kind.is_in(kinds));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::TradeDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::TradeDate.lte(to));
        }
        if let Some(raw) = cursor {
            let (created_at, id) = decode_cursor(raw)?;
            query = query.filter(
                Condition::any()
                    .add(transactions::Column::CreatedAt.lt(created_at))
                    .add(
                        Condition::all()
                            .add(transactions::Column::CreatedAt.eq(created_at))
                            .add(transactions::Column::Id.lt(id)),
                    ),
            );
        }

        let mut models = query
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit + 1)
            .all(&self.database)
            .await?;

        let next_cursor = if models.len() as u64 > limit {
            models.truncate(limit as usize);
            models
                .last()
                .map(|model| encode_cursor(model.created_at, &model.id))
        } else {
            None
        };

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(Transaction::try_from(model)?);
        }

        Ok(TransactionPage {
            transactions: out,
            next_cursor,
        })
    }
}
