pub use bank_accounts::BankAccount;
pub use cards::Card;
pub use clock::{Clock, FixedClock, SystemClock};
pub use closing_balances::ClosingBalanceSnapshot;
pub use commands::{
    AddPaymentCmd, CancelTransactionCmd, CreateTransactionCmd, LineItemDraft, PaymentDraft,
    UpdateTransactionCmd,
};
pub use confirmations::{ConfirmationStatus, DailyConfirmation};
pub use error::EngineError;
pub use ledger::{EntryDirection, EntrySource, LedgerEntry};
pub use line_items::{LineItem, PriceMode};
pub use money::{Adjustment, MoneyCents, Percent};
pub use ops::{Engine, EngineBuilder, TransactionListFilter, TransactionPage};
pub use payments::Payment;
pub use products::{Product, StockDelta, StockLocation};
pub use targets::PaymentTarget;
pub use transactions::{TradeKind, Transaction, TransactionStatus};

mod bank_accounts;
mod cards;
mod clock;
mod closing_balances;
mod commands;
mod confirmations;
mod error;
mod ledger;
mod line_items;
mod money;
mod opening_balances;
mod ops;
mod payments;
mod products;
mod targets;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
