//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Bancone:
//!
//! - `products`: catalog rows whose two stock quantities the engine mutates
//! - `bank_accounts` / `cards`: payment-method targets besides cash
//! - `transactions`: purchases and sales with their totals and status
//! - `line_items`: per-product quantities and prices of a transaction
//! - `payments`: append-only partial payments of a transaction
//! - `ledger_entries`: immutable signed movements per (date, target)
//! - `closing_balances`: cached end-of-day balances per (date, target)
//! - `opening_balances`: one-time balance overrides per (date, target)
//! - `daily_confirmations`: system-wide per-date reconciliation acks

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Products {
    Table,
    Id,
    Name,
    FrontQuantity,
    WarehouseQuantity,
}

#[derive(Iden)]
enum BankAccounts {
    Table,
    Id,
    Name,
    Archived,
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
    Name,
    Archived,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Kind,
    CounterpartyName,
    CounterpartyPhone,
    TradeDate,
    SubtotalMinor,
    DiscountKind,
    DiscountValue,
    TaxKind,
    TaxValue,
    TotalMinor,
    Status,
    CreatedBy,
    CreatedAt,
    CancelledAt,
    CancelledBy,
    IdempotencyKey,
}

#[derive(Iden)]
enum LineItems {
    Table,
    Id,
    TransactionId,
    ProductId,
    Position,
    QuantityFront,
    QuantityWarehouse,
    PriceMode,
    UnitPriceMinor,
    DozenPriceMinor,
    DiscountKind,
    DiscountValue,
    LineTotalMinor,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    TransactionId,
    Position,
    TargetKind,
    TargetId,
    AmountMinor,
    PaidAt,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    EntryDate,
    TargetKind,
    TargetId,
    AmountMinor,
    Direction,
    Source,
    TransactionId,
    RecordedBy,
    RecordedAt,
}

#[derive(Iden)]
enum ClosingBalances {
    Table,
    Id,
    BalanceDate,
    TargetKind,
    TargetId,
    BalanceMinor,
    ComputedAt,
}

#[derive(Iden)]
enum OpeningBalances {
    Table,
    Id,
    BalanceDate,
    TargetKind,
    TargetId,
    AmountMinor,
    RecordedBy,
}

#[derive(Iden)]
enum DailyConfirmations {
    Table,
    ConfirmedDate,
    ConfirmedBy,
    ConfirmedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Products
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(
                        ColumnDef::new(Products::FrontQuantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::WarehouseQuantity)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-products-name-unique")
                    .table(Products::Table)
                    .col(Products::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Bank accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BankAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankAccounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankAccounts::Name).string().not_null())
                    .col(ColumnDef::new(BankAccounts::Archived).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_accounts-name-unique")
                    .table(BankAccounts::Table)
                    .col(BankAccounts::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Cards
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cards::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Cards::Name).string().not_null())
                    .col(ColumnDef::new(Cards::Archived).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cards-name-unique")
                    .table(Cards::Table)
                    .col(Cards::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CounterpartyName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::CounterpartyPhone).string())
                    .col(ColumnDef::new(Transactions::TradeDate).date().not_null())
                    .col(
                        ColumnDef::new(Transactions::SubtotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::DiscountKind)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::DiscountValue)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::TaxKind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::TaxValue)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::TotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::CancelledAt).date_time())
                    .col(ColumnDef::new(Transactions::CancelledBy).string())
                    .col(ColumnDef::new(Transactions::IdempotencyKey).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-trade_date")
                    .table(Transactions::Table)
                    .col(Transactions::TradeDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::CreatedAt)
                    .col(Transactions::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-idempotency_key")
                    .table(Transactions::Table)
                    .col(Transactions::CreatedBy)
                    .col(Transactions::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Line items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LineItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LineItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LineItems::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LineItems::ProductId).string().not_null())
                    .col(ColumnDef::new(LineItems::Position).integer().not_null())
                    .col(
                        ColumnDef::new(LineItems::QuantityFront)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LineItems::QuantityWarehouse)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LineItems::PriceMode).string().not_null())
                    .col(
                        ColumnDef::new(LineItems::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LineItems::DozenPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LineItems::DiscountKind).string().not_null())
                    .col(
                        ColumnDef::new(LineItems::DiscountValue)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LineItems::LineTotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-line_items-transaction_id")
                            .from(LineItems::Table, LineItems::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-line_items-product_id")
                            .from(LineItems::Table, LineItems::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-line_items-transaction_id")
                    .table(LineItems::Table)
                    .col(LineItems::TransactionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::TransactionId).string().not_null())
                    .col(ColumnDef::new(Payments::Position).integer().not_null())
                    .col(ColumnDef::new(Payments::TargetKind).string().not_null())
                    .col(ColumnDef::new(Payments::TargetId).string())
                    .col(
                        ColumnDef::new(Payments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::PaidAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-transaction_id")
                            .from(Payments::Table, Payments::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-transaction_id")
                    .table(Payments::Table)
                    .col(Payments::TransactionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Ledger entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::EntryDate).date().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::TargetKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::TargetId).string())
                    .col(
                        ColumnDef::new(LedgerEntries::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::Direction).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Source).string().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::RecordedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::RecordedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-transaction_id")
                            .from(LedgerEntries::Table, LedgerEntries::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-date-target")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::EntryDate)
                    .col(LedgerEntries::TargetKind)
                    .col(LedgerEntries::TargetId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-transaction_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::TransactionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Closing balances
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ClosingBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClosingBalances::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClosingBalances::BalanceDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClosingBalances::TargetKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClosingBalances::TargetId).string())
                    .col(
                        ColumnDef::new(ClosingBalances::BalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClosingBalances::ComputedAt)
                            .date_time()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-closing_balances-date-target-unique")
                    .table(ClosingBalances::Table)
                    .col(ClosingBalances::BalanceDate)
                    .col(ClosingBalances::TargetKind)
                    .col(ClosingBalances::TargetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Opening balances
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(OpeningBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OpeningBalances::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OpeningBalances::BalanceDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OpeningBalances::TargetKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OpeningBalances::TargetId).string())
                    .col(
                        ColumnDef::new(OpeningBalances::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OpeningBalances::RecordedBy)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-opening_balances-date-target-unique")
                    .table(OpeningBalances::Table)
                    .col(OpeningBalances::BalanceDate)
                    .col(OpeningBalances::TargetKind)
                    .col(OpeningBalances::TargetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Daily confirmations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(DailyConfirmations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailyConfirmations::ConfirmedDate)
                            .date()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DailyConfirmations::ConfirmedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyConfirmations::ConfirmedAt)
                            .date_time()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(DailyConfirmations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OpeningBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClosingBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LineItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        Ok(())
    }
}
