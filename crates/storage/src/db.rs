use std::path::Path;

use chrono::NaiveDate;
use depenses_core::{Amount, Category, Source, TransactionCandidate};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use thiserror::Error;
use tracing::debug;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Transaction has no category: {0:?}")]
    Uncategorized(String),
    #[error("Amount does not fit in cents: {0}")]
    AmountOutOfRange(Amount),
    #[error("Stored row {id} is invalid: {reason}")]
    InvalidRow { id: i64, reason: String },
}

/// A persisted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredTransaction {
    pub id: i64,
    pub description: String,
    pub amount: Amount,
    pub category: Category,
    pub date: NaiveDate,
    pub source: Source,
}

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;
    debug!(path = %path.display(), "database ready");

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 1),
            category TEXT NOT NULL,
            date TEXT NOT NULL,
            source TEXT NOT NULL DEFAULT 'statement',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Persist one transaction and return its assigned id.
pub async fn insert_transaction(
    pool: &DbPool,
    description: &str,
    amount: Amount,
    category: Category,
    date: NaiveDate,
    source: Source,
) -> Result<i64, StorageError> {
    let cents = amount.to_cents().ok_or(StorageError::AmountOutOfRange(amount))?;
    let id = sqlx::query(
        "INSERT INTO transactions (description, amount_cents, category, date, source) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(description)
    .bind(cents)
    .bind(category.label())
    .bind(date)
    .bind(source.to_string())
    .execute(pool)
    .await?
    .last_insert_rowid();

    debug!(id, %category, "transaction stored");
    Ok(id)
}

/// Persist a categorized candidate. Run the categorization engine first.
pub async fn insert_candidate(pool: &DbPool, candidate: &TransactionCandidate) -> Result<i64, StorageError> {
    let category = candidate
        .category
        .ok_or_else(|| StorageError::Uncategorized(candidate.description.clone()))?;
    insert_transaction(
        pool,
        &candidate.description,
        candidate.amount,
        category,
        candidate.date,
        candidate.source,
    )
    .await
}

/// Every stored transaction, most recent date first.
pub async fn get_all_transactions(pool: &DbPool) -> Result<Vec<StoredTransaction>, StorageError> {
    let rows = sqlx::query_as::<_, (i64, String, i64, String, NaiveDate, String)>(
        "SELECT id, description, amount_cents, category, date, source FROM transactions ORDER BY date DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| -> Result<StoredTransaction, StorageError> {
            let invalid = |reason: String| StorageError::InvalidRow { id: r.0, reason };
            Ok(StoredTransaction {
                id: r.0,
                amount: Amount::from_cents(r.2).map_err(|e| invalid(e.to_string()))?,
                category: r.3.parse::<Category>().map_err(|e| invalid(e.to_string()))?,
                date: r.4,
                source: r.5.parse::<Source>().map_err(&invalid)?,
                description: r.1,
            })
        })
        .collect()
}
