//! Repository for the append-only `credit_entries` ledger.
//!
//! The balance is always computed from stored rows with one aggregate
//! query; there is no cached counter that could drift. Methods take
//! `impl PgExecutor` so submissions can run them inside the transaction
//! that holds the user row lock.

use sqlx::{PgExecutor, PgPool};
use tini_core::types::DbId;

use crate::models::credit::CreditEntry;
use crate::models::status::CreditEntryKind;

/// Column list for `credit_entries` queries.
const COLUMNS: &str = "id, user_id, kind_id, amount, description, created_at";

/// Maximum ledger entries returned by `list_for_user`.
const HISTORY_LIMIT: i64 = 100;

/// Provides append and aggregate operations for the credit ledger.
pub struct CreditRepo;

impl CreditRepo {
    /// Compute a user's spendable balance: sum(grants) - sum(debits).
    pub async fn balance<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(CASE WHEN kind_id = $2 THEN amount ELSE -amount END), 0)::BIGINT \
             FROM credit_entries WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(CreditEntryKind::Grant.id())
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    /// Lock the user's row for the remainder of the transaction.
    ///
    /// Submissions lock before the balance check so two concurrent debits
    /// for the same user serialize and cannot both pass the check.
    pub async fn lock_user<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Append a grant entry (entitlements, signup bonus, refunds).
    pub async fn grant<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        amount: i64,
        description: &str,
    ) -> Result<CreditEntry, sqlx::Error> {
        Self::append(executor, user_id, CreditEntryKind::Grant, amount, description).await
    }

    /// Append a debit entry.
    pub async fn debit<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        amount: i64,
        description: &str,
    ) -> Result<CreditEntry, sqlx::Error> {
        Self::append(executor, user_id, CreditEntryKind::Debit, amount, description).await
    }

    async fn append<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        kind: CreditEntryKind,
        amount: i64,
        description: &str,
    ) -> Result<CreditEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO credit_entries (user_id, kind_id, amount, description) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CreditEntry>(&query)
            .bind(user_id)
            .bind(kind.id())
            .bind(amount)
            .bind(description)
            .fetch_one(executor)
            .await
    }

    /// Ledger history for a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<CreditEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM credit_entries \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, CreditEntry>(&query)
            .bind(user_id)
            .bind(HISTORY_LIMIT)
            .fetch_all(pool)
            .await
    }
}
