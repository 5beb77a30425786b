//! Credit ledger entity models.

use serde::Serialize;
use sqlx::FromRow;
use tini_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the append-only `credit_entries` table.
///
/// Entries are immutable: never updated or deleted. The balance is always
/// an aggregate over rows, never a cached counter.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CreditEntry {
    pub id: DbId,
    pub user_id: DbId,
    /// 1 = grant, 2 = debit (see `CreditEntryKind`).
    pub kind_id: StatusId,
    pub amount: i64,
    pub description: String,
    pub created_at: Timestamp,
}

/// Response body for `GET /credits`.
#[derive(Debug, Serialize)]
pub struct CreditBalance {
    pub total: i64,
}
