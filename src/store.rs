// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence boundary for transactions.
//!
//! Aggregation code only ever sees `Vec<Transaction>`; everything that knows
//! about rows, columns and owners lives here.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::StoreError;
use crate::models::{ImportSource, NewTransaction, Transaction, TransactionPatch, TransactionType};

pub trait TransactionStore {
    /// All transactions, most recent `date` first.
    fn list(&self) -> Result<Vec<Transaction>, StoreError>;

    fn insert(&self, new: NewTransaction) -> Result<Transaction, StoreError>;

    /// Validates every item before writing any of them.
    fn insert_many(&self, batch: Vec<NewTransaction>) -> Result<Vec<Transaction>, StoreError>;

    fn update(&self, id: &str, patch: TransactionPatch) -> Result<Transaction, StoreError>;

    /// Fails with [`StoreError::NotFound`] when no transaction has `id`.
    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

const SELECT_COLUMNS: &str = "SELECT id, date, type, category, amount, description, merchant_name, imported_from FROM transactions";

/// SQLite-backed store, scoped to a single owner.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
    owner: String,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection, owner: impl Into<String>) -> Self {
        Self {
            conn,
            owner: owner.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    fn find(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        let sql = format!("{} WHERE id=?1 AND user_id=?2", SELECT_COLUMNS);
        let found = self
            .conn
            .query_row(&sql, params![id, self.owner], row_to_transaction)
            .optional()?;
        Ok(found)
    }

    fn write(conn: &Connection, owner: &str, t: &Transaction) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO transactions(id, user_id, date, type, category, amount, description, merchant_name, imported_from)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                t.id,
                owner,
                t.date,
                t.kind,
                t.category,
                t.amount,
                t.description,
                t.merchant,
                t.imported_from
            ],
        )?;
        Ok(())
    }
}

impl TransactionStore for SqliteStore<'_> {
    fn list(&self) -> Result<Vec<Transaction>, StoreError> {
        let sql = format!(
            "{} WHERE user_id=?1 ORDER BY date DESC, created_at DESC, rowid DESC",
            SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![self.owner], row_to_transaction)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        tracing::debug!(owner = %self.owner, count = out.len(), "listed transactions");
        Ok(out)
    }

    fn insert(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let t = new.into_transaction(Self::today())?;
        Self::write(self.conn, &self.owner, &t).inspect_err(|err| {
            tracing::error!(id = %t.id, "failed to insert transaction: {err}");
        })?;
        tracing::debug!(id = %t.id, "inserted transaction");
        Ok(t)
    }

    fn insert_many(&self, batch: Vec<NewTransaction>) -> Result<Vec<Transaction>, StoreError> {
        let today = Self::today();
        let items = batch
            .into_iter()
            .map(|n| n.into_transaction(today))
            .collect::<Result<Vec<_>, _>>()?;

        let tx = self.conn.unchecked_transaction()?;
        for t in &items {
            Self::write(&tx, &self.owner, t).inspect_err(|err| {
                tracing::error!(id = %t.id, "failed to import transaction: {err}");
            })?;
        }
        tx.commit()?;
        tracing::debug!(count = items.len(), "inserted transaction batch");
        Ok(items)
    }

    fn update(&self, id: &str, patch: TransactionPatch) -> Result<Transaction, StoreError> {
        let current = self
            .find(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let t = patch.apply(current)?;
        self.conn.execute(
            "UPDATE transactions SET date=?1, type=?2, category=?3, amount=?4, description=?5, merchant_name=?6, imported_from=?7
             WHERE id=?8 AND user_id=?9",
            params![
                t.date,
                t.kind,
                t.category,
                t.amount,
                t.description,
                t.merchant,
                t.imported_from,
                id,
                self.owner
            ],
        )?;
        tracing::debug!(id, "updated transaction");
        Ok(t)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let n = self.conn.execute(
            "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
            params![id, self.owner],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tracing::debug!(id, "deleted transaction");
        Ok(())
    }
}

/// Outcome of [`clear_all`].
#[derive(Debug, Default)]
pub struct ClearReport {
    pub deleted: usize,
    /// Listed, but already gone by the time its delete ran.
    pub vanished: usize,
    pub failed: Vec<(String, StoreError)>,
}

/// Deletes every listed transaction one by one.
///
/// Not atomic: a failing delete is recorded and the remaining deletes still run.
/// Rows removed concurrently by someone else are not failures.
pub fn clear_all<S: TransactionStore + ?Sized>(store: &S) -> Result<ClearReport, StoreError> {
    let mut report = ClearReport::default();
    for t in store.list()? {
        match store.delete(&t.id) {
            Ok(()) => report.deleted += 1,
            Err(StoreError::NotFound(id)) => {
                tracing::debug!(%id, "transaction already deleted");
                report.vanished += 1;
            }
            Err(err) => {
                tracing::warn!(id = %t.id, "bulk delete left transaction behind: {err}");
                report.failed.push((t.id, err));
            }
        }
    }
    Ok(report)
}

fn row_to_transaction(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        date: r.get(1)?,
        kind: r.get(2)?,
        category: r.get(3)?,
        amount: r.get(4)?,
        description: r.get::<_, Option<String>>(5)?.filter(|s| !s.is_empty()),
        merchant: r.get::<_, Option<String>>(6)?.filter(|s| !s.is_empty()),
        imported_from: r.get(7)?,
    })
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for ImportSource {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ImportSource {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
