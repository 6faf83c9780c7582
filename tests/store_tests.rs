// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::Cell;

use chrono::NaiveDate;
use fintrack::db;
use fintrack::error::StoreError;
use fintrack::models::{ImportSource, NewTransaction, Transaction, TransactionPatch, TransactionType};
use fintrack::store::{SqliteStore, TransactionStore, clear_all};
use rusqlite::Connection;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn expense(date: NaiveDate, category: &str, amount: f64) -> NewTransaction {
    NewTransaction {
        date: Some(date),
        kind: Some(TransactionType::Expense),
        category: Some(category.to_string()),
        amount: Some(amount),
        ..NewTransaction::default()
    }
}

fn count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn insert_then_list_round_trips() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let inserted = store
        .insert(NewTransaction {
            date: Some(d(2025, 4, 2)),
            kind: Some(TransactionType::Expense),
            category: Some("Food & Dining".into()),
            amount: Some(23.45),
            description: Some("Lunch".into()),
            merchant: Some("Noodle Bar".into()),
            imported_from: Some(ImportSource::Receipt),
            ..NewTransaction::default()
        })
        .unwrap();

    let listed = store.list().unwrap();
    let found = listed.iter().find(|t| t.id == inserted.id).unwrap();
    assert_eq!(found, &inserted);
    assert_eq!(
        found,
        &Transaction {
            id: inserted.id.clone(),
            date: d(2025, 4, 2),
            kind: TransactionType::Expense,
            category: "Food & Dining".into(),
            amount: 23.45,
            description: Some("Lunch".into()),
            merchant: Some("Noodle Bar".into()),
            imported_from: Some(ImportSource::Receipt),
        }
    );
}

#[test]
fn insert_generates_id_unless_given() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let a = store.insert(expense(d(2025, 1, 1), "Other", 1.0)).unwrap();
    let b = store.insert(expense(d(2025, 1, 1), "Other", 1.0)).unwrap();
    assert_ne!(a.id, b.id);
    assert!(uuid::Uuid::parse_str(&a.id).is_ok());

    let c = store
        .insert(NewTransaction {
            id: Some("fixed-id".into()),
            ..expense(d(2025, 1, 1), "Other", 1.0)
        })
        .unwrap();
    assert_eq!(c.id, "fixed-id");
}

#[test]
fn insert_requires_type_category_and_amount() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");

    let mut missing_type = expense(d(2025, 1, 1), "Other", 1.0);
    missing_type.kind = None;
    let err = store.insert(missing_type).unwrap_err();
    assert!(matches!(err, StoreError::MissingField("type")));
    assert!(err.is_validation());

    let mut blank_category = expense(d(2025, 1, 1), "   ", 1.0);
    assert!(matches!(
        store.insert(blank_category.clone()).unwrap_err(),
        StoreError::MissingField("category")
    ));
    blank_category.category = None;
    assert!(matches!(
        store.insert(blank_category).unwrap_err(),
        StoreError::MissingField("category")
    ));

    let mut missing_amount = expense(d(2025, 1, 1), "Other", 1.0);
    missing_amount.amount = None;
    assert!(matches!(
        store.insert(missing_amount).unwrap_err(),
        StoreError::MissingField("amount")
    ));

    assert!(matches!(
        store.insert(expense(d(2025, 1, 1), "Other", -3.0)).unwrap_err(),
        StoreError::InvalidAmount(_)
    ));
    assert!(matches!(
        store.insert(expense(d(2025, 1, 1), "Other", f64::NAN)).unwrap_err(),
        StoreError::InvalidAmount(_)
    ));
    assert_eq!(count(&conn), 0);
}

#[test]
fn blank_metadata_is_stored_as_null() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let t = store
        .insert(NewTransaction {
            description: Some("  ".into()),
            merchant: Some("".into()),
            ..expense(d(2025, 1, 1), " Shopping ", 5.0)
        })
        .unwrap();
    assert_eq!(t.category, "Shopping");
    assert_eq!(t.description, None);
    assert_eq!(t.merchant, None);

    let (desc, merchant): (Option<String>, Option<String>) = conn
        .query_row(
            "SELECT description, merchant_name FROM transactions WHERE id=?1",
            [&t.id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(desc, None);
    assert_eq!(merchant, None);
}

#[test]
fn list_is_most_recent_first() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    store.insert(expense(d(2025, 1, 5), "A", 1.0)).unwrap();
    store.insert(expense(d(2025, 3, 1), "B", 1.0)).unwrap();
    store.insert(expense(d(2024, 12, 31), "C", 1.0)).unwrap();
    store.insert(expense(d(2025, 3, 1), "D", 1.0)).unwrap();

    let cats: Vec<String> = store.list().unwrap().into_iter().map(|t| t.category).collect();
    assert_eq!(cats, ["D", "B", "A", "C"]);
}

#[test]
fn insert_many_writes_nothing_on_validation_error() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let mut bad = expense(d(2025, 1, 2), "Other", 2.0);
    bad.kind = None;
    let err = store
        .insert_many(vec![expense(d(2025, 1, 1), "Other", 1.0), bad])
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(count(&conn), 0);

    let ok = store
        .insert_many(vec![
            expense(d(2025, 1, 1), "Other", 1.0),
            expense(d(2025, 1, 2), "Other", 2.0),
        ])
        .unwrap();
    assert_eq!(ok.len(), 2);
    assert_eq!(count(&conn), 2);
}

#[test]
fn update_replaces_given_fields_only() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let t = store
        .insert(NewTransaction {
            description: Some("Groceries".into()),
            merchant: Some("Market".into()),
            ..expense(d(2025, 2, 1), "Food", 30.0)
        })
        .unwrap();

    let updated = store
        .update(
            &t.id,
            TransactionPatch {
                category: Some("Food & Dining".into()),
                amount: Some(32.5),
                description: Some(String::new()),
                ..TransactionPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.category, "Food & Dining");
    assert_eq!(updated.amount, 32.5);
    assert_eq!(updated.description, None);
    assert_eq!(updated.merchant.as_deref(), Some("Market"));
    assert_eq!(updated.date, t.date);

    let listed = store.list().unwrap();
    assert_eq!(listed, vec![updated]);
}

#[test]
fn update_rejects_unknown_id_and_invalid_values() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let t = store.insert(expense(d(2025, 2, 1), "Food", 30.0)).unwrap();

    assert!(matches!(
        store.update("nope", TransactionPatch::default()).unwrap_err(),
        StoreError::NotFound(_)
    ));
    let err = store
        .update(
            &t.id,
            TransactionPatch {
                amount: Some(-1.0),
                ..TransactionPatch::default()
            },
        )
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(store.list().unwrap()[0].amount, 30.0);
}

#[test]
fn delete_removes_by_id() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let a = store.insert(expense(d(2025, 2, 1), "A", 1.0)).unwrap();
    let b = store.insert(expense(d(2025, 2, 2), "B", 1.0)).unwrap();

    store.delete(&a.id).unwrap();
    let ids: Vec<String> = store.list().unwrap().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![b.id]);
    assert!(matches!(
        store.delete(&a.id).unwrap_err(),
        StoreError::NotFound(_)
    ));
}

#[test]
fn owners_do_not_see_each_other() {
    let conn = setup();
    let alice = SqliteStore::new(&conn, "alice");
    let bob = SqliteStore::new(&conn, "bob");
    let t = alice.insert(expense(d(2025, 2, 1), "A", 1.0)).unwrap();

    assert!(bob.list().unwrap().is_empty());
    assert!(matches!(bob.delete(&t.id).unwrap_err(), StoreError::NotFound(_)));
    assert_eq!(alice.list().unwrap().len(), 1);
}

/// Delegates to a real store but fails the `fail_on`-th delete.
struct FlakyStore<'c> {
    inner: SqliteStore<'c>,
    fail_on: usize,
    deletes: Cell<usize>,
}

impl TransactionStore for FlakyStore<'_> {
    fn list(&self) -> Result<Vec<Transaction>, StoreError> {
        self.inner.list()
    }

    fn insert(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        self.inner.insert(new)
    }

    fn insert_many(&self, batch: Vec<NewTransaction>) -> Result<Vec<Transaction>, StoreError> {
        self.inner.insert_many(batch)
    }

    fn update(&self, id: &str, patch: TransactionPatch) -> Result<Transaction, StoreError> {
        self.inner.update(id, patch)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let n = self.deletes.get() + 1;
        self.deletes.set(n);
        if n == self.fail_on {
            return Err(StoreError::Database(rusqlite::Error::InvalidQuery));
        }
        self.inner.delete(id)
    }
}

#[test]
fn clear_all_removes_everything() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    for i in 1..=4 {
        store.insert(expense(d(2025, 1, i), "Other", 1.0)).unwrap();
    }
    let report = clear_all(&store).unwrap();
    assert_eq!(report.deleted, 4);
    assert!(report.failed.is_empty());
    assert_eq!(count(&conn), 0);
}

#[test]
fn clear_all_is_best_effort() {
    let conn = setup();
    let store = FlakyStore {
        inner: SqliteStore::new(&conn, "alice"),
        fail_on: 3,
        deletes: Cell::new(0),
    };
    for i in 1..=5 {
        store.insert(expense(d(2025, 1, i), "Other", 1.0)).unwrap();
    }
    let third = store.list().unwrap()[2].id.clone();

    let report = clear_all(&store).unwrap();
    assert_eq!(report.deleted, 4);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, third);

    let left = store.list().unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, third);
}

/// Lists one row that another client has already deleted.
struct StaleListStore<'c> {
    inner: SqliteStore<'c>,
}

impl TransactionStore for StaleListStore<'_> {
    fn list(&self) -> Result<Vec<Transaction>, StoreError> {
        let mut rows = self.inner.list()?;
        if let Some(first) = rows.first() {
            let mut ghost = first.clone();
            ghost.id = "deleted-elsewhere".into();
            rows.push(ghost);
        }
        Ok(rows)
    }

    fn insert(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        self.inner.insert(new)
    }

    fn insert_many(&self, batch: Vec<NewTransaction>) -> Result<Vec<Transaction>, StoreError> {
        self.inner.insert_many(batch)
    }

    fn update(&self, id: &str, patch: TransactionPatch) -> Result<Transaction, StoreError> {
        self.inner.update(id, patch)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id)
    }
}

#[test]
fn clear_all_tolerates_rows_deleted_concurrently() {
    let conn = setup();
    let store = StaleListStore {
        inner: SqliteStore::new(&conn, "alice"),
    };
    for i in 1..=3 {
        store.insert(expense(d(2025, 1, i), "Other", 1.0)).unwrap();
    }

    let report = clear_all(&store).unwrap();
    assert_eq!(report.deleted, 3);
    assert_eq!(report.vanished, 1);
    assert!(report.failed.is_empty());
    assert_eq!(count(&conn), 0);
}
