// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Finledger", "finledger"));

pub const DB_ENV: &str = "FINLEDGER_DB";

const DEFAULT_CATEGORIES: &[(&str, &str, &str, &str)] = &[
    ("Salary", "INCOME", "#2E7D32", "briefcase"),
    ("Freelance", "INCOME", "#388E3C", "laptop"),
    ("Investments", "INCOME", "#00796B", "trending-up"),
    ("Other Income", "INCOME", "#689F38", "plus-circle"),
    ("Food", "EXPENSE", "#E53935", "utensils"),
    ("Housing", "EXPENSE", "#8E24AA", "home"),
    ("Transport", "EXPENSE", "#1E88E5", "car"),
    ("Health", "EXPENSE", "#D81B60", "heart"),
    ("Education", "EXPENSE", "#3949AB", "book"),
    ("Leisure", "EXPENSE", "#FB8C00", "smile"),
    ("Shopping", "EXPENSE", "#F4511E", "shopping-bag"),
    ("Other Expenses", "EXPENSE", "#757575", "more-horizontal"),
];

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        let p = p.trim();
        if !p.is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("finledger.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    open_at(&path)
}

pub fn open_at(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    tracing::debug!(path = %path.display(), "ledger database ready");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// Begins a write transaction holding SQLite's reserved lock from the start,
/// so balance read-modify-write cycles cannot interleave between connections.
pub fn write_tx(conn: &mut Connection) -> rusqlite::Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('CHECKING','SAVINGS','WALLET','CREDIT_CARD','INVESTMENT')),
        initial_balance TEXT NOT NULL DEFAULT '0',
        balance TEXT NOT NULL DEFAULT '0',
        currency TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('INCOME','EXPENSE')),
        color TEXT,
        icon TEXT,
        is_default INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        category_id INTEGER,
        destination_account_id INTEGER,
        description TEXT NOT NULL,
        amount TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('INCOME','EXPENSE','TRANSFER')),
        status TEXT NOT NULL CHECK(status IN ('PENDING','COMPLETED','CANCELLED')),
        transaction_date TEXT NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(destination_account_id) REFERENCES accounts(id),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);
    CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);

    CREATE TABLE IF NOT EXISTS installment_groups(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        category_id INTEGER,
        description TEXT NOT NULL,
        total_amount TEXT NOT NULL,
        installment_count INTEGER NOT NULL CHECK(installment_count >= 2),
        start_date TEXT NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS installments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id INTEGER NOT NULL,
        transaction_id INTEGER,
        installment_number INTEGER NOT NULL,
        amount TEXT NOT NULL,
        due_date TEXT NOT NULL,
        status TEXT NOT NULL CHECK(status IN ('PENDING','COMPLETED','CANCELLED')),
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(group_id, installment_number),
        FOREIGN KEY(group_id) REFERENCES installment_groups(id) ON DELETE CASCADE,
        FOREIGN KEY(transaction_id) REFERENCES transactions(id)
    );
    CREATE INDEX IF NOT EXISTS idx_installments_tx ON installments(transaction_id);

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        month INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
        year INTEGER NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(category_id, month, year),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS goals(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        target_amount TEXT NOT NULL,
        current_amount TEXT NOT NULL DEFAULT '0',
        deadline TEXT,
        status TEXT NOT NULL CHECK(status IN ('IN_PROGRESS','COMPLETED','CANCELLED')),
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    )?;
    seed_default_categories(conn)?;
    Ok(())
}

fn seed_default_categories(conn: &mut Connection) -> Result<()> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
    if existing > 0 {
        return Ok(());
    }
    let tx = conn.transaction()?;
    for (name, typ, color, icon) in DEFAULT_CATEGORIES {
        tx.execute(
            "INSERT INTO categories(name, type, color, icon, is_default) VALUES (?1,?2,?3,?4,1)",
            params![name, typ, color, icon],
        )?;
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent_and_seeds_once() {
        let mut conn = open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM categories WHERE is_default=1", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(n as usize, DEFAULT_CATEGORIES.len());
    }
}
