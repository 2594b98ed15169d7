// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account store. Balances change only through [`apply_delta`], which the
//! transaction engine calls inside its own write transaction.

use crate::db::write_tx;
use crate::error::{LedgerError, Result};
use crate::ledger::{checked_total, require_non_negative, require_text, transactions};
use crate::models::{Account, AccountRequest, TransactionStatus};
use crate::utils::decimal_col;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

const SELECT: &str =
    "SELECT id, name, type, initial_balance, balance, currency, created_at FROM accounts";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        name: r.get(1)?,
        r#type: r.get(2)?,
        initial_balance: decimal_col(r, 3)?,
        balance: decimal_col(r, 4)?,
        currency: r.get(5)?,
        created_at: r.get(6)?,
    })
}

pub fn get(conn: &Connection, id: i64) -> Result<Account> {
    conn.query_row(&format!("{} WHERE id=?1", SELECT), params![id], from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("Account", id))
}

pub fn exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM accounts WHERE id=?1", params![id], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

pub fn list(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY name, id", SELECT))?;
    let rows = stmt.query_map([], from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn normalize_currency(ccy: &str) -> Result<String> {
    let ccy = ccy.trim().to_uppercase();
    if ccy.len() != 3 || !ccy.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(LedgerError::validation(
            "currency",
            "Currency must be a 3-letter code",
        ));
    }
    Ok(ccy)
}

pub fn create(conn: &mut Connection, req: &AccountRequest) -> Result<Account> {
    let name = require_text("name", "Name", &req.name, 100)?;
    let currency = normalize_currency(&req.currency)?;
    require_non_negative("balance", "Balance", req.balance)?;
    let tx = write_tx(conn)?;
    tx.execute(
        "INSERT INTO accounts(name, type, initial_balance, balance, currency) VALUES (?1,?2,?3,?3,?4)",
        params![name, req.r#type, req.balance.to_string(), currency],
    )?;
    let account = get(&tx, tx.last_insert_rowid())?;
    tx.commit()?;
    tracing::info!(account_id = account.id, balance = %account.balance, "account created");
    Ok(account)
}

/// Renames or retypes an account. The balance is never edited directly.
pub fn update(conn: &mut Connection, id: i64, req: &AccountRequest) -> Result<Account> {
    let name = require_text("name", "Name", &req.name, 100)?;
    let currency = normalize_currency(&req.currency)?;
    let tx = write_tx(conn)?;
    get(&tx, id)?;
    tx.execute(
        "UPDATE accounts SET name=?1, type=?2, currency=?3 WHERE id=?4",
        params![name, req.r#type, currency, id],
    )?;
    let account = get(&tx, id)?;
    tx.commit()?;
    tracing::info!(account_id = id, "account updated");
    Ok(account)
}

/// Deletes an account. Without `force` this is rejected while any transaction
/// or installment plan references it; with `force` those records are removed
/// first, each transaction through the transaction engine so counter-accounts
/// and paid installments stay consistent.
pub fn delete(conn: &mut Connection, id: i64, force: bool) -> Result<()> {
    let tx = write_tx(conn)?;
    get(&tx, id)?;
    let tx_ids: Vec<i64> = {
        let mut stmt = tx.prepare(
            "SELECT id FROM transactions WHERE account_id=?1 OR destination_account_id=?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![id], |r| r.get(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };
    let groups: i64 = tx.query_row(
        "SELECT COUNT(*) FROM installment_groups WHERE account_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if !force && (!tx_ids.is_empty() || groups > 0) {
        return Err(LedgerError::Conflict(format!(
            "Account {} is referenced by {} transaction(s) and {} installment plan(s)",
            id,
            tx_ids.len(),
            groups
        )));
    }
    for tx_id in &tx_ids {
        transactions::delete_in(&tx, *tx_id)?;
    }
    tx.execute(
        "DELETE FROM installment_groups WHERE account_id=?1",
        params![id],
    )?;
    tx.execute("DELETE FROM accounts WHERE id=?1", params![id])?;
    tx.commit()?;
    tracing::info!(
        account_id = id,
        removed_transactions = tx_ids.len(),
        removed_plans = groups,
        "account deleted"
    );
    Ok(())
}

/// Adds `delta` to the stored balance. Callers must hold a write transaction.
pub(crate) fn apply_delta(conn: &Connection, account_id: i64, delta: Decimal) -> Result<Decimal> {
    let current: Decimal = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| decimal_col(r, 0),
        )
        .optional()?
        .ok_or_else(|| LedgerError::not_found("Account", account_id))?;
    let next = checked_total("amount", current, delta)?;
    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![next.to_string(), account_id],
    )?;
    tracing::debug!(account_id, %delta, balance = %next, "balance adjusted");
    Ok(next)
}

/// Initial balance plus the signed effect of every completed transaction
/// touching the account, recomputed from the transaction table.
pub fn expected_balance(conn: &Connection, id: i64) -> Result<Decimal> {
    let account = get(conn, id)?;
    let mut stmt = conn.prepare(
        "SELECT account_id, destination_account_id, amount, type FROM transactions
         WHERE status=?1 AND (account_id=?2 OR destination_account_id=?2)",
    )?;
    let mut rows = stmt.query(params![TransactionStatus::Completed, id])?;
    let mut total = account.initial_balance;
    while let Some(r) = rows.next()? {
        let source: i64 = r.get(0)?;
        let dest: Option<i64> = r.get(1)?;
        let amount = decimal_col(r, 2)?;
        let typ = r.get(3)?;
        for (acct, delta) in transactions::effects(typ, source, dest, amount) {
            if acct == id {
                total = checked_total("amount", total, delta)?;
            }
        }
    }
    Ok(total)
}

/// Accounts whose stored balance disagrees with [`expected_balance`].
pub fn audit_balances(conn: &Connection) -> Result<Vec<(Account, Decimal)>> {
    let mut drift = Vec::new();
    for account in list(conn)? {
        let expected = expected_balance(conn, account.id)?;
        if expected != account.balance {
            tracing::warn!(account_id = account.id, stored = %account.balance, %expected, "balance drift");
            drift.push((account, expected));
        }
    }
    Ok(drift)
}
