// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transaction engine: applies and reverses balance effects.
//!
//! Only COMPLETED transactions move money. Status changes follow
//! `PENDING -> COMPLETED -> CANCELLED` and `PENDING -> CANCELLED`; nothing
//! leaves CANCELLED and nothing returns to PENDING.

use crate::db::write_tx;
use crate::error::{LedgerError, Result};
use crate::ledger::{accounts, categories, clean_notes, installments, require_positive, require_text};
use crate::models::{Page, Transaction, TransactionRequest, TransactionStatus, TransactionType};
use crate::utils::decimal_col;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

const SELECT: &str = "SELECT t.id, t.account_id, a.name, t.category_id, c.name, \
     t.destination_account_id, d.name, t.description, t.amount, t.type, t.status, \
     t.transaction_date, t.notes, t.created_at \
     FROM transactions t \
     JOIN accounts a ON a.id=t.account_id \
     LEFT JOIN categories c ON c.id=t.category_id \
     LEFT JOIN accounts d ON d.id=t.destination_account_id";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        account_id: r.get(1)?,
        account_name: r.get(2)?,
        category_id: r.get(3)?,
        category_name: r.get(4)?,
        destination_account_id: r.get(5)?,
        destination_account_name: r.get(6)?,
        description: r.get(7)?,
        amount: decimal_col(r, 8)?,
        r#type: r.get(9)?,
        status: r.get(10)?,
        transaction_date: r.get(11)?,
        notes: r.get(12)?,
        created_at: r.get(13)?,
    })
}

/// Signed balance deltas a completed transaction of this shape produces.
pub fn effects(
    typ: TransactionType,
    account_id: i64,
    destination_account_id: Option<i64>,
    amount: Decimal,
) -> Vec<(i64, Decimal)> {
    match typ {
        TransactionType::Income => vec![(account_id, amount)],
        TransactionType::Expense => vec![(account_id, -amount)],
        TransactionType::Transfer => {
            let mut out = vec![(account_id, -amount)];
            if let Some(dest) = destination_account_id {
                out.push((dest, amount));
            }
            out
        }
    }
}

fn apply(conn: &Connection, t: &Transaction, sign: Decimal) -> Result<()> {
    for (account_id, delta) in effects(t.r#type, t.account_id, t.destination_account_id, t.amount)
    {
        accounts::apply_delta(conn, account_id, delta * sign)?;
    }
    Ok(())
}

pub fn check_transition(from: TransactionStatus, to: TransactionStatus) -> Result<()> {
    use TransactionStatus::*;
    match (from, to) {
        (a, b) if a == b => Ok(()),
        (Pending, Completed) | (Pending, Cancelled) | (Completed, Cancelled) => Ok(()),
        _ => {
            tracing::warn!(%from, %to, "rejected transaction status change");
            Err(LedgerError::InvalidStateTransition(format!(
                "Transaction cannot move from {} to {}",
                from, to
            )))
        }
    }
}

fn validate(conn: &Connection, req: &TransactionRequest) -> Result<(String, Option<String>)> {
    let description = require_text("description", "Description", &req.description, 255)?;
    require_positive("amount", "Amount", req.amount)?;
    if !accounts::exists(conn, req.account_id)? {
        return Err(LedgerError::validation(
            "accountId",
            format!("Account {} does not exist", req.account_id),
        ));
    }
    match (req.r#type, req.destination_account_id) {
        (TransactionType::Transfer, None) => {
            return Err(LedgerError::validation(
                "destinationAccountId",
                "Destination account is required for transfers",
            ));
        }
        (TransactionType::Transfer, Some(dest)) => {
            if dest == req.account_id {
                return Err(LedgerError::validation(
                    "destinationAccountId",
                    "Source and destination accounts must be different",
                ));
            }
            if !accounts::exists(conn, dest)? {
                return Err(LedgerError::validation(
                    "destinationAccountId",
                    format!("Account {} does not exist", dest),
                ));
            }
        }
        (_, Some(_)) => {
            return Err(LedgerError::validation(
                "destinationAccountId",
                "Destination account is only allowed for transfers",
            ));
        }
        (_, None) => {}
    }
    if let Some(cat) = req.category_id {
        if !categories::exists(conn, cat)? {
            return Err(LedgerError::validation(
                "categoryId",
                format!("Category {} does not exist", cat),
            ));
        }
    }
    Ok((description, clean_notes(req.notes.as_deref())))
}

pub fn get(conn: &Connection, id: i64) -> Result<Transaction> {
    conn.query_row(&format!("{} WHERE t.id=?1", SELECT), params![id], from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("Transaction", id))
}

/// Validates and stores a transaction, applying its effect when completed.
/// Callers must hold a write transaction.
pub(crate) fn insert_in(conn: &Connection, req: &TransactionRequest) -> Result<i64> {
    let (description, notes) = validate(conn, req)?;
    conn.execute(
        "INSERT INTO transactions(account_id, category_id, destination_account_id, description, \
         amount, type, status, transaction_date, notes) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
        params![
            req.account_id,
            req.category_id,
            req.destination_account_id,
            description,
            req.amount.to_string(),
            req.r#type,
            req.status,
            req.transaction_date,
            notes
        ],
    )?;
    let id = conn.last_insert_rowid();
    if req.status == TransactionStatus::Completed {
        apply(conn, &get(conn, id)?, Decimal::ONE)?;
    }
    Ok(id)
}

pub fn create(conn: &mut Connection, req: &TransactionRequest) -> Result<Transaction> {
    let tx = write_tx(conn)?;
    let id = insert_in(&tx, req)?;
    let t = get(&tx, id)?;
    tx.commit()?;
    tracing::info!(
        transaction_id = id,
        kind = %t.r#type,
        status = %t.status,
        amount = %t.amount,
        "transaction created"
    );
    Ok(t)
}

/// Replaces every field of a transaction. The old effect is reversed before
/// the new one is applied, so edits never double-count.
pub fn update(conn: &mut Connection, id: i64, req: &TransactionRequest) -> Result<Transaction> {
    let tx = write_tx(conn)?;
    let old = get(&tx, id)?;
    check_transition(old.status, req.status)?;
    let (description, notes) = validate(&tx, req)?;
    if let Some(paid) = installments::paid_by(&tx, id)? {
        let moves_money = req.amount != old.amount
            || req.account_id != old.account_id
            || req.r#type != old.r#type
            || req.destination_account_id != old.destination_account_id;
        if moves_money {
            return Err(LedgerError::Conflict(format!(
                "Transaction {} pays installment {}; its amount, account and type cannot change",
                id, paid.id
            )));
        }
    }
    if old.status == TransactionStatus::Completed {
        apply(&tx, &old, Decimal::NEGATIVE_ONE)?;
    }
    tx.execute(
        "UPDATE transactions SET account_id=?1, category_id=?2, destination_account_id=?3, \
         description=?4, amount=?5, type=?6, status=?7, transaction_date=?8, notes=?9 WHERE id=?10",
        params![
            req.account_id,
            req.category_id,
            req.destination_account_id,
            description,
            req.amount.to_string(),
            req.r#type,
            req.status,
            req.transaction_date,
            notes,
            id
        ],
    )?;
    let new = get(&tx, id)?;
    if new.status == TransactionStatus::Completed {
        apply(&tx, &new, Decimal::ONE)?;
    }
    if new.status == TransactionStatus::Cancelled && old.status != TransactionStatus::Cancelled {
        installments::release_transaction(&tx, id)?;
    }
    tx.commit()?;
    tracing::info!(transaction_id = id, status = %new.status, amount = %new.amount, "transaction updated");
    Ok(new)
}

pub fn set_status(conn: &mut Connection, id: i64, status: TransactionStatus) -> Result<Transaction> {
    let tx = write_tx(conn)?;
    let old = get(&tx, id)?;
    check_transition(old.status, status)?;
    if old.status == status {
        return Ok(old);
    }
    tx.execute(
        "UPDATE transactions SET status=?1 WHERE id=?2",
        params![status, id],
    )?;
    match status {
        TransactionStatus::Completed => apply(&tx, &old, Decimal::ONE)?,
        TransactionStatus::Cancelled => {
            if old.status == TransactionStatus::Completed {
                apply(&tx, &old, Decimal::NEGATIVE_ONE)?;
            }
            installments::release_transaction(&tx, id)?;
        }
        TransactionStatus::Pending => {}
    }
    let t = get(&tx, id)?;
    tx.commit()?;
    tracing::info!(transaction_id = id, from = %old.status, to = %status, "transaction status changed");
    Ok(t)
}

/// Reverses a completed transaction's effect, returns any installment it paid
/// to PENDING, and removes it. Callers must hold a write transaction.
pub(crate) fn delete_in(conn: &Connection, id: i64) -> Result<()> {
    let t = get(conn, id)?;
    if t.status == TransactionStatus::Completed {
        apply(conn, &t, Decimal::NEGATIVE_ONE)?;
    }
    installments::release_transaction(conn, id)?;
    conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    Ok(())
}

pub fn delete(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = write_tx(conn)?;
    delete_in(&tx, id)?;
    tx.commit()?;
    tracing::info!(transaction_id = id, "transaction deleted");
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Matches either side of a transfer.
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: u64,
    pub size: Option<u64>,
}

/// Clamped page size and the row offset of zero-based `page`.
pub(crate) fn page_window(page: u64, size: Option<u64>) -> Result<(u64, i64)> {
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = page
        .checked_mul(size)
        .and_then(|o| i64::try_from(o).ok())
        .ok_or_else(|| LedgerError::validation("page", "Page number is out of range"))?;
    Ok((size, offset))
}

pub fn list(conn: &Connection, filter: &TransactionFilter) -> Result<Page<Transaction>> {
    let (size, offset) = page_window(filter.page, filter.size)?;
    let mut clause = String::from(" WHERE 1=1");
    let mut args: Vec<Value> = Vec::new();
    if let Some(acct) = filter.account_id {
        clause.push_str(" AND (t.account_id=? OR t.destination_account_id=?)");
        args.push(Value::Integer(acct));
        args.push(Value::Integer(acct));
    }
    if let Some(cat) = filter.category_id {
        clause.push_str(" AND t.category_id=?");
        args.push(Value::Integer(cat));
    }
    if let Some(from) = filter.from {
        clause.push_str(" AND t.transaction_date>=?");
        args.push(Value::Text(from.to_string()));
    }
    if let Some(to) = filter.to {
        clause.push_str(" AND t.transaction_date<=?");
        args.push(Value::Text(to.to_string()));
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM transactions t{}", clause),
        params_from_iter(args.iter()),
        |r| r.get(0),
    )?;

    let sql = format!(
        "{}{} ORDER BY t.transaction_date DESC, t.id DESC LIMIT ? OFFSET ?",
        SELECT, clause
    );
    args.push(Value::Integer(size as i64));
    args.push(Value::Integer(offset));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), from_row)?;
    let content = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Page::new(content, total as u64, filter.page, size))
}
