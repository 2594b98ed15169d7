// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Installment scheduler.
//!
//! A group splits one purchase into dated installments. Paying an installment
//! books a completed expense through the transaction engine and links it; if
//! that transaction later disappears or is cancelled the installment goes back
//! to PENDING via [`release_transaction`].

use crate::db::write_tx;
use crate::error::{LedgerError, Result};
use crate::ledger::{accounts, categories, clean_notes, require_positive, require_text, transactions};
use crate::models::{
    Installment, InstallmentGroup, InstallmentRequest, InstallmentStatus, Page,
    TransactionRequest, TransactionStatus, TransactionType,
};
use crate::utils::{add_months, decimal_col, minor_units};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::{Decimal, RoundingStrategy};

pub const MIN_INSTALLMENTS: u32 = 2;
pub const MAX_INSTALLMENTS: u32 = 360;

const SELECT_INSTALLMENT: &str = "SELECT id, group_id, transaction_id, installment_number, \
     amount, due_date, status, created_at FROM installments";

const SELECT_GROUP: &str = "SELECT g.id, g.account_id, a.name, g.category_id, c.name, \
     g.description, g.total_amount, g.installment_count, g.start_date, g.notes, g.created_at \
     FROM installment_groups g \
     JOIN accounts a ON a.id=g.account_id \
     LEFT JOIN categories c ON c.id=g.category_id";

fn installment_from_row(r: &Row<'_>) -> rusqlite::Result<Installment> {
    Ok(Installment {
        id: r.get(0)?,
        group_id: r.get(1)?,
        transaction_id: r.get(2)?,
        installment_number: r.get(3)?,
        amount: decimal_col(r, 4)?,
        due_date: r.get(5)?,
        status: r.get(6)?,
        created_at: r.get(7)?,
    })
}

fn group_from_row(r: &Row<'_>) -> rusqlite::Result<InstallmentGroup> {
    Ok(InstallmentGroup {
        id: r.get(0)?,
        account_id: r.get(1)?,
        account_name: r.get(2)?,
        category_id: r.get(3)?,
        category_name: r.get(4)?,
        description: r.get(5)?,
        total_amount: decimal_col(r, 6)?,
        installment_count: r.get(7)?,
        paid_count: 0,
        start_date: r.get(8)?,
        notes: r.get(9)?,
        installments: Vec::new(),
        created_at: r.get(10)?,
    })
}

/// Splits `total` into `count` dated amounts. Every installment but the last
/// gets `total / count` truncated to the currency's minor unit; the last absorbs
/// the non-negative remainder so the amounts add up to `total` exactly.
pub fn schedule(
    total: Decimal,
    count: u32,
    start: NaiveDate,
    currency: &str,
) -> Result<Vec<(u32, Decimal, NaiveDate)>> {
    if !(MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&count) {
        return Err(LedgerError::validation(
            "installmentCount",
            format!(
                "Installment count must be between {} and {}",
                MIN_INSTALLMENTS, MAX_INSTALLMENTS
            ),
        ));
    }
    require_positive("totalAmount", "Total amount", total)?;
    let base = (total / Decimal::from(count))
        .round_dp_with_strategy(minor_units(currency), RoundingStrategy::ToZero);
    if base.is_zero() {
        return Err(LedgerError::validation(
            "totalAmount",
            format!("Total amount is too small to split into {} installments", count),
        ));
    }
    let mut out = Vec::with_capacity(count as usize);
    let mut allocated = Decimal::ZERO;
    for n in 1..=count {
        let amount = if n == count { total - allocated } else { base };
        allocated += amount;
        let due = add_months(start, n - 1).ok_or_else(|| {
            LedgerError::validation("startDate", "Installment schedule runs past supported dates")
        })?;
        out.push((n, amount, due));
    }
    Ok(out)
}

pub fn create_group(conn: &mut Connection, req: &InstallmentRequest) -> Result<InstallmentGroup> {
    let description = require_text("description", "Description", &req.description, 255)?;
    let tx = write_tx(conn)?;
    let account = accounts::get(&tx, req.account_id).map_err(|e| match e {
        LedgerError::NotFound { .. } => LedgerError::validation(
            "accountId",
            format!("Account {} does not exist", req.account_id),
        ),
        other => other,
    })?;
    if let Some(cat) = req.category_id {
        if !categories::exists(&tx, cat)? {
            return Err(LedgerError::validation(
                "categoryId",
                format!("Category {} does not exist", cat),
            ));
        }
    }
    let plan = schedule(
        req.total_amount,
        req.installment_count,
        req.start_date,
        &account.currency,
    )?;
    tx.execute(
        "INSERT INTO installment_groups(account_id, category_id, description, total_amount, \
         installment_count, start_date, notes) VALUES (?1,?2,?3,?4,?5,?6,?7)",
        params![
            req.account_id,
            req.category_id,
            description,
            req.total_amount.to_string(),
            req.installment_count,
            req.start_date,
            clean_notes(req.notes.as_deref())
        ],
    )?;
    let group_id = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO installments(group_id, installment_number, amount, due_date, status) \
             VALUES (?1,?2,?3,?4,?5)",
        )?;
        for (n, amount, due) in &plan {
            stmt.execute(params![
                group_id,
                n,
                amount.to_string(),
                due,
                InstallmentStatus::Pending
            ])?;
        }
    }
    let group = get_group(&tx, group_id)?;
    tx.commit()?;
    tracing::info!(
        group_id,
        total = %group.total_amount,
        count = group.installment_count,
        "installment plan created"
    );
    Ok(group)
}

pub fn get_installment(conn: &Connection, id: i64) -> Result<Installment> {
    conn.query_row(
        &format!("{} WHERE id=?1", SELECT_INSTALLMENT),
        params![id],
        installment_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("Installment", id))
}

pub fn installments_of(conn: &Connection, group_id: i64) -> Result<Vec<Installment>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE group_id=?1 ORDER BY installment_number",
        SELECT_INSTALLMENT
    ))?;
    let rows = stmt.query_map(params![group_id], installment_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn paid_count(installments: &[Installment]) -> u32 {
    installments
        .iter()
        .filter(|i| i.status == InstallmentStatus::Completed)
        .count() as u32
}

fn hydrate(conn: &Connection, mut group: InstallmentGroup) -> Result<InstallmentGroup> {
    group.installments = installments_of(conn, group.id)?;
    group.paid_count = paid_count(&group.installments);
    Ok(group)
}

pub fn get_group(conn: &Connection, id: i64) -> Result<InstallmentGroup> {
    let group = conn
        .query_row(
            &format!("{} WHERE g.id=?1", SELECT_GROUP),
            params![id],
            group_from_row,
        )
        .optional()?
        .ok_or_else(|| LedgerError::not_found("Installment group", id))?;
    hydrate(conn, group)
}

pub fn list_groups(conn: &Connection, page: u64, size: Option<u64>) -> Result<Page<InstallmentGroup>> {
    let (size, offset) = transactions::page_window(page, size)?;
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM installment_groups", [], |r| r.get(0))?;
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY g.start_date DESC, g.id DESC LIMIT ?1 OFFSET ?2",
        SELECT_GROUP
    ))?;
    let rows = stmt.query_map(params![size as i64, offset], group_from_row)?;
    let groups = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    let content = groups
        .into_iter()
        .map(|g| hydrate(conn, g))
        .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(content, total as u64, page, size))
}

/// Pays a pending installment with a completed expense dated `paid_on`.
pub fn pay(conn: &mut Connection, installment_id: i64, paid_on: NaiveDate) -> Result<Installment> {
    let tx = write_tx(conn)?;
    let installment = get_installment(&tx, installment_id)?;
    if installment.status != InstallmentStatus::Pending {
        tracing::warn!(installment_id, status = %installment.status, "payment rejected");
    }
    match installment.status {
        InstallmentStatus::Pending => {}
        InstallmentStatus::Completed => {
            return Err(LedgerError::InvalidStateTransition(
                "Installment already paid".into(),
            ));
        }
        InstallmentStatus::Cancelled => {
            return Err(LedgerError::InvalidStateTransition(
                "Installment is cancelled".into(),
            ));
        }
    }
    let group = get_group(&tx, installment.group_id)?;
    let req = TransactionRequest {
        account_id: group.account_id,
        category_id: group.category_id,
        destination_account_id: None,
        description: format!(
            "{} ({}/{})",
            group.description, installment.installment_number, group.installment_count
        ),
        amount: installment.amount,
        r#type: TransactionType::Expense,
        status: TransactionStatus::Completed,
        transaction_date: paid_on,
        notes: None,
    };
    let transaction_id = transactions::insert_in(&tx, &req)?;
    tx.execute(
        "UPDATE installments SET status=?1, transaction_id=?2 WHERE id=?3",
        params![InstallmentStatus::Completed, transaction_id, installment_id],
    )?;
    let paid = get_installment(&tx, installment_id)?;
    tx.commit()?;
    tracing::info!(
        installment_id,
        transaction_id,
        amount = %paid.amount,
        "installment paid"
    );
    Ok(paid)
}

/// Cancels every still-pending installment of a group and returns how many
/// changed. Paid installments and their transactions are left alone.
pub fn cancel_group(conn: &mut Connection, group_id: i64) -> Result<usize> {
    let tx = write_tx(conn)?;
    let exists: Option<i64> = tx
        .query_row(
            "SELECT id FROM installment_groups WHERE id=?1",
            params![group_id],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(LedgerError::not_found("Installment group", group_id));
    }
    let cancelled = tx.execute(
        "UPDATE installments SET status=?1 WHERE group_id=?2 AND status=?3",
        params![
            InstallmentStatus::Cancelled,
            group_id,
            InstallmentStatus::Pending
        ],
    )?;
    tx.commit()?;
    tracing::info!(group_id, cancelled, "installment plan cancelled");
    Ok(cancelled)
}

/// Returns any installment paid by `transaction_id` to PENDING and clears its
/// link. Callers must hold a write transaction.
pub(crate) fn release_transaction(conn: &Connection, transaction_id: i64) -> Result<usize> {
    let released = conn.execute(
        "UPDATE installments SET status=?1, transaction_id=NULL WHERE transaction_id=?2",
        params![InstallmentStatus::Pending, transaction_id],
    )?;
    if released > 0 {
        tracing::info!(transaction_id, released, "installment reverted to pending");
    }
    Ok(released)
}

/// The installment paid by `transaction_id`, if any.
pub(crate) fn paid_by(conn: &Connection, transaction_id: i64) -> Result<Option<Installment>> {
    Ok(conn
        .query_row(
            &format!("{} WHERE transaction_id=?1", SELECT_INSTALLMENT),
            params![transaction_id],
            installment_from_row,
        )
        .optional()?)
}

/// Installments whose status, amount and transaction link disagree.
pub fn link_issues(conn: &Connection) -> Result<Vec<(Installment, String)>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.group_id, i.transaction_id, i.installment_number, i.amount, i.due_date, \
         i.status, i.created_at, t.status, t.amount FROM installments i \
         LEFT JOIN transactions t ON t.id=i.transaction_id ORDER BY i.id",
    )?;
    let mut rows = stmt.query([])?;
    let mut issues = Vec::new();
    while let Some(r) = rows.next()? {
        let installment = installment_from_row(r)?;
        let linked: Option<TransactionStatus> = r.get(8)?;
        let paid: Option<String> = r.get(9)?;
        let paid_matches = paid
            .as_deref()
            .and_then(|p| p.parse::<Decimal>().ok())
            .is_none_or(|p| p == installment.amount);
        let problem = match (installment.status, installment.transaction_id, linked) {
            (InstallmentStatus::Completed, None, _) => Some("paid without a transaction"),
            (InstallmentStatus::Completed, Some(_), None) => Some("linked transaction is missing"),
            (InstallmentStatus::Completed, Some(_), Some(s)) if s != TransactionStatus::Completed => {
                Some("linked transaction is not completed")
            }
            (InstallmentStatus::Completed, Some(_), Some(_)) if !paid_matches => {
                Some("linked transaction amount differs from the installment")
            }
            (InstallmentStatus::Pending | InstallmentStatus::Cancelled, Some(_), _) => {
                Some("unpaid installment carries a transaction link")
            }
            _ => None,
        };
        if let Some(p) = problem {
            issues.push((installment, p.to_string()));
        }
    }
    Ok(issues)
}
