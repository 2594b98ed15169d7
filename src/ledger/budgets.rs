// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget aggregator. Only the cap is stored; spending is summed from
//! completed expense transactions each time a budget is read.

use crate::db::write_tx;
use crate::error::{LedgerError, Result};
use crate::ledger::{categories, checked_total, require_positive};
use crate::models::{
    Budget, BudgetRequest, BudgetStatus, BudgetView, TransactionStatus, TransactionType,
};
use crate::utils::{decimal_col, month_bounds, percentage};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

const SELECT: &str = "SELECT b.id, b.category_id, c.name, c.color, b.amount, b.month, b.year, \
     b.created_at FROM budgets b JOIN categories c ON c.id=b.category_id";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        category_id: r.get(1)?,
        category_name: r.get(2)?,
        category_color: r.get(3)?,
        amount: decimal_col(r, 4)?,
        month: r.get(5)?,
        year: r.get(6)?,
        created_at: r.get(7)?,
    })
}

fn period(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate)> {
    if !(1..=12).contains(&month) {
        return Err(LedgerError::validation(
            "month",
            "Month must be between 1 and 12",
        ));
    }
    if year < 2000 {
        return Err(LedgerError::validation("year", "Year must be 2000 or later"));
    }
    month_bounds(month, year).map_err(|e| LedgerError::validation("year", e.to_string()))
}

pub fn get(conn: &Connection, id: i64) -> Result<Budget> {
    conn.query_row(&format!("{} WHERE b.id=?1", SELECT), params![id], from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("Budget", id))
}

pub fn find(conn: &Connection, category_id: i64, month: u32, year: i32) -> Result<Option<Budget>> {
    Ok(conn
        .query_row(
            &format!(
                "{} WHERE b.category_id=?1 AND b.month=?2 AND b.year=?3",
                SELECT
            ),
            params![category_id, month, year],
            from_row,
        )
        .optional()?)
}

pub fn list(conn: &Connection, month: u32, year: i32) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE b.month=?1 AND b.year=?2 ORDER BY c.name",
        SELECT
    ))?;
    let rows = stmt.query_map(params![month, year], from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn create(conn: &mut Connection, req: &BudgetRequest) -> Result<Budget> {
    require_positive("amount", "Amount", req.amount)?;
    period(req.month, req.year)?;
    let tx = write_tx(conn)?;
    if !categories::exists(&tx, req.category_id)? {
        return Err(LedgerError::validation(
            "categoryId",
            format!("Category {} does not exist", req.category_id),
        ));
    }
    if find(&tx, req.category_id, req.month, req.year)?.is_some() {
        return Err(LedgerError::Conflict(
            "Budget already exists for this category and period".into(),
        ));
    }
    tx.execute(
        "INSERT INTO budgets(category_id, amount, month, year) VALUES (?1,?2,?3,?4)",
        params![req.category_id, req.amount.to_string(), req.month, req.year],
    )?;
    let budget = get(&tx, tx.last_insert_rowid())?;
    tx.commit()?;
    tracing::info!(
        budget_id = budget.id,
        category_id = budget.category_id,
        month = budget.month,
        year = budget.year,
        "budget created"
    );
    Ok(budget)
}

pub fn update(conn: &mut Connection, id: i64, amount: Decimal) -> Result<Budget> {
    require_positive("amount", "Amount", amount)?;
    let tx = write_tx(conn)?;
    get(&tx, id)?;
    tx.execute(
        "UPDATE budgets SET amount=?1 WHERE id=?2",
        params![amount.to_string(), id],
    )?;
    let budget = get(&tx, id)?;
    tx.commit()?;
    tracing::info!(budget_id = id, amount = %budget.amount, "budget updated");
    Ok(budget)
}

pub fn delete(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = write_tx(conn)?;
    if tx.execute("DELETE FROM budgets WHERE id=?1", params![id])? == 0 {
        return Err(LedgerError::not_found("Budget", id));
    }
    tx.commit()?;
    tracing::info!(budget_id = id, "budget deleted");
    Ok(())
}

/// Sum of completed expenses in the category dated within the month.
pub fn spent(conn: &Connection, category_id: i64, month: u32, year: i32) -> Result<Decimal> {
    let (first, last) = period(month, year)?;
    let mut stmt = conn.prepare_cached(
        "SELECT amount FROM transactions WHERE category_id=?1 AND type=?2 AND status=?3 \
         AND transaction_date BETWEEN ?4 AND ?5",
    )?;
    let mut rows = stmt.query(params![
        category_id,
        TransactionType::Expense,
        TransactionStatus::Completed,
        first,
        last
    ])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        total = checked_total("amount", total, decimal_col(r, 0)?)?;
    }
    Ok(total)
}

/// EXCEEDED as soon as spending passes the cap, COMPLETED once the month is
/// over without exceeding it, ACTIVE otherwise.
pub fn status_for(
    spent: Decimal,
    amount: Decimal,
    month: u32,
    year: i32,
    today: NaiveDate,
) -> Result<BudgetStatus> {
    if spent > amount {
        return Ok(BudgetStatus::Exceeded);
    }
    let (_, last) = period(month, year)?;
    if today > last {
        Ok(BudgetStatus::Completed)
    } else {
        Ok(BudgetStatus::Active)
    }
}

pub fn view(conn: &Connection, budget: &Budget, today: NaiveDate) -> Result<BudgetView> {
    let spent = spent(conn, budget.category_id, budget.month, budget.year)?;
    Ok(BudgetView {
        id: budget.id,
        category_id: budget.category_id,
        category_name: budget.category_name.clone(),
        category_color: budget.category_color.clone(),
        amount: budget.amount,
        spent,
        remaining: budget.amount - spent,
        percentage_used: percentage(spent, budget.amount),
        month: budget.month,
        year: budget.year,
        status: status_for(spent, budget.amount, budget.month, budget.year, today)?,
        created_at: budget.created_at.clone(),
    })
}

pub fn evaluate(
    conn: &Connection,
    category_id: i64,
    month: u32,
    year: i32,
    today: NaiveDate,
) -> Result<BudgetView> {
    let budget = find(conn, category_id, month, year)?
        .ok_or_else(|| LedgerError::not_found("Budget for category", category_id))?;
    view(conn, &budget, today)
}

pub fn list_views(
    conn: &Connection,
    month: u32,
    year: i32,
    today: NaiveDate,
) -> Result<Vec<BudgetView>> {
    list(conn, month, year)?
        .iter()
        .map(|b| view(conn, b, today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_rules() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let cap = Decimal::from(500);
        assert_eq!(
            status_for(Decimal::from(550), cap, 3, 2025, d(2025, 3, 10)).unwrap(),
            BudgetStatus::Exceeded
        );
        assert_eq!(
            status_for(Decimal::from(500), cap, 3, 2025, d(2025, 3, 31)).unwrap(),
            BudgetStatus::Active
        );
        assert_eq!(
            status_for(Decimal::from(500), cap, 3, 2025, d(2025, 4, 1)).unwrap(),
            BudgetStatus::Completed
        );
        assert!(status_for(Decimal::ZERO, cap, 0, 2025, d(2025, 4, 1)).is_err());
    }
}
