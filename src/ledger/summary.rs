// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result};
use crate::ledger::{accounts, budgets, checked_total, goals, transactions};
use crate::models::{
    Account, BudgetView, GoalStatus, GoalView, Transaction, TransactionStatus, TransactionType,
};
use crate::utils::{decimal_col, month_bounds};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

const RECENT: u64 = 5;

/// Month overview. Balances are summed as-is across accounts; no currency
/// conversion is applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub month: u32,
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expenses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_balance: Decimal,
    pub accounts: Vec<Account>,
    pub budgets: Vec<BudgetView>,
    pub goals: Vec<GoalView>,
    pub recent_transactions: Vec<Transaction>,
}

fn month_total(conn: &Connection, typ: TransactionType, month: u32, year: i32) -> Result<Decimal> {
    let (first, last) =
        month_bounds(month, year).map_err(|e| LedgerError::validation("month", e.to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT amount FROM transactions WHERE type=?1 AND status=?2 \
         AND transaction_date BETWEEN ?3 AND ?4",
    )?;
    let mut rows = stmt.query(params![typ, TransactionStatus::Completed, first, last])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        total = checked_total("amount", total, decimal_col(r, 0)?)?;
    }
    Ok(total)
}

pub fn summary(conn: &Connection, month: u32, year: i32, today: NaiveDate) -> Result<Summary> {
    let accounts = accounts::list(conn)?;
    let total_balance = accounts
        .iter()
        .try_fold(Decimal::ZERO, |acc, a| checked_total("balance", acc, a.balance))?;
    let total_income = month_total(conn, TransactionType::Income, month, year)?;
    let total_expenses = month_total(conn, TransactionType::Expense, month, year)?;
    let goals = goals::list(conn)?
        .iter()
        .filter(|g| g.status == GoalStatus::InProgress)
        .map(GoalView::from)
        .collect();
    let recent = transactions::list(
        conn,
        &transactions::TransactionFilter {
            size: Some(RECENT),
            ..Default::default()
        },
    )?;
    Ok(Summary {
        month,
        year,
        total_balance,
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
        accounts,
        budgets: budgets::list_views(conn, month, year, today)?,
        goals,
        recent_transactions: recent.content,
    })
}
