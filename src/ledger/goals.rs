// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Savings goals. Progress moves only through explicit deposits and never
//! touches account balances.

use crate::db::write_tx;
use crate::error::{LedgerError, Result};
use crate::ledger::{checked_total, clean_notes, require_non_negative, require_positive, require_text};
use crate::models::{Goal, GoalRequest, GoalStatus, GoalView};
use crate::utils::{decimal_col, percentage};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

const SELECT: &str = "SELECT id, name, target_amount, current_amount, deadline, status, notes, \
     created_at FROM goals";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: r.get(0)?,
        name: r.get(1)?,
        target_amount: decimal_col(r, 2)?,
        current_amount: decimal_col(r, 3)?,
        deadline: r.get(4)?,
        status: r.get(5)?,
        notes: r.get(6)?,
        created_at: r.get(7)?,
    })
}

impl Goal {
    pub fn remaining_amount(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }

    /// Capped at 100 for display; the stored amount keeps any overshoot.
    pub fn percentage_completed(&self) -> f64 {
        percentage(self.current_amount, self.target_amount).min(100.0)
    }
}

impl From<&Goal> for GoalView {
    fn from(g: &Goal) -> Self {
        GoalView {
            id: g.id,
            name: g.name.clone(),
            target_amount: g.target_amount,
            current_amount: g.current_amount,
            remaining_amount: g.remaining_amount(),
            percentage_completed: g.percentage_completed(),
            deadline: g.deadline,
            status: g.status,
            notes: g.notes.clone(),
            created_at: g.created_at.clone(),
        }
    }
}

pub fn get(conn: &Connection, id: i64) -> Result<Goal> {
    conn.query_row(&format!("{} WHERE id=?1", SELECT), params![id], from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("Goal", id))
}

pub fn list(conn: &Connection) -> Result<Vec<Goal>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY CASE status WHEN 'IN_PROGRESS' THEN 0 ELSE 1 END, deadline IS NULL, deadline, id",
        SELECT
    ))?;
    let rows = stmt.query_map([], from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn create(conn: &mut Connection, req: &GoalRequest) -> Result<Goal> {
    let name = require_text("name", "Name", &req.name, 100)?;
    require_positive("targetAmount", "Target amount", req.target_amount)?;
    let current = req.current_amount.unwrap_or(Decimal::ZERO);
    require_non_negative("currentAmount", "Current amount", current)?;
    let status = if current >= req.target_amount {
        GoalStatus::Completed
    } else {
        GoalStatus::InProgress
    };
    let tx = write_tx(conn)?;
    tx.execute(
        "INSERT INTO goals(name, target_amount, current_amount, deadline, status, notes) \
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            name,
            req.target_amount.to_string(),
            current.to_string(),
            req.deadline,
            status,
            clean_notes(req.notes.as_deref())
        ],
    )?;
    let goal = get(&tx, tx.last_insert_rowid())?;
    tx.commit()?;
    tracing::info!(goal_id = goal.id, target = %goal.target_amount, status = %goal.status, "goal created");
    Ok(goal)
}

/// Adds to an in-progress goal; reaching the target completes it.
pub fn deposit(conn: &mut Connection, id: i64, amount: Decimal) -> Result<Goal> {
    require_positive("amount", "Deposit amount", amount)?;
    let tx = write_tx(conn)?;
    let goal = get(&tx, id)?;
    if goal.status != GoalStatus::InProgress {
        tracing::warn!(goal_id = id, status = %goal.status, "deposit rejected");
        return Err(LedgerError::InvalidStateTransition(
            "Only in-progress goals can receive deposits".into(),
        ));
    }
    let current = checked_total("amount", goal.current_amount, amount)?;
    let status = if current >= goal.target_amount {
        GoalStatus::Completed
    } else {
        GoalStatus::InProgress
    };
    tx.execute(
        "UPDATE goals SET current_amount=?1, status=?2 WHERE id=?3",
        params![current.to_string(), status, id],
    )?;
    let goal = get(&tx, id)?;
    tx.commit()?;
    tracing::info!(goal_id = id, %amount, current = %goal.current_amount, status = %goal.status, "goal deposit");
    Ok(goal)
}

/// Edits name, target, deadline and notes. `current_amount` in the request is
/// ignored; use [`deposit`]. Completed and cancelled goals keep their status.
pub fn update(conn: &mut Connection, id: i64, req: &GoalRequest) -> Result<Goal> {
    let name = require_text("name", "Name", &req.name, 100)?;
    require_positive("targetAmount", "Target amount", req.target_amount)?;
    let tx = write_tx(conn)?;
    let goal = get(&tx, id)?;
    let status = match goal.status {
        GoalStatus::InProgress if goal.current_amount >= req.target_amount => GoalStatus::Completed,
        other => other,
    };
    tx.execute(
        "UPDATE goals SET name=?1, target_amount=?2, deadline=?3, notes=?4, status=?5 WHERE id=?6",
        params![
            name,
            req.target_amount.to_string(),
            req.deadline,
            clean_notes(req.notes.as_deref()),
            status,
            id
        ],
    )?;
    let goal = get(&tx, id)?;
    tx.commit()?;
    Ok(goal)
}

pub fn cancel(conn: &mut Connection, id: i64) -> Result<Goal> {
    let tx = write_tx(conn)?;
    let goal = get(&tx, id)?;
    if goal.status != GoalStatus::InProgress {
        return Err(LedgerError::InvalidStateTransition(format!(
            "Goal is {} and cannot be cancelled",
            goal.status
        )));
    }
    tx.execute(
        "UPDATE goals SET status=?1 WHERE id=?2",
        params![GoalStatus::Cancelled, id],
    )?;
    let goal = get(&tx, id)?;
    tx.commit()?;
    tracing::info!(goal_id = id, "goal cancelled");
    Ok(goal)
}

pub fn delete(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = write_tx(conn)?;
    if tx.execute("DELETE FROM goals WHERE id=?1", params![id])? == 0 {
        return Err(LedgerError::not_found("Goal", id));
    }
    tx.commit()?;
    tracing::info!(goal_id = id, "goal deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(target: i64, current: i64) -> Goal {
        Goal {
            id: 1,
            name: "Trip".into(),
            target_amount: Decimal::from(target),
            current_amount: Decimal::from(current),
            deadline: None,
            status: GoalStatus::InProgress,
            notes: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn overshoot_is_capped_for_display_only() {
        let g = goal(100, 110);
        assert_eq!(g.remaining_amount(), Decimal::ZERO);
        assert_eq!(g.percentage_completed(), 100.0);
        assert_eq!(GoalView::from(&g).current_amount, Decimal::from(110));
    }

    #[test]
    fn partial_progress() {
        let g = goal(200, 50);
        assert_eq!(g.remaining_amount(), Decimal::from(150));
        assert_eq!(g.percentage_completed(), 25.0);
    }
}
