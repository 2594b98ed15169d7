// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::write_tx;
use crate::error::{LedgerError, Result};
use crate::ledger::require_text;
use crate::models::{Category, CategoryRequest};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row, params};

static COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[A-Fa-f0-9]{6}$").unwrap());

const SELECT: &str = "SELECT id, name, type, color, icon, is_default, created_at FROM categories";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        name: r.get(1)?,
        r#type: r.get(2)?,
        color: r.get(3)?,
        icon: r.get(4)?,
        is_default: r.get(5)?,
        created_at: r.get(6)?,
    })
}

pub fn get(conn: &Connection, id: i64) -> Result<Category> {
    conn.query_row(&format!("{} WHERE id=?1", SELECT), params![id], from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("Category", id))
}

pub fn exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM categories WHERE id=?1", params![id], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

pub fn list(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY type, name", SELECT))?;
    let rows = stmt.query_map([], from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn validate(req: &CategoryRequest) -> Result<(String, Option<String>, Option<String>)> {
    let name = require_text("name", "Name", &req.name, 100)?;
    let color = req
        .color
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    if let Some(c) = color {
        if !COLOR.is_match(c) {
            return Err(LedgerError::validation(
                "color",
                "Color must be a valid hex code",
            ));
        }
    }
    let icon = req.icon.as_deref().map(str::trim).filter(|i| !i.is_empty());
    if icon.is_some_and(|i| i.chars().count() > 50) {
        return Err(LedgerError::validation(
            "icon",
            "Icon must be at most 50 characters",
        ));
    }
    Ok((name, color.map(str::to_uppercase), icon.map(str::to_string)))
}

pub fn create(conn: &mut Connection, req: &CategoryRequest) -> Result<Category> {
    let (name, color, icon) = validate(req)?;
    let tx = write_tx(conn)?;
    tx.execute(
        "INSERT INTO categories(name, type, color, icon, is_default) VALUES (?1,?2,?3,?4,0)",
        params![name, req.r#type, color, icon],
    )?;
    let category = get(&tx, tx.last_insert_rowid())?;
    tx.commit()?;
    tracing::info!(category_id = category.id, name = %category.name, "category created");
    Ok(category)
}

pub fn update(conn: &mut Connection, id: i64, req: &CategoryRequest) -> Result<Category> {
    let (name, color, icon) = validate(req)?;
    let tx = write_tx(conn)?;
    let current = get(&tx, id)?;
    if current.is_default {
        return Err(LedgerError::validation(
            "id",
            "Default categories cannot be edited",
        ));
    }
    tx.execute(
        "UPDATE categories SET name=?1, type=?2, color=?3, icon=?4 WHERE id=?5",
        params![name, req.r#type, color, icon, id],
    )?;
    let category = get(&tx, id)?;
    tx.commit()?;
    Ok(category)
}

/// Removes a custom category. Transactions and installment plans keep their
/// history with the category detached; budgets for it are dropped.
pub fn delete(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = write_tx(conn)?;
    let current = get(&tx, id)?;
    if current.is_default {
        return Err(LedgerError::validation(
            "id",
            "Default categories cannot be deleted",
        ));
    }
    let detached = tx.execute(
        "UPDATE transactions SET category_id=NULL WHERE category_id=?1",
        params![id],
    )?;
    tx.execute(
        "UPDATE installment_groups SET category_id=NULL WHERE category_id=?1",
        params![id],
    )?;
    tx.execute("DELETE FROM budgets WHERE category_id=?1", params![id])?;
    tx.execute("DELETE FROM categories WHERE id=?1", params![id])?;
    tx.commit()?;
    tracing::info!(category_id = id, detached, "category deleted");
    Ok(())
}
