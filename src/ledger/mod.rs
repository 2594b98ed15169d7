// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The ledger consistency engine.
//!
//! Mutations take `&mut Connection` and run inside a single immediate
//! transaction (see [`crate::db::write_tx`]); an error anywhere drops the
//! transaction and nothing is persisted. Reads take `&Connection` and compute
//! derived figures (budget spending, goal progress) on every call.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod goals;
pub mod installments;
pub mod summary;
pub mod transactions;

use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;

/// Largest value a single money field may hold: 15 digits, 2 of them decimals.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999_999, 2)
}

fn require_in_range(field: &str, label: &str, amount: Decimal) -> Result<()> {
    if amount > max_amount() {
        return Err(LedgerError::validation(
            field,
            format!("{} must not exceed {}", label, max_amount()),
        ));
    }
    if amount.normalize().scale() > 2 {
        return Err(LedgerError::validation(
            field,
            format!("{} must have at most 2 decimal places", label),
        ));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, label: &str, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation(
            field,
            format!("{} must be positive", label),
        ));
    }
    require_in_range(field, label, amount)
}

pub(crate) fn require_non_negative(field: &str, label: &str, amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::validation(
            field,
            format!("{} must be zero or positive", label),
        ));
    }
    require_in_range(field, label, amount)
}

/// `a + b`, reported against `field` when the result leaves `Decimal` range.
pub(crate) fn checked_total(field: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| LedgerError::validation(field, "Amount is out of range"))
}

pub(crate) fn require_text(field: &str, label: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LedgerError::validation(field, format!("{} is required", label)));
    }
    if value.chars().count() > max {
        return Err(LedgerError::validation(
            field,
            format!("{} must be at most {} characters", label, max),
        ));
    }
    Ok(value.to_string())
}

pub(crate) fn clean_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
