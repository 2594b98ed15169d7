// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Months, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parses `YYYY-MM` into `(month, year)`.
pub fn parse_month(s: &str) -> Result<(u32, i32)> {
    let s = s.trim();
    let d = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok((d.month(), d.year()))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays and pages stream one element per line
        let val = serde_json::to_value(v)?;
        let items = val
            .as_array()
            .or_else(|| val.get("content").and_then(|c| c.as_array()));
        if let Some(arr) = items {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Reads a decimal stored as TEXT, surfacing bad text as a conversion failure.
pub fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    s.parse::<Decimal>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Number of decimal places used for amounts in the given currency.
pub fn minor_units(currency: &str) -> u32 {
    match currency.to_ascii_uppercase().as_str() {
        "JPY" | "KRW" | "CLP" | "VND" | "ISK" => 0,
        _ => 2,
    }
}

/// `part / whole * 100` rounded to two places; zero when `whole` is zero.
pub fn percentage(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    match part
        .checked_div(whole)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(p) => p.round_dp(2).to_f64().unwrap_or(0.0),
        None => {
            let ratio = part.to_f64().unwrap_or(0.0) / whole.to_f64().unwrap_or(1.0);
            (ratio * 10_000.0).round() / 100.0
        }
    }
}

/// First and last day of a calendar month.
pub fn month_bounds(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow!("Invalid month {}-{:02}", year, month))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| anyhow!("Month {}-{:02} out of range", year, month))?;
    Ok((first, last))
}

/// `start` shifted by `n` months, clamped to the last day of the target month.
pub fn add_months(start: NaiveDate, n: u32) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(n))
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn get_default_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "default_currency")?.unwrap_or_else(|| "USD".to_string()))
}

pub fn set_default_currency(conn: &Connection, ccy: &str) -> Result<()> {
    let ccy = ccy.trim().to_uppercase();
    if ccy.len() != 3 || !ccy.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(anyhow!("Currency must be a 3-letter code, got '{}'", ccy));
    }
    set_setting(conn, "default_currency", &ccy)
}

/// Accepts either a numeric id or an account name.
pub fn id_for_account(conn: &Connection, reference: &str) -> Result<i64> {
    let reference = reference.trim();
    if let Ok(id) = reference.parse::<i64>() {
        return Ok(id);
    }
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE name=?1 ORDER BY id LIMIT 1")?;
    let id: i64 = stmt
        .query_row(params![reference], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", reference))?;
    Ok(id)
}

/// Accepts either a numeric id or a category name.
pub fn id_for_category(conn: &Connection, reference: &str) -> Result<i64> {
    let reference = reference.trim();
    if let Ok(id) = reference.parse::<i64>() {
        return Ok(id);
    }
    let mut stmt =
        conn.prepare("SELECT id FROM categories WHERE name=?1 COLLATE NOCASE ORDER BY id LIMIT 1")?;
    let id: i64 = stmt
        .query_row(params![reference], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", reference))?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_handle_leap_years() {
        let (first, last) = month_bounds(2, 2024).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(month_bounds(13, 2024).is_err());
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        let jan31 = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(
            add_months(jan31, 1),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
    }

    #[test]
    fn parse_month_returns_parts() {
        assert_eq!(parse_month(" 2025-08 ").unwrap(), (8, 2025));
        assert!(parse_month("2025-13").is_err());
    }

    #[test]
    fn zero_decimal_currencies() {
        assert_eq!(minor_units("jpy"), 0);
        assert_eq!(minor_units("KRW"), 0);
        assert_eq!(minor_units("USD"), 2);
    }

    #[test]
    fn percentage_of_zero_whole_is_zero() {
        assert_eq!(percentage(Decimal::TEN, Decimal::ZERO), 0.0);
        assert_eq!(percentage(Decimal::from(550), Decimal::from(500)), 110.0);
    }

    #[test]
    fn percentage_outside_decimal_range_falls_back_to_float() {
        let tiny = Decimal::from_str_exact("0.0000001").unwrap();
        let huge = Decimal::from_i128_with_scale(10_i128.pow(22), 0);
        let p = percentage(huge, tiny);
        assert!((p / 1e31 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn default_currency_round_trips_through_settings() {
        let conn = crate::db::open_in_memory().unwrap();
        assert_eq!(get_default_currency(&conn).unwrap(), "USD");
        set_default_currency(&conn, " brl ").unwrap();
        assert_eq!(get_default_currency(&conn).unwrap(), "BRL");
        assert!(set_default_currency(&conn, "EURO").is_err());
        assert_eq!(id_for_category(&conn, "salary").unwrap(), 1);
    }
}
