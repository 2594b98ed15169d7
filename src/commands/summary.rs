// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{opt_str, today};
use crate::ledger::summary;
use crate::utils::{maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use chrono::Datelike;
use rusqlite::Connection;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let today = today();
    let (month, year) = match opt_str(sub, "month") {
        Some(m) => parse_month(&m)?,
        None => (today.month(), today.year()),
    };
    let s = summary::summary(conn, month, year, today)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Period", "Total balance", "Income", "Expenses", "Net"],
            vec![vec![
                format!("{}-{:02}", s.year, s.month),
                format!("{:.2}", s.total_balance),
                format!("{:.2}", s.total_income),
                format!("{:.2}", s.total_expenses),
                format!("{:.2}", s.net_balance),
            ]],
        )
    );
    if !s.budgets.is_empty() {
        let rows = s
            .budgets
            .iter()
            .map(|b| {
                vec![
                    b.category_name.clone(),
                    format!("{:.2}", b.spent),
                    format!("{:.2}", b.amount),
                    b.status.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Budget", "Spent", "Cap", "Status"], rows)
        );
    }
    if !s.goals.is_empty() {
        let rows = s
            .goals
            .iter()
            .map(|g| vec![g.name.clone(), format!("{:.2}%", g.percentage_completed)])
            .collect();
        println!("{}", pretty_table(&["Goal", "Progress"], rows));
    }
    Ok(())
}
