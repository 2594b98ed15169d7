// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{opt_str, req_str, today};
use crate::ledger::budgets;
use crate::models::BudgetRequest;
use crate::utils::{id_for_category, maybe_print_json, parse_decimal, parse_month, pretty_table};
use anyhow::Result;
use chrono::Datelike;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("update", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let amount = parse_decimal(&req_str(sub, "amount")?)?;
            let b = budgets::update(conn, id, amount)?;
            println!("Budget #{} for {} set to {}", b.id, b.category_name, b.amount);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            budgets::delete(conn, id)?;
            println!("Removed budget {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (month, year) = parse_month(&req_str(sub, "month")?)?;
    let req = BudgetRequest {
        category_id: id_for_category(conn, &req_str(sub, "category")?)?,
        amount: parse_decimal(&req_str(sub, "amount")?)?,
        month,
        year,
    };
    let b = budgets::create(conn, &req)?;
    println!(
        "Budget set for {}-{:02} / {} = {}",
        b.year, b.month, b.category_name, b.amount
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let today = today();
    let (month, year) = match opt_str(sub, "month") {
        Some(m) => parse_month(&m)?,
        None => (today.month(), today.year()),
    };
    let data = budgets::list_views(conn, month, year, today)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    b.category_name.clone(),
                    format!("{:.2}", b.amount),
                    format!("{:.2}", b.spent),
                    format!("{:.2}", b.remaining),
                    format!("{:.2}%", b.percentage_used),
                    b.status.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Category", "Budget", "Spent", "Remaining", "Used", "Status"],
                rows
            )
        );
    }
    Ok(())
}
