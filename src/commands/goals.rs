// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{opt_str, req_str};
use crate::ledger::goals;
use crate::models::{GoalRequest, GoalView};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let req = GoalRequest {
                name: req_str(sub, "name")?,
                target_amount: parse_decimal(&req_str(sub, "target")?)?,
                current_amount: opt_str(sub, "current")
                    .map(|c| parse_decimal(&c))
                    .transpose()?,
                deadline: opt_str(sub, "deadline").map(|d| parse_date(&d)).transpose()?,
                notes: opt_str(sub, "note"),
            };
            let g = goals::create(conn, &req)?;
            println!("Added goal #{} '{}' ({})", g.id, g.name, g.status);
        }
        Some(("list", sub)) => {
            let data: Vec<GoalView> = goals::list(conn)?.iter().map(GoalView::from).collect();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|g| {
                        vec![
                            g.id.to_string(),
                            g.name.clone(),
                            format!("{:.2}", g.current_amount),
                            format!("{:.2}", g.target_amount),
                            format!("{:.2}", g.remaining_amount),
                            format!("{:.2}%", g.percentage_completed),
                            g.deadline.map(|d| d.to_string()).unwrap_or_default(),
                            g.status.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Goal", "Saved", "Target", "Remaining", "Done", "Deadline", "Status"],
                        rows
                    )
                );
            }
        }
        Some(("update", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let current = goals::get(conn, id)?;
            let req = GoalRequest {
                name: opt_str(sub, "name").unwrap_or(current.name),
                target_amount: match opt_str(sub, "target") {
                    Some(t) => parse_decimal(&t)?,
                    None => current.target_amount,
                },
                current_amount: None,
                deadline: match opt_str(sub, "deadline") {
                    Some(d) => Some(parse_date(&d)?),
                    None => current.deadline,
                },
                notes: opt_str(sub, "note").or(current.notes),
            };
            let g = goals::update(conn, id, &req)?;
            println!("Updated goal #{} '{}' ({})", g.id, g.name, g.status);
        }
        Some(("deposit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let amount = parse_decimal(&req_str(sub, "amount")?)?;
            let g = goals::deposit(conn, id, amount)?;
            println!(
                "Deposited {} into '{}': {:.2}/{:.2} ({})",
                amount, g.name, g.current_amount, g.target_amount, g.status
            );
        }
        Some(("cancel", sub)) => {
            let g = goals::cancel(conn, *sub.get_one::<i64>("id").unwrap())?;
            println!("Cancelled goal #{} '{}'", g.id, g.name);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            goals::delete(conn, id)?;
            println!("Removed goal {}", id);
        }
        _ => {}
    }
    Ok(())
}
