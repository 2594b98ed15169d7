// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{opt_str, req_str, today};
use crate::ledger::installments;
use crate::models::{InstallmentGroup, InstallmentRequest};
use crate::utils::{
    id_for_account, id_for_category, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => {
            let page = installments::list_groups(
                conn,
                sub.get_one::<u64>("page").copied().unwrap_or(0),
                sub.get_one::<u64>("size").copied(),
            )?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &page)? {
                let rows = page
                    .content
                    .iter()
                    .map(|g| {
                        vec![
                            g.id.to_string(),
                            g.description.clone(),
                            g.account_name.clone(),
                            g.total_amount.to_string(),
                            format!("{}/{}", g.paid_count, g.installment_count),
                            g.start_date.to_string(),
                            g.category_name.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Description", "Account", "Total", "Paid", "Start", "Category"],
                        rows
                    )
                );
            }
        }
        Some(("show", sub)) => {
            let g = installments::get_group(conn, *sub.get_one::<i64>("id").unwrap())?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &g)? {
                print_group(&g);
            }
        }
        Some(("pay", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let paid_on = match opt_str(sub, "date") {
                Some(d) => parse_date(&d)?,
                None => today(),
            };
            let i = installments::pay(conn, id, paid_on)?;
            println!(
                "Paid installment #{} ({}) with transaction #{}",
                i.installment_number,
                i.amount,
                i.transaction_id.unwrap_or_default()
            );
        }
        Some(("cancel", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = installments::cancel_group(conn, id)?;
            println!("Cancelled {} pending installment(s) of plan {}", n, id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let req = InstallmentRequest {
        account_id: id_for_account(conn, &req_str(sub, "account")?)?,
        category_id: opt_str(sub, "category")
            .map(|c| id_for_category(conn, &c))
            .transpose()?,
        description: req_str(sub, "description")?,
        total_amount: parse_decimal(&req_str(sub, "total")?)?,
        installment_count: *sub.get_one::<u32>("count").unwrap(),
        start_date: parse_date(&req_str(sub, "start")?)?,
        notes: opt_str(sub, "note"),
    };
    let g = installments::create_group(conn, &req)?;
    print_group(&g);
    Ok(())
}

fn print_group(g: &InstallmentGroup) {
    println!(
        "Plan #{} '{}' on {}: {} in {} installments ({} paid)",
        g.id, g.description, g.account_name, g.total_amount, g.installment_count, g.paid_count
    );
    let rows = g
        .installments
        .iter()
        .map(|i| {
            vec![
                i.id.to_string(),
                i.installment_number.to_string(),
                i.due_date.to_string(),
                i.amount.to_string(),
                i.status.to_string(),
                i.transaction_id.map(|t| t.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "#", "Due", "Amount", "Status", "Transaction"], rows)
    );
}
