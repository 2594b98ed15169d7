// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{opt_str, parse_enum, req_str, today};
use crate::ledger::transactions::{self, TransactionFilter};
use crate::models::{Page, Transaction, TransactionRequest, TransactionStatus, TransactionType};
use crate::utils::{
    id_for_account, id_for_category, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => {
            let t = transactions::get(conn, *sub.get_one::<i64>("id").unwrap())?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &t)? {
                println!("{}", table(std::slice::from_ref(&t)));
            }
        }
        Some(("update", sub)) => update(conn, sub)?,
        Some(("status", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let status: TransactionStatus = parse_enum(&req_str(sub, "status")?)?;
            let t = transactions::set_status(conn, id, status)?;
            println!("Transaction #{} is now {}", t.id, t.status);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            transactions::delete(conn, id)?;
            println!("Removed transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// Overlays the flags present in `sub` on top of `base`.
fn request_from(
    conn: &Connection,
    sub: &clap::ArgMatches,
    mut base: TransactionRequest,
) -> Result<TransactionRequest> {
    if let Some(a) = opt_str(sub, "account") {
        base.account_id = id_for_account(conn, &a)?;
    }
    if let Some(a) = opt_str(sub, "amount") {
        base.amount = parse_decimal(&a)?;
    }
    if let Some(t) = opt_str(sub, "type") {
        base.r#type = parse_enum(&t)?;
    }
    if let Some(d) = opt_str(sub, "description") {
        base.description = d;
    }
    if let Some(c) = opt_str(sub, "category") {
        base.category_id = Some(id_for_category(conn, &c)?);
    }
    if let Some(to) = opt_str(sub, "to") {
        base.destination_account_id = Some(id_for_account(conn, &to)?);
    }
    if let Some(s) = opt_str(sub, "status") {
        base.status = parse_enum(&s)?;
    }
    if let Some(d) = opt_str(sub, "date") {
        base.transaction_date = parse_date(&d)?;
    }
    if let Some(n) = opt_str(sub, "note") {
        base.notes = Some(n);
    }
    if base.r#type != TransactionType::Transfer && opt_str(sub, "to").is_none() {
        base.destination_account_id = None;
    }
    Ok(base)
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let base = TransactionRequest {
        account_id: id_for_account(conn, &req_str(sub, "account")?)?,
        category_id: None,
        destination_account_id: None,
        description: String::new(),
        amount: parse_decimal(&req_str(sub, "amount")?)?,
        r#type: parse_enum(&req_str(sub, "type")?)?,
        status: TransactionStatus::Completed,
        transaction_date: today(),
        notes: None,
    };
    let req = request_from(conn, sub, base)?;
    let t = transactions::create(conn, &req)?;
    println!(
        "Recorded #{} {} {} on {} ({}, acct: {})",
        t.id, t.r#type, t.amount, t.transaction_date, t.status, t.account_name
    );
    Ok(())
}

fn update(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let current = transactions::get(conn, id)?;
    let req = request_from(conn, sub, TransactionRequest::from(&current))?;
    let t = transactions::update(conn, id, &req)?;
    println!("Updated transaction #{} ({}, {})", t.id, t.amount, t.status);
    Ok(())
}

pub fn query_page(conn: &Connection, sub: &clap::ArgMatches) -> Result<Page<Transaction>> {
    let filter = TransactionFilter {
        account_id: opt_str(sub, "account")
            .map(|a| id_for_account(conn, &a))
            .transpose()?,
        category_id: opt_str(sub, "category")
            .map(|c| id_for_category(conn, &c))
            .transpose()?,
        from: opt_str(sub, "from").map(|d| parse_date(&d)).transpose()?,
        to: opt_str(sub, "to").map(|d| parse_date(&d)).transpose()?,
        page: sub.get_one::<u64>("page").copied().unwrap_or(0),
        size: sub.get_one::<u64>("size").copied(),
    };
    Ok(transactions::list(conn, &filter)?)
}

fn table(data: &[Transaction]) -> comfy_table::Table {
    let rows = data
        .iter()
        .map(|t| {
            let account = match &t.destination_account_name {
                Some(dest) => format!("{} -> {}", t.account_name, dest),
                None => t.account_name.clone(),
            };
            vec![
                t.id.to_string(),
                t.transaction_date.to_string(),
                account,
                t.description.clone(),
                t.r#type.to_string(),
                t.amount.to_string(),
                t.status.to_string(),
                t.category_name.clone().unwrap_or_default(),
                t.notes.clone().unwrap_or_default(),
            ]
        })
        .collect();
    pretty_table(
        &[
            "ID", "Date", "Account", "Description", "Type", "Amount", "Status", "Category", "Note",
        ],
        rows,
    )
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let page = query_page(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &page)? {
        println!("{}", table(&page.content));
        println!(
            "Page {}/{} ({} transactions)",
            page.number + 1,
            page.total_pages.max(1),
            page.total_elements
        );
    }
    Ok(())
}
