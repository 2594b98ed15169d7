// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{opt_str, parse_enum, req_str};
use crate::ledger::accounts;
use crate::models::AccountRequest;
use crate::utils::{fmt_money, get_default_currency, id_for_account, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("rm", sub)) => {
            let id = id_for_account(conn, &req_str(sub, "account")?)?;
            accounts::delete(conn, id, sub.get_flag("force"))?;
            println!("Removed account {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let currency = match opt_str(sub, "currency") {
        Some(c) => c,
        None => get_default_currency(conn)?,
    };
    let req = AccountRequest {
        name: req_str(sub, "name")?,
        r#type: parse_enum(&req_str(sub, "type")?)?,
        balance: parse_decimal(&req_str(sub, "balance")?)?,
        currency,
    };
    let a = accounts::create(conn, &req)?;
    println!(
        "Added account #{} '{}' ({}, {})",
        a.id,
        a.name,
        a.r#type,
        fmt_money(&a.balance, &a.currency)
    );
    Ok(())
}

fn update(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let current = accounts::get(conn, id)?;
    let req = AccountRequest {
        name: opt_str(sub, "name").unwrap_or(current.name),
        r#type: match opt_str(sub, "type") {
            Some(t) => parse_enum(&t)?,
            None => current.r#type,
        },
        balance: current.balance,
        currency: opt_str(sub, "currency").unwrap_or(current.currency),
    };
    let a = accounts::update(conn, id, &req)?;
    println!("Updated account #{} '{}'", a.id, a.name);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = accounts::list(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|a| {
                vec![
                    a.id.to_string(),
                    a.name.clone(),
                    a.r#type.to_string(),
                    format!("{:.2}", a.balance),
                    a.currency.clone(),
                    a.created_at.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Type", "Balance", "CCY", "Created"], rows)
        );
    }
    Ok(())
}
