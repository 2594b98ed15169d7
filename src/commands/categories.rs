// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{opt_str, parse_enum, req_str};
use crate::ledger::categories;
use crate::models::CategoryRequest;
use crate::utils::{id_for_category, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let req = CategoryRequest {
                name: req_str(sub, "name")?,
                r#type: parse_enum(&req_str(sub, "type")?)?,
                color: opt_str(sub, "color"),
                icon: opt_str(sub, "icon"),
            };
            let c = categories::create(conn, &req)?;
            println!("Added category #{} '{}' ({})", c.id, c.name, c.r#type);
        }
        Some(("list", sub)) => {
            let data = categories::list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.r#type.to_string(),
                            c.color.clone().unwrap_or_default(),
                            if c.is_default { "yes".into() } else { String::new() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Category", "Type", "Color", "Default"], rows)
                );
            }
        }
        Some(("update", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let current = categories::get(conn, id)?;
            let req = CategoryRequest {
                name: opt_str(sub, "name").unwrap_or(current.name),
                r#type: match opt_str(sub, "type") {
                    Some(t) => parse_enum(&t)?,
                    None => current.r#type,
                },
                color: opt_str(sub, "color").or(current.color),
                icon: opt_str(sub, "icon").or(current.icon),
            };
            let c = categories::update(conn, id, &req)?;
            println!("Updated category #{} '{}'", c.id, c.name);
        }
        Some(("rm", sub)) => {
            let id = id_for_category(conn, &req_str(sub, "category")?)?;
            categories::delete(conn, id)?;
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}
