// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::req_str;
use crate::utils::{get_default_currency, pretty_table, set_default_currency};
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, db: &Path, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-currency", sub)) => {
            set_default_currency(conn, &req_str(sub, "currency")?)?;
            println!("Default currency set to {}", get_default_currency(conn)?);
        }
        _ => {
            let rows = vec![
                vec!["database".to_string(), db.display().to_string()],
                vec!["default_currency".to_string(), get_default_currency(conn)?],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
    }
    Ok(())
}
