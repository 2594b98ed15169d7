// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{accounts, installments};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn issues(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Stored balances that drifted from the transaction history
    for (account, expected) in accounts::audit_balances(conn)? {
        rows.push(vec![
            "balance_drift".into(),
            format!(
                "account #{} '{}': stored {} expected {}",
                account.id, account.name, account.balance, expected
            ),
        ]);
    }

    // 2) Installments whose status disagrees with their transaction link
    for (installment, problem) in installments::link_issues(conn)? {
        rows.push(vec![
            "installment_link".into(),
            format!(
                "installment #{} of plan {}: {}",
                installment.id, installment.group_id, problem
            ),
        ]);
    }
    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = issues(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
