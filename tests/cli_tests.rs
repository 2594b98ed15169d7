// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use finledger::{cli, commands, db};
use finledger::ledger::{accounts, budgets, goals, installments, summary};
use finledger::models::GoalView;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn run(conn: &mut Connection, args: &[&str]) {
    let mut argv = vec!["finledger"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("account", sub)) => commands::accounts::handle(conn, sub).unwrap(),
        Some(("tx", sub)) => commands::transactions::handle(conn, sub).unwrap(),
        Some(("installment", sub)) => commands::installments::handle(conn, sub).unwrap(),
        Some(("budget", sub)) => commands::budgets::handle(conn, sub).unwrap(),
        Some(("goal", sub)) => commands::goals::handle(conn, sub).unwrap(),
        Some(("doctor", _)) => commands::doctor::handle(conn).unwrap(),
        other => panic!("unexpected command {:?}", other.map(|(n, _)| n)),
    }
}

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn accounts_and_categories_resolve_by_name() {
    let mut conn = db::open_in_memory().unwrap();
    run(&mut conn, &["account", "add", "--name", "Main", "--type", "checking", "--balance", "100"]);
    run(&mut conn, &["account", "add", "--name", "Cash", "--type", "wallet"]);
    run(&mut conn, &[
        "tx", "add", "--account", "Main", "--amount", "30", "--type", "transfer",
        "--to", "Cash", "--description", "ATM", "--date", "2025-03-01",
    ]);
    run(&mut conn, &[
        "tx", "add", "--account", "Cash", "--amount", "12.5", "--type", "expense",
        "--category", "food", "--description", "Lunch", "--date", "2025-03-02",
    ]);

    let all = accounts::list(&conn).unwrap();
    let main = all.iter().find(|a| a.name == "Main").unwrap();
    let cash = all.iter().find(|a| a.name == "Cash").unwrap();
    assert_eq!(main.balance, d("70"));
    assert_eq!(cash.balance, d("17.5"));
    assert_eq!(cash.currency, "USD");
}

#[test]
fn tx_list_applies_filters_and_page_size() {
    let mut conn = db::open_in_memory().unwrap();
    run(&mut conn, &["account", "add", "--name", "Main", "--type", "checking"]);
    for day in 1..=4 {
        let date = format!("2025-03-0{}", day);
        run(&mut conn, &[
            "tx", "add", "--account", "Main", "--amount", "10", "--type", "income",
            "--description", "Tips", "--date", &date,
        ]);
    }

    let matches = cli::build_cli().get_matches_from([
        "finledger", "tx", "list", "--account", "Main", "--from", "2025-03-02", "--size", "2",
    ]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    let page = commands::transactions::query_page(&conn, list_m).unwrap();
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.content.len(), 2);
    assert_eq!(
        page.content[0].transaction_date,
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    );
}

#[test]
fn installment_budget_and_goal_commands() {
    let mut conn = db::open_in_memory().unwrap();
    run(&mut conn, &["account", "add", "--name", "Card", "--type", "credit-card", "--balance", "500"]);
    run(&mut conn, &[
        "installment", "add", "--account", "Card", "--total", "90", "--count", "3",
        "--start", "2025-03-10", "--description", "Phone", "--category", "Shopping",
    ]);
    let group = installments::list_groups(&conn, 0, None).unwrap().content.remove(0);
    let first = group.installments[0].id.to_string();
    run(&mut conn, &["installment", "pay", "--id", &first, "--date", "2025-03-10"]);
    assert_eq!(installments::get_group(&conn, group.id).unwrap().paid_count, 1);

    run(&mut conn, &["budget", "add", "--category", "Shopping", "--amount", "25", "--month", "2025-03"]);
    let shopping = finledger::utils::id_for_category(&conn, "Shopping").unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
    let view = budgets::evaluate(&conn, shopping, 3, 2025, today).unwrap();
    assert_eq!(view.spent, d("30"));

    run(&mut conn, &["goal", "add", "--name", "Bike", "--target", "400"]);
    let goal = goals::list(&conn).unwrap().remove(0);
    let id = goal.id.to_string();
    run(&mut conn, &["goal", "deposit", "--id", &id, "--amount", "100"]);
    run(&mut conn, &["goal", "update", "--id", &id, "--target", "200"]);
    let goal = goals::get(&conn, goal.id).unwrap();
    assert_eq!(goal.name, "Bike");
    assert_eq!(GoalView::from(&goal).percentage_completed, 50.0);

    run(&mut conn, &["doctor"]);
}

#[test]
fn summary_serializes_camel_case_numbers() {
    let mut conn = db::open_in_memory().unwrap();
    run(&mut conn, &["account", "add", "--name", "Main", "--type", "savings", "--balance", "10.25"]);
    run(&mut conn, &[
        "tx", "add", "--account", "Main", "--amount", "5", "--type", "income",
        "--description", "Interest", "--date", "2025-03-31",
    ]);
    let today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
    let s = summary::summary(&conn, 3, 2025, today).unwrap();
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["totalBalance"], serde_json::json!(15.25));
    assert_eq!(v["totalIncome"], serde_json::json!(5.0));
    assert_eq!(v["netBalance"], serde_json::json!(5.0));
    let tx = &v["recentTransactions"][0];
    assert_eq!(tx["type"], "INCOME");
    assert_eq!(tx["status"], "COMPLETED");
    assert_eq!(tx["transactionDate"], "2025-03-31");
    assert!(v["accounts"][0].get("initialBalance").is_none());
}

#[test]
fn ledger_persists_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("ledger.sqlite");
    {
        let mut conn = db::open_at(&path).unwrap();
        run(&mut conn, &["account", "add", "--name", "Main", "--type", "checking", "--balance", "42"]);
    }
    let conn = db::open_at(&path).unwrap();
    let accounts = accounts::list(&conn).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].balance, d("42"));
    // Reopening must not reseed categories
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 12);
}
