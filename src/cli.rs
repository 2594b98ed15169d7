// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn page_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("page")
            .long("page")
            .default_value("0")
            .value_parser(value_parser!(u64))
            .help("Zero-based page number"),
    )
    .arg(
        Arg::new("size")
            .long("size")
            .value_parser(value_parser!(u64))
            .help("Page size (max 100)"),
    )
}

fn account_cmd() -> Command {
    let fields = |cmd: Command, required: bool| {
        cmd.arg(Arg::new("name").long("name").required(required))
            .arg(
                Arg::new("type")
                    .long("type")
                    .required(required)
                    .help("checking | savings | wallet | credit_card | investment"),
            )
            .arg(
                Arg::new("currency")
                    .long("currency")
                    .help("3-letter code (defaults to the configured currency)"),
            )
    };
    Command::new("account")
        .about("Manage accounts")
        .subcommand(
            fields(Command::new("add"), true).arg(
                Arg::new("balance")
                    .long("balance")
                    .default_value("0")
                    .help("Initial balance"),
            ),
        )
        .subcommand(json_args(Command::new("list")))
        .subcommand(fields(Command::new("update").arg(id_arg()), false))
        .subcommand(
            Command::new("rm").arg(Arg::new("account").long("account").required(true)).arg(
                Arg::new("force")
                    .long("force")
                    .action(ArgAction::SetTrue)
                    .help("Also delete the account's transactions and installment plans"),
            ),
        )
}

fn category_cmd() -> Command {
    let fields = |cmd: Command, required: bool| {
        cmd.arg(Arg::new("name").long("name").required(required))
            .arg(
                Arg::new("type")
                    .long("type")
                    .required(required)
                    .help("income | expense"),
            )
            .arg(Arg::new("color").long("color").help("#RRGGBB"))
            .arg(Arg::new("icon").long("icon"))
    };
    Command::new("category")
        .about("Manage categories")
        .subcommand(fields(Command::new("add"), true))
        .subcommand(json_args(Command::new("list")))
        .subcommand(fields(Command::new("update").arg(id_arg()), false))
        .subcommand(Command::new("rm").arg(Arg::new("category").long("category").required(true)))
}

fn tx_cmd() -> Command {
    let fields = |cmd: Command, required: bool| {
        cmd.arg(Arg::new("account").long("account").required(required))
            .arg(Arg::new("amount").long("amount").required(required))
            .arg(
                Arg::new("type")
                    .long("type")
                    .required(required)
                    .help("income | expense | transfer"),
            )
            .arg(Arg::new("description").long("description").required(required))
            .arg(Arg::new("category").long("category"))
            .arg(
                Arg::new("to")
                    .long("to")
                    .help("Destination account for transfers"),
            )
            .arg(
                Arg::new("status")
                    .long("status")
                    .help("pending | completed | cancelled"),
            )
            .arg(Arg::new("date").long("date").help("YYYY-MM-DD"))
            .arg(Arg::new("note").long("note"))
    };
    Command::new("tx")
        .about("Record and manage transactions")
        .subcommand(fields(Command::new("add"), true))
        .subcommand(json_args(page_args(
            Command::new("list")
                .arg(Arg::new("account").long("account"))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("from").long("from").help("YYYY-MM-DD"))
                .arg(Arg::new("to").long("to").help("YYYY-MM-DD")),
        )))
        .subcommand(json_args(Command::new("show").arg(id_arg())))
        .subcommand(fields(Command::new("update").arg(id_arg()), false))
        .subcommand(
            Command::new("status")
                .arg(id_arg())
                .arg(Arg::new("status").long("status").required(true)),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn installment_cmd() -> Command {
    Command::new("installment")
        .about("Installment plans")
        .subcommand(
            Command::new("add")
                .arg(Arg::new("account").long("account").required(true))
                .arg(Arg::new("total").long("total").required(true))
                .arg(
                    Arg::new("count")
                        .long("count")
                        .required(true)
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("start")
                        .long("start")
                        .required(true)
                        .help("YYYY-MM-DD"),
                )
                .arg(Arg::new("description").long("description").required(true))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("note").long("note")),
        )
        .subcommand(json_args(page_args(Command::new("list"))))
        .subcommand(json_args(Command::new("show").arg(id_arg())))
        .subcommand(
            Command::new("pay")
                .arg(id_arg())
                .arg(Arg::new("date").long("date").help("Payment date, defaults to today")),
        )
        .subcommand(Command::new("cancel").arg(id_arg()))
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Monthly category budgets")
        .subcommand(
            Command::new("add")
                .arg(Arg::new("category").long("category").required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(
                    Arg::new("month")
                        .long("month")
                        .required(true)
                        .help("YYYY-MM"),
                ),
        )
        .subcommand(json_args(
            Command::new("list").arg(Arg::new("month").long("month").help("YYYY-MM, defaults to current")),
        ))
        .subcommand(
            Command::new("update")
                .arg(id_arg())
                .arg(Arg::new("amount").long("amount").required(true)),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn goal_cmd() -> Command {
    let fields = |cmd: Command, required: bool| {
        cmd.arg(Arg::new("name").long("name").required(required))
            .arg(Arg::new("target").long("target").required(required))
            .arg(Arg::new("deadline").long("deadline").help("YYYY-MM-DD"))
            .arg(Arg::new("note").long("note"))
    };
    Command::new("goal")
        .about("Savings goals")
        .subcommand(fields(
            Command::new("add").arg(Arg::new("current").long("current")),
            true,
        ))
        .subcommand(json_args(Command::new("list")))
        .subcommand(fields(Command::new("update").arg(id_arg()), false))
        .subcommand(
            Command::new("deposit")
                .arg(id_arg())
                .arg(Arg::new("amount").long("amount").required(true)),
        )
        .subcommand(Command::new("cancel").arg(id_arg()))
        .subcommand(Command::new("rm").arg(id_arg()))
}

pub fn build_cli() -> Command {
    Command::new("finledger")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Personal finance ledger: accounts, transactions, installments, budgets and goals")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env(crate::db::DB_ENV)
                .help("Path to the ledger database"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging to stderr"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("config")
                .about("Ledger settings")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set-currency").arg(Arg::new("currency").required(true)),
                ),
        )
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(installment_cmd())
        .subcommand(budget_cmd())
        .subcommand(goal_cmd())
        .subcommand(json_args(
            Command::new("summary")
                .about("Balances, monthly totals, budgets and goals")
                .arg(Arg::new("month").long("month").help("YYYY-MM, defaults to current")),
        ))
        .subcommand(Command::new("doctor").about("Check ledger consistency"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }
}
