// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn period_arg() -> Arg {
    Arg::new("period")
        .long("period")
        .default_value("all")
        .value_parser(["week", "month", "quarter", "year", "all"])
        .help("Reporting window ending today")
}

fn tx_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(Arg::new("date").long("date").help("YYYY-MM-DD (defaults to today)"))
        .arg(
            Arg::new("type")
                .long("type")
                .required(required)
                .value_parser(["income", "expense"]),
        )
        .arg(Arg::new("category").long("category").required(required))
        .arg(Arg::new("amount").long("amount").required(required))
        .arg(Arg::new("description").long("description"))
        .arg(Arg::new("merchant").long("merchant"))
        .arg(
            Arg::new("source")
                .long("source")
                .value_parser(["manual", "wechat", "receipt", "file"]),
        )
}

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .about("Personal finance tracking: transactions, dashboards, trends and AI-assisted imports")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .env("FINTRACK_DB")
                .global(true)
                .help("SQLite database path (defaults to the platform data dir)"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .env("FINTRACK_USER")
                .default_value("default")
                .global(true)
                .help("Owner the transactions are scoped to"),
        )
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .env("FINTRACK_LOG")
                .default_value("warn")
                .global(true)
                .help("Log filter, e.g. info or fintrack=debug"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("tx")
                .about("Manage transactions")
                .subcommand(tx_fields(Command::new("add").about("Record a transaction"), true))
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List transactions, most recent first")
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["income", "expense"]),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(tx_fields(
                    Command::new("edit")
                        .about("Update fields of a transaction")
                        .arg(Arg::new("id").long("id").required(true)),
                    false,
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction")
                        .arg(Arg::new("id").long("id").required(true)),
                )
                .subcommand(
                    Command::new("clear")
                        .about("Delete every transaction (best effort, not atomic)")
                        .arg(
                            Arg::new("yes")
                                .long("yes")
                                .action(ArgAction::SetTrue)
                                .help("Confirm deletion"),
                        ),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Dashboard aggregates")
                .subcommand(json_flags(
                    Command::new("summary")
                        .about("Income, expenses and balance")
                        .arg(period_arg()),
                ))
                .subcommand(json_flags(
                    Command::new("categories")
                        .about("Expenses by category, largest first")
                        .arg(period_arg())
                        .arg(
                            Arg::new("top")
                                .long("top")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("monthly").about("Income and expenses per calendar month (Jan..Dec)"),
                ))
                .subcommand(json_flags(
                    Command::new("trends")
                        .about("This month against last month")
                        .arg(Arg::new("as_of").long("as-of").help("YYYY-MM-DD (defaults to today)")),
                ))
                .subcommand(json_flags(
                    Command::new("recent")
                        .about("Most recent transactions")
                        .arg(
                            Arg::new("count")
                                .long("count")
                                .default_value("5")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("import").about("Import data").subcommand(
                Command::new("transactions")
                    .about("Import transactions from a CSV file")
                    .arg(Arg::new("path").long("path").required(true))
                    .arg(
                        Arg::new("source")
                            .long("source")
                            .default_value("generic")
                            .value_parser(["generic", "wechat"]),
                    ),
            ),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .about("Export transactions")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("ai")
                .about("AI financial assistant")
                .subcommand(
                    Command::new("ask")
                        .about("Ask the assistant about your finances")
                        .arg(Arg::new("message").required(true))
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .action(ArgAction::SetTrue)
                                .help("Print the response envelope"),
                        ),
                )
                .subcommand(
                    Command::new("scan")
                        .about("Extract transaction details from a receipt photo")
                        .arg(Arg::new("image").long("image").required(true))
                        .arg(
                            Arg::new("save")
                                .long("save")
                                .action(ArgAction::SetTrue)
                                .help("Record the receipt as an expense"),
                        )
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .action(ArgAction::SetTrue)
                                .help("Print the response envelope"),
                        ),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Persistent settings")
                .subcommand(
                    Command::new("get")
                        .about("Show a setting")
                        .arg(Arg::new("key").required(true)),
                )
                .subcommand(
                    Command::new("set")
                        .about("Change a setting")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("list").about("Show all settings")),
        )
}
