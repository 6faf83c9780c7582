// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use fintrack::store::SqliteStore;
use fintrack::{cli, commands, db};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    init_tracing(
        matches
            .get_one::<String>("log_level")
            .map(String::as_str)
            .unwrap_or("warn"),
    );

    let db_override = matches.get_one::<String>("db").map(PathBuf::from);
    let conn = db::open_or_init(db_override.as_deref())?;
    let owner = matches
        .get_one::<String>("user")
        .map(String::as_str)
        .unwrap_or("default");
    let store = SqliteStore::new(&conn, owner);

    match matches.subcommand() {
        Some(("init", _)) => match &db_override {
            Some(p) => println!("Database initialized at {}", p.display()),
            None => println!("Database initialized at {}", db::db_path()?.display()),
        },
        Some(("tx", sub)) => commands::transactions::handle(&store, sub)?,
        Some(("report", sub)) => commands::reports::handle(&store, sub)?,
        Some(("import", sub)) => commands::importer::handle(&store, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&store, sub)?,
        Some(("ai", sub)) => commands::assistant::handle(&conn, &store, sub)?,
        Some(("config", sub)) => commands::settings::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
