// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::TransactionStore;
use crate::utils::required_arg;
use anyhow::{Result, anyhow};

pub fn handle<S: TransactionStore>(store: &S, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(store, sub),
        _ => Ok(()),
    }
}

fn export_transactions<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = required_arg(sub, "format")?.trim().to_lowercase();
    let out = required_arg(sub, "out")?.trim();

    // Oldest first; the store hands them back most recent first.
    let mut rows = store.list()?;
    rows.reverse();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id",
                "date",
                "type",
                "category",
                "amount",
                "description",
                "merchant",
                "imported_from",
            ])?;
            for t in &rows {
                wtr.write_record([
                    t.id.clone(),
                    t.date.to_string(),
                    t.kind.to_string(),
                    t.category.clone(),
                    t.amount.to_string(),
                    t.description.clone().unwrap_or_default(),
                    t.merchant.clone().unwrap_or_default(),
                    t.imported_from.map(|s| s.to_string()).unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
        }
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    }
    println!("Exported {} transactions to {}", rows.len(), out);
    Ok(())
}
