// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{ImportSource, NewTransaction, Transaction, TransactionPatch, TransactionType};
use crate::store::{TransactionStore, clear_all};
use crate::utils::{
    fmt_money, maybe_print_json, parse_amount, parse_date, parse_month, pretty_table,
    required_arg,
};
use anyhow::{Context, Result, anyhow};

pub fn handle<S: TransactionStore>(store: &S, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => edit(store, sub)?,
        Some(("rm", sub)) => remove(store, sub)?,
        Some(("clear", sub)) => clear(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn opt_string(sub: &clap::ArgMatches, name: &str) -> Option<String> {
    sub.get_one::<String>(name).map(|s| s.to_string())
}

fn opt_parsed<T, E>(sub: &clap::ArgMatches, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = E>,
    E: std::error::Error + Send + Sync + 'static,
{
    sub.get_one::<String>(name)
        .map(|s| s.parse::<T>().map_err(anyhow::Error::from))
        .transpose()
}

pub fn new_from_args(sub: &clap::ArgMatches) -> Result<NewTransaction> {
    Ok(NewTransaction {
        id: None,
        date: sub.get_one::<String>("date").map(|s| parse_date(s)).transpose()?,
        kind: opt_parsed::<TransactionType, _>(sub, "type")?,
        category: opt_string(sub, "category"),
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_amount(s))
            .transpose()?,
        description: opt_string(sub, "description"),
        merchant: opt_string(sub, "merchant"),
        imported_from: Some(
            opt_parsed::<ImportSource, _>(sub, "source")?.unwrap_or(ImportSource::Manual),
        ),
    })
}

fn add<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let t = store
        .insert(new_from_args(sub)?)
        .context("Could not record transaction")?;
    println!(
        "Recorded {} {} on {} in '{}' (id: {})",
        t.kind,
        fmt_money(t.amount),
        t.date,
        t.category,
        t.id
    );
    Ok(())
}

fn edit<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let id = required_arg(sub, "id")?.trim();
    let new = new_from_args(sub)?;
    let patch = TransactionPatch {
        date: new.date,
        kind: new.kind,
        category: new.category,
        amount: new.amount,
        description: new.description,
        merchant: new.merchant,
        imported_from: opt_parsed::<ImportSource, _>(sub, "source")?,
    };
    if patch.is_empty() {
        return Err(anyhow!("Nothing to update for transaction '{}'", id));
    }
    let t = store
        .update(id, patch)
        .with_context(|| format!("Could not update transaction '{}'", id))?;
    println!(
        "Updated {}: {} {} on {} in '{}'",
        t.id,
        t.kind,
        fmt_money(t.amount),
        t.date,
        t.category
    );
    Ok(())
}

fn remove<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let id = required_arg(sub, "id")?.trim();
    store
        .delete(id)
        .with_context(|| format!("Could not delete transaction '{}'", id))?;
    println!("Removed transaction {}", id);
    Ok(())
}

fn clear<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    if !sub.get_flag("yes") {
        println!("Refusing to delete every transaction without --yes");
        return Ok(());
    }
    let report = clear_all(store).context("Could not list transactions")?;
    println!("Deleted {} transactions", report.deleted);
    if report.vanished > 0 {
        println!("{} were already gone", report.vanished);
    }
    if !report.failed.is_empty() {
        for (id, err) in &report.failed {
            eprintln!("  {}: {}", id, err);
        }
        return Err(anyhow!(
            "{} transaction(s) could not be deleted",
            report.failed.len()
        ));
    }
    Ok(())
}

fn list<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(store, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", transactions_table(&data));
    }
    Ok(())
}

pub fn transactions_table(data: &[Transaction]) -> comfy_table::Table {
    let rows: Vec<Vec<String>> = data
        .iter()
        .map(|t| {
            let signed = match t.kind {
                TransactionType::Income => format!("+{}", fmt_money(t.amount)),
                TransactionType::Expense => format!("-{}", fmt_money(t.amount)),
            };
            vec![
                t.date.to_string(),
                t.category.clone(),
                signed,
                t.merchant.clone().unwrap_or_default(),
                t.description.clone().unwrap_or_default(),
                t.id.clone(),
            ]
        })
        .collect();
    pretty_table(
        &["Date", "Category", "Amount", "Merchant", "Description", "ID"],
        rows,
    )
}

/// Store listing narrowed by the `list` filters, keeping the store's order.
pub fn query_rows<S: TransactionStore>(
    store: &S,
    sub: &clap::ArgMatches,
) -> Result<Vec<Transaction>> {
    let month = sub
        .get_one::<String>("month")
        .map(|m| parse_month(m))
        .transpose()?;
    let category = sub.get_one::<String>("category");
    let kind = opt_parsed::<TransactionType, _>(sub, "type")?;

    let mut data: Vec<Transaction> = store
        .list()?
        .into_iter()
        .filter(|t| {
            month
                .as_ref()
                .is_none_or(|m| t.date.format("%Y-%m").to_string() == *m)
        })
        .filter(|t| category.is_none_or(|c| &t.category == c))
        .filter(|t| kind.is_none_or(|k| t.kind == k))
        .collect();
    if let Some(limit) = sub.get_one::<usize>("limit") {
        data.truncate(*limit);
    }
    Ok(data)
}
