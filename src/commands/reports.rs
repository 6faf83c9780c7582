// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::{
    CategoryTotal, Period, category_breakdown, filter_period, monthly_time_series, recent,
    summarize, top_categories,
};
use crate::commands::transactions::transactions_table;
use crate::models::Transaction;
use crate::store::TransactionStore;
use crate::trends::financial_trends;
use crate::utils::{fmt_money, fmt_trend, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;

pub fn handle<S: TransactionStore>(store: &S, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(store, sub)?,
        Some(("categories", sub)) => categories(store, sub)?,
        Some(("monthly", sub)) => monthly(store, sub)?,
        Some(("trends", sub)) => trends(store, sub)?,
        Some(("recent", sub)) => recent_transactions(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Store listing restricted to the `--period` window.
pub fn in_period<S: TransactionStore>(
    store: &S,
    sub: &clap::ArgMatches,
    today: NaiveDate,
) -> Result<Vec<Transaction>> {
    let period: Period = sub
        .get_one::<String>("period")
        .map(|p| p.parse::<Period>())
        .transpose()?
        .unwrap_or(Period::All);
    Ok(filter_period(&store.list()?, period, today))
}

fn summary<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let data = in_period(store, sub, today())?;
    let s = summarize(&data);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        let rows = vec![
            vec!["Income".to_string(), fmt_money(s.income)],
            vec!["Expenses".to_string(), fmt_money(s.expenses)],
            vec!["Balance".to_string(), fmt_money(s.balance)],
        ];
        println!("{}", pretty_table(&["Metric", "Amount"], rows));
    }
    Ok(())
}

fn categories<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let data = in_period(store, sub, today())?;
    let ranked = top_categories(
        &category_breakdown(&data),
        sub.get_one::<usize>("top").copied(),
    );
    let breakdown: Vec<&CategoryTotal> = ranked.iter().map(|(c, _)| c).collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &breakdown)? {
        if ranked.is_empty() {
            println!("No expense data available");
            return Ok(());
        }
        let rows = ranked
            .iter()
            .map(|(c, share)| {
                vec![c.name.clone(), fmt_money(c.amount), format!("{:.0}%", share)]
            })
            .collect();
        println!("{}", pretty_table(&["Category", "Spent", "Share"], rows));
    }
    Ok(())
}

fn monthly<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let series = monthly_time_series(&store.list()?);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &series)? {
        let rows = series
            .iter()
            .map(|p| {
                vec![
                    p.name.to_string(),
                    fmt_money(p.income),
                    fmt_money(p.expenses),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Income", "Expenses"], rows));
    }
    Ok(())
}

fn trends<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let now = match sub.get_one::<String>("as_of") {
        Some(d) => parse_date(d)?,
        None => today(),
    };
    let t = financial_trends(&store.list()?, now);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &t)? {
        let rows = [
            ("Income", t.income),
            ("Expenses", t.expenses),
            ("Balance", t.balance),
        ]
        .into_iter()
        .map(|(name, v)| vec![name.to_string(), fmt_money(v.value), fmt_trend(v.trend)])
        .collect();
        println!(
            "{}",
            pretty_table(&["Metric", "This month", "vs last month"], rows)
        );
    }
    Ok(())
}

fn recent_transactions<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let count = sub.get_one::<usize>("count").copied().unwrap_or(5);
    let all = store.list()?;
    let data = recent(&all, count);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        if data.is_empty() {
            println!("No transactions found");
        } else {
            println!("{}", transactions_table(data));
        }
    }
    Ok(())
}
