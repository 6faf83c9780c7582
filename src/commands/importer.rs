// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ai::parse_amount_text;
use crate::models::{ImportSource, NewTransaction, TransactionType};
use crate::store::TransactionStore;
use crate::utils::{parse_amount, parse_date, required_arg};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;

pub fn handle<S: TransactionStore>(store: &S, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => import_transactions(store, sub),
        _ => Ok(()),
    }
}

fn import_transactions<S: TransactionStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let path = required_arg(sub, "path")?.trim();
    let source = sub
        .get_one::<String>("source")
        .map(String::as_str)
        .unwrap_or("generic");
    let file = File::open(path).with_context(|| format!("Open CSV {}", path))?;

    let batch = match source {
        "wechat" => parse_wechat(file),
        _ => parse_generic(file),
    }
    .with_context(|| format!("Read {} export {}", source, path))?;

    let imported = store
        .insert_many(batch)
        .with_context(|| format!("Import from {} failed; nothing was written", path))?;
    println!("Imported {} transactions from {}", imported.len(), path);
    Ok(())
}

#[derive(Debug, Deserialize)]
struct GenericRow {
    #[serde(default)]
    date: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    merchant: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Reads `date,type,category,amount,description,merchant` rows.
///
/// Missing required values are left empty so the store rejects the whole batch.
pub fn parse_generic<R: Read>(input: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let mut out = Vec::new();
    for (i, result) in rdr.deserialize::<GenericRow>().enumerate() {
        let line = i + 2;
        let row = result.with_context(|| format!("Malformed row on line {}", line))?;
        let date = non_blank(row.date)
            .map(|d| parse_date(&d))
            .transpose()
            .with_context(|| format!("Line {}", line))?;
        let kind = non_blank(row.kind)
            .map(|k| k.parse::<TransactionType>())
            .transpose()
            .with_context(|| format!("Line {}", line))?;
        let amount = non_blank(row.amount)
            .map(|a| parse_amount(&a))
            .transpose()
            .with_context(|| format!("Line {}", line))?;
        out.push(NewTransaction {
            date,
            kind,
            category: row.category,
            amount,
            description: row.description,
            merchant: row.merchant,
            imported_from: Some(ImportSource::File),
            ..NewTransaction::default()
        });
    }
    Ok(out)
}

const WECHAT_TIME: &str = "交易时间";
const WECHAT_KIND: &str = "交易类型";
const WECHAT_COUNTERPARTY: &str = "交易对方";
const WECHAT_GOODS: &str = "商品";
const WECHAT_DIRECTION: &str = "收/支";
const WECHAT_AMOUNT: &str = "金额(元)";

fn wechat_value(s: &str) -> Option<String> {
    let v = s.trim();
    if v.is_empty() || v == "/" {
        None
    } else {
        Some(v.to_string())
    }
}

/// Reads a WeChat Pay bill export.
///
/// The export opens with a free-form summary block; rows start after the line
/// whose first cell is `交易时间`. Neutral rows (`收/支` = `/`) are skipped.
pub fn parse_wechat<R: Read>(input: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut columns: Option<HashMap<String, usize>> = None;
    let mut out = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let line = i + 1;
        let Some(cols) = columns.as_ref() else {
            let first = rec.get(0).unwrap_or("").trim().trim_start_matches('\u{feff}');
            if first == WECHAT_TIME {
                columns = Some(
                    rec.iter()
                        .enumerate()
                        .map(|(idx, h)| (h.trim().to_string(), idx))
                        .collect(),
                );
            }
            continue;
        };
        let cell = |name: &str| -> Option<String> {
            cols.get(name)
                .and_then(|&idx| rec.get(idx))
                .and_then(wechat_value)
        };

        let kind = match cell(WECHAT_DIRECTION).as_deref() {
            Some("收入") => TransactionType::Income,
            Some("支出") => TransactionType::Expense,
            other => {
                tracing::warn!(line, direction = ?other, "skipping neutral WeChat row");
                continue;
            }
        };
        let time = cell(WECHAT_TIME).ok_or_else(|| anyhow!("Line {}: missing {}", line, WECHAT_TIME))?;
        let date = parse_date(time.get(..10).unwrap_or(time.as_str()))
            .with_context(|| format!("Line {}", line))?;
        let amount_raw =
            cell(WECHAT_AMOUNT).ok_or_else(|| anyhow!("Line {}: missing {}", line, WECHAT_AMOUNT))?;
        let amount = parse_amount_text(&amount_raw)
            .map(f64::abs)
            .ok_or_else(|| anyhow!("Line {}: invalid amount '{}'", line, amount_raw))?;

        out.push(NewTransaction {
            date: Some(date),
            kind: Some(kind),
            category: cell(WECHAT_KIND),
            amount: Some(amount),
            description: cell(WECHAT_GOODS),
            merchant: cell(WECHAT_COUNTERPARTY),
            imported_from: Some(ImportSource::Wechat),
            ..NewTransaction::default()
        });
    }
    if columns.is_none() {
        return Err(anyhow!(
            "Not a WeChat Pay export: no '{}' header row found",
            WECHAT_TIME
        ));
    }
    Ok(out)
}
