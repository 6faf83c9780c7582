// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ai::{AiClient, AiError, ChatRequest, ReceiptData, ScanRequest};
use crate::models::{ImportSource, NewTransaction, TransactionType};
use crate::store::TransactionStore;
use crate::utils::{ai_settings, fmt_money, http_client, pretty_table, required_arg};
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use rusqlite::Connection;

pub fn handle<S: TransactionStore>(
    conn: &Connection,
    store: &S,
    m: &clap::ArgMatches,
) -> Result<()> {
    match m.subcommand() {
        Some(("ask", sub)) => ask(conn, store, sub)?,
        Some(("scan", sub)) => scan(conn, store, sub)?,
        _ => {}
    }
    Ok(())
}

fn client(conn: &Connection) -> Result<AiClient> {
    Ok(AiClient::new(http_client()?, ai_settings(conn)?)?)
}

/// Prints the `{"error": ..}` envelope for `--json`, then fails the command.
fn report_failure(json_flag: bool, err: AiError) -> Result<()> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(&err.to_body())?);
    }
    let status = err.status_code();
    Err(anyhow::Error::new(err).context(format!("AI request failed (status {})", status)))
}

fn ask<S: TransactionStore>(conn: &Connection, store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let req = ChatRequest {
        message: required_arg(sub, "message")?.to_string(),
        transactions: store.list()?,
    };
    match client(conn)?.chat(&req) {
        Ok(reply) => {
            if json_flag {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                println!("{}", reply.response);
            }
            Ok(())
        }
        Err(err) => report_failure(json_flag, err),
    }
}

fn scan<S: TransactionStore>(conn: &Connection, store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let path = required_arg(sub, "image")?.trim();
    let bytes = std::fs::read(path).with_context(|| format!("Read image {}", path))?;
    let req = ScanRequest {
        image_base64: STANDARD.encode(bytes),
    };
    let reply = match client(conn)?.scan_receipt(&req) {
        Ok(reply) => reply,
        Err(err) => return report_failure(json_flag, err),
    };

    if json_flag {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        let d = &reply.data;
        let rows = vec![
            vec!["Merchant".to_string(), d.merchant.clone().unwrap_or_default()],
            vec![
                "Amount".to_string(),
                d.amount.map(fmt_money).unwrap_or_default(),
            ],
            vec!["Date".to_string(), d.date.clone().unwrap_or_default()],
            vec!["Category".to_string(), d.category.clone().unwrap_or_default()],
            vec!["Items".to_string(), d.items.join(", ")],
        ];
        println!("{}", pretty_table(&["Field", "Value"], rows));
    }

    if sub.get_flag("save") {
        let t = store
            .insert(receipt_to_expense(&reply.data))
            .context("Could not record receipt")?;
        println!("Recorded expense {} (id: {})", fmt_money(t.amount), t.id);
    }
    Ok(())
}

/// Expense draft from a scanned receipt. Unreadable dates fall back to today.
pub fn receipt_to_expense(d: &ReceiptData) -> NewTransaction {
    let date = d
        .date
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
    NewTransaction {
        date,
        kind: Some(TransactionType::Expense),
        category: Some(
            d.category
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "Other".to_string()),
        ),
        amount: d.amount,
        description: (!d.items.is_empty()).then(|| d.items.join(", ")),
        merchant: d.merchant.clone(),
        imported_from: Some(ImportSource::Receipt),
        ..NewTransaction::default()
    }
}
