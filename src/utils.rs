// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};

use crate::ai::{AiSettings, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_VISION_MODEL};

const UA: &str = concat!("fintrack/", env!("CARGO_PKG_VERSION"));

/// Settings keys recognised by `config set`, with their defaults.
pub const SETTING_KEYS: [(&str, &str); 3] = [
    ("ai.base_url", DEFAULT_BASE_URL),
    ("ai.chat_model", DEFAULT_CHAT_MODEL),
    ("ai.vision_model", DEFAULT_VISION_MODEL),
];

pub fn http_client() -> Result<reqwest::blocking::Client> {
    // Vision requests carry the whole image; allow more than a plain chat turn.
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(90))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(s.to_string())
}

pub fn parse_amount(s: &str) -> Result<f64> {
    let v = s
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid amount '{}'", s))?;
    if !v.is_finite() || v < 0.0 {
        return Err(anyhow!("Invalid amount '{}': must be non-negative", s));
    }
    Ok(v)
}

pub fn fmt_money(v: f64) -> String {
    format!("{:.2}", v)
}

pub fn fmt_trend(t: i64) -> String {
    format!("{:+}%", t)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn setting_or_default(conn: &Connection, key: &str) -> Result<String> {
    let default = SETTING_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, d)| *d)
        .ok_or_else(|| anyhow!("Unknown setting '{}'", key))?;
    Ok(get_setting(conn, key)?.unwrap_or_else(|| default.to_string()))
}

/// AI client settings: stored overrides on top of the built-in defaults.
pub fn ai_settings(conn: &Connection) -> Result<AiSettings> {
    Ok(AiSettings {
        base_url: setting_or_default(conn, "ai.base_url")?,
        chat_model: setting_or_default(conn, "ai.chat_model")?,
        vision_model: setting_or_default(conn, "ai.vision_model")?,
        ..AiSettings::default()
    })
}

/// A string argument clap guarantees to be present.
pub fn required_arg<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing argument '{}'", name))
}
