// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    SETTING_KEYS, get_setting, pretty_table, required_arg, set_setting, setting_or_default,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = required_arg(sub, "key")?.trim();
            println!("{}", setting_or_default(conn, key)?);
        }
        Some(("set", sub)) => {
            let key = required_arg(sub, "key")?.trim();
            let value = required_arg(sub, "value")?.trim();
            if !SETTING_KEYS.iter().any(|(k, _)| *k == key) {
                return Err(anyhow!("Unknown setting '{}'", key));
            }
            if value.is_empty() {
                return Err(anyhow!("Setting '{}' cannot be empty", key));
            }
            set_setting(conn, key, value)?;
            tracing::info!(key, value, "setting changed");
            println!("{} set to {}", key, value);
        }
        Some(("list", _)) => {
            let mut rows = Vec::new();
            for (key, default) in SETTING_KEYS {
                let stored = get_setting(conn, key)?;
                let source = if stored.is_some() { "set" } else { "default" };
                rows.push(vec![
                    key.to_string(),
                    stored.unwrap_or_else(|| default.to_string()),
                    source.to_string(),
                ]);
            }
            println!("{}", pretty_table(&["Key", "Value", "Source"], rows));
        }
        _ => {}
    }
    Ok(())
}
