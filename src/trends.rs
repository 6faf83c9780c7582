// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Month-over-month trends.
//!
//! Every trend is oriented so that a positive value means "better": more
//! income, less spending, a higher balance.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::analytics::{Summary, summarize};
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendValue {
    pub value: f64,
    pub trend: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinancialTrends {
    pub income: TrendValue,
    pub expenses: TrendValue,
    pub balance: TrendValue,
}

/// Rounded percentage change from `previous` to `current`.
///
/// Exact halves round up (toward positive infinity), so `-2.5` becomes `-2`.
pub fn percent_change(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return if current > 0.0 { 100 } else { 0 };
    }
    ((current - previous) / previous * 100.0 + 0.5).floor() as i64
}

fn balance_trend(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return if current >= 0.0 { 100 } else { -100 };
    }
    let crossed = (previous < 0.0 && current >= 0.0) || (previous > 0.0 && current <= 0.0);
    if crossed {
        let magnitude = percent_change(current.abs(), previous.abs()).abs();
        if previous < current {
            magnitude
        } else {
            -magnitude
        }
    } else {
        percent_change(current, previous)
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Compares the month containing `now` with the month before it.
pub fn financial_trends(transactions: &[Transaction], now: NaiveDate) -> FinancialTrends {
    let current_start = month_start(now);
    let previous_start = current_start
        .checked_sub_months(Months::new(1))
        .unwrap_or(current_start);

    let (current, previous): (Vec<Transaction>, Vec<Transaction>) = transactions
        .iter()
        .filter(|t| t.date >= previous_start)
        .cloned()
        .partition(|t| t.date >= current_start);
    let cur: Summary = summarize(&current);
    let prev: Summary = summarize(&previous);

    FinancialTrends {
        income: TrendValue {
            value: cur.income,
            trend: percent_change(cur.income, prev.income),
        },
        expenses: TrendValue {
            value: cur.expenses,
            trend: -percent_change(cur.expenses, prev.expenses),
        },
        balance: TrendValue {
            value: cur.balance,
            trend: balance_trend(cur.balance, prev.balance),
        },
    }
}
