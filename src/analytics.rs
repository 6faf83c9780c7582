// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure aggregations over transaction lists: totals, category rollups and
//! month-bucketed series.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::error::ParseValueError;
use crate::models::{Transaction, TransactionType};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub name: &'static str,
    pub income: f64,
    pub expenses: f64,
}

pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut s = Summary::default();
    for t in transactions {
        match t.kind {
            TransactionType::Income => s.income += t.amount,
            TransactionType::Expense => s.expenses += t.amount,
        }
    }
    s.balance = s.income - s.expenses;
    s
}

/// Expense totals per category, largest first. Ties keep first-seen order.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for t in transactions
        .iter()
        .filter(|t| t.kind == TransactionType::Expense)
    {
        match index.get(t.category.as_str()) {
            Some(&i) => totals[i].amount += t.amount,
            None => {
                index.insert(&t.category, totals.len());
                totals.push(CategoryTotal {
                    name: t.category.clone(),
                    amount: t.amount,
                });
            }
        }
    }
    totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    totals
}

/// Percentage share of each category in the breakdown's total.
pub fn category_share(breakdown: &[CategoryTotal]) -> Vec<(String, f64)> {
    let total: f64 = breakdown.iter().map(|c| c.amount).sum();
    breakdown
        .iter()
        .map(|c| {
            let share = if total > 0.0 {
                c.amount / total * 100.0
            } else {
                0.0
            };
            (c.name.clone(), share)
        })
        .collect()
}

/// Largest `top` categories with their share of all expenses, not just of the
/// ones kept.
pub fn top_categories(
    breakdown: &[CategoryTotal],
    top: Option<usize>,
) -> Vec<(CategoryTotal, f64)> {
    let shares = category_share(breakdown);
    let keep = top.unwrap_or(breakdown.len());
    breakdown
        .iter()
        .cloned()
        .zip(shares.into_iter().map(|(_, share)| share))
        .take(keep)
        .collect()
}

/// Twelve calendar-month buckets, Jan to Dec. The year is ignored, so every
/// March lands in the same "Mar" bucket.
pub fn monthly_time_series(transactions: &[Transaction]) -> Vec<MonthlyPoint> {
    let mut buckets: Vec<MonthlyPoint> = MONTH_LABELS
        .iter()
        .map(|&name| MonthlyPoint {
            name,
            income: 0.0,
            expenses: 0.0,
        })
        .collect();
    for t in transactions {
        let bucket = &mut buckets[t.date.month0() as usize];
        match t.kind {
            TransactionType::Income => bucket.income += t.amount,
            TransactionType::Expense => bucket.expenses += t.amount,
        }
    }
    buckets
}

/// First `n` items; callers pass a list already ordered most recent first.
pub fn recent(transactions: &[Transaction], n: usize) -> &[Transaction] {
    &transactions[..n.min(transactions.len())]
}

/// Reporting window ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    Quarter,
    Year,
    All,
}

impl Period {
    /// First day included in the period, `None` for all time.
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Week => {
                Some(today - Duration::days(today.weekday().num_days_from_monday() as i64))
            }
            Self::Month => today.with_day(1),
            Self::Quarter => {
                let first_month = today.month0() / 3 * 3 + 1;
                NaiveDate::from_ymd_opt(today.year(), first_month, 1)
            }
            Self::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            Self::All => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::All => "all",
        };
        f.write_str(s)
    }
}

impl FromStr for Period {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            _ => Err(ParseValueError::Period(s.to_string())),
        }
    }
}

pub fn filter_period(
    transactions: &[Transaction],
    period: Period,
    today: NaiveDate,
) -> Vec<Transaction> {
    match period.start(today) {
        Some(start) => transactions
            .iter()
            .filter(|t| t.date >= start)
            .cloned()
            .collect(),
        None => transactions.to_vec(),
    }
}
