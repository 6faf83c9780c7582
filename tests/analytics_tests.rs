// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::analytics::{
    MONTH_LABELS, Period, Summary, category_breakdown, category_share, filter_period,
    monthly_time_series, recent, summarize, top_categories,
};
use fintrack::models::{Transaction, TransactionType};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn tx(id: &str, date: NaiveDate, kind: TransactionType, category: &str, amount: f64) -> Transaction {
    Transaction {
        id: id.to_string(),
        date,
        kind,
        category: category.to_string(),
        amount,
        description: None,
        merchant: None,
        imported_from: None,
    }
}

fn sample() -> Vec<Transaction> {
    use TransactionType::*;
    vec![
        tx("1", d(2025, 3, 2), Income, "Salary", 3000.0),
        tx("2", d(2025, 3, 3), Expense, "Food & Dining", 42.5),
        tx("3", d(2025, 3, 4), Expense, "Housing", 1200.0),
        tx("4", d(2025, 2, 20), Expense, "Food & Dining", 17.5),
        tx("5", d(2024, 3, 9), Expense, "Shopping", 80.0),
        tx("6", d(2025, 1, 12), Income, "Investments", 150.25),
    ]
}

#[test]
fn summarize_empty_is_all_zero() {
    assert_eq!(
        summarize(&[]),
        Summary {
            income: 0.0,
            expenses: 0.0,
            balance: 0.0
        }
    );
}

#[test]
fn summarize_balance_is_income_minus_expenses() {
    let data = sample();
    let s = summarize(&data);
    assert_eq!(s.income, 3150.25);
    assert_eq!(s.expenses, 1340.0);
    assert_eq!(s.balance, s.income - s.expenses);

    let only_expenses = &data[1..4];
    let s = summarize(only_expenses);
    assert_eq!(s.income, 0.0);
    assert_eq!(s.balance, -s.expenses);
}

#[test]
fn breakdown_is_sorted_and_sums_to_expenses() {
    let data = sample();
    let breakdown = category_breakdown(&data);
    let names: Vec<&str> = breakdown.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Housing", "Shopping", "Food & Dining"]);
    assert_eq!(breakdown[2].amount, 60.0);

    assert!(breakdown.windows(2).all(|w| w[0].amount >= w[1].amount));
    let total: f64 = breakdown.iter().map(|c| c.amount).sum();
    assert_eq!(total, summarize(&data).expenses);
}

#[test]
fn breakdown_omits_income_and_is_case_sensitive() {
    use TransactionType::*;
    let data = vec![
        tx("1", d(2025, 1, 1), Expense, "food", 5.0),
        tx("2", d(2025, 1, 2), Expense, "Food", 7.0),
        tx("3", d(2025, 1, 3), Income, "Salary", 100.0),
    ];
    let breakdown = category_breakdown(&data);
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].name, "Food");
    assert_eq!(breakdown[1].name, "food");
    assert!(breakdown.iter().all(|c| c.name != "Salary"));
}

#[test]
fn breakdown_ties_keep_first_seen_order() {
    use TransactionType::*;
    let data = vec![
        tx("1", d(2025, 1, 1), Expense, "Travel", 10.0),
        tx("2", d(2025, 1, 2), Expense, "Gifts", 10.0),
        tx("3", d(2025, 1, 3), Expense, "Health", 10.0),
    ];
    let first: Vec<String> = category_breakdown(&data).into_iter().map(|c| c.name).collect();
    let second: Vec<String> = category_breakdown(&data).into_iter().map(|c| c.name).collect();
    assert_eq!(first, ["Travel", "Gifts", "Health"]);
    assert_eq!(first, second);
}

#[test]
fn monthly_series_has_twelve_calendar_buckets() {
    let series = monthly_time_series(&[]);
    let names: Vec<&str> = series.iter().map(|p| p.name).collect();
    assert_eq!(names, MONTH_LABELS);
    assert!(series.iter().all(|p| p.income == 0.0 && p.expenses == 0.0));
}

#[test]
fn monthly_series_ignores_year() {
    let data = sample();
    let series = monthly_time_series(&data);
    assert_eq!(series.len(), 12);

    let mar = &series[2];
    assert_eq!(mar.name, "Mar");
    assert_eq!(mar.income, 3000.0);
    // 2025 and 2024 March expenses share a bucket.
    assert_eq!(mar.expenses, 42.5 + 1200.0 + 80.0);

    assert_eq!(series[1].expenses, 17.5);
    assert_eq!(series[0].income, 150.25);
    for (i, p) in series.iter().enumerate() {
        if ![0, 1, 2].contains(&i) {
            assert_eq!((p.income, p.expenses), (0.0, 0.0), "bucket {}", p.name);
        }
    }
}

#[test]
fn recent_takes_a_prefix() {
    let data = sample();
    assert_eq!(recent(&data, 2).len(), 2);
    assert_eq!(recent(&data, 2)[0].id, "1");
    assert_eq!(recent(&data, 50).len(), data.len());
    assert!(recent(&[], 5).is_empty());
}

#[test]
fn period_starts() {
    // 2025-05-15 is a Thursday.
    let today = d(2025, 5, 15);
    assert_eq!(Period::Week.start(today), Some(d(2025, 5, 12)));
    assert_eq!(Period::Month.start(today), Some(d(2025, 5, 1)));
    assert_eq!(Period::Quarter.start(today), Some(d(2025, 4, 1)));
    assert_eq!(Period::Year.start(today), Some(d(2025, 1, 1)));
    assert_eq!(Period::All.start(today), None);
    assert_eq!(Period::Quarter.start(d(2025, 12, 31)), Some(d(2025, 10, 1)));
}

#[test]
fn filter_period_keeps_dates_on_or_after_start() {
    let data = sample();
    let march = filter_period(&data, Period::Month, d(2025, 3, 20));
    let ids: Vec<&str> = march.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3"]);

    assert_eq!(filter_period(&data, Period::Year, d(2025, 3, 20)).len(), 5);
    assert_eq!(filter_period(&data, Period::All, d(2025, 3, 20)).len(), 6);
}

#[test]
fn period_parses_from_cli_values() {
    assert_eq!("quarter".parse::<Period>().unwrap(), Period::Quarter);
    assert_eq!(" Week ".parse::<Period>().unwrap(), Period::Week);
    assert!("fortnight".parse::<Period>().is_err());
}

#[test]
fn category_share_is_percent_of_total() {
    let data = sample();
    let shares = category_share(&category_breakdown(&data));
    let total: f64 = shares.iter().map(|(_, s)| s).sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert_eq!(shares[0].0, "Housing");

    let zero = category_share(&[]);
    assert!(zero.is_empty());
}

#[test]
fn top_categories_share_all_expenses() {
    let data = vec![
        tx("1", d(2025, 1, 1), TransactionType::Expense, "A", 50.0),
        tx("2", d(2025, 1, 2), TransactionType::Expense, "B", 30.0),
        tx("3", d(2025, 1, 3), TransactionType::Expense, "C", 20.0),
    ];
    let breakdown = category_breakdown(&data);

    let top = top_categories(&breakdown, Some(2));
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].0.name, "A");
    assert!((top[0].1 - 50.0).abs() < 1e-9);
    assert_eq!(top[1].0.name, "B");
    assert!((top[1].1 - 30.0).abs() < 1e-9);

    assert_eq!(top_categories(&breakdown, None).len(), 3);
    assert!(top_categories(&breakdown, Some(0)).is_empty());
}
