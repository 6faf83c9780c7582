// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ParseValueError, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(ParseValueError::TransactionType(s.to_string())),
        }
    }
}

/// Where a transaction came from. Purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportSource {
    Manual,
    Wechat,
    Receipt,
    File,
}

impl ImportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Wechat => "wechat",
            Self::Receipt => "receipt",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportSource {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "wechat" => Ok(Self::Wechat),
            "receipt" => Ok(Self::Receipt),
            "file" => Ok(Self::File),
            _ => Err(ParseValueError::ImportSource(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_from: Option<ImportSource>,
}

/// Partial input for an insert. `kind`, `category` and `amount` are required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTransaction {
    pub id: Option<String>,
    pub date: Option<NaiveDate>,
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub merchant: Option<String>,
    pub imported_from: Option<ImportSource>,
}

impl NewTransaction {
    /// Validates the input and fills in the generated id and default date.
    pub fn into_transaction(self, today: NaiveDate) -> Result<Transaction, StoreError> {
        let kind = self.kind.ok_or(StoreError::MissingField("type"))?;
        let category = canonical_text(self.category).ok_or(StoreError::MissingField("category"))?;
        let amount = self.amount.ok_or(StoreError::MissingField("amount"))?;
        check_amount(amount)?;

        let id = canonical_text(self.id).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(Transaction {
            id,
            date: self.date.unwrap_or(today),
            kind,
            category,
            amount,
            description: canonical_text(self.description),
            merchant: canonical_text(self.merchant),
            imported_from: self.imported_from,
        })
    }
}

/// Field replacements for an update. Empty metadata strings clear the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub date: Option<NaiveDate>,
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub merchant: Option<String>,
    pub imported_from: Option<ImportSource>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, mut t: Transaction) -> Result<Transaction, StoreError> {
        if let Some(date) = self.date {
            t.date = date;
        }
        if let Some(kind) = self.kind {
            t.kind = kind;
        }
        if let Some(category) = self.category {
            t.category = canonical_text(Some(category)).ok_or(StoreError::MissingField("category"))?;
        }
        if let Some(amount) = self.amount {
            check_amount(amount)?;
            t.amount = amount;
        }
        if self.description.is_some() {
            t.description = canonical_text(self.description);
        }
        if self.merchant.is_some() {
            t.merchant = canonical_text(self.merchant);
        }
        if self.imported_from.is_some() {
            t.imported_from = self.imported_from;
        }
        Ok(t)
    }
}

fn check_amount(amount: f64) -> Result<(), StoreError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(StoreError::InvalidAmount(amount))
    }
}

/// Trims optional text; blank values collapse to `None`.
pub fn canonical_text(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
