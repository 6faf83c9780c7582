// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures raised by a [`crate::store::TransactionStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid amount {0}: must be a finite, non-negative number")]
    InvalidAmount(f64),

    #[error("Transaction '{0}' not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    /// Validation errors are raised before anything is written.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::InvalidAmount(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseValueError {
    #[error("Unknown transaction type '{0}', expected income|expense")]
    TransactionType(String),

    #[error("Unknown import source '{0}', expected manual|wechat|receipt|file")]
    ImportSource(String),

    #[error("Unknown period '{0}', expected week|month|quarter|year|all")]
    Period(String),
}
