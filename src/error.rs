// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy of the ledger engine and its client-facing rendering.

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed or out-of-range input, reported against a single request field.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A uniqueness rule would be broken, or a delete is blocked by referencing records.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidStateTransition(String),

    /// Never shown to clients verbatim; see [`LedgerError::to_response`].
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        LedgerError::NotFound { entity, id }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            LedgerError::Validation { .. } => 400,
            LedgerError::NotFound { .. } => 404,
            LedgerError::Conflict(_) => 409,
            LedgerError::InvalidStateTransition(_) => 422,
            LedgerError::Storage(_) => 500,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        self.to_response_at(Local::now().naive_local())
    }

    pub fn to_response_at(&self, timestamp: NaiveDateTime) -> ErrorResponse {
        let (error, message, fields) = match self {
            LedgerError::Validation { field, message } => (
                "Validation Error",
                "Invalid request fields".to_string(),
                Some(vec![FieldError {
                    field: field.clone(),
                    message: message.clone(),
                }]),
            ),
            LedgerError::NotFound { .. } => ("Not Found", self.to_string(), None),
            LedgerError::Conflict(msg) => ("Conflict", msg.clone(), None),
            LedgerError::InvalidStateTransition(msg) => ("Business Error", msg.clone(), None),
            LedgerError::Storage(_) => (
                "Internal Server Error",
                "An unexpected error occurred".to_string(),
                None,
            ),
        };
        ErrorResponse {
            status: self.status_code(),
            error: error.to_string(),
            message,
            timestamp: timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            fields,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub timestamp: String,
    pub fields: Option<Vec<FieldError>>,
}
