// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Status-like enums are stored in SQLite and exchanged with clients as the
/// same SCREAMING_SNAKE_CASE text.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant { kind: $kind, value: s.to_string() }),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: UnknownVariant| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum!(AccountType, "account type", {
    Checking => "CHECKING",
    Savings => "SAVINGS",
    Wallet => "WALLET",
    CreditCard => "CREDIT_CARD",
    Investment => "INVESTMENT",
});

text_enum!(CategoryType, "category type", {
    Income => "INCOME",
    Expense => "EXPENSE",
});

text_enum!(TransactionType, "transaction type", {
    Income => "INCOME",
    Expense => "EXPENSE",
    Transfer => "TRANSFER",
});

text_enum!(TransactionStatus, "transaction status", {
    Pending => "PENDING",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

text_enum!(InstallmentStatus, "installment status", {
    Pending => "PENDING",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

text_enum!(BudgetStatus, "budget status", {
    Active => "ACTIVE",
    Exceeded => "EXCEEDED",
    Completed => "COMPLETED",
});

text_enum!(GoalStatus, "goal status", {
    InProgress => "IN_PROGRESS",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub r#type: AccountType,
    #[serde(skip)]
    pub initial_balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub currency: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequest {
    pub name: String,
    pub r#type: AccountType,
    pub balance: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub r#type: CategoryType,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_default: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub name: String,
    pub r#type: CategoryType,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// A transaction joined with the display names of the records it references.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub account_name: String,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub destination_account_id: Option<i64>,
    pub destination_account_name: Option<String>,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub r#type: TransactionType,
    pub status: TransactionStatus,
    pub transaction_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub destination_account_id: Option<i64>,
    pub description: String,
    pub amount: Decimal,
    pub r#type: TransactionType,
    pub status: TransactionStatus,
    pub transaction_date: NaiveDate,
    pub notes: Option<String>,
}

impl From<&Transaction> for TransactionRequest {
    fn from(t: &Transaction) -> Self {
        TransactionRequest {
            account_id: t.account_id,
            category_id: t.category_id,
            destination_account_id: t.destination_account_id,
            description: t.description.clone(),
            amount: t.amount,
            r#type: t.r#type,
            status: t.status,
            transaction_date: t.transaction_date,
            notes: t.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: i64,
    pub group_id: i64,
    pub transaction_id: Option<i64>,
    pub installment_number: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentGroup {
    pub id: i64,
    pub account_id: i64,
    pub account_name: String,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub installment_count: u32,
    pub paid_count: u32,
    pub start_date: NaiveDate,
    pub notes: Option<String>,
    pub installments: Vec<Installment>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentRequest {
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub description: String,
    pub total_amount: Decimal,
    pub installment_count: u32,
    pub start_date: NaiveDate,
    pub notes: Option<String>,
}

/// Stored budget row. Spending figures are never persisted; see [`BudgetView`].
#[derive(Debug, Clone)]
pub struct Budget {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub category_color: Option<String>,
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRequest {
    pub category_id: i64,
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetView {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub category_color: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining: Decimal,
    pub percentage_used: f64,
    pub month: u32,
    pub year: i32,
    pub status: BudgetStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub target_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    pub status: GoalStatus,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRequest {
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Option<Decimal>,
    pub deadline: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalView {
    pub id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub target_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_amount: Decimal,
    pub percentage_completed: f64,
    pub deadline: Option<NaiveDate>,
    pub status: GoalStatus,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number: u64,
    pub size: u64,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: u64, number: u64, size: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size)
        };
        Page {
            content,
            total_elements,
            total_pages,
            number,
            size,
            first: number == 0,
            last: number.saturating_add(1) >= total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_loosely_and_print_canonically() {
        assert_eq!(
            "credit-card".parse::<AccountType>().unwrap(),
            AccountType::CreditCard
        );
        assert_eq!(GoalStatus::InProgress.to_string(), "IN_PROGRESS");
        assert!("refund".parse::<TransactionType>().is_err());
    }

    #[test]
    fn page_flags() {
        let p: Page<i32> = Page::new(vec![1, 2], 5, 2, 2);
        assert_eq!(p.total_pages, 3);
        assert!(!p.first);
        assert!(p.last);
        let empty: Page<i32> = Page::new(vec![], 0, 0, 20);
        assert!(empty.first && empty.last);
        let beyond: Page<i32> = Page::new(vec![], 3, u64::MAX, 20);
        assert!(beyond.last && !beyond.first);
    }
}
