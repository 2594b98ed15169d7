// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod categories;
pub mod transactions;
pub mod installments;
pub mod budgets;
pub mod goals;
pub mod summary;
pub mod config;
pub mod doctor;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn opt_str(sub: &clap::ArgMatches, id: &str) -> Option<String> {
    sub.get_one::<String>(id)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub(crate) fn req_str(sub: &clap::ArgMatches, id: &str) -> Result<String> {
    opt_str(sub, id).with_context(|| format!("--{} is required", id))
}

pub(crate) fn parse_enum<T>(raw: &str) -> Result<T>
where
    T: std::str::FromStr<Err = crate::models::UnknownVariant>,
{
    Ok(raw.parse::<T>()?)
}
