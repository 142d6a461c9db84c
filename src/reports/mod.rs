//! Aggregate reports across reservations in a date range.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{Error, Result};

pub mod program_list;
pub mod year_month;

pub use program_list::{ProgramList, ProgramListEntry, program_list};
pub use year_month::{YearMonthResult, year_month_result};

/// Running arithmetic mean; empty means `None`, never a division by zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| round2(self.sum / self.count as f64))
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of one questionnaire scale.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleResult {
    pub key: String,
    pub label: String,
    pub mean: Option<f64>,
    pub responses: usize,
}

/// Pre/post comparison for one scale or HRV metric.
#[derive(Debug, Clone, Serialize)]
pub struct PrePost {
    pub key: String,
    pub label: String,
    pub pre: Option<f64>,
    pub post: Option<f64>,
    pub difference: Option<f64>,
    pub pre_count: usize,
    pub post_count: usize,
}

impl PrePost {
    pub fn new(key: &str, label: &str, pre: Mean, post: Mean) -> Self {
        let difference = match (pre.value(), post.value()) {
            (Some(a), Some(b)) => Some(round2(b - a)),
            _ => None,
        };
        PrePost {
            key: key.to_string(),
            label: label.to_string(),
            pre: pre.value(),
            post: post.value(),
            difference,
            pre_count: pre.count(),
            post_count: post.count(),
        }
    }
}

/// Reject inverted ranges before running any query.
pub fn check_range(from: NaiveDate, to: NaiveDate) -> Result<()> {
    if to < from {
        return Err(Error::validation(format!(
            "report range ends ({to}) before it starts ({from})"
        )));
    }
    Ok(())
}

/// Fill in a missing end of a report range. A lone `from` runs to the end
/// of its own year and a lone `to` starts on January 1 of its year; with
/// neither, the range is the calendar year containing `today`.
pub fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let jan1 = |year| NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
    let dec31 = |year| NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX);
    match (from, to) {
        (Some(from), Some(to)) => (from, to),
        (Some(from), None) => (from, dec31(from.year())),
        (None, Some(to)) => (jan1(to.year()), to),
        (None, None) => (jan1(today.year()), dec31(today.year())),
    }
}

/// Every `YYYY-MM` month touched by `[from, to]`, in order.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> Vec<String> {
    let mut months = Vec::new();
    let (mut year, mut month) = (from.year(), from.month());
    while (year, month) <= (to.year(), to.month()) {
        months.push(format!("{year:04}-{month:02}"));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

/// Format an optional mean for tables and CSV cells.
pub fn fmt_mean(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

/// Whole currency units with thousands separators.
pub fn fmt_money(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
