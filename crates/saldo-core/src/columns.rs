//! Column role inference
//!
//! Statements name their columns freely ("Data Lançamento", "release_date",
//! "Valor (R$)", "Histórico"...). Roles are assigned by name tokens first
//! and by content when names are not conclusive.

use chrono::NaiveDate;
use tracing::debug;

use crate::amount::looks_numeric;
use crate::error::{Error, Result};
use crate::frame::RawFrame;

const DATE_TOKENS: &[&str] = &["data", "date", "dt", "release_date"];
const VALUE_TOKENS: &[&str] = &["valor", "value", "amount", "montante", "net_amount"];
const DESCRIPTION_TOKENS: &[&str] = &[
    "desc",
    "hist",
    "memo",
    "estabelecimento",
    "type",
    "transaction",
    "tipo",
];

/// Values sampled per column when testing for dates
const DATE_SAMPLE: usize = 20;

/// Share of sampled values that must parse as dates
const DATE_MIN_RATIO: f64 = 0.8;

/// Day-first formats. Two-digit years go first since `%Y` would also
/// accept `24` as the year 24.
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%y", // 15/01/24
    "%d/%m/%Y", // 15/01/2024
    "%d-%m-%Y", // 15-01-2024
    "%d.%m.%Y", // 15.01.2024
    "%Y-%m-%d", // 2024-01-15
    "%Y/%m/%d", // 2024/01/15
];

/// Month-first formats, used only when no day-first reading exists
const MONTH_FIRST_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y"];

/// Parse a statement date, preferring day-first readings.
///
/// A trailing time component (`T10:00:00`, ` 10:00`) is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);

    DAY_FIRST_FORMATS
        .iter()
        .chain(MONTH_FIRST_FORMATS)
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Column indices for each role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRoles {
    pub date: usize,
    pub value: usize,
    /// None when the statement has no description column
    pub description: Option<usize>,
}

/// Assign date, value and description columns
pub fn infer_roles(frame: &RawFrame) -> Result<ColumnRoles> {
    let date = find_date_column(frame).ok_or(Error::NoDateColumn)?;
    let value = find_value_column(frame, date).ok_or(Error::NoValueColumn)?;
    let description = find_description_column(frame);

    debug!(
        "Columns: date={:?} value={:?} description={:?}",
        frame.columns[date],
        frame.columns[value],
        description.map(|i| frame.columns[i].as_str())
    );

    Ok(ColumnRoles {
        date,
        value,
        description,
    })
}

fn name_has_token(name: &str, tokens: &[&str]) -> bool {
    let lower = name.to_lowercase();
    tokens.iter().any(|t| lower.contains(t))
}

fn mostly_dates(frame: &RawFrame, index: usize) -> bool {
    let sample: Vec<&str> = frame.column(index).take(DATE_SAMPLE).collect();
    if sample.is_empty() {
        return false;
    }
    let parsed = sample.iter().filter(|v| parse_date(v).is_some()).count();
    parsed as f64 / sample.len() as f64 > DATE_MIN_RATIO
}

fn find_date_column(frame: &RawFrame) -> Option<usize> {
    let named = (0..frame.columns.len())
        .filter(|&i| name_has_token(&frame.columns[i], DATE_TOKENS))
        .find(|&i| mostly_dates(frame, i));

    named.or_else(|| (0..frame.columns.len()).find(|&i| mostly_dates(frame, i)))
}

fn find_value_column(frame: &RawFrame, date: usize) -> Option<usize> {
    let named = (0..frame.columns.len())
        .filter(|&i| i != date)
        .find(|&i| name_has_token(&frame.columns[i], VALUE_TOKENS));

    named.or_else(|| {
        (0..frame.columns.len()).filter(|&i| i != date).find(|&i| {
            let mut values = frame.column(i).filter(|v| !v.is_empty()).peekable();
            values.peek().is_some() && values.all(looks_numeric)
        })
    })
}

fn find_description_column(frame: &RawFrame) -> Option<usize> {
    (0..frame.columns.len()).find(|&i| name_has_token(&frame.columns[i], DESCRIPTION_TOKENS))
}
