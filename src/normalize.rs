//! Total parsing helpers for spreadsheet-style cell values.
//!
//! Every function here accepts whatever a tenant table happens to hold in a
//! cell and never fails: unparseable money is zero, unknown booleans are
//! false and unknown dates are `None`.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

const TRUTHY: &[&str] = &["sim", "true", "1", "yes"];

/// Render a cell as plain text. Null becomes the empty string.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Lower-cased, accent-stripped, trimmed form used for every comparison.
pub fn normalize_text(v: &Value) -> String {
    normalize_str(&cell_text(v))
}

pub fn normalize_str(s: &str) -> String {
    // lowercase before decomposing so marks produced by case mapping are stripped too
    s.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse a currency amount written either as a number or as Brazilian-style
/// text (`"R$ 1.234,56"`). Invalid input yields zero.
pub fn parse_money(v: &Value) -> Decimal {
    match v {
        Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .unwrap_or(Decimal::ZERO)
        }
        Value::String(s) => parse_money_str(s),
        _ => Decimal::ZERO,
    }
}

pub fn parse_money_str(s: &str) -> Decimal {
    let kept: String = s
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if kept.is_empty() {
        return Decimal::ZERO;
    }

    let canonical = if kept.contains(',') {
        kept.replace('.', "").replace(',', ".")
    } else if kept.matches('.').count() > 1 {
        kept.replace('.', "")
    } else {
        // a lone '.' with no ',' is a decimal point: "1234.56"
        kept
    };

    Decimal::from_str(&canonical).unwrap_or(Decimal::ZERO)
}

pub fn parse_bool_like(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        other => TRUTHY.contains(&normalize_text(other).as_str()),
    }
}

/// Accepts `dd/mm/yyyy` or anything starting with `yyyy-mm-dd`.
pub fn parse_flexible_date(v: &Value) -> Option<NaiveDate> {
    match v {
        Value::String(s) => parse_flexible_date_str(s),
        _ => None,
    }
}

pub fn parse_flexible_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if s.contains('/') {
        let head = s.split_whitespace().next()?;
        let mut parts = head.split('/');
        let day = parts.next()?.parse::<u32>().ok()?;
        let month = parts.next()?.parse::<u32>().ok()?;
        let year = parts.next()?.parse::<i32>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let prefix = s.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

pub fn format_date_display(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default()
}
