use chrono::NaiveDate;

use super::types::FilterSpec;
use crate::ledger::Transaction;
use crate::normalize::{normalize_str, parse_flexible_date_str};

/// A filter spec with its bounds parsed and its text normalized once, ready
/// to be tested against every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterWhere {
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    kind: Option<String>,
    category: Option<String>,
    subcategory: Option<String>,
    payment_method: Option<String>,
    installment: Option<bool>,
    status: Option<bool>,
}

fn normalized(v: &Option<String>) -> Option<String> {
    v.as_deref().map(normalize_str).filter(|s| !s.is_empty())
}

fn tri_state(v: &Option<String>, yes: &[&str], no: &[&str]) -> Option<bool> {
    let n = normalized(v)?;
    if yes.contains(&n.as_str()) {
        Some(true)
    } else if no.contains(&n.as_str()) {
        Some(false)
    } else {
        None
    }
}

fn contains(haystack: &str, needle: &Option<String>) -> bool {
    match needle {
        Some(n) => normalize_str(haystack).contains(n.as_str()),
        None => true,
    }
}

impl FilterWhere {
    /// Unparseable date bounds and unknown tri-state tokens are ignored.
    pub fn from_spec(spec: &FilterSpec) -> Self {
        Self {
            date_from: spec.date_from.as_deref().and_then(parse_flexible_date_str),
            date_to: spec.date_to.as_deref().and_then(parse_flexible_date_str),
            kind: normalized(&spec.kind),
            category: normalized(&spec.category),
            subcategory: normalized(&spec.subcategory),
            payment_method: normalized(&spec.payment_method),
            installment: tri_state(&spec.installment, &["yes", "sim", "true"], &["no", "nao", "false"]),
            status: tri_state(&spec.status, &["true", "yes", "sim"], &["false", "no", "nao"]),
        }
    }

    pub fn has_date_bounds(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        // Dates are calendar days, so "on or before dateTo" is the end-of-day bound.
        if let Some(from) = self.date_from {
            match t.parsed_date {
                Some(d) if d >= from => {}
                _ => return false,
            }
        }
        if let Some(to) = self.date_to {
            match t.parsed_date {
                Some(d) if d <= to => {}
                _ => return false,
            }
        }

        if let Some(kind) = &self.kind {
            if &normalize_str(&t.kind) != kind {
                return false;
            }
        }
        if !contains(&t.category, &self.category)
            || !contains(&t.subcategory, &self.subcategory)
            || !contains(&t.payment_method, &self.payment_method)
        {
            return false;
        }

        if matches!(self.installment, Some(want) if want != t.installment) {
            return false;
        }
        if matches!(self.status, Some(want) if want != t.status) {
            return false;
        }
        true
    }
}
