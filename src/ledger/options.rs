use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::transaction::Transaction;
use crate::normalize::normalize_str;

/// Distinct values available to the filter UI for one tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub kinds: Vec<String>,
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
    pub payment_methods: Vec<String>,
    pub years: Vec<i32>,
    /// "mm/yyyy", newest first
    pub months: Vec<String>,
}

/// Distinct non-empty values ordered by their normalized form. The first
/// spelling seen wins for each normalized value.
fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for v in values {
        let trimmed = v.trim();
        let norm = normalize_str(trimmed);
        if norm.is_empty() {
            continue;
        }
        seen.entry(norm).or_insert_with(|| trimmed.to_string());
    }
    seen.into_values().collect()
}

pub fn filter_options(transactions: &[Transaction]) -> FilterOptions {
    let mut years = BTreeSet::new();
    let mut months = BTreeSet::new();
    for d in transactions.iter().filter_map(|t| t.parsed_date) {
        years.insert(d.year());
        months.insert((d.year(), d.month()));
    }

    FilterOptions {
        kinds: distinct_sorted(transactions.iter().map(|t| t.kind.as_str())),
        categories: distinct_sorted(transactions.iter().map(|t| t.category.as_str())),
        subcategories: distinct_sorted(transactions.iter().map(|t| t.subcategory.as_str())),
        payment_methods: distinct_sorted(transactions.iter().map(|t| t.payment_method.as_str())),
        years: years.into_iter().rev().collect(),
        months: months
            .into_iter()
            .rev()
            .map(|(y, m)| format!("{:02}/{}", m, y))
            .collect(),
    }
}
