//! Totals and category breakdowns over a filtered transaction set.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::filter::{filter_and_sort, FilterSpec};
use crate::ledger::Transaction;
use crate::store::Row;

pub const TOP_CATEGORIES: usize = 5;

/// Category label used when a record has none
pub const EMPTY_CATEGORY: &str = "—";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    /// Net signed value: income positive, expenses negative
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResult {
    pub timestamp: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub entradas: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub saidas: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub saldo: Decimal,
    pub top_categorias: Vec<CategoryTotal>,
    pub sample: usize,
}

/// Metrics over the full filtered set; pagination in `spec` is ignored.
pub fn compute_metrics(rows: &[Row], spec: &FilterSpec) -> MetricsResult {
    aggregate(&filter_and_sort(rows, spec))
}

/// Sums saturate at `Decimal::MAX` / `Decimal::MIN` instead of overflowing.
pub fn aggregate(transactions: &[Transaction]) -> MetricsResult {
    let mut entradas = Decimal::ZERO;
    let mut saidas = Decimal::ZERO;
    // insertion-ordered so equal magnitudes keep first-seen order after the stable sort
    let mut nets: Vec<CategoryTotal> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for t in transactions {
        let signed = if t.is_income() {
            entradas = entradas.saturating_add(t.value);
            t.value
        } else {
            saidas = saidas.saturating_add(t.value);
            -t.value
        };

        let category = match t.category.trim() {
            "" => EMPTY_CATEGORY.to_string(),
            c => c.to_string(),
        };
        match index.get(&category) {
            Some(&i) => nets[i].value = nets[i].value.saturating_add(signed),
            None => {
                index.insert(category.clone(), nets.len());
                nets.push(CategoryTotal { category, value: signed });
            }
        }
    }

    nets.sort_by(|a, b| b.value.abs().cmp(&a.value.abs()));
    nets.truncate(TOP_CATEGORIES);

    MetricsResult {
        timestamp: Utc::now(),
        entradas,
        saidas,
        saldo: entradas.saturating_sub(saidas),
        top_categorias: nets,
        sample: transactions.len(),
    }
}
