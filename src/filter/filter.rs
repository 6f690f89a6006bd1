use super::filter_order::sort_by_date_desc;
use super::filter_where::FilterWhere;
use super::types::FilterSpec;
use crate::ledger::Transaction;
use crate::store::Row;

/// Apply `spec` to every row of a tenant table and return the survivors,
/// newest first. `page` and `page_size` are ignored here.
pub fn filter_and_sort(rows: &[Row], spec: &FilterSpec) -> Vec<Transaction> {
    let where_clause = FilterWhere::from_spec(spec);
    let mut out: Vec<Transaction> = rows
        .iter()
        .map(Transaction::from_row)
        .filter(|t| where_clause.matches(t))
        .collect();
    sort_by_date_desc(&mut out);
    out
}
