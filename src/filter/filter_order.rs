use chrono::NaiveDate;

use crate::ledger::Transaction;

/// Sort key for records whose date could not be parsed (1970-01-01)
fn unknown_date() -> NaiveDate {
    NaiveDate::default()
}

/// Newest first. Unknown dates sort as the epoch; ties keep their table order.
pub fn sort_by_date_desc(items: &mut [Transaction]) {
    items.sort_by(|a, b| {
        let da = a.parsed_date.unwrap_or_else(unknown_date);
        let db = b.parsed_date.unwrap_or_else(unknown_date);
        db.cmp(&da)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::columns;
    use crate::store::Row;
    use serde_json::json;

    fn tx(date: &str, desc: &str) -> Transaction {
        let mut r = Row::new();
        r.insert(columns::DATE.into(), json!(date));
        r.insert(columns::DESCRIPTION.into(), json!(desc));
        Transaction::from_row(&r)
    }

    #[test]
    fn newest_first_with_unknown_dates_last() {
        let mut items = vec![
            tx("02/01/2024", "a"),
            tx("??", "unknown"),
            tx("2024-03-01", "b"),
            tx("02/01/2024", "c"),
            tx("15/06/1969", "old"),
        ];
        sort_by_date_desc(&mut items);
        let order: Vec<&str> = items.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c", "unknown", "old"]);
    }
}
