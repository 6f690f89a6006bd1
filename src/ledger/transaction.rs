use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::{
    cell_text, format_date_display, normalize_text, parse_bool_like, parse_flexible_date, parse_money,
};
use crate::store::Row;

/// Column headers of a tenant transaction table
pub mod columns {
    pub const DATE: &str = "Data";
    pub const DESCRIPTION: &str = "Descrição";
    pub const TOTAL_VALUE: &str = "Valor Total";
    pub const INSTALLMENT: &str = "Parcelado";
    pub const INSTALLMENT_COUNT: &str = "Parcelas";
    pub const KIND: &str = "Tipo";
    pub const CATEGORY: &str = "Categoria";
    pub const SUBCATEGORY: &str = "Subcategoria";
    pub const PAYMENT_METHOD: &str = "Forma de Pagamento";
    pub const NOTES: &str = "Observações";
    pub const STATUS: &str = "Status";

    pub const ALL: &[&str] = &[
        DATE,
        DESCRIPTION,
        TOTAL_VALUE,
        INSTALLMENT,
        INSTALLMENT_COUNT,
        KIND,
        CATEGORY,
        SUBCATEGORY,
        PAYMENT_METHOD,
        NOTES,
        STATUS,
    ];
}

/// Normalized kind value that marks income. Everything else is an expense.
pub const INCOME_KIND: &str = "entrada";

pub fn default_headers() -> Vec<String> {
    columns::ALL.iter().map(|c| c.to_string()).collect()
}

/// Identity of a record: raw date text, raw description and parsed value.
/// Trailing zeros are dropped so "5000,00" and 5000 produce the same key.
pub fn identity_key(raw_date: &str, description: &str, value: Decimal) -> String {
    format!("{}|{}|{}", raw_date, description, value.normalize())
}

/// Typed view of one transaction row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Display date (dd/mm/yyyy), empty when the stored date is unparseable
    pub date: String,
    #[serde(skip)]
    pub parsed_date: Option<NaiveDate>,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub installment: bool,
    pub installment_count: u32,
    pub kind: String,
    pub category: String,
    pub subcategory: String,
    pub payment_method: String,
    pub notes: String,
    pub status: bool,
    pub key: String,
}

fn cell<'a>(row: &'a Row, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

fn parse_count(v: &Value) -> u32 {
    let parsed = match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.filter(|n| *n > 0).unwrap_or(1)
}

impl Transaction {
    pub fn from_row(row: &Row) -> Self {
        let raw_date = cell(row, columns::DATE);
        let parsed_date = parse_flexible_date(raw_date);
        let description = cell_text(cell(row, columns::DESCRIPTION));
        let value = parse_money(cell(row, columns::TOTAL_VALUE));

        Self {
            date: format_date_display(parsed_date),
            parsed_date,
            key: identity_key(&cell_text(raw_date), &description, value),
            description,
            value,
            installment: parse_bool_like(cell(row, columns::INSTALLMENT)),
            installment_count: parse_count(cell(row, columns::INSTALLMENT_COUNT)),
            kind: cell_text(cell(row, columns::KIND)),
            category: cell_text(cell(row, columns::CATEGORY)),
            subcategory: cell_text(cell(row, columns::SUBCATEGORY)),
            payment_method: cell_text(cell(row, columns::PAYMENT_METHOD)),
            notes: cell_text(cell(row, columns::NOTES)),
            status: parse_bool_like(cell(row, columns::STATUS)),
        }
    }

    pub fn is_income(&self) -> bool {
        normalize_text(&Value::String(self.kind.clone())) == INCOME_KIND
    }
}

/// Incoming fields for an upsert. Cells stay loosely typed until `to_row`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionInput {
    pub date: Value,
    pub description: Value,
    pub total_value: Value,
    pub installment: Value,
    pub installment_count: Value,
    pub kind: Value,
    pub category: Value,
    pub subcategory: Value,
    pub payment_method: Value,
    pub notes: Value,
    pub status: Value,
}

impl TransactionInput {
    pub fn identity_key(&self) -> String {
        identity_key(
            &cell_text(&self.date),
            &cell_text(&self.description),
            parse_money(&self.total_value),
        )
    }

    /// Row as written to the store: money as exact decimal text, installment
    /// as "Sim"/"Não", status as a boolean. Absent text fields become "".
    pub fn to_row(&self) -> Row {
        // plain "1234.5" text reads back through parse_money unchanged
        let value_cell = Value::String(parse_money(&self.total_value).normalize().to_string());
        let installment = if parse_bool_like(&self.installment) { "Sim" } else { "Não" };

        let mut row = Row::new();
        row.insert(columns::DATE.into(), text_cell(&self.date));
        row.insert(columns::DESCRIPTION.into(), text_cell(&self.description));
        row.insert(columns::TOTAL_VALUE.into(), value_cell);
        row.insert(columns::INSTALLMENT.into(), Value::String(installment.to_string()));
        row.insert(
            columns::INSTALLMENT_COUNT.into(),
            Value::from(parse_count(&self.installment_count)),
        );
        row.insert(columns::KIND.into(), text_cell(&self.kind));
        row.insert(columns::CATEGORY.into(), text_cell(&self.category));
        row.insert(columns::SUBCATEGORY.into(), text_cell(&self.subcategory));
        row.insert(columns::PAYMENT_METHOD.into(), text_cell(&self.payment_method));
        row.insert(columns::NOTES.into(), text_cell(&self.notes));
        row.insert(columns::STATUS.into(), Value::Bool(parse_bool_like(&self.status)));
        row
    }
}

fn text_cell(v: &Value) -> Value {
    Value::String(cell_text(v))
}
