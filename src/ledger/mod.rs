pub mod options;
pub mod transaction;

pub use options::{filter_options, FilterOptions};
pub use transaction::{columns, default_headers, identity_key, Transaction, TransactionInput, INCOME_KIND};
