pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod pagination;
pub mod types;

pub use filter::filter_and_sort;
pub use filter_where::FilterWhere;
pub use pagination::{paginate, paginate_with_limits, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use types::{FilterSpec, Page};
