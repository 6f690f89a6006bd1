pub mod find;
pub mod mutate;

pub use find::{find_post, list_get};
pub use mutate::{delete, upsert_put};
