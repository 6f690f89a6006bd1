// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition plus service info. No /api prefix, no middleware.
pub mod auth;
pub mod info;

pub use auth::login_post;
pub use info::{health, root, version};
