pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod ledger;
pub mod metrics;
pub mod middleware;
pub mod normalize;
pub mod services;
pub mod session;
pub mod state;
pub mod store;

pub use app::app;
pub use state::AppState;
