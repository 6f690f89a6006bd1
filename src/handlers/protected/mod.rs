// handlers/protected/mod.rs - Protected handlers (session token required)
//
// Every route here sits behind `session_auth_middleware`, which injects the
// caller's `AuthSession`. Handlers only ever touch that session's tenant.
pub mod auth;
pub mod metrics;
pub mod transactions;
