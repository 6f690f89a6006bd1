// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (session token required, /api/*)
pub mod protected;
pub mod public;
