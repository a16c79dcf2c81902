// handlers/public/mod.rs - Public handlers (no session required)
//
// Login and logout are reachable without a session. Everything they need to
// check (credentials, account and tenant status) happens inside the handler.

pub mod auth;

pub use auth::{login, logout};
