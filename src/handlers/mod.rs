// handlers/mod.rs - 3-tier handler layout
//
// Public (no session) → Protected (tenant roles) → Elevated (super_admin only).
// Every protected and elevated handler runs the authorization guard itself;
// the edge middleware only covers page prefixes, never /api.

pub mod elevated;
pub mod protected;
pub mod public;
pub mod utils;
