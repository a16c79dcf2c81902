pub mod bootstrap;

pub use bootstrap::{ensure_super_admin, BootstrapOutcome};
