//! Library side of the `vending` command: settings, catalog seeding and
//! scripted sessions against an in-memory machine.

pub mod config;
pub mod script;
pub mod seed;

pub use config::Settings;
pub use script::{Accounts, RunSummary, ScriptCommand, Session};
pub use seed::{SeedFailure, SeedProduct, SeedReport, inspect_seed, load_seed, parse_seed, seed_machine};
