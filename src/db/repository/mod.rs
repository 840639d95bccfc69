//! Per-table query functions. Handlers do the ownership checks; these only
//! talk to Postgres.

pub mod admin;
pub mod analytics;
pub mod categories;
pub mod links;
pub mod profiles;
pub mod sessions;
pub mod themes;
pub mod users;
