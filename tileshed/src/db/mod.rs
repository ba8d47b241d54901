//! Database layer: repositories over `PgConnection` plus categorized errors.

pub mod errors;
pub mod handlers;
pub mod models;
