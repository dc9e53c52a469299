//! Data models: tokens, periods, schema, and application configuration.

pub mod config;
pub mod period;
pub mod schema;
pub mod token;
