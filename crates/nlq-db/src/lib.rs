//! Read-only [`DatabaseGateway`](nlq_core::ports::DatabaseGateway)
//! implementation over Postgres, MySQL, and SQLite via SQLx's `Any`
//! driver.

mod catalog;
mod db_type;
mod gateway;
mod redact;

pub use db_type::DatabaseType;
pub use gateway::SqlxDatabaseGateway;
