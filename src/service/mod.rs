//! Query execution coordinator and the typed table repository built on it.

mod database;
mod exec;
mod table;

pub use database::{Database, Session};
pub use table::{SchemaTable, TableManager};
