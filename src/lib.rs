pub mod config;
pub mod db;
pub mod error;
pub mod initializer;
pub mod maintenance;
pub mod placeholders;
pub mod schema;

pub use error::{SchemaError, SchemaResult};
pub use initializer::{InitOptions, InitReport, SchemaInitializer};
