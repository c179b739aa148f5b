pub mod backend;
pub mod history;
pub mod plans;
pub mod resources;
pub mod schema;
pub mod store_impl;

pub use backend::DuckDbBackend;
pub use resources::Resource;

/// Re-export the `duckdb` crate so consumers (especially tests) can use
/// `plangate_duckdb::duckdb::params!` without an extra dependency.
pub use duckdb;
