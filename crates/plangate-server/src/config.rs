/// Re-export `Config` from `plangate-core` for use within this crate.
///
/// Environment parsing lives in the core crate so integration tests can build
/// a `Config` without pulling in the server.
pub use plangate_core::config::Config;
