// Library root: re-exports all modules so integration tests and the binary
// share the same router and configuration code.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
