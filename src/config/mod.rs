pub mod connection;
pub mod loader;

pub use connection::{ConnectionConfig, ConnectionConfigBuilder, Protocol, DEFAULT_PORT};
