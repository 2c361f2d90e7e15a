pub mod client;
pub mod config;
pub mod error;
pub mod helper;
pub mod ssh;

pub use client::{RemoteFileInfo, SftpClient};
pub use config::{ConnectionConfig, Protocol};
pub use error::{ErrorKind, Result, SftpError};
