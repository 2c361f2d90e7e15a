use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::ConnectionConfig;

/// One entry of a remote directory listing, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub full_path: String,
}

/// Establishes authenticated sessions. One call, one fresh session.
pub trait SessionOpener {
    type Session: RemoteSession;

    fn open(&self, config: &ConnectionConfig) -> Result<Self::Session>;
}

/// A live session, valid for the duration of a single client operation.
pub trait RemoteSession {
    fn list_directory(&mut self, path: &str) -> Result<Vec<RemoteEntry>>;

    /// Copy `remote_path` into `local_dir` under its base name and return
    /// the local path written.
    fn fetch_file_to_local_directory(
        &mut self,
        remote_path: &str,
        local_dir: &Path,
    ) -> Result<PathBuf>;

    fn close(&mut self) -> Result<()>;
}
