use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::error::{Cause, Result, SftpError};
use crate::helper::join_remote_path;
use crate::ssh::{PasswordSessionOpener, RemoteEntry, RemoteSession, SessionOpener};

/// A regular file found in a remote directory.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileInfo {
    /// Base name only, without the directory.
    pub name: String,
    pub size: u64,
    /// As reported by the server, not normalized.
    pub last_modified: DateTime<Utc>,
}

impl From<&RemoteEntry> for RemoteFileInfo {
    fn from(entry: &RemoteEntry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            last_modified: entry.last_modified,
        }
    }
}

/// Pull-only SFTP client.
///
/// Every operation opens its own session, performs one remote interaction
/// and closes the session again before returning, whatever the outcome.
/// No session outlives a call, so one client can be used from several
/// threads at once as long as the opener allows it.
pub struct SftpClient<O = PasswordSessionOpener> {
    config: ConnectionConfig,
    opener: O,
}

impl SftpClient<PasswordSessionOpener> {
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_opener(config, PasswordSessionOpener)
    }
}

impl<O: SessionOpener> SftpClient<O> {
    pub fn with_opener(config: ConnectionConfig, opener: O) -> Self {
        Self { config, opener }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Download the file with the latest modification time in `remote_dir`
    /// into `local_dir`, keeping its name. Returns the local path written.
    ///
    /// Directories are ignored. When several files share the latest
    /// timestamp, the one whose name sorts first wins.
    pub fn fetch_most_recent_file(
        &self,
        remote_dir: &str,
        local_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let context = format!("error downloading most recent file from {remote_dir}");
        let mut session = self.open_session(&context)?;

        let entries = session
            .list_directory(remote_dir)
            .map_err(|e| SftpError::Listing {
                context: context.clone(),
                dir: remote_dir.to_string(),
                source: e.into(),
            })?;

        let latest = select_most_recent(&entries).ok_or_else(|| SftpError::NoFilesFound {
            context: context.clone(),
            dir: remote_dir.to_string(),
        })?;
        info!(
            dir = remote_dir,
            file = %latest.name,
            modified = %latest.last_modified,
            "selected most recent file"
        );

        session
            .fetch_file_to_local_directory(&latest.full_path, local_dir.as_ref())
            .map_err(|e| transfer_error(context, &latest.full_path, e))
    }

    /// List the regular files of `remote_dir`.
    ///
    /// Entries keep the order the server returned them in, which is stable
    /// within a call but otherwise unspecified. An empty directory yields an
    /// empty list.
    pub fn list_files_with_details(&self, remote_dir: &str) -> Result<Vec<RemoteFileInfo>> {
        let context = format!("error listing files in directory {remote_dir}");
        let mut session = self.open_session(&context)?;

        let entries = session
            .list_directory(remote_dir)
            .map_err(|e| SftpError::Listing {
                context,
                dir: remote_dir.to_string(),
                source: e.into(),
            })?;

        let files: Vec<RemoteFileInfo> = entries
            .iter()
            .filter(|entry| !entry.is_directory)
            .map(RemoteFileInfo::from)
            .collect();
        debug!(dir = remote_dir, count = files.len(), "listed remote files");
        Ok(files)
    }

    /// Download `remote_dir/file_name` into `local_dir`. The remote file is
    /// not checked for beforehand; a missing file is a transfer error.
    pub fn fetch_file_by_name(
        &self,
        remote_dir: &str,
        file_name: &str,
        local_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let context = format!("error downloading file {file_name}");
        let mut session = self.open_session(&context)?;

        let remote_path = join_remote_path(remote_dir, file_name);
        session
            .fetch_file_to_local_directory(&remote_path, local_dir.as_ref())
            .map_err(|e| transfer_error(context, &remote_path, e))
    }

    fn open_session(&self, context: &str) -> Result<ScopedSession<'_, O::Session>> {
        debug!(host = self.config.host(), port = self.config.port(), "opening session");
        let session = self
            .opener
            .open(&self.config)
            .map_err(|e| SftpError::Session {
                context: context.to_string(),
                host: self.config.host().to_string(),
                source: e.into(),
            })?;
        Ok(ScopedSession {
            session,
            host: self.config.host(),
        })
    }
}

fn transfer_error(context: String, path: &str, e: anyhow::Error) -> SftpError {
    let source: Cause = e.into();
    SftpError::Transfer {
        context,
        path: path.to_string(),
        source,
    }
}

/// Latest non-directory entry; ties go to the smallest name.
fn select_most_recent(entries: &[RemoteEntry]) -> Option<&RemoteEntry> {
    entries
        .iter()
        .filter(|entry| !entry.is_directory)
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| b.name.cmp(&a.name))
        })
}

/// Closes the wrapped session when dropped, on success, error or unwind.
struct ScopedSession<'a, S: RemoteSession> {
    session: S,
    host: &'a str,
}

impl<S: RemoteSession> Deref for ScopedSession<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: RemoteSession> DerefMut for ScopedSession<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: RemoteSession> Drop for ScopedSession<'_, S> {
    fn drop(&mut self) {
        match self.session.close() {
            Ok(()) => debug!(host = self.host, "session closed"),
            Err(e) => warn!(host = self.host, error = %e, "failed to close session"),
        }
    }
}
