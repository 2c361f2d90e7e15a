use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filetime::FileTime;
use russh::keys::*;
use russh::*;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::FileAttributes;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use super::common::{default_ssh_config, fingerprint_matches};
use super::ssh_session::{RemoteEntry, RemoteSession, SessionOpener};
use crate::config::ConnectionConfig;
use crate::helper::{join_remote_path, remote_base_name};

const CHUNK_SIZE: usize = 32 * 1024;

pub struct Client {
    host: String,
    expected_fingerprint: String,
}

#[async_trait]
impl client::Handler for Client {
    type Error = russh::Error;

    // Rejecting here makes russh abort the handshake with `Error::UnknownKey`.
    async fn check_server_key(
        &mut self,
        server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();
        if fingerprint_matches(&self.expected_fingerprint, &fingerprint) {
            debug!(host = %self.host, "server host key matches pinned fingerprint");
            return Ok(true);
        }
        warn!(
            host = %self.host,
            fingerprint = %fingerprint,
            "server host key does not match pinned fingerprint"
        );
        Ok(false)
    }
}

/// Opens password-authenticated SFTP sessions with russh.
///
/// Every session gets its own current-thread runtime, so nothing is shared
/// between two sessions opened from the same opener.
#[derive(Debug, Default, Clone, Copy)]
pub struct PasswordSessionOpener;

impl SessionOpener for PasswordSessionOpener {
    type Session = PasswordSession;

    fn open(&self, config: &ConnectionConfig) -> Result<PasswordSession> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start session runtime")?;

        let (session, sftp) = runtime.block_on(connect(config))?;

        Ok(PasswordSession {
            sftp: Some(sftp),
            session,
            runtime,
        })
    }
}

async fn connect(config: &ConnectionConfig) -> Result<(client::Handle<Client>, SftpSession)> {
    let ssh_config = Arc::new(default_ssh_config());
    let sh = Client {
        host: config.host().to_string(),
        expected_fingerprint: config.host_key_fingerprint().to_string(),
    };

    let mut session = client::connect(ssh_config, (config.host(), config.port()), sh)
        .await
        .map_err(|e| match e {
            russh::Error::UnknownKey => anyhow::anyhow!(
                "Host key of {} does not match the configured fingerprint",
                config.host()
            ),
            e => anyhow::Error::new(e).context(format!(
                "Unable to connect to {}:{}",
                config.host(),
                config.port()
            )),
        })?;

    let auth_res = session
        .authenticate_password(config.username(), config.password())
        .await?;
    if !auth_res {
        anyhow::bail!("Authentication (with password) failed");
    }

    match start_sftp(&session).await {
        Ok(sftp) => Ok((session, sftp)),
        Err(e) => {
            if let Err(close_err) = session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
            {
                warn!(error = %close_err, "failed to disconnect after sftp subsystem error");
            }
            Err(e)
        }
    }
}

async fn start_sftp(session: &client::Handle<Client>) -> Result<SftpSession> {
    let channel = session.channel_open_session().await?;
    channel
        .request_subsystem(true, "sftp")
        .await
        .context("Failed to request sftp subsystem")?;
    let sftp = SftpSession::new(channel.into_stream())
        .await
        .context("Failed to initialize sftp session")?;
    Ok(sftp)
}

// field order matters: the runtime must outlive the handles driven by it
pub struct PasswordSession {
    sftp: Option<SftpSession>,
    session: client::Handle<Client>,
    runtime: Runtime,
}

impl PasswordSession {
    fn sftp(&self) -> Result<&SftpSession> {
        self.sftp.as_ref().context("sftp session is already closed")
    }

    fn drop_sftp(&mut self) {
        let _guard = self.runtime.enter();
        // dropping the sftp client closes its channel
        self.sftp.take();
    }
}

impl Drop for PasswordSession {
    fn drop(&mut self) {
        self.drop_sftp();
    }
}

impl RemoteSession for PasswordSession {
    fn list_directory(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let sftp = self.sftp()?;
        self.runtime.block_on(read_entries(sftp, path))
    }

    fn fetch_file_to_local_directory(
        &mut self,
        remote_path: &str,
        local_dir: &Path,
    ) -> Result<PathBuf> {
        let name = remote_base_name(remote_path)
            .with_context(|| format!("{remote_path} does not name a file"))?;
        let local_path = local_dir.join(name);

        let sftp = self.sftp()?;
        self.runtime.block_on(download(sftp, remote_path, &local_path))?;
        Ok(local_path)
    }

    fn close(&mut self) -> Result<()> {
        self.drop_sftp();
        self.runtime.block_on(
            self.session
                .disconnect(Disconnect::ByApplication, "", "English"),
        )?;
        Ok(())
    }
}

async fn read_entries(sftp: &SftpSession, dir: &str) -> Result<Vec<RemoteEntry>> {
    let read_dir = sftp.read_dir(dir).await?;

    let entries = read_dir
        .filter(|entry| {
            let name = entry.file_name();
            name != "." && name != ".."
        })
        .filter_map(|entry| to_entry(dir, entry.file_name(), &entry.metadata()))
        .collect();

    Ok(entries)
}

/// Directories and regular files only. READDIR attributes describe the link
/// itself, so symlinks and special files are skipped rather than guessed at.
fn to_entry(dir: &str, name: String, metadata: &FileAttributes) -> Option<RemoteEntry> {
    let is_directory = match metadata.permissions {
        // no mode bits, no type information
        None => false,
        Some(_) => {
            let file_type = metadata.file_type();
            if file_type.is_dir() {
                true
            } else if file_type.is_file() {
                false
            } else {
                debug!(dir, name = %name, "skipping entry that is neither file nor directory");
                return None;
            }
        }
    };

    Some(RemoteEntry {
        full_path: join_remote_path(dir, &name),
        is_directory,
        size: metadata.size.unwrap_or(0),
        last_modified: to_utc(metadata.mtime),
        name,
    })
}

fn to_utc(mtime: Option<u32>) -> DateTime<Utc> {
    mtime
        .and_then(|secs| DateTime::from_timestamp(i64::from(secs), 0))
        .unwrap_or_default()
}

async fn download(sftp: &SftpSession, remote_path: &str, local_path: &Path) -> Result<()> {
    let metadata = sftp.metadata(remote_path).await?;
    if metadata.is_dir() {
        anyhow::bail!("{remote_path} is a directory");
    }

    let mut remote_file = sftp.open(remote_path).await?;
    write_local(&mut remote_file, local_path, metadata.mtime).await
}

/// Stream `reader` into a part file next to `local_path` and move it into
/// place once complete. On failure the part file is dropped and whatever
/// was at `local_path` before stays untouched.
async fn write_local<R>(reader: &mut R, local_path: &Path, mtime: Option<u32>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let dir = local_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let part = NamedTempFile::new_in(dir)
        .with_context(|| format!("Unable to create part file in {:?}", dir))?;
    let file = part
        .as_file()
        .try_clone()
        .context("Unable to open part file for writing")?;

    let mut writer = BufWriter::new(tokio::fs::File::from_std(file));
    copy_contents(reader, &mut writer).await?;
    drop(writer);

    if let Some(mtime) = mtime {
        let mtime = FileTime::from_unix_time(i64::from(mtime), 0);
        if let Err(e) = filetime::set_file_mtime(part.path(), mtime) {
            warn!(path = ?local_path, error = %e, "unable to preserve remote modification time");
        }
    }

    part.persist(local_path)
        .with_context(|| format!("Unable to move download into place at {:?}", local_path))?;
    Ok(())
}

async fn copy_contents<R, W>(reader: &mut R, writer: &mut W) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await.context("Read error")?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await.context("Write error")?;
        total += n as u64;
    }
    writer.flush().await.context("Write error")?;
    Ok(total)
}
