use std::fmt;

use serde::Deserialize;
use zeroize::Zeroizing;

use crate::error::{Result, SftpError};

pub const DEFAULT_PORT: u16 = 22;

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Protocol {
    #[default]
    Sftp,
}

/// Immutable connection parameters for one remote server.
///
/// Only obtainable through validating constructors, so a client never sees
/// a blank host, credential or fingerprint.
#[derive(Deserialize, Clone)]
#[serde(try_from = "RawConnectionConfig")]
pub struct ConnectionConfig {
    protocol: Protocol,
    host: String,
    port: u16,
    username: String,
    password: Zeroizing<String>,
    host_key_fingerprint: String,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        host_key_fingerprint: impl Into<String>,
    ) -> Result<Self> {
        Self::builder()
            .host(host)
            .username(username)
            .password(password)
            .host_key_fingerprint(host_key_fingerprint)
            .build()
    }

    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn host_key_fingerprint(&self) -> &str {
        &self.host_key_fingerprint
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host_key_fingerprint", &self.host_key_fingerprint)
            .finish()
    }
}

#[derive(Default)]
pub struct ConnectionConfigBuilder {
    protocol: Protocol,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<Zeroizing<String>>,
    host_key_fingerprint: Option<String>,
}

impl ConnectionConfigBuilder {
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn host_key_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.host_key_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn build(self) -> Result<ConnectionConfig> {
        let host = required("host", self.host)?;
        let username = required("username", self.username)?;
        let password = match self.password {
            Some(p) if !p.trim().is_empty() => p,
            _ => return Err(missing("password")),
        };
        let host_key_fingerprint = required("host_key_fingerprint", self.host_key_fingerprint)?;

        let port = self.port.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(SftpError::ConfigurationInvalid(
                "port must be greater than zero".into(),
            ));
        }

        Ok(ConnectionConfig {
            protocol: self.protocol,
            host: host.trim().to_string(),
            port,
            username,
            password,
            host_key_fingerprint: host_key_fingerprint.trim().to_string(),
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}

fn missing(field: &str) -> SftpError {
    SftpError::ConfigurationInvalid(format!("{field} is required"))
}

/// Shape of the configuration as written in a file, before validation.
#[derive(Deserialize)]
struct RawConnectionConfig {
    #[serde(default)]
    protocol: Protocol,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    host_key_fingerprint: Option<String>,
}

impl TryFrom<RawConnectionConfig> for ConnectionConfig {
    type Error = SftpError;

    fn try_from(raw: RawConnectionConfig) -> Result<Self> {
        let mut builder = ConnectionConfig::builder().protocol(raw.protocol);
        if let Some(host) = raw.host {
            builder = builder.host(host);
        }
        if let Some(port) = raw.port {
            builder = builder.port(port);
        }
        if let Some(username) = raw.username {
            builder = builder.username(username);
        }
        if let Some(password) = raw.password {
            builder = builder.password(password);
        }
        if let Some(fingerprint) = raw.host_key_fingerprint {
            builder = builder.host_key_fingerprint(fingerprint);
        }
        builder.build()
    }
}
