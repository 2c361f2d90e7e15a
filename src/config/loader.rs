use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::connection::ConnectionConfig;
use crate::helper::{get_file_path, CONFIG_FILE};

/**
    default location of the connection file,
    "~/.config/sftp-pull/config.toml"
*/
pub fn default_config_path() -> Result<PathBuf> {
    get_file_path(CONFIG_FILE)
}

/**
    read toml format connection config from `path`
*/
pub fn read_config(path: impl AsRef<Path>) -> Result<ConnectionConfig> {
    let config_path = path.as_ref();

    let config_str = fs::read_to_string(config_path)
        .with_context(|| format!("Unable to read sftp-pull's config file at {:?}", config_path))?;

    if config_str.trim().is_empty() {
        anyhow::bail!("sftp-pull's config file at {:?} is empty", config_path);
    }

    let config: ConnectionConfig = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse sftp-pull's config file at {:?}", config_path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_read_config() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
host = "sftp.example.com"
username = "ingest"
password = "s3cret"
host_key_fingerprint = "SHA256:nThbg6kXUpJWGl7E1IGOCspRomTxdCARLviKw6E5SY8"
"#
        )?;

        let config = read_config(file.path())?;
        assert_eq!(config.host(), "sftp.example.com");
        assert_eq!(config.port(), 22);
        Ok(())
    }

    #[test]
    fn test_read_empty_config_fails() -> Result<()> {
        let file = NamedTempFile::new()?;
        let err = read_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("is empty"));
        Ok(())
    }

    #[test]
    fn test_read_invalid_config_keeps_reason() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "host = \"sftp.example.com\"\nusername = \"ingest\"")?;

        let err = read_config(file.path()).unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("Failed to parse"));
        assert!(chain.contains("password is required"));
        Ok(())
    }

    #[test]
    fn test_default_config_path() -> Result<()> {
        let path = default_config_path()?;
        assert!(path.ends_with(".config/sftp-pull/config.toml"));
        Ok(())
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_config("/nonexistent/sftp-pull/config.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sftp-pull/config.toml"));
    }
}
