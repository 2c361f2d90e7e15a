use std::path::PathBuf;

use anyhow::{Context, Result};

pub static CONFIG_FILE: &str = "config.toml";

pub fn get_file_path(file_name: &str) -> Result<PathBuf> {
    let mut config_dir: PathBuf = if cfg!(debug_assertions) {
        ".".into() // current running dir
    } else {
        dirs::home_dir().context("Unable to reach user's home directory.")?
    };

    config_dir.push(".config/sftp-pull");
    config_dir.push(file_name);
    Ok(config_dir)
}

/// Join a remote directory and an entry name with exactly one `/`.
///
/// Only the seam between the two parts is touched; separators embedded in
/// `name` are passed through as-is.
pub fn join_remote_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return name.to_string();
    }
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        // the directory was the root
        return format!("/{name}");
    }
    format!("{dir}/{name}")
}

/// Last segment of a remote path, `None` for paths ending in `/`.
pub fn remote_base_name(path: &str) -> Option<&str> {
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_remote_path() {
        assert_eq!(join_remote_path("dir", "report.csv"), "dir/report.csv");
        assert_eq!(join_remote_path("dir/", "report.csv"), "dir/report.csv");
        assert_eq!(join_remote_path("/", "report.csv"), "/report.csv");
        assert_eq!(join_remote_path("", "report.csv"), "report.csv");
        assert_eq!(join_remote_path("in", "2024/report.csv"), "in/2024/report.csv");
    }

    #[test]
    fn test_remote_base_name() {
        assert_eq!(remote_base_name("/outbox/a.csv"), Some("a.csv"));
        assert_eq!(remote_base_name("a.csv"), Some("a.csv"));
        assert_eq!(remote_base_name("/outbox/"), None);
    }
}
