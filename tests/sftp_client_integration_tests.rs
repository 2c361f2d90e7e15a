#[cfg(feature = "integration_tests")]
mod tests {
    use sftp_pull::{ConnectionConfig, ErrorKind, SftpClient};
    use std::env;
    use tracing_subscriber::EnvFilter;

    fn client() -> SftpClient {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let config = ConnectionConfig::builder()
            .host(env::var("SFTP_TEST_HOST").expect("SFTP_TEST_HOST not set"))
            .port(
                env::var("SFTP_TEST_PORT")
                    .map(|p| p.parse().expect("SFTP_TEST_PORT is not a port"))
                    .unwrap_or(22),
            )
            .username(env::var("SFTP_TEST_USER").expect("SFTP_TEST_USER not set"))
            .password(env::var("SFTP_TEST_PASSWORD").expect("SFTP_TEST_PASSWORD not set"))
            .host_key_fingerprint(
                env::var("SFTP_TEST_FINGERPRINT").expect("SFTP_TEST_FINGERPRINT not set"),
            )
            .build()
            .expect("Invalid test configuration");
        SftpClient::new(config)
    }

    fn remote_dir() -> String {
        env::var("SFTP_TEST_DIR").expect("SFTP_TEST_DIR not set")
    }

    #[test]
    fn test_list_and_fetch_most_recent() {
        let client = client();
        let local = tempfile::tempdir().expect("Failed to create temp dir");

        let files = client
            .list_files_with_details(&remote_dir())
            .expect("Failed to list files");
        let latest = files
            .iter()
            .max_by(|a, b| {
                a.last_modified
                    .cmp(&b.last_modified)
                    .then_with(|| b.name.cmp(&a.name))
            })
            .expect("SFTP_TEST_DIR must contain at least one file");

        let path = client
            .fetch_most_recent_file(&remote_dir(), local.path())
            .expect("Failed to fetch most recent file");
        assert_eq!(path, local.path().join(&latest.name));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), latest.size);
    }

    #[test]
    fn test_fetch_file_by_name() {
        let client = client();
        let local = tempfile::tempdir().expect("Failed to create temp dir");

        let files = client
            .list_files_with_details(&remote_dir())
            .expect("Failed to list files");
        let first = files.first().expect("SFTP_TEST_DIR must contain at least one file");

        let path = client
            .fetch_file_by_name(&remote_dir(), &first.name, local.path())
            .expect("Failed to fetch file");
        assert!(path.exists());

        let err = client
            .fetch_file_by_name(&remote_dir(), "does-not-exist.sftp-pull", local.path())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransferError);
        assert!(!local.path().join("does-not-exist.sftp-pull").exists());
    }

    #[test]
    fn test_wrong_fingerprint_is_rejected() {
        let good = client();
        let config = ConnectionConfig::builder()
            .host(good.config().host())
            .port(good.config().port())
            .username(good.config().username())
            .password(good.config().password())
            .host_key_fingerprint("SHA256:AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")
            .build()
            .unwrap();

        let err = SftpClient::new(config)
            .list_files_with_details(&remote_dir())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionError);
    }
}
