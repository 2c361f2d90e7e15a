use russh::client;

pub fn default_ssh_config() -> client::Config {
    client::Config::default()
}

/**
    reduce a SHA-256 host key fingerprint to its bare base64 digest

    accepts "SHA256:<b64>", "<b64>" and "<algorithm> <bits> <b64>",
    with or without trailing '=' padding
*/
pub fn normalize_fingerprint(fingerprint: &str) -> &str {
    let digest = fingerprint.split_whitespace().last().unwrap_or_default();
    let digest = digest.strip_prefix("SHA256:").unwrap_or(digest);
    digest.trim_end_matches('=')
}

pub fn fingerprint_matches(expected: &str, actual: &str) -> bool {
    let expected = normalize_fingerprint(expected);
    !expected.is_empty() && expected == normalize_fingerprint(actual)
}
