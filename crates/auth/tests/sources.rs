#![forbid(unsafe_code)]

use std::io::Write;

use krait_auth::{
    CredentialCache, ExecConfig, ExecInteractiveMode, ExecTokenSource, FileTokenSource,
    TokenSource,
};
use krait_core::Error;

#[tokio::test]
async fn file_source_reads_and_caches_for_the_interval() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "first-token").unwrap();
    file.flush().unwrap();

    let cache = CredentialCache::new(FileTokenSource::new(file.path()));
    assert_eq!(cache.header_value().await.unwrap(), "Bearer first-token");

    // The file changes, but the cached read is valid for the interval.
    std::fs::write(file.path(), "second-token\n").unwrap();
    assert_eq!(cache.header_value().await.unwrap(), "Bearer first-token");
}

#[tokio::test]
async fn empty_token_file_fails() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let source = FileTokenSource::new(file.path());
    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, Error::CredentialRefresh(_)));
}

#[tokio::test]
async fn missing_token_file_fails() {
    let source = FileTokenSource::new("/nonexistent/krait-token");
    assert!(matches!(source.fetch().await.unwrap_err(), Error::CredentialRefresh(_)));
}

fn exec_config(args: &[&str]) -> ExecConfig {
    let mut config = ExecConfig::new("echo");
    config.args = args.iter().map(|s| s.to_string()).collect();
    config.interactive_mode = ExecInteractiveMode::Never;
    config
}

#[tokio::test]
async fn exec_source_parses_plugin_output() {
    let payload = r#"{"apiVersion":"client.authentication.k8s.io/v1","kind":"ExecCredential","status":{"token":"exec-token"}}"#;
    let source = ExecTokenSource::new(exec_config(&["-n", payload]));
    let cache = CredentialCache::new(source);
    assert_eq!(cache.header_value().await.unwrap(), "Bearer exec-token");
}

#[tokio::test]
async fn exec_source_honors_expiration_timestamp() {
    let payload = r#"{"apiVersion":"client.authentication.k8s.io/v1","kind":"ExecCredential","status":{"token":"t","expirationTimestamp":"2099-01-01T00:00:00Z"}}"#;
    let source = ExecTokenSource::new(exec_config(&["-n", payload]));
    assert!(source.fetch().await.is_ok());

    // An unparseable timestamp fails loudly instead of guessing.
    let payload = r#"{"apiVersion":"client.authentication.k8s.io/v1","kind":"ExecCredential","status":{"token":"t","expirationTimestamp":"yesterday"}}"#;
    let source = ExecTokenSource::new(exec_config(&["-n", payload]));
    assert!(matches!(source.fetch().await.unwrap_err(), Error::CredentialRefresh(_)));
}

#[tokio::test]
async fn exec_source_fails_without_a_token() {
    let payload = r#"{"apiVersion":"client.authentication.k8s.io/v1","kind":"ExecCredential","status":{}}"#;
    let source = ExecTokenSource::new(exec_config(&["-n", payload]));
    let err = source.fetch().await.unwrap_err();
    assert!(err.to_string().contains("no token"));
}

#[tokio::test]
async fn exec_source_fails_on_nonzero_exit() {
    let mut config = ExecConfig::new("false");
    config.interactive_mode = ExecInteractiveMode::Never;
    let source = ExecTokenSource::new(config);
    assert!(matches!(source.fetch().await.unwrap_err(), Error::CredentialRefresh(_)));
}

#[tokio::test]
async fn exec_source_requires_a_terminal_for_always_interactive() {
    use std::io::IsTerminal;
    if std::io::stdin().is_terminal() {
        // Only meaningful where the harness detached stdin.
        return;
    }
    let mut config = ExecConfig::new("echo");
    config.interactive_mode = ExecInteractiveMode::Always;
    let source = ExecTokenSource::new(config);
    let err = source.fetch().await.unwrap_err();
    assert!(err.to_string().contains("interactive"));
}
