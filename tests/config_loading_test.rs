//! 配置文件加载与校验

use merchant_oauth::config::{ConfigManager, ServiceSelection, load_config};
use merchant_oauth::provider::Environment;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_config_file() {
    let file = write_config(
        r#"
[provider]
environment = "sandbox"
application_id = "sq0idp-file"
application_secret = "sq0csp-file"
timeout_seconds = 5
scopes = ["MERCHANT_PROFILE_READ"]

[oauth]
public_domain = "merchant.example.com"
state_ttl_seconds = 120

[webhook]
dedup_ttl_seconds = 3600

[dual_port.oauth.http]
host = "127.0.0.1"
port = 5000

[dual_port.webhook.http]
host = "127.0.0.1"
port = 5001
"#,
    );

    let config = ConfigManager::from_file(file.path()).unwrap().config();

    assert_eq!(config.provider.environment, Environment::Sandbox);
    assert_eq!(config.provider.timeout_seconds, 5);
    assert_eq!(config.oauth.redirect_uri(), "https://merchant.example.com/callback");
    assert_eq!(config.webhook.dedup_ttl_seconds, 3600);
    assert_eq!(config.webhook.dedup_max_entries, 10_000);
    assert!(config.validate(ServiceSelection::Both).is_ok());
}

#[rstest]
#[case("production", Environment::Production)]
#[case("Production", Environment::Production)]
#[case("PRODUCTION", Environment::Production)]
#[case("staging", Environment::Sandbox)]
fn test_environment_in_file_is_case_insensitive(
    #[case] value: &str,
    #[case] expected: Environment,
) {
    let file = write_config(&format!("[provider]\nenvironment = \"{value}\"\n"));

    let config = ConfigManager::from_file(file.path()).unwrap().config();

    assert_eq!(config.provider.environment, expected);
}

#[test]
fn test_webhook_only_does_not_need_public_domain() {
    let file = write_config(
        r#"
[provider]
application_id = "sq0idp-file"
application_secret = "sq0csp-file"
"#,
    );
    let config = ConfigManager::from_file(file.path()).unwrap().config();

    assert!(config.validate(ServiceSelection::WebhookOnly).is_ok());
    assert!(config.validate(ServiceSelection::OAuthOnly).is_err());
}

#[test]
fn test_invalid_toml_rejected() {
    let file = write_config("[provider\napplication_id = ");
    assert!(ConfigManager::from_file(file.path()).is_err());
}

#[test]
fn test_load_config_rejects_shared_port() {
    let file = write_config(
        r#"
[provider]
application_id = "sq0idp-file"
application_secret = "sq0csp-file"

[oauth]
public_domain = "https://merchant.example.com"

[dual_port.oauth.http]
host = "0.0.0.0"
port = 7000

[dual_port.webhook.http]
host = "0.0.0.0"
port = 7000
"#,
    );

    let err = load_config(Some(file.path()), ServiceSelection::Both).unwrap_err();
    assert!(err.to_string().contains("cannot share port"));
}

#[test]
fn test_example_config_matches_defaults() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.example.toml");
    let config = ConfigManager::from_file(&path).unwrap().config();

    assert_eq!(config.provider.environment, Environment::Sandbox);
    assert_eq!(config.dual_port.oauth.http.port, 8080);
    assert_eq!(config.dual_port.webhook.http.port, 8081);
    assert!(config.oauth.verify_state);
    // 未填写凭据时无法通过校验
    assert!(config.validate(ServiceSelection::OAuthOnly).is_err());
}
