use config::Config;
use discord_auth_relay::config::{AppConfig, ConfigError, ProviderConfig};
use std::env;
use std::fs;

#[test]
fn test_provider_config_deserialization() {
    let yaml_content = r#"
authorize_url: "https://provider.example.org/authorize"
token_url: "https://provider.example.org/token"
user_url: "https://provider.example.org/me"
scopes: ["identify", "email"]
timeout_secs: 3
"#;

    let config = Config::builder()
        .add_source(config::File::from_str(
            yaml_content,
            config::FileFormat::Yaml,
        ))
        .build()
        .expect("Failed to build config");

    let provider: ProviderConfig = config
        .try_deserialize()
        .expect("Failed to deserialize provider config");
    assert_eq!(provider.authorize_url, "https://provider.example.org/authorize");
    assert_eq!(provider.token_url, "https://provider.example.org/token");
    assert_eq!(provider.user_url, "https://provider.example.org/me");
    assert_eq!(provider.scope_string(), "identify email");
    assert_eq!(provider.timeout_secs, 3);
}

#[test]
fn test_app_config_defaults() {
    let yaml_content = r#"
discord_client_id: "1234567890"
discord_client_secret: "client-secret"
redirect_uri: "http://localhost:3000/callback.html"
jwt_secret: "0123456789abcdef0123456789abcdef"
"#;

    let config = Config::builder()
        .add_source(config::File::from_str(
            yaml_content,
            config::FileFormat::Yaml,
        ))
        .build()
        .expect("Failed to build config");

    let app_config: AppConfig = config
        .try_deserialize()
        .expect("Failed to deserialize app config");
    assert_eq!(app_config.discord_client_id, "1234567890");
    assert_eq!(app_config.listen_addr, "0.0.0.0:4000");
    assert_eq!(
        app_config.provider.authorize_url,
        "https://discord.com/api/oauth2/authorize"
    );
    assert_eq!(
        app_config.provider.token_url,
        "https://discord.com/api/oauth2/token"
    );
    assert_eq!(app_config.provider.user_url, "https://discord.com/api/users/@me");
    assert_eq!(app_config.provider.scopes, vec!["identify", "guilds"]);
    assert_eq!(app_config.provider.timeout_secs, 10);
    assert!(app_config.validate().is_ok());
}

#[test]
fn test_missing_credential_fails_deserialization() {
    let yaml_content = r#"
discord_client_id: "1234567890"
redirect_uri: "http://localhost:3000/callback.html"
jwt_secret: "0123456789abcdef0123456789abcdef"
"#;

    let config = Config::builder()
        .add_source(config::File::from_str(
            yaml_content,
            config::FileFormat::Yaml,
        ))
        .build()
        .expect("Failed to build config");

    let result: Result<AppConfig, _> = config.try_deserialize();
    assert!(result.is_err());
}

#[test]
fn test_config_with_environment_variables() {
    let temp_dir = env::temp_dir();
    let config_path = temp_dir.join("relay_test_config.yaml");
    let config_content = r#"
discord_client_id: "file-client"
discord_client_secret: "file-secret"
redirect_uri: "https://file.example.com/callback"
jwt_secret: "file-secret-file-secret-file-secret"
provider:
  timeout_secs: 10
"#;
    fs::write(&config_path, config_content).expect("Failed to write temp config");

    unsafe {
        env::set_var("RELAYTEST__DISCORD_CLIENT_ID", "env-client");
        env::set_var("RELAYTEST__PROVIDER__TIMEOUT_SECS", "4");

        let config = Config::builder()
            .add_source(config::File::from(config_path.clone()))
            .add_source(
                config::Environment::default()
                    .prefix("RELAYTEST")
                    .separator("__"),
            )
            .build()
            .expect("Failed to build config");

        let app_config: AppConfig = config.try_deserialize().expect("Failed to deserialize");

        // Environment variables should override file values
        assert_eq!(app_config.discord_client_id, "env-client");
        assert_eq!(app_config.provider.timeout_secs, 4);
        // Non-overridden values should come from file
        assert_eq!(app_config.discord_client_secret, "file-secret");
        assert_eq!(app_config.redirect_uri, "https://file.example.com/callback");

        env::remove_var("RELAYTEST__DISCORD_CLIENT_ID");
        env::remove_var("RELAYTEST__PROVIDER__TIMEOUT_SECS");
        let _ = fs::remove_file(config_path);
    }
}

fn valid_config() -> AppConfig {
    AppConfig {
        discord_client_id: "1234567890".into(),
        discord_client_secret: "client-secret".into(),
        redirect_uri: "http://localhost:3000/callback.html".into(),
        jwt_secret: "0123456789abcdef0123456789abcdef".into(),
        listen_addr: "0.0.0.0:4000".into(),
        provider: ProviderConfig::default(),
    }
}

#[test]
fn test_validation_rejects_placeholder_jwt_secret() {
    let mut cfg = valid_config();
    cfg.jwt_secret = "supersecretjwt".into();
    match cfg.validate() {
        Err(ConfigError::Validation(msg)) => assert!(msg.contains("jwt_secret")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_validation_rejects_empty_client_id() {
    let mut cfg = valid_config();
    cfg.discord_client_id = "   ".into();
    match cfg.validate() {
        Err(ConfigError::Validation(msg)) => assert!(msg.contains("discord_client_id")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_validation_rejects_empty_scopes() {
    let mut cfg = valid_config();
    cfg.provider.scopes = vec![];
    assert!(cfg.validate().is_err());
}

#[test]
fn test_validation_rejects_bad_provider_url() {
    let mut cfg = valid_config();
    cfg.provider.token_url = "discord.com/api/oauth2/token".into();
    match cfg.validate() {
        Err(ConfigError::Validation(msg)) => assert!(msg.contains("provider.token_url")),
        other => panic!("expected validation error, got {other:?}"),
    }
}
