//! Relay configuration tests

use std::env;

use tempo_relay::config::RelayConfig;

// Environment variables are process-global, so everything env-touching
// lives in one test function.
#[test]
fn test_config_from_env() {
    env::remove_var("RELAY_HOST");
    env::remove_var("RELAY_PORT");
    env::remove_var("RELAY_MAX_MESSAGE_SIZE");
    env::remove_var("RELAY_WS_PING_INTERVAL");
    env::remove_var("RELAY_CORS_ORIGINS");

    let config = RelayConfig::from_env().expect("defaults must parse");
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8080);
    assert_eq!(config.max_message_size, 65536);
    assert_eq!(config.ws_ping_interval, 30);
    assert!(config.cors_origins.is_none());

    env::set_var("RELAY_PORT", "9001");
    env::set_var("RELAY_CORS_ORIGINS", "https://app.example.com");
    let config = RelayConfig::from_env().expect("overrides must parse");
    assert_eq!(config.port, 9001);
    assert_eq!(
        config.cors_origins.as_deref(),
        Some("https://app.example.com")
    );

    env::set_var("RELAY_PORT", "not_a_port");
    assert!(RelayConfig::from_env().is_err());

    env::remove_var("RELAY_PORT");
    env::remove_var("RELAY_CORS_ORIGINS");
}
