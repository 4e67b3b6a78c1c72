use super::*;

#[test]
fn test_validate_default_config() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_invalid_port() {
    let mut config = Config::default();
    config.server.port = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "server.port"));
}

#[test]
fn test_validate_port_collision() {
    let mut config = Config::default();
    config.server.port = config.browser.debug_port;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "browser.debug_port"));
}

#[test]
fn test_validate_inverted_window() {
    let mut config = Config::default();
    config.collective.min_window_ms = 9000;
    config.collective.max_window_ms = 1000;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "collective.min_window_ms"));
}

#[test]
fn test_validate_zero_votes() {
    let mut config = Config::default();
    config.collective.max_votes = 0;

    let err = ConfigValidator::validate(&config).into_result().unwrap_err();
    assert!(err.to_string().contains("collective.max_votes"));
}

#[test]
fn test_validate_zero_timeouts() {
    let mut config = Config::default();
    config.agent.turn_timeout_secs = 0;
    config.agent.confirm_timeout_ms = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "agent.turn_timeout_secs"));
    assert!(result.errors.iter().any(|e| e.path == "agent.confirm_timeout_ms"));
}

#[test]
fn test_validate_many_reloads_warns() {
    let mut config = Config::default();
    config.agent.reload_retries = 5;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "agent.reload_retries"));
}

#[test]
fn test_validate_catalog_url() {
    let mut config = Config::default();
    config.catalog.url = "ftp://example.com/bots".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
}

#[test]
fn test_into_result_passes_warnings() {
    let mut config = Config::default();
    config.agent.reload_retries = 4;

    let warnings = ConfigValidator::validate(&config).into_result().unwrap();
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_strict_result_rejects_warnings() {
    let mut config = Config::default();
    config.collective.max_window_ms = 300_000;

    let err = ConfigValidator::validate(&config).into_strict_result().unwrap_err();
    match err {
        ConfigError::StrictWarning { field, .. } => assert_eq!(field, "collective.max_window_ms"),
        other => panic!("unexpected error: {other}"),
    }

    assert!(ConfigValidator::validate(&Config::default())
        .into_strict_result()
        .is_ok());
}

#[test]
fn test_strict_result_reports_errors_first() {
    let mut config = Config::default();
    config.collective.max_votes = 0;
    config.agent.reload_retries = 5;

    let err = ConfigValidator::validate(&config).into_strict_result().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue { ref field, .. } if field == "collective.max_votes"
    ));
}
