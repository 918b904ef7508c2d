//! Integration tests for environment-driven configuration.

use std::collections::HashMap;
use std::time::Duration;

use doomsday_app::{
    AppConfig, ConfigError, DEFAULT_API_BASE_URL, ENV_API_URL, ENV_HORIZON_DAYS, ENV_LOG_LEVEL,
    ENV_REFRESH_SECONDS, QUERY_LOG_LEVEL,
};
use doomsday_core::Horizon;
use tracing::Level;

fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    AppConfig::from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn config_tests_defaults_match_dashboard_behavior() {
    let config = config_from(&[]).expect("defaults are valid");

    assert_eq!(config, AppConfig::default());
    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.refresh_interval, Duration::from_secs(60));
    assert_eq!(config.horizon_days, 90);
    assert_eq!(config.session_cookie, "doomsday-token");
    assert_eq!(
        config.dashboard_options().horizon,
        Horizon::Within(90 * 86_400)
    );
}

#[test]
fn config_tests_applies_overrides() {
    let config = config_from(&[
        (ENV_API_URL, "https://doomsday.internal:8443"),
        (ENV_REFRESH_SECONDS, " 15 "),
        (ENV_HORIZON_DAYS, "30"),
    ])
    .expect("overrides are valid");

    assert_eq!(config.api_base_url, "https://doomsday.internal:8443");
    assert_eq!(config.dashboard_options().refresh_interval, Duration::from_secs(15));
    assert_eq!(config.dashboard_options().horizon, Horizon::from_days(30));
}

#[test]
fn config_tests_blank_values_fall_back_to_defaults() {
    let config = config_from(&[(ENV_API_URL, "  "), (ENV_REFRESH_SECONDS, "")])
        .expect("blank values are ignored");

    assert_eq!(config, AppConfig::default());
}

#[test]
fn config_tests_rejects_non_http_url() {
    assert_eq!(
        config_from(&[(ENV_API_URL, "ftp://doomsday.internal")]),
        Err(ConfigError::InvalidApiUrl("ftp://doomsday.internal".to_string()))
    );
    assert!(config_from(&[(ENV_API_URL, "not a url")]).is_err());
}

#[test]
fn config_tests_rejects_zero_and_garbage_numbers() {
    assert_eq!(
        config_from(&[(ENV_REFRESH_SECONDS, "0")]),
        Err(ConfigError::InvalidValue {
            name: ENV_REFRESH_SECONDS,
            value: "0".to_string(),
        })
    );
    assert!(matches!(
        config_from(&[(ENV_HORIZON_DAYS, "-5")]),
        Err(ConfigError::InvalidValue { name: ENV_HORIZON_DAYS, .. })
    ));
}

#[test]
fn config_tests_origin_config_keeps_other_defaults() {
    let config = AppConfig::for_origin("https://certs.example.com");

    assert_eq!(config.api_base_url, "https://certs.example.com");
    assert_eq!(config.refresh_interval, AppConfig::default().refresh_interval);
}

#[test]
fn config_tests_log_level_defaults_to_info_and_accepts_overrides() {
    assert_eq!(AppConfig::default().log_level, Level::INFO);

    let config = config_from(&[(ENV_LOG_LEVEL, "debug")]).expect("debug is a level");
    assert_eq!(config.log_level, Level::DEBUG);

    assert_eq!(
        config_from(&[(ENV_LOG_LEVEL, "chatty")]),
        Err(ConfigError::InvalidValue {
            name: ENV_LOG_LEVEL,
            value: "chatty".to_string(),
        })
    );
}

#[test]
fn config_tests_page_query_tunes_the_browser_dashboard() {
    let config = AppConfig::for_page(
        "https://certs.example.com",
        "?refresh_seconds=15&horizon_days=30&log=warn",
    )
    .expect("query overrides are valid");

    assert_eq!(config.api_base_url, "https://certs.example.com");
    assert_eq!(config.refresh_interval, Duration::from_secs(15));
    assert_eq!(config.dashboard_options().horizon, Horizon::from_days(30));
    assert_eq!(config.log_level, Level::WARN);
}

#[test]
fn config_tests_empty_page_query_matches_origin_defaults() {
    for query in ["", "?", "?refresh_seconds=&unrelated=1"] {
        assert_eq!(
            AppConfig::for_page("https://certs.example.com", query),
            Ok(AppConfig::for_origin("https://certs.example.com"))
        );
    }
}

#[test]
fn config_tests_page_query_cannot_move_the_api() {
    let config = AppConfig::for_page(
        "https://certs.example.com",
        "DOOMSDAY_API_URL=https%3A%2F%2Fevil.example&api_url=https%3A%2F%2Fevil.example",
    )
    .expect("unknown parameters are ignored");

    assert_eq!(config.api_base_url, "https://certs.example.com");
}

#[test]
fn config_tests_page_query_errors_name_the_parameter() {
    assert_eq!(
        AppConfig::for_page("https://certs.example.com", "refresh_seconds=0"),
        Err(ConfigError::InvalidValue {
            name: "refresh_seconds",
            value: "0".to_string(),
        })
    );
    assert!(matches!(
        AppConfig::for_page("https://certs.example.com", "log=loud"),
        Err(ConfigError::InvalidValue { name: QUERY_LOG_LEVEL, .. })
    ));
}
