use park_config::{
    AppConfig, AuthKeyConfig, ConfigError, DEFAULT_JWKS_REFRESH_SECONDS,
    DEFAULT_LIVENESS_THRESHOLD_SECONDS, FirestoreSettings,
};
use std::collections::HashMap;

fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    AppConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_with_secret_only() {
    let config = load(&[("PARK_AUTH_SECRET", "secret")]).expect("config");
    assert_eq!(config.http_addr, "127.0.0.1:8080");
    assert!(config.rtdb_url.is_none());
    assert!(config.rtdb_stream);
    assert!(config.firestore.is_none());
    assert!(config.auth_audience.is_none());
    assert_eq!(config.auth_jwks_refresh_seconds, DEFAULT_JWKS_REFRESH_SECONDS);
    assert_eq!(
        config.auth_key,
        AuthKeyConfig::Hs256 {
            secret: "secret".to_string()
        }
    );
    assert_eq!(
        config.liveness_threshold_seconds,
        DEFAULT_LIVENESS_THRESHOLD_SECONDS
    );
}

#[test]
fn public_key_wins_over_secret() {
    let config = load(&[
        ("PARK_AUTH_SECRET", "secret"),
        ("PARK_AUTH_PUBLIC_KEY_PEM", "-----BEGIN PUBLIC KEY-----\\nAAA\\n-----END PUBLIC KEY-----"),
        ("PARK_AUTH_AUDIENCE", "park-console"),
        ("PARK_RTDB_URL", "https://park.firebaseio.com"),
        ("PARK_RTDB_STREAM", "off"),
        ("PARK_LIVENESS_THRESHOLD_SECONDS", "30"),
    ])
    .expect("config");
    match config.auth_key {
        AuthKeyConfig::Rs256 { public_key_pem } => assert!(public_key_pem.contains("\nAAA\n")),
        other => panic!("unexpected key: {other:?}"),
    }
    assert_eq!(config.rtdb_url.as_deref(), Some("https://park.firebaseio.com"));
    assert!(!config.rtdb_stream);
    assert_eq!(config.liveness_threshold_seconds, 30);
}

#[test]
fn public_keys_require_audience() {
    let err = load(&[(
        "PARK_AUTH_PUBLIC_KEY_PEM",
        "-----BEGIN PUBLIC KEY-----\\nAAA\\n-----END PUBLIC KEY-----",
    )])
    .unwrap_err();
    assert!(matches!(err, ConfigError::Missing(ref key) if key == "PARK_AUTH_AUDIENCE"));

    let err = load(&[("PARK_AUTH_JWKS_URL", "https://keys.park.test/jwks")]).unwrap_err();
    assert!(matches!(err, ConfigError::Missing(ref key) if key == "PARK_AUTH_AUDIENCE"));

    let config = load(&[
        ("PARK_AUTH_JWKS_URL", "https://keys.park.test/jwks"),
        ("PARK_AUTH_PUBLIC_KEY_PEM", "ignored"),
        ("PARK_AUTH_AUDIENCE", "park-console"),
        ("PARK_AUTH_JWKS_REFRESH_SECONDS", "600"),
    ])
    .expect("config");
    assert_eq!(
        config.auth_key,
        AuthKeyConfig::Jwks {
            url: "https://keys.park.test/jwks".to_string()
        }
    );
    assert_eq!(config.auth_jwks_refresh_seconds, 600);
}

#[test]
fn firestore_is_selected_by_project() {
    let config = load(&[
        ("PARK_AUTH_SECRET", "secret"),
        ("PARK_FIRESTORE_PROJECT", "park-prod"),
        ("PARK_FIRESTORE_AUTH", "token"),
    ])
    .expect("config");
    assert_eq!(
        config.firestore,
        Some(FirestoreSettings {
            project: "park-prod".to_string(),
            auth: Some("token".to_string()),
            base_url: None,
        })
    );

    let config = load(&[
        ("PARK_AUTH_SECRET", "secret"),
        ("PARK_FIRESTORE_AUTH", "token"),
        ("PARK_FIRESTORE_URL", "http://127.0.0.1:8088"),
    ])
    .expect("config");
    assert!(config.firestore.is_none());
}

#[test]
fn missing_auth_key_is_rejected() {
    let err = load(&[]).unwrap_err();
    assert!(matches!(err, ConfigError::Missing(_)));
}

#[test]
fn malformed_values_are_rejected() {
    let err = load(&[
        ("PARK_AUTH_SECRET", "secret"),
        ("PARK_LIVENESS_THRESHOLD_SECONDS", "soon"),
    ])
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(ref key, _) if key == "PARK_LIVENESS_THRESHOLD_SECONDS"));

    let err = load(&[("PARK_AUTH_SECRET", "secret"), ("PARK_RTDB_STREAM", "maybe")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(ref key, _) if key == "PARK_RTDB_STREAM"));

    let err = load(&[
        ("PARK_AUTH_SECRET", "secret"),
        ("PARK_AUTH_JWKS_REFRESH_SECONDS", "0"),
    ])
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(ref key, _) if key == "PARK_AUTH_JWKS_REFRESH_SECONDS"));
}

#[test]
fn load_config_from_env() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        std::env::set_var("PARK_AUTH_SECRET", "secret");
        std::env::set_var("PARK_HTTP_ADDR", "127.0.0.1:8081");
    }

    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.http_addr, "127.0.0.1:8081");
}
