use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_dir(label: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("eventdesk_{label}_{suffix}"))
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn blank_database_url_falls_back_to_default() {
    assert_eq!(
        normalize_database_url("   "),
        ClientSettings::default().database_url
    );
}

#[test]
fn creates_parent_dir_for_sqlite_url() {
    let temp_root = temp_dir("config_db");
    let db_path = temp_root.join("data").join("client.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.join("data").exists());

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn file_settings_override_defaults() {
    let temp_root = temp_dir("config_file");
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("client.toml");
    fs::write(
        &path,
        "api_base_url = \"https://events.example.com/api\"\nrequest_timeout_secs = 3\n",
    )
    .expect("write config");

    let mut settings = ClientSettings::default();
    let raw = fs::read_to_string(&path).expect("read");
    apply_file_settings(&mut settings, toml::from_str(&raw).expect("parse"));

    assert_eq!(settings.api_base_url, "https://events.example.com/api");
    assert_eq!(settings.request_timeout_secs, 3);
    assert_eq!(settings.database_url, ClientSettings::default().database_url);

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("API_BASE_URL", "http://plain"),
        ("APP__API_BASE_URL", "http://prefixed"),
        ("DATABASE_URL", "sqlite://./plain.db"),
        ("APP__REQUEST_TIMEOUT_SECS", "30"),
    ]);

    let mut settings = ClientSettings::default();
    apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.api_base_url, "http://prefixed");
    assert_eq!(settings.database_url, "sqlite://./plain.db");
    assert_eq!(settings.request_timeout_secs, 30);
}

#[test]
fn malformed_timeout_env_is_ignored() {
    let mut settings = ClientSettings::default();
    apply_env_overrides(&mut settings, |key| {
        (key == "APP__REQUEST_TIMEOUT_SECS").then(|| "soon".to_string())
    });
    assert_eq!(settings.request_timeout_secs, 10);
}

#[test]
fn missing_settings_file_keeps_defaults_for_file_layer() {
    let settings = load_settings_from(&temp_dir("config_missing").join("absent.toml"));
    // Environment may override some fields in CI; the timeout is never zero.
    assert!(settings.request_timeout() >= Duration::from_secs(1));
}

#[test]
fn zero_timeout_is_clamped() {
    let settings = ClientSettings {
        request_timeout_secs: 0,
        ..ClientSettings::default()
    };
    assert_eq!(settings.request_timeout(), Duration::from_secs(1));
}
