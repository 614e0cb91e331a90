use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings =
        load_settings_with_env(&dir.path().join("absent.toml"), env_from(&[])).expect("load");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.api_url, "https://backengine-y56e.fly.dev");
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    fs::write(
        &path,
        "api_url = \"http://localhost:8080\"\ntoken_file = \"/tmp/cellar.json\"\nrequest_timeout_seconds = 5\n",
    )
    .expect("write config");

    let settings = load_settings_with_env(&path, env_from(&[])).expect("load");
    assert_eq!(settings.api_url, "http://localhost:8080");
    assert_eq!(settings.token_file, Some(PathBuf::from("/tmp/cellar.json")));
    assert_eq!(settings.request_timeout_seconds, 5);
}

#[test]
fn environment_overrides_file_and_app_prefix_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    fs::write(&path, "api_url = \"http://from-file\"\n").expect("write config");

    let settings = load_settings_with_env(
        &path,
        env_from(&[
            ("CELLAR_API_URL", "http://from-cellar-env"),
            ("APP__API_URL", "http://from-app-env"),
            ("CELLAR_TOKEN_FILE", "/var/tmp/token.json"),
            ("APP__REQUEST_TIMEOUT_SECONDS", "12"),
        ]),
    )
    .expect("load");

    assert_eq!(settings.api_url, "http://from-app-env");
    assert_eq!(
        settings.token_file,
        Some(PathBuf::from("/var/tmp/token.json"))
    );
    assert_eq!(settings.request_timeout_seconds, 12);
}

#[test]
fn invalid_timeout_is_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_with_env(
        &dir.path().join("absent.toml"),
        env_from(&[("APP__REQUEST_TIMEOUT_SECONDS", "soon")]),
    )
    .expect("load");
    assert_eq!(settings.request_timeout_seconds, 30);
}

#[test]
fn zero_timeout_in_file_keeps_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    fs::write(
        &path,
        "api_url = \"http://localhost:8080\"\nrequest_timeout_seconds = 0\n",
    )
    .expect("write config");

    let settings = load_settings_with_env(&path, env_from(&[])).expect("load");
    assert_eq!(settings.api_url, "http://localhost:8080");
    assert_eq!(settings.request_timeout_seconds, 30);

    let overridden = load_settings_with_env(
        &path,
        env_from(&[("APP__REQUEST_TIMEOUT_SECONDS", "0")]),
    )
    .expect("load");
    assert_eq!(overridden.request_timeout_seconds, 30);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    fs::write(&path, "api_url = [").expect("write config");
    assert!(load_settings_with_env(&path, env_from(&[])).is_err());
}

#[test]
fn explicit_token_file_takes_precedence() {
    let settings = Settings {
        token_file: Some(PathBuf::from("/tmp/explicit.json")),
        ..Settings::default()
    };
    assert_eq!(
        settings.token_path().expect("token path"),
        PathBuf::from("/tmp/explicit.json")
    );
}
