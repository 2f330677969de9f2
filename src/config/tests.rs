use super::load::{default_config_path, default_log_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_fermata_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("FERMATA_CONFIG_PATH", "/tmp/fermata-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/fermata-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("fermata")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("fermata")
            .join("config.toml")
    );
}

#[test]
fn default_log_path_uses_xdg_state_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_STATE_HOME", "/tmp/state");
    assert_eq!(
        default_log_path().unwrap(),
        std::path::PathBuf::from("/tmp/state/fermata/fermata.log")
    );

    let _g2 = EnvGuard::remove("XDG_STATE_HOME");
    let _g3 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        default_log_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/state/fermata/fermata.log")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[api]
base_url = "http://localhost:8080"
access_token = "secret"
timeout_secs = 3
blocked_image_hosts = ["bad.test"]

[audio]
quit_fade_out_ms = 0
tick_ms = 100

[controls]
scrub_seconds = 9
search_debounce_ms = 50

[ui]
header_text = "hello"
now_playing_time_fields = ["elapsed", "remaining"]
now_playing_time_separator = " | "
notice_ms = 1000

[logging]
level = "debug"
file = "/tmp/fermata.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("FERMATA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("FERMATA__API__TIMEOUT_SECS");

    let s = Settings::load().unwrap();
    assert_eq!(s.api.base_url, "http://localhost:8080");
    assert_eq!(s.api.api_root(), "http://localhost:8080/api");
    assert_eq!(s.api.access_token.as_deref(), Some("secret"));
    assert_eq!(s.api.timeout_secs, 3);
    assert_eq!(s.api.blocked_image_hosts, vec!["bad.test".to_string()]);
    assert_eq!(s.api.placeholder_image, "placeholder.svg");
    assert_eq!(s.audio.quit_fade_out_ms, 0);
    assert_eq!(s.audio.tick_ms, 100);
    assert_eq!(s.controls.scrub_seconds, 9);
    assert_eq!(s.controls.search_debounce_ms, 50);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(
        s.ui.now_playing_time_fields,
        vec![TimeField::Elapsed, TimeField::Remaining]
    );
    assert_eq!(s.ui.now_playing_time_separator, " | ");
    assert_eq!(s.ui.notice_ms, 1000);
    assert_eq!(s.logging.level, "debug");
    assert_eq!(
        s.logging.file,
        Some(std::path::PathBuf::from("/tmp/fermata.log"))
    );
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[api]
timeout_secs = 15
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("FERMATA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("FERMATA__API__TIMEOUT_SECS", "4");

    let s = Settings::load().unwrap();
    assert_eq!(s.api.timeout_secs, 4);
}

#[test]
fn missing_config_file_yields_defaults() {
    let _lock = env_lock();
    let dir = tempfile::tempdir().unwrap();
    let _g1 = EnvGuard::set(
        "FERMATA_CONFIG_PATH",
        dir.path().join("absent.toml").to_str().unwrap(),
    );

    let s = Settings::load().unwrap();
    assert_eq!(s.api.base_url, ApiSettings::default().base_url);
    assert_eq!(s.controls.scrub_seconds, 5);
}

#[test]
fn validate_rejects_bad_base_url_and_zero_tick() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.api.base_url = "ftp://nope".into();
    assert!(s.validate().is_err());

    s.api.base_url = "https://ok.test".into();
    s.audio.tick_ms = 0;
    assert!(s.validate().is_err());

    s.audio.tick_ms = 250;
    s.audio.download_timeout_secs = 0;
    assert!(s.validate().is_err());
}

#[test]
fn to_toml_round_trips_through_loader_format() {
    let s = Settings::default();
    let text = s.to_toml().unwrap();
    assert!(text.contains("[api]"));
    assert!(text.contains("scrub_seconds = 5"));

    let back: Settings = toml::from_str(&text).unwrap();
    assert_eq!(back.api.base_url, s.api.base_url);
    assert_eq!(back.ui.now_playing_time_fields, s.ui.now_playing_time_fields);
}
