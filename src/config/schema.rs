use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/fermata/config.toml` or `~/.config/fermata/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `FERMATA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Service origin, without the `/api` suffix.
    pub base_url: String,
    /// Bearer token sent with every request. Required for the library screen.
    pub access_token: Option<String>,
    /// Per-request timeout (seconds).
    pub timeout_secs: u64,
    /// Artwork shown when a track has no usable image.
    pub placeholder_image: String,
    /// Image hosts that are known to serve broken links.
    pub blocked_image_hosts: Vec<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://spotify.f8team.dev".to_string(),
            access_token: None,
            timeout_secs: 15,
            placeholder_image: "placeholder.svg".to_string(),
            blocked_image_hosts: vec!["example.com".to_string()],
        }
    }
}

impl ApiSettings {
    /// Base URL of the REST endpoints.
    pub fn api_root(&self) -> String {
        format!("{}/api", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Interval between position reports from the audio thread (milliseconds).
    pub tick_ms: u64,
    /// Upper bound on a whole media download (seconds).
    pub download_timeout_secs: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            quit_fade_out_ms: 300,
            tick_ms: 250,
            download_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which time fields to show next to the progress bar, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,

    /// How long status notices stay visible (milliseconds).
    pub notice_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ fermata ~ ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total],
            now_playing_time_separator: " / ".to_string(),
            notice_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Quiet period after the last keystroke before a search is sent (milliseconds).
    pub search_debounce_ms: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            search_debounce_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Log file; defaults to `$XDG_STATE_HOME/fermata/fermata.log`.
    pub file: Option<std::path::PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}
