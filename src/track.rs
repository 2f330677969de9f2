//! Track value type shared by the playback core, the API client and the UI.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Opaque identifier of a track, unique within a single track list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The service emits both numeric and string ids.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Str(s) => Self(s),
            Raw::Num(n) => Self(n.to_string()),
        })
    }
}

/// A playable track as delivered by the streaming service.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    /// Length in seconds; never negative.
    pub duration: f64,
    /// Set contextually, e.g. when the track comes from an artist's catalog.
    pub artist_name: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(id),
            title: title.into(),
            image_url: None,
            audio_url: None,
            duration: 0.0,
            artist_name: None,
        }
    }

    #[cfg(test)]
    pub fn with_audio(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    #[cfg(test)]
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration = sanitize_duration(secs);
        self
    }

    /// "Artist - Title" when an artist is attached, the bare title otherwise.
    pub fn display(&self) -> String {
        match self.artist_name.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => format!("{} - {}", a, self.title.trim()),
            _ => self.title.clone(),
        }
    }
}

pub(crate) fn sanitize_duration(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 { secs } else { 0.0 }
}

/// Format seconds as `MM:SS`, flooring partial seconds.
///
/// Minutes are not wrapped into hours: one hour renders as `60:00`.
pub fn format_duration(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Resolve a track or playlist artwork reference for display.
///
/// Missing, empty or blocked-host references fall back to `placeholder`.
/// Root-relative paths are joined onto `origin`.
pub fn resolve_image(
    url: Option<&str>,
    origin: &str,
    placeholder: &str,
    blocked_hosts: &[String],
) -> String {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return placeholder.to_string();
    };

    if blocked_hosts
        .iter()
        .filter(|h| !h.is_empty())
        .any(|h| url.contains(h.as_str()))
    {
        return placeholder.to_string();
    }

    if url.starts_with('/') {
        return format!("{}{}", origin.trim_end_matches('/'), url);
    }

    url.to_string()
}
