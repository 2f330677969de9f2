//! JSON shapes returned by the REST API.
//!
//! Track objects come in two flavours: plain (`id`, `title`, ...) from search
//! and artist endpoints, and `track_`-prefixed from playlist listings, where
//! `id` is the playlist row and `track_id` the actual track.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::track::{Track, TrackId, sanitize_duration};

use super::{Account, BrowseEntry, EntryKind, Relation};

#[derive(Debug, Default, Deserialize)]
pub(super) struct WireTrack {
    id: Option<TrackId>,
    track_id: Option<TrackId>,
    title: Option<String>,
    track_title: Option<String>,
    image_url: Option<String>,
    track_image_url: Option<String>,
    audio_url: Option<String>,
    track_audio_url: Option<String>,
    duration: Option<f64>,
    track_duration: Option<f64>,
    artist_name: Option<String>,
}

impl WireTrack {
    /// Convert to a `Track`; entries without any id are dropped.
    pub(super) fn into_track(self) -> Option<Track> {
        let id = self.track_id.or(self.id)?;
        Some(Track {
            id,
            title: self.title.or(self.track_title).unwrap_or_default(),
            image_url: self.image_url.or(self.track_image_url),
            audio_url: self
                .track_audio_url
                .or(self.audio_url)
                .filter(|u| !u.trim().is_empty()),
            duration: sanitize_duration(self.duration.or(self.track_duration).unwrap_or(0.0)),
            artist_name: self.artist_name,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TracksResponse {
    #[serde(default)]
    pub tracks: Vec<WireTrack>,
}

/// Playlist or artist object, as returned by detail and list endpoints.
#[derive(Debug, Deserialize)]
pub(super) struct WireEntry {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub image_url: Option<String>,
    pub user_display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_following: bool,
}

impl WireEntry {
    pub(super) fn into_entry(self, kind: EntryKind, subtitle: Option<&str>) -> BrowseEntry {
        let subtitle = match kind {
            EntryKind::Playlist => self
                .user_display_name
                .or_else(|| subtitle.map(str::to_string)),
            EntryKind::Artist => subtitle.map(str::to_string),
        };
        BrowseEntry {
            kind,
            id: self.id,
            name: self.name,
            subtitle,
            image_url: self.image_url,
            updated_at: self.updated_at,
            owner_id: self.user_id,
            relation: if self.is_following {
                Relation::Followed
            } else {
                Relation::None
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PlaylistsResponse {
    #[serde(default)]
    pub playlists: Vec<WireEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArtistsResponse {
    #[serde(default)]
    pub artists: Vec<WireEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserResponse {
    pub user: WireUser,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireUser {
    #[serde(deserialize_with = "id_string")]
    id: String,
    display_name: Option<String>,
    username: Option<String>,
    email: Option<String>,
}

impl WireUser {
    pub(super) fn into_account(self) -> Account {
        let display_name = [self.display_name, self.username, self.email]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.id.clone());
        Account {
            id: self.id,
            display_name,
        }
    }
}

/// Body of a successful write; only the message is of interest.
#[derive(Debug, Default, Deserialize)]
pub(super) struct MessageResponse {
    pub message: Option<String>,
}

impl MessageResponse {
    /// Lenient parse: writes may answer with an empty or non-JSON body.
    pub(super) fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Object { message: Option<String> },
    Text(String),
}

/// Extract a human-readable message from an error response body.
pub(super) fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let msg = match parsed.error {
        Some(ErrorDetail::Object { message }) => message,
        Some(ErrorDetail::Text(text)) => Some(text),
        None => None,
    };
    msg.or(parsed.message).filter(|m| !m.trim().is_empty())
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "id_string")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(id)| id))
}

/// Accepts `true`/`false`, `1`/`0` and null.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Num(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Bool(b)) => b,
        Some(Raw::Num(n)) => n != 0,
        None => false,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}
