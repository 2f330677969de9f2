//! Track lists from the streaming service.
//!
//! `TrackSource` is the seam between the UI and the REST API; `ApiClient`
//! implements it over HTTP and `Fetcher` runs it on a worker thread so the
//! terminal never blocks on the network.

mod client;
mod fetcher;
mod wire;

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::track::Track;

pub use client::ApiClient;
pub use fetcher::{FetchRequest, FetchResult, Fetcher};

/// Name given to playlists created from the library screen.
pub const NEW_PLAYLIST_NAME: &str = "My Playlist";

/// Where a queue comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueContext {
    Playlist(String),
    Artist(String),
    Search(String),
}

impl fmt::Display for QueueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playlist(id) => write!(f, "playlist {id}"),
            Self::Artist(id) => write!(f, "artist {id}"),
            Self::Search(q) => write!(f, "search {q:?}"),
        }
    }
}

/// An ordered track list plus the name of what it was fetched for.
#[derive(Debug, Clone)]
pub struct Queue {
    pub context: QueueContext,
    pub title: String,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Playlist,
    Artist,
}

impl EntryKind {
    /// Path segment of the REST collection.
    fn collection(self) -> &'static str {
        match self {
            Self::Playlist => "playlists",
            Self::Artist => "artists",
        }
    }
}

/// How the signed-in user relates to a browse entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Relation {
    #[default]
    None,
    Owned,
    Followed,
}

/// A playlist or artist shown on the browse screens.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseEntry {
    pub kind: EntryKind,
    pub id: String,
    pub name: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Account that created the playlist, when the API says.
    pub owner_id: Option<String>,
    pub relation: Relation,
}

impl BrowseEntry {
    pub fn context(&self) -> QueueContext {
        match self.kind {
            EntryKind::Playlist => QueueContext::Playlist(self.id.clone()),
            EntryKind::Artist => QueueContext::Artist(self.id.clone()),
        }
    }

    /// True for playlists created by `account`.
    pub fn is_owned_by(&self, account: Option<&Account>) -> bool {
        if self.kind != EntryKind::Playlist {
            return false;
        }
        self.relation == Relation::Owned
            || matches!((account, &self.owner_id), (Some(a), Some(owner)) if &a.id == owner)
    }
}

/// The signed-in user, from `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub display_name: String,
}

/// A change to the signed-in user's library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEdit {
    Follow { kind: EntryKind, id: String, name: String },
    Unfollow { kind: EntryKind, id: String, name: String },
    CreatePlaylist { name: String },
    RenamePlaylist { id: String, name: String },
    DeletePlaylist { id: String, name: String },
}

impl LibraryEdit {
    /// Status text shown when the API does not send its own message.
    pub fn done_text(&self) -> String {
        match self {
            Self::Follow { name, .. } => format!("Followed {name}"),
            Self::Unfollow { name, .. } => format!("Unfollowed {name}"),
            Self::CreatePlaylist { name } => format!("Created {name}"),
            Self::RenamePlaylist { name, .. } => format!("Renamed to {name}"),
            Self::DeletePlaylist { name, .. } => format!("Deleted {name}"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BrowseSection {
    /// Featured playlists and artists.
    Home,
    /// The signed-in user's own and followed playlists and artists.
    Library,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LibrarySort {
    #[default]
    Recents,
    AToZ,
    ZToA,
}

impl LibrarySort {
    pub fn next(self) -> Self {
        match self {
            Self::Recents => Self::AToZ,
            Self::AToZ => Self::ZToA,
            Self::ZToA => Self::Recents,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Recents => "Recents",
            Self::AToZ => "A-Z",
            Self::ZToA => "Z-A",
        }
    }
}

/// Stable in-place sort of browse entries.
pub fn sort_entries(entries: &mut [BrowseEntry], sort: LibrarySort) {
    match sort {
        LibrarySort::AToZ => entries.sort_by_cached_key(|e| e.name.to_lowercase()),
        LibrarySort::ZToA => {
            entries.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase()))
        }
        // Newest first; entries without a timestamp go last.
        LibrarySort::Recents => entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Sign in required: set api.access_token")]
    MissingToken,
}

/// Supplier of ordered track lists.
pub trait TrackSource {
    fn fetch_queue(&self, context: &QueueContext) -> Result<Queue, SourceError>;
    fn browse(&self, section: BrowseSection) -> Result<Vec<BrowseEntry>, SourceError>;
}

/// The signed-in user's account and library. Every call needs a token.
pub trait AccountSource {
    fn current_user(&self) -> Result<Account, SourceError>;
    /// Apply `edit` and return the status text to show.
    fn edit_library(&self, edit: &LibraryEdit) -> Result<String, SourceError>;
}
