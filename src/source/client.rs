use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::ApiSettings;

use super::wire::{
    ArtistsResponse, MessageResponse, PlaylistsResponse, TracksResponse, UserResponse, WireEntry,
    WireTrack, error_message,
};
use super::{
    Account, AccountSource, BrowseEntry, BrowseSection, EntryKind, LibraryEdit, Queue,
    QueueContext, Relation, SourceError, TrackSource,
};

const SEARCH_LIMIT: usize = 20;
const HOME_LIMIT: usize = 14;
const LIBRARY_LIMIT: usize = 20;

/// Blocking client for the streaming service's REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    root: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(concat!("fermata/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            root: settings.api_root(),
            token: settings
                .access_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
        })
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, SourceError> {
        let body = self.send(Method::GET, endpoint, None)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Issue a request and return the body of a successful response.
    fn send(&self, method: Method, endpoint: &str, payload: Option<&Value>) -> Result<String, SourceError> {
        let url = format!("{}{}", self.root, endpoint);
        debug!(%url, %method, "request");

        let mut req = self.http.request(method, &url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(payload) = payload {
            req = req.json(payload);
        }

        let resp = req.send()?;
        let status = resp.status();
        let body = resp.text()?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            warn!(%url, status = status.as_u16(), %message, "API error");
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    fn require_token(&self) -> Result<(), SourceError> {
        match self.token {
            Some(_) => Ok(()),
            None => Err(SourceError::MissingToken),
        }
    }

    fn playlists(
        &self,
        endpoint: &str,
        subtitle: &str,
        relation: Option<Relation>,
    ) -> Result<Vec<BrowseEntry>, SourceError> {
        let resp: PlaylistsResponse = self.get(endpoint)?;
        Ok(resp
            .playlists
            .into_iter()
            .map(|p| with_relation(p.into_entry(EntryKind::Playlist, Some(subtitle)), relation))
            .collect())
    }

    fn artists(
        &self,
        endpoint: &str,
        subtitle: &str,
        relation: Option<Relation>,
    ) -> Result<Vec<BrowseEntry>, SourceError> {
        let resp: ArtistsResponse = self.get(endpoint)?;
        Ok(resp
            .artists
            .into_iter()
            .map(|a| with_relation(a.into_entry(EntryKind::Artist, Some(subtitle)), relation))
            .collect())
    }
}

/// Library listings know the relation better than the entry's own flags.
fn with_relation(mut entry: BrowseEntry, relation: Option<Relation>) -> BrowseEntry {
    if let Some(relation) = relation {
        entry.relation = relation;
    }
    entry
}

impl TrackSource for ApiClient {
    fn fetch_queue(&self, context: &QueueContext) -> Result<Queue, SourceError> {
        match context {
            QueueContext::Playlist(id) => {
                let id = urlencoding::encode(id);
                let detail: WireEntry = self.get(&format!("/playlists/{id}"))?;
                let tracks: TracksResponse = self.get(&format!("/playlists/{id}/tracks"))?;
                Ok(build_queue(context.clone(), Some(detail.name), tracks.tracks))
            }
            QueueContext::Artist(id) => {
                let id = urlencoding::encode(id);
                let detail: WireEntry = self.get(&format!("/artists/{id}"))?;
                let tracks: TracksResponse =
                    self.get(&format!("/artists/{id}/tracks/popular"))?;
                Ok(build_queue(context.clone(), Some(detail.name), tracks.tracks))
            }
            QueueContext::Search(query) => {
                let query = query.trim();
                if query.is_empty() {
                    return Ok(build_queue(context.clone(), None, Vec::new()));
                }
                let tracks: TracksResponse = self.get(&search_endpoint(query))?;
                Ok(build_queue(context.clone(), None, tracks.tracks))
            }
        }
    }

    fn browse(&self, section: BrowseSection) -> Result<Vec<BrowseEntry>, SourceError> {
        match section {
            BrowseSection::Home => {
                let mut entries = self.playlists(
                    &format!("/playlists?limit={HOME_LIMIT}&offset=0"),
                    "Playlist",
                    None,
                )?;
                entries.extend(self.artists(
                    &format!("/artists?limit={HOME_LIMIT}&offset=0"),
                    "Artist",
                    None,
                )?);
                Ok(entries)
            }
            BrowseSection::Library => {
                self.require_token()?;
                let mut entries =
                    self.playlists("/me/playlists", "Your playlist", Some(Relation::Owned))?;
                entries.extend(self.playlists(
                    &format!("/me/playlists/followed?limit={LIBRARY_LIMIT}&offset=0"),
                    "Followed playlist",
                    Some(Relation::Followed),
                )?);
                entries.extend(self.artists(
                    &format!("/me/following?limit={LIBRARY_LIMIT}&offset=0"),
                    "Artist",
                    Some(Relation::Followed),
                )?);
                Ok(entries)
            }
        }
    }
}

impl AccountSource for ApiClient {
    fn current_user(&self) -> Result<Account, SourceError> {
        self.require_token()?;
        let resp: UserResponse = self.get("/users/me")?;
        Ok(resp.user.into_account())
    }

    fn edit_library(&self, edit: &LibraryEdit) -> Result<String, SourceError> {
        self.require_token()?;
        let (method, endpoint, payload) = edit_request(edit);
        let body = self.send(method, &endpoint, payload.as_ref())?;
        info!(?edit, "library updated");
        Ok(MessageResponse::parse(&body)
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| edit.done_text()))
    }
}

/// Method, endpoint and JSON body for a library edit.
pub(super) fn edit_request(edit: &LibraryEdit) -> (Method, String, Option<Value>) {
    match edit {
        LibraryEdit::Follow { kind, id, .. } => (
            Method::POST,
            format!("/{}/{}/follow", kind.collection(), urlencoding::encode(id)),
            None,
        ),
        LibraryEdit::Unfollow { kind, id, .. } => (
            Method::DELETE,
            format!("/{}/{}/follow", kind.collection(), urlencoding::encode(id)),
            None,
        ),
        LibraryEdit::CreatePlaylist { name } => (
            Method::POST,
            "/playlists".to_string(),
            Some(json!({ "name": name })),
        ),
        LibraryEdit::RenamePlaylist { id, name } => (
            Method::PUT,
            format!("/playlists/{}", urlencoding::encode(id)),
            Some(json!({ "name": name })),
        ),
        LibraryEdit::DeletePlaylist { id, .. } => (
            Method::DELETE,
            format!("/playlists/{}", urlencoding::encode(id)),
            None,
        ),
    }
}

pub(super) fn search_endpoint(query: &str) -> String {
    format!(
        "/tracks?limit={SEARCH_LIMIT}&offset=0&q={}",
        urlencoding::encode(query)
    )
}

/// Assemble a queue; artist catalogs stamp the artist's name on every track.
pub(super) fn build_queue(
    context: QueueContext,
    detail_name: Option<String>,
    tracks: Vec<WireTrack>,
) -> Queue {
    let artist = match &context {
        QueueContext::Artist(_) => detail_name.clone(),
        _ => None,
    };

    let tracks = tracks
        .into_iter()
        .filter_map(WireTrack::into_track)
        .map(|mut t| {
            if artist.is_some() {
                t.artist_name = artist.clone();
            }
            t
        })
        .collect();

    let title = match &context {
        QueueContext::Search(q) => format!("Search: {q}"),
        _ => detail_name.unwrap_or_else(|| context.to_string()),
    };

    Queue {
        context,
        title,
        tracks,
    }
}
