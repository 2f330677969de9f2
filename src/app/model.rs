//! Application model types: `App`, `View` and `Notice`.
//!
//! The `App` struct holds what the terminal shows besides the now-playing
//! area: the browse lists, the open track list, the search input and the
//! transient status line, plus the signed-in account and the prompts used to
//! edit the user's library.

use std::time::{Duration, Instant};

use crate::playback::Selection;
use crate::source::{
    Account, BrowseEntry, BrowseSection, EntryKind, LibraryEdit, LibrarySort, NEW_PLAYLIST_NAME,
    Queue, QueueContext, Relation, sort_entries,
};
use crate::track::Track;

/// Which list occupies the main pane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum View {
    /// Playlists and artists of the current `BrowseSection`.
    #[default]
    Browse,
    /// Tracks of the open queue.
    Tracks,
}

/// What Enter on the selected row asks the runtime to do.
#[derive(Debug, Clone)]
pub enum Activation {
    Open(QueueContext),
    Play(Selection),
}

/// Which text input, if any, receives typed characters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Rename,
}

/// New name being typed for one of the user's playlists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePrompt {
    pub id: String,
    pub old_name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingDelete {
    id: String,
    until: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
    until: Instant,
}

/// The main application model.
pub struct App {
    pub section: BrowseSection,
    pub entries: Vec<BrowseEntry>,
    pub sort: LibrarySort,
    pub view: View,
    pub queue: Option<Queue>,
    pub selected: usize,
    /// Browse row to return to when leaving the track list.
    browse_selected: usize,
    pub loading: bool,

    pub search_mode: bool,
    pub search_query: String,
    search_edited_at: Option<Instant>,
    /// Query of the search currently in flight; older results are dropped.
    awaited_search: Option<String>,

    /// Signed-in user; `None` until `/users/me` answers, or without a token.
    pub account: Option<Account>,
    pub rename: Option<RenamePrompt>,
    /// Delete asked for once; a second request before `until` confirms it.
    pending_delete: Option<PendingDelete>,

    notice: Option<Notice>,
    debounce: Duration,
    notice_ttl: Duration,
}

impl App {
    pub fn new(debounce: Duration, notice_ttl: Duration) -> Self {
        Self {
            section: BrowseSection::Home,
            entries: Vec::new(),
            sort: LibrarySort::default(),
            view: View::Browse,
            queue: None,
            selected: 0,
            browse_selected: 0,
            loading: false,

            search_mode: false,
            search_query: String::new(),
            search_edited_at: None,
            awaited_search: None,

            account: None,
            rename: None,
            pending_delete: None,

            notice: None,
            debounce,
            notice_ttl,
        }
    }

    /// Rows in the list currently shown.
    pub fn row_count(&self) -> usize {
        match self.view {
            View::Browse => self.entries.len(),
            View::Tracks => self.tracks().len(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        self.queue.as_ref().map_or(&[][..], |q| q.tracks.as_slice())
    }

    /// Heading for the main pane.
    pub fn title(&self) -> String {
        match (self.view, self.section) {
            (View::Tracks, _) => self
                .queue
                .as_ref()
                .map_or_else(String::new, |q| q.title.clone()),
            (View::Browse, BrowseSection::Home) => "Home".to_string(),
            (View::Browse, BrowseSection::Library) => format!("Your Library ({})", self.sort.label()),
        }
    }

    /// Move selection to the next row, wrapping to the first.
    pub fn next(&mut self) {
        let len = self.row_count();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    /// Move selection to the previous row, wrapping to the last.
    pub fn prev(&mut self) {
        let len = self.row_count();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    fn clamp_selected(&mut self) {
        let len = self.row_count();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Switch between home and library. Returns the section to fetch.
    pub fn toggle_section(&mut self) -> BrowseSection {
        self.section = match self.section {
            BrowseSection::Home => BrowseSection::Library,
            BrowseSection::Library => BrowseSection::Home,
        };
        self.entries.clear();
        self.view = View::Browse;
        self.selected = 0;
        self.browse_selected = 0;
        self.loading = true;
        self.section
    }

    /// Install fetched browse entries. Entries for a section that is no
    /// longer shown are ignored.
    pub fn set_entries(&mut self, section: BrowseSection, mut entries: Vec<BrowseEntry>) {
        if section != self.section {
            return;
        }
        if section == BrowseSection::Library {
            sort_entries(&mut entries, self.sort);
        }
        self.entries = entries;
        self.loading = false;
        if self.view == View::Browse {
            self.clamp_selected();
        }
    }

    /// Cycle the library sort order. Only meaningful on the library screen.
    pub fn cycle_sort(&mut self, now: Instant) {
        if self.section != BrowseSection::Library {
            return;
        }
        self.sort = self.sort.next();
        sort_entries(&mut self.entries, self.sort);
        if self.view == View::Browse {
            self.selected = 0;
        }
        self.notify(format!("Sorted by {}", self.sort.label()), now);
    }

    /// Open a fetched queue. Returns false when the result belongs to a
    /// search that has since been superseded.
    pub fn set_queue(&mut self, queue: Queue) -> bool {
        if let QueueContext::Search(q) = &queue.context {
            if self.awaited_search.as_deref() != Some(q.as_str()) {
                return false;
            }
            self.awaited_search = None;
        }
        if self.view == View::Browse {
            self.browse_selected = self.selected;
        }
        self.queue = Some(queue);
        self.view = View::Tracks;
        self.selected = 0;
        self.loading = false;
        true
    }

    /// Leave the track list for the browse list.
    pub fn back(&mut self) {
        if self.view == View::Tracks {
            self.view = View::Browse;
            self.selected = self.browse_selected;
            self.clamp_selected();
        }
    }

    /// What Enter on the selected row means.
    pub fn activate(&self) -> Option<Activation> {
        match self.view {
            View::Browse => self
                .entries
                .get(self.selected)
                .map(|e| Activation::Open(e.context())),
            View::Tracks => self.selection().map(Activation::Play),
        }
    }

    /// Selection request for the highlighted track.
    ///
    /// Search results are not a queue of their own: picking one plays just
    /// that track.
    pub fn selection(&self) -> Option<Selection> {
        let queue = self.queue.as_ref()?;
        let track = queue.tracks.get(self.selected)?;
        Some(match queue.context {
            QueueContext::Search(_) => Selection {
                tracks: vec![track.clone()],
                index: 0,
            },
            _ => Selection {
                tracks: queue.tracks.clone(),
                index: self.selected,
            },
        })
    }

    pub fn enter_search_mode(&mut self) {
        self.search_mode = true;
    }

    pub fn exit_search_mode(&mut self) {
        self.search_mode = false;
    }

    /// Leave search mode and discard the typed query.
    pub fn cancel_search(&mut self) {
        self.search_mode = false;
        self.search_query.clear();
        self.search_edited_at = None;
    }

    pub fn push_search_char(&mut self, c: char, now: Instant) {
        self.search_query.push(c);
        self.search_edited_at = Some(now);
    }

    pub fn pop_search_char(&mut self, now: Instant) {
        self.search_query.pop();
        self.search_edited_at = Some(now);
    }

    /// Return the query to send once typing has paused for the debounce
    /// period. Each edit yields at most one query.
    pub fn due_search(&mut self, now: Instant) -> Option<String> {
        let edited = self.search_edited_at?;
        if now.duration_since(edited) < self.debounce {
            return None;
        }
        self.search_edited_at = None;

        let query = self.search_query.trim();
        if query.is_empty() {
            self.awaited_search = None;
            return None;
        }
        if self.awaited_search.as_deref() == Some(query) {
            return None;
        }
        self.awaited_search = Some(query.to_string());
        self.loading = true;
        Some(query.to_string())
    }

    /// Mark a search as sent without waiting for the debounce.
    pub fn expect_search(&mut self, query: &str) {
        self.search_edited_at = None;
        self.awaited_search = Some(query.trim().to_string());
        self.loading = true;
    }

    pub fn input_mode(&self) -> InputMode {
        if self.rename.is_some() {
            InputMode::Rename
        } else if self.search_mode {
            InputMode::Search
        } else {
            InputMode::Normal
        }
    }

    /// Highlighted browse entry, only while the browse list is shown.
    pub fn selected_entry(&self) -> Option<&BrowseEntry> {
        match self.view {
            View::Browse => self.entries.get(self.selected),
            View::Tracks => None,
        }
    }

    fn require_account(&mut self, what: &str, now: Instant) -> bool {
        if self.account.is_none() {
            self.notify(format!("Sign in to {what}"), now);
            return false;
        }
        true
    }

    /// Follow or unfollow the highlighted playlist or artist.
    pub fn follow_edit(&mut self, now: Instant) -> Option<LibraryEdit> {
        let entry = self.selected_entry()?.clone();
        let what = match entry.kind {
            EntryKind::Playlist => "follow playlists",
            EntryKind::Artist => "follow artists",
        };
        if !self.require_account(what, now) {
            return None;
        }
        if entry.is_owned_by(self.account.as_ref()) {
            self.notify(format!("{} is your own playlist", entry.name), now);
            return None;
        }
        Some(match entry.relation {
            Relation::Followed => LibraryEdit::Unfollow {
                kind: entry.kind,
                id: entry.id,
                name: entry.name,
            },
            _ => LibraryEdit::Follow {
                kind: entry.kind,
                id: entry.id,
                name: entry.name,
            },
        })
    }

    pub fn create_edit(&mut self, now: Instant) -> Option<LibraryEdit> {
        if !self.require_account("create playlists", now) {
            return None;
        }
        Some(LibraryEdit::CreatePlaylist {
            name: NEW_PLAYLIST_NAME.to_string(),
        })
    }

    /// The highlighted entry if it is one of the user's playlists.
    fn own_playlist(&mut self, now: Instant) -> Option<BrowseEntry> {
        let entry = self.selected_entry()?.clone();
        if entry.is_owned_by(self.account.as_ref()) {
            Some(entry)
        } else {
            self.notify("Only your own playlists can be changed", now);
            None
        }
    }

    /// Open the rename prompt for the highlighted playlist.
    pub fn start_rename(&mut self, now: Instant) {
        if let Some(entry) = self.own_playlist(now) {
            self.rename = Some(RenamePrompt {
                id: entry.id,
                text: entry.name.clone(),
                old_name: entry.name,
            });
        }
    }

    pub fn push_rename_char(&mut self, c: char) {
        if let Some(prompt) = &mut self.rename {
            prompt.text.push(c);
        }
    }

    pub fn pop_rename_char(&mut self) {
        if let Some(prompt) = &mut self.rename {
            prompt.text.pop();
        }
    }

    pub fn cancel_rename(&mut self) {
        self.rename = None;
    }

    /// Close the prompt. Blank or unchanged names send nothing.
    pub fn finish_rename(&mut self) -> Option<LibraryEdit> {
        let prompt = self.rename.take()?;
        let name = prompt.text.trim();
        if name.is_empty() || name == prompt.old_name {
            return None;
        }
        Some(LibraryEdit::RenamePlaylist {
            id: prompt.id,
            name: name.to_string(),
        })
    }

    /// Delete the highlighted playlist once the request is repeated while
    /// the confirmation notice is still up.
    pub fn delete_edit(&mut self, now: Instant) -> Option<LibraryEdit> {
        let entry = self.own_playlist(now)?;
        let confirmed = self
            .pending_delete
            .take()
            .is_some_and(|p| p.id == entry.id && now < p.until);
        if confirmed {
            return Some(LibraryEdit::DeletePlaylist {
                id: entry.id,
                name: entry.name,
            });
        }
        self.pending_delete = Some(PendingDelete {
            id: entry.id,
            until: now + self.notice_ttl,
        });
        self.notify(format!("Press D again to delete {}", entry.name), now);
        None
    }

    /// Reflect a successful edit in the lists already on screen. Returns
    /// the section to refetch, if any.
    pub fn apply_edit(&mut self, edit: &LibraryEdit) -> Option<BrowseSection> {
        match edit {
            LibraryEdit::Follow { kind, id, .. } => self.set_relation(*kind, id, Relation::Followed),
            LibraryEdit::Unfollow { kind, id, .. } => self.set_relation(*kind, id, Relation::None),
            LibraryEdit::RenamePlaylist { id, name } => {
                for e in self.entries.iter_mut() {
                    if e.kind == EntryKind::Playlist && &e.id == id {
                        e.name = name.clone();
                    }
                }
            }
            LibraryEdit::DeletePlaylist { id, .. } => {
                self.entries
                    .retain(|e| !(e.kind == EntryKind::Playlist && &e.id == id));
                if self.view == View::Browse {
                    self.clamp_selected();
                }
            }
            LibraryEdit::CreatePlaylist { .. } => {}
        }
        (self.section == BrowseSection::Library).then_some(BrowseSection::Library)
    }

    fn set_relation(&mut self, kind: EntryKind, id: &str, relation: Relation) {
        for e in self.entries.iter_mut() {
            if e.kind == kind && e.id == id && e.relation != Relation::Owned {
                e.relation = relation;
            }
        }
    }

    pub fn notify(&mut self, text: impl Into<String>, now: Instant) {
        self.set_notice(text.into(), false, now);
    }

    pub fn notify_error(&mut self, text: impl Into<String>, now: Instant) {
        self.set_notice(text.into(), true, now);
    }

    fn set_notice(&mut self, text: String, is_error: bool, now: Instant) {
        self.notice = Some(Notice {
            text,
            is_error,
            until: now + self.notice_ttl,
        });
    }

    /// The status notice, if it has not expired yet.
    pub fn notice(&self, now: Instant) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| now < n.until)
    }
}
