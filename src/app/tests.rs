use super::*;
use crate::source::{
    Account, BrowseEntry, BrowseSection, EntryKind, LibraryEdit, LibrarySort, Queue, QueueContext,
    Relation,
};
use crate::track::Track;
use std::time::{Duration, Instant};

const DEBOUNCE: Duration = Duration::from_millis(300);
const NOTICE: Duration = Duration::from_millis(3000);

fn app() -> App {
    App::new(DEBOUNCE, NOTICE)
}

fn t(id: &str) -> Track {
    Track::new(id, id.to_uppercase())
}

fn entry(kind: EntryKind, id: &str, name: &str) -> BrowseEntry {
    BrowseEntry {
        kind,
        id: id.into(),
        name: name.into(),
        subtitle: None,
        image_url: None,
        updated_at: None,
        owner_id: None,
        relation: Relation::None,
    }
}

fn signed_in() -> App {
    let mut app = app();
    app.account = Some(Account {
        id: "me".into(),
        display_name: "Me".into(),
    });
    app
}

fn with_relation(mut e: BrowseEntry, relation: Relation) -> BrowseEntry {
    e.relation = relation;
    e
}

fn queue(context: QueueContext, ids: &[&str]) -> Queue {
    Queue {
        context,
        title: "Queue".into(),
        tracks: ids.iter().map(|id| t(id)).collect(),
    }
}

#[test]
fn selection_wraps_both_ways() {
    let mut app = app();
    app.set_entries(
        BrowseSection::Home,
        vec![
            entry(EntryKind::Playlist, "1", "One"),
            entry(EntryKind::Playlist, "2", "Two"),
            entry(EntryKind::Artist, "3", "Three"),
        ],
    );

    app.prev();
    assert_eq!(app.selected, 2);
    app.next();
    assert_eq!(app.selected, 0);
    app.next();
    assert_eq!(app.selected, 1);
}

#[test]
fn navigation_on_empty_list_is_noop() {
    let mut app = app();
    app.next();
    app.prev();
    assert_eq!(app.selected, 0);
    assert!(app.activate().is_none());
}

#[test]
fn activating_an_entry_opens_its_context() {
    let mut app = app();
    app.set_entries(
        BrowseSection::Home,
        vec![
            entry(EntryKind::Playlist, "p1", "Mix"),
            entry(EntryKind::Artist, "a9", "Band"),
        ],
    );
    app.next();

    match app.activate() {
        Some(Activation::Open(ctx)) => assert_eq!(ctx, QueueContext::Artist("a9".into())),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn playlist_selection_carries_the_whole_queue() {
    let mut app = app();
    assert!(app.set_queue(queue(
        QueueContext::Playlist("p".into()),
        &["a", "b", "c"]
    )));
    app.next();
    app.next();

    let sel = app.selection().unwrap();
    assert_eq!(sel.index, 2);
    assert_eq!(sel.tracks.len(), 3);
    assert_eq!(app.view, View::Tracks);
}

#[test]
fn search_selection_plays_only_that_track() {
    let mut app = app();
    app.expect_search("lofi");
    assert!(app.set_queue(queue(QueueContext::Search("lofi".into()), &["a", "b"])));
    app.next();

    let sel = app.selection().unwrap();
    assert_eq!(sel.index, 0);
    assert_eq!(sel.tracks.len(), 1);
    assert_eq!(sel.tracks[0].id.as_str(), "b");
}

#[test]
fn back_restores_browse_row() {
    let mut app = app();
    app.set_entries(
        BrowseSection::Home,
        vec![
            entry(EntryKind::Playlist, "1", "One"),
            entry(EntryKind::Playlist, "2", "Two"),
        ],
    );
    app.next();
    app.set_queue(queue(QueueContext::Playlist("2".into()), &["x", "y", "z"]));
    app.next();
    app.next();

    app.back();
    assert_eq!(app.view, View::Browse);
    assert_eq!(app.selected, 1);
}

#[test]
fn search_waits_for_debounce() {
    let mut app = app();
    let t0 = Instant::now();
    app.enter_search_mode();
    app.push_search_char('j', t0);
    app.push_search_char('a', t0 + Duration::from_millis(100));
    app.push_search_char('z', t0 + Duration::from_millis(200));

    assert_eq!(app.due_search(t0 + Duration::from_millis(400)), None);
    assert_eq!(
        app.due_search(t0 + Duration::from_millis(500)),
        Some("jaz".to_string())
    );
    // Fires once per edit.
    assert_eq!(app.due_search(t0 + Duration::from_millis(900)), None);
}

#[test]
fn blank_or_repeated_queries_are_not_sent() {
    let mut app = app();
    let t0 = Instant::now();
    app.push_search_char(' ', t0);
    assert_eq!(app.due_search(t0 + DEBOUNCE), None);

    app.push_search_char('a', t0);
    assert_eq!(app.due_search(t0 + DEBOUNCE), Some("a".to_string()));

    // Edit back to the same text while the request is in flight.
    app.push_search_char('b', t0);
    app.pop_search_char(t0);
    assert_eq!(app.due_search(t0 + DEBOUNCE), None);
}

#[test]
fn stale_search_results_are_dropped() {
    let mut app = app();
    let t0 = Instant::now();
    app.push_search_char('a', t0);
    app.due_search(t0 + DEBOUNCE);
    app.push_search_char('b', t0 + DEBOUNCE);
    app.due_search(t0 + DEBOUNCE * 2);

    assert!(!app.set_queue(queue(QueueContext::Search("a".into()), &["old"])));
    assert!(app.queue.is_none());
    assert!(app.set_queue(queue(QueueContext::Search("ab".into()), &["new"])));
    assert_eq!(app.tracks()[0].id.as_str(), "new");
}

#[test]
fn library_entries_follow_sort_order() {
    let mut app = app();
    assert_eq!(app.toggle_section(), BrowseSection::Library);
    app.set_entries(
        BrowseSection::Library,
        vec![
            entry(EntryKind::Playlist, "1", "beta"),
            entry(EntryKind::Artist, "2", "Alpha"),
        ],
    );

    let now = Instant::now();
    app.cycle_sort(now);
    assert_eq!(app.sort, LibrarySort::AToZ);
    assert_eq!(app.entries[0].name, "Alpha");
    assert_eq!(app.notice(now).unwrap().text, "Sorted by A-Z");

    app.cycle_sort(now);
    assert_eq!(app.entries[0].name, "beta");
    assert_eq!(app.title(), "Your Library (Z-A)");
}

#[test]
fn entries_for_hidden_section_are_ignored() {
    let mut app = app();
    app.toggle_section();
    app.set_entries(
        BrowseSection::Home,
        vec![entry(EntryKind::Playlist, "1", "One")],
    );
    assert!(app.entries.is_empty());
    assert!(app.loading);
}

#[test]
fn notices_expire() {
    let mut app = app();
    let now = Instant::now();
    app.notify_error("Sign in required", now);

    let n = app.notice(now + Duration::from_millis(2999)).unwrap();
    assert!(n.is_error);
    assert!(app.notice(now + NOTICE).is_none());
}

#[test]
fn follow_requires_an_account() {
    let mut app = app();
    let now = Instant::now();
    app.set_entries(BrowseSection::Home, vec![entry(EntryKind::Artist, "a", "Band")]);

    assert_eq!(app.follow_edit(now), None);
    assert_eq!(app.notice(now).unwrap().text, "Sign in to follow artists");
    assert_eq!(app.create_edit(now), None);
}

#[test]
fn follow_toggles_on_relation() {
    let mut app = signed_in();
    let now = Instant::now();
    app.set_entries(
        BrowseSection::Home,
        vec![
            entry(EntryKind::Artist, "a", "Band"),
            with_relation(entry(EntryKind::Playlist, "p", "Mix"), Relation::Followed),
        ],
    );

    assert_eq!(
        app.follow_edit(now),
        Some(LibraryEdit::Follow {
            kind: EntryKind::Artist,
            id: "a".into(),
            name: "Band".into()
        })
    );
    app.next();
    let unfollow = app.follow_edit(now).unwrap();
    assert!(matches!(unfollow, LibraryEdit::Unfollow { ref id, .. } if id == "p"));

    assert_eq!(app.apply_edit(&unfollow), None);
    assert_eq!(app.entries[1].relation, Relation::None);
}

#[test]
fn own_playlists_cannot_be_followed() {
    let mut app = signed_in();
    let now = Instant::now();
    let mut mine = entry(EntryKind::Playlist, "p", "Mine");
    mine.owner_id = Some("me".into());
    app.set_entries(BrowseSection::Home, vec![mine]);

    assert_eq!(app.follow_edit(now), None);
    assert_eq!(app.notice(now).unwrap().text, "Mine is your own playlist");
}

#[test]
fn rename_prompt_edits_own_playlist() {
    let mut app = signed_in();
    let now = Instant::now();
    app.toggle_section();
    app.set_entries(
        BrowseSection::Library,
        vec![with_relation(entry(EntryKind::Playlist, "p", "Old"), Relation::Owned)],
    );

    app.start_rename(now);
    assert_eq!(app.input_mode(), InputMode::Rename);
    for _ in 0..3 {
        app.pop_rename_char();
    }
    for c in "New ".chars() {
        app.push_rename_char(c);
    }

    let edit = app.finish_rename().unwrap();
    assert_eq!(
        edit,
        LibraryEdit::RenamePlaylist {
            id: "p".into(),
            name: "New".into()
        }
    );
    assert_eq!(app.input_mode(), InputMode::Normal);

    assert_eq!(app.apply_edit(&edit), Some(BrowseSection::Library));
    assert_eq!(app.entries[0].name, "New");
}

#[test]
fn unchanged_or_blank_rename_sends_nothing() {
    let mut app = signed_in();
    let now = Instant::now();
    app.set_entries(
        BrowseSection::Home,
        vec![with_relation(entry(EntryKind::Playlist, "p", "Same"), Relation::Owned)],
    );

    app.start_rename(now);
    assert_eq!(app.finish_rename(), None);

    app.start_rename(now);
    app.rename.as_mut().unwrap().text = "   ".into();
    assert_eq!(app.finish_rename(), None);
}

#[test]
fn foreign_playlist_cannot_be_renamed_or_deleted() {
    let mut app = signed_in();
    let now = Instant::now();
    app.set_entries(BrowseSection::Home, vec![entry(EntryKind::Playlist, "p", "Theirs")]);

    app.start_rename(now);
    assert!(app.rename.is_none());
    assert_eq!(app.delete_edit(now), None);
    assert_eq!(
        app.notice(now).unwrap().text,
        "Only your own playlists can be changed"
    );
}

#[test]
fn delete_needs_confirmation_within_notice_window() {
    let mut app = signed_in();
    let now = Instant::now();
    app.toggle_section();
    app.set_entries(
        BrowseSection::Library,
        vec![
            with_relation(entry(EntryKind::Playlist, "p", "Gone"), Relation::Owned),
            with_relation(entry(EntryKind::Artist, "a", "Band"), Relation::Followed),
        ],
    );

    assert_eq!(app.delete_edit(now), None);
    assert_eq!(app.notice(now).unwrap().text, "Press D again to delete Gone");

    // Too late: asks again instead of deleting.
    let late = now + NOTICE;
    assert_eq!(app.delete_edit(late), None);

    let edit = app.delete_edit(late + Duration::from_millis(10)).unwrap();
    assert_eq!(
        edit,
        LibraryEdit::DeletePlaylist {
            id: "p".into(),
            name: "Gone".into()
        }
    );

    app.apply_edit(&edit);
    assert_eq!(app.entries.len(), 1);
    assert_eq!(app.entries[0].id, "a");
}

#[test]
fn library_edits_are_ignored_in_track_view() {
    let mut app = signed_in();
    let now = Instant::now();
    app.set_entries(BrowseSection::Home, vec![entry(EntryKind::Artist, "a", "Band")]);
    app.set_queue(queue(QueueContext::Artist("a".into()), &["x"]));

    assert_eq!(app.follow_edit(now), None);
    assert!(app.notice(now).is_none());
}
