//! Link index over a real notes folder

mod common;

use common::{assert_resolved, assert_symmetric, ids, NoteFolder};
use std::sync::Arc;
use zettel::{
    Config, FolderStore, NewNote, NoteId, NoteStore, StorageError, Warning, ZettelEngine,
    ZettelError,
};

#[test]
fn reload_reads_headers_titles_and_links() {
    let folder = NoteFolder::new();
    folder.write_note("1001", Some("Graph Theory"), "Nodes and edges.\n");
    folder.write_note("1002", Some("Paths"), "Builds on [[Graph Theory]] and [#1001].\n");
    std::fs::write(folder.dir.path().join("readme.txt"), "[#1001]").unwrap();

    let engine = folder.engine();
    assert_eq!(engine.len(), 2);

    let a = engine.lookup("1001").unwrap();
    assert_eq!(a.title.as_deref(), Some("Graph Theory"));
    assert_eq!(a.created_display(), "2024-03-01 09:30:00");
    assert_eq!(ids(&engine.inbound("1001").unwrap()), vec!["1002"]);
    assert_eq!(
        ids(&engine.outbound("1002").unwrap()),
        vec!["1001", "1001"]
    );
    assert_symmetric(&engine);
}

#[test]
fn untitled_note_is_labelled_by_preview() {
    let folder = NoteFolder::new();
    folder.write_note("1001", None, "A thought without a heading at all\n");
    let engine = folder.engine();
    assert_eq!(
        engine.lookup("1001").unwrap().label(),
        "A thought without a..."
    );
}

#[test]
fn malformed_created_header_falls_back_to_registration_time() {
    let folder = NoteFolder::new();
    folder.write("1001", "---\nCreated: sometime\n---\n# T\n");
    let before = chrono::Utc::now();
    let engine = folder.engine();
    let note = engine.lookup("1001").unwrap();
    assert!(note.created_at >= before - chrono::Duration::seconds(1));
    assert_eq!(note.title.as_deref(), Some("T"));
}

#[test]
fn new_note_creates_the_file() {
    let folder = NoteFolder::new();
    let engine = folder.engine();

    let note = engine
        .new_note(NewNote::new().with_title("Fresh"))
        .unwrap();
    let content = folder.read(note.id.as_str());
    assert!(content.contains(&format!("UID: {}\n", note.id)));
    assert!(content.contains("# Fresh\n"));
    assert_eq!(engine.lookup_by_title("Fresh").unwrap().id, note.id);
}

#[test]
fn new_note_never_overwrites_an_unindexed_file() {
    let folder = NoteFolder::new();
    let engine = folder.engine();
    // Appears after the scan, so the index does not know it yet
    folder.write("1001", "# Precious\n");

    let err = engine.new_note(NewNote::new().with_id("1001")).unwrap_err();
    assert!(matches!(
        err,
        ZettelError::Storage(StorageError::AlreadyExists(_))
    ));
    assert!(engine.lookup("1001").is_none());
    assert_eq!(folder.read("1001"), "# Precious\n");
}

#[test]
fn follow_creates_the_missing_note_on_disk() {
    let folder = NoteFolder::new();
    folder.write_note("1001", Some("Start"), "Next: [#1002]\n");
    let engine = folder.engine();

    let token = engine.lookup("1001").unwrap().links[0].clone();
    let created = engine.follow(&token).unwrap();
    assert_eq!(created.id.as_str(), "1002");
    assert!(folder.path("1002").exists());
    assert!(engine.lookup("1001").unwrap().dead_links.is_empty());
    assert_resolved(&engine);
}

#[test]
fn touch_rewrites_modified_on_disk() {
    let folder = NoteFolder::new();
    folder.write_note("1001", Some("T"), "");
    let engine = folder.engine();

    assert!(engine.touch(&NoteId::from("1001")).unwrap());
    let content = folder.read("1001");
    assert!(content.contains("Created: 2024-03-01T09:30:00.000Z"));
    assert!(!content.contains("Modified: 2024-03-01T09:30:00.000Z"));
}

#[test]
fn deleting_the_file_and_refreshing_removes_the_note() {
    let folder = NoteFolder::new();
    folder.write_note("1001", None, "");
    folder.write_note("1002", None, "[#1001]");
    let engine = folder.engine();

    folder.delete("1001");
    engine.refresh(&NoteId::from("1001")).unwrap();
    assert!(engine.lookup("1001").is_none());
    let b = engine.lookup("1002").unwrap();
    assert!(b.outbound.is_empty());
    assert!(matches!(b.warnings[0], Warning::Unconnected { .. }));
}

#[test]
fn unreadable_note_does_not_abort_reload() {
    let folder = NoteFolder::new();
    folder.write_note("good", Some("Good"), "");
    std::fs::write(folder.path("bad"), [0xff, 0xfe, 0x00]).unwrap();

    let engine = folder.engine();
    assert!(engine.lookup("good").is_some());
    assert!(engine.lookup("bad").is_none());
}

#[test]
fn config_file_drives_folder_scheme_and_rules() {
    let workspace = tempfile::TempDir::new().unwrap();
    std::fs::write(
        workspace.path().join(".zettel.yaml"),
        "notes_folder: ${workspaceFolder}/zettels\nextension: .txt\nurl_scheme: note\nwarn_dead_links: true\n",
    )
    .unwrap();

    let config = Config::load(None, workspace.path()).unwrap();
    let folder = config.notes_folder(workspace.path());
    assert_eq!(folder, workspace.path().join("zettels"));

    let store = Arc::new(FolderStore::open(&folder, &config.extension).unwrap());
    std::fs::write(folder.join("a.txt"), "note://b zettel://b [[Gone]]").unwrap();
    std::fs::write(folder.join("b.txt"), "# B\n").unwrap();
    std::fs::write(folder.join("c.md"), "ignored").unwrap();

    let engine = ZettelEngine::with_config(store.clone(), &config);
    engine.reload_all().unwrap();

    assert_eq!(engine.len(), 2);
    assert_eq!(engine.url_scheme(), "note");
    let a = engine.lookup("a").unwrap();
    assert_eq!(a.outbound, vec![NoteId::from("b")]);
    assert_eq!(a.links.len(), 2);
    assert!(matches!(a.warnings[0], Warning::DeadLinks { count: 1, .. }));
    assert_eq!(store.list_ids().unwrap().len(), 2);
}
