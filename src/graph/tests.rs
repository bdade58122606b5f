//! Graph scenario tests: link maintenance across create, edit and delete

use super::*;
use crate::analysis::{LinkKind, NoteAnalyzer};
use crate::storage::MemoryStore;
use std::sync::Arc;

fn engine(notes: &[(&str, &str)]) -> (Arc<MemoryStore>, ZettelEngine) {
    let store = Arc::new(MemoryStore::new());
    for (id, content) in notes {
        store.insert(*id, *content);
    }
    let engine = ZettelEngine::new(store.clone());
    engine.reload_all().unwrap();
    (store, engine)
}

fn edit(store: &MemoryStore, engine: &ZettelEngine, id: &str, content: &str) {
    store.insert(id, content);
    engine.refresh(&NoteId::from(id)).unwrap();
}

fn note(engine: &ZettelEngine, id: &str) -> Note {
    engine.lookup(id).unwrap()
}

fn unconnected(note: &Note) -> bool {
    matches!(note.warnings.as_slice(), [Warning::Unconnected { .. }])
}

fn registry_with(notes: &[(&str, &str)]) -> NoteRegistry {
    let analyzer = NoteAnalyzer::default();
    let mut registry = NoteRegistry::new();
    for (id, content) in notes {
        let id = NoteId::from(*id);
        registry.create(id.clone(), None).unwrap();
        registry.apply_content(&id, analyzer.analyze(&id, content));
    }
    registry.relink_all();
    registry
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_empty_note_is_unconnected() {
    let (_, engine) = engine(&[("1001", "")]);
    let a = note(&engine, "1001");
    assert!(unconnected(&a));
    assert!(a.warnings[0].to_string().starts_with("Unconnected: "));
}

#[test]
fn scenario_reference_links_both_ways() {
    let (store, engine) = engine(&[("1001", "")]);
    edit(&store, &engine, "2002", "See [#1001].");

    let a = note(&engine, "1001");
    let b = note(&engine, "2002");
    assert_eq!(b.outbound, vec![NoteId::from("1001")]);
    assert_eq!(a.inbound.iter().collect::<Vec<_>>(), vec![&b.id]);
    assert!(a.warnings.is_empty());
    assert!(b.warnings.is_empty());
}

#[test]
fn scenario_removing_the_link_retracts_it() {
    let (store, engine) = engine(&[("1001", ""), ("2002", "See [#1001].")]);
    edit(&store, &engine, "2002", "Nothing to see.");

    let a = note(&engine, "1001");
    assert!(a.inbound.is_empty());
    assert!(unconnected(&a));
    assert!(unconnected(&note(&engine, "2002")));
}

#[test]
fn scenario_missing_title_is_a_dead_link() {
    let (_, engine) = engine(&[("3003", "[[Missing Title]]")]);
    let c = note(&engine, "3003");
    assert!(c.outbound.is_empty());
    assert_eq!(c.dead_links.len(), 1);
    assert_eq!(c.dead_links[0].kind, LinkKind::Wiki);
    assert_eq!(c.dead_links[0].payload, "Missing Title");
}

#[test]
fn scenario_deleting_the_target_retracts_it_everywhere() {
    let (store, engine) = engine(&[("1001", ""), ("2002", "See [#1001].")]);
    store.delete(&NoteId::from("1001"));
    engine.refresh(&NoteId::from("1001")).unwrap();

    assert!(engine.lookup("1001").is_none());
    let b = note(&engine, "2002");
    assert!(b.outbound.is_empty());
    assert_eq!(b.dead_links.len(), 1);
    assert!(unconnected(&b));
}

// ============================================================================
// Laws
// ============================================================================

#[test]
fn symmetry_holds_through_edits() {
    let (store, engine) = engine(&[
        ("a", "# A\n[#b] [[C]]"),
        ("b", "# B\n[#a]"),
        ("c", "# C\n"),
    ]);
    edit(&store, &engine, "a", "# A\n[#c] [#c]");
    edit(&store, &engine, "c", "# C\n[[B]]");
    engine.remove(&NoteId::from("b")).unwrap();

    for n in engine.list_all() {
        for target in &n.outbound {
            assert!(note(&engine, target.as_str()).inbound.contains(&n.id));
        }
        for source in &n.inbound {
            assert!(note(&engine, source.as_str()).outbound.contains(&n.id));
        }
    }
}

#[test]
fn outbound_keeps_document_order_and_repeats() {
    let (_, engine) = engine(&[("a", "[#c] [#b] [#c]"), ("b", ""), ("c", "")]);
    let a = note(&engine, "a");
    let ids: Vec<_> = a.outbound.iter().map(NoteId::as_str).collect();
    assert_eq!(ids, vec!["c", "b", "c"]);
    assert_eq!(note(&engine, "c").inbound.len(), 1);
}

#[test]
fn relink_on_unchanged_content_is_idempotent() {
    let mut registry = registry_with(&[("a", "[#b] [[Nope]]"), ("b", "# B\n[#a]")]);
    let before: Vec<_> = registry.list_all().cloned().collect();

    registry.relink(&NoteId::from("a"));
    registry.relink(&NoteId::from("a"));
    registry.refresh_warnings(&registry.ids());

    for note in before {
        assert_eq!(registry.lookup(&note.id), Some(&note));
    }
    assert!(registry.is_symmetric());
}

#[test]
fn reprocessing_the_same_content_changes_nothing() {
    let (store, engine) = engine(&[("a", "# A\n[#b]"), ("b", "")]);
    let before = engine.list_all();
    edit(&store, &engine, "a", "# A\n[#b]");
    assert_eq!(engine.list_all(), before);
}

#[test]
fn unconnected_iff_no_edges_in_either_direction() {
    let (_, engine) = engine(&[
        ("lonely", "# Lonely\n"),
        ("out", "[#in]"),
        ("in", ""),
        ("self", "[#self]"),
    ]);
    for n in engine.list_all() {
        let isolated = n.outbound.is_empty() && n.inbound.is_empty();
        assert_eq!(unconnected(&n), isolated, "note {}", n.id);
    }
    assert!(unconnected(&note(&engine, "lonely")));
    assert!(note(&engine, "self").warnings.is_empty());
}

#[test]
fn deleted_note_is_gone_from_every_neighbour() {
    let (_, engine) = engine(&[("a", "[#b]"), ("b", "[#c] [#a]"), ("c", "[#b]")]);
    let removed = engine.remove(&NoteId::from("b")).unwrap();

    assert!(removed.inbound.is_empty());
    assert!(removed.outbound.is_empty());
    assert!(engine.lookup("b").is_none());
    for n in engine.list_all() {
        assert!(!n.outbound.contains(&removed.id));
        assert!(!n.inbound.contains(&removed.id));
    }
    assert!(unconnected(&note(&engine, "a")));
}

/// Known policy: the most recently processed note holding a title wins.
#[test]
fn title_collision_latest_wins() {
    let (store, engine) = engine(&[("a", "# Shared\n")]);
    edit(&store, &engine, "b", "# Shared\n");

    assert_eq!(engine.lookup_by_title("Shared").unwrap().id.as_str(), "b");
    assert_eq!(note(&engine, "a").title.as_deref(), Some("Shared"));

    edit(&store, &engine, "c", "[[Shared]]");
    assert_eq!(note(&engine, "c").outbound, vec![NoteId::from("b")]);
    assert!(note(&engine, "a").inbound.is_empty());
}

#[test]
fn losing_title_holder_does_not_clear_the_winner() {
    let (store, engine) = engine(&[("a", "# Shared\n"), ("c", "[[Shared]]")]);
    edit(&store, &engine, "b", "# Shared\n");
    edit(&store, &engine, "a", "# Renamed\n");

    assert_eq!(engine.lookup_by_title("Shared").unwrap().id.as_str(), "b");
    assert_eq!(note(&engine, "c").outbound, vec![NoteId::from("b")]);
}

// ============================================================================
// Dependent re-linking
// ============================================================================

#[test]
fn new_note_resolves_existing_dead_references() {
    let (store, engine) = engine(&[("a", "[#b] and [[Bee]]")]);
    assert_eq!(note(&engine, "a").dead_links.len(), 2);

    edit(&store, &engine, "b", "# Bee\n");
    let a = note(&engine, "a");
    assert_eq!(a.outbound, vec![NoteId::from("b"), NoteId::from("b")]);
    assert!(a.dead_links.is_empty());
    assert!(a.warnings.is_empty());
}

#[test]
fn retitle_moves_wiki_links() {
    let (store, engine) = engine(&[("a", "[[Old]]"), ("b", "[[New]]"), ("t", "# Old\n")]);
    assert_eq!(note(&engine, "a").outbound, vec![NoteId::from("t")]);
    assert!(note(&engine, "b").outbound.is_empty());

    edit(&store, &engine, "t", "# New\n");
    assert!(note(&engine, "a").outbound.is_empty());
    assert_eq!(note(&engine, "a").dead_links.len(), 1);
    assert_eq!(note(&engine, "b").outbound, vec![NoteId::from("t")]);
    assert!(unconnected(&note(&engine, "a")));
    assert_eq!(
        note(&engine, "t").inbound.iter().collect::<Vec<_>>(),
        vec![&NoteId::from("b")]
    );
}

#[test]
fn touched_set_covers_old_and_new_neighbours() {
    let mut registry = registry_with(&[("a", "[#b]"), ("b", ""), ("c", "")]);
    let id = NoteId::from("a");
    let parsed = NoteAnalyzer::default().analyze(&id, "[#c]");
    let touched = registry.update(&id, parsed);

    let expected: Touched = ["a", "b", "c"].into_iter().map(NoteId::from).collect();
    assert_eq!(touched, expected);
    assert!(registry.is_symmetric());
    assert!(registry.lookup("b").unwrap().inbound.is_empty());
}

#[test]
fn reload_rebuilds_from_scratch() {
    let (store, engine) = engine(&[("a", "[#b]"), ("b", "")]);
    store.insert("c", "[#a]");
    store.delete(&NoteId::from("b"));
    engine.reload_all().unwrap();

    assert!(engine.lookup("b").is_none());
    assert_eq!(note(&engine, "a").inbound.len(), 1);
    assert_eq!(note(&engine, "a").dead_links.len(), 1);
}
