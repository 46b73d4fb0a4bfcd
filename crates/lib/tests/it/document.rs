//! Store protocol of the document backend: call ordering, failure windows,
//! integrity checks and file persistence.

use std::sync::Arc;

use hierarchy::{
    DocumentHierarchy, DocumentId, DocumentStore, Hierarchy, InMemoryDocumentStore,
    NodeDocument,
    algorithms::PruneOutcome,
    node::{ChildWriter, NodeFactory},
};

use crate::helpers::{
    FaultyStore, Key, RecordingStore, StoreCall, Value, document_hierarchy, path, populate,
    sorted_child_keys,
};

fn child_id(hierarchy: &DocumentHierarchy<Key, Value>, keys: &[&str]) -> DocumentId {
    let mut hierarchy = DocumentHierarchy::<Key, Value>::from_root(hierarchy.root().clone());
    hierarchy.get_or_create(&path(keys)).unwrap().id().clone()
}

#[test]
fn test_add_writes_child_before_parent() {
    let store = Arc::new(RecordingStore::new());
    let mut hierarchy = DocumentHierarchy::<Key, Value>::create(store.clone()).unwrap();
    let root_id = hierarchy.root_id().clone();
    store.clear();

    hierarchy.set(&path(&["a"]), 1).unwrap();
    let a = child_id(&hierarchy, &["a"]);
    assert_eq!(
        store.mutations(),
        vec![
            StoreCall::Insert(a.clone()),
            StoreCall::Update(root_id),
            StoreCall::Update(a),
        ]
    );
}

#[test]
fn test_duplicate_child_fails_before_any_write() {
    let store = Arc::new(RecordingStore::new());
    let mut hierarchy = DocumentHierarchy::<Key, Value>::create(store.clone()).unwrap();
    hierarchy.set(&path(&["a"]), 1).unwrap();
    store.clear();

    let root = hierarchy.root().clone();
    let duplicate = root.create_child("a".to_string()).unwrap();
    let err = root.add_child(duplicate).unwrap_err();
    assert!(err.is_duplicate());
    assert!(store.mutations().is_empty());
}

#[test]
fn test_remove_deletes_child_before_parent_update() {
    let store = Arc::new(RecordingStore::new());
    let mut hierarchy = DocumentHierarchy::<Key, Value>::create(store.clone()).unwrap();
    hierarchy.set(&path(&["a"]), 1).unwrap();
    let root_id = hierarchy.root_id().clone();
    let a = child_id(&hierarchy, &["a"]);
    store.clear();

    assert!(hierarchy.remove(&path(&["a"]), false).unwrap());
    assert_eq!(
        store.mutations(),
        vec![StoreCall::Delete(a), StoreCall::Update(root_id)]
    );
}

#[test]
fn test_recursive_remove_is_post_order() {
    let store = Arc::new(RecordingStore::new());
    let mut hierarchy = DocumentHierarchy::<Key, Value>::create(store.clone()).unwrap();
    hierarchy.set(&path(&["a", "b", "c"]), 1).unwrap();
    let root_id = hierarchy.root_id().clone();
    let a = child_id(&hierarchy, &["a"]);
    let b = child_id(&hierarchy, &["a", "b"]);
    let c = child_id(&hierarchy, &["a", "b", "c"]);
    store.clear();

    assert!(hierarchy.remove(&path(&["a"]), true).unwrap());
    assert_eq!(
        store.mutations(),
        vec![
            StoreCall::Delete(c),
            StoreCall::Update(b.clone()),
            StoreCall::Delete(b),
            StoreCall::Update(a.clone()),
            StoreCall::Delete(a),
            StoreCall::Update(root_id),
        ]
    );
    assert_eq!(store.inner().len().unwrap(), 1);
}

#[test]
fn test_removals_leave_no_orphans() {
    let (store, mut hierarchy) = document_hierarchy();
    populate(
        &mut hierarchy,
        &[(&["a", "b"], 1), (&["a", "c", "d"], 2), (&["x"], 3)],
    );
    assert_eq!(store.len().unwrap(), 6);

    assert!(hierarchy.remove_value_and_prune(&path(&["a", "c", "d"])).unwrap());
    assert_eq!(store.len().unwrap(), 4);

    assert!(hierarchy.remove(&path(&["a"]), true).unwrap());
    assert!(hierarchy.remove(&path(&["x"]), false).unwrap());
    assert_eq!(store.all_ids().unwrap(), vec![hierarchy.root_id().clone()]);
}

#[test]
fn test_failed_parent_update_leaves_unreferenced_child() {
    let store = Arc::new(FaultyStore::new());
    let mut hierarchy = DocumentHierarchy::<Key, Value>::create(store.clone()).unwrap();
    store.fail_updates(true);

    let err = hierarchy.set(&path(&["a"]), 1).unwrap_err();
    assert!(err.is_io_error());

    // The child was written first, so the store holds it but nothing refers to it.
    assert_eq!(store.inner().len().unwrap(), 2);
    let stored_root = store.find_by_id(hierarchy.root_id()).unwrap().unwrap();
    assert!(!stored_root.has_children());

    store.fail_updates(false);
    assert!(!hierarchy.contains(&path(&["a"])).unwrap());
}

#[test]
fn test_failed_parent_update_after_delete_is_a_dangling_reference() {
    let store = Arc::new(FaultyStore::new());
    let mut hierarchy = DocumentHierarchy::<Key, Value>::create(store.clone()).unwrap();
    hierarchy.set(&path(&["a"]), 1).unwrap();
    let a = child_id(&hierarchy, &["a"]);

    store.fail_updates(true);
    let err = hierarchy.remove(&path(&["a"]), false).unwrap_err();
    assert!(err.is_io_error());
    store.fail_updates(false);

    assert!(!store.inner().contains(&a).unwrap());
    let err = hierarchy.try_get_value(&path(&["a"])).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_failure_below_root_keeps_root_in_step_with_store() {
    let store = Arc::new(FaultyStore::new());
    let mut hierarchy = DocumentHierarchy::<Key, Value>::create(store.clone()).unwrap();
    let root_id = hierarchy.root_id().clone();
    store.fail_updates_for_key("a");

    // The root already references `a` when the update of `a` itself fails.
    let err = hierarchy.set(&path(&["a", "b"]), 1).unwrap_err();
    assert!(err.is_io_error());
    let stored = DocumentHierarchy::<Key, Value>::open(store.clone(), &root_id).unwrap();
    assert!(stored.contains(&path(&["a"])).unwrap());
    assert!(hierarchy.contains(&path(&["a"])).unwrap());

    // A later write must not overwrite the root with an outdated snapshot.
    hierarchy.set(&path(&["c"]), 2).unwrap();
    let reopened = DocumentHierarchy::<Key, Value>::open(store.clone(), &root_id).unwrap();
    assert!(reopened.contains(&path(&["a"])).unwrap());
    assert_eq!(reopened.try_get_value(&path(&["c"])).unwrap(), Some(2));
    assert_eq!(
        sorted_child_keys(&reopened, &[]),
        vec!["a".to_string(), "c".to_string()]
    );
}

#[test]
fn test_declined_delete_keeps_branch_attached() {
    let store = Arc::new(FaultyStore::new());
    let mut hierarchy = DocumentHierarchy::<Key, Value>::create(store.clone()).unwrap();
    hierarchy.set(&path(&["a", "b"]), 1).unwrap();
    store.decline_delete(&child_id(&hierarchy, &["a", "b"]));

    assert!(!hierarchy.remove(&path(&["a"]), true).unwrap());
    assert_eq!(hierarchy.try_get_value(&path(&["a", "b"])).unwrap(), Some(1));
    assert_eq!(store.inner().len().unwrap(), 3);
}

#[test]
fn test_declined_delete_during_prune_keeps_cleared_node() {
    let store = Arc::new(FaultyStore::new());
    let mut hierarchy = DocumentHierarchy::<Key, Value>::create(store.clone()).unwrap();
    hierarchy.set(&path(&["a", "b"]), 1).unwrap();
    store.decline_delete(&child_id(&hierarchy, &["a", "b"]));

    let outcome = hierarchy
        .remove_value_and_prune_with_outcome(&path(&["a", "b"]))
        .unwrap();
    assert_eq!(outcome, PruneOutcome::ValueCleared);
    assert!(hierarchy.contains(&path(&["a", "b"])).unwrap());
    assert_eq!(hierarchy.try_get_value(&path(&["a", "b"])).unwrap(), None);
}

#[test]
fn test_child_key_mismatch_is_an_integrity_error() {
    let store: Arc<InMemoryDocumentStore<Key, Value>> = Arc::new(InMemoryDocumentStore::new());
    let child = NodeDocument::keyed("b".to_string());
    let mut root = NodeDocument::root();
    root.insert_child("a".to_string(), child.id().clone());
    store.insert(&child).unwrap();
    store.insert(&root).unwrap();

    let hierarchy = DocumentHierarchy::<Key, Value>::open(store, root.id()).unwrap();
    let err = hierarchy.try_get_value(&path(&["a"])).unwrap_err();
    assert!(err.is_integrity_error());
}

#[test]
fn test_keyless_child_document_is_an_integrity_error() {
    let store: Arc<InMemoryDocumentStore<Key, Value>> = Arc::new(InMemoryDocumentStore::new());
    let child = NodeDocument::root();
    let mut root = NodeDocument::root();
    root.insert_child("a".to_string(), child.id().clone());
    store.insert(&child).unwrap();
    store.insert(&root).unwrap();

    let hierarchy = DocumentHierarchy::<Key, Value>::open(store, root.id()).unwrap();
    let err = hierarchy.child_keys(&path(&[])).unwrap_err();
    assert!(err.is_integrity_error());
}

#[test]
fn test_store_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("hierarchy.json");

    let (store, mut hierarchy) = document_hierarchy();
    populate(&mut hierarchy, &[(&[], 0), (&["a", "b"], 1), (&["c"], 2)]);
    store.save_to_file(&file).unwrap();

    let loaded: Arc<InMemoryDocumentStore<Key, Value>> =
        Arc::new(InMemoryDocumentStore::load_from_file(&file).unwrap());
    assert_eq!(loaded.len().unwrap(), store.len().unwrap());

    let reopened = DocumentHierarchy::<Key, Value>::open(loaded, hierarchy.root_id()).unwrap();
    assert_eq!(reopened.try_get_value(&path(&[])).unwrap(), Some(0));
    assert_eq!(reopened.try_get_value(&path(&["a", "b"])).unwrap(), Some(1));
    assert_eq!(reopened.try_get_value(&path(&["c"])).unwrap(), Some(2));
}

#[test]
fn test_open_unknown_root_fails() {
    let store: Arc<InMemoryDocumentStore<Key, Value>> = Arc::new(InMemoryDocumentStore::new());
    let err = DocumentHierarchy::<Key, Value>::open(store, &DocumentId::generate()).unwrap_err();
    assert!(err.is_not_found());
}
