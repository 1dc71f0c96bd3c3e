use super::*;
use crate::storage::{MemoryStorage, StorageArea};
use any_spawner::Executor;
use tokio::task::LocalSet;

fn mount_in(
    owner: &Owner,
    options: StorageOptions<u32>,
    storage: &MemoryStorage,
) -> UseStorage<u32> {
    owner.with(|| use_storage_with_backend(options, Rc::new(storage.clone())).unwrap())
}

fn stored(storage: &MemoryStorage, key: &str) -> Option<String> {
    storage.get(key).unwrap()
}

/// Run a test body on a local task set; effects are spawned locally.
async fn run_local(body: impl std::future::Future<Output = ()>) {
    _ = Executor::init_tokio();
    LocalSet::new().run_until(body).await;
}

async fn settle() {
    leptos::task::tick().await;
    leptos::task::tick().await;
}

// =============================================================
// Signal wiring
// =============================================================

#[test]
fn signal_starts_from_stored_value() {
    let storage = MemoryStorage::new(StorageArea::Local);
    storage.set("count", "4").unwrap();
    let owner = Owner::new();
    let (value, _, _) = mount_in(&owner, StorageOptions::new("count", 1), &storage);
    assert_eq!(value.get_untracked(), 4);
}

#[test]
fn setter_updates_signal_and_storage() {
    let storage = MemoryStorage::new(StorageArea::Local);
    let owner = Owner::new();
    let (value, set, _) = mount_in(&owner, StorageOptions::new("count", 1), &storage);

    set.set(6).unwrap();
    assert_eq!(value.get_untracked(), 6);
    set.update(|n| n * 2).unwrap();
    assert_eq!(value.get_untracked(), 12);
    assert_eq!(stored(&storage, "count").as_deref(), Some("12"));
}

#[test]
fn recompute_from_raw_drives_signal() {
    let storage = MemoryStorage::new(StorageArea::Local);
    let owner = Owner::new();
    let (value, _, recompute) = mount_in(&owner, StorageOptions::new("count", 1), &storage);

    recompute.run(Some("8")).unwrap();
    assert_eq!(value.get_untracked(), 8);
    recompute.run(Some("junk")).unwrap();
    assert_eq!(value.get_untracked(), 1);
}

#[test]
fn default_change_applies_to_next_clear() {
    let storage = MemoryStorage::new(StorageArea::Local);
    let owner = Owner::new();
    let (value, set, recompute) = mount_in(&owner, StorageOptions::new("count", 1), &storage);

    set.set(5).unwrap();
    set.set_default(9_u32).unwrap();
    assert_eq!(value.get_untracked(), 5);
    recompute.run(None).unwrap();
    assert_eq!(value.get_untracked(), 9);
}

#[test]
fn live_signal_follows_other_tab() {
    let tab_a = MemoryStorage::new(StorageArea::Local);
    let tab_b = tab_a.open_context();
    let owner = Owner::new();
    let (value, _, _) = mount_in(&owner, StorageOptions::new("count", 1).live(true), &tab_b);
    tab_a.dispatch_pending();

    tab_a.set("count", "7").unwrap();
    tab_a.dispatch_pending();
    assert_eq!(value.get_untracked(), 7);

    tab_a.remove("count").unwrap();
    tab_a.dispatch_pending();
    assert_eq!(value.get_untracked(), 1);
}

// =============================================================
// Disposal
// =============================================================

#[test]
fn disposing_owner_releases_listener() {
    let tab_a = MemoryStorage::new(StorageArea::Local);
    let tab_b = tab_a.open_context();
    let owner = Owner::new();
    mount_in(&owner, StorageOptions::new("count", 1).live(true), &tab_b);
    assert_eq!(tab_b.listener_count(), 1);

    drop(owner);
    assert_eq!(tab_b.listener_count(), 0);

    tab_a.set("count", "3").unwrap();
    assert_eq!(tab_a.dispatch_pending(), 1);
    assert_eq!(stored(&tab_a, "count").as_deref(), Some("3"));
}

#[test]
fn handles_report_detached_after_disposal() {
    let storage = MemoryStorage::new(StorageArea::Local);
    let owner = Owner::new();
    let (_, set, recompute) = mount_in(&owner, StorageOptions::new("count", 1), &storage);
    drop(owner);

    assert_eq!(set.set(2), Err(StorageError::Detached));
    assert_eq!(set.set_key("other"), Err(StorageError::Detached));
    assert_eq!(recompute.run(Some("3")), Err(StorageError::Detached));
    assert_eq!(stored(&storage, "count").as_deref(), Some("1"));
}

// =============================================================
// Reactive key
// =============================================================

#[tokio::test]
async fn tracked_key_migrates_entry() {
    run_local(async {
        let storage = MemoryStorage::new(StorageArea::Local);
        let owner = Owner::new();
        let key = owner.with(|| RwSignal::new("first".to_owned()));
        let (value, set, _) = mount_in(&owner, StorageOptions::new("first", 3), &storage);
        owner.with(|| set.track_key(key.into()));
        settle().await;
        assert_eq!(stored(&storage, "first").as_deref(), Some("3"));

        key.set("second".to_owned());
        settle().await;
        assert_eq!(stored(&storage, "first"), None);
        assert_eq!(stored(&storage, "second").as_deref(), Some("3"));
        assert_eq!(value.get_untracked(), 3);

        set.set(4).unwrap();
        assert_eq!(stored(&storage, "second").as_deref(), Some("4"));
    })
    .await;
}
