use recordstore::{Error, OpenMode, RecordsStore};

fn store_path(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    dir.path().join(name)
}

#[test]
fn basic_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 8).unwrap();

    store.insert("a", &[0x01, 0x02, 0x03]).unwrap();

    assert_eq!(store.read("a").unwrap().data, vec![0x01, 0x02, 0x03]);
    assert_eq!(store.size(), 1);
    assert!(store.exists("a"));
    assert!(!store.exists("b"));
}

#[test]
fn in_place_update_smaller() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 8).unwrap();
    store.insert("a", &[0x01, 0x02, 0x03]).unwrap();

    store.update("a", &[0xAA]).unwrap();

    assert_eq!(store.read("a").unwrap().data, vec![0xAA]);
}

#[test]
fn growing_update_forces_relocate() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 8).unwrap();
    store.insert("a", &[0x01, 0x02, 0x03]).unwrap();
    store.update("a", &[0xAA]).unwrap();

    let bigger = vec![0, 1, 2, 3, 4, 5, 6, 7];
    store.update("a", &bigger).unwrap();

    assert_eq!(store.read("a").unwrap().data, bigger);
    assert_eq!(store.size(), 1);
    assert_eq!(store.keys(), vec!["a".to_string()]);
}

#[test]
fn delete_in_the_middle_coalesces_into_predecessor() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 4).unwrap();
    store.insert("k1", &[1]).unwrap();
    store.insert("k2", &[2, 2]).unwrap();
    store.insert("k3", &[3, 3, 3]).unwrap();

    store.delete("k2").unwrap();

    assert_eq!(store.read("k1").unwrap().data, vec![1]);
    assert_eq!(store.read("k3").unwrap().data, vec![3, 3, 3]);
    assert!(!store.exists("k2"));
    assert_eq!(store.size(), 2);
}

#[test]
fn delete_the_first_record_shifts_successor() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 4).unwrap();
    store.insert("k1", &[1]).unwrap();
    store.insert("k2", &[2, 2]).unwrap();
    store.insert("k3", &[3, 3, 3]).unwrap();

    store.delete("k1").unwrap();

    assert_eq!(store.read("k2").unwrap().data, vec![2, 2]);
    assert_eq!(store.read("k3").unwrap().data, vec![3, 3, 3]);
    assert!(!store.exists("k1"));
}

#[test]
fn index_growth_relocates_data() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 1).unwrap();
    store.insert("a", &[0x10]).unwrap();
    // This insert must grow the index region past its single-slot
    // capacity, relocating "a"'s payload out of the way.
    store.insert("b", &[0x20]).unwrap();

    assert_eq!(store.read("a").unwrap().data, vec![0x10]);
    assert_eq!(store.read("b").unwrap().data, vec![0x20]);
}

#[test]
fn key_size_enforcement_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 4).unwrap();

    let oversized_key: String = std::iter::repeat('k').take(100).collect();
    let err = store.insert(&oversized_key, &[1, 2, 3]).unwrap_err();

    assert!(matches!(err, Error::KeyTooLarge { .. }));
    assert_eq!(store.size(), 0);
    assert!(!store.exists(&oversized_key));
}

#[test]
fn insert_duplicate_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 4).unwrap();
    store.insert("a", &[1]).unwrap();

    let err = store.insert("a", &[2]).unwrap_err();
    assert!(matches!(err, Error::KeyExists));
}

#[test]
fn operations_on_missing_key_fail() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 4).unwrap();

    assert!(matches!(store.read("missing"), Err(Error::KeyNotFound)));
    assert!(matches!(store.update("missing", &[1]), Err(Error::KeyNotFound)));
    assert!(matches!(store.delete("missing"), Err(Error::KeyNotFound)));
}

#[test]
fn delete_idempotence_on_absence() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 4).unwrap();
    store.insert("a", &[1]).unwrap();
    store.delete("a").unwrap();

    assert!(matches!(store.delete("a"), Err(Error::KeyNotFound)));
    assert_eq!(store.size(), 0);
}

#[test]
fn create_over_existing_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir, "store.db");
    RecordsStore::create(&path, 4).unwrap();

    assert!(matches!(
        RecordsStore::create(&path, 4),
        Err(Error::AlreadyExists)
    ));
}

#[test]
fn open_missing_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir, "does-not-exist.db");

    assert!(matches!(
        RecordsStore::open(&path, OpenMode::ReadWrite),
        Err(Error::NotFound)
    ));
}

#[test]
fn mutations_fail_on_read_only_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir, "store.db");

    {
        let store = RecordsStore::create(&path, 4).unwrap();
        store.insert("a", &[1, 2, 3]).unwrap();
        store.close().unwrap();
    }

    let store = RecordsStore::open(&path, OpenMode::ReadOnly).unwrap();

    assert!(matches!(store.insert("b", &[1]), Err(Error::ReadOnly)));
    assert!(matches!(store.update("a", &[9]), Err(Error::ReadOnly)));
    assert!(matches!(store.delete("a"), Err(Error::ReadOnly)));

    // Reads are unaffected and the store is untouched.
    assert_eq!(store.read("a").unwrap().data, vec![1, 2, 3]);
    assert!(store.exists("a"));
    assert_eq!(store.size(), 1);
}

#[test]
fn reopen_fidelity() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir, "store.db");

    {
        let store = RecordsStore::create(&path, 4).unwrap();
        store.insert("a", &[1, 2, 3]).unwrap();
        store.insert("b", &[4, 5]).unwrap();
        store.insert("c", &[6]).unwrap();
        store.delete("b").unwrap();
        store.close().unwrap();
    }

    let reopened = RecordsStore::open(&path, OpenMode::ReadWrite).unwrap();
    let mut keys = reopened.keys();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
    assert_eq!(reopened.read("a").unwrap().data, vec![1, 2, 3]);
    assert_eq!(reopened.read("c").unwrap().data, vec![6]);

    // The reopened store must keep behaving like a live store.
    reopened.insert("d", &[7, 8]).unwrap();
    assert_eq!(reopened.read("d").unwrap().data, vec![7, 8]);
}

#[test]
fn many_inserts_and_deletes_keep_the_store_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordsStore::create(store_path(&dir, "store.db"), 2).unwrap();

    for i in 0..50 {
        let key = format!("key-{i}");
        let value = vec![i as u8; (i % 7) as usize + 1];
        store.insert(&key, &value).unwrap();
    }
    assert_eq!(store.size(), 50);

    for i in (0..50).step_by(2) {
        store.delete(&format!("key-{i}")).unwrap();
    }
    assert_eq!(store.size(), 25);

    for i in (1..50).step_by(2) {
        let key = format!("key-{i}");
        let expected = vec![i as u8; (i % 7) as usize + 1];
        assert_eq!(store.read(&key).unwrap().data, expected);
    }
}
