use grove::store::{Container, OpenMode, SledContainer};
use grove::types::Fingerprint;
use grove::{NodeKind, StorageError};
use tempfile::TempDir;

fn seeded(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let container = SledContainer::open(&path, OpenMode::CreateNew).unwrap();
    container
        .put(&NodeKind::Basic.create("seed", Fingerprint::SENTINEL))
        .unwrap();
    container.flush().unwrap();
    path
}

#[test]
fn must_exist_modes_fail_on_missing_container() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.grove");
    assert!(matches!(
        SledContainer::open(&missing, OpenMode::Read),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        SledContainer::open(&missing, OpenMode::ReadWrite),
        Err(StorageError::NotFound(_))
    ));
    assert!(!missing.exists());
}

#[test]
fn create_new_refuses_existing_container() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir, "once.grove");
    assert!(matches!(
        SledContainer::open(&path, OpenMode::CreateNew),
        Err(StorageError::AlreadyExists(_))
    ));
}

#[test]
fn truncate_discards_existing_nodes() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir, "scratch.grove");
    let container = SledContainer::open(&path, OpenMode::Truncate).unwrap();
    assert!(container.nodes().unwrap().is_empty());
}

#[test]
fn append_and_read_write_keep_existing_nodes() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir, "kept.grove");
    {
        let container = SledContainer::open(&path, OpenMode::Append).unwrap();
        assert_eq!(container.nodes().unwrap().len(), 1);
        container
            .put(&NodeKind::Basic.create("second", Fingerprint::SENTINEL))
            .unwrap();
        container.flush().unwrap();
    }
    let container = SledContainer::open(&path, OpenMode::ReadWrite).unwrap();
    let names: Vec<_> = container
        .nodes()
        .unwrap()
        .into_iter()
        .map(|n| n.name)
        .collect();
    assert_eq!(names, vec!["second", "seed"]);
    assert!(!container.is_read_only());
    assert_eq!(container.label(), "kept.grove");
}

#[test]
fn rename_and_remove_report_missing_nodes() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir, "edits.grove");
    let container = SledContainer::open(&path, OpenMode::ReadWrite).unwrap();
    assert!(matches!(
        container.remove("ghost"),
        Err(StorageError::NodeNotFound { .. })
    ));
    assert!(matches!(
        container.rename("ghost", "other"),
        Err(StorageError::NodeNotFound { .. })
    ));
    container
        .put(&NodeKind::Basic.create("other", Fingerprint::SENTINEL))
        .unwrap();
    assert!(matches!(
        container.rename("seed", "other"),
        Err(StorageError::NodeExists { .. })
    ));
    container.rename("seed", "renamed").unwrap();
    assert_eq!(container.get("renamed").unwrap().unwrap().name, "renamed");
    assert!(container.get("seed").unwrap().is_none());
}
