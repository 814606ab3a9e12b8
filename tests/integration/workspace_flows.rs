use grove::store::{ContainerSelector, OpenMode};
use grove::tree::node::Value;
use grove::{ApiError, ForestError, NodeKind, StorageError, Workspace};
use tempfile::TempDir;

fn last() -> ContainerSelector {
    ContainerSelector::default()
}

fn parent_name(ws: &Workspace, name: &str) -> Option<String> {
    let binding = ws.bindings().find(name).unwrap();
    ws.bindings()
        .parent(binding.handle)
        .map(|p| p.name().to_string())
}

#[test]
fn structure_is_rebuilt_from_disk_after_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.grove");
    {
        let mut ws = Workspace::new();
        ws.add(&path, OpenMode::Append).unwrap();
        ws.create(&last(), NodeKind::Basic, Some("raw"), None).unwrap();
        ws.put_data("raw", "samples", Value::IntArray(vec![1, 2, 3]))
            .unwrap();
        ws.create(&last(), NodeKind::Basic, Some("fit"), Some("raw"))
            .unwrap();
        ws.put_data("fit", "slope", Value::Float(0.5)).unwrap();
        ws.create(&last(), NodeKind::Basic, Some("plot"), Some("fit"))
            .unwrap();
        ws.flush_all().unwrap();
    }

    let mut ws = Workspace::new();
    ws.add(&path, OpenMode::Read).unwrap();
    assert_eq!(ws.bindings().len(), 3);
    assert_eq!(parent_name(&ws, "fit").as_deref(), Some("raw"));
    assert_eq!(parent_name(&ws, "plot").as_deref(), Some("fit"));
    assert_eq!(parent_name(&ws, "raw"), None);

    let order: Vec<_> = ws.bindings().iter().map(|b| b.name().to_string()).collect();
    assert_eq!(order, vec!["raw", "fit", "plot"]);
}

#[test]
fn reopening_a_container_moves_it_to_the_end() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.grove");
    let b = dir.path().join("b.grove");

    let mut ws = Workspace::new();
    let id_a = ws.add(&a, OpenMode::Append).unwrap();
    ws.add(&b, OpenMode::Append).unwrap();
    let again = ws.add(&a, OpenMode::Append).unwrap();

    assert_eq!(id_a, again);
    let labels: Vec<_> = ws.containers().map(|c| c.label().to_string()).collect();
    assert_eq!(labels, vec!["b.grove", "a.grove"]);

    // The default selector now targets a.grove
    let created = ws.create(&last(), NodeKind::Basic, Some("n"), None).unwrap();
    assert_eq!(created.container_label, "a.grove");
}

#[test]
fn parent_in_closed_container_orphans_child_until_reopened() {
    let dir = TempDir::new().unwrap();
    let upstream = dir.path().join("upstream.grove");
    let downstream = dir.path().join("downstream.grove");

    let mut ws = Workspace::new();
    ws.add(&upstream, OpenMode::Append).unwrap();
    ws.create(&last(), NodeKind::Basic, Some("source"), None)
        .unwrap();
    ws.put_data("source", "v", Value::Int(42)).unwrap();
    ws.add(&downstream, OpenMode::Append).unwrap();
    ws.create(&last(), NodeKind::Basic, Some("derived"), Some("source"))
        .unwrap();
    assert_eq!(parent_name(&ws, "derived").as_deref(), Some("source"));

    ws.close(&ContainerSelector::Name("upstream.grove".into()))
        .unwrap();
    assert_eq!(parent_name(&ws, "derived"), None);
    assert!(!ws.matches("derived").unwrap());

    ws.add(&upstream, OpenMode::Read).unwrap();
    assert_eq!(parent_name(&ws, "derived").as_deref(), Some("source"));
    assert!(ws.matches("derived").unwrap());
}

#[test]
fn reverting_parent_content_reattaches_child() {
    let mut ws = Workspace::new();
    ws.attach(Box::new(grove::store::MemoryContainer::new("m.grove")))
        .unwrap();
    ws.create(&last(), NodeKind::Basic, Some("p"), None).unwrap();
    ws.put_data("p", "x", Value::Int(1)).unwrap();
    ws.create(&last(), NodeKind::Basic, Some("c"), Some("p"))
        .unwrap();

    ws.put_data("p", "x", Value::Int(2)).unwrap();
    assert_eq!(parent_name(&ws, "c"), None);

    // Attribute edits (including the modified timestamp) do not affect the fingerprint
    ws.set_attribute("p", "log", Value::from("rerun")).unwrap();
    ws.put_data("p", "x", Value::Int(1)).unwrap();
    assert_eq!(parent_name(&ws, "c").as_deref(), Some("p"));
}

#[test]
fn read_only_container_rejects_writes_and_keeps_bindings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frozen.grove");
    {
        let mut ws = Workspace::new();
        ws.add(&path, OpenMode::CreateNew).unwrap();
        ws.create(&last(), NodeKind::Basic, Some("kept"), None)
            .unwrap();
        ws.flush_all().unwrap();
    }

    let mut ws = Workspace::new();
    ws.add(&path, OpenMode::Read).unwrap();
    let err = ws
        .create(&last(), NodeKind::Basic, Some("new"), None)
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::StorageError(StorageError::ReadOnly(_))
    ));
    assert!(ws.remove("kept").is_err());
    assert_eq!(ws.bindings().len(), 1);
}

#[test]
fn lookup_errors_name_the_problem() {
    let mut ws = Workspace::new();
    ws.attach(Box::new(grove::store::MemoryContainer::new("a.grove")))
        .unwrap();
    ws.attach(Box::new(grove::store::MemoryContainer::new("b.grove")))
        .unwrap();
    ws.create(&ContainerSelector::Index(0), NodeKind::Basic, Some("twin"), None)
        .unwrap();
    ws.put_data("twin", "v", Value::Int(1)).unwrap();
    ws.create(&ContainerSelector::Index(1), NodeKind::Basic, Some("twin"), None)
        .unwrap();

    match ws.fingerprint("twin") {
        Err(ApiError::Forest(ForestError::Lookup(msg))) => assert!(msg.contains("ambiguous")),
        other => panic!("expected ambiguous lookup, got {:?}", other.map(|f| f.to_hex())),
    }
    assert!(ws.access("twin", "data").is_err());
    assert!(ws
        .create(&ContainerSelector::Index(2), NodeKind::Basic, None, None)
        .unwrap_err()
        .is_lookup());
    assert!(ws
        .create(&ContainerSelector::Name("c.grove".into()), NodeKind::Basic, None, None)
        .unwrap_err()
        .is_lookup());
}

#[test]
fn verify_reports_without_touching_bindings() {
    let mut ws = Workspace::new();
    ws.attach(Box::new(grove::store::MemoryContainer::new("a.grove")))
        .unwrap();
    ws.create(&last(), NodeKind::Basic, Some("root"), None)
        .unwrap();
    let report = ws.verify().unwrap();
    assert!(report.valid);
    assert_eq!(report.node_count, 1);
    assert!(report.errors.is_empty());
    assert_eq!(ws.bindings().len(), 1);
}
