use grove::kinds::NodeKind;
use grove::store::ContainerSelector;
use grove::tooling::cli::{CliContext, Commands};
use tempfile::TempDir;

use crate::cli::support::{context_with_container, with_xdg_env, write_config};

fn create(cli: &CliContext, name: &str, parent: Option<&str>) -> String {
    cli.execute(&Commands::Create {
        kind: NodeKind::Basic,
        name: Some(name.to_string()),
        parent: parent.map(str::to_string),
        container: ContainerSelector::default(),
    })
    .unwrap()
}

fn put(cli: &CliContext, name: &str, entry: &str, value: &[&str]) {
    cli.execute(&Commands::Put {
        name: name.to_string(),
        entry: entry.to_string(),
        value: value.iter().map(|v| v.to_string()).collect(),
    })
    .unwrap();
}

#[test]
fn create_reports_binding_description() {
    let temp_dir = TempDir::new().unwrap();
    let (cli, _) = context_with_container(&temp_dir, "run.grove");
    assert_eq!(create(&cli, "a", None), "Created Basic a (-) from /a in run.grove");
    put(&cli, "a", "x", &["1", "2"]);
    assert_eq!(
        create(&cli, "b", Some("a")),
        "Created Basic b (a) from /b in run.grove"
    );
}

#[test]
fn status_json_contract_has_required_fields() {
    let temp_dir = TempDir::new().unwrap();
    let (cli, _) = context_with_container(&temp_dir, "run.grove");
    create(&cli, "a", None);

    let output = cli
        .execute(&Commands::Status {
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed.get("total_nodes").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(parsed.get("roots").and_then(|v| v.as_u64()), Some(1));
    assert!(parsed.get("layers").and_then(|v| v.as_u64()).is_some());
    assert!(parsed.get("stale").and_then(|v| v.as_u64()).is_some());
    let containers = parsed
        .get("containers")
        .and_then(|v| v.as_array())
        .expect("containers array should exist");
    assert_eq!(containers.len(), 1);
    assert_eq!(
        containers[0].get("label").and_then(|v| v.as_str()),
        Some("run.grove")
    );
    assert_eq!(
        containers[0].get("read_only").and_then(|v| v.as_bool()),
        Some(false)
    );
}

#[test]
fn list_json_contract_is_in_bind_order() {
    let temp_dir = TempDir::new().unwrap();
    let (cli, _) = context_with_container(&temp_dir, "run.grove");
    create(&cli, "z_root", None);
    put(&cli, "z_root", "v", &["7"]);
    create(&cli, "a_child", Some("z_root"));

    let output = cli
        .execute(&Commands::List {
            format: "json".to_string(),
        })
        .unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "z_root");
    assert!(rows[0].get("parent").is_none());
    assert_eq!(rows[1]["name"], "a_child");
    assert_eq!(rows[1]["parent"], "z_root");
    assert_eq!(rows[1]["layer"], 1);
    assert_eq!(rows[1]["current"], true);
    assert_eq!(rows[1]["fingerprint"].as_str().map(str::len), Some(40));
}

#[test]
fn fingerprint_and_match_track_content_changes() {
    let temp_dir = TempDir::new().unwrap();
    let (cli, _) = context_with_container(&temp_dir, "run.grove");
    create(&cli, "p", None);
    put(&cli, "p", "x", &["1"]);
    create(&cli, "c", Some("p"));

    let fingerprint = |name: &str| {
        cli.execute(&Commands::Fingerprint {
            name: name.to_string(),
        })
        .unwrap()
    };
    let matches = |name: &str| {
        cli.execute(&Commands::Match {
            name: name.to_string(),
        })
        .unwrap()
    };

    let before = fingerprint("p");
    assert_eq!(before.len(), 40);
    assert_eq!(matches("c"), "true");

    put(&cli, "p", "x", &["2"]);
    assert_ne!(fingerprint("p"), before);
    assert_eq!(matches("c"), "false");

    let tree = cli.execute(&Commands::Tree).unwrap();
    assert!(tree.contains("c [Basic]"));
    assert!(tree.contains("[orphan]"));
}

#[test]
fn get_reads_attributes_and_data() {
    let temp_dir = TempDir::new().unwrap();
    let (cli, _) = context_with_container(&temp_dir, "run.grove");
    create(&cli, "n", None);
    put(&cli, "n", "samples", &["1", "2", "3"]);
    cli.execute(&Commands::Set {
        name: "n".to_string(),
        key: "log".to_string(),
        value: vec!["calibrated".to_string()],
    })
    .unwrap();

    let get = |key: Option<&str>, format: &str| {
        cli.execute(&Commands::Get {
            name: "n".to_string(),
            key: key.map(str::to_string),
            format: format.to_string(),
        })
    };
    assert_eq!(get(Some("log"), "text").unwrap(), "\"calibrated\"");
    assert_eq!(get(Some("type"), "text").unwrap(), "\"Basic\"");

    let data: serde_json::Value =
        serde_json::from_str(&get(Some("data"), "json").unwrap()).unwrap();
    assert_eq!(data["kind"], "node");

    let overview = get(None, "text").unwrap();
    assert!(overview.starts_with("Basic n (-) from /n in run.grove"));
    assert!(get(Some("missing"), "text").unwrap_err().is_lookup());
}

#[test]
fn set_refuses_required_attributes() {
    let temp_dir = TempDir::new().unwrap();
    let (cli, _) = context_with_container(&temp_dir, "run.grove");
    create(&cli, "n", None);
    let result = cli.execute(&Commands::Set {
        name: "n".to_string(),
        key: "parent".to_string(),
        value: vec!["0".to_string()],
    });
    assert!(result.is_err());
}

#[test]
fn verify_json_contract_has_required_fields() {
    let temp_dir = TempDir::new().unwrap();
    let (cli, _) = context_with_container(&temp_dir, "run.grove");
    create(&cli, "a", None);

    let output = cli
        .execute(&Commands::Verify {
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed.get("valid").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(parsed.get("node_count").and_then(|v| v.as_u64()), Some(1));
    assert!(parsed.get("errors").and_then(|v| v.as_array()).is_some());
    assert!(parsed.get("unresolved").and_then(|v| v.as_array()).is_some());
}

#[test]
fn nodes_survive_between_invocations() {
    let temp_dir = TempDir::new().unwrap();
    let workspace_root;
    {
        let (cli, root) = context_with_container(&temp_dir, "run.grove");
        create(&cli, "kept", None);
        workspace_root = root;
    }
    let config = write_config(&workspace_root, "");
    let cli = CliContext::new(
        workspace_root.clone(),
        Some(config),
        vec![workspace_root.join("run.grove")],
    )
    .unwrap();
    let output = cli.execute(&Commands::List {
        format: "text".to_string(),
    });
    assert!(output.unwrap().contains("kept"));
}

#[test]
fn workspace_config_opens_listed_containers() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let workspace_root = temp_dir.path().join("workspace");
        std::fs::create_dir_all(&workspace_root).unwrap();
        std::fs::write(
            workspace_root.join("grove.toml"),
            "[[workspace.containers]]\npath = \"first.grove\"\n\n[[workspace.containers]]\npath = \"second.grove\"\n",
        )
        .unwrap();

        let cli = CliContext::new(workspace_root, None, Vec::new()).unwrap();
        let output = cli
            .execute(&Commands::Status {
                format: "json".to_string(),
            })
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let labels: Vec<_> = parsed["containers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["label"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(labels, vec!["first.grove", "second.grove"]);
    });
}
