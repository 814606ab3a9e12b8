use clap::{CommandFactory, Parser};
use grove::tooling::cli::Cli;

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["grove", "status"],
        vec!["grove", "status", "--format", "json"],
        vec!["grove", "list", "--format", "json"],
        vec!["grove", "tree"],
        vec!["grove", "create"],
        vec!["grove", "create", "Basic", "--name", "a", "--parent", "b"],
        vec!["grove", "create", "--in", "run.grove"],
        vec!["grove", "remove", "a"],
        vec!["grove", "rename", "a", "b"],
        vec!["grove", "set", "a", "log", "calibrated", "twice"],
        vec!["grove", "put", "a", "x", "1.5", "2.5"],
        vec!["grove", "get", "a"],
        vec!["grove", "get", "a", "data", "--format", "json"],
        vec!["grove", "fingerprint", "a"],
        vec!["grove", "match", "a"],
        vec!["grove", "verify", "--format", "json"],
        vec!["grove", "flush"],
        vec!["grove", "flush", "--in", "-1"],
        vec![
            "grove",
            "--workspace",
            "/tmp/ws",
            "-c",
            "a.grove",
            "--container",
            "b.grove",
            "--log-level",
            "debug",
            "list",
        ],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_invalid_input() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["grove"],
        vec!["grove", "create", "Widget"],
        vec!["grove", "set", "a", "key"],
        vec!["grove", "put", "a"],
        vec!["grove", "verify", "--format", "xml"],
        vec!["grove", "rename", "a"],
    ];
    for args in cases {
        assert!(
            Cli::try_parse_from(args.clone()).is_err(),
            "expected parse failure for args: {args:?}"
        );
    }
}

#[test]
fn help_lists_every_command() {
    let help = Cli::command().render_long_help().to_string();
    for name in [
        "status",
        "list",
        "tree",
        "create",
        "remove",
        "rename",
        "set",
        "put",
        "get",
        "fingerprint",
        "match",
        "verify",
        "flush",
    ] {
        assert!(help.contains(name), "help should mention {name}");
    }
}
