use grove::tooling::cli::CliContext;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Run `f` with `XDG_CONFIG_HOME` pointing into `temp_dir`, so no real global config leaks in
pub fn with_xdg_env<R>(temp_dir: &TempDir, f: impl FnOnce() -> R) -> R {
    let _guard = ENV_LOCK.lock();
    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path().join("xdg-config"));
    let result = f();
    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    result
}

/// Workspace directory with an empty config file and one container passed on the command line
pub fn context_with_container(temp_dir: &TempDir, container: &str) -> (CliContext, PathBuf) {
    let workspace_root = temp_dir.path().join("workspace");
    std::fs::create_dir_all(&workspace_root).unwrap();
    let config = write_config(&workspace_root, "");
    let cli = CliContext::new(
        workspace_root.clone(),
        Some(config),
        vec![PathBuf::from(container)],
    )
    .unwrap();
    (cli, workspace_root)
}

pub fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("test-config.toml");
    std::fs::write(&path, body).unwrap();
    path
}
