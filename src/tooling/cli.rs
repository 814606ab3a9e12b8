//! CLI Tooling
//!
//! Command-line interface over a workspace. Every command runs against the containers
//! named in configuration plus any passed with `--container`, and every structural
//! change re-links the whole forest before the command returns.

use crate::concurrency::SharedWorkspace;
use crate::config::{ConfigLoader, GroveConfig};
use crate::error::ApiError;
use crate::kinds::NodeKind;
use crate::store::ContainerSelector;
use crate::tree::node::{Entry, Value};
use crate::workspace::{
    format_entry_text, format_list_text, format_status_text, format_tree_text,
    format_verify_text, Workspace,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Grove CLI - content-fingerprinted node forests
#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Store nodes in containers and rebuild their forest from content fingerprints")]
#[command(
    after_help = "Node names bound in more than one container can be qualified as <container>/<name>."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Container to open, in addition to configured ones (repeatable)
    #[arg(long = "container", short = 'c')]
    pub containers: Vec<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold the logging flags into the loaded configuration
    pub fn apply_log_flags(&self, config: &mut GroveConfig) {
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show open containers and forest shape
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// List every bound node in bind order
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Print the forest as an indented tree
    Tree,
    /// Create a node
    Create {
        /// Node kind
        #[arg(default_value = "basic")]
        kind: NodeKind,
        /// Node name (generated from kind and time when omitted)
        #[arg(long)]
        name: Option<String>,
        /// Name of the bound node to declare as parent (`<container>/<name>` when ambiguous)
        #[arg(long)]
        parent: Option<String>,
        /// Target container: index (negative counts from the end) or file name
        #[arg(long = "in", default_value = "-1", allow_negative_numbers = true)]
        container: ContainerSelector,
    },
    /// Delete a node; its children become orphans
    Remove { name: String },
    /// Rename a node
    Rename { name: String, new_name: String },
    /// Set an attribute on a node
    Set {
        name: String,
        key: String,
        /// One token for a scalar, several for an array
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        value: Vec<String>,
    },
    /// Write an entry under a node's data group (changes its fingerprint)
    Put {
        name: String,
        entry: String,
        /// One token for a scalar, several for an array
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        value: Vec<String>,
    },
    /// Show a node, or one of its attributes or children
    Get {
        name: String,
        key: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Print a node's current content fingerprint
    Fingerprint { name: String },
    /// Check whether a node's declared parent still matches its parent's content
    Match { name: String },
    /// Resolve the forest without binding and report integrity problems
    Verify {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Flush containers to disk
    Flush {
        /// Container to flush (all when omitted)
        #[arg(long = "in", allow_negative_numbers = true)]
        container: Option<ContainerSelector>,
    },
}

/// Load configuration from an explicit file or from the layered sources
pub fn load_config(
    workspace_root: &std::path::Path,
    config_path: Option<&std::path::Path>,
) -> Result<GroveConfig, ApiError> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load(workspace_root)?,
    };
    Ok(config)
}

/// CLI context for managing workspace state
pub struct CliContext {
    workspace: SharedWorkspace,
    workspace_root: PathBuf,
}

impl CliContext {
    /// Create a new CLI context, loading configuration from disk
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        containers: Vec<PathBuf>,
    ) -> Result<Self, ApiError> {
        let config = load_config(&workspace_root, config_path.as_deref())?;
        Self::with_config(workspace_root, &config, containers)
    }

    /// Create a CLI context from an already loaded configuration
    pub fn with_config(
        workspace_root: PathBuf,
        config: &GroveConfig,
        containers: Vec<PathBuf>,
    ) -> Result<Self, ApiError> {
        let mut workspace = Workspace::from_config(&config.workspace, &workspace_root)?;
        for path in containers {
            let path = if path.is_absolute() {
                path
            } else {
                workspace_root.join(path)
            };
            workspace.add(&path, config.workspace.default_mode)?;
        }
        debug!(
            containers = workspace.store().len(),
            nodes = workspace.bindings().len(),
            "Workspace ready"
        );
        Ok(Self {
            workspace: SharedWorkspace::new(workspace),
            workspace_root,
        })
    }

    pub fn workspace(&self) -> &SharedWorkspace {
        &self.workspace
    }

    pub fn workspace_root(&self) -> &std::path::Path {
        &self.workspace_root
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Status { format } => {
                let status = self.workspace.read(|ws| ws.status())?;
                if format == "json" {
                    to_json(&status)
                } else {
                    Ok(format_status_text(&status))
                }
            }
            Commands::List { format } => {
                let rows = self.workspace.read(|ws| ws.rows());
                if format == "json" {
                    to_json(&rows)
                } else {
                    Ok(format_list_text(&rows))
                }
            }
            Commands::Tree => Ok(self.workspace.read(|ws| format_tree_text(ws.bindings()))),
            Commands::Create {
                kind,
                name,
                parent,
                container,
            } => self.workspace.write(|ws| -> Result<String, ApiError> {
                let binding = ws.create(container, *kind, name.as_deref(), parent.as_deref())?;
                ws.flush(container)?;
                let description = ws
                    .bindings()
                    .describe(binding.handle)
                    .unwrap_or_else(|| binding.name().to_string());
                Ok(format!("Created {}", description))
            }),
            Commands::Remove { name } => self.workspace.write(|ws| -> Result<String, ApiError> {
                ws.remove(name)?;
                ws.flush_all()?;
                Ok(format!("Removed {}", name))
            }),
            Commands::Rename { name, new_name } => self.workspace.write(|ws| -> Result<String, ApiError> {
                ws.rename(name, new_name)?;
                ws.flush_all()?;
                Ok(format!("Renamed {} to {}", name, new_name))
            }),
            Commands::Set { name, key, value } => self.workspace.write(|ws| -> Result<String, ApiError> {
                let value = Value::parse_tokens(value);
                let shown = value.to_string();
                ws.set_attribute(name, key, value)?;
                ws.flush_all()?;
                Ok(format!("{}@{} = {}", name, key, shown))
            }),
            Commands::Put { name, entry, value } => self.workspace.write(|ws| -> Result<String, ApiError> {
                let value = Value::parse_tokens(value);
                ws.put_data(name, entry, value)?;
                ws.flush_all()?;
                let fingerprint = ws.fingerprint(name)?;
                Ok(format!("{}/data/{} written; fingerprint {}", name, entry, fingerprint))
            }),
            Commands::Get { name, key, format } => self.workspace.read(|ws| -> Result<String, ApiError> {
                let entry = match key {
                    Some(key) => ws.access(name, key)?,
                    None => Entry::Node(ws.node(name)?),
                };
                if format == "json" {
                    return to_json(&entry);
                }
                let body = format_entry_text(&entry);
                if key.is_some() {
                    return Ok(body);
                }
                let binding = ws.bindings().find(name)?;
                let description = ws
                    .bindings()
                    .describe(binding.handle)
                    .unwrap_or_else(|| name.clone());
                Ok(format!("{}\n{}", description, body))
            }),
            Commands::Fingerprint { name } => self
                .workspace
                .read(|ws| ws.fingerprint(name).map(|fp| fp.to_hex())),
            Commands::Match { name } => self
                .workspace
                .read(|ws| ws.matches(name).map(|current| current.to_string())),
            Commands::Verify { format } => {
                let result = self.workspace.read(|ws| ws.verify())?;
                if format == "json" {
                    to_json(&result)
                } else {
                    Ok(format_verify_text(&result))
                }
            }
            Commands::Flush { container } => self.workspace.read(|ws| -> Result<String, ApiError> {
                match container {
                    Some(selector) => ws.flush(selector)?,
                    None => ws.flush_all()?,
                }
                Ok("Flushed".to_string())
            }),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::InvalidOperation(format!("failed to encode JSON: {}", e)))
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Status { .. } => "status",
        Commands::List { .. } => "list",
        Commands::Tree => "tree",
        Commands::Create { .. } => "create",
        Commands::Remove { .. } => "remove",
        Commands::Rename { .. } => "rename",
        Commands::Set { .. } => "set",
        Commands::Put { .. } => "put",
        Commands::Get { .. } => "get",
        Commands::Fingerprint { .. } => "fingerprint",
        Commands::Match { .. } => "match",
        Commands::Verify { .. } => "verify",
        Commands::Flush { .. } => "flush",
    }
}
