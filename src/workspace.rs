//! Workspace domain: open containers, the live binding table, and output formatting.

mod facade;
mod format;
mod types;

pub use facade::*;
pub use format::{
    format_entry_text, format_list_text, format_section_heading, format_status_text,
    format_tree_text, format_verify_text,
};
pub use types::{BindingRow, ContainerStatus, VerifyResult, WorkspaceStatus};
