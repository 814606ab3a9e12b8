//! Format workspace status, forest listings, and verification results as text.

use crate::binding::{BindingHandle, BindingTable};
use crate::tree::node::Entry;
use crate::workspace::types::{BindingRow, VerifyResult, WorkspaceStatus};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Format workspace status as human-readable text.
pub fn format_status_text(data: &WorkspaceStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Containers")));
    if data.containers.is_empty() {
        out.push_str("No containers open.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Container", "Mode", "Nodes", "Path"]);
    for row in &data.containers {
        let mode = if row.read_only { "read-only" } else { "read/write" };
        table.add_row(vec![
            row.index.to_string(),
            row.label.clone(),
            mode.to_string(),
            row.nodes.to_string(),
            row.path.clone(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));

    out.push_str(&format!("{}\n", format_section_heading("Forest")));
    out.push_str(&format!("  Nodes: {}\n", data.total_nodes));
    out.push_str(&format!("  Roots and orphans: {}\n", data.roots));
    out.push_str(&format!("  Layers: {}\n", data.layers));
    if data.stale > 0 {
        out.push_str(&format!("  Stale parent references: {}\n", data.stale));
    }
    out
}

/// Format the binding table as one row per node, in bind order.
pub fn format_list_text(rows: &[BindingRow]) -> String {
    if rows.is_empty() {
        return "No nodes bound.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        "Order",
        "Name",
        "Kind",
        "Parent",
        "Container",
        "Layer",
        "Fingerprint",
    ]);
    for row in rows {
        let parent = row.parent.clone().unwrap_or_else(|| "-".to_string());
        let fingerprint = if row.current {
            row.fingerprint[..8].to_string()
        } else {
            format!("{} (stale)", &row.fingerprint[..8])
        };
        table.add_row(vec![
            row.order.to_string(),
            row.name.clone(),
            row.kind.clone(),
            parent,
            row.container.clone(),
            row.layer.to_string(),
            fingerprint,
        ]);
    }
    format!("{}\n\nTotal: {} nodes.", table, rows.len())
}

/// Indented forest, children under their parent.
pub fn format_tree_text(bindings: &BindingTable) -> String {
    if bindings.is_empty() {
        return "No nodes bound.".to_string();
    }
    let mut lines = Vec::new();
    for root in bindings.roots() {
        push_subtree(bindings, root.handle, 0, &mut lines);
    }
    lines.join("\n")
}

fn push_subtree(bindings: &BindingTable, handle: BindingHandle, depth: usize, lines: &mut Vec<String>) {
    if let Some(binding) = bindings.get(handle) {
        let marker = if depth == 0 && !binding.declared_parent.is_sentinel() {
            " [orphan]"
        } else {
            ""
        };
        lines.push(format!(
            "{}{} [{}] {} in {}{}",
            "  ".repeat(depth),
            binding.name(),
            binding.kind,
            binding.fingerprint.short(),
            binding.container_label,
            marker
        ));
        let children: Vec<BindingHandle> = bindings.children(handle).map(|c| c.handle).collect();
        for child in children {
            push_subtree(bindings, child, depth + 1, lines);
        }
    }
}

/// Format a value or child read from a node.
pub fn format_entry_text(entry: &Entry) -> String {
    match entry {
        Entry::Attribute(value) | Entry::Data(value) => value.to_string(),
        Entry::Node(node) => {
            let mut out = format!("{}/\n", node.name);
            for (key, value) in &node.attributes {
                out.push_str(&format!("  @{} = {}\n", key, value));
            }
            for key in node.children.keys() {
                out.push_str(&format!("  {}\n", key));
            }
            out.trim_end().to_string()
        }
    }
}

/// Format the verify command result.
pub fn format_verify_text(result: &VerifyResult) -> String {
    if result.valid {
        return format!(
            "Verification passed:\n  Nodes: {}\n  All parent references resolve",
            result.node_count
        );
    }
    let mut s = format!(
        "Verification failed:\n  Nodes: {}\n\nErrors ({}):",
        result.node_count,
        result.errors.len()
    );
    for e in &result.errors {
        s.push_str(&format!("\n  - {}", e));
    }
    if !result.unresolved.is_empty() {
        s.push_str(&format!("\n\nUnresolved ({}):", result.unresolved.len()));
        for node in &result.unresolved {
            s.push_str(&format!("\n  - {}", node));
        }
    }
    s
}
