//! Markdown job summary

use crate::types::Metadata;
use std::fmt::Write;

/// Render the job summary. `artifact` is the artifact name, when one was
/// prepared.
pub fn render_summary(metadata: &Metadata, artifact: Option<&str>) -> String {
    let m = metadata;
    let mut out = String::with_capacity(1024);

    let ref_label = if m.git_ref.tag_name.is_empty() {
        format!("branch `{}`", m.git_ref.branch_name)
    } else {
        format!("tag `{}`", m.git_ref.tag_name)
    };

    let _ = writeln!(out, "## Repository metadata");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Field | Value |");
    let _ = writeln!(out, "|-------|-------|");
    let _ = writeln!(
        out,
        "| Repository | `{}` ({}) |",
        m.repository.full_name,
        m.repository.visibility.as_str()
    );
    let _ = writeln!(out, "| Event | `{}` |", m.event.name.as_str());
    let _ = writeln!(out, "| Ref | {} |", ref_label);
    let _ = writeln!(
        out,
        "| Commit | `{}` {} |",
        m.commit.sha_short,
        escape_cell(&m.commit.message)
    );
    if let Some(number) = m.pull_request.number {
        let _ = writeln!(
            out,
            "| Pull request | #{} `{}` → `{}` |",
            number, m.pull_request.source_branch, m.pull_request.target_branch
        );
    }
    let _ = writeln!(out, "| Cache key | `{}` |", m.cache.key);
    let _ = writeln!(out, "| Changed files | {} |", m.changed_files.count);
    if let Some(name) = artifact {
        let _ = writeln!(out, "| Artifact | `{}` |", name);
    }
    let _ = writeln!(out);
    out
}

/// Keep table cells on one row
fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\r', '\n'], " ")
}
