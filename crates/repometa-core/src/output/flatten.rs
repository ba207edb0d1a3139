//! Flat key/value step outputs and the `$GITHUB_OUTPUT` file format

use super::serializer::RenderedMetadata;
use crate::error::Result;
use crate::types::Metadata;
use std::io::Write;
use std::path::Path;

/// Ordered step outputs; every value is a string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatOutputs {
    entries: Vec<(&'static str, String)>,
}

fn flag(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

impl FlatOutputs {
    /// Flatten a rendered record. Booleans become `"true"`/`"false"`; an
    /// unknown visibility reports both visibility flags as `"false"`.
    pub fn from_metadata(metadata: &Metadata, rendered: &RenderedMetadata) -> Self {
        let m = metadata;
        let entries = vec![
            ("repository_owner", m.repository.owner.clone()),
            ("repository_name", m.repository.name.clone()),
            ("repository_full_name", m.repository.full_name.clone()),
            ("repository_is_public", flag(m.repository.is_public.unwrap_or(false))),
            ("repository_is_private", flag(m.repository.is_private.unwrap_or(false))),
            ("repository_visibility", m.repository.visibility.as_str().to_string()),
            ("repository_default_branch", m.repository.default_branch.clone()),
            ("event_name", m.event.name.as_str().to_string()),
            ("event_action", m.event.action.clone()),
            ("is_tag_push", flag(m.event.is_tag_push)),
            ("is_branch_push", flag(m.event.is_branch_push)),
            ("is_pull_request", flag(m.event.is_pull_request)),
            ("is_release", flag(m.event.is_release)),
            ("is_schedule", flag(m.event.is_schedule)),
            ("is_workflow_dispatch", flag(m.event.is_workflow_dispatch)),
            ("tag_push_event", flag(m.event.tag_push_event)),
            ("branch_name", m.git_ref.branch_name.clone()),
            ("tag_name", m.git_ref.tag_name.clone()),
            ("is_default_branch", flag(m.git_ref.is_default_branch)),
            ("is_main_branch", flag(m.git_ref.is_main_branch)),
            ("commit_sha", m.commit.sha.clone()),
            ("commit_sha_short", m.commit.sha_short.clone()),
            ("commit_message", m.commit.message.clone()),
            ("commit_author", m.commit.author.clone()),
            (
                "pr_number",
                m.pull_request
                    .number
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
            ),
            ("pr_source_branch", m.pull_request.source_branch.clone()),
            ("pr_target_branch", m.pull_request.target_branch.clone()),
            ("pr_is_fork", flag(m.pull_request.is_fork)),
            ("pr_commits_count", m.pull_request.commits_count.to_string()),
            ("actor_name", m.actor.name.clone()),
            ("actor_id", m.actor.id.to_string()),
            ("cache_key", m.cache.key.clone()),
            ("cache_restore_key", m.cache.restore_key.clone()),
            ("changed_files", m.changed_files.files.clone()),
            ("changed_files_count", m.changed_files.count.to_string()),
            ("run_id", m.run.id.clone()),
            ("run_number", m.run.number.clone()),
            ("metadata_json", rendered.json.clone()),
            ("metadata_yaml", rendered.yaml.clone()),
        ];
        Self { entries }
    }

    /// Append an output
    pub fn push(&mut self, key: &'static str, value: impl Into<String>) {
        self.entries.push((key, value.into()));
    }

    /// Value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Outputs in order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Number of outputs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no outputs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render in the output-file format.
    ///
    /// Single-line values use `key=value`; multi-line values use
    /// `key<<DELIM` ... `DELIM`. The delimiter is regenerated until it does
    /// not occur in any value.
    pub fn to_output_file(&self) -> String {
        let mut delimiter = new_delimiter();
        while self.entries.iter().any(|(_, v)| v.contains(&delimiter)) {
            delimiter = new_delimiter();
        }
        self.to_output_file_with(&delimiter)
    }

    fn to_output_file_with(&self, delimiter: &str) -> String {
        let mut out = String::with_capacity(self.entries.iter().map(|(k, v)| k.len() + v.len() + 2).sum());
        for (key, value) in &self.entries {
            if value.contains('\n') || value.contains('\r') {
                out.push_str(key);
                out.push_str("<<");
                out.push_str(delimiter);
                out.push('\n');
                out.push_str(value.trim_end_matches('\n'));
                out.push('\n');
                out.push_str(delimiter);
                out.push('\n');
            } else {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                out.push('\n');
            }
        }
        out
    }
}

fn new_delimiter() -> String {
    format!("REPOMETA_{}", uuid::Uuid::new_v4().simple())
}

/// Append `content` to a file, creating it if needed
pub fn append_to_file(path: &Path, content: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(())
}
