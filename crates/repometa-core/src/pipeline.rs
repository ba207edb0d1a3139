//! One invocation, end to end.
//!
//! All in-memory stages (read, classify, detect, aggregate, serialize,
//! flatten) run before anything touches the filesystem. Artifacts are
//! written next, then the step outputs, then the job summary. A failure in a
//! later write undoes the earlier ones, so a failed run leaves no partial
//! output behind.

use crate::aggregate::{local_commit_summary, repository_details, MetadataAggregator};
use crate::changes::{api_base_url, Detector};
use crate::config::ActionConfig;
use crate::env::{EnvironmentContext, EnvironmentReader, RawEnvironment};
use crate::error::{AtStage, Failure, Stage};
use crate::http::GitHubApiClient;
use crate::output::flatten::append_to_file;
use crate::output::{render_summary, ArtifactWriter, FlatOutputs, RenderedMetadata, WrittenArtifacts};
use crate::traits::ChangeDetector;
use crate::types::Metadata;
use std::path::{Path, PathBuf};

/// Default artifact name prefix when neither the input nor `GITHUB_JOB` is set
pub const DEFAULT_JOB_ID: &str = "metadata";

/// Everything one successful invocation produced
#[derive(Debug, Clone)]
pub struct ActionReport {
    /// The aggregated record
    pub metadata: Metadata,
    /// JSON and YAML renderings
    pub rendered: RenderedMetadata,
    /// Flattened step outputs
    pub outputs: FlatOutputs,
    /// Markdown job summary, when requested
    pub summary: Option<String>,
    /// Artifact files, when requested
    pub artifacts: Option<WrittenArtifacts>,
    /// Name of the changed-files strategy that ran
    pub detector: &'static str,
    /// Whether the step outputs were appended to `$GITHUB_OUTPUT`
    pub outputs_written: bool,
}

/// Read the environment from `ctx`, pick the configured detector and run
pub async fn run_action(ctx: EnvironmentContext, config: &ActionConfig) -> Result<ActionReport, Failure> {
    let raw = EnvironmentReader::new(ctx).read().at(Stage::Environment)?;
    tracing::debug!(
        repository = %format!("{}/{}", raw.owner, raw.name),
        event = %raw.event_name,
        git_ref = %raw.git_ref,
        sha = %raw.sha,
        "environment read"
    );

    let detector = Detector::from_config(config, &raw);
    run_with_detector(&raw, config, &detector).await
}

/// Run every stage after the environment read with the given detector
pub async fn run_with_detector<D: ChangeDetector>(
    raw: &RawEnvironment,
    config: &ActionConfig,
    detector: &D,
) -> Result<ActionReport, Failure> {
    // Classification
    let client = config
        .token()
        .map(|token| GitHubApiClient::new(api_base_url(config, raw), Some(token.to_string())));
    let details = repository_details(raw, client.as_ref())
        .await
        .at(Stage::Classification)?;

    let aggregator = MetadataAggregator::new(raw);
    let classification = aggregator.classify(&details).at(Stage::Classification)?;
    tracing::debug!(
        event = classification.event.name.as_str(),
        branch = %classification.git_ref.branch_name,
        tag = %classification.git_ref.tag_name,
        default_branch = ?details.default_branch,
        visibility = details.visibility.as_str(),
        scope = ?classification.scope,
        "event classified"
    );

    // Changed files
    let changed = detector
        .detect(&classification.scope)
        .await
        .at(Stage::ChangedFiles)?;
    tracing::debug!(strategy = detector.name(), count = changed.len(), "changed files resolved");

    // Aggregation
    let local = if aggregator.needs_local_commit() {
        local_commit_summary(config.repo_path.clone(), raw.sha.clone()).await
    } else {
        None
    };
    let commit = aggregator.commit(local);
    let metadata = aggregator
        .assemble(&details, classification, commit, &changed)
        .at(Stage::Aggregation)?;

    // Serialization
    let rendered = RenderedMetadata::render(&metadata).at(Stage::Serialization)?;
    tracing::debug!(json = %rendered.json, "metadata rendered");

    // In-memory outputs
    let artifact_root = config
        .artifact_root
        .clone()
        .or_else(|| raw.runner_temp.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let artifact_name = config.upload_artifacts.then(|| {
        let job_id = config
            .job_id
            .as_deref()
            .filter(|j| !j.is_empty())
            .or(Some(raw.job.as_str()).filter(|j| !j.is_empty()))
            .unwrap_or(DEFAULT_JOB_ID);
        ArtifactWriter::artifact_name(job_id)
    });

    let mut outputs = FlatOutputs::from_metadata(&metadata, &rendered);
    if let Some(name) = &artifact_name {
        outputs.push("artifact_name", name.as_str());
        outputs.push("artifact_path", artifact_root.join(name).display().to_string());
    }
    let output_file = outputs.to_output_file();

    let summary = (config.generate_summary && raw.summary_path.is_some())
        .then(|| render_summary(&metadata, artifact_name.as_deref()));

    // Artifacts
    let artifacts = match &artifact_name {
        Some(name) => {
            let writer = ArtifactWriter::new(&artifact_root, config.artifact_formats.clone());
            Some(writer.write(name, &rendered).at(Stage::Artifacts)?)
        }
        None => None,
    };

    // Outputs
    let appended = append_outputs(raw, summary.as_deref(), &output_file);
    if let Err(e) = appended {
        if let Some(written) = &artifacts {
            written.remove();
        }
        return Err(Failure {
            stage: Stage::Outputs,
            error: e,
        });
    }

    tracing::info!(
        repository = %metadata.repository.full_name,
        event = metadata.event.name.as_str(),
        git_ref = metadata.git_ref.name(),
        changed_files = metadata.changed_files.count,
        "metadata extracted"
    );

    Ok(ActionReport {
        metadata,
        rendered,
        outputs,
        summary,
        artifacts,
        detector: detector.name(),
        outputs_written: raw.output_path.is_some(),
    })
}

/// Append the step outputs, then the summary. If the summary append fails
/// the output file is cut back to its previous length.
fn append_outputs(raw: &RawEnvironment, summary: Option<&str>, output_file: &str) -> crate::Result<()> {
    let Some(output_path) = &raw.output_path else {
        return append_summary(raw, summary);
    };

    let previous_len = std::fs::metadata(output_path).ok().map(|m| m.len());
    append_to_file(output_path, output_file)?;

    if let Err(e) = append_summary(raw, summary) {
        restore_length(output_path, previous_len);
        return Err(e);
    }
    Ok(())
}

fn append_summary(raw: &RawEnvironment, summary: Option<&str>) -> crate::Result<()> {
    if let (Some(path), Some(summary)) = (&raw.summary_path, summary) {
        append_to_file(path, summary)?;
    }
    Ok(())
}

/// Undo an append: truncate to `len`, or remove a file that did not exist
fn restore_length(path: &Path, len: Option<u64>) {
    let restored = match len {
        Some(len) => std::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .and_then(|file| file.set_len(len)),
        None => std::fs::remove_file(path),
    };
    if let Err(e) = restored {
        tracing::warn!(file = %path.display(), error = %e, "could not roll back step outputs");
    }
}
