//! End-to-end scenarios through the environment reader and the pipeline

use assert_matches::assert_matches;
use repometa_core::changes::ChangeScope;
use repometa_core::env::EnvironmentReader;
use repometa_core::output::writer::{JSON_FILE, PRETTY_JSON_FILE, YAML_FILE};
use repometa_core::pipeline::run_with_detector;
use repometa_core::{
    run_action, ActionConfig, ArtifactFormat, ChangeDetector, EnvironmentContext, Error, Stage,
};
use std::future::Future;
use std::path::Path;
use tempfile::TempDir;

const SHA: &str = "a1b2c3d4e5f6789012345678901234567890abcd";

struct StaticDetector(Vec<String>);

impl ChangeDetector for StaticDetector {
    fn name(&self) -> &'static str {
        "static"
    }

    fn detect<'a>(
        &'a self,
        _scope: &'a ChangeScope,
    ) -> impl Future<Output = repometa_core::Result<Vec<String>>> + Send + 'a {
        async move { Ok(self.0.clone()) }
    }
}

fn git(repo_path: &Path, args: &[&str]) -> String {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .unwrap();
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Runner-like environment with the payload written to `event.json`
fn context(dir: &TempDir, event: &str, git_ref: &str, sha: &str, payload: &str) -> EnvironmentContext {
    let event_path = dir.path().join("event.json");
    std::fs::write(&event_path, payload).unwrap();

    EnvironmentContext::from_pairs([
        ("GITHUB_REPOSITORY", "octo/widgets"),
        ("GITHUB_REPOSITORY_OWNER", "octo"),
        ("GITHUB_EVENT_NAME", event),
        ("GITHUB_REF", git_ref),
        ("GITHUB_SHA", sha),
        ("GITHUB_ACTOR", "mona"),
        ("GITHUB_ACTOR_ID", "583231"),
        ("GITHUB_JOB", "metadata"),
        ("GITHUB_RUN_ID", "1234"),
        ("GITHUB_SERVER_URL", "https://github.com"),
    ])
    .with("GITHUB_EVENT_PATH", event_path.display().to_string())
    .with("GITHUB_OUTPUT", dir.path().join("output").display().to_string())
    .with("RUNNER_TEMP", dir.path().join("tmp").display().to_string())
}

fn offline_config(dir: &TempDir) -> ActionConfig {
    ActionConfig {
        repo_path: dir.path().join("checkout"),
        ..Default::default()
    }
}

// Scenario A: push to the default branch `main`
#[tokio::test]
async fn test_push_to_default_main_branch() {
    let dir = TempDir::new().unwrap();
    let ctx = context(
        &dir,
        "push",
        "refs/heads/main",
        SHA,
        r#"{"repository": {"default_branch": "main", "private": false}}"#,
    );
    let raw = EnvironmentReader::new(ctx).read().unwrap();

    let report = run_with_detector(&raw, &offline_config(&dir), &StaticDetector(vec!["README.md".into()]))
        .await
        .unwrap();
    let m = &report.metadata;

    assert_eq!(m.event.name.as_str(), "push");
    assert!(m.event.is_branch_push);
    assert_eq!(m.event.primary_flag_count(), 1);
    assert_eq!(m.git_ref.branch_name, "main");
    assert!(m.git_ref.is_default_branch);
    assert!(m.git_ref.is_main_branch);
    assert_eq!(m.commit.sha_short, "a1b2c3d");
    assert_eq!(m.repository.is_public, Some(true));

    assert_eq!(report.outputs.get("is_branch_push"), Some("true"));
    assert_eq!(report.outputs.get("is_default_branch"), Some("true"));
    assert_eq!(report.outputs.get("commit_sha_short"), Some("a1b2c3d"));
    assert_eq!(report.outputs.get("actor_id"), Some("583231"));
    assert_eq!(report.outputs.get("pr_number"), Some(""));
}

// Scenario B: version tag push
#[tokio::test]
async fn test_version_tag_push() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, "push", "refs/tags/v1.2.3", SHA, "{}");

    let report = run_action(ctx, &offline_config(&dir)).await.unwrap();
    let m = &report.metadata;

    assert!(m.event.is_tag_push);
    assert!(m.event.tag_push_event);
    assert_eq!(m.git_ref.tag_name, "v1.2.3");
    assert_eq!(m.git_ref.branch_name, "");
    assert_eq!(m.changed_files.count, 0);
    assert_eq!(report.detector, "git");
}

// Scenario C: non-version tag push
#[tokio::test]
async fn test_non_version_tag_push() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, "push", "refs/tags/release-candidate", SHA, "{}");

    let report = run_action(ctx, &offline_config(&dir)).await.unwrap();

    assert!(report.metadata.event.is_tag_push);
    assert!(!report.metadata.event.tag_push_event);
    assert_eq!(report.outputs.get("tag_push_event"), Some("false"));
}

// Scenario E: only YAML artifacts requested
#[tokio::test]
async fn test_yaml_only_artifacts() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, "release", "refs/tags/v2.0.0", SHA, r#"{"action": "published"}"#);
    let config = ActionConfig {
        upload_artifacts: true,
        artifact_formats: ArtifactFormat::parse_list("yaml").unwrap(),
        ..offline_config(&dir)
    };

    let report = run_action(ctx, &config).await.unwrap();
    let artifacts = report.artifacts.unwrap();

    assert!(artifacts.name.starts_with("metadata-"));
    assert!(artifacts.dir.join(YAML_FILE).exists());
    assert!(!artifacts.dir.join(JSON_FILE).exists());
    assert!(!artifacts.dir.join(PRETTY_JSON_FILE).exists());
    assert!(report.metadata.event.is_release);
    assert_eq!(report.metadata.event.action, "published");

    let output = std::fs::read_to_string(dir.path().join("output")).unwrap();
    assert!(output.contains(&format!("artifact_name={}\n", artifacts.name)));
}

// Scenario F: zero changed files through the diff strategy
#[tokio::test]
async fn test_zero_changed_files() {
    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");
    std::fs::create_dir_all(&checkout).unwrap();
    git(&checkout, &["init", "-b", "main"]);
    git(&checkout, &["config", "user.name", "Test User"]);
    git(&checkout, &["config", "user.email", "test@example.com"]);
    std::fs::write(checkout.join("a.txt"), "a").unwrap();
    git(&checkout, &["add", "."]);
    git(&checkout, &["commit", "-m", "Initial commit\n\nbody"]);
    let head = git(&checkout, &["rev-parse", "HEAD"]);

    // Re-run of an already pushed commit: before == head
    let payload = format!(r#"{{"before": "{}", "after": "{}"}}"#, head, head);
    let ctx = context(&dir, "push", "refs/heads/main", &head, &payload);

    let report = run_action(ctx, &offline_config(&dir)).await.unwrap();
    let m = &report.metadata;

    assert_eq!(m.changed_files.count, 0);
    assert_eq!(m.changed_files.files, "");
    // Falls back to the local commit for message and author
    assert_eq!(m.commit.message, "Initial commit");
    assert_eq!(m.commit.author, "Test User");

    let from_json: serde_json::Value = serde_json::from_str(&report.rendered.json).unwrap();
    let from_yaml: serde_json::Value = serde_yaml::from_str(&report.rendered.yaml).unwrap();
    assert_eq!(from_json, from_yaml);
    assert_eq!(from_json["changed_files"]["count"], 0);
}

#[tokio::test]
async fn test_branch_push_lists_changed_files() {
    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");
    std::fs::create_dir_all(&checkout).unwrap();
    git(&checkout, &["init", "-b", "main"]);
    git(&checkout, &["config", "user.name", "Test User"]);
    git(&checkout, &["config", "user.email", "test@example.com"]);
    std::fs::write(checkout.join("a.txt"), "a").unwrap();
    git(&checkout, &["add", "."]);
    git(&checkout, &["commit", "-m", "first"]);
    let before = git(&checkout, &["rev-parse", "HEAD"]);
    std::fs::create_dir_all(checkout.join("src")).unwrap();
    std::fs::write(checkout.join("src/lib.rs"), "fn main() {}").unwrap();
    std::fs::write(checkout.join("b.txt"), "b").unwrap();
    git(&checkout, &["add", "."]);
    git(&checkout, &["commit", "-m", "second"]);
    let head = git(&checkout, &["rev-parse", "HEAD"]);

    let payload = format!(
        r#"{{"before": "{}", "head_commit": {{"id": "{}", "message": "second", "author": {{"name": "Mona"}}}}}}"#,
        before, head
    );
    let ctx = context(&dir, "push", "refs/heads/main", &head, &payload);

    let report = run_action(ctx, &offline_config(&dir)).await.unwrap();

    assert_eq!(report.metadata.changed_files.count, 2);
    assert_eq!(report.metadata.changed_files.files, "b.txt src/lib.rs");
    assert_eq!(report.metadata.commit.author, "Mona");
}

#[tokio::test]
async fn test_stale_head_commit_uses_local_commit() {
    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");
    std::fs::create_dir_all(&checkout).unwrap();
    git(&checkout, &["init", "-b", "main"]);
    git(&checkout, &["config", "user.name", "Test User"]);
    git(&checkout, &["config", "user.email", "test@example.com"]);
    std::fs::write(checkout.join("a.txt"), "a").unwrap();
    git(&checkout, &["add", "."]);
    git(&checkout, &["commit", "-m", "Initial commit"]);
    let head = git(&checkout, &["rev-parse", "HEAD"]);

    // Payload describes some other commit than GITHUB_SHA
    let payload = format!(
        r#"{{"before": "{}", "head_commit": {{"id": "{}", "message": "stale", "author": {{"name": "Mona"}}}}}}"#,
        head, "1".repeat(40)
    );
    let ctx = context(&dir, "push", "refs/heads/main", &head, &payload);

    let report = run_action(ctx, &offline_config(&dir)).await.unwrap();

    assert_eq!(report.metadata.commit.message, "Initial commit");
    assert_eq!(report.metadata.commit.author, "Test User");
}

#[tokio::test]
async fn test_missing_required_variable_fails_in_environment_stage() {
    let dir = TempDir::new().unwrap();
    let ctx = EnvironmentContext::from_pairs([("GITHUB_EVENT_NAME", "push")])
        .with("GITHUB_OUTPUT", dir.path().join("output").display().to_string());

    let failure = run_action(ctx, &offline_config(&dir)).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Environment);
    assert_matches!(failure.error, Error::Config(ref msg) if msg.contains("GITHUB_REPOSITORY"));
    assert!(!dir.path().join("output").exists());
}

#[tokio::test]
async fn test_malformed_payload_fails() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, "push", "refs/heads/main", SHA, "{not json");

    let failure = run_action(ctx, &offline_config(&dir)).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Environment);
    assert_matches!(failure.error, Error::Config(_));
}

#[tokio::test]
async fn test_schedule_has_no_change_set() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, "schedule", "refs/heads/main", SHA, r#"{"schedule": "0 0 * * *"}"#);

    let report = run_action(ctx, &offline_config(&dir)).await.unwrap();

    assert!(report.metadata.event.is_schedule);
    assert_eq!(report.metadata.event.primary_flag_count(), 1);
    assert_eq!(report.metadata.changed_files.count, 0);
    assert_eq!(report.metadata.run.url, "https://github.com/octo/widgets/actions/runs/1234");
}
