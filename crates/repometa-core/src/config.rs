//! Action inputs

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Default merge-base search bound for the diff strategy
pub const DEFAULT_FETCH_DEPTH: u32 = 15;

/// Default step of each `git fetch --deepen`
pub const DEFAULT_DEEPEN_STEP: u32 = 5;

/// Default hosting API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Artifact file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactFormat {
    /// `metadata.json` (compact) and `metadata-pretty.json` (indented)
    Json,
    /// `metadata.yaml`
    Yaml,
}

impl ArtifactFormat {
    /// Parse a single format name (case-insensitive)
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(Error::Config(format!(
                "unknown artifact format '{}' (expected json or yaml)",
                other
            ))),
        }
    }

    /// Parse a comma-separated list, keeping first-seen order.
    ///
    /// An empty or blank list yields the default `[Json, Yaml]`.
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        let mut formats = Vec::with_capacity(2);
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let format = Self::parse(item)?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        if formats.is_empty() {
            return Ok(Self::defaults());
        }
        Ok(formats)
    }

    /// Both formats
    pub fn defaults() -> Vec<Self> {
        vec![Self::Json, Self::Yaml]
    }

    /// Get string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

/// Changed-files detection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeDetection {
    /// Local history diff
    Git,
    /// Hosting API file listing
    GithubApi,
    /// API when a credential is present, otherwise git
    #[default]
    Auto,
}

impl ChangeDetection {
    /// Parse `git`, `github_api`, `auto` or an empty string
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "git" => Ok(Self::Git),
            "github_api" | "api" => Ok(Self::GithubApi),
            other => Err(Error::Config(format!(
                "unknown change detection method '{}' (expected git, github_api or auto)",
                other
            ))),
        }
    }
}

/// Configuration for one invocation
#[derive(Clone)]
pub struct ActionConfig {
    /// Echo intermediate values
    pub debug: bool,
    /// API credential
    pub token: Option<String>,
    /// Append a Markdown summary to the job summary file
    pub generate_summary: bool,
    /// Write artifact files
    pub upload_artifacts: bool,
    /// Which artifact files to write
    pub artifact_formats: Vec<ArtifactFormat>,
    /// Changed-files strategy override
    pub change_detection: ChangeDetection,
    /// Maximum total deepening for the diff strategy
    pub fetch_depth: u32,
    /// Deepening step
    pub deepen_step: u32,
    /// Artifact directory prefix (defaults to the job name)
    pub job_id: Option<String>,
    /// Parent of the artifact directory (defaults to the runner temp dir)
    pub artifact_root: Option<PathBuf>,
    /// Repository checkout
    pub repo_path: PathBuf,
    /// Hosting API root override
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ActionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionConfig")
            .field("debug", &self.debug)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("generate_summary", &self.generate_summary)
            .field("upload_artifacts", &self.upload_artifacts)
            .field("artifact_formats", &self.artifact_formats)
            .field("change_detection", &self.change_detection)
            .field("fetch_depth", &self.fetch_depth)
            .field("deepen_step", &self.deepen_step)
            .field("job_id", &self.job_id)
            .field("artifact_root", &self.artifact_root)
            .field("repo_path", &self.repo_path)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            debug: false,
            token: None,
            generate_summary: true,
            upload_artifacts: false,
            artifact_formats: ArtifactFormat::defaults(),
            change_detection: ChangeDetection::Auto,
            fetch_depth: DEFAULT_FETCH_DEPTH,
            deepen_step: DEFAULT_DEEPEN_STEP,
            job_id: None,
            artifact_root: None,
            repo_path: PathBuf::from("."),
            api_url: None,
        }
    }
}

impl ActionConfig {
    /// Credential, treating an empty string as absent
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}
