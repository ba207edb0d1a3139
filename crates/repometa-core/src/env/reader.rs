//! Typed access to runner variables and the event payload

use super::context::EnvironmentContext;
use super::payload::EventPayload;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Everything the resolvers need, read once from the environment
#[derive(Debug, Default)]
pub struct RawEnvironment {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub name: String,
    /// Raw event name
    pub event_name: String,
    /// Full ref (`refs/heads/main`, `refs/tags/v1`, `refs/pull/1/merge`)
    pub git_ref: String,
    /// `branch` or `tag`, when the runner provides it
    pub ref_type: Option<String>,
    /// Head commit SHA (40 lowercase hex)
    pub sha: String,
    /// PR source branch
    pub head_ref: Option<String>,
    /// PR target branch
    pub base_ref: Option<String>,
    /// Actor login
    pub actor_name: String,
    /// Actor numeric id (0 when unknown)
    pub actor_id: u64,
    /// Decoded event payload
    pub payload: EventPayload,
    /// Workflow name
    pub workflow: String,
    /// Job id
    pub job: String,
    /// Run id
    pub run_id: String,
    /// Run number
    pub run_number: String,
    /// Run attempt
    pub run_attempt: String,
    /// Web root (`https://github.com`)
    pub server_url: String,
    /// API root, when the runner provides one
    pub api_url: Option<String>,
    /// `$GITHUB_OUTPUT`
    pub output_path: Option<PathBuf>,
    /// `$GITHUB_STEP_SUMMARY`
    pub summary_path: Option<PathBuf>,
    /// `$RUNNER_TEMP`
    pub runner_temp: Option<PathBuf>,
}

/// Reads a [`RawEnvironment`] out of an injected [`EnvironmentContext`]
pub struct EnvironmentReader {
    ctx: EnvironmentContext,
}

impl EnvironmentReader {
    /// Create a reader over `ctx`
    pub fn new(ctx: EnvironmentContext) -> Self {
        Self { ctx }
    }

    /// Read and validate all fields
    pub fn read(&self) -> Result<RawEnvironment> {
        let ctx = &self.ctx;

        let (owner, name) = parse_repository(ctx.require("GITHUB_REPOSITORY")?)?;
        if let Some(env_owner) = ctx.get("GITHUB_REPOSITORY_OWNER") {
            if !env_owner.eq_ignore_ascii_case(&owner) {
                return Err(Error::Config(format!(
                    "GITHUB_REPOSITORY_OWNER '{}' does not match GITHUB_REPOSITORY owner '{}'",
                    env_owner, owner
                )));
            }
        }

        let event_name = ctx.require("GITHUB_EVENT_NAME")?.to_string();
        let sha = parse_sha(ctx.require("GITHUB_SHA")?)?;

        let payload = match ctx.get("GITHUB_EVENT_PATH") {
            Some(path) => EventPayload::load(Path::new(path))?,
            None => EventPayload::default(),
        };

        let git_ref = ctx
            .get("GITHUB_REF")
            .map(str::to_string)
            .or_else(|| payload.git_ref.clone())
            .or_else(|| {
                payload
                    .release
                    .as_ref()
                    .and_then(|r| r.tag_name.as_deref())
                    .map(|tag| format!("refs/tags/{}", tag))
            })
            .ok_or_else(|| Error::Config("GITHUB_REF not set".to_string()))?;

        let actor_id = match ctx.get("GITHUB_ACTOR_ID") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("GITHUB_ACTOR_ID is not a number: {}", raw))
            })?,
            None => payload.sender.as_ref().and_then(|s| s.id).unwrap_or(0),
        };

        let actor_name = ctx
            .get("GITHUB_ACTOR")
            .map(str::to_string)
            .or_else(|| payload.sender.as_ref().and_then(|s| s.login.clone()))
            .unwrap_or_default();

        Ok(RawEnvironment {
            owner,
            name,
            event_name,
            git_ref,
            ref_type: ctx
                .get("GITHUB_REF_TYPE")
                .map(str::to_string)
                .or_else(|| payload.ref_type.clone()),
            sha,
            head_ref: ctx.get("GITHUB_HEAD_REF").map(str::to_string),
            base_ref: ctx.get("GITHUB_BASE_REF").map(str::to_string),
            actor_name,
            actor_id,
            payload,
            workflow: ctx.get_or_empty("GITHUB_WORKFLOW").to_string(),
            job: ctx.get_or_empty("GITHUB_JOB").to_string(),
            run_id: ctx.get_or_empty("GITHUB_RUN_ID").to_string(),
            run_number: ctx.get_or_empty("GITHUB_RUN_NUMBER").to_string(),
            run_attempt: ctx.get_or_empty("GITHUB_RUN_ATTEMPT").to_string(),
            server_url: ctx
                .get("GITHUB_SERVER_URL")
                .unwrap_or("https://github.com")
                .trim_end_matches('/')
                .to_string(),
            api_url: ctx.get("GITHUB_API_URL").map(str::to_string),
            output_path: ctx.get("GITHUB_OUTPUT").map(PathBuf::from),
            summary_path: ctx.get("GITHUB_STEP_SUMMARY").map(PathBuf::from),
            runner_temp: ctx.get("RUNNER_TEMP").map(PathBuf::from),
        })
    }
}

/// Split `owner/name`
pub fn parse_repository(repository: &str) -> Result<(String, String)> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(Error::Config(format!(
            "Invalid GITHUB_REPOSITORY format: {}",
            repository
        ))),
    }
}

/// Validate a full commit SHA and normalise it to lowercase
pub fn parse_sha(sha: &str) -> Result<String> {
    let sha = sha.trim();
    if sha.len() == 40 && sha.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(sha.to_ascii_lowercase())
    } else {
        Err(Error::Config(format!(
            "GITHUB_SHA is not a 40-character hex commit id: {}",
            sha
        )))
    }
}
