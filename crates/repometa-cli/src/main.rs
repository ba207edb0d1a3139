#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use repometa_core::config::{DEFAULT_DEEPEN_STEP, DEFAULT_FETCH_DEPTH};
use repometa_core::telemetry::{default_level, init_tracing};
use repometa_core::{
    run_action, ActionConfig, ActionReport, ArtifactFormat, ChangeDetection, EnvironmentContext,
    Error, Failure, Stage,
};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repometa", version, about = "Repository and event metadata for GitHub Actions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Extract metadata and publish it as step outputs
    Extract(ExtractArgs),
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Echo intermediate values (true/false)
    #[arg(long, env = "REPOMETA_DEBUG")]
    debug: Option<String>,

    /// GitHub token for API access (falls back to GITHUB_TOKEN)
    #[arg(long, env = "REPOMETA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Append a Markdown summary to the job summary (true/false, default true)
    #[arg(long, env = "REPOMETA_GENERATE_SUMMARY")]
    generate_summary: Option<String>,

    /// Write artifact files (true/false)
    #[arg(long, env = "REPOMETA_UPLOAD_ARTIFACTS")]
    upload_artifacts: Option<String>,

    /// Artifact formats, comma-separated subset of json,yaml
    #[arg(long, env = "REPOMETA_ARTIFACT_FORMATS")]
    artifact_formats: Option<String>,

    /// Changed-files detection: git, github_api or auto
    #[arg(long, env = "REPOMETA_CHANGE_DETECTION")]
    change_detection: Option<String>,

    /// Maximum history to fetch while looking for a merge base
    #[arg(long, env = "REPOMETA_FETCH_DEPTH")]
    fetch_depth: Option<String>,

    /// Artifact name prefix (default: GITHUB_JOB)
    #[arg(long, env = "REPOMETA_JOB_ID")]
    job_id: Option<String>,

    /// Parent directory for artifacts (default: RUNNER_TEMP)
    #[arg(long, env = "REPOMETA_ARTIFACT_ROOT")]
    artifact_root: Option<String>,

    /// GitHub API root (default: GITHUB_API_URL)
    #[arg(long, env = "REPOMETA_API_URL")]
    api_url: Option<String>,

    /// Output format: gha, json, text (default: auto-detect)
    #[arg(long, env = "REPOMETA_OUTPUT_FORMAT")]
    output_format: Option<String>,

    /// Repository path (default: current directory)
    #[arg(long, env = "REPOMETA_REPO_PATH")]
    repo_path: Option<String>,
}

/// Output format for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// GitHub Actions: outputs go to $GITHUB_OUTPUT, a short summary to stdout
    Gha,
    /// Metadata JSON to stdout
    Json,
    /// Human-readable text to stdout
    Text,
}

impl OutputFormat {
    fn detect(explicit: Option<&str>, ctx: &EnvironmentContext) -> Self {
        match explicit {
            Some("gha") => OutputFormat::Gha,
            Some("json") => OutputFormat::Json,
            Some("text") => OutputFormat::Text,
            _ => {
                if ctx.get("GITHUB_ACTIONS").is_some() {
                    OutputFormat::Gha
                } else {
                    OutputFormat::Text
                }
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Extract(args) => run_extract(args),
    };
    std::process::exit(code);
}

/// Filter empty string from Option (env vars may produce "" for empty values)
fn clean_opt(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(name: &str, value: Option<&str>, default: bool) -> Result<bool, Error> {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(Error::Config(format!(
            "{} must be true or false, got '{}'",
            name, other
        ))),
    }
}

fn build_config(args: &ExtractArgs, ctx: &EnvironmentContext) -> Result<ActionConfig, Error> {
    let fetch_depth = match clean_opt(&args.fetch_depth) {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            Error::Config(format!("fetch_depth must be a non-negative integer, got '{}'", raw))
        })?,
        None => DEFAULT_FETCH_DEPTH,
    };

    let repo_path = clean_opt(&args.repo_path)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    Ok(ActionConfig {
        debug: parse_bool("debug", clean_opt(&args.debug), false)?,
        token: clean_opt(&args.token)
            .or_else(|| ctx.get("GITHUB_TOKEN"))
            .map(str::to_string),
        generate_summary: parse_bool("generate_summary", clean_opt(&args.generate_summary), true)?,
        upload_artifacts: parse_bool("upload_artifacts", clean_opt(&args.upload_artifacts), false)?,
        artifact_formats: ArtifactFormat::parse_list(clean_opt(&args.artifact_formats).unwrap_or(""))?,
        change_detection: ChangeDetection::parse(clean_opt(&args.change_detection).unwrap_or(""))?,
        fetch_depth,
        deepen_step: DEFAULT_DEEPEN_STEP,
        job_id: clean_opt(&args.job_id).map(str::to_string),
        artifact_root: clean_opt(&args.artifact_root).map(PathBuf::from),
        repo_path,
        api_url: clean_opt(&args.api_url).map(str::to_string),
    })
}

fn run_extract(args: ExtractArgs) -> i32 {
    let ctx = EnvironmentContext::from_process();

    let config = match build_config(&args, &ctx) {
        Ok(config) => config,
        Err(error) => {
            let failure = Failure {
                stage: Stage::Environment,
                error,
            };
            eprintln!("Error: {failure}");
            return 1;
        }
    };

    init_tracing(default_level(config.debug || ctx.flag("RUNNER_DEBUG")));
    tracing::debug!(?config, "inputs parsed");

    let output_format = OutputFormat::detect(clean_opt(&args.output_format), &ctx);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build();
    let rt = match rt {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {e}");
            return 1;
        }
    };

    let report = match rt.block_on(run_action(ctx, &config)) {
        Ok(report) => report,
        Err(failure) => {
            eprintln!("Error: {failure}");
            return 1;
        }
    };

    match output_format {
        OutputFormat::Gha => write_gha_output(&report),
        OutputFormat::Json => write_json_output(&report),
        OutputFormat::Text => write_text_output(&report),
    }

    0
}

/// Outputs are already in $GITHUB_OUTPUT; print a short summary to the job log
fn write_gha_output(report: &ActionReport) {
    if !report.outputs_written {
        eprintln!("Warning: GITHUB_OUTPUT not set, falling back to stdout");
        write_json_output(report);
        return;
    }

    let m = &report.metadata;
    let stdout = std::io::stdout();
    let mut w = stdout.lock();
    let _ = writeln!(w, "Repository Metadata");
    let _ = writeln!(w, "===================");
    let _ = writeln!(w, "Repository: {} ({})", m.repository.full_name, m.repository.visibility.as_str());
    let _ = writeln!(w, "Event: {}", m.event.name.as_str());
    let _ = writeln!(w, "Ref: {}", m.git_ref.name());
    let _ = writeln!(w, "Commit: {}", m.commit.sha_short);
    let _ = writeln!(w, "Changed files: {} (via {})", m.changed_files.count, report.detector);
    if let Some(ref artifacts) = report.artifacts {
        let _ = writeln!(w, "Artifact: {} ({} files)", artifacts.name, artifacts.files.len());
    }
}

/// Write the metadata JSON to stdout
fn write_json_output(report: &ActionReport) {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    let _ = lock.write_all(report.rendered.json.as_bytes());
    let _ = writeln!(lock);
}

/// Write every flat output as `key: value` to stdout
fn write_text_output(report: &ActionReport) {
    let stdout = std::io::stdout();
    let mut w = stdout.lock();

    let _ = writeln!(w, "Repository Metadata");
    let _ = writeln!(w, "===================");
    let _ = writeln!(w);
    for (key, value) in report.outputs.iter() {
        if key == "metadata_json" || key == "metadata_yaml" {
            continue;
        }
        let _ = writeln!(w, "{key}: {value}");
    }
    let _ = writeln!(w, "\nYAML:\n{}", report.rendered.yaml);
}
