//! Artifact writer: persists the requested renderings to an artifact directory

use super::serializer::RenderedMetadata;
use crate::config::ArtifactFormat;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Compact JSON file name
pub const JSON_FILE: &str = "metadata.json";
/// Indented JSON file name
pub const PRETTY_JSON_FILE: &str = "metadata-pretty.json";
/// YAML file name
pub const YAML_FILE: &str = "metadata.yaml";

/// Length of the random artifact name suffix
const SUFFIX_LEN: usize = 4;

/// Files written for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    /// Artifact name (directory name)
    pub name: String,
    /// Artifact directory
    pub dir: PathBuf,
    /// Files in write order
    pub files: Vec<PathBuf>,
}

impl WrittenArtifacts {
    /// Delete the files and, if it is then empty, the directory
    pub fn remove(&self) {
        for path in &self.files {
            let _ = std::fs::remove_file(path);
        }
        let _ = std::fs::remove_dir(&self.dir);
    }
}

/// Writes artifact files below a root directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
    formats: Vec<ArtifactFormat>,
}

impl ArtifactWriter {
    /// Writer for `formats` below `root`
    pub fn new(root: impl Into<PathBuf>, formats: Vec<ArtifactFormat>) -> Self {
        Self {
            root: root.into(),
            formats,
        }
    }

    /// `<job_id>-<4 random alphanumerics>`. The job id is reduced to
    /// characters that are safe in directory and artifact names.
    pub fn artifact_name(job_id: &str) -> String {
        let sanitized: String = job_id
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let prefix = match sanitized.trim_matches(|c| c == '-' || c == '.') {
            "" => "metadata",
            p => p,
        };
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", prefix, &uuid[..SUFFIX_LEN])
    }

    /// (file name, contents) for every requested format
    fn planned_files<'r>(&self, rendered: &'r RenderedMetadata) -> Vec<(&'static str, &'r str)> {
        let mut files = Vec::with_capacity(3);
        for format in &self.formats {
            match format {
                ArtifactFormat::Json => {
                    files.push((JSON_FILE, rendered.json.as_str()));
                    files.push((PRETTY_JSON_FILE, rendered.json_pretty.as_str()));
                }
                ArtifactFormat::Yaml => files.push((YAML_FILE, rendered.yaml.as_str())),
            }
        }
        files
    }

    /// Write into a new directory `<root>/<name>`
    pub fn write(&self, name: &str, rendered: &RenderedMetadata) -> Result<WrittenArtifacts> {
        let dir = self.root.join(name);
        let files = self.write_into(&dir, rendered)?;
        Ok(WrittenArtifacts {
            name: name.to_string(),
            dir,
            files,
        })
    }

    /// Write every requested file into `dir`, creating it if absent.
    ///
    /// Each file goes to a temporary name first and is renamed into place.
    /// If any file fails, the files already written are removed again.
    pub fn write_into(&self, dir: &Path, rendered: &RenderedMetadata) -> Result<Vec<PathBuf>> {
        let created_dir = !dir.exists();
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for (file_name, contents) in self.planned_files(rendered) {
            let target = dir.join(file_name);
            match write_atomic(&target, contents) {
                Ok(()) => written.push(target),
                Err(e) => {
                    tracing::warn!(file = %target.display(), error = %e, "artifact write failed, rolling back");
                    for path in &written {
                        let _ = std::fs::remove_file(path);
                    }
                    if created_dir {
                        let _ = std::fs::remove_dir(dir);
                    }
                    return Err(e);
                }
            }
        }

        tracing::debug!(dir = %dir.display(), files = written.len(), "artifacts written");
        Ok(written)
    }
}

fn write_atomic(target: &Path, contents: &str) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = target.with_file_name(format!(".{}.tmp", file_name));

    if let Err(e) = std::fs::write(&tmp, contents) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&tmp, target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
