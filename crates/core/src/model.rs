use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{Error, Result};

/// One model-fetch request, built from run configuration and consumed once.
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    /// Hub-vendor model identifier, e.g. "facebook/opt-125m".
    pub model_id: String,
    /// Optional version/branch/tag pin. Defaults to the hub's main revision.
    pub revision: Option<String>,
    /// Single-file mode: fetch exactly this file into a flat directory.
    pub filename: Option<String>,
    /// Glob patterns a file must match to be fetched (empty = allow all).
    pub allow_patterns: Vec<String>,
    /// Glob patterns that exclude a file even when allowed.
    pub ignore_patterns: Vec<String>,
}

/// One remote file to fetch, with its resolved local destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub remote_path: String,
    pub dest: PathBuf,
}

/// Aggregate outcome of a request. The size is computed by walking the
/// destination tree after every task has completed, so it is authoritative
/// even when a task overwrote an earlier file.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub destination: PathBuf,
    pub total_size_bytes: u64,
}

impl DownloadResult {
    /// Total size in GiB, the unit used for the final log line.
    pub fn total_size_gib(&self) -> f64 {
        self.total_size_bytes as f64 / 1_073_741_824.0
    }
}

impl DownloadRequest {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            ..Default::default()
        }
    }

    /// Local directory name for this model: `models--org--name`.
    ///
    /// Slash is the only substituted character, so the derivation is
    /// deterministic and idempotent ("--" never contains a slash).
    pub fn dir_name(&self) -> String {
        format!("models--{}", self.model_id.replace('/', "--"))
    }

    /// Destination directory under `root`.
    ///
    /// Single-file mode collapses to the flat root; otherwise each model
    /// gets its own `models--…` subdirectory.
    pub fn destination(&self, root: &Path) -> PathBuf {
        if self.filename.is_some() {
            root.to_path_buf()
        } else {
            root.join(self.dir_name())
        }
    }

    /// The allow-pattern set actually used for a fetch: the caller-supplied
    /// list, plus `filename` when single-file mode is active.
    pub fn effective_allow_patterns(&self) -> Vec<String> {
        let mut patterns = self.allow_patterns.clone();
        if let Some(filename) = &self.filename {
            patterns.push(filename.clone());
        }
        patterns
    }

    /// Turn the hub's file listing into the set of fetch tasks.
    ///
    /// In single-file mode this is exactly one task for `filename`,
    /// regardless of the listing. Otherwise files are filtered through the
    /// allow/ignore globs: an empty allow list allows everything, and any
    /// ignore match excludes the file.
    pub fn plan<I, S>(&self, available: I, root: &Path) -> Result<Vec<DownloadTask>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dest = self.destination(root);

        if let Some(filename) = &self.filename {
            return Ok(vec![DownloadTask {
                remote_path: filename.clone(),
                dest: dest.join(filename),
            }]);
        }

        let allow = compile_patterns(&self.allow_patterns)?;
        let ignore = compile_patterns(&self.ignore_patterns)?;

        let mut tasks = Vec::new();
        for file in available {
            let file = file.into();
            if !allow.is_empty() && !allow.iter().any(|p| p.matches(&file)) {
                continue;
            }
            if ignore.iter().any(|p| p.matches(&file)) {
                continue;
            }
            let dest = dest.join(&file);
            tasks.push(DownloadTask {
                remote_path: file,
                dest,
            });
        }
        Ok(tasks)
    }
}

fn compile_patterns(raw: &[String]) -> Result<Vec<Pattern>> {
    raw.iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| Error::Pattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}
