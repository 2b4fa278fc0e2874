use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the fetcher core.
///
/// Configuration and registry errors abort a run before any network
/// activity; transfer errors abort after the pool has drained, naming
/// every file that failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown model hub: {0}")]
    UnsupportedHub(String),

    #[error("failed to download {} of {attempted} files: {}", failed.len(), failed.join(", "))]
    Transfer {
        attempted: usize,
        failed: Vec<String>,
    },

    #[error("remote returned {status} for {url}")]
    RemoteStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("hub response for '{model_id}' could not be decoded: {reason}")]
    HubResponse { model_id: String, reason: String },

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("progress template error: {0}")]
    Template(#[from] indicatif::style::TemplateError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
