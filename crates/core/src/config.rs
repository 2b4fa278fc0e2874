//! Run-configuration resolution.
//!
//! The entry point collects raw settings (flags or the loader's
//! environment variables) into [`Settings`]; resolving them into a typed
//! [`Source`] validates everything up front, before any backend or client
//! is constructed.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::hub::HUB_HUGGING_FACE;
use crate::model::DownloadRequest;
use crate::objstore::ObjStoreSpec;

/// Default destination root for downloaded models.
pub const DEFAULT_MODEL_ROOT: &str = "/workspace/models";

pub const SOURCE_MODEL_HUB: &str = "modelhub";
pub const SOURCE_OBJ_STORE: &str = "objstore";

/// Raw run settings, as collected by the entry point.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Source mode: `modelhub` or `objstore`.
    pub source_type: String,
    pub hub_name: String,
    pub model_id: Option<String>,
    pub revision: Option<String>,
    pub filename: Option<String>,
    /// Comma-separated glob list.
    pub allow_patterns: Option<String>,
    /// Comma-separated glob list.
    pub ignore_patterns: Option<String>,
    pub provider: Option<String>,
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub model_path: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub model_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_type: String::new(),
            hub_name: HUB_HUGGING_FACE.to_string(),
            model_id: None,
            revision: None,
            filename: None,
            allow_patterns: None,
            ignore_patterns: None,
            provider: None,
            endpoint: None,
            bucket: None,
            model_path: None,
            access_key_id: None,
            secret_access_key: None,
            model_root: PathBuf::from(DEFAULT_MODEL_ROOT),
        }
    }
}

/// A validated download source.
#[derive(Debug, Clone)]
pub enum Source {
    ModelHub {
        hub_name: String,
        request: DownloadRequest,
    },
    ObjStore(ObjStoreSpec),
}

impl Settings {
    /// Validate the raw settings into a [`Source`].
    ///
    /// Every configuration error is raised here, before any network
    /// client exists.
    pub fn source(&self) -> Result<Source> {
        match self.source_type.as_str() {
            SOURCE_MODEL_HUB => {
                let model_id = self
                    .model_id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        Error::Config("MODEL_ID is required in modelhub mode".to_string())
                    })?;
                Ok(Source::ModelHub {
                    hub_name: self.hub_name.clone(),
                    request: DownloadRequest {
                        model_id,
                        revision: self.revision.clone(),
                        filename: self.filename.clone(),
                        allow_patterns: split_patterns(self.allow_patterns.as_deref()),
                        ignore_patterns: split_patterns(self.ignore_patterns.as_deref()),
                    },
                })
            }
            SOURCE_OBJ_STORE => Ok(Source::ObjStore(ObjStoreSpec {
                provider: required(&self.provider, "PROVIDER")?,
                endpoint: required(&self.endpoint, "ENDPOINT")?,
                bucket: required(&self.bucket, "BUCKET")?,
                src: required(&self.model_path, "MODEL_PATH")?,
                access_key_id: self.access_key_id.clone(),
                secret_access_key: self.secret_access_key.clone(),
            })),
            other => Err(Error::Config(format!(
                "unknown model source type: {}",
                other
            ))),
        }
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{} is required in objstore mode", name)))
}

/// Split a comma-separated glob list, dropping empty entries.
pub fn split_patterns(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Huggingface token resolution. Both HF_TOKEN and HUGGING_FACE_HUB_TOKEN
/// work, matching what the loader's environment injects.
pub fn hf_token_from_env() -> Option<String> {
    std::env::var("HF_TOKEN")
        .or_else(|_| std::env::var("HUGGING_FACE_HUB_TOKEN"))
        .ok()
        .filter(|t| !t.is_empty())
}
