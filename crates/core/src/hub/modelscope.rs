use std::path::PathBuf;

use async_trait::async_trait;
use indicatif::MultiProgress;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::download::{fetch_all, stream_to_file, MAX_WORKERS};
use crate::error::{Error, Result};
use crate::hub::{finish, ModelHub, HUB_MODEL_SCOPE};
use crate::model::{DownloadRequest, DownloadResult, DownloadTask};

const MS_API_BASE: &str = "https://modelscope.cn/api/v1";
const DEFAULT_REVISION: &str = "master";

/// ModelScope hub backend.
///
/// Same shape as the Huggingface backend: enumerate the repo's files,
/// filter, fan out through the shared pool. Single-file mode works here
/// too.
pub struct ModelScope {
    client: Client,
    model_root: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct MsFileListing {
    #[serde(rename = "Data", default)]
    pub data: MsRepoData,
}

#[derive(Debug, Deserialize, Default)]
pub struct MsRepoData {
    #[serde(rename = "Files", default)]
    pub files: Vec<MsRepoFile>,
}

#[derive(Debug, Deserialize)]
pub struct MsRepoFile {
    #[serde(rename = "Path")]
    pub path: String,
    /// "blob" for files, "tree" for directories.
    #[serde(rename = "Type", default)]
    pub file_type: String,
}

impl ModelScope {
    pub fn new(model_root: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("modelfetch/0.1.0")
                .build()
                .expect("Failed to create HTTP client"),
            model_root: model_root.into(),
        }
    }

    /// Enumerate all files belonging to the model at the given revision.
    pub async fn list_repo_files(&self, model_id: &str, revision: &str) -> Result<Vec<String>> {
        let url = format!("{}/models/{}/repo/files", MS_API_BASE, model_id);
        let response = self
            .client
            .get(&url)
            .query(&[("Recursive", "true"), ("Revision", revision)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::RemoteStatus {
                status: response.status(),
                url,
            });
        }

        let listing: MsFileListing = response.json().await.map_err(|e| Error::HubResponse {
            model_id: model_id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(listing
            .data
            .files
            .into_iter()
            .filter(|f| f.file_type != "tree")
            .map(|f| f.path)
            .collect())
    }

    async fn fetch_file(
        &self,
        model_id: &str,
        revision: &str,
        task: DownloadTask,
        progress: &MultiProgress,
    ) -> Result<PathBuf> {
        let url = format!("{}/models/{}/repo", MS_API_BASE, model_id);
        let request = self
            .client
            .get(&url)
            .query(&[("FilePath", task.remote_path.as_str()), ("Revision", revision)]);
        stream_to_file(request, &task.dest, progress, &task.remote_path).await?;
        Ok(task.dest)
    }
}

#[async_trait]
impl ModelHub for ModelScope {
    fn name(&self) -> &'static str {
        HUB_MODEL_SCOPE
    }

    async fn load_model(&self, request: &DownloadRequest) -> Result<DownloadResult> {
        info!(
            model_id = %request.model_id,
            filename = ?request.filename,
            revision = ?request.revision,
            "starting model download"
        );
        let revision = request.revision.as_deref().unwrap_or(DEFAULT_REVISION);

        let tasks = if request.filename.is_some() {
            request.plan(std::iter::empty::<String>(), &self.model_root)?
        } else {
            let files = self.list_repo_files(&request.model_id, revision).await?;
            request.plan(files, &self.model_root)?
        };

        let destination = request.destination(&self.model_root);
        tokio::fs::create_dir_all(&destination)
            .await
            .map_err(|e| Error::io(&destination, e))?;

        if tasks.is_empty() {
            warn!(model_id = %request.model_id, "no files matched the given patterns");
        }

        let progress = MultiProgress::new();
        fetch_all(tasks, MAX_WORKERS, |task| {
            self.fetch_file(&request.model_id, revision, task, &progress)
        })
        .await?;

        Ok(finish(&destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_deserializes_and_keeps_only_blobs() {
        let raw = r#"{
            "Code": 200,
            "Data": {
                "Files": [
                    {"Path": "config.json", "Type": "blob", "Size": 128},
                    {"Path": "assets", "Type": "tree"},
                    {"Path": "assets/logo.png", "Type": "blob"}
                ]
            },
            "Success": true
        }"#;
        let listing: MsFileListing = serde_json::from_str(raw).unwrap();
        let files: Vec<_> = listing
            .data
            .files
            .into_iter()
            .filter(|f| f.file_type != "tree")
            .map(|f| f.path)
            .collect();
        assert_eq!(files, vec!["config.json", "assets/logo.png"]);
    }

    #[test]
    fn empty_listing_is_valid() {
        let listing: MsFileListing = serde_json::from_str(r#"{"Code": 200}"#).unwrap();
        assert!(listing.data.files.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn lists_repo_files_at_master() {
        let hub = ModelScope::new("/tmp/models");
        let files = hub
            .list_repo_files("iic/nlp_structbert_sentiment-classification_chinese-tiny", "master")
            .await
            .unwrap();
        assert!(files.iter().any(|f| f.ends_with("config.json")));
    }
}
