use std::path::PathBuf;

use async_trait::async_trait;
use indicatif::MultiProgress;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::download::{fetch_all, stream_to_file, MAX_WORKERS};
use crate::error::{Error, Result};
use crate::hub::{finish, ModelHub, HUB_HUGGING_FACE};
use crate::model::{DownloadRequest, DownloadResult, DownloadTask};

const HF_API_BASE: &str = "https://huggingface.co/api";
const HF_CDN_BASE: &str = "https://huggingface.co";
const DEFAULT_REVISION: &str = "main";

/// Huggingface hub backend, talking to the public hub API directly.
pub struct Huggingface {
    client: Client,
    model_root: PathBuf,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HfModelInfo {
    #[serde(default)]
    pub siblings: Vec<HfSibling>,
}

#[derive(Debug, Deserialize)]
pub struct HfSibling {
    pub rfilename: String,
}

impl Huggingface {
    pub fn new(model_root: impl Into<PathBuf>, token: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("modelfetch/0.1.0")
                .build()
                .expect("Failed to create HTTP client"),
            model_root: model_root.into(),
            token,
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.get(url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Enumerate all files belonging to the model at the given revision.
    pub async fn list_repo_files(&self, model_id: &str, revision: &str) -> Result<Vec<String>> {
        let url = format!("{}/models/{}/revision/{}", HF_API_BASE, model_id, revision);
        let response = self.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::RemoteStatus {
                status: response.status(),
                url,
            });
        }

        let info: HfModelInfo = response.json().await.map_err(|e| Error::HubResponse {
            model_id: model_id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }

    async fn fetch_file(
        &self,
        model_id: &str,
        revision: &str,
        task: DownloadTask,
        progress: &MultiProgress,
    ) -> Result<PathBuf> {
        let url = format!(
            "{}/{}/resolve/{}/{}",
            HF_CDN_BASE, model_id, revision, task.remote_path
        );
        stream_to_file(self.get(&url), &task.dest, progress, &task.remote_path).await?;
        Ok(task.dest)
    }
}

#[async_trait]
impl ModelHub for Huggingface {
    fn name(&self) -> &'static str {
        HUB_HUGGING_FACE
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
            // Single-file mode fetches exactly that file; no listing needed.
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
    fn model_info_deserializes_siblings() {
        let raw = r#"{
            "id": "acme/tiny",
            "downloads": 12,
            "siblings": [
                {"rfilename": "config.json", "size": 512},
                {"rfilename": "onnx/model.onnx"}
            ]
        }"#;
        let info: HfModelInfo = serde_json::from_str(raw).unwrap();
        let files: Vec<_> = info.siblings.iter().map(|s| s.rfilename.as_str()).collect();
        assert_eq!(files, vec!["config.json", "onnx/model.onnx"]);
    }

    #[test]
    fn model_info_tolerates_missing_siblings() {
        let info: HfModelInfo = serde_json::from_str(r#"{"id": "acme/tiny"}"#).unwrap();
        assert!(info.siblings.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn downloads_a_single_file_into_the_flat_root() {
        let dir = tempfile::tempdir().unwrap();
        let hub = Huggingface::new(dir.path(), None);

        let mut request = DownloadRequest::new("sentence-transformers/all-MiniLM-L6-v2");
        request.filename = Some("config.json".to_string());

        let result = hub.load_model(&request).await.unwrap();
        assert_eq!(result.destination, dir.path());
        assert!(dir.path().join("config.json").exists());
        assert!(result.total_size_bytes > 0);
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn lists_repo_files_at_main() {
        let hub = Huggingface::new("/tmp/models", None);
        let files = hub
            .list_repo_files("sentence-transformers/all-MiniLM-L6-v2", "main")
            .await
            .unwrap();
        assert!(files.iter().any(|f| f == "config.json"));
    }
}
