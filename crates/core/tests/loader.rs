//! End-to-end loader behavior against a fake hub backend: pattern
//! filtering, destination naming, the join-all barrier, and the
//! walk-computed aggregate size.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use modelfetch_core::download::{fetch_all, folder_total_size, MAX_WORKERS};
use modelfetch_core::{DownloadRequest, DownloadResult, ModelHub, Result};

/// A hub that "downloads" by writing zero-filled files of known sizes,
/// with staggered delays so completions land out of order.
struct FakeHub {
    model_root: PathBuf,
    files: Vec<(String, usize)>,
    completed: Arc<AtomicUsize>,
}

impl FakeHub {
    fn new(model_root: PathBuf, files: &[(&str, usize)]) -> Self {
        Self {
            model_root,
            files: files
                .iter()
                .map(|(name, size)| (name.to_string(), *size))
                .collect(),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn size_of(&self, remote_path: &str) -> usize {
        self.files
            .iter()
            .find(|(name, _)| name == remote_path)
            .map(|(_, size)| *size)
            .unwrap_or(0)
    }
}

#[async_trait]
impl ModelHub for FakeHub {
    fn name(&self) -> &'static str {
        "Fake"
    }

    async fn load_model(&self, request: &DownloadRequest) -> Result<DownloadResult> {
        let listing: Vec<String> = self.files.iter().map(|(name, _)| name.clone()).collect();
        let tasks = request.plan(listing, &self.model_root)?;
        let destination = request.destination(&self.model_root);
        tokio::fs::create_dir_all(&destination).await.unwrap();

        fetch_all(tasks, MAX_WORKERS, |task| {
            let size = self.size_of(&task.remote_path);
            let completed = self.completed.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(5 + (size % 17) as u64)).await;
                tokio::fs::write(&task.dest, vec![0u8; size]).await.unwrap();
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(task.dest)
            }
        })
        .await?;

        // Size is read back from disk, after the join barrier.
        Ok(DownloadResult {
            total_size_bytes: folder_total_size(&destination),
            destination,
        })
    }
}

#[tokio::test]
async fn ignore_patterns_exclude_files_and_destination_is_per_model() {
    let dir = tempfile::tempdir().unwrap();
    let hub = FakeHub::new(
        dir.path().to_path_buf(),
        &[
            ("config.json", 100),
            ("weights.bin", 5000),
            ("tokenizer.json", 200),
        ],
    );

    let mut request = DownloadRequest::new("acme/tiny");
    request.ignore_patterns = vec!["*.bin".to_string()];

    let result = hub.load_model(&request).await.unwrap();

    let dest = dir.path().join("models--acme--tiny");
    assert_eq!(result.destination, dest);
    assert!(dest.join("config.json").exists());
    assert!(dest.join("tokenizer.json").exists());
    assert!(!dest.join("weights.bin").exists());

    // Exactly the two allowed files were fetched.
    assert_eq!(hub.completed.load(Ordering::SeqCst), 2);
    assert_eq!(result.total_size_bytes, 300);
}

#[tokio::test]
async fn aggregate_size_is_computed_only_after_every_task_completed() {
    let dir = tempfile::tempdir().unwrap();
    let files: Vec<(String, usize)> = (0..16).map(|i| (format!("shard-{i}.bin"), 64 * (i + 1))).collect();
    let refs: Vec<(&str, usize)> = files.iter().map(|(n, s)| (n.as_str(), *s)).collect();
    let hub = FakeHub::new(dir.path().to_path_buf(), &refs);

    let request = DownloadRequest::new("acme/sharded");
    let result = hub.load_model(&request).await.unwrap();

    let expected: usize = files.iter().map(|(_, s)| s).sum();
    assert_eq!(hub.completed.load(Ordering::SeqCst), files.len());
    assert_eq!(result.total_size_bytes, expected as u64);
}

#[tokio::test]
async fn filename_mode_writes_into_the_flat_root() {
    let dir = tempfile::tempdir().unwrap();
    let hub = FakeHub::new(dir.path().to_path_buf(), &[("model.gguf", 1024)]);

    let mut request = DownloadRequest::new("acme/tiny-gguf");
    request.filename = Some("model.gguf".to_string());

    let result = hub.load_model(&request).await.unwrap();

    assert_eq!(result.destination, dir.path());
    assert!(dir.path().join("model.gguf").exists());
    assert!(!dir.path().join("models--acme--tiny-gguf").exists());
    assert_eq!(result.total_size_bytes, 1024);
}
