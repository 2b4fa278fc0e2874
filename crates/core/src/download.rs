//! Bounded concurrent download orchestration and folder-size accounting.

use std::future::Future;
use std::path::{Path, PathBuf};

use futures_util::{stream, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::DownloadTask;

/// Fixed worker-pool size for per-file fetches.
pub const MAX_WORKERS: usize = 4;

/// Run every task through a bounded pool and wait for all of them.
///
/// `fetch` resolves one task to its local path. Tasks write disjoint
/// destination files, so no coordination happens between them beyond the
/// pool bound. The call returns only after every submitted task has
/// completed; callers rely on that barrier before computing the aggregate
/// size. If any task failed, the whole request fails with the list of
/// failed files, leaving successfully fetched files in place.
pub async fn fetch_all<F, Fut>(tasks: Vec<DownloadTask>, workers: usize, fetch: F) -> Result<Vec<PathBuf>>
where
    F: Fn(DownloadTask) -> Fut,
    Fut: Future<Output = Result<PathBuf>>,
{
    let attempted = tasks.len();

    let outcomes: Vec<(String, Result<PathBuf>)> = stream::iter(tasks)
        .map(|task| {
            let remote = task.remote_path.clone();
            let fut = fetch(task);
            async move { (remote, fut.await) }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    let mut completed = Vec::with_capacity(attempted);
    let mut failed = Vec::new();
    for (remote, outcome) in outcomes {
        match outcome {
            Ok(path) => {
                info!(path = %path.display(), "download completed");
                completed.push(path);
            }
            Err(err) => {
                warn!(file = %remote, error = %err, "download failed");
                failed.push(remote);
            }
        }
    }

    if !failed.is_empty() {
        return Err(Error::Transfer { attempted, failed });
    }
    Ok(completed)
}

/// Stream one HTTP response body to `dest`, reporting progress.
///
/// Creates intermediate directories for nested remote paths and returns
/// the number of bytes written.
pub(crate) async fn stream_to_file(
    request: reqwest::RequestBuilder,
    dest: &Path,
    progress: &MultiProgress,
    label: &str,
) -> Result<u64> {
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(Error::RemoteStatus {
            status: response.status(),
            url: response.url().to_string(),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = progress.add(ProgressBar::new(total_size));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("#>-"),
    );
    pb.set_message(label.to_string());

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io(parent, e))?;
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| Error::io(dest, e))?;
    let mut downloaded: u64 = 0;
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io(dest, e))?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush().await.map_err(|e| Error::io(dest, e))?;

    pb.finish_with_message(format!("Downloaded {}", label));
    Ok(downloaded)
}

/// Sum the sizes of all regular files under `path`.
///
/// The walk runs after the join barrier but must still tolerate files
/// vanishing underneath it (partial writes left by an interrupted run, a
/// concurrent cleanup): unreadable entries are logged and skipped, never
/// fatal, since the download itself already succeeded.
pub fn folder_total_size(path: &Path) -> u64 {
    let mut total: u64 = 0;
    for entry in walkdir::WalkDir::new(path) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry during size walk");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(meta) => total += meta.len(),
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "failed to stat file during size walk");
            }
        }
    }
    total
}
