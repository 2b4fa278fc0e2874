//! Object-storage download path.
//!
//! Orthogonal to the hub abstraction: the bucket client does the transfer
//! work, this module only classifies the source path (single key vs.
//! directory), mirrors the hub destination naming, and reports the size.

use std::path::Path;

use futures_util::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as StorePath;
use object_store::ObjectStore;
use tracing::info;

use crate::error::{Error, Result};
use crate::hub::finish;
use crate::model::DownloadResult;

pub const PROVIDER_OSS: &str = "OSS";
pub const PROVIDER_S3: &str = "S3";

/// Validated object-store source settings.
#[derive(Debug, Clone)]
pub struct ObjStoreSpec {
    pub provider: String,
    pub endpoint: String,
    pub bucket: String,
    /// Key or key prefix inside the bucket.
    pub src: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// A source path names a single file when its last segment carries an
/// extension (e.g. a GGUF model); everything else is a directory prefix.
pub fn is_single_file(src: &str) -> bool {
    last_segment(src).contains('.')
}

/// Destination directory name for a directory download, mirroring the hub
/// layout: `models--<last path segment>`.
pub fn dir_dest_name(src: &str) -> String {
    format!("models--{}", last_segment(src))
}

fn last_segment(src: &str) -> &str {
    src.trim_matches('/').rsplit('/').next().unwrap_or(src)
}

fn build_client(spec: &ObjStoreSpec) -> Result<AmazonS3> {
    match spec.provider.as_str() {
        // OSS endpoints speak the S3 wire protocol.
        PROVIDER_OSS | PROVIDER_S3 => {
            let mut builder = AmazonS3Builder::new()
                .with_bucket_name(&spec.bucket)
                .with_endpoint(&spec.endpoint)
                .with_region("us-east-1")
                .with_allow_http(true);
            match (&spec.access_key_id, &spec.secret_access_key) {
                (Some(id), Some(secret)) => {
                    builder = builder.with_access_key_id(id).with_secret_access_key(secret);
                }
                // Anonymous access for public buckets.
                _ => builder = builder.with_skip_signature(true),
            }
            Ok(builder.build()?)
        }
        other => Err(Error::Config(format!(
            "unknown object store provider: {}",
            other
        ))),
    }
}

/// Download a single key or a whole prefix from the bucket.
pub async fn model_download(spec: &ObjStoreSpec, model_root: &Path) -> Result<DownloadResult> {
    info!(
        provider = %spec.provider,
        bucket = %spec.bucket,
        src = %spec.src,
        "starting object store download"
    );
    let client = build_client(spec)?;
    let src = spec.src.trim_matches('/');

    if is_single_file(src) {
        let dest = model_root.join(last_segment(src));
        fetch_object(&client, &StorePath::from(src), &dest).await?;
        return Ok(finish(model_root));
    }

    let dest_dir = model_root.join(dir_dest_name(src));
    let prefix = StorePath::from(src);
    let mut listing = client.list(Some(&prefix));
    while let Some(meta) = listing.next().await {
        let meta = meta?;
        let location: &str = meta.location.as_ref();
        let relative = location
            .strip_prefix(src)
            .map(|r| r.trim_start_matches('/'))
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| last_segment(location));
        let dest = dest_dir.join(relative);
        fetch_object(&client, &meta.location, &dest).await?;
    }

    Ok(finish(&dest_dir))
}

async fn fetch_object(client: &AmazonS3, location: &StorePath, dest: &Path) -> Result<()> {
    let payload = client.get(location).await?.bytes().await?;
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io(parent, e))?;
    }
    tokio::fs::write(dest, &payload)
        .await
        .map_err(|e| Error::io(dest, e))?;
    info!(path = %dest.display(), "download completed");
    Ok(())
}
