use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use modelfetch_core::config::hf_token_from_env;
use modelfetch_core::{objstore, HubRegistry, Settings, Source, DEFAULT_MODEL_ROOT};

/// Every flag also binds to the environment variable the loader's
/// controller injects, so the binary works unchanged as an init container.
#[derive(Parser)]
#[command(name = "modelfetch")]
#[command(author, version, about = "Download model artifacts from a model hub or object store", long_about = None)]
struct Cli {
    /// Source mode: "modelhub" or "objstore"
    #[arg(long, env = "MODEL_SOURCE_TYPE")]
    source: String,

    /// Hub to download from (e.g. "Huggingface", "ModelScope")
    #[arg(long, env = "MODEL_HUB_NAME", default_value = "Huggingface")]
    hub: String,

    /// Model identifier (e.g. "facebook/opt-125m")
    #[arg(long, env = "MODEL_ID")]
    model_id: Option<String>,

    /// Version/branch/tag pin (defaults to the hub's main revision)
    #[arg(long, env = "REVISION")]
    revision: Option<String>,

    /// Single file to download instead of the whole model
    #[arg(long, env = "MODEL_FILENAME")]
    filename: Option<String>,

    /// Comma-separated globs a file must match to be fetched
    #[arg(long, env = "MODEL_ALLOW_PATTERNS")]
    allow_patterns: Option<String>,

    /// Comma-separated globs that exclude files
    #[arg(long, env = "MODEL_IGNORE_PATTERNS")]
    ignore_patterns: Option<String>,

    /// Object store provider ("OSS" or "S3")
    #[arg(long, env = "PROVIDER")]
    provider: Option<String>,

    /// Object store endpoint URL
    #[arg(long, env = "ENDPOINT")]
    endpoint: Option<String>,

    /// Object store bucket name
    #[arg(long, env = "BUCKET")]
    bucket: Option<String>,

    /// Key or key prefix inside the bucket
    #[arg(long, env = "MODEL_PATH")]
    model_path: Option<String>,

    #[arg(long, env = "OSS_ACCESS_KEY_ID", hide_env_values = true)]
    access_key_id: Option<String>,

    #[arg(long, env = "OSS_ACCESS_KEY_SECRET", hide_env_values = true)]
    secret_access_key: Option<String>,

    /// Destination root directory for downloaded models
    #[arg(long, env = "MODEL_ROOT", default_value = DEFAULT_MODEL_ROOT)]
    model_root: PathBuf,
}

impl Cli {
    fn into_settings(self) -> Settings {
        Settings {
            source_type: self.source,
            hub_name: self.hub,
            model_id: self.model_id,
            revision: self.revision,
            filename: self.filename,
            allow_patterns: self.allow_patterns,
            ignore_patterns: self.ignore_patterns,
            provider: self.provider,
            endpoint: self.endpoint,
            bucket: self.bucket,
            model_path: self.model_path,
            access_key_id: self.access_key_id,
            secret_access_key: self.secret_access_key,
            model_root: self.model_root,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let settings = Cli::parse().into_settings();
    let source = settings.source()?;
    let start = Instant::now();

    let result = match source {
        Source::ModelHub { hub_name, request } => {
            let registry = HubRegistry::new(settings.model_root.clone(), hf_token_from_env());
            let hub = registry.new_hub(&hub_name)?;
            hub.load_model(&request).await?
        }
        Source::ObjStore(spec) => objstore::model_download(&spec, &settings.model_root).await?,
    };

    tracing::info!(
        source = %settings.source_type,
        "loading models took {:.1}s",
        start.elapsed().as_secs_f64()
    );

    println!("\nModel downloaded successfully!");
    println!("  Path: {:?}", result.destination);
    println!("  Size: {:.2} GB", result.total_size_gib());

    Ok(())
}
