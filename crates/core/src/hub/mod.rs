//! Model hub abstraction: one backend per vendor, selected by name.

pub mod huggingface;
pub mod modelscope;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::{DownloadRequest, DownloadResult};

pub use huggingface::Huggingface;
pub use modelscope::ModelScope;

pub const HUB_HUGGING_FACE: &str = "Huggingface";
pub const HUB_MODEL_SCOPE: &str = "ModelScope";

/// Capability contract shared by every hub backend.
#[async_trait]
pub trait ModelHub: Send + Sync {
    /// The registered hub name, matched case-sensitively by the registry.
    fn name(&self) -> &'static str;

    /// Fetch the model's files to the local destination and report the
    /// aggregate size.
    async fn load_model(&self, request: &DownloadRequest) -> Result<DownloadResult>;
}

/// Immutable set of supported hub backends.
///
/// Built once per run and passed explicitly; there is no process-wide
/// registry and no dynamic registration.
pub struct HubRegistry {
    hubs: Vec<Box<dyn ModelHub>>,
}

impl HubRegistry {
    /// Registry with the built-in backends, rooted at `model_root`.
    ///
    /// `hf_token` is the optional Huggingface access token for gated or
    /// private models.
    pub fn new(model_root: impl Into<PathBuf>, hf_token: Option<String>) -> Self {
        let model_root = model_root.into();
        Self {
            hubs: vec![
                Box::new(Huggingface::new(model_root.clone(), hf_token)),
                Box::new(ModelScope::new(model_root)),
            ],
        }
    }

    /// Factory lookup: resolve a hub name to its backend.
    ///
    /// Unknown names fail with an error that echoes the offending name.
    pub fn new_hub(&self, hub_name: &str) -> Result<&dyn ModelHub> {
        self.hubs
            .iter()
            .map(|h| h.as_ref())
            .find(|h| h.name() == hub_name)
            .ok_or_else(|| Error::UnsupportedHub(hub_name.to_string()))
    }

    /// Names of all registered hubs.
    pub fn names(&self) -> Vec<&'static str> {
        self.hubs.iter().map(|h| h.name()).collect()
    }
}

/// Shared per-backend epilogue: walk the destination and log the size.
pub(crate) fn finish(destination: &Path) -> DownloadResult {
    let total_size_bytes = crate::download::folder_total_size(destination);
    let result = DownloadResult {
        destination: destination.to_path_buf(),
        total_size_bytes,
    };
    tracing::info!(
        destination = %destination.display(),
        "total size of downloaded files is {:.2} GiB",
        result.total_size_gib()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_hubs_resolve_to_their_names() {
        let registry = HubRegistry::new("/tmp/models", None);
        for name in [HUB_HUGGING_FACE, HUB_MODEL_SCOPE] {
            let hub = registry.new_hub(name).unwrap();
            assert_eq!(hub.name(), name);
        }
    }

    #[test]
    fn unknown_hub_error_echoes_the_name() {
        let registry = HubRegistry::new("/tmp/models", None);
        let Err(err) = registry.new_hub("Bedrock") else {
            panic!("expected an unsupported-hub error");
        };
        assert!(matches!(err, Error::UnsupportedHub(_)));
        assert!(err.to_string().contains("Bedrock"));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = HubRegistry::new("/tmp/models", None);
        assert!(registry.new_hub("huggingface").is_err());
        assert!(registry.new_hub("HUGGINGFACE").is_err());
    }

    #[test]
    fn names_lists_both_builtins() {
        let registry = HubRegistry::new("/tmp/models", None);
        assert_eq!(registry.names(), vec![HUB_HUGGING_FACE, HUB_MODEL_SCOPE]);
    }
}
