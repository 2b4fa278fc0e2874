//! modelfetch_core - Core library for fetching model artifacts
//!
//! This crate provides:
//! - Model hub backends (Huggingface, ModelScope) and the hub registry
//! - Bounded concurrent download orchestration and size accounting
//! - Object-storage download path for bucket-hosted models
//! - Run configuration resolution

pub mod config;
pub mod download;
pub mod error;
pub mod hub;
pub mod model;
pub mod objstore;

pub use config::{Settings, Source, DEFAULT_MODEL_ROOT};
pub use error::{Error, Result};
pub use hub::{HubRegistry, ModelHub};
pub use model::{DownloadRequest, DownloadResult, DownloadTask};
pub use objstore::ObjStoreSpec;
