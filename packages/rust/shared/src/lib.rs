//! Shared types, error model, and configuration for autopress.
//!
//! This crate is the foundation depended on by all other autopress crates.
//! It provides:
//! - [`AutopressError`] — the unified error type
//! - Domain types ([`InputRow`], [`TermKind`], [`TermId`], [`PublishDocument`])
//! - Configuration ([`AppConfig`], per-component settings, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CmsSettings, GeneratorSettings, OpenAiConfig, PipelineConfig, PublishSettings,
    WordPressConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    locate_config, validate_config,
};
pub use error::{AutopressError, ErrorOrigin, Result};
pub use types::{
    GeneratedArticle, InputRow, PostStatus, PublishDocument, RemoteTerm, RunId, TermId, TermKind,
};
