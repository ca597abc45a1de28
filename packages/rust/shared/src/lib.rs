//! Shared error model and configuration for quickdoc.
//!
//! This crate is the foundation depended on by all other quickdoc crates.
//! It provides:
//! - [`QuickdocError`] and [`RenderError`], the unified error types
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, IndexConfig, RenderConfig, ServerConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{QuickdocError, RenderError, Result};
