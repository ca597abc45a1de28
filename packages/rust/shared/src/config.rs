//! Application configuration for quickdoc.
//!
//! User config lives at `~/.quickdoc/quickdoc.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QuickdocError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "quickdoc.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".quickdoc";

// ---------------------------------------------------------------------------
// Config structs (matching quickdoc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Stdlib package index settings.
    #[serde(default)]
    pub index: IndexConfig,

    /// External renderer commands.
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (`host:port`).
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

fn default_addr() -> String {
    "localhost:9998".into()
}

/// `[index]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Explicit compiled-stdlib root. When unset it is derived from `go env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pkg_root: Option<String>,

    /// Go toolchain binary used to locate GOROOT.
    #[serde(default = "default_go_cmd")]
    pub go_cmd: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            pkg_root: None,
            go_cmd: default_go_cmd(),
        }
    }
}

fn default_go_cmd() -> String {
    "go".into()
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Stdlib doc command line; the query is appended as the last argument.
    #[serde(default = "default_stdlib_doc")]
    pub stdlib_doc: Vec<String>,

    /// Man page viewer command line; query tokens are appended.
    #[serde(default = "default_man")]
    pub man: Vec<String>,

    /// Flag passed to programs for `!h` lookups.
    #[serde(default = "default_help_flag")]
    pub help_flag: String,

    /// Kill a renderer that runs longer than this. No limit when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            stdlib_doc: default_stdlib_doc(),
            man: default_man(),
            help_flag: default_help_flag(),
            timeout_secs: None,
        }
    }
}

fn default_stdlib_doc() -> Vec<String> {
    vec!["go".into(), "doc".into()]
}
fn default_man() -> Vec<String> {
    vec!["man".into()]
}
fn default_help_flag() -> String {
    "--help".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.quickdoc/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| QuickdocError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.quickdoc/quickdoc.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| QuickdocError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        QuickdocError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| QuickdocError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| QuickdocError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| QuickdocError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

impl AppConfig {
    /// Reject configs that cannot produce a runnable command line.
    pub fn validate(&self) -> Result<()> {
        if self.render.stdlib_doc.is_empty() {
            return Err(QuickdocError::config("render.stdlib_doc must name a program"));
        }
        if self.render.man.is_empty() {
            return Err(QuickdocError::config("render.man must name a program"));
        }
        if self.server.addr.trim().is_empty() {
            return Err(QuickdocError::config("server.addr must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("localhost:9998"));
        assert!(toml_str.contains("help_flag"));
        assert!(!toml_str.contains("pkg_root"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[index]
pkg_root = "/usr/lib/go/pkg/linux_amd64"

[render]
timeout_secs = 30
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(
            config.index.pkg_root.as_deref(),
            Some("/usr/lib/go/pkg/linux_amd64")
        );
        assert_eq!(config.index.go_cmd, "go");
        assert_eq!(config.render.timeout_secs, Some(30));
        assert_eq!(config.render.stdlib_doc, vec!["go", "doc"]);
        assert_eq!(config.server.addr, "localhost:9998");
    }

    #[test]
    fn load_from_file_validates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("quickdoc.toml");
        std::fs::write(&path, "[render]\nman = []\n").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("render.man"));
    }

    #[test]
    fn load_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("quickdoc.toml");
        std::fs::write(&path, "[server\naddr = 1").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().starts_with("config error: failed to parse"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config_from(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, QuickdocError::Io { .. }));
    }
}
