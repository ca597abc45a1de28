//! Locating the compiled stdlib tree of the installed Go toolchain.

use std::path::PathBuf;
use std::process::Command;

use quickdoc_shared::{IndexConfig, QuickdocError, Result};
use tracing::info;

/// The subset of `go env` needed to find the compiled stdlib.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoEnv {
    pub goroot: PathBuf,
    pub goos: String,
    pub goarch: String,
}

impl GoEnv {
    /// Run `<go_cmd> env GOROOT GOOS GOARCH`.
    pub fn query(go_cmd: &str) -> Result<Self> {
        let output = Command::new(go_cmd)
            .args(["env", "GOROOT", "GOOS", "GOARCH"])
            .output()
            .map_err(|e| {
                QuickdocError::Toolchain(format!("failed to run `{go_cmd} env`: {e}"))
            })?;

        if !output.status.success() {
            return Err(QuickdocError::Toolchain(format!(
                "`{go_cmd} env` exited with status {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Self::parse(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parse the three-line output of `go env GOROOT GOOS GOARCH`.
    pub fn parse(stdout: &str) -> Result<Self> {
        let mut lines = stdout.lines().map(str::trim);
        let mut next = |name: &str| {
            lines
                .next()
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| QuickdocError::Toolchain(format!("`go env` did not report {name}")))
        };

        let goroot = next("GOROOT")?;
        let goos = next("GOOS")?;
        let goarch = next("GOARCH")?;

        Ok(Self {
            goroot: PathBuf::from(goroot),
            goos,
            goarch,
        })
    }

    /// `$GOROOT/pkg/$GOOS_$GOARCH`.
    pub fn stdlib_root(&self) -> PathBuf {
        self.goroot
            .join("pkg")
            .join(format!("{}_{}", self.goos, self.goarch))
    }
}

/// Pick the directory to index: the configured override, else the toolchain's.
pub fn resolve_stdlib_root(config: &IndexConfig) -> Result<PathBuf> {
    if let Some(root) = &config.pkg_root {
        info!(root, "using configured stdlib root");
        return Ok(PathBuf::from(root));
    }

    let env = GoEnv::query(&config.go_cmd)?;
    let root = env.stdlib_root();
    info!(root = %root.display(), goos = %env.goos, goarch = %env.goarch, "resolved stdlib root from go env");
    Ok(root)
}
