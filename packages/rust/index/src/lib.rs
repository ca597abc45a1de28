//! Go standard-library package index.
//!
//! At startup quickdoc walks the compiled stdlib tree
//! (`$GOROOT/pkg/$GOOS_$GOARCH`) once and records every package import path
//! it finds. The resulting [`PackageIndex`] is immutable and shared by
//! reference with every request handler.

mod goroot;

use std::collections::BTreeSet;
use std::path::{Component, Path};

use quickdoc_shared::{QuickdocError, Result};
use tracing::{debug, info, instrument};
use walkdir::{DirEntry, WalkDir};

pub use goroot::{GoEnv, resolve_stdlib_root};

/// Directory names that are not part of the public package surface.
const SKIPPED_NAMES: [&str; 3] = ["vendor", "cmd", "internal"];

/// Immutable set of known stdlib package paths (`net`, `net/http`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageIndex {
    packages: BTreeSet<String>,
}

impl PackageIndex {
    /// Walk `root` and collect one package path per file found under it.
    ///
    /// Entries named `vendor`, `cmd` or `internal` are skipped together with
    /// everything beneath them. Fails if `root` is missing or unreadable.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn build(root: &Path) -> Result<Self> {
        let mut packages = BTreeSet::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

        for entry in walker {
            let entry = entry.map_err(|e| QuickdocError::index(root, e.to_string()))?;
            if entry.file_type().is_dir() {
                continue;
            }

            if let Some(pkg) = package_path(root, entry.path()) {
                debug!(package = %pkg, "indexed");
                packages.insert(pkg);
            }
        }

        info!(count = packages.len(), "stdlib package index built");
        Ok(Self { packages })
    }

    /// Whether `package` is exactly a known package path.
    pub fn contains(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Package paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PackageIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| SKIPPED_NAMES.contains(&name))
}

/// Convert `root/net/http.a` into `net/http`.
fn package_path(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?.with_extension("");

    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
