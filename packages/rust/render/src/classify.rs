//! Query classification: which external tool should render a lookup.
//!
//! Rules are tried in priority order; [`ManPageRule`] is the always-last
//! fallback, so every non-empty query produces a [`RenderRequest`].

use quickdoc_index::PackageIndex;
use serde::Serialize;

/// Marker requesting a program's `--help` output (`!h ag` or `ag!h`).
pub const HELP_MARKER: &str = "!h";

/// Text served for an empty query.
pub const USAGE: &str = "Usage:

/net -> renders go/net docs
/net ListenIP -> renders ListenIP docs in net
/net.ListenIP
/net/http -> renders net/http docs

write -> renders man page for write
2 write -> renders man page for write(2)

!h ag -> renders ag --help
ag!h
";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The three rendering strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    StdlibDoc,
    ProgramHelp,
    UnixMan,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StdlibDoc => "stdlib_doc",
            Self::ProgramHelp => "program_help",
            Self::UnixMan => "unix_man",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy together with the argument its renderer receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RenderRequest {
    /// Full original query, including any `.Symbol` suffix.
    StdlibDoc { query: String },
    /// Program name with the help marker removed.
    ProgramHelp { program: String },
    /// Whitespace-separated man arguments (`["2", "write"]`).
    UnixMan { args: Vec<String> },
}

impl RenderRequest {
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::StdlibDoc { .. } => Strategy::StdlibDoc,
            Self::ProgramHelp { .. } => Strategy::ProgramHelp,
            Self::UnixMan { .. } => Strategy::UnixMan,
        }
    }
}

/// What to do with a raw `/doc/` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupPlan {
    /// Empty query: answer with [`USAGE`].
    Usage,
    /// Run an external renderer.
    Render(RenderRequest),
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One classification rule.
pub trait QueryRule: Send + Sync {
    /// Returns a request if this rule claims the query.
    fn classify(&self, index: &PackageIndex, query: &str) -> Option<RenderRequest>;

    /// Rule name for tracing.
    fn name(&self) -> &str;
}

/// Query whose prefix before the first `.` is a known stdlib package.
pub struct StdlibPackageRule;

impl QueryRule for StdlibPackageRule {
    fn classify(&self, index: &PackageIndex, query: &str) -> Option<RenderRequest> {
        let package = query.split_once('.').map_or(query, |(pkg, _)| pkg);
        index.contains(package).then(|| RenderRequest::StdlibDoc {
            query: query.to_string(),
        })
    }

    fn name(&self) -> &str {
        "stdlib_package"
    }
}

/// Query containing [`HELP_MARKER`] anywhere.
pub struct ProgramHelpRule;

impl QueryRule for ProgramHelpRule {
    fn classify(&self, _index: &PackageIndex, query: &str) -> Option<RenderRequest> {
        query.contains(HELP_MARKER).then(|| RenderRequest::ProgramHelp {
            program: query.replacen(HELP_MARKER, "", 1).trim().to_string(),
        })
    }

    fn name(&self) -> &str {
        "program_help"
    }
}

/// Fallback: hand the query tokens to the man page viewer.
pub struct ManPageRule;

impl QueryRule for ManPageRule {
    fn classify(&self, _index: &PackageIndex, query: &str) -> Option<RenderRequest> {
        Some(RenderRequest::UnixMan {
            args: query.split_whitespace().map(str::to_string).collect(),
        })
    }

    fn name(&self) -> &str {
        "man_page"
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Holds the rules in priority order.
pub struct Classifier {
    rules: Vec<Box<dyn QueryRule>>,
}

impl Classifier {
    /// Stdlib package first, then program help, man page last.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(StdlibPackageRule),
                Box::new(ProgramHelpRule),
                Box::new(ManPageRule),
            ],
        }
    }

    /// Classify a non-empty query. Pure: no process is started.
    pub fn classify(&self, index: &PackageIndex, query: &str) -> RenderRequest {
        for rule in &self.rules {
            if let Some(request) = rule.classify(index, query) {
                tracing::debug!(rule = rule.name(), query, "query classified");
                return request;
            }
        }
        // Unreachable: ManPageRule always matches
        unreachable!("ManPageRule must always match");
    }

    /// Plan a lookup, short-circuiting empty queries to the usage text.
    pub fn plan(&self, index: &PackageIndex, query: &str) -> LookupPlan {
        if query.is_empty() {
            return LookupPlan::Usage;
        }
        LookupPlan::Render(self.classify(index, query))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}
