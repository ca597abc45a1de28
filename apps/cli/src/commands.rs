//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use quickdoc_index::{PackageIndex, resolve_stdlib_root};
use quickdoc_render::{Classifier, ERROR_MARKER, LookupPlan, RenderCommands, USAGE};
use quickdoc_server::ServerContext;
use quickdoc_shared::{AppConfig, init_config, load_config, load_config_from};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// quickdoc: Go docs, man pages and --help output in one search box.
#[derive(Parser)]
#[command(
    name = "quickdoc",
    version,
    about = "Local documentation lookup server for Go packages, man pages and program help.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.quickdoc/quickdoc.toml.
    #[arg(long, global = true, env = "QUICKDOC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Serve the search page and /doc/ lookups.
    Serve {
        /// Listen address (defaults to localhost:9998).
        #[arg(long)]
        addr: Option<String>,

        /// Compiled stdlib directory to index instead of $GOROOT/pkg/$GOOS_$GOARCH.
        #[arg(long)]
        pkg_root: Option<PathBuf>,

        /// Kill renderers running longer than this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Render a single lookup to stdout.
    Lookup {
        /// Query words, e.g. `net/http.Get`, `2 write`, `ag!h`.
        query: Vec<String>,

        /// Compiled stdlib directory to index.
        #[arg(long)]
        pkg_root: Option<PathBuf>,
    },

    /// Print how a query would be rendered, as JSON, without running anything.
    Classify {
        /// Query words.
        query: Vec<String>,

        /// Compiled stdlib directory to index.
        #[arg(long)]
        pkg_root: Option<PathBuf>,
    },

    /// List the indexed stdlib packages.
    Packages {
        /// Compiled stdlib directory to index.
        #[arg(long)]
        pkg_root: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "quickdoc=info",
        1 => "quickdoc=debug",
        _ => "quickdoc=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Serve {
            addr,
            pkg_root,
            timeout,
        } => {
            let config = with_overrides(config, addr, pkg_root.as_deref(), timeout);
            cmd_serve(&config).await
        }
        Command::Lookup { query, pkg_root } => {
            let config = with_overrides(config, None, pkg_root.as_deref(), None);
            cmd_lookup(&config, &join_query(&query)).await
        }
        Command::Classify { query, pkg_root } => {
            let config = with_overrides(config, None, pkg_root.as_deref(), None);
            cmd_classify(&config, &join_query(&query))
        }
        Command::Packages { pkg_root } => {
            let config = with_overrides(config, None, pkg_root.as_deref(), None);
            cmd_packages(&config)
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Apply CLI flags on top of the loaded config.
fn with_overrides(
    mut config: AppConfig,
    addr: Option<String>,
    pkg_root: Option<&Path>,
    timeout: Option<u64>,
) -> AppConfig {
    if let Some(addr) = addr {
        config.server.addr = addr;
    }
    if let Some(root) = pkg_root {
        config.index.pkg_root = Some(root.to_string_lossy().into_owned());
    }
    if timeout.is_some() {
        config.render.timeout_secs = timeout;
    }
    config
}

/// Shell words back into the single query string `/doc/` would receive.
fn join_query(words: &[String]) -> String {
    words.join(" ")
}

/// Resolve the stdlib root and walk it. Any failure here is fatal.
fn build_index(config: &AppConfig) -> Result<PackageIndex> {
    let root = resolve_stdlib_root(&config.index)?;
    let index = PackageIndex::build(&root)
        .map_err(|e| eyre!("could not list Go stdlib packages: {e}"))?;
    Ok(index)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(config: &AppConfig) -> Result<()> {
    let index = build_index(config)?;
    let commands = RenderCommands::try_from(&config.render)?;

    info!(
        addr = %config.server.addr,
        timeout_secs = ?config.render.timeout_secs,
        "starting quickdoc server"
    );

    let ctx = ServerContext::new(index, commands);
    quickdoc_server::serve(&config.server.addr, ctx, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl-C, shutting down"),
        Err(e) => {
            warn!(error = %e, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

async fn cmd_lookup(config: &AppConfig, query: &str) -> Result<()> {
    let index = build_index(config)?;
    let commands = RenderCommands::try_from(&config.render)?;
    let mut stdout = tokio::io::stdout();

    let request = match Classifier::new().plan(&index, query) {
        LookupPlan::Usage => {
            stdout.write_all(USAGE.as_bytes()).await?;
            stdout.flush().await?;
            return Ok(());
        }
        LookupPlan::Render(request) => request,
    };

    info!(query, strategy = %request.strategy(), "rendering");
    let result = quickdoc_render::render(&request, &commands, &mut stdout).await;

    if let Err(e) = result {
        stdout.write_all(ERROR_MARKER.as_bytes()).await?;
        stdout.flush().await?;
        return Err(eyre!("could not render '{query}': {e}"));
    }

    stdout.flush().await?;
    Ok(())
}

fn cmd_classify(config: &AppConfig, query: &str) -> Result<()> {
    let index = build_index(config)?;

    let value = match Classifier::new().plan(&index, query) {
        LookupPlan::Usage => serde_json::json!({ "strategy": "usage" }),
        LookupPlan::Render(request) => serde_json::to_value(&request)?,
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn cmd_packages(config: &AppConfig) -> Result<()> {
    let index = build_index(config)?;
    for package in index.iter() {
        println!("{package}");
    }
    info!(count = index.len(), "listed packages");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn lookup_words_join_into_one_query() {
        let cli = Cli::try_parse_from(["quickdoc", "lookup", "2", "write"]).unwrap();
        match cli.command {
            Command::Lookup { query, .. } => assert_eq!(join_query(&query), "2 write"),
            _ => panic!("expected lookup"),
        }
    }

    #[test]
    fn flags_override_config() {
        let config = with_overrides(
            AppConfig::default(),
            Some("127.0.0.1:0".into()),
            Some(Path::new("/opt/go/pkg/linux_arm64")),
            Some(15),
        );
        assert_eq!(config.server.addr, "127.0.0.1:0");
        assert_eq!(
            config.index.pkg_root.as_deref(),
            Some("/opt/go/pkg/linux_arm64")
        );
        assert_eq!(config.render.timeout_secs, Some(15));
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut base = AppConfig::default();
        base.render.timeout_secs = Some(30);
        let config = with_overrides(base, None, None, None);
        assert_eq!(config.server.addr, "localhost:9998");
        assert_eq!(config.render.timeout_secs, Some(30));
        assert!(config.index.pkg_root.is_none());
    }

    #[test]
    fn missing_stdlib_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = with_overrides(
            AppConfig::default(),
            None,
            Some(dir.path().join("missing").as_path()),
            None,
        );
        let err = build_index(&config).unwrap_err();
        assert!(err.to_string().contains("could not list Go stdlib packages"));
    }
}
