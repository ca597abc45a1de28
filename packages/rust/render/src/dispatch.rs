//! Renderer dispatch: run the external tool for a [`RenderRequest`] and
//! stream its combined stdout/stderr into a sink as it arrives.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use quickdoc_shared::{QuickdocError, RenderConfig, RenderError};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, instrument, warn};

use crate::classify::RenderRequest;

/// Read size for child output pipes.
const CHUNK_SIZE: usize = 8 * 1024;

/// Marker appended to the output of a failed render.
pub const ERROR_MARKER: &str = "\n\nERROR\n";

// ---------------------------------------------------------------------------
// Command lines
// ---------------------------------------------------------------------------

/// A program plus its leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    fn from_words(words: &[String], key: &str) -> quickdoc_shared::Result<Self> {
        let (program, args) = words
            .split_first()
            .ok_or_else(|| QuickdocError::config(format!("render.{key} must name a program")))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn with_args<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut line = self.clone();
        line.args.extend(extra.into_iter().map(Into::into));
        line
    }
}

/// Runtime renderer configuration, resolved from `[render]`.
#[derive(Debug, Clone)]
pub struct RenderCommands {
    /// Stdlib doc tool; the query is appended.
    pub stdlib_doc: CommandLine,
    /// Man page viewer; query tokens are appended.
    pub man: CommandLine,
    /// Flag passed to programs for help lookups.
    pub help_flag: String,
    /// Kill renderers that run longer than this.
    pub timeout: Option<Duration>,
}

impl Default for RenderCommands {
    fn default() -> Self {
        Self {
            stdlib_doc: CommandLine::new("go").with_args(["doc"]),
            man: CommandLine::new("man"),
            help_flag: "--help".into(),
            timeout: None,
        }
    }
}

impl TryFrom<&RenderConfig> for RenderCommands {
    type Error = QuickdocError;

    fn try_from(config: &RenderConfig) -> quickdoc_shared::Result<Self> {
        Ok(Self {
            stdlib_doc: CommandLine::from_words(&config.stdlib_doc, "stdlib_doc")?,
            man: CommandLine::from_words(&config.man, "man")?,
            help_flag: config.help_flag.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        })
    }
}

impl RenderCommands {
    /// The full command line that renders `request`.
    pub fn invocation(&self, request: &RenderRequest) -> CommandLine {
        match request {
            RenderRequest::StdlibDoc { query } => self.stdlib_doc.with_args([query.as_str()]),
            RenderRequest::ProgramHelp { program } => {
                CommandLine::new(program.as_str()).with_args([self.help_flag.as_str()])
            }
            RenderRequest::UnixMan { args } => self.man.with_args(args.iter().map(String::as_str)),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Render `request` into `sink`.
///
/// Output is written as it is produced, so on failure `sink` already holds
/// whatever the tool printed. Appending [`ERROR_MARKER`] is left to the caller.
#[instrument(skip_all, fields(strategy = %request.strategy()))]
pub async fn render<W>(
    request: &RenderRequest,
    commands: &RenderCommands,
    sink: &mut W,
) -> Result<(), RenderError>
where
    W: AsyncWrite + Unpin,
{
    let invocation = commands.invocation(request);
    run_to_sink(&invocation, commands.timeout, sink).await
}

/// Byte counts of what a child wrote before exiting.
#[derive(Debug, Default)]
struct Pumped {
    stdout_bytes: usize,
    stderr_bytes: usize,
}

/// Spawn `invocation`, copy its stdout and stderr into `sink`, await exit.
#[instrument(skip_all, fields(program = %invocation.program))]
pub async fn run_to_sink<W>(
    invocation: &CommandLine,
    timeout: Option<Duration>,
    sink: &mut W,
) -> Result<(), RenderError>
where
    W: AsyncWrite + Unpin,
{
    let program = invocation.program.as_str();
    debug!(args = ?invocation.args, "spawning renderer");

    let mut child = Command::new(program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RenderError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let pumped = match timeout {
        Some(limit) => {
            let result = tokio::time::timeout(limit, pump(&mut child, program, sink)).await;
            match result {
                Ok(pumped) => pumped?,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "failed to kill timed out renderer");
                    }
                    return Err(RenderError::Timeout {
                        program: program.to_string(),
                        timeout: limit,
                    });
                }
            }
        }
        None => pump(&mut child, program, sink).await?,
    };

    debug!(
        stdout_bytes = pumped.stdout_bytes,
        stderr_bytes = pumped.stderr_bytes,
        "renderer finished"
    );

    if pumped.stdout_bytes == 0 && pumped.stderr_bytes > 0 {
        return Err(RenderError::StderrOnly {
            program: program.to_string(),
        });
    }
    Ok(())
}

/// Interleave both output pipes into `sink` until EOF, then reap the child.
async fn pump<W>(child: &mut Child, program: &str, sink: &mut W) -> Result<Pumped, RenderError>
where
    W: AsyncWrite + Unpin,
{
    let stream_err = |source: io::Error| RenderError::Stream {
        program: program.to_string(),
        source,
    };

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| stream_err(io::Error::other("stdout was not captured")))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| stream_err(io::Error::other("stderr was not captured")))?;

    let mut out_buf = vec![0u8; CHUNK_SIZE];
    let mut err_buf = vec![0u8; CHUNK_SIZE];
    let (mut out_open, mut err_open) = (true, true);
    let mut pumped = Pumped::default();

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => {
                let n = read.map_err(stream_err)?;
                if n == 0 {
                    out_open = false;
                } else {
                    forward(sink, &out_buf[..n]).await.map_err(stream_err)?;
                    pumped.stdout_bytes += n;
                }
            }
            read = stderr.read(&mut err_buf), if err_open => {
                let n = read.map_err(stream_err)?;
                if n == 0 {
                    err_open = false;
                } else {
                    forward(sink, &err_buf[..n]).await.map_err(stream_err)?;
                    pumped.stderr_bytes += n;
                }
            }
        }
    }

    let status = child.wait().await.map_err(stream_err)?;
    if !status.success() {
        return Err(RenderError::ExitStatus {
            program: program.to_string(),
            code: status.code(),
        });
    }
    Ok(pumped)
}

async fn forward<W>(sink: &mut W, chunk: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(chunk).await?;
    sink.flush().await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandLine {
        CommandLine::new("sh").with_args(["-c", script, "sh"])
    }

    fn commands() -> RenderCommands {
        RenderCommands {
            stdlib_doc: CommandLine::new("echo").with_args(["doc"]),
            man: CommandLine::new("echo").with_args(["man"]),
            help_flag: "help-requested".into(),
            timeout: None,
        }
    }

    #[test]
    fn default_commands_match_go_toolchain() {
        let commands = RenderCommands::default();
        let line = commands.invocation(&RenderRequest::StdlibDoc {
            query: "net/http.Get".into(),
        });
        assert_eq!(line.program, "go");
        assert_eq!(line.args, vec!["doc", "net/http.Get"]);

        let line = commands.invocation(&RenderRequest::ProgramHelp {
            program: "ag".into(),
        });
        assert_eq!(line, CommandLine::new("ag").with_args(["--help"]));

        let line = commands.invocation(&RenderRequest::UnixMan {
            args: vec!["2".into(), "write".into()],
        });
        assert_eq!(line, CommandLine::new("man").with_args(["2", "write"]));
    }

    #[test]
    fn commands_from_config() {
        let config = RenderConfig {
            stdlib_doc: vec!["go1.22".into(), "doc".into(), "-all".into()],
            man: vec!["man".into()],
            help_flag: "-h".into(),
            timeout_secs: Some(10),
        };
        let commands = RenderCommands::try_from(&config).unwrap();
        assert_eq!(commands.stdlib_doc.program, "go1.22");
        assert_eq!(commands.stdlib_doc.args, vec!["doc", "-all"]);
        assert_eq!(commands.timeout, Some(Duration::from_secs(10)));

        let bad = RenderConfig {
            stdlib_doc: vec![],
            ..config
        };
        assert!(RenderCommands::try_from(&bad).is_err());
    }

    #[tokio::test]
    async fn renders_each_strategy() {
        let commands = commands();

        let mut sink = Vec::new();
        render(
            &RenderRequest::StdlibDoc {
                query: "net/http.Get".into(),
            },
            &commands,
            &mut sink,
        )
        .await
        .unwrap();
        assert_eq!(sink, b"doc net/http.Get\n");

        let mut sink = Vec::new();
        render(
            &RenderRequest::UnixMan {
                args: vec!["2".into(), "write".into()],
            },
            &commands,
            &mut sink,
        )
        .await
        .unwrap();
        assert_eq!(sink, b"man 2 write\n");

        let mut sink = Vec::new();
        render(
            &RenderRequest::ProgramHelp {
                program: "echo".into(),
            },
            &commands,
            &mut sink,
        )
        .await
        .unwrap();
        assert_eq!(sink, b"help-requested\n");
    }

    #[tokio::test]
    async fn combines_stdout_and_stderr() {
        let mut sink = Vec::new();
        run_to_sink(&sh("printf out; printf err >&2"), None, &mut sink)
            .await
            .unwrap();

        let text = String::from_utf8(sink).unwrap();
        assert_eq!(text.len(), 6);
        assert!(text.contains("out"));
        assert!(text.contains("err"));
    }

    #[tokio::test]
    async fn nonzero_exit_keeps_partial_output() {
        let mut sink = Vec::new();
        let err = run_to_sink(&sh("printf partial; exit 3"), None, &mut sink)
            .await
            .unwrap_err();

        assert_eq!(sink, b"partial");
        assert!(matches!(
            err,
            RenderError::ExitStatus { code: Some(3), .. }
        ));
    }

    #[tokio::test]
    async fn stderr_only_output_is_a_failure() {
        let mut sink = Vec::new();
        let err = run_to_sink(&sh("echo 'no docs' >&2"), None, &mut sink)
            .await
            .unwrap_err();

        assert_eq!(sink, b"no docs\n");
        assert!(matches!(err, RenderError::StderrOnly { .. }));
    }

    #[tokio::test]
    async fn silent_success_is_ok() {
        let mut sink = Vec::new();
        run_to_sink(&sh("exit 0"), None, &mut sink).await.unwrap();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let mut sink = Vec::new();
        let err = run_to_sink(
            &CommandLine::new("quickdoc-test-no-such-program"),
            None,
            &mut sink,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RenderError::Spawn { .. }));
        assert_eq!(err.program(), "quickdoc-test-no-such-program");
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn timeout_kills_the_renderer() {
        let mut sink = Vec::new();
        let err = run_to_sink(
            &sh("printf started; exec sleep 10"),
            Some(Duration::from_millis(500)),
            &mut sink,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RenderError::Timeout { .. }));
        assert_eq!(sink, b"started");
    }
}
