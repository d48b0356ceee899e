//! ue-bridge CLI: talks to the Unreal Engine UEServer RPC plugin.

mod args;
mod stdio;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use serde_json::json;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufRead, AsyncWrite};
use uebridge_config::{BridgeConfig, CliOverrides};
use uebridge_types::ToolContext;

#[derive(Parser)]
#[command(
    name = "ue-bridge",
    version,
    about = "Bridge to a running Unreal Editor's UEServer RPC plugin",
    after_help = "With no subcommand and piped stdin, reads one JSON request per line:\n  \
                  echo '{\"tool\":\"ue.ping\"}' | ue-bridge"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Request timeout in milliseconds (default: 2000)
    #[arg(long, global = true, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// UE project directory to discover the server for (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Invoke one tool and print its result envelope
    Invoke {
        /// Tool name, e.g. ue.ping
        tool: String,

        /// Tool arguments as key=value pairs
        #[arg(value_name = "KEY=VALUE")]
        args: Vec<String>,
    },
    /// List available tools with their input schemas
    Tools,
}

/// How the process should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Success,
    Failure,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => ExitCode::SUCCESS,
            Exit::Failure => ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = BridgeConfig::load(CliOverrides {
        timeout_ms: cli.timeout,
        project_dir: cli.project,
    })
    .context("Failed to load configuration")?;

    let exit = match cli.command {
        Some(Command::Invoke { tool, args }) => {
            invoke(&config, &tool, &args, &mut io::stdout(), &mut io::stderr()).await?
        }
        Some(Command::Tools) => {
            let definitions = config.tool_registry().definitions();
            println!(
                "{}",
                serde_json::to_string_pretty(&definitions).context("Failed to encode tools")?
            );
            Exit::Success
        }
        None if io::stdin().is_terminal() => {
            Cli::command().print_help()?;
            Exit::Success
        }
        None => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut output = tokio::io::stdout();
            serve_stdio(&config, input, &mut output, &mut io::stderr()).await?
        }
    };
    Ok(exit.into())
}

/// One-shot mode: `ue-bridge invoke <tool> [key=value ...]`.
///
/// A tool that needs the server is not dispatched when discovery fails; the
/// discovery error goes to `err` and the exit is a failure. Every dispatched
/// invocation exits successfully, whatever its envelope says.
async fn invoke(
    config: &BridgeConfig,
    tool: &str,
    pairs: &[String],
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<Exit> {
    let registry = config.tool_registry();
    let ctx = match connect(config).await {
        Ok(ctx) => ctx,
        Err(error) if registry.requires_peer(tool).unwrap_or(false) => {
            report_startup_failure(err, &error)?;
            return Ok(Exit::Failure);
        }
        Err(error) => ToolContext::disconnected(config.cwd.clone(), error),
    };

    let result = registry
        .invoke(Some(tool), args::parse_pairs(pairs), ctx)
        .await;
    writeln!(
        out,
        "{}",
        serde_json::to_string(&result).context("Failed to encode result")?
    )?;
    Ok(Exit::Success)
}

/// Stdio mode: discovery once, then one envelope per input line.
async fn serve_stdio<R, W>(
    config: &BridgeConfig,
    input: R,
    output: &mut W,
    err: &mut impl Write,
) -> Result<Exit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let ctx = match connect(config).await {
        Ok(ctx) => ctx,
        Err(error) => {
            report_startup_failure(err, &error)?;
            return Ok(Exit::Failure);
        }
    };

    let registry = config.tool_registry();
    stdio::run(input, output, &registry, &ctx)
        .await
        .context("stdio loop failed")?;
    Ok(Exit::Success)
}

/// Resolve the server and build the context every tool runs with.
async fn connect(config: &BridgeConfig) -> Result<ToolContext, String> {
    let store = config.discovery_store();
    tracing::debug!(
        "Discovering UE RPC server ({:?} layout) for {}",
        store.layout(),
        store.default_selector().display()
    );
    let record = store.resolve(None).await.map_err(|e| e.to_string())?;
    let connection = config.connection(record.port).map_err(|e| e.to_string())?;
    tracing::debug!("Using UE RPC server at {}", connection.addr());
    Ok(ToolContext::connected(config.cwd.clone(), connection))
}

fn report_startup_failure(err: &mut impl Write, error: &str) -> io::Result<()> {
    writeln!(err, "{}", json!({"ok": false, "error": error}))?;
    err.flush()
}
