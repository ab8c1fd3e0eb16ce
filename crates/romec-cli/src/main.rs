//! romec - compile JavaScript/TypeScript entries
//!
//! ## Commands
//!
//! - `compile`: compile one entry to stdout, directly or as a bundle
//! - `worker`: internal single-file compile worker (stdin/stdout JSON)

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, Level};

use romec_core::{
    cancel_pair, CommandFlags, CompilationDispatcher, CompileCommandError, CompilerConfig,
    Diagnostic, Suppression,
};
use romec_toolchain::{
    serve_worker, FsEntryResolver, GraphBundler, ProcessWorkerClient, StdoutReporter,
};

#[derive(Parser)]
#[command(name = "romec")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile a JavaScript/TypeScript entry", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a single entry and write the result to stdout
    Compile {
        /// Entry to compile (exactly one)
        #[arg(num_args = 0..)]
        args: Vec<String>,

        /// Bundle the entry with its local imports
        #[arg(long)]
        bundle: bool,

        /// Render diagnostics as a JSON document
        #[arg(long)]
        diagnostics_json: bool,

        /// Worker timeout in seconds, 0 to wait forever
        /// (overrides ROMEC_WORKER_TIMEOUT_SECS)
        #[arg(long)]
        worker_timeout_secs: Option<u64>,
    },

    /// Serve one compile request on stdin/stdout
    #[command(hide = true)]
    Worker,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    romec_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Compile {
            args,
            bundle,
            diagnostics_json,
            worker_timeout_secs,
        } => {
            let code = cmd_compile(&args, bundle, diagnostics_json, worker_timeout_secs).await?;
            std::process::exit(code);
        }
        Commands::Worker => cmd_worker().await,
    }
}

async fn cmd_compile(
    args: &[String],
    bundle: bool,
    diagnostics_json: bool,
    worker_timeout_secs: Option<u64>,
) -> Result<i32> {
    let mut config = CompilerConfig::from_env().context("Invalid romec configuration")?;
    if let Some(secs) = worker_timeout_secs {
        config.worker_timeout_secs = secs;
    }

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let exe = std::env::current_exe().context("Failed to locate romec executable")?;
    debug!(cwd = %cwd.display(), worker = %exe.display(), "building dispatcher");

    let dispatcher = CompilationDispatcher::new(
        Arc::new(FsEntryResolver::new()),
        Arc::new(ProcessWorkerClient::from_config(&config, exe)),
        Arc::new(GraphBundler::from_config(&config)),
        Arc::new(StdoutReporter::stdout()),
    )
    .with_cwd(cwd)
    .with_config(&config);

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let flags = if bundle {
        CommandFlags::bundle()
    } else {
        CommandFlags::default()
    };

    match dispatcher.run_with_cancel(args, flags, &signal).await {
        Ok(_) => Ok(0),
        Err(err) => {
            render_error(&err, diagnostics_json)?;
            Ok(1)
        }
    }
}

async fn cmd_worker() -> Result<()> {
    serve_worker(tokio::io::stdin(), tokio::io::stdout())
        .await
        .context("Worker failed to answer request")
}

#[derive(Serialize)]
struct DiagnosticsReport<'a> {
    message: &'a str,
    diagnostics: &'a [Diagnostic],
    suppressions: &'a [Suppression],
}

fn render_error(err: &CompileCommandError, diagnostics_json: bool) -> Result<()> {
    let CompileCommandError::Diagnostics(failure) = err else {
        eprintln!("error[{}]: {}", err.kind(), err);
        return Ok(());
    };

    if diagnostics_json {
        let report = DiagnosticsReport {
            message: &failure.message,
            diagnostics: &failure.diagnostics,
            suppressions: &failure.suppressions,
        };
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for diagnostic in &failure.diagnostics {
        eprintln!("{}", render_diagnostic(diagnostic));
    }
    eprintln!(
        "{}: {} diagnostic(s), {} suppressed",
        failure.message,
        failure.diagnostics.len(),
        failure.suppressions.len()
    );
    Ok(())
}

fn render_diagnostic(diagnostic: &Diagnostic) -> String {
    let location = diagnostic
        .location
        .as_ref()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "<unknown>".to_string());
    format!(
        "{} {} {}: {}",
        location, diagnostic.category, diagnostic.severity, diagnostic.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use romec_core::SourceLocation;

    #[test]
    fn test_compile_args_parse() {
        let cli = Cli::try_parse_from([
            "romec",
            "-v",
            "compile",
            "src/app",
            "--bundle",
            "--worker-timeout-secs",
            "5",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Compile {
                args,
                bundle,
                diagnostics_json,
                worker_timeout_secs,
            } => {
                assert_eq!(args, vec!["src/app".to_string()]);
                assert!(bundle);
                assert!(!diagnostics_json);
                assert_eq!(worker_timeout_secs, Some(5));
            }
            Commands::Worker => panic!("expected compile"),
        }
    }

    #[test]
    fn test_compile_accepts_wrong_arity_for_dispatcher_to_reject() {
        let cli = Cli::try_parse_from(["romec", "compile"]).unwrap();
        assert!(matches!(cli.command, Commands::Compile { ref args, .. } if args.is_empty()));

        let cli = Cli::try_parse_from(["romec", "compile", "a.js", "b.js"]).unwrap();
        assert!(matches!(cli.command, Commands::Compile { ref args, .. } if args.len() == 2));
    }

    #[test]
    fn test_render_diagnostic() {
        let located = Diagnostic::new("lint/noDebugger", "unexpected debugger statement")
            .with_location(SourceLocation::new("src/a.js", 3, 1));
        assert_eq!(
            render_diagnostic(&located),
            "src/a.js:3:1 lint/noDebugger error: unexpected debugger statement"
        );

        let floating = Diagnostic::new("bundler/unresolvedImport", "cannot resolve");
        assert!(render_diagnostic(&floating).starts_with("<unknown> bundler/unresolvedImport"));
    }
}
