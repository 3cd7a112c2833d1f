//! apkolock - lock apko image package lists across architectures
//!
//! This is the CLI application; every operation is implemented in the ops
//! crate and this binary only wires configuration, events and output.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use apkolock_config::{Config, ImageRequest};
use apkolock_events::EventReceiver;
use apkolock_ops::{OperationResult, OpsContextBuilder, OpsCtx};
use apkolock_resolver::RecordedResolver;
use apkolock_types::{ColorChoice, ImageConfiguration, LockSource, StreamPlan};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::Path;
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!(command = cli.command.name(), "Starting apkolock v{}", env!("CARGO_PKG_VERSION"));

    // File config (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);

    let resolver = match &cli.command {
        Commands::Lock { resolutions, .. } => RecordedResolver::from_file(resolutions).await?,
        Commands::Tags { .. } | Commands::Streams { .. } | Commands::Version => {
            RecordedResolver::default()
        }
    };

    let (event_sender, event_receiver) = apkolock_events::channel();
    let ops_ctx = OpsContextBuilder::new()
        .with_resolver(Arc::new(resolver))
        .with_event_sender(event_sender)
        .with_config(config.clone())
        .build()?;

    let color = cli.global.color.unwrap_or(config.general.color);
    let renderer = OutputRenderer::new(cli.global.json, color);
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.json);

    let result =
        execute_command_with_events(cli.command, ops_ctx, event_receiver, &mut event_handler)
            .await?;

    renderer.render_result(&result)?;

    if let OperationResult::LockReport(report) = &result {
        report.ensure_locked()?;
    }

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ops_ctx: OpsCtx,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ops_ctx));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: OpsCtx) -> Result<OperationResult, CliError> {
    match command {
        Commands::Lock {
            config,
            extra_packages,
            annotations,
            ..
        } => {
            let ic = read_image_config(&config).await?;
            let request = ImageRequest {
                extra_packages,
                default_annotations: parse_annotations(&annotations)?,
            };
            let report = apkolock_ops::lock(&ctx, ic, &request).await?;
            Ok(OperationResult::LockReport(report))
        }

        Commands::Tags { config, package } => {
            let ic = read_image_config(&config).await?;
            let tags = apkolock_ops::version_tags(&ctx, &ic, &package)?;
            Ok(OperationResult::Tags(tags))
        }

        Commands::Streams { plan, source, .. } => {
            let contents = read_file(&plan).await?;
            let plan = StreamPlan::from_yaml(&contents)?;
            let report = match source {
                Some(source) => {
                    let locks = LockSource::from_json(&read_file(&source).await?)?;
                    apkolock_ops::resolve_streams_from_source(&ctx, &plan.versions, &locks)?
                }
                None => apkolock_ops::resolve_streams(&ctx, &plan).await?,
            };
            Ok(OperationResult::Streams(report))
        }

        Commands::Version => Ok(OperationResult::Success(format!(
            "apkolock {}",
            env!("CARGO_PKG_VERSION")
        ))),
    }
}

async fn read_file(path: &Path) -> Result<String, CliError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| apkolock_errors::Error::io_with_path(&e, path))?;
    Ok(contents)
}

async fn read_image_config(path: &Path) -> Result<ImageConfiguration, CliError> {
    let contents = read_file(path).await?;
    Ok(ImageConfiguration::from_yaml(&contents)?)
}

fn parse_annotations(raw: &[String]) -> Result<BTreeMap<String, String>, CliError> {
    raw.iter()
        .map(|entry| {
            entry
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| {
                    CliError::InvalidArguments(format!(
                        "annotation '{entry}' must have the form KEY=VALUE"
                    ))
                })
        })
        .collect()
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file, in JSON mode too
        let log_dir = Config::log_dir();
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            if !json_mode {
                eprintln!("Warning: Failed to create log directory: {e}");
            }
        }

        let log_file = log_dir.join(format!(
            "apkolock-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| {
                                tracing_subscriber::EnvFilter::new(
                                    "info,apkolock=debug,apkolock_ops=debug,apkolock_resolver=debug",
                                )
                            },
                        ),
                    )
                    .init();

                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
            }
        }
    }

    if json_mode {
        // JSON mode: suppress all console output to avoid contaminating JSON
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("warn,apkolock=warn,apkolock_ops=warn")
                }),
            )
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs, command: &Commands) {
    if let Some(color) = &global.color {
        config.general.color = *color;
    }

    if let Commands::Lock {
        out_dir: Some(dir), ..
    }
    | Commands::Streams {
        out_dir: Some(dir), ..
    } = command
    {
        config.general.out_dir = Some(dir.clone());
    }
}
