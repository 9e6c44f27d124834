// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use runtime::{ApiRuntime, DemoRuntime};
use shotdesk_app::{AppState, MemoryPreferences, PreferenceStore};
use shotdesk_prefs::PreferenceDb;
use shotdesk_testkit::DemoServer;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    match options.action {
        CliAction::Help => {
            print_help();
            return Ok(());
        }
        CliAction::PrintConfigPath => {
            println!("{}", options.config_path.display());
            return Ok(());
        }
        CliAction::PrintExample => {
            print!("{}", Config::example_config(&options.config_path));
            return Ok(());
        }
        CliAction::Run => {}
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `shotdesk --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let store: Box<dyn PreferenceStore> = if options.demo {
        Box::new(MemoryPreferences::default())
    } else {
        let prefs_path = config.prefs_path()?;
        let db = PreferenceDb::open(&prefs_path).with_context(|| {
            format!(
                "open preferences {} -- if this path is wrong, set [storage].prefs_path or SHOTDESK_PREFS_PATH",
                prefs_path.display()
            )
        })?;
        db.bootstrap()?;
        db.validate()?;
        Box::new(db)
    };

    let client = if options.demo {
        None
    } else {
        Some(
            shotdesk_api::Client::new(config.base_url(), config.timeout()?).with_context(
                || {
                    format!(
                        "invalid [server] config in {}; fix base_url/timeout values",
                        options.config_path.display()
                    )
                },
            )?,
        )
    };
    if options.check_only {
        return Ok(());
    }

    let _log_guard = init_logging(&config)?;
    info!(
        demo = options.demo,
        base_url = config.base_url(),
        "starting shotdesk"
    );

    let mut state = AppState::new(store)?.with_startup_project(config.startup_project());
    match client {
        Some(client) => shotdesk_tui::run_app(&mut state, &mut ApiRuntime::new(client)),
        None => {
            let mut runtime = DemoRuntime::new(DemoServer::default());
            shotdesk_tui::run_app(&mut state, &mut runtime)
        }
    }
}

/// File logging only; the terminal belongs to the TUI.
fn init_logging(config: &Config) -> Result<WorkerGuard> {
    let filter = match env::var("RUST_LOG") {
        Ok(raw) if !raw.trim().is_empty() => {
            EnvFilter::try_new(&raw).with_context(|| format!("parse RUST_LOG {raw:?}"))?
        }
        _ => EnvFilter::try_new(config.log_filter())
            .with_context(|| format!("parse [log].filter {:?}", config.log_filter()))?,
    };

    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::daily(&log_dir, "shotdesk.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter),
        )
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(guard)
}

/// What the invocation asks for. Informational actions outrank `Run`, and
/// help outranks everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CliAction {
    Run,
    PrintExample,
    PrintConfigPath,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    action: CliAction,
    demo: bool,
    check_only: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        action: CliAction::Run,
        demo: false,
        check_only: false,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let requested = match arg.as_ref() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(path.as_ref());
                continue;
            }
            "--demo" => {
                options.demo = true;
                continue;
            }
            "--check" => {
                options.check_only = true;
                continue;
            }
            "--print-config-path" => CliAction::PrintConfigPath,
            "--print-example-config" => CliAction::PrintExample,
            "--help" | "-h" => CliAction::Help,
            unknown => bail!("unknown argument {unknown:?}; run with --help to see supported options"),
        };
        options.action = options.action.max(requested);
    }

    Ok(options)
}

fn print_help() {
    println!("shotdesk");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Browse an in-memory demo server");
    println!("  --check                  Validate config, preferences, and server settings");
    println!("  --help                   Show this help");
}
