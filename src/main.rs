mod cli;
mod config;
mod download;
mod error;
mod install;
mod inventory;
mod manifest;
mod platform;
mod resolve;
mod tool_id;
mod types;

use anyhow::{anyhow, Result};
use clap::Parser;
use cli::{Cli, Commands, ConfigAction, OutputFormat, ToolArgs};
use config::{expand_home, load_settings, load_stored_settings, normalize_key, save_settings};
use install::{http_client, Reconciler, Request};
use manifest::Manifest;
use resolve::Resolver;
use serde::Serialize;
use std::time::Duration;
use tool_id::{State, Tool, ToolSpec};
use types::{Outcome, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    let settings = load_settings()?;

    match cli.command {
        Commands::Version => {
            println!("okdtools v{}", env!("CARGO_PKG_VERSION"));
        }

        Commands::Install(ref args) => {
            let request = tool_request(args, &settings, State::Present)?;
            let outcome = reconciler(&settings, args.check, cli.quiet)?
                .reconcile(&[request])
                .await;
            finish(&outcome, cli.format)?;
        }

        Commands::Remove(ref args) => {
            let request = tool_request(args, &settings, State::Absent)?;
            let outcome = reconciler(&settings, args.check, cli.quiet)?
                .reconcile(&[request])
                .await;
            finish(&outcome, cli.format)?;
        }

        Commands::Apply {
            ref manifest,
            check,
        } => {
            let requests = Manifest::from_file(manifest)?.requests(&settings)?;
            tracing::info!("Reconciling {} tool(s) from {}", requests.len(), manifest.display());
            let outcome = reconciler(&settings, check, cli.quiet)?
                .reconcile(&requests)
                .await;
            finish(&outcome, cli.format)?;
        }

        Commands::Url {
            ref tool,
            ref release,
            channel,
        } => {
            println!("{}", resolver(&settings)?.resolve_named(tool, release, channel)?);
        }

        Commands::List { ref dir } => {
            let directory = match dir {
                Some(dir) => dir.clone(),
                None => expand_home(&settings.executable_dir),
            };
            let tools = inventory::scan(&directory)?;
            if tools.is_empty() {
                tracing::info!("No tools installed in {}", directory.display());
            }
            print_document(&tools, cli.format)?;
        }

        Commands::Config { action } => run_config(action, &settings, cli.format)?,
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the result document
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

fn resolver(settings: &Settings) -> Result<Resolver> {
    let resolver = Resolver::new(
        &settings.ocp_mirror_url,
        &settings.okd_release_url,
        &platform::get_system_info(),
    )?;
    Ok(resolver)
}

fn reconciler(settings: &Settings, check: bool, quiet: bool) -> Result<Reconciler> {
    let client = http_client(Duration::from_secs(settings.download_timeout_secs))?;
    Ok(
        Reconciler::new(client, resolver(settings)?, &settings.scratch_root())
            .check_mode(check)
            .show_progress(!quiet),
    )
}

fn tool_request(args: &ToolArgs, settings: &Settings, state: State) -> Result<Request> {
    let directory = match &args.dir {
        Some(dir) => dir.clone(),
        None => expand_home(&settings.executable_dir),
    };
    let tool = Tool::parse(&args.tool, &args.release, args.channel)?;
    let symlink = !args.no_symlink && (args.symlink || settings.symlink);
    let spec = ToolSpec::new(tool, &args.release, &directory, symlink)?;
    Ok(Request::new(spec, state))
}

/// Print the result and exit non-zero when the run failed.
fn finish(outcome: &Outcome, format: OutputFormat) -> Result<()> {
    print_document(outcome, format)?;
    if outcome.failed() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_document<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn run_config(action: ConfigAction, effective: &Settings, format: OutputFormat) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            if let Some(key) = key {
                let key = normalize_key(&key);
                let value = config::get_setting(effective, &key)
                    .ok_or_else(|| anyhow!("Setting '{}' not found", key))?;
                println!("{}", value);
            } else {
                println!("--- okdtools settings ---");
                for key in config::SETTING_KEYS {
                    let value = config::get_setting(effective, key).unwrap_or_default();
                    println!("  {}: {}", key, value);
                }
            }
        }
        ConfigAction::Set { args } => {
            let (key, value) = match args.as_slice() {
                [pair] => pair
                    .split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| anyhow!("Invalid format. Use 'key=value' or 'key value'."))?,
                [key, value] => (key.clone(), value.clone()),
                _ => return Err(anyhow!("Invalid format. Use 'key=value' or 'key value'.")),
            };
            let key = normalize_key(&key);
            let mut stored = load_stored_settings()?;
            config::set_setting(&mut stored, &key, &value)?;
            save_settings(&stored)?;
            tracing::info!("Setting '{}' updated to '{}'", key, value);
        }
        ConfigAction::Unset { key } => {
            let key = normalize_key(&key);
            let mut stored = load_stored_settings()?;
            config::unset_setting(&mut stored, &key)?;
            save_settings(&stored)?;
            tracing::info!("Setting '{}' unset", key);
        }
        ConfigAction::Show => print_document(effective, format)?,
    }
    Ok(())
}
