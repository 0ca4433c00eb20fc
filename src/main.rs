//! Delivery Console - Main Entry Point
//!
//! Usage:
//!   delivery-console [status]        load every config section and show its status
//!   delivery-console watch <job-id>  follow a delivery job until it finishes
//!   delivery-console login <token>   store the API token (sealed) in settings

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use delivery_console::constants::APP_NAME;
use delivery_console::domain::SAVE_ORDER;
use delivery_console::domain::config::AppConfig;
use delivery_console::helpers::get_or_create_config_dir;
use delivery_console::services::{
    ConfigEditor, EditorEvent, HttpConfigApi, PollOptions, PollStop, block_on, spawn_in_tokio,
    watch_job,
};
use delivery_console::settings::{load_settings, save_settings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let config_dir = get_or_create_config_dir()?;
    let _guard = init_tracing(&config_dir);

    let config = load_settings().context("Failed to load settings")?;
    tracing::info!(
        "Starting {} as {} ({})",
        APP_NAME,
        config.session.user,
        config.session.role
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("status") => show_status(&config),
        Some("watch") => {
            let Some(job_id) = args.get(1) else {
                bail!("usage: {APP_NAME} watch <job-id>");
            };
            watch(&config, job_id.clone())
        }
        Some("login") => {
            let Some(token) = args.get(1) else {
                bail!("usage: {APP_NAME} login <token>");
            };
            let mut config = config;
            config.api.token = Some(token.clone());
            save_settings(&config)?;
            println!("Token saved");
            Ok(())
        }
        Some(other) => bail!("unknown command: {other}"),
    }
}

/// Log to stderr and to a daily rolling file in the config directory
fn init_tracing(config_dir: &Path) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(config_dir.join("logs"), APP_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();
    guard
}

fn show_status(config: &AppConfig) -> anyhow::Result<()> {
    let api = Arc::new(HttpConfigApi::new(&config.api)?);
    let mut editor = ConfigEditor::new(api, config.session.role);
    block_on(editor.load_all())?;

    for section in SAVE_ORDER {
        let version = editor
            .version(section)
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        println!(
            "{:<20} {:<8} v{:<4} {}",
            section.label(),
            format!("{:?}", editor.status(section)),
            version,
            editor
                .value(section)
                .map(|v| v.to_string())
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn watch(config: &AppConfig, job_id: String) -> anyhow::Result<()> {
    let api = Arc::new(HttpConfigApi::new(&config.api)?);
    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);

    let handle = spawn_in_tokio(watch_job(
        api,
        job_id.clone(),
        PollOptions::from(&config.polling),
        cancel_rx,
        Some(events_tx),
    ))?;

    // The channel closes once the watcher finishes and drops its sender
    for event in events_rx {
        if let EditorEvent::JobProgress(snapshot) = event {
            println!(
                "{} {:?} {}",
                snapshot.job_id,
                snapshot.status,
                snapshot.detail.unwrap_or_default()
            );
        }
    }

    let outcome = block_on(handle)?.context("Job watcher panicked")?;
    match outcome.stop {
        PollStop::Terminal => Ok(()),
        PollStop::TimedOut => bail!("Gave up waiting for job {job_id}"),
        PollStop::Cancelled => bail!("Stopped watching job {job_id}"),
    }
}
