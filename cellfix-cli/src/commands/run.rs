//! Run command - the position service with this process as its only client.
//!
//! Wires the settings watcher and (optionally) a JSON cell observer into the
//! service, registers one client session and prints every event until the
//! service exits on idle or Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cellfix::engine::EngineEvent;
use cellfix::service::{
    engine_from_config, locator_from_config, ExitReason, JsonCellObserver, PositionHandle,
    PositionService,
};
use cellfix::settings::SettingsWatcher;
use cellfix::time::SystemClock;

use super::common::describe_position;
use crate::error::CliError;
use crate::runner::CliRunner;

const CLIENT_ID: &str = "cellfix-cli";

pub struct RunArgs {
    pub interval: Option<u64>,
    pub cells: Option<PathBuf>,
}

pub fn run(runner: &CliRunner, args: RunArgs) -> Result<(), CliError> {
    runner.log_startup("run");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("Failed to start tokio runtime: {}", e)))?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    ctrlc::set_handler(move || signal_cancel.cancel())
        .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    let reason = runtime.block_on(serve(runner, args, cancel))?;
    match reason {
        ExitReason::Idle => println!("Exited after idle timeout"),
        ExitReason::Cancelled => println!("Interrupted, shutting down"),
    }
    Ok(())
}

async fn serve(
    runner: &CliRunner,
    args: RunArgs,
    cancel: CancellationToken,
) -> Result<ExitReason, CliError> {
    let config = runner.config();
    let settings = runner.settings()?;
    let engine = engine_from_config(config, settings, Arc::new(SystemClock));
    let locator = locator_from_config(config).map_err(CliError::Online)?;

    println!("cellfix v{}", cellfix::VERSION);
    println!("Dataset roots: {:?}", config.dataset.roots);
    println!("Settings:      {}", config.settings.path.display());
    match &config.online.endpoint {
        Some(endpoint) => println!("Online:        {}", endpoint),
        None => println!("Online:        disabled"),
    }
    println!();

    let (service, handle) = PositionService::new(engine, locator, config.online.timeout);

    let watcher = SettingsWatcher::new(&config.settings.path, config.settings.poll_interval);
    let settings_handle = handle.clone();
    tokio::spawn(watcher.run(cancel.clone(), move |snapshot| {
        if settings_handle.settings_changed(snapshot).is_err() {
            warn!("Position service gone, dropping settings change");
        }
    }));

    if let Some(path) = &args.cells {
        info!(path = %path.display(), "Watching cell reports");
        let observer = JsonCellObserver::new(path, config.settings.poll_interval);
        tokio::spawn(observer.run(handle.clone(), cancel.clone()));
    }

    tokio::spawn(print_events(handle.clone(), cancel.clone()));
    let service_task = tokio::spawn(service.run(cancel.clone()));

    handle.add_reference(CLIENT_ID)?;
    if let Some(secs) = args.interval {
        handle
            .set_update_interval(CLIENT_ID, secs.saturating_mul(1000))
            .await?;
    }

    let reason = service_task
        .await
        .map_err(|e| CliError::Runtime(format!("Position service task failed: {}", e)))?;
    cancel.cancel();
    Ok(reason)
}

async fn print_events(handle: PositionHandle, cancel: CancellationToken) {
    let mut events = handle.subscribe();
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(EngineEvent::PositionChanged(report)) => {
                println!("position  {}", describe_position(&report))
            }
            Ok(EngineEvent::StatusChanged(status)) => println!("status    {:?}", status),
            Ok(EngineEvent::IdleTimeout) => println!("idle      no clients"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event printer lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
