//! Settings command - show what the engine would run with.

use serde::Serialize;

use cellfix::settings::{EngineSettings, SettingsSnapshot};

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Serialize)]
struct SettingsReport<'a> {
    path: &'a str,
    snapshot: SettingsSnapshot,
    effective: EngineSettings,
    positioning_active: bool,
    online_active: bool,
}

pub fn run(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("settings");

    let snapshot = runner.settings()?;
    let effective = EngineSettings::from_snapshot(&snapshot);
    let path = runner.config().settings.path.to_string_lossy();

    let report = SettingsReport {
        path: &path,
        snapshot,
        effective,
        positioning_active: effective.positioning_active(),
        online_active: effective.online_active(),
    };
    let text = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::Runtime(format!("Failed to encode settings: {}", e)))?;
    println!("{}", text);
    Ok(())
}
