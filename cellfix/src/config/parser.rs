//! INI parsing for [`ConfigFile`].
//!
//! The single place where INI key names map to struct fields.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::file::{ConfigFile, ConfigFileError};

/// Parse an `Ini` into a `ConfigFile`, overlaying defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [dataset]
    if let Some(section) = ini.section(Some("dataset")) {
        if let Some(v) = section.get("roots") {
            let roots: Vec<PathBuf> = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(expand_tilde)
                .collect();
            if roots.is_empty() {
                return Err(invalid("dataset", "roots", v, "expected at least one directory"));
            }
            config.dataset.roots = roots;
        }
        if let Some(v) = section.get("file_name") {
            let v = v.trim();
            if v.is_empty() || v.contains('/') {
                return Err(invalid("dataset", "file_name", v, "expected a plain file name"));
            }
            config.dataset.file_name = v.to_string();
        }
    }

    // [settings]
    if let Some(section) = ini.section(Some("settings")) {
        if let Some(v) = section.get("path") {
            let v = v.trim();
            if !v.is_empty() {
                config.settings.path = expand_tilde(v);
            }
        }
        if let Some(d) = seconds(section, "settings", "poll_interval_secs")? {
            config.settings.poll_interval = d;
        }
    }

    // [timers]
    if let Some(section) = ini.section(Some("timers")) {
        if let Some(d) = seconds(section, "timers", "idle_timeout_secs")? {
            config.timers.idle_timeout = d;
        }
        if let Some(d) = seconds(section, "timers", "fix_lost_timeout_secs")? {
            config.timers.fix_lost_timeout = d;
        }
        if let Some(d) = seconds(section, "timers", "minimum_interval_secs")? {
            config.timers.minimum_interval = d;
        }
        if let Some(d) = seconds(section, "timers", "reuse_window_secs")? {
            config.timers.reuse_window = d;
        }
        if let Some(d) = seconds(section, "timers", "fallback_window_secs")? {
            config.timers.fallback_window = d;
        }
    }

    // [online]
    if let Some(section) = ini.section(Some("online")) {
        if let Some(v) = section.get("endpoint") {
            let v = v.trim();
            if !v.is_empty() {
                if !(v.starts_with("http://") || v.starts_with("https://")) {
                    return Err(invalid("online", "endpoint", v, "expected an http(s) URL"));
                }
                config.online.endpoint = Some(v.to_string());
            }
        }
        if let Some(d) = seconds(section, "online", "timeout_secs")? {
            config.online.timeout = d;
        }
    }

    // [cache]
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("max_entries") {
            let v = v.trim();
            if !v.is_empty() {
                let n: u64 = number(v, "cache", "max_entries")?;
                if n == 0 {
                    return Err(invalid("cache", "max_entries", v, "must be greater than zero"));
                }
                config.cache.max_entries = Some(n);
            }
        }
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = Some(expand_tilde(v));
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn number<T: FromStr>(value: &str, section: &str, key: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "expected a non-negative integer"))
}

/// Read a whole-second duration. Zero is rejected.
fn seconds(
    props: &Properties,
    section: &str,
    key: &str,
) -> Result<Option<Duration>, ConfigFileError> {
    let Some(v) = props.get(key) else {
        return Ok(None);
    };
    let secs: u64 = number(v, section, key)?;
    if secs == 0 {
        return Err(invalid(section, key, v, "must be at least 1 second"));
    }
    Ok(Some(Duration::from_secs(secs)))
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}
