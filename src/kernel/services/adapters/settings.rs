//! Settings persistence: one JSON object, one namespaced key per concern.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::dirs::get_config_dir;
use crate::kernel::services::ports::{RuntimeConfig, Settings};

const SETTINGS_FILE: &str = "settings.json";
pub const SETTINGS_KEY: &str = "runpad.settings";
pub const RUNTIME_KEY: &str = "runpad.runtime";

pub fn get_settings_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(SETTINGS_FILE))
}

pub fn load_settings() -> Settings {
    get_settings_path()
        .map(|path| load_settings_from(&path))
        .unwrap_or_default()
}

pub fn load_runtime_config() -> RuntimeConfig {
    get_settings_path()
        .map(|path| load_runtime_config_from(&path))
        .unwrap_or_default()
}

pub fn save_settings(settings: &Settings) -> std::io::Result<PathBuf> {
    let path = get_settings_path().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine settings directory",
        )
    })?;
    save_settings_to(&path, settings)?;
    Ok(path)
}

/// Absent file or key means defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    read_namespace(path, SETTINGS_KEY)
}

pub fn load_runtime_config_from(path: &Path) -> RuntimeConfig {
    read_namespace(path, RUNTIME_KEY)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> std::io::Result<()> {
    write_namespace(path, SETTINGS_KEY, settings)
}

pub fn save_runtime_config_to(path: &Path, config: &RuntimeConfig) -> std::io::Result<()> {
    write_namespace(path, RUNTIME_KEY, config)
}

fn read_root(path: &Path) -> Option<Map<String, Value>> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Value>(&data) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "settings file is not a JSON object");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "settings file is not valid JSON");
            None
        }
    }
}

/// Defaults overlaid with every saved field that parses on its own; a bad
/// field only loses itself.
fn read_namespace<T>(path: &Path, key: &str) -> T
where
    T: Serialize + DeserializeOwned + Default,
{
    let Some(mut root) = read_root(path) else {
        return T::default();
    };
    let Some(value) = root.remove(key) else {
        return T::default();
    };
    if let Ok(parsed) = serde_json::from_value::<T>(value.clone()) {
        return parsed;
    }
    let Value::Object(saved) = value else {
        tracing::warn!(key, "ignoring settings entry that is not an object");
        return T::default();
    };
    let Ok(Value::Object(mut merged)) = serde_json::to_value(T::default()) else {
        return T::default();
    };

    for (field, field_value) in saved {
        let previous = merged.insert(field.clone(), field_value);
        if let Err(e) = serde_json::from_value::<T>(Value::Object(merged.clone())) {
            tracing::warn!(key, field = %field, error = %e, "ignoring malformed settings field");
            match previous {
                Some(previous) => merged.insert(field, previous),
                None => merged.remove(&field),
            };
        }
    }
    serde_json::from_value(Value::Object(merged)).unwrap_or_default()
}

/// Copies an unreadable settings file aside so rewriting it loses nothing.
fn backup_unreadable(path: &Path) -> std::io::Result<()> {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    let backup = PathBuf::from(backup);
    std::fs::copy(path, &backup)?;
    tracing::warn!(
        path = %path.display(),
        backup = %backup.display(),
        "replacing unreadable settings file; previous content kept in backup"
    );
    Ok(())
}

fn write_namespace<T: Serialize>(path: &Path, key: &str, value: &T) -> std::io::Result<()> {
    let mut root = match read_root(path) {
        Some(root) => root,
        None => {
            if path.exists() {
                backup_unreadable(path)?;
            }
            Map::new()
        }
    };
    let value = serde_json::to_value(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    root.insert(key.to_string(), value);

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(&Value::Object(root))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, content)
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/settings.rs"]
mod tests;
