use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::debug;

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::HeraldConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["herald.toml", "herald.yaml", "herald.yml", "herald.json"];

/// Override for the user-global config directory (set from `--config-dir`).
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Use `dir` instead of `~/.config/herald/` for discovery and saving.
pub fn set_config_dir(dir: PathBuf) {
    let mut guard = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    *guard = Some(dir);
}

/// Drop a previous [`set_config_dir`] override.
pub fn clear_config_dir() {
    let mut guard = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    *guard = None;
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<HeraldConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./herald.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/herald/herald.{toml,yaml,yml,json}` (user-global)
///
/// Returns the loaded config and the path it came from. When no file exists
/// the defaults are returned together with the default user config path. A
/// file that exists but fails to load is an error, never silently replaced
/// by defaults, since the caller may write destinations back to it.
pub fn discover_and_load() -> Result<(HeraldConfig, PathBuf)> {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return Ok((HeraldConfig::default(), find_or_default_config_path()));
    };
    debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    Ok((config, path))
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/herald/`), or the
/// override installed with [`set_config_dir`].
pub fn config_dir() -> Option<PathBuf> {
    let guard = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    if let Some(dir) = guard.as_ref() {
        return Some(dir.clone());
    }
    directories::ProjectDirs::from("", "", "herald").map(|d| d.config_dir().to_path_buf())
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("herald.toml")
}

/// Serialize `config` and write it to `path` in the format implied by its extension.
///
/// Creates parent directories if needed.
pub fn save_config(config: &HeraldConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let raw = match extension(path) {
        "toml" => toml::to_string_pretty(config)?,
        "yaml" | "yml" => serde_yaml::to_string(config)?,
        "json" => serde_json::to_string_pretty(config)?,
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    };
    std::fs::write(path, raw)?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}

/// Rewrite only the `destinations` key of the config file at `path`.
///
/// Everything else in the file (comments, `${ENV}` placeholders, key order
/// for TOML) is left untouched. A missing file is created with just the
/// destination list.
pub fn update_destinations(path: &Path, destinations: &[String]) -> Result<()> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(Error::Read {
                path: path.to_path_buf(),
                source,
            });
        },
    };

    let updated = match extension(path) {
        "toml" => {
            let mut doc: toml_edit::DocumentMut = raw.parse()?;
            let list: toml_edit::Array = destinations.iter().map(String::as_str).collect();
            doc["destinations"] = toml_edit::value(list);
            doc.to_string()
        },
        "yaml" | "yml" => {
            let mut value: serde_yaml::Value = if raw.trim().is_empty() {
                serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
            } else {
                serde_yaml::from_str(&raw)?
            };
            let map = value
                .as_mapping_mut()
                .context("config root is not a mapping")?;
            map.insert(
                serde_yaml::Value::String("destinations".into()),
                serde_yaml::to_value(destinations)?,
            );
            serde_yaml::to_string(&value)?
        },
        "json" => {
            let mut value: serde_json::Value = if raw.trim().is_empty() {
                serde_json::Value::Object(serde_json::Map::new())
            } else {
                serde_json::from_str(&raw)?
            };
            let map = value
                .as_object_mut()
                .context("config root is not an object")?;
            map.insert("destinations".into(), serde_json::to_value(destinations)?);
            serde_json::to_string_pretty(&value)?
        },
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, updated)?;
    debug!(path = %path.display(), count = destinations.len(), "saved destinations");
    Ok(())
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

fn parse_config(raw: &str, path: &Path) -> Result<HeraldConfig> {
    match extension(path) {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}
