use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::history::AppFlavor;

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub dispatcher: DispatcherConfig,
    pub reading_history: ReadingHistoryConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub flavor: AppFlavor,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Maximum number of actions delivered per loop turn.
    pub batch_limit: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { batch_limit: 32 }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ReadingHistoryConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "knav=info".to_string(),
        }
    }
}

/// Overrides every other config location when set.
pub const CONFIG_PATH_ENV: &str = "KNAV_CONFIG_PATH";

/// Base directories searched in order, with the subdirectory each one needs.
const CONFIG_BASES: [(&str, Option<&str>); 3] = [
    ("XDG_CONFIG_HOME", None),
    ("HOME", Some(".config")),
    ("APPDATA", None),
];

impl Config {
    /// Loads from [`default_config_path`], or defaults when none resolves.
    pub fn load() -> AppResult<Self> {
        default_config_path().map_or_else(|| Ok(Self::default()), Self::load_from_path)
    }

    /// A missing file yields defaults; anything unreadable or malformed is an error.
    pub fn load_from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(_) if path.is_dir() => {
                return Err(AppError::invalid_argument(format!(
                    "config path is a directory: {}",
                    path.display()
                )));
            }
            Err(source) => {
                return Err(AppError::io_with_context(
                    source,
                    format!("failed to read config: {}", path.display()),
                ));
            }
        };
        Self::from_toml(&raw)
            .map_err(|message| AppError::invalid_argument(format!("{}: {message}", path.display())))
    }

    /// Parses and sanitizes a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self, String> {
        toml::from_str::<Self>(raw)
            .map(Self::sanitized)
            .map_err(|source| format!("invalid config: {source}"))
    }

    fn sanitized(mut self) -> Self {
        self.dispatcher.batch_limit = self.dispatcher.batch_limit.max(1);
        if self.log.filter.trim().is_empty() {
            self.log.filter = LogConfig::default().filter;
        }
        if self
            .reading_history
            .path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            self.reading_history.path = None;
        }
        self
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    resolve_config_path(|key| std::env::var_os(key))
}

fn resolve_config_path(env: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    let var = |key: &str| env(key).filter(|value| !value.is_empty()).map(PathBuf::from);
    if let Some(explicit) = var(CONFIG_PATH_ENV) {
        return Some(explicit);
    }
    CONFIG_BASES.into_iter().find_map(|(key, subdir)| {
        let mut dir = var(key)?;
        dir.extend(subdir);
        Some(dir.join("knav").join("config.toml"))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::ffi::OsString;
    use std::fs;
    use std::path::PathBuf;
    use std::process;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::history::AppFlavor;

    use super::{CONFIG_PATH_ENV, Config, resolve_config_path};

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let vars: HashMap<String, OsString> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), OsString::from(value)))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn unique_temp_path(suffix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("knav_config_{suffix}_{}_{}", process::id(), nanos));
        path
    }

    #[test]
    fn load_from_path_returns_defaults_for_missing_file() {
        let missing = unique_temp_path("missing.toml");
        let config = Config::load_from_path(&missing).expect("missing config should fallback");
        assert_eq!(config, Config::default());
        assert_eq!(config.app.flavor, AppFlavor::Course);
    }

    #[test]
    fn load_from_path_applies_partial_overrides_and_sanitizes() {
        let path = unique_temp_path("custom.toml");
        fs::write(
            &path,
            r#"
            [app]
            flavor = "mesh"

            [dispatcher]
            batch_limit = 0

            [reading_history]
            path = ""

            [log]
            filter = "   "
            "#,
        )
        .expect("config file should be written");

        let config = Config::load_from_path(&path).expect("config should parse");
        assert_eq!(config.app.flavor, AppFlavor::Mesh);
        assert_eq!(config.dispatcher.batch_limit, 1);
        assert_eq!(config.reading_history.path, None);
        assert_eq!(config.log.filter, "knav=info");

        fs::remove_file(&path).expect("config file should be removed");
    }

    #[test]
    fn load_from_path_rejects_unknown_flavor() {
        let path = unique_temp_path("bad_flavor.toml");
        fs::write(&path, "[app]\nflavor = \"encyclopedia\"\n").expect("config file should be written");

        assert!(Config::load_from_path(&path).is_err());

        fs::remove_file(&path).expect("config file should be removed");
    }

    #[test]
    fn load_from_path_rejects_a_directory() {
        let dir = unique_temp_path("dir");
        fs::create_dir_all(&dir).expect("config dir should be created");

        let err = Config::load_from_path(&dir).expect_err("directory should be rejected");
        assert!(err.to_string().contains("directory"), "{err}");

        fs::remove_dir(&dir).expect("config dir should be removed");
    }

    #[test]
    fn explicit_config_path_wins() {
        let env = env_of(&[(CONFIG_PATH_ENV, "/etc/knav.toml"), ("HOME", "/home/reader")]);
        assert_eq!(resolve_config_path(env), Some(PathBuf::from("/etc/knav.toml")));
    }

    #[test]
    fn config_path_falls_through_blank_bases() {
        let env = env_of(&[
            (CONFIG_PATH_ENV, ""),
            ("XDG_CONFIG_HOME", ""),
            ("HOME", "/home/reader"),
            ("APPDATA", "C:/AppData"),
        ]);
        assert_eq!(
            resolve_config_path(env),
            Some(PathBuf::from("/home/reader/.config/knav/config.toml"))
        );

        let env = env_of(&[("APPDATA", "C:/AppData")]);
        assert_eq!(
            resolve_config_path(env),
            Some(PathBuf::from("C:/AppData/knav/config.toml"))
        );
        assert_eq!(resolve_config_path(env_of(&[])), None);
    }
}
