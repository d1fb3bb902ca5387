//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (falling back to the copy embedded at build time), then applies
//! `JUDI_WORK_DIR`, `JUDI_LOG_LEVEL` and `JUDI_BACKEND_URL` overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;
use crate::store::Theme;

/// Shipped defaults, used when no config file is present on disk.
pub const DEFAULT_TOML: &str = include_str!("../config/default.toml");

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Client identity and local paths.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Display name of the assistant in message info lines.
    pub name: String,
    /// Directory holding `storage.json` (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    /// When set, logs are appended here. See [`crate::logger::target`].
    pub log_file: Option<PathBuf>,
}

/// Classification service connection.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// `"http"` or `"offline"`.
    pub provider: String,
    /// Base URL; `/chat` and `/health` are appended.
    pub base_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    /// Theme used until the user toggles one and it is persisted.
    pub default_theme: Theme,
    pub show_sidebar: bool,
}

/// Fully-resolved client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
    pub backend: BackendConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Location of the persisted key-value document.
    pub fn storage_path(&self) -> PathBuf {
        self.client.work_dir.join("storage.json")
    }
}

/// Values that take precedence over the TOML file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub work_dir: Option<String>,
    pub log_level: Option<String>,
    pub backend_url: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            work_dir: env::var("JUDI_WORK_DIR").ok(),
            log_level: env::var("JUDI_LOG_LEVEL").ok(),
            backend_url: env::var("JUDI_BACKEND_URL").ok(),
        }
    }
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    client: RawClient,
    #[serde(default)]
    backend: RawBackend,
    #[serde(default)]
    ui: RawUi,
}

#[derive(Deserialize)]
struct RawClient {
    #[serde(default = "default_name")]
    name: String,
    work_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_file: Option<String>,
}

#[derive(Deserialize)]
struct RawBackend {
    #[serde(default = "default_provider")]
    provider: String,
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

impl Default for RawBackend {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

#[derive(Deserialize)]
struct RawUi {
    #[serde(default = "default_theme")]
    default_theme: String,
    #[serde(default)]
    show_sidebar: bool,
}

impl Default for RawUi {
    fn default() -> Self {
        Self {
            default_theme: default_theme(),
            show_sidebar: false,
        }
    }
}

fn default_name() -> String { "Judi".to_string() }
fn default_log_level() -> String { "warn".to_string() }
fn default_provider() -> String { "http".to_string() }
fn default_base_url() -> String { "http://127.0.0.1:8000".to_string() }
fn default_theme() -> String { "light".to_string() }

/// Load config from `path` (or the default location), then apply env-var
/// overrides.
pub fn load(path: Option<&Path>) -> Result<Config, AppError> {
    load_from(path, &Overrides::from_env())
}

/// Loader that accepts an explicit path and overrides.
/// Tests pass overrides directly instead of mutating env vars.
///
/// An explicit `path` must exist. Without one, `config/default.toml` is used
/// when present and [`DEFAULT_TOML`] otherwise.
pub fn load_from(path: Option<&Path>, overrides: &Overrides) -> Result<Config, AppError> {
    let (raw, origin) = match path {
        Some(path) => (read(path)?, path.display().to_string()),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                (read(default_path)?, DEFAULT_CONFIG_PATH.to_string())
            } else {
                (DEFAULT_TOML.to_string(), "<embedded defaults>".to_string())
            }
        }
    };
    parse(&raw, &origin, overrides)
}

fn read(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))
}

fn parse(raw: &str, origin: &str, overrides: &Overrides) -> Result<Config, AppError> {
    let parsed: RawConfig = toml::from_str(raw)
        .map_err(|e| AppError::Config(format!("parse error in {origin}: {e}")))?;

    let c = parsed.client;
    let work_dir = expand_home(overrides.work_dir.as_deref().unwrap_or(&c.work_dir));
    let log_level = overrides.log_level.clone().unwrap_or(c.log_level);
    crate::logger::parse_level(&log_level)
        .map_err(|e| AppError::Config(format!("{e} in {origin}")))?;
    let log_file = c.log_file.as_deref().map(expand_home);

    let provider = parsed.backend.provider.trim().to_ascii_lowercase();
    if provider != "http" && provider != "offline" {
        return Err(AppError::Config(format!(
            "unknown backend provider '{provider}' in {origin} (expected \"http\" or \"offline\")"
        )));
    }
    let base_url = overrides
        .backend_url
        .clone()
        .unwrap_or(parsed.backend.base_url)
        .trim_end_matches('/')
        .to_string();

    let default_theme = parsed
        .ui
        .default_theme
        .parse::<Theme>()
        .map_err(|e| AppError::Config(format!("{e} in {origin}")))?;

    Ok(Config {
        client: ClientConfig {
            name: c.name,
            work_dir,
            log_level,
            log_file,
        },
        backend: BackendConfig {
            provider,
            base_url,
            timeout_seconds: parsed.backend.timeout_seconds,
        },
        ui: UiConfig {
            default_theme,
            show_sidebar: parsed.ui.show_sidebar,
        },
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Offline `Config` rooted at `work_dir`. No network, no real home dir.
impl Config {
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            client: ClientConfig {
                name: "Judi".into(),
                work_dir: work_dir.to_path_buf(),
                log_level: "info".into(),
                log_file: None,
            },
            backend: BackendConfig {
                provider: "offline".into(),
                base_url: "http://127.0.0.1:0".into(),
                timeout_seconds: Some(1),
            },
            ui: UiConfig {
                default_theme: Theme::Light,
                show_sidebar: false,
            },
        }
    }
}
