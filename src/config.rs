use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

use crate::store::DEFAULT_PAGE_SIZE;

const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "orgdesk.log";
const APP_NAME: &str = "orgdesk";
const DEFAULT_REMOTE_URL: &str = "https://jsonplaceholder.typicode.com/users";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// None when running on built-in defaults
    pub config_path: Option<PathBuf>,
    pub remote: RemoteConfig,
    pub view: ViewConfig,
    pub log: LogConfig,
    pub ui: UiConfig,
    /// Problems that do not stop startup, logged once logging is up
    pub warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let file = ConfigFile::default();
        Self {
            config_path: None,
            remote: RemoteConfig {
                url: file.remote.url,
                timeout_secs: file.remote.timeout_secs,
            },
            view: ViewConfig {
                page_size: file.view.page_size,
            },
            log: LogConfig {
                level: file.log.level,
                file: None,
            },
            ui: file.ui.into(),
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Log file for interactive mode; None means the cache dir default
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Where the TUI writes its log, since the terminal is taken.
    pub fn interactive_log_path(&self) -> Result<PathBuf> {
        match &self.file {
            Some(path) => Ok(path.clone()),
            None => {
                let base = BaseDirs::new().context("unable to determine cache directory")?;
                Ok(base.cache_dir().join(APP_NAME).join(LOG_FILE_NAME))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub header: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    remote: RemoteFile,
    view: ViewFile,
    log: LogFile,
    ui: UiFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RemoteFile {
    url: String,
    timeout_secs: u64,
}

impl Default for RemoteFile {
    fn default() -> Self {
        Self {
            url: DEFAULT_REMOTE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ViewFile {
    page_size: usize,
}

impl Default for ViewFile {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LogFile {
    level: String,
    file: Option<PathBuf>,
}

impl Default for LogFile {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    header: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(255, 165, 0),
            selection_bg: RgbColor::new(255, 165, 0),
            selection_fg: RgbColor::new(0, 0, 0),
            header: RgbColor::new(255, 165, 0),
            status_fg: RgbColor::new(255, 165, 0),
            status_bg: RgbColor::new(0, 0, 0),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                header: file.colors.header,
                status_fg: file.colors.status_fg,
                status_bg: file.colors.status_bg,
            },
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

// =============================================================================
// Loading
// =============================================================================

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from `explicit`, or from the default location.
///
/// An explicit path must exist; a missing default file means defaults.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            let path = expand_tilde(path);
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path
        }
        None => {
            let path = config_path()?;
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let mut config = parse(&raw).with_context(|| format!("invalid configuration in {}", path.display()))?;
    config.config_path = Some(path);
    Ok(config)
}

/// Parse and validate a TOML document.
pub fn parse(raw: &str) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw).context("failed to parse configuration as TOML")?;

    let mut warnings = Vec::new();
    warn_unknown_keys(&value, &mut warnings);

    let cfg_file: ConfigFile = value
        .try_into()
        .context("failed to deserialize configuration")?;

    from_file(cfg_file, &mut warnings).map(|mut config| {
        config.warnings = warnings;
        config
    })
}

fn from_file(cfg_file: ConfigFile, warnings: &mut Vec<String>) -> Result<Config> {
    let url = cfg_file.remote.url.trim().to_string();
    if url.is_empty() {
        bail!("`remote.url` must not be empty");
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("`remote.url` must be an http:// or https:// URL, got `{}`", url);
    }
    if cfg_file.remote.timeout_secs == 0 {
        bail!("`remote.timeout_secs` must be at least 1");
    }
    if cfg_file.view.page_size == 0 {
        bail!("`view.page_size` must be at least 1");
    }

    let level = cfg_file.log.level.trim().to_ascii_lowercase();
    let level = if matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error" | "off") {
        level
    } else {
        warnings.push(format!("unknown log.level `{}`, using `info`", cfg_file.log.level));
        "info".to_string()
    };

    Ok(Config {
        config_path: None,
        remote: RemoteConfig {
            url,
            timeout_secs: cfg_file.remote.timeout_secs,
        },
        view: ViewConfig {
            page_size: cfg_file.view.page_size,
        },
        log: LogConfig {
            level,
            file: cfg_file.log.file.as_deref().map(expand_tilde),
        },
        ui: cfg_file.ui.into(),
        warnings: Vec::new(),
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value, warnings: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        return;
    };

    warn_unknown_in_section(value, "", &["remote", "view", "log", "ui"], warnings);

    if let Some(v) = table.get("remote") {
        warn_unknown_in_section(v, "remote.", &["url", "timeout_secs"], warnings);
    }
    if let Some(v) = table.get("view") {
        warn_unknown_in_section(v, "view.", &["page_size"], warnings);
    }
    if let Some(v) = table.get("log") {
        warn_unknown_in_section(v, "log.", &["level", "file"], warnings);
    }
    if let Some(v) = table.get("ui") {
        warn_unknown_in_section(v, "ui.", &["colors"], warnings);
        if let Some(colors) = v.as_table().and_then(|ui| ui.get("colors")) {
            warn_unknown_in_section(
                colors,
                "ui.colors.",
                &["border", "selection_bg", "selection_fg", "header", "status_fg", "status_bg"],
                warnings,
            );
        }
    }
}

fn warn_unknown_in_section(value: &toml::Value, prefix: &str, known: &[&str], warnings: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        return;
    };
    let known_set: HashSet<&str> = known.iter().copied().collect();
    for key in table.keys() {
        if !known_set.contains(key.as_str()) {
            warnings.push(format!("unknown configuration key `{}{}`", prefix, key));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.remote.url, DEFAULT_REMOTE_URL);
        assert_eq!(config.remote.timeout_secs, 10);
        assert_eq!(config.view.page_size, 5);
        assert_eq!(config.log.level, "info");
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn built_in_defaults_match_an_empty_file() {
        let parsed = parse("").unwrap();
        let default = Config::default();
        assert_eq!(default.remote, parsed.remote);
        assert_eq!(default.view, parsed.view);
        assert_eq!(default.log, parsed.log);
    }

    #[test]
    fn full_file_is_read() {
        let config = parse(
            r#"
            [remote]
            url = "http://localhost:3000/orgs/"
            timeout_secs = 3

            [view]
            page_size = 20

            [log]
            level = "DEBUG"
            file = "/tmp/orgdesk.log"

            [ui.colors]
            border = [1, 2, 3]
            header = { r = 4, g = 5, b = 6 }
            "#,
        )
        .unwrap();

        assert_eq!(config.remote.url, "http://localhost:3000/orgs/");
        assert_eq!(config.remote.timeout_secs, 3);
        assert_eq!(config.view.page_size, 20);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.file, Some(PathBuf::from("/tmp/orgdesk.log")));
        assert_eq!(config.ui.colors.border, RgbColor::new(1, 2, 3));
        assert_eq!(config.ui.colors.header, RgbColor::new(4, 5, 6));
        assert_eq!(config.ui.colors.selection_fg, RgbColor::new(0, 0, 0));
    }

    #[test]
    fn unknown_keys_are_warnings() {
        let config = parse(
            r#"
            theme = "dark"
            [view]
            page_size = 5
            rows = 3
            [ui.colors]
            accent = [0, 0, 0]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.warnings,
            vec![
                "unknown configuration key `theme`".to_string(),
                "unknown configuration key `view.rows`".to_string(),
                "unknown configuration key `ui.colors.accent`".to_string(),
            ]
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse("[view]\npage_size = 0").is_err());
        assert!(parse("[remote]\ntimeout_secs = 0").is_err());
        assert!(parse("[remote]\nurl = \"ftp://example.com\"").is_err());
        assert!(parse("[remote]\nurl = \"  \"").is_err());
        assert!(parse("[view]\npage_size = \"five\"").is_err());
    }

    #[test]
    fn unknown_log_level_falls_back() {
        let config = parse("[log]\nlevel = \"chatty\"").unwrap();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.warnings.len(), 1);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[view]\npage_size = 7\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.view.page_size, 7);
        assert_eq!(config.config_path, Some(path));
    }
}
