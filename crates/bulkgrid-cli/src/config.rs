// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use bulkgrid_app::{DEFAULT_LOCALE, RECORD_PAGE_LIMIT, SchemaId};
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "bulkgrid";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "https://api.contentful.com";
const DEFAULT_ENVIRONMENT: &str = "master";
const DEFAULT_TOKEN_ENV: &str = "BULKGRID_TOKEN";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            store: Store::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    pub base_url: Option<String>,
    pub space_id: Option<String>,
    pub environment: Option<String>,
    pub token_env: Option<String>,
    pub locale: Option<String>,
    pub page_size: Option<i64>,
    pub timeout: Option<String>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            space_id: None,
            environment: Some(DEFAULT_ENVIRONMENT.to_owned()),
            token_env: Some(DEFAULT_TOKEN_ENV.to_owned()),
            locale: Some(DEFAULT_LOCALE.to_owned()),
            page_size: Some(RECORD_PAGE_LIMIT as i64),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub initial_schema: Option<String>,
    #[serde(default)]
    pub hide_schema_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            path: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("BULKGRID_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set BULKGRID_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("read bulkgrid config {}", path.display()));
            }
        };
        let document: toml::Table = toml::from_str(&raw)
            .with_context(|| format!("config {} is not valid TOML", path.display()))?;

        match document.get("version").and_then(toml::Value::as_integer) {
            Some(CONFIG_VERSION) => {}
            Some(other) => bail!(
                "config {} declares version {other}; this build reads version = {CONFIG_VERSION}",
                path.display()
            ),
            None => bail!(
                "config {} has no `version = {CONFIG_VERSION}` line; add it and keep settings under [store], [ui] and [log]",
                path.display()
            ),
        }

        let config: Config = toml::Value::Table(document)
            .try_into()
            .with_context(|| format!("config {} has an unexpected shape", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.store.base_url
            && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
        {
            bail!(
                "store.base_url in {} must start with http:// or https://, got {:?}",
                path.display(),
                base_url
            );
        }

        if let Some(page_size) = self.store.page_size
            && !(1..=RECORD_PAGE_LIMIT as i64).contains(&page_size)
        {
            bail!(
                "store.page_size in {} must be between 1 and {}, got {}",
                path.display(),
                RECORD_PAGE_LIMIT,
                page_size
            );
        }

        if let Some(locale) = &self.store.locale
            && locale.trim().is_empty()
        {
            bail!("store.locale in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.store.timeout {
            if parse_duration(timeout)?.is_zero() {
                bail!(
                    "store.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).with_context(|| {
                format!(
                    "log.level in {} is not a valid filter, got {:?}; use error, warn, info, debug, or trace",
                    path.display(),
                    level
                )
            })?;
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.store
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn space_id(&self) -> Result<&str> {
        match self.store.space_id.as_deref() {
            Some(space_id) if !space_id.trim().is_empty() => Ok(space_id),
            _ => bail!("store.space_id is required -- set it under [store] or run with --demo"),
        }
    }

    pub fn environment(&self) -> &str {
        self.store
            .environment
            .as_deref()
            .unwrap_or(DEFAULT_ENVIRONMENT)
    }

    pub fn token_env(&self) -> &str {
        self.store.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV)
    }

    /// The management token, read from the variable named by `store.token_env`.
    pub fn token(&self) -> Result<String> {
        let name = self.token_env();
        match env::var(name) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => bail!("{name} is not set -- export your management token and retry"),
        }
    }

    pub fn locale(&self) -> &str {
        self.store.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }

    pub fn page_size(&self) -> usize {
        self.store
            .page_size
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or(RECORD_PAGE_LIMIT)
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.store.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn initial_schema(&self) -> Option<SchemaId> {
        self.ui
            .initial_schema
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(SchemaId::from)
    }

    pub fn hide_schema_prefixes(&self) -> &[String] {
        &self.ui.hide_schema_prefixes
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set log.path in the config file")
        })?;
        Ok(data_root.join(APP_NAME).join("bulkgrid.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# bulkgrid config\n# Place this file at: {}\n\nversion = 1\n\n[store]\nbase_url = \"{}\"\nspace_id = \"your-space-id\"\nenvironment = \"{}\"\n# Name of the environment variable holding the management token\ntoken_env = \"{}\"\nlocale = \"{}\"\npage_size = {}\ntimeout = \"{}\"\n\n[ui]\n# initial_schema = \"article\"\nhide_schema_prefixes = []\n\n[log]\nlevel = \"{}\"\n# Optional. Default is platform data dir (for example ~/.local/share/bulkgrid/bulkgrid.log)\n# path = \"/absolute/path/to/bulkgrid.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_ENVIRONMENT,
            DEFAULT_TOKEN_ENV,
            DEFAULT_LOCALE,
            RECORD_PAGE_LIMIT,
            DEFAULT_TIMEOUT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

const DURATION_UNITS: [(&str, u64); 3] = [("ms", 1), ("s", 1_000), ("m", 60_000)];

fn parse_duration(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    for (suffix, unit_millis) in DURATION_UNITS {
        let Some(amount) = trimmed.strip_suffix(suffix) else {
            continue;
        };
        let amount: u64 = amount.parse().with_context(|| {
            format!("store.timeout {raw:?} needs a whole number before {suffix:?}")
        })?;
        return amount
            .checked_mul(unit_millis)
            .map(Duration::from_millis)
            .ok_or_else(|| anyhow!("store.timeout {raw:?} is too large"));
    }
    bail!("store.timeout {raw:?} has no unit; write it like 500ms, 10s or 2m")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use bulkgrid_app::SchemaId;
    use std::ffi::OsStr;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::Duration;

    struct Fixture {
        _dir: tempfile::TempDir,
        path: PathBuf,
    }

    fn fixture(toml: &str) -> Result<Fixture> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bulkgrid.toml");
        std::fs::write(&path, toml)?;
        Ok(Fixture { _dir: dir, path })
    }

    fn load_error(toml: &str) -> Result<String> {
        let fixture = fixture(toml)?;
        let error = Config::load(&fixture.path).expect_err("config should be rejected");
        Ok(format!("{error:#}"))
    }

    // Env vars are process-global; tests that touch them run one at a time.
    fn serialize_env() -> MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(Mutex::default)
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_env(name: &str, value: Option<&OsStr>) {
        // SAFETY: callers hold serialize_env() for the duration of the mutation.
        unsafe {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }

    #[test]
    fn absent_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load(&dir.path().join("nope.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.base_url(), "https://api.contentful.com");
        assert_eq!(config.environment(), "master");
        assert_eq!(config.token_env(), "BULKGRID_TOKEN");
        assert_eq!(config.locale(), "en-US");
        assert_eq!(config.page_size(), 1000);
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        assert_eq!(config.log_level(), "info");
        assert!(config.initial_schema().is_none());
        Ok(())
    }

    #[test]
    fn every_section_is_read() -> Result<()> {
        let fixture = fixture(
            r#"version = 1

[store]
base_url = "https://api.example.com/"
space_id = "abc"
environment = "staging"
token_env = "CMA_TOKEN"
locale = "de-DE"
page_size = 200
timeout = "500ms"

[ui]
initial_schema = "article"
hide_schema_prefixes = ["internal"]

[log]
level = "debug"
path = "/tmp/bulkgrid.log"
"#,
        )?;

        let config = Config::load(&fixture.path)?;
        assert_eq!(config.base_url(), "https://api.example.com");
        assert_eq!(config.space_id()?, "abc");
        assert_eq!(config.environment(), "staging");
        assert_eq!(config.token_env(), "CMA_TOKEN");
        assert_eq!(config.locale(), "de-DE");
        assert_eq!(config.page_size(), 200);
        assert_eq!(config.timeout()?, Duration::from_millis(500));
        assert_eq!(config.initial_schema(), Some(SchemaId::from("article")));
        assert_eq!(config.hide_schema_prefixes(), ["internal".to_owned()]);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_path()?, PathBuf::from("/tmp/bulkgrid.log"));
        Ok(())
    }

    #[test]
    fn rejected_configs_name_the_offending_setting() -> Result<()> {
        let cases = [
            ("[store]\nspace_id = \"abc\"\n", "no `version = 1` line"),
            ("version = 2\n", "declares version 2"),
            ("[[[", "not valid TOML"),
            ("version = 1\n[store]\npage_size = 5000\n", "between 1 and 1000"),
            ("version = 1\n[store]\nbase_url = \"ftp://cms\"\n", "http:// or https://"),
            ("version = 1\n[store]\ntimeout = \"0s\"\n", "must be positive"),
            ("version = 1\n[store]\ntimeout = \"soon\"\n", "store.timeout"),
            ("version = 1\n[log]\nlevel = \"bulkgrid=loud\"\n", "log.level"),
        ];
        for (toml, expected) in cases {
            let message = load_error(toml)?;
            assert!(
                message.contains(expected),
                "{toml:?} should mention {expected:?}, got {message:?}"
            );
        }
        Ok(())
    }

    #[test]
    fn live_mode_requires_a_space_id() {
        let message = Config::default()
            .space_id()
            .expect_err("space id should be required")
            .to_string();
        assert!(message.contains("store.space_id"));
        assert!(message.contains("--demo"));
    }

    #[test]
    fn token_comes_from_the_named_variable() -> Result<()> {
        let _env = serialize_env();
        let fixture = fixture("version = 1\n[store]\ntoken_env = \"BULKGRID_TEST_TOKEN\"\n")?;
        let config = Config::load(&fixture.path)?;

        set_env("BULKGRID_TEST_TOKEN", None);
        let missing = config.token().expect_err("unset token should fail");
        assert!(missing.to_string().contains("BULKGRID_TEST_TOKEN is not set"));

        set_env("BULKGRID_TEST_TOKEN", Some(OsStr::new("cfpat-123")));
        let token = config.token();
        set_env("BULKGRID_TEST_TOKEN", None);
        assert_eq!(token?, "cfpat-123");
        Ok(())
    }

    #[test]
    fn config_path_variable_wins_over_platform_dir() -> Result<()> {
        let _env = serialize_env();
        let dir = tempfile::tempdir()?;
        let custom = dir.path().join("elsewhere.toml");
        set_env("BULKGRID_CONFIG_PATH", Some(custom.as_os_str()));
        let resolved = Config::default_path();
        set_env("BULKGRID_CONFIG_PATH", None);
        assert_eq!(resolved?, custom);
        Ok(())
    }

    #[test]
    fn timeout_units() -> Result<()> {
        assert_eq!(parse_duration("250ms")?, Duration::from_millis(250));
        assert_eq!(parse_duration(" 30s ")?, Duration::from_secs(30));
        assert_eq!(parse_duration("3m")?, Duration::from_secs(180));
        assert!(parse_duration("12").is_err());
        assert!(parse_duration("1.5s").is_err());
        Ok(())
    }

    #[test]
    fn printed_template_is_loadable() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bulkgrid.toml");
        std::fs::write(&path, Config::example_config(&path))?;
        let config = Config::load(&path)?;
        assert_eq!(config.space_id()?, "your-space-id");
        assert!(config.hide_schema_prefixes().is_empty());
        Ok(())
    }
}
