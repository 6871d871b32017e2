use log::debug;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

use crate::cli::Cli;
use crate::error::Error;

pub const DEFAULT_BASE_URL: &str = "https://www.statuscake.com/API/";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiOptions,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiOptions {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub apikey: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Loads the config from the platform config directory.
    ///
    /// A missing file is not an error and yields an empty config.
    pub fn load() -> Result<Config, Error> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(path),
            _ => Ok(Config::default()),
        }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => {
                Error::Config(format!("config file {} not found", path.display()))
            }
            _ => Error::Io(err),
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("statuscake-tests").join("config.toml"))
    }
}

/// Effective values after layering CLI/env over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub username: String,
    pub apikey: String,
    pub timeout: Option<Duration>,
    pub concurrency: usize,
}

impl Settings {
    pub fn resolve(cli: Cli, config: Config) -> Result<Settings, Error> {
        let api = config.api;

        let raw_base = cli
            .base_url
            .or(api.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Settings {
            base_url: parse_base_url(&raw_base)?,
            // Missing credentials are sent as empty strings; the API rejects them.
            username: cli.username.or(api.username).unwrap_or_default(),
            apikey: cli.apikey.or(api.apikey).unwrap_or_default(),
            timeout: cli.timeout.or(api.timeout_secs).map(Duration::from_secs),
            concurrency: cli.concurrency.max(1),
        })
    }
}

/// Parses the API root, appending a trailing slash so endpoint paths join beneath it.
pub fn parse_base_url(raw: &str) -> Result<Url, Error> {
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}
