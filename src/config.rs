// src/config.rs
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use dotenvy::dotenv;
use thiserror::Error;
use url::Url;

pub const DEFAULT_RUNNER_BASE_URL: &str = "https://api.langflow.astra.datastax.com";
pub const DEFAULT_RUNNER_FLOW_PATH: &str = "/lf/c40fcb81-ad16-49ea-a621-5666e1bdafda/api/v1/run/24852f36-f1cc-40cf-8e3f-b879f3cfe0d2";

/// Path prefix the development server strips before forwarding to the runner.
pub const DEV_REWRITE_PREFIX: &str = "/chatapi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Production,
    Development,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Mode::Production),
            "development" | "dev" => Ok(Mode::Development),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid URL for {name}: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("Invalid number for {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("Invalid mode: {0} (expected production or development)")]
    InvalidMode(String),
    #[error("{0} contains characters not allowed in an Authorization header")]
    InvalidCredential(&'static str),
}

/// Server-side configuration. Holds the only copy of the runner credential.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind host (e.g., 0.0.0.0)
    pub app_host: String,
    /// HTTP bind port (e.g., 3000)
    pub app_port: u16,
    pub mode: Mode,
    /// Bearer token attached to every forwarded request
    pub api_key: String,
    /// Runner host, also the target of the development rewrite
    pub runner_base_url: Url,
    /// Flow path under the runner host, e.g. "/lf/<org>/api/v1/run/<flow>"
    pub runner_flow_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env if present
        let _ = dotenv();

        let app_host = env_or_default("APP_HOST", "0.0.0.0");
        let app_port = parse_or_default::<u16>("APP_PORT", 3000)?;
        let mode = mode_from_env()?;
        let api_key = credential_from_env("CHATBOT_API_KEY")?;
        let runner_base_url = parse_url_or_default("RUNNER_BASE_URL", DEFAULT_RUNNER_BASE_URL)?;
        let runner_flow_path = env_or_default("RUNNER_FLOW_PATH", DEFAULT_RUNNER_FLOW_PATH);

        Ok(Self {
            app_host,
            app_port,
            mode,
            api_key,
            runner_base_url,
            runner_flow_path,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    /// Full runner URL the proxy forwards to, always with `stream=false`.
    pub fn runner_url(&self) -> Result<Url, url::ParseError> {
        let mut url = self.runner_base_url.join(&self.runner_flow_path)?;
        url.set_query(Some("stream=false"));
        Ok(url)
    }
}

/// Where the widget sends requests and which credential it carries.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub endpoint_url: Url,
    pub credential: String,
}

impl WidgetConfig {
    /// Production goes through the proxy route; development targets the
    /// runner through the rewritten `/chatapi` path on the same origin.
    pub fn for_mode(mode: Mode, origin: &Url, flow_path: &str, credential: impl Into<String>) -> Result<Self, ConfigError> {
        let path = match mode {
            Mode::Production => "/api/chat".to_string(),
            Mode::Development => format!("{DEV_REWRITE_PREFIX}{flow_path}?stream=false"),
        };
        let endpoint_url = origin.join(&path).map_err(|_| ConfigError::InvalidUrl {
            name: "CHAT_ORIGIN",
            value: format!("{origin}{path}"),
        })?;
        Ok(Self {
            endpoint_url,
            credential: credential.into(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();

        let mode = mode_from_env()?;
        let origin = parse_url_or_default("CHAT_ORIGIN", "http://localhost:3000")?;
        let flow_path = env_or_default("RUNNER_FLOW_PATH", DEFAULT_RUNNER_FLOW_PATH);
        let credential = credential_from_env("CHATBOT_API_KEY")?;

        Self::for_mode(mode, &origin, &flow_path, credential)
    }
}

/// Directory backing the widget's key-value transcript storage.
pub fn storage_dir_from_env() -> PathBuf {
    match env::var("CHAT_STORAGE_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("civic-chat"),
    }
}

/* --------------------------- helpers --------------------------- */

fn mode_from_env() -> Result<Mode, ConfigError> {
    env_or_default("APP_MODE", "development").parse()
}

fn credential_from_env(key: &'static str) -> Result<String, ConfigError> {
    let raw = env::var(key).map_err(|_| ConfigError::MissingVar(key))?;
    check_credential(key, raw)
}

/// The token ends up in `Authorization: Bearer <token>`; reject it up front
/// if it could never be sent.
fn check_credential(key: &'static str, token: String) -> Result<String, ConfigError> {
    match crate::services::relay::bearer(&token) {
        Ok(_) => Ok(token),
        Err(_) => Err(ConfigError::InvalidCredential(key)),
    }
}

fn env_or_default(key: &'static str, default: &'static str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or_default<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(v) => v.parse::<T>().map_err(|_| ConfigError::InvalidNumber { name: key, value: v }),
        Err(_) => Ok(default),
    }
}

fn parse_url_or_default(key: &'static str, default: &'static str) -> Result<Url, ConfigError> {
    let raw = env_or_default(key, default);
    Url::parse(&raw).map_err(|_| ConfigError::InvalidUrl { name: key, value: raw })
}
