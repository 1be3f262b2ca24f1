//! # XOne Configuration
//!
//! Typed model of the XOne configuration file: four named environments,
//! each carrying an endpoint, auth settings and three per-API credential
//! records, plus global request defaults. The file is plain JSON, located
//! through an environment-variable override, a per-user dot directory, or
//! a `config.json` placed next to the executable.
//!
//! The loaded tree is immutable apart from the per-API token-manager slot,
//! which is populated at most once (see the `tokens` module).

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::{env, fs};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tokens::TokenManager;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "XONE_CONFIG";
const CONFIG_DOT_DIR: &str = ".xone";

/// Errors raised while locating or parsing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading the configuration file.
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    /// The file exists but is not a valid configuration document.
    #[error("Configuration parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Selector for one of the three per-environment credential records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    /// The trade information service.
    TradeInformation,
    /// The CSA information service.
    CsaInformation,
    /// The pricing model service.
    PricingModel,
}

/// # API Credential Record
///
/// Per-API authentication configuration: OAuth scope, optional
/// client credentials, an optional static `Origin` header value, and the
/// slot for the lazily-created token manager. The slot is never
/// serialized and, once filled, never replaced.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Free-form description, carried through from the file untouched.
    #[serde(default)]
    pub comment: Option<String>,
    /// Static `Origin` header value, when the API requires one.
    #[serde(default)]
    pub origin: Option<String>,

    /// OAuth scope requested for this API.
    pub scope: String,
    /// Client id for client-credentials token acquisition.
    #[serde(default)]
    pub client_id: String,
    /// Client secret for client-credentials token acquisition.
    #[serde(default)]
    pub client_secret: String,

    /// Lazily-created token manager, at most one per record for the
    /// lifetime of the process.
    #[serde(skip)]
    pub token_mgr: RwLock<Option<Arc<dyn TokenManager>>>,
}

impl ApiConfig {
    /// True when both client credentials are present and non-empty.
    pub fn has_client_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// # Environment Descriptor
///
/// One named XOne deployment target with its endpoint, auth-server
/// settings and the three per-API credential records.
#[derive(Debug, Deserialize, Serialize)]
pub struct XoneEnv {
    /// Credentials for the trade information service.
    pub trade_information: ApiConfig,
    /// Credentials for the CSA information service.
    pub csa_information: ApiConfig,
    /// Credentials for the pricing model service.
    pub pricing_model: ApiConfig,

    /// Base endpoint URL for all services of this environment.
    pub endpoint: String,
    /// Environment path segment used by the generic URL layout.
    pub xone_env: String,
    /// API version segment used by the trade information URL layout.
    pub version: String,

    /// Auth-server identifier. Absent or empty means requests carry no
    /// `Authorization` header at all.
    #[serde(default)]
    pub sgconnect_env: Option<String>,

    /// Client id for implicit-flow token acquisition.
    #[serde(default)]
    pub implicit_client_id: String,
    /// Redirect URI for implicit-flow token acquisition.
    #[serde(default)]
    pub implicit_redirect_uri: String,
}

impl XoneEnv {
    /// The credential record for the given API.
    pub fn api(&self, kind: ApiKind) -> &ApiConfig {
        match kind {
            ApiKind::TradeInformation => &self.trade_information,
            ApiKind::CsaInformation => &self.csa_information,
            ApiKind::PricingModel => &self.pricing_model,
        }
    }

    /// The auth-server identifier, treating an empty string as absent.
    pub fn auth_server(&self) -> Option<&str> {
        self.sgconnect_env.as_deref().filter(|s| !s.is_empty())
    }
}

/// The four named XOne deployment targets.
#[derive(Debug, Deserialize, Serialize)]
pub struct XoneConfig {
    /// Production.
    pub prod: XoneEnv,
    /// User acceptance testing.
    pub uat: XoneEnv,
    /// Pre-beta.
    pub prebeta: XoneEnv,
    /// Yesterday's snapshot environment.
    pub yesterday: XoneEnv,
}

impl XoneConfig {
    /// Looks an environment up by its configuration name.
    pub fn env(&self, name: &str) -> Option<&XoneEnv> {
        match name {
            "prod" => Some(&self.prod),
            "uat" => Some(&self.uat),
            "prebeta" => Some(&self.prebeta),
            "yesterday" => Some(&self.yesterday),
            _ => None,
        }
    }
}

fn default_logger() -> String {
    "fit_xone".to_string()
}

fn default_max_retries() -> i64 {
    0
}

fn default_timeout() -> u64 {
    60
}

/// # Root Configuration
///
/// Top of the configuration tree: the environment map plus global request
/// defaults. Loaded once and shared via `Arc`; there is no reload.
#[derive(Debug, Deserialize, Serialize)]
pub struct RootConfig {
    /// The per-environment map.
    pub xone: XoneConfig,

    /// Logger name used by the logging wrapper.
    #[serde(default = "default_logger")]
    pub logger: String,
    /// Retries after the first attempt. 0 means a single attempt. Kept
    /// signed: a negative value skips the request loop entirely.
    #[serde(default = "default_max_retries")]
    pub max_retries: i64,
    /// Per-attempt timeout in seconds for the first attempt.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl RootConfig {
    /// Loads the configuration from the resolved on-disk location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&resolve_config_path()?)
    }

    /// Loads the configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Resolution order: `XONE_CONFIG` environment variable, else
/// `~/.xone/config.json`; when the candidate does not exist, fall back to
/// `config.json` next to the executable.
fn resolve_config_path() -> Result<PathBuf, ConfigError> {
    let candidate = match env::var(CONFIG_ENV_VAR) {
        Ok(path) => PathBuf::from(path),
        Err(_) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DOT_DIR)
            .join(CONFIG_FILE_NAME),
    };

    if candidate.is_file() {
        return Ok(candidate);
    }

    let exe = env::current_exe()?;
    let exe_dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(exe_dir.join(CONFIG_FILE_NAME))
}
