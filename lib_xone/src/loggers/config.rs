//! # Logging Configuration
//!
//! Loads the logging setup from a YAML file, folds in the log-shipper
//! connection settings, and initialises the `tracing` subscriber. The
//! shipping backend itself (a search-index service reached over HTTP) is
//! an external collaborator; this module only prepares the handler
//! settings it will be driven with.

use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE_NAME: &str = "logging.yml";

/// Errors raised while loading the YAML logging configuration.
#[derive(Debug, Error)]
pub enum LoggingConfigError {
    /// I/O failure while reading the file.
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid YAML for the expected schema.
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yml::Error),
}

/// Connection settings for the log-shipping backend, supplied by the
/// caller at configuration time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EsConfig {
    /// Backend host.
    pub host: String,
    /// Backend port.
    pub port: u16,
    /// Basic-auth credential pair.
    pub token: (String, String),
    /// Target index name.
    pub index_name: String,
    /// Static fields attached to every shipped record.
    #[serde(default)]
    pub additional_fields: Value,
}

/// One backend host entry in the handler settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EsHost {
    /// Host name.
    pub host: String,
    /// Port.
    pub port: u16,
}

fn default_buffer_size() -> usize {
    1000
}

fn default_flush_frequency() -> u64 {
    1
}

/// Handler settings for the shipping backend. The YAML file may preset
/// buffering knobs; connection fields are always overwritten from the
/// caller-supplied [`EsConfig`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EsHandlerSettings {
    /// Backend hosts.
    #[serde(default)]
    pub hosts: Vec<EsHost>,
    /// Authentication style; always forced to basic auth.
    #[serde(default)]
    pub auth_type: Option<String>,
    /// Basic-auth credential pair.
    #[serde(default)]
    pub auth_details: Option<(String, String)>,
    /// Target index name.
    #[serde(default)]
    pub es_index_name: String,
    /// Static fields attached to every shipped record.
    #[serde(default)]
    pub es_additional_fields: Value,
    /// TLS to the backend.
    #[serde(default)]
    pub use_ssl: bool,
    /// Certificate verification towards the backend.
    #[serde(default)]
    pub verify_ssl: bool,
    /// Records buffered before a flush.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Seconds between flushes.
    #[serde(default = "default_flush_frequency")]
    pub flush_frequency_in_sec: u64,
}

impl Default for EsHandlerSettings {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            auth_type: None,
            auth_details: None,
            es_index_name: String::new(),
            es_additional_fields: Value::Null,
            use_ssl: false,
            verify_ssl: false,
            buffer_size: default_buffer_size(),
            flush_frequency_in_sec: default_flush_frequency(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_console() -> bool {
    true
}

/// The YAML logging configuration schema.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Filter directive for the subscriber (e.g. `info`, `debug`,
    /// `lib_xone=debug`).
    #[serde(default = "default_level")]
    pub level: String,
    /// Whether records are also written to the console.
    #[serde(default = "default_console")]
    pub console: bool,
    /// Shipping handler settings.
    #[serde(default)]
    pub es_handler: EsHandlerSettings,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            console: default_console(),
            es_handler: EsHandlerSettings::default(),
        }
    }
}

/// Loads the YAML configuration from `file_path`, or from `logging.yml`
/// next to the executable when no path is given.
pub fn load_settings(file_path: Option<&Path>) -> Result<LoggingSettings, LoggingConfigError> {
    let path = match file_path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    let text = fs::read_to_string(path)?;
    Ok(serde_yml::from_str(&text)?)
}

fn default_config_path() -> Result<PathBuf, LoggingConfigError> {
    let exe = env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(DEFAULT_CONFIG_FILE_NAME))
}

/// Folds the shipper connection settings into the handler block: hosts,
/// basic auth, index name, additional fields, TLS on, verification off.
pub fn apply_es_config(settings: &mut LoggingSettings, es: &EsConfig) {
    let handler = &mut settings.es_handler;
    handler.hosts = vec![EsHost {
        host: es.host.clone(),
        port: es.port,
    }];
    handler.auth_type = Some("basic_auth".to_string());
    handler.auth_details = Some(es.token.clone());
    handler.es_index_name = es.index_name.clone();
    handler.es_additional_fields = es.additional_fields.clone();
    handler.use_ssl = true;
    handler.verify_ssl = false;
}

/// Sets up logging: loads the YAML settings (falling back to defaults on
/// any error, like a missing file), folds in the shipper settings, and
/// initialises the global `tracing` subscriber. Returns the effective
/// settings. Safe to call more than once; only the first subscriber
/// installation wins.
pub fn configure_logger(es: &EsConfig, file_path: Option<&Path>) -> LoggingSettings {
    let mut settings = match load_settings(file_path) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error in logging configuration, using default config: {err}");
            LoggingSettings::default()
        }
    };
    apply_es_config(&mut settings, es);
    init_subscriber(&settings.level, settings.console);
    settings
}

fn init_subscriber(level: &str, console: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("debug"));
    let result = if console {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .try_init()
    };
    // A second installation attempt is not an error for callers.
    let _ = result;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn es_config() -> EsConfig {
        EsConfig {
            host: "logs.example.com".into(),
            port: 9200,
            token: ("svc_user".into(), "svc_pass".into()),
            index_name: "fit-xone-logs".into(),
            additional_fields: serde_json::json!({"team": "fit"}),
        }
    }

    #[test]
    fn yaml_settings_round_trip() {
        let yaml = "\
level: debug
console: false
es_handler:
  buffer_size: 250
  flush_frequency_in_sec: 5
";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{yaml}").unwrap();
        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.level, "debug");
        assert!(!settings.console);
        assert_eq!(settings.es_handler.buffer_size, 250);
        assert_eq!(settings.es_handler.flush_frequency_in_sec, 5);
    }

    #[test]
    fn shipper_settings_are_always_overwritten() {
        let mut settings = LoggingSettings::default();
        settings.es_handler.use_ssl = false;
        settings.es_handler.verify_ssl = true;

        apply_es_config(&mut settings, &es_config());

        let handler = &settings.es_handler;
        assert_eq!(
            handler.hosts,
            vec![EsHost {
                host: "logs.example.com".into(),
                port: 9200
            }]
        );
        assert_eq!(handler.auth_type.as_deref(), Some("basic_auth"));
        assert_eq!(
            handler.auth_details,
            Some(("svc_user".into(), "svc_pass".into()))
        );
        assert_eq!(handler.es_index_name, "fit-xone-logs");
        assert!(handler.use_ssl);
        assert!(!handler.verify_ssl);
    }

    #[test]
    fn malformed_yaml_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "level: [unterminated").unwrap();
        let settings = configure_logger(&es_config(), Some(file.path()));
        assert_eq!(settings.level, default_level());
        assert_eq!(settings.es_handler.es_index_name, "fit-xone-logs");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_settings(Some(Path::new("/nonexistent/logging.yml"))).unwrap_err();
        assert!(matches!(err, LoggingConfigError::IoError(_)));
    }
}
