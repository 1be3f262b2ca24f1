//! # lib_xone
//!
//! REST client layer for the XOne backend services (trade information,
//! CSA information, pricing model) plus a message-template logging
//! wrapper. Configuration is loaded once from JSON and passed explicitly
//! to every client; bearer tokens come from an external token service
//! behind the `tokens` seam.

// Declare the modules to re-export
pub mod apis;
pub mod configs;
pub mod loggers;
pub mod retrieve;
pub mod tokens;

// Re-export the common surface
pub use apis::csa_information::CsaInfoClient;
pub use apis::pricing_model::PricingModelClient;
pub use apis::trade_information::TradeInfoClient;
pub use configs::config_xone::{ApiConfig, ApiKind, ConfigError, RootConfig, XoneConfig, XoneEnv};
pub use loggers::config::{configure_logger, EsConfig, LoggingSettings};
pub use loggers::template::{init_logger, LogStatus, LoggerWrapper};
pub use retrieve::error::{check_response, is_ok, XoneError};
pub use retrieve::xone_http::{url_join, Payload, RequestOpts, XoneClient};
pub use tokens::manager::{
    StaticTokenFactory, StaticTokenManager, TokenError, TokenFactory, TokenManager, TokenMode,
    TokenRequest,
};
