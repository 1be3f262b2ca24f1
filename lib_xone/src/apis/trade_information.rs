//! # Trade Information Client
//!
//! Targets the `TradeInformation` API. The URL layout inserts the
//! environment's version segment: `api/TradeInformation/{version}/...`.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::configs::config_xone::{ApiKind, RootConfig};
use crate::retrieve::error::XoneError;
use crate::retrieve::xone_http::{Payload, RequestOpts, XoneClient};
use crate::tokens::manager::TokenFactory;

/// Fixed API name of the trade information service.
pub const API_NAME: &str = "TradeInformation";

/// Client for the XOne trade information service.
pub struct TradeInfoClient {
    client: XoneClient,
}

impl TradeInfoClient {
    /// Builds a client for the named environment, using its
    /// `trade_information` credential record.
    pub fn new(
        config: Arc<RootConfig>,
        env_name: &str,
        tokens: Arc<dyn TokenFactory>,
    ) -> Result<Self, XoneError> {
        let version = {
            let env = config
                .xone
                .env(env_name)
                .ok_or_else(|| XoneError::UnknownEnvironment(env_name.to_string()))?;
            env.version.clone()
        };
        let prefix = vec!["api".to_string(), API_NAME.to_string(), version];
        let client = XoneClient::with_prefix(
            API_NAME,
            ApiKind::TradeInformation,
            env_name,
            prefix,
            config,
            tokens,
        )?;
        Ok(Self { client })
    }

    /// The underlying request pipeline.
    pub fn client(&self) -> &XoneClient {
        &self.client
    }

    /// Absolute URL for the given trailing segments.
    pub fn url(&self, last: &[&str]) -> Result<Url, XoneError> {
        self.client.url(last)
    }

    /// GET returning the parsed JSON body.
    pub async fn get(&self, last: &[&str]) -> Result<Value, XoneError> {
        self.client.get(last).await
    }

    /// POST with an optional JSON body.
    pub async fn post(&self, last: &[&str], json: Option<&Value>) -> Result<Value, XoneError> {
        self.client.post(last, json).await
    }

    /// Full request entry point, for streaming or mime requests.
    pub async fn request(
        &self,
        method: Method,
        last: &[&str],
        json: Option<&Value>,
        opts: RequestOpts,
    ) -> Result<Payload, XoneError> {
        self.client.request(method, last, json, opts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::test_support::sample_config;
    use crate::tokens::manager::StaticTokenFactory;

    #[test]
    fn url_layout_uses_the_environment_version() {
        let client = TradeInfoClient::new(
            sample_config(),
            "prod",
            Arc::new(StaticTokenFactory::new("tok")),
        )
        .unwrap();
        let url = client.url(&["trades", "42"]).unwrap();
        assert_eq!(url.path(), "/api/TradeInformation/v2/trades/42");
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = TradeInfoClient::new(
            sample_config(),
            "qa",
            Arc::new(StaticTokenFactory::new("tok")),
        )
        .err()
        .unwrap();
        assert!(matches!(err, XoneError::UnknownEnvironment(_)));
    }
}
