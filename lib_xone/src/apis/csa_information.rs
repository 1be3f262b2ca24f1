//! # CSA Information Client
//!
//! Targets the `Csa` API with the fixed URL layout `api/Csa/v1/...`.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::configs::config_xone::{ApiKind, RootConfig};
use crate::retrieve::error::XoneError;
use crate::retrieve::xone_http::{Payload, RequestOpts, XoneClient};
use crate::tokens::manager::TokenFactory;

/// Fixed API name of the CSA information service.
pub const API_NAME: &str = "Csa";

/// Client for the XOne CSA information service.
pub struct CsaInfoClient {
    client: XoneClient,
}

impl CsaInfoClient {
    /// Builds a client for the named environment, using its
    /// `csa_information` credential record.
    pub fn new(
        config: Arc<RootConfig>,
        env_name: &str,
        tokens: Arc<dyn TokenFactory>,
    ) -> Result<Self, XoneError> {
        let prefix = vec!["api".to_string(), API_NAME.to_string(), "v1".to_string()];
        let client = XoneClient::with_prefix(
            API_NAME,
            ApiKind::CsaInformation,
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
    fn url_layout_is_pinned_to_v1() {
        let client = CsaInfoClient::new(
            sample_config(),
            "uat",
            Arc::new(StaticTokenFactory::new("tok")),
        )
        .unwrap();
        let url = client.url(&["agreements"]).unwrap();
        assert_eq!(url.path(), "/api/Csa/v1/agreements");
    }
}
