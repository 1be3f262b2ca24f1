//! # XOne Request Pipeline
//!
//! An asynchronous API client wrapper around `reqwest` for the XOne
//! backend services. It builds URLs from the environment endpoint and a
//! per-client segment prefix, attaches JSON and auth headers, and retries
//! failed attempts with linear backoff and a growing per-attempt timeout.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use reqwest::{Method, Response};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::configs::config_xone::{ApiKind, RootConfig, XoneEnv};
use crate::retrieve::error::{check_response, XoneError};
use crate::tokens::manager::{ensure_token_manager, TokenFactory};

/// Joins path segments onto a base URL POSIX-style, preserving the base's
/// query string and fragment. Segments are joined structurally; no
/// segment may itself contain `/`.
pub fn url_join(base: &str, segments: &[&str]) -> Result<Url, XoneError> {
    let mut url = Url::parse(base)?;
    let mut path = url.path().to_string();
    if path.is_empty() {
        path.push('/');
    }
    for segment in segments {
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(segment);
    }
    url.set_path(&path);
    Ok(url)
}

/// Outcome of a successful request: the parsed JSON body, or the raw
/// response handle when streaming was requested.
#[derive(Debug)]
pub enum Payload {
    /// Parsed JSON body.
    Json(Value),
    /// Raw response handle, body not yet consumed.
    Stream(Response),
}

impl Payload {
    /// The parsed JSON body, parsing the raw handle if necessary.
    pub async fn into_json(self) -> Result<Value, XoneError> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Stream(resp) => Ok(resp.json().await?),
        }
    }

    /// The raw response handle.
    pub fn into_stream(self) -> Result<Response, XoneError> {
        match self {
            Payload::Stream(resp) => Ok(resp),
            Payload::Json(_) => Err(XoneError::NotStreamed),
        }
    }
}

/// Per-request options. `is_mime` suppresses the JSON content headers for
/// binary/multipart requests; `stream` returns the raw response handle
/// instead of parsing the body; `query` adds query parameters.
#[derive(Debug, Default, Clone)]
pub struct RequestOpts {
    /// Return the raw response instead of parsing JSON.
    pub stream: bool,
    /// Skip the JSON `Content-Type`/`Accept` headers.
    pub is_mime: bool,
    /// Extra query parameters appended to the URL.
    pub query: Vec<(String, String)>,
}

/// Delay before the next attempt: `0.5 * count` seconds.
fn backoff_delay(count: i64) -> Duration {
    Duration::from_millis(500u64.saturating_mul(count.max(0) as u64))
}

/// Timeout for the next attempt: grows by `5 * count` seconds.
fn widened_timeout(timeout_secs: u64, count: i64) -> u64 {
    timeout_secs.saturating_add(5u64.saturating_mul(count.max(0) as u64))
}

/// # XOne Client
///
/// The request pipeline shared by all named service clients. Holds the
/// loaded configuration, the environment name, the credential-record
/// selector, the URL segment prefix, a pooled HTTP client, and the
/// factory for the lazily-created token manager.
pub struct XoneClient {
    api_name: String,
    api_kind: ApiKind,
    env_name: String,
    url_prefix: Vec<String>,
    config: Arc<RootConfig>,
    http: reqwest::Client,
    tokens: Arc<dyn TokenFactory>,
}

impl XoneClient {
    /// Creates a client with the generic URL layout
    /// `{endpoint}/{xone_env}/{api_name}/rest/...`.
    ///
    /// # Errors
    /// Fails when `env_name` is not a configured environment or the HTTP
    /// client cannot be constructed.
    pub fn new(
        api_name: &str,
        api_kind: ApiKind,
        env_name: &str,
        config: Arc<RootConfig>,
        tokens: Arc<dyn TokenFactory>,
    ) -> Result<Self, XoneError> {
        let prefix = {
            let env = lookup_env(&config, env_name)?;
            vec![env.xone_env.clone(), api_name.to_string(), "rest".to_string()]
        };
        Self::with_prefix(api_name, api_kind, env_name, prefix, config, tokens)
    }

    /// Creates a client with an explicit URL segment prefix between the
    /// endpoint and the caller-supplied trailing segments. Used by the
    /// named service clients to fix their URL layouts.
    pub fn with_prefix(
        api_name: &str,
        api_kind: ApiKind,
        env_name: &str,
        url_prefix: Vec<String>,
        config: Arc<RootConfig>,
        tokens: Arc<dyn TokenFactory>,
    ) -> Result<Self, XoneError> {
        lookup_env(&config, env_name)?;

        // Certificate verification is disabled on purpose: the internal
        // endpoints present certificates the process trust store does not
        // carry.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            api_name: api_name.to_string(),
            api_kind,
            env_name: env_name.to_string(),
            url_prefix,
            config,
            http,
            tokens,
        })
    }

    /// The fixed API name this client targets.
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    /// The environment descriptor this client operates against.
    pub fn env(&self) -> Result<&XoneEnv, XoneError> {
        lookup_env(&self.config, &self.env_name)
    }

    /// Builds the absolute URL for the given trailing path segments.
    pub fn url(&self, last: &[&str]) -> Result<Url, XoneError> {
        let env = self.env()?;
        let mut segments: Vec<&str> = self.url_prefix.iter().map(String::as_str).collect();
        segments.extend_from_slice(last);
        url_join(&env.endpoint, &segments)
    }

    /// Builds the header set for one attempt.
    ///
    /// JSON `Content-Type`/`Accept` unless `is_mime`; `Authorization:
    /// Bearer` iff the environment names an auth server (creating the
    /// credential record's token manager on first use); `Origin` when the
    /// record carries one.
    pub fn headers(&self, is_mime: bool) -> Result<HeaderMap, XoneError> {
        let env = self.env()?;
        let api = env.api(self.api_kind);
        let mut headers = HeaderMap::new();

        if !is_mime {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }

        match env.auth_server() {
            Some(server) => {
                let mgr = ensure_token_manager(api, env, server, self.tokens.as_ref())?;
                let token = mgr.token_value()?;
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {token}"))?,
                );
            }
            None => debug!("no auth server configured, skipping Authorization"),
        }

        if let Some(origin) = &api.origin {
            debug!(%origin, "setting Origin");
            headers.insert(ORIGIN, HeaderValue::from_str(origin)?);
        }

        Ok(headers)
    }

    /// Performs one request with retries.
    ///
    /// Makes up to `max_retries + 1` attempts. Every attempt failure is
    /// retried the same way, 403/404 included; after each one the loop
    /// sleeps `0.5 * count` seconds and widens the next attempt's timeout
    /// by `5 * count` seconds. When all attempts fail, the returned error
    /// wraps the method, the URL and the last failure's message.
    pub async fn request(
        &self,
        method: Method,
        last: &[&str],
        json: Option<&Value>,
        opts: RequestOpts,
    ) -> Result<Payload, XoneError> {
        let url = self.url(last)?;
        let mut count: i64 = 0;
        let mut error: Option<XoneError> = None;
        let mut timeout_secs = self.config.timeout;

        while count <= self.config.max_retries {
            match self
                .attempt(&method, url.clone(), json, &opts, timeout_secs)
                .await
            {
                Ok(payload) => return Ok(payload),
                Err(exc) => {
                    count += 1;
                    warn!(attempt = count, %method, %url, error = %exc, "request attempt failed");
                    sleep(backoff_delay(count)).await;
                    timeout_secs = widened_timeout(timeout_secs, count);
                    error = Some(exc);
                }
            }
        }

        Err(match error {
            Some(err) => XoneError::Failed {
                method: method.to_string(),
                url: url.to_string(),
                message: err.to_string(),
            },
            None => XoneError::FailedWithoutError {
                method: method.to_string(),
                url: url.to_string(),
            },
        })
    }

    /// One attempt: headers, call, classification, body handling.
    async fn attempt(
        &self,
        method: &Method,
        url: Url,
        json: Option<&Value>,
        opts: &RequestOpts,
        timeout_secs: u64,
    ) -> Result<Payload, XoneError> {
        let headers = self.headers(opts.is_mime)?;
        let mut req = self
            .http
            .request(method.clone(), url)
            .headers(headers)
            .timeout(Duration::from_secs(timeout_secs));
        if !opts.query.is_empty() {
            req = req.query(&opts.query);
        }
        if let Some(body) = json {
            req = req.json(body);
        }

        let resp = check_response(req.send().await?).await?;
        if opts.stream {
            Ok(Payload::Stream(resp))
        } else {
            Ok(Payload::Json(resp.json().await?))
        }
    }

    /// GET returning the parsed JSON body.
    pub async fn get(&self, last: &[&str]) -> Result<Value, XoneError> {
        self.request(Method::GET, last, None, RequestOpts::default())
            .await?
            .into_json()
            .await
    }

    /// GET returning the raw response handle.
    pub async fn get_stream(&self, last: &[&str]) -> Result<Response, XoneError> {
        let opts = RequestOpts {
            stream: true,
            ..RequestOpts::default()
        };
        self.request(Method::GET, last, None, opts)
            .await?
            .into_stream()
    }

    /// POST with an optional JSON body, returning the parsed JSON body.
    pub async fn post(&self, last: &[&str], json: Option<&Value>) -> Result<Value, XoneError> {
        self.request(Method::POST, last, json, RequestOpts::default())
            .await?
            .into_json()
            .await
    }
}

fn lookup_env<'a>(config: &'a RootConfig, name: &str) -> Result<&'a XoneEnv, XoneError> {
    config
        .xone
        .env(name)
        .ok_or_else(|| XoneError::UnknownEnvironment(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::manager::StaticTokenFactory;

    fn sample_config(sgconnect_env: Option<&str>) -> Arc<RootConfig> {
        let env = serde_json::json!({
            "endpoint": "https://host.example.com/base?x=1",
            "xone_env": "prod",
            "version": "v2",
            "sgconnect_env": sgconnect_env,
            "trade_information": { "scope": "api.trade.v1" },
            "csa_information": { "scope": "api.csa.v1", "origin": "https://xone.example.com" },
            "pricing_model": { "scope": "api.pim.v1" }
        });
        Arc::new(
            serde_json::from_value(serde_json::json!({
                "xone": {
                    "prod": env.clone(),
                    "uat": env.clone(),
                    "prebeta": env.clone(),
                    "yesterday": env
                }
            }))
            .unwrap(),
        )
    }

    fn client(config: Arc<RootConfig>, kind: ApiKind) -> XoneClient {
        XoneClient::new(
            "Foo",
            kind,
            "prod",
            config,
            Arc::new(StaticTokenFactory::new("tok")),
        )
        .unwrap()
    }

    #[test]
    fn url_join_preserves_query_and_fragment() {
        let url = url_join("https://host/base?x=1", &["prod", "Foo", "a", "b"]).unwrap();
        assert_eq!(url.path(), "/base/prod/Foo/a/b");
        assert_eq!(url.query(), Some("x=1"));

        let url = url_join("https://host/base?x=1#frag", &["a"]).unwrap();
        assert_eq!(url.as_str(), "https://host/base/a?x=1#frag");
    }

    #[test]
    fn url_join_handles_bare_host() {
        let url = url_join("https://host", &["api", "Csa", "v1"]).unwrap();
        assert_eq!(url.path(), "/api/Csa/v1");
    }

    #[test]
    fn generic_layout_inserts_env_api_and_rest() {
        let c = client(sample_config(None), ApiKind::TradeInformation);
        let url = c.url(&["a", "b"]).unwrap();
        assert_eq!(url.path(), "/base/prod/Foo/rest/a/b");
        assert_eq!(url.query(), Some("x=1"));
    }

    #[test]
    fn unknown_environment_is_rejected_at_construction() {
        let err = XoneClient::new(
            "Foo",
            ApiKind::TradeInformation,
            "staging",
            sample_config(None),
            Arc::new(StaticTokenFactory::new("tok")),
        )
        .err()
        .unwrap();
        assert!(matches!(err, XoneError::UnknownEnvironment(_)));
    }

    #[test]
    fn headers_without_auth_server_have_no_authorization() {
        let c = client(sample_config(None), ApiKind::TradeInformation);
        let headers = c.headers(false).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn headers_with_auth_server_carry_bearer_token() {
        let c = client(sample_config(Some("prd")), ApiKind::TradeInformation);
        let headers = c.headers(false).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
    }

    #[test]
    fn mime_headers_skip_json_content_type() {
        let c = client(sample_config(None), ApiKind::TradeInformation);
        let headers = c.headers(true).unwrap();
        assert!(headers.get(CONTENT_TYPE).is_none());
        assert!(headers.get(ACCEPT).is_none());
    }

    #[test]
    fn origin_header_comes_from_the_credential_record() {
        let c = client(sample_config(None), ApiKind::CsaInformation);
        let headers = c.headers(false).unwrap();
        assert_eq!(headers.get(ORIGIN).unwrap(), "https://xone.example.com");

        let c = client(sample_config(None), ApiKind::PricingModel);
        assert!(c.headers(false).unwrap().get(ORIGIN).is_none());
    }

    #[test]
    fn backoff_is_linear_in_the_attempt_count() {
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3), Duration::from_millis(1500));
    }

    #[test]
    fn timeout_widens_by_five_seconds_per_count() {
        // Growth is cumulative: 60 -> 65 -> 75 -> 90.
        assert_eq!(widened_timeout(60, 1), 65);
        assert_eq!(widened_timeout(65, 2), 75);
        assert_eq!(widened_timeout(75, 3), 90);
    }
}
