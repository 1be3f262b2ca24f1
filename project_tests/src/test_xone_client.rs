//! # XOne Client Live Smoke Test
//!
//! Exercises the full client stack against `httpbin.org`: URL building,
//! JSON and bearer-token headers, response classification and the retry
//! loop, with progress logged through the message-template wrapper. The
//! configuration tree is built in code; the endpoint is pointed at
//! httpbin's echo endpoints instead of a real XOne deployment.
//!
//! Run with `cargo run --bin test_xone_client` (needs network access).

use std::sync::Arc;

use lib_xone::{
    configure_logger, init_logger, ApiKind, EsConfig, LogStatus, RootConfig, StaticTokenFactory,
    TokenFactory, XoneClient, XoneError,
};

fn httpbin_config() -> anyhow::Result<Arc<RootConfig>> {
    // `anything/...` echoes the request back, which makes the headers and
    // the joined URL visible in the response body.
    let env = serde_json::json!({
        "endpoint": "https://httpbin.org",
        "xone_env": "anything",
        "version": "v1",
        "sgconnect_env": "smoke",
        "trade_information": { "scope": "api.trade.v1" },
        "csa_information": { "scope": "api.csa.v1" },
        "pricing_model": { "scope": "api.pim.v1" }
    });
    let config: RootConfig = serde_json::from_value(serde_json::json!({
        "xone": {
            "prod": env.clone(),
            "uat": env.clone(),
            "prebeta": env.clone(),
            "yesterday": env
        },
        "max_retries": 1,
        "timeout": 20
    }))?;
    Ok(Arc::new(config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // No logging.yml next to the binary, so this falls back to console
    // defaults; the shipper settings are still folded in and returned.
    let es = EsConfig {
        host: "logs.example.com".into(),
        port: 9200,
        token: ("smoke_user".into(), "smoke_pass".into()),
        index_name: "fit-xone-smoke".into(),
        additional_fields: serde_json::json!({"team": "fit"}),
    };
    let settings = configure_logger(&es, None);
    println!(
        "Logging configured: level={}, index={}",
        settings.level, settings.es_handler.es_index_name
    );

    let logger = init_logger(
        "fit_xone",
        "XoneSmoke",
        Some(serde_json::json!({"target": "httpbin.org"})),
    );
    logger.info("Setup", LogStatus::Started);

    let config = httpbin_config()?;
    let tokens: Arc<dyn TokenFactory> = Arc::new(StaticTokenFactory::new("smoke_token_123"));

    println!("--- Starting XOne client smoke tests ---");

    // 1. URL building, JSON headers and bearer injection, echoed back.
    println!("\n[Test 1] GET with bearer token ...");
    let client = XoneClient::new(
        "Xone",
        ApiKind::TradeInformation,
        "prod",
        Arc::clone(&config),
        Arc::clone(&tokens),
    )?;
    let echo = client.get(&["trades", "42"]).await?;
    println!("URL seen by server: {}", echo["url"]);
    let auth = echo["headers"]["Authorization"]
        .as_str()
        .unwrap_or_default();
    assert_eq!(auth, "Bearer smoke_token_123");
    println!("Authorization echoed: {auth}");
    logger.info("GetWithBearer", LogStatus::Ok);

    // 2. POST body round-trip.
    println!("\n[Test 2] POST with JSON body ...");
    let body = serde_json::json!({"message": "hello from lib_xone"});
    let echo = client.post(&["submit"], Some(&body)).await?;
    assert_eq!(echo["json"], body);
    println!("Body echoed: {}", echo["json"]);
    logger.info("PostJsonBody", LogStatus::Ok);

    // 3. Status classification plus retry exhaustion on 404.
    println!("\n[Test 3] 404 handling through the retry loop ...");
    let missing = XoneClient::with_prefix(
        "Status",
        ApiKind::TradeInformation,
        "prod",
        vec!["status".to_string()],
        Arc::clone(&config),
        tokens,
    )?;
    match missing.get(&["404"]).await {
        Err(err @ XoneError::Failed { .. }) => {
            assert!(err.to_string().contains("404"));
            println!("Final error as expected: {err}");
            logger.error(
                "NotFoundHandling",
                LogStatus::RanWithError,
                "XoneError::Failed",
                &err.to_string(),
            );
        }
        other => anyhow::bail!("expected a final client error, got {other:?}"),
    }

    logger.info("Smoke", LogStatus::Ok);
    println!("\n--- All smoke tests passed ---");
    Ok(())
}
