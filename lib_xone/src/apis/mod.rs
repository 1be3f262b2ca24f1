//! # XOne Service Clients
//!
//! Thin clients for the three XOne backend services. Each one fixes a
//! target API name, picks the matching credential record from the
//! environment descriptor, and pins the URL segment prefix between the
//! endpoint and the caller's trailing segments; everything else is
//! delegated to the shared request pipeline in `retrieve`.
//!
//! ## Contained Modules:
//!
//! - **`trade_information`**: `api/TradeInformation/{version}/...`
//! - **`csa_information`**: `api/Csa/v1/...`
//! - **`pricing_model`**: `api/Pim/v1/PricingInterfaceModel/...`

/// Client for the trade information service.
pub mod trade_information;
/// Client for the CSA information service.
pub mod csa_information;
/// Client for the pricing model service.
pub mod pricing_model;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::configs::config_xone::RootConfig;

    pub(crate) fn sample_config() -> Arc<RootConfig> {
        let env = serde_json::json!({
            "endpoint": "https://xone.example.com",
            "xone_env": "prod",
            "version": "v2",
            "trade_information": { "scope": "api.trade.v1" },
            "csa_information": { "scope": "api.csa.v1" },
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
}
