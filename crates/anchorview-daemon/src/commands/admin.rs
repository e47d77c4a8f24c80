//! Administration commands.
//!
//! Writes are authenticated by signature: `payload` is a JSON document
//! carrying an `expires` timestamp, `signature` is the caller's recoverable
//! signature over the payload bytes. The recovered signer is the caller.

use std::sync::Arc;

use anchorview_oracle::reporter::{Ed25519Recovery, SignatureRecovery};
use anchorview_types::token::TokenConfigEntry;
use anchorview_types::{fmt_address, Address};
use serde_json::Value;
use tracing::info;

use super::{address_param, bytes_param, publish, request_time, str_param};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

struct SignedRequest {
    caller: Address,
    body: Value,
}

fn authenticate(params: &Value, now: u64) -> std::result::Result<SignedRequest, RpcError> {
    let payload = str_param(params, "payload")?;
    let signature = bytes_param(params, "signature")?;
    let caller = Ed25519Recovery.recover(payload.as_bytes(), &signature)?;

    let body: Value = serde_json::from_str(payload)
        .map_err(|e| RpcError::invalid_params(&format!("payload is not JSON: {e}")))?;
    let expires = body
        .get("expires")
        .and_then(Value::as_u64)
        .ok_or_else(|| RpcError::invalid_params("payload.expires required"))?;
    if expires < now {
        return Err(RpcError::unauthorized("signed request expired"));
    }
    Ok(SignedRequest { caller, body })
}

/// Register or replace token configs as one batch.
pub async fn register_configs(state: &Arc<DaemonState>, params: &Value) -> Result {
    let now = request_time(state, params)?;
    let request = authenticate(params, now)?;
    let configs = request
        .body
        .get("configs")
        .cloned()
        .ok_or_else(|| RpcError::invalid_params("payload.configs required"))?;
    let entries: Vec<TokenConfigEntry> = serde_json::from_value(configs)
        .map_err(|e| RpcError::invalid_params(&format!("invalid token config: {e}")))?;

    let mut oracle = state.oracle.lock().await;
    let outcome = oracle.register_configs(&request.caller, &entries, now);
    let events = publish(state, oracle.take_events(), now);
    let registrations = outcome?;

    info!(
        caller = %fmt_address(&request.caller),
        count = registrations.len(),
        "token configs registered"
    );
    let registrations: Vec<Value> = registrations
        .iter()
        .map(|r| serde_json::json!({"index": r.index, "replaced": r.replaced}))
        .collect();
    Ok(serde_json::json!({
        "registrations": registrations,
        "events": events,
    }))
}

/// Hand the admin role to another address.
pub async fn change_admin(state: &Arc<DaemonState>, params: &Value) -> Result {
    let now = request_time(state, params)?;
    let request = authenticate(params, now)?;
    let new_admin = address_param(&request.body, "new_admin")?;

    let mut oracle = state.oracle.lock().await;
    let outcome = oracle.change_admin(&request.caller, new_admin);
    publish(state, oracle.take_events(), now);
    outcome?;

    Ok(serde_json::json!({"admin": hex::encode(new_admin)}))
}

/// Look up a config by `index`, `asset`, `symbol` or `wrapper`.
pub async fn get_token_config(state: &Arc<DaemonState>, params: &Value) -> Result {
    let oracle = state.oracle.lock().await;
    let config = if let Some(index) = params.get("index") {
        let index = index
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| RpcError::invalid_params("index must be a non-negative integer"))?;
        oracle.token_config(index)?
    } else if params.get("asset").is_some() {
        oracle.token_config_by_asset(&address_param(params, "asset")?)?
    } else if params.get("wrapper").is_some() {
        oracle.token_config_by_wrapper(&address_param(params, "wrapper")?)?
    } else {
        oracle.token_config_by_symbol(str_param(params, "symbol")?)?
    };

    let entry = TokenConfigEntry::from(&config);
    Ok(serde_json::json!({
        "config": entry,
        "symbol_hash": hex::encode(config.symbol_hash),
    }))
}

pub async fn get_oracle_status(state: &Arc<DaemonState>) -> Result {
    let oracle = state.oracle.lock().await;
    let status = oracle.status();
    Ok(serde_json::json!({
        "reporter": hex::encode(status.reporter),
        "admin": hex::encode(status.admin),
        "reporter_invalidated": status.reporter_invalidated,
        "public_mode": status.public_mode,
        "config_count": status.config_count,
        "anchor_period": status.anchor_period,
        "lower_bound": status.bounds.lower().to_string(),
        "upper_bound": status.bounds.upper().to_string(),
        "max_staleness": status.max_staleness,
        "events_emitted": state.event_bus.sequence(),
    }))
}

#[cfg(test)]
mod tests {
    use anchorview_crypto::ed25519::KeyPair;
    use anchorview_oracle::fixed_point::Accumulator;
    use anchorview_oracle::market::MarketSnapshot;
    use anchorview_types::token::{AnchorKind, PriceSourceKind};

    use super::*;
    use crate::commands::testing::{test_state, PERIOD, START};

    const BTC: Address = [0xb1; 20];
    const BTC_MARKET: Address = [0x02; 20];

    fn btc_entry() -> TokenConfigEntry {
        TokenConfigEntry {
            asset: BTC,
            wrapper: None,
            symbol: "BTC".to_string(),
            base_unit: 100_000_000,
            price_source: PriceSourceKind::Reporter,
            fixed_price: 0,
            anchor_market: Some(BTC_MARKET),
            anchor_reversed: false,
            anchor_kind: AnchorKind::Cumulative,
        }
    }

    fn signed(signer: &KeyPair, body: Value) -> Value {
        let payload = body.to_string();
        let signature = signer.signing_key.sign_report(payload.as_bytes()).to_hex();
        serde_json::json!({"payload": payload, "signature": signature, "now": START})
    }

    fn seed_btc_market(state: &DaemonState) {
        state.market.set_snapshot(
            BTC_MARKET,
            MarketSnapshot {
                cumulative0: Accumulator::ZERO,
                cumulative1: Accumulator::ZERO,
                reserve0: 10_000_000_000,
                reserve1: 2_000_000_000_000_000_000_000,
                last_update: START,
            },
        )
        .expect("set");
    }

    #[tokio::test]
    async fn test_register_by_admin() {
        let (state, fixture) = test_state();
        seed_btc_market(&state);
        let body = serde_json::json!({"configs": [btc_entry()], "expires": START + PERIOD});

        let result = register_configs(&state, &signed(&fixture.admin, body))
            .await
            .expect("register");
        assert_eq!(result["registrations"][0]["index"], 2);
        assert_eq!(result["registrations"][0]["replaced"], false);

        let found = get_token_config(&state, &serde_json::json!({"symbol": "BTC"}))
            .await
            .expect("config");
        assert_eq!(found["config"]["base_unit"], "100000000");
        assert_eq!(found["config"]["asset"], hex::encode(BTC));
        assert!(state.oracle.lock().await.window("BTC").is_some());
    }

    #[tokio::test]
    async fn test_register_requires_admin_signature() {
        let (state, _fixture) = test_state();
        seed_btc_market(&state);
        let stranger = KeyPair::generate();
        let body = serde_json::json!({"configs": [btc_entry()], "expires": START + PERIOD});

        let err = register_configs(&state, &signed(&stranger, body)).await.unwrap_err();
        assert_eq!(err.code, -32020);
        assert_eq!(state.oracle.lock().await.status().config_count, 2);
    }

    #[tokio::test]
    async fn test_expired_request_rejected() {
        let (state, fixture) = test_state();
        seed_btc_market(&state);
        let body = serde_json::json!({"configs": [btc_entry()], "expires": START - 1});
        let err = register_configs(&state, &signed(&fixture.admin, body)).await.unwrap_err();
        assert_eq!(err.code, -32020);
    }

    #[tokio::test]
    async fn test_tampered_payload_rejected() {
        let (state, fixture) = test_state();
        seed_btc_market(&state);
        let body = serde_json::json!({"configs": [btc_entry()], "expires": START + PERIOD});
        let mut params = signed(&fixture.admin, body);
        params["payload"] = Value::String(
            serde_json::json!({"configs": [], "expires": START + PERIOD}).to_string(),
        );
        let err = register_configs(&state, &params).await.unwrap_err();
        assert_eq!(err.code, -32020);
    }

    #[tokio::test]
    async fn test_change_admin() {
        let (state, fixture) = test_state();
        let successor = KeyPair::generate();
        let body = serde_json::json!({
            "new_admin": hex::encode(successor.address()),
            "expires": START + 60,
        });
        change_admin(&state, &signed(&fixture.admin, body.clone()))
            .await
            .expect("change admin");
        assert_eq!(state.oracle.lock().await.admin(), successor.address());

        // The old admin has lost the role.
        let err = change_admin(&state, &signed(&fixture.admin, body)).await.unwrap_err();
        assert_eq!(err.code, -32020);
    }

    #[tokio::test]
    async fn test_get_token_config_lookups() {
        let (state, _fixture) = test_state();
        let by_index = get_token_config(&state, &serde_json::json!({"index": 1}))
            .await
            .expect("index");
        assert_eq!(by_index["config"]["symbol"], "USDC");

        let err = get_token_config(&state, &serde_json::json!({"index": 9}))
            .await
            .unwrap_err();
        assert_eq!(err.code, -32012);

        let err = get_token_config(&state, &serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn test_status() {
        let (state, fixture) = test_state();
        let status = get_oracle_status(&state).await.expect("status");
        assert_eq!(status["reporter"], hex::encode(fixture.reporter.address()));
        assert_eq!(status["config_count"], 2);
        assert_eq!(status["anchor_period"], PERIOD);
        assert_eq!(status["lower_bound"], "800000000000000000");
        assert_eq!(status["upper_bound"], "1200000000000000000");
    }
}
