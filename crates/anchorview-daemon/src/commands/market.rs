//! Market feed commands.
//!
//! Whoever watches the real pools feeds their state in here. A full snapshot
//! carries both cumulatives; a reserve-only update advances the stored
//! accumulators at the old reserves up to `now` first.

use std::sync::Arc;

use anchorview_oracle::market::{MarketSnapshot, MarketSource};
use serde_json::Value;
use tracing::debug;

use super::{address_param, request_time, str_param, u128_param};
use crate::config::parse_accumulator;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Install or advance a market snapshot.
pub async fn submit_market_snapshot(state: &Arc<DaemonState>, params: &Value) -> Result {
    let market = address_param(params, "market")?;
    let reserve0 = u128_param(params, "reserve0")?;
    let reserve1 = u128_param(params, "reserve1")?;
    let now = request_time(state, params)?;

    let has_cumulatives = params.get("cumulative0").is_some() || params.get("cumulative1").is_some();
    if has_cumulatives {
        let parse = |key: &str| {
            parse_accumulator(str_param(params, key)?)
                .map_err(|e| RpcError::invalid_params(&e.to_string()))
        };
        let snapshot = MarketSnapshot {
            cumulative0: parse("cumulative0")?,
            cumulative1: parse("cumulative1")?,
            reserve0,
            reserve1,
            last_update: params
                .get("last_update")
                .and_then(Value::as_u64)
                .unwrap_or(now),
        };
        state.market.set_snapshot(market, snapshot)?;
    } else {
        state.market.advance(&market, now, Some((reserve0, reserve1)))?;
    }

    let snapshot = state.market.snapshot(&market)?;
    debug!(
        market = %hex::encode(market),
        last_update = snapshot.last_update,
        "market snapshot accepted"
    );
    Ok(serde_json::json!({
        "market": hex::encode(market),
        "cumulative0": snapshot.cumulative0.value().to_string(),
        "cumulative1": snapshot.cumulative1.value().to_string(),
        "last_update": snapshot.last_update,
    }))
}

/// Current anchor window of a symbol.
pub async fn get_anchor_window(state: &Arc<DaemonState>, params: &Value) -> Result {
    let symbol = str_param(params, "symbol")?;
    let oracle = state.oracle.lock().await;
    let window = oracle.window(symbol).ok_or_else(|| {
        RpcError::from(anchorview_oracle::OracleError::NotFound(format!(
            "no anchor window for {symbol}"
        )))
    })?;
    Ok(serde_json::json!({
        "symbol": symbol,
        "old_timestamp": window.old.timestamp,
        "old_cumulative": window.old.acc.value().to_string(),
        "new_timestamp": window.new.timestamp,
        "new_cumulative": window.new.acc.value().to_string(),
    }))
}
