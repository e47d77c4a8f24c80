//! Price commands: posting, invalidation, refresh and reads.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::{
    address_param, bytes_list_param, bytes_param, publish, request_time, str_param,
    string_list_param,
};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Store signed reports and validate the listed symbols.
pub async fn post_prices(state: &Arc<DaemonState>, params: &Value) -> Result {
    let messages = bytes_list_param(params, "messages")?;
    let signatures = bytes_list_param(params, "signatures")?;
    let symbols = string_list_param(params, "symbols")?;
    let now = request_time(state, params)?;

    let mut oracle = state.oracle.lock().await;
    let outcome = oracle.post_prices(&messages, &signatures, &symbols, now);
    let events = publish(state, oracle.take_events(), now);
    outcome?;

    Ok(serde_json::json!({
        "reports": messages.len(),
        "symbols": symbols.len(),
        "events": events,
    }))
}

/// Trip the reporter breaker with the reporter's signed rotate message.
pub async fn invalidate_reporter(state: &Arc<DaemonState>, params: &Value) -> Result {
    let message = bytes_param(params, "message")?;
    let signature = bytes_param(params, "signature")?;
    let now = request_time(state, params)?;

    let mut oracle = state.oracle.lock().await;
    let outcome = oracle.invalidate_reporter(&message, &signature);
    publish(state, oracle.take_events(), now);
    outcome?;

    info!("reporter invalidated over RPC");
    Ok(serde_json::json!({"reporter_invalidated": true}))
}

/// Store fresh anchor prices for anchor-only symbols.
pub async fn refresh_twap_prices(state: &Arc<DaemonState>, params: &Value) -> Result {
    let symbols = string_list_param(params, "symbols")?;
    let now = request_time(state, params)?;

    let mut oracle = state.oracle.lock().await;
    let outcome = oracle.refresh_twap_prices(&symbols, now);
    let events = publish(state, oracle.take_events(), now);
    outcome?;

    Ok(serde_json::json!({"events": events}))
}

/// Official price of a symbol.
pub async fn get_price(state: &Arc<DaemonState>, params: &Value) -> Result {
    let symbol = str_param(params, "symbol")?;
    let now = request_time(state, params)?;

    let oracle = state.oracle.lock().await;
    let price = oracle.price(symbol, now)?;
    let timestamp = oracle.official_price(symbol).map(|p| p.timestamp);

    Ok(serde_json::json!({
        "symbol": symbol,
        "price": price.to_string(),
        "timestamp": timestamp,
    }))
}

/// Consumer-scaled price for a wrapper token.
pub async fn get_underlying_price(state: &Arc<DaemonState>, params: &Value) -> Result {
    let wrapper = address_param(params, "wrapper")?;
    let now = request_time(state, params)?;

    let oracle = state.oracle.lock().await;
    let price = oracle.price_for_consumer(&wrapper, now)?;

    Ok(serde_json::json!({
        "wrapper": hex::encode(wrapper),
        "price": price.to_string(),
    }))
}
