//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category. Byte
//! strings and addresses travel as hex, integers wider than 64 bits as
//! decimal strings.

pub mod admin;
pub mod market;
pub mod prices;

use anchorview_types::events::OracleEvent;
use anchorview_types::Address;
use serde_json::Value;

use crate::rpc::RpcError;
use crate::DaemonState;

type ParamResult<T> = std::result::Result<T, RpcError>;

pub(crate) fn str_param<'a>(params: &'a Value, key: &str) -> ParamResult<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))
}

pub(crate) fn decode_hex(value: &str, key: &str) -> ParamResult<Vec<u8>> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(trimmed).map_err(|_| RpcError::invalid_params(&format!("{key} must be hex")))
}

pub(crate) fn bytes_param(params: &Value, key: &str) -> ParamResult<Vec<u8>> {
    decode_hex(str_param(params, key)?, key)
}

pub(crate) fn address_param(params: &Value, key: &str) -> ParamResult<Address> {
    let bytes = bytes_param(params, key)?;
    Address::try_from(bytes.as_slice())
        .map_err(|_| RpcError::invalid_params(&format!("{key} must be 20 bytes")))
}

pub(crate) fn string_list_param(params: &Value, key: &str) -> ParamResult<Vec<String>> {
    let items = params
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be an array")))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| RpcError::invalid_params(&format!("{key} must hold strings")))
        })
        .collect()
}

pub(crate) fn bytes_list_param(params: &Value, key: &str) -> ParamResult<Vec<Vec<u8>>> {
    string_list_param(params, key)?
        .iter()
        .map(|item| decode_hex(item, key))
        .collect()
}

/// A `u128` given either as a decimal string or a JSON number.
pub(crate) fn u128_param(params: &Value, key: &str) -> ParamResult<u128> {
    match params.get(key) {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| RpcError::invalid_params(&format!("{key} must be a decimal integer"))),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be non-negative"))),
        _ => Err(RpcError::invalid_params(&format!("{key} required"))),
    }
}

/// Timestamp a request runs at: the wall clock, or `now` from the params
/// when the daemon allows overriding it.
pub(crate) fn request_time(state: &DaemonState, params: &Value) -> ParamResult<u64> {
    match params.get("now") {
        None | Some(Value::Null) => Ok(crate::unix_now()),
        Some(value) => {
            if !state.config.daemon.allow_time_override {
                return Err(RpcError::invalid_params("time override is disabled"));
            }
            value
                .as_u64()
                .ok_or_else(|| RpcError::invalid_params("now must be a unix timestamp"))
        }
    }
}

/// Broadcast drained oracle events and return them for the response body.
pub(crate) fn publish(state: &DaemonState, events: Vec<OracleEvent>, now: u64) -> Value {
    state.event_bus.emit_oracle(&events, now);
    Value::Array(
        events
            .iter()
            .map(|event| serde_json::to_value(event).unwrap_or(Value::Null))
            .collect(),
    )
}

#[cfg(test)]
pub(crate) mod testing {
    //! A daemon wired to a two-token oracle.

    use std::sync::Arc;

    use anchorview_crypto::ed25519::KeyPair;
    use anchorview_oracle::config::OracleConfig;
    use anchorview_types::report::PriceMessage;
    use anchorview_types::token::{AnchorKind, PriceSourceKind, TokenConfigEntry};
    use anchorview_types::{Address, BASE_ASSET};
    use tokio::sync::broadcast;

    use crate::config::{
        AssetFact, DaemonConfig, DaemonSettings, DirectoryConfig, MarketSeed, WrapperFact,
    };
    use crate::events::EventBus;
    use crate::DaemonState;

    pub const START: u64 = 1_700_000_000;
    pub const PERIOD: u64 = 1800;
    pub const ETH_MARKET: Address = [0x01; 20];
    pub const ETH_WRAPPER: Address = [0xe2; 20];
    pub const USDC: Address = [0xc1; 20];
    /// ETH anchor implied by the seeded reserves.
    pub const ETH_ANCHOR: u128 = 2_000_000_000;

    pub struct Fixture {
        pub reporter: KeyPair,
        pub admin: KeyPair,
    }

    impl Fixture {
        pub fn signed_price(&self, timestamp: u64, symbol: &str, value: u64) -> (String, String) {
            let message = PriceMessage::prices(timestamp, symbol, value).encode();
            let signature = self.reporter.signing_key.sign_report(&message).to_hex();
            (hex::encode(message), signature)
        }
    }

    pub fn eth_entry() -> TokenConfigEntry {
        TokenConfigEntry {
            asset: BASE_ASSET,
            wrapper: Some(ETH_WRAPPER),
            symbol: "ETH".to_string(),
            base_unit: 1_000_000_000_000_000_000,
            price_source: PriceSourceKind::Reporter,
            fixed_price: 0,
            anchor_market: Some(ETH_MARKET),
            anchor_reversed: false,
            anchor_kind: AnchorKind::Cumulative,
        }
    }

    pub fn usdc_entry() -> TokenConfigEntry {
        TokenConfigEntry {
            asset: USDC,
            wrapper: None,
            symbol: "USDC".to_string(),
            base_unit: 1_000_000,
            price_source: PriceSourceKind::FixedBase,
            fixed_price: 1_000_000,
            anchor_market: None,
            anchor_reversed: false,
            anchor_kind: AnchorKind::Cumulative,
        }
    }

    pub fn test_state() -> (Arc<DaemonState>, Fixture) {
        let fixture = Fixture {
            reporter: KeyPair::generate(),
            admin: KeyPair::generate(),
        };
        let mut oracle = OracleConfig::new(fixture.reporter.address(), fixture.admin.address());
        oracle.anchor_period = PERIOD;
        oracle.tokens = vec![eth_entry(), usdc_entry()];

        let config = DaemonConfig {
            daemon: DaemonSettings {
                allow_time_override: true,
                ..DaemonSettings::default()
            },
            oracle,
            directory: DirectoryConfig {
                assets: vec![AssetFact {
                    address: BASE_ASSET,
                    symbol: "ETH".to_string(),
                    decimals: 18,
                }],
                pairs: Vec::new(),
                wrappers: vec![WrapperFact {
                    wrapper: ETH_WRAPPER,
                    underlying: BASE_ASSET,
                }],
            },
            markets: vec![MarketSeed {
                market: ETH_MARKET,
                reserve0: 1_000_000_000_000_000_000_000,
                reserve1: 2_000_000_000_000,
                cumulative0: "0".to_string(),
                cumulative1: "0".to_string(),
                last_update: START,
            }],
        };
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = DaemonState::build(config, EventBus::new(64), shutdown_tx, START)
            .expect("build daemon state");
        (Arc::new(state), fixture)
    }
}
