//! Integration test: config registration through the oracle.

use anchorview_crypto::blake3::symbol_hash;
use anchorview_crypto::ed25519::KeyPair;
use anchorview_integration_tests::{
    btc_reporter, eth_fixed, has_event, usdc_fixed, Harness, BTC, BTC_MARKET, BTC_WRAPPER,
    ETH_PRICE, PERIOD, START,
};
use anchorview_oracle::OracleError;
use anchorview_types::events::OracleEvent;
use anchorview_types::token::{PriceSourceKind, TokenConfigEntry};
use anchorview_types::ZERO_ADDRESS;

fn harness() -> Harness {
    Harness::new(vec![eth_fixed(ETH_PRICE), btc_reporter()], |_| {}).expect("harness")
}

fn doge() -> TokenConfigEntry {
    TokenConfigEntry {
        asset: [0xd0; 20],
        wrapper: None,
        symbol: "DOGE".to_string(),
        base_unit: 100_000_000,
        price_source: PriceSourceKind::FixedBase,
        fixed_price: 100_000,
        anchor_market: None,
        anchor_reversed: false,
        anchor_kind: Default::default(),
    }
}

#[test]
fn lookups_agree() {
    let h = harness();
    let by_index = h.oracle.token_config(1).expect("index");
    let by_asset = h.oracle.token_config_by_asset(&BTC).expect("asset");
    let by_symbol = h.oracle.token_config_by_symbol("BTC").expect("symbol");
    let by_wrapper = h.oracle.token_config_by_wrapper(&BTC_WRAPPER).expect("wrapper");

    assert_eq!(by_index, by_asset);
    assert_eq!(by_index, by_symbol);
    assert_eq!(by_index, by_wrapper);
    assert_eq!(by_index.symbol_hash, symbol_hash("BTC"));
    assert_eq!(TokenConfigEntry::from(&by_index), btc_reporter());
    assert!(matches!(h.oracle.token_config(2), Err(OracleError::NotFound(_))));
}

#[test]
fn admin_registers_batch() {
    let mut h = harness();
    let admin = h.admin.address();
    let registrations = h
        .oracle
        .register_configs(&admin, &[doge(), usdc_fixed()], START)
        .expect("register");
    assert_eq!(registrations.iter().map(|r| r.index).collect::<Vec<_>>(), vec![2, 3]);

    let events = h.oracle.take_events();
    assert_eq!(events.len(), 2);
    assert!(has_event(&events, "ConfigRegistered"));
    assert_eq!(h.oracle.price("DOGE", START).expect("price"), 100_000);
}

#[test]
fn invalid_entry_rejects_whole_batch() {
    let mut h = harness();
    let admin = h.admin.address();
    let broken = TokenConfigEntry {
        base_unit: 0,
        ..usdc_fixed()
    };

    let err = h
        .oracle
        .register_configs(&admin, &[doge(), broken], START)
        .unwrap_err();
    assert!(matches!(err, OracleError::InvalidConfig(_)));
    assert!(matches!(h.oracle.token_config_by_symbol("DOGE"), Err(OracleError::NotFound(_))));
    assert_eq!(h.oracle.status().config_count, 2);
    assert!(h.oracle.take_events().is_empty());
}

#[test]
fn anchor_presence_must_match_source() {
    let mut h = harness();
    let admin = h.admin.address();

    let unanchored = TokenConfigEntry {
        anchor_market: None,
        ..btc_reporter()
    };
    assert!(matches!(
        h.oracle.register_configs(&admin, &[unanchored], START),
        Err(OracleError::InvalidConfig(_))
    ));

    let anchored_fixed = TokenConfigEntry {
        anchor_market: Some(BTC_MARKET),
        ..doge()
    };
    assert!(matches!(
        h.oracle.register_configs(&admin, &[anchored_fixed], START),
        Err(OracleError::InvalidConfig(_))
    ));
}

#[test]
fn duplicates_conflict_without_overwrite() {
    let mut h = harness();
    let admin = h.admin.address();

    let err = h
        .oracle
        .register_configs(&admin, &[doge(), btc_reporter()], START)
        .unwrap_err();
    assert!(matches!(err, OracleError::Conflict(_)));
    assert!(h.oracle.token_config_by_symbol("DOGE").is_err());

    let same_symbol = TokenConfigEntry {
        asset: [0xb9; 20],
        wrapper: None,
        ..doge()
    };
    h.oracle.register_configs(&admin, &[doge()], START).expect("doge");
    assert!(matches!(
        h.oracle.register_configs(&admin, &[same_symbol], START),
        Err(OracleError::Conflict(_))
    ));
}

#[test]
fn overwrite_keeps_position() {
    let mut h = Harness::new(vec![eth_fixed(ETH_PRICE), btc_reporter()], |config| {
        config.allow_overwrite = true;
    })
    .expect("harness");
    let admin = h.admin.address();
    let renamed = TokenConfigEntry {
        symbol: "XBT".to_string(),
        ..btc_reporter()
    };

    let registrations = h
        .oracle
        .register_configs(&admin, &[renamed], START)
        .expect("overwrite");
    assert_eq!(registrations[0].index, 1);
    assert!(registrations[0].replaced);
    assert!(h.oracle.take_events().contains(&OracleEvent::ConfigRegistered {
        index: 1,
        symbol: "XBT".to_string(),
        asset: BTC,
        replaced: true,
    }));

    assert_eq!(h.oracle.token_config(1).expect("index").symbol, "XBT");
    assert!(h.oracle.token_config_by_symbol("BTC").is_err());
    assert!(h.oracle.window("XBT").is_some());
}

#[test]
fn fixed_source_accepts_null_market() {
    let usdc = TokenConfigEntry {
        anchor_market: Some(ZERO_ADDRESS),
        ..usdc_fixed()
    };
    let h = Harness::new(vec![eth_fixed(ETH_PRICE), usdc], |_| {}).expect("harness");
    assert_eq!(h.oracle.price("USDC", START).expect("price"), 1_000_000);
}

#[test]
fn shared_symbol_keeps_prices_apart() {
    let mut h = Harness::new(vec![eth_fixed(ETH_PRICE), btc_reporter()], |config| {
        config.unique_symbols = false;
    })
    .expect("harness");
    let admin = h.admin.address();
    let other = [0xb9; 20];
    h.oracle
        .register_configs(
            &admin,
            &[TokenConfigEntry {
                asset: other,
                wrapper: None,
                ..btc_reporter()
            }],
            START,
        )
        .expect("register");

    // The symbol resolves to the most recent registration.
    let now = START + PERIOD;
    h.post(now, &[("BTC", 41_000_000_000)]).expect("post");
    assert_eq!(h.oracle.price_by_asset(&other, now).expect("price"), 41_000_000_000);
    assert_eq!(h.oracle.window_by_asset(&other).expect("window").new.timestamp, now);

    assert!(matches!(
        h.oracle.price_for_consumer(&BTC_WRAPPER, now),
        Err(OracleError::StaleOrMissing(_))
    ));
    assert!(h.oracle.official_price_by_asset(&BTC).is_none());
    assert_eq!(h.oracle.window_by_asset(&BTC).expect("window").new.timestamp, START);
}

#[test]
fn overwrite_drops_stored_price_and_window() {
    let mut h = Harness::new(vec![eth_fixed(ETH_PRICE), btc_reporter()], |config| {
        config.allow_overwrite = true;
    })
    .expect("harness");
    let admin = h.admin.address();
    let now = START + PERIOD;
    h.post(now, &[("BTC", 41_000_000_000)]).expect("post");

    let renamed = TokenConfigEntry {
        symbol: "XBT".to_string(),
        ..btc_reporter()
    };
    h.oracle.register_configs(&admin, &[renamed], now).expect("rename");
    assert!(matches!(h.oracle.price("XBT", now), Err(OracleError::StaleOrMissing(_))));
    let window = h.oracle.window("XBT").expect("window");
    assert_eq!(window.old.timestamp, now);
    assert_eq!(window.new.timestamp, now);

    // A newcomer taking over the freed symbol starts without a price.
    let newcomer = TokenConfigEntry {
        asset: [0xb9; 20],
        wrapper: None,
        ..btc_reporter()
    };
    h.oracle.register_configs(&admin, &[newcomer], now).expect("newcomer");
    assert!(matches!(h.oracle.price("BTC", now), Err(OracleError::StaleOrMissing(_))));
}

#[test]
fn only_admin_registers_on_private_oracle() {
    let mut h = harness();
    let stranger = KeyPair::generate();
    let err = h
        .oracle
        .register_configs(&stranger.address(), &[doge()], START)
        .unwrap_err();
    assert!(matches!(err, OracleError::Unauthorized(_)));
}

#[test]
fn admin_handover() {
    let mut h = harness();
    let old_admin = h.admin.address();
    let successor = KeyPair::generate();

    h.oracle
        .change_admin(&old_admin, successor.address())
        .expect("change admin");
    assert_eq!(h.oracle.admin(), successor.address());
    assert!(matches!(
        h.oracle.register_configs(&old_admin, &[doge()], START),
        Err(OracleError::Unauthorized(_))
    ));
    h.oracle
        .register_configs(&successor.address(), &[doge()], START)
        .expect("register");
}

#[test]
fn invalid_initial_config_fails_construction() {
    let broken = TokenConfigEntry {
        symbol: String::new(),
        ..doge()
    };
    assert!(matches!(
        Harness::new(vec![eth_fixed(ETH_PRICE), broken], |_| {}),
        Err(OracleError::InvalidConfig(_))
    ));
}

#[test]
fn entries_register_from_json() {
    let mut h = harness();
    let admin = h.admin.address();
    let entries: Vec<TokenConfigEntry> = serde_json::from_value(serde_json::json!([{
        "asset": hex::encode([0xd0; 20]),
        "wrapper": null,
        "symbol": "DOGE",
        "base_unit": "100000000",
        "price_source": "fixed_base",
        "fixed_price": "100000",
        "anchor_market": null,
    }]))
    .expect("entries");
    assert_eq!(entries, vec![doge()]);

    h.oracle.register_configs(&admin, &entries, START).expect("register");
    let stored = TokenConfigEntry::from(&h.oracle.token_config(2).expect("index"));
    let json = serde_json::to_value(&stored).expect("json");
    assert_eq!(json["base_unit"], "100000000");
    assert_eq!(json["asset"], hex::encode([0xd0; 20]));
}
