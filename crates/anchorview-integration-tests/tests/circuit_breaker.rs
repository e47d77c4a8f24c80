//! Integration test: reporter invalidation.
//!
//! Once the reporter signs the rotate message, every later post stores the
//! anchor stamped at the window midpoint, whatever the reporter says.

use anchorview_crypto::ed25519::KeyPair;
use anchorview_integration_tests::{
    btc_reporter, eth_fixed, has_event, Harness, BTC_ANCHOR, ETH_PRICE, PERIOD, START,
};
use anchorview_oracle::OracleError;
use anchorview_types::events::{OracleEvent, UpdateOrigin};
use anchorview_types::report::{encode_rotate, PriceMessage};

fn harness() -> Harness {
    Harness::new(vec![eth_fixed(ETH_PRICE), btc_reporter()], |_| {}).expect("harness")
}

fn invalidate(h: &mut Harness) {
    let message = encode_rotate();
    let signature = h.reporter.signing_key.sign_report(&message).to_bytes();
    h.oracle
        .invalidate_reporter(&message, &signature)
        .expect("invalidate");
}

#[test]
fn invalidation_emits_event() {
    let mut h = harness();
    invalidate(&mut h);
    assert!(h.oracle.reporter_invalidated());
    assert_eq!(
        h.oracle.take_events(),
        vec![OracleEvent::ReporterInvalidated {
            reporter: h.reporter.address()
        }]
    );
}

#[test]
fn anchor_replaces_any_reported_price() {
    let mut h = harness();
    invalidate(&mut h);

    let now = START + PERIOD;
    let events = h.post(now, &[("BTC", 1)]).expect("post");

    assert!(!has_event(&events, "PriceGuarded"));
    assert!(events.contains(&OracleEvent::PriceUpdated {
        symbol: "BTC".to_string(),
        price: BTC_ANCHOR,
        timestamp: START + PERIOD / 2,
        origin: UpdateOrigin::Anchor,
    }));
}

#[test]
fn invalidation_is_permanent() {
    let mut h = harness();
    invalidate(&mut h);
    h.post(START + PERIOD, &[("BTC", 1)]).expect("post");

    // A later, perfectly reasonable report is still ignored.
    let now = START + 2 * PERIOD;
    h.post(now, &[("BTC", 41_000_000_000)]).expect("post");
    let stored = h.oracle.official_price("BTC").expect("stored");
    assert_eq!(stored.price, BTC_ANCHOR);
    assert_eq!(stored.timestamp, START + PERIOD + PERIOD / 2);

    // Invalidating again changes nothing.
    invalidate(&mut h);
    assert!(h.oracle.reporter_invalidated());
}

#[test]
fn only_the_reporter_can_invalidate() {
    let mut h = harness();
    let stranger = KeyPair::generate();
    let message = encode_rotate();
    let signature = stranger.signing_key.sign_report(&message).to_bytes();

    let err = h.oracle.invalidate_reporter(&message, &signature).unwrap_err();
    assert!(matches!(err, OracleError::Unauthorized(_)));
    assert!(!h.oracle.reporter_invalidated());
}

#[test]
fn only_the_rotate_message_invalidates() {
    let mut h = harness();
    let message = PriceMessage::prices(START, "BTC", 1).encode();
    let signature = h.reporter.signing_key.sign_report(&message).to_bytes();

    let err = h.oracle.invalidate_reporter(&message, &signature).unwrap_err();
    assert!(matches!(err, OracleError::Unauthorized(_)));

    let err = h.oracle.invalidate_reporter(&encode_rotate(), &[0u8; 12]).unwrap_err();
    assert!(matches!(err, OracleError::Unauthorized(_)));
    assert!(!h.oracle.reporter_invalidated());
    assert!(h.oracle.take_events().is_empty());
}
