//! Integration test: stored prices age out at read time.

use anchorview_integration_tests::{
    btc_reporter, eth_fixed, eth_reporter, Harness, BTC_ANCHOR, BTC_WRAPPER, ETH_PRICE, PERIOD,
    START,
};
use anchorview_oracle::OracleError;

const MAX_AGE: u64 = 3600;

#[test]
fn price_is_served_up_to_the_threshold() {
    let mut h = Harness::new(vec![eth_fixed(ETH_PRICE), btc_reporter()], |config| {
        config.max_staleness = Some(MAX_AGE);
    })
    .expect("harness");
    let posted = START + PERIOD;
    h.post(posted, &[("BTC", BTC_ANCHOR as u64)]).expect("post");

    assert_eq!(h.oracle.price("BTC", posted + MAX_AGE).expect("fresh"), BTC_ANCHOR);

    let err = h.oracle.price("BTC", posted + MAX_AGE + 1).unwrap_err();
    assert!(matches!(
        err,
        OracleError::Stale {
            last_update,
            threshold: MAX_AGE,
            ..
        } if last_update == posted
    ));
    assert!(h
        .oracle
        .price_for_consumer(&BTC_WRAPPER, posted + MAX_AGE + 1)
        .is_err());

    // Fixed prices carry no timestamp.
    assert_eq!(h.oracle.price("ETH", posted + 10 * MAX_AGE).expect("eth"), ETH_PRICE);
}

#[test]
fn no_threshold_means_no_expiry() {
    let mut h = Harness::new(vec![eth_reporter()], |_| {}).expect("harness");
    let posted = START + PERIOD;
    h.post(posted, &[("ETH", ETH_PRICE as u64)]).expect("post");
    assert_eq!(h.oracle.price("ETH", posted + 365 * 86_400).expect("price"), ETH_PRICE);
}
