//! Wire-level scenarios: XML documents in, XML documents out
//!
//! Fill and cancel timestamps come from the wall clock, so assertions on
//! bodies that carry a `time` attribute match on the stable prefix
//! rather than the whole element.

use std::sync::Arc;

use exchange_core::Exchange;
use rust_decimal::Decimal;
use types::ids::{AccountId, Symbol};
use wire::handler::RequestHandler;

fn harness() -> (Arc<Exchange>, RequestHandler) {
    let exchange = Arc::new(Exchange::new());
    let handler = RequestHandler::new(Arc::clone(&exchange));
    (exchange, handler)
}

/// Account and symbol creation, a resting sell, and an open-status query.
#[test]
fn test_create_sell_query_round_trip() {
    let (_, handler) = harness();

    let created = handler.process(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<create>
  <account id="123456" balance="1000"/>
  <symbol sym="SPY">
    <account id="123456">100000</account>
  </symbol>
</create>"#,
    );
    assert_eq!(
        created,
        concat!(
            "<results>",
            r#"<created id="123456"/>"#,
            r#"<created sym="SPY" id="123456"/>"#,
            "</results>"
        )
    );

    let opened = handler.process(
        r#"<transactions id="123456"><order sym="SPY" amount="-100" limit="145.67"/></transactions>"#,
    );
    assert_eq!(
        opened,
        r#"<results><opened sym="SPY" amount="-100" limit="145.67" id="1"/></results>"#
    );

    let status = handler.process(r#"<transactions id="123456"><query id="1"/></transactions>"#);
    assert_eq!(
        status,
        r#"<results><status id="1"><open shares="100"/></status></results>"#
    );
}

/// A buy whose reservation exceeds the balance is rejected with nothing
/// registered and nothing debited.
#[test]
fn test_buy_beyond_balance_rejected() {
    let (exchange, handler) = harness();
    handler.process(r#"<create><account id="7" balance="100"/></create>"#);

    let out = handler
        .process(r#"<transactions id="7"><order sym="X" amount="10" limit="20"/></transactions>"#);
    assert_eq!(
        out,
        concat!(
            "<results>",
            r#"<error sym="X" amount="10" limit="20">Insufficient funds: required 200, available 100</error>"#,
            "</results>"
        )
    );

    assert_eq!(
        exchange.balance_of(&AccountId::new("7")),
        Some(Decimal::from(100))
    );
    // Nothing was registered.
    let query = handler.process(r#"<transactions id="7"><query id="1"/></transactions>"#);
    assert_eq!(
        query,
        r#"<results><error id="1">Order 1 does not exist</error></results>"#
    );
}

/// Partial fill at a better price, then cancel: the status shows exactly
/// one executed and one canceled element, and both refunds land.
#[test]
fn test_partial_fill_then_cancel() {
    let (exchange, handler) = harness();
    handler.process(
        r#"<create>
             <account id="1" balance="10000"/>
             <account id="2" balance="0"/>
             <symbol sym="X"><account id="2">40</account></symbol>
           </create>"#,
    );

    // Resting sell 40 @ 40, then buy 100 @ 50 fills 40 at the resting
    // price.
    handler.process(r#"<transactions id="2"><order sym="X" amount="-40" limit="40"/></transactions>"#);
    let opened = handler
        .process(r#"<transactions id="1"><order sym="X" amount="100" limit="50"/></transactions>"#);
    assert_eq!(
        opened,
        r#"<results><opened sym="X" amount="100" limit="50" id="2"/></results>"#
    );

    // Reserved 5000, consumed 1600, overpay 400 already returned.
    assert_eq!(
        exchange.balance_of(&AccountId::new("1")),
        Some(Decimal::from(10_000 - 5_000 + 400))
    );

    let canceled = handler.process(r#"<transactions id="1"><cancel id="2"/></transactions>"#);
    assert!(canceled.starts_with(r#"<results><canceled id="2">"#));
    assert!(canceled.contains(r#"<canceled shares="60" time="#));
    assert!(canceled.contains(r#"<executed shares="40" price="40" time="#));
    assert!(!canceled.contains("<open"));

    // Remainder refunded at the original limit.
    assert_eq!(
        exchange.balance_of(&AccountId::new("1")),
        Some(Decimal::from(10_000 - 1_600))
    );
    assert_eq!(
        exchange.position_of(&AccountId::new("1"), &Symbol::new("X")),
        Some(types::numeric::Quantity::from_u64(40))
    );

    // Querying the canceled order repeats the same body shape.
    let status = handler.process(r#"<transactions id="1"><query id="2"/></transactions>"#);
    assert!(status.starts_with(r#"<results><status id="2">"#));
    assert!(status.contains(r#"<canceled shares="60""#));
    assert!(status.contains(r#"<executed shares="40" price="40""#));
    assert!(!status.contains("<open"));
}

/// Unknown ids echo the queried id attribute in the error.
#[test]
fn test_unknown_order_query_and_cancel() {
    let (_, handler) = harness();
    handler.process(r#"<create><account id="1" balance="0"/></create>"#);

    let query = handler.process(r#"<transactions id="1"><query id="42"/></transactions>"#);
    assert_eq!(
        query,
        r#"<results><error id="42">Order 42 does not exist</error></results>"#
    );

    let cancel = handler.process(r#"<transactions id="1"><cancel id="42"/></transactions>"#);
    assert_eq!(
        cancel,
        r#"<results><error id="42">Order 42 does not exist</error></results>"#
    );
}

/// Sibling children keep working around a failing one, and replies come
/// back in request order.
#[test]
fn test_mixed_bundle_preserves_order_and_isolation() {
    let (_, handler) = harness();
    handler.process(
        r#"<create>
             <account id="1" balance="100000"/>
             <symbol sym="Z"><account id="1">500</account></symbol>
           </create>"#,
    );

    let out = handler.process(
        r#"<transactions id="1">
             <order sym="Z" amount="-100" limit="25"/>
             <query id="99"/>
             <order sym="Z" amount="-100000" limit="25"/>
             <query id="1"/>
           </transactions>"#,
    );

    let opened_pos = out.find(r#"<opened sym="Z" amount="-100" limit="25" id="1"/>"#).unwrap();
    let missing_pos = out.find(r#"<error id="99">Order 99 does not exist</error>"#).unwrap();
    let shares_pos = out.find(r#"<error sym="Z" amount="-100000" limit="25">"#).unwrap();
    let status_pos = out.find(r#"<status id="1"><open shares="100"/></status>"#).unwrap();
    assert!(opened_pos < missing_pos);
    assert!(missing_pos < shares_pos);
    assert!(shares_pos < status_pos);
}

/// Framed request/response cycle over an in-memory stream.
#[test]
fn test_framed_conversation() {
    let (_, handler) = harness();

    let request = r#"<create><account id="5" balance="10"/></create>"#;
    let mut wire_bytes = Vec::new();
    wire::framing::write_frame(&mut wire_bytes, request).unwrap();

    let mut reader = std::io::Cursor::new(wire_bytes);
    let frame = wire::framing::read_frame(&mut reader).unwrap().unwrap();
    let response = handler.process(&frame);

    let mut out = Vec::new();
    wire::framing::write_frame(&mut out, &response).unwrap();
    let text = String::from_utf8(out).unwrap();
    let body = r#"<results><created id="5"/></results>"#;
    assert_eq!(text, format!("{}\n{}", body.len(), body));
}
