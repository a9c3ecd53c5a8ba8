mod common;

use crate::common::*;
use apex_core::prelude::*;

#[test]
fn admin_commands_do_not_require_a_symbol() {
    let mut pipeline = Pipeline::for_testing();
    let result = pipeline.submit(Command::AddUser { uid: 1 }).unwrap();
    assert!(result.is_success());
    assert!(pipeline.risk().adjust_balance(1, 1, 0).is_ok());
}

#[test]
fn reset_and_noop_always_succeed() {
    let mut pipeline = Pipeline::for_testing();
    assert!(pipeline.submit(Command::Reset).unwrap().is_success());
    assert!(pipeline.submit(Command::NoOp).unwrap().is_success());
}

#[test]
fn unsupported_admin_style_dispatch_on_a_symbol_scoped_command_is_unreachable() {
    // OrderBookRequest always routes through the matching stage rather than
    // dispatch_admin since it carries a symbol_id; requesting an unknown
    // symbol's book is a matching-stage UnknownSymbol rejection, not an
    // UnsupportedCommand.
    let mut pipeline = Pipeline::for_testing();
    let result = pipeline
        .submit(Command::OrderBookRequest {
            symbol_id: 42,
            depth: 10,
        })
        .unwrap();
    assert!(matches!(
        result,
        CommandResult::Rejected(apex_core::error::RejectReason::UnknownSymbol, _)
    ));
}

#[test]
fn result_of_reads_back_a_published_slot() {
    let mut pipeline = funded_pipeline(1_000);
    place(&mut pipeline, 1, 1, Side::Bid, OrderKind::Gtc, 100, 10);
    assert!(pipeline.result_of(0).is_some());
}

#[test]
fn each_symbol_is_matched_independently() {
    let mut pipeline = Pipeline::for_testing();
    pipeline.add_symbol(sample_spec(1));
    pipeline.add_symbol(sample_spec(2));
    pipeline.add_user(1);
    pipeline.risk().adjust_balance(1, 2, 10_000).unwrap();

    pipeline
        .submit(Command::PlaceOrder {
            order_id: 1,
            uid: 1,
            symbol_id: 1,
            side: Side::Bid,
            kind: OrderKind::Gtc,
            price: 100,
            size: 10,
            reserve_bid_price: None,
        })
        .unwrap();

    let snapshot = pipeline
        .submit(Command::OrderBookRequest {
            symbol_id: 2,
            depth: 10,
        })
        .unwrap();
    match snapshot {
        CommandResult::BookSnapshot(s) => assert!(s.bids.is_empty()),
        other => panic!("expected an empty book snapshot, got {other:?}"),
    }
}
