mod common;

use crate::common::*;
use apex_core::prelude::*;

#[test]
fn full_fill_removes_both_resting_orders() {
    let mut pipeline = funded_pipeline(1_000);
    place(&mut pipeline, 1, 1, Side::Ask, OrderKind::Gtc, 100, 10);
    let result = place(&mut pipeline, 2, 2, Side::Bid, OrderKind::Gtc, 100, 10);
    match result {
        CommandResult::Success { events } => assert_eq!(events.len(), 1),
        other => panic!("expected a fill, got {other:?}"),
    }

    let snapshot = pipeline
        .submit(Command::OrderBookRequest {
            symbol_id: 1,
            depth: 10,
        })
        .unwrap();
    match snapshot {
        CommandResult::BookSnapshot(s) => {
            assert!(s.bids.is_empty());
            assert!(s.asks.is_empty());
        }
        other => panic!("expected a book snapshot, got {other:?}"),
    }
}

#[test]
fn resting_orders_match_in_time_priority() {
    let mut pipeline = funded_pipeline(1_000);
    place(&mut pipeline, 1, 1, Side::Ask, OrderKind::Gtc, 100, 10);
    place(&mut pipeline, 2, 1, Side::Ask, OrderKind::Gtc, 100, 10);
    place(&mut pipeline, 3, 2, Side::Bid, OrderKind::Gtc, 100, 10);

    let snapshot = pipeline
        .submit(Command::OrderBookRequest {
            symbol_id: 1,
            depth: 10,
        })
        .unwrap();
    match snapshot {
        CommandResult::BookSnapshot(s) => {
            assert_eq!(s.asks.len(), 1);
            assert_eq!(s.asks[0].total_quantity, 10);
        }
        other => panic!("expected a book snapshot, got {other:?}"),
    }
}

#[test]
fn non_crossing_orders_both_rest() {
    let mut pipeline = funded_pipeline(1_000);
    place(&mut pipeline, 1, 1, Side::Ask, OrderKind::Gtc, 105, 10);
    place(&mut pipeline, 2, 2, Side::Bid, OrderKind::Gtc, 100, 10);

    let snapshot = pipeline
        .submit(Command::OrderBookRequest {
            symbol_id: 1,
            depth: 10,
        })
        .unwrap();
    match snapshot {
        CommandResult::BookSnapshot(s) => {
            assert_eq!(s.asks.len(), 1);
            assert_eq!(s.bids.len(), 1);
        }
        other => panic!("expected a book snapshot, got {other:?}"),
    }
}

#[test]
fn large_taker_sweeps_multiple_makers() {
    let mut pipeline = funded_pipeline(1_000);
    place(&mut pipeline, 1, 1, Side::Ask, OrderKind::Gtc, 100, 5);
    place(&mut pipeline, 2, 1, Side::Ask, OrderKind::Gtc, 100, 5);
    let result = place(&mut pipeline, 3, 2, Side::Bid, OrderKind::Gtc, 100, 8);
    match result {
        CommandResult::Success { events } => assert_eq!(events.len(), 2),
        other => panic!("expected two fills, got {other:?}"),
    }

    let snapshot = pipeline
        .submit(Command::OrderBookRequest {
            symbol_id: 1,
            depth: 10,
        })
        .unwrap();
    match snapshot {
        CommandResult::BookSnapshot(s) => {
            assert_eq!(s.asks.len(), 1);
            assert_eq!(s.asks[0].total_quantity, 2);
        }
        other => panic!("expected a book snapshot, got {other:?}"),
    }
}

#[test]
fn cancelling_a_partially_filled_order_clears_the_book() {
    let mut pipeline = funded_pipeline(1_000);
    place(&mut pipeline, 1, 1, Side::Ask, OrderKind::Gtc, 100, 10);
    place(&mut pipeline, 2, 2, Side::Bid, OrderKind::Gtc, 100, 4);

    pipeline
        .submit(Command::CancelOrder {
            order_id: 1,
            uid: 1,
            symbol_id: 1,
        })
        .unwrap();

    let snapshot = pipeline
        .submit(Command::OrderBookRequest {
            symbol_id: 1,
            depth: 10,
        })
        .unwrap();
    match snapshot {
        CommandResult::BookSnapshot(s) => assert!(s.asks.is_empty()),
        other => panic!("expected a book snapshot, got {other:?}"),
    }
}
