use apex_core::journal::{FileSerializationProcessor, SerializationProcessor};
use apex_core::prelude::*;
use tempfile::tempdir;

#[test]
fn a_pipeline_backed_by_a_file_journal_replays_every_command() {
    let dir = tempdir().unwrap();
    let journal = Box::new(FileSerializationProcessor::new(dir.path()).unwrap());
    journal.enable_journaling(true);

    let mut pipeline = Pipeline::new(ExchangeConfig::for_testing()).with_journal(journal);
    pipeline.add_symbol(SymbolSpec {
        symbol_id: 1,
        symbol_type: SymbolType::CurrencyExchangePair,
        base_currency: 1,
        quote_currency: 2,
        base_scale: 1,
        quote_scale: 1,
        margin_buy: 0,
        margin_sell: 0,
        taker_fee: 0,
        maker_fee: 0,
    });
    pipeline.add_user(1);
    pipeline.risk().adjust_balance(1, 2, 1_000).unwrap();

    pipeline
        .submit(Command::PlaceOrder {
            order_id: 1,
            uid: 1,
            symbol_id: 1,
            side: Side::Bid,
            kind: OrderKind::Gtc,
            price: 100,
            size: 5,
            reserve_bid_price: None,
        })
        .unwrap();

    let processor = FileSerializationProcessor::new(dir.path()).unwrap();
    let mut replayed = Vec::new();
    processor
        .replay_journal_full(-1, &mut |seq, command| replayed.push((seq, command.clone())))
        .unwrap();

    assert_eq!(replayed.len(), 1);
    match &replayed[0].1 {
        Command::PlaceOrder { order_id, size, .. } => {
            assert_eq!(*order_id, 1);
            assert_eq!(*size, 5);
        }
        other => panic!("expected PlaceOrder, got {other:?}"),
    }
}

#[test]
fn journaling_defaults_to_off_for_the_in_memory_processor() {
    let mut pipeline = Pipeline::for_testing();
    pipeline.add_symbol(SymbolSpec {
        symbol_id: 1,
        symbol_type: SymbolType::CurrencyExchangePair,
        base_currency: 1,
        quote_currency: 2,
        base_scale: 1,
        quote_scale: 1,
        margin_buy: 0,
        margin_sell: 0,
        taker_fee: 0,
        maker_fee: 0,
    });
    pipeline.add_user(1);
    pipeline.risk().adjust_balance(1, 2, 1_000).unwrap();
    let result = pipeline
        .submit(Command::PlaceOrder {
            order_id: 1,
            uid: 1,
            symbol_id: 1,
            side: Side::Bid,
            kind: OrderKind::Gtc,
            price: 100,
            size: 5,
            reserve_bid_price: None,
        })
        .unwrap();
    assert!(result.is_success());
}

#[test]
fn can_load_from_snapshot_fails_closed_on_a_missing_file_backed_snapshot() {
    use apex_core::journal::can_load_from_snapshot;

    let dir = tempdir().unwrap();
    let processor = FileSerializationProcessor::new(dir.path()).unwrap();
    let err = can_load_from_snapshot(&processor, 7, true).unwrap_err();
    assert!(matches!(
        err,
        apex_core::error::JournalError::SnapshotNotFound { snapshot_id: 7 }
    ));
}
