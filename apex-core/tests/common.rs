use apex_core::prelude::*;

/// A simple two-currency exchange pair used across integration tests:
/// currency 1 is the base, currency 2 is the quote, unscaled.
pub fn sample_spec(symbol_id: SymbolId) -> SymbolSpec {
    SymbolSpec {
        symbol_id,
        symbol_type: SymbolType::CurrencyExchangePair,
        base_currency: 1,
        quote_currency: 2,
        base_scale: 1,
        quote_scale: 1,
        margin_buy: 0,
        margin_sell: 0,
        taker_fee: 0,
        maker_fee: 0,
    }
}

/// A pipeline with one registered symbol and two funded users (1 and 2),
/// each holding `funds` of both currencies.
pub fn funded_pipeline(funds: i64) -> Pipeline {
    let mut pipeline = Pipeline::for_testing();
    pipeline.add_symbol(sample_spec(1));
    pipeline.add_user(1);
    pipeline.add_user(2);
    pipeline.risk().adjust_balance(1, 1, funds).unwrap();
    pipeline.risk().adjust_balance(1, 2, funds).unwrap();
    pipeline.risk().adjust_balance(2, 1, funds).unwrap();
    pipeline.risk().adjust_balance(2, 2, funds).unwrap();
    pipeline
}

pub fn place(
    pipeline: &mut Pipeline,
    order_id: u64,
    uid: u64,
    side: Side,
    kind: OrderKind,
    price: Price,
    size: Quantity,
) -> CommandResult {
    pipeline
        .submit(Command::PlaceOrder {
            order_id,
            uid,
            symbol_id: 1,
            side,
            kind,
            price,
            size,
            reserve_bid_price: None,
        })
        .unwrap()
}
