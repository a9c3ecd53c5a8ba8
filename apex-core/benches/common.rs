use apex_core::prelude::*;

/// Builds and funds a pipeline with one symbol and `num_users` accounts,
/// each holding `funds` of both currencies.
pub fn seeded_pipeline(num_users: u64, funds: i64) -> Pipeline {
    let mut pipeline = Pipeline::new(ExchangeConfig::for_testing());
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
    for uid in 1..=num_users {
        pipeline.add_user(uid);
        pipeline.risk().adjust_balance(uid, 1, funds).unwrap();
        pipeline.risk().adjust_balance(uid, 2, funds).unwrap();
    }
    pipeline
}

pub fn gtc(order_id: u64, uid: u64, side: Side, price: Price, size: Quantity) -> Command {
    Command::PlaceOrder {
        order_id,
        uid,
        symbol_id: 1,
        side,
        kind: OrderKind::Gtc,
        price,
        size,
        reserve_bid_price: None,
    }
}
