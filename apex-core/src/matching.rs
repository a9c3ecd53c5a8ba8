use crate::book::{OrderBook, WalkResult};
use crate::error::{CancelOrderError, ReduceOrderError, RejectReason, UpdateOrderError};
use crate::event::TradeEvent;
use crate::types::{Order, OrderKind, OrderStatus, Price, Quantity, Side, SymbolId};

/// Outcome of a single PLACE_ORDER / MOVE_ORDER pass: the events produced,
/// the active order's final status, and the price its collateral hold was
/// computed at (its own reserve/limit price), needed by risk
/// post-settlement to release any over-hold on a bid that fills below it.
pub struct MatchOutcome {
    pub events: Vec<TradeEvent>,
    pub status: OrderStatus,
    pub hold_price: Option<Price>,
}

/// A PLACE_ORDER failure, carrying whatever events the attempt produced
/// before it gave up (trades already matched against the book, plus a
/// REJECT for any amount that never got inserted) so risk post-settlement
/// can still release holds and credit counterparties correctly.
pub struct PlaceRejection {
    pub reason: RejectReason,
    pub events: Vec<TradeEvent>,
}

impl From<RejectReason> for PlaceRejection {
    fn from(reason: RejectReason) -> Self {
        Self {
            reason,
            events: Vec::new(),
        }
    }
}

/// Fills `taker` and `maker` against each other for `min(remaining sizes)`
/// at the maker's resting price (spec.md §4.2's maker-price rule), pushing
/// one trade event per fill. Returns the traded quantity.
fn process_fill(taker: &Order, maker: &Order, events: &mut Vec<TradeEvent>) -> Quantity {
    let traded = taker.quantity().min(maker.quantity());
    taker.quantity_fill(traded);
    maker.quantity_fill(traded);

    let taker_done = taker.quantity() == 0;
    let maker_done = maker.quantity() == 0;
    taker.update_status(if taker_done {
        OrderStatus::Filled
    } else {
        OrderStatus::PartiallyFilled
    });
    maker.update_status(if maker_done {
        OrderStatus::Filled
    } else {
        OrderStatus::PartiallyFilled
    });

    events.push(TradeEvent::trade(
        taker.symbol_id,
        maker.side,
        taker_done,
        maker.id,
        maker.user_id,
        maker_done,
        maker.price,
        traded,
    ));
    traded
}

/// True if a taker on `side` is willing to trade at `maker_price` given its
/// own limit `price` (maker makes price, taker must not cross beyond it).
fn crosses(side: Side, price: Price, maker_price: Price) -> bool {
    match side {
        Side::Bid => maker_price <= price,
        Side::Ask => maker_price >= price,
    }
}

/// Walks the opposite side of `book`, filling `taker` against resting
/// makers up to `limit_price`, mutating the book in place (fully filled
/// makers are unlinked). Returns the events produced. Shaped after a
/// `match_limit_order` walk, generalized to accept an explicit limit price
/// so it also serves FOK-BUDGET's pre-locked walk.
fn fill_against_book(book: &OrderBook, taker: &Order, limit_price: Price) -> Vec<TradeEvent> {
    let opposite = taker.side.opposite();
    let mut events = Vec::new();
    book.walk(opposite, &mut |maker| {
        if taker.quantity() == 0 {
            return WalkResult::exit();
        }
        if !crosses(taker.side, limit_price, maker.price) {
            return WalkResult::exit();
        }
        if !maker.enter_matched() {
            return WalkResult::next();
        }

        process_fill(taker, maker, &mut events);
        let maker_done = maker.is_finished() || maker.quantity() == 0;
        if maker_done {
            maker.enter_finished_from_matched();
            WalkResult::remove_and_next()
        } else {
            maker.exit_matched();
            if taker.quantity() == 0 {
                WalkResult::exit()
            } else {
                WalkResult::next()
            }
        }
    });
    events
}

/// Checks whether the opposite side of `book` can fully absorb `taker`
/// within its limit/budget without mutating anything, matching the
/// FOK-BUDGET walk in `IOrderBook::ProcessCommand`. Returns `true` if the
/// resting liquidity (at prices crossing `limit_price`) covers
/// `taker.quantity()`.
fn has_sufficient_liquidity(book: &OrderBook, taker: &Order, limit_price: Price) -> bool {
    let opposite = taker.side.opposite();
    let mut remaining = taker.quantity();
    book.walk(opposite, &mut |maker| {
        if remaining <= 0 {
            return WalkResult::exit();
        }
        if !crosses(taker.side, limit_price, maker.price) {
            return WalkResult::exit();
        }
        remaining -= maker.quantity();
        WalkResult::next()
    });
    remaining <= 0
}

/// Executes a PLACE_ORDER command against `book`. `order.quantity()` and
/// `order.price` must already be set by the caller (post risk pre-check);
/// the matching shard only sequences the book interaction.
pub fn place_order(
    book: &OrderBook,
    mut order: Order,
    now: u64,
) -> Result<MatchOutcome, PlaceRejection> {
    let hold_price = Some(order.reserve_bid_price.unwrap_or(order.price));
    match order.kind {
        OrderKind::FokBudget => {
            let limit = order.reserve_bid_price.unwrap_or(order.price);
            if !has_sufficient_liquidity(book, &order, limit) {
                order.update_status(OrderStatus::Rejected);
                let reject = TradeEvent::reject(
                    order.symbol_id,
                    order.side,
                    order.id,
                    order.user_id,
                    order.price,
                    order.quantity(),
                    order.reserve_bid_price,
                );
                return Err(PlaceRejection {
                    reason: RejectReason::InsufficientLiquidity,
                    events: vec![reject],
                });
            }
            let events = fill_against_book(book, &order, limit);
            order.update_status(OrderStatus::Filled);
            Ok(MatchOutcome {
                events,
                status: OrderStatus::Filled,
                hold_price,
            })
        }
        OrderKind::Ioc => {
            let mut events = fill_against_book(book, &order, order.price);
            let status = if order.quantity() == 0 {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };
            order.update_status(status);
            if order.quantity() > 0 {
                events.push(TradeEvent::reject(
                    order.symbol_id,
                    order.side,
                    order.id,
                    order.user_id,
                    order.price,
                    order.quantity(),
                    order.reserve_bid_price,
                ));
            }
            Ok(MatchOutcome {
                events,
                status,
                hold_price,
            })
        }
        OrderKind::Gtc => {
            let events = fill_against_book(book, &order, order.price);
            if order.quantity() == 0 {
                order.update_status(OrderStatus::Filled);
                return Ok(MatchOutcome {
                    events,
                    status: OrderStatus::Filled,
                    hold_price,
                });
            }
            let status = if order.filled_quantity() > 0 {
                OrderStatus::PartiallyFilled
            } else {
                OrderStatus::Placed
            };
            order.update_status(status);
            order.updated_at = now;

            let remaining = order.quantity();
            let unfilled = (
                order.symbol_id,
                order.side,
                order.id,
                order.user_id,
                order.price,
                order.reserve_bid_price,
            );
            match book.insert(order) {
                Ok(()) => Ok(MatchOutcome {
                    events,
                    status,
                    hold_price,
                }),
                Err(reason) => {
                    let mut events = events;
                    if remaining > 0 {
                        let (symbol_id, side, id, user_id, price, reserve_bid_price) = unfilled;
                        events.push(TradeEvent::reject(
                            symbol_id,
                            side,
                            id,
                            user_id,
                            price,
                            remaining,
                            reserve_bid_price,
                        ));
                    }
                    Err(PlaceRejection { reason, events })
                }
            }
        }
    }
}

/// Executes MOVE_ORDER: reprices a resting order, then re-crosses it
/// against the opposite side as if it were freshly placed (it has lost
/// time priority at its new price), matching spec.md §4.2.
pub fn move_order(
    book: &OrderBook,
    order_id: u64,
    new_price: Price,
    now: u64,
) -> Result<MatchOutcome, UpdateOrderError> {
    // Reprice unlinks the order from its old price level and loses its old
    // `price`, so the hold-reference price (needed if this fill turns out
    // to be a bid below its original reserve) must be read beforehand.
    let original = book.find(order_id).ok_or(UpdateOrderError::OrderNotFound)?;
    let hold_price = Some(original.reserve_bid_price.unwrap_or(original.price));

    let repriced = book.reprice(order_id, new_price, now)?;
    let events = fill_against_book(book, &repriced, repriced.price);
    if repriced.quantity() == 0 {
        repriced.update_status(OrderStatus::Filled);
        return Ok(MatchOutcome {
            events,
            status: OrderStatus::Filled,
            hold_price,
        });
    }
    let status = if repriced.filled_quantity() > 0 {
        OrderStatus::PartiallyFilled
    } else {
        OrderStatus::Placed
    };
    repriced.update_status(status);
    // Reinsert the remainder at its (possibly new) book key; it has already
    // lost time priority via `reprice`'s fresh `updated_at`.
    book.insert(repriced)
        .map_err(|_| UpdateOrderError::OrderNotModifiable)?;
    Ok(MatchOutcome {
        events,
        status,
        hold_price,
    })
}

/// Cancels a resting order, returning it alongside a `Reduce` event that
/// carries its unfilled size so risk post-settlement can release the hold
/// placed on it at PLACE_ORDER time.
pub fn cancel_order(book: &OrderBook, order_id: u64) -> Result<(Order, TradeEvent), CancelOrderError> {
    let order = book.remove(order_id)?;
    let event = TradeEvent::reduce(
        order.symbol_id,
        order.side,
        order.id,
        order.user_id,
        order.price,
        order.quantity(),
        order.reserve_bid_price,
    );
    Ok((order, event))
}

/// Shrinks a resting order's size, returning the amount released alongside
/// a `Reduce` event so risk post-settlement can release the corresponding
/// slice of the hold placed on it at PLACE_ORDER time.
pub fn reduce_order(
    book: &OrderBook,
    order_id: u64,
    amount: Quantity,
) -> Result<(Quantity, TradeEvent), ReduceOrderError> {
    let (removed, order) = book.reduce(order_id, amount)?;
    let event = TradeEvent::reduce(
        order.symbol_id,
        order.side,
        order.id,
        order.user_id,
        order.price,
        removed,
        order.reserve_bid_price,
    );
    Ok((removed, event))
}

/// Symbol-scoped matching facade bundling a single symbol's book. One
/// instance per symbol shard, matching spec.md §4.2's "no cross-symbol
/// state" invariant.
pub struct MatchingEngine {
    pub symbol_id: SymbolId,
    pub book: OrderBook,
}

impl MatchingEngine {
    pub fn new(symbol_id: SymbolId) -> Self {
        Self {
            symbol_id,
            book: OrderBook::new(),
        }
    }
}
