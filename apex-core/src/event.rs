use crate::types::{OrderId, Price, Quantity, Side, SymbolId, UserId};

/// EventType distinguishes the kind of outcome a TradeEvent records.
#[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
pub enum EventType {
    /// A fill between the command's active order and a resting maker.
    #[default]
    Trade,
    /// A REDUCE_ORDER shrank a resting order's size.
    Reduce,
    /// An unfilled remainder was rejected (IOC/FOK-BUDGET/NSF/...).
    Reject,
    /// A binary-batch side effect (ADD_SYMBOLS / ADD_ACCOUNTS) completed.
    Binary,
}

/// TradeEvent is one node in the event chain carried on a command slot.
/// Within one command, events appear in match order (FIFO of fills as they
/// occurred), per spec.md §3.
#[derive(Debug, Clone, Default)]
pub struct TradeEvent {
    pub event_type: EventType,
    /// Multi-book routing tag (symbol the event belongs to).
    pub section: SymbolId,
    /// The order's side. For `Trade`, the resting maker's side (the taker's
    /// side is always its opposite); for `Reduce`/`Reject`, the affected
    /// order's own side, needed by risk post-settlement to recompute the
    /// hold it must release.
    pub side: Side,
    pub active_order_completed: bool,
    pub matched_order_id: OrderId,
    pub matched_order_uid: UserId,
    pub matched_order_completed: bool,
    pub price: Price,
    pub size: Quantity,
    /// Reserved bid price carried through for FOK-BUDGET reject accounting.
    pub bidder_hold_price: Option<Price>,
}

impl TradeEvent {
    pub fn trade(
        section: SymbolId,
        maker_side: Side,
        active_completed: bool,
        matched_order_id: OrderId,
        matched_order_uid: UserId,
        matched_completed: bool,
        price: Price,
        size: Quantity,
    ) -> Self {
        Self {
            event_type: EventType::Trade,
            section,
            side: maker_side,
            active_order_completed: active_completed,
            matched_order_id,
            matched_order_uid,
            matched_order_completed: matched_completed,
            price,
            size,
            bidder_hold_price: None,
        }
    }

    /// A MOVE/CANCEL/REDUCE releasing the hold on `size` units of a resting
    /// order, at the price/reserve it was originally held at.
    pub fn reduce(
        section: SymbolId,
        side: Side,
        order_id: OrderId,
        uid: UserId,
        price: Price,
        size: Quantity,
        bidder_hold_price: Option<Price>,
    ) -> Self {
        Self {
            event_type: EventType::Reduce,
            section,
            side,
            active_order_completed: false,
            matched_order_id: order_id,
            matched_order_uid: uid,
            matched_order_completed: false,
            price,
            size,
            bidder_hold_price,
        }
    }

    pub fn reject(
        section: SymbolId,
        side: Side,
        order_id: OrderId,
        uid: UserId,
        price: Price,
        size: Quantity,
        bidder_hold_price: Option<Price>,
    ) -> Self {
        Self {
            event_type: EventType::Reject,
            section,
            side,
            active_order_completed: true,
            matched_order_id: order_id,
            matched_order_uid: uid,
            matched_order_completed: false,
            price,
            size,
            bidder_hold_price,
        }
    }
}

/// A chain is a flat buffer of events, the safe-Rust replacement for the
/// original's linked `MatcherTradeEvent*` list (see spec.md's design note on
/// free-list arenas vs. reference-counted nodes).
pub type EventChain = Vec<TradeEvent>;
