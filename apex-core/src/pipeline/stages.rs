use crate::api::commands::Command;
use crate::api::reports::OrderBookSnapshot;
use crate::api::result::CommandResult;
use crate::error::RejectReason;
use crate::journal::SerializationProcessor;
use crate::matching::{self, MatchingEngine};
use crate::pipeline::command::CommandSlot;
use crate::risk::RiskEngine;
use crate::symbol::SymbolSpecificationProvider;
use crate::types::Side;

/// Stage 1 (Journaler): durably appends the raw command before any other
/// stage observes it, satisfying spec.md §4.4's "journal precedes effect"
/// ordering. Journal I/O failures are fatal (propagated, not folded into
/// `resultCode`) per spec.md §7.
pub fn journal_stage(
    journal: &dyn SerializationProcessor,
    slot: &CommandSlot,
) -> Result<(), crate::error::JournalError> {
    journal.write_to_journal(slot.seq, &slot.command)
}

/// Stage 2 (Risk pre-check): validates the command against the issuing
/// user's account state and reserves any collateral a PLACE_ORDER needs,
/// before the command ever touches a symbol's book. Returns `Some` to
/// short-circuit the remaining stages with a final result.
pub fn risk_pre_check_stage(
    risk: &RiskEngine,
    symbols: &SymbolSpecificationProvider,
    command: &Command,
) -> Option<CommandResult> {
    match command {
        Command::PlaceOrder {
            uid,
            symbol_id,
            side,
            price,
            size,
            reserve_bid_price,
            ..
        } => {
            let spec = match symbols.get_symbol_spec(*symbol_id) {
                Some(spec) => spec,
                None => return Some(CommandResult::Rejected(RejectReason::UnknownSymbol, Vec::new())),
            };
            match risk.pre_check_and_hold(*uid, &spec, *side, *size, *price, *reserve_bid_price) {
                Ok(_) => None,
                Err(err) => Some(CommandResult::RiskRejected(err)),
            }
        }
        _ => None,
    }
}

/// Stage 3 (Matching): the only stage that mutates a symbol's order book.
/// Every PLACE_ORDER/MOVE_ORDER/CANCEL_ORDER/REDUCE_ORDER/
/// ORDER_BOOK_REQUEST command is handled here against the one matching
/// shard that owns its `symbol_id`. The second element of the return pair
/// is the active order's collateral-hold price (PLACE_ORDER/MOVE_ORDER
/// only), threaded to risk post-settlement for bid over-hold release;
/// every other command kind returns `None` there.
pub fn matching_stage(
    engine: &mut MatchingEngine,
    command: &Command,
    now: u64,
) -> (CommandResult, Option<crate::types::Price>) {
    match command {
        Command::PlaceOrder {
            order_id,
            uid,
            symbol_id,
            side,
            kind,
            price,
            size,
            reserve_bid_price,
        } => {
            let order = crate::types::Order {
                id: *order_id,
                user_id: *uid,
                symbol_id: *symbol_id,
                side: *side,
                lifecycle: std::sync::atomic::AtomicU8::new(
                    crate::types::OrderLifecycle::Active.into(),
                ),
                kind: *kind,
                price: *price,
                reserve_bid_price: *reserve_bid_price,
                status: std::cell::UnsafeCell::new(crate::types::OrderStatus::Pending),
                quantity: std::cell::UnsafeCell::new(*size),
                filled_quantity: std::cell::UnsafeCell::new(0),
                created_at: now,
                updated_at: now,
            };
            match matching::place_order(&engine.book, order, now) {
                Ok(outcome) => (
                    CommandResult::Success {
                        events: outcome.events,
                    },
                    outcome.hold_price,
                ),
                Err(rejection) => (
                    CommandResult::Rejected(rejection.reason, rejection.events),
                    None,
                ),
            }
        }
        Command::MoveOrder {
            order_id, new_price, ..
        } => match matching::move_order(&engine.book, *order_id, *new_price, now) {
            Ok(outcome) => (
                CommandResult::Success {
                    events: outcome.events,
                },
                outcome.hold_price,
            ),
            Err(err) => (CommandResult::UpdateFailed(err), None),
        },
        Command::CancelOrder { order_id, .. } => {
            match matching::cancel_order(&engine.book, *order_id) {
                Ok((_, event)) => (
                    CommandResult::Success {
                        events: vec![event],
                    },
                    None,
                ),
                Err(err) => (CommandResult::CancelFailed(err), None),
            }
        }
        Command::ReduceOrder {
            order_id,
            reduce_size,
            ..
        } => match matching::reduce_order(&engine.book, *order_id, *reduce_size) {
            Ok((_, event)) => (
                CommandResult::Success {
                    events: vec![event],
                },
                None,
            ),
            Err(err) => (CommandResult::ReduceFailed(err), None),
        },
        Command::OrderBookRequest { symbol_id, depth } => (
            CommandResult::BookSnapshot(OrderBookSnapshot {
                symbol_id: *symbol_id,
                bids: engine.book.l2_snapshot(Side::Bid, *depth),
                asks: engine.book.l2_snapshot(Side::Ask, *depth),
            }),
            None,
        ),
        _ => (CommandResult::UnsupportedCommand, None),
    }
}

/// Stage 4 (Risk post-settlement): settles every event the matching stage
/// produced — credits both legs of a `Trade`, and releases the holds
/// placed in pre-check for the filled/cancelled/reduced/rejected portion
/// of a PLACE_ORDER, MOVE_ORDER, CANCEL_ORDER, or REDUCE_ORDER (spec.md
/// §4.3). `hold_price` comes from the matching stage's companion
/// `Option<Price>` for PLACE_ORDER/MOVE_ORDER; it is unused (and `None`)
/// for every other command kind.
pub fn risk_post_settlement_stage(
    risk: &RiskEngine,
    symbols: &SymbolSpecificationProvider,
    command: &Command,
    result: &CommandResult,
    hold_price: Option<crate::types::Price>,
) {
    let (uid, symbol_id) = match command {
        Command::PlaceOrder { uid, symbol_id, .. }
        | Command::MoveOrder { uid, symbol_id, .. }
        | Command::CancelOrder { uid, symbol_id, .. }
        | Command::ReduceOrder { uid, symbol_id, .. } => (*uid, *symbol_id),
        _ => return,
    };
    let events: &[crate::event::TradeEvent] = match result {
        CommandResult::Success { events } => events,
        CommandResult::Rejected(_, events) => events,
        _ => return,
    };
    if let Some(spec) = symbols.get_symbol_spec(symbol_id) {
        risk.post_settlement(events, &spec, uid, hold_price);
    }
}

/// Stage 5 (Result aggregator): the result has already been computed by
/// the stage that produced it; this stage's job is only to make it
/// visible on the slot so a waiting API caller can observe it. Kept as an
/// explicit step so the pipeline's five logical stages (spec.md §4.1) each
/// have a concrete counterpart here, even though attaching the result is a
/// single assignment in this single-process implementation.
pub fn result_aggregator_stage(slot: &mut CommandSlot, result: CommandResult) {
    slot.result = Some(result);
}
