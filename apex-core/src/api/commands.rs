use crate::config::{MarginTradingMode, RiskProcessingMode};
use crate::symbol::SymbolSpec;
use crate::types::{CurrencyId, OrderId, OrderKind, Price, Quantity, Side, SymbolId, UserId};

/// One command slot's payload, the unit of work carried through every
/// pipeline stage (spec.md §4.1, `S`). Every variant maps to exactly one
/// external API call.
#[derive(Debug, Clone)]
pub enum Command {
    PlaceOrder {
        order_id: OrderId,
        uid: UserId,
        symbol_id: SymbolId,
        side: Side,
        kind: OrderKind,
        price: Price,
        size: Quantity,
        reserve_bid_price: Option<Price>,
    },
    MoveOrder {
        order_id: OrderId,
        uid: UserId,
        symbol_id: SymbolId,
        new_price: Price,
    },
    CancelOrder {
        order_id: OrderId,
        uid: UserId,
        symbol_id: SymbolId,
    },
    ReduceOrder {
        order_id: OrderId,
        uid: UserId,
        symbol_id: SymbolId,
        reduce_size: Quantity,
    },
    OrderBookRequest {
        symbol_id: SymbolId,
        depth: usize,
    },
    AddUser {
        uid: UserId,
    },
    SuspendUser {
        uid: UserId,
    },
    ResumeUser {
        uid: UserId,
    },
    /// Batching/grouping control, spec.md §6's `GROUPING_CONTROL`. A
    /// deployment-level no-op here: this pipeline already runs each command
    /// to completion before claiming the next, so there is no batch
    /// boundary to toggle.
    GroupingControl {
        enabled: bool,
    },
    AdjustUserBalance {
        uid: UserId,
        currency: CurrencyId,
        amount: i64,
    },
    BinaryAddSymbols {
        symbols: Vec<SymbolSpec>,
    },
    BinaryAddAccounts {
        users: Vec<(UserId, Vec<(CurrencyId, i64)>)>,
    },
    PersistState {
        snapshot_id: i64,
        throw_if_exists: bool,
    },
    Reset,
    NoOp,
}

impl Command {
    /// The symbol this command is routed by, if any. Commands without a
    /// symbol (user/account/binary/persist admin commands) are routed to
    /// every shard.
    pub fn symbol_id(&self) -> Option<SymbolId> {
        match self {
            Command::PlaceOrder { symbol_id, .. }
            | Command::MoveOrder { symbol_id, .. }
            | Command::CancelOrder { symbol_id, .. }
            | Command::ReduceOrder { symbol_id, .. }
            | Command::OrderBookRequest { symbol_id, .. } => Some(*symbol_id),
            _ => None,
        }
    }
}

/// Orders processing configuration carried alongside a command batch,
/// mirroring `OrdersProcessingConfiguration.h`'s pairing of risk and margin
/// modes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessingConfiguration {
    pub risk_processing_mode: RiskProcessingMode,
    pub margin_trading_mode: MarginTradingMode,
}
