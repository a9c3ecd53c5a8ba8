use thiserror::Error;

/// Reasons an order can be rejected synchronously during PLACE_ORDER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("duplicate order id")]
    DuplicateOrderId,
    #[error("unknown symbol")]
    UnknownSymbol,
    #[error("fill-or-kill budget could not be satisfied")]
    InsufficientLiquidity,
}

/// Errors returned by `MOVE_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UpdateOrderError {
    #[error("order not found in the book")]
    OrderNotFound,
    #[error("order is not in a modifiable state (already matching)")]
    OrderNotModifiable,
    #[error("caller uid does not own the order")]
    UnmatchedUid,
}

/// Errors returned by `CANCEL_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelOrderError {
    #[error("order not found in the book")]
    OrderNotFound,
    #[error("order is not in a cancellable state (already matching)")]
    OrderNotCancellable,
    #[error("caller uid does not own the order")]
    UnmatchedUid,
}

/// Errors returned by `REDUCE_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReduceOrderError {
    #[error("order not found in the book")]
    OrderNotFound,
    #[error("order is not in a reducible state (already matching)")]
    OrderNotReducible,
    #[error("caller uid does not own the order")]
    UnmatchedUid,
    #[error("reduce amount must be positive and not exceed the remaining size")]
    InvalidReduceSize,
}

/// Risk pre-check / post-settlement failures (spec.md §4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RiskError {
    #[error("insufficient free balance to cover the requested hold")]
    InsufficientFunds,
    #[error("symbol is not registered or not configured for risk processing")]
    InvalidSymbolConfiguration,
    #[error("user is suspended")]
    UserSuspended,
    #[error("user not found")]
    UserNotFound,
}

/// State violations are bugs or corruption, not expected outcomes: these
/// halt the pipeline for operator intervention rather than being folded
/// into a result code.
#[derive(Debug, Error)]
pub enum StateViolation {
    #[error("order book for symbol {symbol} is crossed at rest: best_bid={best_bid} >= best_ask={best_ask}")]
    CrossedBook {
        symbol: crate::types::SymbolId,
        best_bid: crate::types::Price,
        best_ask: crate::types::Price,
    },
    #[error("negative exchange balance for user {uid} in currency {currency}: {balance}")]
    NegativeBalance {
        uid: crate::types::UserId,
        currency: crate::types::CurrencyId,
        balance: i64,
    },
    #[error("state hash mismatch after replay: expected {expected:#010x}, got {actual:#010x}")]
    HashMismatch { expected: u32, actual: u32 },
}

/// Journal and snapshot I/O / protocol failures. Per spec.md §7 these are
/// fatal by default: the durability contract is never weakened silently.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("I/O failure in the journal writer: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot {snapshot_id} not found and throw_if_snapshot_not_found is set")]
    SnapshotNotFound { snapshot_id: i64 },
    #[error("journal frame truncated or corrupt at seq {seq}")]
    CorruptFrame { seq: i64 },
    #[error(transparent)]
    StateViolation(#[from] StateViolation),
}
