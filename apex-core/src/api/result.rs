use crate::api::reports::OrderBookSnapshot;
use crate::error::{CancelOrderError, ReduceOrderError, RejectReason, RiskError, UpdateOrderError};
use crate::event::TradeEvent;

/// The outcome the sequencer's result aggregator stage attaches to a
/// command slot once every stage has released it (spec.md §4.1, `resultCode`).
/// `Success` and the failure variants all map to a distinct wire
/// `ResultCode` via `ResultCode::from`.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Success { events: Vec<TradeEvent> },
    BookSnapshot(OrderBookSnapshot),
    /// A PLACE_ORDER rejection. Carries whatever events the attempt
    /// produced before rejecting (trades already matched, plus a REJECT
    /// for the unfilled remainder) so risk post-settlement can still
    /// settle and release holds for them.
    Rejected(RejectReason, Vec<TradeEvent>),
    RiskRejected(RiskError),
    UpdateFailed(UpdateOrderError),
    CancelFailed(CancelOrderError),
    ReduceFailed(ReduceOrderError),
    UnsupportedCommand,
}

/// Stable numeric result code for the binary API response, grounded in
/// spec.md §9's "External Interfaces -> Result codes" table. Values are
/// part of the wire contract and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResultCode {
    Success = 0,
    DuplicateOrderId = 1,
    UnknownSymbol = 2,
    InsufficientLiquidity = 3,
    InsufficientFunds = 4,
    InvalidSymbolConfiguration = 5,
    UserSuspended = 6,
    UserNotFound = 7,
    OrderNotFound = 8,
    OrderNotModifiable = 9,
    UnmatchedUid = 10,
    InvalidReduceSize = 11,
    UnsupportedCommand = 255,
}

impl From<&CommandResult> for ResultCode {
    fn from(result: &CommandResult) -> Self {
        match result {
            CommandResult::Success { .. } | CommandResult::BookSnapshot(_) => ResultCode::Success,
            CommandResult::Rejected(reason, _) => match reason {
                RejectReason::DuplicateOrderId => ResultCode::DuplicateOrderId,
                RejectReason::UnknownSymbol => ResultCode::UnknownSymbol,
                RejectReason::InsufficientLiquidity => ResultCode::InsufficientLiquidity,
            },
            CommandResult::RiskRejected(reason) => match reason {
                RiskError::InsufficientFunds => ResultCode::InsufficientFunds,
                RiskError::InvalidSymbolConfiguration => ResultCode::InvalidSymbolConfiguration,
                RiskError::UserSuspended => ResultCode::UserSuspended,
                RiskError::UserNotFound => ResultCode::UserNotFound,
            },
            CommandResult::UpdateFailed(reason) => match reason {
                UpdateOrderError::OrderNotFound => ResultCode::OrderNotFound,
                UpdateOrderError::OrderNotModifiable => ResultCode::OrderNotModifiable,
                UpdateOrderError::UnmatchedUid => ResultCode::UnmatchedUid,
            },
            CommandResult::CancelFailed(reason) => match reason {
                CancelOrderError::OrderNotFound => ResultCode::OrderNotFound,
                CancelOrderError::OrderNotCancellable => ResultCode::OrderNotModifiable,
                CancelOrderError::UnmatchedUid => ResultCode::UnmatchedUid,
            },
            CommandResult::ReduceFailed(reason) => match reason {
                ReduceOrderError::OrderNotFound => ResultCode::OrderNotFound,
                ReduceOrderError::OrderNotReducible => ResultCode::OrderNotModifiable,
                ReduceOrderError::UnmatchedUid => ResultCode::UnmatchedUid,
                ReduceOrderError::InvalidReduceSize => ResultCode::InvalidReduceSize,
            },
            CommandResult::UnsupportedCommand => ResultCode::UnsupportedCommand,
        }
    }
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            CommandResult::Success { .. } | CommandResult::BookSnapshot(_)
        )
    }
}
