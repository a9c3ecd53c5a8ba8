use crate::config::RiskProcessingMode;
use crate::error::RiskError;
use crate::event::{EventType, TradeEvent};
use crate::hash::xor_fold;
use crate::risk::user::{UserProfile, UserStatus};
use crate::symbol::SymbolSpec;
use crate::types::{CurrencyId, Price, Quantity, Side, UserId};
use flurry::HashMap;
use std::sync::Arc;

/// Currency and amount required to hold for a PLACE_ORDER, computed with
/// the symbol's collateral formulas (spec.md §4.3). Grounded in
/// `CoreArithmeticUtils.cpp`.
pub struct RequiredHold {
    pub currency: CurrencyId,
    pub amount: i64,
}

/// Computes the collateral a new order must reserve before it can be
/// placed. Asks reserve base currency; bids reserve quote currency,
/// including the taker fee since any resting remainder may still be taken
/// from later (the fee is released back on settlement if the order ends up
/// resting as a maker instead).
pub fn required_hold(
    spec: &SymbolSpec,
    side: Side,
    size: Quantity,
    price: Price,
    reserve_bid_price: Option<Price>,
) -> RequiredHold {
    match side {
        Side::Ask => RequiredHold {
            currency: spec.base_currency,
            amount: spec.amount_ask(size),
        },
        Side::Bid => {
            let effective_price = reserve_bid_price.unwrap_or(price);
            RequiredHold {
                currency: spec.quote_currency,
                amount: spec.amount_bid_taker_fee(size, effective_price),
            }
        }
    }
}

/// One shard of the risk engine: owns a partition of users (by uid) and
/// performs pre-check holds and post-settlement adjustments for them.
/// Grounded in the pre-check/post-settlement split of spec.md §4.3; mode
/// toggles between full accounting and a pass-through used for
/// matching-only benchmarks.
pub struct RiskEngine {
    mode: RiskProcessingMode,
    users: HashMap<UserId, Arc<UserProfile>>,
}

impl RiskEngine {
    pub fn new(mode: RiskProcessingMode) -> Self {
        Self {
            mode,
            users: HashMap::new(),
        }
    }

    /// Registers a new user account. Returns `false` if `uid` already
    /// exists.
    pub fn add_user(&self, uid: UserId) -> bool {
        let users = self.users.pin();
        if users.contains_key(&uid) {
            return false;
        }
        users.insert(uid, Arc::new(UserProfile::new(uid)));
        true
    }

    pub fn suspend_user(&self, uid: UserId) -> Result<(), RiskError> {
        let user = self.user(uid)?;
        user.set_status(UserStatus::Suspended);
        tracing::warn!(uid, "user suspended");
        Ok(())
    }

    pub fn resume_user(&self, uid: UserId) -> Result<(), RiskError> {
        let user = self.user(uid)?;
        user.set_status(UserStatus::Active);
        tracing::info!(uid, "user resumed");
        Ok(())
    }

    fn user(&self, uid: UserId) -> Result<Arc<UserProfile>, RiskError> {
        self.users
            .pin()
            .get(&uid)
            .cloned()
            .ok_or(RiskError::UserNotFound)
    }

    /// Deposits or withdraws `amount` (signed) in `currency` for `uid`,
    /// used by the ADJUST_USER_BALANCE admin command.
    pub fn adjust_balance(
        &self,
        uid: UserId,
        currency: CurrencyId,
        amount: i64,
    ) -> Result<i64, RiskError> {
        let user = self.user(uid)?;
        if amount < 0 && user.balance(currency) + amount < 0 {
            return Err(RiskError::InsufficientFunds);
        }
        Ok(user.adjust_balance(currency, amount))
    }

    /// Pre-check for PLACE_ORDER: holds the required collateral, failing
    /// with `InsufficientFunds` if the user's free balance does not cover
    /// it. When `mode` is `NoRiskProcessing`, always succeeds without
    /// touching balances.
    pub fn pre_check_and_hold(
        &self,
        uid: UserId,
        spec: &SymbolSpec,
        side: Side,
        size: Quantity,
        price: Price,
        reserve_bid_price: Option<Price>,
    ) -> Result<RequiredHold, RiskError> {
        let hold = required_hold(spec, side, size, price, reserve_bid_price);
        if self.mode == RiskProcessingMode::NoRiskProcessing {
            return Ok(hold);
        }

        let user = self.user(uid)?;
        if user.status() == UserStatus::Suspended {
            tracing::debug!(uid, "pre-check rejected: user suspended");
            return Err(RiskError::UserSuspended);
        }
        if user.balance(hold.currency) < hold.amount {
            tracing::debug!(
                uid,
                currency = hold.currency,
                required = hold.amount,
                "pre-check rejected: insufficient funds"
            );
            return Err(RiskError::InsufficientFunds);
        }
        user.adjust_balance(hold.currency, -hold.amount);
        Ok(hold)
    }

    /// Releases a previously held amount, used when a held order is
    /// cancelled, reduced, or rejected before (or instead of) matching.
    pub fn release_hold(
        &self,
        uid: UserId,
        currency: CurrencyId,
        amount: i64,
    ) -> Result<(), RiskError> {
        if self.mode == RiskProcessingMode::NoRiskProcessing {
            return Ok(());
        }
        let user = self.user(uid)?;
        user.adjust_balance(currency, amount);
        Ok(())
    }

    /// Post-settlement: applies every event in a command's chain to the
    /// issuing user's (`taker_uid`) and the resting counterparties'
    /// balances. Grounded in spec.md §4.3:
    /// - `Trade`: credits both legs of the fill, then releases whatever
    ///   part of a hold the fill confirmed was never needed — a bid taker
    ///   that fills below its hold price gets the price-improvement back
    ///   (`SymbolSpec::amount_bid`), and a bid maker whose hold included the
    ///   taker fee gets the taker/maker fee difference back
    ///   (`SymbolSpec::amount_bid_release_corr_maker`).
    /// - `Reduce`/`Reject`: releases the hold on the affected size, using
    ///   `required_hold`'s formula so the release always matches what was
    ///   actually taken at PLACE_ORDER time.
    /// A `Trade` event's maker side is carried on the event itself
    /// (`event.side`); the taker's side is always its opposite, so no
    /// separate `taker_side` parameter is needed. `hold_price` is the price
    /// the active order's (taker's) collateral was reserved at — `None`
    /// when the command produced no `Trade` events (cancel/reduce/pure
    /// reject), where it is never read.
    pub fn post_settlement(
        &self,
        events: &[TradeEvent],
        spec: &SymbolSpec,
        taker_uid: UserId,
        hold_price: Option<Price>,
    ) {
        if self.mode == RiskProcessingMode::NoRiskProcessing {
            return;
        }
        for event in events {
            match event.event_type {
                EventType::Trade => self.settle_trade(event, spec, taker_uid, hold_price),
                EventType::Reduce | EventType::Reject => self.settle_release(event, spec),
                EventType::Binary => {}
            }
        }
    }

    fn settle_trade(
        &self,
        event: &TradeEvent,
        spec: &SymbolSpec,
        taker_uid: UserId,
        hold_price: Option<Price>,
    ) {
        let base_amount = spec.amount_ask(event.size);
        let quote_amount = spec.amount_bid(event.size, event.price);
        let taker_side = event.side.opposite();

        let (buyer, seller) = match taker_side {
            Side::Bid => (taker_uid, event.matched_order_uid),
            Side::Ask => (event.matched_order_uid, taker_uid),
        };
        if let Ok(buyer_profile) = self.user(buyer) {
            buyer_profile.adjust_balance(spec.base_currency, base_amount);
        }
        if let Ok(seller_profile) = self.user(seller) {
            seller_profile.adjust_balance(spec.quote_currency, quote_amount);
        }

        match taker_side {
            Side::Bid => {
                let reserved_price = hold_price.unwrap_or(event.price);
                let improvement = reserved_price - event.price;
                if improvement > 0 {
                    let release = spec.amount_bid(event.size, improvement);
                    let _ = self.release_hold(taker_uid, spec.quote_currency, release);
                }
            }
            Side::Ask => {
                let release = spec.amount_bid_release_corr_maker(event.size, 0);
                if release > 0 {
                    let _ = self.release_hold(event.matched_order_uid, spec.quote_currency, release);
                }
            }
        }
    }

    fn settle_release(&self, event: &TradeEvent, spec: &SymbolSpec) {
        let hold = required_hold(spec, event.side, event.size, event.price, event.bidder_hold_price);
        let _ = self.release_hold(event.matched_order_uid, hold.currency, hold.amount);
    }

    /// XOR-fold of every shard-local user's state hash, matching
    /// spec.md §8's map-shaped combination rule.
    pub fn state_hash(&self) -> u32 {
        xor_fold(
            self.users
                .pin()
                .iter()
                .map(|(&uid, profile)| (uid, UserHash(profile.state_hash()))),
        )
    }
}

struct UserHash(u32);
impl crate::hash::StateHash for UserHash {
    fn state_hash(&self) -> u32 {
        self.0
    }
}
