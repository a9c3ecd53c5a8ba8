use mimalloc::MiMalloc;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};

/// Global allocator for the hot path.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// OrderId is the type used for order ids, unique within a symbol.
pub type OrderId = u64;

/// UserId identifies an account across the risk engine and matching engine.
pub type UserId = u64;

/// SymbolId identifies a traded instrument.
pub type SymbolId = u32;

/// CurrencyId identifies a settlement currency.
pub type CurrencyId = u32;

/// Price is a signed fixed-point quantity, scaled by the symbol's quote_scale.
pub type Price = i64;

/// Quantity is a signed fixed-point lot count, scaled by the symbol's base_scale.
pub type Quantity = i64;

/// Priority orders arrival within a price level (lower sorts first).
pub type Priority = u64;

/// Side indicates the direction of an order.
#[derive(PartialEq, Eq, Default, Copy, Clone, Debug)]
pub enum Side {
    /// Bid means the user wants to acquire the asset, matching against resting asks.
    #[default]
    Bid,
    /// Ask means the user wants to sell the asset, matching against resting bids.
    Ask,
}

impl Side {
    /// The side an incoming order of this side matches against.
    #[inline(always)]
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

/// OrderKind is the PLACE_ORDER execution mode requested by the caller.
#[derive(PartialEq, Eq, Default, Copy, Clone, Debug)]
pub enum OrderKind {
    /// Good-till-cancelled: any unfilled remainder rests at its limit price.
    #[default]
    Gtc,
    /// Immediate-or-cancel: unfilled remainder is rejected, never rests.
    Ioc,
    /// Fill-or-kill against a pre-computed quote budget: rejects in full
    /// unless the whole order can be filled within `reserve_bid_price`.
    FokBudget,
}

/// OrderStatus represents the current status of an order during its lifecycle.
#[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
pub enum OrderStatus {
    /// Received, not yet processed by the matching shard.
    #[default]
    Pending,
    /// Resting on the book and eligible for matching.
    Placed,
    /// Fully filled.
    Filled,
    /// Partially filled, remainder still resting.
    PartiallyFilled,
    /// Cancelled before being fully filled.
    Cancelled,
    /// Rejected (duplicate id, NSF, IOC/FOK remainder, unknown symbol, ...).
    Rejected,
}

/// Lifecycle state coordinating safe concurrent access between the matching
/// shard and concurrent cancel/move/reduce requests on the same symbol.
///
/// Transitions:
/// - `Active` -> `Matched` (matching shard claims the order)
/// - `Active` -> `Finished` (cancel/move claims the order)
/// - `Matched` -> `Active` (matching shard releases a partially filled order)
/// - `Matched` -> `Finished` (matching shard completes the order)
#[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
pub enum OrderLifecycle {
    /// Live; may be matched or claimed for cancel/move/reduce.
    #[default]
    Active = 0,
    /// Currently being matched; cannot be concurrently cancelled.
    Matched = 1,
    /// Finished matching or removed; eligible for unlinking from its level.
    Finished = 2,
}

impl From<u8> for OrderLifecycle {
    fn from(val: u8) -> Self {
        match val {
            0 => Self::Active,
            1 => Self::Matched,
            2 => Self::Finished,
            _ => unreachable!("invalid lifecycle state"),
        }
    }
}

impl From<OrderLifecycle> for u8 {
    fn from(l: OrderLifecycle) -> u8 {
        l as u8
    }
}

/// BookKey is a composite key for an order's position in the book: price,
/// arrival priority, and side. A single skiplist per side sorts correctly
/// without a secondary per-price grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookKey {
    pub price: Price,
    pub priority: Priority,
    pub side: Side,
}

impl Ord for BookKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.side {
            Side::Bid => self
                .price
                .cmp(&other.price)
                .reverse()
                .then(self.priority.cmp(&other.priority)),
            Side::Ask => self
                .price
                .cmp(&other.price)
                .then(self.priority.cmp(&other.priority)),
        }
    }
}

impl PartialOrd for BookKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Order is a live order resting in, or passing through, an order book.
///
/// `quantity`, `filled_quantity` and `status` are wrapped in `UnsafeCell` to
/// allow internal mutability while the order is shared read-only through the
/// skiplist entry. SAFETY: every mutation happens on the single matching
/// shard that owns this order's symbol; cancel/move/reduce requests first
/// claim the order via the lifecycle CAS before touching these fields.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub symbol_id: SymbolId,
    pub side: Side,
    pub lifecycle: AtomicU8,
    pub kind: OrderKind,
    pub price: Price,
    /// Precomputed quote budget ceiling for FOK-BUDGET orders (see spec
    /// §4.2); `None` for GTC/IOC.
    pub reserve_bid_price: Option<Price>,
    pub status: UnsafeCell<OrderStatus>,
    pub quantity: UnsafeCell<Quantity>,
    pub filled_quantity: UnsafeCell<Quantity>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Default for Order {
    fn default() -> Self {
        Order {
            id: 0,
            user_id: 0,
            symbol_id: 0,
            side: Side::default(),
            lifecycle: AtomicU8::new(OrderLifecycle::Active.into()),
            kind: OrderKind::default(),
            price: 0,
            reserve_bid_price: None,
            status: UnsafeCell::new(OrderStatus::default()),
            quantity: UnsafeCell::new(0),
            filled_quantity: UnsafeCell::new(0),
            created_at: 0,
            updated_at: 0,
        }
    }
}

impl Clone for Order {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            user_id: self.user_id,
            symbol_id: self.symbol_id,
            side: self.side,
            lifecycle: AtomicU8::new(self.lifecycle.load(Ordering::Acquire).into()),
            kind: self.kind,
            price: self.price,
            reserve_bid_price: self.reserve_bid_price,
            status: UnsafeCell::new(unsafe { *self.status.get() }),
            quantity: UnsafeCell::new(unsafe { *self.quantity.get() }),
            filled_quantity: UnsafeCell::new(unsafe { *self.filled_quantity.get() }),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

unsafe impl Sync for Order {}

impl Order {
    /// Get the order's status.
    #[inline(always)]
    pub fn status(&self) -> OrderStatus {
        unsafe { *self.status.get() }
    }

    #[inline(always)]
    pub fn is_filled(&self) -> bool {
        self.status() == OrderStatus::Filled
    }

    #[inline(always)]
    pub fn quantity(&self) -> Quantity {
        unsafe { *self.quantity.get() }
    }

    #[inline(always)]
    pub fn filled_quantity(&self) -> Quantity {
        unsafe { *self.filled_quantity.get() }
    }

    #[inline(always)]
    pub fn book_key(&self) -> BookKey {
        BookKey {
            price: self.price,
            priority: self.priority(),
            side: self.side,
        }
    }

    #[inline(always)]
    pub(crate) fn is_finished(&self) -> bool {
        self.lifecycle.load(Ordering::Acquire) == OrderLifecycle::Finished.into()
    }

    #[inline(always)]
    pub(crate) fn reset_lifecycle(&self) {
        self.lifecycle
            .store(OrderLifecycle::Active.into(), Ordering::Release);
    }

    #[inline(always)]
    pub(crate) fn enter_matched(&self) -> bool {
        self.lifecycle
            .compare_exchange_weak(
                OrderLifecycle::Active.into(),
                OrderLifecycle::Matched.into(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    #[inline(always)]
    pub(crate) fn exit_matched(&self) -> bool {
        self.lifecycle
            .compare_exchange_weak(
                OrderLifecycle::Matched.into(),
                OrderLifecycle::Active.into(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    #[inline(always)]
    pub(crate) fn enter_finished_from_active(&self) -> bool {
        self.lifecycle
            .compare_exchange_weak(
                OrderLifecycle::Active.into(),
                OrderLifecycle::Finished.into(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    #[inline(always)]
    pub(crate) fn enter_finished_from_matched(&self) -> bool {
        self.lifecycle
            .compare_exchange_weak(
                OrderLifecycle::Matched.into(),
                OrderLifecycle::Finished.into(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Earlier orders (lower `updated_at`) get priority; ties broken by id.
    #[inline(always)]
    pub(crate) fn priority(&self) -> Priority {
        self.updated_at * 100 + self.id % 100
    }

    /// SAFETY: only the owning matching shard calls this, while the caller
    /// holds `Matched` lifecycle for the order.
    #[inline(always)]
    pub(crate) fn quantity_fill(&self, traded: Quantity) -> Quantity {
        unsafe {
            *self.quantity.get() -= traded;
            *self.filled_quantity.get() += traded;
            *self.quantity.get()
        }
    }

    #[inline(always)]
    pub(crate) fn update_status(&self, status: OrderStatus) {
        unsafe {
            *self.status.get() = status;
        }
    }

    /// Reduce the order's remaining size by `amount`. Returns the new
    /// remaining size. SAFETY: same discipline as `quantity_fill`.
    #[inline(always)]
    pub(crate) fn reduce_by(&self, amount: Quantity) -> Quantity {
        unsafe {
            *self.quantity.get() -= amount;
            *self.quantity.get()
        }
    }

    /// Clone the order and reset its lifecycle state to `Active`, used when
    /// publishing a partially-filled order's new resting state.
    pub(crate) fn clone_reset_lifecycle(&self) -> Self {
        let cloned = self.clone();
        cloned.reset_lifecycle();
        cloned
    }
}
