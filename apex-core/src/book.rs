use crate::error::{CancelOrderError, ReduceOrderError, RejectReason, UpdateOrderError};
use crate::types::{BookKey, Order, Price, Priority, Quantity, Side};
use crossbeam::epoch;
use crossbeam::epoch::default_collector;
use crossbeam_skiplist::SkipList;
use flurry::HashMap;

/// L2 snapshot entry: one aggregated price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2Level {
    pub price: Price,
    pub total_quantity: Quantity,
    pub order_count: u32,
}

/// Result of a walk callback invoked by the matching engine while crossing
/// the book: whether to unlink the visited entry and whether to stop.
/// Shaped after a matching engine's `WalkingResult` signal pair.
pub struct WalkResult {
    pub remove: bool,
    pub exit: bool,
}

impl WalkResult {
    pub fn next() -> Self {
        Self {
            remove: false,
            exit: false,
        }
    }

    pub fn remove_and_next() -> Self {
        Self {
            remove: true,
            exit: false,
        }
    }

    pub fn exit() -> Self {
        Self {
            remove: false,
            exit: true,
        }
    }

    pub fn remove_and_exit() -> Self {
        Self {
            remove: true,
            exit: true,
        }
    }
}

/// OrderBook holds one symbol's resting orders: a `Bid` and an `Ask`
/// skiplist keyed by `BookKey` (price-then-priority), plus an order-id
/// index for O(1) cancel/move/reduce lookup. No separate syncer: trade
/// notification is the matching engine's job (it returns `TradeEvent`s
/// directly), not the book's.
pub struct OrderBook {
    bid_orders: SkipList<BookKey, Order>,
    ask_orders: SkipList<BookKey, Order>,
    order_index: HashMap<u64, BookKey>,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    pub fn new() -> Self {
        let collector = default_collector().clone();
        Self {
            bid_orders: SkipList::new(collector.clone()),
            ask_orders: SkipList::new(collector),
            order_index: HashMap::new(),
        }
    }

    fn side_book(&self, side: Side) -> &SkipList<BookKey, Order> {
        match side {
            Side::Bid => &self.bid_orders,
            Side::Ask => &self.ask_orders,
        }
    }

    /// Inserts a new resting order. Rejects a duplicate order id rather than
    /// overwriting it, matching spec.md's PLACE_ORDER failure case.
    pub fn insert(&self, order: Order) -> Result<(), RejectReason> {
        let guard = &epoch::pin();
        let order_index = self.order_index.pin();
        if order_index.contains_key(&order.id) {
            return Err(RejectReason::DuplicateOrderId);
        }

        let book_key = order.book_key();
        let order_id = order.id;
        self.side_book(order.side)
            .get_or_insert(book_key, order, guard);
        order_index.insert(order_id, book_key);
        Ok(())
    }

    fn lookup(&self, order_id: u64) -> Option<BookKey> {
        self.order_index.pin().get(&order_id).copied()
    }

    /// Finds a resting order by id without claiming it.
    pub fn find(&self, order_id: u64) -> Option<Order> {
        let guard = &epoch::pin();
        let key = self.lookup(order_id)?;
        self.side_book(key.side)
            .get(&key, guard)
            .map(|entry| entry.value().clone())
    }

    /// Cancels a resting order: claims `Finished` lifecycle, unlinks it, and
    /// returns the claimed order so the caller can release risk holds.
    pub fn remove(&self, order_id: u64) -> Result<Order, CancelOrderError> {
        let guard = &epoch::pin();
        let order_index = self.order_index.pin();
        let key = order_index
            .get(&order_id)
            .copied()
            .ok_or(CancelOrderError::OrderNotFound)?;

        let entry = self
            .side_book(key.side)
            .get(&key, guard)
            .ok_or(CancelOrderError::OrderNotFound)?;
        let order = entry.value();
        if !order.enter_finished_from_active() {
            return Err(CancelOrderError::OrderNotCancellable);
        }

        let claimed = order.clone();
        entry.remove();
        order_index.remove(&order_id);
        Ok(claimed)
    }

    /// MOVE_ORDER: unlinks the order from its old price level and returns it
    /// repriced to `new_price` with fresh priority (it loses time priority),
    /// matching spec.md §4.2. The order is NOT reinserted here — the caller
    /// must re-cross it against the opposite side first and reinsert any
    /// remainder, since a reprice can make the order immediately marketable.
    pub fn reprice(
        &self,
        order_id: u64,
        new_price: Price,
        now: u64,
    ) -> Result<Order, UpdateOrderError> {
        let guard = &epoch::pin();
        let order_index = self.order_index.pin();
        let key = order_index
            .get(&order_id)
            .copied()
            .ok_or(UpdateOrderError::OrderNotFound)?;

        let entry = self
            .side_book(key.side)
            .get(&key, guard)
            .ok_or(UpdateOrderError::OrderNotFound)?;
        let existing = entry.value();
        if !existing.enter_finished_from_active() {
            return Err(UpdateOrderError::OrderNotModifiable);
        }

        let mut repriced = existing.clone();
        entry.remove();
        order_index.remove(&order_id);

        repriced.price = new_price;
        repriced.updated_at = now;
        repriced.reset_lifecycle();
        Ok(repriced)
    }

    /// REDUCE_ORDER: shrinks a resting order's remaining size in place
    /// without losing time priority. Returns the amount actually removed
    /// alongside a snapshot of the order (pre-shrink), so the caller can
    /// release the corresponding slice of its risk hold.
    pub fn reduce(
        &self,
        order_id: u64,
        amount: Quantity,
    ) -> Result<(Quantity, Order), ReduceOrderError> {
        let guard = &epoch::pin();
        let key = self.lookup(order_id).ok_or(ReduceOrderError::OrderNotFound)?;
        let entry = self
            .side_book(key.side)
            .get(&key, guard)
            .ok_or(ReduceOrderError::OrderNotFound)?;
        let order = entry.value();

        if !order.enter_finished_from_active() {
            return Err(ReduceOrderError::OrderNotReducible);
        }
        let remaining = order.quantity();
        if amount <= 0 || amount > remaining {
            order.reset_lifecycle();
            return Err(ReduceOrderError::InvalidReduceSize);
        }
        let snapshot = order.clone();
        order.reduce_by(amount);
        order.reset_lifecycle();
        Ok((amount, snapshot))
    }

    /// Best (highest bid / lowest ask) resting price for `side`.
    pub fn best_price(&self, side: Side) -> Option<Price> {
        let guard = &epoch::pin();
        self.side_book(side).front(guard).map(|e| e.key().price)
    }

    /// Walks resting orders on `side` from the best price outward, calling
    /// `walk` for each. The matching engine uses this to cross a taker
    /// against the book; `walk` signals removal/exit via `WalkResult`.
    pub fn walk(&self, side: Side, walk: &mut dyn FnMut(&Order) -> WalkResult) {
        let guard = &epoch::pin();
        let book = self.side_book(side);
        let mut entry = book.front(guard);
        while let Some(e) = entry {
            let order = e.value();
            let result = walk(order);
            if result.remove {
                self.order_index.pin().remove(&order.id);
                e.remove();
            }
            if result.exit {
                break;
            }
            entry = e.next();
        }
    }

    /// Aggregates resting orders on `side` into up to `depth` L2 levels, for
    /// ORDER_BOOK_REQUEST (spec.md §4.2).
    pub fn l2_snapshot(&self, side: Side, depth: usize) -> Vec<L2Level> {
        let guard = &epoch::pin();
        let book = self.side_book(side);
        let mut levels: Vec<L2Level> = Vec::with_capacity(depth);
        let mut entry = book.front(guard);
        while let Some(e) = entry {
            let order = e.value();
            let price = e.key().price;
            match levels.last_mut() {
                Some(last) if last.price == price => {
                    last.total_quantity += order.quantity();
                    last.order_count += 1;
                }
                _ => {
                    if levels.len() == depth {
                        break;
                    }
                    levels.push(L2Level {
                        price,
                        total_quantity: order.quantity(),
                        order_count: 1,
                    });
                }
            }
            entry = e.next();
        }
        levels
    }

    /// True if the book is crossed at rest (best bid >= best ask), a fatal
    /// state violation per spec.md §7.
    pub fn is_crossed(&self) -> bool {
        match (self.best_price(Side::Bid), self.best_price(Side::Ask)) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderKind;
    use std::cell::UnsafeCell;
    use std::sync::atomic::AtomicU8;

    fn order(id: u64, side: Side, price: Price, qty: Quantity, updated_at: u64) -> Order {
        Order {
            id,
            user_id: 1,
            symbol_id: 1,
            side,
            lifecycle: AtomicU8::new(crate::types::OrderLifecycle::Active.into()),
            kind: OrderKind::Gtc,
            price,
            reserve_bid_price: None,
            status: UnsafeCell::new(crate::types::OrderStatus::Placed),
            quantity: UnsafeCell::new(qty),
            filled_quantity: UnsafeCell::new(0),
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let book = OrderBook::new();
        book.insert(order(1, Side::Bid, 100, 10, 1)).unwrap();
        let err = book.insert(order(1, Side::Bid, 101, 5, 2)).unwrap_err();
        assert_eq!(err, RejectReason::DuplicateOrderId);
    }

    #[test]
    fn best_price_picks_highest_bid_lowest_ask() {
        let book = OrderBook::new();
        book.insert(order(1, Side::Bid, 100, 10, 1)).unwrap();
        book.insert(order(2, Side::Bid, 105, 10, 2)).unwrap();
        book.insert(order(3, Side::Ask, 110, 10, 3)).unwrap();
        book.insert(order(4, Side::Ask, 108, 10, 4)).unwrap();
        assert_eq!(book.best_price(Side::Bid), Some(105));
        assert_eq!(book.best_price(Side::Ask), Some(108));
    }

    #[test]
    fn remove_unknown_order_fails() {
        let book = OrderBook::new();
        assert_eq!(
            book.remove(42).unwrap_err(),
            CancelOrderError::OrderNotFound
        );
    }

    #[test]
    fn remove_unlinks_order_from_book() {
        let book = OrderBook::new();
        book.insert(order(1, Side::Bid, 100, 10, 1)).unwrap();
        book.remove(1).unwrap();
        assert!(book.find(1).is_none());
        assert_eq!(book.best_price(Side::Bid), None);
    }

    #[test]
    fn reprice_unlinks_old_entry_and_returns_repriced_order() {
        let book = OrderBook::new();
        book.insert(order(1, Side::Bid, 100, 10, 1)).unwrap();
        let repriced = book.reprice(1, 103, 50).unwrap();
        assert_eq!(repriced.price, 103);
        // The caller is responsible for reinserting any remainder; reprice
        // itself only unlinks the stale entry.
        assert_eq!(book.best_price(Side::Bid), None);
    }

    #[test]
    fn reduce_shrinks_without_losing_priority() {
        let book = OrderBook::new();
        book.insert(order(1, Side::Bid, 100, 10, 1)).unwrap();
        let (removed, snapshot) = book.reduce(1, 4).unwrap();
        assert_eq!(removed, 4);
        assert_eq!(snapshot.quantity(), 10);
        assert_eq!(book.find(1).unwrap().quantity(), 6);
    }

    #[test]
    fn reduce_rejects_amount_exceeding_remaining() {
        let book = OrderBook::new();
        book.insert(order(1, Side::Bid, 100, 10, 1)).unwrap();
        assert_eq!(
            book.reduce(1, 20).unwrap_err(),
            ReduceOrderError::InvalidReduceSize
        );
    }

    #[test]
    fn l2_snapshot_aggregates_same_price_orders() {
        let book = OrderBook::new();
        book.insert(order(1, Side::Bid, 100, 10, 1)).unwrap();
        book.insert(order(2, Side::Bid, 100, 5, 2)).unwrap();
        book.insert(order(3, Side::Bid, 99, 7, 3)).unwrap();
        let levels = book.l2_snapshot(Side::Bid, 10);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].price, 100);
        assert_eq!(levels[0].total_quantity, 15);
        assert_eq!(levels[0].order_count, 2);
        assert_eq!(levels[1].price, 99);
    }

    #[test]
    fn is_crossed_detects_bid_at_or_above_ask() {
        let book = OrderBook::new();
        book.insert(order(1, Side::Bid, 105, 10, 1)).unwrap();
        book.insert(order(2, Side::Ask, 100, 10, 2)).unwrap();
        assert!(book.is_crossed());
    }
}
