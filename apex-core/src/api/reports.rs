use crate::types::{CurrencyId, SymbolId, UserId};
use std::collections::HashMap;

/// A read-only query dispatched to every risk shard and merged by the
/// result aggregator. Grounded in `ReportQueryFactory.cpp`'s query/result
/// pairing; only the total-currency-balance report is implemented, the
/// rest of the original's report catalogue is out of scope here.
#[derive(Debug, Clone, Copy)]
pub enum ReportQuery {
    TotalCurrencyBalance { uid: Option<UserId> },
}

/// Per-shard partial result for `TotalCurrencyBalance`, merged by summing
/// each field across shards. Field order mirrors
/// `TotalCurrencyBalanceReportResult::WriteMarshallable`'s seven
/// nullable-marker-prefixed maps, trimmed to the ones this crate tracks
/// (fees, adjustments, suspends, and open-interest accounting belong to
/// margin trading, which is out of scope here).
#[derive(Debug, Clone, Default)]
pub struct TotalCurrencyBalanceReportResult {
    pub account_balances: HashMap<CurrencyId, i64>,
    pub orders_balances: HashMap<CurrencyId, i64>,
}

impl TotalCurrencyBalanceReportResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merges a per-shard partial result into this accumulator, matching
    /// `ReportQueryFactory`'s merge-by-addition semantics.
    pub fn merge(&mut self, other: &Self) {
        for (&currency, &amount) in &other.account_balances {
            *self.account_balances.entry(currency).or_insert(0) += amount;
        }
        for (&currency, &amount) in &other.orders_balances {
            *self.orders_balances.entry(currency).or_insert(0) += amount;
        }
    }
}

/// Aggregated response returned to the API caller for
/// `ORDER_BOOK_REQUEST`, spec.md §4.2's L2 snapshot.
#[derive(Debug, Clone)]
pub struct OrderBookSnapshot {
    pub symbol_id: SymbolId,
    pub bids: Vec<crate::book::L2Level>,
    pub asks: Vec<crate::book::L2Level>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_matching_currencies_across_shards() {
        let mut total = TotalCurrencyBalanceReportResult::empty();
        let mut shard_a = TotalCurrencyBalanceReportResult::empty();
        shard_a.account_balances.insert(1, 100);
        let mut shard_b = TotalCurrencyBalanceReportResult::empty();
        shard_b.account_balances.insert(1, 50);
        shard_b.account_balances.insert(2, 7);

        total.merge(&shard_a);
        total.merge(&shard_b);

        assert_eq!(total.account_balances[&1], 150);
        assert_eq!(total.account_balances[&2], 7);
    }
}
