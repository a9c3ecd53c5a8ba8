use crate::hash::{hash_bytes, StateHash};
use crate::types::{CurrencyId, Price, SymbolId};
use flurry::HashMap;

/// Symbol type distinguishes settlement semantics (exchange vs. margin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolType {
    FuturesContract,
    CurrencyExchangePair,
}

/// Immutable-after-registration symbol rules (spec.md §3, `Y`). Lot sizing:
/// base amount = `size * base_scale`; quote amount =
/// `size * price * quote_scale`.
#[derive(Debug, Clone)]
pub struct SymbolSpec {
    pub symbol_id: SymbolId,
    pub symbol_type: SymbolType,
    pub base_currency: CurrencyId,
    pub quote_currency: CurrencyId,
    pub base_scale: i64,
    pub quote_scale: i64,
    pub margin_buy: i64,
    pub margin_sell: i64,
    pub taker_fee: i64,
    pub maker_fee: i64,
}

impl StateHash for SymbolSpec {
    fn state_hash(&self) -> u32 {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&self.symbol_id.to_be_bytes());
        buf.push(matches!(self.symbol_type, SymbolType::FuturesContract) as u8);
        buf.extend_from_slice(&self.base_currency.to_be_bytes());
        buf.extend_from_slice(&self.quote_currency.to_be_bytes());
        buf.extend_from_slice(&self.base_scale.to_be_bytes());
        buf.extend_from_slice(&self.quote_scale.to_be_bytes());
        buf.extend_from_slice(&self.margin_buy.to_be_bytes());
        buf.extend_from_slice(&self.margin_sell.to_be_bytes());
        buf.extend_from_slice(&self.taker_fee.to_be_bytes());
        buf.extend_from_slice(&self.maker_fee.to_be_bytes());
        hash_bytes(&buf)
    }
}

impl SymbolSpec {
    /// Base-currency amount debited/credited for an ask of `size` lots.
    #[inline]
    pub fn amount_ask(&self, size: i64) -> i64 {
        size * self.base_scale
    }

    /// Quote-currency amount held for a bid of `size` lots at `price`.
    #[inline]
    pub fn amount_bid(&self, size: i64, price: Price) -> i64 {
        size * (price * self.quote_scale)
    }

    /// Quote-currency amount held for a bid including the taker fee,
    /// matching `CoreArithmeticUtils::CalculateAmountBidTakerFee`.
    #[inline]
    pub fn amount_bid_taker_fee(&self, size: i64, price: Price) -> i64 {
        size * (price * self.quote_scale + self.taker_fee)
    }

    /// Release correction for a maker whose price differs from the taker's
    /// reserved price, matching
    /// `CoreArithmeticUtils::CalculateAmountBidReleaseCorrMaker`.
    #[inline]
    pub fn amount_bid_release_corr_maker(&self, size: i64, price_diff: i64) -> i64 {
        size * (price_diff * self.quote_scale + (self.taker_fee - self.maker_fee))
    }

    /// Quote-currency amount for a FOK-BUDGET bid given the budget achieved
    /// in price-steps, matching
    /// `CoreArithmeticUtils::CalculateAmountBidTakerFeeForBudget`.
    #[inline]
    pub fn amount_bid_taker_fee_for_budget(&self, size: i64, budget_in_steps: i64) -> i64 {
        budget_in_steps * self.quote_scale + size * self.taker_fee
    }
}

/// Add-once dictionary of symbol specs, shared read-only between the
/// matching and risk shards. Grounded in
/// `SymbolSpecificationProvider.cpp`: `add_symbol` fails on a duplicate id,
/// `get_symbol_spec` never mutates, `reset` is only safe while the pipeline
/// is drained (the caller's responsibility, not enforced here).
pub struct SymbolSpecificationProvider {
    specs: HashMap<SymbolId, SymbolSpec>,
}

impl Default for SymbolSpecificationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolSpecificationProvider {
    pub fn new() -> Self {
        Self {
            specs: HashMap::new(),
        }
    }

    /// Registers `spec`. Returns `false` if `spec.symbol_id` already exists.
    pub fn add_symbol(&self, spec: SymbolSpec) -> bool {
        let pinned = self.specs.pin();
        if pinned.contains_key(&spec.symbol_id) {
            return false;
        }
        pinned.insert(spec.symbol_id, spec);
        true
    }

    /// Looks up a symbol's spec. Safe to call concurrently from matching
    /// and risk shards; never mutates.
    pub fn get_symbol_spec(&self, symbol_id: SymbolId) -> Option<SymbolSpec> {
        self.specs.pin().get(&symbol_id).cloned()
    }

    /// Clears all registered symbols. Only safe while the pipeline is
    /// drained — the caller must guarantee no shard is mid-command.
    pub fn reset(&self) {
        self.specs.pin().clear();
    }

    /// XOR-fold of each symbol's own state hash, matching
    /// `SymbolSpecificationProvider::GetStateHash`'s fold shape.
    pub fn state_hash(&self) -> u32 {
        let pinned = self.specs.pin();
        let mut hash = 0u32;
        for (symbol_id, spec) in pinned.iter() {
            let key_hash = hash_bytes(&symbol_id.to_be_bytes());
            hash ^= key_hash.rotate_left(1) ^ spec.state_hash().rotate_left(2);
        }
        hash
    }
}
