use crate::api::{Command, CommandResult};
use crate::config::ExchangeConfig;
use crate::error::JournalError;
use crate::journal::{DummySerializationProcessor, SerializationProcessor};
use crate::matching::MatchingEngine;
use crate::pipeline::command::CommandSlot;
use crate::pipeline::ring::RingBuffer;
use crate::pipeline::stages;
use crate::risk::RiskEngine;
use crate::symbol::{SymbolSpec, SymbolSpecificationProvider};
use crate::types::SymbolId;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Drives one command end to end through all five pipeline stages
/// (spec.md §4.1). A single `Pipeline` owns the full state of one
/// exchange core instance: the ring buffer of in-flight command slots,
/// the risk engine, the symbol registry, one matching shard per symbol,
/// and the journal. Stages run sequentially on whichever thread calls
/// `submit`; the `RingBuffer`'s cursor-gated contract is what a
/// multi-threaded deployment would use to run each stage on its own
/// thread instead, without changing the stage functions in
/// `pipeline::stages`.
pub struct Pipeline {
    ring: RingBuffer<CommandSlot>,
    risk: RiskEngine,
    symbols: SymbolSpecificationProvider,
    matching: HashMap<SymbolId, MatchingEngine>,
    journal: Box<dyn SerializationProcessor>,
}

impl Pipeline {
    pub fn new(config: ExchangeConfig) -> Self {
        Self {
            ring: RingBuffer::new(config.ring_capacity),
            risk: RiskEngine::new(config.risk_processing_mode),
            symbols: SymbolSpecificationProvider::new(),
            matching: HashMap::new(),
            journal: Box::new(DummySerializationProcessor::new()),
        }
    }

    pub fn with_journal(mut self, journal: Box<dyn SerializationProcessor>) -> Self {
        self.journal = journal;
        self
    }

    pub fn for_testing() -> Self {
        Self::new(ExchangeConfig::for_testing())
    }

    pub fn add_symbol(&mut self, spec: SymbolSpec) -> bool {
        let symbol_id = spec.symbol_id;
        if !self.symbols.add_symbol(spec) {
            return false;
        }
        self.matching
            .entry(symbol_id)
            .or_insert_with(|| MatchingEngine::new(symbol_id));
        true
    }

    pub fn add_user(&self, uid: u64) -> bool {
        self.risk.add_user(uid)
    }

    pub fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    pub fn symbols(&self) -> &SymbolSpecificationProvider {
        &self.symbols
    }

    /// Claims the next ring slot, journals the command, and drives it
    /// through risk pre-check, matching, and risk post-settlement, then
    /// publishes the final result on the slot. Returns the result directly
    /// as well, since this implementation runs every stage inline rather
    /// than requiring the caller to poll the ring.
    pub fn submit(&mut self, command: Command) -> Result<CommandResult, JournalError> {
        let seq = self.ring.claim();
        let mut slot = CommandSlot::new(seq, command.clone());

        stages::journal_stage(self.journal.as_ref(), &slot).inspect_err(|err| {
            tracing::error!(seq, %err, "journal write failed");
        })?;

        if let Some(result) = stages::risk_pre_check_stage(&self.risk, &self.symbols, &slot.command)
        {
            tracing::debug!(seq, ?result, "rejected at risk pre-check");
            stages::result_aggregator_stage(&mut slot, result.clone());
            self.publish(seq, slot);
            return Ok(result);
        }

        let (result, hold_price) = match slot.command.symbol_id() {
            Some(symbol_id) => match self.matching.get_mut(&symbol_id) {
                Some(engine) => stages::matching_stage(engine, &slot.command, now_micros()),
                None => (
                    CommandResult::Rejected(crate::error::RejectReason::UnknownSymbol, Vec::new()),
                    None,
                ),
            },
            None => (self.dispatch_admin(&slot.command), None),
        };

        stages::risk_post_settlement_stage(
            &self.risk,
            &self.symbols,
            &slot.command,
            &result,
            hold_price,
        );
        stages::result_aggregator_stage(&mut slot, result.clone());
        self.publish(seq, slot);
        Ok(result)
    }

    fn dispatch_admin(&self, command: &Command) -> CommandResult {
        match command {
            Command::AddUser { uid } => {
                self.risk.add_user(*uid);
                CommandResult::Success { events: Vec::new() }
            }
            Command::SuspendUser { uid } => match self.risk.suspend_user(*uid) {
                Ok(()) => CommandResult::Success { events: Vec::new() },
                Err(err) => CommandResult::RiskRejected(err),
            },
            Command::ResumeUser { uid } => match self.risk.resume_user(*uid) {
                Ok(()) => CommandResult::Success { events: Vec::new() },
                Err(err) => CommandResult::RiskRejected(err),
            },
            // Batching/grouping is an application-level deployment concern
            // this single-threaded pipeline doesn't need: every command
            // already runs to completion before the next one is claimed.
            Command::GroupingControl { .. } => CommandResult::Success { events: Vec::new() },
            Command::AdjustUserBalance {
                uid,
                currency,
                amount,
            } => match self.risk.adjust_balance(*uid, *currency, *amount) {
                Ok(_) => CommandResult::Success { events: Vec::new() },
                Err(err) => CommandResult::RiskRejected(err),
            },
            Command::Reset | Command::NoOp => CommandResult::Success { events: Vec::new() },
            _ => CommandResult::UnsupportedCommand,
        }
    }

    fn publish(&self, seq: i64, slot: CommandSlot) {
        unsafe {
            self.ring.write(seq, slot);
        }
        self.ring.publish(seq);
    }

    /// Reads back a previously published slot's result, for callers that
    /// submitted asynchronously and are now polling.
    pub fn result_of(&self, seq: i64) -> Option<CommandResult> {
        self.ring.get(seq).and_then(|slot| slot.result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolType;
    use crate::types::{OrderKind, Side};

    fn spec(symbol_id: SymbolId) -> SymbolSpec {
        SymbolSpec {
            symbol_id,
            symbol_type: SymbolType::CurrencyExchangePair,
            base_currency: 1,
            quote_currency: 2,
            base_scale: 1,
            quote_scale: 1,
            margin_buy: 0,
            margin_sell: 0,
            taker_fee: 0,
            maker_fee: 0,
        }
    }

    #[test]
    fn place_order_rejects_unknown_symbol() {
        let mut pipeline = Pipeline::for_testing();
        pipeline.add_user(1);
        let result = pipeline
            .submit(Command::PlaceOrder {
                order_id: 1,
                uid: 1,
                symbol_id: 99,
                side: Side::Bid,
                kind: OrderKind::Gtc,
                price: 100,
                size: 1,
                reserve_bid_price: None,
            })
            .unwrap();
        assert!(matches!(
            result,
            CommandResult::Rejected(crate::error::RejectReason::UnknownSymbol, _)
        ));
    }

    #[test]
    fn place_order_rejects_insufficient_funds() {
        let mut pipeline = Pipeline::for_testing();
        pipeline.add_symbol(spec(1));
        pipeline.add_user(1);
        let result = pipeline
            .submit(Command::PlaceOrder {
                order_id: 1,
                uid: 1,
                symbol_id: 1,
                side: Side::Bid,
                kind: OrderKind::Gtc,
                price: 100,
                size: 10,
                reserve_bid_price: None,
            })
            .unwrap();
        assert!(matches!(
            result,
            CommandResult::RiskRejected(crate::error::RiskError::InsufficientFunds)
        ));
    }

    #[test]
    fn two_crossing_orders_produce_a_trade() {
        let mut pipeline = Pipeline::for_testing();
        pipeline.add_symbol(spec(1));
        pipeline.add_user(1);
        pipeline.add_user(2);
        pipeline.risk().adjust_balance(1, 1, 1_000).unwrap();
        pipeline.risk().adjust_balance(2, 2, 1_000).unwrap();

        pipeline
            .submit(Command::PlaceOrder {
                order_id: 1,
                uid: 1,
                symbol_id: 1,
                side: Side::Ask,
                kind: OrderKind::Gtc,
                price: 100,
                size: 5,
                reserve_bid_price: None,
            })
            .unwrap();

        let result = pipeline
            .submit(Command::PlaceOrder {
                order_id: 2,
                uid: 2,
                symbol_id: 1,
                side: Side::Bid,
                kind: OrderKind::Gtc,
                price: 100,
                size: 5,
                reserve_bid_price: None,
            })
            .unwrap();

        match result {
            CommandResult::Success { events } => assert_eq!(events.len(), 1),
            other => panic!("expected a fill, got {other:?}"),
        }
    }

    #[test]
    fn order_book_request_returns_l2_snapshot() {
        let mut pipeline = Pipeline::for_testing();
        pipeline.add_symbol(spec(1));
        pipeline.add_user(1);
        pipeline.risk().adjust_balance(1, 1, 1_000).unwrap();
        pipeline
            .submit(Command::PlaceOrder {
                order_id: 1,
                uid: 1,
                symbol_id: 1,
                side: Side::Ask,
                kind: OrderKind::Gtc,
                price: 100,
                size: 5,
                reserve_bid_price: None,
            })
            .unwrap();

        let result = pipeline
            .submit(Command::OrderBookRequest {
                symbol_id: 1,
                depth: 10,
            })
            .unwrap();
        match result {
            CommandResult::BookSnapshot(snapshot) => {
                assert_eq!(snapshot.asks.len(), 1);
                assert_eq!(snapshot.asks[0].price, 100);
            }
            other => panic!("expected a book snapshot, got {other:?}"),
        }
    }
}
