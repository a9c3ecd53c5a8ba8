/// Whether the risk engine enforces per-currency balance holds, or is
/// bypassed entirely (used for backtesting / matching-only benchmarks).
/// Grounded in `OrdersProcessingConfiguration.h`'s `RiskProcessingMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskProcessingMode {
    #[default]
    FullPerCurrency,
    NoRiskProcessing,
}

/// Whether margin positions are tracked at all for futures symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarginTradingMode {
    #[default]
    MarginTradingDisabled,
    MarginTradingEnabled,
}

/// Durability policy: whether commands are appended to the journal before
/// being acknowledged. Grounded in `SerializationConfiguration.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationConfig {
    pub enable_journaling: bool,
    pub snapshots_dir: Option<&'static str>,
}

impl SerializationConfig {
    pub const fn default_disk() -> Self {
        Self {
            enable_journaling: true,
            snapshots_dir: None,
        }
    }

    pub const fn disk_snapshot_only() -> Self {
        Self {
            enable_journaling: false,
            snapshots_dir: None,
        }
    }

    pub const fn in_memory() -> Self {
        Self {
            enable_journaling: false,
            snapshots_dir: None,
        }
    }
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Top-level exchange core configuration, threaded through pipeline
/// construction. Grounded in `OrdersProcessingConfiguration.h`'s `Default`.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeConfig {
    pub risk_processing_mode: RiskProcessingMode,
    pub margin_trading_mode: MarginTradingMode,
    pub serialization: SerializationConfig,
    /// Number of symbol shards (matching engine instances). Each symbol is
    /// pinned to exactly one shard for its lifetime.
    pub matching_shards: usize,
    /// Number of risk shards (users are partitioned by uid across these).
    pub risk_shards: usize,
    /// Ring buffer capacity; must be a power of two.
    pub ring_capacity: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            risk_processing_mode: RiskProcessingMode::FullPerCurrency,
            margin_trading_mode: MarginTradingMode::MarginTradingDisabled,
            serialization: SerializationConfig::default(),
            matching_shards: 1,
            risk_shards: 1,
            ring_capacity: 1 << 16,
        }
    }
}

impl ExchangeConfig {
    /// A configuration for unit/integration tests: single-shard, no
    /// journaling, small ring.
    pub fn for_testing() -> Self {
        Self {
            ring_capacity: 1 << 10,
            ..Self::default()
        }
    }
}
