use crate::hash::{hash_bytes, xor_fold, StateHash};
use crate::types::{CurrencyId, SymbolId, UserId};
use flurry::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Whether a user may place orders. Suspension is a risk-engine level gate,
/// independent of any particular symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
}

impl From<u8> for UserStatus {
    fn from(val: u8) -> Self {
        match val {
            0 => Self::Active,
            1 => Self::Suspended,
            _ => unreachable!("invalid user status"),
        }
    }
}

impl From<UserStatus> for u8 {
    fn from(status: UserStatus) -> u8 {
        status as u8
    }
}

/// A margin position in one symbol. Grounded in the original's
/// `PositionRecord`, trimmed to the fields the core accounting formulas
/// need; full margin P&L computation is out of scope here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionRecord {
    pub symbol_id: SymbolId,
    /// Positive for long, negative for short, zero for flat.
    pub open_volume: i64,
    /// Volume-weighted sum of entry prices, for average price recovery.
    pub open_price_sum: i64,
}

impl StateHash for PositionRecord {
    fn state_hash(&self) -> u32 {
        let mut buf = Vec::with_capacity(20);
        buf.extend_from_slice(&self.symbol_id.to_be_bytes());
        buf.extend_from_slice(&self.open_volume.to_be_bytes());
        buf.extend_from_slice(&self.open_price_sum.to_be_bytes());
        hash_bytes(&buf)
    }
}

/// One user's account state: per-currency balances and per-symbol margin
/// positions. Grounded in `UserProfile.cpp`. Balances are held directly
/// (debited on risk pre-check hold, credited back on release/settlement)
/// rather than split into separate available/locked fields, matching the
/// original's single `accounts` map.
pub struct UserProfile {
    pub uid: UserId,
    status: AtomicU8,
    pub adjustments_counter: AtomicU64,
    accounts: HashMap<CurrencyId, i64>,
    positions: HashMap<SymbolId, PositionRecord>,
}

impl UserProfile {
    pub fn new(uid: UserId) -> Self {
        Self {
            uid,
            status: AtomicU8::new(UserStatus::Active.into()),
            adjustments_counter: AtomicU64::new(0),
            accounts: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    pub fn status(&self) -> UserStatus {
        self.status.load(Ordering::Acquire).into()
    }

    pub fn set_status(&self, status: UserStatus) {
        self.status.store(status.into(), Ordering::Release);
    }

    pub fn balance(&self, currency: CurrencyId) -> i64 {
        self.accounts.pin().get(&currency).copied().unwrap_or(0)
    }

    /// Applies `delta` to a currency balance (positive credit, negative
    /// debit). Returns the new balance.
    pub fn adjust_balance(&self, currency: CurrencyId, delta: i64) -> i64 {
        let accounts = self.accounts.pin();
        let current = accounts.get(&currency).copied().unwrap_or(0);
        let updated = current + delta;
        accounts.insert(currency, updated);
        self.adjustments_counter.fetch_add(1, Ordering::Relaxed);
        updated
    }

    pub fn position(&self, symbol_id: SymbolId) -> PositionRecord {
        self.positions
            .pin()
            .get(&symbol_id)
            .copied()
            .unwrap_or(PositionRecord {
                symbol_id,
                ..Default::default()
            })
    }

    pub fn set_position(&self, position: PositionRecord) {
        self.positions.pin().insert(position.symbol_id, position);
    }

    /// XOR-fold over accounts then positions, matching
    /// `UserProfile::GetStateHash`'s combination of both maps.
    pub fn state_hash(&self) -> u32 {
        let accounts_hash = xor_fold(
            self.accounts
                .pin()
                .iter()
                .map(|(&currency, &balance)| (currency as u64, Balance(balance))),
        );
        let positions_hash = xor_fold(
            self.positions
                .pin()
                .iter()
                .map(|(&symbol_id, &position)| (symbol_id as u64, position)),
        );
        accounts_hash ^ (positions_hash.rotate_left(1))
    }
}

struct Balance(i64);
impl StateHash for Balance {
    fn state_hash(&self) -> u32 {
        hash_bytes(&self.0.to_be_bytes())
    }
}
