use crate::symbol::{SymbolSpec, SymbolType};
use crate::types::{CurrencyId, SymbolId, UserId};
use bytes::{Buf, BufMut, BytesMut};

/// Big-endian length-prefixed wire framing for the two binary-batch
/// commands (spec.md §9), grounded in `BatchAddSymbolsCommand.cpp` /
/// `BatchAddAccountsCommand.cpp`'s `WriteMarshallable` pairing. Iteration
/// order of the maps inside a batch is NOT part of the wire contract (see
/// the REDESIGN note on binary-batch map order): decoding collects into
/// `Vec`s in wire order, and callers that need determinism sort or hash
/// them explicitly rather than relying on receipt order.
pub enum BinaryPayload {
    AddSymbols(Vec<SymbolSpec>),
    AddAccounts(Vec<(UserId, Vec<(CurrencyId, i64)>)>),
}

const TAG_ADD_SYMBOLS: u8 = 1;
const TAG_ADD_ACCOUNTS: u8 = 2;

impl BinaryPayload {
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        match self {
            BinaryPayload::AddSymbols(symbols) => {
                buf.put_u8(TAG_ADD_SYMBOLS);
                buf.put_u32(symbols.len() as u32);
                for spec in symbols {
                    encode_symbol(&mut buf, spec);
                }
            }
            BinaryPayload::AddAccounts(users) => {
                buf.put_u8(TAG_ADD_ACCOUNTS);
                buf.put_u32(users.len() as u32);
                for (uid, balances) in users {
                    buf.put_u64(*uid);
                    buf.put_u32(balances.len() as u32);
                    for (currency, amount) in balances {
                        buf.put_u32(*currency);
                        buf.put_i64(*amount);
                    }
                }
            }
        }
        buf
    }

    pub fn decode(mut buf: &[u8]) -> Option<Self> {
        if buf.is_empty() {
            return None;
        }
        let tag = buf.get_u8();
        match tag {
            TAG_ADD_SYMBOLS => {
                let count = buf.get_u32() as usize;
                let mut symbols = Vec::with_capacity(count);
                for _ in 0..count {
                    symbols.push(decode_symbol(&mut buf)?);
                }
                Some(BinaryPayload::AddSymbols(symbols))
            }
            TAG_ADD_ACCOUNTS => {
                let count = buf.get_u32() as usize;
                let mut users = Vec::with_capacity(count);
                for _ in 0..count {
                    let uid = buf.get_u64();
                    let balance_count = buf.get_u32() as usize;
                    let mut balances = Vec::with_capacity(balance_count);
                    for _ in 0..balance_count {
                        let currency = buf.get_u32();
                        let amount = buf.get_i64();
                        balances.push((currency, amount));
                    }
                    users.push((uid, balances));
                }
                Some(BinaryPayload::AddAccounts(users))
            }
            _ => None,
        }
    }
}

fn encode_symbol(buf: &mut BytesMut, spec: &SymbolSpec) {
    buf.put_u32(spec.symbol_id);
    buf.put_u8(matches!(spec.symbol_type, SymbolType::FuturesContract) as u8);
    buf.put_u32(spec.base_currency);
    buf.put_u32(spec.quote_currency);
    buf.put_i64(spec.base_scale);
    buf.put_i64(spec.quote_scale);
    buf.put_i64(spec.margin_buy);
    buf.put_i64(spec.margin_sell);
    buf.put_i64(spec.taker_fee);
    buf.put_i64(spec.maker_fee);
}

fn decode_symbol(buf: &mut &[u8]) -> Option<SymbolSpec> {
    if buf.remaining() < 4 + 1 + 4 + 4 + 8 * 6 {
        return None;
    }
    let symbol_id: SymbolId = buf.get_u32();
    let symbol_type = if buf.get_u8() == 1 {
        SymbolType::FuturesContract
    } else {
        SymbolType::CurrencyExchangePair
    };
    Some(SymbolSpec {
        symbol_id,
        symbol_type,
        base_currency: buf.get_u32(),
        quote_currency: buf.get_u32(),
        base_scale: buf.get_i64(),
        quote_scale: buf.get_i64(),
        margin_buy: buf.get_i64(),
        margin_sell: buf.get_i64(),
        taker_fee: buf.get_i64(),
        maker_fee: buf.get_i64(),
    })
}
