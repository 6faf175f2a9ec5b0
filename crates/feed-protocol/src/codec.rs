//! Binary codec for the UDP data channel.
//!
//! Two fixed little-endian record shapes share a 56-byte layout:
//!
//! - ticker/trade: `i32 kind, u32 index, i64 tx_ms, i64 event_ms,
//!   i64 local_ns, i64 sn_id, f64 price, f64 size`
//! - depth: same first 40 bytes, then
//!   `u32 asks_offset, u32 ask_count, u32 bids_offset, u32 bid_count`,
//!   followed by `ask_count + bid_count` 16-byte `(f64 price, f64 size)`
//!   levels, asks first then bids.
//!
//! There is no envelope beyond the datagram boundary. All decode
//! functions are pure and never panic on short input.

use market_types::DepthLevel;

use crate::error::{FeedError, Result};

/// `kind == ±1`: top-of-book bid/ask.
pub const KIND_QUOTE: i32 = 1;
/// `kind == 2`: depth snapshot.
pub const KIND_DEPTH: i32 = 2;
/// `kind == ±3`: buy/sell trade.
pub const KIND_TRADE: i32 = 3;

/// Size of a ticker/trade record and of the depth header.
pub const RECORD_LEN: usize = 56;
/// Size of one depth level pair.
pub const LEVEL_LEN: usize = 16;
/// Minimum bytes needed to peek `(kind, index)` off a data datagram.
pub const PREFIX_LEN: usize = 8;

/// A decoded top-of-book quote or trade record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickerRecord {
    pub kind: i32,
    pub index: u32,
    pub tx_ms: i64,
    pub event_ms: i64,
    pub local_ns: i64,
    /// Sequence number for quotes, trade id for trades.
    pub sn_id: i64,
    pub price: f64,
    pub size: f64,
}

/// The fixed header of a depth record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthRecord {
    pub kind: i32,
    pub index: u32,
    pub tx_ms: i64,
    pub event_ms: i64,
    pub local_ns: i64,
    pub sn_id: i64,
    /// Published by the feed but carries no information.
    pub asks_offset: u32,
    pub ask_count: u32,
    /// Published by the feed but carries no information.
    pub bids_offset: u32,
    pub bid_count: u32,
}

fn read_i32(data: &[u8], off: usize) -> i32 {
    i32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

fn read_u32(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

fn read_i64(data: &[u8], off: usize) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[off..off + 8]);
    i64::from_le_bytes(buf)
}

fn read_f64(data: &[u8], off: usize) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[off..off + 8]);
    f64::from_le_bytes(buf)
}

/// Extract the `(kind, index)` prefix shared by every data record, or
/// `None` if the datagram is too short to carry one.
pub fn peek_kind_index(data: &[u8]) -> Option<(i32, u32)> {
    if data.len() < PREFIX_LEN {
        return None;
    }
    Some((read_i32(data, 0), read_u32(data, 4)))
}

/// Decode a 56-byte ticker/trade record.
pub fn decode_ticker_or_trade(data: &[u8]) -> Result<TickerRecord> {
    if data.len() < RECORD_LEN {
        return Err(FeedError::TruncatedRecord {
            needed: RECORD_LEN,
            got: data.len(),
        });
    }

    Ok(TickerRecord {
        kind: read_i32(data, 0),
        index: read_u32(data, 4),
        tx_ms: read_i64(data, 8),
        event_ms: read_i64(data, 16),
        local_ns: read_i64(data, 24),
        sn_id: read_i64(data, 32),
        price: read_f64(data, 40),
        size: read_f64(data, 48),
    })
}

/// Decode a depth record: 56-byte header plus `ask_count + bid_count`
/// levels, asks first then bids, order preserved.
pub fn decode_depth(data: &[u8]) -> Result<(DepthRecord, Vec<DepthLevel>)> {
    if data.len() < RECORD_LEN {
        return Err(FeedError::TruncatedRecord {
            needed: RECORD_LEN,
            got: data.len(),
        });
    }

    let header = DepthRecord {
        kind: read_i32(data, 0),
        index: read_u32(data, 4),
        tx_ms: read_i64(data, 8),
        event_ms: read_i64(data, 16),
        local_ns: read_i64(data, 24),
        sn_id: read_i64(data, 32),
        asks_offset: read_u32(data, 40),
        ask_count: read_u32(data, 44),
        bids_offset: read_u32(data, 48),
        bid_count: read_u32(data, 52),
    };

    let total_levels = header.ask_count as usize + header.bid_count as usize;
    let needed = RECORD_LEN + total_levels * LEVEL_LEN;
    if data.len() < needed {
        return Err(FeedError::TruncatedRecord {
            needed,
            got: data.len(),
        });
    }

    let mut levels = Vec::with_capacity(total_levels);
    let mut offset = RECORD_LEN;
    for _ in 0..total_levels {
        levels.push(DepthLevel {
            price: read_f64(data, offset),
            size: read_f64(data, offset + 8),
        });
        offset += LEVEL_LEN;
    }

    Ok((header, levels))
}

/// Encode a ticker/trade record into its 56-byte wire layout.
pub fn encode_ticker_or_trade(record: &TickerRecord) -> Vec<u8> {
    let mut packet = Vec::with_capacity(RECORD_LEN);
    packet.extend_from_slice(&record.kind.to_le_bytes());
    packet.extend_from_slice(&record.index.to_le_bytes());
    packet.extend_from_slice(&record.tx_ms.to_le_bytes());
    packet.extend_from_slice(&record.event_ms.to_le_bytes());
    packet.extend_from_slice(&record.local_ns.to_le_bytes());
    packet.extend_from_slice(&record.sn_id.to_le_bytes());
    packet.extend_from_slice(&record.price.to_le_bytes());
    packet.extend_from_slice(&record.size.to_le_bytes());
    packet
}

/// Encode a depth record and its levels. `asks` and `bids` must match
/// the counts in `header`.
pub fn encode_depth(header: &DepthRecord, asks: &[DepthLevel], bids: &[DepthLevel]) -> Vec<u8> {
    let total = asks.len() + bids.len();
    let mut packet = Vec::with_capacity(RECORD_LEN + total * LEVEL_LEN);
    packet.extend_from_slice(&header.kind.to_le_bytes());
    packet.extend_from_slice(&header.index.to_le_bytes());
    packet.extend_from_slice(&header.tx_ms.to_le_bytes());
    packet.extend_from_slice(&header.event_ms.to_le_bytes());
    packet.extend_from_slice(&header.local_ns.to_le_bytes());
    packet.extend_from_slice(&header.sn_id.to_le_bytes());
    packet.extend_from_slice(&header.asks_offset.to_le_bytes());
    packet.extend_from_slice(&header.ask_count.to_le_bytes());
    packet.extend_from_slice(&header.bids_offset.to_le_bytes());
    packet.extend_from_slice(&header.bid_count.to_le_bytes());
    for level in asks.iter().chain(bids) {
        packet.extend_from_slice(&level.price.to_le_bytes());
        packet.extend_from_slice(&level.size.to_le_bytes());
    }
    packet
}
