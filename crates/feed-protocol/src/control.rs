//! Text codec for the subscription control channel.
//!
//! Subscribe is the raw symbol bytes, unsubscribe is `-` followed by the
//! symbol, and the feed acknowledges with `<index>:<symbol>`.

use crate::error::{FeedError, Result};

pub fn encode_subscribe(symbol: &str) -> Vec<u8> {
    symbol.as_bytes().to_vec()
}

pub fn encode_unsubscribe(symbol: &str) -> Vec<u8> {
    format!("-{symbol}").into_bytes()
}

/// Parse a subscription ack of the form `<decimal-index>:<symbol>`.
pub fn decode_subscription_ack(data: &[u8]) -> Result<(u32, String)> {
    let text = std::str::from_utf8(data)
        .map_err(|_| FeedError::MalformedAck(String::from_utf8_lossy(data).into_owned()))?;

    let line = text.trim_end_matches(['\r', '\n', '\0']);
    let (index, symbol) = line
        .split_once(':')
        .ok_or_else(|| FeedError::MalformedAck(line.to_string()))?;

    let index = index
        .parse::<u32>()
        .map_err(|_| FeedError::MalformedAck(line.to_string()))?;

    if symbol.is_empty() {
        return Err(FeedError::MalformedAck(line.to_string()));
    }

    Ok((index, symbol.to_string()))
}
