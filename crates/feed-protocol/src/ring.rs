//! Consumer side of the shared-memory ring buffer.
//!
//! A co-located producer process owns a fixed-size segment laid out as
//! `i64 sequence, i64 from, i64 to` followed by a circular array of
//! [`RING_CAPACITY`] fixed-width records. This is a single-producer,
//! single-consumer debug path: no subscription gating, no symbol
//! filtering, raw dump of whatever the producer published.
//!
//! The record shape is independent of the UDP wire shape: wider
//! integer fields and text-encoded price/size. The two encodings are
//! not interoperable.
//!
//! Contract with the producer: a slot's bytes are fully written before
//! its index is covered by `to`. The consumer holds up its side by
//! reading `from` and `to` with acquire ordering through the mapped
//! header, rather than assuming plain loads are enough.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use memmap2::MmapRaw;

use crate::error::{FeedError, Result};

/// Slot count of the circular array, agreed with the producer.
pub const RING_CAPACITY: usize = 100_000;
/// Fixed width of one slot: six i64 fields plus two 16-byte text fields.
pub const RING_RECORD_LEN: usize = 80;
/// Segment header: sequence, from, to.
pub const RING_HEADER_LEN: usize = 24;
/// Width of the text-encoded price and size fields.
pub const FLOAT_TEXT_LEN: usize = 16;

const OFF_SEQUENCE: usize = 0;
const OFF_FROM: usize = 8;
const OFF_TO: usize = 16;

/// One decoded ring-buffer record. Price and size stay text as
/// published; parse them only where numbers are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingRecord {
    pub instrument_id: i64,
    pub kind: i64,
    pub tx_ms: i64,
    pub event_ms: i64,
    pub local_ns: i64,
    pub sn_id: i64,
    pub price: [u8; FLOAT_TEXT_LEN],
    pub size: [u8; FLOAT_TEXT_LEN],
}

impl RingRecord {
    pub fn price_text(&self) -> String {
        text_field(&self.price)
    }

    pub fn size_text(&self) -> String {
        text_field(&self.size)
    }

    pub fn price_f64(&self) -> Option<f64> {
        self.price_text().trim().parse().ok()
    }

    pub fn size_f64(&self) -> Option<f64> {
        self.size_text().trim().parse().ok()
    }
}

fn text_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn read_i64(data: &[u8], off: usize) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[off..off + 8]);
    i64::from_le_bytes(buf)
}

/// Decode one slot's bytes. Performs no numeric validation of the text
/// fields.
pub fn decode_ring_record(data: &[u8]) -> Result<RingRecord> {
    if data.len() < RING_RECORD_LEN {
        return Err(FeedError::TruncatedRecord {
            needed: RING_RECORD_LEN,
            got: data.len(),
        });
    }

    let mut price = [0u8; FLOAT_TEXT_LEN];
    let mut size = [0u8; FLOAT_TEXT_LEN];
    price.copy_from_slice(&data[48..48 + FLOAT_TEXT_LEN]);
    size.copy_from_slice(&data[64..64 + FLOAT_TEXT_LEN]);

    Ok(RingRecord {
        instrument_id: read_i64(data, 0),
        kind: read_i64(data, 8),
        tx_ms: read_i64(data, 16),
        event_ms: read_i64(data, 24),
        local_ns: read_i64(data, 32),
        sn_id: read_i64(data, 40),
        price,
        size,
    })
}

/// Encode a record into its 80-byte slot layout (producer-side shape,
/// used for fixtures and tooling).
pub fn encode_ring_record(record: &RingRecord) -> Vec<u8> {
    let mut slot = Vec::with_capacity(RING_RECORD_LEN);
    slot.extend_from_slice(&record.instrument_id.to_le_bytes());
    slot.extend_from_slice(&record.kind.to_le_bytes());
    slot.extend_from_slice(&record.tx_ms.to_le_bytes());
    slot.extend_from_slice(&record.event_ms.to_le_bytes());
    slot.extend_from_slice(&record.local_ns.to_le_bytes());
    slot.extend_from_slice(&record.sn_id.to_le_bytes());
    slot.extend_from_slice(&record.price);
    slot.extend_from_slice(&record.size);
    slot
}

pub struct RingBufferConsumer {
    map: MmapRaw,
    cursor: usize,
}

impl RingBufferConsumer {
    /// Map the segment at `path` and initialize the cursor from the
    /// producer-published `from` offset.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let map = MmapRaw::map_raw(&file)?;
        Self::from_map(map)
    }

    fn from_map(map: MmapRaw) -> Result<Self> {
        let needed = RING_HEADER_LEN + RING_CAPACITY * RING_RECORD_LEN;
        if map.len() < needed {
            return Err(FeedError::Segment(format!(
                "segment too small: need {needed} bytes, got {}",
                map.len()
            )));
        }

        let mut consumer = Self { map, cursor: 0 };
        consumer.cursor = consumer.load_offset(OFF_FROM);
        Ok(consumer)
    }

    /// Drain everything published since the last call. When the cursor
    /// catches up with `to` the iterator is exhausted; call again after
    /// a pause (the segment offers no blocking primitive).
    pub fn poll(&mut self) -> Drain<'_> {
        Drain { consumer: self }
    }

    /// Producer's published sequence counter.
    pub fn sequence(&self) -> i64 {
        self.header_atomic(OFF_SEQUENCE).load(Ordering::Acquire)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn header_atomic(&self, offset: usize) -> &AtomicI64 {
        // The mapping is page aligned and header fields sit at 8-byte
        // offsets, so the cast is well aligned.
        unsafe { &*(self.map.as_ptr().add(offset) as *const AtomicI64) }
    }

    fn load_offset(&self, offset: usize) -> usize {
        // Reduce modulo capacity so a corrupt header cannot index out
        // of the slot array.
        self.header_atomic(offset)
            .load(Ordering::Acquire)
            .rem_euclid(RING_CAPACITY as i64) as usize
    }

    fn copy_slot(&self, slot: usize) -> [u8; RING_RECORD_LEN] {
        let mut raw = [0u8; RING_RECORD_LEN];
        let offset = RING_HEADER_LEN + slot * RING_RECORD_LEN;
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.map.as_ptr().add(offset),
                raw.as_mut_ptr(),
                RING_RECORD_LEN,
            );
        }
        raw
    }
}

pub struct Drain<'a> {
    consumer: &'a mut RingBufferConsumer,
}

impl Iterator for Drain<'_> {
    type Item = RingRecord;

    fn next(&mut self) -> Option<RingRecord> {
        loop {
            // Reread `to` every step so slots published mid-drain are
            // picked up in the same call.
            let to = self.consumer.load_offset(OFF_TO);
            if self.consumer.cursor == to {
                return None;
            }

            let raw = self.consumer.copy_slot(self.consumer.cursor);
            self.consumer.cursor = (self.consumer.cursor + 1) % RING_CAPACITY;

            match decode_ring_record(&raw) {
                Ok(record) => return Some(record),
                Err(e) => {
                    // Unreachable for fixed-width slots, but a bad slot
                    // must never abort the drain.
                    tracing::warn!("dropping ring slot: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memmap2::MmapMut;

    const SEGMENT_LEN: usize = RING_HEADER_LEN + RING_CAPACITY * RING_RECORD_LEN;

    struct FakeSegment {
        map: MmapMut,
    }

    impl FakeSegment {
        fn new() -> Self {
            Self {
                map: MmapMut::map_anon(SEGMENT_LEN).unwrap(),
            }
        }

        fn set_header(&mut self, sequence: i64, from: i64, to: i64) {
            self.map[OFF_SEQUENCE..OFF_SEQUENCE + 8].copy_from_slice(&sequence.to_le_bytes());
            self.map[OFF_FROM..OFF_FROM + 8].copy_from_slice(&from.to_le_bytes());
            self.map[OFF_TO..OFF_TO + 8].copy_from_slice(&to.to_le_bytes());
        }

        fn write_slot(&mut self, slot: usize, record: &RingRecord) {
            let offset = RING_HEADER_LEN + slot * RING_RECORD_LEN;
            self.map[offset..offset + RING_RECORD_LEN]
                .copy_from_slice(&encode_ring_record(record));
        }

        fn consumer(self) -> RingBufferConsumer {
            RingBufferConsumer::from_map(MmapRaw::from(self.map)).unwrap()
        }
    }

    fn text16(s: &str) -> [u8; FLOAT_TEXT_LEN] {
        let mut buf = [0u8; FLOAT_TEXT_LEN];
        buf[..s.len()].copy_from_slice(s.as_bytes());
        buf
    }

    fn record(instrument_id: i64) -> RingRecord {
        RingRecord {
            instrument_id,
            kind: 3,
            tx_ms: 1,
            event_ms: 2,
            local_ns: 3,
            sn_id: 4,
            price: text16("60123.5"),
            size: text16("0.25"),
        }
    }

    #[test]
    fn slot_width_matches_producer_layout() {
        // Six i64 fields plus the two text fields; also the stride of
        // the slot array and the basis of the segment size check.
        assert_eq!(RING_RECORD_LEN, 6 * 8 + 2 * FLOAT_TEXT_LEN);
        assert_eq!(RING_RECORD_LEN, 80);
        assert_eq!(SEGMENT_LEN, 8_000_024);
    }

    #[test]
    fn ring_record_round_trip() {
        let original = record(1);
        let bytes = encode_ring_record(&original);
        assert_eq!(bytes.len(), RING_RECORD_LEN);
        assert_eq!(decode_ring_record(&bytes).unwrap(), original);
    }

    #[test]
    fn short_slot_is_truncated() {
        assert!(matches!(
            decode_ring_record(&[0u8; RING_RECORD_LEN - 1]),
            Err(FeedError::TruncatedRecord { .. })
        ));
    }

    #[test]
    fn text_fields_parse_to_numbers() {
        let rec = record(1);
        assert_eq!(rec.price_text(), "60123.5");
        assert_eq!(rec.size_text(), "0.25");
        assert_eq!(rec.price_f64(), Some(60123.5));
        assert_eq!(rec.size_f64(), Some(0.25));
    }

    #[test]
    fn unparseable_text_is_reported_as_none() {
        let mut rec = record(1);
        rec.price = text16("n/a");
        assert_eq!(rec.price_f64(), None);
    }

    #[test]
    fn undersized_segment_is_rejected() {
        let map = MmapMut::map_anon(RING_HEADER_LEN).unwrap();
        assert!(matches!(
            RingBufferConsumer::from_map(MmapRaw::from(map)),
            Err(FeedError::Segment(_))
        ));
    }

    #[test]
    fn poll_drains_published_slots_in_order() {
        let mut segment = FakeSegment::new();
        segment.write_slot(0, &record(10));
        segment.write_slot(1, &record(11));
        segment.write_slot(2, &record(12));
        segment.set_header(3, 0, 3);

        let mut consumer = segment.consumer();
        let drained: Vec<_> = consumer.poll().collect();
        assert_eq!(
            drained.iter().map(|r| r.instrument_id).collect::<Vec<_>>(),
            vec![10, 11, 12]
        );
        assert_eq!(consumer.sequence(), 3);

        // Nothing new published: the next poll is immediately empty.
        assert_eq!(consumer.poll().count(), 0);
        assert_eq!(consumer.cursor(), 3);
    }

    #[test]
    fn cursor_wraps_at_capacity() {
        let mut segment = FakeSegment::new();
        segment.write_slot(RING_CAPACITY - 1, &record(99));
        segment.set_header(1, (RING_CAPACITY - 1) as i64, 0);

        let mut consumer = segment.consumer();
        assert_eq!(consumer.cursor(), RING_CAPACITY - 1);

        let drained: Vec<_> = consumer.poll().collect();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].instrument_id, 99);
        assert_eq!(consumer.cursor(), 0);
    }

    #[test]
    fn attach_starts_from_producer_published_from() {
        let mut segment = FakeSegment::new();
        segment.write_slot(5, &record(50));
        segment.write_slot(6, &record(60));
        // Slots before `from` are stale and must not be replayed.
        segment.write_slot(4, &record(40));
        segment.set_header(7, 5, 7);

        let mut consumer = segment.consumer();
        let drained: Vec<_> = consumer.poll().collect();
        assert_eq!(
            drained.iter().map(|r| r.instrument_id).collect::<Vec<_>>(),
            vec![50, 60]
        );
    }
}
