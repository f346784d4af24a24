//! Snowflake identifiers for users, posts and replies.
//!
//! Layout of the 63 usable bits:
//! - bits 63-22: milliseconds since [`Snowflake::EPOCH`]
//! - bits 21-12: worker id (0-1023)
//! - bits 11-0:  per-millisecond sequence (0-4095)
//!
//! Ids are serialized as JSON strings so browser clients never lose precision.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const WORKER_BITS: i64 = 10;
const SEQUENCE_BITS: i64 = 12;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;
const MAX_WORKER_ID: u16 = (1 << WORKER_BITS) - 1;

/// 64-bit time-ordered identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(i64);

impl Snowflake {
    /// 2025-01-01 00:00:00 UTC in milliseconds
    pub const EPOCH: i64 = 1_735_689_600_000;

    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Milliseconds since the Unix epoch at which this id was minted
    #[inline]
    pub fn timestamp(&self) -> i64 {
        (self.0 >> (WORKER_BITS + SEQUENCE_BITS)) + Self::EPOCH
    }

    #[inline]
    pub fn worker_id(&self) -> u16 {
        ((self.0 >> SEQUENCE_BITS) & i64::from(MAX_WORKER_ID)) as u16
    }

    #[inline]
    pub fn sequence(&self) -> u16 {
        (self.0 & SEQUENCE_MASK) as u16
    }

    /// Parse the decimal string form used on the wire
    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        match s.trim().parse::<i64>() {
            Ok(v) if v >= 0 => Ok(Self(v)),
            Ok(_) => Err(SnowflakeParseError::Negative),
            Err(_) => Err(SnowflakeParseError::InvalidFormat),
        }
    }
}

/// Error when parsing a Snowflake from its string form
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("invalid snowflake format")]
    InvalidFormat,
    #[error("snowflake must not be negative")]
    Negative,
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Snowflake {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for i64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl std::str::FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(i64),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Int(v) => Ok(Self(v)),
            Repr::Str(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// Lock-free Snowflake generator.
///
/// The last issued `(millis, sequence)` pair is packed into a single atomic so
/// concurrent callers advance it with one compare-exchange. When the clock
/// stalls, runs backwards, or the sequence for the current millisecond is
/// exhausted, the generator borrows from the next millisecond instead of
/// sleeping, so ids stay strictly increasing.
#[derive(Debug)]
pub struct SnowflakeGenerator {
    worker_id: u16,
    state: AtomicI64,
}

impl SnowflakeGenerator {
    /// # Panics
    /// Panics if `worker_id` does not fit in 10 bits.
    pub fn new(worker_id: u16) -> Self {
        assert!(worker_id <= MAX_WORKER_ID, "Worker ID must be < 1024");
        Self {
            worker_id,
            state: AtomicI64::new(0),
        }
    }

    pub fn generate(&self) -> Snowflake {
        let mut prev = self.state.load(Ordering::Acquire);
        loop {
            let now = Self::millis_since_epoch();
            let prev_millis = prev >> SEQUENCE_BITS;
            let next = if now > prev_millis {
                now << SEQUENCE_BITS
            } else if prev & SEQUENCE_MASK < SEQUENCE_MASK {
                prev + 1
            } else {
                (prev_millis + 1) << SEQUENCE_BITS
            };

            match self
                .state
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    let millis = next >> SEQUENCE_BITS;
                    let sequence = next & SEQUENCE_MASK;
                    return Snowflake::new(
                        (millis << (WORKER_BITS + SEQUENCE_BITS))
                            | (i64::from(self.worker_id) << SEQUENCE_BITS)
                            | sequence,
                    );
                }
                Err(actual) => prev = actual,
            }
        }
    }

    pub fn worker_id(&self) -> u16 {
        self.worker_id
    }

    fn millis_since_epoch() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64 - Snowflake::EPOCH)
            .unwrap_or(0)
            .max(0)
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_parse_rejects_garbage_and_negatives() {
        assert_eq!(Snowflake::parse("42").unwrap(), Snowflake::new(42));
        assert_eq!(Snowflake::parse("abc"), Err(SnowflakeParseError::InvalidFormat));
        assert_eq!(Snowflake::parse("-5"), Err(SnowflakeParseError::Negative));
    }

    #[test]
    fn test_json_uses_strings_but_accepts_numbers() {
        let sf = Snowflake::new(998_877_665_544_332_211);
        assert_eq!(serde_json::to_string(&sf).unwrap(), "\"998877665544332211\"");

        let from_str: Snowflake = serde_json::from_str("\"17\"").unwrap();
        let from_num: Snowflake = serde_json::from_str("17").unwrap();
        assert_eq!(from_str, from_num);
    }

    #[test]
    fn test_generator_is_strictly_increasing() {
        let gen = SnowflakeGenerator::new(3);
        let mut last = Snowflake::default();
        for _ in 0..10_000 {
            let id = gen.generate();
            assert!(id > last);
            assert_eq!(id.worker_id(), 3);
            last = id;
        }
    }

    #[test]
    fn test_generator_unique_across_threads() {
        let gen = Arc::new(SnowflakeGenerator::new(1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gen = Arc::clone(&gen);
                thread::spawn(move || (0..2_000).map(|_| gen.generate()).collect::<Vec<_>>())
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(ids.len(), 8_000);
    }

    #[test]
    fn test_timestamp_round_trips_through_id() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64;
        let id = SnowflakeGenerator::new(0).generate();
        // borrowing from the next millisecond can push the stamp slightly ahead
        assert!(id.timestamp() >= before);
        assert!(id.timestamp() - before < 1_000);
    }

    #[test]
    #[should_panic(expected = "Worker ID must be < 1024")]
    fn test_generator_rejects_wide_worker_id() {
        let _ = SnowflakeGenerator::new(1024);
    }
}
