//! Wire and in-process types shared by the producer and the sink.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Header frame accompanying every data-channel chunk.
///
/// `chunkid` starts at 1 for the first row of a run and increases
/// monotonically. A `chunkid` of `-1` paired with an empty `Row` is the
/// in-process termination sentinel exchanged between the network loop and
/// the disk thread; it must never be sent on the wire ([`ProtocolError::SentinelOnWire`]
/// guards that).
///
/// [`ProtocolError::SentinelOnWire`]: crate::ProtocolError::SentinelOnWire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkHeader {
    pub guid: String,
    pub chunkid: i64,
}

impl ChunkHeader {
    pub fn new(guid: impl Into<String>, chunkid: i64) -> Self {
        Self {
            guid: guid.into(),
            chunkid,
        }
    }

    /// The in-process termination sentinel.
    pub fn sentinel() -> Self {
        Self {
            guid: String::new(),
            chunkid: -1,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.chunkid == -1
    }
}

/// A single value carried by a [`Row`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RowValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for RowValue {
    /// Textualizes a value in its natural decimal form: integers print
    /// without a decimal point, floats via the default float `Display`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValue::Int(v) => write!(f, "{v}"),
            RowValue::Float(v) => write!(f, "{v}"),
            RowValue::Text(v) => write!(f, "{v}"),
            RowValue::Bytes(v) => write!(f, "{}", String::from_utf8_lossy(v)),
        }
    }
}

impl From<i64> for RowValue {
    fn from(v: i64) -> Self {
        RowValue::Int(v)
    }
}

impl From<f64> for RowValue {
    fn from(v: f64) -> Self {
        RowValue::Float(v)
    }
}

impl From<String> for RowValue {
    fn from(v: String) -> Self {
        RowValue::Text(v)
    }
}

impl From<&str> for RowValue {
    fn from(v: &str) -> Self {
        RowValue::Text(v.to_string())
    }
}

/// An ordered collection of (column-name, value) pairs representing one
/// measurement sample.
///
/// The set and ordering of columns within one run is fixed by the first
/// row of that run; later rows may present their pairs in any order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Row(Vec<(String, RowValue)>);

impl Row {
    pub fn new(pairs: Vec<(String, RowValue)>) -> Self {
        Self(pairs)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn pairs(&self) -> &[(String, RowValue)] {
        &self.0
    }

    pub fn into_pairs(self) -> Vec<(String, RowValue)> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The column names in this row's own pair order.
    pub fn column_names(&self) -> Vec<String> {
        self.0.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Reorders this row's pairs to match `order`, looking each column up
    /// by name. Columns in `order` absent from this row are silently
    /// skipped; this mirrors a run where every row declares the same
    /// column set (the only case the spec's column-reordering property
    /// exercises).
    pub fn canonicalize(&self, order: &[String]) -> Row {
        let mut canonical = Vec::with_capacity(order.len());
        for name in order {
            if let Some((_, value)) = self.0.iter().find(|(n, _)| n == name) {
                canonical.push((name.clone(), value.clone()));
            }
        }
        Row(canonical)
    }
}

/// Sent by the producer on the request channel. The sink adopts
/// `timeout_seconds + 1` as its new idle timeout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LivenessRequest {
    #[serde(rename = "timeout")]
    pub timeout_seconds: f64,
}

/// `req_port = push_port + 1` always holds for a valid pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPair {
    pub push_port: u16,
    pub req_port: u16,
}

impl PortPair {
    pub fn new(push_port: u16) -> Self {
        Self {
            push_port,
            req_port: push_port + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_round_trips_through_is_sentinel() {
        let sentinel = ChunkHeader::sentinel();
        assert!(sentinel.is_sentinel());
        assert!(!ChunkHeader::new("g", 1).is_sentinel());
    }

    #[test]
    fn row_canonicalize_matches_spec_example() {
        let r1 = Row::new(vec![
            ("a".into(), RowValue::Int(1)),
            ("b".into(), RowValue::Int(2)),
            ("c".into(), RowValue::Int(3)),
        ]);
        let r2 = Row::new(vec![
            ("c".into(), RowValue::Int(30)),
            ("a".into(), RowValue::Int(10)),
            ("b".into(), RowValue::Int(20)),
        ]);
        let order = r1.column_names();
        let canonical = r2.canonicalize(&order);
        let values: Vec<i64> = canonical
            .pairs()
            .iter()
            .map(|(_, v)| match v {
                RowValue::Int(n) => *n,
                _ => panic!("expected int"),
            })
            .collect();
        assert_eq!(values, vec![10, 20, 30]);
    }

    #[test]
    fn row_value_display_uses_natural_decimal_form() {
        assert_eq!(RowValue::Int(0).to_string(), "0");
        assert_eq!(RowValue::Int(8).to_string(), "8");
        assert_eq!(RowValue::Float(1.5).to_string(), "1.5");
    }

    #[test]
    fn port_pair_is_adjacent() {
        let pair = PortPair::new(6000);
        assert_eq!(pair.push_port, 6000);
        assert_eq!(pair.req_port, 6001);
    }
}
