//! # Raw Snapshot
//!
//! One validated CREST2 payload plus typed optional-path lookups over it.
//!
//! The CREST2 API returns a loosely structured JSON tree whose sections come
//! and go depending on what the game is doing. Nothing here enforces a schema:
//! every lookup walks a path and yields `None` as soon as a segment is missing
//! or the leaf has the wrong type.

use serde_json::Value;

/// Top-level key every valid CREST2 response carries
pub const TIMESTAMP_KEY: &str = "timestamp";

/// A single JSON path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Object member lookup
    Key(&'a str),
    /// Array element lookup
    Index(usize),
}

impl<'a> From<&'a str> for Segment<'a> {
    fn from(key: &'a str) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment<'_> {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Walk `path` from `root`, returning the node if every segment is present
pub fn lookup<'v>(root: &'v Value, path: &[Segment<'_>]) -> Option<&'v Value> {
    path.iter().try_fold(root, |node, segment| match segment {
        Segment::Key(key) => node.as_object()?.get(*key),
        Segment::Index(index) => node.as_array()?.get(*index),
    })
}

/// Convert a leaf to an integer, accepting integral floats (`3.0`)
pub fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

/// JavaScript-style truthiness of an optional leaf
///
/// Absent, `null`, `false`, `0` and `""` are falsy. Objects and arrays are truthy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// A validated telemetry payload from the CREST2 endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RawSnapshot {
    root: Value,
}

impl RawSnapshot {
    /// Parse and validate a response body
    ///
    /// Returns `None` unless the body is a JSON object containing a top-level
    /// `timestamp` key. Invalid bodies are "no data", not errors.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let root: Value = serde_json::from_slice(body).ok()?;
        Self::from_value(root)
    }

    /// Validate an already parsed JSON tree
    pub fn from_value(root: Value) -> Option<Self> {
        if root.as_object()?.contains_key(TIMESTAMP_KEY) {
            Some(Self { root })
        } else {
            None
        }
    }

    /// The underlying JSON tree
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Node at `path`, if present
    pub fn get(&self, path: &[Segment<'_>]) -> Option<&Value> {
        lookup(&self.root, path)
    }

    /// String leaf at `path`
    pub fn str_at(&self, path: &[Segment<'_>]) -> Option<&str> {
        self.get(path)?.as_str()
    }

    /// Integer leaf at `path`
    pub fn int_at(&self, path: &[Segment<'_>]) -> Option<i64> {
        self.get(path).and_then(as_integer)
    }

    /// Numeric leaf at `path`
    pub fn float_at(&self, path: &[Segment<'_>]) -> Option<f64> {
        self.get(path)?.as_f64()
    }
}

/// Build a `&[Segment]` path from string keys and integer indices
///
/// ```
/// use crest_logger::path;
/// use crest_logger::crest::snapshot::Segment;
///
/// let p = path!["participants", "mParticipantInfo", 0usize, "mName"];
/// assert_eq!(p[2], Segment::Index(0));
/// ```
#[macro_export]
macro_rules! path {
    ($($segment:expr),* $(,)?) => {
        [$($crate::crest::snapshot::Segment::from($segment)),*]
    };
}
