//! Per-node feature annotations
//!
//! A `FeatureMap` is an ordered set of `key=value` string pairs. Insertion
//! order is preserved so that serialization is canonical:
//! `key1=value1|key2=value2`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Separator between entries
pub const ENTRY_DELIM: char = '|';
/// Separator between a key and its value
pub const PAIR_DELIM: char = '=';
/// Empty-field marker used by tabular input
pub const EMPTY_FIELD: &str = "_";

/// Malformed segment in a serialized feature map
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed feature segment `{segment}`: {reason}")]
pub struct ParseError {
    pub segment: String,
    pub reason: &'static str,
}

/// Ordered string-to-string annotation store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureMap {
    entries: Vec<(String, String)>,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.entries[i].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert or overwrite a value, returning the previous one.
    ///
    /// An existing key keeps its position. The key must be non-empty and
    /// neither key nor value may contain `=` or `|`, or the serialized map
    /// will not parse back. `try_insert` checks both.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Like `insert`, but rejects keys and values that would not serialize
    pub fn try_insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, ParseError> {
        let key = key.into();
        let value = value.into();
        let malformed = |reason| ParseError {
            segment: format!("{}{}{}", key, PAIR_DELIM, value),
            reason,
        };

        if key.is_empty() {
            return Err(malformed("empty key"));
        }
        if key.contains([PAIR_DELIM, ENTRY_DELIM]) {
            return Err(malformed("reserved character in key"));
        }
        if value.contains([PAIR_DELIM, ENTRY_DELIM]) {
            return Err(malformed("reserved character in value"));
        }

        Ok(self.insert(key, value))
    }

    /// Remove a key if present
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let i = self.position(key)?;
        Some(self.entries.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// Split one `key=value` segment, rejecting reserved characters
fn parse_segment(segment: &str) -> Result<(&str, &str), ParseError> {
    let bytes = segment.as_bytes();
    let malformed = |reason| ParseError {
        segment: segment.to_string(),
        reason,
    };

    let Some(eq_pos) = memchr::memchr(b'=', bytes) else {
        return Err(malformed("missing `=`"));
    };
    if eq_pos == 0 {
        return Err(malformed("empty key"));
    }
    if memchr::memchr(b'=', &bytes[eq_pos + 1..]).is_some() {
        return Err(malformed("reserved `=` in value"));
    }

    Ok((&segment[..eq_pos], &segment[eq_pos + 1..]))
}

impl FromStr for FeatureMap {
    type Err = ParseError;

    /// Parse `key=value|key=value`; the empty string and `_` give an empty map.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut feats = FeatureMap::new();

        if s.is_empty() || s == EMPTY_FIELD {
            return Ok(feats);
        }

        for segment in s.split(ENTRY_DELIM) {
            let (key, value) = parse_segment(segment)?;
            feats.insert(key, value);
        }

        Ok(feats)
    }
}

impl fmt::Display for FeatureMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", ENTRY_DELIM)?;
            }
            write!(f, "{}{}{}", key, PAIR_DELIM, value)?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FeatureMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut feats = FeatureMap::new();
        for (key, value) in iter {
            feats.insert(key, value);
        }
        feats
    }
}
