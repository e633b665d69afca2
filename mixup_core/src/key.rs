// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Item keys and ordering hashes.
//!
//! A [`Key`] identifies one logical item across renders. A [`KeyHash`] is a
//! cheap equality token for one ordered key sequence: two sequences hash the
//! same exactly when they contain the same keys, of the same type, in the
//! same order.
//!
//! Each key is encoded with a type tag, strings additionally carry their
//! byte length, and entries are comma-joined:
//!
//! ```text
//!   [1, 23]        ──►  "n1,n23"
//!   [12, 3]        ──►  "n12,n3"
//!   [1, "1"]       ──►  "n1,s1:1"
//!   ["a,sb"]       ──►  "s4:a,sb"
//!   ["a", "b"]     ──►  "s1:a,s1:b"
//! ```
//!
//! The length prefix makes the encoding prefix-free, so a string key that
//! itself contains a comma can never be mistaken for two keys.

use alloc::string::String;
use core::fmt::{self, Write as _};

/// An opaque, caller-supplied item identifier.
///
/// Keys must be unique within one ordering; see
/// [`validate_keys`](crate::config::validate_keys).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// An integer key.
    Number(i64),
    /// A string key.
    String(String),
}

impl Key {
    fn write_tagged(&self, out: &mut String) {
        // Writing into a `String` cannot fail.
        let _ = match self {
            Self::Number(n) => write!(out, "n{n}"),
            Self::String(s) => write!(out, "s{}:{s}", s.len()),
        };
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<u32> for Key {
    fn from(n: u32) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// Equality token for an ordered key sequence.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyHash(String);

impl KeyHash {
    /// Hashes an ordered key sequence.
    #[must_use]
    pub fn of(keys: &[Key]) -> Self {
        let mut out = String::new();
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            key.write_tagged(&mut out);
        }
        Self(out)
    }

    /// Returns the encoded form.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHash({:?})", self.0)
    }
}
