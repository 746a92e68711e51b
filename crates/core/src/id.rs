// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node identifiers

use crate::error::SdsError;

/// Maximum byte length of a node id on the wire.
pub const NODE_ID_MAX_LEN: usize = 31;

fn valid_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Fixed-capacity inline node identifier. Always 1..=31 bytes from
/// `[A-Za-z0-9_-]`, `Copy`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NodeId {
    len: u8,
    buf: [u8; NODE_ID_MAX_LEN],
}

impl NodeId {
    /// Validate and build a node id.
    ///
    /// Accepts 1..=31 bytes drawn from `[A-Za-z0-9_-]`; anything else is
    /// `SdsError::InvalidNodeId`. Enforced before any transport activity.
    pub fn parse(s: &str) -> Result<Self, SdsError> {
        if s.is_empty() || s.len() > NODE_ID_MAX_LEN {
            return Err(SdsError::InvalidNodeId(s.to_string()));
        }
        if !s.bytes().all(valid_byte) {
            return Err(SdsError::InvalidNodeId(s.to_string()));
        }
        let mut buf = [0u8; NODE_ID_MAX_LEN];
        buf[..s.len()].copy_from_slice(s.as_bytes());
        Ok(Self { len: s.len() as u8, buf })
    }

    pub fn as_str(&self) -> &str {
        // Invariant: only constructed from a validated ASCII &str.
        match std::str::from_utf8(&self.buf[..self.len as usize]) {
            Ok(s) => s,
            Err(_) => unreachable!("NodeId constructed from non-UTF-8"),
        }
    }
}

impl std::hash::Hash for NodeId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash only the active bytes so it matches str::hash,
        // which is required for Borrow<str> HashMap lookups.
        self.as_str().hash(state);
    }
}

impl std::borrow::Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NodeId {
    type Err = SdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for NodeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        NodeId::parse(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
