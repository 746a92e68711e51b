// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime counters shared with hosts for diagnostics.

use serde::{Deserialize, Serialize};

/// Monotonically non-decreasing counters for a node's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    pub errors: u64,
}
