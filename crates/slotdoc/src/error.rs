// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

use crate::observe::NodeId;
use crate::slot::SlotId;

/// Errors raised by [`Slot`](crate::Slot) and
/// [`FormatTable`](crate::FormatTable) operations.
///
/// Offsets are never clamped.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("{op}: offset {offset} is outside the slot bounds (length {len})")]
    OffsetOutOfRange {
        op: &'static str,
        offset: usize,
        len: usize,
    },

    #[error("{op}: range [{start}, {end}) is not valid for a slot of length {len}")]
    RangeOutOfBounds {
        op: &'static str,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("format table invariant violated: {0}")]
    InvariantViolation(String),
}

impl SlotError {
    /// Whether this is one of the range errors (as opposed to an invariant
    /// violation).
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            Self::OffsetOutOfRange { .. } | Self::RangeOutOfBounds { .. }
        )
    }
}

/// Errors raised by [`ObservedGraph`](crate::ObservedGraph) mutations.
///
/// Detaching never fails; its result is a
/// [`DetachOutcome`](crate::DetachOutcome).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} is not a record")]
    NotARecord(NodeId),

    #[error("node {0} is not a list")]
    NotAList(NodeId),

    #[error("splice [{index}, +{delete}) is out of bounds for list {node} of length {len}")]
    IndexOutOfBounds {
        node: NodeId,
        index: usize,
        delete: usize,
        len: usize,
    },

    #[error("node {0} already exists")]
    NodeExists(NodeId),

    #[error("no node ids are left after {0}")]
    IdsExhausted(NodeId),
}

/// Errors raised by [`Document`](crate::Document) commands and by the sync
/// boundary.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("slot {0} does not exist")]
    UnknownSlot(SlotId),

    #[error("slot {0} already exists")]
    SlotExists(SlotId),

    #[error("no slot ids are left after {0}")]
    SlotIdsExhausted(SlotId),

    #[error("formatter `{0}` is not registered")]
    UnknownFormatter(String),

    #[error("malformed operation: {0}")]
    Decode(#[from] serde_json::Error),
}
