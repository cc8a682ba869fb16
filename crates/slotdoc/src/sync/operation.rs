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

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{
    Effect, FormatValue, FormatterRanges, NodeId, RangeRecord, Shape, SlotId,
    Unit, Value,
};

/// One primitive, serialisable change to a document.
///
/// Operations are what history entries hold and what crosses the sync
/// boundary. Applying the same operation to two identical documents yields
/// two identical documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    CreateSlot {
        slot: SlotId,
    },
    /// Insert `content` at `offset`. `formats` are rebased to the start of
    /// the content; `inherit` tells whether ranges spanning `offset` grow
    /// over it.
    Insert {
        slot: SlotId,
        offset: usize,
        content: Vec<Unit>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        formats: Vec<RangeRecord>,
        #[serde(default)]
        inherit: bool,
    },
    Delete {
        slot: SlotId,
        start: usize,
        end: usize,
    },
    Format {
        slot: SlotId,
        formatter: String,
        start: usize,
        end: usize,
        value: FormatValue,
        #[serde(default)]
        effect: Effect,
    },
    RemoveFormat {
        slot: SlotId,
        formatter: String,
        start: usize,
        end: usize,
    },
    /// Replace the ranges of each listed formatter wholesale.
    RestoreFormats {
        slot: SlotId,
        formats: Vec<FormatterRanges>,
    },
    CreateNode {
        node: NodeId,
        shape: Shape,
    },
    Set {
        node: NodeId,
        key: String,
        value: Value,
    },
    Remove {
        node: NodeId,
        key: String,
    },
    Splice {
        node: NodeId,
        index: usize,
        delete: usize,
        insert: Vec<Value>,
    },
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum OperationKind {
    CreateSlot,
    Insert,
    Delete,
    Format,
    RemoveFormat,
    RestoreFormats,
    CreateNode,
    Set,
    Remove,
    Splice,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::CreateSlot { .. } => OperationKind::CreateSlot,
            Self::Insert { .. } => OperationKind::Insert,
            Self::Delete { .. } => OperationKind::Delete,
            Self::Format { .. } => OperationKind::Format,
            Self::RemoveFormat { .. } => OperationKind::RemoveFormat,
            Self::RestoreFormats { .. } => OperationKind::RestoreFormats,
            Self::CreateNode { .. } => OperationKind::CreateNode,
            Self::Set { .. } => OperationKind::Set,
            Self::Remove { .. } => OperationKind::Remove,
            Self::Splice { .. } => OperationKind::Splice,
        }
    }

    /// The slot the operation targets, if any.
    pub fn slot(&self) -> Option<SlotId> {
        match self {
            Self::CreateSlot { slot }
            | Self::Insert { slot, .. }
            | Self::Delete { slot, .. }
            | Self::Format { slot, .. }
            | Self::RemoveFormat { slot, .. }
            | Self::RestoreFormats { slot, .. } => Some(*slot),
            _ => None,
        }
    }

    /// The node the operation targets, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::CreateNode { node, .. }
            | Self::Set { node, .. }
            | Self::Remove { node, .. }
            | Self::Splice { node, .. } => Some(*node),
            _ => None,
        }
    }

    /// Where in its slot or list the operation starts.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Insert { offset, .. } => Some(*offset),
            Self::Delete { start, .. }
            | Self::Format { start, .. }
            | Self::RemoveFormat { start, .. } => Some(*start),
            Self::Splice { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Names of the formatters whose ranges the operation may change
    /// directly.
    pub fn touched_formatters(&self) -> Vec<&str> {
        let mut names: Vec<&str> = match self {
            Self::Format { formatter, .. }
            | Self::RemoveFormat { formatter, .. } => vec![formatter.as_str()],
            Self::RestoreFormats { formats, .. } => {
                formats.iter().map(|f| f.formatter.as_str()).collect()
            }
            Self::Insert { formats, .. } => {
                formats.iter().map(|r| r.formatter.as_str()).collect()
            }
            _ => Vec::new(),
        };
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Every node the operation targets or links to.
    pub fn referenced_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.node().into_iter().collect();
        match self {
            Self::Set { value, .. } => nodes.extend(value.as_node()),
            Self::Splice { insert, .. } => {
                nodes.extend(insert.iter().filter_map(Value::as_node))
            }
            Self::CreateNode { shape, .. } => nodes.extend(shape.children()),
            _ => {}
        }
        nodes
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
