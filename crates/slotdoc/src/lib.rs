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

//! Slot-based rich text model.
//!
//! Content lives in [`Slot`]s: ordered runs of text and opaque component
//! units, addressed by UTF-16 code unit offsets. Each slot carries a
//! [`FormatTable`] that anchors formatting to offset ranges and keeps those
//! ranges consistent while content is inserted, cut, split and merged.
//!
//! Component state lives in an [`ObservedGraph`], an arena of records and
//! lists where every node carries a [`ChangeMarker`]. Mutations bubble
//! "dirty" notifications to every ancestor, and nodes shared by several
//! parents fire their detach callbacks exactly once, when the last edge
//! goes away.
//!
//! A [`Document`] ties both together. Every command it exposes is recorded
//! as an invertible [`Operation`], which drives the linear [`History`]
//! (undo/redo) and the sync boundary (export of local edits, import of
//! remote ones).

mod config;
mod document;
mod error;
mod format;
mod history;
mod observe;
mod slot;
mod sync;

pub use config::EditorConfig;
pub use document::{Document, DocumentSnapshot};
pub use error::{DocumentError, GraphError, SlotError};
pub use format::{
    builtin, Effect, FormatSpan, FormatTable, FormatValue, Formatter,
    FormatterKind, FormatterRanges, FormatterRegistry, Markup, RangeRecord,
};
pub use history::{History, HistoryEntry, HistoryState};
pub use observe::{
    ChangeMarker, DetachCallback, DetachOutcome, NodeId, Notification, Notifications,
    ObservedGraph, Parent, Raw, RawNode, Shape, Value,
};
pub use slot::{ActiveFormat, ComponentRef, FormatSegment, Slot, SlotId, Unit};
pub use sync::{Operation, OperationKind};

/// Result type used by [`Document`] commands.
pub type Result<T, E = DocumentError> = std::result::Result<T, E>;
