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

//! Linear undo/redo log of operation batches.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use strum_macros::{AsRefStr, Display};

use crate::{NodeId, Operation};

/// One undoable step: the operations a command applied and the operations
/// that revert them, both in the order they must be applied.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub forward: Vec<Operation>,
    pub inverse: Vec<Operation>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum HistoryState {
    #[default]
    Idle,
    /// History is being replayed; new records are ignored.
    RecordingSuppressed,
}

/// Entries before `applied_up_to` can be undone, the rest can be redone.
#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    applied_up_to: usize,
    state: HistoryState,
    /// Maximum number of entries kept; 0 keeps everything.
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(0)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            applied_up_to: 0,
            state: HistoryState::Idle,
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self) -> HistoryState {
        self.state
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Record a completed command. The redo tail is dropped, and the oldest
    /// entries go once the limit is exceeded. Ignored while replaying and
    /// for commands that changed nothing.
    pub fn record(&mut self, forward: Vec<Operation>, inverse: Vec<Operation>) {
        if self.state == HistoryState::RecordingSuppressed || forward.is_empty()
        {
            return;
        }
        if self.applied_up_to < self.entries.len() {
            log::trace!(
                "dropping {} redo entries",
                self.entries.len() - self.applied_up_to
            );
            self.entries.truncate(self.applied_up_to);
        }
        self.entries.push_back(HistoryEntry {
            forward,
            inverse,
            timestamp: Utc::now(),
        });
        self.applied_up_to = self.entries.len();
        while self.limit > 0 && self.entries.len() > self.limit {
            self.entries.pop_front();
            self.applied_up_to -= 1;
        }
    }

    pub fn can_undo(&self) -> bool {
        self.applied_up_to > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied_up_to < self.entries.len()
    }

    /// The entry `undo` would revert.
    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.applied_up_to
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
    }

    /// The entry `redo` would re-apply.
    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.applied_up_to)
    }

    /// Step back over the last applied entry, returning the operations that
    /// revert it.
    pub fn undo(&mut self) -> Option<Vec<Operation>> {
        let ops = self.peek_undo()?.inverse.clone();
        self.applied_up_to -= 1;
        Some(ops)
    }

    /// Step forward over the next undone entry, returning the operations
    /// that re-apply it.
    pub fn redo(&mut self) -> Option<Vec<Operation>> {
        let ops = self.peek_redo()?.forward.clone();
        self.applied_up_to += 1;
        Some(ops)
    }

    /// Revert the effect of the last [`undo`](Self::undo) on the position,
    /// used when replaying its operations failed.
    pub(crate) fn cancel_undo(&mut self) {
        self.applied_up_to = (self.applied_up_to + 1).min(self.entries.len());
    }

    pub(crate) fn cancel_redo(&mut self) {
        self.applied_up_to = self.applied_up_to.saturating_sub(1);
    }

    /// Switch recording on or off, returning the previous state so that
    /// nested replays restore it.
    pub(crate) fn set_state(&mut self, state: HistoryState) -> HistoryState {
        std::mem::replace(&mut self.state, state)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.applied_up_to = 0;
    }

    /// Every node an entry may touch or re-link when replayed.
    pub fn referenced_nodes(&self) -> BTreeSet<NodeId> {
        self.entries
            .iter()
            .flat_map(|e| e.forward.iter().chain(e.inverse.iter()))
            .flat_map(Operation::referenced_nodes)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SlotId, Value};

    fn delete(start: usize) -> Operation {
        Operation::Delete {
            slot: SlotId(0),
            start,
            end: start + 1,
        }
    }

    fn history_with(n: usize, limit: usize) -> History {
        let mut history = History::new(limit);
        for i in 0..n {
            history.record(vec![delete(i)], vec![delete(100 + i)]);
        }
        history
    }

    #[test]
    fn undo_returns_the_inverse_and_redo_the_forward_ops() {
        let mut history = history_with(2, 0);
        assert_eq!(history.undo(), Some(vec![delete(101)]));
        assert_eq!(history.undo(), Some(vec![delete(100)]));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(vec![delete(0)]));
        assert!(history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn recording_after_undo_drops_the_redo_tail() {
        let mut history = history_with(3, 0);
        history.undo();
        history.undo();
        history.record(vec![delete(9)], vec![delete(19)]);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.undo(), Some(vec![delete(19)]));
    }

    #[test]
    fn limit_drops_the_oldest_entries() {
        let mut history = history_with(5, 3);
        assert_eq!(history.len(), 3);
        let mut undone = 0;
        while history.undo().is_some() {
            undone += 1;
        }
        assert_eq!(undone, 3);
        assert_eq!(history.redo(), Some(vec![delete(2)]));
    }

    #[test]
    fn nothing_is_recorded_while_suppressed() {
        let mut history = History::default();
        let previous = history.set_state(HistoryState::RecordingSuppressed);
        assert_eq!(previous, HistoryState::Idle);
        history.record(vec![delete(0)], vec![delete(1)]);
        history.set_state(previous);
        assert_eq!(history.state(), HistoryState::Idle);
        assert!(history.is_empty());
    }

    #[test]
    fn empty_commands_are_not_recorded() {
        let mut history = History::default();
        history.record(vec![], vec![]);
        assert!(!history.can_undo());
    }

    #[test]
    fn referenced_nodes_cover_both_directions() {
        let mut history = History::default();
        history.record(
            vec![Operation::Set {
                node: NodeId(0),
                key: "k".to_owned(),
                value: Value::Node(NodeId(3)),
            }],
            vec![Operation::Remove {
                node: NodeId(0),
                key: "k".to_owned(),
            }],
        );
        assert_eq!(
            history.referenced_nodes(),
            BTreeSet::from([NodeId(0), NodeId(3)])
        );
    }
}
