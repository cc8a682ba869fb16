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

//! Undo / Redo by replaying recorded operations.
//!
//! Each history entry holds the operations of one command and the
//! operations reverting them. Undo applies the inverse operations with
//! recording suppressed, redo re-applies the forward ones. Both go through
//! the same path as local edits and are sent to other replicas.

use super::Document;
use crate::{HistoryState, Operation, Result};

impl Document {
    /// Undo the last command. Returns `false` when there was nothing to
    /// undo.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(ops) = self.history.undo() else {
            return Ok(false);
        };
        log::debug!("undoing {} operations", ops.len());
        if let Err(e) = self.replay(&ops) {
            self.history.cancel_undo();
            return Err(e);
        }
        Ok(true)
    }

    /// Redo the last undone command. Returns `false` when there was nothing
    /// to redo.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(ops) = self.history.redo() else {
            return Ok(false);
        };
        log::debug!("redoing {} operations", ops.len());
        if let Err(e) = self.replay(&ops) {
            self.history.cancel_redo();
            return Err(e);
        }
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Forget every history entry. Nodes that only history kept alive become
    /// reclaimable.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Apply `ops` in order without recording them. On failure the ones
    /// already applied are reverted.
    fn replay(&mut self, ops: &[Operation]) -> Result<()> {
        let previous = self.history.set_state(HistoryState::RecordingSuppressed);
        let mut inverse = Vec::with_capacity(ops.len());
        let mut result = Ok(());
        for op in ops {
            match self.apply_operation(op) {
                Ok(applied) => inverse.extend(applied.inverse),
                Err(e) => {
                    log::warn!("replaying {} operation failed: {e}", op.kind());
                    result = Err(e);
                    break;
                }
            }
        }
        if result.is_ok() {
            self.outbox.extend(ops.iter().cloned());
        } else {
            inverse.reverse();
            self.rollback(&inverse);
        }
        self.history.set_state(previous);
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::{Document, Effect, SlotId, Value};

    fn doc_with_text(text: &str) -> (Document, SlotId) {
        let mut doc = Document::new();
        let slot = doc.create_slot().unwrap();
        doc.insert_text(slot, 0, text).unwrap();
        (doc, slot)
    }

    fn plain(doc: &Document, slot: SlotId) -> String {
        doc.slot(slot).unwrap().to_plain_text()
    }

    // ===================================================================
    // Undo
    // ===================================================================

    #[test]
    fn undoing_typing_removes_it() {
        let (mut doc, slot) = doc_with_text("hello");
        doc.insert_text(slot, 5, " world").unwrap();
        assert!(doc.undo().unwrap());
        assert_eq!(plain(&doc, slot), "hello");
        assert!(doc.can_redo());
    }

    #[test]
    fn undoing_a_delete_restores_text_and_formats() {
        let (mut doc, slot) = doc_with_text("0123456789");
        doc.apply_format(slot, "bold", 2, 8, true, Effect::Valid)
            .unwrap();
        doc.apply_format(slot, "link", 4, 6, "https://x", Effect::Valid)
            .unwrap();
        let before = doc.snapshot();
        doc.delete(slot, 3, 7).unwrap();
        doc.undo().unwrap();
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn undoing_a_block_format_restores_the_previous_block() {
        let (mut doc, slot) = doc_with_text("text");
        doc.apply_format(slot, "quote", 0, 1, true, Effect::Valid)
            .unwrap();
        doc.apply_format(slot, "code_block", 0, 1, true, Effect::Valid)
            .unwrap();
        assert!(doc.slot(slot).unwrap().formats().spans("quote").is_empty());
        doc.undo().unwrap();
        let formats = doc.slot(slot).unwrap().formats();
        assert!(formats.spans("code_block").is_empty());
        assert_eq!(formats.spans("quote").len(), 1);
    }

    #[test]
    fn undo_with_nothing_to_undo_is_a_no_op() {
        let mut doc = Document::new();
        assert!(!doc.undo().unwrap());
        assert!(!doc.redo().unwrap());
    }

    #[test]
    fn undo_is_not_recorded_as_a_new_entry() {
        let (mut doc, slot) = doc_with_text("a");
        doc.insert_text(slot, 1, "b").unwrap();
        let entries = doc.history().len();
        doc.undo().unwrap();
        doc.redo().unwrap();
        assert_eq!(doc.history().len(), entries);
    }

    // ===================================================================
    // Redo
    // ===================================================================

    #[test]
    fn undo_then_redo_every_command_restores_the_state() {
        let mut doc = Document::new();
        let slot = doc.create_slot().unwrap();
        let root = doc.root();
        doc.insert_text(slot, 0, "hello world").unwrap();
        doc.apply_format(slot, "bold", 0, 5, true, Effect::Valid)
            .unwrap();
        doc.set(root, "title", Value::from("draft")).unwrap();
        doc.delete(slot, 2, 8).unwrap();
        doc.apply_format(slot, "paragraph", 0, 1, true, Effect::Valid)
            .unwrap();
        doc.insert_text(slot, 1, "xyz").unwrap();
        let after = doc.snapshot();

        let mut undone = 0;
        while doc.undo().unwrap() {
            undone += 1;
        }
        assert_eq!(undone, 6);
        assert_eq!(plain(&doc, slot), "");
        for _ in 0..undone {
            assert!(doc.redo().unwrap());
        }
        assert_eq!(doc.snapshot(), after);
    }

    #[test]
    fn editing_after_undo_drops_the_redo_tail() {
        let (mut doc, slot) = doc_with_text("a");
        doc.insert_text(slot, 1, "b").unwrap();
        doc.insert_text(slot, 2, "c").unwrap();
        doc.undo().unwrap();
        doc.undo().unwrap();
        doc.insert_text(slot, 1, "z").unwrap();
        assert!(!doc.can_redo());
        assert_eq!(plain(&doc, slot), "az");
    }

    #[test]
    fn undo_and_redo_are_sent_to_other_replicas() {
        let (mut doc, slot) = doc_with_text("ab");
        doc.take_outgoing();
        doc.undo().unwrap();
        let ops = doc.take_outgoing();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].slot(), Some(slot));
    }
}
