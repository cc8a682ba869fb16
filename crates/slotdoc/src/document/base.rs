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

use std::collections::{BTreeMap, VecDeque};

use crate::{
    DocumentError, EditorConfig, FormatterRegistry, History, NodeId, Notifications,
    ObservedGraph, Operation, Result, Shape, Slot, SlotId,
};

/// A rich-text document.
///
/// Content lives in [`Slot`]s, host state in an [`ObservedGraph`] rooted at
/// a record node. Every public mutating method is one command: it applies
/// all of its operations or none, records one history entry and queues its
/// operations for other replicas.
#[derive(Debug)]
pub struct Document {
    pub(crate) config: EditorConfig,

    /// Formatters that operations may refer to by name.
    pub(crate) registry: FormatterRegistry,

    pub(crate) slots: BTreeMap<SlotId, Slot>,

    /// Next slot id to hand out.
    pub(crate) next_slot: u64,

    pub(crate) graph: ObservedGraph,

    /// The root record of the observed graph.
    pub(crate) root: NodeId,

    pub(crate) history: History,

    /// Completed local operations not yet taken by the host.
    pub(crate) outbox: Vec<Operation>,

    /// Remote operations waiting for [`flush_remote`](Self::flush_remote).
    pub(crate) inbox: VecDeque<Operation>,

    /// Operations of the command currently running inside
    /// [`transact`](Self::transact).
    pub(crate) transaction: Option<Transaction>,
}

/// Operations applied so far by an open transaction. `inverse` is kept in
/// the order it must be applied to roll the transaction back.
#[derive(Debug, Default)]
pub(crate) struct Transaction {
    pub forward: Vec<Operation>,
    pub inverse: Vec<Operation>,
}

/// The observable state of a document, for comparing replicas.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSnapshot {
    pub slots: BTreeMap<SlotId, Slot>,
    pub nodes: BTreeMap<NodeId, Shape>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with the default configuration and the
    /// builtin formatters.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let mut graph = ObservedGraph::new(config.notification_capacity);
        // Every replica creates the root the same way, so it is never
        // sent as an operation.
        let root = graph.next_id();
        let installed = graph
            .create_at(root, Shape::empty_record())
            .and_then(|()| graph.attach(root))
            .and_then(|()| graph.set_root(root));
        if let Err(e) = installed {
            log::error!("failed to set up the root node: {e}");
        }
        graph.clean_all();
        graph.drain_notifications();

        Self {
            history: History::new(config.history_limit),
            registry: FormatterRegistry::with_builtins(),
            slots: BTreeMap::new(),
            next_slot: 0,
            graph,
            root,
            outbox: Vec::new(),
            inbox: VecDeque::new(),
            transaction: None,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &ObservedGraph {
        &self.graph
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The root record of the observed graph.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn slot(&self, id: SlotId) -> Result<&Slot> {
        self.slots.get(&id).ok_or(DocumentError::UnknownSlot(id))
    }

    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &Slot)> {
        self.slots.iter().map(|(id, slot)| (*id, slot))
    }

    /// Changes since the last call, in the order they happened.
    pub fn drain_notifications(&mut self) -> Notifications {
        self.graph.drain_notifications()
    }

    /// Free detached nodes that no history entry can bring back.
    pub fn collect_garbage(&mut self) -> Vec<NodeId> {
        let pinned = self.history.referenced_nodes();
        self.graph.reclaim(&pinned)
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            slots: self.slots.clone(),
            nodes: self
                .graph
                .iter()
                .map(|(id, shape)| (id, shape.clone()))
                .collect(),
        }
    }

    /// Run `f` as one command: if it fails, every operation it applied is
    /// reverted; if it succeeds, its operations form one history entry.
    ///
    /// Nested calls join the outermost command.
    pub fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.transaction.is_some() {
            return f(self);
        }
        self.transaction = Some(Transaction::default());
        let result = f(self);
        let transaction = self.transaction.take().unwrap_or_default();
        match result {
            Ok(value) => {
                self.commit(transaction.forward, transaction.inverse);
                Ok(value)
            }
            Err(e) => {
                log::debug!(
                    "rolling back {} operations: {e}",
                    transaction.forward.len()
                );
                self.rollback(&transaction.inverse);
                Err(e)
            }
        }
    }

    /// Apply one operation as part of the current command.
    pub(crate) fn execute(&mut self, forward: Operation) -> Result<()> {
        log::debug!("executing {} operation", forward.kind());
        let applied = self.apply_operation(&forward)?;
        self.record_applied(forward, applied.inverse);
        Ok(())
    }

    /// Add an applied operation to the open transaction, or record it as a
    /// command of its own.
    pub(crate) fn record_applied(
        &mut self,
        forward: Operation,
        inverse: Option<Operation>,
    ) {
        if let Some(transaction) = self.transaction.as_mut() {
            if let Some(inverse) = inverse {
                transaction.inverse.insert(0, inverse);
            }
            transaction.forward.push(forward);
            return;
        }
        self.commit(vec![forward], inverse.into_iter().collect());
    }

    fn commit(&mut self, forward: Vec<Operation>, inverse: Vec<Operation>) {
        self.history.record(forward.clone(), inverse);
        self.outbox.extend(forward);
    }

    /// Best-effort revert of already applied operations.
    pub(crate) fn rollback(&mut self, inverse: &[Operation]) {
        for op in inverse {
            if let Err(e) = self.apply_operation(op) {
                log::error!("failed to revert {} operation: {e}", op.kind());
            }
        }
    }

    /// Queue an operation for other replicas without recording history.
    pub(crate) fn emit(&mut self, op: Operation) {
        self.outbox.push(op);
    }
}

#[cfg(test)]
mod tests {
    use crate::{Document, DocumentError, EditorConfig, Shape, SlotId};

    #[test]
    fn new_document_has_an_empty_root() {
        let doc = Document::new();
        assert_eq!(
            doc.graph().shape(doc.root()).unwrap(),
            &Shape::empty_record()
        );
        assert!(doc.slots().next().is_none());
        assert!(!doc.history().can_undo());
    }

    #[test]
    fn root_is_held_by_the_host_and_survives_collection() {
        let mut doc = Document::new();
        let root = doc.root();
        assert_eq!(doc.graph().roots().collect::<Vec<_>>(), vec![root]);
        assert!(doc.graph().marker(root).unwrap().has_host_edge());
        assert!(doc.collect_garbage().is_empty());
        assert!(doc.graph().contains(root));
    }

    #[test]
    fn config_limits_are_applied() {
        let config = EditorConfig {
            history_limit: 2,
            ..EditorConfig::default()
        };
        let mut doc = Document::with_config(config);
        let slot = doc.create_slot().unwrap();
        for text in ["a", "b", "c"] {
            doc.insert_text(slot, 0, text).unwrap();
        }
        assert_eq!(doc.history().len(), 2);
    }

    #[test]
    fn failing_transaction_reverts_everything() {
        let mut doc = Document::new();
        let slot = doc.create_slot().unwrap();
        doc.insert_text(slot, 0, "hello").unwrap();
        let before = doc.snapshot();

        let result = doc.transact(|doc| {
            doc.insert_text(slot, 5, " world")?;
            doc.apply_format(slot, "bold", 0, 5, true, crate::Effect::Valid)?;
            doc.delete(slot, 0, 100)
        });

        assert!(matches!(result, Err(DocumentError::Slot(_))));
        assert_eq!(doc.snapshot(), before);
        assert_eq!(doc.history().len(), 1);
    }

    #[test]
    fn transaction_records_one_entry() {
        let mut doc = Document::new();
        let slot = doc.create_slot().unwrap();
        doc.transact(|doc| {
            doc.insert_text(slot, 0, "ab")?;
            doc.insert_text(slot, 2, "cd")
        })
        .unwrap();
        assert_eq!(doc.history().len(), 1);
        doc.undo().unwrap();
        assert_eq!(doc.slot(slot).unwrap().to_plain_text(), "");
    }

    #[test]
    fn unknown_slots_are_reported() {
        let doc = Document::new();
        assert!(matches!(
            doc.slot(SlotId(3)),
            Err(DocumentError::UnknownSlot(SlotId(3)))
        ));
    }
}
