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

use std::collections::BTreeMap;
use std::fmt;

use super::NodeId;

/// One-shot callback fired when a node loses its last parent edge.
pub type DetachCallback = Box<dyn FnOnce(NodeId)>;

/// Where a parent edge comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parent {
    /// A structural edge from another node.
    Node(NodeId),
    /// The host holding on to the node through [`attach`](super::ObservedGraph::attach).
    Host,
}

/// What a [`detach`](super::ObservedGraph::detach) request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetachOutcome {
    /// A host edge was removed and the node is still held by this many
    /// edges.
    Remaining(usize),
    /// The last edge was removed: the node is now detached.
    Detached,
    /// The node had already been detached; nothing changed.
    AlreadyDetached,
    /// The node is attached, but not by the host; nothing changed.
    NoHostEdge,
}

/// Per-node change tracking: the multiset of parent edges, the dirty and
/// detached flags and pending detach callbacks.
#[derive(Default)]
pub struct ChangeMarker {
    parents: BTreeMap<Parent, usize>,
    dirty: bool,
    detached: bool,
    callbacks: Vec<DetachCallback>,
}

impl fmt::Debug for ChangeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeMarker")
            .field("parents", &self.parents)
            .field("dirty", &self.dirty)
            .field("detached", &self.detached)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl ChangeMarker {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Number of parent edges, counting repeated edges.
    pub fn parent_count(&self) -> usize {
        self.parents.values().sum()
    }

    /// Distinct parent nodes, ignoring host edges.
    pub fn parent_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.parents.keys().filter_map(|p| match p {
            Parent::Node(id) => Some(*id),
            Parent::Host => None,
        })
    }

    pub fn has_host_edge(&self) -> bool {
        self.parents.contains_key(&Parent::Host)
    }

    pub(crate) fn mark_dirty(&mut self) -> bool {
        let was = self.dirty;
        self.dirty = true;
        !was
    }

    pub(crate) fn clean(&mut self) {
        self.dirty = false;
    }

    /// Callbacks added once the node is detached never fire.
    pub(crate) fn add_callback(&mut self, callback: DetachCallback) {
        if !self.detached {
            self.callbacks.push(callback);
        }
    }

    pub(crate) fn add_parent(&mut self, parent: Parent) {
        *self.parents.entry(parent).or_default() += 1;
        self.detached = false;
    }

    /// Remove one edge from `parent`. Returns the callbacks to fire when
    /// this removed the last edge.
    pub(crate) fn remove_parent(
        &mut self,
        parent: Parent,
    ) -> Option<Vec<DetachCallback>> {
        let count = self.parents.get_mut(&parent)?;
        *count -= 1;
        if *count == 0 {
            self.parents.remove(&parent);
        }
        if self.parents.is_empty() && !self.detached {
            self.detached = true;
            return Some(std::mem::take(&mut self.callbacks));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn counting_callback(count: &Rc<Cell<u32>>) -> DetachCallback {
        let count = Rc::clone(count);
        Box::new(move |_| count.set(count.get() + 1))
    }

    #[test]
    fn only_the_last_edge_detaches() {
        let mut marker = ChangeMarker::default();
        marker.add_parent(Parent::Node(NodeId(1)));
        marker.add_parent(Parent::Node(NodeId(2)));
        assert!(marker.remove_parent(Parent::Node(NodeId(1))).is_none());
        assert!(!marker.is_detached());
        let fired = marker.remove_parent(Parent::Node(NodeId(2)));
        assert!(fired.is_some());
        assert!(marker.is_detached());
    }

    #[test]
    fn repeated_edges_are_counted() {
        let mut marker = ChangeMarker::default();
        marker.add_parent(Parent::Host);
        marker.add_parent(Parent::Host);
        assert_eq!(marker.parent_count(), 2);
        assert!(marker.remove_parent(Parent::Host).is_none());
        assert!(marker.remove_parent(Parent::Host).is_some());
    }

    #[test]
    fn callbacks_are_handed_out_once() {
        let count = Rc::new(Cell::new(0));
        let mut marker = ChangeMarker::default();
        marker.add_parent(Parent::Host);
        marker.add_callback(counting_callback(&count));
        for callback in marker.remove_parent(Parent::Host).unwrap() {
            callback(NodeId(0));
        }
        marker.add_callback(counting_callback(&count));
        assert!(marker.remove_parent(Parent::Host).is_none());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn removing_an_unknown_edge_changes_nothing() {
        let mut marker = ChangeMarker::default();
        marker.add_parent(Parent::Host);
        assert!(marker.remove_parent(Parent::Node(NodeId(3))).is_none());
        assert_eq!(marker.parent_count(), 1);
    }
}
