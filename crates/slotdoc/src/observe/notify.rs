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

use std::collections::VecDeque;

use super::NodeId;
use crate::SlotId;

/// A change the host may want to react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A node's own content changed.
    Changed(NodeId),
    /// A node became dirty because something below it changed.
    Dirty(NodeId),
    /// A node lost its last parent edge.
    Detached(NodeId),
    /// A slot's content or formats changed.
    SlotChanged(SlotId),
}

/// A batch of notifications handed to the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Notifications {
    pub items: Vec<Notification>,
    /// Set when the queue overflowed since the last drain, in which case
    /// the oldest notifications were lost.
    pub overflowed: bool,
}

impl Notifications {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && !self.overflowed
    }
}

/// Bounded FIFO of notifications. When full, the oldest entry is dropped.
#[derive(Debug)]
pub(crate) struct NotificationQueue {
    items: VecDeque<Notification>,
    capacity: usize,
    overflowed: bool,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity: capacity.max(1),
            overflowed: false,
        }
    }

    pub fn push(&mut self, notification: Notification) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
            if !self.overflowed {
                log::warn!(
                    "notification queue is full ({} entries); dropping the oldest",
                    self.capacity
                );
            }
            self.overflowed = true;
        }
        self.items.push_back(notification);
    }

    pub fn drain(&mut self) -> Notifications {
        Notifications {
            items: self.items.drain(..).collect(),
            overflowed: std::mem::take(&mut self.overflowed),
        }
    }
}
