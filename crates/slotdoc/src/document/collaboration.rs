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

//! Exchanging operations with other replicas.
//!
//! 1. **Outgoing** – [`take_outgoing`] hands over every operation applied
//!    locally since the last call, including undo and redo replays, in the
//!    order they were applied.
//! 2. **Incoming** – [`apply_remote`] applies one operation right away;
//!    [`receive_remote`] queues it for the next [`flush_remote`], which
//!    applies queued operations in delivery order.
//!
//! Remote operations go through the same code path as local edits but are
//! never recorded in history.
//!
//! [`take_outgoing`]: Document::take_outgoing
//! [`apply_remote`]: Document::apply_remote
//! [`receive_remote`]: Document::receive_remote
//! [`flush_remote`]: Document::flush_remote

use super::Document;
use crate::{Operation, Result};

impl Document {
    // ------------------------------------------------------------------
    // Outgoing
    // ------------------------------------------------------------------

    /// Take the operations applied locally since the last call.
    pub fn take_outgoing(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.outbox)
    }

    /// [`take_outgoing`](Self::take_outgoing), encoded as JSON lines.
    pub fn take_outgoing_json(&mut self) -> Result<Vec<String>> {
        self.take_outgoing()
            .iter()
            .map(|op| Ok(op.to_json()?))
            .collect()
    }

    // ------------------------------------------------------------------
    // Incoming
    // ------------------------------------------------------------------

    /// Apply an operation from another replica now.
    pub fn apply_remote(&mut self, op: &Operation) -> Result<()> {
        log::debug!("applying remote {} operation", op.kind());
        self.apply_operation(op)?;
        Ok(())
    }

    /// Queue an operation from another replica. A full queue is flushed
    /// first.
    ///
    /// `op` is queued even when that flush fails. The error returned then
    /// belongs to the earlier operation [`flush_remote`](Self::flush_remote)
    /// dropped, and `op` waits behind the operations still queued.
    pub fn receive_remote(&mut self, op: Operation) -> Result<()> {
        let flushed = if self.inbox.len() >= self.config.inbox_capacity.max(1)
        {
            log::warn!(
                "remote inbox is full ({} operations); flushing early",
                self.inbox.len()
            );
            self.flush_remote().map(|_| ())
        } else {
            Ok(())
        };
        self.inbox.push_back(op);
        flushed
    }

    /// Decode and queue an operation from another replica.
    pub fn receive_remote_json(&mut self, json: &str) -> Result<()> {
        let op = Operation::from_json(json)?;
        self.receive_remote(op)
    }

    /// Number of queued remote operations.
    pub fn pending_remote(&self) -> usize {
        self.inbox.len()
    }

    /// Apply queued remote operations in delivery order, returning how many
    /// were applied. An operation that fails is dropped and its error
    /// returned; the ones after it stay queued.
    pub fn flush_remote(&mut self) -> Result<usize> {
        let mut applied = 0;
        while let Some(op) = self.inbox.pop_front() {
            self.apply_remote(&op)?;
            applied += 1;
        }
        Ok(applied)
    }
}
