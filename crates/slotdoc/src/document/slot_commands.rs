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

//! Slot editing commands.

use super::Document;
use crate::{
    ComponentRef, DocumentError, Effect, FormatValue, Formatter, Operation,
    RangeRecord, Result, Slot, SlotId, Unit,
};

impl Document {
    /// Create an empty slot.
    pub fn create_slot(&mut self) -> Result<SlotId> {
        let slot = SlotId(self.next_slot);
        let next_slot = self
            .next_slot
            .checked_add(1)
            .ok_or(DocumentError::SlotIdsExhausted(slot))?;
        self.next_slot = next_slot;
        self.slots.insert(slot, Slot::new());
        log::debug!("created {slot}");
        self.emit(Operation::CreateSlot { slot });
        Ok(slot)
    }

    /// Register a formatter so that commands and remote operations can
    /// refer to it by name.
    pub fn register_formatter(&mut self, formatter: Formatter) {
        if let Some(previous) = self.registry.register(formatter) {
            log::debug!("replaced formatter `{}`", previous.name());
        }
    }

    /// Type `text` at `offset`. Inheritable ranges spanning `offset` grow
    /// over it.
    pub fn insert_text(
        &mut self,
        slot: SlotId,
        offset: usize,
        text: &str,
    ) -> Result<()> {
        self.insert_unit(slot, offset, Unit::text(text), Vec::new())
    }

    /// Type `text` at `offset` with `formats` applied over it.
    pub fn insert_formatted(
        &mut self,
        slot: SlotId,
        offset: usize,
        text: &str,
        formats: &[(&str, FormatValue)],
    ) -> Result<()> {
        let unit = Unit::text(text);
        let len = unit.len();
        let mut records = Vec::with_capacity(formats.len());
        for (name, value) in formats {
            if self.registry.get(name).is_none() {
                return Err(DocumentError::UnknownFormatter((*name).to_owned()));
            }
            records.push(RangeRecord {
                formatter: (*name).to_owned(),
                start: 0,
                end: len,
                value: value.clone(),
                effect: Effect::Valid,
            });
        }
        self.insert_unit(slot, offset, unit, records)
    }

    pub fn insert_component(
        &mut self,
        slot: SlotId,
        offset: usize,
        component: ComponentRef,
    ) -> Result<()> {
        self.insert_unit(slot, offset, Unit::from(component), Vec::new())
    }

    /// Paste `content` at `offset`, keeping its own formats.
    pub fn insert_slot(
        &mut self,
        slot: SlotId,
        offset: usize,
        content: Slot,
    ) -> Result<()> {
        if content.is_empty() {
            self.slot(slot)?.check_offset("insert_slot", offset)?;
            return Ok(());
        }
        self.execute(Operation::Insert {
            slot,
            offset,
            content: content.units().to_vec(),
            formats: content.formats().records(),
            inherit: false,
        })
    }

    /// Remove `[start, end)` and return it as an independent slot.
    pub fn cut(&mut self, slot: SlotId, start: usize, end: usize) -> Result<Slot> {
        self.slot(slot)?.check_range("cut", start, end)?;
        if start == end {
            return Ok(Slot::new());
        }
        let forward = Operation::Delete { slot, start, end };
        log::debug!("executing {} operation", forward.kind());
        let applied = self.apply_operation(&forward)?;
        let removed = applied.removed.unwrap_or_default();
        self.record_applied(forward, applied.inverse);
        Ok(removed)
    }

    /// Remove `[start, end)`.
    pub fn delete(&mut self, slot: SlotId, start: usize, end: usize) -> Result<()> {
        self.cut(slot, start, end).map(|_| ())
    }

    pub fn apply_format(
        &mut self,
        slot: SlotId,
        formatter: &str,
        start: usize,
        end: usize,
        value: impl Into<FormatValue>,
        effect: Effect,
    ) -> Result<()> {
        if self.registry.get(formatter).is_none() {
            return Err(DocumentError::UnknownFormatter(formatter.to_owned()));
        }
        self.execute(Operation::Format {
            slot,
            formatter: formatter.to_owned(),
            start,
            end,
            value: value.into(),
            effect,
        })
    }

    pub fn remove_format(
        &mut self,
        slot: SlotId,
        formatter: &str,
        start: usize,
        end: usize,
    ) -> Result<()> {
        self.slot(slot)?.check_range("remove_format", start, end)?;
        if start == end || self.slot(slot)?.formats().spans(formatter).is_empty() {
            return Ok(());
        }
        self.execute(Operation::RemoveFormat {
            slot,
            formatter: formatter.to_owned(),
            start,
            end,
        })
    }

    fn insert_unit(
        &mut self,
        slot: SlotId,
        offset: usize,
        unit: Unit,
        formats: Vec<RangeRecord>,
    ) -> Result<()> {
        self.slot(slot)?.check_offset("insert", offset)?;
        if unit.is_empty() {
            return Ok(());
        }
        self.execute(Operation::Insert {
            slot,
            offset,
            content: vec![unit],
            formats,
            inherit: true,
        })
    }
}
