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

//! Structural slot edits: insert, paste, cut, delete, split, append.

use super::{Slot, Unit};
use crate::{Effect, FormatSpan, FormatValue, Formatter, SlotError};

impl Slot {
    /// Insert text or a component at `offset`.
    ///
    /// Ranges strictly spanning `offset` grow over the new content when
    /// their formatter is inheritable, and split around it otherwise.
    /// Inserting empty text changes nothing.
    pub fn insert(
        &mut self,
        offset: usize,
        content: impl Into<Unit>,
    ) -> Result<(), SlotError> {
        self.check_offset("insert", offset)?;
        let content = content.into();
        if content.is_empty() {
            return Ok(());
        }
        self.splice_in(offset, Slot::from_units(vec![content]), true)
    }

    /// Insert content and apply `formats` over it, as typing with pending
    /// formats does.
    pub fn insert_with_formats(
        &mut self,
        offset: usize,
        content: impl Into<Unit>,
        formats: &[(Formatter, FormatValue)],
    ) -> Result<(), SlotError> {
        self.check_offset("insert_with_formats", offset)?;
        let content = Slot::from_units(vec![content.into()]);
        if content.is_empty() {
            return Ok(());
        }
        let end = offset + content.len();
        let mut next = self.clone();
        next.splice_in(offset, content, true)?;
        for (formatter, value) in formats {
            next.formats.apply(
                formatter,
                FormatSpan::new(offset, end, value.clone(), Effect::Valid),
                next.len,
            )?;
        }
        *self = next;
        Ok(())
    }

    /// Paste `other` at `offset`. The pasted content keeps its own ranges
    /// and does not inherit the ranges around the insertion point.
    pub fn insert_slot(
        &mut self,
        offset: usize,
        other: Slot,
    ) -> Result<(), SlotError> {
        self.check_offset("insert_slot", offset)?;
        self.splice_in(offset, other, false)
    }

    /// Remove `[start, end)` and return it as an independent slot with its
    /// ranges rebased to 0.
    ///
    /// Ranges fully inside the cut move to the returned slot, ranges
    /// straddling a bound are clipped on both sides, and ranges after `end`
    /// move left by the removed length.
    pub fn cut(&mut self, start: usize, end: usize) -> Result<Slot, SlotError> {
        self.check_range("cut", start, end)?;
        if start == end {
            return Ok(Slot::new());
        }
        let len_after = self.len - (end - start);
        let mut formats = self.formats.clone();
        let removed_formats = formats.split_removed(start, end, len_after)?;

        let from = self.split_units_at(start);
        let to = self.split_units_at(end);
        let removed_units: Vec<Unit> = self.units.drain(from..to).collect();
        self.normalize_units();
        self.formats = formats;

        let mut removed = Slot::from_units(removed_units);
        removed.formats = removed_formats;
        self.debug_assert_invariants();
        Ok(removed)
    }

    /// Remove `[start, end)`.
    pub fn delete(&mut self, start: usize, end: usize) -> Result<(), SlotError> {
        self.cut(start, end).map(|_| ())
    }

    /// Split the slot at `offset`, returning everything after it.
    pub fn split_at(&mut self, offset: usize) -> Result<Slot, SlotError> {
        self.check_offset("split_at", offset)?;
        self.cut(offset, self.len)
    }

    /// Append `other` to the end of this slot.
    pub fn append(&mut self, other: Slot) -> Result<(), SlotError> {
        self.splice_in(self.len, other, false)
    }

    /// Insert the units of `other` at `offset` and merge its ranges.
    ///
    /// The new format table is computed before the units change, so a
    /// failure leaves the slot untouched.
    pub(crate) fn splice_in(
        &mut self,
        offset: usize,
        other: Slot,
        inherit: bool,
    ) -> Result<(), SlotError> {
        self.check_offset("insert", offset)?;
        if other.is_empty() {
            return Ok(());
        }
        let inserted = other.len;
        let len_after = self.len + inserted;

        let mut formats = self.formats.clone();
        formats.shift_for_insert(offset, inserted, len_after, inherit)?;
        formats.merge_pasted(&other.formats, offset, len_after)?;

        let at = self.split_units_at(offset);
        self.units.splice(at..at, other.units);
        self.normalize_units();
        self.formats = formats;
        self.debug_assert_invariants();
        Ok(())
    }

    #[cfg(any(test, feature = "assert-invariants"))]
    pub(crate) fn debug_assert_invariants(&self) {
        if let Err(e) = self.formats.check_invariants(self.len) {
            panic!("slot invariants broken: {e}");
        }
    }

    #[cfg(not(any(test, feature = "assert-invariants")))]
    pub(crate) fn debug_assert_invariants(&self) {}
}
