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

use widestring::U16String;

use super::Unit;
use crate::{FormatTable, SlotError};

/// An ordered container of [`Unit`]s plus the [`FormatTable`] anchored to
/// its offsets.
///
/// Adjacent text units are always merged, and empty text units are never
/// stored, so two slots with the same content compare equal regardless of
/// the edits that produced them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Slot {
    pub(crate) units: Vec<Unit>,
    pub(crate) len: usize,
    pub(crate) formats: FormatTable,
}

impl Slot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot holding unformatted `text`.
    pub fn from_text(text: &str) -> Self {
        Self::from_units(vec![Unit::text(text)])
    }

    /// Create an unformatted slot from `units`.
    pub fn from_units(units: Vec<Unit>) -> Self {
        let mut slot = Self {
            units,
            len: 0,
            formats: FormatTable::new(),
        };
        slot.normalize_units();
        slot
    }

    /// Create a slot from units and a format table, validating the table
    /// against the content length.
    pub fn from_parts(
        units: Vec<Unit>,
        formats: FormatTable,
    ) -> Result<Self, SlotError> {
        let mut slot = Self::from_units(units);
        formats.check_invariants(slot.len)?;
        slot.formats = formats;
        Ok(slot)
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn formats(&self) -> &FormatTable {
        &self.formats
    }

    /// The content with components left out.
    pub fn to_plain_text(&self) -> String {
        let mut out = U16String::new();
        for unit in &self.units {
            if let Unit::Text(text) = unit {
                out.push_slice(text.as_slice());
            }
        }
        String::from_utf16_lossy(out.as_slice())
    }

    /// The units covering `[from, to)`, with text cut at the bounds.
    ///
    /// Formats are not included; combine with
    /// [`query_formats_in`](Self::query_formats_in) when they are needed.
    pub fn slice_units(
        &self,
        from: usize,
        to: usize,
    ) -> Result<Vec<Unit>, SlotError> {
        self.check_range("slice_units", from, to)?;
        let mut out = Vec::new();
        let mut pos = 0;
        for unit in &self.units {
            let unit_len = unit.len();
            let (start, end) = (pos, pos + unit_len);
            pos = end;
            if end <= from || start >= to {
                continue;
            }
            match unit {
                Unit::Text(text) => {
                    let a = from.max(start) - start;
                    let b = to.min(end) - start;
                    out.push(Unit::Text(U16String::from_vec(
                        text.as_slice()[a..b].to_vec(),
                    )));
                }
                Unit::Component(_) => out.push(unit.clone()),
            }
        }
        Ok(out)
    }

    /// A debug tree of the slot content and its format ranges.
    pub fn to_tree(&self) -> String {
        let mut out = format!("slot (len {})\n", self.len);
        for (formatter, spans) in self.formats.iter() {
            let ranges: Vec<String> = spans
                .iter()
                .map(|s| {
                    let effect = if s.effect.renders() {
                        String::new()
                    } else {
                        format!(" {}", s.effect)
                    };
                    format!("[{}, {})={}{effect}", s.start, s.end, s.value)
                })
                .collect();
            out.push_str(&format!(
                "├─ {} {}\n",
                formatter.name(),
                ranges.join(" ")
            ));
        }
        for unit in &self.units {
            match unit {
                Unit::Text(text) => out.push_str(&format!(
                    "│  \"{}\"\n",
                    String::from_utf16_lossy(text.as_slice())
                )),
                Unit::Component(c) => out.push_str(&format!("│  <{c}>\n")),
            }
        }
        out
    }

    pub(crate) fn check_offset(
        &self,
        op: &'static str,
        offset: usize,
    ) -> Result<(), SlotError> {
        if offset > self.len {
            return Err(SlotError::OffsetOutOfRange {
                op,
                offset,
                len: self.len,
            });
        }
        Ok(())
    }

    pub(crate) fn check_range(
        &self,
        op: &'static str,
        start: usize,
        end: usize,
    ) -> Result<(), SlotError> {
        if start > end || end > self.len {
            return Err(SlotError::RangeOutOfBounds {
                op,
                start,
                end,
                len: self.len,
            });
        }
        Ok(())
    }

    /// Make sure a unit boundary falls at `offset` and return the index of
    /// the unit starting there. Components have length 1, so only text is
    /// ever split.
    pub(crate) fn split_units_at(&mut self, offset: usize) -> usize {
        let mut pos = 0;
        for i in 0..self.units.len() {
            if pos == offset {
                return i;
            }
            let unit_len = self.units[i].len();
            if offset < pos + unit_len {
                if let Unit::Text(text) = &mut self.units[i] {
                    let at = offset - pos;
                    let (head, tail) = {
                        let s = text.as_slice();
                        (s[..at].to_vec(), s[at..].to_vec())
                    };
                    *text = U16String::from_vec(head);
                    self.units
                        .insert(i + 1, Unit::Text(U16String::from_vec(tail)));
                }
                return i + 1;
            }
            pos += unit_len;
        }
        self.units.len()
    }

    /// Merge adjacent text units, drop empty ones and recompute the length.
    pub(crate) fn normalize_units(&mut self) {
        let mut out: Vec<Unit> = Vec::with_capacity(self.units.len());
        for unit in self.units.drain(..) {
            if unit.is_empty() {
                continue;
            }
            if let (Some(Unit::Text(last)), Unit::Text(text)) =
                (out.last_mut(), &unit)
            {
                last.push_slice(text.as_slice());
                continue;
            }
            out.push(unit);
        }
        self.len = out.iter().map(Unit::len).sum();
        self.units = out;
    }
}
