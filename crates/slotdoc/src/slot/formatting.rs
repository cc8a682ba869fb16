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

//! Format application and queries over a slot's format table.

use std::cmp::Reverse;

use super::Slot;
use crate::{Effect, FormatSpan, FormatValue, Formatter, SlotError};

/// A formatter active at some offset, with the value and effect of the
/// range covering it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveFormat {
    pub formatter: Formatter,
    pub value: FormatValue,
    pub effect: Effect,
}

/// A maximal run of a slot over which the set of active formats is
/// constant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatSegment {
    pub start: usize,
    pub end: usize,
    pub formats: Vec<ActiveFormat>,
}

impl Slot {
    /// Apply `formatter` over `[start, end)`, overwriting any range of the
    /// same formatter there.
    ///
    /// Block and outer formats always cover the whole slot, and a block
    /// format replaces any other block format.
    pub fn apply_format(
        &mut self,
        formatter: &Formatter,
        start: usize,
        end: usize,
        value: impl Into<FormatValue>,
        effect: Effect,
    ) -> Result<(), SlotError> {
        if start >= end || end > self.len {
            return Err(SlotError::RangeOutOfBounds {
                op: "apply_format",
                start,
                end,
                len: self.len,
            });
        }
        self.formats.apply(
            formatter,
            FormatSpan::new(start, end, value, effect),
            self.len,
        )?;
        self.debug_assert_invariants();
        Ok(())
    }

    /// Clear the formatter called `name` over `[start, end)`. Block and
    /// outer formats are removed from the whole slot.
    pub fn remove_format(
        &mut self,
        name: &str,
        start: usize,
        end: usize,
    ) -> Result<(), SlotError> {
        self.check_range("remove_format", start, end)?;
        if start == end {
            return Ok(());
        }
        self.formats.clear(name, start, end, self.len)?;
        self.debug_assert_invariants();
        Ok(())
    }

    /// Replace the ranges of each given formatter wholesale.
    pub(crate) fn replace_formats(
        &mut self,
        ranges: Vec<(Formatter, Vec<FormatSpan>)>,
    ) -> Result<(), SlotError> {
        self.formats.replace(ranges, self.len)?;
        self.debug_assert_invariants();
        Ok(())
    }

    /// Every format covering the unit at `offset`: the block format first,
    /// then outer formats, then inline formats from outermost (highest
    /// priority) to innermost.
    pub fn query_formats_at(
        &self,
        offset: usize,
    ) -> Result<Vec<ActiveFormat>, SlotError> {
        if offset >= self.len {
            return Err(SlotError::OffsetOutOfRange {
                op: "query_formats_at",
                offset,
                len: self.len,
            });
        }
        Ok(self.active_formats(offset))
    }

    /// `[start, end)` split at every range boundary, each segment with the
    /// formats active over it.
    pub fn query_formats_in(
        &self,
        start: usize,
        end: usize,
    ) -> Result<Vec<FormatSegment>, SlotError> {
        self.check_range("query_formats_in", start, end)?;
        if start == end {
            return Ok(Vec::new());
        }
        let mut bounds = self.formats.boundaries_within(start, end);
        bounds.insert(start);
        bounds.insert(end);
        let bounds: Vec<usize> = bounds.into_iter().collect();
        Ok(bounds
            .windows(2)
            .map(|w| FormatSegment {
                start: w[0],
                end: w[1],
                formats: self.active_formats(w[0]),
            })
            .collect())
    }

    fn active_formats(&self, offset: usize) -> Vec<ActiveFormat> {
        let mut active: Vec<ActiveFormat> = self
            .formats
            .active_at(offset)
            .map(|(formatter, span)| ActiveFormat {
                formatter: formatter.clone(),
                value: span.value.clone(),
                effect: span.effect,
            })
            .collect();
        active.sort_by(|a, b| {
            let key = |f: &ActiveFormat| {
                (
                    f.formatter.kind().render_rank(),
                    Reverse(f.formatter.priority()),
                )
            };
            key(a)
                .cmp(&key(b))
                .then_with(|| a.formatter.name().cmp(b.formatter.name()))
        });
        active
    }
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use crate::{
        builtin, Effect, FormatSpan, FormatValue, Formatter, Slot, SlotError,
    };

    fn slot_with_text(text: &str) -> Slot {
        Slot::from_text(text)
    }

    fn names_at(slot: &Slot, offset: usize) -> Vec<String> {
        slot.query_formats_at(offset)
            .unwrap()
            .into_iter()
            .map(|f| f.formatter.name().to_owned())
            .collect()
    }

    // ===================================================================
    // Apply and remove
    // ===================================================================

    #[test]
    fn applying_a_format_over_a_range() {
        let mut slot = slot_with_text("hello world");
        slot.apply_format(&builtin::bold(), 0, 5, true, Effect::Valid)
            .unwrap();
        assert_eq!(
            slot.formats().spans("bold"),
            &[FormatSpan::valid(0, 5, true)]
        );
    }

    #[test]
    fn applying_over_an_empty_or_reversed_range_fails() {
        let mut slot = slot_with_text("abc");
        for (start, end) in [(1, 1), (2, 1), (0, 4)] {
            let err = slot
                .apply_format(&builtin::bold(), start, end, true, Effect::Valid)
                .unwrap_err();
            assert!(err.is_range_error());
        }
        assert!(slot.formats().is_empty());
    }

    #[test]
    fn block_format_on_an_empty_slot_fails() {
        let mut slot = Slot::new();
        assert!(matches!(
            slot.apply_format(&builtin::quote(), 0, 0, true, Effect::Valid),
            Err(SlotError::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn applying_touching_ranges_merges_them() {
        let mut slot = slot_with_text("abcdef");
        slot.apply_format(&builtin::bold(), 0, 2, true, Effect::Valid)
            .unwrap();
        slot.apply_format(&builtin::bold(), 2, 4, true, Effect::Valid)
            .unwrap();
        assert_that!(slot.formats().spans("bold"))
            .is_equal_to(&[FormatSpan::valid(0, 4, true)][..]);
    }

    #[test]
    fn removing_a_format_from_the_middle_splits_it() {
        let mut slot = slot_with_text("abcdef");
        slot.apply_format(&builtin::bold(), 0, 6, true, Effect::Valid)
            .unwrap();
        slot.remove_format("bold", 2, 4).unwrap();
        assert_eq!(
            slot.formats().spans("bold"),
            &[FormatSpan::valid(0, 2, true), FormatSpan::valid(4, 6, true)]
        );
    }

    #[test]
    fn removing_a_block_format_removes_it_entirely() {
        let mut slot = slot_with_text("abc");
        slot.apply_format(&builtin::quote(), 0, 1, true, Effect::Valid)
            .unwrap();
        slot.remove_format("quote", 1, 2).unwrap();
        assert!(slot.formats().is_empty());
    }

    #[test]
    fn removing_an_absent_format_is_a_no_op() {
        let mut slot = slot_with_text("abc");
        slot.remove_format("bold", 0, 3).unwrap();
        assert!(slot.formats().is_empty());
    }

    // ===================================================================
    // Queries
    // ===================================================================

    #[test]
    fn formats_at_an_offset_are_ordered_outermost_first() {
        let mut slot = slot_with_text("abcdef");
        slot.apply_format(&builtin::italic(), 0, 6, true, Effect::Valid)
            .unwrap();
        slot.apply_format(&builtin::link(), 1, 3, "https://x", Effect::Valid)
            .unwrap();
        slot.apply_format(&builtin::bold(), 0, 6, true, Effect::Valid)
            .unwrap();
        slot.apply_format(&builtin::text_align(), 0, 1, "center", Effect::Valid)
            .unwrap();
        slot.apply_format(&builtin::quote(), 0, 1, true, Effect::Valid)
            .unwrap();
        assert_eq!(
            names_at(&slot, 2),
            vec!["quote", "text_align", "link", "bold", "italic"]
        );
        assert_eq!(
            names_at(&slot, 4),
            vec!["quote", "text_align", "bold", "italic"]
        );
    }

    #[test]
    fn equal_priorities_are_ordered_by_name() {
        let mut slot = slot_with_text("ab");
        for name in ["zeta", "alpha"] {
            slot.apply_format(
                &Formatter::inline(name),
                0,
                2,
                true,
                Effect::Valid,
            )
            .unwrap();
        }
        assert_eq!(names_at(&slot, 0), vec!["alpha", "zeta"]);
    }

    #[test]
    fn querying_at_the_end_fails() {
        let slot = slot_with_text("abc");
        assert!(matches!(
            slot.query_formats_at(3),
            Err(SlotError::OffsetOutOfRange { offset: 3, len: 3, .. })
        ));
    }

    #[test]
    fn query_reports_value_and_effect() {
        let mut slot = slot_with_text("abc");
        slot.apply_format(&builtin::bold(), 0, 3, 2, Effect::Invalid)
            .unwrap();
        let active = slot.query_formats_at(1).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].value, FormatValue::Int(2));
        assert_eq!(active[0].effect, Effect::Invalid);
    }

    #[test]
    fn segments_split_at_every_boundary() {
        let mut slot = slot_with_text("0123456789");
        slot.apply_format(&builtin::bold(), 2, 6, true, Effect::Valid)
            .unwrap();
        slot.apply_format(&builtin::italic(), 4, 8, true, Effect::Valid)
            .unwrap();
        let segments = slot.query_formats_in(1, 9).unwrap();
        let bounds: Vec<(usize, usize)> =
            segments.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(bounds, vec![(1, 2), (2, 4), (4, 6), (6, 8), (8, 9)]);
        let names: Vec<&str> =
            segments[2].formats.iter().map(|f| f.formatter.name()).collect();
        assert_eq!(names, vec!["bold", "italic"]);
        assert!(segments[0].formats.is_empty());
    }

    #[test]
    fn segments_skip_nothing_when_unformatted() {
        let slot = slot_with_text("abc");
        let segments = slot.query_formats_in(0, 3).unwrap();
        assert_eq!(segments.len(), 1);
        assert!(slot.query_formats_in(1, 1).unwrap().is_empty());
    }
}
