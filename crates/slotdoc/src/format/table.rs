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

//! Per-slot interval table mapping each formatter to its ranges.
//!
//! Every mutation builds the complete new set of ranges, validates it with
//! [`FormatTable::check_invariants`] and only then replaces the old set, so
//! a failed mutation leaves the table exactly as it was.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{Effect, FormatValue, Formatter, FormatterKind};
use crate::SlotError;

/// A half-open range `[start, end)` of one formatter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatSpan {
    pub start: usize,
    pub end: usize,
    pub value: FormatValue,
    #[serde(default)]
    pub effect: Effect,
}

impl FormatSpan {
    pub fn new(
        start: usize,
        end: usize,
        value: impl Into<FormatValue>,
        effect: Effect,
    ) -> Self {
        Self {
            start,
            end,
            value: value.into(),
            effect,
        }
    }

    pub fn valid(
        start: usize,
        end: usize,
        value: impl Into<FormatValue>,
    ) -> Self {
        Self::new(start, end, value, Effect::Valid)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    fn same_payload(&self, other: &FormatSpan) -> bool {
        self.value == other.value && self.effect == other.effect
    }

    fn with_bounds(&self, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            value: self.value.clone(),
            effect: self.effect,
        }
    }
}

/// A range in wire form: the formatter is referenced by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRecord {
    pub formatter: String,
    pub start: usize,
    pub end: usize,
    pub value: FormatValue,
    #[serde(default)]
    pub effect: Effect,
}

/// All ranges of one formatter, in wire form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterRanges {
    pub formatter: String,
    pub spans: Vec<FormatSpan>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    formatter: Formatter,
    spans: Vec<FormatSpan>,
}

impl Entry {
    fn new(formatter: Formatter) -> Self {
        Self {
            formatter,
            spans: Vec::new(),
        }
    }

    fn spans_whole_slot(&self) -> bool {
        self.formatter.kind().spans_whole_slot()
    }
}

type Entries = BTreeMap<String, Entry>;

/// The ranges of every formatter applied to one slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatTable {
    entries: Entries,
}

impl FormatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table for a slot of length `len` from externally supplied
    /// ranges. Ranges are coalesced but never clipped.
    pub fn from_ranges(
        ranges: impl IntoIterator<Item = (Formatter, Vec<FormatSpan>)>,
        len: usize,
    ) -> Result<Self, SlotError> {
        let mut table = Self::new();
        table.replace(ranges, len)?;
        Ok(table)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The ranges of the formatter called `name`, sorted by start.
    pub fn spans(&self, name: &str) -> &[FormatSpan] {
        self.entries
            .get(name)
            .map(|e| e.spans.as_slice())
            .unwrap_or(&[])
    }

    pub fn formatter(&self, name: &str) -> Option<&Formatter> {
        self.entries.get(name).map(|e| &e.formatter)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Formatter, &[FormatSpan])> {
        self.entries
            .values()
            .map(|e| (&e.formatter, e.spans.as_slice()))
    }

    /// Every range in wire form, ordered by formatter name then start.
    pub fn records(&self) -> Vec<RangeRecord> {
        self.iter()
            .flat_map(|(formatter, spans)| {
                spans.iter().map(move |s| RangeRecord {
                    formatter: formatter.name().to_owned(),
                    start: s.start,
                    end: s.end,
                    value: s.value.clone(),
                    effect: s.effect,
                })
            })
            .collect()
    }

    /// The ranges of `name` in wire form (empty if the formatter is absent).
    pub fn ranges_of(&self, name: &str) -> FormatterRanges {
        FormatterRanges {
            formatter: name.to_owned(),
            spans: self.spans(name).to_vec(),
        }
    }

    /// Names of the block formatters present in the table.
    pub(crate) fn block_formatters(&self) -> Vec<String> {
        self.entries
            .values()
            .filter(|e| e.formatter.kind() == FormatterKind::Block)
            .map(|e| e.formatter.name().to_owned())
            .collect()
    }

    /// Every range containing `offset`.
    pub fn active_at(
        &self,
        offset: usize,
    ) -> impl Iterator<Item = (&Formatter, &FormatSpan)> {
        self.entries.values().filter_map(move |e| {
            e.spans
                .iter()
                .find(|s| s.contains(offset))
                .map(|s| (&e.formatter, s))
        })
    }

    /// Range boundaries strictly inside `(start, end)`.
    pub(crate) fn boundaries_within(
        &self,
        start: usize,
        end: usize,
    ) -> BTreeSet<usize> {
        self.entries
            .values()
            .flat_map(|e| e.spans.iter())
            .flat_map(|s| [s.start, s.end])
            .filter(|b| start < *b && *b < end)
            .collect()
    }

    /// Check every invariant of a table attached to a slot of length `len`.
    pub fn check_invariants(&self, len: usize) -> Result<(), SlotError> {
        let mut block: Option<&str> = None;
        for (name, entry) in &self.entries {
            if entry.spans.is_empty() {
                return Err(violation(format!(
                    "formatter `{name}` is present without ranges"
                )));
            }
            let mut prev: Option<&FormatSpan> = None;
            for span in &entry.spans {
                if span.is_empty() {
                    return Err(violation(format!(
                        "`{name}` has an empty range at {}",
                        span.start
                    )));
                }
                if span.end > len {
                    return Err(violation(format!(
                        "`{name}` range [{}, {}) exceeds slot length {len}",
                        span.start, span.end
                    )));
                }
                if let Some(prev) = prev {
                    if prev.end > span.start {
                        return Err(violation(format!(
                            "`{name}` ranges [{}, {}) and [{}, {}) overlap or are unsorted",
                            prev.start, prev.end, span.start, span.end
                        )));
                    }
                    if prev.end == span.start && prev.same_payload(span) {
                        return Err(violation(format!(
                            "`{name}` ranges meeting at {} were not merged",
                            span.start
                        )));
                    }
                }
                prev = Some(span);
            }
            if entry.spans_whole_slot()
                && !matches!(entry.spans.as_slice(), [only] if only.start == 0 && only.end == len)
            {
                return Err(violation(format!(
                    "{} formatter `{name}` must hold one range over the whole slot",
                    entry.formatter.kind()
                )));
            }
            if entry.formatter.kind() == FormatterKind::Block {
                if let Some(other) = block {
                    return Err(violation(format!(
                        "block formats `{other}` and `{name}` both claim the slot"
                    )));
                }
                block = Some(name);
            }
        }
        Ok(())
    }

    /// Add `span` for `formatter`, overwriting whatever the formatter had in
    /// that span. Block and outer spans are widened to the whole slot, and a
    /// block format replaces any other block format.
    pub(crate) fn apply(
        &mut self,
        formatter: &Formatter,
        span: FormatSpan,
        len: usize,
    ) -> Result<(), SlotError> {
        let kind = formatter.kind();
        let span = if kind.spans_whole_slot() {
            span.with_bounds(0, len)
        } else {
            span
        };

        let mut entries = self.entries.clone();
        if kind == FormatterKind::Block {
            entries.retain(|name, e| {
                e.formatter.kind() != FormatterKind::Block
                    || name == formatter.name()
            });
        }
        let entry = entries
            .entry(formatter.name().to_owned())
            .or_insert_with(|| Entry::new(formatter.clone()));
        entry.formatter = formatter.clone();
        entry.spans = overlay(&entry.spans, span);

        self.commit(entries, len)
    }

    /// Remove the formatter called `name` from `[start, end)`. Block and
    /// outer formats are removed entirely.
    pub(crate) fn clear(
        &mut self,
        name: &str,
        start: usize,
        end: usize,
        len: usize,
    ) -> Result<(), SlotError> {
        let mut entries = self.entries.clone();
        if let Some(entry) = entries.get_mut(name) {
            entry.spans = if entry.spans_whole_slot() {
                Vec::new()
            } else {
                coalesce(carve(&entry.spans, start, end))
            };
        }
        self.commit(entries, len)
    }

    /// Replace the ranges of each given formatter wholesale. An empty list
    /// removes the formatter.
    pub(crate) fn replace(
        &mut self,
        ranges: impl IntoIterator<Item = (Formatter, Vec<FormatSpan>)>,
        len: usize,
    ) -> Result<(), SlotError> {
        let mut entries = self.entries.clone();
        for (formatter, spans) in ranges {
            entries.insert(
                formatter.name().to_owned(),
                Entry {
                    formatter,
                    spans: coalesce(spans),
                },
            );
        }
        self.commit(entries, len)
    }

    /// Transform every range for `inserted` units added at `offset`.
    ///
    /// Ranges ending at or before `offset` are untouched and ranges starting
    /// at or after it move right. A range strictly spanning `offset` grows
    /// when `inherit` is set and its formatter is inheritable; otherwise it
    /// splits around the inserted content.
    pub(crate) fn shift_for_insert(
        &mut self,
        offset: usize,
        inserted: usize,
        len_after: usize,
        inherit: bool,
    ) -> Result<(), SlotError> {
        let mut entries = self.entries.clone();
        for entry in entries.values_mut() {
            let whole = entry.spans_whole_slot();
            let extend =
                whole || (inherit && entry.formatter.is_inheritable());
            let shifted = shift(&entry.spans, offset, inserted, extend);
            entry.spans = if whole {
                stretch(shifted, len_after)
            } else {
                shifted
            };
        }
        log::trace!(
            "shifted format table for {inserted} units at {offset} (inherit: {inherit})"
        );
        self.commit(entries, len_after)
    }

    /// Remove `[start, end)` from every range and return the removed parts
    /// as a table rebased to 0. Ranges after `end` move left.
    pub(crate) fn split_removed(
        &mut self,
        start: usize,
        end: usize,
        len_after: usize,
    ) -> Result<FormatTable, SlotError> {
        let mut kept_entries = self.entries.clone();
        let mut removed_entries = Entries::new();
        for (name, entry) in kept_entries.iter_mut() {
            let (kept, removed) = split_removed(&entry.spans, start, end);
            entry.spans = if entry.spans_whole_slot() {
                stretch(kept, len_after)
            } else {
                kept
            };
            if !removed.is_empty() {
                removed_entries.insert(
                    name.clone(),
                    Entry {
                        formatter: entry.formatter.clone(),
                        spans: removed,
                    },
                );
            }
        }

        let mut removed = FormatTable::new();
        removed.commit(removed_entries, end - start)?;
        self.commit(kept_entries, len_after)?;
        log::trace!("split format table around [{start}, {end})");
        Ok(removed)
    }

    /// Re-apply the ranges of a pasted slot, rebased to `offset`.
    ///
    /// Pasted inline ranges overwrite the destination over the pasted span.
    /// A pasted block or outer range is adopted only when it does not
    /// conflict with the destination's own whole-slot formats.
    pub(crate) fn merge_pasted(
        &mut self,
        pasted: &FormatTable,
        offset: usize,
        len_after: usize,
    ) -> Result<(), SlotError> {
        let mut entries = self.entries.clone();
        let dest_block = self.block_formatters();

        for (name, source) in &pasted.entries {
            let shifted: Vec<FormatSpan> = source
                .spans
                .iter()
                .map(|s| s.with_bounds(s.start + offset, s.end + offset))
                .collect();

            if source.spans_whole_slot() {
                let Some(first) = shifted.first() else {
                    continue;
                };
                let conflict = match entries.get(name) {
                    Some(existing) => {
                        existing.spans.iter().any(|s| !s.same_payload(first))
                    }
                    None => {
                        source.formatter.kind() == FormatterKind::Block
                            && !dest_block.is_empty()
                    }
                };
                if conflict {
                    log::warn!(
                        "dropping pasted `{name}` format: the slot already carries a conflicting one"
                    );
                    continue;
                }
                entries.insert(
                    name.clone(),
                    Entry {
                        formatter: source.formatter.clone(),
                        spans: vec![first.with_bounds(0, len_after)],
                    },
                );
            } else {
                let entry = entries
                    .entry(name.clone())
                    .or_insert_with(|| Entry::new(source.formatter.clone()));
                for span in shifted {
                    entry.spans = overlay(&entry.spans, span);
                }
            }
        }

        self.commit(entries, len_after)
    }

    fn commit(
        &mut self,
        mut entries: Entries,
        len: usize,
    ) -> Result<(), SlotError> {
        entries.retain(|_, e| !e.spans.is_empty());
        let candidate = FormatTable { entries };
        candidate.check_invariants(len)?;
        *self = candidate;
        Ok(())
    }
}

fn violation(message: String) -> SlotError {
    SlotError::InvariantViolation(message)
}

/// Sort, drop empty spans and merge touching spans with the same value and
/// effect.
fn coalesce(mut spans: Vec<FormatSpan>) -> Vec<FormatSpan> {
    spans.retain(|s| !s.is_empty());
    spans.sort_by_key(|s| (s.start, s.end));
    let mut out: Vec<FormatSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match out.last_mut() {
            Some(last)
                if last.end >= span.start && last.same_payload(&span) =>
            {
                last.end = last.end.max(span.end);
            }
            _ => out.push(span),
        }
    }
    out
}

/// The parts of `spans` outside `[start, end)`.
fn carve(spans: &[FormatSpan], start: usize, end: usize) -> Vec<FormatSpan> {
    let mut out = Vec::with_capacity(spans.len() + 1);
    for s in spans {
        if s.end <= start || s.start >= end {
            out.push(s.clone());
            continue;
        }
        if s.start < start {
            out.push(s.with_bounds(s.start, start));
        }
        if s.end > end {
            out.push(s.with_bounds(end, s.end));
        }
    }
    out
}

fn overlay(spans: &[FormatSpan], span: FormatSpan) -> Vec<FormatSpan> {
    let mut out = carve(spans, span.start, span.end);
    out.push(span);
    coalesce(out)
}

fn shift(
    spans: &[FormatSpan],
    offset: usize,
    len: usize,
    extend: bool,
) -> Vec<FormatSpan> {
    let mut out = Vec::with_capacity(spans.len() + 1);
    for s in spans {
        if s.end <= offset {
            out.push(s.clone());
        } else if s.start >= offset {
            out.push(s.with_bounds(s.start + len, s.end + len));
        } else if extend {
            out.push(s.with_bounds(s.start, s.end + len));
        } else {
            out.push(s.with_bounds(s.start, offset));
            out.push(s.with_bounds(offset + len, s.end + len));
        }
    }
    coalesce(out)
}

/// Returns the survivors of removing `[start, end)` (shifted left) and the
/// removed parts (rebased to `start`).
fn split_removed(
    spans: &[FormatSpan],
    start: usize,
    end: usize,
) -> (Vec<FormatSpan>, Vec<FormatSpan>) {
    let removed_len = end - start;
    let mut kept = Vec::with_capacity(spans.len());
    let mut removed = Vec::new();
    for s in spans {
        if s.start < start {
            kept.push(s.with_bounds(s.start, s.end.min(start)));
        }
        if s.end > end {
            kept.push(s.with_bounds(
                s.start.max(end) - removed_len,
                s.end - removed_len,
            ));
        }
        let (a, b) = (s.start.max(start), s.end.min(end));
        if a < b {
            removed.push(s.with_bounds(a - start, b - start));
        }
    }
    (coalesce(kept), coalesce(removed))
}

/// Re-span a whole-slot formatter's single range over `[0, len)`.
fn stretch(spans: Vec<FormatSpan>, len: usize) -> Vec<FormatSpan> {
    if len == 0 {
        return Vec::new();
    }
    match spans.as_slice() {
        [only] => vec![only.with_bounds(0, len)],
        _ => spans,
    }
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use super::*;
    use crate::builtin;

    fn span(start: usize, end: usize) -> FormatSpan {
        FormatSpan::valid(start, end, true)
    }

    fn table_with(
        formatter: &Formatter,
        spans: &[FormatSpan],
        len: usize,
    ) -> FormatTable {
        let mut table = FormatTable::new();
        for s in spans {
            table.apply(formatter, s.clone(), len).unwrap();
        }
        table
    }

    // ===================================================================
    // Normalisation
    // ===================================================================

    #[test]
    fn coalesce_merges_touching_and_overlapping_equal_spans() {
        let merged = coalesce(vec![span(4, 6), span(0, 2), span(2, 3)]);
        assert_eq!(merged, vec![span(0, 3), span(4, 6)]);
    }

    #[test]
    fn coalesce_keeps_different_values_apart() {
        let merged = coalesce(vec![
            FormatSpan::valid(0, 2, "left"),
            FormatSpan::valid(2, 4, "right"),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn coalesce_keeps_different_effects_apart() {
        let merged = coalesce(vec![
            span(0, 2),
            FormatSpan::new(2, 4, true, Effect::Invalid),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn overlay_overwrites_the_covered_part() {
        let out = overlay(
            &[FormatSpan::valid(0, 10, "a")],
            FormatSpan::valid(3, 5, "b"),
        );
        assert_eq!(
            out,
            vec![
                FormatSpan::valid(0, 3, "a"),
                FormatSpan::valid(3, 5, "b"),
                FormatSpan::valid(5, 10, "a"),
            ]
        );
    }

    #[test]
    fn repeated_apply_keeps_ranges_sorted_disjoint_and_merged() {
        let bold = builtin::bold();
        let mut table = FormatTable::new();
        let mut seed: u64 = 7;
        for round in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            let a = (seed >> 33) as usize % 40;
            let b = (seed >> 17) as usize % 40;
            let (start, end) = (a.min(b), a.max(b) + 1);
            let value = FormatValue::Int((seed % 3) as i64);
            let effect = if round % 7 == 0 {
                Effect::Invalid
            } else {
                Effect::Valid
            };
            table
                .apply(&bold, FormatSpan::new(start, end, value, effect), 41)
                .unwrap();
            assert_that!(table.check_invariants(41)).is_ok();
        }
    }

    // ===================================================================
    // Structural transforms
    // ===================================================================

    #[test]
    fn insert_inside_inheritable_range_extends_it() {
        let bold = builtin::bold();
        let mut table = table_with(&bold, &[span(2, 6)], 10);
        table.shift_for_insert(4, 3, 13, true).unwrap();
        assert_eq!(table.spans("bold"), &[span(2, 9)]);
    }

    #[test]
    fn insert_inside_non_inheritable_range_splits_it() {
        let link = builtin::link();
        let url = FormatSpan::valid(2, 6, "https://example.org");
        let mut table = table_with(&link, &[url], 10);
        table.shift_for_insert(4, 3, 13, true).unwrap();
        assert_eq!(
            table.spans("link"),
            &[
                FormatSpan::valid(2, 4, "https://example.org"),
                FormatSpan::valid(7, 9, "https://example.org"),
            ]
        );
    }

    #[test]
    fn insert_without_inheritance_splits_inheritable_ranges() {
        let bold = builtin::bold();
        let mut table = table_with(&bold, &[span(2, 6)], 10);
        table.shift_for_insert(4, 3, 13, false).unwrap();
        assert_eq!(table.spans("bold"), &[span(2, 4), span(7, 9)]);
    }

    #[test]
    fn insert_at_range_edges_does_not_extend() {
        let bold = builtin::bold();
        let mut table = table_with(&bold, &[span(2, 6)], 10);
        table.shift_for_insert(6, 1, 11, true).unwrap();
        assert_eq!(table.spans("bold"), &[span(2, 6)]);
        table.shift_for_insert(2, 1, 12, true).unwrap();
        assert_eq!(table.spans("bold"), &[span(3, 7)]);
    }

    #[test]
    fn removal_clips_shifts_and_exports() {
        let bold = builtin::bold();
        let mut table = table_with(&bold, &[span(3, 6)], 10);
        let removed = table.split_removed(1, 5, 6).unwrap();
        assert_eq!(table.spans("bold"), &[span(1, 2)]);
        assert_eq!(removed.spans("bold"), &[span(2, 4)]);
    }

    #[test]
    fn removal_merges_ranges_that_become_adjacent() {
        let bold = builtin::bold();
        let mut table = table_with(&bold, &[span(0, 2), span(4, 6)], 6);
        table.split_removed(2, 4, 4).unwrap();
        assert_eq!(table.spans("bold"), &[span(0, 4)]);
    }

    #[test]
    fn whole_slot_ranges_follow_the_slot_length() {
        let quote = builtin::quote();
        let mut table = table_with(&quote, &[span(0, 5)], 5);
        table.shift_for_insert(0, 2, 7, true).unwrap();
        assert_eq!(table.spans("quote"), &[span(0, 7)]);
        table.shift_for_insert(7, 1, 8, false).unwrap();
        assert_eq!(table.spans("quote"), &[span(0, 8)]);
        let removed = table.split_removed(2, 5, 5).unwrap();
        assert_eq!(table.spans("quote"), &[span(0, 5)]);
        assert_eq!(removed.spans("quote"), &[span(0, 3)]);
        table.split_removed(0, 5, 0).unwrap();
        assert!(table.is_empty());
    }

    // ===================================================================
    // Block exclusivity and validation
    // ===================================================================

    #[test]
    fn applying_a_block_replaces_the_previous_block() {
        let mut table = FormatTable::new();
        table.apply(&builtin::quote(), span(1, 2), 4).unwrap();
        table.apply(&builtin::code_block(), span(0, 1), 4).unwrap();
        assert!(table.spans("quote").is_empty());
        assert_eq!(table.spans("code_block"), &[span(0, 4)]);
    }

    #[test]
    fn outer_formats_stack_with_blocks() {
        let mut table = FormatTable::new();
        table.apply(&builtin::paragraph(), span(0, 4), 4).unwrap();
        table
            .apply(
                &builtin::text_align(),
                FormatSpan::valid(1, 2, "center"),
                4,
            )
            .unwrap();
        assert_eq!(table.spans("paragraph"), &[span(0, 4)]);
        assert_eq!(
            table.spans("text_align"),
            &[FormatSpan::valid(0, 4, "center")]
        );
    }

    #[test]
    fn two_blocks_from_outside_are_an_invariant_violation() {
        let result = FormatTable::from_ranges(
            vec![
                (builtin::quote(), vec![span(0, 3)]),
                (builtin::paragraph(), vec![span(0, 3)]),
            ],
            3,
        );
        assert!(matches!(result, Err(SlotError::InvariantViolation(_))));
    }

    #[test]
    fn overlapping_ranges_from_outside_are_rejected() {
        let result = FormatTable::from_ranges(
            vec![(
                builtin::bold(),
                vec![
                    FormatSpan::valid(0, 3, 1),
                    FormatSpan::valid(2, 5, 2),
                ],
            )],
            5,
        );
        assert!(matches!(result, Err(SlotError::InvariantViolation(_))));
    }

    #[test]
    fn out_of_bounds_ranges_from_outside_are_rejected() {
        let result = FormatTable::from_ranges(
            vec![(builtin::bold(), vec![span(0, 6)])],
            5,
        );
        assert!(matches!(result, Err(SlotError::InvariantViolation(_))));
    }

    #[test]
    fn failed_mutation_leaves_the_table_untouched() {
        let bold = builtin::bold();
        let mut table = table_with(&bold, &[span(0, 3)], 5);
        let before = table.clone();
        let result = table.replace(vec![(bold, vec![span(2, 9)])], 5);
        assert!(result.is_err());
        assert_eq!(table, before);
    }

    #[test]
    fn pasted_block_conflicting_with_the_destination_is_dropped() {
        let mut dest = table_with(&builtin::quote(), &[span(0, 4)], 4);
        dest.shift_for_insert(2, 2, 6, false).unwrap();
        let pasted = table_with(&builtin::code_block(), &[span(0, 2)], 2);
        dest.merge_pasted(&pasted, 2, 6).unwrap();
        assert_eq!(dest.block_formatters(), vec!["quote".to_owned()]);
        assert_eq!(dest.spans("quote"), &[span(0, 6)]);
    }

    #[test]
    fn records_list_every_range_by_formatter_name() {
        let mut table = table_with(&builtin::bold(), &[span(0, 1)], 4);
        table.apply(&builtin::italic(), span(2, 3), 4).unwrap();
        let names: Vec<String> =
            table.records().into_iter().map(|r| r.formatter).collect();
        assert_eq!(names, vec!["bold".to_owned(), "italic".to_owned()]);
    }
}
