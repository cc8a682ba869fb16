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

//! Applying a single [`Operation`]: the path shared by local commands,
//! undo, redo and remote operations.

use std::collections::BTreeMap;

use super::Document;
use crate::{
    DocumentError, FormatSpan, FormatTable, Formatter, FormatterKind,
    FormatterRanges, NodeId, Notification, Operation, RangeRecord, Result,
    Slot, SlotId, Unit, Value,
};

/// The result of applying one operation.
#[derive(Debug, Default)]
pub(crate) struct Applied {
    /// The operation that reverts this one, when there is anything to
    /// revert.
    pub inverse: Option<Operation>,
    /// Content removed by a delete.
    pub removed: Option<Slot>,
}

impl Applied {
    fn inverse(op: Operation) -> Self {
        Self {
            inverse: Some(op),
            removed: None,
        }
    }
}

impl Document {
    /// Apply `op` to the document. Each operation is all-or-nothing: on
    /// error the document is unchanged.
    pub(crate) fn apply_operation(&mut self, op: &Operation) -> Result<Applied> {
        log::trace!("applying {op:?}");
        let applied = match op {
            Operation::CreateSlot { slot } => {
                if self.slots.contains_key(slot) {
                    return Err(DocumentError::SlotExists(*slot));
                }
                let after = slot
                    .0
                    .checked_add(1)
                    .ok_or(DocumentError::SlotIdsExhausted(*slot))?;
                self.slots.insert(*slot, Slot::new());
                self.next_slot = self.next_slot.max(after);
                Applied::default()
            }
            Operation::Insert {
                slot,
                offset,
                content,
                formats,
                inherit,
            } => {
                let pasted = self.pasted_slot(*slot, content, formats)?;
                let inserted = pasted.len();
                self.slot_mut(*slot)?.splice_in(*offset, pasted, *inherit)?;
                if inserted == 0 {
                    Applied::default()
                } else {
                    Applied::inverse(Operation::Delete {
                        slot: *slot,
                        start: *offset,
                        end: offset + inserted,
                    })
                }
            }
            Operation::Delete { slot, start, end } => {
                let removed = self.slot_mut(*slot)?.cut(*start, *end)?;
                if removed.is_empty() {
                    Applied::default()
                } else {
                    Applied {
                        inverse: Some(Operation::Insert {
                            slot: *slot,
                            offset: *start,
                            content: removed.units().to_vec(),
                            formats: removed.formats().records(),
                            inherit: false,
                        }),
                        removed: Some(removed),
                    }
                }
            }
            Operation::Format {
                slot,
                formatter,
                start,
                end,
                value,
                effect,
            } => {
                let formatter = self.formatter(*slot, formatter)?;
                let before = self.format_snapshot(*slot, &formatter)?;
                self.slot_mut(*slot)?.apply_format(
                    &formatter,
                    *start,
                    *end,
                    value.clone(),
                    *effect,
                )?;
                Applied::inverse(Operation::RestoreFormats {
                    slot: *slot,
                    formats: before,
                })
            }
            Operation::RemoveFormat {
                slot,
                formatter,
                start,
                end,
            } => {
                let before = self.slot(*slot)?.formats().ranges_of(formatter);
                self.slot_mut(*slot)?.remove_format(formatter, *start, *end)?;
                Applied::inverse(Operation::RestoreFormats {
                    slot: *slot,
                    formats: vec![before],
                })
            }
            Operation::RestoreFormats { slot, formats } => {
                let current = self.slot(*slot)?.formats();
                let before: Vec<FormatterRanges> = formats
                    .iter()
                    .map(|f| current.ranges_of(&f.formatter))
                    .collect();
                let mut ranges = Vec::with_capacity(formats.len());
                for f in formats {
                    match self.formatter(*slot, &f.formatter) {
                        Ok(formatter) => ranges.push((formatter, f.spans.clone())),
                        // Nothing to clear for a formatter nobody knows.
                        Err(_) if f.spans.is_empty() => {}
                        Err(e) => return Err(e),
                    }
                }
                self.slot_mut(*slot)?.replace_formats(ranges)?;
                Applied::inverse(Operation::RestoreFormats {
                    slot: *slot,
                    formats: before,
                })
            }
            Operation::CreateNode { node, shape } => {
                self.graph.create_at(*node, shape.clone())?;
                Applied::default()
            }
            Operation::Set { node, key, value } => {
                let previous = self.graph.set(*node, key, value.clone())?;
                Applied::inverse(restore_field(*node, key, previous))
            }
            Operation::Remove { node, key } => {
                match self.graph.remove(*node, key)? {
                    Some(previous) => Applied::inverse(Operation::Set {
                        node: *node,
                        key: key.clone(),
                        value: previous,
                    }),
                    None => Applied::default(),
                }
            }
            Operation::Splice {
                node,
                index,
                delete,
                insert,
            } => {
                let removed =
                    self.graph.splice(*node, *index, *delete, insert.clone())?;
                Applied::inverse(Operation::Splice {
                    node: *node,
                    index: *index,
                    delete: insert.len(),
                    insert: removed,
                })
            }
        };
        if let Some(slot) = op.slot() {
            self.graph.notify(Notification::SlotChanged(slot));
        }
        Ok(applied)
    }

    pub(crate) fn slot_mut(&mut self, id: SlotId) -> Result<&mut Slot> {
        self.slots.get_mut(&id).ok_or(DocumentError::UnknownSlot(id))
    }

    /// Resolve a formatter name, preferring the definition already used by
    /// the slot.
    fn formatter(&self, slot: SlotId, name: &str) -> Result<Formatter> {
        self.slot(slot)?
            .formats()
            .formatter(name)
            .or_else(|| self.registry.get(name))
            .cloned()
            .ok_or_else(|| DocumentError::UnknownFormatter(name.to_owned()))
    }

    /// The ranges applying `formatter` may change: its own, plus those of
    /// every block formatter when it is a block formatter itself.
    fn format_snapshot(
        &self,
        slot: SlotId,
        formatter: &Formatter,
    ) -> Result<Vec<FormatterRanges>> {
        let table = self.slot(slot)?.formats();
        let mut names = vec![formatter.name().to_owned()];
        if formatter.kind() == FormatterKind::Block {
            names.extend(
                table
                    .block_formatters()
                    .into_iter()
                    .filter(|n| n != formatter.name()),
            );
        }
        Ok(names.iter().map(|n| table.ranges_of(n)).collect())
    }

    /// Build the slot an insert operation splices in.
    fn pasted_slot(
        &self,
        slot: SlotId,
        content: &[Unit],
        formats: &[RangeRecord],
    ) -> Result<Slot> {
        let units = Slot::from_units(content.to_vec());
        if formats.is_empty() {
            return Ok(units);
        }
        let mut grouped: BTreeMap<&str, Vec<FormatSpan>> = BTreeMap::new();
        for record in formats {
            grouped.entry(record.formatter.as_str()).or_default().push(
                FormatSpan::new(
                    record.start,
                    record.end,
                    record.value.clone(),
                    record.effect,
                ),
            );
        }
        let ranges = grouped
            .into_iter()
            .map(|(name, spans)| Ok((self.formatter(slot, name)?, spans)))
            .collect::<Result<Vec<(Formatter, Vec<FormatSpan>)>>>()?;
        let table = FormatTable::from_ranges(ranges, units.len())?;
        Ok(Slot::from_parts(units.units().to_vec(), table)?)
    }
}

/// The operation putting `key` of `node` back to `previous`.
fn restore_field(
    node: NodeId,
    key: &str,
    previous: Option<Value>,
) -> Operation {
    match previous {
        Some(value) => Operation::Set {
            node,
            key: key.to_owned(),
            value,
        },
        None => Operation::Remove {
            node,
            key: key.to_owned(),
        },
    }
}
