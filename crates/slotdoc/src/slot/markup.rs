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

//! Rendering a slot to markup.
//!
//! The block format (if any) becomes the wrapper element, outer formats
//! become its `style` attribute, and inline formats nest inside it ordered
//! by priority. Ranges that do not render (`invalid` and `exclude`) leave
//! no trace in the output.

use super::{ActiveFormat, FormatSegment, Slot, Unit};
use crate::{FormatValue, FormatterKind, Markup};

/// An inline element currently open in the output.
#[derive(Debug, PartialEq)]
struct OpenTag {
    formatter: String,
    value: FormatValue,
    tag: String,
}

impl Slot {
    /// Render the slot as markup.
    pub fn to_markup(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let segments = match self.query_formats_in(0, self.len) {
            Ok(segments) => segments,
            Err(_) => return String::new(),
        };
        let whole = segments.first().map(|s| s.formats.as_slice()).unwrap_or(&[]);

        let wrapper = block_tag(whole);
        let style = outer_style(whole);
        let wrapper = match (wrapper, style.is_empty()) {
            (Some(tag), _) => Some(tag),
            (None, false) => Some("div".to_owned()),
            (None, true) => None,
        };

        let mut html = String::new();
        if let Some(tag) = &wrapper {
            html.push('<');
            html.push_str(tag);
            if !style.is_empty() {
                html.push_str(&format!(
                    " style=\"{}\"",
                    html_escape::encode_double_quoted_attribute(&style)
                ));
            }
            html.push('>');
        }

        let mut open: Vec<OpenTag> = Vec::new();
        for segment in &segments {
            self.emit_segment(&mut html, &mut open, segment);
        }
        close_from(&mut html, &mut open, 0);

        if let Some(tag) = &wrapper {
            html.push_str(&format!("</{tag}>"));
        }
        html
    }

    fn emit_segment(
        &self,
        html: &mut String,
        open: &mut Vec<OpenTag>,
        segment: &FormatSegment,
    ) {
        let desired: Vec<(OpenTag, Option<String>)> = segment
            .formats
            .iter()
            .filter(|f| {
                f.formatter.kind() == FormatterKind::Inline && f.effect.renders()
            })
            .filter_map(inline_tag)
            .collect();

        // Keep the longest prefix of open tags that is still wanted.
        let keep = open
            .iter()
            .zip(desired.iter())
            .take_while(|(open, wanted)| **open == wanted.0)
            .count();
        close_from(html, open, keep);

        for (tag, attribute) in desired.into_iter().skip(keep) {
            html.push('<');
            html.push_str(&tag.tag);
            if let Some(attribute) = attribute {
                html.push_str(&attribute);
            }
            html.push('>');
            open.push(tag);
        }

        if let Ok(units) = self.slice_units(segment.start, segment.end) {
            for unit in &units {
                match unit {
                    Unit::Text(text) => html.push_str(&html_escape::encode_text(
                        &String::from_utf16_lossy(text.as_slice()),
                    )),
                    Unit::Component(c) => html.push_str(&format!(
                        "<span data-component=\"{}\" data-id=\"{}\"></span>",
                        html_escape::encode_double_quoted_attribute(c.kind()),
                        c.id()
                    )),
                }
            }
        }
    }
}

fn close_from(html: &mut String, open: &mut Vec<OpenTag>, keep: usize) {
    while open.len() > keep {
        if let Some(tag) = open.pop() {
            html.push_str(&format!("</{}>", tag.tag));
        }
    }
}

fn attribute_value(value: &FormatValue) -> String {
    match value {
        FormatValue::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

fn inline_tag(active: &ActiveFormat) -> Option<(OpenTag, Option<String>)> {
    let (tag, attribute) = match active.formatter.markup() {
        Markup::Tag(tag) => (tag.clone(), None),
        Markup::TagWithAttribute { tag, attribute } => (
            tag.clone(),
            Some(format!(
                " {attribute}=\"{}\"",
                html_escape::encode_double_quoted_attribute(&attribute_value(
                    &active.value
                ))
            )),
        ),
        Markup::None | Markup::Style(_) => return None,
    };
    Some((
        OpenTag {
            formatter: active.formatter.name().to_owned(),
            value: active.value.clone(),
            tag,
        },
        attribute,
    ))
}

fn block_tag(formats: &[ActiveFormat]) -> Option<String> {
    formats
        .iter()
        .filter(|f| {
            f.formatter.kind() == FormatterKind::Block && f.effect.renders()
        })
        .find_map(|f| match f.formatter.markup() {
            Markup::Tag(tag) | Markup::TagWithAttribute { tag, .. } => {
                Some(tag.clone())
            }
            Markup::None | Markup::Style(_) => None,
        })
}

fn outer_style(formats: &[ActiveFormat]) -> String {
    formats
        .iter()
        .filter(|f| {
            f.formatter.kind() == FormatterKind::Outer && f.effect.renders()
        })
        .filter_map(|f| match f.formatter.markup() {
            Markup::Style(property) => {
                Some(format!("{property}: {}", attribute_value(&f.value)))
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("; ")
}
