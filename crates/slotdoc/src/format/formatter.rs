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

//! Formatter descriptions and the registry that resolves them by name.
//!
//! | Formatter       | Kind   | Priority | Inheritable | Markup                 |
//! |-----------------|--------|----------|-------------|------------------------|
//! | `link`          | Inline | 100      | no          | `<a href="…">`         |
//! | `bold`          | Inline | 50       | yes         | `<strong>` (`<b>`)     |
//! | `italic`        | Inline | 40       | yes         | `<em>` (`<i>`)         |
//! | `underline`     | Inline | 30       | yes         | `<u>`                  |
//! | `strikethrough` | Inline | 20       | yes         | `<del>` (`<s>`)        |
//! | `inline_code`   | Inline | 10       | yes         | `<code>`               |
//! | `highlight`     | Inline | 0        | no          | `<mark>`               |
//! | `paragraph`     | Block  | 0        | yes         | `<p>`                  |
//! | `quote`         | Block  | 0        | yes         | `<blockquote>`         |
//! | `code_block`    | Block  | 0        | yes         | `<pre>`                |
//! | `text_align`    | Outer  | 0        | yes         | `text-align` style     |

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The closed set of formatter behaviours the format table knows about.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FormatterKind {
    /// Covers arbitrary sub-ranges; several inline formatters stack.
    Inline,
    /// Covers the whole slot. Block formatters exclude each other.
    Block,
    /// Covers the whole slot and stacks with other outer formatters.
    Outer,
}

impl FormatterKind {
    pub fn spans_whole_slot(self) -> bool {
        !matches!(self, Self::Inline)
    }

    /// Block first, then outer, then inline.
    pub(crate) fn render_rank(self) -> u8 {
        match self {
            Self::Block => 0,
            Self::Outer => 1,
            Self::Inline => 2,
        }
    }
}

/// How a formatter is written to (and recognised in) markup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Markup {
    /// Never rendered.
    None,
    /// A plain element, e.g. `<strong>`.
    Tag(String),
    /// An element carrying the range value in an attribute, e.g.
    /// `<a href="…">`.
    TagWithAttribute { tag: String, attribute: String },
    /// A CSS property set to the range value.
    Style(String),
}

/// A formatter: its name, kind and the capabilities the format table and
/// renderers rely on.
///
/// Formatters are compared by value, but within a registry and a format
/// table the name is the identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Formatter {
    name: String,
    kind: FormatterKind,
    priority: i32,
    inheritable: bool,
    markup: Markup,
    reads: Vec<String>,
}

impl Formatter {
    pub fn new(name: impl Into<String>, kind: FormatterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            priority: 0,
            inheritable: true,
            markup: Markup::None,
            reads: Vec::new(),
        }
    }

    pub fn inline(name: impl Into<String>) -> Self {
        Self::new(name, FormatterKind::Inline)
    }

    pub fn block(name: impl Into<String>) -> Self {
        Self::new(name, FormatterKind::Block)
    }

    pub fn outer(name: impl Into<String>) -> Self {
        Self::new(name, FormatterKind::Outer)
    }

    /// Higher priority renders further out.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether text typed strictly inside one of this formatter's ranges
    /// extends the range.
    pub fn with_inheritable(mut self, inheritable: bool) -> Self {
        self.inheritable = inheritable;
        self
    }

    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }

    /// Additional markup tags recognised as this formatter.
    pub fn reading(mut self, tags: &[&str]) -> Self {
        self.reads.extend(tags.iter().map(|t| t.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FormatterKind {
        self.kind
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_inheritable(&self) -> bool {
        self.inheritable
    }

    pub fn markup(&self) -> &Markup {
        &self.markup
    }

    /// Whether a markup element named `tag` reads back as this formatter.
    pub fn matches_tag(&self, tag: &str) -> bool {
        let own = match &self.markup {
            Markup::Tag(t) | Markup::TagWithAttribute { tag: t, .. } => {
                t.eq_ignore_ascii_case(tag)
            }
            Markup::None | Markup::Style(_) => false,
        };
        own || self.reads.iter().any(|r| r.eq_ignore_ascii_case(tag))
    }
}

/// The formatters shipped with the crate.
pub mod builtin {
    use super::{Formatter, Markup};

    fn tag(name: &str) -> Markup {
        Markup::Tag(name.to_owned())
    }

    pub fn link() -> Formatter {
        Formatter::inline("link")
            .with_priority(100)
            .with_inheritable(false)
            .with_markup(Markup::TagWithAttribute {
                tag: "a".to_owned(),
                attribute: "href".to_owned(),
            })
    }

    pub fn bold() -> Formatter {
        Formatter::inline("bold")
            .with_priority(50)
            .with_markup(tag("strong"))
            .reading(&["b"])
    }

    pub fn italic() -> Formatter {
        Formatter::inline("italic")
            .with_priority(40)
            .with_markup(tag("em"))
            .reading(&["i"])
    }

    pub fn underline() -> Formatter {
        Formatter::inline("underline")
            .with_priority(30)
            .with_markup(tag("u"))
    }

    pub fn strikethrough() -> Formatter {
        Formatter::inline("strikethrough")
            .with_priority(20)
            .with_markup(tag("del"))
            .reading(&["s", "strike"])
    }

    pub fn inline_code() -> Formatter {
        Formatter::inline("inline_code")
            .with_priority(10)
            .with_markup(tag("code"))
    }

    pub fn highlight() -> Formatter {
        Formatter::inline("highlight")
            .with_inheritable(false)
            .with_markup(tag("mark"))
    }

    pub fn paragraph() -> Formatter {
        Formatter::block("paragraph").with_markup(tag("p"))
    }

    pub fn quote() -> Formatter {
        Formatter::block("quote").with_markup(tag("blockquote"))
    }

    pub fn code_block() -> Formatter {
        Formatter::block("code_block").with_markup(tag("pre"))
    }

    pub fn text_align() -> Formatter {
        Formatter::outer("text_align")
            .with_markup(Markup::Style("text-align".to_owned()))
    }

    pub fn all() -> Vec<Formatter> {
        vec![
            link(),
            bold(),
            italic(),
            underline(),
            strikethrough(),
            inline_code(),
            highlight(),
            paragraph(),
            quote(),
            code_block(),
            text_align(),
        ]
    }
}

static BUILTINS: Lazy<FormatterRegistry> = Lazy::new(|| {
    let mut registry = FormatterRegistry::new();
    for formatter in builtin::all() {
        registry.register(formatter);
    }
    registry
});

/// Resolves formatter names, as carried by operations, to formatters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatterRegistry {
    by_name: BTreeMap<String, Formatter>,
}

impl FormatterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every [`builtin`] formatter.
    pub fn with_builtins() -> Self {
        BUILTINS.clone()
    }

    /// Register a formatter, returning the one it replaced, if any.
    pub fn register(&mut self, formatter: Formatter) -> Option<Formatter> {
        self.by_name.insert(formatter.name.clone(), formatter)
    }

    pub fn get(&self, name: &str) -> Option<&Formatter> {
        self.by_name.get(name)
    }

    /// The formatter a markup element named `tag` reads back as.
    pub fn for_tag(&self, tag: &str) -> Option<&Formatter> {
        self.by_name.values().find(|f| f.matches_tag(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Formatter> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
