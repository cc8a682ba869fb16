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

use std::fmt;

use serde::{Deserialize, Serialize};
use widestring::U16String;

/// A reference to a host-owned component embedded in a slot.
///
/// The slot never looks inside: all it needs is a stable identity and a
/// length of exactly one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentRef {
    id: u64,
    kind: String,
}

impl ComponentRef {
    pub fn new(id: u64, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// An atomic element of slot content.
///
/// Text is kept as UTF-16 so that offsets match platform text APIs, and may
/// be split at any code unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "UnitRepr", into = "UnitRepr")]
pub enum Unit {
    Text(U16String),
    Component(ComponentRef),
}

impl Unit {
    pub fn text(text: &str) -> Self {
        Self::Text(U16String::from_str(text))
    }

    /// Length in UTF-16 code units; always 1 for a component.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Component(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_component(&self) -> Option<&ComponentRef> {
        match self {
            Self::Component(c) => Some(c),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for Unit {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Unit {
    fn from(text: String) -> Self {
        Self::text(&text)
    }
}

impl From<U16String> for Unit {
    fn from(text: U16String) -> Self {
        Self::Text(text)
    }
}

impl From<ComponentRef> for Unit {
    fn from(component: ComponentRef) -> Self {
        Self::Component(component)
    }
}

/// Wire form of a [`Unit`]. Text that is valid UTF-16 travels as a string;
/// text split inside a surrogate pair travels as raw code units so that it
/// round-trips exactly.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum UnitRepr {
    Text(String),
    Utf16(Vec<u16>),
    Component(ComponentRef),
}

impl From<UnitRepr> for Unit {
    fn from(repr: UnitRepr) -> Self {
        match repr {
            UnitRepr::Text(text) => Unit::text(&text),
            UnitRepr::Utf16(units) => Unit::Text(U16String::from_vec(units)),
            UnitRepr::Component(c) => Unit::Component(c),
        }
    }
}

impl From<Unit> for UnitRepr {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Text(text) => match String::from_utf16(text.as_slice()) {
                Ok(text) => UnitRepr::Text(text),
                Err(_) => UnitRepr::Utf16(text.into_vec()),
            },
            Unit::Component(c) => UnitRepr::Component(c),
        }
    }
}
