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
use strum_macros::{AsRefStr, Display, EnumString};

/// The value a format range carries: `true` for plain toggles such as bold,
/// a string for links or alignment, an integer for levels.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl FormatValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FormatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<bool> for FormatValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for FormatValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for FormatValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for FormatValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FormatValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// How a format range combines with the formats around it.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
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
pub enum Effect {
    /// Contributes to rendering.
    #[default]
    Valid,
    /// Explicitly excluded from a format inherited from an ancestor.
    Invalid,
    /// No trace of the format in this span, not even in exported markup.
    /// Used for transient markers such as search highlights.
    Exclude,
}

impl Effect {
    /// Whether ranges with this effect show up in rendered output.
    pub fn renders(self) -> bool {
        matches!(self, Self::Valid)
    }
}
