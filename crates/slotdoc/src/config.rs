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

use serde::Deserialize;

/// Tunables for a [`Document`](crate::Document).
///
/// Every field has a default, so a host can deserialize a partial JSON
/// object such as `{"history_limit": 100}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo entries kept. The oldest entry is dropped once
    /// the limit is reached. Zero means unbounded.
    pub history_limit: usize,

    /// Capacity of the change notification queue drained after each
    /// command. On overflow the oldest notification is dropped and the
    /// drained batch is flagged as overflowed.
    pub notification_capacity: usize,

    /// Number of remote operations buffered before `receive_remote` forces
    /// a flush.
    pub inbox_capacity: usize,
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 500,
            notification_capacity: 1024,
            inbox_capacity: 1024,
        }
    }
}
