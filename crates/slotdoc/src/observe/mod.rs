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

//! Reactive change tracking over an arena of host data.
//!
//! Host objects are observed into an [`ObservedGraph`], where each node
//! tracks its parent edges, a dirty flag and its detached state.
//! Notifications are queued and drained by the host.

mod graph;
mod marker;
mod notify;
mod value;

pub use graph::ObservedGraph;
pub use marker::{ChangeMarker, DetachCallback, DetachOutcome, Parent};
pub use notify::{Notification, Notifications};
pub use value::{NodeId, Raw, RawNode, Shape, Value};
