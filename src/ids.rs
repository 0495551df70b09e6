// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Identifiers for units, channels and categorical property values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unit id, a channel id or a categorical property value. Acquisition
/// systems and sorters use either integers or strings for these, so both are
/// supported.
///
/// When serialised as the key of a map (e.g. in JSON), an integer id becomes a
/// string; deserialising it again yields [`Id::Str`]. Code that reads ids back
/// from a map should therefore also try [`Id::stringified`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Int(i64),
    Str(String),
}

impl Id {
    /// The string form of this id, as it would appear as a map key in a
    /// serialised dictionary.
    pub fn stringified(&self) -> Id {
        match self {
            Id::Int(i) => Id::Str(i.to_string()),
            Id::Str(s) => Id::Str(s.clone()),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(i) => write!(f, "{i}"),
            Id::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Id {
    fn from(i: i64) -> Self {
        Id::Int(i)
    }
}

impl From<i32> for Id {
    fn from(i: i32) -> Self {
        Id::Int(i64::from(i))
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::Str(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::Str(s)
    }
}
