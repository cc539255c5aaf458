//! Data-level classification stamped on registered and captured assets.

use std::collections::{BTreeMap, BTreeSet};

/// Custom-metadata key carrying the classification.
pub const DATA_LEVEL_KEY: &str = "data level";

/// How far an asset is from the acquisition system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataLevel {
    Raw,
    Derived,
}

impl DataLevel {
    pub fn tag(self) -> &'static str {
        match self {
            DataLevel::Raw => "raw",
            DataLevel::Derived => "derived",
        }
    }
}

/// Stamp `level` onto a tag set and custom-metadata map.
///
/// Classification tags are mutually exclusive: deriving an asset drops the
/// `raw` tag inherited from its input. Applying the same level twice
/// leaves both collections unchanged.
pub fn apply(
    level: DataLevel,
    tags: &mut BTreeSet<String>,
    custom_metadata: &mut BTreeMap<String, String>,
) {
    tags.insert(level.tag().to_string());
    if level == DataLevel::Derived {
        tags.remove(DataLevel::Raw.tag());
    }
    custom_metadata.insert(DATA_LEVEL_KEY.to_string(), level.tag().to_string());
}
