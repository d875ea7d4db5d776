//! Identifiers for charts and dataset configurations

use serde::{Deserialize, Serialize};

/// Chart identifier assigned by the canonical store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(pub u64);

impl From<u64> for ChartId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ChartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dataset configuration identifier assigned by the canonical store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetConfigId(pub u64);

impl From<u64> for DatasetConfigId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for DatasetConfigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
