//! Index sets over nodes, elements, and element surfaces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A sorted, duplicate-free set of node indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSet {
    pub indices: Vec<usize>,
}

/// A sorted, duplicate-free set of element indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSet {
    pub indices: Vec<usize>,
}

/// A set of `(element index, local surface index)` pairs that together make up
/// a boundary surface, used as the region for surface tractions and pressures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceSet {
    pub pairs: Vec<(usize, usize)>,
}

impl NodeSet {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        let set: BTreeSet<usize> = indices.into_iter().collect();
        Self {
            indices: set.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl ElementSet {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        let set: BTreeSet<usize> = indices.into_iter().collect();
        Self {
            indices: set.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl SurfaceSet {
    pub fn new(pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let set: BTreeSet<(usize, usize)> = pairs.into_iter().collect();
        Self {
            pairs: set.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
