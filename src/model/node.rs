//! Mesh nodes.

use serde::{Deserialize, Serialize};

/// A node of the finite element mesh: an index into [`crate::model::Mesh::nodes`]
/// plus its coordinates. `z` is ignored for two-dimensional modeling spaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub(crate) index: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,

    // Populated by `Mdb::build_dofs`; `None` beforehand.
    pub(crate) active_local_dofs: Option<Vec<usize>>,
    pub(crate) active_global_dofs: Option<Vec<usize>>,
    pub(crate) inactive_local_dofs: Option<Vec<usize>>,
    pub(crate) inactive_global_dofs: Option<Vec<usize>>,
}

impl Node {
    pub fn new(index: usize, x: f64, y: f64, z: f64) -> Self {
        Self {
            index,
            x,
            y,
            z,
            active_local_dofs: None,
            active_global_dofs: None,
            inactive_local_dofs: None,
            inactive_global_dofs: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Local (0-based, within this node's own DOF block) indices of the active DOFs.
    pub fn active_local_dofs(&self) -> &[usize] {
        self.active_local_dofs
            .as_deref()
            .expect("DOFs not built yet: call Mdb::build_dofs() first")
    }

    /// Global active-DOF indices for this node.
    pub fn active_global_dofs(&self) -> &[usize] {
        self.active_global_dofs
            .as_deref()
            .expect("DOFs not built yet: call Mdb::build_dofs() first")
    }

    /// Local indices of this node's inactive (prescribed) DOFs.
    pub fn inactive_local_dofs(&self) -> &[usize] {
        self.inactive_local_dofs
            .as_deref()
            .expect("DOFs not built yet: call Mdb::build_dofs() first")
    }

    /// Global inactive-DOF indices for this node.
    pub fn inactive_global_dofs(&self) -> &[usize] {
        self.inactive_global_dofs
            .as_deref()
            .expect("DOFs not built yet: call Mdb::build_dofs() first")
    }
}
