//! A boundary surface of a parent element: the lower-dimensional shape used
//! to apply surface tractions/pressures and to integrate them into the
//! parent element's DOF layout.

use super::{Element, ElementType, Section};
use crate::types::ModelingSpace;

/// One boundary surface of a parent [`Element`]. Carries its own element
/// type and node ordering, but delegates its section/material to the parent
/// -- a surface has no material of its own, and its load integration must
/// scatter into the parent's DOF layout.
#[derive(Debug, Clone)]
pub struct Surface {
    pub surface_type: ElementType,
    /// Node indices local to the parent element's connectivity.
    pub local_node_indices: Vec<usize>,
    /// Node indices global to the mesh.
    pub global_node_indices: Vec<usize>,
    pub parent_dof_count: usize,
    pub parent_modeling_space: ModelingSpace,
    pub parent_section: Section,
}

impl Surface {
    pub fn new(
        parent: &Element,
        surface_index: usize,
    ) -> Self {
        let (surface_type, global_node_indices) = parent.surfaces()[surface_index].clone();
        let local_node_indices = parent.element_type.surfaces()[surface_index]
            .1
            .to_vec();
        Self {
            surface_type,
            local_node_indices,
            global_node_indices,
            parent_dof_count: parent.element_type.dof_count(),
            parent_modeling_space: parent.element_type.modeling_space(),
            parent_section: parent.section().clone(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.surface_type.node_count()
    }

    /// The surface's own (lower) modeling space -- distinct from
    /// [`Surface::parent_modeling_space`].
    pub fn modeling_space(&self) -> ModelingSpace {
        self.surface_type.modeling_space()
    }
}
