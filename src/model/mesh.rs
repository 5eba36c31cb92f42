//! The finite element mesh: a dense arena of nodes and elements.

use crate::types::{ModelingSpace, RealMatrix};

use super::{Element, ElementType, Node};

/// A finite element mesh. Nodes and elements live in dense arrays; elements
/// reference nodes by index, never by pointer or name, so the mesh can be
/// built, assembled, and post-processed without any interior mutability.
#[derive(Debug, Clone)]
pub struct Mesh {
    nodes: Vec<Node>,
    elements: Vec<Element>,
    node_to_elements: Vec<Vec<usize>>,
    modeling_space: ModelingSpace,

    // Populated by `Mdb::build_dofs`; `None` beforehand.
    pub(crate) active_dof_count: Option<usize>,
    pub(crate) inactive_dof_count: Option<usize>,
}

impl Mesh {
    /// Builds a mesh from raw node coordinates and element connectivity.
    /// `modeling_space` must agree with every element type's own modeling
    /// space (mixing 2D and 3D element types in one mesh is not supported).
    pub fn new(
        coords: Vec<[f64; 3]>,
        connectivity: Vec<(ElementType, Vec<usize>)>,
        modeling_space: ModelingSpace,
    ) -> Self {
        let nodes = coords
            .into_iter()
            .enumerate()
            .map(|(i, [x, y, z])| Node::new(i, x, y, z))
            .collect::<Vec<_>>();
        let elements = connectivity
            .into_iter()
            .enumerate()
            .map(|(i, (ty, conn))| Element::new(i, ty, conn))
            .collect::<Vec<_>>();

        let mut node_to_elements = vec![Vec::new(); nodes.len()];
        for element in &elements {
            for &n in &element.node_indices {
                node_to_elements[n].push(element.index());
            }
        }

        Self {
            nodes,
            elements,
            node_to_elements,
            modeling_space,
            active_dof_count: None,
            inactive_dof_count: None,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn modeling_space(&self) -> ModelingSpace {
        self.modeling_space
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    /// Element indices incident on the given node.
    pub fn node_to_elements(&self, node_index: usize) -> &[usize] {
        &self.node_to_elements[node_index]
    }

    /// Active-DOF count (size of the condensed linear system), after
    /// `Mdb::build_dofs` has run.
    pub fn active_dof_count(&self) -> usize {
        self.active_dof_count
            .expect("DOFs not built yet: call Mdb::build_dofs() first")
    }

    /// Inactive-DOF count (number of prescribed DOFs), after
    /// `Mdb::build_dofs` has run.
    pub fn inactive_dof_count(&self) -> usize {
        self.inactive_dof_count
            .expect("DOFs not built yet: call Mdb::build_dofs() first")
    }

    /// Gathers the full `x, y, z` coordinate matrix for the given global node
    /// indices, in order. Used to build the per-element or per-surface
    /// coordinate matrix `X` consumed by [`crate::isoparametric::evaluate_element`]
    /// and [`crate::isoparametric::evaluate_surface`], which slice out however
    /// many columns their natural-coordinate dimension needs.
    pub fn coordinate_matrix(&self, node_indices: &[usize]) -> RealMatrix {
        let mut x = RealMatrix::zeros(node_indices.len(), 3);
        for (row, &n) in node_indices.iter().enumerate() {
            let c = self.nodes[n].coords();
            for col in 0..3 {
                x[(row, col)] = c[col];
            }
        }
        x
    }
}
