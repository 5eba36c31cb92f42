//! The closed set of supported element types and their topological properties.

use crate::model::{Material, Section};
use crate::types::ModelingSpace;
use serde::{Deserialize, Serialize};

/// An isoparametric element type. The set is closed: every element in a mesh
/// is one of these variants, and every operation in [`crate::isoparametric`]
/// is total over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Line2,
    Line3,
    Plane3,
    Plane4,
    Plane6,
    Plane8,
    Volume4,
    Volume6,
    Volume8,
    Volume10,
    Volume15,
    Volume20,
}

impl ElementType {
    /// Number of nodes of this element type.
    pub const fn node_count(self) -> usize {
        use ElementType::*;
        match self {
            Line2 => 2,
            Line3 => 3,
            Plane3 => 3,
            Plane4 => 4,
            Plane6 => 6,
            Plane8 => 8,
            Volume4 => 4,
            Volume6 => 6,
            Volume8 => 8,
            Volume10 => 10,
            Volume15 => 15,
            Volume20 => 20,
        }
    }

    /// The modeling space (dimensionality) this element type lives in: the
    /// number of natural coordinates its shape functions are defined over,
    /// and hence the number of DOFs it carries per node.
    pub const fn modeling_space(self) -> ModelingSpace {
        use ElementType::*;
        match self {
            Line2 | Line3 => ModelingSpace::OneDimensional,
            Plane3 | Plane4 | Plane6 | Plane8 => ModelingSpace::TwoDimensional,
            Volume4 | Volume6 | Volume8 | Volume10 | Volume15 | Volume20 => {
                ModelingSpace::ThreeDimensional
            }
        }
    }

    /// Number of DOFs of this element type (`node_count * modeling_space.value()`).
    pub const fn dof_count(self) -> usize {
        self.node_count() * self.modeling_space().value()
    }

    /// The element's boundary surfaces as `(surface element type, local node indices)`
    /// tuples, in the exact order and winding used by the reference implementation.
    /// Line elements have no surfaces (a 0D boundary is not modeled).
    pub fn surfaces(self) -> &'static [(ElementType, &'static [usize])] {
        use ElementType::*;
        match self {
            Line2 | Line3 => &[],
            Plane3 => &[
                (Line2, &[0, 1]),
                (Line2, &[1, 2]),
                (Line2, &[2, 0]),
            ],
            Plane4 => &[
                (Line2, &[0, 1]),
                (Line2, &[1, 2]),
                (Line2, &[2, 3]),
                (Line2, &[3, 0]),
            ],
            Plane6 => &[
                (Line3, &[0, 1, 3]),
                (Line3, &[1, 2, 4]),
                (Line3, &[2, 0, 5]),
            ],
            Plane8 => &[
                (Line3, &[0, 1, 4]),
                (Line3, &[1, 2, 5]),
                (Line3, &[2, 3, 6]),
                (Line3, &[3, 0, 7]),
            ],
            Volume4 => &[
                (Plane3, &[0, 2, 1]),
                (Plane3, &[0, 3, 2]),
                (Plane3, &[0, 1, 3]),
                (Plane3, &[1, 2, 3]),
            ],
            Volume6 => &[
                (Plane3, &[0, 2, 1]),
                (Plane3, &[3, 4, 5]),
                (Plane4, &[0, 3, 5, 2]),
                (Plane4, &[0, 1, 4, 3]),
                (Plane4, &[1, 2, 5, 4]),
            ],
            Volume8 => &[
                (Plane4, &[0, 1, 5, 4]),
                (Plane4, &[1, 2, 6, 5]),
                (Plane4, &[2, 3, 7, 6]),
                (Plane4, &[3, 0, 4, 7]),
                (Plane4, &[3, 2, 1, 0]),
                (Plane4, &[4, 5, 6, 7]),
            ],
            Volume10 => &[
                (Plane6, &[0, 2, 1, 6, 5, 4]),
                (Plane6, &[0, 3, 2, 7, 9, 6]),
                (Plane6, &[0, 1, 3, 4, 8, 7]),
                (Plane6, &[1, 2, 3, 5, 9, 8]),
            ],
            Volume15 => &[
                (Plane6, &[0, 2, 1, 8, 7, 6]),
                (Plane6, &[3, 4, 5, 9, 10, 11]),
                (Plane8, &[0, 3, 5, 2, 12, 11, 14, 8]),
                (Plane8, &[0, 1, 4, 3, 6, 13, 9, 12]),
                (Plane8, &[1, 2, 5, 4, 7, 14, 10, 13]),
            ],
            Volume20 => &[
                (Plane8, &[0, 1, 5, 4, 8, 17, 12, 16]),
                (Plane8, &[1, 2, 6, 5, 9, 18, 13, 17]),
                (Plane8, &[2, 3, 7, 6, 10, 19, 14, 18]),
                (Plane8, &[3, 0, 4, 7, 11, 16, 15, 19]),
                (Plane8, &[3, 2, 1, 0, 10, 9, 8, 11]),
                (Plane8, &[4, 5, 6, 7, 12, 13, 14, 15]),
            ],
        }
    }

    /// Maps an Abaqus element-type string onto the closed [`ElementType`] set,
    /// per the mapping carried in `SPEC_FULL.md` §3.2. Returns `None` for
    /// unsupported or unrecognized type strings.
    pub fn from_abaqus(type_str: &str) -> Option<ElementType> {
        use ElementType::*;
        Some(match type_str {
            "CPS3" | "CPE3" | "CAX3" => Plane3,
            "CPS4" | "CPS4R" | "CPE4" | "CPE4R" | "CAX4" | "CAX4R" => Plane4,
            "CPS6" | "CPE6" | "CAX6" => Plane6,
            "CPS8" | "CPS8R" | "CPE8" | "CPE8R" | "CAX8" | "CAX8R" => Plane8,
            "C3D4" => Volume4,
            "C3D6" => Volume6,
            "C3D8" | "C3D8R" => Volume8,
            "C3D10" => Volume10,
            "C3D15" => Volume15,
            "C3D20" | "C3D20R" => Volume20,
            _ => return None,
        })
    }
}

/// A mesh element: an index, its type, and the global node indices of its
/// connectivity (ordered per the element type's natural-coordinate node
/// layout, see [`crate::isoparametric::nodes`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub(crate) index: usize,
    pub element_type: ElementType,
    pub node_indices: Vec<usize>,

    // Populated by `Mdb::assign_element_properties`; `None` beforehand.
    pub(crate) material: Option<Material>,
    pub(crate) section: Option<Section>,

    // Populated by `Mdb::build_dofs`; `None` beforehand.
    pub(crate) active_local_dofs: Option<Vec<usize>>,
    pub(crate) active_global_dofs: Option<Vec<usize>>,
    pub(crate) inactive_local_dofs: Option<Vec<usize>>,
    pub(crate) inactive_global_dofs: Option<Vec<usize>>,
}

impl Element {
    pub fn new(index: usize, element_type: ElementType, node_indices: Vec<usize>) -> Self {
        debug_assert_eq!(node_indices.len(), element_type.node_count());
        Self {
            index,
            element_type,
            node_indices,
            material: None,
            section: None,
            active_local_dofs: None,
            active_global_dofs: None,
            inactive_local_dofs: None,
            inactive_global_dofs: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The boundary surfaces of this element, as `(element type, global node
    /// indices)` pairs.
    pub fn surfaces(&self) -> Vec<(ElementType, Vec<usize>)> {
        self.element_type
            .surfaces()
            .iter()
            .map(|&(ty, local)| {
                let global = local.iter().map(|&i| self.node_indices[i]).collect();
                (ty, global)
            })
            .collect()
    }

    pub fn material(&self) -> &Material {
        self.material
            .as_ref()
            .expect("element properties not assigned yet: call Mdb::assign_element_properties() first")
    }

    pub fn section(&self) -> &Section {
        self.section
            .as_ref()
            .expect("element properties not assigned yet: call Mdb::assign_element_properties() first")
    }

    pub fn active_local_dofs(&self) -> &[usize] {
        self.active_local_dofs
            .as_deref()
            .expect("DOFs not built yet: call Mdb::build_dofs() first")
    }

    pub fn active_global_dofs(&self) -> &[usize] {
        self.active_global_dofs
            .as_deref()
            .expect("DOFs not built yet: call Mdb::build_dofs() first")
    }

    pub fn inactive_local_dofs(&self) -> &[usize] {
        self.inactive_local_dofs
            .as_deref()
            .expect("DOFs not built yet: call Mdb::build_dofs() first")
    }

    pub fn inactive_global_dofs(&self) -> &[usize] {
        self.inactive_global_dofs
            .as_deref()
            .expect("DOFs not built yet: call Mdb::build_dofs() first")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dof_counts() {
        assert_eq!(ElementType::Line2.dof_count(), 2);
        assert_eq!(ElementType::Line3.dof_count(), 3);
        assert_eq!(ElementType::Plane3.dof_count(), 6);
        assert_eq!(ElementType::Plane4.dof_count(), 8);
        assert_eq!(ElementType::Volume4.dof_count(), 12);
        assert_eq!(ElementType::Volume20.dof_count(), 60);
    }

    #[test]
    fn surfaces_are_closed_over_element_nodes() {
        for &et in &[
            ElementType::Plane4,
            ElementType::Plane8,
            ElementType::Volume8,
            ElementType::Volume20,
        ] {
            for &(_, conn) in et.surfaces() {
                for &i in conn {
                    assert!(i < et.node_count());
                }
            }
        }
    }

    #[test]
    fn abaqus_mapping() {
        assert_eq!(ElementType::from_abaqus("C3D8R"), Some(ElementType::Volume8));
        assert_eq!(ElementType::from_abaqus("S4"), None);
    }
}
