//! The model database: the mesh plus every named region, material, section,
//! load, and boundary condition that together define an analysis.

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::{
    Acceleration, BodyLoad, BoundaryCondition, ConcentratedLoad, ElementSet, Material, Mesh,
    NodeSet, Pressure, Section, SurfaceSet, SurfaceTraction,
};

/// Nodes used to define a surface set: either an existing node-set name, or a
/// raw collection of node indices.
pub enum SurfaceNodes {
    NodeSetName(String),
    Indices(Vec<usize>),
}

impl From<&str> for SurfaceNodes {
    fn from(name: &str) -> Self {
        SurfaceNodes::NodeSetName(name.to_string())
    }
}

impl From<String> for SurfaceNodes {
    fn from(name: String) -> Self {
        SurfaceNodes::NodeSetName(name)
    }
}

impl From<Vec<usize>> for SurfaceNodes {
    fn from(indices: Vec<usize>) -> Self {
        SurfaceNodes::Indices(indices)
    }
}

/// The model database (mirrors an Abaqus-style `.inp` model): a mesh plus
/// every named set, material, section, load, and boundary condition.
#[derive(Debug, Clone)]
pub struct Mdb {
    mesh: Mesh,
    node_sets: HashMap<String, NodeSet>,
    element_sets: HashMap<String, ElementSet>,
    surface_sets: HashMap<String, SurfaceSet>,
    materials: HashMap<String, Material>,
    sections: HashMap<String, Section>,
    concentrated_loads: HashMap<String, ConcentratedLoad>,
    surface_tractions: HashMap<String, SurfaceTraction>,
    pressures: HashMap<String, Pressure>,
    body_loads: HashMap<String, BodyLoad>,
    accelerations: HashMap<String, Acceleration>,
    boundary_conditions: HashMap<String, BoundaryCondition>,
}

impl Mdb {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            node_sets: HashMap::new(),
            element_sets: HashMap::new(),
            surface_sets: HashMap::new(),
            materials: HashMap::new(),
            sections: HashMap::new(),
            concentrated_loads: HashMap::new(),
            surface_tractions: HashMap::new(),
            pressures: HashMap::new(),
            body_loads: HashMap::new(),
            accelerations: HashMap::new(),
            boundary_conditions: HashMap::new(),
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn node_sets(&self) -> &HashMap<String, NodeSet> {
        &self.node_sets
    }

    pub fn element_sets(&self) -> &HashMap<String, ElementSet> {
        &self.element_sets
    }

    pub fn surface_sets(&self) -> &HashMap<String, SurfaceSet> {
        &self.surface_sets
    }

    pub fn materials(&self) -> &HashMap<String, Material> {
        &self.materials
    }

    pub fn sections(&self) -> &HashMap<String, Section> {
        &self.sections
    }

    pub fn concentrated_loads(&self) -> &HashMap<String, ConcentratedLoad> {
        &self.concentrated_loads
    }

    pub fn surface_tractions(&self) -> &HashMap<String, SurfaceTraction> {
        &self.surface_tractions
    }

    pub fn pressures(&self) -> &HashMap<String, Pressure> {
        &self.pressures
    }

    pub fn body_loads(&self) -> &HashMap<String, BodyLoad> {
        &self.body_loads
    }

    pub fn accelerations(&self) -> &HashMap<String, Acceleration> {
        &self.accelerations
    }

    pub fn boundary_conditions(&self) -> &HashMap<String, BoundaryCondition> {
        &self.boundary_conditions
    }

    fn check_unused(&self, name: &str) -> Result<()> {
        let used = self.node_sets.contains_key(name)
            || self.element_sets.contains_key(name)
            || self.surface_sets.contains_key(name)
            || self.materials.contains_key(name)
            || self.sections.contains_key(name)
            || self.concentrated_loads.contains_key(name)
            || self.surface_tractions.contains_key(name)
            || self.pressures.contains_key(name)
            || self.body_loads.contains_key(name)
            || self.accelerations.contains_key(name)
            || self.boundary_conditions.contains_key(name);
        if used {
            return Err(Error::InvalidInput(format!(
                "the name '{name}' is already in use"
            )));
        }
        Ok(())
    }

    pub fn node_set(&mut self, name: &str, indices: impl IntoIterator<Item = usize>) -> Result<()> {
        self.check_unused(name)?;
        self.node_sets.insert(name.to_string(), NodeSet::new(indices));
        Ok(())
    }

    pub fn element_set(
        &mut self,
        name: &str,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<()> {
        self.check_unused(name)?;
        self.element_sets
            .insert(name.to_string(), ElementSet::new(indices));
        Ok(())
    }

    /// Builds a surface set: every `(element index, local surface index)` pair
    /// whose surface connectivity is entirely contained in the given nodes.
    pub fn surface_set(&mut self, name: &str, surface_nodes: impl Into<SurfaceNodes>) -> Result<()> {
        self.check_unused(name)?;
        let node_indices: Vec<usize> = match surface_nodes.into() {
            SurfaceNodes::NodeSetName(set_name) => self
                .node_sets
                .get(&set_name)
                .ok_or_else(|| Error::InvalidInput(format!("unknown node set '{set_name}'")))?
                .indices
                .clone(),
            SurfaceNodes::Indices(indices) => indices,
        };
        let node_index_set: std::collections::HashSet<usize> = node_indices.iter().copied().collect();

        let mut candidate_elements = std::collections::BTreeSet::new();
        for &n in &node_indices {
            for &e in self.mesh.node_to_elements(n) {
                candidate_elements.insert(e);
            }
        }

        let mut pairs = Vec::new();
        for element_index in candidate_elements {
            let element = &self.mesh.elements()[element_index];
            for (surface_index, (_, global_connectivity)) in element.surfaces().into_iter().enumerate()
            {
                if global_connectivity
                    .iter()
                    .all(|n| node_index_set.contains(n))
                {
                    pairs.push((element_index, surface_index));
                }
            }
        }

        self.surface_sets.insert(name.to_string(), SurfaceSet::new(pairs));
        Ok(())
    }

    pub fn material(&mut self, name: &str, young: f64, poisson: f64, density: f64) -> Result<()> {
        self.check_unused(name)?;
        self.materials
            .insert(name.to_string(), Material::new(young, poisson, density));
        Ok(())
    }

    pub fn section(&mut self, name: &str, section: Section) -> Result<()> {
        self.check_unused(name)?;
        self.sections.insert(name.to_string(), section);
        Ok(())
    }

    pub fn concentrated_load(&mut self, name: &str, load: ConcentratedLoad) -> Result<()> {
        self.check_unused(name)?;
        self.concentrated_loads.insert(name.to_string(), load);
        Ok(())
    }

    pub fn surface_traction(&mut self, name: &str, traction: SurfaceTraction) -> Result<()> {
        self.check_unused(name)?;
        self.surface_tractions.insert(name.to_string(), traction);
        Ok(())
    }

    pub fn pressure(&mut self, name: &str, pressure: Pressure) -> Result<()> {
        self.check_unused(name)?;
        self.pressures.insert(name.to_string(), pressure);
        Ok(())
    }

    pub fn body_load(&mut self, name: &str, load: BodyLoad) -> Result<()> {
        self.check_unused(name)?;
        self.body_loads.insert(name.to_string(), load);
        Ok(())
    }

    pub fn acceleration(&mut self, name: &str, acceleration: Acceleration) -> Result<()> {
        self.check_unused(name)?;
        self.accelerations.insert(name.to_string(), acceleration);
        Ok(())
    }

    pub fn boundary_condition(&mut self, name: &str, bc: BoundaryCondition) -> Result<()> {
        self.check_unused(name)?;
        self.boundary_conditions.insert(name.to_string(), bc);
        Ok(())
    }

    fn node_region(&self, name: &str) -> Result<&[usize]> {
        self.node_sets
            .get(name)
            .map(|s| s.indices.as_slice())
            .ok_or_else(|| Error::InvalidInput(format!("unknown node set '{name}'")))
    }

    fn element_region(&self, name: &str) -> Result<&[usize]> {
        self.element_sets
            .get(name)
            .map(|s| s.indices.as_slice())
            .ok_or_else(|| Error::InvalidInput(format!("unknown element set '{name}'")))
    }

    /// Partitions every DOF of the model into the active set (to be solved
    /// for) and the inactive set (prescribed by a boundary condition), and
    /// records each node's and element's local/global DOF tables.
    ///
    /// DOFs are numbered node-major, DOF-minor, within each partition
    /// independently: walking nodes `0..m` and, for each, DOFs `0..n`, every
    /// unconstrained DOF is assigned the next active index and every
    /// constrained DOF the next inactive index.
    pub fn build_dofs(&mut self) -> Result<()> {
        let n = self.mesh.modeling_space().value();
        let m = self.mesh.node_count();

        let mut table_active = vec![vec![true; n]; m];
        for bc in self.boundary_conditions.values() {
            let dofs = bc.dofs();
            let nodes = self.node_region(&bc.region)?;
            for &node in nodes {
                for &dof in &dofs {
                    if dof < n {
                        table_active[node][dof] = false;
                    }
                }
            }
        }

        let mut global_active = vec![vec![None; n]; m];
        let mut global_inactive = vec![vec![None; n]; m];
        let mut active_count = 0usize;
        let mut inactive_count = 0usize;
        for node in 0..m {
            for dof in 0..n {
                if table_active[node][dof] {
                    global_active[node][dof] = Some(active_count);
                    active_count += 1;
                } else {
                    global_inactive[node][dof] = Some(inactive_count);
                    inactive_count += 1;
                }
            }
        }

        for element in self.mesh.elements_mut() {
            let mut active_local = Vec::new();
            let mut active_global = Vec::new();
            let mut inactive_local = Vec::new();
            let mut inactive_global = Vec::new();
            for (i, &global_node) in element.node_indices.clone().iter().enumerate() {
                for dof in 0..n {
                    let local_dof = i * n + dof;
                    if table_active[global_node][dof] {
                        active_local.push(local_dof);
                        active_global.push(global_active[global_node][dof].unwrap());
                    } else {
                        inactive_local.push(local_dof);
                        inactive_global.push(global_inactive[global_node][dof].unwrap());
                    }
                }
            }
            element.active_local_dofs = Some(active_local);
            element.active_global_dofs = Some(active_global);
            element.inactive_local_dofs = Some(inactive_local);
            element.inactive_global_dofs = Some(inactive_global);
        }

        for node in self.mesh.nodes_mut() {
            let index = node.index();
            let mut active_local = Vec::new();
            let mut active_global = Vec::new();
            let mut inactive_local = Vec::new();
            let mut inactive_global = Vec::new();
            for dof in 0..n {
                let local_dof = dof;
                if table_active[index][dof] {
                    active_local.push(local_dof);
                    active_global.push(global_active[index][dof].unwrap());
                } else {
                    inactive_local.push(local_dof);
                    inactive_global.push(global_inactive[index][dof].unwrap());
                }
            }
            node.active_local_dofs = Some(active_local);
            node.active_global_dofs = Some(active_global);
            node.inactive_local_dofs = Some(inactive_local);
            node.inactive_global_dofs = Some(inactive_global);
        }

        self.mesh.active_dof_count = Some(active_count);
        self.mesh.inactive_dof_count = Some(inactive_count);
        Ok(())
    }

    /// Assigns each element its material and section, as defined by the
    /// section-to-element-set mapping.
    pub fn assign_element_properties(&mut self) -> Result<()> {
        for section in self.sections.values() {
            let material = self
                .materials
                .get(&section.material)
                .ok_or_else(|| {
                    Error::InvalidModel(format!("unknown material '{}'", section.material))
                })?
                .clone();
            let element_indices = self.element_region(&section.region)?.to_vec();
            for index in element_indices {
                let element = &mut self.mesh.elements_mut()[index];
                element.material = Some(material);
                element.section = Some(section.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementType, SectionType};
    use crate::types::ModelingSpace;

    fn single_plane4() -> Mdb {
        let mesh = Mesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![(ElementType::Plane4, vec![0, 1, 2, 3])],
            ModelingSpace::TwoDimensional,
        );
        Mdb::new(mesh)
    }

    #[test]
    fn build_dofs_partitions_every_dof() {
        let mut mdb = single_plane4();
        mdb.node_set("left", [0, 3]).unwrap();
        mdb.boundary_condition(
            "fix",
            BoundaryCondition::new("left", Some(0.0), Some(0.0), None),
        )
        .unwrap();
        mdb.build_dofs().unwrap();

        assert_eq!(mdb.mesh().active_dof_count() + mdb.mesh().inactive_dof_count(), 8);
        assert_eq!(mdb.mesh().inactive_dof_count(), 4);

        let node0 = &mdb.mesh().nodes()[0];
        assert_eq!(node0.inactive_local_dofs().len(), 2);
        assert_eq!(node0.active_local_dofs().len(), 0);

        let node1 = &mdb.mesh().nodes()[1];
        assert_eq!(node1.active_local_dofs().len(), 2);
    }

    #[test]
    fn assign_element_properties_links_material() {
        let mut mdb = single_plane4();
        mdb.element_set("all", [0]).unwrap();
        mdb.material("steel", 200e9, 0.3, 7850.0).unwrap();
        mdb.section(
            "sec",
            Section::new("all", "steel", SectionType::PlaneStress, 1.0, false),
        )
        .unwrap();
        mdb.assign_element_properties().unwrap();

        let element = &mdb.mesh().elements()[0];
        assert_eq!(element.material().young, 200e9);
        assert_eq!(element.section().section_type, SectionType::PlaneStress);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut mdb = single_plane4();
        mdb.node_set("a", [0]).unwrap();
        assert!(mdb.node_set("a", [1]).is_err());
    }
}
