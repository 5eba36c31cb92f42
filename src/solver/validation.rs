//! Model database checks: catches undefined regions, empty sets, invalid
//! material/section properties, and load/boundary-condition patterns that
//! silently do nothing, before a run wastes time assembling a broken model.

use crate::model::Mdb;
use crate::types::ModelingSpace;

/// The three analysis kinds a model database can be checked against; a
/// frequency analysis carries extra checks the other two don't need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Static,
    Frequency,
    Buckling,
}

fn check_mesh(mdb: &Mdb, errors: &mut Vec<String>, _warnings: &mut Vec<String>) {
    let mut counts = vec![0usize; mdb.mesh().element_count()];
    for section in mdb.sections().values() {
        if let Some(set) = mdb.element_sets().get(&section.region) {
            for &element_index in &set.indices {
                if element_index < counts.len() {
                    counts[element_index] += 1;
                }
            }
        }
    }
    if counts.iter().any(|&c| c != 1) {
        errors.push("elements with undefined or over-defined section assignments detected".into());
    }
}

fn check_node_sets(mdb: &Mdb, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let node_count = mdb.mesh().node_count();
    for (name, set) in mdb.node_sets() {
        if set.indices.is_empty() {
            warnings.push(format!("node set '{name}' is empty"));
        } else if set.indices.iter().any(|&i| i >= node_count) {
            errors.push(format!("node set '{name}' contains invalid indices"));
        }
    }
}

fn check_element_sets(mdb: &Mdb, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let element_count = mdb.mesh().element_count();
    for (name, set) in mdb.element_sets() {
        if set.indices.is_empty() {
            warnings.push(format!("element set '{name}' is empty"));
        } else if set.indices.iter().any(|&i| i >= element_count) {
            errors.push(format!("element set '{name}' contains invalid indices"));
        }
    }
}

fn check_surface_sets(mdb: &Mdb, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let elements = mdb.mesh().elements();
    for (name, set) in mdb.surface_sets() {
        if set.pairs.is_empty() {
            warnings.push(format!("surface set '{name}' is empty"));
            continue;
        }
        for &(element_index, surface_index) in &set.pairs {
            let valid = element_index < elements.len()
                && surface_index < elements[element_index].element_type.surfaces().len();
            if !valid {
                errors.push(format!("surface set '{name}' contains invalid indices"));
                break;
            }
        }
    }
}

fn check_materials(mdb: &Mdb, errors: &mut Vec<String>, _warnings: &mut Vec<String>) {
    for (name, material) in mdb.materials() {
        if material.young <= 0.0 {
            errors.push(format!(
                "material '{name}' has a Young's modulus that is less than or equal to zero"
            ));
        }
        if material.poisson <= -1.0 || material.poisson >= 0.5 {
            errors.push(format!(
                "material '{name}' has a Poisson's ratio that lies outside the open interval of (-1.0, 0.5)"
            ));
        }
        if material.density < 0.0 {
            errors.push(format!("material '{name}' has a mass density that is less than zero"));
        }
    }
}

fn check_sections(mdb: &Mdb, errors: &mut Vec<String>, _warnings: &mut Vec<String>) {
    let modeling_space = mdb.mesh().modeling_space();
    for (name, section) in mdb.sections() {
        if !mdb.element_sets().contains_key(&section.region) {
            errors.push(format!(
                "section '{name}' references a non-existent element set '{}'",
                section.region
            ));
        }
        if !mdb.materials().contains_key(&section.material) {
            errors.push(format!(
                "section '{name}' references a non-existent material '{}'",
                section.material
            ));
        }
        if section.section_type.modeling_space() != modeling_space {
            errors.push(format!(
                "section '{name}' of type '{:?}' is invalid for the current modeling space",
                section.section_type
            ));
        }
        if section.section_type.is_planar_with_thickness() && section.thickness <= 0.0 {
            errors.push(format!(
                "section '{name}' of type '{:?}' has negative or no thickness",
                section.section_type
            ));
        }
    }
}

fn check_concentrated_loads(mdb: &Mdb, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let space = mdb.mesh().modeling_space();
    for (name, load) in mdb.concentrated_loads() {
        if !mdb.node_sets().contains_key(&load.region) {
            errors.push(format!(
                "concentrated load '{name}' references a non-existent node set '{}'",
                load.region
            ));
        }
        if load.x == 0.0 && load.y == 0.0 && load.z == 0.0 {
            warnings.push(format!("concentrated load '{name}' has a magnitude of zero"));
        } else if load.z != 0.0 && space == ModelingSpace::TwoDimensional {
            warnings.push(format!(
                "concentrated load '{name}' has a nonzero component along the Z-axis that will be ignored"
            ));
        }
    }
}

fn check_surface_tractions(mdb: &Mdb, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let space = mdb.mesh().modeling_space();
    for (name, load) in mdb.surface_tractions() {
        if !mdb.surface_sets().contains_key(&load.region) {
            errors.push(format!(
                "surface traction '{name}' references a non-existent surface set '{}'",
                load.region
            ));
        }
        if load.x == 0.0 && load.y == 0.0 && load.z == 0.0 {
            warnings.push(format!("surface traction '{name}' has a magnitude of zero"));
        } else if load.z != 0.0 && space == ModelingSpace::TwoDimensional {
            warnings.push(format!(
                "surface traction '{name}' has a nonzero component along the Z-axis that will be ignored"
            ));
        }
    }
}

fn check_pressures(mdb: &Mdb, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    for (name, load) in mdb.pressures() {
        if !mdb.surface_sets().contains_key(&load.region) {
            errors.push(format!(
                "pressure '{name}' references a non-existent surface set '{}'",
                load.region
            ));
        }
        if load.magnitude == 0.0 {
            warnings.push(format!("pressure '{name}' has a magnitude of zero"));
        }
    }
}

fn check_body_loads(mdb: &Mdb, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let space = mdb.mesh().modeling_space();
    for (name, load) in mdb.body_loads() {
        if !mdb.element_sets().contains_key(&load.region) {
            errors.push(format!(
                "body load '{name}' references a non-existent element set '{}'",
                load.region
            ));
        }
        if load.x == 0.0 && load.y == 0.0 && load.z == 0.0 {
            warnings.push(format!("body load '{name}' has a magnitude of zero"));
        } else if load.z != 0.0 && space == ModelingSpace::TwoDimensional {
            warnings.push(format!(
                "body load '{name}' has a nonzero component along the Z-axis that will be ignored"
            ));
        }
    }
}

fn check_accelerations(mdb: &Mdb, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let space = mdb.mesh().modeling_space();
    for (name, load) in mdb.accelerations() {
        if !mdb.element_sets().contains_key(&load.region) {
            errors.push(format!(
                "acceleration '{name}' references a non-existent element set '{}'",
                load.region
            ));
        }
        if load.x == 0.0 && load.y == 0.0 && load.z == 0.0 {
            warnings.push(format!("acceleration '{name}' has a magnitude of zero"));
        } else if load.z != 0.0 && space == ModelingSpace::TwoDimensional {
            warnings.push(format!(
                "acceleration '{name}' has a nonzero component along the Z-axis that will be ignored"
            ));
        }
    }
}

fn check_boundary_conditions(mdb: &Mdb, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let space = mdb.mesh().modeling_space();
    for (name, bc) in mdb.boundary_conditions() {
        if !mdb.node_sets().contains_key(&bc.region) {
            errors.push(format!(
                "boundary condition '{name}' references a non-existent node set '{}'",
                bc.region
            ));
        }
        let dofs = bc.dofs();
        if dofs.is_empty() {
            warnings.push(format!(
                "boundary condition '{name}' has no constrained degrees of freedom"
            ));
        } else if dofs.contains(&2) && space == ModelingSpace::TwoDimensional {
            warnings.push(format!(
                "boundary condition '{name}' has constraints along the Z-axis that will be ignored"
            ));
        }
    }
}

fn check_frequency_analysis(mdb: &Mdb, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    if mdb.materials().values().any(|m| m.density == 0.0) {
        errors.push("the mass density must be specified for a frequency analysis".into());
    }

    let any_loads = !mdb.concentrated_loads().is_empty()
        || !mdb.surface_tractions().is_empty()
        || !mdb.pressures().is_empty()
        || !mdb.accelerations().is_empty()
        || !mdb.body_loads().is_empty();
    if any_loads {
        warnings.push("any type of loading is ignored during a frequency analysis".into());
    }

    let any_nonzero_prescribed = mdb.boundary_conditions().values().any(|bc| {
        [bc.u, bc.v, bc.w].into_iter().flatten().any(|v| v != 0.0)
    });
    if any_nonzero_prescribed {
        warnings.push(
            "any prescribed nodal displacement is assumed to be zero during a frequency analysis".into(),
        );
    }
}

/// Runs every applicable check against the model database and returns the
/// collected error and warning messages. Errors mean the model cannot be
/// solved; warnings describe silently-ignored or suspicious input.
pub fn check_mdb(mdb: &Mdb, analysis: AnalysisKind) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_mesh(mdb, &mut errors, &mut warnings);
    check_node_sets(mdb, &mut errors, &mut warnings);
    check_element_sets(mdb, &mut errors, &mut warnings);
    check_surface_sets(mdb, &mut errors, &mut warnings);
    check_materials(mdb, &mut errors, &mut warnings);
    check_sections(mdb, &mut errors, &mut warnings);
    check_concentrated_loads(mdb, &mut errors, &mut warnings);
    check_surface_tractions(mdb, &mut errors, &mut warnings);
    check_pressures(mdb, &mut errors, &mut warnings);
    check_body_loads(mdb, &mut errors, &mut warnings);
    check_accelerations(mdb, &mut errors, &mut warnings);
    check_boundary_conditions(mdb, &mut errors, &mut warnings);
    if analysis == AnalysisKind::Frequency {
        check_frequency_analysis(mdb, &mut errors, &mut warnings);
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundaryCondition, ElementType, Mesh, Section, SectionType};
    use crate::types::ModelingSpace;

    fn bare_mdb() -> Mdb {
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
    fn missing_section_assignment_is_an_error() {
        let mdb = bare_mdb();
        let (errors, _) = check_mdb(&mdb, AnalysisKind::Static);
        assert!(errors.iter().any(|e| e.contains("section assignments")));
    }

    #[test]
    fn complete_model_has_no_errors() {
        let mut mdb = bare_mdb();
        mdb.element_set("all", [0]).unwrap();
        mdb.material("steel", 200e9, 0.3, 7850.0).unwrap();
        mdb.section(
            "sec",
            Section::new("all", "steel", SectionType::PlaneStress, 1.0, false),
        )
        .unwrap();
        mdb.node_set("left", [0, 3]).unwrap();
        mdb.boundary_condition(
            "fix",
            BoundaryCondition::new("left", Some(0.0), Some(0.0), None),
        )
        .unwrap();
        let (errors, _) = check_mdb(&mdb, AnalysisKind::Static);
        assert!(errors.is_empty());
    }

    #[test]
    fn frequency_analysis_requires_density() {
        let mut mdb = bare_mdb();
        mdb.element_set("all", [0]).unwrap();
        mdb.material("steel", 200e9, 0.3, 0.0).unwrap();
        mdb.section(
            "sec",
            Section::new("all", "steel", SectionType::PlaneStress, 1.0, false),
        )
        .unwrap();
        let (errors, _) = check_mdb(&mdb, AnalysisKind::Frequency);
        assert!(errors.iter().any(|e| e.contains("mass density")));
    }
}
