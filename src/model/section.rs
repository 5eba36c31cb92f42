//! Solid sections: the link between an element region, a material, and the
//! plane/axisymmetric/general integration-volume convention to use.

use serde::{Deserialize, Serialize};

use crate::types::ModelingSpace;

/// The section types a solid section may use. Planar types (`PlaneStress`,
/// `PlaneStrain`, `Axisymmetric`) are only valid for two-dimensional elements;
/// `General` is only valid for three-dimensional elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionType {
    PlaneStress,
    PlaneStrain,
    Axisymmetric,
    General,
}

impl SectionType {
    /// The modeling space this section type is valid for.
    pub const fn modeling_space(self) -> ModelingSpace {
        match self {
            SectionType::PlaneStress | SectionType::PlaneStrain | SectionType::Axisymmetric => {
                ModelingSpace::TwoDimensional
            }
            SectionType::General => ModelingSpace::ThreeDimensional,
        }
    }

    /// Whether this section type carries an out-of-plane thickness factor
    /// (plane stress/strain do; axisymmetric and general do not).
    pub const fn is_planar_with_thickness(self) -> bool {
        matches!(self, SectionType::PlaneStress | SectionType::PlaneStrain)
    }
}

/// A solid section: links a region (element set name) to a material (by name),
/// a [`SectionType`], and (for planar sections) a thickness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub region: String,
    pub material: String,
    pub section_type: SectionType,
    pub thickness: f64,
    pub reduced_integration: bool,
}

impl Section {
    pub fn new(
        region: impl Into<String>,
        material: impl Into<String>,
        section_type: SectionType,
        thickness: f64,
        reduced_integration: bool,
    ) -> Self {
        Self {
            region: region.into(),
            material: material.into(),
            section_type,
            thickness,
            reduced_integration,
        }
    }
}
