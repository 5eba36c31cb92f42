//! Shared scalar/vector aliases and the modeling-space dimensionality.

use nalgebra::{DMatrix, DVector};

/// Floating-point type used throughout the solver.
pub type Real = f64;

/// Dense matrix/vector aliases for element-local and condensed-system quantities.
pub type RealMatrix = DMatrix<Real>;
pub type RealVector = DVector<Real>;

/// The intrinsic dimensionality of a natural-coordinate space: one value per
/// element-type "how many natural coordinates does this shape use", as well
/// as the mesh-wide "how many global DOFs per node" (always Two or Three).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelingSpace {
    OneDimensional,
    TwoDimensional,
    ThreeDimensional,
}

impl ModelingSpace {
    /// DOFs (or natural coordinates) implied by this modeling space.
    pub const fn value(self) -> usize {
        match self {
            ModelingSpace::OneDimensional => 1,
            ModelingSpace::TwoDimensional => 2,
            ModelingSpace::ThreeDimensional => 3,
        }
    }
}
