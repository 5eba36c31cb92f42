//! Linear-elastic isotropic-homogeneous material.

use serde::{Deserialize, Serialize};

/// A linear-elastic (Hookean), isotropic-homogeneous material, defined by its
/// Young's modulus, Poisson's ratio, and mass density.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Material {
    pub young: f64,
    pub poisson: f64,
    pub density: f64,
}

impl Material {
    /// Creates a new material. `density` defaults to `0.0` for analyses that
    /// don't need mass (static, buckling).
    pub fn new(young: f64, poisson: f64, density: f64) -> Self {
        Self {
            young,
            poisson,
            density,
        }
    }

    /// Shear modulus, `G = E / (2 (1 + nu))`.
    pub fn shear_modulus(&self) -> f64 {
        self.young / (2.0 * (1.0 + self.poisson))
    }

    /// Bulk modulus, `K = E / (3 (1 - 2 nu))`.
    pub fn bulk_modulus(&self) -> f64 {
        self.young / (3.0 * (1.0 - 2.0 * self.poisson))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn shear_modulus_matches_isotropic_relation() {
        let mat = Material::new(200e9, 0.3, 7850.0);
        assert_relative_eq!(mat.shear_modulus(), 200e9 / 2.6, max_relative = 1e-12);
    }
}
