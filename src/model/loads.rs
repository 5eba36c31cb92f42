//! Loads and boundary conditions.

use serde::{Deserialize, Serialize};

/// A concentrated (nodal) load applied to a node-set region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentratedLoad {
    pub region: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A distributed traction applied to a surface-set region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceTraction {
    pub region: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A normal pressure applied to a surface-set region (positive compresses
/// the solid, i.e. acts opposite the outward surface normal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pressure {
    pub region: String,
    pub magnitude: f64,
}

/// A body force per unit volume applied to an element-set region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyLoad {
    pub region: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// An acceleration field (e.g. gravity) applied to an element-set region; the
/// resulting body force is `density * acceleration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acceleration {
    pub region: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ConcentratedLoad {
    pub fn new(region: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            region: region.into(),
            x,
            y,
            z,
        }
    }
    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl SurfaceTraction {
    pub fn new(region: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            region: region.into(),
            x,
            y,
            z,
        }
    }
    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Pressure {
    pub fn new(region: impl Into<String>, magnitude: f64) -> Self {
        Self {
            region: region.into(),
            magnitude,
        }
    }
}

impl BodyLoad {
    pub fn new(region: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            region: region.into(),
            x,
            y,
            z,
        }
    }
    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Acceleration {
    pub fn new(region: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            region: region.into(),
            x,
            y,
            z,
        }
    }
    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// A prescribed nodal displacement (boundary condition) applied to a node-set
/// region. Each of `u`, `v`, `w` is `None` (unconstrained) or `Some(value)`
/// (constrained to `value`, `0.0` being the common case).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub region: String,
    pub u: Option<f64>,
    pub v: Option<f64>,
    pub w: Option<f64>,
}

impl BoundaryCondition {
    pub fn new(region: impl Into<String>, u: Option<f64>, v: Option<f64>, w: Option<f64>) -> Self {
        Self {
            region: region.into(),
            u,
            v,
            w,
        }
    }

    /// The DOF indices (0=X, 1=Y, 2=Z) this boundary condition constrains.
    pub fn dofs(&self) -> Vec<usize> {
        [self.u, self.v, self.w]
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|_| i))
            .collect()
    }

    /// The prescribed value for the given DOF index; `0.0` if unconstrained.
    pub fn value(&self, dof: usize) -> f64 {
        match dof {
            0 => self.u.unwrap_or(0.0),
            1 => self.v.unwrap_or(0.0),
            2 => self.w.unwrap_or(0.0),
            _ => 0.0,
        }
    }
}
