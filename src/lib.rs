//! A finite element analysis solver for linear-elastic, isotropic-homogeneous
//! solids, supporting:
//! - Isoparametric solid and plane elements (line, triangle/quad, tet/wedge/hex,
//!   including their quadratic variants)
//! - Linear static analysis
//! - Frequency (modal) analysis
//! - Linear buckling analysis
//!
//! ## Example
//! ```rust,no_run
//! use feapack_rs::prelude::*;
//!
//! let mesh = Mesh::new(
//!     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
//!     vec![(ElementType::Plane4, vec![0, 1, 2, 3])],
//!     ModelingSpace::TwoDimensional,
//! );
//! let mut mdb = Mdb::new(mesh);
//! mdb.node_set("left", [0, 3]).unwrap();
//! mdb.element_set("all", [0]).unwrap();
//! mdb.material("steel", 200e9, 0.3, 7850.0).unwrap();
//! mdb.section("sec", Section::new("all", "steel", SectionType::PlaneStress, 1.0, false)).unwrap();
//! mdb.boundary_condition("fix", BoundaryCondition::new("left", Some(0.0), Some(0.0), None)).unwrap();
//!
//! solve(&mut mdb, Analysis::Static, RunOptions::default()).unwrap();
//! ```

pub mod error;
pub mod isoparametric;
pub mod model;
pub mod solver;
pub mod types;

pub mod prelude {
    pub use crate::error::{Error, NumericalError, Result};
    pub use crate::model::{
        Acceleration, BodyLoad, BoundaryCondition, ConcentratedLoad, Element, ElementType, Mdb,
        Mesh, Node, Pressure, Section, SectionType, SurfaceTraction,
    };
    pub use crate::solver::run::{solve, Analysis, RunOptions};
    pub use crate::types::{ModelingSpace, Real, RealMatrix, RealVector};
}
