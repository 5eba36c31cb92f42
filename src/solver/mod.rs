//! The solver: sparse assembly, the small-matrix/dense linear-algebra
//! backend, element-level procedures, model validation, the output
//! database, and the top-level analysis driver.

pub mod linalg;
pub mod odb;
pub mod procedures;
pub mod run;
pub mod sparse;
pub mod validation;
