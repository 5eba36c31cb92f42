//! Isoparametric element kernels: shape functions, natural derivatives, Gauss
//! integration schemes, and the Jacobian-based mapping from natural to
//! physical coordinates for elements and their boundary surfaces.

use crate::error::Result;
use crate::model::{Element, ElementType, Section, SectionType, Surface};
use crate::solver::linalg;
use crate::types::{Real, RealMatrix, RealVector};

/// Anything shaped like an isoparametric element for the purposes of these
/// kernels: an [`Element`] itself, or one of its boundary [`Surface`]s (which
/// carry their own, lower-dimensional element type but delegate section
/// lookups to their parent).
pub trait IsoShape {
    fn iso_type(&self) -> ElementType;
    fn section(&self) -> &Section;
}

impl IsoShape for Element {
    fn iso_type(&self) -> ElementType {
        self.element_type
    }
    fn section(&self) -> &Section {
        Element::section(self)
    }
}

impl IsoShape for Surface {
    fn iso_type(&self) -> ElementType {
        self.surface_type
    }
    fn section(&self) -> &Section {
        &self.parent_section
    }
}

/// Natural nodal coordinates for the given element type.
pub fn nodes<T: IsoShape>(shape: &T) -> RealMatrix {
    use ElementType::*;
    let rows: &[[Real; 3]] = match shape.iso_type() {
        Line2 => &[[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        Line3 => &[[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
        Plane3 => &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        Plane4 => &[
            [-1.0, -1.0, 0.0],
            [1.0, -1.0, 0.0],
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
        ],
        Plane6 => &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.5, 0.0, 0.0],
            [0.5, 0.5, 0.0],
            [0.0, 0.5, 0.0],
        ],
        Plane8 => &[
            [-1.0, -1.0, 0.0],
            [1.0, -1.0, 0.0],
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0],
        ],
        Volume4 => &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        Volume6 => &[
            [0.0, 0.0, -1.0],
            [1.0, 0.0, -1.0],
            [0.0, 1.0, -1.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
        ],
        Volume8 => &[
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ],
        Volume10 => &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.5, 0.0, 0.0],
            [0.5, 0.5, 0.0],
            [0.0, 0.5, 0.0],
            [0.0, 0.0, 0.5],
            [0.5, 0.0, 0.5],
            [0.0, 0.5, 0.5],
        ],
        Volume15 => &[
            [0.0, 0.0, -1.0],
            [1.0, 0.0, -1.0],
            [0.0, 1.0, -1.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [0.5, 0.0, -1.0],
            [0.5, 0.5, -1.0],
            [0.0, 0.5, -1.0],
            [0.5, 0.0, 1.0],
            [0.5, 0.5, 1.0],
            [0.0, 0.5, 1.0],
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        Volume20 => &[
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
            [0.0, -1.0, -1.0],
            [1.0, 0.0, -1.0],
            [0.0, 1.0, -1.0],
            [-1.0, 0.0, -1.0],
            [0.0, -1.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [-1.0, 0.0, 1.0],
            [-1.0, -1.0, 0.0],
            [1.0, -1.0, 0.0],
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
        ],
    };
    RealMatrix::from_fn(rows.len(), 3, |i, j| rows[i][j])
}

/// Integration points (natural coordinates) and weights for the given element
/// type. Several element types support a reduced-integration scheme,
/// selected via the element's (or surface's parent's) section.
pub fn integration_points<T: IsoShape>(shape: &T) -> (RealMatrix, RealVector) {
    use ElementType::*;
    const S2: Real = 0.5773502691896258;
    const S3A: Real = 0.7745966692414834;
    let reduced = shape.section().reduced_integration;
    let rows: Vec<[Real; 4]> = match shape.iso_type() {
        Line2 => {
            if !reduced {
                vec![[-S2, 0.0, 0.0, 1.0], [S2, 0.0, 0.0, 1.0]]
            } else {
                vec![[0.0, 0.0, 0.0, 2.0]]
            }
        }
        Line3 => {
            if !reduced {
                vec![
                    [-S3A, 0.0, 0.0, 0.5555555555555556],
                    [S3A, 0.0, 0.0, 0.5555555555555556],
                    [0.0, 0.0, 0.0, 0.8888888888888889],
                ]
            } else {
                vec![[-S2, 0.0, 0.0, 1.0], [S2, 0.0, 0.0, 1.0]]
            }
        }
        Plane3 => vec![[0.3333333333333333, 0.3333333333333333, 0.0, 0.5]],
        Plane4 => {
            if !reduced {
                vec![
                    [-S2, -S2, 0.0, 1.0],
                    [S2, -S2, 0.0, 1.0],
                    [S2, S2, 0.0, 1.0],
                    [-S2, S2, 0.0, 1.0],
                ]
            } else {
                vec![[0.0, 0.0, 0.0, 4.0]]
            }
        }
        Plane6 => vec![
            [0.1666666666666667, 0.1666666666666667, 0.0, 0.1666666666666667],
            [0.6666666666666667, 0.1666666666666667, 0.0, 0.1666666666666667],
            [0.1666666666666667, 0.6666666666666667, 0.0, 0.1666666666666667],
        ],
        Plane8 => {
            if !reduced {
                vec![
                    [-S3A, -S3A, 0.0, 0.3086419753086420],
                    [S3A, -S3A, 0.0, 0.3086419753086420],
                    [S3A, S3A, 0.0, 0.3086419753086420],
                    [-S3A, S3A, 0.0, 0.3086419753086420],
                    [0.0, -S3A, 0.0, 0.4938271604938271],
                    [S3A, 0.0, 0.0, 0.4938271604938271],
                    [0.0, S3A, 0.0, 0.4938271604938271],
                    [-S3A, 0.0, 0.0, 0.4938271604938271],
                    [0.0, 0.0, 0.0, 0.7901234567901234],
                ]
            } else {
                vec![
                    [-S2, -S2, 0.0, 1.0],
                    [S2, -S2, 0.0, 1.0],
                    [S2, S2, 0.0, 1.0],
                    [-S2, S2, 0.0, 1.0],
                ]
            }
        }
        Volume4 => vec![[0.25, 0.25, 0.25, 0.1666666666666667]],
        Volume6 => vec![
            [0.3333333333333333, 0.3333333333333333, -S2, 0.5],
            [0.3333333333333333, 0.3333333333333333, S2, 0.5],
        ],
        Volume8 => {
            if !reduced {
                vec![
                    [-S2, -S2, -S2, 1.0],
                    [S2, -S2, -S2, 1.0],
                    [S2, S2, -S2, 1.0],
                    [-S2, S2, -S2, 1.0],
                    [-S2, -S2, S2, 1.0],
                    [S2, -S2, S2, 1.0],
                    [S2, S2, S2, 1.0],
                    [-S2, S2, S2, 1.0],
                ]
            } else {
                vec![[0.0, 0.0, 0.0, 8.0]]
            }
        }
        Volume10 => vec![
            [0.1381966011250105, 0.1381966011250105, 0.1381966011250105, 0.0416666666666667],
            [0.5854101966249685, 0.1381966011250105, 0.1381966011250105, 0.0416666666666667],
            [0.1381966011250105, 0.5854101966249685, 0.1381966011250105, 0.0416666666666667],
            [0.1381966011250105, 0.1381966011250105, 0.5854101966249685, 0.0416666666666667],
        ],
        Volume15 => vec![
            [0.1666666666666667, 0.1666666666666667, -S3A, 0.0925925925925926],
            [0.6666666666666667, 0.1666666666666667, -S3A, 0.0925925925925926],
            [0.1666666666666667, 0.6666666666666667, -S3A, 0.0925925925925926],
            [0.1666666666666667, 0.1666666666666667, S3A, 0.0925925925925926],
            [0.6666666666666667, 0.1666666666666667, S3A, 0.0925925925925926],
            [0.1666666666666667, 0.6666666666666667, S3A, 0.0925925925925926],
            [0.1666666666666667, 0.1666666666666667, 0.0, 0.1481481481481481],
            [0.6666666666666667, 0.1666666666666667, 0.0, 0.1481481481481481],
            [0.1666666666666667, 0.6666666666666667, 0.0, 0.1481481481481481],
        ],
        Volume20 => {
            if !reduced {
                vec![
                    [-S3A, -S3A, -S3A, 0.1714677640603567],
                    [S3A, -S3A, -S3A, 0.1714677640603567],
                    [S3A, S3A, -S3A, 0.1714677640603567],
                    [-S3A, S3A, -S3A, 0.1714677640603567],
                    [-S3A, -S3A, S3A, 0.1714677640603567],
                    [S3A, -S3A, S3A, 0.1714677640603567],
                    [S3A, S3A, S3A, 0.1714677640603567],
                    [-S3A, S3A, S3A, 0.1714677640603567],
                    [0.0, -S3A, -S3A, 0.2743484224965706],
                    [S3A, 0.0, -S3A, 0.2743484224965706],
                    [0.0, S3A, -S3A, 0.2743484224965706],
                    [-S3A, 0.0, -S3A, 0.2743484224965706],
                    [0.0, -S3A, S3A, 0.2743484224965706],
                    [S3A, 0.0, S3A, 0.2743484224965706],
                    [0.0, S3A, S3A, 0.2743484224965706],
                    [-S3A, 0.0, S3A, 0.2743484224965706],
                    [-S3A, -S3A, 0.0, 0.2743484224965706],
                    [S3A, -S3A, 0.0, 0.2743484224965706],
                    [S3A, S3A, 0.0, 0.2743484224965706],
                    [-S3A, S3A, 0.0, 0.2743484224965706],
                    [0.0, -S3A, 0.0, 0.4389574759945130],
                    [S3A, 0.0, 0.0, 0.4389574759945130],
                    [0.0, S3A, 0.0, 0.4389574759945130],
                    [-S3A, 0.0, 0.0, 0.4389574759945130],
                    [0.0, 0.0, -S3A, 0.4389574759945130],
                    [0.0, 0.0, S3A, 0.4389574759945130],
                    [0.0, 0.0, 0.0, 0.7023319615912208],
                ]
            } else {
                vec![
                    [-S2, -S2, -S2, 1.0],
                    [S2, -S2, -S2, 1.0],
                    [S2, S2, -S2, 1.0],
                    [-S2, S2, -S2, 1.0],
                    [-S2, -S2, S2, 1.0],
                    [S2, -S2, S2, 1.0],
                    [S2, S2, S2, 1.0],
                    [-S2, S2, S2, 1.0],
                ]
            }
        }
    };
    let n = rows.len();
    let points = RealMatrix::from_fn(n, 3, |i, j| rows[i][j]);
    let weights = RealVector::from_fn(n, |i, _| rows[i][3]);
    (points, weights)
}

/// Shape functions evaluated at the given natural coordinates.
pub fn shape_functions<T: IsoShape>(shape: &T, r: Real, s: Real, t: Real) -> RealVector {
    use ElementType::*;
    let ty = shape.iso_type();
    let mut n = RealVector::zeros(ty.node_count());
    match ty {
        Line2 => {
            n[0] = 0.5 * (1.0 - r);
            n[1] = 0.5 * (1.0 + r);
        }
        Line3 => {
            n[0] = 0.5 * r * (r - 1.0);
            n[1] = 0.5 * r * (r + 1.0);
            n[2] = 1.0 - r * r;
        }
        Plane3 => {
            n[0] = 1.0 - r - s;
            n[1] = r;
            n[2] = s;
        }
        Plane4 => {
            n[0] = 0.25 * (r - 1.0) * (s - 1.0);
            n[1] = -0.25 * (r + 1.0) * (s - 1.0);
            n[2] = 0.25 * (r + 1.0) * (s + 1.0);
            n[3] = -0.25 * (r - 1.0) * (s + 1.0);
        }
        Plane6 => {
            n[0] = (2.0 * r + 2.0 * s - 1.0) * (r + s - 1.0);
            n[1] = r * (2.0 * r - 1.0);
            n[2] = s * (2.0 * s - 1.0);
            n[3] = -4.0 * r * (r + s - 1.0);
            n[4] = 4.0 * r * s;
            n[5] = -4.0 * s * (r + s - 1.0);
        }
        Plane8 => {
            n[0] = -0.25 * (r - 1.0) * (s - 1.0) * (r + s + 1.0);
            n[1] = -0.25 * (r + 1.0) * (s - 1.0) * (r - s - 1.0);
            n[2] = 0.25 * (r + 1.0) * (s + 1.0) * (r + s - 1.0);
            n[3] = 0.25 * (r - 1.0) * (s + 1.0) * (r - s + 1.0);
            n[4] = 0.5 * (r * r - 1.0) * (s - 1.0);
            n[5] = -0.5 * (s * s - 1.0) * (r + 1.0);
            n[6] = -0.5 * (r * r - 1.0) * (s + 1.0);
            n[7] = 0.5 * (s * s - 1.0) * (r - 1.0);
        }
        Volume4 => {
            n[0] = 1.0 - r - s - t;
            n[1] = r;
            n[2] = s;
            n[3] = t;
        }
        Volume6 => {
            n[0] = 0.5 * (t - 1.0) * (r + s - 1.0);
            n[1] = -0.5 * (t - 1.0) * r;
            n[2] = -0.5 * (t - 1.0) * s;
            n[3] = -0.5 * (t + 1.0) * (r + s - 1.0);
            n[4] = 0.5 * (t + 1.0) * r;
            n[5] = 0.5 * (t + 1.0) * s;
        }
        Volume8 => {
            n[0] = -0.125 * (r - 1.0) * (s - 1.0) * (t - 1.0);
            n[1] = 0.125 * (r + 1.0) * (s - 1.0) * (t - 1.0);
            n[2] = -0.125 * (r + 1.0) * (s + 1.0) * (t - 1.0);
            n[3] = 0.125 * (r - 1.0) * (s + 1.0) * (t - 1.0);
            n[4] = 0.125 * (r - 1.0) * (s - 1.0) * (t + 1.0);
            n[5] = -0.125 * (r + 1.0) * (s - 1.0) * (t + 1.0);
            n[6] = 0.125 * (r + 1.0) * (s + 1.0) * (t + 1.0);
            n[7] = -0.125 * (r - 1.0) * (s + 1.0) * (t + 1.0);
        }
        Volume10 => {
            n[0] = (r + s + t - 1.0) * (2.0 * r + 2.0 * s + 2.0 * t - 1.0);
            n[1] = r * (2.0 * r - 1.0);
            n[2] = s * (2.0 * s - 1.0);
            n[3] = t * (2.0 * t - 1.0);
            n[4] = -4.0 * r * (r + s + t - 1.0);
            n[5] = 4.0 * r * s;
            n[6] = -4.0 * s * (r + s + t - 1.0);
            n[7] = -4.0 * t * (r + s + t - 1.0);
            n[8] = 4.0 * r * t;
            n[9] = 4.0 * s * t;
        }
        Volume15 => {
            n[0] = -0.5 * (t - 1.0) * (r + s - 1.0) * (2.0 * r + 2.0 * s + t);
            n[1] = 0.5 * r * (t - 1.0) * (t - 2.0 * r + 2.0);
            n[2] = 0.5 * s * (t - 1.0) * (t - 2.0 * s + 2.0);
            n[3] = 0.5 * (t + 1.0) * (r + s - 1.0) * (2.0 * r + 2.0 * s - t);
            n[4] = 0.5 * r * (t + 1.0) * (2.0 * r + t - 2.0);
            n[5] = 0.5 * s * (t + 1.0) * (2.0 * s + t - 2.0);
            n[6] = 2.0 * r * (t - 1.0) * (r + s - 1.0);
            n[7] = -2.0 * r * s * (t - 1.0);
            n[8] = 2.0 * s * (t - 1.0) * (r + s - 1.0);
            n[9] = -2.0 * r * (t + 1.0) * (r + s - 1.0);
            n[10] = 2.0 * r * s * (t + 1.0);
            n[11] = -2.0 * s * (t + 1.0) * (r + s - 1.0);
            n[12] = (t * t - 1.0) * (r + s - 1.0);
            n[13] = -r * (t * t - 1.0);
            n[14] = -s * (t * t - 1.0);
        }
        Volume20 => {
            n[0] = 0.125 * (r - 1.0) * (s - 1.0) * (t - 1.0) * (r + s + t + 2.0);
            n[1] = 0.125 * (r + 1.0) * (s - 1.0) * (t - 1.0) * (r - s - t - 2.0);
            n[2] = -0.125 * (r + 1.0) * (s + 1.0) * (t - 1.0) * (r + s - t - 2.0);
            n[3] = -0.125 * (r - 1.0) * (s + 1.0) * (t - 1.0) * (r - s + t + 2.0);
            n[4] = -0.125 * (r - 1.0) * (s - 1.0) * (t + 1.0) * (r + s - t + 2.0);
            n[5] = -0.125 * (r + 1.0) * (s - 1.0) * (t + 1.0) * (r - s + t - 2.0);
            n[6] = 0.125 * (r + 1.0) * (s + 1.0) * (t + 1.0) * (r + s + t - 2.0);
            n[7] = 0.125 * (r - 1.0) * (s + 1.0) * (t + 1.0) * (r - s - t + 2.0);
            n[8] = -0.25 * (r * r - 1.0) * (s - 1.0) * (t - 1.0);
            n[9] = 0.25 * (s * s - 1.0) * (r + 1.0) * (t - 1.0);
            n[10] = 0.25 * (r * r - 1.0) * (s + 1.0) * (t - 1.0);
            n[11] = -0.25 * (s * s - 1.0) * (r - 1.0) * (t - 1.0);
            n[12] = 0.25 * (r * r - 1.0) * (s - 1.0) * (t + 1.0);
            n[13] = -0.25 * (s * s - 1.0) * (r + 1.0) * (t + 1.0);
            n[14] = -0.25 * (r * r - 1.0) * (s + 1.0) * (t + 1.0);
            n[15] = 0.25 * (s * s - 1.0) * (r - 1.0) * (t + 1.0);
            n[16] = -0.25 * (t * t - 1.0) * (r - 1.0) * (s - 1.0);
            n[17] = 0.25 * (t * t - 1.0) * (r + 1.0) * (s - 1.0);
            n[18] = -0.25 * (t * t - 1.0) * (r + 1.0) * (s + 1.0);
            n[19] = 0.25 * (t * t - 1.0) * (r - 1.0) * (s + 1.0);
        }
    }
    n
}

/// Natural derivatives of the shape functions (3 rows -- `d/dr`, `d/ds`,
/// `d/dt` -- by `nodeCount` columns), evaluated at the given natural
/// coordinates.
pub fn natural_derivatives<T: IsoShape>(shape: &T, r: Real, s: Real, t: Real) -> RealMatrix {
    use ElementType::*;
    let ty = shape.iso_type();
    let mut nr = RealMatrix::zeros(3, ty.node_count());
    match ty {
        Line2 => {
            nr[(0, 0)] = -0.5;
            nr[(0, 1)] = 0.5;
        }
        Line3 => {
            nr[(0, 0)] = r - 0.5;
            nr[(0, 1)] = r + 0.5;
            nr[(0, 2)] = -2.0 * r;
        }
        Plane3 => {
            nr[(0, 0)] = -1.0;
            nr[(0, 1)] = 1.0;
            nr[(0, 2)] = 0.0;
            nr[(1, 0)] = -1.0;
            nr[(1, 1)] = 0.0;
            nr[(1, 2)] = 1.0;
        }
        Plane4 => {
            nr[(0, 0)] = 0.25 * (s - 1.0);
            nr[(0, 1)] = -0.25 * (s - 1.0);
            nr[(0, 2)] = 0.25 * (s + 1.0);
            nr[(0, 3)] = -0.25 * (s + 1.0);
            nr[(1, 0)] = 0.25 * (r - 1.0);
            nr[(1, 1)] = -0.25 * (r + 1.0);
            nr[(1, 2)] = 0.25 * (r + 1.0);
            nr[(1, 3)] = -0.25 * (r - 1.0);
        }
        Plane6 => {
            nr[(0, 0)] = 4.0 * r + 4.0 * s - 3.0;
            nr[(0, 1)] = 4.0 * r - 1.0;
            nr[(0, 2)] = 0.0;
            nr[(0, 3)] = 4.0 - 8.0 * r - 4.0 * s;
            nr[(0, 4)] = 4.0 * s;
            nr[(0, 5)] = -4.0 * s;
            nr[(1, 0)] = 4.0 * r + 4.0 * s - 3.0;
            nr[(1, 1)] = 0.0;
            nr[(1, 2)] = 4.0 * s - 1.0;
            nr[(1, 3)] = -4.0 * r;
            nr[(1, 4)] = 4.0 * r;
            nr[(1, 5)] = 4.0 - 8.0 * s - 4.0 * r;
        }
        Plane8 => {
            nr[(0, 0)] = -0.25 * (2.0 * r + s) * (s - 1.0);
            nr[(0, 1)] = -0.25 * (2.0 * r - s) * (s - 1.0);
            nr[(0, 2)] = 0.25 * (2.0 * r + s) * (s + 1.0);
            nr[(0, 3)] = 0.25 * (2.0 * r - s) * (s + 1.0);
            nr[(0, 4)] = r * (s - 1.0);
            nr[(0, 5)] = -0.5 * (s * s - 1.0);
            nr[(0, 6)] = -r * (s + 1.0);
            nr[(0, 7)] = 0.5 * (s * s - 1.0);
            nr[(1, 0)] = -0.25 * (r + 2.0 * s) * (r - 1.0);
            nr[(1, 1)] = -0.25 * (r - 2.0 * s) * (r + 1.0);
            nr[(1, 2)] = 0.25 * (r + 2.0 * s) * (r + 1.0);
            nr[(1, 3)] = 0.25 * (r - 2.0 * s) * (r - 1.0);
            nr[(1, 4)] = 0.5 * (r * r - 1.0);
            nr[(1, 5)] = -s * (r + 1.0);
            nr[(1, 6)] = -0.5 * (r * r - 1.0);
            nr[(1, 7)] = s * (r - 1.0);
        }
        Volume4 => {
            nr[(0, 0)] = -1.0;
            nr[(0, 1)] = 1.0;
            nr[(0, 2)] = 0.0;
            nr[(0, 3)] = 0.0;
            nr[(1, 0)] = -1.0;
            nr[(1, 1)] = 0.0;
            nr[(1, 2)] = 1.0;
            nr[(1, 3)] = 0.0;
            nr[(2, 0)] = -1.0;
            nr[(2, 1)] = 0.0;
            nr[(2, 2)] = 0.0;
            nr[(2, 3)] = 1.0;
        }
        Volume6 => {
            nr[(0, 0)] = 0.5 * (t - 1.0);
            nr[(0, 1)] = -0.5 * (t - 1.0);
            nr[(0, 2)] = 0.0;
            nr[(0, 3)] = -0.5 * (t + 1.0);
            nr[(0, 4)] = 0.5 * (t + 1.0);
            nr[(0, 5)] = 0.0;
            nr[(1, 0)] = 0.5 * (t - 1.0);
            nr[(1, 1)] = 0.0;
            nr[(1, 2)] = -0.5 * (t - 1.0);
            nr[(1, 3)] = -0.5 * (t + 1.0);
            nr[(1, 4)] = 0.0;
            nr[(1, 5)] = 0.5 * (t + 1.0);
            nr[(2, 0)] = 0.5 * (r + s - 1.0);
            nr[(2, 1)] = -0.5 * r;
            nr[(2, 2)] = -0.5 * s;
            nr[(2, 3)] = -0.5 * (r + s - 1.0);
            nr[(2, 4)] = 0.5 * r;
            nr[(2, 5)] = 0.5 * s;
        }
        Volume8 => {
            nr[(0, 0)] = -0.125 * (s - 1.0) * (t - 1.0);
            nr[(0, 1)] = 0.125 * (s - 1.0) * (t - 1.0);
            nr[(0, 2)] = -0.125 * (s + 1.0) * (t - 1.0);
            nr[(0, 3)] = 0.125 * (s + 1.0) * (t - 1.0);
            nr[(0, 4)] = 0.125 * (s - 1.0) * (t + 1.0);
            nr[(0, 5)] = -0.125 * (s - 1.0) * (t + 1.0);
            nr[(0, 6)] = 0.125 * (s + 1.0) * (t + 1.0);
            nr[(0, 7)] = -0.125 * (s + 1.0) * (t + 1.0);
            nr[(1, 0)] = -0.125 * (r - 1.0) * (t - 1.0);
            nr[(1, 1)] = 0.125 * (r + 1.0) * (t - 1.0);
            nr[(1, 2)] = -0.125 * (r + 1.0) * (t - 1.0);
            nr[(1, 3)] = 0.125 * (r - 1.0) * (t - 1.0);
            nr[(1, 4)] = 0.125 * (r - 1.0) * (t + 1.0);
            nr[(1, 5)] = -0.125 * (r + 1.0) * (t + 1.0);
            nr[(1, 6)] = 0.125 * (r + 1.0) * (t + 1.0);
            nr[(1, 7)] = -0.125 * (r - 1.0) * (t + 1.0);
            nr[(2, 0)] = -0.125 * (r - 1.0) * (s - 1.0);
            nr[(2, 1)] = 0.125 * (r + 1.0) * (s - 1.0);
            nr[(2, 2)] = -0.125 * (r + 1.0) * (s + 1.0);
            nr[(2, 3)] = 0.125 * (r - 1.0) * (s + 1.0);
            nr[(2, 4)] = 0.125 * (r - 1.0) * (s - 1.0);
            nr[(2, 5)] = -0.125 * (r + 1.0) * (s - 1.0);
            nr[(2, 6)] = 0.125 * (r + 1.0) * (s + 1.0);
            nr[(2, 7)] = -0.125 * (r - 1.0) * (s + 1.0);
        }
        Volume10 => {
            nr[(0, 0)] = 4.0 * r + 4.0 * s + 4.0 * t - 3.0;
            nr[(0, 1)] = 4.0 * r - 1.0;
            nr[(0, 2)] = 0.0;
            nr[(0, 3)] = 0.0;
            nr[(0, 4)] = 4.0 - 8.0 * r - 4.0 * s - 4.0 * t;
            nr[(0, 5)] = 4.0 * s;
            nr[(0, 6)] = -4.0 * s;
            nr[(0, 7)] = -4.0 * t;
            nr[(0, 8)] = 4.0 * t;
            nr[(0, 9)] = 0.0;
            nr[(1, 0)] = 4.0 * r + 4.0 * s + 4.0 * t - 3.0;
            nr[(1, 1)] = 0.0;
            nr[(1, 2)] = 4.0 * s - 1.0;
            nr[(1, 3)] = 0.0;
            nr[(1, 4)] = -4.0 * r;
            nr[(1, 5)] = 4.0 * r;
            nr[(1, 6)] = 4.0 - 4.0 * r - 8.0 * s - 4.0 * t;
            nr[(1, 7)] = -4.0 * t;
            nr[(1, 8)] = 0.0;
            nr[(1, 9)] = 4.0 * t;
            nr[(2, 0)] = 4.0 * r + 4.0 * s + 4.0 * t - 3.0;
            nr[(2, 1)] = 0.0;
            nr[(2, 2)] = 0.0;
            nr[(2, 3)] = 4.0 * t - 1.0;
            nr[(2, 4)] = -4.0 * r;
            nr[(2, 5)] = 0.0;
            nr[(2, 6)] = -4.0 * s;
            nr[(2, 7)] = 4.0 - 4.0 * r - 4.0 * s - 8.0 * t;
            nr[(2, 8)] = 4.0 * r;
            nr[(2, 9)] = 4.0 * s;
        }
        Volume15 => {
            nr[(0, 0)] = -0.5 * (t - 1.0) * (4.0 * r + 4.0 * s + t - 2.0);
            nr[(0, 1)] = 0.5 * (t - 1.0) * (t - 4.0 * r + 2.0);
            nr[(0, 2)] = 0.0;
            nr[(0, 3)] = 0.5 * (t + 1.0) * (4.0 * r + 4.0 * s - t - 2.0);
            nr[(0, 4)] = 0.5 * (t + 1.0) * (4.0 * r + t - 2.0);
            nr[(0, 5)] = 0.0;
            nr[(0, 6)] = 2.0 * (t - 1.0) * (2.0 * r + s - 1.0);
            nr[(0, 7)] = -2.0 * s * (t - 1.0);
            nr[(0, 8)] = 2.0 * s * (t - 1.0);
            nr[(0, 9)] = -2.0 * (t + 1.0) * (2.0 * r + s - 1.0);
            nr[(0, 10)] = 2.0 * s * (t + 1.0);
            nr[(0, 11)] = -2.0 * s * (t + 1.0);
            nr[(0, 12)] = t * t - 1.0;
            nr[(0, 13)] = 1.0 - t * t;
            nr[(0, 14)] = 0.0;
            nr[(1, 0)] = -0.5 * (t - 1.0) * (4.0 * r + 4.0 * s + t - 2.0);
            nr[(1, 1)] = 0.0;
            nr[(1, 2)] = 0.5 * (t - 1.0) * (t - 4.0 * s + 2.0);
            nr[(1, 3)] = 0.5 * (t + 1.0) * (4.0 * r + 4.0 * s - t - 2.0);
            nr[(1, 4)] = 0.0;
            nr[(1, 5)] = 0.5 * (t + 1.0) * (4.0 * s + t - 2.0);
            nr[(1, 6)] = 2.0 * r * (t - 1.0);
            nr[(1, 7)] = -2.0 * r * (t - 1.0);
            nr[(1, 8)] = 2.0 * (t - 1.0) * (r + 2.0 * s - 1.0);
            nr[(1, 9)] = -2.0 * r * (t + 1.0);
            nr[(1, 10)] = 2.0 * r * (t + 1.0);
            nr[(1, 11)] = -2.0 * (t + 1.0) * (r + 2.0 * s - 1.0);
            nr[(1, 12)] = t * t - 1.0;
            nr[(1, 13)] = 0.0;
            nr[(1, 14)] = 1.0 - t * t;
            nr[(2, 0)] = -0.5 * (r + s - 1.0) * (2.0 * r + 2.0 * s + 2.0 * t - 1.0);
            nr[(2, 1)] = 0.5 * r * (2.0 * t - 2.0 * r + 1.0);
            nr[(2, 2)] = 0.5 * s * (2.0 * t - 2.0 * s + 1.0);
            nr[(2, 3)] = 0.5 * (r + s - 1.0) * (2.0 * r + 2.0 * s - 2.0 * t - 1.0);
            nr[(2, 4)] = 0.5 * r * (2.0 * r + 2.0 * t - 1.0);
            nr[(2, 5)] = 0.5 * s * (2.0 * s + 2.0 * t - 1.0);
            nr[(2, 6)] = 2.0 * r * (r + s - 1.0);
            nr[(2, 7)] = -2.0 * r * s;
            nr[(2, 8)] = 2.0 * s * (r + s - 1.0);
            nr[(2, 9)] = -2.0 * r * (r + s - 1.0);
            nr[(2, 10)] = 2.0 * r * s;
            nr[(2, 11)] = -2.0 * s * (r + s - 1.0);
            nr[(2, 12)] = 2.0 * t * (r + s - 1.0);
            nr[(2, 13)] = -2.0 * r * t;
            nr[(2, 14)] = -2.0 * s * t;
        }
        Volume20 => {
            nr[(0, 0)] = 0.125 * (s - 1.0) * (t - 1.0) * (2.0 * r + s + t + 1.0);
            nr[(0, 1)] = 0.125 * (s - 1.0) * (t - 1.0) * (2.0 * r - s - t - 1.0);
            nr[(0, 2)] = -0.125 * (s + 1.0) * (t - 1.0) * (2.0 * r + s - t - 1.0);
            nr[(0, 3)] = -0.125 * (s + 1.0) * (t - 1.0) * (2.0 * r - s + t + 1.0);
            nr[(0, 4)] = -0.125 * (s - 1.0) * (t + 1.0) * (2.0 * r + s - t + 1.0);
            nr[(0, 5)] = -0.125 * (s - 1.0) * (t + 1.0) * (2.0 * r - s + t - 1.0);
            nr[(0, 6)] = 0.125 * (s + 1.0) * (t + 1.0) * (2.0 * r + s + t - 1.0);
            nr[(0, 7)] = 0.125 * (s + 1.0) * (t + 1.0) * (2.0 * r - s - t + 1.0);
            nr[(0, 8)] = -0.50 * r * (s - 1.0) * (t - 1.0);
            nr[(0, 9)] = 0.25 * (s * s - 1.0) * (t - 1.0);
            nr[(0, 10)] = 0.50 * r * (s + 1.0) * (t - 1.0);
            nr[(0, 11)] = -0.25 * (s * s - 1.0) * (t - 1.0);
            nr[(0, 12)] = 0.50 * r * (s - 1.0) * (t + 1.0);
            nr[(0, 13)] = -0.25 * (s * s - 1.0) * (t + 1.0);
            nr[(0, 14)] = -0.50 * r * (s + 1.0) * (t + 1.0);
            nr[(0, 15)] = 0.25 * (s * s - 1.0) * (t + 1.0);
            nr[(0, 16)] = -0.25 * (t * t - 1.0) * (s - 1.0);
            nr[(0, 17)] = 0.25 * (t * t - 1.0) * (s - 1.0);
            nr[(0, 18)] = -0.25 * (t * t - 1.0) * (s + 1.0);
            nr[(0, 19)] = 0.25 * (t * t - 1.0) * (s + 1.0);
            nr[(1, 0)] = 0.125 * (r - 1.0) * (t - 1.0) * (r + 2.0 * s + t + 1.0);
            nr[(1, 1)] = 0.125 * (r + 1.0) * (t - 1.0) * (r - 2.0 * s - t - 1.0);
            nr[(1, 2)] = -0.125 * (r + 1.0) * (t - 1.0) * (r + 2.0 * s - t - 1.0);
            nr[(1, 3)] = -0.125 * (r - 1.0) * (t - 1.0) * (r - 2.0 * s + t + 1.0);
            nr[(1, 4)] = -0.125 * (r - 1.0) * (t + 1.0) * (r + 2.0 * s - t + 1.0);
            nr[(1, 5)] = -0.125 * (r + 1.0) * (t + 1.0) * (r - 2.0 * s + t - 1.0);
            nr[(1, 6)] = 0.125 * (r + 1.0) * (t + 1.0) * (r + 2.0 * s + t - 1.0);
            nr[(1, 7)] = 0.125 * (r - 1.0) * (t + 1.0) * (r - 2.0 * s - t + 1.0);
            nr[(1, 8)] = -0.25 * (r * r - 1.0) * (t - 1.0);
            nr[(1, 9)] = 0.50 * s * (r + 1.0) * (t - 1.0);
            nr[(1, 10)] = 0.25 * (r * r - 1.0) * (t - 1.0);
            nr[(1, 11)] = -0.50 * s * (r - 1.0) * (t - 1.0);
            nr[(1, 12)] = 0.25 * (r * r - 1.0) * (t + 1.0);
            nr[(1, 13)] = -0.50 * s * (r + 1.0) * (t + 1.0);
            nr[(1, 14)] = -0.25 * (r * r - 1.0) * (t + 1.0);
            nr[(1, 15)] = 0.50 * s * (r - 1.0) * (t + 1.0);
            nr[(1, 16)] = -0.25 * (t * t - 1.0) * (r - 1.0);
            nr[(1, 17)] = 0.25 * (t * t - 1.0) * (r + 1.0);
            nr[(1, 18)] = -0.25 * (t * t - 1.0) * (r + 1.0);
            nr[(1, 19)] = 0.25 * (t * t - 1.0) * (r - 1.0);
            nr[(2, 0)] = 0.125 * (r - 1.0) * (s - 1.0) * (r + s + 2.0 * t + 1.0);
            nr[(2, 1)] = 0.125 * (r + 1.0) * (s - 1.0) * (r - s - 2.0 * t - 1.0);
            nr[(2, 2)] = -0.125 * (r + 1.0) * (s + 1.0) * (r + s - 2.0 * t - 1.0);
            nr[(2, 3)] = -0.125 * (r - 1.0) * (s + 1.0) * (r - s + 2.0 * t + 1.0);
            nr[(2, 4)] = -0.125 * (r - 1.0) * (s - 1.0) * (r + s - 2.0 * t + 1.0);
            nr[(2, 5)] = -0.125 * (r + 1.0) * (s - 1.0) * (r - s + 2.0 * t - 1.0);
            nr[(2, 6)] = 0.125 * (r + 1.0) * (s + 1.0) * (r + s + 2.0 * t - 1.0);
            nr[(2, 7)] = 0.125 * (r - 1.0) * (s + 1.0) * (r - s - 2.0 * t + 1.0);
            nr[(2, 8)] = -0.25 * (r * r - 1.0) * (s - 1.0);
            nr[(2, 9)] = 0.25 * (s * s - 1.0) * (r + 1.0);
            nr[(2, 10)] = 0.25 * (r * r - 1.0) * (s + 1.0);
            nr[(2, 11)] = -0.25 * (s * s - 1.0) * (r - 1.0);
            nr[(2, 12)] = 0.25 * (r * r - 1.0) * (s - 1.0);
            nr[(2, 13)] = -0.25 * (s * s - 1.0) * (r + 1.0);
            nr[(2, 14)] = -0.25 * (r * r - 1.0) * (s + 1.0);
            nr[(2, 15)] = 0.25 * (s * s - 1.0) * (r - 1.0);
            nr[(2, 16)] = -0.50 * t * (r - 1.0) * (s - 1.0);
            nr[(2, 17)] = 0.50 * t * (r + 1.0) * (s - 1.0);
            nr[(2, 18)] = -0.50 * t * (r + 1.0) * (s + 1.0);
            nr[(2, 19)] = 0.50 * t * (r - 1.0) * (s + 1.0);
        }
    }
    nr
}

/// The least-squares extrapolation approach used to recover nodal values
/// from Gauss-point values for this element type.
pub fn extrapolation_approach<T: IsoShape>(shape: &T) -> &'static str {
    use ElementType::*;
    let reduced = shape.section().reduced_integration;
    match shape.iso_type() {
        Line2 => {
            if !reduced {
                "linear in r"
            } else {
                "constant"
            }
        }
        Line3 => "linear in r",
        Plane3 => "constant",
        Plane4 => {
            if !reduced {
                "bilinear in r, s"
            } else {
                "constant"
            }
        }
        Plane6 | Plane8 => "bilinear in r, s",
        Volume4 => "constant",
        Volume6 => "linear in t",
        Volume8 => {
            if !reduced {
                "trilinear in r, s, t"
            } else {
                "constant"
            }
        }
        Volume10 | Volume15 | Volume20 => "trilinear in r, s, t",
    }
}

/// Evaluates an element at one integration point: physical coordinates,
/// shape functions, their physical (x/y/z) derivatives, and the integration
/// point's contribution to volume (thickness- or axisymmetric-weighted per
/// the element's section).
pub fn evaluate_element(
    element: &Element,
    x: &RealMatrix,
    int_pt: &RealVector,
    weight: Real,
) -> Result<(RealVector, RealVector, RealMatrix, Real)> {
    let k = element.element_type.modeling_space().value();

    let n = shape_functions(element, int_pt[0], int_pt[1], int_pt[2]);
    let nr = natural_derivatives(element, int_pt[0], int_pt[1], int_pt[2]);

    let coord = (n.transpose() * x).transpose();

    let j = nr.rows(0, k) * x.columns(0, k);
    let (inv_j, det_j) = linalg::inverse(&j)?;

    let mut nx = RealMatrix::zeros(nr.nrows(), nr.ncols());
    nx.rows_mut(0, k).copy_from(&(inv_j * nr.rows(0, k)));

    let section = element.section();
    let vol = match section.section_type {
        SectionType::PlaneStress | SectionType::PlaneStrain => {
            weight * det_j.abs() * section.thickness
        }
        SectionType::Axisymmetric => weight * det_j.abs() * 2.0 * std::f64::consts::PI * coord[0],
        SectionType::General => weight * det_j.abs(),
    };

    Ok((coord, n, nx, vol))
}

/// Evaluates a surface at one integration point: physical coordinates,
/// shape functions, the unit outward normal, and the integration point's
/// contribution to area (thickness- or axisymmetric-weighted per the
/// parent's section).
pub fn evaluate_surface(
    surface: &Surface,
    x: &RealMatrix,
    int_pt: &RealVector,
    weight: Real,
) -> Result<(RealVector, RealVector, RealVector, Real)> {
    use crate::types::ModelingSpace;

    let k = surface.modeling_space().value();

    let n = shape_functions(surface, int_pt[0], int_pt[1], int_pt[2]);
    let nr = natural_derivatives(surface, int_pt[0], int_pt[1], int_pt[2]);

    let coord = (n.transpose() * x).transpose();

    let j = nr.rows(0, k) * x.columns(0, k + 1);

    let mut normal = RealVector::zeros(3);
    match surface.modeling_space() {
        ModelingSpace::OneDimensional => {
            normal[0] = j[(0, 1)];
            normal[1] = -j[(0, 0)];
            normal[2] = 0.0;
        }
        ModelingSpace::TwoDimensional => {
            normal[0] = j[(0, 1)] * j[(1, 2)] - j[(0, 2)] * j[(1, 1)];
            normal[1] = j[(0, 2)] * j[(1, 0)] - j[(0, 0)] * j[(1, 2)];
            normal[2] = j[(0, 0)] * j[(1, 1)] - j[(0, 1)] * j[(1, 0)];
        }
        ModelingSpace::ThreeDimensional => {
            return Err(crate::error::Error::InvalidModel(
                "3D surface in 4D space is not supported".into(),
            ));
        }
    }
    let det_j = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
    normal /= det_j;

    let section = surface.parent_section.clone();
    let area = match section.section_type {
        SectionType::PlaneStress | SectionType::PlaneStrain => {
            weight * det_j.abs() * section.thickness
        }
        SectionType::Axisymmetric => weight * det_j.abs() * 2.0 * std::f64::consts::PI * coord[0],
        SectionType::General => weight * det_j.abs(),
    };

    Ok((coord, n, normal, area))
}
