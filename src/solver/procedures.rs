//! Element-level matrices and vectors, their assembly into the condensed
//! global system, and the post-processing steps (extension, extrapolation,
//! smoothing) that turn integration-point results into nodal fields.

use nalgebra_sparse::CsrMatrix;

use crate::error::Result;
use crate::isoparametric as iso;
use crate::model::{Element, Mdb, Mesh, Section, SectionType, Surface};
use crate::types::{Real, RealMatrix, RealVector};

use super::sparse::SparseMatrixBuilder;

/// Runs `f` over every item, fanning out across `processes` worker threads
/// (chunked by index range) when `processes > 1`, sequentially otherwise.
pub fn parallel_map<T, R, F>(items: &[T], processes: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if processes <= 1 || items.len() <= 1 {
        return items.iter().map(|item| f(item)).collect();
    }
    let chunk_size = items.len().div_ceil(processes).max(1);
    let mut results: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
    let chunks: Vec<(usize, &[T])> = items
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, chunk)| (i * chunk_size, chunk))
        .collect();
    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for (start, chunk) in &chunks {
            let f = &f;
            handles.push(scope.spawn(move || {
                chunk.iter().map(|item| f(item)).collect::<Vec<_>>()
            }));
            let _ = start;
        }
        for ((start, _), handle) in chunks.iter().zip(handles) {
            let chunk_results = handle.join().expect("worker thread panicked");
            for (offset, r) in chunk_results.into_iter().enumerate() {
                results[start + offset] = Some(r);
            }
        }
    });
    results.into_iter().map(|r| r.expect("every index filled")).collect()
}

//-----------------------------------------------------------------------------------------------
// LOCAL MATRICES AND VECTORS
//-----------------------------------------------------------------------------------------------

/// Gathers the nodal displacement vector for an element, in element-local
/// DOF order, from the global active/inactive displacement vectors.
pub fn displacement_vector(element: &Element, ua: &RealVector, ub: &RealVector) -> RealVector {
    let mut u = RealVector::zeros(element.element_type.dof_count());
    for (&local, &global) in element
        .active_local_dofs()
        .iter()
        .zip(element.active_global_dofs())
    {
        u[local] = ua[global];
    }
    for (&local, &global) in element
        .inactive_local_dofs()
        .iter()
        .zip(element.inactive_global_dofs())
    {
        u[local] = ub[global];
    }
    u
}

/// Reshapes an element's nodal displacement vector into a `nodeCount x
/// modelingSpace` matrix.
pub fn displacement_matrix(element: &Element, vec_u: &RealVector) -> RealMatrix {
    let node_count = element.element_type.node_count();
    let count = element.element_type.dof_count() / node_count;
    let mut mat_u = RealMatrix::zeros(node_count, 3);
    for i in 0..node_count {
        for j in 0..count {
            mat_u[(i, j)] = vec_u[i * count + j];
        }
    }
    mat_u
}

/// The stress-strain (constitutive) matrix `D` for the element's material
/// and section type. Uses engineering shear strain throughout.
pub fn stress_strain_matrix(element: &Element) -> RealMatrix {
    let material = element.material();
    let e = material.young;
    let nu = material.poisson;
    let lambda = (e * nu) / ((1.0 + nu) * (1.0 - 2.0 * nu));
    let mu = e / (2.0 * (1.0 + nu));
    let alpha = e / (1.0 - nu * nu);
    let beta = alpha * nu;
    let gamma = 2.0 * mu + lambda;

    match element.section().section_type {
        SectionType::PlaneStress => {
            RealMatrix::from_row_slice(3, 3, &[alpha, beta, 0.0, beta, alpha, 0.0, 0.0, 0.0, mu])
        }
        SectionType::PlaneStrain | SectionType::Axisymmetric => RealMatrix::from_row_slice(
            4,
            4,
            &[
                gamma, lambda, lambda, 0.0, lambda, gamma, lambda, 0.0, lambda, lambda, gamma,
                0.0, 0.0, 0.0, 0.0, mu,
            ],
        ),
        SectionType::General => RealMatrix::from_row_slice(
            6,
            6,
            &[
                gamma, lambda, lambda, 0.0, 0.0, 0.0, lambda, gamma, lambda, 0.0, 0.0, 0.0,
                lambda, lambda, gamma, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, mu, 0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, mu, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, mu,
            ],
        ),
    }
}

/// The strain-displacement matrix `B` at one integration point.
pub fn strain_displacement_matrix(
    element: &Element,
    coord: &RealVector,
    n: &RealVector,
    nx: &RealMatrix,
) -> RealMatrix {
    let node_count = element.element_type.node_count();
    match element.section().section_type {
        SectionType::PlaneStress => {
            let mut b = RealMatrix::zeros(3, element.element_type.dof_count());
            for i in 0..node_count {
                let j = i * 2;
                b[(0, j)] = nx[(0, i)];
                b[(1, j + 1)] = nx[(1, i)];
                b[(2, j)] = nx[(1, i)];
                b[(2, j + 1)] = nx[(0, i)];
            }
            b
        }
        SectionType::PlaneStrain => {
            let mut b = RealMatrix::zeros(4, element.element_type.dof_count());
            for i in 0..node_count {
                let j = i * 2;
                b[(0, j)] = nx[(0, i)];
                b[(1, j + 1)] = nx[(1, i)];
                b[(3, j)] = nx[(1, i)];
                b[(3, j + 1)] = nx[(0, i)];
            }
            b
        }
        SectionType::Axisymmetric => {
            let mut b = RealMatrix::zeros(4, element.element_type.dof_count());
            for i in 0..node_count {
                let j = i * 2;
                b[(0, j)] = nx[(0, i)];
                b[(1, j + 1)] = nx[(1, i)];
                b[(2, j)] = n[i] / coord[0];
                b[(3, j)] = nx[(1, i)];
                b[(3, j + 1)] = nx[(0, i)];
            }
            b
        }
        SectionType::General => {
            let mut b = RealMatrix::zeros(6, element.element_type.dof_count());
            for i in 0..node_count {
                let j = i * 3;
                b[(0, j)] = nx[(0, i)];
                b[(1, j + 1)] = nx[(1, i)];
                b[(2, j + 2)] = nx[(2, i)];
                b[(3, j + 1)] = nx[(2, i)];
                b[(3, j + 2)] = nx[(1, i)];
                b[(4, j)] = nx[(2, i)];
                b[(4, j + 2)] = nx[(0, i)];
                b[(5, j)] = nx[(1, i)];
                b[(5, j + 1)] = nx[(0, i)];
            }
            b
        }
    }
}

/// The element/surface interpolation matrix `H`, sized against the
/// *parent's* DOF layout for a surface, or the element's own for an element.
pub fn interpolation_matrix_element(element: &Element, n: &RealVector) -> RealMatrix {
    let m = element.element_type.modeling_space().value();
    let dof_count = element.element_type.dof_count();
    let mut h = RealMatrix::zeros(m, dof_count);
    for k in 0..element.element_type.node_count() {
        let j = k * m;
        for d in 0..m {
            h[(d, j + d)] = n[k];
        }
    }
    h
}

pub fn interpolation_matrix_surface(surface: &Surface, n: &RealVector) -> RealMatrix {
    let m = surface.parent_modeling_space.value();
    let dof_count = surface.parent_dof_count;
    let mut h = RealMatrix::zeros(m, dof_count);
    for (k, &i) in surface.local_node_indices.iter().enumerate() {
        let j = i * m;
        for d in 0..m {
            h[(d, j + d)] = n[k];
        }
    }
    h
}

fn element_coordinate_matrix(mesh: &Mesh, element: &Element) -> RealMatrix {
    mesh.coordinate_matrix(&element.node_indices)
}

fn surface_coordinate_matrix(mesh: &Mesh, surface: &Surface) -> RealMatrix {
    mesh.coordinate_matrix(&surface.global_node_indices)
}

/// The element stiffness matrix `K = integral(B^T D B) dV`.
pub fn stiffness_matrix(mesh: &Mesh, element: &Element) -> Result<RealMatrix> {
    let dof_count = element.element_type.dof_count();
    let mut k = RealMatrix::zeros(dof_count, dof_count);
    let d = stress_strain_matrix(element);
    let x = element_coordinate_matrix(mesh, element);
    let (int_pts, weights) = iso::integration_points(element);
    for row in 0..int_pts.nrows() {
        let int_pt = int_pts.row(row).transpose();
        let weight = weights[row];
        let (coord, n, nx, vol) = iso::evaluate_element(element, &x, &int_pt, weight)?;
        let b = strain_displacement_matrix(element, &coord, &n, &nx);
        k += b.transpose() * &d * &b * vol;
    }
    Ok(k)
}

/// The element (consistent) mass matrix `M = integral(H^T H rho) dV`.
pub fn mass_matrix(mesh: &Mesh, element: &Element) -> Result<RealMatrix> {
    let dof_count = element.element_type.dof_count();
    let mut m = RealMatrix::zeros(dof_count, dof_count);
    let x = element_coordinate_matrix(mesh, element);
    let rho = element.material().density;
    let (int_pts, weights) = iso::integration_points(element);
    for row in 0..int_pts.nrows() {
        let int_pt = int_pts.row(row).transpose();
        let weight = weights[row];
        let (_, n, _, vol) = iso::evaluate_element(element, &x, &int_pt, weight)?;
        let h = interpolation_matrix_element(element, &n);
        m += h.transpose() * &h * (rho * vol);
    }
    Ok(m)
}

/// The element stress-stiffness (geometric stiffness) matrix, evaluated at
/// the prior static displacement state `(Ua, Ub)` using an updated-Lagrange
/// coordinate update.
pub fn stress_stiffness_matrix(
    mesh: &Mesh,
    element: &Element,
    ua: &RealVector,
    ub: &RealVector,
) -> Result<RealMatrix> {
    let dof_count = element.element_type.dof_count();
    let node_count = element.element_type.node_count();
    let count = dof_count / node_count;
    let mut s = RealMatrix::zeros(dof_count, dof_count);
    let d = stress_strain_matrix(element);
    let mut x = element_coordinate_matrix(mesh, element);
    let vec_u = displacement_vector(element, ua, ub);
    let mat_u = displacement_matrix(element, &vec_u);
    x += mat_u;

    let (int_pts, weights) = iso::integration_points(element);
    for row in 0..int_pts.nrows() {
        let int_pt = int_pts.row(row).transpose();
        let weight = weights[row];
        let (coord, n, nx, vol) = iso::evaluate_element(element, &x, &int_pt, weight)?;
        let b = strain_displacement_matrix(element, &coord, &n, &nx);
        let eps = &b * &vec_u;
        let sigma = &d * eps;

        let mut g = RealMatrix::zeros(9, dof_count);
        for i in 0..node_count {
            for j in 0..count {
                for k in 0..count {
                    g[(k * 3 + j, i * count + j)] = nx[(k, i)];
                }
            }
        }

        let (s11, s22, s33, s23, s31, s12) = match element.section().section_type {
            SectionType::PlaneStress => (sigma[0], sigma[1], 0.0, 0.0, 0.0, sigma[2]),
            SectionType::PlaneStrain | SectionType::Axisymmetric => {
                (sigma[0], sigma[1], sigma[2], 0.0, 0.0, sigma[3])
            }
            SectionType::General => {
                (sigma[0], sigma[1], sigma[2], sigma[3], sigma[4], sigma[5])
            }
        };
        #[rustfmt::skip]
        let big_sigma = RealMatrix::from_row_slice(9, 9, &[
            s11, 0.0, 0.0, s12, 0.0, 0.0, s31, 0.0, 0.0,
            0.0, s11, 0.0, 0.0, s12, 0.0, 0.0, s31, 0.0,
            0.0, 0.0, s11, 0.0, 0.0, s12, 0.0, 0.0, s31,
            s12, 0.0, 0.0, s22, 0.0, 0.0, s23, 0.0, 0.0,
            0.0, s12, 0.0, 0.0, s22, 0.0, 0.0, s23, 0.0,
            0.0, 0.0, s12, 0.0, 0.0, s22, 0.0, 0.0, s23,
            s31, 0.0, 0.0, s23, 0.0, 0.0, s33, 0.0, 0.0,
            0.0, s31, 0.0, 0.0, s23, 0.0, 0.0, s33, 0.0,
            0.0, 0.0, s31, 0.0, 0.0, s23, 0.0, 0.0, s33,
        ]);
        s += g.transpose() * &big_sigma * &g * vol;
    }
    Ok(s)
}

/// The element surface load vector, sized to the parent's DOF count. Pass
/// `magnitude != 0.0` for a pressure, or non-zero `components` for a
/// traction (never both for the same physical load).
pub fn surface_load_vector(
    mesh: &Mesh,
    surface: &Surface,
    magnitude: Real,
    components: [Real; 3],
) -> Result<RealVector> {
    let mut ps = RealVector::zeros(surface.parent_dof_count);
    let xs = surface_coordinate_matrix(mesh, surface);
    let (int_pts, weights) = iso::integration_points(surface);
    let m = surface.parent_modeling_space.value();
    for row in 0..int_pts.nrows() {
        let int_pt = int_pts.row(row).transpose();
        let weight = weights[row];
        let (_, n, normal, area) = iso::evaluate_surface(surface, &xs, &int_pt, weight)?;
        let hs = interpolation_matrix_surface(surface, &n);
        let mut fs = RealVector::zeros(m);
        for d in 0..m {
            fs[d] = -normal[d] * magnitude + components[d];
        }
        ps += hs.transpose() * fs * area;
    }
    Ok(ps)
}

/// The element body load vector (e.g. gravity/acceleration or a raw per-
/// volume body force).
pub fn body_load_vector(mesh: &Mesh, element: &Element, components: [Real; 3]) -> Result<RealVector> {
    let m = element.element_type.modeling_space().value();
    let mut fb = RealVector::zeros(m);
    for d in 0..m {
        fb[d] = components[d];
    }
    let mut pb = RealVector::zeros(element.element_type.dof_count());
    let x = element_coordinate_matrix(mesh, element);
    let (int_pts, weights) = iso::integration_points(element);
    for row in 0..int_pts.nrows() {
        let int_pt = int_pts.row(row).transpose();
        let weight = weights[row];
        let (_, n, _, vol) = iso::evaluate_element(element, &x, &int_pt, weight)?;
        let h = interpolation_matrix_element(element, &n);
        pb += h.transpose() * &fb * vol;
    }
    Ok(pb)
}

/// The element internal force vector, plus the strain/stress components at
/// each integration point (columns of the returned matrices).
pub fn internal_force_vector(
    mesh: &Mesh,
    element: &Element,
    ua: &RealVector,
    ub: &RealVector,
) -> Result<(RealVector, RealMatrix, RealMatrix)> {
    let (int_pts, weights) = iso::integration_points(element);
    let mut f = RealVector::zeros(element.element_type.dof_count());
    let d = stress_strain_matrix(element);
    let x = element_coordinate_matrix(mesh, element);
    let u = displacement_vector(element, ua, ub);
    let mut eps = RealMatrix::zeros(d.ncols(), int_pts.nrows());
    let mut sigma = RealMatrix::zeros(d.nrows(), int_pts.nrows());
    for row in 0..int_pts.nrows() {
        let int_pt = int_pts.row(row).transpose();
        let weight = weights[row];
        let (coord, n, nx, vol) = iso::evaluate_element(element, &x, &int_pt, weight)?;
        let b = strain_displacement_matrix(element, &coord, &n, &nx);
        let eps_col = &b * &u;
        let sigma_col = &d * &eps_col;
        eps.set_column(row, &eps_col);
        sigma.set_column(row, &sigma_col);
        f += b.transpose() * &sigma_col * vol;
    }
    Ok((f, eps, sigma))
}

//-----------------------------------------------------------------------------------------------
// ASSEMBLAGE
//-----------------------------------------------------------------------------------------------

/// The four static-condensation blocks of an assembled matrix, in CSR form.
pub struct MatrixBlocks {
    pub aa: CsrMatrix<Real>,
    pub ab: CsrMatrix<Real>,
    pub ba: CsrMatrix<Real>,
    pub bb: CsrMatrix<Real>,
}

/// Scatters a sequence of dense element matrices into the four
/// active/inactive system blocks.
pub fn assemble_matrix(
    elements: &[&Element],
    matrices: &[RealMatrix],
    active_dof_count: usize,
    inactive_dof_count: usize,
) -> MatrixBlocks {
    let mut aa = SparseMatrixBuilder::new(active_dof_count);
    let mut bb = SparseMatrixBuilder::new(inactive_dof_count);

    // The off-diagonal blocks are rectangular; SparseMatrixBuilder only
    // handles square matrices, so their triplets are routed straight to
    // `nalgebra_sparse::CooMatrix` below instead.
    let mut ab_triplets: Vec<(usize, usize, Real)> = Vec::new();
    let mut ba_triplets: Vec<(usize, usize, Real)> = Vec::new();

    for (&element, a) in elements.iter().zip(matrices) {
        let al = element.active_local_dofs();
        let ag = element.active_global_dofs();
        let il = element.inactive_local_dofs();
        let ig = element.inactive_global_dofs();

        for (pi, &li) in al.iter().enumerate() {
            for (pj, &lj) in al.iter().enumerate() {
                aa.add(ag[pi], ag[pj], a[(li, lj)]);
            }
            for (pj, &lj) in il.iter().enumerate() {
                let v = a[(li, lj)];
                if v.abs() > 1e-15 {
                    ab_triplets.push((ag[pi], ig[pj], v));
                }
            }
        }
        for (pi, &li) in il.iter().enumerate() {
            for (pj, &lj) in al.iter().enumerate() {
                let v = a[(li, lj)];
                if v.abs() > 1e-15 {
                    ba_triplets.push((ig[pi], ag[pj], v));
                }
            }
            for (pj, &lj) in il.iter().enumerate() {
                bb.add(ig[pi], ig[pj], a[(li, lj)]);
            }
        }
    }

    // ab/ba share the same rectangular-COO-to-CSR recipe as the square
    // builder; route them through a throwaway square builder per side of the
    // larger dimension, then crop via `nalgebra_sparse`'s COO constructor.
    let ab_csr = {
        let mut coo = nalgebra_sparse::CooMatrix::new(active_dof_count, inactive_dof_count);
        for (r, c, v) in ab_triplets {
            coo.push(r, c, v);
        }
        CsrMatrix::from(&coo)
    };
    let ba_csr = {
        let mut coo = nalgebra_sparse::CooMatrix::new(inactive_dof_count, active_dof_count);
        for (r, c, v) in ba_triplets {
            coo.push(r, c, v);
        }
        CsrMatrix::from(&coo)
    };

    MatrixBlocks {
        aa: aa.to_csr(),
        ab: ab_csr,
        ba: ba_csr,
        bb: bb.to_csr(),
    }
}

/// Scatters a sequence of dense element vectors into the active/inactive
/// system vectors.
pub fn assemble_vector(
    elements: &[&Element],
    vectors: &[RealVector],
    active_dof_count: usize,
    inactive_dof_count: usize,
) -> (RealVector, RealVector) {
    let mut va = RealVector::zeros(active_dof_count);
    let mut vb = RealVector::zeros(inactive_dof_count);
    for (&element, v) in elements.iter().zip(vectors) {
        for (&local, &global) in element
            .active_local_dofs()
            .iter()
            .zip(element.active_global_dofs())
        {
            va[global] += v[local];
        }
        for (&local, &global) in element
            .inactive_local_dofs()
            .iter()
            .zip(element.inactive_global_dofs())
        {
            vb[global] += v[local];
        }
    }
    (va, vb)
}

pub fn assemble_stiffness_matrix(mdb: &Mdb, processes: usize) -> Result<MatrixBlocks> {
    let mesh = mdb.mesh();
    let elements: Vec<&Element> = mesh.elements().iter().collect();
    let matrices: Vec<RealMatrix> = parallel_map(&elements, processes, |&element| {
        stiffness_matrix(mesh, element).expect("stiffness matrix evaluation failed")
    });
    Ok(assemble_matrix(
        &elements,
        &matrices,
        mesh.active_dof_count(),
        mesh.inactive_dof_count(),
    ))
}

pub fn assemble_mass_matrix(mdb: &Mdb, processes: usize) -> Result<MatrixBlocks> {
    let mesh = mdb.mesh();
    let elements: Vec<&Element> = mesh.elements().iter().collect();
    let matrices: Vec<RealMatrix> = parallel_map(&elements, processes, |&element| {
        mass_matrix(mesh, element).expect("mass matrix evaluation failed")
    });
    Ok(assemble_matrix(
        &elements,
        &matrices,
        mesh.active_dof_count(),
        mesh.inactive_dof_count(),
    ))
}

pub fn assemble_stress_stiffness_matrix(
    mdb: &Mdb,
    ua: &RealVector,
    ub: &RealVector,
    processes: usize,
) -> Result<MatrixBlocks> {
    let mesh = mdb.mesh();
    let elements: Vec<&Element> = mesh.elements().iter().collect();
    let matrices: Vec<RealMatrix> = parallel_map(&elements, processes, |&element| {
        stress_stiffness_matrix(mesh, element, ua, ub).expect("stress-stiffness evaluation failed")
    });
    Ok(assemble_matrix(
        &elements,
        &matrices,
        mesh.active_dof_count(),
        mesh.inactive_dof_count(),
    ))
}

pub fn assemble_concentrated_load_vector(mdb: &Mdb) -> RealVector {
    let mesh = mdb.mesh();
    let mut pc = RealVector::zeros(mesh.active_dof_count());
    for load in mdb.concentrated_loads().values() {
        let f = load.components();
        if let Some(nodes) = mdb.node_sets().get(&load.region).map(|s| s.indices.as_slice()) {
            for &node_index in nodes {
                let node = &mesh.nodes()[node_index];
                for (&local, &global) in node.active_local_dofs().iter().zip(node.active_global_dofs()) {
                    pc[global] += f[local];
                }
            }
        }
    }
    pc
}

pub fn assemble_surface_load_vector(mdb: &Mdb, processes: usize) -> Result<RealVector> {
    let mesh = mdb.mesh();
    let mut surfaces: Vec<Surface> = Vec::new();
    let mut magnitudes: Vec<Real> = Vec::new();
    let mut components: Vec<[Real; 3]> = Vec::new();
    let mut owning_elements: Vec<&Element> = Vec::new();

    for pressure in mdb.pressures().values() {
        if let Some(set) = mdb.surface_sets().get(&pressure.region) {
            for &(element_index, surface_index) in &set.pairs {
                let element = &mesh.elements()[element_index];
                surfaces.push(Surface::new(element, surface_index));
                magnitudes.push(pressure.magnitude);
                components.push([0.0, 0.0, 0.0]);
                owning_elements.push(element);
            }
        }
    }
    for traction in mdb.surface_tractions().values() {
        if let Some(set) = mdb.surface_sets().get(&traction.region) {
            for &(element_index, surface_index) in &set.pairs {
                let element = &mesh.elements()[element_index];
                surfaces.push(Surface::new(element, surface_index));
                magnitudes.push(0.0);
                components.push(traction.components());
                owning_elements.push(element);
            }
        }
    }

    let indices: Vec<usize> = (0..surfaces.len()).collect();
    let vectors: Vec<RealVector> = parallel_map(&indices, processes, |&i| {
        surface_load_vector(mesh, &surfaces[i], magnitudes[i], components[i])
            .expect("surface load evaluation failed")
    });
    let (ps, _) = assemble_vector(
        &owning_elements,
        &vectors,
        mesh.active_dof_count(),
        mesh.inactive_dof_count(),
    );
    Ok(ps)
}

pub fn assemble_body_load_vector(mdb: &Mdb, processes: usize) -> Result<RealVector> {
    let mesh = mdb.mesh();
    let mut elements: Vec<&Element> = Vec::new();
    let mut components: Vec<[Real; 3]> = Vec::new();

    for acceleration in mdb.accelerations().values() {
        if let Some(set) = mdb.element_sets().get(&acceleration.region) {
            for &element_index in &set.indices {
                let element = &mesh.elements()[element_index];
                let rho = element.material().density;
                let a = acceleration.components();
                elements.push(element);
                components.push([rho * a[0], rho * a[1], rho * a[2]]);
            }
        }
    }
    for body_load in mdb.body_loads().values() {
        if let Some(set) = mdb.element_sets().get(&body_load.region) {
            for &element_index in &set.indices {
                elements.push(&mesh.elements()[element_index]);
                components.push(body_load.components());
            }
        }
    }

    let indices: Vec<usize> = (0..elements.len()).collect();
    let vectors: Vec<RealVector> = parallel_map(&indices, processes, |&i| {
        body_load_vector(mesh, elements[i], components[i]).expect("body load evaluation failed")
    });
    let (pb, _) = assemble_vector(&elements, &vectors, mesh.active_dof_count(), mesh.inactive_dof_count());
    Ok(pb)
}

pub fn assemble_internal_force_vector(
    mdb: &Mdb,
    ua: &RealVector,
    ub: &RealVector,
    processes: usize,
) -> Result<(RealVector, RealVector, Vec<RealMatrix>, Vec<RealMatrix>)> {
    let mesh = mdb.mesh();
    let elements: Vec<&Element> = mesh.elements().iter().collect();
    let results: Vec<(RealVector, RealMatrix, RealMatrix)> = parallel_map(&elements, processes, |&element| {
        internal_force_vector(mesh, element, ua, ub).expect("internal force evaluation failed")
    });
    let vectors: Vec<RealVector> = results.iter().map(|r| r.0.clone()).collect();
    let eps: Vec<RealMatrix> = results.iter().map(|r| r.1.clone()).collect();
    let sigma: Vec<RealMatrix> = results.into_iter().map(|r| r.2).collect();
    let (fa, fb) = assemble_vector(&elements, &vectors, mesh.active_dof_count(), mesh.inactive_dof_count());
    Ok((fa, fb, eps, sigma))
}

pub fn assemble_prescribed_displacement_vector(mdb: &Mdb) -> RealVector {
    let mesh = mdb.mesh();
    let mut ub = RealVector::zeros(mesh.inactive_dof_count());
    for bc in mdb.boundary_conditions().values() {
        let mut u = [0.0; 3];
        for d in bc.dofs() {
            u[d] = bc.value(d);
        }
        if let Some(nodes) = mdb.node_sets().get(&bc.region).map(|s| s.indices.as_slice()) {
            for &node_index in nodes {
                let node = &mesh.nodes()[node_index];
                for (&local, &global) in node.inactive_local_dofs().iter().zip(node.inactive_global_dofs()) {
                    ub[global] = u[local];
                }
            }
        }
    }
    ub
}

//-----------------------------------------------------------------------------------------------
// POST-PROCESSING
//-----------------------------------------------------------------------------------------------

/// Computes principal strains (10 rows: `e11 e22 e33 e23 e31 e12 e1 e2 e3
/// eMajor`) from the 3/4/6-row basic strain components, per column
/// (integration point or node).
pub fn extend_element_strain(element: &Element, eps_old: &RealMatrix) -> RealMatrix {
    extend_symmetric_tensor(element.section(), eps_old, false)
}

/// Computes principal and equivalent stresses (13 rows: `s11 s22 s33 s23 s31
/// s12 s1 s2 s3 sMajor sTresca sMises sPressure`).
pub fn extend_element_stress(element: &Element, sigma_old: &RealMatrix) -> RealMatrix {
    extend_symmetric_tensor(element.section(), sigma_old, true)
}

fn extend_symmetric_tensor(section: &Section, old: &RealMatrix, is_stress: bool) -> RealMatrix {
    let cols = old.ncols();
    let extra_rows = if is_stress { 13 } else { 10 };
    let mut new = RealMatrix::zeros(extra_rows, cols);
    for i in 0..cols {
        let (c11, c22, c33, c23, c31, c12) = match section.section_type {
            SectionType::PlaneStress => (old[(0, i)], old[(1, i)], 0.0, 0.0, 0.0, old[(2, i)]),
            SectionType::PlaneStrain | SectionType::Axisymmetric => {
                (old[(0, i)], old[(1, i)], old[(2, i)], 0.0, 0.0, old[(3, i)])
            }
            SectionType::General => (
                old[(0, i)],
                old[(1, i)],
                old[(2, i)],
                old[(3, i)],
                old[(4, i)],
                old[(5, i)],
            ),
        };

        let (d11, d22, d33, d23, d31, d12) = if is_stress {
            (c11, c22, c33, c23, c31, c12)
        } else {
            (c11, c22, c33, 0.5 * c23, 0.5 * c31, 0.5 * c12)
        };
        let tensor = RealMatrix::from_row_slice(
            3,
            3,
            &[d11, d12, d31, d12, d22, d23, d31, d23, d33],
        );
        let eigen = tensor.symmetric_eigen();
        let mut values = [eigen.eigenvalues[0], eigen.eigenvalues[1], eigen.eigenvalues[2]];
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let (v3, v2, v1) = (values[0], values[1], values[2]);
        // First max-abs match wins ties (matches np.argmax on the ascending
        // eigenvalue array), not the last.
        let mut major = values[0];
        let mut major_abs = major.abs();
        for &v in &values[1..] {
            if v.abs() > major_abs {
                major = v;
                major_abs = v.abs();
            }
        }

        if is_stress {
            let tresca = (v1 - v3).abs();
            let mises = (0.5 * ((v1 - v2).powi(2) + (v2 - v3).powi(2) + (v3 - v1).powi(2))).sqrt();
            let pressure = -(c11 + c22 + c33) / 3.0;
            let col = [
                c11, c22, c33, c23, c31, c12, v1, v2, v3, major, tresca, mises, pressure,
            ];
            new.set_column(i, &RealVector::from_row_slice(&col));
        } else {
            let col = [c11, c22, c33, c23, c31, c12, v1, v2, v3, major];
            new.set_column(i, &RealVector::from_row_slice(&col));
        }
    }
    new
}

pub fn extend_strain(mdb: &Mdb, eps: &[RealMatrix], processes: usize) -> Vec<RealMatrix> {
    let elements: Vec<&Element> = mdb.mesh().elements().iter().collect();
    let indices: Vec<usize> = (0..elements.len()).collect();
    parallel_map(&indices, processes, |&i| extend_element_strain(elements[i], &eps[i]))
}

pub fn extend_stress(mdb: &Mdb, sigma: &[RealMatrix], processes: usize) -> Vec<RealMatrix> {
    let elements: Vec<&Element> = mdb.mesh().elements().iter().collect();
    let indices: Vec<usize> = (0..elements.len()).collect();
    parallel_map(&indices, processes, |&i| extend_element_stress(elements[i], &sigma[i]))
}

/// Extrapolates a field from the element's integration points to its nodes,
/// by least-squares fit of the polynomial named by
/// [`iso::extrapolation_approach`] followed by evaluation at the nodes.
pub fn extrapolate_within_element(element: &Element, phi_i: &RealMatrix) -> RealMatrix {
    let ci = iso::integration_points(element).0;
    let cj = iso::nodes(element);
    let ni = ci.nrows();
    let nj = cj.nrows();
    let n_measures = phi_i.nrows();

    let ones_i = RealVector::from_element(ni, 1.0);
    let ones_j = RealVector::from_element(nj, 1.0);

    let approach = iso::extrapolation_approach(element);
    if approach == "constant" {
        let mut phi_j = RealMatrix::zeros(n_measures, nj);
        for m in 0..n_measures {
            let v = phi_i[(m, 0)];
            for j in 0..nj {
                phi_j[(m, j)] = v;
            }
        }
        return phi_j;
    }

    let columns_i: Vec<RealVector> = match approach {
        "linear in r" => vec![ones_i.clone(), ci.column(0).into_owned()],
        "linear in t" => vec![ones_i.clone(), ci.column(2).into_owned()],
        "bilinear in r, s" => {
            let r = ci.column(0).into_owned();
            let s = ci.column(1).into_owned();
            let rs = r.component_mul(&s);
            vec![ones_i.clone(), r, s, rs]
        }
        "trilinear in r, s, t" => {
            let r = ci.column(0).into_owned();
            let s = ci.column(1).into_owned();
            let t = ci.column(2).into_owned();
            let rs = r.component_mul(&s);
            let st = s.component_mul(&t);
            let tr = t.component_mul(&r);
            let rst = rs.component_mul(&t);
            vec![ones_i.clone(), r, s, t, rs, st, tr, rst]
        }
        _ => unreachable!("unknown extrapolation approach"),
    };
    let columns_j: Vec<RealVector> = match approach {
        "linear in r" => vec![ones_j.clone(), cj.column(0).into_owned()],
        "linear in t" => vec![ones_j.clone(), cj.column(2).into_owned()],
        "bilinear in r, s" => {
            let r = cj.column(0).into_owned();
            let s = cj.column(1).into_owned();
            let rs = r.component_mul(&s);
            vec![ones_j.clone(), r, s, rs]
        }
        "trilinear in r, s, t" => {
            let r = cj.column(0).into_owned();
            let s = cj.column(1).into_owned();
            let t = cj.column(2).into_owned();
            let rs = r.component_mul(&s);
            let st = s.component_mul(&t);
            let tr = t.component_mul(&r);
            let rst = rs.component_mul(&t);
            vec![ones_j.clone(), r, s, t, rs, st, tr, rst]
        }
        _ => unreachable!("unknown extrapolation approach"),
    };

    let terms = columns_i.len();
    let mut a = RealMatrix::zeros(ni, terms);
    for (col, v) in columns_i.iter().enumerate() {
        a.set_column(col, v);
    }

    let mut phi_j = RealMatrix::zeros(n_measures, nj);
    let svd = a.clone().svd(true, true);
    for m in 0..n_measures {
        let rhs = phi_i.row(m).transpose().into_owned();
        let p = svd
            .solve(&rhs, 1e-12)
            .expect("least-squares extrapolation fit failed");
        let mut row = RealVector::zeros(nj);
        for (col, v) in columns_j.iter().enumerate() {
            row += v * p[col];
        }
        phi_j.set_row(m, &row.transpose());
    }
    phi_j
}

pub fn extrapolate(mdb: &Mdb, phi_ips: &[RealMatrix], processes: usize) -> Vec<RealMatrix> {
    let elements: Vec<&Element> = mdb.mesh().elements().iter().collect();
    let indices: Vec<usize> = (0..elements.len()).collect();
    parallel_map(&indices, processes, |&i| {
        extrapolate_within_element(elements[i], &phi_ips[i])
    })
}

/// Averages extrapolated per-element-node values onto the shared mesh nodes.
pub fn smoothing(mdb: &Mdb, phi_nds: &[RealMatrix]) -> RealMatrix {
    let mesh = mdb.mesh();
    let n = phi_nds[0].nrows();
    let mut phi_msh = RealMatrix::zeros(mesh.node_count(), n);
    for element in mesh.elements() {
        let contribution = &phi_nds[element.index()];
        for (local, &global) in element.node_indices.iter().enumerate() {
            for row in 0..n {
                phi_msh[(global, row)] += contribution[(row, local)];
            }
        }
    }
    for node in mesh.nodes() {
        let count = mesh.node_to_elements(node.index()).len() as Real;
        for row in 0..n {
            phi_msh[(node.index(), row)] /= count;
        }
    }
    phi_msh
}

/// Converts the global active/inactive vector pair into a per-node `(x, y,
/// z, magnitude)` matrix.
pub fn unshuffle_vector(mdb: &Mdb, va: Option<&RealVector>, vb: Option<&RealVector>) -> RealMatrix {
    let mesh = mdb.mesh();
    let zero_a = RealVector::zeros(mesh.active_dof_count());
    let zero_b = RealVector::zeros(mesh.inactive_dof_count());
    let va = va.unwrap_or(&zero_a);
    let vb = vb.unwrap_or(&zero_b);
    let mut matrix = RealMatrix::zeros(mesh.node_count(), 4);
    for node in mesh.nodes() {
        for (&local, &global) in node.active_local_dofs().iter().zip(node.active_global_dofs()) {
            matrix[(node.index(), local)] = va[global];
        }
        for (&local, &global) in node.inactive_local_dofs().iter().zip(node.inactive_global_dofs()) {
            matrix[(node.index(), local)] = vb[global];
        }
    }
    for i in 0..mesh.node_count() {
        let (x, y, z) = (matrix[(i, 0)], matrix[(i, 1)], matrix[(i, 2)]);
        matrix[(i, 3)] = (x * x + y * y + z * z).sqrt();
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundaryCondition, ElementType, Mdb, Mesh, Section, SectionType};
    use crate::types::ModelingSpace;
    use approx::assert_relative_eq;

    fn unit_square_mdb() -> Mdb {
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
        let mut mdb = Mdb::new(mesh);
        mdb.node_set("left", [0, 3]).unwrap();
        mdb.node_set("right", [1, 2]).unwrap();
        mdb.element_set("all", [0]).unwrap();
        mdb.material("steel", 200e9, 0.3, 7850.0).unwrap();
        mdb.section(
            "sec",
            Section::new("all", "steel", SectionType::PlaneStress, 1.0, false),
        )
        .unwrap();
        mdb.boundary_condition(
            "fix",
            BoundaryCondition::new("left", Some(0.0), Some(0.0), None),
        )
        .unwrap();
        mdb.assign_element_properties().unwrap();
        mdb.build_dofs().unwrap();
        mdb
    }

    #[test]
    fn stiffness_matrix_is_symmetric() {
        let mdb = unit_square_mdb();
        let element = &mdb.mesh().elements()[0];
        let k = stiffness_matrix(mdb.mesh(), element).unwrap();
        for i in 0..k.nrows() {
            for j in 0..k.ncols() {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn mass_matrix_is_symmetric_and_positive_diagonal() {
        let mdb = unit_square_mdb();
        let element = &mdb.mesh().elements()[0];
        let m = mass_matrix(mdb.mesh(), element).unwrap();
        for i in 0..m.nrows() {
            assert!(m[(i, i)] > 0.0);
            for j in 0..m.ncols() {
                assert_relative_eq!(m[(i, j)], m[(j, i)], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn assembled_stiffness_matches_manual_condensation() {
        let mdb = unit_square_mdb();
        let blocks = assemble_stiffness_matrix(&mdb, 1).unwrap();
        assert_eq!(blocks.aa.nrows(), mdb.mesh().active_dof_count());
        assert_eq!(blocks.bb.nrows(), mdb.mesh().inactive_dof_count());
    }

    #[test]
    fn parallel_map_matches_sequential() {
        let items: Vec<i32> = (0..37).collect();
        let seq: Vec<i32> = parallel_map(&items, 1, |&x| x * 2);
        let par: Vec<i32> = parallel_map(&items, 4, |&x| x * 2);
        assert_eq!(seq, par);
    }
}
