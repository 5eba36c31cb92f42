//! Benchmarks for the FEA solver's assembly and solution procedures.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use feapack_rs::prelude::*;
use feapack_rs::solver::procedures as pro;

/// An `nx` by `ny` grid of unit-square `Plane4` elements, fixed along the
/// left edge and loaded with a concentrated force along the right edge, with
/// DOFs and element properties already built.
fn cantilever_plate(nx: usize, ny: usize) -> Mdb {
    let mut coords = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            coords.push([i as f64, j as f64, 0.0]);
        }
    }

    let node_index = |i: usize, j: usize| j * (nx + 1) + i;
    let mut connectivity = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            connectivity.push((
                ElementType::Plane4,
                vec![
                    node_index(i, j),
                    node_index(i + 1, j),
                    node_index(i + 1, j + 1),
                    node_index(i, j + 1),
                ],
            ));
        }
    }

    let mesh = Mesh::new(coords, connectivity, ModelingSpace::TwoDimensional);
    let mut mdb = Mdb::new(mesh);

    let left_nodes: Vec<usize> = (0..=ny).map(|j| j * (nx + 1)).collect();
    let tip_nodes: Vec<usize> = (0..=ny).map(|j| j * (nx + 1) + nx).collect();

    mdb.node_set("fixed_end", left_nodes).unwrap();
    mdb.node_set("free_end", tip_nodes).unwrap();
    mdb.element_set("all", 0..mdb.mesh().element_count()).unwrap();

    mdb.material("steel", 200.0e9, 0.3, 7850.0).unwrap();
    mdb.section(
        "plate",
        Section::new("all", "steel", SectionType::PlaneStress, 0.02, false),
    )
    .unwrap();

    mdb.boundary_condition(
        "clamp",
        BoundaryCondition::new("fixed_end", Some(0.0), Some(0.0), None),
    )
    .unwrap();
    mdb.concentrated_load("tip_load", ConcentratedLoad::new("free_end", 0.0, -1.0e3, 0.0))
        .unwrap();

    mdb.build_dofs().unwrap();
    mdb.assign_element_properties().unwrap();
    mdb
}

fn benchmark_stiffness_assembly(c: &mut Criterion) {
    let mdb = cantilever_plate(20, 4);
    c.bench_function("assemble_stiffness_20x4", |b| {
        b.iter(|| {
            let k = pro::assemble_stiffness_matrix(&mdb, 1).unwrap();
            black_box(k);
        })
    });
}

fn benchmark_stiffness_assembly_parallel(c: &mut Criterion) {
    let mdb = cantilever_plate(60, 10);
    c.bench_function("assemble_stiffness_60x10_parallel4", |b| {
        b.iter(|| {
            let k = pro::assemble_stiffness_matrix(&mdb, 4).unwrap();
            black_box(k);
        })
    });
}

fn benchmark_static_solve(c: &mut Criterion) {
    let mdb = cantilever_plate(20, 4);
    c.bench_function("static_solve_20x4", |b| {
        b.iter(|| {
            let k = pro::assemble_stiffness_matrix(&mdb, 1).unwrap();
            let mut pa = RealVector::zeros(mdb.mesh().active_dof_count());
            pa += pro::assemble_concentrated_load_vector(&mdb);
            let ub = pro::assemble_prescribed_displacement_vector(&mdb);
            let rhs = pa - feapack_rs::solver::linalg::spmatmul(&k.ab, &ub);
            let ua = feapack_rs::solver::linalg::spsolve(&k.aa, &rhs).unwrap();
            black_box(ua);
        })
    });
}

fn benchmark_medium_plate(c: &mut Criterion) {
    c.bench_function("assemble_stiffness_100x20", |b| {
        b.iter(|| {
            let mdb = cantilever_plate(100, 20);
            let k = pro::assemble_stiffness_matrix(&mdb, 1).unwrap();
            black_box(k);
        })
    });
}

criterion_group!(
    benches,
    benchmark_stiffness_assembly,
    benchmark_stiffness_assembly_parallel,
    benchmark_static_solve,
    benchmark_medium_plate,
);

criterion_main!(benches);
