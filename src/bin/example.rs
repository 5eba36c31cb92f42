//! A minimal end-to-end example: a cantilevered plane-stress plate, meshed
//! with a grid of four-node quadrilaterals, fixed along its left edge and
//! loaded with a concentrated tip force. Runs a static analysis and prints
//! the resulting tip displacement.

use feapack_rs::prelude::*;
use feapack_rs::solver::odb::{Odb, OdbMode};

/// Builds an `nx` by `ny` grid of unit-square `Plane4` elements spanning
/// `[0, length] x [0, height]`.
fn cantilever_plate(length: f64, height: f64, nx: usize, ny: usize) -> Mesh {
    let mut coords = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            let x = length * i as f64 / nx as f64;
            let y = height * j as f64 / ny as f64;
            coords.push([x, y, 0.0]);
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

    Mesh::new(coords, connectivity, ModelingSpace::TwoDimensional)
}

fn main() {
    let length = 5.0;
    let height = 1.0;
    let (nx, ny) = (20, 4);

    let mesh = cantilever_plate(length, height, nx, ny);
    let mut mdb = Mdb::new(mesh);

    let left_nodes: Vec<usize> = (0..=ny).map(|j| j * (nx + 1)).collect();
    let tip_node = ny / 2 * (nx + 1) + nx;

    mdb.node_set("fixed_end", left_nodes).unwrap();
    mdb.node_set("tip", [tip_node]).unwrap();
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
    mdb.concentrated_load("tip_load", ConcentratedLoad::new("tip", 0.0, -1.0e4, 0.0))
        .unwrap();

    let options = RunOptions {
        job_name: Some("cantilever".to_string()),
        ..RunOptions::default()
    };
    solve(&mut mdb, Analysis::Static, options).expect("static analysis failed");

    let mut odb = Odb::new("cantilever.out", OdbMode::Read, false).expect("failed to open output");
    odb.go_to_last_frame();
    let dy = odb
        .node_output_values("Displacement>Displacement in Y")
        .expect("missing displacement field");
    println!("Tip displacement (node {tip_node}): {:.6} m", dy[tip_node]);
}
