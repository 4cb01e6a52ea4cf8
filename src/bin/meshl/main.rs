//! meshl CLI - build a generated mesh and run kernel operations on it.
//!
//! Usage: meshl <COMMAND> [OPTIONS] <SHAPE>
//!
//! Run `meshl --help` for available commands. Set `RUST_LOG=debug` to see
//! each Euler operator as it runs.

use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use meshl::euler::EulerOps;
use meshl::mesh::{cube, grid, tetrahedron, BoundaryLoopOptions, Mesh, VertexId};

#[derive(Parser)]
#[command(name = "meshl")]
#[command(author, version, about = "Half-edge mesh kernel CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Generated shape
        #[arg(value_enum)]
        shape: Shape,

        /// Grid cells along X
        #[arg(long, default_value = "4")]
        nx: usize,

        /// Grid cells along Y
        #[arg(long, default_value = "4")]
        ny: usize,

        /// Normalize into the unit box before printing
        #[arg(long)]
        normalize: bool,
    },

    /// Split every edge with a new vertex, then remove those vertices again
    Euler {
        /// Generated shape
        #[arg(value_enum)]
        shape: Shape,

        /// Grid cells along X
        #[arg(long, default_value = "4")]
        nx: usize,

        /// Grid cells along Y
        #[arg(long, default_value = "4")]
        ny: usize,
    },

    /// Trace the boundary loop and pick its corners
    Boundary {
        /// Generated shape
        #[arg(value_enum)]
        shape: Shape,

        /// Grid cells along X
        #[arg(long, default_value = "4")]
        nx: usize,

        /// Grid cells along Y
        #[arg(long, default_value = "4")]
        ny: usize,

        /// Number of corners to select
        #[arg(short, long, default_value = "4")]
        corners: usize,

        /// Punch out the first face before tracing
        #[arg(long)]
        hole: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Shape {
    /// Regular tetrahedron
    Tetrahedron,
    /// Unit cube of six quads
    Cube,
    /// Flat grid of quads
    Grid,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info {
            shape,
            nx,
            ny,
            normalize,
        } => {
            cmd_info(build(shape, nx, ny), normalize);
        }

        Commands::Euler { shape, nx, ny } => {
            cmd_euler(build(shape, nx, ny))?;
        }

        Commands::Boundary {
            shape,
            nx,
            ny,
            corners,
            hole,
        } => {
            cmd_boundary(build(shape, nx, ny), corners, hole)?;
        }
    }

    Ok(())
}

fn build(shape: Shape, nx: usize, ny: usize) -> Mesh {
    match shape {
        Shape::Tetrahedron => tetrahedron(),
        Shape::Cube => cube(),
        Shape::Grid => grid(nx, ny),
    }
}

fn cmd_info(mut mesh: Mesh, normalize: bool) {
    if normalize {
        mesh.normalize();
    }

    println!("{}", mesh.info());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());

    let health = mesh.validate_mesh();
    println!(
        "Edges: {} ({} boundary, {} internal)",
        health.edges, health.boundary_edges, health.internal_edges
    );
    println!("Euler characteristic: {}", health.euler_characteristic);

    let total_area: f64 = mesh.face_ids().map(|f| mesh.face_area(f)).sum();
    println!("Surface area: {:.6}", total_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    let status = if health.is_healthy() { "ok" } else { "BROKEN" };
    println!("Health: {}", status);
}

fn cmd_euler(mut mesh: Mesh) -> Result<(), Box<dyn std::error::Error>> {
    let before = mesh.validate_mesh();
    let start = Instant::now();

    let mut ops = EulerOps::new(&mut mesh);
    let ids: Vec<_> = ops.mesh().halfedge_ids().collect();
    let mut inserted: Vec<VertexId> = Vec::new();
    for he in ids {
        let mesh = ops.mesh();
        // Each edge once: skip halfedges already replaced and the higher
        // numbered side of internal edges.
        if !mesh.contains_halfedge(he) || mesh.mate(he).is_some_and(|m| m < he) {
            continue;
        }
        let p = mesh.halfedge_midpoint(he);
        inserted.push(ops.split_edge(he, p)?);
    }
    let split = ops.validate_mesh();
    println!(
        "Split {} edges: v {} e {} f {} (chi {})",
        inserted.len(),
        split.vertices,
        split.edges,
        split.faces,
        split.euler_characteristic
    );

    for v in inserted {
        ops.kill_edge_vertex(v)?;
    }
    let after = ops.validate_mesh();
    println!(
        "Removed them again: v {} e {} f {} (chi {})",
        after.vertices, after.edges, after.faces, after.euler_characteristic
    );
    log::info!("euler round trip took {:.2?}", start.elapsed());

    if after != before {
        return Err("mesh differs after round trip".into());
    }
    let problems = ops.check_consistency();
    if !problems.is_empty() {
        return Err(format!("{} consistency problems", problems.len()).into());
    }
    println!("Round trip ok");
    Ok(())
}

fn cmd_boundary(
    mut mesh: Mesh,
    corners: usize,
    hole: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if hole {
        let first = mesh.face_ids().next();
        if let Some(f) = first {
            EulerOps::new(&mut mesh).kill_face_make_ring_hole(f)?;
        }
    }

    let options = BoundaryLoopOptions::default().with_corners(corners);
    let Some(id) = mesh.create_boundary_loop(&options) else {
        println!("Mesh has no boundary");
        return Ok(());
    };
    let Some(bl) = mesh.boundary_loop(id) else {
        return Err("boundary loop vanished".into());
    };

    println!("Boundary loop: {} vertices", bl.num_vertices());
    for (i, &v) in bl.vertices().iter().enumerate() {
        let p = mesh.position(v);
        let mark = if bl.is_corner(i) { " corner" } else { "" };
        println!("  {} ({:.3}, {:.3}, {:.3}){}", v, p.x, p.y, p.z, mark);
    }
    Ok(())
}
