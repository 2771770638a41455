//! Test utilities: graph builders and invariant assertions.
//!
//! The builders produce the small structured graphs the test suite (and
//! downstream users writing their own tests) lean on; the assertions check
//! the properties every algorithm must preserve. Everything here is plain
//! library code, usable from integration tests without feature gates.

use crate::context::Context;
use crate::graph::{Graph, Num};

/// A path of `n` vertices: `0-1-...-(n-1)`.
pub fn path_graph(n: usize) -> Graph {
    let edges: Vec<(usize, usize)> = (1..n).map(|v| (v - 1, v)).collect();
    Graph::from_edges(n, &edges).expect("path graph is valid")
}

/// A cycle of `n >= 3` vertices.
pub fn cycle_graph(n: usize) -> Graph {
    let mut edges: Vec<(usize, usize)> = (1..n).map(|v| (v - 1, v)).collect();
    edges.push((n - 1, 0));
    Graph::from_edges(n, &edges).expect("cycle graph is valid")
}

/// An `x` by `y` grid, vertex `(i, j)` at index `j * x + i`.
pub fn grid_graph(x: usize, y: usize) -> Graph {
    let mut edges = Vec::new();
    for j in 0..y {
        for i in 0..x {
            let v = j * x + i;
            if i + 1 < x {
                edges.push((v, v + 1));
            }
            if j + 1 < y {
                edges.push((v, v + x));
            }
        }
    }
    Graph::from_edges(x * y, &edges).expect("grid graph is valid")
}

/// An `x` by `y` torus: the grid plus wrap-around edges on every axis of
/// extent greater than two (shorter axes already connect both ends).
pub fn torus_graph(x: usize, y: usize) -> Graph {
    let mut edges = Vec::new();
    for j in 0..y {
        for i in 0..x {
            let v = j * x + i;
            if i + 1 < x {
                edges.push((v, v + 1));
            }
            if j + 1 < y {
                edges.push((v, v + x));
            }
        }
    }
    if x > 2 {
        for j in 0..y {
            edges.push((j * x, j * x + x - 1));
        }
    }
    if y > 2 {
        for i in 0..x {
            edges.push((i, (y - 1) * x + i));
        }
    }
    Graph::from_edges(x * y, &edges).expect("torus graph is valid")
}

/// An `x` by `y` mesh with vertex and edge loads drawn from the context's
/// random stream; the same seed reproduces the same graph.
pub fn random_mesh_graph(x: usize, y: usize, ctx: &mut Context) -> Graph {
    let mut edges = Vec::new();
    for j in 0..y {
        for i in 0..x {
            let v = j * x + i;
            if i + 1 < x {
                edges.push((v, v + 1, ctx.random_index(4) as Num + 1));
            }
            if j + 1 < y {
                edges.push((v, v + x, ctx.random_index(4) as Num + 1));
            }
        }
    }
    let loads = (0..x * y).map(|_| ctx.random_index(3) as Num + 1).collect();
    Graph::from_weighted_edges(x * y, &edges, Some(loads)).expect("random mesh is valid")
}

/// A star: vertex 0 joined to `leaves` leaves.
pub fn star_graph(leaves: usize) -> Graph {
    let edges: Vec<(usize, usize)> = (1..=leaves).map(|v| (0, v)).collect();
    Graph::from_edges(leaves + 1, &edges).expect("star graph is valid")
}

/// A complete graph on `n` vertices.
pub fn complete_graph(n: usize) -> Graph {
    let mut edges = Vec::new();
    for u in 0..n {
        for v in u + 1..n {
            edges.push((u, v));
        }
    }
    Graph::from_edges(n, &edges).expect("complete graph is valid")
}

/// Total load of edges cut by a part assignment (undirected count).
pub fn cut_load(graph: &Graph, parts: &[usize]) -> Num {
    let mut cut = 0;
    for v in 0..graph.vertnbr() {
        for e in graph.edge_range(v) {
            if parts[graph.edge_target(e)] != parts[v] {
                cut += graph.edge_load(e);
            }
        }
    }
    cut / 2
}

/// Load of each part of a part assignment.
pub fn part_loads(graph: &Graph, parts: &[usize], part_count: usize) -> Vec<Num> {
    let mut loads = vec![0; part_count];
    for v in 0..graph.vertnbr() {
        loads[parts[v]] += graph.vertex_load(v);
    }
    loads
}

/// Panic unless `perm` is a permutation of `0..perm.len()`.
pub fn assert_permutation(perm: &[usize]) {
    let mut seen = vec![false; perm.len()];
    for &p in perm {
        assert!(p < perm.len(), "rank {p} out of range");
        assert!(!seen[p], "rank {p} assigned twice");
        seen[p] = true;
    }
}

/// Panic unless every part load stays within `tolerance` of the average.
pub fn assert_balanced(graph: &Graph, parts: &[usize], part_count: usize, tolerance: f64) {
    let loads = part_loads(graph, parts, part_count);
    let avg = graph.load_sum() as f64 / part_count as f64;
    for (part, &load) in loads.iter().enumerate() {
        let deviation = (load as f64 - avg).abs();
        assert!(
            deviation <= tolerance * graph.load_sum() as f64 + avg.ceil(),
            "part {part} load {load} strays from average {avg:.1}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_produce_valid_graphs() {
        assert!(path_graph(5).check().is_ok());
        assert!(cycle_graph(6).check().is_ok());
        assert!(grid_graph(3, 4).check().is_ok());
        assert!(star_graph(5).check().is_ok());
        assert!(complete_graph(4).check().is_ok());
        assert!(torus_graph(4, 3).check().is_ok());
        assert!(torus_graph(2, 5).check().is_ok()); // short axis degenerates
    }

    #[test]
    fn torus_wraps_every_long_axis() {
        let t = torus_graph(4, 4);
        assert_eq!(t.degree_max(), 4);
        assert!(t.neighbors(0).contains(&3));
        assert!(t.neighbors(0).contains(&12));
    }

    #[test]
    fn random_mesh_is_reproducible_per_seed() {
        let a = random_mesh_graph(6, 5, &mut Context::with_seed(17));
        let b = random_mesh_graph(6, 5, &mut Context::with_seed(17));
        assert!(a.check().is_ok());
        let loads = |g: &Graph| (0..g.vertnbr()).map(|v| g.vertex_load(v)).collect::<Vec<_>>();
        assert_eq!(loads(&a), loads(&b));
        assert_eq!(a.edge_load_sum(), b.edge_load_sum());
        let c = random_mesh_graph(6, 5, &mut Context::with_seed(18));
        assert_ne!(loads(&a), loads(&c));
    }

    #[test]
    fn cut_load_counts_undirected_edges() {
        let g = grid_graph(2, 2);
        assert_eq!(cut_load(&g, &[0, 1, 0, 1]), 2);
        assert_eq!(cut_load(&g, &[0, 0, 1, 1]), 2);
        assert_eq!(cut_load(&g, &[0, 1, 1, 0]), 4);
    }
}
