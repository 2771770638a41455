//! Compressed-adjacency graphs and their invariants.
//!
//! [`Graph`] is the shared substrate of every algorithm in the crate: a
//! symmetric graph in compressed sparse row form, with optional vertex
//! loads, edge loads and external labels. Each undirected edge is stored
//! twice, once per direction, and edge loads are symmetric.
//!
//! Internal arrays are always 0-based; the external numbering base (0 or 1)
//! is a plain field applied only at the I/O and label boundary. Shared
//! read-only arrays are reference counted, so derived graphs (coarse,
//! induced, band) can alias their parent's storage without lifetimes and
//! without an ownership flag word: whoever holds the last reference frees.
//!
//! Cached invariants (`load_sum`, `edge_load_sum`, `degree_max`) are
//! computed at construction and must be preserved by every derivation;
//! [`Graph::check`] verifies the full set and is run by debug assertions
//! throughout the crate.

pub mod band;
pub mod coarsen;
pub mod induce;

use crate::error::{Error, Result};
use std::sync::Arc;

/// Load and label type, also used for file-format numbers.
pub type Num = i64;

/// A symmetric graph in compressed sparse row form.
#[derive(Clone, Debug)]
pub struct Graph {
    base: Num,
    /// CSR offsets; `offsets[v]..offsets[v + 1]` indexes `targets`.
    offsets: Arc<[usize]>,
    /// End vertex of each directed edge.
    targets: Arc<[usize]>,
    vertex_loads: Option<Arc<[Num]>>,
    edge_loads: Option<Arc<[Num]>>,
    labels: Option<Arc<[Num]>>,
    load_sum: Num,
    edge_load_sum: Num,
    degree_max: usize,
}

impl Graph {
    /// Build a graph from raw CSR arrays, validating every invariant.
    pub fn from_csr(
        base: Num,
        offsets: Vec<usize>,
        targets: Vec<usize>,
        vertex_loads: Option<Vec<Num>>,
        edge_loads: Option<Vec<Num>>,
        labels: Option<Vec<Num>>,
    ) -> Result<Graph> {
        if base != 0 && base != 1 {
            return Err(Error::input(format!("base value must be 0 or 1, got {base}")));
        }
        if offsets.is_empty() {
            return Err(Error::input("offset array must have at least one entry"));
        }
        let vertnbr = offsets.len() - 1;
        if offsets[0] != 0 || *offsets.last().unwrap() != targets.len() {
            return Err(Error::input("offset array does not span the edge array"));
        }
        if let Some(loads) = &vertex_loads {
            if loads.len() != vertnbr {
                return Err(Error::input("vertex load array length mismatch"));
            }
        }
        if let Some(loads) = &edge_loads {
            if loads.len() != targets.len() {
                return Err(Error::input("edge load array length mismatch"));
            }
        }
        if let Some(labels) = &labels {
            if labels.len() != vertnbr {
                return Err(Error::input("label array length mismatch"));
            }
        }
        let graph = Graph::from_csr_unchecked(base, offsets, targets, vertex_loads, edge_loads, labels);
        graph.check()?;
        Ok(graph)
    }

    /// Build without validation; used internally where invariants are
    /// guaranteed by construction (and re-checked under debug assertions).
    pub(crate) fn from_csr_unchecked(
        base: Num,
        offsets: Vec<usize>,
        targets: Vec<usize>,
        vertex_loads: Option<Vec<Num>>,
        edge_loads: Option<Vec<Num>>,
        labels: Option<Vec<Num>>,
    ) -> Graph {
        let vertnbr = offsets.len() - 1;
        let load_sum = match &vertex_loads {
            Some(loads) => loads.iter().sum(),
            None => vertnbr as Num,
        };
        let edge_load_sum = match &edge_loads {
            Some(loads) => loads.iter().sum(),
            None => targets.len() as Num,
        };
        let degree_max = (0..vertnbr)
            .map(|v| offsets[v + 1] - offsets[v])
            .max()
            .unwrap_or(0);
        Graph {
            base,
            offsets: offsets.into(),
            targets: targets.into(),
            vertex_loads: vertex_loads.map(Into::into),
            edge_loads: edge_loads.map(Into::into),
            labels: labels.map(Into::into),
            load_sum,
            edge_load_sum,
            degree_max,
        }
    }

    /// Build a unit-load graph from an undirected edge list.
    pub fn from_edges(vertnbr: usize, edges: &[(usize, usize)]) -> Result<Graph> {
        let weighted: Vec<(usize, usize, Num)> = edges.iter().map(|&(u, v)| (u, v, 1)).collect();
        Graph::from_weighted_edges(vertnbr, &weighted, None)
    }

    /// Build from an undirected edge list with per-edge loads and optional
    /// vertex loads.
    pub fn from_weighted_edges(
        vertnbr: usize,
        edges: &[(usize, usize, Num)],
        vertex_loads: Option<Vec<Num>>,
    ) -> Result<Graph> {
        let mut degrees = vec![0usize; vertnbr];
        for &(u, v, _) in edges {
            if u >= vertnbr || v >= vertnbr {
                return Err(Error::input(format!(
                    "edge ({u}, {v}) out of range for {vertnbr} vertices"
                )));
            }
            if u == v {
                return Err(Error::input(format!("self-loop on vertex {u}")));
            }
            degrees[u] += 1;
            degrees[v] += 1;
        }
        let mut offsets = vec![0usize; vertnbr + 1];
        for v in 0..vertnbr {
            offsets[v + 1] = offsets[v] + degrees[v];
        }
        let edgenbr = offsets[vertnbr];
        let mut targets = vec![0usize; edgenbr];
        let mut loads = vec![0 as Num; edgenbr];
        let mut cursor = offsets.clone();
        for &(u, v, load) in edges {
            targets[cursor[u]] = v;
            loads[cursor[u]] = load;
            cursor[u] += 1;
            targets[cursor[v]] = u;
            loads[cursor[v]] = load;
            cursor[v] += 1;
        }
        let unit = loads.iter().all(|&l| l == 1);
        Graph::from_csr(
            0,
            offsets,
            targets,
            vertex_loads,
            if unit { None } else { Some(loads) },
            None,
        )
    }

    /// External numbering base (0 or 1).
    pub fn base(&self) -> Num {
        self.base
    }

    /// Number of vertices.
    pub fn vertnbr(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of directed edges (each undirected edge counted twice).
    pub fn edgenbr(&self) -> usize {
        self.targets.len()
    }

    /// Sum of vertex loads.
    pub fn load_sum(&self) -> Num {
        self.load_sum
    }

    /// Sum of directed edge loads.
    pub fn edge_load_sum(&self) -> Num {
        self.edge_load_sum
    }

    /// Maximum vertex degree.
    pub fn degree_max(&self) -> usize {
        self.degree_max
    }

    /// Degree of a vertex.
    pub fn degree(&self, v: usize) -> usize {
        self.offsets[v + 1] - self.offsets[v]
    }

    /// Edge index range of a vertex.
    pub fn edge_range(&self, v: usize) -> std::ops::Range<usize> {
        self.offsets[v]..self.offsets[v + 1]
    }

    /// Neighbors of a vertex.
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.targets[self.offsets[v]..self.offsets[v + 1]]
    }

    /// End vertex of a directed edge.
    pub fn edge_target(&self, e: usize) -> usize {
        self.targets[e]
    }

    /// Load of a vertex (1 when the graph is unit-loaded).
    pub fn vertex_load(&self, v: usize) -> Num {
        match &self.vertex_loads {
            Some(loads) => loads[v],
            None => 1,
        }
    }

    /// Load of a directed edge (1 when edges are unit-loaded).
    pub fn edge_load(&self, e: usize) -> Num {
        match &self.edge_loads {
            Some(loads) => loads[e],
            None => 1,
        }
    }

    /// External label of a vertex; the based index when labels are absent.
    pub fn label(&self, v: usize) -> Num {
        match &self.labels {
            Some(labels) => labels[v],
            None => v as Num + self.base,
        }
    }

    /// Whether explicit vertex loads are present.
    pub fn has_vertex_loads(&self) -> bool {
        self.vertex_loads.is_some()
    }

    /// Whether explicit edge loads are present.
    pub fn has_edge_loads(&self) -> bool {
        self.edge_loads.is_some()
    }

    /// Whether external labels are present.
    pub fn has_labels(&self) -> bool {
        self.labels.is_some()
    }

    /// Sum of the loads of the edges incident to `v`.
    pub fn incident_load(&self, v: usize) -> Num {
        match &self.edge_loads {
            Some(loads) => self.edge_range(v).map(|e| loads[e]).sum(),
            None => self.degree(v) as Num,
        }
    }

    /// Verify every structural invariant.
    ///
    /// Checks offsets, index ranges, absence of self-loops and duplicate
    /// edges, edge symmetry with equal loads, and the cached sums. This is
    /// the halo-free form; see [`HaloGraph::check`] for halo graphs.
    pub fn check(&self) -> Result<()> {
        self.check_with_halo(0)
    }

    /// Invariant check, ignoring missing reciprocals *into* the trailing
    /// `halo_count` vertices, which carry no outgoing adjacency.
    pub(crate) fn check_with_halo(&self, halo_count: usize) -> Result<()> {
        let vertnbr = self.vertnbr();
        let plain = vertnbr - halo_count;
        for v in 0..vertnbr {
            if self.offsets[v] > self.offsets[v + 1] {
                return Err(Error::input(format!("offsets decrease at vertex {v}")));
            }
            if v >= plain && self.degree(v) != 0 {
                return Err(Error::input(format!("halo vertex {v} has outgoing edges")));
            }
            let mut seen: Vec<usize> = self.neighbors(v).to_vec();
            seen.sort_unstable();
            for pair in seen.windows(2) {
                if pair[0] == pair[1] {
                    return Err(Error::input(format!(
                        "duplicate edge ({v}, {})",
                        pair[0]
                    )));
                }
            }
            for e in self.edge_range(v) {
                let u = self.targets[e];
                if u >= vertnbr {
                    return Err(Error::input(format!("edge target {u} out of range")));
                }
                if u == v {
                    return Err(Error::input(format!("self-loop on vertex {v}")));
                }
                if u < plain {
                    let load = self.edge_load(e);
                    let reciprocal = self
                        .edge_range(u)
                        .find(|&f| self.targets[f] == v)
                        .ok_or_else(|| {
                            Error::input(format!("edge ({v}, {u}) has no reciprocal"))
                        })?;
                    if self.edge_load(reciprocal) != load {
                        return Err(Error::input(format!(
                            "asymmetric load on edge ({v}, {u})"
                        )));
                    }
                }
            }
        }
        let load_sum: Num = (0..vertnbr).map(|v| self.vertex_load(v)).sum();
        if load_sum != self.load_sum {
            return Err(Error::internal("cached vertex load sum is stale"));
        }
        let edge_load_sum: Num = (0..self.edgenbr()).map(|e| self.edge_load(e)).sum();
        if edge_load_sum != self.edge_load_sum {
            return Err(Error::internal("cached edge load sum is stale"));
        }
        let degree_max = (0..vertnbr).map(|v| self.degree(v)).max().unwrap_or(0);
        if degree_max != self.degree_max {
            return Err(Error::internal("cached maximum degree is stale"));
        }
        Ok(())
    }
}

/// A graph with a trailing range of halo vertices.
///
/// The first `vertnbr - halo_count` vertices ("plain" vertices) own their
/// full adjacency; halo vertices appear only as edge end points and carry
/// no outgoing adjacency of their own. Induction preserves the property:
/// neighbors falling outside an induced vertex set become the halo of the
/// induced graph.
#[derive(Clone, Debug)]
pub struct HaloGraph {
    graph: Graph,
    halo_count: usize,
}

impl HaloGraph {
    /// Wrap a plain graph as a halo graph with an empty halo.
    pub fn from_graph(graph: Graph) -> HaloGraph {
        HaloGraph {
            graph,
            halo_count: 0,
        }
    }

    pub(crate) fn new(graph: Graph, halo_count: usize) -> HaloGraph {
        debug_assert!(halo_count <= graph.vertnbr());
        HaloGraph { graph, halo_count }
    }

    /// The underlying graph, halo suffix included.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Number of halo vertices.
    pub fn halo_count(&self) -> usize {
        self.halo_count
    }

    /// Number of plain (non-halo) vertices.
    pub fn plain_count(&self) -> usize {
        self.graph.vertnbr() - self.halo_count
    }

    /// Whether a vertex belongs to the halo suffix.
    pub fn is_halo(&self, v: usize) -> bool {
        v >= self.plain_count()
    }

    /// Verify the halo layout on top of the graph invariants.
    pub fn check(&self) -> Result<()> {
        self.graph.check_with_halo(self.halo_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_graph_invariants() {
        let g = Graph::from_edges(4, &[(0, 1), (1, 3), (3, 2), (2, 0)]).unwrap();
        assert_eq!(g.vertnbr(), 4);
        assert_eq!(g.edgenbr(), 8);
        assert_eq!(g.load_sum(), 4);
        assert_eq!(g.degree_max(), 2);
        assert!(g.check().is_ok());
    }

    #[test]
    fn rejects_self_loop() {
        assert!(Graph::from_edges(2, &[(0, 0)]).is_err());
    }

    #[test]
    fn rejects_asymmetric_loads() {
        // Hand-built CSR with mismatched reciprocal loads.
        let r = Graph::from_csr(
            0,
            vec![0, 1, 2],
            vec![1, 0],
            None,
            Some(vec![2, 3]),
            None,
        );
        assert!(r.is_err());
    }
}
