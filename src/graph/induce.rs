//! Induced subgraphs, with and without halo preservation.

use crate::graph::{Graph, HaloGraph, Num};

const OUTSIDE: usize = usize::MAX;

/// Induce the subgraph over `verts`, dropping edges leaving the set.
///
/// Returns the induced graph and the map from its vertex indices back to
/// the parent's. Vertex order follows `verts`.
pub fn induce_list(parent: &Graph, verts: &[usize]) -> (Graph, Vec<usize>) {
    let mut local = vec![OUTSIDE; parent.vertnbr()];
    for (i, &v) in verts.iter().enumerate() {
        local[v] = i;
    }

    let mut offsets = Vec::with_capacity(verts.len() + 1);
    let mut targets = Vec::new();
    let mut edge_loads = Vec::new();
    offsets.push(0);
    for &v in verts {
        for e in parent.edge_range(v) {
            let u = local[parent.edge_target(e)];
            if u != OUTSIDE {
                targets.push(u);
                edge_loads.push(parent.edge_load(e));
            }
        }
        offsets.push(targets.len());
    }

    let vertex_loads = parent
        .has_vertex_loads()
        .then(|| verts.iter().map(|&v| parent.vertex_load(v)).collect());
    let edge_loads = parent.has_edge_loads().then_some(edge_loads);
    let graph = Graph::from_csr_unchecked(
        parent.base(),
        offsets,
        targets,
        vertex_loads,
        edge_loads,
        None,
    );
    (graph, verts.to_vec())
}

/// Induce the subgraph over `verts`, keeping neighbors outside the set as
/// a trailing halo with no outgoing adjacency.
///
/// The returned map covers plain vertices first (in `verts` order), then
/// halo vertices in first-encounter order.
pub fn induce_halo(parent: &Graph, verts: &[usize]) -> (HaloGraph, Vec<usize>) {
    let mut local = vec![OUTSIDE; parent.vertnbr()];
    for (i, &v) in verts.iter().enumerate() {
        local[v] = i;
    }

    let mut map = verts.to_vec();
    let mut offsets = Vec::with_capacity(verts.len() + 1);
    let mut targets = Vec::new();
    let mut edge_loads = Vec::new();
    offsets.push(0);
    for &v in verts {
        for e in parent.edge_range(v) {
            let u = parent.edge_target(e);
            if local[u] == OUTSIDE {
                local[u] = map.len();
                map.push(u);
            }
            targets.push(local[u]);
            edge_loads.push(parent.edge_load(e));
        }
        offsets.push(targets.len());
    }
    // Halo vertices carry no outgoing adjacency.
    let end = targets.len();
    offsets.resize(map.len() + 1, end);

    let vertex_loads = parent
        .has_vertex_loads()
        .then(|| map.iter().map(|&v| parent.vertex_load(v)).collect::<Vec<Num>>());
    let edge_loads = parent.has_edge_loads().then_some(edge_loads);
    let graph = Graph::from_csr_unchecked(
        parent.base(),
        offsets,
        targets,
        vertex_loads,
        edge_loads,
        None,
    );
    let halo_count = map.len() - verts.len();
    (HaloGraph::new(graph, halo_count), map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_induction_keeps_internal_edges_only() {
        let g = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
        let (sub, map) = induce_list(&g, &[1, 2, 3]);
        assert_eq!(sub.vertnbr(), 3);
        assert_eq!(sub.edgenbr(), 4); // 1-2 and 2-3, both directions
        assert_eq!(map, vec![1, 2, 3]);
        assert!(sub.check().is_ok());
    }

    #[test]
    fn halo_induction_preserves_boundary() {
        let g = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
        let (sub, map) = induce_halo(&g, &[1, 2]);
        assert_eq!(sub.plain_count(), 2);
        assert_eq!(sub.halo_count(), 2); // vertices 0 and 3
        assert_eq!(&map[..2], &[1, 2]);
        assert!(sub.check().is_ok());
    }
}
