//! Band graph extraction around a frontier.
//!
//! The band contains every vertex within the requested graph distance of a
//! frontier vertex, plus two anchor vertices, one per part, appended at the
//! end. Edges leaving the band are absorbed by the anchor of the outside
//! end's part, with summed loads; each anchor carries the total vertex load
//! of its part outside the band, so part loads -- and hence the balance
//! envelope -- are identical on the band and on the original graph.

use crate::graph::{Graph, Num};

/// A band restriction of a graph.
#[derive(Clone, Debug)]
pub struct BandGraph {
    /// The band graph; the anchors are its last two vertices.
    pub graph: Graph,
    /// Original index of each non-anchor band vertex.
    pub band_to_orig: Vec<usize>,
    /// Indices of the two anchor vertices, for parts 0 and 1.
    pub anchors: [usize; 2],
}

const OUTSIDE: usize = usize::MAX;

/// Extract the band of vertices within `width` hops of `frontier`.
///
/// `parts` holds `0`/`1` for the two sides and may hold `2` for separator
/// vertices, which all belong to the frontier and therefore to the band.
/// Returns `None` when the restriction would be pointless or unusable:
/// the frontier is empty, the band covers the whole graph, or one anchor
/// would end up edgeless while its outside part is loaded.
pub fn extract_band(
    graph: &Graph,
    parts: &[u8],
    frontier: &[usize],
    width: usize,
) -> Option<BandGraph> {
    if frontier.is_empty() {
        return None;
    }

    // Breadth-first layers out of the frontier.
    let mut local = vec![OUTSIDE; graph.vertnbr()];
    let mut band: Vec<usize> = Vec::new();
    for &v in frontier {
        if local[v] == OUTSIDE {
            local[v] = band.len();
            band.push(v);
        }
    }
    let mut layer_start = 0;
    for _ in 0..width {
        let layer_end = band.len();
        for i in layer_start..layer_end {
            let v = band[i];
            for &u in graph.neighbors(v) {
                if local[u] == OUTSIDE {
                    local[u] = band.len();
                    band.push(u);
                }
            }
        }
        layer_start = layer_end;
    }

    if band.len() == graph.vertnbr() {
        return None; // band covers everything; restriction is pointless
    }

    let band_nbr = band.len();
    let anchors = [band_nbr, band_nbr + 1];

    // Outside load per part becomes the anchor load.
    let mut outside_load = [0 as Num; 2];
    for v in 0..graph.vertnbr() {
        if local[v] == OUTSIDE {
            outside_load[parts[v] as usize & 1] += graph.vertex_load(v);
        }
    }

    let mut offsets = Vec::with_capacity(band_nbr + 3);
    let mut targets = Vec::new();
    let mut edge_loads: Vec<Num> = Vec::new();
    let mut vertex_loads = Vec::with_capacity(band_nbr + 2);
    // Reciprocal anchor edges, collected while scanning band vertices.
    let mut anchor_edges: [Vec<(usize, Num)>; 2] = [Vec::new(), Vec::new()];

    offsets.push(0);
    for (i, &v) in band.iter().enumerate() {
        vertex_loads.push(graph.vertex_load(v));
        let mut to_anchor = [0 as Num; 2];
        for e in graph.edge_range(v) {
            let u = graph.edge_target(e);
            if local[u] != OUTSIDE {
                targets.push(local[u]);
                edge_loads.push(graph.edge_load(e));
            } else {
                to_anchor[parts[u] as usize & 1] += graph.edge_load(e);
            }
        }
        for side in 0..2 {
            if to_anchor[side] != 0 {
                targets.push(anchors[side]);
                edge_loads.push(to_anchor[side]);
                anchor_edges[side].push((i, to_anchor[side]));
            }
        }
        offsets.push(targets.len());
    }
    for side in 0..2 {
        if anchor_edges[side].is_empty() && outside_load[side] != 0 {
            return None; // anchor cannot retain its part
        }
        vertex_loads.push(outside_load[side]);
        for &(i, load) in &anchor_edges[side] {
            targets.push(i);
            edge_loads.push(load);
        }
        offsets.push(targets.len());
    }

    let graph = Graph::from_csr_unchecked(
        graph.base(),
        offsets,
        targets,
        Some(vertex_loads),
        Some(edge_loads),
        None,
    );
    Some(BandGraph {
        graph,
        band_to_orig: band,
        anchors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_on_a_path_keeps_loads() {
        // 0-1-2-3-4-5 split between vertices 2 and 3.
        let g = Graph::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]).unwrap();
        let parts = [0u8, 0, 0, 1, 1, 1];
        let band = extract_band(&g, &parts, &[2, 3], 1).unwrap();
        assert!(band.graph.check().is_ok());
        assert_eq!(band.band_to_orig.len(), 4); // 2, 3, 1, 4
        // Anchor loads carry the two outside vertices.
        assert_eq!(band.graph.vertex_load(band.anchors[0]), 1);
        assert_eq!(band.graph.vertex_load(band.anchors[1]), 1);
        assert_eq!(band.graph.load_sum(), g.load_sum());
    }

    #[test]
    fn whole_graph_band_is_rejected() {
        let g = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        let parts = [0u8, 0, 1, 1];
        assert!(extract_band(&g, &parts, &[1, 2], 3).is_none());
    }
}
