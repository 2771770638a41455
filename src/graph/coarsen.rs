//! Vertex matching and graph contraction for the multilevel scheme.
//!
//! Matching walks the vertices in a randomized order drawn from the
//! context, mates each unmatched vertex with an unmatched neighbor chosen
//! by the active policy, and leaves stragglers mated with themselves.
//! Contraction then aggregates each mated pair into a multinode: vertex
//! loads add up, parallel coarse edges merge with summed loads, and edges
//! internal to a multinode disappear.

use crate::context::Context;
use crate::graph::{Graph, Num};

/// Neighbor selection policy for matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Mate with the unmatched neighbor of heaviest connecting edge.
    HeavyEdge,
    /// Mate with an unmatched neighbor of identical adjacency signature,
    /// falling back to heavy-edge matching when no twin exists.
    Signature,
    /// Score unmatched neighbors by shared neighborhood plus edge load.
    CommonNeighbor,
}

/// Result of one coarsening step.
#[derive(Clone, Debug)]
pub struct Coarsening {
    /// The contracted graph.
    pub graph: Graph,
    /// Fine end points of each coarse vertex; both equal for singletons.
    pub multinodes: Vec<(usize, usize)>,
    /// Coarse vertex owning each fine vertex.
    pub fine_to_coarse: Vec<usize>,
}

const UNMATCHED: usize = usize::MAX;

/// Match and contract `fine` once.
pub fn coarsen(fine: &Graph, policy: MatchPolicy, ctx: &mut Context) -> Coarsening {
    let vertnbr = fine.vertnbr();
    let mates = match_vertices(fine, policy, ctx);

    let mut fine_to_coarse = vec![UNMATCHED; vertnbr];
    let mut multinodes = Vec::with_capacity(vertnbr.div_ceil(2));
    for v in 0..vertnbr {
        let mate = mates[v];
        if mate >= v {
            fine_to_coarse[v] = multinodes.len();
            fine_to_coarse[mate] = multinodes.len();
            multinodes.push((v, mate));
        }
    }

    let graph = contract(fine, &multinodes, &fine_to_coarse);
    log::debug!(
        "coarsened {} vertices into {} multinodes",
        vertnbr,
        multinodes.len()
    );
    Coarsening {
        graph,
        multinodes,
        fine_to_coarse,
    }
}

fn match_vertices(fine: &Graph, policy: MatchPolicy, ctx: &mut Context) -> Vec<usize> {
    let vertnbr = fine.vertnbr();
    let mut mates = vec![UNMATCHED; vertnbr];
    let mut mark = vec![UNMATCHED; vertnbr]; // common-neighbor scratch
    for v in ctx.permutation(vertnbr) {
        if mates[v] != UNMATCHED {
            continue;
        }
        let best = match policy {
            MatchPolicy::HeavyEdge => best_heavy(fine, &mates, v),
            MatchPolicy::Signature => {
                best_signature(fine, &mates, v).or_else(|| best_heavy(fine, &mates, v))
            }
            MatchPolicy::CommonNeighbor => best_common(fine, &mates, v, &mut mark),
        };
        match best {
            Some(u) => {
                mates[v] = u;
                mates[u] = v;
            }
            None => mates[v] = v,
        }
    }
    mates
}

fn best_heavy(fine: &Graph, mates: &[usize], v: usize) -> Option<usize> {
    let mut best = None;
    let mut best_load = Num::MIN;
    for e in fine.edge_range(v) {
        let u = fine.edge_target(e);
        if mates[u] != UNMATCHED {
            continue;
        }
        let load = fine.edge_load(e);
        if load > best_load {
            best_load = load;
            best = Some(u);
        }
    }
    best
}

fn best_signature(fine: &Graph, mates: &[usize], v: usize) -> Option<usize> {
    let mut sig_v: Vec<usize> = fine.neighbors(v).to_vec();
    sig_v.sort_unstable();
    for &u in fine.neighbors(v) {
        if mates[u] != UNMATCHED || fine.degree(u) != fine.degree(v) {
            continue;
        }
        let mut sig_u: Vec<usize> = fine.neighbors(u).to_vec();
        sig_u.sort_unstable();
        // Twins agree on every neighbor other than each other.
        let matches = sig_v
            .iter()
            .filter(|&&w| w != u)
            .eq(sig_u.iter().filter(|&&w| w != v));
        if matches {
            return Some(u);
        }
    }
    None
}

fn best_common(fine: &Graph, mates: &[usize], v: usize, mark: &mut [usize]) -> Option<usize> {
    for &w in fine.neighbors(v) {
        mark[w] = v;
    }
    let mut best = None;
    let mut best_score = Num::MIN;
    for e in fine.edge_range(v) {
        let u = fine.edge_target(e);
        if mates[u] != UNMATCHED {
            continue;
        }
        let shared = fine.neighbors(u).iter().filter(|&&w| mark[w] == v).count();
        let score = fine.edge_load(e) + shared as Num;
        if score > best_score {
            best_score = score;
            best = Some(u);
        }
    }
    best
}

fn contract(fine: &Graph, multinodes: &[(usize, usize)], fine_to_coarse: &[usize]) -> Graph {
    let coarse_nbr = multinodes.len();
    let mut offsets = Vec::with_capacity(coarse_nbr + 1);
    let mut targets: Vec<usize> = Vec::with_capacity(fine.edgenbr());
    let mut edge_loads: Vec<Num> = Vec::with_capacity(fine.edgenbr());
    let mut vertex_loads = Vec::with_capacity(coarse_nbr);
    let mut slot_of = vec![usize::MAX; coarse_nbr];

    offsets.push(0);
    for (c, &(a, b)) in multinodes.iter().enumerate() {
        let row_start = targets.len();
        let mut load = fine.vertex_load(a);
        if b != a {
            load += fine.vertex_load(b);
        }
        vertex_loads.push(load);
        let ends = if b != a { vec![a, b] } else { vec![a] };
        for f in ends {
            for e in fine.edge_range(f) {
                let cu = fine_to_coarse[fine.edge_target(e)];
                if cu == c {
                    continue; // edge internal to the multinode
                }
                let slot = slot_of[cu];
                if slot >= row_start && slot < targets.len() && targets[slot] == cu {
                    edge_loads[slot] += fine.edge_load(e);
                } else {
                    slot_of[cu] = targets.len();
                    targets.push(cu);
                    edge_loads.push(fine.edge_load(e));
                }
            }
        }
        offsets.push(targets.len());
    }

    Graph::from_csr_unchecked(
        fine.base(),
        offsets,
        targets,
        Some(vertex_loads),
        Some(edge_loads),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contraction_preserves_loads() {
        let mut ctx = Context::with_seed(3);
        let g = Graph::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]).unwrap();
        let c = coarsen(&g, MatchPolicy::HeavyEdge, &mut ctx);
        assert!(c.graph.check().is_ok());
        assert_eq!(c.graph.load_sum(), g.load_sum());
        // Directed edge loads lost are exactly those internal to multinodes.
        let internal: Num = c
            .multinodes
            .iter()
            .filter(|&&(a, b)| a != b)
            .map(|&(a, b)| {
                g.edge_range(a)
                    .filter(|&e| g.edge_target(e) == b)
                    .map(|e| g.edge_load(e))
                    .sum::<Num>()
                    * 2
            })
            .sum();
        assert_eq!(c.graph.edge_load_sum(), g.edge_load_sum() - internal);
    }

    #[test]
    fn matching_is_an_involution() {
        let mut ctx = Context::with_seed(11);
        let g = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
        let c = coarsen(&g, MatchPolicy::CommonNeighbor, &mut ctx);
        for (c_idx, &(a, b)) in c.multinodes.iter().enumerate() {
            assert_eq!(c.fine_to_coarse[a], c_idx);
            assert_eq!(c.fine_to_coarse[b], c_idx);
        }
    }
}
