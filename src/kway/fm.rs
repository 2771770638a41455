//! Direct k-way FM refinement of a mapping.
//!
//! Frontier vertices are bucketed by the best gain over their candidate
//! domains -- the domains of their neighbors. Moves respect per-domain load
//! envelopes derived from capacity-weighted averages; each pass rolls back
//! to its best prefix and stops when no net improvement remains.

use crate::context::Context;
use crate::error::Result;
use crate::gain::GainTable;
use crate::graph::Num;
use crate::kway::{KFmParams, KwayGraph};

struct MoveRec {
    vertex: usize,
    from: usize,
    gain: Num,
}

pub(crate) fn refine(kg: &mut KwayGraph, prm: &KFmParams, ctx: &mut Context) -> Result<()> {
    let n = kg.graph.vertnbr();
    if n == 0 || prm.moves == 0 || prm.passes == 0 || kg.frontier.is_empty() {
        return Ok(());
    }
    if kg.mapping.domnbr() < 2 {
        return Ok(());
    }

    // Per-domain load ceilings and floors.
    let domnbr = kg.mapping.domnbr();
    let arch = kg.mapping.arch();
    let total_weight = arch.dom_weight(&arch.first_domain()).max(1);
    let load_sum = kg.graph.load_sum();
    let max_vertex_load = (0..n).map(|v| kg.graph.vertex_load(v)).max().unwrap_or(1);
    let envelope: Vec<(Num, Num)> = (0..domnbr)
        .map(|d| {
            let weight = kg.mapping.arch().dom_weight(kg.mapping.domain(d));
            let avg = load_sum * weight / total_weight;
            let slack = (prm.balance * avg as f64).floor() as Num + max_vertex_load;
            (avg - slack, avg + slack)
        })
        .collect();

    let mut candidates: Vec<usize> = vec![usize::MAX; n];
    let mut gains: Vec<Num> = vec![0; n];
    let mut locked = vec![false; n];
    let mut seen = vec![false; n];

    for pass in 0..prm.passes {
        locked.fill(false);
        seen.fill(false);

        let mut work = kg.frontier.clone();
        ctx.shuffle(&mut work);

        // Size the table from the gains observed while seeding.
        let mut bound = 1;
        let mut seeded = Vec::new();
        for &v in &work {
            if kg.is_fixed(v) || seen[v] {
                continue;
            }
            if let Some((gain, target)) = best_move(kg, v) {
                seen[v] = true;
                gains[v] = gain;
                candidates[v] = target;
                bound = bound.max(gain.abs());
                seeded.push(v);
            }
        }
        let mut table = GainTable::new(n, -2 * bound, 2 * bound);
        for &v in &seeded {
            table.insert(v, gains[v]);
        }

        let mut log: Vec<MoveRec> = Vec::new();
        let mut best_len = 0usize;
        let mut best_key = (kg.comm_load, kg.imbalance());

        for _ in 0..prm.moves {
            let vertex = match table.best_where(|v| legal(kg, v, candidates[v], &envelope)) {
                Some(v) => v,
                None => break,
            };
            let from = kg.mapping.part_of(vertex);
            let target = candidates[vertex];
            let gain = gains[vertex];
            let load = kg.graph.vertex_load(vertex);

            kg.mapping.assign(vertex, target);
            kg.comp_loads[from] -= load;
            kg.comp_loads[target] += load;
            kg.comm_load -= gain;
            locked[vertex] = true;
            table.remove(vertex);
            log.push(MoveRec {
                vertex,
                from,
                gain,
            });

            for &u in kg.graph.neighbors(vertex) {
                if locked[u] || kg.is_fixed(u) {
                    continue;
                }
                match best_move(kg, u) {
                    Some((gain, target)) => {
                        gains[u] = gain;
                        candidates[u] = target;
                        if seen[u] {
                            table.update(u, gain);
                        } else {
                            seen[u] = true;
                            table.insert(u, gain);
                        }
                    }
                    None => {
                        if seen[u] {
                            table.remove(u);
                        }
                    }
                }
            }

            let key = (kg.comm_load, kg.imbalance());
            if key < best_key {
                best_key = key;
                best_len = log.len();
            }
        }

        while log.len() > best_len {
            let rec = log.pop().unwrap();
            let load = kg.graph.vertex_load(rec.vertex);
            let target = kg.mapping.part_of(rec.vertex);
            kg.comp_loads[target] -= load;
            kg.comp_loads[rec.from] += load;
            kg.mapping.assign(rec.vertex, rec.from);
            kg.comm_load += rec.gain;
        }
        kg.recompute();
        kg.assert_consistent();
        log::trace!(
            "k-way fm pass {pass}: kept {best_len} moves, comm {}",
            kg.comm_load
        );
        if best_len == 0 {
            break;
        }
    }
    Ok(())
}

/// Best candidate move of a vertex: the neighbor domain of highest
/// communication gain, ties to the earlier neighbor.
fn best_move(kg: &KwayGraph, v: usize) -> Option<(Num, usize)> {
    let part = kg.mapping.part_of(v);
    let mut best: Option<(Num, usize)> = None;
    for e in kg.graph.edge_range(v) {
        let candidate = kg.mapping.part_of(kg.graph.edge_target(e));
        if candidate == part || best.map_or(false, |(_, t)| t == candidate) {
            continue;
        }
        let mut delta = 0;
        for f in kg.graph.edge_range(v) {
            let other = kg.mapping.part_of(kg.graph.edge_target(f));
            let load = kg.graph.edge_load(f);
            delta += load * (kg.mapping.dist(candidate, other) - kg.mapping.dist(part, other));
        }
        let gain = -delta;
        if best.map_or(true, |(g, _)| gain > g) {
            best = Some((gain, candidate));
        }
    }
    best
}

/// A move is legal while both domains stay inside their envelopes.
fn legal(kg: &KwayGraph, v: usize, target: usize, envelope: &[(Num, Num)]) -> bool {
    if target == usize::MAX {
        return false;
    }
    let from = kg.mapping.part_of(v);
    let load = kg.graph.vertex_load(v);
    kg.comp_loads[target] + load <= envelope[target].1
        && kg.comp_loads[from] - load >= envelope[from].0
}
