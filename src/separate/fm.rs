//! Separator FM: gain-bucket refinement of a vertex separator.
//!
//! Each separator vertex has two candidate moves, one per side. Moving it
//! to side `d` removes it from the separator and pulls its neighbors of the
//! opposite side in; the gain is the separator load decrease. Moves are
//! legal while the dual-weighted imbalance stays within its ceiling and no
//! band anchor would be pulled into the separator. Passes roll back to the
//! best prefix and the separator list is rebuilt at every pass boundary.

use crate::context::Context;
use crate::error::Result;
use crate::gain::GainTable;
use crate::graph::Num;
use crate::separate::{FmParams, SepGraph};

struct MoveRec {
    vertex: usize,
    side: u8,
    pulled: Vec<usize>,
}

pub(crate) fn refine(sg: &mut SepGraph, prm: &FmParams, ctx: &mut Context) -> Result<()> {
    let n = sg.graph.vertnbr();
    if n == 0 || prm.moves == 0 || prm.passes == 0 || sg.frontier.is_empty() {
        return Ok(());
    }

    let load_sum = sg.graph.load_sum();
    let wsum = sg.dwghts[0] + sg.dwghts[1];
    let delta_cap = ((prm.balance * load_sum as f64).floor() as Num * wsum).max(wsum);

    let max_pull = (0..n)
        .map(|v| {
            sg.graph.vertex_load(v)
                + sg.graph
                    .neighbors(v)
                    .iter()
                    .map(|&u| sg.graph.vertex_load(u))
                    .sum::<Num>()
        })
        .max()
        .unwrap_or(1);
    let mut table = GainTable::new(2 * n, -max_pull, max_pull);
    let mut locked = vec![false; n];

    for pass in 0..prm.passes {
        table.clear();
        locked.fill(false);

        let mut work = sg.frontier.clone();
        ctx.shuffle(&mut work);
        for &v in &work {
            enlist(sg, &mut table, v);
        }

        let mut log: Vec<MoveRec> = Vec::new();
        let mut best_len = 0usize;
        let mut best_key = (sg.loads[2], sg.load_delta.abs());

        for _ in 0..prm.moves {
            let cap = delta_cap.max(sg.load_delta.abs());
            let slot = match table.best_where(|slot| legal(sg, slot, cap)) {
                Some(slot) => slot,
                None => break,
            };
            let vertex = slot / 2;
            let side = (slot % 2) as u8;

            // Move the separator vertex to its side and pull the opposite
            // neighbors in.
            sg.parts[vertex] = side;
            let load = sg.graph.vertex_load(vertex);
            sg.loads[2] -= load;
            sg.sizes[2] -= 1;
            sg.loads[side as usize] += load;
            sg.sizes[side as usize] += 1;
            locked[vertex] = true;
            table.remove(2 * vertex);
            table.remove(2 * vertex + 1);

            let mut pulled = Vec::new();
            for &u in sg.graph.neighbors(vertex) {
                if sg.parts[u] == 1 - side {
                    sg.parts[u] = 2;
                    let ul = sg.graph.vertex_load(u);
                    sg.loads[(1 - side) as usize] -= ul;
                    sg.sizes[(1 - side) as usize] -= 1;
                    sg.loads[2] += ul;
                    sg.sizes[2] += 1;
                    pulled.push(u);
                    if !locked[u] {
                        enlist(sg, &mut table, u);
                    }
                }
            }
            sg.load_delta = sg.dwghts[1] * sg.loads[0] - sg.dwghts[0] * sg.loads[1];

            // Refresh the gains of separator vertices whose neighborhood
            // changed part.
            for &changed in std::iter::once(&vertex).chain(pulled.iter()) {
                for &w in sg.graph.neighbors(changed) {
                    if sg.parts[w] == 2 && !locked[w] {
                        relist(sg, &mut table, w);
                    }
                }
            }

            log.push(MoveRec {
                vertex,
                side,
                pulled,
            });
            let key = (sg.loads[2], sg.load_delta.abs());
            if key < best_key {
                best_key = key;
                best_len = log.len();
            }
        }

        // Roll back to the best prefix.
        while log.len() > best_len {
            let rec = log.pop().unwrap();
            for &u in &rec.pulled {
                sg.parts[u] = 1 - rec.side;
            }
            sg.parts[rec.vertex] = 2;
        }
        sg.recompute();
        sg.assert_consistent();
        log::trace!(
            "separator fm pass {pass}: kept {best_len} moves, separator load {}",
            sg.loads[2]
        );
        if best_len == 0 {
            break;
        }
    }
    Ok(())
}

/// Separator load decrease if separator vertex `v` moved to `side`.
fn gain(sg: &SepGraph, v: usize, side: u8) -> Num {
    let mut pulled = 0;
    for &u in sg.graph.neighbors(v) {
        if sg.parts[u] == 1 - side {
            pulled += sg.graph.vertex_load(u);
        }
    }
    sg.graph.vertex_load(v) - pulled
}

fn enlist(sg: &SepGraph, table: &mut GainTable, v: usize) {
    debug_assert_eq!(sg.parts[v], 2);
    table.insert(2 * v, gain(sg, v, 0));
    table.insert(2 * v + 1, gain(sg, v, 1));
}

fn relist(sg: &SepGraph, table: &mut GainTable, v: usize) {
    table.update(2 * v, gain(sg, v, 0));
    table.update(2 * v + 1, gain(sg, v, 1));
}

/// A move is legal when imbalance stays within the cap and no anchor gets
/// pulled into the separator.
fn legal(sg: &SepGraph, slot: usize, delta_cap: Num) -> bool {
    let vertex = slot / 2;
    let side = (slot % 2) as u8;
    let mut loads = sg.loads;
    let load = sg.graph.vertex_load(vertex);
    loads[side as usize] += load;
    for &u in sg.graph.neighbors(vertex) {
        if sg.parts[u] == 1 - side {
            if matches!(sg.anchors, Some(anchors) if anchors.contains(&u)) {
                return false;
            }
            loads[(1 - side) as usize] -= sg.graph.vertex_load(u);
        }
    }
    let delta = sg.dwghts[1] * loads[0] - sg.dwghts[0] * loads[1];
    delta.abs() <= delta_cap
}
