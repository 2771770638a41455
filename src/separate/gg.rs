//! Greedy separator growing.
//!
//! Part 1 is grown from a random seed: the seed enters the separator, and
//! the separator vertex whose absorption shrinks the separator load the
//! most is repeatedly moved to part 1, its part-0 neighbors taking its
//! place, until the two sides balance. The best of several seeds is kept.

use crate::context::Context;
use crate::error::Result;
use crate::gain::GainTable;
use crate::graph::Num;
use crate::separate::{GrowParams, SepGraph};
use crate::strategy::Active;
use ordered_float::OrderedFloat;

pub(crate) fn grow(sg: &mut SepGraph, prm: &GrowParams, ctx: &mut Context) -> Result<()> {
    let n = sg.graph.vertnbr();
    if n == 0 {
        return Ok(());
    }
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

    let mut best: Option<(Vec<u8>, (OrderedFloat<f64>, OrderedFloat<f64>))> = None;
    for _ in 0..prm.passes.max(1) {
        sg.set_parts(vec![0; n]);
        let mut table = GainTable::new(n, -max_pull, max_pull);

        let mut seed = ctx.random_index(n);
        while is_anchor(sg, seed) {
            seed = ctx.random_index(n);
        }
        sg.parts[seed] = 2;
        sg.recompute();
        table.insert(seed, gain(sg, seed));

        // Absorb until side 1 outweighs side 0. Anchors neither move nor
        // get pulled into the separator.
        while sg.dwghts[0] * sg.loads[1] < sg.dwghts[1] * sg.loads[0] {
            let vertex = match table.best_where(|v| {
                !is_anchor(sg, v)
                    && !sg
                        .graph
                        .neighbors(v)
                        .iter()
                        .any(|&u| sg.parts[u] == 0 && is_anchor(sg, u))
            }) {
                Some(v) => v,
                None => break, // side 0 exhausted or disconnected
            };
            table.remove(vertex);
            sg.parts[vertex] = 1;
            let load = sg.graph.vertex_load(vertex);
            sg.loads[2] -= load;
            sg.sizes[2] -= 1;
            sg.loads[1] += load;
            sg.sizes[1] += 1;
            for &u in sg.graph.neighbors(vertex) {
                if sg.parts[u] == 0 {
                    sg.parts[u] = 2;
                    let ul = sg.graph.vertex_load(u);
                    sg.loads[0] -= ul;
                    sg.sizes[0] -= 1;
                    sg.loads[2] += ul;
                    sg.sizes[2] += 1;
                    table.insert(u, gain(sg, u));
                }
            }
            for &changed in std::iter::once(&vertex).chain(sg.graph.neighbors(vertex)) {
                for &w in sg.graph.neighbors(changed) {
                    if sg.parts[w] == 2 && table.contains(w) {
                        table.update(w, gain(sg, w));
                    }
                }
            }
        }

        sg.recompute();
        let obj = sg.objective();
        let key = (OrderedFloat(obj.0), OrderedFloat(obj.1));
        if best.as_ref().map_or(true, |(_, best_key)| key < *best_key) {
            best = Some((sg.parts.clone(), key));
        }
    }

    if let Some((parts, _)) = best {
        sg.set_parts(parts);
    }
    sg.assert_consistent();
    Ok(())
}

fn is_anchor(sg: &SepGraph, v: usize) -> bool {
    matches!(sg.anchors, Some(anchors) if anchors.contains(&v))
}

/// Separator load decrease if separator vertex `v` moved to part 1.
fn gain(sg: &SepGraph, v: usize) -> Num {
    let mut pulled = 0;
    for &u in sg.graph.neighbors(v) {
        if sg.parts[u] == 0 {
            pulled += sg.graph.vertex_load(u);
        }
    }
    sg.graph.vertex_load(v) - pulled
}
