//! Greedy region growing: a bipartition from scratch.
//!
//! Part 1 is grown from a random seed vertex, always absorbing the
//! candidate of highest gain, until the part-0 load falls to its target.
//! Several seeds are tried and the best outcome under the selection
//! objective is kept.

use crate::bipart::{BipartGraph, GrowParams};
use crate::context::Context;
use crate::error::Result;
use crate::gain::GainTable;
use crate::strategy::Active;
use ordered_float::OrderedFloat;

pub(crate) fn grow(bg: &mut BipartGraph, prm: &GrowParams, ctx: &mut Context) -> Result<()> {
    let n = bg.graph.vertnbr();
    if n == 0 {
        return Ok(());
    }

    let dist = bg.domain_dist.max(1);
    let max_incident = (0..n).map(|v| bg.graph.incident_load(v)).max().unwrap_or(0);
    let gain_bound = max_incident * dist + bg.max_extern_abs();

    let mut best: Option<(Vec<u8>, (OrderedFloat<f64>, OrderedFloat<f64>))> = None;
    for _ in 0..prm.passes.max(1) {
        bg.set_parts(vec![0; n]);
        let mut table = GainTable::new(n, -gain_bound, gain_bound);
        let mut listed = vec![false; n];

        let mut seed = ctx.random_index(n);
        while is_anchor(bg, seed) {
            seed = ctx.random_index(n);
        }
        listed[seed] = true;
        table.insert(seed, bg.move_gain(seed));

        while bg.load0 > bg.load0_avg {
            let vertex = match table.best_where(|v| !is_anchor(bg, v)) {
                Some(v) => v,
                None => break, // disconnected remainder: no candidate left
            };
            let gain = bg.move_gain(vertex);
            bg.parts[vertex] = 1;
            bg.load0 -= bg.graph.vertex_load(vertex);
            bg.size0 -= 1;
            bg.comm_load -= gain;
            table.remove(vertex);
            for &u in bg.graph.neighbors(vertex) {
                if bg.parts[u] == 1 {
                    continue;
                }
                let g = bg.move_gain(u);
                if listed[u] {
                    table.update(u, g);
                } else {
                    listed[u] = true;
                    table.insert(u, g);
                }
            }
        }

        bg.recompute();
        let obj = bg.objective();
        let key = (OrderedFloat(obj.0), OrderedFloat(obj.1));
        if best.as_ref().map_or(true, |(_, best_key)| key < *best_key) {
            best = Some((bg.parts.clone(), key));
        }
    }

    if let Some((parts, _)) = best {
        bg.set_parts(parts);
    }
    bg.assert_consistent();
    Ok(())
}

fn is_anchor(bg: &BipartGraph, v: usize) -> bool {
    matches!(bg.anchors, Some(anchors) if anchors.contains(&v))
}
