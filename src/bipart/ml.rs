//! Multilevel bipartitioning.
//!
//! Coarsen until the base-case threshold, the depth cap, or a stalled
//! matching; solve the base case with the `low` strategy; then project each
//! coarse part onto both fine end points of its multinode, rebuild the
//! derived state from scratch, and refine with the `asc` strategy at every
//! level on the way back up. A stalled coarsening is a graceful fallback
//! to the base-case strategy, never an error.

use crate::bipart::{BipartGraph, MlParams};
use crate::context::Context;
use crate::error::Result;
use crate::graph::coarsen::coarsen;

pub(crate) fn run(bg: &mut BipartGraph, prm: &MlParams, ctx: &mut Context) -> Result<()> {
    let fine_nbr = bg.graph.vertnbr();
    if fine_nbr <= prm.vert || bg.level >= prm.levl || bg.anchors.is_some() {
        return prm.low.run(bg, ctx);
    }

    let coarsening = coarsen(&bg.graph, prm.policy, ctx);
    let coarse_nbr = coarsening.graph.vertnbr();
    if coarse_nbr as f64 > prm.rat * fine_nbr as f64 {
        log::debug!(
            "coarsening stalled at level {} ({fine_nbr} -> {coarse_nbr}); solving directly",
            bg.level
        );
        return prm.low.run(bg, ctx);
    }

    let mut coarse = BipartGraph::new(
        coarsening.graph.clone(),
        bg.domain_weights,
        bg.domain_dist,
        0.0,
    );
    // Loads are conserved by contraction, so the envelope carries over.
    coarse.load0_avg = bg.load0_avg;
    coarse.load0_min = bg.load0_min;
    coarse.load0_max = bg.load0_max;
    coarse.comm_load_extern0 = bg.comm_load_extern0;
    coarse.level = bg.level + 1;
    if let Some(gains) = &bg.extern_gains {
        let coarse_gains = coarsening
            .multinodes
            .iter()
            .map(|&(a, b)| {
                if a == b {
                    gains[a]
                } else {
                    gains[a] + gains[b]
                }
            })
            .collect();
        coarse.extern_gains = Some(coarse_gains);
    }
    coarse.recompute();

    run(&mut coarse, prm, ctx)?;

    // Project the coarse solution and rebuild everything derived.
    for (c, &(a, b)) in coarsening.multinodes.iter().enumerate() {
        bg.parts[a] = coarse.parts[c];
        bg.parts[b] = coarse.parts[c];
    }
    bg.recompute();
    bg.assert_consistent();
    prm.asc.run(bg, ctx)
}
