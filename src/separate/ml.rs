//! Multilevel vertex separation.

use crate::context::Context;
use crate::error::Result;
use crate::graph::coarsen::coarsen;
use crate::separate::{MlParams, SepGraph};

pub(crate) fn run(sg: &mut SepGraph, prm: &MlParams, ctx: &mut Context) -> Result<()> {
    let fine_nbr = sg.graph.vertnbr();
    if fine_nbr <= prm.vert || sg.level >= prm.levl || sg.anchors.is_some() {
        return prm.low.run(sg, ctx);
    }

    let coarsening = coarsen(&sg.graph, prm.policy, ctx);
    let coarse_nbr = coarsening.graph.vertnbr();
    if coarse_nbr as f64 > prm.rat * fine_nbr as f64 {
        log::debug!(
            "separation coarsening stalled at level {} ({fine_nbr} -> {coarse_nbr})",
            sg.level
        );
        return prm.low.run(sg, ctx);
    }

    let mut coarse = SepGraph::with_weights(coarsening.graph.clone(), sg.dwghts);
    coarse.level = sg.level + 1;

    run(&mut coarse, prm, ctx)?;

    // Project: both fine ends inherit the multinode's part, separator
    // membership included; then rebuild the derived state from scratch.
    for (c, &(a, b)) in coarsening.multinodes.iter().enumerate() {
        sg.parts[a] = coarse.parts[c];
        sg.parts[b] = coarse.parts[c];
    }
    sg.recompute();
    sg.assert_consistent();
    prm.asc.run(sg, ctx)
}
