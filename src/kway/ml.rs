//! Multilevel mapping.
//!
//! Coarsening carries the architecture and the current domain assignments
//! down (each multinode inherits its first constituent's domain); the
//! coarse mapping is computed by the base strategy, projected back onto
//! both fine end points, and refined by the ascending strategy at every
//! level. Fixed vertices disable coarsening, since a multinode cannot
//! honor two different terminals.

use crate::context::Context;
use crate::error::Result;
use crate::graph::coarsen::coarsen;
use crate::kway::{KwayGraph, MlParams};
use crate::mapping::Mapping;

pub(crate) fn run(kg: &mut KwayGraph, prm: &MlParams, ctx: &mut Context) -> Result<()> {
    let fine_nbr = kg.graph.vertnbr();
    if fine_nbr <= prm.vert || kg.level >= prm.levl || kg.fixed.is_some() {
        return prm.low.run(kg, ctx);
    }

    let coarsening = coarsen(&kg.graph, prm.policy, ctx);
    let coarse_nbr = coarsening.graph.vertnbr();
    if coarse_nbr as f64 > prm.rat * fine_nbr as f64 {
        log::debug!(
            "mapping coarsening stalled at level {} ({fine_nbr} -> {coarse_nbr})",
            kg.level
        );
        return prm.low.run(kg, ctx);
    }

    let mut coarse = KwayGraph::new(
        coarsening.graph.clone(),
        kg.mapping.arch().clone(),
        kg.balance,
    );
    let coarse_parts: Vec<usize> = coarsening
        .multinodes
        .iter()
        .map(|&(a, _)| kg.mapping.part_of(a))
        .collect();
    coarse
        .mapping
        .set_state(kg.mapping.domains().to_vec(), coarse_parts);
    coarse.level = kg.level + 1;
    coarse.recompute();

    run(&mut coarse, prm, ctx)?;

    // Project the coarse mapping and rebuild the derived state.
    let fine_parts: Vec<usize> = {
        let mut parts = vec![0usize; fine_nbr];
        for (c, &(a, b)) in coarsening.multinodes.iter().enumerate() {
            parts[a] = coarse.mapping.part_of(c);
            parts[b] = coarse.mapping.part_of(c);
        }
        parts
    };
    kg.mapping
        .set_state(coarse.mapping.domains().to_vec(), fine_parts);
    kg.recompute();
    kg.assert_consistent();
    prm.asc.run(kg, ctx)
}
