//! Band restriction of bipartition refinement.
//!
//! Refinement is confined to the band of vertices within a few hops of the
//! frontier; the rest of each part collapses into an anchor vertex. The
//! band inherits parts, envelope, external gains and multilevel depth from
//! the original problem, so any bipartitioning strategy can run on it
//! unchanged. The refined parts are copied back vertex by vertex and every
//! counter is recomputed from scratch on the full graph, which keeps
//! anchor-edge loads out of the final accounting by construction.

use crate::bipart::{BandParams, BipartGraph};
use crate::context::Context;
use crate::error::Result;
use crate::graph::band::extract_band;
use crate::graph::Num;

pub(crate) fn refine(bg: &mut BipartGraph, prm: &BandParams, ctx: &mut Context) -> Result<()> {
    let band = match extract_band(&bg.graph, &bg.parts, &bg.frontier, prm.width) {
        Some(band) => band,
        None => {
            log::debug!("no usable band; applying the fallback strategy on the whole graph");
            return prm.org.run(bg, ctx);
        }
    };

    let mut sub = BipartGraph::new(
        band.graph.clone(),
        bg.domain_weights,
        bg.domain_dist,
        0.0,
    );
    sub.load0_avg = bg.load0_avg;
    sub.load0_min = bg.load0_min;
    sub.load0_max = bg.load0_max;
    sub.comm_load_extern0 = bg.comm_load_extern0;
    sub.level = bg.level;
    sub.anchors = Some(band.anchors);
    if let Some(gains) = &bg.extern_gains {
        let mut sub_gains: Vec<Num> = band.band_to_orig.iter().map(|&v| gains[v]).collect();
        sub_gains.resize(band.graph.vertnbr(), 0); // anchors carry no gain
        sub.extern_gains = Some(sub_gains);
    }

    let mut parts = vec![0u8; band.graph.vertnbr()];
    for (i, &v) in band.band_to_orig.iter().enumerate() {
        parts[i] = bg.parts[v];
    }
    parts[band.anchors[0]] = 0;
    parts[band.anchors[1]] = 1;
    sub.set_parts(parts);

    prm.bnd.run(&mut sub, ctx)?;

    for (i, &v) in band.band_to_orig.iter().enumerate() {
        bg.parts[v] = sub.parts[i];
    }
    bg.recompute();
    bg.assert_consistent();
    Ok(())
}
