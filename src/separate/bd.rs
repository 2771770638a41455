//! Band restriction of separator refinement.
//!
//! The band is grown from the separator itself; outside vertices belong to
//! sides 0 and 1 only and collapse into the two anchors. Any separation
//! strategy may run on the band; the anchors keep their side because
//! separator FM refuses moves that would pull an anchor into the
//! separator. Parts are copied back and the state is rebuilt from scratch.

use crate::context::Context;
use crate::error::Result;
use crate::graph::band::extract_band;
use crate::separate::{BandParams, SepGraph};

pub(crate) fn refine(sg: &mut SepGraph, prm: &BandParams, ctx: &mut Context) -> Result<()> {
    let band = match extract_band(&sg.graph, &sg.parts, &sg.frontier, prm.width) {
        Some(band) => band,
        None => {
            log::debug!("no usable separator band; applying the fallback strategy");
            return prm.org.run(sg, ctx);
        }
    };

    let mut sub = SepGraph::with_weights(band.graph.clone(), sg.dwghts);
    sub.level = sg.level;
    sub.anchors = Some(band.anchors);

    let mut parts = vec![0u8; band.graph.vertnbr()];
    for (i, &v) in band.band_to_orig.iter().enumerate() {
        parts[i] = sg.parts[v];
    }
    parts[band.anchors[0]] = 0;
    parts[band.anchors[1]] = 1;
    sub.set_parts(parts);

    prm.bnd.run(&mut sub, ctx)?;

    for (i, &v) in band.band_to_orig.iter().enumerate() {
        sg.parts[v] = sub.parts[i];
    }
    sg.recompute();
    sg.assert_consistent();
    Ok(())
}
