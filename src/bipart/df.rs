//! Diffusion refinement on anchored band graphs.
//!
//! Two liquids are injected at the anchors: `-l` at the part-0 anchor and
//! `velosum - l` (tilted by an epsilon so exact ties drain to part 0) at
//! the part-1 anchor, where `l` is the target part-0 load. Each pass
//! relaxes every vertex toward the dilation-weighted average of its
//! neighbors, with external gains acting as virtual edges to the matching
//! anchor and the vertex load as an attractor pulling the field toward
//! zero. The sign of the converged field selects the part. A `NaN`
//! appearing anywhere aborts the process and rolls back to the previous
//! pass. Passes are embarrassingly parallel and are chunked over the
//! worker pool with a canonical sequential reduction, so results do not
//! depend on the worker count.

use crate::bipart::{BipartGraph, DfParams};
use crate::context::Context;
use crate::error::Result;
use crate::graph::Num;
use rayon::prelude::*;

const EPSILON: f64 = 1.0 / (1u64 << 53) as f64;
const PAR_CHUNK: usize = 1024;
const PAR_THRESHOLD: usize = 2048;

pub(crate) fn refine(bg: &mut BipartGraph, prm: &DfParams, ctx: &mut Context) -> Result<()> {
    let [a0, a1] = match bg.anchors {
        Some(anchors) => anchors,
        None => {
            log::warn!("diffusion refinement needs an anchored band graph; skipping");
            return Ok(());
        }
    };
    let n = bg.graph.vertnbr();
    if n < 3 {
        return Ok(());
    }
    let dist = bg.domain_dist.max(1) as f64;

    // Per-vertex inverse of the outgoing capacity: dilation-weighted edge
    // load sum plus the absolute external gain, the anchors additionally
    // carrying the summed external gains of their side.
    let mut pos_sum = 0 as Num;
    let mut neg_sum = 0 as Num;
    let mut inverse = vec![0.0f64; n];
    for v in 0..n {
        let veex = bg.extern_gain(v);
        if veex > 0 {
            pos_sum += veex;
        } else {
            neg_sum -= veex;
        }
        inverse[v] = bg.graph.incident_load(v) as f64 * dist + veex.abs() as f64;
    }
    inverse[a0] += pos_sum as f64;
    inverse[a1] += neg_sum as f64;
    for v in 0..n {
        if inverse[v] == 0.0 {
            inverse[v] = 1.0; // isolated unloaded vertex; field stays zero
        }
        inverse[v] = 1.0 / inverse[v];
    }

    // Target part-0 load: the average in balancing mode, else the current
    // load clamped into the envelope.
    let target0 = if prm.balance {
        bg.load0_avg
    } else {
        bg.load0.clamp(bg.load0_min, bg.load0_max)
    };
    let inject0 = -(target0 as f64);
    let inject1 = (bg.graph.load_sum() - target0) as f64 - EPSILON;

    let mut field_old = vec![0.0f64; n];
    let mut field_new = vec![0.0f64; n];
    field_old[a0] = inject0 * inverse[a0];
    field_old[a1] = inject1 * inverse[a1];

    let plain_end = if a0 == n - 2 && a1 == n - 1 { n - 2 } else { 0 };

    for pass in 0..prm.passes {
        let anchor_old = [field_old[a0], field_old[a1]];
        let mut into_anchor = [0.0f64; 2];
        let mut aborted = false;

        let parallel = plain_end >= PAR_THRESHOLD && ctx.pool().is_some();
        if parallel {
            let pool = ctx.pool().unwrap();
            let shared: &BipartGraph = bg;
            let field_old_ref = &field_old;
            let inverse_ref = &inverse;
            let partials: Vec<(f64, f64, bool)> = pool.install(|| {
                field_new[..plain_end]
                    .par_chunks_mut(PAR_CHUNK)
                    .enumerate()
                    .map(|(chunk_idx, out)| {
                        let base = chunk_idx * PAR_CHUNK;
                        let mut acc = (0.0f64, 0.0f64, false);
                        for (i, slot) in out.iter_mut().enumerate() {
                            let v = base + i;
                            let (value, c0, c1, nan) =
                                relax(shared, v, dist, field_old_ref, anchor_old, inverse_ref);
                            *slot = value;
                            acc.0 += c0;
                            acc.1 += c1;
                            acc.2 |= nan;
                        }
                        acc
                    })
                    .collect()
            });
            // Canonical in-order reduction keeps results bit-identical.
            for (c0, c1, nan) in partials {
                into_anchor[0] += c0;
                into_anchor[1] += c1;
                aborted |= nan;
            }
        } else {
            for v in 0..n {
                if v == a0 || v == a1 {
                    continue;
                }
                let (value, c0, c1, nan) = relax(bg, v, dist, &field_old, anchor_old, &inverse);
                field_new[v] = value;
                into_anchor[0] += c0;
                into_anchor[1] += c1;
                aborted |= nan;
            }
        }

        // Anchors: neighbor flow, external-gain flow, doubled injection.
        for (side, &a) in [a0, a1].iter().enumerate() {
            let mut raw: f64 = bg
                .graph
                .edge_range(a)
                .map(|e| field_old[bg.graph.edge_target(e)] * bg.graph.edge_load(e) as f64 * dist)
                .sum();
            raw += into_anchor[side];
            raw += 2.0 * if side == 0 { inject0 } else { inject1 };
            let value = attract(raw, bg.graph.vertex_load(a) as f64);
            aborted |= value.is_nan();
            field_new[a] = value * inverse[a];
        }

        if aborted {
            log::warn!("diffusion overflow at pass {pass}; rolling back one pass");
            break; // field_old still holds the last valid state
        }
        std::mem::swap(&mut field_old, &mut field_new);
    }

    let mut parts = vec![0u8; n];
    for v in 0..n {
        parts[v] = (field_old[v] > 0.0) as u8;
    }
    parts[a0] = 0;
    parts[a1] = 1;
    bg.set_parts(parts);
    bg.assert_consistent();
    Ok(())
}

/// One relaxation of a non-anchor vertex; returns the new field value, the
/// contributions flowing into the two anchors, and a `NaN` flag.
fn relax(
    bg: &BipartGraph,
    v: usize,
    dist: f64,
    field_old: &[f64],
    anchor_old: [f64; 2],
    inverse: &[f64],
) -> (f64, f64, f64, bool) {
    let mut raw = 0.0f64;
    for e in bg.graph.edge_range(v) {
        raw += field_old[bg.graph.edge_target(e)] * bg.graph.edge_load(e) as f64 * dist;
    }
    let mut into0 = 0.0;
    let mut into1 = 0.0;
    let veex = bg.extern_gain(v);
    if veex > 0 {
        raw += veex as f64 * anchor_old[0];
        into0 = veex as f64 * field_old[v];
    } else if veex < 0 {
        raw -= veex as f64 * anchor_old[1];
        into1 = -(veex as f64) * field_old[v];
    }
    let value = attract(raw, bg.graph.vertex_load(v) as f64);
    (value * inverse[v], into0, into1, value.is_nan())
}

/// Pull the field toward zero by the vertex load, clamped so the sign is
/// preserved.
fn attract(raw: f64, load: f64) -> f64 {
    if raw.is_nan() {
        return raw;
    }
    if raw >= 0.0 {
        let pulled = raw - load;
        if pulled <= 0.0 {
            EPSILON
        } else {
            pulled
        }
    } else {
        let pulled = raw + load;
        if pulled >= 0.0 {
            -EPSILON
        } else {
            pulled
        }
    }
}
