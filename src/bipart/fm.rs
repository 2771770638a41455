//! Fiduccia–Mattheyses refinement of a bipartition.
//!
//! Each pass seeds the gain table with the frontier and its one-ring,
//! performs trial moves in gain order under the balance envelope, and
//! rolls back to the best prefix seen. A vertex moves at most once per
//! pass. The frontier is rebuilt from scratch at every pass boundary and
//! the incrementally maintained communication load is checked against a
//! full recomputation in debug builds.

use crate::bipart::{BipartGraph, FmParams};
use crate::context::Context;
use crate::error::Result;
use crate::gain::GainTable;
use crate::graph::Num;

struct MoveRec {
    vertex: usize,
    gain: Num,
    dload: Num,
    from0: bool,
}

pub(crate) fn refine(bg: &mut BipartGraph, prm: &FmParams, ctx: &mut Context) -> Result<()> {
    let n = bg.graph.vertnbr();
    if n == 0 || prm.moves == 0 || prm.passes == 0 {
        return Ok(());
    }

    // Envelope, widened by the method's own balance parameter.
    let slack = (prm.balance * bg.graph.load_sum() as f64).floor() as Num;
    let env_min = bg.load0_min.min(bg.load0_avg - slack);
    let env_max = bg.load0_max.max(bg.load0_avg + slack);

    let dist = bg.domain_dist.max(1);
    let max_incident = (0..n).map(|v| bg.graph.incident_load(v)).max().unwrap_or(0);
    let gain_bound = max_incident * dist + bg.max_extern_abs();
    let mut table = GainTable::new(n, -gain_bound, gain_bound);
    let mut gains = vec![0 as Num; n];
    let mut locked = vec![false; n];
    let mut seen = vec![false; n];

    for pass in 0..prm.passes {
        table.clear();
        locked.fill(false);
        seen.fill(false);

        let mut work: Vec<usize> = bg.frontier.clone();
        if work.is_empty() {
            if bg.load0 >= env_min && bg.load0 <= env_max {
                break; // no cut and balanced: nothing to refine
            }
            work = (0..n).collect(); // rebalance an uncut solution
        }
        ctx.shuffle(&mut work);
        for &v in &work {
            enlist(bg, &mut table, &mut gains, &mut seen, v);
            for &u in bg.graph.neighbors(v) {
                enlist(bg, &mut table, &mut gains, &mut seen, u);
            }
        }

        let mut log: Vec<MoveRec> = Vec::new();
        let mut best_len = 0usize;
        let mut best_key = (bg.comm_load, (bg.load0 - bg.load0_avg).abs());

        for _ in 0..prm.moves {
            // Side whose shrinking improves balance; gain ties break
            // toward it.
            let over = if bg.load0 >= bg.load0_avg { 0u8 } else { 1u8 };
            let preferred = table.best_where(|v| {
                bg.parts[v] == over && legal(bg, v, env_min, env_max)
            });
            let fallback = table.best_where(|v| legal(bg, v, env_min, env_max));
            let vertex = match (preferred, fallback) {
                (Some(a), Some(b)) => {
                    if gains[a] >= gains[b] {
                        a
                    } else {
                        b
                    }
                }
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => break,
            };

            let gain = gains[vertex];
            let from0 = bg.parts[vertex] == 0;
            let dload = if from0 {
                -bg.graph.vertex_load(vertex)
            } else {
                bg.graph.vertex_load(vertex)
            };
            bg.parts[vertex] ^= 1;
            bg.load0 += dload;
            if from0 {
                bg.size0 -= 1;
            } else {
                bg.size0 += 1;
            }
            bg.comm_load -= gain;
            locked[vertex] = true;
            table.remove(vertex);
            log.push(MoveRec {
                vertex,
                gain,
                dload,
                from0,
            });

            for &u in bg.graph.neighbors(vertex) {
                if locked[u] || is_anchor(bg, u) {
                    continue;
                }
                let g = bg.move_gain(u);
                gains[u] = g;
                if seen[u] {
                    table.update(u, g);
                } else {
                    seen[u] = true;
                    table.insert(u, g);
                }
            }

            let key = (bg.comm_load, (bg.load0 - bg.load0_avg).abs());
            if key < best_key {
                best_key = key;
                best_len = log.len();
            }
        }

        // Roll back to the best prefix of the pass.
        while log.len() > best_len {
            let rec = log.pop().unwrap();
            bg.parts[rec.vertex] ^= 1;
            bg.load0 -= rec.dload;
            if rec.from0 {
                bg.size0 += 1;
            } else {
                bg.size0 -= 1;
            }
            bg.comm_load += rec.gain;
        }
        bg.rebuild_frontier();
        bg.assert_consistent();

        log::trace!(
            "fm pass {pass}: kept {best_len} moves, comm {} load0 {}",
            bg.comm_load,
            bg.load0
        );
        if best_len == 0 {
            break;
        }
    }
    Ok(())
}

fn enlist(
    bg: &BipartGraph,
    table: &mut GainTable,
    gains: &mut [Num],
    seen: &mut [bool],
    v: usize,
) {
    if seen[v] || is_anchor(bg, v) {
        return;
    }
    seen[v] = true;
    let g = bg.move_gain(v);
    gains[v] = g;
    table.insert(v, g);
}

fn is_anchor(bg: &BipartGraph, v: usize) -> bool {
    matches!(bg.anchors, Some(anchors) if anchors.contains(&v))
}

/// A move is legal when it keeps the part-0 load inside the envelope, or
/// strictly shrinks the violation when the load is already outside.
fn legal(bg: &BipartGraph, v: usize, env_min: Num, env_max: Num) -> bool {
    let load = bg.graph.vertex_load(v);
    let after = if bg.parts[v] == 0 {
        bg.load0 - load
    } else {
        bg.load0 + load
    };
    let violation = |l: Num| (l - env_max).max(0) + (env_min - l).max(0);
    let before = violation(bg.load0);
    if before == 0 {
        violation(after) == 0
    } else {
        violation(after) < before
    }
}
