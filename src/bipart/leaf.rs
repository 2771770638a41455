//! Trivial bipartition leaves: exhaustive search and the zero solution.

use crate::bipart::BipartGraph;
use crate::error::Result;
use crate::strategy::Active;
use ordered_float::OrderedFloat;

/// Largest vertex count exhaustive search will enumerate.
const EXHAUSTIVE_MAX: usize = 12;

/// Try every assignment of a tiny graph and keep the best objective.
pub(crate) fn exhaustive(bg: &mut BipartGraph) -> Result<()> {
    let n = bg.graph.vertnbr();
    if n == 0 {
        return Ok(());
    }
    if n > EXHAUSTIVE_MAX {
        log::warn!("exhaustive bipartitioning skipped: {n} vertices is too many");
        return Ok(());
    }
    let mut best_mask = 0u32;
    let mut best_key = (OrderedFloat(f64::INFINITY), OrderedFloat(f64::INFINITY));
    for mask in 0u32..1 << n {
        let parts: Vec<u8> = (0..n).map(|v| ((mask >> v) & 1) as u8).collect();
        bg.set_parts(parts);
        let obj = bg.objective();
        let key = (OrderedFloat(obj.0), OrderedFloat(obj.1));
        if key < best_key {
            best_key = key;
            best_mask = mask;
        }
    }
    bg.set_parts((0..n).map(|v| ((best_mask >> v) & 1) as u8).collect());
    bg.assert_consistent();
    Ok(())
}

/// Put every vertex in part 0.
pub(crate) fn zero(bg: &mut BipartGraph) -> Result<()> {
    let n = bg.graph.vertnbr();
    bg.set_parts(vec![0; n]);
    Ok(())
}
