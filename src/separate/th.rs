//! Separator thinning.
//!
//! A separator vertex whose non-separator neighbors all lie on one side
//! separates nothing: it can join the other side, shrinking the separator
//! at no cost. One sweep over the separator list suffices, vertices being
//! re-examined through the swap-removal order.

use crate::error::Result;
use crate::separate::SepGraph;

pub(crate) fn thin(sg: &mut SepGraph) -> Result<()> {
    let mut len = sg.frontier.len();
    let mut i = 0;
    while i < len {
        let v = sg.frontier[i];
        let mut cut = [0usize; 3];
        for &u in sg.graph.neighbors(v) {
            cut[sg.parts[u] as usize] += 1;
        }
        let target = if cut[0] == 0 {
            1u8
        } else if cut[1] == 0 {
            0u8
        } else {
            i += 1;
            continue;
        };
        sg.parts[v] = target;
        let load = sg.graph.vertex_load(v);
        sg.loads[2] -= load;
        sg.sizes[2] -= 1;
        sg.loads[target as usize] += load;
        sg.sizes[target as usize] += 1;
        len -= 1;
        sg.frontier[i] = sg.frontier[len];
    }
    sg.frontier.truncate(len);
    sg.load_delta = sg.dwghts[1] * sg.loads[0] - sg.dwghts[0] * sg.loads[1];
    sg.assert_consistent();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn one_sided_separator_vertex_is_absorbed() {
        // Path 0-1-2-3; make both 1 and 2 separator, sides {0} and {3}.
        let g = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        let mut sg = SepGraph::new(g);
        sg.set_parts(vec![0, 2, 2, 1]);
        thin(&mut sg).unwrap();
        // One of the two separator vertices suffices.
        assert_eq!(sg.sizes()[2], 1);
        assert!(sg.check().is_ok());
    }
}
