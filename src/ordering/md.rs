//! Minimum-degree ordering of a halo subgraph.
//!
//! Straightforward elimination on an explicit fill-in graph: the vertex of
//! least degree is numbered next, its neighborhood becomes a clique, and
//! degrees update. Halo vertices take part in every neighborhood -- they
//! keep the degrees honest around the block boundary -- but are never
//! eliminated or numbered. Ties break toward the lowest vertex index, so
//! the ordering is deterministic.

use crate::error::Result;
use crate::ordering::OrderTask;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

pub(crate) fn run(task: &mut OrderTask) -> Result<()> {
    let graph = task.sub.graph();
    let n = graph.vertnbr();
    let plain = task.plain_count();
    if plain == 0 {
        task.emit_leaf(&[]);
        return Ok(());
    }

    let mut adjacency: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    for v in 0..n {
        for &u in graph.neighbors(v) {
            adjacency[v].insert(u);
            adjacency[u].insert(v); // halo edges only exist outbound
        }
    }

    let mut heap: BinaryHeap<Reverse<(usize, usize)>> = (0..plain)
        .map(|v| Reverse((adjacency[v].len(), v)))
        .collect();
    let mut eliminated = vec![false; n];
    let mut order = Vec::with_capacity(plain);

    while order.len() < plain {
        let Some(Reverse((degree, v))) = heap.pop() else {
            return Err(crate::error::Error::internal(
                "minimum degree ran out of candidates",
            ));
        };
        if eliminated[v] || degree != adjacency[v].len() {
            continue; // stale entry
        }
        eliminated[v] = true;
        order.push(v);

        let neighbors: Vec<usize> = adjacency[v].iter().copied().collect();
        for &u in &neighbors {
            adjacency[u].remove(&v);
        }
        // The eliminated vertex's neighborhood becomes a clique.
        for i in 0..neighbors.len() {
            for j in i + 1..neighbors.len() {
                let (a, b) = (neighbors[i], neighbors[j]);
                if adjacency[a].insert(b) {
                    adjacency[b].insert(a);
                }
            }
        }
        for &u in &neighbors {
            if u < plain && !eliminated[u] {
                heap.push(Reverse((adjacency[u].len(), u)));
            }
        }
    }

    task.emit_leaf(&order);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn star_center_is_numbered_last() {
        // K(1,4): every leaf has degree 1, the center degree 4.
        let g = Graph::from_edges(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]).unwrap();
        let mut task = OrderTask::root(g);
        run(&mut task).unwrap();
        let last = task
            .assignments
            .iter()
            .find(|&&(_, rank)| rank == 4)
            .unwrap()
            .0;
        assert_eq!(last, 0);
    }
}
