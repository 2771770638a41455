//! Nested dissection.
//!
//! Above the size threshold, the separation strategy splits the plain
//! vertices into two sides and a separator. The sides recurse as halo
//! subgraphs, the separator is ordered by its own strategy, numbered after
//! both sides, and the three rank ranges concatenate into the parent's.
//! Large enough sides recurse concurrently on split contexts, each child
//! with an independent random stream, so the result does not depend on
//! the execution interleaving.

use crate::context::Context;
use crate::error::Result;
use crate::graph::induce::{induce_halo, induce_list};
use crate::order::OrderNode;
use crate::ordering::{NdParams, OrderTask};
use crate::separate::SepGraph;

/// Side size below which recursion stays sequential.
const PAR_THRESHOLD: usize = 256;

pub(crate) fn run(task: &mut OrderTask, prm: &NdParams, ctx: &mut Context) -> Result<()> {
    let plain = task.plain_count();
    if plain <= prm.vert.max(1) {
        return prm.ole.run(task, ctx);
    }

    // Separate the plain subgraph; the halo does not take part.
    let plain_verts: Vec<usize> = (0..plain).collect();
    let (sep_input, _) = induce_list(task.sub.graph(), &plain_verts);
    let mut sg = SepGraph::new(sep_input);
    sg.level = task.level;
    prm.sep.run(&mut sg, ctx)?;

    let sizes = sg.sizes();
    if sizes[0] == 0 || sizes[1] == 0 {
        // Separation made no progress; order the block as a leaf.
        log::debug!("dissection stopped on {plain} vertices: empty side");
        return prm.ole.run(task, ctx);
    }

    let mut side0 = Vec::with_capacity(sizes[0]);
    let mut side1 = Vec::with_capacity(sizes[1]);
    let mut sep = Vec::with_capacity(sizes[2]);
    for v in 0..plain {
        match sg.parts()[v] {
            0 => side0.push(v),
            1 => side1.push(v),
            _ => sep.push(v),
        }
    }

    let mut child0 = child_task(task, &side0, task.rank_base);
    let mut child1 = child_task(task, &side1, task.rank_base + side0.len());
    let mut sep_task = child_task(task, &sep, task.rank_base + side0.len() + side1.len());

    if child0.plain_count() >= PAR_THRESHOLD
        && child1.plain_count() >= PAR_THRESHOLD
        && ctx.workers() > 1
        && ctx.pool().is_some()
    {
        let (mut ctx0, mut ctx1) = ctx.split();
        let pool = ctx.pool().unwrap();
        let (r0, r1) = pool.install(|| {
            rayon::join(
                || run(&mut child0, prm, &mut ctx0),
                || run(&mut child1, prm, &mut ctx1),
            )
        });
        r0?;
        r1?;
    } else {
        run(&mut child0, prm, ctx)?;
        run(&mut child1, prm, ctx)?;
    }
    prm.ose.run(&mut sep_task, ctx)?;

    task.assignments.append(&mut child0.assignments);
    task.assignments.append(&mut child1.assignments);
    task.assignments.append(&mut sep_task.assignments);
    let children = vec![
        child0.tree.take().unwrap_or(OrderNode::Leaf {
            lo: child0.rank_base,
            hi: child0.rank_base,
        }),
        child1.tree.take().unwrap_or(OrderNode::Leaf {
            lo: child1.rank_base,
            hi: child1.rank_base,
        }),
    ];
    task.tree = Some(OrderNode::Sep {
        children,
        lo: sep_task.rank_base,
        hi: sep_task.rank_base + sep.len(),
    });
    Ok(())
}

/// Build the halo subtask over a set of parent-local plain vertices.
fn child_task(parent: &OrderTask, verts: &[usize], rank_base: usize) -> OrderTask {
    let (sub, local_map) = induce_halo(parent.sub.graph(), verts);
    let map = local_map.iter().map(|&l| parent.map[l]).collect();
    OrderTask {
        sub,
        map,
        rank_base,
        level: parent.level + 1,
        assignments: Vec::new(),
        tree: None,
    }
}
