//! Dual recursive bipartitioning.
//!
//! The architecture domain and the vertex set are split together: at each
//! step the current domain bipartitions into two subdomains, the induced
//! subgraph is bipartitioned between them under their capacity weights and
//! distance, and the two halves recurse until terminal domains. Edges
//! leaving the subgraph bias the bipartition through per-vertex external
//! gains derived from the current domains of outside neighbors, so
//! already-placed vertices pull their neighbors toward nearby subdomains.

use crate::arch::{Arch, Dom};
use crate::bipart::BipartGraph;
use crate::context::Context;
use crate::error::Result;
use crate::graph::induce::induce_list;
use crate::graph::Num;
use crate::kway::{KwayGraph, RbParams};

pub(crate) fn run(kg: &mut KwayGraph, prm: &RbParams, ctx: &mut Context) -> Result<()> {
    let arch = kg.mapping.arch().clone();
    let free: Vec<usize> = (0..kg.graph.vertnbr())
        .filter(|&v| !kg.is_fixed(v))
        .collect();
    let root = arch.first_domain();
    bisect(kg, &arch, root, free, prm, ctx)?;
    kg.recompute();
    kg.assert_consistent();
    Ok(())
}

fn bisect(
    kg: &mut KwayGraph,
    arch: &Arch,
    dom: Dom,
    verts: Vec<usize>,
    prm: &RbParams,
    ctx: &mut Context,
) -> Result<()> {
    if verts.is_empty() {
        return Ok(());
    }
    let (d0, d1) = match arch.dom_bipart(&dom) {
        Some(split) => split,
        None => {
            // Terminal domain: place the whole subset.
            let part = kg.mapping.push_domain(dom);
            for &v in &verts {
                kg.mapping.assign(v, part);
            }
            return Ok(());
        }
    };

    let (sub, map) = induce_list(&kg.graph, &verts);
    let weights = [arch.dom_weight(&d0), arch.dom_weight(&d1)];
    let dist = arch.dom_dist(&d0, &d1);

    // External gains from neighbors outside the subset, measured against
    // their current (possibly intermediate) domains.
    let mut in_set = vec![false; kg.graph.vertnbr()];
    for &v in &verts {
        in_set[v] = true;
    }
    let mut gains = vec![0 as Num; sub.vertnbr()];
    let mut extern0 = 0;
    let mut any_extern = false;
    for (i, &v) in map.iter().enumerate() {
        for e in kg.graph.edge_range(v) {
            let u = kg.graph.edge_target(e);
            if in_set[u] {
                continue;
            }
            any_extern = true;
            let du = kg.mapping.domain_of(u);
            let load = kg.graph.edge_load(e);
            let to0 = arch.dom_dist(&d0, du) * load;
            let to1 = arch.dom_dist(&d1, du) * load;
            extern0 += to0;
            gains[i] += to1 - to0;
        }
    }

    let mut bg = BipartGraph::new(sub, weights, dist, prm.balance);
    if any_extern {
        bg.set_extern(gains, extern0);
    }
    prm.sep.run(&mut bg, ctx)?;

    let mut verts0 = Vec::new();
    let mut verts1 = Vec::new();
    for (i, &v) in map.iter().enumerate() {
        if bg.parts()[i] == 0 {
            verts0.push(v);
        } else {
            verts1.push(v);
        }
    }

    // Publish both halves before recursing so later subproblems see the
    // refined neighbor domains.
    let part0 = kg.mapping.push_domain(d0.clone());
    for &v in &verts0 {
        kg.mapping.assign(v, part0);
    }
    let part1 = kg.mapping.push_domain(d1.clone());
    for &v in &verts1 {
        kg.mapping.assign(v, part1);
    }

    bisect(kg, arch, d0, verts0, prm, ctx)?;
    bisect(kg, arch, d1, verts1, prm, ctx)
}
