//! # Tartan
//!
//! A toolkit for three tightly related problems on large sparse graphs:
//!
//! - **Static mapping** -- assign the vertices of a weighted graph to the
//!   processors of a target architecture, minimizing a dilation-weighted
//!   communication cost under a load-balance envelope.
//! - **Graph partitioning** -- the special case of mapping onto a complete
//!   architecture of `k` identical processors.
//! - **Sparse matrix ordering** -- nested-dissection vertex orderings that
//!   keep Cholesky fill-in low.
//!
//! All three are driven by the same machinery: a **multilevel engine**
//! (coarsen, solve at the base, project and refine on the way up),
//! a family of **refinement kernels** (gain-bucket Fiduccia–Mattheyses,
//! diffusion on anchored band graphs), and a small **strategy language**
//! whose compiled trees prescribe how methods combine ([`Strategy`]).
//!
//! ## Quick start
//!
//! ```
//! use tartan::{partition, testing, Context};
//!
//! # fn main() -> tartan::Result<()> {
//! let graph = testing::grid_graph(8, 8);
//! let mut ctx = Context::with_seed(1);
//! let parts = partition(&graph, 4, &mut ctx)?;
//! assert_eq!(parts.len(), 64);
//! assert!(parts.iter().all(|&p| p < 4));
//! # Ok(())
//! # }
//! ```
//!
//! Orderings work the same way:
//!
//! ```
//! use tartan::{order, stats, testing, Context};
//!
//! # fn main() -> tartan::Result<()> {
//! let graph = testing::grid_graph(8, 8);
//! let mut ctx = Context::with_seed(1);
//! let order = order(&graph, &mut ctx)?;
//! let report = stats::order_stats(&graph, &order)?;
//! assert!(report.factor_nonzeros >= 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Strategies
//!
//! Every solver takes a [`Strategy`] tree: `|` selects the better of two
//! outcomes, juxtaposition sequences, `/test?then:else;` branches on graph
//! attributes, and single letters invoke methods with `{key=value}`
//! parameters. Strings parse into typed trees and print back:
//!
//! ```
//! use tartan::strategy::parse;
//! use tartan::MapMethod;
//!
//! # fn main() -> tartan::Result<()> {
//! let strat = parse::<MapMethod>("m{vert=10,low=r,asc=f{move=20,bal=0.05}}")?;
//! let reparsed = parse::<MapMethod>(&strat.to_string())?;
//! assert_eq!(strat, reparsed);
//! # Ok(())
//! # }
//! ```
//!
//! An empty strategy string selects a safe default for each task; see
//! [`map_strategy`] and [`order_strategy`].
//!
//! ## Module overview
//!
//! - [`graph`] -- compressed-adjacency graphs, coarsening, induction, band
//!   extraction, halo graphs
//! - [`arch`] -- target architectures and their domain algebra
//! - [`strategy`] -- the strategy trees, parser and interpreter
//! - [`bipart`], [`separate`], [`kway`], [`ordering`] -- the active graph
//!   types and their method families
//! - [`mapping`], [`order`] -- result types
//! - [`io`] -- text formats for graphs, mappings and orderings
//! - [`stats`] -- quality reports (load balance, cut, symbolic fill-in)
//! - [`context`] -- random streams, worker pools, options, error sink
//! - [`testing`] -- graph builders and assertions for test suites
//!
//! ## Determinism
//!
//! For a fixed context seed and worker count, every entry point produces
//! bit-identical results: random orders come from the context's stream,
//! gain buckets are FIFO-fair, and parallel reductions run in a canonical
//! order.

pub mod arch;
pub mod bipart;
pub mod context;
pub mod error;
pub mod gain;
pub mod graph;
pub mod io;
pub mod kway;
pub mod mapping;
pub mod order;
pub mod ordering;
pub mod separate;
pub mod stats;
pub mod strategy;
pub mod testing;

pub use arch::{Arch, Dom};
pub use bipart::{BipartGraph, BipartMethod};
pub use context::{Context, ContextOption};
pub use error::{Error, Result};
pub use graph::{Graph, HaloGraph, Num};
pub use kway::{KwayGraph, MapMethod};
pub use mapping::Mapping;
pub use order::{Order, OrderNode};
pub use ordering::{OrderMethod, OrderTask};
pub use separate::{SepGraph, SepMethod};
pub use strategy::{Active, Method, Strategy, TestExpr};

use strategy::parse;

/// Partition a graph into `parts` equal parts with the default strategy.
///
/// Returns the part index of every vertex.
pub fn partition(graph: &Graph, parts: usize, ctx: &mut Context) -> Result<Vec<usize>> {
    partition_with(graph, parts, &kway::default_strategy(), ctx)
}

/// Partition a graph into `parts` equal parts with an explicit strategy.
pub fn partition_with(
    graph: &Graph,
    parts: usize,
    strat: &Strategy<MapMethod>,
    ctx: &mut Context,
) -> Result<Vec<usize>> {
    let arch = Arch::complete(parts)?;
    let mapping = map_with(graph, &arch, strat, ctx)?;
    mapping.terminals()
}

/// Map a graph onto a target architecture with the default strategy.
pub fn map(graph: &Graph, arch: &Arch, ctx: &mut Context) -> Result<Mapping> {
    map_with(graph, arch, &kway::default_strategy(), ctx)
}

/// Map a graph onto a target architecture with an explicit strategy.
pub fn map_with(
    graph: &Graph,
    arch: &Arch,
    strat: &Strategy<MapMethod>,
    ctx: &mut Context,
) -> Result<Mapping> {
    ctx.commit()?;
    let mut kg = KwayGraph::new(graph.clone(), arch.clone(), 0.05);
    strat.run(&mut kg, ctx).map_err(|err| {
        ctx.report(&err);
        err
    })?;
    Ok(kg.mapping().clone())
}

/// Order a graph for low fill-in with the default strategy.
pub fn order(graph: &Graph, ctx: &mut Context) -> Result<Order> {
    order_with(graph, &ordering::default_strategy(), ctx)
}

/// Order a graph with an explicit ordering strategy.
pub fn order_with(
    graph: &Graph,
    strat: &Strategy<OrderMethod>,
    ctx: &mut Context,
) -> Result<Order> {
    ordering::order_graph(graph, strat, ctx).map_err(|err| {
        ctx.report(&err);
        err
    })
}

/// Parse a mapping strategy; an empty string yields the default.
pub fn map_strategy(src: &str) -> Result<Strategy<MapMethod>> {
    if src.trim().is_empty() {
        Ok(kway::default_strategy())
    } else {
        parse::<MapMethod>(src)
    }
}

/// Parse an ordering strategy; an empty string yields the default.
pub fn order_strategy(src: &str) -> Result<Strategy<OrderMethod>> {
    if src.trim().is_empty() {
        Ok(ordering::default_strategy())
    } else {
        parse::<OrderMethod>(src)
    }
}

/// Parse a bipartitioning strategy; an empty string yields the default.
pub fn bipart_strategy(src: &str) -> Result<Strategy<BipartMethod>> {
    if src.trim().is_empty() {
        Ok(bipart::default_strategy())
    } else {
        parse::<BipartMethod>(src)
    }
}

/// Parse a separation strategy; an empty string yields the default.
pub fn sep_strategy(src: &str) -> Result<Strategy<SepMethod>> {
    if src.trim().is_empty() {
        Ok(separate::default_strategy())
    } else {
        parse::<SepMethod>(src)
    }
}
