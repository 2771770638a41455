//! Ordering tasks and the ordering method family.
//!
//! An [`OrderTask`] is the active object of ordering strategies: a halo
//! subgraph of the original matrix graph, the map from its plain vertices
//! back to the original, and the global rank range it must fill. Methods
//! append `(vertex, rank)` assignments and build the separator tree node
//! of their range. Methods: `n` nested dissection, `d` minimum degree,
//! `s` natural order.

pub mod md;
pub mod nd;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::graph::{Graph, HaloGraph};
use crate::order::{Order, OrderNode};
use crate::separate::{self, SepMethod};
use crate::strategy::parser::key_matches;
use crate::strategy::{Active, Method, Parser, Strategy};
use std::fmt;

/// The active object of ordering strategies.
#[derive(Debug)]
pub struct OrderTask {
    /// The subgraph to order, halo suffix included.
    pub(crate) sub: HaloGraph,
    /// Original vertex of every local vertex, plain first.
    pub(crate) map: Vec<usize>,
    /// First global rank of this task's range.
    pub(crate) rank_base: usize,
    pub(crate) level: u32,
    /// Output: `(original vertex, global rank)` pairs.
    pub(crate) assignments: Vec<(usize, usize)>,
    /// Output: separator tree node of this range.
    pub(crate) tree: Option<OrderNode>,
}

impl OrderTask {
    /// The root task over a whole graph.
    pub fn root(graph: Graph) -> OrderTask {
        let vertnbr = graph.vertnbr();
        OrderTask {
            sub: HaloGraph::from_graph(graph),
            map: (0..vertnbr).collect(),
            rank_base: 0,
            level: 0,
            assignments: Vec::new(),
            tree: None,
        }
    }

    /// Number of vertices this task must order.
    pub fn plain_count(&self) -> usize {
        self.sub.plain_count()
    }

    /// Record a leaf ordering of the local plain vertices: `local_order`
    /// lists them in rank order.
    pub(crate) fn emit_leaf(&mut self, local_order: &[usize]) {
        debug_assert_eq!(local_order.len(), self.plain_count());
        for (offset, &local) in local_order.iter().enumerate() {
            self.assignments.push((self.map[local], self.rank_base + offset));
        }
        self.tree = Some(OrderNode::Leaf {
            lo: self.rank_base,
            hi: self.rank_base + local_order.len(),
        });
    }
}

/// Saved output state for `Select`.
#[derive(Clone, Debug)]
pub struct OrderState {
    assignments: Vec<(usize, usize)>,
    tree: Option<OrderNode>,
}

impl Active for OrderTask {
    type Snapshot = OrderState;

    fn save(&self) -> OrderState {
        OrderState {
            assignments: self.assignments.clone(),
            tree: self.tree.clone(),
        }
    }

    fn restore(&mut self, s: OrderState) {
        self.assignments = s.assignments;
        self.tree = s.tree;
    }

    fn objective(&self) -> (f64, f64) {
        // Orderings carry no cheap scalar quality; `Select` keeps the
        // first completed branch.
        (0.0, 0.0)
    }

    fn attr(&self, name: &str) -> Option<f64> {
        match name {
            "vert" => Some(self.plain_count() as f64),
            "edge" => Some(self.sub.graph().edgenbr() as f64),
            "load" => Some(self.sub.graph().load_sum() as f64),
            "levl" => Some(self.level as f64),
            _ => None,
        }
    }
}

/// Parameters of nested dissection.
#[derive(Clone, Debug, PartialEq)]
pub struct NdParams {
    /// Dissect only above this many vertices.
    pub vert: usize,
    /// Separation strategy.
    pub sep: Box<Strategy<SepMethod>>,
    /// Ordering strategy for the leaves.
    pub ole: Box<Strategy<OrderMethod>>,
    /// Ordering strategy for the separators.
    pub ose: Box<Strategy<OrderMethod>>,
}

impl Default for NdParams {
    fn default() -> Self {
        NdParams {
            vert: 120,
            sep: Box::new(separate::default_strategy()),
            ole: Box::new(Strategy::Method(OrderMethod::MinDegree)),
            ose: Box::new(Strategy::Method(OrderMethod::Natural)),
        }
    }
}

/// The ordering method family.
#[derive(Clone, Debug, PartialEq)]
pub enum OrderMethod {
    /// `n` -- nested dissection.
    Nd(NdParams),
    /// `d` -- minimum degree.
    MinDegree,
    /// `s` -- natural order.
    Natural,
}

impl fmt::Display for OrderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderMethod::Nd(p) => {
                write!(f, "n{{vert={},sep={},ole={},ose={}}}", p.vert, p.sep, p.ole, p.ose)
            }
            OrderMethod::MinDegree => write!(f, "d"),
            OrderMethod::Natural => write!(f, "s"),
        }
    }
}

impl Method for OrderMethod {
    type Active = OrderTask;

    const ATTRS: &'static [&'static str] = &["vert", "edge", "load", "levl"];

    fn apply(&self, active: &mut OrderTask, ctx: &mut Context) -> Result<()> {
        match self {
            OrderMethod::Nd(p) => nd::run(active, p, ctx),
            OrderMethod::MinDegree => md::run(active),
            OrderMethod::Natural => {
                let order: Vec<usize> = (0..active.plain_count()).collect();
                active.emit_leaf(&order);
                Ok(())
            }
        }
    }

    fn parse(name: char, parser: &mut Parser<'_>) -> Result<Self> {
        match name {
            'n' => {
                let mut p = NdParams::default();
                parser.params(|parser, key| {
                    if key_matches(key, "vert") {
                        p.vert = parser.int_value()? as usize;
                    } else if key_matches(key, "sep") {
                        p.sep = Box::new(parser.strat_value()?);
                    } else if key_matches(key, "ole") {
                        p.ole = Box::new(parser.strat_value()?);
                    } else if key_matches(key, "ose") {
                        p.ose = Box::new(parser.strat_value()?);
                    } else {
                        return Ok(false);
                    }
                    Ok(true)
                })?;
                Ok(OrderMethod::Nd(p))
            }
            'd' => {
                parser.params(|_, _| Ok(false))?;
                Ok(OrderMethod::MinDegree)
            }
            's' => {
                parser.params(|_, _| Ok(false))?;
                Ok(OrderMethod::Natural)
            }
            other => Err(parser.error(format!("unknown ordering method '{other}'"))),
        }
    }
}

/// The default ordering strategy: nested dissection with minimum-degree
/// leaves and naturally ordered separators.
pub fn default_strategy() -> Strategy<OrderMethod> {
    Strategy::Method(OrderMethod::Nd(NdParams::default()))
}

/// Run an ordering strategy over a graph and assemble the result.
pub fn order_graph(
    graph: &Graph,
    strat: &Strategy<OrderMethod>,
    ctx: &mut Context,
) -> Result<Order> {
    ctx.commit()?;
    let mut task = OrderTask::root(graph.clone());
    strat.run(&mut task, ctx)?;
    if task.assignments.is_empty() && graph.vertnbr() > 0 {
        // An empty strategy orders naturally.
        let order: Vec<usize> = (0..task.plain_count()).collect();
        task.emit_leaf(&order);
    }

    let vertnbr = graph.vertnbr();
    let mut perm = vec![usize::MAX; vertnbr];
    for &(v, rank) in &task.assignments {
        if v >= vertnbr || rank >= vertnbr || perm[v] != usize::MAX {
            return Err(Error::internal("ordering emitted an invalid assignment"));
        }
        perm[v] = rank;
    }
    if perm.iter().any(|&rank| rank == usize::MAX) {
        return Err(Error::internal("ordering left vertices unnumbered"));
    }
    let tree = task.tree.unwrap_or(OrderNode::Leaf {
        lo: 0,
        hi: vertnbr,
    });
    let order = Order::new(graph.base(), perm, tree)?;
    order.check()?;
    Ok(order)
}
