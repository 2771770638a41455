//! K-way mapped graphs and the mapping method family.
//!
//! A [`KwayGraph`] pairs a graph with a [`Mapping`] onto a target
//! architecture, plus the cached per-domain loads, frontier and
//! dilation-weighted communication load. Methods: `r` dual recursive
//! bipartitioning (the architecture domain and the vertex set are split
//! together, already-mapped neighbors biasing each bipartition through
//! external gains), `m` multilevel, and `f` direct k-way FM refinement.
//! Vertices may be fixed to a terminal beforehand; fixed vertices never
//! move but fully participate in gain accounting.

pub mod fm;
pub mod ml;
pub mod rb;

use crate::arch::Arch;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::graph::coarsen::MatchPolicy;
use crate::graph::{Graph, Num};
use crate::mapping::Mapping;
use crate::strategy::parser::key_matches;
use crate::strategy::{Active, Method, Parser, Strategy};
use crate::bipart::{self, BipartMethod};
use std::fmt;

/// A graph being mapped onto a target architecture.
#[derive(Clone, Debug)]
pub struct KwayGraph {
    pub(crate) graph: Graph,
    pub(crate) mapping: Mapping,
    /// Vertices with a neighbor on another domain.
    pub(crate) frontier: Vec<usize>,
    pub(crate) comm_load: Num,
    /// Load per domain table index.
    pub(crate) comp_loads: Vec<Num>,
    /// Terminal number a vertex is locked to, `-1` when free.
    pub(crate) fixed: Option<Vec<isize>>,
    /// Allowed relative imbalance around capacity-weighted averages.
    pub(crate) balance: f64,
    pub(crate) level: u32,
}

impl KwayGraph {
    /// A mapping problem with every vertex on the whole machine.
    pub fn new(graph: Graph, arch: Arch, balance: f64) -> Self {
        let mapping = Mapping::new_whole(graph.base(), arch, graph.vertnbr());
        let mut kg = KwayGraph {
            graph,
            mapping,
            frontier: Vec::new(),
            comm_load: 0,
            comp_loads: Vec::new(),
            fixed: None,
            balance,
            level: 0,
        };
        kg.recompute();
        kg
    }

    /// Lock vertices to terminals; `-1` leaves a vertex free.
    pub fn set_fixed(&mut self, fixed: Vec<isize>) -> Result<()> {
        if fixed.len() != self.graph.vertnbr() {
            return Err(Error::input("fixed-vertex array length mismatch"));
        }
        for (v, &term) in fixed.iter().enumerate() {
            if term >= 0 {
                let dom = self.mapping.arch().dom_term(term as usize)?;
                let part = self.mapping.push_domain(dom);
                self.mapping.assign(v, part);
            }
        }
        self.fixed = Some(fixed);
        self.recompute();
        Ok(())
    }

    /// The underlying graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The current mapping.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Current communication load.
    pub fn comm_load(&self) -> Num {
        self.comm_load
    }

    /// Whether a vertex is locked to a terminal.
    pub(crate) fn is_fixed(&self, v: usize) -> bool {
        matches!(&self.fixed, Some(fixed) if fixed[v] >= 0)
    }

    /// Rebuild per-domain loads, frontier and communication load.
    pub(crate) fn recompute(&mut self) {
        self.comp_loads = vec![0; self.mapping.domnbr()];
        self.frontier.clear();
        let mut comm = 0;
        for v in 0..self.graph.vertnbr() {
            let part = self.mapping.part_of(v);
            self.comp_loads[part] += self.graph.vertex_load(v);
            let mut boundary = false;
            for e in self.graph.edge_range(v) {
                let other = self.mapping.part_of(self.graph.edge_target(e));
                if other != part {
                    boundary = true;
                    comm += self.graph.edge_load(e) * self.mapping.dist(part, other);
                }
            }
            if boundary {
                self.frontier.push(v);
            }
        }
        self.comm_load = comm / 2;
    }

    /// Sum over domains of the absolute deviation from the
    /// capacity-weighted average load.
    pub(crate) fn imbalance(&self) -> Num {
        let arch = self.mapping.arch();
        let total_weight = arch.dom_weight(&arch.first_domain());
        if total_weight == 0 {
            return 0;
        }
        let load_sum = self.graph.load_sum();
        (0..self.mapping.domnbr())
            .filter(|&d| self.comp_loads[d] != 0)
            .map(|d| {
                let weight = self.mapping.arch().dom_weight(self.mapping.domain(d));
                (self.comp_loads[d] - load_sum * weight / total_weight).abs()
            })
            .sum()
    }

    /// Full consistency check of the cached state.
    pub fn check(&self) -> Result<()> {
        let mut copy = self.clone();
        copy.recompute();
        if copy.comm_load != self.comm_load || copy.comp_loads != self.comp_loads {
            return Err(Error::internal("k-way counters disagree with the mapping"));
        }
        let mut a = copy.frontier;
        let mut b = self.frontier.clone();
        a.sort_unstable();
        b.sort_unstable();
        if a != b {
            return Err(Error::internal("k-way frontier is not the boundary set"));
        }
        self.mapping.check()
    }

    pub(crate) fn assert_consistent(&self) {
        #[cfg(debug_assertions)]
        self.check().unwrap();
    }
}

/// Saved solution state for `Select`.
#[derive(Clone, Debug)]
pub struct KwayState {
    mapping: Mapping,
    frontier: Vec<usize>,
    comm_load: Num,
    comp_loads: Vec<Num>,
}

impl Active for KwayGraph {
    type Snapshot = KwayState;

    fn save(&self) -> KwayState {
        KwayState {
            mapping: self.mapping.clone(),
            frontier: self.frontier.clone(),
            comm_load: self.comm_load,
            comp_loads: self.comp_loads.clone(),
        }
    }

    fn restore(&mut self, s: KwayState) {
        self.mapping = s.mapping;
        self.frontier = s.frontier;
        self.comm_load = s.comm_load;
        self.comp_loads = s.comp_loads;
    }

    fn objective(&self) -> (f64, f64) {
        (self.comm_load as f64, self.imbalance() as f64)
    }

    fn attr(&self, name: &str) -> Option<f64> {
        match name {
            "vert" => Some(self.graph.vertnbr() as f64),
            "edge" => Some(self.graph.edgenbr() as f64),
            "load" => Some(self.graph.load_sum() as f64),
            "levl" => Some(self.level as f64),
            _ => None,
        }
    }
}

/// Parameters of the multilevel method.
#[derive(Clone, Debug, PartialEq)]
pub struct MlParams {
    /// Base-case vertex threshold.
    pub vert: usize,
    /// Give up coarsening above this coarse-to-fine ratio.
    pub rat: f64,
    /// Hard cap on coarsening depth.
    pub levl: u32,
    /// Matching policy.
    pub policy: MatchPolicy,
    /// Base-case strategy.
    pub low: Box<Strategy<MapMethod>>,
    /// Refinement strategy after each projection.
    pub asc: Box<Strategy<MapMethod>>,
}

impl Default for MlParams {
    fn default() -> Self {
        MlParams {
            vert: 240,
            rat: 0.7,
            levl: 1000,
            policy: MatchPolicy::HeavyEdge,
            low: Box::new(Strategy::Method(MapMethod::Rb(RbParams::default()))),
            asc: Box::new(Strategy::Method(MapMethod::Fm(KFmParams::default()))),
        }
    }
}

/// Parameters of dual recursive bipartitioning.
#[derive(Clone, Debug, PartialEq)]
pub struct RbParams {
    /// Imbalance passed to each graph bipartition.
    pub balance: f64,
    /// The bipartitioning strategy used at every recursion step.
    pub sep: Box<Strategy<BipartMethod>>,
}

impl Default for RbParams {
    fn default() -> Self {
        RbParams {
            balance: 0.05,
            sep: Box::new(bipart::default_strategy()),
        }
    }
}

/// Parameters of direct k-way FM refinement.
#[derive(Clone, Debug, PartialEq)]
pub struct KFmParams {
    /// Trial moves per pass.
    pub moves: usize,
    /// Maximum number of passes.
    pub passes: usize,
    /// Allowed relative imbalance per domain.
    pub balance: f64,
}

impl Default for KFmParams {
    fn default() -> Self {
        KFmParams {
            moves: 80,
            passes: 8,
            balance: 0.05,
        }
    }
}

/// The mapping method family.
#[derive(Clone, Debug, PartialEq)]
pub enum MapMethod {
    /// `m` -- multilevel.
    Multilevel(MlParams),
    /// `r` -- dual recursive bipartitioning.
    Rb(RbParams),
    /// `f` -- k-way FM refinement.
    Fm(KFmParams),
}

impl fmt::Display for MapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapMethod::Multilevel(p) => {
                let policy = match p.policy {
                    MatchPolicy::HeavyEdge => 'h',
                    MatchPolicy::Signature => 's',
                    MatchPolicy::CommonNeighbor => 'n',
                };
                write!(
                    f,
                    "m{{vert={},rat={},levl={},type={},low={},asc={}}}",
                    p.vert, p.rat, p.levl, policy, p.low, p.asc
                )
            }
            MapMethod::Rb(p) => write!(f, "r{{bal={},sep={}}}", p.balance, p.sep),
            MapMethod::Fm(p) => {
                write!(f, "f{{move={},pass={},bal={}}}", p.moves, p.passes, p.balance)
            }
        }
    }
}

impl Method for MapMethod {
    type Active = KwayGraph;

    const ATTRS: &'static [&'static str] = &["vert", "edge", "load", "levl"];

    fn apply(&self, active: &mut KwayGraph, ctx: &mut Context) -> Result<()> {
        match self {
            MapMethod::Multilevel(p) => ml::run(active, p, ctx),
            MapMethod::Rb(p) => rb::run(active, p, ctx),
            MapMethod::Fm(p) => fm::refine(active, p, ctx),
        }
    }

    fn parse(name: char, parser: &mut Parser<'_>) -> Result<Self> {
        match name {
            'm' => {
                let mut p = MlParams::default();
                parser.params(|parser, key| {
                    if key_matches(key, "vert") {
                        p.vert = parser.int_value()? as usize;
                    } else if key_matches(key, "rat") {
                        p.rat = parser.float_value()?;
                    } else if key_matches(key, "levl") {
                        p.levl = parser.int_value()? as u32;
                    } else if key_matches(key, "type") {
                        p.policy = match parser.case_value()? {
                            'h' => MatchPolicy::HeavyEdge,
                            's' => MatchPolicy::Signature,
                            'n' => MatchPolicy::CommonNeighbor,
                            other => {
                                return Err(
                                    parser.error(format!("unknown matching policy '{other}'"))
                                )
                            }
                        };
                    } else if key_matches(key, "low") {
                        p.low = Box::new(parser.strat_value()?);
                    } else if key_matches(key, "asc") {
                        p.asc = Box::new(parser.strat_value()?);
                    } else {
                        return Ok(false);
                    }
                    Ok(true)
                })?;
                Ok(MapMethod::Multilevel(p))
            }
            'r' => {
                let mut p = RbParams::default();
                parser.params(|parser, key| {
                    if key_matches(key, "bal") {
                        p.balance = parser.float_value()?;
                    } else if key_matches(key, "sep") {
                        p.sep = Box::new(parser.strat_value()?);
                    } else {
                        return Ok(false);
                    }
                    Ok(true)
                })?;
                Ok(MapMethod::Rb(p))
            }
            'f' => {
                let mut p = KFmParams::default();
                parser.params(|parser, key| {
                    if key_matches(key, "move") {
                        p.moves = parser.int_value()? as usize;
                    } else if key_matches(key, "pass") {
                        p.passes = parser.int_value()? as usize;
                    } else if key_matches(key, "bal") {
                        p.balance = parser.float_value()?;
                    } else {
                        return Ok(false);
                    }
                    Ok(true)
                })?;
                Ok(MapMethod::Fm(p))
            }
            other => Err(parser.error(format!("unknown mapping method '{other}'"))),
        }
    }
}

/// The default mapping strategy: multilevel with recursive bipartitioning
/// at the base and k-way FM on the way up.
pub fn default_strategy() -> Strategy<MapMethod> {
    Strategy::Method(MapMethod::Multilevel(MlParams::default()))
}
