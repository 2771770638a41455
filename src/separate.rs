//! Vertex-separator graphs and their solver methods.
//!
//! A [`SepGraph`] splits a graph into parts 0 and 1 plus a separating
//! part 2: no edge may join parts 0 and 1 directly. The frontier is the
//! separator itself. Imbalance is the dual-weighted difference
//! `w1·load0 - w0·load1`, so sides of unequal capacity can be targeted.
//!
//! Methods: `m` multilevel, `f` separator FM, `h` greedy growing,
//! `b` band restriction, `t` thinning, `z` the trivial all-in-part-0
//! state.

pub mod bd;
pub mod fm;
pub mod gg;
pub mod ml;
pub mod th;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::graph::coarsen::MatchPolicy;
use crate::graph::{Graph, Num};
use crate::strategy::parser::key_matches;
use crate::strategy::{Active, Method, Parser, Strategy};
use std::fmt;

/// A graph under vertex separation; part 2 is the separator.
#[derive(Clone, Debug)]
pub struct SepGraph {
    pub(crate) graph: Graph,
    pub(crate) parts: Vec<u8>,
    /// The separator vertices.
    pub(crate) frontier: Vec<usize>,
    pub(crate) loads: [Num; 3],
    pub(crate) sizes: [usize; 3],
    /// Dual capacity weights of the two sides.
    pub(crate) dwghts: [Num; 2],
    /// `dwghts[1] * loads[0] - dwghts[0] * loads[1]`.
    pub(crate) load_delta: Num,
    pub(crate) level: u32,
    /// Anchor vertices of a band graph; they must stay in their side.
    pub(crate) anchors: Option<[usize; 2]>,
}

impl SepGraph {
    /// A separation problem with everything in part 0, equal side weights.
    pub fn new(graph: Graph) -> Self {
        Self::with_weights(graph, [1, 1])
    }

    /// A separation problem with the given dual side weights.
    pub fn with_weights(graph: Graph, dwghts: [Num; 2]) -> Self {
        let vertnbr = graph.vertnbr();
        let mut sg = SepGraph {
            graph,
            parts: vec![0; vertnbr],
            frontier: Vec::new(),
            loads: [0; 3],
            sizes: [0; 3],
            dwghts,
            load_delta: 0,
            level: 0,
            anchors: None,
        };
        sg.recompute();
        sg
    }

    /// The underlying graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Part of each vertex: 0, 1 or 2 (separator).
    pub fn parts(&self) -> &[u8] {
        &self.parts
    }

    /// Separator vertices.
    pub fn separator(&self) -> &[usize] {
        &self.frontier
    }

    /// Loads of parts 0, 1 and the separator.
    pub fn loads(&self) -> [Num; 3] {
        self.loads
    }

    /// Sizes of parts 0, 1 and the separator.
    pub fn sizes(&self) -> [usize; 3] {
        self.sizes
    }

    /// Dual-weighted imbalance.
    pub fn load_delta(&self) -> Num {
        self.load_delta
    }

    /// Install a part array and rebuild the derived state.
    pub fn set_parts(&mut self, parts: Vec<u8>) {
        debug_assert_eq!(parts.len(), self.graph.vertnbr());
        self.parts = parts;
        self.recompute();
    }

    /// Rebuild loads, sizes, delta and the separator list from the parts.
    pub(crate) fn recompute(&mut self) {
        self.loads = [0; 3];
        self.sizes = [0; 3];
        self.frontier.clear();
        for v in 0..self.graph.vertnbr() {
            let p = self.parts[v] as usize;
            self.loads[p] += self.graph.vertex_load(v);
            self.sizes[p] += 1;
            if p == 2 {
                self.frontier.push(v);
            }
        }
        self.load_delta = self.dwghts[1] * self.loads[0] - self.dwghts[0] * self.loads[1];
    }

    /// Verify the separation property and cached state.
    pub fn check(&self) -> Result<()> {
        let mut loads = [0 as Num; 3];
        let mut sizes = [0usize; 3];
        for v in 0..self.graph.vertnbr() {
            let p = self.parts[v];
            if p > 2 {
                return Err(Error::internal(format!("vertex {v} has part {p}")));
            }
            loads[p as usize] += self.graph.vertex_load(v);
            sizes[p as usize] += 1;
            if p != 2 {
                for &u in self.graph.neighbors(v) {
                    if self.parts[u] == 1 - p {
                        return Err(Error::internal(format!(
                            "edge ({v}, {u}) crosses the separator"
                        )));
                    }
                }
            }
        }
        if loads != self.loads || sizes != self.sizes {
            return Err(Error::internal("separator counters disagree with parts"));
        }
        let mut sep: Vec<usize> = (0..self.graph.vertnbr())
            .filter(|&v| self.parts[v] == 2)
            .collect();
        let mut front = self.frontier.clone();
        sep.sort_unstable();
        front.sort_unstable();
        if sep != front {
            return Err(Error::internal("separator list is stale"));
        }
        Ok(())
    }

    pub(crate) fn assert_consistent(&self) {
        #[cfg(debug_assertions)]
        self.check().unwrap();
    }
}

/// Saved solution state for `Select`.
#[derive(Clone, Debug)]
pub struct SepState {
    parts: Vec<u8>,
    frontier: Vec<usize>,
    loads: [Num; 3],
    sizes: [usize; 3],
    load_delta: Num,
}

impl Active for SepGraph {
    type Snapshot = SepState;

    fn save(&self) -> SepState {
        SepState {
            parts: self.parts.clone(),
            frontier: self.frontier.clone(),
            loads: self.loads,
            sizes: self.sizes,
            load_delta: self.load_delta,
        }
    }

    fn restore(&mut self, s: SepState) {
        self.parts = s.parts;
        self.frontier = s.frontier;
        self.loads = s.loads;
        self.sizes = s.sizes;
        self.load_delta = s.load_delta;
    }

    fn objective(&self) -> (f64, f64) {
        (self.sizes[2] as f64, self.load_delta.abs() as f64)
    }

    fn attr(&self, name: &str) -> Option<f64> {
        match name {
            "vert" => Some(self.graph.vertnbr() as f64),
            "edge" => Some(self.graph.edgenbr() as f64),
            "load" => Some(self.graph.load_sum() as f64),
            "levl" => Some(self.level as f64),
            "sep" => Some(self.sizes[2] as f64),
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
    pub low: Box<Strategy<SepMethod>>,
    /// Refinement strategy after each projection.
    pub asc: Box<Strategy<SepMethod>>,
}

impl Default for MlParams {
    fn default() -> Self {
        MlParams {
            vert: 120,
            rat: 0.7,
            levl: 1000,
            policy: MatchPolicy::HeavyEdge,
            low: Box::new(Strategy::Concat(
                Box::new(Strategy::Method(SepMethod::Grow(GrowParams::default()))),
                Box::new(Strategy::Method(SepMethod::Fm(FmParams::default()))),
            )),
            asc: Box::new(Strategy::Concat(
                Box::new(Strategy::Method(SepMethod::Band(BandParams::default()))),
                Box::new(Strategy::Method(SepMethod::Thin)),
            )),
        }
    }
}

/// Parameters of separator FM refinement.
#[derive(Clone, Debug, PartialEq)]
pub struct FmParams {
    /// Trial moves per pass.
    pub moves: usize,
    /// Maximum number of passes.
    pub passes: usize,
    /// Allowed relative imbalance.
    pub balance: f64,
}

impl Default for FmParams {
    fn default() -> Self {
        FmParams {
            moves: 120,
            passes: 10,
            balance: 0.1,
        }
    }
}

/// Parameters of greedy separator growing.
#[derive(Clone, Debug, PartialEq)]
pub struct GrowParams {
    /// Number of seeds tried.
    pub passes: usize,
}

impl Default for GrowParams {
    fn default() -> Self {
        GrowParams { passes: 10 }
    }
}

/// Parameters of the band restriction method.
#[derive(Clone, Debug, PartialEq)]
pub struct BandParams {
    /// Band half-width around the separator.
    pub width: usize,
    /// Strategy run on the band graph.
    pub bnd: Box<Strategy<SepMethod>>,
    /// Strategy run on the whole graph when no usable band exists.
    pub org: Box<Strategy<SepMethod>>,
}

impl Default for BandParams {
    fn default() -> Self {
        BandParams {
            width: 3,
            bnd: Box::new(Strategy::Method(SepMethod::Fm(FmParams::default()))),
            org: Box::new(Strategy::Method(SepMethod::Fm(FmParams::default()))),
        }
    }
}

/// The separation method family.
#[derive(Clone, Debug, PartialEq)]
pub enum SepMethod {
    /// `m` -- multilevel.
    Multilevel(MlParams),
    /// `f` -- separator FM.
    Fm(FmParams),
    /// `h` -- greedy separator growing.
    Grow(GrowParams),
    /// `b` -- band restriction.
    Band(BandParams),
    /// `t` -- thin the separator of one-sided vertices.
    Thin,
    /// `z` -- everything in part 0, empty separator.
    Zero,
}

impl fmt::Display for SepMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SepMethod::Multilevel(p) => {
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
            SepMethod::Fm(p) => {
                write!(f, "f{{move={},pass={},bal={}}}", p.moves, p.passes, p.balance)
            }
            SepMethod::Grow(p) => write!(f, "h{{pass={}}}", p.passes),
            SepMethod::Band(p) => {
                write!(f, "b{{width={},bnd={},org={}}}", p.width, p.bnd, p.org)
            }
            SepMethod::Thin => write!(f, "t"),
            SepMethod::Zero => write!(f, "z"),
        }
    }
}

impl Method for SepMethod {
    type Active = SepGraph;

    const ATTRS: &'static [&'static str] = &["vert", "edge", "load", "levl", "sep"];

    fn apply(&self, active: &mut SepGraph, ctx: &mut Context) -> Result<()> {
        match self {
            SepMethod::Multilevel(p) => ml::run(active, p, ctx),
            SepMethod::Fm(p) => fm::refine(active, p, ctx),
            SepMethod::Grow(p) => gg::grow(active, p, ctx),
            SepMethod::Band(p) => bd::refine(active, p, ctx),
            SepMethod::Thin => th::thin(active),
            SepMethod::Zero => {
                let n = active.graph.vertnbr();
                active.set_parts(vec![0; n]);
                Ok(())
            }
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
                Ok(SepMethod::Multilevel(p))
            }
            'f' => {
                let mut p = FmParams::default();
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
                Ok(SepMethod::Fm(p))
            }
            'h' => {
                let mut p = GrowParams::default();
                parser.params(|parser, key| {
                    if key_matches(key, "pass") {
                        p.passes = parser.int_value()? as usize;
                    } else {
                        return Ok(false);
                    }
                    Ok(true)
                })?;
                Ok(SepMethod::Grow(p))
            }
            'b' => {
                let mut p = BandParams::default();
                parser.params(|parser, key| {
                    if key_matches(key, "width") {
                        p.width = parser.int_value()? as usize;
                    } else if key_matches(key, "bnd") {
                        p.bnd = Box::new(parser.strat_value()?);
                    } else if key_matches(key, "org") {
                        p.org = Box::new(parser.strat_value()?);
                    } else {
                        return Ok(false);
                    }
                    Ok(true)
                })?;
                Ok(SepMethod::Band(p))
            }
            't' => {
                parser.params(|_, _| Ok(false))?;
                Ok(SepMethod::Thin)
            }
            'z' => {
                parser.params(|_, _| Ok(false))?;
                Ok(SepMethod::Zero)
            }
            other => Err(parser.error(format!("unknown separation method '{other}'"))),
        }
    }
}

/// The default separation strategy.
pub fn default_strategy() -> Strategy<SepMethod> {
    Strategy::Method(SepMethod::Multilevel(MlParams::default()))
}
