//! Bipartition graphs and their solver methods.
//!
//! A [`BipartGraph`] is a graph split into parts 0 and 1, together with the
//! cached state every refiner relies on: the frontier (exactly the set of
//! vertices with a neighbor across the cut), part-0 load and its balance
//! envelope, and the communication load -- the dilation-weighted cut plus
//! the external term contributed by per-vertex gains when the bipartition
//! is carved out of a larger mapping problem.
//!
//! Methods, one letter each in strategy strings:
//!
//! | letter | method |
//! |--------|--------|
//! | `m` | multilevel (coarsen, recurse, project, refine) |
//! | `f` | Fiduccia–Mattheyses gain-bucket refinement |
//! | `h` | greedy region growing from a random seed |
//! | `d` | diffusion refinement (anchored band graphs) |
//! | `b` | band restriction around the frontier |
//! | `x` | exhaustive search on tiny graphs |
//! | `z` | trivial solution, everything in part 0 |

pub mod bd;
pub mod df;
pub mod fm;
pub mod gg;
pub mod leaf;
pub mod ml;

use crate::context::Context;
use crate::error::Result;
use crate::graph::coarsen::MatchPolicy;
use crate::graph::{Graph, Num};
use crate::strategy::parser::key_matches;
use crate::strategy::{Active, Method, Parser, Strategy};
use std::fmt;

/// A graph under bipartitioning.
#[derive(Clone, Debug)]
pub struct BipartGraph {
    pub(crate) graph: Graph,
    /// Part of each vertex, 0 or 1.
    pub(crate) parts: Vec<u8>,
    /// Exactly the vertices with at least one cut edge.
    pub(crate) frontier: Vec<usize>,
    pub(crate) load0: Num,
    pub(crate) load0_avg: Num,
    pub(crate) load0_min: Num,
    pub(crate) load0_max: Num,
    pub(crate) size0: usize,
    pub(crate) comm_load: Num,
    /// External communication load with every vertex in part 0.
    pub(crate) comm_load_extern0: Num,
    /// Signed external gain of moving everything to part 1.
    pub(crate) comm_gain_extern: Num,
    /// Distance between the two target domains.
    pub(crate) domain_dist: Num,
    /// Capacity weights of the two target domains.
    pub(crate) domain_weights: [Num; 2],
    /// Per-vertex external gain toward part 1, when derived from a k-way
    /// problem.
    pub(crate) extern_gains: Option<Vec<Num>>,
    /// Anchor vertices of a band graph; refiners must not move them.
    pub(crate) anchors: Option<[usize; 2]>,
    /// Multilevel depth, published to strategy tests.
    pub(crate) level: u32,
}

impl BipartGraph {
    /// A bipartition problem with everything in part 0.
    ///
    /// `domain_weights` are the capacities of the two sides, `domain_dist`
    /// the architecture distance between them, and `balance` the allowed
    /// relative imbalance around the capacity-weighted average.
    pub fn new(graph: Graph, domain_weights: [Num; 2], domain_dist: Num, balance: f64) -> Self {
        let load_sum = graph.load_sum();
        let wsum = (domain_weights[0] + domain_weights[1]).max(1);
        let avg = load_sum * domain_weights[0] / wsum;
        let slack = (balance * load_sum as f64).floor() as Num;
        let vertnbr = graph.vertnbr();
        let mut bg = BipartGraph {
            graph,
            parts: vec![0; vertnbr],
            frontier: Vec::new(),
            load0: load_sum,
            load0_avg: avg,
            load0_min: avg - slack,
            load0_max: avg + slack,
            size0: vertnbr,
            comm_load: 0,
            comm_load_extern0: 0,
            comm_gain_extern: 0,
            domain_dist,
            domain_weights,
            extern_gains: None,
            anchors: None,
            level: 0,
        };
        bg.recompute();
        bg
    }

    /// Attach external gains and the all-in-part-0 external load.
    pub fn set_extern(&mut self, gains: Vec<Num>, extern0: Num) {
        debug_assert_eq!(gains.len(), self.graph.vertnbr());
        self.extern_gains = Some(gains);
        self.comm_load_extern0 = extern0;
        self.recompute();
    }

    /// The underlying graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Part of each vertex.
    pub fn parts(&self) -> &[u8] {
        &self.parts
    }

    /// Current communication load.
    pub fn comm_load(&self) -> Num {
        self.comm_load
    }

    /// Current part-0 load.
    pub fn load0(&self) -> Num {
        self.load0
    }

    /// Part-0 balance envelope `[min, max]`.
    pub fn envelope(&self) -> (Num, Num) {
        (self.load0_min, self.load0_max)
    }

    /// Frontier vertices.
    pub fn frontier(&self) -> &[usize] {
        &self.frontier
    }

    /// Install a part array and rebuild every derived field.
    pub fn set_parts(&mut self, parts: Vec<u8>) {
        debug_assert_eq!(parts.len(), self.graph.vertnbr());
        self.parts = parts;
        self.recompute();
    }

    /// External gain of a vertex toward part 1.
    pub(crate) fn extern_gain(&self, v: usize) -> Num {
        match &self.extern_gains {
            Some(gains) => gains[v],
            None => 0,
        }
    }

    /// Largest absolute external gain, for gain-table sizing.
    pub(crate) fn max_extern_abs(&self) -> Num {
        match &self.extern_gains {
            Some(gains) => gains.iter().map(|g| g.abs()).max().unwrap_or(0),
            None => 0,
        }
    }

    /// Decrease of `comm_load` if `v` moved to the other part.
    pub(crate) fn move_gain(&self, v: usize) -> Num {
        let p = self.parts[v];
        let mut external = 0;
        let mut internal = 0;
        for e in self.graph.edge_range(v) {
            let load = self.graph.edge_load(e);
            if self.parts[self.graph.edge_target(e)] != p {
                external += load;
            } else {
                internal += load;
            }
        }
        let cut_gain = (external - internal) * self.domain_dist;
        match p {
            0 => cut_gain - self.extern_gain(v),
            _ => cut_gain + self.extern_gain(v),
        }
    }

    /// Rebuild frontier, loads and communication terms from the parts.
    pub(crate) fn recompute(&mut self) {
        let n = self.graph.vertnbr();
        let mut load0 = 0;
        let mut size0 = 0;
        let mut cut = 0;
        let mut extern1 = 0;
        let mut gain_extern = 0;
        self.frontier.clear();
        for v in 0..n {
            let p = self.parts[v];
            if p == 0 {
                load0 += self.graph.vertex_load(v);
                size0 += 1;
            }
            let veex = self.extern_gain(v);
            if p == 1 {
                extern1 += veex;
            }
            gain_extern += veex * (1 - 2 * p as Num);
            let mut boundary = false;
            for e in self.graph.edge_range(v) {
                if self.parts[self.graph.edge_target(e)] != p {
                    cut += self.graph.edge_load(e);
                    boundary = true;
                }
            }
            if boundary {
                self.frontier.push(v);
            }
        }
        self.load0 = load0;
        self.size0 = size0;
        self.comm_load = cut / 2 * self.domain_dist + self.comm_load_extern0 + extern1;
        self.comm_gain_extern = gain_extern;
    }

    /// Rebuild the frontier alone, leaving incremental counters in place.
    pub(crate) fn rebuild_frontier(&mut self) {
        self.frontier.clear();
        for v in 0..self.graph.vertnbr() {
            let p = self.parts[v];
            if self
                .graph
                .neighbors(v)
                .iter()
                .any(|&u| self.parts[u] != p)
            {
                self.frontier.push(v);
            }
        }
    }

    /// Full consistency check of the cached state against the parts.
    pub fn check(&self) -> Result<()> {
        let mut copy = self.clone();
        copy.recompute();
        if copy.load0 != self.load0
            || copy.size0 != self.size0
            || copy.comm_load != self.comm_load
            || copy.comm_gain_extern != self.comm_gain_extern
        {
            return Err(crate::error::Error::internal(
                "bipartition counters disagree with parts",
            ));
        }
        let mut a = copy.frontier;
        let mut b = self.frontier.clone();
        a.sort_unstable();
        b.sort_unstable();
        if a != b {
            return Err(crate::error::Error::internal(
                "bipartition frontier is not the boundary set",
            ));
        }
        Ok(())
    }

    pub(crate) fn assert_consistent(&self) {
        #[cfg(debug_assertions)]
        self.check().unwrap();
    }

    /// Weight of a unit of envelope violation in the selection objective,
    /// larger than any achievable communication load.
    fn violation_unit(&self) -> f64 {
        (self.graph.edge_load_sum() * self.domain_dist.max(1)
            + self.comm_load_extern0.abs()
            + self.comm_gain_extern.abs()
            + 1) as f64
    }
}

/// Saved solution state for `Select`.
#[derive(Clone, Debug)]
pub struct BipartState {
    parts: Vec<u8>,
    frontier: Vec<usize>,
    load0: Num,
    size0: usize,
    comm_load: Num,
    comm_gain_extern: Num,
}

impl Active for BipartGraph {
    type Snapshot = BipartState;

    fn save(&self) -> BipartState {
        BipartState {
            parts: self.parts.clone(),
            frontier: self.frontier.clone(),
            load0: self.load0,
            size0: self.size0,
            comm_load: self.comm_load,
            comm_gain_extern: self.comm_gain_extern,
        }
    }

    fn restore(&mut self, s: BipartState) {
        self.parts = s.parts;
        self.frontier = s.frontier;
        self.load0 = s.load0;
        self.size0 = s.size0;
        self.comm_load = s.comm_load;
        self.comm_gain_extern = s.comm_gain_extern;
    }

    fn objective(&self) -> (f64, f64) {
        let excess = (self.load0 - self.load0_max).max(0) + (self.load0_min - self.load0).max(0);
        (
            self.comm_load as f64 + excess as f64 * self.violation_unit(),
            (self.load0 - self.load0_avg).abs() as f64,
        )
    }

    fn attr(&self, name: &str) -> Option<f64> {
        match name {
            "vert" => Some(self.graph.vertnbr() as f64),
            "edge" => Some(self.graph.edgenbr() as f64),
            "load" => Some(self.graph.load_sum() as f64),
            "levl" => Some(self.level as f64),
            "load0" => Some(self.load0 as f64),
            "bal" => {
                Some((self.load0 - self.load0_avg).abs() as f64 / self.load0_avg.max(1) as f64)
            }
            _ => None,
        }
    }
}

/// Parameters of the multilevel method.
#[derive(Clone, Debug, PartialEq)]
pub struct MlParams {
    /// Base-case vertex threshold.
    pub vert: usize,
    /// Give up coarsening when `coarse / fine` exceeds this ratio.
    pub rat: f64,
    /// Hard cap on coarsening depth.
    pub levl: u32,
    /// Matching policy.
    pub policy: MatchPolicy,
    /// Strategy applied at the base case.
    pub low: Box<Strategy<BipartMethod>>,
    /// Strategy applied after each projection.
    pub asc: Box<Strategy<BipartMethod>>,
}

impl Default for MlParams {
    fn default() -> Self {
        MlParams {
            vert: 120,
            rat: 0.7,
            levl: 1000,
            policy: MatchPolicy::HeavyEdge,
            low: Box::new(Strategy::Method(BipartMethod::Grow(GrowParams::default()))),
            asc: Box::new(Strategy::Method(BipartMethod::Band(BandParams::default()))),
        }
    }
}

/// Parameters of Fiduccia–Mattheyses refinement.
#[derive(Clone, Debug, PartialEq)]
pub struct FmParams {
    /// Trial moves per pass.
    pub moves: usize,
    /// Maximum number of passes.
    pub passes: usize,
    /// Envelope widening ratio.
    pub balance: f64,
}

impl Default for FmParams {
    fn default() -> Self {
        FmParams {
            moves: 80,
            passes: 10,
            balance: 0.05,
        }
    }
}

/// Parameters of greedy region growing.
#[derive(Clone, Debug, PartialEq)]
pub struct GrowParams {
    /// Number of seeds tried; the best outcome is kept.
    pub passes: usize,
}

impl Default for GrowParams {
    fn default() -> Self {
        GrowParams { passes: 10 }
    }
}

/// Parameters of diffusion refinement.
#[derive(Clone, Debug, PartialEq)]
pub struct DfParams {
    /// Relaxation passes.
    pub passes: usize,
    /// Pull the part-0 load toward the average rather than keeping it.
    pub balance: bool,
}

impl Default for DfParams {
    fn default() -> Self {
        DfParams {
            passes: 40,
            balance: true,
        }
    }
}

/// Parameters of the band restriction method.
#[derive(Clone, Debug, PartialEq)]
pub struct BandParams {
    /// Band half-width in hops around the frontier.
    pub width: usize,
    /// Strategy run on the band graph.
    pub bnd: Box<Strategy<BipartMethod>>,
    /// Strategy run on the whole graph when no usable band exists.
    pub org: Box<Strategy<BipartMethod>>,
}

impl Default for BandParams {
    fn default() -> Self {
        BandParams {
            width: 3,
            bnd: Box::new(Strategy::Method(BipartMethod::Fm(FmParams::default()))),
            org: Box::new(Strategy::Method(BipartMethod::Fm(FmParams::default()))),
        }
    }
}

/// The bipartitioning method family.
#[derive(Clone, Debug, PartialEq)]
pub enum BipartMethod {
    /// `m` -- multilevel.
    Multilevel(MlParams),
    /// `f` -- Fiduccia–Mattheyses.
    Fm(FmParams),
    /// `h` -- greedy region growing.
    Grow(GrowParams),
    /// `d` -- diffusion.
    Diffusion(DfParams),
    /// `b` -- band restriction.
    Band(BandParams),
    /// `x` -- exhaustive search.
    Exhaustive,
    /// `z` -- everything in part 0.
    Zero,
}

impl fmt::Display for BipartMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BipartMethod::Multilevel(p) => {
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
            BipartMethod::Fm(p) => {
                write!(f, "f{{move={},pass={},bal={}}}", p.moves, p.passes, p.balance)
            }
            BipartMethod::Grow(p) => write!(f, "h{{pass={}}}", p.passes),
            BipartMethod::Diffusion(p) => {
                write!(
                    f,
                    "d{{pass={},type={}}}",
                    p.passes,
                    if p.balance { 'b' } else { 'k' }
                )
            }
            BipartMethod::Band(p) => {
                write!(f, "b{{width={},bnd={},org={}}}", p.width, p.bnd, p.org)
            }
            BipartMethod::Exhaustive => write!(f, "x"),
            BipartMethod::Zero => write!(f, "z"),
        }
    }
}

impl Method for BipartMethod {
    type Active = BipartGraph;

    const ATTRS: &'static [&'static str] = &["vert", "edge", "load", "levl", "load0", "bal"];

    fn apply(&self, active: &mut BipartGraph, ctx: &mut Context) -> Result<()> {
        match self {
            BipartMethod::Multilevel(p) => ml::run(active, p, ctx),
            BipartMethod::Fm(p) => fm::refine(active, p, ctx),
            BipartMethod::Grow(p) => gg::grow(active, p, ctx),
            BipartMethod::Diffusion(p) => df::refine(active, p, ctx),
            BipartMethod::Band(p) => bd::refine(active, p, ctx),
            BipartMethod::Exhaustive => leaf::exhaustive(active),
            BipartMethod::Zero => leaf::zero(active),
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
                Ok(BipartMethod::Multilevel(p))
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
                    } else if key_matches(key, "type") {
                        // Accepted for compatibility with old strategies.
                        log::warn!("fm parameter 'type' is deprecated and ignored");
                        parser.skip_value()?;
                    } else {
                        return Ok(false);
                    }
                    Ok(true)
                })?;
                Ok(BipartMethod::Fm(p))
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
                Ok(BipartMethod::Grow(p))
            }
            'd' => {
                let mut p = DfParams::default();
                parser.params(|parser, key| {
                    if key_matches(key, "pass") {
                        p.passes = parser.int_value()? as usize;
                    } else if key_matches(key, "type") {
                        p.balance = match parser.case_value()? {
                            'b' => true,
                            'k' => false,
                            other => {
                                return Err(
                                    parser.error(format!("unknown diffusion type '{other}'"))
                                )
                            }
                        };
                    } else if key_matches(key, "dif") || key_matches(key, "rem") {
                        // Old diffusion coefficients, now fixed.
                        log::warn!("diffusion parameter '{key}' is deprecated and ignored");
                        parser.skip_value()?;
                    } else {
                        return Ok(false);
                    }
                    Ok(true)
                })?;
                Ok(BipartMethod::Diffusion(p))
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
                Ok(BipartMethod::Band(p))
            }
            'x' => {
                parser.params(|_, _| Ok(false))?;
                Ok(BipartMethod::Exhaustive)
            }
            'z' => {
                parser.params(|_, _| Ok(false))?;
                Ok(BipartMethod::Zero)
            }
            other => Err(parser.error(format!("unknown bipartitioning method '{other}'"))),
        }
    }
}

/// The default bipartitioning strategy: multilevel with greedy growing at
/// the base and banded FM refinement on the way up.
pub fn default_strategy() -> Strategy<BipartMethod> {
    Strategy::Method(BipartMethod::Multilevel(MlParams::default()))
}
