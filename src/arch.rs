//! Target architectures and their domain algebra.
//!
//! An [`Arch`] describes the machine a graph is mapped onto. Mapping never
//! enumerates target processors directly: it works on [`Dom`] values,
//! recursively bipartitioned down to terminal (single-processor) domains.
//! The only operations the mapper needs are the ones exposed here: first
//! domain, size, weight, bipartition, terminal lookup, and the distance
//! function. `dom_dist` is a non-negative integer with `dom_dist(d, d) == 0`;
//! it does not have to be a metric.
//!
//! Built-in variants: complete graphs (optionally weighted), 2D/3D meshes
//! and tori, hypercubes, cost-labelled leaf trees, and a decomposition
//! architecture built by recursive bisection of an arbitrary target graph.

use crate::error::{Error, Result};
use crate::graph::{Graph, Num};

/// A target architecture.
#[derive(Clone, Debug)]
pub enum Arch {
    /// Complete graph over `size` identical processors; all distinct
    /// terminals are at distance 1.
    Complete { size: usize },
    /// Complete graph with per-terminal load capacities.
    CompleteWeighted { weights: Vec<Num> },
    /// 2D mesh with Manhattan distances.
    Mesh2 { dims: [usize; 2] },
    /// 3D mesh with Manhattan distances.
    Mesh3 { dims: [usize; 3] },
    /// 2D torus: per-axis wrap-around Manhattan distances.
    Torus2 { dims: [usize; 2] },
    /// 3D torus.
    Torus3 { dims: [usize; 3] },
    /// Hypercube of the given dimension; distance is the Hamming distance
    /// over commonly fixed coordinates.
    Hypercube { dim: u32 },
    /// Tree of processor leaves: `arities[l]` children per level-`l` node,
    /// `costs[l]` the cost of one link at that level.
    TreeLeaf { arities: Vec<usize>, costs: Vec<Num> },
    /// Decomposition-defined architecture built from a target graph.
    Deco(DecoArch),
}

/// A (sub-)domain of an architecture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dom {
    /// Contiguous terminal range, exclusive upper bound.
    Range { lo: usize, hi: usize },
    /// Sub-box of a 2D mesh or torus, inclusive bounds.
    Box2 { lo: [usize; 2], hi: [usize; 2] },
    /// Sub-box of a 3D mesh or torus, inclusive bounds.
    Box3 { lo: [usize; 3], hi: [usize; 3] },
    /// Subcube with the lowest `bits` coordinates fixed to `value`.
    Cube { bits: u32, value: u64 },
    /// Range of `nbr` consecutive tree leaves starting at `lo`.
    Tree { lo: usize, nbr: usize },
    /// Node of a decomposition tree.
    Deco { index: usize },
}

impl Arch {
    /// Complete graph of `size` processors.
    pub fn complete(size: usize) -> Result<Arch> {
        if size == 0 {
            return Err(Error::input("architecture must have at least one terminal"));
        }
        Ok(Arch::Complete { size })
    }

    /// Complete graph with per-terminal weights.
    pub fn complete_weighted(weights: Vec<Num>) -> Result<Arch> {
        if weights.is_empty() {
            return Err(Error::input("architecture must have at least one terminal"));
        }
        if weights.iter().any(|&w| w <= 0) {
            return Err(Error::input("terminal weights must be positive"));
        }
        Ok(Arch::CompleteWeighted { weights })
    }

    /// 2D mesh of `x` by `y` processors.
    pub fn mesh2(x: usize, y: usize) -> Result<Arch> {
        if x == 0 || y == 0 {
            return Err(Error::input("mesh dimensions must be positive"));
        }
        Ok(Arch::Mesh2 { dims: [x, y] })
    }

    /// 3D mesh.
    pub fn mesh3(x: usize, y: usize, z: usize) -> Result<Arch> {
        if x == 0 || y == 0 || z == 0 {
            return Err(Error::input("mesh dimensions must be positive"));
        }
        Ok(Arch::Mesh3 { dims: [x, y, z] })
    }

    /// 2D torus.
    pub fn torus2(x: usize, y: usize) -> Result<Arch> {
        if x == 0 || y == 0 {
            return Err(Error::input("torus dimensions must be positive"));
        }
        Ok(Arch::Torus2 { dims: [x, y] })
    }

    /// 3D torus.
    pub fn torus3(x: usize, y: usize, z: usize) -> Result<Arch> {
        if x == 0 || y == 0 || z == 0 {
            return Err(Error::input("torus dimensions must be positive"));
        }
        Ok(Arch::Torus3 { dims: [x, y, z] })
    }

    /// Hypercube of dimension `dim` (so `2^dim` terminals).
    pub fn hypercube(dim: u32) -> Result<Arch> {
        if dim == 0 || dim >= 60 {
            return Err(Error::input("hypercube dimension out of range"));
        }
        Ok(Arch::Hypercube { dim })
    }

    /// Leaf tree with the given per-level arities and link costs.
    pub fn tree_leaf(arities: Vec<usize>, costs: Vec<Num>) -> Result<Arch> {
        if arities.is_empty() || arities.len() != costs.len() {
            return Err(Error::input("tree arities and costs must match and be non-empty"));
        }
        if arities.iter().any(|&a| a < 2) || costs.iter().any(|&c| c < 0) {
            return Err(Error::input("tree arities must be >= 2 and costs >= 0"));
        }
        Ok(Arch::TreeLeaf { arities, costs })
    }

    /// Build a decomposition architecture by recursive bisection of a
    /// target graph; terminal distances are hop distances in that graph.
    pub fn decomposition(target: &Graph) -> Result<Arch> {
        DecoArch::build(target).map(Arch::Deco)
    }

    /// Total number of terminal domains.
    pub fn size(&self) -> usize {
        match self {
            Arch::Complete { size } => *size,
            Arch::CompleteWeighted { weights } => weights.len(),
            Arch::Mesh2 { dims } | Arch::Torus2 { dims } => dims[0] * dims[1],
            Arch::Mesh3 { dims } | Arch::Torus3 { dims } => dims[0] * dims[1] * dims[2],
            Arch::Hypercube { dim } => 1usize << dim,
            Arch::TreeLeaf { arities, .. } => arities.iter().product(),
            Arch::Deco(deco) => deco.terms,
        }
    }

    /// The domain spanning the whole architecture.
    pub fn first_domain(&self) -> Dom {
        match self {
            Arch::Complete { .. } | Arch::CompleteWeighted { .. } => Dom::Range {
                lo: 0,
                hi: self.size(),
            },
            Arch::Mesh2 { dims } | Arch::Torus2 { dims } => Dom::Box2 {
                lo: [0, 0],
                hi: [dims[0] - 1, dims[1] - 1],
            },
            Arch::Mesh3 { dims } | Arch::Torus3 { dims } => Dom::Box3 {
                lo: [0, 0, 0],
                hi: [dims[0] - 1, dims[1] - 1, dims[2] - 1],
            },
            Arch::Hypercube { .. } => Dom::Cube { bits: 0, value: 0 },
            Arch::TreeLeaf { .. } => Dom::Tree {
                lo: 0,
                nbr: self.size(),
            },
            Arch::Deco { .. } => Dom::Deco { index: 0 },
        }
    }

    /// Number of terminals covered by a domain.
    pub fn dom_size(&self, dom: &Dom) -> usize {
        match (self, dom) {
            (Arch::Complete { .. } | Arch::CompleteWeighted { .. }, Dom::Range { lo, hi }) => {
                hi - lo
            }
            (Arch::Mesh2 { .. } | Arch::Torus2 { .. }, Dom::Box2 { lo, hi }) => {
                (hi[0] - lo[0] + 1) * (hi[1] - lo[1] + 1)
            }
            (Arch::Mesh3 { .. } | Arch::Torus3 { .. }, Dom::Box3 { lo, hi }) => {
                (hi[0] - lo[0] + 1) * (hi[1] - lo[1] + 1) * (hi[2] - lo[2] + 1)
            }
            (Arch::Hypercube { dim }, Dom::Cube { bits, .. }) => 1usize << (dim - bits),
            (Arch::TreeLeaf { .. }, Dom::Tree { nbr, .. }) => *nbr,
            (Arch::Deco(deco), Dom::Deco { index }) => deco.doms[*index].size,
            _ => panic!("domain does not belong to this architecture"),
        }
    }

    /// Load capacity of a domain.
    pub fn dom_weight(&self, dom: &Dom) -> Num {
        match (self, dom) {
            (Arch::CompleteWeighted { weights }, Dom::Range { lo, hi }) => {
                weights[*lo..*hi].iter().sum()
            }
            (Arch::Deco(deco), Dom::Deco { index }) => deco.doms[*index].weight,
            _ => self.dom_size(dom) as Num,
        }
    }

    /// Split a domain in two; `None` for terminal domains.
    pub fn dom_bipart(&self, dom: &Dom) -> Option<(Dom, Dom)> {
        match (self, dom) {
            (Arch::Complete { .. }, Dom::Range { lo, hi }) => {
                if hi - lo < 2 {
                    return None;
                }
                let mid = lo + (hi - lo) / 2;
                Some((
                    Dom::Range { lo: *lo, hi: mid },
                    Dom::Range { lo: mid, hi: *hi },
                ))
            }
            (Arch::CompleteWeighted { weights }, Dom::Range { lo, hi }) => {
                if hi - lo < 2 {
                    return None;
                }
                // Split point of least capacity imbalance.
                let total: Num = weights[*lo..*hi].iter().sum();
                let mut best = *lo + 1;
                let mut best_delta = Num::MAX;
                let mut left = 0;
                for mid in *lo + 1..*hi {
                    left += weights[mid - 1];
                    let delta = (total - 2 * left).abs();
                    if delta < best_delta {
                        best_delta = delta;
                        best = mid;
                    }
                }
                Some((
                    Dom::Range { lo: *lo, hi: best },
                    Dom::Range { lo: best, hi: *hi },
                ))
            }
            (Arch::Mesh2 { .. } | Arch::Torus2 { .. }, Dom::Box2 { lo, hi }) => {
                let ext = [hi[0] - lo[0], hi[1] - lo[1]];
                if ext[0] == 0 && ext[1] == 0 {
                    return None;
                }
                let axis = if ext[0] >= ext[1] { 0 } else { 1 };
                let mid = (lo[axis] + hi[axis]) / 2;
                let mut hi0 = *hi;
                hi0[axis] = mid;
                let mut lo1 = *lo;
                lo1[axis] = mid + 1;
                Some((
                    Dom::Box2 { lo: *lo, hi: hi0 },
                    Dom::Box2 { lo: lo1, hi: *hi },
                ))
            }
            (Arch::Mesh3 { .. } | Arch::Torus3 { .. }, Dom::Box3 { lo, hi }) => {
                let ext = [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]];
                if ext == [0, 0, 0] {
                    return None;
                }
                let axis = (0..3).max_by_key(|&a| ext[a]).unwrap();
                let mid = (lo[axis] + hi[axis]) / 2;
                let mut hi0 = *hi;
                hi0[axis] = mid;
                let mut lo1 = *lo;
                lo1[axis] = mid + 1;
                Some((
                    Dom::Box3 { lo: *lo, hi: hi0 },
                    Dom::Box3 { lo: lo1, hi: *hi },
                ))
            }
            (Arch::Hypercube { dim }, Dom::Cube { bits, value }) => {
                if *bits >= *dim {
                    return None;
                }
                Some((
                    Dom::Cube {
                        bits: bits + 1,
                        value: *value,
                    },
                    Dom::Cube {
                        bits: bits + 1,
                        value: value | (1u64 << bits),
                    },
                ))
            }
            (Arch::TreeLeaf { arities, .. }, Dom::Tree { lo, nbr }) => {
                if *nbr < 2 {
                    return None;
                }
                // Split on the coarsest subtree boundary inside the range.
                let mut span = 1;
                for window in subtree_spans(arities) {
                    if window < *nbr {
                        span = window;
                        break;
                    }
                }
                let groups = nbr / span;
                let half = (groups / 2).max(1) * span;
                Some((
                    Dom::Tree { lo: *lo, nbr: half },
                    Dom::Tree {
                        lo: lo + half,
                        nbr: nbr - half,
                    },
                ))
            }
            (Arch::Deco(deco), Dom::Deco { index }) => deco.doms[*index]
                .children
                .map(|(a, b)| (Dom::Deco { index: a }, Dom::Deco { index: b })),
            _ => panic!("domain does not belong to this architecture"),
        }
    }

    /// Distance between two domains.
    pub fn dom_dist(&self, a: &Dom, b: &Dom) -> Num {
        match (self, a, b) {
            (
                Arch::Complete { .. } | Arch::CompleteWeighted { .. },
                Dom::Range { lo: la, .. },
                Dom::Range { lo: lb, .. },
            ) => {
                if la == lb {
                    0
                } else {
                    1
                }
            }
            (Arch::Mesh2 { .. }, Dom::Box2 { lo: la, hi: ha }, Dom::Box2 { lo: lb, hi: hb }) => {
                // Manhattan distance between box centers, in half-units.
                let mut dist = 0;
                for axis in 0..2 {
                    let ca = (la[axis] + ha[axis]) as Num;
                    let cb = (lb[axis] + hb[axis]) as Num;
                    dist += (ca - cb).abs();
                }
                dist / 2
            }
            (
                Arch::Torus2 { dims },
                Dom::Box2 { lo: la, hi: ha },
                Dom::Box2 { lo: lb, hi: hb },
            ) => {
                let mut dist = 0;
                for axis in 0..2 {
                    let ca = (la[axis] + ha[axis]) as Num;
                    let cb = (lb[axis] + hb[axis]) as Num;
                    let d = (ca - cb).abs();
                    dist += d.min(2 * dims[axis] as Num - d);
                }
                dist / 2
            }
            (Arch::Mesh3 { .. }, Dom::Box3 { lo: la, hi: ha }, Dom::Box3 { lo: lb, hi: hb }) => {
                let mut dist = 0;
                for axis in 0..3 {
                    let ca = (la[axis] + ha[axis]) as Num;
                    let cb = (lb[axis] + hb[axis]) as Num;
                    dist += (ca - cb).abs();
                }
                dist / 2
            }
            (
                Arch::Torus3 { dims },
                Dom::Box3 { lo: la, hi: ha },
                Dom::Box3 { lo: lb, hi: hb },
            ) => {
                let mut dist = 0;
                for axis in 0..3 {
                    let ca = (la[axis] + ha[axis]) as Num;
                    let cb = (lb[axis] + hb[axis]) as Num;
                    let d = (ca - cb).abs();
                    dist += d.min(2 * dims[axis] as Num - d);
                }
                dist / 2
            }
            (
                Arch::Hypercube { .. },
                Dom::Cube {
                    bits: ba,
                    value: va,
                },
                Dom::Cube {
                    bits: bb,
                    value: vb,
                },
            ) => {
                let common = (*ba).min(*bb);
                let mask = if common == 0 { 0 } else { (1u64 << common) - 1 };
                ((va ^ vb) & mask).count_ones() as Num
            }
            (Arch::TreeLeaf { arities, costs }, Dom::Tree { lo: la, .. }, Dom::Tree { lo: lb, .. }) => {
                tree_leaf_dist(arities, costs, *la, *lb)
            }
            (Arch::Deco(deco), Dom::Deco { index: ia }, Dom::Deco { index: ib }) => {
                let ra = deco.doms[*ia].rep;
                let rb = deco.doms[*ib].rep;
                deco.dist[ra * deco.terms + rb]
            }
            _ => panic!("domain does not belong to this architecture"),
        }
    }

    /// The terminal domain of processor `t`.
    pub fn dom_term(&self, t: usize) -> Result<Dom> {
        if t >= self.size() {
            return Err(Error::input(format!("terminal {t} out of range")));
        }
        Ok(match self {
            Arch::Complete { .. } | Arch::CompleteWeighted { .. } => Dom::Range { lo: t, hi: t + 1 },
            Arch::Mesh2 { dims } | Arch::Torus2 { dims } => {
                let xy = [t % dims[0], t / dims[0]];
                Dom::Box2 { lo: xy, hi: xy }
            }
            Arch::Mesh3 { dims } | Arch::Torus3 { dims } => {
                let xyz = [t % dims[0], (t / dims[0]) % dims[1], t / (dims[0] * dims[1])];
                Dom::Box3 { lo: xyz, hi: xyz }
            }
            Arch::Hypercube { dim } => Dom::Cube {
                bits: *dim,
                value: t as u64,
            },
            Arch::TreeLeaf { .. } => Dom::Tree { lo: t, nbr: 1 },
            Arch::Deco(deco) => Dom::Deco {
                index: deco.term_of[t],
            },
        })
    }

    /// Terminal number of a domain, if it is terminal.
    pub fn dom_terminal_num(&self, dom: &Dom) -> Option<usize> {
        if self.dom_size(dom) != 1 {
            return None;
        }
        Some(match (self, dom) {
            (Arch::Complete { .. } | Arch::CompleteWeighted { .. }, Dom::Range { lo, .. }) => *lo,
            (Arch::Mesh2 { dims } | Arch::Torus2 { dims }, Dom::Box2 { lo, .. }) => {
                lo[0] + lo[1] * dims[0]
            }
            (Arch::Mesh3 { dims } | Arch::Torus3 { dims }, Dom::Box3 { lo, .. }) => {
                lo[0] + lo[1] * dims[0] + lo[2] * dims[0] * dims[1]
            }
            (Arch::Hypercube { .. }, Dom::Cube { value, .. }) => *value as usize,
            (Arch::TreeLeaf { .. }, Dom::Tree { lo, .. }) => *lo,
            (Arch::Deco(deco), Dom::Deco { index }) => deco.doms[*index].term.unwrap(),
            _ => panic!("domain does not belong to this architecture"),
        })
    }
}

/// Leaf counts of the subtrees at each level, root excluded, deepest last.
fn subtree_spans(arities: &[usize]) -> Vec<usize> {
    let mut spans = Vec::with_capacity(arities.len());
    for l in 1..=arities.len() {
        spans.push(arities[l..].iter().product());
    }
    spans
}

fn tree_leaf_dist(arities: &[usize], costs: &[Num], a: usize, b: usize) -> Num {
    let mut ia = a;
    let mut ib = b;
    let mut dist = 0;
    for l in (0..arities.len()).rev() {
        if ia == ib {
            break;
        }
        ia /= arities[l];
        ib /= arities[l];
        dist += 2 * costs[l]; // both sides climb one link
    }
    dist
}

/// Decomposition-defined architecture: a bisection tree over the vertices
/// of a target graph, with hop distances between terminals.
#[derive(Clone, Debug)]
pub struct DecoArch {
    doms: Vec<DecoDom>,
    term_of: Vec<usize>,
    dist: Vec<Num>,
    terms: usize,
}

#[derive(Clone, Debug)]
struct DecoDom {
    children: Option<(usize, usize)>,
    weight: Num,
    size: usize,
    rep: usize,
    term: Option<usize>,
}

impl DecoArch {
    fn build(target: &Graph) -> Result<DecoArch> {
        let terms = target.vertnbr();
        if terms == 0 {
            return Err(Error::input("target graph has no vertices"));
        }
        let mut doms = Vec::new();
        let mut term_of = vec![0usize; terms];
        let all: Vec<usize> = (0..terms).collect();
        Self::split(target, &all, &mut doms, &mut term_of);

        // All-pairs hop distances between terminals.
        let mut dist = vec![0 as Num; terms * terms];
        for src in 0..terms {
            let row = &mut dist[src * terms..(src + 1) * terms];
            let mut seen = vec![false; terms];
            let mut queue = std::collections::VecDeque::new();
            seen[src] = true;
            queue.push_back((src, 0 as Num));
            while let Some((v, d)) = queue.pop_front() {
                row[v] = d;
                for &u in target.neighbors(v) {
                    if !seen[u] {
                        seen[u] = true;
                        queue.push_back((u, d + 1));
                    }
                }
            }
        }
        Ok(DecoArch {
            doms,
            term_of,
            dist,
            terms,
        })
    }

    /// Recursively bisect `verts`, appending the created domain and
    /// returning its index.
    fn split(
        target: &Graph,
        verts: &[usize],
        doms: &mut Vec<DecoDom>,
        term_of: &mut [usize],
    ) -> usize {
        let index = doms.len();
        let weight: Num = verts.iter().map(|&v| target.vertex_load(v)).sum();
        doms.push(DecoDom {
            children: None,
            weight,
            size: verts.len(),
            rep: verts[0],
            term: (verts.len() == 1).then(|| verts[0]),
        });
        if verts.len() == 1 {
            term_of[verts[0]] = index;
            return index;
        }
        // Halve by breadth-first growth from the first vertex; vertices
        // unreached within the subset fall to the far side.
        let mut in_set = vec![false; target.vertnbr()];
        for &v in verts {
            in_set[v] = true;
        }
        let goal = weight / 2;
        let mut grown: Vec<usize> = Vec::new();
        let mut grown_load = 0;
        let mut seen = vec![false; target.vertnbr()];
        let mut queue = std::collections::VecDeque::new();
        seen[verts[0]] = true;
        queue.push_back(verts[0]);
        while let Some(v) = queue.pop_front() {
            if grown_load + target.vertex_load(v) > goal && !grown.is_empty() {
                break;
            }
            grown_load += target.vertex_load(v);
            grown.push(v);
            for &u in target.neighbors(v) {
                if in_set[u] && !seen[u] {
                    seen[u] = true;
                    queue.push_back(u);
                }
            }
        }
        let mut taken = vec![false; target.vertnbr()];
        for &v in &grown {
            taken[v] = true;
        }
        let rest: Vec<usize> = verts.iter().copied().filter(|&v| !taken[v]).collect();
        let left = Self::split(target, &grown, doms, term_of);
        let right = Self::split(target, &rest, doms, term_of);
        doms[index].children = Some((left, right));
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_distances() {
        let arch = Arch::complete(4).unwrap();
        let t0 = arch.dom_term(0).unwrap();
        let t3 = arch.dom_term(3).unwrap();
        assert_eq!(arch.dom_dist(&t0, &t0), 0);
        assert_eq!(arch.dom_dist(&t0, &t3), 1);
    }

    #[test]
    fn hypercube_distances_are_hamming() {
        let arch = Arch::hypercube(2).unwrap();
        let t = |n| arch.dom_term(n).unwrap();
        assert_eq!(arch.dom_dist(&t(0), &t(1)), 1);
        assert_eq!(arch.dom_dist(&t(0), &t(3)), 2);
        assert_eq!(arch.dom_dist(&t(1), &t(2)), 2);
    }

    #[test]
    fn bipart_reaches_all_terminals() {
        let arch = Arch::mesh2(3, 2).unwrap();
        let mut stack = vec![arch.first_domain()];
        let mut terminals = Vec::new();
        while let Some(dom) = stack.pop() {
            match arch.dom_bipart(&dom) {
                Some((a, b)) => {
                    stack.push(a);
                    stack.push(b);
                }
                None => terminals.push(arch.dom_terminal_num(&dom).unwrap()),
            }
        }
        terminals.sort_unstable();
        assert_eq!(terminals, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn deco_build_covers_target() {
        let target = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let arch = Arch::decomposition(&target).unwrap();
        assert_eq!(arch.size(), 4);
        let d = arch.first_domain();
        let (a, b) = arch.dom_bipart(&d).unwrap();
        assert_eq!(arch.dom_size(&a) + arch.dom_size(&b), 4);
        let t0 = arch.dom_term(0).unwrap();
        let t2 = arch.dom_term(2).unwrap();
        assert_eq!(arch.dom_dist(&t0, &t2), 2); // opposite corners of the ring
    }
}
