//! Orderings: permutations organized as a separator tree.
//!
//! Nested dissection produces a rooted tree of column blocks: leaves carry
//! a permuted vertex range, internal nodes carry the rank range of their
//! separator, numbered after every descendant. The concatenation of leaf
//! ranges left to right, separators last, is the final permutation.

use crate::error::{Error, Result};
use crate::graph::Num;
use serde::Serialize;

/// A node of the separator tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum OrderNode {
    /// A permuted leaf range of ranks `lo..hi`.
    Leaf {
        /// First rank of the block.
        lo: usize,
        /// One past the last rank of the block.
        hi: usize,
    },
    /// A dissection node: ordered children, then the separator ranks.
    Sep {
        /// Sub-blocks, numbered before the separator.
        children: Vec<OrderNode>,
        /// Rank range of the separator, numbered last. May be empty.
        lo: usize,
        /// One past the last separator rank.
        hi: usize,
    },
}

impl OrderNode {
    /// Rank span `(lo, hi)` covered by this subtree.
    pub fn span(&self) -> (usize, usize) {
        match self {
            OrderNode::Leaf { lo, hi } => (*lo, *hi),
            OrderNode::Sep { children, lo, hi } => {
                let first = children.first().map_or(*lo, |c| c.span().0);
                (first.min(*lo), *hi)
            }
        }
    }

    /// Number of column blocks (leaves plus separators).
    pub fn block_count(&self) -> usize {
        match self {
            OrderNode::Leaf { .. } => 1,
            OrderNode::Sep { children, .. } => {
                1 + children.iter().map(OrderNode::block_count).sum::<usize>()
            }
        }
    }

    /// Depth of the tree; a lone leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            OrderNode::Leaf { .. } => 1,
            OrderNode::Sep { children, .. } => {
                1 + children.iter().map(OrderNode::depth).max().unwrap_or(0)
            }
        }
    }
}

/// A complete vertex ordering with its separator tree.
#[derive(Clone, Debug)]
pub struct Order {
    base: Num,
    perm: Vec<usize>,
    peri: Vec<usize>,
    tree: OrderNode,
}

impl Order {
    /// Assemble an ordering from a direct permutation (`perm[v]` is the
    /// rank of vertex `v`) and its tree; validates completeness.
    pub fn new(base: Num, perm: Vec<usize>, tree: OrderNode) -> Result<Order> {
        let vertnbr = perm.len();
        let mut peri = vec![usize::MAX; vertnbr];
        for (v, &rank) in perm.iter().enumerate() {
            if rank >= vertnbr {
                return Err(Error::input(format!("rank {rank} out of range")));
            }
            if peri[rank] != usize::MAX {
                return Err(Error::input(format!("rank {rank} assigned twice")));
            }
            peri[rank] = v;
        }
        Ok(Order {
            base,
            perm,
            peri,
            tree,
        })
    }

    /// External numbering base.
    pub fn base(&self) -> Num {
        self.base
    }

    /// Number of ordered vertices.
    pub fn vertnbr(&self) -> usize {
        self.perm.len()
    }

    /// Rank of a vertex (0-based).
    pub fn rank(&self, v: usize) -> usize {
        self.perm[v]
    }

    /// Vertex at a rank (0-based).
    pub fn vertex(&self, rank: usize) -> usize {
        self.peri[rank]
    }

    /// Direct permutation, 0-based.
    pub fn permutation(&self) -> &[usize] {
        &self.perm
    }

    /// Inverse permutation, 0-based.
    pub fn inverse(&self) -> &[usize] {
        &self.peri
    }

    /// The separator tree.
    pub fn tree(&self) -> &OrderNode {
        &self.tree
    }

    /// Verify that the permutation is complete and the tree spans it.
    pub fn check(&self) -> Result<()> {
        for (rank, &v) in self.peri.iter().enumerate() {
            if v >= self.perm.len() || self.perm[v] != rank {
                return Err(Error::internal("permutation arrays disagree"));
            }
        }
        let (lo, hi) = self.tree.span();
        if lo != 0 || hi != self.perm.len() {
            return Err(Error::internal("separator tree does not span the ordering"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_ranks() {
        let tree = OrderNode::Leaf { lo: 0, hi: 3 };
        assert!(Order::new(0, vec![0, 1, 1], tree).is_err());
    }

    #[test]
    fn tree_accounting() {
        let tree = OrderNode::Sep {
            children: vec![
                OrderNode::Leaf { lo: 0, hi: 2 },
                OrderNode::Leaf { lo: 2, hi: 4 },
            ],
            lo: 4,
            hi: 5,
        };
        assert_eq!(tree.block_count(), 3);
        assert_eq!(tree.depth(), 2);
        let order = Order::new(0, vec![0, 1, 2, 3, 4], tree).unwrap();
        assert!(order.check().is_ok());
    }
}
