//! Mappings: assignments of graph vertices to architecture domains.

use crate::arch::{Arch, Dom};
use crate::error::{Error, Result};
use crate::graph::Num;

/// A mapping of vertices onto the domains of a target architecture.
///
/// Domains live in a table; each vertex holds an index into it. During
/// recursive bipartitioning the table holds intermediate non-terminal
/// domains, which later refine toward terminals; a finished mapping has
/// every referenced domain terminal.
#[derive(Clone, Debug)]
pub struct Mapping {
    base: Num,
    arch: Arch,
    domains: Vec<Dom>,
    parts: Vec<usize>,
}

impl Mapping {
    /// A mapping of `vertnbr` vertices, all assigned to the whole machine.
    pub fn new_whole(base: Num, arch: Arch, vertnbr: usize) -> Mapping {
        let first = arch.first_domain();
        Mapping {
            base,
            arch,
            domains: vec![first],
            parts: vec![0; vertnbr],
        }
    }

    /// The target architecture.
    pub fn arch(&self) -> &Arch {
        &self.arch
    }

    /// External numbering base of the mapped graph.
    pub fn base(&self) -> Num {
        self.base
    }

    /// Number of mapped vertices.
    pub fn vertnbr(&self) -> usize {
        self.parts.len()
    }

    /// Number of domains in the table.
    pub fn domnbr(&self) -> usize {
        self.domains.len()
    }

    /// The domain a vertex is assigned to.
    pub fn domain_of(&self, v: usize) -> &Dom {
        &self.domains[self.parts[v]]
    }

    /// The domain table index a vertex is assigned to.
    pub fn part_of(&self, v: usize) -> usize {
        self.parts[v]
    }

    /// A domain by table index.
    pub fn domain(&self, index: usize) -> &Dom {
        &self.domains[index]
    }

    /// Append a domain to the table and return its index.
    pub fn push_domain(&mut self, dom: Dom) -> usize {
        self.domains.push(dom);
        self.domains.len() - 1
    }

    /// Reassign a vertex to a domain table index.
    pub fn assign(&mut self, v: usize, part: usize) {
        debug_assert!(part < self.domains.len());
        self.parts[v] = part;
    }

    /// Distance between the domains of two table indices.
    pub fn dist(&self, a: usize, b: usize) -> Num {
        if a == b {
            0
        } else {
            self.arch.dom_dist(&self.domains[a], &self.domains[b])
        }
    }

    /// The raw domain table.
    pub(crate) fn domains(&self) -> &[Dom] {
        &self.domains
    }

    /// Replace the domain table and part array wholesale.
    pub(crate) fn set_state(&mut self, domains: Vec<Dom>, parts: Vec<usize>) {
        debug_assert!(parts.iter().all(|&p| p < domains.len()));
        self.domains = domains;
        self.parts = parts;
    }

    /// Terminal number of every vertex.
    ///
    /// Fails if some vertex still sits on a non-terminal domain.
    pub fn terminals(&self) -> Result<Vec<usize>> {
        let terms: Vec<Option<usize>> = self
            .domains
            .iter()
            .map(|dom| self.arch.dom_terminal_num(dom))
            .collect();
        self.parts
            .iter()
            .enumerate()
            .map(|(v, &p)| {
                terms[p].ok_or_else(|| {
                    Error::input(format!("vertex {v} is mapped to a non-terminal domain"))
                })
            })
            .collect()
    }

    /// Verify table indices and domain/architecture agreement.
    pub fn check(&self) -> Result<()> {
        if self.domains.is_empty() {
            return Err(Error::input("mapping has an empty domain table"));
        }
        for (v, &p) in self.parts.iter().enumerate() {
            if p >= self.domains.len() {
                return Err(Error::input(format!(
                    "vertex {v} references domain {p} outside the table"
                )));
            }
        }
        Ok(())
    }
}
