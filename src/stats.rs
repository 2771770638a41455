//! Quality reports for mappings and orderings.
//!
//! [`MappingStats`] summarizes load balance, edge cut and dilation;
//! [`OrderStats`] runs a symbolic Cholesky factorization along the
//! ordering and reports fill-in and operation counts. Both serialize to
//! JSON so they can be archived next to the results they describe.

use crate::error::{Error, Result};
use crate::graph::{Graph, Num};
use crate::io::io_err;
use crate::mapping::Mapping;
use crate::order::Order;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;

/// Quality summary of a finished mapping.
#[derive(Clone, Debug, Serialize)]
pub struct MappingStats {
    /// Number of mapped vertices.
    pub vertnbr: usize,
    /// Number of directed edges.
    pub edgenbr: usize,
    /// Terminals of the target architecture.
    pub target_count: usize,
    /// Terminals actually used.
    pub used_count: usize,
    /// Smallest terminal load.
    pub load_min: Num,
    /// Largest terminal load.
    pub load_max: Num,
    /// Average terminal load.
    pub load_avg: f64,
    /// `load_max / load_avg`.
    pub imbalance: f64,
    /// Total load of cut edges, dilation ignored.
    pub edge_cut: Num,
    /// Dilation-weighted communication load.
    pub comm_load: Num,
    /// Average dilation over cut edges.
    pub dilation_avg: f64,
}

/// Compute the quality summary of a terminal mapping.
pub fn mapping_stats(graph: &Graph, mapping: &Mapping) -> Result<MappingStats> {
    if mapping.vertnbr() != graph.vertnbr() {
        return Err(Error::input("mapping and graph sizes differ"));
    }
    let terminals = mapping.terminals()?;
    let arch = mapping.arch();
    let target_count = arch.size();
    let mut loads = vec![0 as Num; target_count];
    for v in 0..graph.vertnbr() {
        loads[terminals[v]] += graph.vertex_load(v);
    }

    let mut edge_cut = 0;
    let mut comm_load = 0;
    let mut cut_edges = 0usize;
    let mut dilation_sum = 0;
    for v in 0..graph.vertnbr() {
        for e in graph.edge_range(v) {
            let u = graph.edge_target(e);
            if terminals[v] == terminals[u] {
                continue;
            }
            let dist = arch.dom_dist(
                &arch.dom_term(terminals[v])?,
                &arch.dom_term(terminals[u])?,
            );
            edge_cut += graph.edge_load(e);
            comm_load += graph.edge_load(e) * dist;
            dilation_sum += dist;
            cut_edges += 1;
        }
    }
    edge_cut /= 2;
    comm_load /= 2;

    let used_count = loads.iter().filter(|&&l| l != 0).count();
    let load_min = loads.iter().copied().min().unwrap_or(0);
    let load_max = loads.iter().copied().max().unwrap_or(0);
    let load_avg = graph.load_sum() as f64 / target_count.max(1) as f64;
    Ok(MappingStats {
        vertnbr: graph.vertnbr(),
        edgenbr: graph.edgenbr(),
        target_count,
        used_count,
        load_min,
        load_max,
        load_avg,
        imbalance: if load_avg > 0.0 {
            load_max as f64 / load_avg
        } else {
            0.0
        },
        edge_cut,
        comm_load,
        dilation_avg: if cut_edges > 0 {
            dilation_sum as f64 / cut_edges as f64
        } else {
            0.0
        },
    })
}

impl MappingStats {
    /// Write the report as pretty JSON.
    pub fn save_json<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)
            .map_err(|e| Error::input(format!("cannot serialize statistics: {e}")))?;
        writeln!(writer).map_err(io_err)
    }
}

impl fmt::Display for MappingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "mapping: {} vertices onto {} terminals ({} used)",
            self.vertnbr, self.target_count, self.used_count
        )?;
        writeln!(
            f,
            "load: min {} max {} avg {:.2} imbalance {:.3}",
            self.load_min, self.load_max, self.load_avg, self.imbalance
        )?;
        write!(
            f,
            "comm: cut {} load {} dilation {:.3}",
            self.edge_cut, self.comm_load, self.dilation_avg
        )
    }
}

/// Quality summary of an ordering, from a symbolic factorization.
#[derive(Clone, Debug, Serialize)]
pub struct OrderStats {
    /// Number of ordered vertices.
    pub vertnbr: usize,
    /// Strictly-lower nonzeros of the Cholesky factor.
    pub factor_nonzeros: Num,
    /// Operation count of the factorization.
    pub operation_count: f64,
    /// Height of the elimination tree.
    pub tree_depth: usize,
    /// Column blocks of the separator tree.
    pub block_count: usize,
}

/// Symbolically factor the ordered graph and report fill statistics.
pub fn order_stats(graph: &Graph, order: &Order) -> Result<OrderStats> {
    if order.vertnbr() != graph.vertnbr() {
        return Err(Error::input("ordering and graph sizes differ"));
    }
    let n = graph.vertnbr();
    // Column structures by rank: original below-diagonal entries merged
    // with the structures of elimination-tree children.
    let mut columns: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut height = vec![1usize; n];
    let mut nonzeros = 0;
    let mut operations = 0.0;
    let mut depth = if n > 0 { 1 } else { 0 };

    for k in 0..n {
        let v = order.vertex(k);
        let mut column = BTreeSet::new();
        for &u in graph.neighbors(v) {
            let r = order.rank(u);
            if r > k {
                column.insert(r);
            }
        }
        for child in children[k].drain(..) {
            height[k] = height[k].max(height[child] + 1);
            depth = depth.max(height[k]);
            let sub = std::mem::take(&mut columns[child]);
            for r in sub {
                if r > k {
                    column.insert(r);
                }
            }
        }
        nonzeros += column.len() as Num;
        let c = (column.len() + 1) as f64;
        operations += c * c;
        if let Some(&parent) = column.iter().next() {
            children[parent].push(k);
        }
        columns[k] = column;
    }

    Ok(OrderStats {
        vertnbr: n,
        factor_nonzeros: nonzeros,
        operation_count: operations,
        tree_depth: depth,
        block_count: order.tree().block_count(),
    })
}

impl OrderStats {
    /// Write the report as pretty JSON.
    pub fn save_json<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)
            .map_err(|e| Error::input(format!("cannot serialize statistics: {e}")))?;
        writeln!(writer).map_err(io_err)
    }
}

impl fmt::Display for OrderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ordering: {} vertices, {} blocks",
            self.vertnbr, self.block_count
        )?;
        write!(
            f,
            "factor: {} subdiagonal nonzeros, {:.3e} operations, depth {}",
            self.factor_nonzeros, self.operation_count, self.tree_depth
        )
    }
}
