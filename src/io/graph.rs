//! The graph text format.
//!
//! Header: version (`0`), vertex count, directed edge count, base value,
//! and a three-digit flag field `VL EL W` for vertex labels, edge loads
//! and vertex loads. Then one record per vertex: optional label, optional
//! load, degree, then for each neighbor an optional edge load and the
//! neighbor (its label when labels are present, its based index
//! otherwise). All tokens are whitespace separated; the reader accepts any
//! line layout.

use crate::error::{Error, Result};
use crate::graph::{Graph, Num};
use crate::io::{io_err, Tokens};
use std::collections::HashMap;
use std::io::{BufRead, Read, Write};

/// Read a graph, verifying every structural invariant.
pub fn read_graph<R: BufRead>(reader: R) -> Result<Graph> {
    let mut text = String::new();
    let mut reader = reader;
    reader.read_to_string(&mut text).map_err(io_err)?;
    let mut tokens = Tokens::new(&text);

    let version = tokens.next_num()?;
    if version != 0 {
        return Err(Error::input(format!("unsupported format version {version}")));
    }
    let vertnbr = usize::try_from(tokens.next_num()?)
        .map_err(|_| Error::input("negative vertex count"))?;
    let edgenbr = usize::try_from(tokens.next_num()?)
        .map_err(|_| Error::input("negative edge count"))?;
    let base = tokens.next_num()?;
    if base != 0 && base != 1 {
        return Err(Error::input(format!("base value must be 0 or 1, got {base}")));
    }
    let flags = tokens.next_str()?;
    if flags.len() > 3 || !flags.bytes().all(|b| matches!(b, b'0' | b'1')) {
        return Err(Error::input(format!("malformed flag field '{flags}'")));
    }
    let flags_val: u32 = flags.parse().unwrap_or(0);
    let has_labels = flags_val / 100 % 10 != 0;
    let has_edge_loads = flags_val / 10 % 10 != 0;
    let has_vertex_loads = flags_val % 10 != 0;

    let mut offsets = Vec::with_capacity(vertnbr + 1);
    let mut ends: Vec<Num> = Vec::with_capacity(edgenbr);
    let mut edge_loads = has_edge_loads.then(|| Vec::with_capacity(edgenbr));
    let mut vertex_loads = has_vertex_loads.then(|| Vec::with_capacity(vertnbr));
    let mut labels = has_labels.then(|| Vec::with_capacity(vertnbr));

    offsets.push(0usize);
    for v in 0..vertnbr {
        if let Some(labels) = labels.as_mut() {
            labels.push(tokens.next_num()?);
        }
        if let Some(loads) = vertex_loads.as_mut() {
            let load = tokens.next_num()?;
            if load < 0 {
                return Err(Error::input(format!("negative load on vertex {v}")));
            }
            loads.push(load);
        }
        let degree = usize::try_from(tokens.next_num()?)
            .map_err(|_| Error::input(format!("negative degree on vertex {v}")))?;
        for _ in 0..degree {
            if let Some(loads) = edge_loads.as_mut() {
                let load = tokens.next_num()?;
                if load < 0 {
                    return Err(Error::input(format!("negative edge load on vertex {v}")));
                }
                loads.push(load);
            }
            ends.push(tokens.next_num()?);
        }
        offsets.push(ends.len());
    }
    if !tokens.finished() {
        return Err(Error::input("trailing data after the last vertex record"));
    }
    if ends.len() != edgenbr {
        return Err(Error::input(format!(
            "edge count mismatch: header says {edgenbr}, records hold {}",
            ends.len()
        )));
    }

    // Resolve end vertices: labels when present, based indices otherwise.
    let targets: Vec<usize> = if let Some(labels) = &labels {
        let mut index_of: HashMap<Num, usize> = HashMap::with_capacity(vertnbr);
        for (i, &label) in labels.iter().enumerate() {
            if index_of.insert(label, i).is_some() {
                return Err(Error::input(format!("duplicate vertex label {label}")));
            }
        }
        ends.iter()
            .map(|end| {
                index_of
                    .get(end)
                    .copied()
                    .ok_or_else(|| Error::input(format!("unknown end-vertex label {end}")))
            })
            .collect::<Result<_>>()?
    } else {
        ends.iter()
            .map(|&end| {
                let idx = end - base;
                if idx < 0 || idx >= vertnbr as Num {
                    Err(Error::input(format!("end vertex {end} out of range")))
                } else {
                    Ok(idx as usize)
                }
            })
            .collect::<Result<_>>()?
    };

    Graph::from_csr(base, offsets, targets, vertex_loads, edge_loads, labels)
}

/// Write a graph in the same format.
pub fn write_graph<W: Write>(graph: &Graph, writer: &mut W) -> Result<()> {
    let flags = format!(
        "{}{}{}",
        graph.has_labels() as u8,
        graph.has_edge_loads() as u8,
        graph.has_vertex_loads() as u8
    );
    writeln!(writer, "0").map_err(io_err)?;
    writeln!(writer, "{} {}", graph.vertnbr(), graph.edgenbr()).map_err(io_err)?;
    writeln!(writer, "{} {}", graph.base(), flags).map_err(io_err)?;
    for v in 0..graph.vertnbr() {
        let mut line = String::new();
        if graph.has_labels() {
            line.push_str(&graph.label(v).to_string());
            line.push('\t');
        }
        if graph.has_vertex_loads() {
            line.push_str(&graph.vertex_load(v).to_string());
            line.push('\t');
        }
        line.push_str(&graph.degree(v).to_string());
        for e in graph.edge_range(v) {
            line.push('\t');
            if graph.has_edge_loads() {
                line.push_str(&graph.edge_load(e).to_string());
                line.push(' ');
            }
            let u = graph.edge_target(e);
            let end = if graph.has_labels() {
                graph.label(u)
            } else {
                u as Num + graph.base()
            };
            line.push_str(&end.to_string());
        }
        writeln!(writer, "{line}").map_err(io_err)?;
    }
    Ok(())
}
