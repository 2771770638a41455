//! Mapping and ordering files: a count then `(label, value)` pairs.
//!
//! Mapping files pair each vertex label with its terminal number;
//! ordering files pair each vertex label with its based rank.

use crate::error::{Error, Result};
use crate::graph::{Graph, Num};
use crate::io::{io_err, Tokens};
use crate::mapping::Mapping;
use crate::order::Order;
use std::io::{BufRead, Read, Write};

/// Write a finished mapping as `(label, terminal)` pairs.
pub fn write_mapping<W: Write>(graph: &Graph, mapping: &Mapping, writer: &mut W) -> Result<()> {
    let terminals = mapping.terminals()?;
    write_pairs(graph, terminals.iter().map(|&t| t as Num), writer)
}

/// Write an ordering as `(label, based rank)` pairs.
pub fn write_ordering<W: Write>(graph: &Graph, order: &Order, writer: &mut W) -> Result<()> {
    let base = graph.base();
    write_pairs(
        graph,
        (0..graph.vertnbr()).map(|v| order.rank(v) as Num + base),
        writer,
    )
}

fn write_pairs<W: Write>(
    graph: &Graph,
    values: impl Iterator<Item = Num>,
    writer: &mut W,
) -> Result<()> {
    writeln!(writer, "{}", graph.vertnbr()).map_err(io_err)?;
    for (v, value) in values.enumerate() {
        writeln!(writer, "{}\t{}", graph.label(v), value).map_err(io_err)?;
    }
    Ok(())
}

/// Read `(label, value)` pairs from a mapping file.
pub fn read_mapping<R: BufRead>(reader: R) -> Result<Vec<(Num, Num)>> {
    read_pairs(reader)
}

/// Read `(label, based rank)` pairs from an ordering file.
pub fn read_ordering<R: BufRead>(reader: R) -> Result<Vec<(Num, Num)>> {
    read_pairs(reader)
}

fn read_pairs<R: BufRead>(mut reader: R) -> Result<Vec<(Num, Num)>> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(io_err)?;
    let mut tokens = Tokens::new(&text);
    let count = usize::try_from(tokens.next_num()?)
        .map_err(|_| Error::input("negative pair count"))?;
    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let label = tokens.next_num()?;
        let value = tokens.next_num()?;
        pairs.push((label, value));
    }
    if !tokens.finished() {
        return Err(Error::input("trailing data after the last pair"));
    }
    Ok(pairs)
}
