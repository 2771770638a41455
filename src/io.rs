//! Text formats: graphs, mappings and orderings.
//!
//! Readers tokenize on whitespace, validate aggressively (symmetry, load
//! symmetry, self-loops, counts) and fail without partial results; writers
//! emit the same layout the readers accept.

pub mod graph;
pub mod pairs;

pub use graph::{read_graph, write_graph};
pub use pairs::{read_mapping, read_ordering, write_mapping, write_ordering};

use crate::error::Error;

pub(crate) fn io_err(err: std::io::Error) -> Error {
    Error::InvalidInput(format!("i/o error: {err}"))
}

/// Whitespace tokenizer with a running token counter for diagnostics.
pub(crate) struct Tokens<'a> {
    iter: std::str::SplitWhitespace<'a>,
    count: usize,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(src: &'a str) -> Tokens<'a> {
        Tokens {
            iter: src.split_whitespace(),
            count: 0,
        }
    }

    pub(crate) fn next_str(&mut self) -> Result<&'a str, Error> {
        self.count += 1;
        self.iter
            .next()
            .ok_or_else(|| Error::input(format!("unexpected end of file at token {}", self.count)))
    }

    pub(crate) fn next_num(&mut self) -> Result<i64, Error> {
        let token = self.next_str()?;
        token.parse().map_err(|_| {
            Error::input(format!(
                "expected a number at token {}, got '{token}'",
                self.count
            ))
        })
    }

    pub(crate) fn finished(&mut self) -> bool {
        self.iter.next().is_none()
    }
}
