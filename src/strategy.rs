//! Strategy trees: the declarative plans that drive every solver.
//!
//! A [`Strategy`] is a small tree built from five node kinds: the no-op
//! [`Strategy::Empty`], sequencing ([`Strategy::Concat`]), a conditional
//! over graph attributes ([`Strategy::Cond`]), best-of-two selection
//! ([`Strategy::Select`]) and method invocation ([`Strategy::Method`]).
//! Methods are typed per active object (bipartition graph, separator
//! graph, k-way graph, ordering task); a method's parameters may embed
//! nested strategies, possibly of a different method type, which is how
//! the multilevel scheme composes coarsening, leaf solving and refinement
//! into one plan.
//!
//! [`Strategy::run`] is the interpreter. `Select` snapshots the active
//! object through the [`Active`] trait, runs both branches from the same
//! state, and keeps the winner under the active type's objective; a
//! failing branch counts as infinitely bad, and only two failing branches
//! propagate an error. Parsing and printing round-trip: a parsed tree,
//! printed with `Display` and re-parsed, compares structurally equal.

pub mod parser;

use crate::context::Context;
use crate::error::{Error, Result};
use ordered_float::OrderedFloat;
use std::fmt;

pub use parser::{parse, Parser};

/// State an interpreter can snapshot, restore and score.
pub trait Active {
    /// Opaque saved state for `Select`.
    type Snapshot;

    /// Capture the current solution state.
    fn save(&self) -> Self::Snapshot;

    /// Restore a previously captured state.
    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Scalar objective `(primary, secondary)`; lower is better, compared
    /// lexicographically with no tie-break randomness.
    fn objective(&self) -> (f64, f64);

    /// Value of a named attribute for `Cond` tests.
    fn attr(&self, name: &str) -> Option<f64>;
}

/// A method family applicable to one active type.
pub trait Method: Clone + PartialEq + fmt::Debug + fmt::Display + Sized {
    /// The active object this method family transforms.
    type Active: Active;

    /// Attribute names a `Cond` test may reference.
    const ATTRS: &'static [&'static str];

    /// Apply the method to the active object.
    fn apply(&self, active: &mut Self::Active, ctx: &mut Context) -> Result<()>;

    /// Parse the method named by a single letter, parameters included.
    fn parse(name: char, parser: &mut Parser<'_>) -> Result<Self>;
}

/// A compiled strategy tree over methods of type `M`.
#[derive(Clone, Debug, PartialEq)]
pub enum Strategy<M> {
    /// Do nothing.
    Empty,
    /// Apply the first strategy, then the second, threading state.
    Concat(Box<Strategy<M>>, Box<Strategy<M>>),
    /// Apply the first strategy if the test holds, else the optional other.
    Cond(TestExpr, Box<Strategy<M>>, Option<Box<Strategy<M>>>),
    /// Apply both from the same state and keep the better outcome.
    Select(Box<Strategy<M>>, Box<Strategy<M>>),
    /// Apply one method.
    Method(M),
}

impl<M> Strategy<M> {
    /// Whether this is the no-op strategy.
    pub fn is_empty(&self) -> bool {
        matches!(self, Strategy::Empty)
    }
}

impl<M: Method> Strategy<M> {
    /// Interpret the tree over an active object.
    pub fn run(&self, active: &mut M::Active, ctx: &mut Context) -> Result<()> {
        match self {
            Strategy::Empty => Ok(()),
            Strategy::Concat(first, second) => {
                first.run(active, ctx)?;
                second.run(active, ctx)
            }
            Strategy::Cond(test, then, other) => {
                if test.eval(active)? != 0.0 {
                    then.run(active, ctx)
                } else if let Some(other) = other {
                    other.run(active, ctx)
                } else {
                    Ok(())
                }
            }
            Strategy::Select(first, second) => {
                let initial = active.save();
                let first_state = match first.run(active, ctx) {
                    Ok(()) => Some((active.save(), active.objective())),
                    Err(err) => {
                        log::debug!("select: first branch failed: {err}");
                        None
                    }
                };
                active.restore(initial);
                let second_result = second.run(active, ctx);
                match (first_state, second_result) {
                    (None, second_result) => second_result,
                    (Some((snapshot, first_obj)), Ok(())) => {
                        let second_obj = active.objective();
                        if rank(first_obj) < rank(second_obj) {
                            active.restore(snapshot);
                        }
                        Ok(())
                    }
                    (Some((snapshot, _)), Err(err)) => {
                        log::debug!("select: second branch failed: {err}");
                        active.restore(snapshot);
                        Ok(())
                    }
                }
            }
            Strategy::Method(method) => method.apply(active, ctx),
        }
    }
}

fn rank(obj: (f64, f64)) -> (OrderedFloat<f64>, OrderedFloat<f64>) {
    (OrderedFloat(obj.0), OrderedFloat(obj.1))
}

impl<M: fmt::Display> Strategy<M> {
    fn fmt_inner(&self, f: &mut fmt::Formatter<'_>, in_concat: bool) -> fmt::Result {
        match self {
            Strategy::Empty => Ok(()),
            Strategy::Method(method) => write!(f, "{method}"),
            Strategy::Concat(a, b) => {
                a.fmt_inner(f, true)?;
                b.fmt_inner(f, true)
            }
            Strategy::Select(a, b) => {
                if in_concat {
                    write!(f, "(")?;
                }
                a.fmt_inner(f, false)?;
                write!(f, "|")?;
                b.fmt_inner(f, false)?;
                if in_concat {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Strategy::Cond(test, then, other) => {
                write!(f, "/{test}?")?;
                then.fmt_inner(f, false)?;
                if let Some(other) = other {
                    write!(f, ":")?;
                    other.fmt_inner(f, false)?;
                }
                write!(f, ";")
            }
        }
    }
}

impl<M: fmt::Display> fmt::Display for Strategy<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_inner(f, false)
    }
}

/// Comparison operators of test expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Eq,
    Gt,
}

/// Arithmetic operators of test expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Mod,
}

/// A pure expression over named attributes and constants.
#[derive(Clone, Debug, PartialEq)]
pub enum TestExpr {
    /// Logical or; any nonzero operand is true.
    Or(Box<TestExpr>, Box<TestExpr>),
    /// Logical and.
    And(Box<TestExpr>, Box<TestExpr>),
    /// Logical not.
    Not(Box<TestExpr>),
    /// Comparison, yielding 0 or 1.
    Cmp(CmpOp, Box<TestExpr>, Box<TestExpr>),
    /// Arithmetic.
    Bin(BinOp, Box<TestExpr>, Box<TestExpr>),
    /// Numeric constant.
    Const(f64),
    /// Published attribute of the active object.
    Var(&'static str),
}

impl TestExpr {
    /// Evaluate against an active object's published attributes.
    pub fn eval<A: Active>(&self, active: &A) -> Result<f64> {
        Ok(match self {
            TestExpr::Or(a, b) => {
                ((a.eval(active)? != 0.0) || (b.eval(active)? != 0.0)) as u8 as f64
            }
            TestExpr::And(a, b) => {
                ((a.eval(active)? != 0.0) && (b.eval(active)? != 0.0)) as u8 as f64
            }
            TestExpr::Not(a) => (a.eval(active)? == 0.0) as u8 as f64,
            TestExpr::Cmp(op, a, b) => {
                let (a, b) = (a.eval(active)?, b.eval(active)?);
                let holds = match op {
                    CmpOp::Lt => a < b,
                    CmpOp::Eq => a == b,
                    CmpOp::Gt => a > b,
                };
                holds as u8 as f64
            }
            TestExpr::Bin(op, a, b) => {
                let (a, b) = (a.eval(active)?, b.eval(active)?);
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Mod => a % b,
                }
            }
            TestExpr::Const(value) => *value,
            TestExpr::Var(name) => active
                .attr(name)
                .ok_or_else(|| Error::StrategyRuntime(format!("unknown attribute '{name}'")))?,
        })
    }
}

impl fmt::Display for TestExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestExpr::Or(a, b) => write!(f, "({a}|{b})"),
            TestExpr::And(a, b) => write!(f, "({a}&{b})"),
            TestExpr::Not(a) => write!(f, "!{a}"),
            TestExpr::Cmp(op, a, b) => {
                let op = match op {
                    CmpOp::Lt => '<',
                    CmpOp::Eq => '=',
                    CmpOp::Gt => '>',
                };
                write!(f, "({a}{op}{b})")
            }
            TestExpr::Bin(op, a, b) => {
                let op = match op {
                    BinOp::Add => '+',
                    BinOp::Sub => '-',
                    BinOp::Mul => '*',
                    BinOp::Mod => '%',
                };
                write!(f, "({a}{op}{b})")
            }
            TestExpr::Const(value) => write!(f, "{value}"),
            TestExpr::Var(name) => write!(f, "{name}"),
        }
    }
}
