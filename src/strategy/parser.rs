//! Recursive-descent parser for strategy strings.
//!
//! The concrete grammar (`|` selection binds loosest, juxtaposition is
//! concatenation, `/test?then:else;` is the conditional, methods are single
//! letters with an optional `{key=value,...}` group):
//!
//! ```text
//! strat  := concat ('|' concat)*
//! concat := ('/' expr '?' strat (':' strat)? ';' | '(' strat ')' | method)*
//! method := LETTER ('{' param (',' param)* '}')?
//! param  := IDENT '=' (LETTER | NUMBER | strat)
//! ```
//!
//! The lexer has three modes driven by the parser state: strategy mode
//! (single-letter method names), parameter mode (multi-letter keys) and
//! test mode (attribute identifiers, signed numbers). Identifiers are
//! case-insensitive; parameter and attribute names may be shortened to any
//! unambiguous prefix. Errors carry the 1-based line and column of the
//! offending character.

use crate::error::{Error, Result};
use crate::strategy::{BinOp, CmpOp, Method, Strategy, TestExpr};

/// Parse a complete strategy string.
pub fn parse<M: Method>(src: &str) -> Result<Strategy<M>> {
    let mut parser = Parser::new(src);
    let strat = parser.parse_strategy::<M>()?;
    parser.skip_space();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(strat)
}

/// Parser state over a strategy string.
pub struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str) -> Parser<'a> {
        Parser {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// An error anchored at the current position.
    pub fn error<S: Into<String>>(&self, message: S) -> Error {
        Error::StrategyParse {
            line: self.line,
            column: self.col,
            message: message.into(),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_space(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.bump();
        }
    }

    fn eat(&mut self, c: u8) -> bool {
        self.skip_space();
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c as char)))
        }
    }

    /// Multi-letter identifier, lowercased.
    fn ident(&mut self) -> Result<String> {
        self.skip_space();
        let mut name = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            name.push(self.bump().unwrap().to_ascii_lowercase() as char);
        }
        if name.is_empty() || name.as_bytes()[0].is_ascii_digit() {
            return Err(self.error("expected an identifier"));
        }
        Ok(name)
    }

    fn number(&mut self, allow_sign: bool) -> Result<f64> {
        self.skip_space();
        let start = self.pos;
        if allow_sign && matches!(self.peek(), Some(b'+') | Some(b'-')) {
            self.bump();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some(b'.') {
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
        text.parse::<f64>()
            .map_err(|_| self.error("expected a number"))
    }

    /* ---------------- strategy mode ---------------- */

    pub(crate) fn parse_strategy<M: Method>(&mut self) -> Result<Strategy<M>> {
        let mut acc = self.parse_concat::<M>()?;
        while self.eat(b'|') {
            let rhs = self.parse_concat::<M>()?;
            acc = Strategy::Select(Box::new(acc), Box::new(rhs));
        }
        Ok(acc)
    }

    fn parse_concat<M: Method>(&mut self) -> Result<Strategy<M>> {
        let mut items: Vec<Strategy<M>> = Vec::new();
        loop {
            self.skip_space();
            match self.peek() {
                Some(b'/') => items.push(self.parse_cond::<M>()?),
                Some(b'(') => {
                    self.bump();
                    let inner = self.parse_strategy::<M>()?;
                    if !self.eat(b')') {
                        return Err(self.error("unterminated group"));
                    }
                    items.push(inner);
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    self.bump();
                    let method = M::parse(c.to_ascii_lowercase() as char, self)?;
                    items.push(Strategy::Method(method));
                }
                _ => break,
            }
        }
        let mut iter = items.into_iter();
        let first = match iter.next() {
            Some(first) => first,
            None => return Ok(Strategy::Empty),
        };
        Ok(iter.fold(first, |acc, item| {
            Strategy::Concat(Box::new(acc), Box::new(item))
        }))
    }

    fn parse_cond<M: Method>(&mut self) -> Result<Strategy<M>> {
        self.expect(b'/')?;
        let test = self.parse_or::<M>()?;
        self.expect(b'?')?;
        let then = self.parse_strategy::<M>()?;
        let other = if self.eat(b':') {
            let other = self.parse_strategy::<M>()?;
            (!other.is_empty()).then(|| Box::new(other))
        } else {
            None
        };
        self.expect(b';')?;
        Ok(Strategy::Cond(test, Box::new(then), other))
    }

    /* ---------------- parameter mode ---------------- */

    /// Parse an optional `{key=value,...}` group.
    ///
    /// The setter receives each key and must consume its value with one of
    /// the `*_value` helpers, returning `false` for unknown keys.
    pub fn params(
        &mut self,
        mut setter: impl FnMut(&mut Parser<'a>, &str) -> Result<bool>,
    ) -> Result<()> {
        self.skip_space();
        if !self.eat(b'{') {
            return Ok(());
        }
        loop {
            let key = self.ident()?;
            self.expect(b'=')?;
            if !setter(self, &key)? {
                return Err(self.error(format!("unknown parameter '{key}'")));
            }
            if self.eat(b',') {
                continue;
            }
            if !self.eat(b'}') {
                return Err(self.error("unterminated parameter list"));
            }
            return Ok(());
        }
    }

    /// A floating-point parameter value.
    pub fn float_value(&mut self) -> Result<f64> {
        self.number(false)
    }

    /// An integer parameter value.
    pub fn int_value(&mut self) -> Result<i64> {
        let value = self.number(false)?;
        if value.fract() != 0.0 || value < 0.0 {
            return Err(self.error("expected a non-negative integer"));
        }
        Ok(value as i64)
    }

    /// A single-letter case parameter value.
    pub fn case_value(&mut self) -> Result<char> {
        self.skip_space();
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.bump();
                Ok(c.to_ascii_lowercase() as char)
            }
            _ => Err(self.error("expected a single-letter value")),
        }
    }

    /// A nested strategy parameter value, possibly of another method type.
    pub fn strat_value<M: Method>(&mut self) -> Result<Strategy<M>> {
        self.parse_strategy::<M>()
    }

    /// Skip a deprecated parameter's value, whatever its shape.
    pub fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated parameter list")),
                Some(b'{') | Some(b'(') => {
                    depth += 1;
                    self.bump();
                }
                Some(b'}') | Some(b')') if depth > 0 => {
                    depth -= 1;
                    self.bump();
                }
                Some(b'}') | Some(b',') => return Ok(()),
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /* ---------------- test mode ---------------- */

    fn parse_or<M: Method>(&mut self) -> Result<TestExpr> {
        let mut acc = self.parse_and::<M>()?;
        while self.eat(b'|') {
            let rhs = self.parse_and::<M>()?;
            acc = TestExpr::Or(Box::new(acc), Box::new(rhs));
        }
        Ok(acc)
    }

    fn parse_and<M: Method>(&mut self) -> Result<TestExpr> {
        let mut acc = self.parse_not::<M>()?;
        while self.eat(b'&') {
            let rhs = self.parse_not::<M>()?;
            acc = TestExpr::And(Box::new(acc), Box::new(rhs));
        }
        Ok(acc)
    }

    fn parse_not<M: Method>(&mut self) -> Result<TestExpr> {
        if self.eat(b'!') {
            let inner = self.parse_not::<M>()?;
            return Ok(TestExpr::Not(Box::new(inner)));
        }
        self.parse_rel::<M>()
    }

    fn parse_rel<M: Method>(&mut self) -> Result<TestExpr> {
        let lhs = self.parse_add::<M>()?;
        self.skip_space();
        let op = match self.peek() {
            Some(b'<') => CmpOp::Lt,
            Some(b'=') => CmpOp::Eq,
            Some(b'>') => CmpOp::Gt,
            _ => return Ok(lhs),
        };
        self.bump();
        let rhs = self.parse_add::<M>()?;
        Ok(TestExpr::Cmp(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_add<M: Method>(&mut self) -> Result<TestExpr> {
        let mut acc = self.parse_mul::<M>()?;
        loop {
            self.skip_space();
            let op = match self.peek() {
                Some(b'+') => BinOp::Add,
                Some(b'-') => BinOp::Sub,
                _ => return Ok(acc),
            };
            self.bump();
            let rhs = self.parse_mul::<M>()?;
            acc = TestExpr::Bin(op, Box::new(acc), Box::new(rhs));
        }
    }

    fn parse_mul<M: Method>(&mut self) -> Result<TestExpr> {
        let mut acc = self.parse_un::<M>()?;
        loop {
            self.skip_space();
            let op = match self.peek() {
                Some(b'*') => BinOp::Mul,
                Some(b'%') => BinOp::Mod,
                _ => return Ok(acc),
            };
            self.bump();
            let rhs = self.parse_un::<M>()?;
            acc = TestExpr::Bin(op, Box::new(acc), Box::new(rhs));
        }
    }

    fn parse_un<M: Method>(&mut self) -> Result<TestExpr> {
        self.skip_space();
        match self.peek() {
            Some(b'(') => {
                self.bump();
                let inner = self.parse_or::<M>()?;
                if !self.eat(b')') {
                    return Err(self.error("unterminated group"));
                }
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == b'+' || c == b'-' => {
                Ok(TestExpr::Const(self.number(true)?))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let name = self.ident()?;
                let attr = resolve_attr(M::ATTRS, &name)
                    .ok_or_else(|| self.error(format!("unknown attribute '{name}'")))?;
                Ok(TestExpr::Var(attr))
            }
            _ => Err(self.error("expected a test term")),
        }
    }
}

/// Match a possibly shortened attribute name against the published list.
fn resolve_attr(attrs: &'static [&'static str], name: &str) -> Option<&'static str> {
    if let Some(&exact) = attrs.iter().find(|&&a| a == name) {
        return Some(exact);
    }
    let mut candidates = attrs.iter().filter(|a| a.starts_with(name));
    match (candidates.next(), candidates.next()) {
        (Some(&only), None) => Some(only),
        _ => None,
    }
}

/// Match a possibly shortened, lowercased parameter key against a full name.
pub fn key_matches(given: &str, full: &str) -> bool {
    !given.is_empty() && full.starts_with(given)
}
