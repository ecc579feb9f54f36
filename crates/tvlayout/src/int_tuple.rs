//! IntTuple - recursive integer-or-tuple value used for shapes, strides and coordinates.

use std::fmt::{self, Display};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// A leaf integer or an ordered tuple of IntTuples.
///
/// With the `serde` feature this serializes as plain nested arrays, e.g.
/// `((2,2),(2,2))` becomes `[[2,2],[2,2]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum IntTuple {
    Int(i64),
    Tuple(Vec<IntTuple>),
}

impl IntTuple {
    /// Number of top-level modes. Int has rank 1, tuple has rank = len.
    pub fn rank(&self) -> usize {
        match self {
            IntTuple::Int(_) => 1,
            IntTuple::Tuple(v) => v.len(),
        }
    }

    /// Maximum nesting depth. Int has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            IntTuple::Int(_) => 0,
            IntTuple::Tuple(v) => 1 + v.iter().map(|x| x.depth()).max().unwrap_or(0),
        }
    }

    /// Product of all leaves. An empty tuple has product 1.
    ///
    /// Meant for shapes that already passed [`checked_product`]
    /// (every [`Layout`](crate::Layout) shape has).
    ///
    /// [`checked_product`]: IntTuple::checked_product
    pub fn product(&self) -> i64 {
        match self {
            IntTuple::Int(n) => *n,
            IntTuple::Tuple(v) => v.iter().map(|x| x.product()).product(),
        }
    }

    /// Product of all leaves, `None` if it leaves the `i64` range.
    pub fn checked_product(&self) -> Option<i64> {
        match self {
            IntTuple::Int(n) => Some(*n),
            IntTuple::Tuple(v) => v
                .iter()
                .try_fold(1i64, |acc, x| acc.checked_mul(x.checked_product()?)),
        }
    }

    /// Leaves in left-to-right order.
    pub fn flatten(&self) -> Vec<i64> {
        match self {
            IntTuple::Int(n) => vec![*n],
            IntTuple::Tuple(v) => v.iter().flat_map(|x| x.flatten()).collect(),
        }
    }

    /// Top-level modes. An Int is its own single mode.
    pub fn modes(&self) -> &[IntTuple] {
        match self {
            IntTuple::Int(_) => std::slice::from_ref(self),
            IntTuple::Tuple(v) => v,
        }
    }

    /// Mode `i`, if present.
    pub fn get(&self, i: usize) -> Option<&IntTuple> {
        self.modes().get(i)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, IntTuple::Int(_))
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, IntTuple::Tuple(_))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            IntTuple::Int(n) => Some(*n),
            IntTuple::Tuple(_) => None,
        }
    }

    /// Wrap this IntTuple in a single-element tuple.
    /// Turns `(4,2)` into `((4,2))` for vector layouts.
    pub fn wrap(self) -> IntTuple {
        IntTuple::Tuple(vec![self])
    }

    /// Same nesting structure, leaf for leaf.
    pub fn is_congruent(&self, other: &IntTuple) -> bool {
        match (self, other) {
            (IntTuple::Int(_), IntTuple::Int(_)) => true,
            (IntTuple::Tuple(a), IntTuple::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_congruent(y))
            }
            _ => false,
        }
    }

    /// `self` is congruent with `other` or coarser than it: a leaf of
    /// `self` may stand for a whole subtree of `other`.
    pub fn is_weakly_congruent(&self, other: &IntTuple) -> bool {
        match (self, other) {
            (IntTuple::Int(_), _) => true,
            (IntTuple::Tuple(a), IntTuple::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_weakly_congruent(y))
            }
            (IntTuple::Tuple(_), IntTuple::Int(_)) => false,
        }
    }
}

/// Product of all leaves of `t`.
pub fn product(t: &IntTuple) -> i64 {
    t.product()
}

/// True iff `t` is a tuple rather than a leaf.
pub fn is_tuple(t: &IntTuple) -> bool {
    t.is_tuple()
}

/// Fails with [`LayoutError::Incongruent`] unless `rhs` has exactly the
/// nesting of `lhs`.
pub fn check_congruent(what: &'static str, lhs: &IntTuple, rhs: &IntTuple) -> Result<()> {
    if lhs.is_congruent(rhs) {
        Ok(())
    } else {
        Err(LayoutError::incongruent(what, lhs, rhs))
    }
}

impl Display for IntTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntTuple::Int(n) => write!(f, "{}", n),
            IntTuple::Tuple(v) => {
                write!(f, "(")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", x)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl FromStr for IntTuple {
    type Err = LayoutError;

    /// Parses the `Display` form: `8`, `(2,4)`, `(2,(2,2))`, `()`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser {
            input: s,
            bytes: s.as_bytes(),
            pos: 0,
        };
        let value = parser.parse_value()?;
        parser.skip_ws();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(value)
    }
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> LayoutError {
        LayoutError::Parse {
            input: self.input.to_string(),
            reason: format!("{} at offset {}", reason, self.pos),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn parse_value(&mut self) -> Result<IntTuple> {
        match self.peek() {
            Some(b'(') => self.parse_tuple(),
            Some(b'-' | b'0'..=b'9') => self.parse_int(),
            Some(_) => Err(self.error("expected integer or '('")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_tuple(&mut self) -> Result<IntTuple> {
        self.pos += 1;
        let mut items = Vec::new();
        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(IntTuple::Tuple(items));
        }
        loop {
            items.push(self.parse_value()?);
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(IntTuple::Tuple(items));
                }
                _ => return Err(self.error("expected ',' or ')'")),
            }
        }
    }

    fn parse_int(&mut self) -> Result<IntTuple> {
        let start = self.pos;
        if self.bytes[self.pos] == b'-' {
            self.pos += 1;
        }
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        self.input[start..self.pos]
            .parse::<i64>()
            .map(IntTuple::Int)
            .map_err(|e| self.error(&e.to_string()))
    }
}

// Convenience constructors
impl From<i64> for IntTuple {
    fn from(n: i64) -> Self {
        IntTuple::Int(n)
    }
}

impl From<&IntTuple> for IntTuple {
    fn from(t: &IntTuple) -> Self {
        t.clone()
    }
}

impl<T: Into<IntTuple>, const N: usize> From<[T; N]> for IntTuple {
    fn from(arr: [T; N]) -> Self {
        IntTuple::Tuple(arr.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<IntTuple>> From<Vec<T>> for IntTuple {
    fn from(v: Vec<T>) -> Self {
        IntTuple::Tuple(v.into_iter().map(|x| x.into()).collect())
    }
}

impl<A: Into<IntTuple>, B: Into<IntTuple>> From<(A, B)> for IntTuple {
    fn from((a, b): (A, B)) -> Self {
        IntTuple::Tuple(vec![a.into(), b.into()])
    }
}

/// Construct an IntTuple from values. Use: `int!(2, 3)` or `int!(2, int!(3, 4))`.
#[macro_export]
macro_rules! int {
    ($e:expr) => { $crate::IntTuple::from($e) };
    ($($e:expr),+ $(,)?) => { $crate::IntTuple::Tuple(vec![$( $crate::int!($e) ),+]) };
}
