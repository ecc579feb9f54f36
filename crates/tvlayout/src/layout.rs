//! Layout - a (shape, stride) pair mapping coordinates to indices.

use std::fmt::{self, Display};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::algebra::crd2idx;
use crate::error::{LayoutError, Result};
use crate::IntTuple;

/// A congruent (shape, stride) pair.
///
/// The stride is always stored with exactly the nesting of the shape: a
/// scalar stride given for a compound shape is expanded at construction
/// (sub-mode `i` gets `stride * product(shape[..i])`). Every shape leaf is
/// positive, and the size and every index of the domain fit in `i64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "LayoutParts", into = "LayoutParts"))]
pub struct Layout {
    shape: IntTuple,
    stride: IntTuple,
}

impl Layout {
    /// Create a new layout. If stride is None, uses compact column-major.
    pub fn new(shape: impl Into<IntTuple>, stride: Option<IntTuple>) -> Result<Self> {
        let shape = shape.into();
        check_extents(&shape)?;
        let stride = match stride {
            None => compact_col_major(&shape)?,
            Some(stride) => {
                if !stride.is_weakly_congruent(&shape) {
                    return Err(LayoutError::incongruent("stride", &shape, &stride));
                }
                expand_stride(&shape, &stride)?
            }
        };
        Layout { shape, stride }.checked()
    }

    /// The compact column-major layout of `shape`, e.g. the layout of a
    /// `(M, N)` tile.
    pub fn compact(shape: impl Into<IntTuple>) -> Result<Self> {
        Layout::new(shape, None)
    }

    /// Build from parts that are already known to be valid.
    pub(crate) fn from_parts(shape: IntTuple, stride: IntTuple) -> Self {
        debug_assert!(shape.is_congruent(&stride));
        Layout { shape, stride }
    }

    /// Reject layouts whose size or index span leaves the `i64` range.
    /// Past this check `size`, `cosize` and `call_1d` on `[0, size)` cannot
    /// overflow.
    fn checked(self) -> Result<Self> {
        self.shape
            .checked_product()
            .ok_or_else(|| LayoutError::overflow("layout size"))?;
        self.shape
            .flatten()
            .into_iter()
            .zip(self.stride.flatten())
            .try_fold(1i64, |span, (s, d)| {
                (s - 1).checked_mul(d.checked_abs()?)?.checked_add(span)
            })
            .ok_or_else(|| LayoutError::overflow("layout cosize"))?;
        Ok(self)
    }

    pub fn shape(&self) -> &IntTuple {
        &self.shape
    }

    pub fn stride(&self) -> &IntTuple {
        &self.stride
    }

    /// Split into `(shape, stride)`.
    pub fn into_parts(self) -> (IntTuple, IntTuple) {
        (self.shape, self.stride)
    }

    /// Map a coordinate to a linear index. The coordinate may be coarser
    /// than the shape; scalar parts are decomposed colexicographically.
    pub fn call(&self, coord: impl Into<IntTuple>) -> Result<i64> {
        crd2idx(&coord.into(), &self.shape, &self.stride)
    }

    /// Map a 1D index (using colexicographical order) to a linear index.
    ///
    /// `idx` is expected in `[0, size())`. Past that the last mode keeps
    /// extending; use [`Layout::call`] for a checked result there.
    pub fn call_1d(&self, idx: i64) -> i64 {
        linear_index(idx, &self.shape, &self.stride)
    }

    /// `call_1d` over every index of the domain, in order.
    pub fn indices(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.size()).map(move |i| self.call_1d(i))
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn depth(&self) -> usize {
        self.shape.depth()
    }

    pub fn size(&self) -> i64 {
        self.shape.product()
    }

    /// Maximum index + 1 (the range of the layout function).
    pub fn cosize(&self) -> i64 {
        self.shape
            .flatten()
            .into_iter()
            .zip(self.stride.flatten())
            .map(|(s, d)| ((s - 1) * d).max(0))
            .sum::<i64>()
            + 1
    }

    /// Get sublayout for mode i.
    pub fn mode(&self, i: usize) -> Result<Layout> {
        match (self.shape.get(i), self.stride.get(i)) {
            (Some(shape), Some(stride)) => Ok(Layout::from_parts(shape.clone(), stride.clone())),
            _ => Err(LayoutError::ModeOutOfRange {
                mode: i,
                rank: self.rank(),
            }),
        }
    }

    /// Select specific modes by index.
    /// select(&[1, 3]) on (2,3,5,7):(1,2,6,30) returns (3,7):(2,30).
    pub fn select(&self, indices: &[usize]) -> Result<Layout> {
        let modes = indices
            .iter()
            .map(|&i| self.mode(i))
            .collect::<Result<Vec<_>>>()?;
        make_layout(&modes.iter().collect::<Vec<_>>())
    }

    /// Take a range of modes [begin, end).
    /// take(1, 3) on (2,3,5,7):(1,2,6,30) returns (3,5):(2,6).
    pub fn take(&self, begin: usize, end: usize) -> Result<Layout> {
        let indices: Vec<usize> = (begin..end).collect();
        self.select(&indices)
    }

    /// Append another layout as a new mode.
    /// append(3:1, 4:3) => (3,4):(1,3)
    pub fn append(&self, other: &Layout) -> Result<Layout> {
        let mut shapes = self.shape.modes().to_vec();
        let mut strides = self.stride.modes().to_vec();
        shapes.push(other.shape.clone());
        strides.push(other.stride.clone());
        Layout::from_parts(IntTuple::Tuple(shapes), IntTuple::Tuple(strides)).checked()
    }

    /// Group modes [begin, end) into a nested tuple.
    /// group(0, 2) on (2,3,5,7):(1,2,6,30) => ((2,3),5,7):((1,2),6,30)
    pub fn group(&self, begin: usize, end: usize) -> Result<Layout> {
        let rank = self.rank();
        if begin > end || end > rank {
            return Err(LayoutError::ModeOutOfRange { mode: end, rank });
        }
        let regroup = |t: &IntTuple| {
            let modes = t.modes();
            let mut out = modes[..begin].to_vec();
            out.push(IntTuple::Tuple(modes[begin..end].to_vec()));
            out.extend_from_slice(&modes[end..]);
            IntTuple::Tuple(out)
        };
        Ok(Layout::from_parts(
            regroup(&self.shape),
            regroup(&self.stride),
        ))
    }

    /// Flatten all nested tuples into a single-level layout.
    /// flatten on ((2,3),5,7):((1,2),6,30) => (2,3,5,7):(1,2,6,30)
    pub fn flatten(&self) -> Layout {
        if self.shape.is_int() {
            return self.clone();
        }
        let leaves = |t: &IntTuple| IntTuple::Tuple(t.flatten().into_iter().map(IntTuple::Int).collect());
        Layout::from_parts(leaves(&self.shape), leaves(&self.stride))
    }
}

/// Concatenate layouts into a new layout.
/// make_layout(a, b) => (a.shape, b.shape):(a.stride, b.stride)
///
/// Fails with [`LayoutError::Overflow`] if the combined size or index span
/// does not fit in `i64`.
pub fn make_layout(layouts: &[&Layout]) -> Result<Layout> {
    let shapes: Vec<IntTuple> = layouts.iter().map(|l| l.shape.clone()).collect();
    let strides: Vec<IntTuple> = layouts.iter().map(|l| l.stride.clone()).collect();
    Layout::from_parts(IntTuple::Tuple(shapes), IntTuple::Tuple(strides)).checked()
}

impl Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.shape, self.stride)
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    /// Parses `shape:stride`, or a bare `shape` for the compact layout.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((shape, stride)) => Layout::new(shape.parse::<IntTuple>()?, Some(stride.parse()?)),
            None => Layout::compact(s.parse::<IntTuple>()?),
        }
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct LayoutParts {
    shape: IntTuple,
    #[serde(default)]
    stride: Option<IntTuple>,
}

#[cfg(feature = "serde")]
impl TryFrom<LayoutParts> for Layout {
    type Error = LayoutError;

    fn try_from(parts: LayoutParts) -> Result<Self> {
        Layout::new(parts.shape, parts.stride)
    }
}

#[cfg(feature = "serde")]
impl From<Layout> for LayoutParts {
    fn from(layout: Layout) -> Self {
        LayoutParts {
            shape: layout.shape,
            stride: Some(layout.stride),
        }
    }
}

fn check_extents(shape: &IntTuple) -> Result<()> {
    match shape.flatten().into_iter().find(|&s| s <= 0) {
        Some(extent) => Err(LayoutError::InvalidExtent { extent }),
        None => Ok(()),
    }
}

/// Expand a weakly congruent stride to the exact nesting of `shape`.
fn expand_stride(shape: &IntTuple, stride: &IntTuple) -> Result<IntTuple> {
    match (shape, stride) {
        (_, IntTuple::Int(d)) => compact_col_major_from(shape, *d),
        (IntTuple::Tuple(shapes), IntTuple::Tuple(strides)) if shapes.len() == strides.len() => {
            shapes
                .iter()
                .zip(strides)
                .map(|(s, d)| expand_stride(s, d))
                .collect::<Result<Vec<_>>>()
                .map(IntTuple::Tuple)
        }
        _ => Err(LayoutError::incongruent("stride", shape, stride)),
    }
}

fn linear_index(idx: i64, shape: &IntTuple, stride: &IntTuple) -> i64 {
    match (shape, stride) {
        (_, IntTuple::Int(d)) => idx * d,
        (IntTuple::Tuple(shapes), IntTuple::Tuple(strides)) => {
            let mut result = 0i64;
            let mut remaining = idx;
            let last = shapes.len().saturating_sub(1);
            for (i, (s, d)) in shapes.iter().zip(strides).enumerate() {
                if i == last {
                    result += linear_index(remaining, s, d);
                    break;
                }
                let mode_size = s.product();
                result += linear_index(remaining.rem_euclid(mode_size), s, d);
                remaining = remaining.div_euclid(mode_size);
            }
            result
        }
        (IntTuple::Int(_), IntTuple::Tuple(_)) => {
            unreachable!("layout stride is congruent with its shape")
        }
    }
}

// Stride Generation

/// Generate compact column-major (colexicographical) strides.
/// First mode has stride 1, subsequent modes have stride = prev * prev_shape.
pub fn compact_col_major(shape: &IntTuple) -> Result<IntTuple> {
    compact_col_major_from(shape, 1)
}

/// Compact column-major strides scaled by `base`.
pub fn compact_col_major_from(shape: &IntTuple, base: i64) -> Result<IntTuple> {
    match shape {
        IntTuple::Int(_) => Ok(IntTuple::Int(base)),
        IntTuple::Tuple(shapes) => {
            let mut strides = Vec::with_capacity(shapes.len());
            // None once the running stride has overflowed; only an error if
            // a later mode needs it.
            let mut stride = Some(base);
            for s in shapes {
                let current = stride.ok_or_else(|| LayoutError::overflow("compact stride"))?;
                strides.push(compact_col_major_from(s, current)?);
                stride = s.checked_product().and_then(|p| current.checked_mul(p));
            }
            Ok(IntTuple::Tuple(strides))
        }
    }
}

/// Generate compact row-major strides.
/// Last mode has stride 1, earlier modes have stride = later * later_shape.
pub fn compact_row_major(shape: &IntTuple) -> Result<IntTuple> {
    let flat = shape.flatten();
    let mut strides = vec![0i64; flat.len()];
    let mut stride = Some(1i64);
    for (i, s) in flat.iter().enumerate().rev() {
        let current = stride.ok_or_else(|| LayoutError::overflow("compact stride"))?;
        strides[i] = current;
        stride = current.checked_mul(*s);
    }
    let mut next = strides.into_iter();
    Ok(reshape_like(shape, &mut next))
}

fn reshape_like(shape: &IntTuple, flat: &mut impl Iterator<Item = i64>) -> IntTuple {
    match shape {
        IntTuple::Int(_) => IntTuple::Int(flat.next().unwrap_or(0)),
        IntTuple::Tuple(shapes) => {
            IntTuple::Tuple(shapes.iter().map(|s| reshape_like(s, flat)).collect())
        }
    }
}
