//! Coordinate mapping and layout simplification.
//!
//! Coordinates are ordered colexicographically: within a tuple the leftmost
//! mode varies fastest. A scalar stride paired with a tuple shape stands for
//! the compact sub-strides `stride * product(shape[..i])`, and a scalar
//! coordinate paired with a tuple shape is a 1-D index split over its modes.

use crate::error::{LayoutError, Result};
use crate::layout::{compact_col_major, make_layout};
use crate::{IntTuple, Layout};

// Coordinate Mapping

/// Map a coordinate to a linear index using shape and stride.
///
/// `crd` may be coarser than `shape`: `16`, `(1,5)` and `(1,(1,2))` are all
/// valid coordinates of `(3,(2,3))`. The last mode of a split scalar absorbs
/// whatever is left, so out-of-range 1-D indices keep extending it. An index
/// outside the `i64` range is [`LayoutError::Overflow`].
pub fn crd2idx(crd: &IntTuple, shape: &IntTuple, stride: &IntTuple) -> Result<i64> {
    match (crd, shape, stride) {
        (IntTuple::Int(c), IntTuple::Int(_), IntTuple::Int(d)) => {
            c.checked_mul(*d).ok_or_else(|| LayoutError::overflow("crd2idx"))
        }

        (IntTuple::Int(c), IntTuple::Tuple(shapes), _) => {
            let strides = mode_strides(shapes, shape, stride)?;
            let mut result = 0i64;
            let mut remaining = *c;
            for (i, (s, d)) in shapes.iter().zip(&strides).enumerate() {
                let part = if i + 1 == shapes.len() {
                    crd2idx(&IntTuple::Int(remaining), s, d)?
                } else {
                    let mode_size = s
                        .checked_product()
                        .ok_or_else(|| LayoutError::overflow("crd2idx"))?;
                    if mode_size <= 0 {
                        return Err(LayoutError::InvalidExtent { extent: mode_size });
                    }
                    let part = crd2idx(&IntTuple::Int(remaining.rem_euclid(mode_size)), s, d)?;
                    remaining = remaining.div_euclid(mode_size);
                    part
                };
                result = checked_add(result, part)?;
            }
            Ok(result)
        }

        (IntTuple::Tuple(crds), IntTuple::Tuple(shapes), _) if crds.len() == shapes.len() => {
            let strides = mode_strides(shapes, shape, stride)?;
            crds.iter()
                .zip(shapes)
                .zip(&strides)
                .try_fold(0i64, |acc, ((c, s), d)| checked_add(acc, crd2idx(c, s, d)?))
        }

        (IntTuple::Int(_), IntTuple::Int(_), IntTuple::Tuple(_)) => {
            Err(LayoutError::incongruent("stride", shape, stride))
        }

        _ => Err(LayoutError::incongruent("coordinate", shape, crd)),
    }
}

/// Map an index or coordinate to the natural coordinate of `shape` using
/// colexicographical ordering.
///
/// `idx2crd(16, (3,(2,3)))`, `idx2crd((1,5), (3,(2,3)))` and
/// `idx2crd((1,(1,2)), (3,(2,3)))` all give `(1,(1,2))`. A leaf shape gives
/// `idx mod shape`.
pub fn idx2crd(input: impl Into<IntTuple>, shape: &IntTuple) -> Result<IntTuple> {
    let stride = compact_col_major(shape)?;
    let idx = crd2idx(&input.into(), shape, &stride)?;
    idx2crd_with_stride(idx, shape, &stride)
}

/// Map an index back to a coordinate with explicit, possibly non-compact,
/// stride: each leaf mode gets `(idx / stride) mod shape`.
///
/// A stride-0 mode does not contribute to the index, so its coordinate is
/// reported as 0.
pub fn idx2crd_with_stride(idx: i64, shape: &IntTuple, stride: &IntTuple) -> Result<IntTuple> {
    match (shape, stride) {
        (IntTuple::Int(s), IntTuple::Int(d)) => {
            if *s <= 0 {
                return Err(LayoutError::InvalidExtent { extent: *s });
            }
            if *d == 0 {
                return Ok(IntTuple::Int(0));
            }
            let quotient = idx
                .checked_div_euclid(*d)
                .ok_or_else(|| LayoutError::overflow("idx2crd"))?;
            Ok(IntTuple::Int(quotient.rem_euclid(*s)))
        }
        (IntTuple::Tuple(shapes), _) => {
            let strides = mode_strides(shapes, shape, stride)?;
            shapes
                .iter()
                .zip(&strides)
                .map(|(s, d)| idx2crd_with_stride(idx, s, d))
                .collect::<Result<Vec<_>>>()
                .map(IntTuple::Tuple)
        }
        (IntTuple::Int(_), IntTuple::Tuple(_)) => {
            Err(LayoutError::incongruent("stride", shape, stride))
        }
    }
}

/// Reinterpret a coordinate of `src_shape` as a coordinate of `dst_shape`
/// through their shared colexicographical 1-D index.
pub fn crd2crd(crd: &IntTuple, src_shape: &IntTuple, dst_shape: &IntTuple) -> Result<IntTuple> {
    let size = |t: &IntTuple| {
        t.checked_product()
            .ok_or_else(|| LayoutError::overflow("crd2crd"))
    };
    let (src, dst) = (size(src_shape)?, size(dst_shape)?);
    if src != dst {
        return Err(LayoutError::SizeMismatch { src, dst });
    }
    let idx = crd2idx(crd, src_shape, &compact_col_major(src_shape)?)?;
    idx2crd(idx, dst_shape)
}

/// Per-mode strides of a tuple shape. A scalar stride expands to the compact
/// sub-strides it stands for.
fn mode_strides(shapes: &[IntTuple], shape: &IntTuple, stride: &IntTuple) -> Result<Vec<IntTuple>> {
    match stride {
        IntTuple::Tuple(strides) if strides.len() == shapes.len() => Ok(strides.clone()),
        IntTuple::Int(d) => {
            let mut strides = Vec::with_capacity(shapes.len());
            let mut current = Some(*d);
            for s in shapes {
                let sub = current.ok_or_else(|| LayoutError::overflow("stride expansion"))?;
                strides.push(IntTuple::Int(sub));
                current = s.checked_product().and_then(|p| sub.checked_mul(p));
            }
            Ok(strides)
        }
        IntTuple::Tuple(_) => Err(LayoutError::incongruent("stride", shape, stride)),
    }
}

fn checked_add(a: i64, b: i64) -> Result<i64> {
    a.checked_add(b)
        .ok_or_else(|| LayoutError::overflow("crd2idx"))
}

// Layout Operations

/// Simplify a layout by merging compatible adjacent modes.
/// Eliminates size-1 modes and merges where shape[i] * stride[i] == stride[i+1].
pub fn coalesce(layout: &Layout) -> Layout {
    let result = coalesce_flat(
        layout
            .shape()
            .flatten()
            .into_iter()
            .zip(layout.stride().flatten()),
    );
    tracing::trace!(input = %layout, output = %result, "coalesce");
    result
}

fn coalesce_flat(modes: impl Iterator<Item = (i64, i64)>) -> Layout {
    let mut result_shapes = vec![1i64];
    let mut result_strides = vec![0i64];

    for (shape, stride) in modes {
        let last = result_shapes.len() - 1;
        if shape == 1 {
            continue;
        } else if result_shapes[last] == 1 {
            result_shapes[last] = shape;
            result_strides[last] = stride;
        } else if result_shapes[last].checked_mul(result_strides[last]) == Some(stride) {
            result_shapes[last] *= shape;
        } else {
            result_shapes.push(shape);
            result_strides.push(stride);
        }
    }

    if result_shapes.len() == 1 {
        return Layout::from_parts(
            IntTuple::Int(result_shapes[0]),
            IntTuple::Int(result_strides[0]),
        );
    }
    Layout::from_parts(
        IntTuple::Tuple(result_shapes.into_iter().map(IntTuple::Int).collect()),
        IntTuple::Tuple(result_strides.into_iter().map(IntTuple::Int).collect()),
    )
}

/// Coalesce by mode using a profile.
/// The profile specifies how to apply coalesce: integers trigger coalesce, tuples recurse.
/// Modes past the end of the profile are kept unchanged.
/// coalesce_by_mode((2,(1,6)):(1,(6,2)), (1,1)) => (2,6):(1,2)
pub fn coalesce_by_mode(layout: &Layout, profile: &IntTuple) -> Result<Layout> {
    match profile {
        IntTuple::Int(_) => Ok(coalesce(layout)),
        IntTuple::Tuple(modes) => by_mode(layout, profile, modes, coalesce_by_mode),
    }
}

/// Drop every mode with shape 1 or stride 0, then coalesce.
/// The result computes the same index for every retained coordinate.
pub fn filter(layout: &Layout) -> Layout {
    coalesce_flat(
        layout
            .shape()
            .flatten()
            .into_iter()
            .zip(layout.stride().flatten())
            .filter(|&(s, d)| s != 1 && d != 0),
    )
}

/// Filter by mode using a profile, with the same profile rules as
/// [`coalesce_by_mode`].
pub fn filter_by_mode(layout: &Layout, profile: &IntTuple) -> Result<Layout> {
    match profile {
        IntTuple::Int(_) => Ok(filter(layout)),
        IntTuple::Tuple(modes) => by_mode(layout, profile, modes, filter_by_mode),
    }
}

/// Keep modes `[0, prefix)` untouched and filter the remaining modes
/// together into a single trailing mode.
///
/// filter_trailing((8,(4,1),(2,3)):(32,(1,0),(4,0)), 1) => (8,8):(32,1)
pub fn filter_trailing(layout: &Layout, prefix: usize) -> Result<Layout> {
    let rank = layout.rank();
    if prefix > rank {
        return Err(LayoutError::ModeOutOfRange { mode: prefix, rank });
    }
    if prefix == rank {
        return Ok(layout.clone());
    }
    let tail = filter(&layout.take(prefix, rank)?);
    tracing::debug!(%layout, prefix, %tail, "filter trailing modes");
    if prefix == 0 {
        return Ok(tail);
    }
    layout.take(0, prefix)?.append(&tail)
}

/// Replace stride-0 modes with size-1 modes.
pub fn filter_zeros(layout: &Layout) -> Layout {
    fn filter_z(shape: &IntTuple, stride: &IntTuple) -> IntTuple {
        match (shape, stride) {
            (IntTuple::Int(_), IntTuple::Int(0)) => IntTuple::Int(1),
            (IntTuple::Tuple(shapes), IntTuple::Tuple(strides)) => IntTuple::Tuple(
                shapes
                    .iter()
                    .zip(strides)
                    .map(|(s, d)| filter_z(s, d))
                    .collect(),
            ),
            _ => shape.clone(),
        }
    }

    Layout::from_parts(
        filter_z(layout.shape(), layout.stride()),
        layout.stride().clone(),
    )
}

fn by_mode(
    layout: &Layout,
    profile: &IntTuple,
    modes: &[IntTuple],
    op: fn(&Layout, &IntTuple) -> Result<Layout>,
) -> Result<Layout> {
    if modes.len() > layout.rank() {
        return Err(LayoutError::incongruent("profile", layout.shape(), profile));
    }
    let mut result = Vec::with_capacity(layout.rank());
    for i in 0..layout.rank() {
        let mode = layout.mode(i)?;
        result.push(match modes.get(i) {
            Some(p) => op(&mode, p)?,
            None => mode,
        });
    }
    make_layout(&result.iter().collect::<Vec<_>>())
}
