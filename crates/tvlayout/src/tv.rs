//! Thread-value (TV) layouts and their inversion.
//!
//! A TV layout is a rank-2 layout `(thr, val)` mapping a thread index and a
//! value index to an element of a tile. Inverting it answers "which
//! threads and values touch element `i`?", which is what copy and MMA
//! partitioning code needs to check and visualize.

use std::collections::BTreeMap;

use crate::algebra::{crd2idx, idx2crd, idx2crd_with_stride};
use crate::error::{LayoutError, Result};
use crate::layout::{compact_col_major, make_layout};
use crate::{IntTuple, Layout};

/// A validated `(thr, val)` layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvLayout {
    thr: Layout,
    val: Layout,
}

impl TvLayout {
    /// Wrap a layout with exactly two top-level modes.
    pub fn new(layout: Layout) -> Result<Self> {
        if layout.rank() != 2 {
            return Err(LayoutError::UnsupportedRank {
                op: "TV layout",
                rank: layout.rank(),
            });
        }
        Ok(TvLayout {
            thr: layout.mode(0)?,
            val: layout.mode(1)?,
        })
    }

    /// Pair a thread layout with a value layout. Fails with
    /// [`LayoutError::Overflow`] if their combined index span does not fit
    /// in `i64`.
    pub fn from_modes(thr: &Layout, val: &Layout) -> Result<Self> {
        TvLayout::new(make_layout(&[thr, val])?)
    }

    /// The combined `(thr, val)` layout.
    pub fn layout(&self) -> Layout {
        Layout::from_parts(
            IntTuple::Tuple(vec![self.thr.shape().clone(), self.val.shape().clone()]),
            IntTuple::Tuple(vec![self.thr.stride().clone(), self.val.stride().clone()]),
        )
    }

    pub fn thr_layout(&self) -> &Layout {
        &self.thr
    }

    pub fn val_layout(&self) -> &Layout {
        &self.val
    }

    pub fn num_threads(&self) -> i64 {
        self.thr.size()
    }

    pub fn num_values(&self) -> i64 {
        self.val.size()
    }

    /// Element index produced by `(thr_idx, val_idx)`, for indices inside
    /// `num_threads() x num_values()`.
    pub fn call(&self, thr_idx: i64, val_idx: i64) -> i64 {
        self.thr.call_1d(thr_idx) + self.val.call_1d(val_idx)
    }

    /// See [`make_inverse`].
    pub fn make_inverse(&self, allow_duplicates: bool) -> Result<TvInverse> {
        make_inverse(self, allow_duplicates)
    }

    /// Which thread and value touch tile position `tiler_crd` of a
    /// `tiler_mn` tile.
    pub fn thr_val_of(&self, tiler_crd: (i64, i64), tiler_mn: (i64, i64)) -> Result<TvEntry> {
        let layout = self.layout();
        let (thr_crd, val_crd) =
            tiler_crd_to_layout_tv_crd(tiler_crd, tiler_mn, layout.shape(), layout.stride())?;
        let thr_idx = crd2idx(&thr_crd, self.thr.shape(), &compact_col_major(self.thr.shape())?)?;
        let val_idx = crd2idx(&val_crd, self.val.shape(), &compact_col_major(self.val.shape())?)?;
        Ok(TvEntry {
            thr_crd,
            val_crd,
            thr_idx,
            val_idx,
        })
    }
}

impl TryFrom<Layout> for TvLayout {
    type Error = LayoutError;

    fn try_from(layout: Layout) -> Result<Self> {
        TvLayout::new(layout)
    }
}

/// One `(thread, value)` pair that produces an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvEntry {
    pub thr_crd: IntTuple,
    pub val_crd: IntTuple,
    pub thr_idx: i64,
    pub val_idx: i64,
}

/// What an element index maps back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TvSlot<'a> {
    /// No (thread, value) pair produces this index.
    Unmapped,
    /// Exactly one pair produces it.
    Unique(&'a TvEntry),
    /// Several pairs produce it (a broadcast), in enumeration order.
    Broadcast(&'a [TvEntry]),
}

/// Element index -> producing (thread, value) pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvInverse {
    entries: BTreeMap<i64, Vec<TvEntry>>,
    allow_duplicates: bool,
    num_values: i64,
}

impl TvInverse {
    /// Entries producing `index`. Empty for an unmapped index.
    pub fn entries(&self, index: i64) -> &[TvEntry] {
        self.entries.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn slot(&self, index: i64) -> TvSlot<'_> {
        match self.entries(index) {
            [] => TvSlot::Unmapped,
            [entry] => TvSlot::Unique(entry),
            many => TvSlot::Broadcast(many),
        }
    }

    /// The first (thread, value) pair producing `index`, if any.
    pub fn first(&self, index: i64) -> Option<&TvEntry> {
        self.entries(index).first()
    }

    /// Number of distinct element indices produced.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produced indices in ascending order with their entries.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &[TvEntry])> {
        self.entries.iter().map(|(&i, e)| (i, e.as_slice()))
    }

    /// Indices produced by more than one pair.
    pub fn duplicated(&self) -> impl Iterator<Item = (i64, &[TvEntry])> {
        self.iter().filter(|(_, e)| e.len() > 1)
    }

    /// Indices of `[0, tile_size)` that nothing produces.
    pub fn unmapped(&self, tile_size: i64) -> Vec<i64> {
        (0..tile_size)
            .filter(|i| !self.entries.contains_key(i))
            .collect()
    }

    /// Produced indices that fall outside `[0, tile_size)`.
    pub fn out_of_tile(&self, tile_size: i64) -> Vec<i64> {
        self.entries
            .keys()
            .copied()
            .filter(|&i| i < 0 || i >= tile_size)
            .collect()
    }

    /// True when every index of `[0, tile_size)` is produced exactly once
    /// and nothing else is produced.
    pub fn covers_exactly(&self, tile_size: i64) -> bool {
        self.entries.len() as i64 == tile_size
            && self.out_of_tile(tile_size).is_empty()
            && self.duplicated().next().is_none()
    }

    pub fn allows_duplicates(&self) -> bool {
        self.allow_duplicates
    }

    /// Size of the value mode of the inverted layout.
    pub fn num_values(&self) -> i64 {
        self.num_values
    }
}

/// Invert a TV layout by enumerating every `(thr_idx, val_idx)` pair.
///
/// Threads are enumerated in the outer loop and values in the inner loop,
/// so broadcast entries are recorded in `(thr_idx, val_idx)` order. With
/// `allow_duplicates == false` a second pair reaching the same element is
/// a [`LayoutError::DuplicateMapping`].
pub fn make_inverse(layout_tv: &TvLayout, allow_duplicates: bool) -> Result<TvInverse> {
    let num_threads = layout_tv.num_threads();
    let num_values = layout_tv.num_values();
    let val_crds = (0..num_values)
        .map(|v| idx2crd(v, layout_tv.val.shape()))
        .collect::<Result<Vec<_>>>()?;

    let mut entries: BTreeMap<i64, Vec<TvEntry>> = BTreeMap::new();
    let mut broadcasts = 0usize;
    for thr_idx in 0..num_threads {
        let thr_crd = idx2crd(thr_idx, layout_tv.thr.shape())?;
        for (val_idx, val_crd) in (0..num_values).zip(&val_crds) {
            let index = layout_tv.call(thr_idx, val_idx);
            let slot = entries.entry(index).or_default();
            if let Some(prev) = slot.first() {
                if !allow_duplicates {
                    return Err(LayoutError::DuplicateMapping {
                        index,
                        first: (prev.thr_idx, prev.val_idx),
                        second: (thr_idx, val_idx),
                    });
                }
                broadcasts += 1;
            }
            slot.push(TvEntry {
                thr_crd: thr_crd.clone(),
                val_crd: val_crd.clone(),
                thr_idx,
                val_idx,
            });
        }
    }

    tracing::debug!(
        layout = %layout_tv.layout(),
        num_threads,
        num_values,
        distinct = entries.len(),
        broadcasts,
        "inverted TV layout"
    );

    Ok(TvInverse {
        entries,
        allow_duplicates,
        num_values,
    })
}

/// Convert a position of a `tiler_mn` tile into the `(thr, val)`
/// coordinate of the TV layout `layout_tv_shape:layout_tv_stride` that
/// touches it.
///
/// The tile coordinate is linearized with the compact tile layout and then
/// split with the TV layout's own, generally non-compact, stride.
pub fn tiler_crd_to_layout_tv_crd(
    tiler_crd: (i64, i64),
    tiler_mn: (i64, i64),
    layout_tv_shape: &IntTuple,
    layout_tv_stride: &IntTuple,
) -> Result<(IntTuple, IntTuple)> {
    for t in [layout_tv_shape, layout_tv_stride] {
        if t.rank() != 2 {
            return Err(LayoutError::UnsupportedRank {
                op: "tiler_crd_to_layout_tv_crd",
                rank: t.rank(),
            });
        }
    }
    let tile = IntTuple::from(tiler_mn);
    let tiler_idx = crd2idx(&IntTuple::from(tiler_crd), &tile, &compact_col_major(&tile)?)?;
    let crd = idx2crd_with_stride(tiler_idx, layout_tv_shape, layout_tv_stride)?;
    let modes = crd.modes();
    Ok((modes[0].clone(), modes[1].clone()))
}
