//! Hierarchical layout algebra in the style of NVIDIA CuTe, plus thread-value
//! (TV) layout inversion.
//!
//! A [`Layout`] is a congruent pair of nested integer tuples (shape, stride)
//! mapping coordinates to linear indices. [`TvLayout`] treats a rank-2
//! layout as `(thread, value) -> element` and [`make_inverse`] turns it back
//! into `element -> [(thread, value)]`, tolerating broadcasts and holes.
//!
//! ```
//! use tvlayout::{crd2idx, idx2crd_with_stride, int, make_inverse, Layout, TvLayout};
//!
//! assert_eq!(crd2idx(&int!(1, 2), &int!(4, 4), &int!(1, 4)).unwrap(), 9);
//! assert_eq!(idx2crd_with_stride(9, &int!(4, 4), &int!(1, 4)).unwrap(), int!(1, 2));
//!
//! let layout: Layout = "((2,2),(2,2)):((1,2),(4,8))".parse().unwrap();
//! let inverse = make_inverse(&TvLayout::new(layout).unwrap(), false).unwrap();
//! assert!(inverse.covers_exactly(16));
//! ```
//!
//! Based on: https://github.com/NVIDIA/cutlass

pub mod algebra;
pub mod error;
pub mod int_tuple;
pub mod layout;
pub mod render;
pub mod tv;

pub use algebra::{
    coalesce, coalesce_by_mode, crd2crd, crd2idx, filter, filter_by_mode, filter_trailing,
    filter_zeros, idx2crd, idx2crd_with_stride,
};
pub use error::{LayoutError, Result};
pub use int_tuple::{check_congruent, is_tuple, product, IntTuple};
pub use layout::{compact_col_major, compact_col_major_from, compact_row_major, make_layout, Layout};
pub use render::{latex_tv, print_1d, print_2d, print_tv, render_grid, Rgba, TvStyle, SET2};
pub use tv::{make_inverse, tiler_crd_to_layout_tv_crd, TvEntry, TvInverse, TvLayout, TvSlot};
