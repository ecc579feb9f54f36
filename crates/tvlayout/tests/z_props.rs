use proptest::prelude::*;
use tvlayout::{
    coalesce, compact_col_major, crd2crd, crd2idx, filter, filter_zeros, idx2crd,
    make_inverse, IntTuple, Layout, TvLayout,
};

// Property tests for the layout algebra and the TV mapper.

fn arb_shape(max_leaves: u32) -> impl Strategy<Value = IntTuple> {
    let leaf = (1i64..=3).prop_map(IntTuple::Int);
    leaf.prop_recursive(2, max_leaves, 3, |inner| {
        proptest::collection::vec(inner, 1..=3).prop_map(IntTuple::Tuple)
    })
}

fn arb_stride_like(shape: &IntTuple, max_stride: i64) -> BoxedStrategy<IntTuple> {
    match shape {
        IntTuple::Int(_) => (0..=max_stride).prop_map(IntTuple::Int).boxed(),
        IntTuple::Tuple(modes) => modes
            .iter()
            .map(|m| arb_stride_like(m, max_stride))
            .collect::<Vec<_>>()
            .prop_map(IntTuple::Tuple)
            .boxed(),
    }
}

fn arb_layout(max_leaves: u32, max_stride: i64) -> impl Strategy<Value = Layout> {
    arb_shape(max_leaves)
        .prop_flat_map(move |shape| {
            let stride = arb_stride_like(&shape, max_stride);
            (Just(shape), stride)
        })
        .prop_map(|(shape, stride)| Layout::new(shape, Some(stride)).unwrap())
}

fn image(layout: &Layout) -> Vec<i64> {
    let mut indices: Vec<i64> = layout.indices().collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_idx2crd_round_trips(shape in arb_shape(8)) {
        let stride = compact_col_major(&shape).unwrap();
        for idx in 0..shape.product() {
            let crd = idx2crd(idx, &shape).unwrap();
            prop_assert!(crd.is_congruent(&shape));
            prop_assert_eq!(crd2idx(&crd, &shape, &stride).unwrap(), idx);
        }
    }

    #[test]
    fn test_coalesce_preserves_function(layout in arb_layout(8, 16)) {
        let coalesced = coalesce(&layout);
        prop_assert_eq!(coalesced.size(), layout.size());
        prop_assert!(coalesced.depth() <= 1);
        for i in 0..layout.size() {
            prop_assert_eq!(layout.call_1d(i), coalesced.call_1d(i), "index {}", i);
        }
    }

    #[test]
    fn test_coalesce_preserves_function_through_crd2crd(layout in arb_layout(8, 16)) {
        let coalesced = coalesce(&layout);
        for i in 0..layout.size() {
            let crd = idx2crd(i, layout.shape()).unwrap();
            let crd_c = crd2crd(&crd, layout.shape(), coalesced.shape()).unwrap();
            prop_assert_eq!(layout.call(crd).unwrap(), coalesced.call(crd_c).unwrap());
        }
    }

    #[test]
    fn test_coalesce_is_idempotent(layout in arb_layout(8, 16)) {
        let once = coalesce(&layout);
        prop_assert_eq!(coalesce(&once), once);
    }

    #[test]
    fn test_filter_preserves_image(layout in arb_layout(8, 16)) {
        let filtered = filter(&layout);
        prop_assert_eq!(image(&filtered), image(&layout));
        prop_assert!(filtered.size() <= layout.size());

        let zeros = filter_zeros(&layout);
        prop_assert!(zeros.shape().is_congruent(layout.shape()));
        prop_assert_eq!(image(&zeros), image(&layout));
    }

    #[test]
    fn test_compact_tv_layout_is_bijective(
        thr in arb_shape(4),
        val in arb_shape(4),
    ) {
        let layout = Layout::compact(IntTuple::from((thr, val))).unwrap();
        let size = layout.size();
        let tv = TvLayout::new(layout).unwrap();
        let inverse = make_inverse(&tv, false).unwrap();
        prop_assert!(inverse.covers_exactly(size));

        let tile = (tv.num_threads(), tv.num_values());
        for m in 0..tile.0 {
            for n in 0..tile.1 {
                let entry = tv.thr_val_of((m, n), tile).unwrap();
                prop_assert_eq!((entry.thr_idx, entry.val_idx), (m, n));
                prop_assert_eq!(inverse.first(m + tile.0 * n), Some(&entry));
            }
        }
    }

    #[test]
    fn test_inverse_keeps_every_pair(
        thr in arb_layout(4, 4),
        val in arb_layout(4, 4),
    ) {
        let tv = TvLayout::from_modes(&thr, &val).unwrap();
        let inverse = make_inverse(&tv, true).unwrap();

        let total: usize = inverse.iter().map(|(_, e)| e.len()).sum();
        prop_assert_eq!(total as i64, tv.num_threads() * tv.num_values());
        for (index, entries) in inverse.iter() {
            for e in entries {
                prop_assert_eq!(tv.call(e.thr_idx, e.val_idx), index);
            }
        }
    }
}
