use tracing_subscriber::EnvFilter;
use tvlayout::{
    int, make_inverse, tiler_crd_to_layout_tv_crd, Layout, LayoutError, TvLayout, TvSlot,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// 4 threads, each holding one row of a 4x4 tile.
fn column_tv() -> TvLayout {
    let layout: Layout = "((2,2),(2,2)):((1,2),(4,8))".parse().unwrap();
    TvLayout::new(layout).unwrap()
}

// Every thread holds all four values of element `thr_idx`.
fn broadcast_tv() -> TvLayout {
    let layout: Layout = "((2,2),(2,2)):((1,2),(0,0))".parse().unwrap();
    TvLayout::new(layout).unwrap()
}

#[test]
fn test_tv_layout_modes() {
    let tv = column_tv();
    assert_eq!(tv.thr_layout().to_string(), "(2,2):(1,2)");
    assert_eq!(tv.val_layout().to_string(), "(2,2):(4,8)");
    assert_eq!(tv.num_threads(), 4);
    assert_eq!(tv.num_values(), 4);
    assert_eq!(tv.layout().to_string(), "((2,2),(2,2)):((1,2),(4,8))");

    assert_eq!(tv.call(1, 2), 9);
    assert_eq!(tv.call(3, 3), 15);
}

#[test]
fn test_tv_layout_requires_two_modes() {
    let err = TvLayout::new("(2,2,2):(1,2,4)".parse().unwrap()).unwrap_err();
    assert_eq!(err, LayoutError::UnsupportedRank { op: "TV layout", rank: 3 });

    let err = TvLayout::try_from(Layout::compact(8).unwrap()).unwrap_err();
    assert_eq!(err, LayoutError::UnsupportedRank { op: "TV layout", rank: 1 });
}

#[test]
fn test_inverse_of_bijective_layout() {
    init_tracing();
    let inverse = make_inverse(&column_tv(), false).unwrap();

    assert_eq!(inverse.len(), 16);
    assert!(inverse.covers_exactly(16));
    assert!(inverse.unmapped(16).is_empty());
    assert!(!inverse.allows_duplicates());
    assert_eq!(inverse.num_values(), 4);

    let entry = match inverse.slot(9) {
        TvSlot::Unique(entry) => entry,
        other => panic!("expected a unique entry, got {:?}", other),
    };
    assert_eq!(entry.thr_crd, int!(1, 0));
    assert_eq!(entry.val_crd, int!(0, 1));
    assert_eq!(entry.thr_idx, 1);
    assert_eq!(entry.val_idx, 2);

    // every entry maps back to its own index
    let tv = column_tv();
    for (index, entries) in inverse.iter() {
        for e in entries {
            assert_eq!(tv.call(e.thr_idx, e.val_idx), index);
        }
    }
}

#[test]
fn test_inverse_rejects_duplicates() {
    let err = make_inverse(&broadcast_tv(), false).unwrap_err();
    assert_eq!(
        err,
        LayoutError::DuplicateMapping {
            index: 0,
            first: (0, 0),
            second: (0, 1),
        }
    );
    assert_eq!(
        err.to_string(),
        "element 0 is produced by both (thr 0, val 0) and (thr 0, val 1)"
    );
}

#[test]
fn test_inverse_keeps_broadcasts_in_order() {
    init_tracing();
    let inverse = broadcast_tv().make_inverse(true).unwrap();

    assert!(inverse.allows_duplicates());
    assert_eq!(inverse.len(), 4);
    assert_eq!(inverse.duplicated().count(), 4);
    assert!(!inverse.covers_exactly(16));

    let entries = inverse.entries(2);
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e.thr_idx == 2));
    let vals: Vec<i64> = entries.iter().map(|e| e.val_idx).collect();
    assert_eq!(vals, vec![0, 1, 2, 3]);
    assert!(matches!(inverse.slot(2), TvSlot::Broadcast(e) if e.len() == 4));

    assert_eq!(inverse.unmapped(16), (4..16).collect::<Vec<_>>());
    assert_eq!(inverse.slot(7), TvSlot::Unmapped);
    assert!(inverse.entries(7).is_empty());
    assert!(inverse.first(7).is_none());
}

#[test]
fn test_inverse_with_holes() {
    let thr = Layout::new(2, Some(int!(1))).unwrap();
    let val = Layout::new(2, Some(int!(4))).unwrap();
    let inverse = make_inverse(&TvLayout::from_modes(&thr, &val).unwrap(), false).unwrap();

    let produced: Vec<i64> = inverse.iter().map(|(i, _)| i).collect();
    assert_eq!(produced, vec![0, 1, 4, 5]);
    assert_eq!(inverse.unmapped(8), vec![2, 3, 6, 7]);
    assert_eq!(inverse.out_of_tile(4), vec![4, 5]);
    assert!(!inverse.covers_exactly(8));
    assert!(!inverse.is_empty());
}

#[test]
fn test_from_modes_checks_combined_span() {
    let half = Layout::new(2, Some(int!(i64::MAX / 2))).unwrap();
    let thr = tvlayout::make_layout(&[&half, &half]).unwrap();
    assert_eq!(thr.cosize(), i64::MAX);

    let err = TvLayout::from_modes(&thr, &half).unwrap_err();
    assert_eq!(err, LayoutError::Overflow { op: "layout cosize" });

    let tv = TvLayout::from_modes(&half, &half).unwrap();
    assert_eq!(tv.call(1, 1), i64::MAX - 1);
}

#[test]
fn test_tiler_crd_to_layout_tv_crd() {
    let tv = column_tv().layout();
    let (thr, val) = tiler_crd_to_layout_tv_crd((1, 2), (4, 4), tv.shape(), tv.stride()).unwrap();
    assert_eq!(thr, int!(1, 0));
    assert_eq!(val, int!(0, 1));

    let err = tiler_crd_to_layout_tv_crd((0, 0), (4, 4), &int!(4, 4, 4), &int!(1, 4, 16))
        .unwrap_err();
    assert!(matches!(err, LayoutError::UnsupportedRank { rank: 3, .. }));
}

#[test]
fn test_thr_val_of_strided_threads() {
    // 8 threads over a 4x8 tile, each thread owns a strided 2x2 block
    let thr: Layout = "(2,4):(1,8)".parse().unwrap();
    let val: Layout = "(2,2):(2,4)".parse().unwrap();
    let tv = TvLayout::from_modes(&thr, &val).unwrap();

    assert!(tv.make_inverse(false).unwrap().covers_exactly(32));

    let entry = tv.thr_val_of((3, 5), (4, 8)).unwrap();
    assert_eq!(entry.thr_crd, int!(1, 2));
    assert_eq!(entry.val_crd, int!(1, 1));
    assert_eq!(entry.thr_idx, 5);
    assert_eq!(entry.val_idx, 3);
    assert_eq!(tv.call(entry.thr_idx, entry.val_idx), 23);
}

#[test]
fn test_thr_val_of_agrees_with_inverse() {
    let tv = column_tv();
    let inverse = tv.make_inverse(false).unwrap();
    for m in 0..4 {
        for n in 0..4 {
            let entry = tv.thr_val_of((m, n), (4, 4)).unwrap();
            let index = Layout::compact((4, 4)).unwrap().call((m, n)).unwrap();
            assert_eq!(inverse.first(index), Some(&entry), "({m},{n})");
        }
    }
}
