use tracing_subscriber::EnvFilter;
use tvlayout::{latex_tv, print_tv, Layout, Result, TvLayout, TvStyle};

// An 8x32 tile copied by 32 threads. Thread (i,j) owns row j and every
// fourth column starting at column i. Run with RUST_LOG=tvlayout=debug to
// see the inversion summary, and pass `--latex` for a TikZ document.

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let thr: Layout = "(4,8):(8,1)".parse()?;
    let val: Layout = "(8):(32)".parse()?;
    let tv = TvLayout::from_modes(&thr, &val)?;
    let tiler_mn = (8, 32);

    let inverse = tv.make_inverse(false)?;
    let tile_size = tiler_mn.0 * tiler_mn.1;
    if !inverse.covers_exactly(tile_size) {
        eprintln!(
            "{} does not cover the tile: unmapped {:?}, outside {:?}",
            tv.layout(),
            inverse.unmapped(tile_size),
            inverse.out_of_tile(tile_size)
        );
    }

    let style = TvStyle::new().with_alpha(true).with_index(true);
    if std::env::args().any(|a| a == "--latex") {
        print!("{}", latex_tv(tiler_mn, &inverse, &style)?);
    } else {
        println!("{}", tv.layout());
        println!("{}", print_tv(tiler_mn, &inverse, &style)?);
        let entry = tv.thr_val_of((5, 17), tiler_mn)?;
        println!(
            "element (5,17) is thread {} value {}",
            entry.thr_idx, entry.val_idx
        );
    }
    Ok(())
}
