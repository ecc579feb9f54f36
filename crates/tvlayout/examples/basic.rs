use tvlayout::{int, print_2d, Layout, Result};

// Based on quick example in
// https://youtu.be/vzUhbDO_0qk?t=2160

fn main() -> Result<()> {
    // Create a 4x8 matrix layout (column-major by default)
    let layout = Layout::compact(int!(4, 8))?;
    println!("Column-major");
    println!("{}", print_2d(&layout)?);

    // same shape, row-major strides
    let layout = Layout::new(int!(4, 8), Some(int!(8, 1)))?;
    println!("Row-major");
    println!("{}", print_2d(&layout)?);

    let layout = Layout::new(int!(4, 8), Some(int!(1, 5)))?;
    println!("Column-major padded");
    println!("{}", print_2d(&layout)?);

    let layout = Layout::new(int!(4, int!(4, 2)), Some(int!(4, int!(1, 16))))?;
    println!("Column-major interleave");
    println!("{}", print_2d(&layout)?);

    let layout = Layout::new(int!(int!(2, 2), int!(4, 2)), Some(int!(int!(1, 8), int!(2, 16))))?;
    println!("Mixed");
    println!("{}", print_2d(&layout)?);

    // Access some linear indices
    let index = layout.call((1, 2))?; // row 1, column 2
    println!("row 1, column 2 is at linear index: {}", index);
    let index = layout.call((3, 5))?; // row 3, column 5
    println!("row 3, column 5 is at linear index: {}", index);
    Ok(())
}
