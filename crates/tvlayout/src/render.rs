//! Text and TikZ rendering of layouts and TV tiles.
//!
//! Nothing here draws. The functions produce strings, plus the per-cell
//! color and label that a plotting front end needs.

use crate::error::{LayoutError, Result};
use crate::tv::TvInverse;
use crate::Layout;

/// An sRGB color with opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `[0, 1]`.
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Rgba { a, ..self }
    }
}

/// The eight-color qualitative "Set2" palette, indexed by thread.
pub const SET2: [Rgba; 8] = [
    Rgba::rgb(102, 194, 165),
    Rgba::rgb(252, 141, 98),
    Rgba::rgb(141, 160, 203),
    Rgba::rgb(231, 138, 195),
    Rgba::rgb(166, 216, 84),
    Rgba::rgb(255, 217, 47),
    Rgba::rgb(229, 196, 148),
    Rgba::rgb(179, 179, 179),
];

/// How TV tiles are colored and labelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TvStyle {
    /// Fade later values of a thread (alpha `(V - v) / V`).
    pub use_alpha: bool,
    /// Label with flat thread/value indices instead of coordinates.
    pub use_index: bool,
}

impl TvStyle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_alpha(mut self, enable: bool) -> Self {
        self.use_alpha = enable;
        self
    }

    #[must_use]
    pub fn with_index(mut self, enable: bool) -> Self {
        self.use_index = enable;
        self
    }
}

impl TvInverse {
    /// Cell color of `index`, decided by its first entry. `None` if unmapped.
    pub fn color(&self, index: i64, style: &TvStyle) -> Option<Rgba> {
        let entry = self.first(index)?;
        let rgb = SET2[entry.thr_idx.rem_euclid(SET2.len() as i64) as usize];
        if !style.use_alpha {
            return Some(rgb);
        }
        let vals = self.num_values() as f64;
        Some(rgb.with_alpha((vals - entry.val_idx as f64) / vals))
    }

    /// Two-line cell label, `"T: ..\nV: .."`, with broadcast entries joined
    /// by `" | "`. Empty if unmapped.
    pub fn label(&self, index: i64, style: &TvStyle) -> String {
        let entries = self.entries(index);
        if entries.is_empty() {
            return String::new();
        }
        let (thr, val): (Vec<String>, Vec<String>) = entries
            .iter()
            .map(|e| {
                if style.use_index {
                    (e.thr_idx.to_string(), e.val_idx.to_string())
                } else {
                    (e.thr_crd.to_string(), e.val_crd.to_string())
                }
            })
            .unzip();
        format!("T: {}\nV: {}", thr.join(" | "), val.join(" | "))
    }

    /// Single-line cell label, `T0V1` style, broadcast entries joined by `|`.
    pub fn short_label(&self, index: i64, style: &TvStyle) -> String {
        self.entries(index)
            .iter()
            .map(|e| {
                if style.use_index {
                    format!("T{}V{}", e.thr_idx, e.val_idx)
                } else {
                    format!("T{}V{}", e.thr_crd, e.val_crd)
                }
            })
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Render a rank-1 or rank-2 layout as an ASCII table whose cells are
/// `label_map(index)`. `label_map` only sees indices the layout produces.
pub fn render_grid(layout: &Layout, label_map: impl FnMut(i64) -> String) -> Result<String> {
    let (rows, cols) = grid_extent(layout, "render_grid")?;
    grid(layout, rows, cols, label_map)
}

/// Create an ASCII table visualization of a 2D layout (at most 16x16 cells).
pub fn print_2d(layout: &Layout) -> Result<String> {
    let (rows, cols) = grid_extent(layout, "print_2d")?;
    let table = grid(layout, rows.min(16), cols.min(16), |i| i.to_string())?;
    Ok(format!("{}\n{}", layout, table))
}

/// Print a 1D layout as a sequence of indices.
pub fn print_1d(layout: &Layout) -> String {
    let total = layout.size();
    let shown = if total > 64 { 16 } else { total };
    let indices = layout
        .indices()
        .take(shown as usize)
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    if total > 64 {
        format!("{}\n[{}, ... ] (size={})", layout, indices, total)
    } else {
        format!("{}\n[{}]", layout, indices)
    }
}

/// ASCII table of a `tiler_mn` tile labelled with the TV entries of each
/// element. Unmapped elements are left blank.
pub fn print_tv(tiler_mn: (i64, i64), inverse: &TvInverse, style: &TvStyle) -> Result<String> {
    let tile = Layout::compact(tiler_mn)?;
    render_grid(&tile, |i| inverse.short_label(i, style))
}

/// Standalone TikZ document of a `tiler_mn` tile colored by thread, in
/// the form of CuTe's `print_latex`.
pub fn latex_tv(tiler_mn: (i64, i64), inverse: &TvInverse, style: &TvStyle) -> Result<String> {
    let tile = Layout::compact(tiler_mn)?;
    let (rows, cols) = tiler_mn;
    let mut out = String::new();

    out.push_str("\\documentclass[convert]{standalone}\n");
    out.push_str("\\usepackage{tikz}\n\n");
    out.push_str("\\begin{document}\n");
    out.push_str(
        "\\begin{tikzpicture}[x={(0cm,-1cm)},y={(1cm,0cm)},\
         every node/.style={minimum size=1cm, outer sep=0pt, align=center}]\n\n",
    );

    for m in 0..rows {
        for n in 0..cols {
            let index = tile.call((m, n))?;
            let text = inverse.label(index, style).replace('\n', "\\\\");
            out.push_str(&match inverse.color(index, style) {
                Some(c) => format!(
                    "\\node[fill={{rgb,255:red,{};green,{};blue,{}}},fill opacity={:.3},text opacity=1] at ({},{}) {{{}}};\n",
                    c.r, c.g, c.b, c.a, m, n, text
                ),
                None => format!("\\node at ({},{}) {{}};\n", m, n),
            });
        }
    }

    out.push_str(&format!(
        "\\draw[color=black,thick,shift={{(-0.5,-0.5)}}] (0,0) grid ({},{});\n\n",
        rows, cols
    ));
    for m in 0..rows {
        out.push_str(&format!("\\node at ({},-1) {{\\Large{{\\texttt{{{}}}}}}};\n", m, m));
    }
    for n in 0..cols {
        out.push_str(&format!("\\node at (-1,{}) {{\\Large{{\\texttt{{{}}}}}}};\n", n, n));
    }
    out.push_str("\\end{tikzpicture}\n");
    out.push_str("\\end{document}\n");
    Ok(out)
}

fn grid_extent(layout: &Layout, op: &'static str) -> Result<(i64, i64)> {
    match layout.rank() {
        1 => Ok((1, layout.size())),
        2 => Ok((
            layout.shape().modes()[0].product(),
            layout.shape().modes()[1].product(),
        )),
        rank => Err(LayoutError::UnsupportedRank { op, rank }),
    }
}

fn grid(
    layout: &Layout,
    rows: i64,
    cols: i64,
    mut label_map: impl FnMut(i64) -> String,
) -> Result<String> {
    let mut labels = Vec::with_capacity(rows as usize);
    for m in 0..rows {
        let mut row = Vec::with_capacity(cols as usize);
        for n in 0..cols {
            let idx = if layout.rank() == 1 {
                layout.call_1d(n)
            } else {
                layout.call((m, n))?
            };
            row.push(label_map(idx));
        }
        labels.push(row);
    }

    let width = labels
        .iter()
        .flatten()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut lines = Vec::with_capacity(2 * labels.len() + 2);

    // Column headers: "      0   1   2   3"
    let mut header = "   ".to_string();
    for n in 0..cols {
        header.push_str(&format!("{:>w$}", n, w = width + 3));
    }
    lines.push(header);

    // Separator: "    +---+---+---+---+"
    let sep = "    +".to_string()
        + &(0..cols)
            .map(|_| format!("{}+", "-".repeat(width + 2)))
            .collect::<String>();
    lines.push(sep.clone());

    for (m, row) in labels.iter().enumerate() {
        let mut line = format!("{:>2}  |", m);
        for label in row {
            line.push_str(&format!("{:>w$} |", label, w = width + 1));
        }
        lines.push(line);
        lines.push(sep.clone());
    }

    Ok(lines.join("\n"))
}
