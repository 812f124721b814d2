use std::fmt::Write;

use crate::document::{CompoundPath, PathSegment, VectorDocument};

/// Render a document as an SVG string: one `<path>` per compound path,
/// emitted in draw order so painter's-algorithm stacking is preserved.
pub fn to_svg_string(document: &VectorDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = document.width,
        h = document.height,
    );
    for layer in &document.layers {
        let fill = layer.color.to_hex();
        for path in &layer.paths {
            if path.subpaths.is_empty() {
                continue;
            }
            let _ = writeln!(out, r#"<path d="{}" fill="{}"/>"#, path_data(path), fill);
        }
    }
    out.push_str("</svg>\n");
    out
}

/// The `d` attribute for one compound path; holes are additional `M…Z`
/// sub-paths wound opposite to the outers.
fn path_data(path: &CompoundPath) -> String {
    let mut d = String::new();
    for (i, sub) in path.subpaths.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        let _ = write!(d, "M{} {}", fmt(sub.start.x), fmt(sub.start.y));
        let mut cursor = sub.start;
        for segment in &sub.segments {
            match *segment {
                PathSegment::Line { to } => {
                    if to != cursor {
                        let _ = write!(d, " L{} {}", fmt(to.x), fmt(to.y));
                    }
                    cursor = to;
                }
                PathSegment::Cubic { c1, c2, to } => {
                    let _ = write!(
                        d,
                        " C{} {} {} {} {} {}",
                        fmt(c1.x),
                        fmt(c1.y),
                        fmt(c2.x),
                        fmt(c2.y),
                        fmt(to.x),
                        fmt(to.y)
                    );
                    cursor = to;
                }
            }
        }
        d.push_str(" Z");
    }
    d
}

/// Shortest decimal form; coordinates were already rounded at assembly so
/// `Display` never prints excess digits.
fn fmt(v: f64) -> String {
    // Avoid "-0" in output.
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v}")
}
