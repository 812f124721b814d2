use crate::color::Color;

/// A point in document coordinates. Full precision internally; rounding
/// happens once, when the document is assembled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    fn rounded(self, factor: f64) -> Self {
        Self {
            x: (self.x * factor).round() / factor,
            y: (self.y * factor).round() / factor,
        }
    }
}

/// One drawing primitive of a sub-path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    Line { to: Point },
    Cubic { c1: Point, c2: Point, to: Point },
}

impl PathSegment {
    pub fn end(&self) -> Point {
        match self {
            PathSegment::Line { to } => *to,
            PathSegment::Cubic { to, .. } => *to,
        }
    }
}

/// A closed sub-path: segments run from `start` back around to `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubPath {
    pub start: Point,
    pub segments: Vec<PathSegment>,
}

/// One region's geometry: the outer sub-path(s) followed by hole sub-paths
/// wound the opposite way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundPath {
    pub subpaths: Vec<SubPath>,
}

/// All paths of one layer, sharing a fill color and draw precedence.
#[derive(Debug, Clone)]
pub struct LayerPaths {
    pub color: Color,
    /// Compound paths in draw order within the layer.
    pub paths: Vec<CompoundPath>,
}

/// Diagnostic counters for one conversion. Not part of the serialized
/// output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    pub regions: usize,
    pub speckles_merged: usize,
    /// Regions that fell back to bounding-box geometry.
    pub geometry_recoveries: usize,
}

/// The final output: ordered layers of filled paths, plus diagnostics.
#[derive(Debug, Clone)]
pub struct VectorDocument {
    pub width: u32,
    pub height: u32,
    /// Layers in draw order, earliest painted first.
    pub layers: Vec<LayerPaths>,
    pub stats: TraceStats,
}

/// Assemble the final document, rounding every coordinate to
/// `path_precision` decimal digits. This is the only place rounding
/// happens; earlier stages keep full precision.
pub fn assemble(
    width: u32,
    height: u32,
    layers: Vec<LayerPaths>,
    stats: TraceStats,
    path_precision: u32,
) -> VectorDocument {
    let factor = 10f64.powi(path_precision as i32);
    let layers = layers
        .into_iter()
        .map(|layer| LayerPaths {
            color: layer.color,
            paths: layer
                .paths
                .into_iter()
                .map(|path| round_compound(path, factor))
                .collect(),
        })
        .collect();
    VectorDocument {
        width,
        height,
        layers,
        stats,
    }
}

fn round_compound(path: CompoundPath, factor: f64) -> CompoundPath {
    CompoundPath {
        subpaths: path
            .subpaths
            .into_iter()
            .map(|sub| SubPath {
                start: sub.start.rounded(factor),
                segments: sub
                    .segments
                    .into_iter()
                    .map(|segment| match segment {
                        PathSegment::Line { to } => PathSegment::Line {
                            to: to.rounded(factor),
                        },
                        PathSegment::Cubic { c1, c2, to } => PathSegment::Cubic {
                            c1: c1.rounded(factor),
                            c2: c2.rounded(factor),
                            to: to.rounded(factor),
                        },
                    })
                    .collect(),
            })
            .collect(),
    }
}
