use crate::error::{TraceError, TraceResult};

/// Curve fitting strategy applied to simplified contours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMode {
    /// Straight line segments between all simplified vertices.
    Polygon,
    /// Smooth cubic curves between detected corners.
    #[default]
    Spline,
}

/// Quantization strategy for the input grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Bucket channel values into `color_precision` significant bits.
    #[default]
    Color,
    /// Foreground/background split via a computed luminance threshold.
    Binary,
}

/// Layer compositing discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hierarchical {
    /// Painter's algorithm: later layers drawn over earlier ones; holes
    /// covered by later layers may be painted through.
    #[default]
    Stacked,
    /// Mutually exclusive regions: every path keeps its exact holes so no
    /// two paths overlap.
    Cutout,
}

/// The full parameter set for one conversion.
///
/// Immutable once handed to the engine; validated up front so no partial
/// work happens on an out-of-domain option.
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Curve fitting strategy.
    pub mode: PathMode,
    /// Quantization strategy.
    pub color_mode: ColorMode,
    /// Layer compositing discipline.
    pub hierarchical: Hierarchical,
    /// Minimum pixel count for a region to survive speckle filtering.
    pub filter_speckle: usize,
    /// Significant bits kept per RGB channel (1-8).
    pub color_precision: i32,
    /// Minimum color distance for two layers to stay distinct.
    pub layer_difference: i32,
    /// Corner detection angle in degrees (0-180).
    pub corner_threshold: i32,
    /// Perpendicular deviation tolerance for contour simplification.
    pub length_threshold: f64,
    /// Maximum curve-fit refinement passes per section.
    pub max_iterations: usize,
    /// Tangent deviation in degrees before a smooth run is spliced.
    pub splice_threshold: i32,
    /// Decimal digits kept in output coordinates.
    pub path_precision: u32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            mode: PathMode::Spline,
            color_mode: ColorMode::Color,
            hierarchical: Hierarchical::Stacked,
            filter_speckle: 4,
            color_precision: 6,
            layer_difference: 16,
            corner_threshold: 60,
            length_threshold: 4.0,
            max_iterations: 10,
            splice_threshold: 45,
            path_precision: 2,
        }
    }
}

impl TraceConfig {
    /// Set the curve fitting strategy.
    pub fn with_mode(mut self, mode: PathMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the quantization strategy.
    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }

    /// Set the layer compositing discipline.
    pub fn with_hierarchical(mut self, hierarchical: Hierarchical) -> Self {
        self.hierarchical = hierarchical;
        self
    }

    /// Set the minimum surviving region pixel count.
    pub fn with_filter_speckle(mut self, filter_speckle: usize) -> Self {
        self.filter_speckle = filter_speckle;
        self
    }

    /// Set the significant bits kept per channel.
    pub fn with_color_precision(mut self, color_precision: i32) -> Self {
        self.color_precision = color_precision;
        self
    }

    /// Set the layer-merge color distance.
    pub fn with_layer_difference(mut self, layer_difference: i32) -> Self {
        self.layer_difference = layer_difference;
        self
    }

    /// Set the corner detection angle in degrees.
    pub fn with_corner_threshold(mut self, corner_threshold: i32) -> Self {
        self.corner_threshold = corner_threshold;
        self
    }

    /// Set the simplification deviation tolerance.
    pub fn with_length_threshold(mut self, length_threshold: f64) -> Self {
        self.length_threshold = length_threshold;
        self
    }

    /// Set the maximum curve-fit refinement passes.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the splice angle in degrees.
    pub fn with_splice_threshold(mut self, splice_threshold: i32) -> Self {
        self.splice_threshold = splice_threshold;
        self
    }

    /// Set the output coordinate precision in decimal digits.
    pub fn with_path_precision(mut self, path_precision: u32) -> Self {
        self.path_precision = path_precision;
        self
    }

    /// Check every numeric option against its valid domain.
    ///
    /// Called by the engine before any processing; an error here means no
    /// partial work was performed.
    pub fn validate(&self) -> TraceResult<()> {
        if !(1..=8).contains(&self.color_precision) {
            return Err(TraceError::parameter(
                "color_precision",
                format!("expected 1-8, got {}", self.color_precision),
            ));
        }
        if self.layer_difference < 0 {
            return Err(TraceError::parameter(
                "layer_difference",
                format!("expected >= 0, got {}", self.layer_difference),
            ));
        }
        if !(0..=180).contains(&self.corner_threshold) {
            return Err(TraceError::parameter(
                "corner_threshold",
                format!("expected 0-180 degrees, got {}", self.corner_threshold),
            ));
        }
        if !self.length_threshold.is_finite() || self.length_threshold < 0.0 {
            return Err(TraceError::parameter(
                "length_threshold",
                format!("expected finite >= 0, got {}", self.length_threshold),
            ));
        }
        if self.max_iterations == 0 {
            return Err(TraceError::parameter(
                "max_iterations",
                "expected >= 1, got 0",
            ));
        }
        if self.splice_threshold < 0 {
            return Err(TraceError::parameter(
                "splice_threshold",
                format!("expected >= 0 degrees, got {}", self.splice_threshold),
            ));
        }
        Ok(())
    }
}
