pub mod cancel;
pub mod color;
pub mod config;
pub mod contour;
pub mod document;
pub mod error;
pub mod fit;
pub mod layer;
pub mod quantize;
pub mod segment;
pub mod svg;

pub use cancel::CancelToken;
pub use color::Color;
pub use config::{ColorMode, Hierarchical, PathMode, TraceConfig};
pub use document::{
    CompoundPath, LayerPaths, PathSegment, Point, SubPath, TraceStats, VectorDocument,
};
pub use error::{TraceError, TraceResult};
pub use svg::to_svg_string;

use std::sync::atomic::{AtomicUsize, Ordering};

use image::RgbaImage;
use rayon::prelude::*;

/// Entry point for configuring and running conversions.
#[derive(Debug, Clone, Default)]
pub struct Tracer {
    config: TraceConfig,
}

impl Tracer {
    pub fn new(config: TraceConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the active configuration.
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Convert an image with this tracer's configuration.
    pub fn trace(&self, image: &RgbaImage) -> TraceResult<VectorDocument> {
        convert(image, &self.config)
    }

    /// Convert an image, checking the token for cancellation between
    /// regions.
    pub fn trace_with_cancel(
        &self,
        image: &RgbaImage,
        cancel: &CancelToken,
    ) -> TraceResult<VectorDocument> {
        convert_with_cancel(image, &self.config, cancel)
    }
}

/// Convert a decoded RGBA grid into a layered vector document.
///
/// Pure and re-callable: the image is borrowed read-only and all
/// intermediate state lives and dies inside this call.
pub fn convert(image: &RgbaImage, config: &TraceConfig) -> TraceResult<VectorDocument> {
    convert_with_cancel(image, config, &CancelToken::new())
}

/// [`convert`] with cooperative cancellation.
///
/// The token is checked between pipeline stages and between regions; a
/// cancelled conversion returns [`TraceError::Cancelled`] and never a
/// partial document. Per-region geometry failures fall back to a
/// bounding-box fill and are counted in [`TraceStats`], so one malformed
/// region cannot sink the rest of the image.
pub fn convert_with_cancel(
    image: &RgbaImage,
    config: &TraceConfig,
    cancel: &CancelToken,
) -> TraceResult<VectorDocument> {
    config.validate()?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TraceError::EmptyImage { width, height });
    }
    if cancel.is_cancelled() {
        return Err(TraceError::Cancelled);
    }

    let quantized = quantize::quantize(image, config);
    let segmentation = segment::segment(&quantized, config.filter_speckle);
    if cancel.is_cancelled() {
        return Err(TraceError::Cancelled);
    }
    let composition = layer::compose(&segmentation, &quantized.palette, config.layer_difference);

    // Contour + fit is independent per region; fan out and join.
    let recoveries = AtomicUsize::new(0);
    let fitted: TraceResult<Vec<Option<CompoundPath>>> = segmentation
        .regions
        .par_iter()
        .map(|region| {
            if cancel.is_cancelled() {
                return Err(TraceError::Cancelled);
            }
            let contours = contour::trace_region(
                &segmentation.labels,
                region,
                config.hierarchical,
                &composition.order_of_region,
            )
            .unwrap_or_else(|_| {
                recoveries.fetch_add(1, Ordering::Relaxed);
                contour::bounds_contour(region)
            });

            let subpaths = contours
                .outer
                .iter()
                .chain(contours.holes.iter())
                .map(|boundary| fit::fit_contour(boundary, config))
                .collect();
            Ok(Some(CompoundPath { subpaths }))
        })
        .collect();
    let mut fitted = fitted?;
    if cancel.is_cancelled() {
        return Err(TraceError::Cancelled);
    }

    let layers = composition
        .layers
        .iter()
        .map(|layer| LayerPaths {
            color: layer.color,
            paths: layer
                .region_ids
                .iter()
                .filter_map(|&id| fitted[id as usize].take())
                .collect(),
        })
        .collect();

    let stats = TraceStats {
        regions: segmentation.regions.len(),
        speckles_merged: segmentation.speckles_merged,
        geometry_recoveries: recoveries.load(Ordering::Relaxed),
    };
    Ok(document::assemble(
        width,
        height,
        layers,
        stats,
        config.path_precision,
    ))
}
