use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use rastertrace::{
    CancelToken, ColorMode, Hierarchical, PathMode, TraceConfig, TraceError, TraceResult,
    convert_with_cancel, to_svg_string,
};

/// Tracing color modes.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum TracerColorMode {
    Color,
    Binary,
}

impl From<TracerColorMode> for ColorMode {
    fn from(value: TracerColorMode) -> Self {
        match value {
            TracerColorMode::Color => ColorMode::Color,
            TracerColorMode::Binary => ColorMode::Binary,
        }
    }
}

/// Layer compositing modes.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum TracerHierarchy {
    Stacked,
    Cutout,
}

impl From<TracerHierarchy> for Hierarchical {
    fn from(value: TracerHierarchy) -> Self {
        match value {
            TracerHierarchy::Stacked => Hierarchical::Stacked,
            TracerHierarchy::Cutout => Hierarchical::Cutout,
        }
    }
}

/// Path fitting modes.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum TracerMode {
    Polygon,
    Spline,
}

impl From<TracerMode> for PathMode {
    fn from(value: TracerMode) -> Self {
        match value {
            TracerMode::Polygon => PathMode::Polygon,
            TracerMode::Spline => PathMode::Spline,
        }
    }
}

/// Named option bundles, applied before any explicit flag overrides.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    /// Black-and-white line art.
    Bw,
    /// Flat posterized color.
    Poster,
    /// Photographic input with many gradients.
    Photo,
}

impl Preset {
    fn config(self) -> TraceConfig {
        match self {
            Preset::Bw => TraceConfig::default().with_color_mode(ColorMode::Binary),
            Preset::Poster => TraceConfig::default().with_color_precision(8),
            Preset::Photo => TraceConfig::default()
                .with_filter_speckle(10)
                .with_color_precision(8)
                .with_layer_difference(48)
                .with_corner_threshold(180),
        }
    }
}

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
struct Cli {
    /// Input image path (any format `image` can decode)
    input: PathBuf,
    /// Output SVG path (defaults to input name with `.svg`)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Named parameter preset applied before explicit overrides
    #[arg(long, value_enum)]
    preset: Option<Preset>,
    /// Path fitting mode
    #[arg(long = "mode", value_enum)]
    mode: Option<TracerMode>,
    /// Tracing color mode
    #[arg(long = "color-mode", value_enum)]
    color_mode: Option<TracerColorMode>,
    /// Layer compositing mode
    #[arg(long = "hierarchy", value_enum)]
    hierarchy: Option<TracerHierarchy>,
    /// Minimum region pixel count kept by the speckle filter
    #[arg(long = "filter-speckle")]
    filter_speckle: Option<usize>,
    /// Significant bits per RGB channel
    #[arg(long = "color-precision")]
    color_precision: Option<i32>,
    /// Layer-merge color distance
    #[arg(long = "layer-difference")]
    layer_difference: Option<i32>,
    /// Corner threshold in degrees
    #[arg(long = "corner-threshold")]
    corner_threshold: Option<i32>,
    /// Simplification deviation tolerance
    #[arg(long = "length-threshold")]
    length_threshold: Option<f64>,
    /// Maximum curve-fit refinement passes
    #[arg(long = "max-iterations")]
    max_iterations: Option<usize>,
    /// Splice threshold in degrees
    #[arg(long = "splice-threshold")]
    splice_threshold: Option<i32>,
    /// Output coordinate precision (decimal places)
    #[arg(long = "path-precision")]
    path_precision: Option<u32>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        report_error(&err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> TraceResult<()> {
    let config = build_config(cli);
    config.validate()?;

    let image = image::open(&cli.input)?.to_rgba8();

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if ctrlc::set_handler(move || handler_token.cancel()).is_err() {
        eprintln!("Warning: could not install Ctrl-C handler; cancellation disabled.");
    }

    let document = convert_with_cancel(&image, &config, &cancel)?;
    if document.stats.geometry_recoveries > 0 {
        eprintln!(
            "Warning: {} region(s) recovered with fallback geometry.",
            document.stats.geometry_recoveries
        );
    }

    let svg = to_svg_string(&document);
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| derive_svg_path(&cli.input));
    fs::write(&output_path, &svg)?;
    println!("SVG saved to {}", output_path.display());

    Ok(())
}

/// Build the engine configuration: preset first, explicit flags override.
fn build_config(cli: &Cli) -> TraceConfig {
    let mut config = cli
        .preset
        .map(Preset::config)
        .unwrap_or_default();

    if let Some(mode) = cli.mode {
        config.mode = mode.into();
    }
    if let Some(color_mode) = cli.color_mode {
        config.color_mode = color_mode.into();
    }
    if let Some(hierarchy) = cli.hierarchy {
        config.hierarchical = hierarchy.into();
    }
    if let Some(filter_speckle) = cli.filter_speckle {
        config.filter_speckle = filter_speckle;
    }
    if let Some(color_precision) = cli.color_precision {
        config.color_precision = color_precision;
    }
    if let Some(layer_difference) = cli.layer_difference {
        config.layer_difference = layer_difference;
    }
    if let Some(corner_threshold) = cli.corner_threshold {
        config.corner_threshold = corner_threshold;
    }
    if let Some(length_threshold) = cli.length_threshold {
        config.length_threshold = length_threshold;
    }
    if let Some(max_iterations) = cli.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(splice_threshold) = cli.splice_threshold {
        config.splice_threshold = splice_threshold;
    }
    if let Some(path_precision) = cli.path_precision {
        config.path_precision = path_precision;
    }
    config
}

fn report_error(err: &TraceError) {
    match err {
        TraceError::Cancelled => eprintln!("Conversion cancelled."),
        TraceError::Parameter { .. } => {
            eprintln!("{err}");
            eprintln!("Run with --help for the valid option domains.");
        }
        _ => eprintln!("{err}"),
    }
}

/// Derive an SVG file path by changing the extension to `.svg`.
fn derive_svg_path(input: &Path) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension("svg");
    path
}
