use std::collections::HashMap;

use image::{GrayImage, Luma, RgbaImage};
use imageproc::contrast::otsu_level;
use ndarray::Array2;

use crate::color::Color;
use crate::config::{ColorMode, TraceConfig};

/// Result of color quantization: a palette and the per-pixel palette index.
#[derive(Debug, Clone)]
pub struct Quantized {
    /// Distinct output colors, in first-seen scan order.
    pub palette: Vec<Color>,
    /// Palette index per pixel, `[y, x]` indexed.
    pub index_map: Array2<u32>,
}

impl Quantized {
    pub fn width(&self) -> usize {
        self.index_map.ncols()
    }

    pub fn height(&self) -> usize {
        self.index_map.nrows()
    }
}

/// Reduce the pixel grid's color space per the configured mode.
///
/// Deterministic for identical input and parameters: palette order is the
/// row-major first-seen order of each bucket.
pub fn quantize(image: &RgbaImage, config: &TraceConfig) -> Quantized {
    match config.color_mode {
        ColorMode::Binary => quantize_binary(image),
        ColorMode::Color => quantize_color(image, config.color_precision),
    }
}

/// Binary quantization: exactly two output colors, split at an Otsu
/// luminance threshold. Darker pixels map to the black foreground.
fn quantize_binary(image: &RgbaImage) -> Quantized {
    let (w, h) = image.dimensions();
    let gray = GrayImage::from_fn(w, h, |x, y| {
        let luma = Color::from(*image.get_pixel(x, y)).luminance();
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    });
    let level = otsu_level(&gray);

    let mut index_map = Array2::<u32>::zeros((h as usize, w as usize));
    for (x, y, px) in gray.enumerate_pixels() {
        let index = if px[0] > level { 1 } else { 0 };
        index_map[[y as usize, x as usize]] = index;
    }

    Quantized {
        palette: vec![Color::BLACK, Color::WHITE],
        index_map,
    }
}

/// Color quantization: keep the top `color_precision` bits per channel,
/// average each bucket's members, then merge buckets whose averages sit
/// closer than half a bucket width (sensor-noise duplicates).
fn quantize_color(image: &RgbaImage, color_precision: i32) -> Quantized {
    let (w, h) = image.dimensions();
    let shift = 8 - color_precision as u32;

    // First pass: assign buckets in scan order, accumulating channel sums.
    let mut bucket_of_key: HashMap<u32, u32> = HashMap::new();
    let mut sums: Vec<[u64; 4]> = Vec::new();
    let mut counts: Vec<u64> = Vec::new();
    let mut index_map = Array2::<u32>::zeros((h as usize, w as usize));

    for (x, y, px) in image.enumerate_pixels() {
        let key = (u32::from(px[0] >> shift) << 16)
            | (u32::from(px[1] >> shift) << 8)
            | u32::from(px[2] >> shift);
        let bucket = *bucket_of_key.entry(key).or_insert_with(|| {
            sums.push([0; 4]);
            counts.push(0);
            (sums.len() - 1) as u32
        });
        let sum = &mut sums[bucket as usize];
        sum[0] += u64::from(px[0]);
        sum[1] += u64::from(px[1]);
        sum[2] += u64::from(px[2]);
        sum[3] += u64::from(px[3]);
        counts[bucket as usize] += 1;
        index_map[[y as usize, x as usize]] = bucket;
    }

    let averages: Vec<Color> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, &count)| {
            Color::new(
                (sum[0] / count) as u8,
                (sum[1] / count) as u8,
                (sum[2] / count) as u8,
                (sum[3] / count) as u8,
            )
        })
        .collect();

    // Merge near-identical buckets into the earliest close match.
    let merge_epsilon = f64::from(1u32 << shift) / 2.0;
    let mut palette: Vec<Color> = Vec::new();
    let mut remap: Vec<u32> = Vec::with_capacity(averages.len());
    for color in &averages {
        let existing = palette
            .iter()
            .position(|p: &Color| p.distance(color) < merge_epsilon);
        match existing {
            Some(index) => remap.push(index as u32),
            None => {
                palette.push(*color);
                remap.push((palette.len() - 1) as u32);
            }
        }
    }

    for index in index_map.iter_mut() {
        *index = remap[*index as usize];
    }

    Quantized { palette, index_map }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(rgba))
    }

    fn config(mode: ColorMode, precision: i32) -> TraceConfig {
        TraceConfig::default()
            .with_color_mode(mode)
            .with_color_precision(precision)
    }

    mod quantize_color {
        use super::*;

        #[test]
        fn solid_image_one_palette_entry() {
            let image = solid(4, 4, [200, 10, 10, 255]);
            let q = quantize(&image, &config(ColorMode::Color, 6));
            assert_eq!(q.palette.len(), 1);
            assert!(q.index_map.iter().all(|&i| i == 0));
        }

        #[test]
        fn average_is_representative() {
            // All pixels share one bucket at precision 6 (values 200..=203
            // collapse to bucket 50); the palette entry is their average.
            let mut image = solid(2, 1, [200, 0, 0, 255]);
            image.put_pixel(1, 0, Rgba([202, 0, 0, 255]));
            let q = quantize(&image, &config(ColorMode::Color, 6));
            assert_eq!(q.palette.len(), 1);
            assert_eq!(q.palette[0].r, 201);
        }

        #[test]
        fn distant_colors_stay_distinct() {
            let mut image = solid(2, 1, [0, 0, 0, 255]);
            image.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
            let q = quantize(&image, &config(ColorMode::Color, 6));
            assert_eq!(q.palette.len(), 2);
            assert_ne!(
                q.index_map[[0, 0]],
                q.index_map[[0, 1]],
                "black and white must land in different clusters"
            );
        }

        #[test]
        fn palette_order_is_first_seen() {
            let mut image = solid(2, 1, [255, 0, 0, 255]);
            image.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
            let q = quantize(&image, &config(ColorMode::Color, 6));
            assert!(q.palette[0].r > q.palette[0].b, "red was seen first");
        }

        #[test]
        fn precision_one_caps_palette_at_eight() {
            let mut image = RgbaImage::new(16, 16);
            for (x, y, px) in image.enumerate_pixels_mut() {
                *px = Rgba([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8, 255]);
            }
            let q = quantize(&image, &config(ColorMode::Color, 1));
            assert!(q.palette.len() <= 8);
        }

        #[test]
        fn deterministic_across_runs() {
            let mut image = RgbaImage::new(8, 8);
            for (x, y, px) in image.enumerate_pixels_mut() {
                *px = Rgba([(x * 31) as u8, (y * 29) as u8, 77, 255]);
            }
            let cfg = config(ColorMode::Color, 4);
            let a = quantize(&image, &cfg);
            let b = quantize(&image, &cfg);
            assert_eq!(a.palette, b.palette);
            assert_eq!(a.index_map, b.index_map);
        }

        #[test]
        fn every_pixel_indexed_within_palette() {
            let mut image = RgbaImage::new(5, 3);
            for (x, y, px) in image.enumerate_pixels_mut() {
                *px = Rgba([(x * 50) as u8, (y * 80) as u8, 0, 255]);
            }
            let q = quantize(&image, &config(ColorMode::Color, 5));
            for &index in q.index_map.iter() {
                assert!((index as usize) < q.palette.len());
            }
        }
    }

    mod quantize_binary {
        use super::*;

        #[test]
        fn gradient_yields_exactly_two_colors() {
            let mut image = RgbaImage::new(16, 1);
            for (x, _, px) in image.enumerate_pixels_mut() {
                let v = (x * 16) as u8;
                *px = Rgba([v, v, v, 255]);
            }
            // color_precision must not influence the binary palette
            for precision in [1, 4, 8] {
                let q = quantize(&image, &config(ColorMode::Binary, precision));
                assert_eq!(q.palette.len(), 2);
                assert_eq!(q.palette[0], Color::BLACK);
                assert_eq!(q.palette[1], Color::WHITE);
            }
        }

        #[test]
        fn dark_maps_to_foreground_light_to_background() {
            let mut image = solid(2, 1, [10, 10, 10, 255]);
            image.put_pixel(1, 0, Rgba([240, 240, 240, 255]));
            let q = quantize(&image, &config(ColorMode::Binary, 6));
            assert_eq!(q.index_map[[0, 0]], 0);
            assert_eq!(q.index_map[[0, 1]], 1);
        }

        #[test]
        fn index_map_dimensions_match_image() {
            let image = solid(7, 3, [128, 128, 128, 255]);
            let q = quantize(&image, &config(ColorMode::Binary, 6));
            assert_eq!(q.width(), 7);
            assert_eq!(q.height(), 3);
        }
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Binary mode always produces a two-entry palette and in-range
            /// indices, whatever the pixel data.
            #[test]
            fn binary_palette_is_always_two(
                w in 1u32..12,
                h in 1u32..12,
                value in proptest::num::u8::ANY
            ) {
                let image = solid(w, h, [value, value, value, 255]);
                let q = quantize(&image, &config(ColorMode::Binary, 6));
                prop_assert_eq!(q.palette.len(), 2);
                for &index in q.index_map.iter() {
                    prop_assert!(index < 2);
                }
            }

            /// Color mode palette never exceeds the bucket-count bound.
            #[test]
            fn color_palette_bounded_by_precision(
                precision in 1i32..=8,
                seed in proptest::num::u8::ANY
            ) {
                let mut image = RgbaImage::new(8, 8);
                for (x, y, px) in image.enumerate_pixels_mut() {
                    let v = seed.wrapping_add((x * 37 + y * 11) as u8);
                    *px = Rgba([v, v.wrapping_mul(3), v.wrapping_add(91), 255]);
                }
                let q = quantize(&image, &config(ColorMode::Color, precision));
                let levels = 1u64 << precision;
                prop_assert!((q.palette.len() as u64) <= levels * levels * levels);
            }
        }
    }
}
