use std::collections::VecDeque;

use ndarray::Array2;

use crate::quantize::Quantized;

/// Inclusive pixel bounding box of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Bounds {
    pub fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }
}

/// A maximal 4-connected component of one quantized color.
#[derive(Debug, Clone)]
pub struct Region {
    /// Dense region id, also the index into [`Segmentation::regions`].
    pub id: u32,
    /// Palette index of the region's quantized color.
    pub color_index: u32,
    pub pixel_count: usize,
    pub bounds: Bounds,
    /// Row-major index of the region's first pixel in scan order; the
    /// stable tie-break key for deterministic ordering downstream.
    pub first_seen: usize,
}

/// Disjoint regions covering the full grid.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Region id per pixel, `[y, x]` indexed. Ids are dense.
    pub labels: Array2<u32>,
    pub regions: Vec<Region>,
    /// Sub-threshold regions absorbed during speckle filtering.
    pub speckles_merged: usize,
}

/// Partition the quantized grid into 4-connected same-color regions, then
/// absorb every region below `filter_speckle` pixels into a neighbor.
pub fn segment(quantized: &Quantized, filter_speckle: usize) -> Segmentation {
    let (labels, pixel_lists) = label_components(&quantized.index_map);
    let mut state = MergeState::new(labels, pixel_lists, &quantized.index_map);

    let speckles_merged = if filter_speckle > 0 {
        state.filter_speckles(filter_speckle)
    } else {
        0
    };

    state.into_segmentation(speckles_merged)
}

/// BFS connected-component labeling over 4-neighbors, scan order.
fn label_components(index_map: &Array2<u32>) -> (Array2<u32>, Vec<Vec<usize>>) {
    let (h, w) = index_map.dim();
    const UNLABELED: u32 = u32::MAX;
    let mut labels = Array2::<u32>::from_elem((h, w), UNLABELED);
    let mut pixel_lists: Vec<Vec<usize>> = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..h {
        for x in 0..w {
            if labels[[y, x]] != UNLABELED {
                continue;
            }
            let label = pixel_lists.len() as u32;
            let color = index_map[[y, x]];
            let mut pixels = Vec::new();

            labels[[y, x]] = label;
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                pixels.push(cy * w + cx);
                for (nx, ny) in neighbors4(cx, cy, w, h) {
                    if labels[[ny, nx]] == UNLABELED && index_map[[ny, nx]] == color {
                        labels[[ny, nx]] = label;
                        queue.push_back((nx, ny));
                    }
                }
            }
            pixel_lists.push(pixels);
        }
    }

    (labels, pixel_lists)
}

fn neighbors4(x: usize, y: usize, w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
    let mut out = [(0usize, 0usize); 4];
    let mut n = 0;
    if x > 0 {
        out[n] = (x - 1, y);
        n += 1;
    }
    if x + 1 < w {
        out[n] = (x + 1, y);
        n += 1;
    }
    if y > 0 {
        out[n] = (x, y - 1);
        n += 1;
    }
    if y + 1 < h {
        out[n] = (x, y + 1);
        n += 1;
    }
    out.into_iter().take(n)
}

/// Union-find over provisional labels, driving iterative speckle absorption.
struct MergeState {
    labels: Array2<u32>,
    parent: Vec<u32>,
    /// Row-major pixel indices per root; merged regions concatenate.
    pixels: Vec<Vec<usize>>,
    /// Quantized color per root; absorbed pixels adopt the absorber's.
    colors: Vec<u32>,
    width: usize,
    height: usize,
}

impl MergeState {
    fn new(labels: Array2<u32>, pixels: Vec<Vec<usize>>, index_map: &Array2<u32>) -> Self {
        let (h, w) = labels.dim();
        let colors = pixels
            .iter()
            .map(|list| {
                let p = list[0];
                index_map[[p / w, p % w]]
            })
            .collect();
        Self {
            parent: (0..pixels.len() as u32).collect(),
            labels,
            pixels,
            colors,
            width: w,
            height: h,
        }
    }

    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression.
        let mut cur = label;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    /// Merge `child` into `absorber`, moving its pixel list.
    fn union_into(&mut self, child: u32, absorber: u32) {
        debug_assert_ne!(child, absorber);
        self.parent[child as usize] = absorber;
        let moved = std::mem::take(&mut self.pixels[child as usize]);
        self.pixels[absorber as usize].extend(moved);
    }

    /// Absorb sub-threshold regions until none remain, smallest first.
    ///
    /// Each speckle merges into the neighbor sharing the longest boundary
    /// (ties: lowest root id) and its pixels adopt that neighbor's color.
    /// Same-colored neighbors connected through the absorbed pixels are
    /// unioned too, so two larger regions can fuse into one.
    fn filter_speckles(&mut self, threshold: usize) -> usize {
        let mut merged = 0;
        loop {
            let mut candidates: Vec<u32> = (0..self.parent.len() as u32)
                .filter(|&r| {
                    self.parent[r as usize] == r
                        && !self.pixels[r as usize].is_empty()
                        && self.pixels[r as usize].len() < threshold
                })
                .collect();
            if candidates.is_empty() {
                break;
            }
            candidates.sort_by_key(|&r| (self.pixels[r as usize].len(), r));

            let mut progressed = false;
            for root in candidates {
                if self.find(root) != root || self.pixels[root as usize].len() >= threshold {
                    continue;
                }
                if let Some(absorber) = self.dominant_neighbor(root) {
                    self.absorb(root, absorber);
                    merged += 1;
                    progressed = true;
                }
            }
            if !progressed {
                // Only a grid-covering region (no neighbors) can remain.
                break;
            }
        }
        merged
    }

    /// The neighboring root sharing the longest boundary with `root`.
    fn dominant_neighbor(&mut self, root: u32) -> Option<u32> {
        let pixels = self.pixels[root as usize].clone();
        let mut shared: Vec<(u32, usize)> = Vec::new();
        for &p in &pixels {
            let (x, y) = (p % self.width, p / self.width);
            for (nx, ny) in neighbors4(x, y, self.width, self.height) {
                let neighbor = self.find(self.labels[[ny, nx]]);
                if neighbor == root {
                    continue;
                }
                match shared.iter_mut().find(|(r, _)| *r == neighbor) {
                    Some((_, count)) => *count += 1,
                    None => shared.push((neighbor, 1)),
                }
            }
        }
        shared
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(r, _)| r)
    }

    fn absorb(&mut self, root: u32, absorber: u32) {
        let speckle_pixels = self.pixels[root as usize].clone();
        self.union_into(root, absorber);

        // The absorbed pixels may now bridge same-colored neighbors.
        let absorber_color = self.colors[absorber as usize];
        for &p in &speckle_pixels {
            let (x, y) = (p % self.width, p / self.width);
            for (nx, ny) in neighbors4(x, y, self.width, self.height) {
                let neighbor = self.find(self.labels[[ny, nx]]);
                if neighbor != absorber && self.colors[neighbor as usize] == absorber_color {
                    let (bigger, smaller) = if self.pixels[absorber as usize].len()
                        >= self.pixels[neighbor as usize].len()
                    {
                        (absorber, neighbor)
                    } else {
                        (neighbor, absorber)
                    };
                    self.union_into(smaller, bigger);
                    if bigger != absorber {
                        return self.absorb_rest(absorber, bigger, &speckle_pixels);
                    }
                }
            }
        }
    }

    /// Continue bridge-scanning after the absorber itself was unioned away.
    fn absorb_rest(&mut self, _old: u32, new_root: u32, speckle_pixels: &[usize]) {
        let color = self.colors[new_root as usize];
        for &p in speckle_pixels {
            let (x, y) = (p % self.width, p / self.width);
            for (nx, ny) in neighbors4(x, y, self.width, self.height) {
                let neighbor = self.find(self.labels[[ny, nx]]);
                if neighbor != new_root && self.colors[neighbor as usize] == color {
                    self.union_into(neighbor, new_root);
                }
            }
        }
    }

    /// Resolve the union-find into dense ids and per-region metadata.
    fn into_segmentation(mut self, speckles_merged: usize) -> Segmentation {
        let (h, w) = (self.height, self.width);
        let mut dense_of_root: Vec<Option<u32>> = vec![None; self.parent.len()];
        let mut regions: Vec<Region> = Vec::new();
        let mut labels = Array2::<u32>::zeros((h, w));

        for y in 0..h {
            for x in 0..w {
                let root = self.find(self.labels[[y, x]]);
                let dense = match dense_of_root[root as usize] {
                    Some(d) => d,
                    None => {
                        let d = regions.len() as u32;
                        dense_of_root[root as usize] = Some(d);
                        regions.push(Region {
                            id: d,
                            color_index: self.colors[root as usize],
                            pixel_count: 0,
                            bounds: Bounds {
                                min_x: x,
                                min_y: y,
                                max_x: x,
                                max_y: y,
                            },
                            first_seen: y * w + x,
                        });
                        d
                    }
                };
                labels[[y, x]] = dense;
                let region = &mut regions[dense as usize];
                region.pixel_count += 1;
                region.bounds.min_x = region.bounds.min_x.min(x);
                region.bounds.max_x = region.bounds.max_x.max(x);
                region.bounds.min_y = region.bounds.min_y.min(y);
                region.bounds.max_y = region.bounds.max_y.max(y);
            }
        }

        Segmentation {
            labels,
            regions,
            speckles_merged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    /// Build a Quantized fixture from rows of palette indices.
    fn quantized(rows: &[&[u32]]) -> Quantized {
        let h = rows.len();
        let w = rows[0].len();
        let mut index_map = Array2::<u32>::zeros((h, w));
        let mut max_index = 0;
        for (y, row) in rows.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                index_map[[y, x]] = v;
                max_index = max_index.max(v);
            }
        }
        let palette = (0..=max_index)
            .map(|i| Color::new((i * 40) as u8, 0, 0, 255))
            .collect();
        Quantized { palette, index_map }
    }

    mod labeling {
        use super::*;

        #[test]
        fn uniform_grid_is_one_region() {
            let q = quantized(&[&[0, 0], &[0, 0]]);
            let seg = segment(&q, 0);
            assert_eq!(seg.regions.len(), 1);
            assert_eq!(seg.regions[0].pixel_count, 4);
        }

        #[test]
        fn diagonal_pixels_are_separate_regions() {
            // 4-connectivity: diagonals must not leak together.
            let q = quantized(&[&[0, 1], &[1, 0]]);
            let seg = segment(&q, 0);
            assert_eq!(seg.regions.len(), 4);
        }

        #[test]
        fn same_color_islands_are_distinct_regions() {
            let q = quantized(&[&[0, 1, 0]]);
            let seg = segment(&q, 0);
            assert_eq!(seg.regions.len(), 3);
            assert_eq!(seg.regions[0].color_index, 0);
            assert_eq!(seg.regions[2].color_index, 0);
        }

        #[test]
        fn every_pixel_belongs_to_exactly_one_region() {
            let q = quantized(&[&[0, 0, 1], &[2, 0, 1], &[2, 2, 1]]);
            let seg = segment(&q, 0);
            let total: usize = seg.regions.iter().map(|r| r.pixel_count).sum();
            assert_eq!(total, 9);
            for &label in seg.labels.iter() {
                assert!((label as usize) < seg.regions.len());
            }
        }

        #[test]
        fn bounds_are_tight() {
            let q = quantized(&[&[0, 0, 0], &[0, 1, 0], &[0, 0, 0]]);
            let seg = segment(&q, 0);
            let inner = seg.regions.iter().find(|r| r.color_index == 1).unwrap();
            assert_eq!(
                inner.bounds,
                Bounds {
                    min_x: 1,
                    min_y: 1,
                    max_x: 1,
                    max_y: 1
                }
            );
        }

        #[test]
        fn ids_are_dense_and_scan_ordered() {
            let q = quantized(&[&[0, 1], &[2, 2]]);
            let seg = segment(&q, 0);
            for (i, region) in seg.regions.iter().enumerate() {
                assert_eq!(region.id as usize, i);
            }
            assert_eq!(seg.labels[[0, 0]], 0);
            assert_eq!(seg.labels[[0, 1]], 1);
            assert_eq!(seg.labels[[1, 0]], 2);
        }
    }

    mod speckle_filter {
        use super::*;

        #[test]
        fn zero_threshold_filters_nothing() {
            let q = quantized(&[&[0, 1, 0]]);
            let seg = segment(&q, 0);
            assert_eq!(seg.regions.len(), 3);
            assert_eq!(seg.speckles_merged, 0);
        }

        #[test]
        fn single_speckle_absorbed_by_surrounding_region() {
            let q = quantized(&[&[0, 0, 0], &[0, 1, 0], &[0, 0, 0]]);
            let seg = segment(&q, 2);
            assert_eq!(seg.regions.len(), 1);
            assert_eq!(seg.regions[0].pixel_count, 9);
            assert_eq!(seg.speckles_merged, 1);
        }

        #[test]
        fn absorbed_speckle_bridges_same_color_neighbors() {
            // Removing the center 1 must fuse the left and right 0-regions.
            let q = quantized(&[&[0, 1, 0]]);
            let seg = segment(&q, 2);
            assert_eq!(seg.regions.len(), 1);
            assert_eq!(seg.regions[0].color_index, 0);
            assert_eq!(seg.regions[0].pixel_count, 3);
        }

        #[test]
        fn filtering_is_iterative() {
            // After the 2-pixel region of color 1 is absorbed, the color-2
            // singleton still sits below threshold and must also go.
            let q = quantized(&[&[0, 0, 0, 0], &[0, 1, 1, 2], &[0, 0, 0, 0]]);
            let seg = segment(&q, 3);
            assert_eq!(seg.regions.len(), 1);
            assert_eq!(seg.regions[0].pixel_count, 12);
        }

        #[test]
        fn regions_at_threshold_survive() {
            let q = quantized(&[&[0, 0, 1, 1]]);
            let seg = segment(&q, 2);
            assert_eq!(seg.regions.len(), 2);
            assert_eq!(seg.speckles_merged, 0);
        }

        #[test]
        fn whole_grid_speckle_survives_without_neighbors() {
            let q = quantized(&[&[0]]);
            let seg = segment(&q, 100);
            assert_eq!(seg.regions.len(), 1);
            assert_eq!(seg.regions[0].pixel_count, 1);
        }

        #[test]
        fn idempotent_on_own_output() {
            let q = quantized(&[
                &[0, 0, 0, 2, 2],
                &[0, 1, 0, 2, 2],
                &[0, 0, 0, 2, 2],
                &[3, 3, 3, 2, 2],
            ]);
            let first = segment(&q, 2);
            // Re-quantize from the filtered labels: the second pass must
            // change nothing.
            let mut index_map = Array2::<u32>::zeros(first.labels.dim());
            for ((y, x), &label) in first.labels.indexed_iter() {
                index_map[[y, x]] = first.regions[label as usize].color_index;
            }
            let requantized = Quantized {
                palette: q.palette.clone(),
                index_map,
            };
            let second = segment(&requantized, 2);
            assert_eq!(second.speckles_merged, 0);
            assert_eq!(first.regions.len(), second.regions.len());
        }

        #[test]
        fn higher_threshold_never_increases_region_count() {
            let q = quantized(&[
                &[0, 1, 0, 2, 0],
                &[3, 0, 0, 0, 4],
                &[0, 5, 0, 6, 0],
            ]);
            let mut previous = usize::MAX;
            for threshold in 0..6 {
                let seg = segment(&q, threshold);
                assert!(seg.regions.len() <= previous);
                previous = seg.regions.len();
            }
        }
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Partition property: region pixel counts always sum to the
            /// grid size and labels stay in range.
            #[test]
            fn regions_partition_the_grid(
                w in 1usize..10,
                h in 1usize..10,
                threshold in 0usize..6,
                seed in proptest::num::u32::ANY
            ) {
                let mut index_map = Array2::<u32>::zeros((h, w));
                let mut state = seed;
                for v in index_map.iter_mut() {
                    // xorshift, deterministic per seed
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    *v = state % 3;
                }
                let palette = (0..3).map(|i| Color::new(i * 80, 0, 0, 255)).collect();
                let q = Quantized { palette, index_map };
                let seg = segment(&q, threshold);

                let total: usize = seg.regions.iter().map(|r| r.pixel_count).sum();
                prop_assert_eq!(total, w * h);
                for &label in seg.labels.iter() {
                    prop_assert!((label as usize) < seg.regions.len());
                }
                if threshold > 0 && seg.regions.len() > 1 {
                    for region in &seg.regions {
                        prop_assert!(region.pixel_count >= threshold.min(w * h));
                    }
                }
            }
        }
    }
}
