use crate::color::Color;
use crate::segment::Segmentation;

/// An ordered group of regions sharing one fill color and draw precedence.
#[derive(Debug, Clone)]
pub struct Layer {
    pub color: Color,
    /// Region ids in draw order within the layer.
    pub region_ids: Vec<u32>,
}

/// Total draw ordering of regions grouped into layers.
#[derive(Debug, Clone)]
pub struct Composition {
    /// Layers in draw order, earliest painted first.
    pub layers: Vec<Layer>,
    /// Global draw-order index per region id.
    pub order_of_region: Vec<u32>,
}

/// Order regions into layers and assign every region a draw index.
///
/// Layers are ordered by total pixel coverage descending (the largest color
/// is almost always background and must paint first), ties broken by the
/// earliest first-seen pixel. Adjacent layers closer than
/// `layer_difference` merge, keeping the earlier layer's color.
pub fn compose(segmentation: &Segmentation, palette: &[Color], layer_difference: i32) -> Composition {
    struct Candidate {
        color: Color,
        coverage: usize,
        first_seen: usize,
        region_ids: Vec<u32>,
    }

    // One candidate layer per palette color that owns at least one region.
    let mut candidates: Vec<Candidate> = palette
        .iter()
        .map(|&color| Candidate {
            color,
            coverage: 0,
            first_seen: usize::MAX,
            region_ids: Vec::new(),
        })
        .collect();

    for region in &segmentation.regions {
        let candidate = &mut candidates[region.color_index as usize];
        candidate.coverage += region.pixel_count;
        candidate.first_seen = candidate.first_seen.min(region.first_seen);
        candidate.region_ids.push(region.id);
    }

    let mut ordered: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| !c.region_ids.is_empty())
        .collect();
    ordered.sort_by(|a, b| {
        b.coverage
            .cmp(&a.coverage)
            .then(a.first_seen.cmp(&b.first_seen))
    });

    // Merge adjacent layers whose colors are indistinct at this threshold.
    let mut layers: Vec<Layer> = Vec::new();
    for candidate in ordered {
        match layers.last_mut() {
            Some(last) if last.color.distance(&candidate.color) < f64::from(layer_difference) => {
                last.region_ids.extend(candidate.region_ids);
            }
            _ => layers.push(Layer {
                color: candidate.color,
                region_ids: candidate.region_ids,
            }),
        }
    }

    // Regions draw in first-seen order within their layer.
    let mut order_of_region = vec![0u32; segmentation.regions.len()];
    let mut next_order = 0u32;
    for layer in &mut layers {
        layer
            .region_ids
            .sort_by_key(|&id| segmentation.regions[id as usize].first_seen);
        for &id in &layer.region_ids {
            order_of_region[id as usize] = next_order;
            next_order += 1;
        }
    }

    Composition {
        layers,
        order_of_region,
    }
}
