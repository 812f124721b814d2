use std::collections::{HashMap, VecDeque};

use ndarray::Array2;

use crate::config::Hierarchical;
use crate::error::{TraceError, TraceResult};
use crate::segment::Region;

/// A closed boundary polygon in pixel-edge lattice coordinates. The first
/// point is not repeated; closure is implicit.
pub type Contour = Vec<(u32, u32)>;

/// The outer and hole boundaries of one region.
#[derive(Debug, Clone)]
pub struct RegionContours {
    /// Outer loops (negative signed area). Usually one; a region pinched
    /// at a checkerboard corner contributes one loop per lobe.
    pub outer: Vec<Contour>,
    /// Hole loops (positive signed area), wound opposite to the outers.
    pub holes: Vec<Contour>,
}

// Directions along pixel edges: +x, +y, -x, -y. The walk keeps the region
// on the left of every edge, so `left` is the tightest turn.
const DX: [i64; 4] = [1, 0, -1, 0];
const DY: [i64; 4] = [0, 1, 0, -1];

fn left(dir: u8) -> u8 {
    (dir + 3) % 4
}

fn right(dir: u8) -> u8 {
    (dir + 1) % 4
}

/// Extract a region's boundaries from the label map.
///
/// Every exposed pixel side becomes one directed edge with the region on
/// its left; stitching the edges yields outer loops and holes that wind in
/// opposite directions. In `stacked` mode, holes whose enclosed regions all
/// draw later than this region are dropped (the painter covers them).
pub fn trace_region(
    labels: &Array2<u32>,
    region: &Region,
    hierarchical: Hierarchical,
    order_of_region: &[u32],
) -> TraceResult<RegionContours> {
    let loops = extract_loops(labels, region)?;

    let mut outer = Vec::new();
    let mut holes = Vec::new();
    for points in loops {
        if signed_area_doubled(&points) < 0 {
            outer.push(points);
        } else {
            holes.push(points);
        }
    }
    if outer.is_empty() {
        return Err(TraceError::Geometry(format!(
            "region {} produced no outer boundary",
            region.id
        )));
    }

    if hierarchical == Hierarchical::Stacked && !holes.is_empty() {
        let enclosure = analyze_enclosure(labels, region);
        let own_order = order_of_region[region.id as usize];
        holes.retain(|hole| {
            match enclosure.labels_inside(hole) {
                // Keep the hole unless everything inside paints over us.
                Some(inside) => inside
                    .iter()
                    .any(|&label| order_of_region[label as usize] <= own_order),
                None => true,
            }
        });
    }

    Ok(RegionContours { outer, holes })
}

/// Fallback geometry for a region whose trace failed: its bounding box as a
/// single outer loop.
pub fn bounds_contour(region: &Region) -> RegionContours {
    let b = &region.bounds;
    let (x0, y0) = (b.min_x as u32, b.min_y as u32);
    let (x1, y1) = (b.max_x as u32 + 1, b.max_y as u32 + 1);
    RegionContours {
        outer: vec![vec![(x0, y0), (x0, y1), (x1, y1), (x1, y0)]],
        holes: Vec::new(),
    }
}

/// Twice the shoelace signed area; outer loops are negative under the
/// region-on-left edge convention.
fn signed_area_doubled(points: &[(u32, u32)]) -> i64 {
    let n = points.len();
    let mut sum = 0i64;
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        sum += i64::from(x0) * i64::from(y1) - i64::from(x1) * i64::from(y0);
    }
    sum
}

fn in_region(labels: &Array2<u32>, id: u32, x: i64, y: i64) -> bool {
    let (h, w) = labels.dim();
    x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h && labels[[y as usize, x as usize]] == id
}

/// Collect and stitch the region's directed boundary edges into loops.
fn extract_loops(labels: &Array2<u32>, region: &Region) -> TraceResult<Vec<Contour>> {
    // Outgoing-direction bitmask per lattice vertex.
    let mut outgoing: HashMap<(u32, u32), u8> = HashMap::new();
    let mut starts: Vec<(u32, u32, u8)> = Vec::new();
    let mut add_edge = |x: u32, y: u32, dir: u8, starts: &mut Vec<(u32, u32, u8)>| {
        *outgoing.entry((x, y)).or_insert(0) |= 1 << dir;
        starts.push((x, y, dir));
    };

    let b = &region.bounds;
    for y in b.min_y..=b.max_y {
        for x in b.min_x..=b.max_x {
            if labels[[y, x]] != region.id {
                continue;
            }
            let (xi, yi) = (x as i64, y as i64);
            let (xu, yu) = (x as u32, y as u32);
            if !in_region(labels, region.id, xi, yi - 1) {
                add_edge(xu + 1, yu, 2, &mut starts);
            }
            if !in_region(labels, region.id, xi, yi + 1) {
                add_edge(xu, yu + 1, 0, &mut starts);
            }
            if !in_region(labels, region.id, xi - 1, yi) {
                add_edge(xu, yu, 1, &mut starts);
            }
            if !in_region(labels, region.id, xi + 1, yi) {
                add_edge(xu + 1, yu + 1, 3, &mut starts);
            }
        }
    }

    // Deterministic loop discovery order.
    starts.sort_by_key(|&(x, y, dir)| (y, x, dir));
    let total_edges = starts.len();
    let mut used: HashMap<(u32, u32), u8> = HashMap::new();
    let mut loops = Vec::new();
    let mut consumed = 0usize;

    for &(sx, sy, sdir) in &starts {
        if used.get(&(sx, sy)).copied().unwrap_or(0) & (1 << sdir) != 0 {
            continue;
        }
        let start = (sx, sy, sdir);
        let mut cur = start;
        let mut points: Contour = Vec::new();
        let mut steps = 0usize;

        loop {
            *used.entry((cur.0, cur.1)).or_insert(0) |= 1 << cur.2;
            consumed += 1;
            points.push((cur.0, cur.1));

            let nx = i64::from(cur.0) + DX[cur.2 as usize];
            let ny = i64::from(cur.1) + DY[cur.2 as usize];
            let next = (nx as u32, ny as u32);
            let available = outgoing.get(&next).copied().unwrap_or(0);
            // Tightest left turn first so touching loops never cross.
            let out_dir = [left(cur.2), cur.2, right(cur.2)]
                .into_iter()
                .find(|&d| available & (1 << d) != 0)
                .ok_or_else(|| {
                    TraceError::Geometry(format!(
                        "open boundary at ({}, {}) in region {}",
                        next.0, next.1, region.id
                    ))
                })?;

            cur = (next.0, next.1, out_dir);
            if cur == start {
                break;
            }
            if used.get(&next).copied().unwrap_or(0) & (1 << out_dir) != 0 {
                return Err(TraceError::Geometry(format!(
                    "boundary walk revisited edge at ({}, {}) in region {}",
                    next.0, next.1, region.id
                )));
            }
            steps += 1;
            if steps > total_edges {
                return Err(TraceError::Geometry(format!(
                    "boundary walk did not close in region {}",
                    region.id
                )));
            }
        }

        if points.len() < 4 {
            return Err(TraceError::Geometry(format!(
                "degenerate loop of {} points in region {}",
                points.len(),
                region.id
            )));
        }
        loops.push(points);
    }

    if consumed != total_edges {
        return Err(TraceError::Geometry(format!(
            "{} boundary edges left unconsumed in region {}",
            total_edges - consumed,
            region.id
        )));
    }

    Ok(loops)
}

/// Which regions sit inside each of a region's enclosed cavities.
struct Enclosure {
    /// Component index per cell of the padded bounding box, -1 when the
    /// cell is outside every cavity.
    component: Array2<i32>,
    labels_of_component: Vec<Vec<u32>>,
    offset: (i64, i64),
}

impl Enclosure {
    /// The region labels inside the cavity a hole loop bounds, located via
    /// the cell on the interior side of the loop's first edge.
    fn labels_inside(&self, hole: &Contour) -> Option<&Vec<u32>> {
        let (x0, y0) = hole[0];
        let (x1, y1) = hole[1];
        let dir = (0..4u8).find(|&d| {
            i64::from(x0) + DX[d as usize] == i64::from(x1)
                && i64::from(y0) + DY[d as usize] == i64::from(y1)
        })?;
        // Hole interiors lie on the right of the directed edge.
        let r = right(dir) as usize;
        let cx = (2 * i64::from(x0) + DX[dir as usize] + DX[r] - 1) / 2;
        let cy = (2 * i64::from(y0) + DY[dir as usize] + DY[r] - 1) / 2;

        let lx = cx - self.offset.0;
        let ly = cy - self.offset.1;
        let (lh, lw) = self.component.dim();
        if lx < 0 || ly < 0 || lx as usize >= lw || ly as usize >= lh {
            return None;
        }
        let comp = self.component[[ly as usize, lx as usize]];
        if comp < 0 {
            return None;
        }
        Some(&self.labels_of_component[comp as usize])
    }
}

/// Flood the complement of the region inside its padded bounding box; the
/// unreached cells are the enclosed cavities, grouped into components with
/// the region labels found in each.
fn analyze_enclosure(labels: &Array2<u32>, region: &Region) -> Enclosure {
    let (h, w) = labels.dim();
    let b = &region.bounds;
    let lw = b.width() + 2;
    let lh = b.height() + 2;
    let offset = (b.min_x as i64 - 1, b.min_y as i64 - 1);

    let is_region = |lx: usize, ly: usize| {
        let gx = lx as i64 + offset.0;
        let gy = ly as i64 + offset.1;
        gx >= 0
            && gy >= 0
            && (gx as usize) < w
            && (gy as usize) < h
            && labels[[gy as usize, gx as usize]] == region.id
    };

    // Everything connected to the padding border is outside.
    let mut visited = Array2::<bool>::from_elem((lh, lw), false);
    let mut queue = VecDeque::new();
    for lx in 0..lw {
        for ly in [0, lh - 1] {
            if !visited[[ly, lx]] && !is_region(lx, ly) {
                visited[[ly, lx]] = true;
                queue.push_back((lx, ly));
            }
        }
    }
    for ly in 0..lh {
        for lx in [0, lw - 1] {
            if !visited[[ly, lx]] && !is_region(lx, ly) {
                visited[[ly, lx]] = true;
                queue.push_back((lx, ly));
            }
        }
    }
    while let Some((lx, ly)) = queue.pop_front() {
        for (nx, ny) in local_neighbors(lx, ly, lw, lh) {
            if !visited[[ny, nx]] && !is_region(nx, ny) {
                visited[[ny, nx]] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    // Remaining non-region cells are enclosed; group them into cavities.
    let mut component = Array2::<i32>::from_elem((lh, lw), -1);
    let mut labels_of_component: Vec<Vec<u32>> = Vec::new();
    for ly in 0..lh {
        for lx in 0..lw {
            if visited[[ly, lx]] || is_region(lx, ly) || component[[ly, lx]] >= 0 {
                continue;
            }
            let id = labels_of_component.len() as i32;
            let mut found: Vec<u32> = Vec::new();
            component[[ly, lx]] = id;
            queue.push_back((lx, ly));
            while let Some((cx, cy)) = queue.pop_front() {
                let gx = (cx as i64 + offset.0) as usize;
                let gy = (cy as i64 + offset.1) as usize;
                let label = labels[[gy, gx]];
                if !found.contains(&label) {
                    found.push(label);
                }
                for (nx, ny) in local_neighbors(cx, cy, lw, lh) {
                    if !visited[[ny, nx]]
                        && component[[ny, nx]] < 0
                        && !is_region(nx, ny)
                    {
                        component[[ny, nx]] = id;
                        queue.push_back((nx, ny));
                    }
                }
            }
            labels_of_component.push(found);
        }
    }

    Enclosure {
        component,
        labels_of_component,
        offset,
    }
}

fn local_neighbors(x: usize, y: usize, w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
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
