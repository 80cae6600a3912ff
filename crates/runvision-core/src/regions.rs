//! Connected foreground regions and their first-order moments.

use crate::{GrayImageView, MASK_BACKGROUND};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One 8-connected foreground component of a mask.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Zeroth moment `M00` (pixel count).
    pub area: u32,
    /// First moment `M10 = Σx`.
    pub m10: f64,
    /// First moment `M01 = Σy`.
    pub m01: f64,
    /// Inclusive bounding box `[min_x, min_y, max_x, max_y]`.
    pub bbox: [usize; 4],
}

impl Region {
    /// Centroid `(M10/M00, M01/M00)`, `None` for a zero-area region.
    pub fn centroid(&self) -> Option<Point2<f32>> {
        if self.area == 0 {
            return None;
        }
        let m00 = self.area as f64;
        Some(Point2::new(
            (self.m10 / m00) as f32,
            (self.m01 / m00) as f32,
        ))
    }
}

/// Label all 8-connected foreground components of `mask`.
///
/// Components are returned in raster order of their first pixel.
pub fn connected_components(mask: &GrayImageView<'_>) -> Vec<Region> {
    let (w, h) = (mask.width, mask.height);
    let mut visited = vec![false; w * h];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for start in 0..w * h {
        if visited[start] || mask.data[start] == MASK_BACKGROUND {
            continue;
        }

        let mut region = Region {
            area: 0,
            m10: 0.0,
            m01: 0.0,
            bbox: [usize::MAX, usize::MAX, 0, 0],
        };
        visited[start] = true;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            region.area += 1;
            region.m10 += x as f64;
            region.m01 += y as f64;
            region.bbox[0] = region.bbox[0].min(x);
            region.bbox[1] = region.bbox[1].min(y);
            region.bbox[2] = region.bbox[2].max(x);
            region.bbox[3] = region.bbox[3].max(y);

            for (dx, dy) in NEIGHBORS_8 {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if !visited[n] && mask.data[n] != MASK_BACKGROUND {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }

        regions.push(region);
    }

    regions
}

/// Largest component by area; the earliest one wins ties.
pub fn largest_region(mask: &GrayImageView<'_>) -> Option<Region> {
    connected_components(mask)
        .into_iter()
        .fold(None, |best: Option<Region>, r| match best {
            Some(b) if b.area >= r.area => Some(b),
            _ => Some(r),
        })
}

const NEIGHBORS_8: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
