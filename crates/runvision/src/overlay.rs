//! Optional visualization: the frame with the segmented color painted out
//! and the estimator outputs drawn on top. Purely observational.

use crate::error::SinkError;
use nalgebra::Point2;
use runvision_core::ColorImage;
use runvision_segment::{ColorRange, Frame, ScanResult};

#[cfg(feature = "image")]
use std::path::PathBuf;

pub const CENTROID_COLOR: [u8; 3] = [0, 255, 0];
pub const MARKER_COLOR: [u8; 3] = [0, 255, 255];
pub const HEADING_COLOR: [u8; 3] = [255, 0, 255];
pub const RAY_COLOR: [u8; 3] = [0, 255, 0];
pub const CURSOR_COLOR: [u8; 3] = [0, 255, 255];

/// Receives rendered overlays, one per cycle and window.
pub trait OverlaySink {
    fn show(&mut self, window: &str, image: &ColorImage) -> Result<(), SinkError>;
}

impl<T: OverlaySink + ?Sized> OverlaySink for &mut T {
    fn show(&mut self, window: &str, image: &ColorImage) -> Result<(), SinkError> {
        (**self).show(window, image)
    }
}

impl<T: OverlaySink + ?Sized> OverlaySink for Box<T> {
    fn show(&mut self, window: &str, image: &ColorImage) -> Result<(), SinkError> {
        (**self).show(window, image)
    }
}

/// Builder for one overlay image.
pub struct Overlay {
    image: ColorImage,
}

impl Overlay {
    /// Start from the raw frame with pixels inside `range` blacked out.
    pub fn painted_out(frame: &Frame, range: &ColorRange) -> Self {
        let mut image = frame.rgb.clone();
        if !range.is_empty() {
            for y in 0..frame.height() {
                for x in 0..frame.width() {
                    if range.contains(frame.hsv.pixel(x, y)) {
                        image.put_pixel(x, y, [0, 0, 0]);
                    }
                }
            }
        }
        Self { image }
    }

    fn marker_radius(&self) -> i64 {
        (self.image.height / 30).max(1) as i64
    }

    pub fn centroid(mut self, c: Option<Point2<f32>>, color: [u8; 3]) -> Self {
        if let Some(c) = c {
            let r = self.marker_radius();
            fill_disk(&mut self.image, c.x as i64, c.y as i64, r, color);
        }
        self
    }

    /// Rays from the bottom edge up to each boundary row, plus the heading dot
    /// on the middle row.
    pub fn scan(mut self, scan: &ScanResult) -> Self {
        let bottom = self.image.height as i64 - 1;
        for col in &scan.columns {
            for dx in 0..2 {
                vline(&mut self.image, col.x as i64 + dx, col.y as i64, bottom, RAY_COLOR);
            }
        }
        if let Some(h) = scan.heading {
            let r = self.marker_radius();
            let mid = self.image.height as i64 / 2;
            fill_disk(&mut self.image, h as i64, mid, r, HEADING_COLOR);
        }
        self
    }

    pub fn cursor(mut self, at: Point2<i32>, radius: usize) -> Self {
        ring(
            &mut self.image,
            at.x as i64,
            at.y as i64,
            radius as i64,
            2,
            CURSOR_COLOR,
        );
        self
    }

    pub fn finish(self) -> ColorImage {
        self.image
    }
}

fn put(img: &mut ColorImage, x: i64, y: i64, color: [u8; 3]) {
    if x >= 0 && y >= 0 && (x as usize) < img.width && (y as usize) < img.height {
        img.put_pixel(x as usize, y as usize, color);
    }
}

fn fill_disk(img: &mut ColorImage, cx: i64, cy: i64, r: i64, color: [u8; 3]) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn ring(img: &mut ColorImage, cx: i64, cy: i64, r: i64, thickness: i64, color: [u8; 3]) {
    let outer = r + thickness / 2;
    let inner = (r - thickness / 2).max(0);
    for dy in -outer..=outer {
        for dx in -outer..=outer {
            let d2 = dx * dx + dy * dy;
            if d2 <= outer * outer && d2 >= inner * inner {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn vline(img: &mut ColorImage, x: i64, y0: i64, y1: i64, color: [u8; 3]) {
    for y in y0.min(y1)..=y0.max(y1) {
        put(img, x, y, color);
    }
}

/// Counts frames per window without keeping them.
#[derive(Clone, Debug, Default)]
pub struct CountingOverlay {
    pub shown: Vec<(String, usize, usize)>,
}

impl OverlaySink for CountingOverlay {
    fn show(&mut self, window: &str, image: &ColorImage) -> Result<(), SinkError> {
        self.shown
            .push((window.to_string(), image.width, image.height));
        Ok(())
    }
}

/// Writes overlays as numbered PNG files, scaled by the display factor.
#[cfg(feature = "image")]
#[derive(Clone, Debug)]
pub struct PngOverlay {
    dir: PathBuf,
    scale: f32,
    counter: u64,
}

#[cfg(feature = "image")]
impl PngOverlay {
    pub fn create(dir: impl Into<PathBuf>, scale: f32) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            scale,
            counter: 0,
        })
    }
}

#[cfg(feature = "image")]
impl OverlaySink for PngOverlay {
    fn show(&mut self, window: &str, image: &ColorImage) -> Result<(), SinkError> {
        let name: String = window
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        let path = self.dir.join(format!("{name}_{:06}.png", self.counter));
        self.counter += 1;
        crate::imageio::save_color_image(image, &path, self.scale)
    }
}
