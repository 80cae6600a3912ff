//! Frame sources: where raw RGB captures come from.

use crate::error::FrameError;
use runvision_core::ColorImage;

#[cfg(feature = "image")]
use std::path::{Path, PathBuf};

/// Blocking frame acquisition, one call per cycle.
pub trait FrameSource {
    fn capture(&mut self) -> Result<ColorImage, FrameError>;
}

impl<T: FrameSource + ?Sized> FrameSource for &mut T {
    fn capture(&mut self) -> Result<ColorImage, FrameError> {
        (**self).capture()
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn capture(&mut self) -> Result<ColorImage, FrameError> {
        (**self).capture()
    }
}

/// In-memory source. `None` entries simulate a device that is not ready.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    frames: Vec<Option<ColorImage>>,
    cursor: usize,
    looping: bool,
}

impl MemorySource {
    pub fn new(frames: Vec<ColorImage>) -> Self {
        Self {
            frames: frames.into_iter().map(Some).collect(),
            cursor: 0,
            looping: false,
        }
    }

    /// Restart from the first frame instead of reporting exhaustion.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn push(&mut self, frame: ColorImage) {
        self.frames.push(Some(frame));
    }

    pub fn push_fault(&mut self) {
        self.frames.push(None);
    }

    /// Number of captures served so far in the current pass.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl FrameSource for MemorySource {
    fn capture(&mut self) -> Result<ColorImage, FrameError> {
        if self.cursor >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return Err(FrameError::Exhausted);
            }
            self.cursor = 0;
        }
        let slot = &self.frames[self.cursor];
        self.cursor += 1;
        slot.clone()
            .ok_or_else(|| FrameError::Unavailable(format!("frame {}", self.cursor - 1)))
    }
}

#[cfg(feature = "image")]
const SEQUENCE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "ppm"];

/// Directory of still images played back in file-name order.
#[cfg(feature = "image")]
#[derive(Clone, Debug)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    looping: bool,
}

#[cfg(feature = "image")]
impl ImageSequenceSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FrameError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| FrameError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| FrameError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let known = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| SEQUENCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if known && path.is_file() {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(FrameError::Empty(dir.to_path_buf()));
        }
        paths.sort();
        log::info!("frame sequence {}: {} images", dir.display(), paths.len());

        Ok(Self {
            paths,
            cursor: 0,
            looping: false,
        })
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(feature = "image")]
impl FrameSource for ImageSequenceSource {
    fn capture(&mut self) -> Result<ColorImage, FrameError> {
        if self.cursor >= self.paths.len() {
            if !self.looping {
                return Err(FrameError::Exhausted);
            }
            self.cursor = 0;
        }
        let path = &self.paths[self.cursor];
        self.cursor += 1;
        crate::imageio::load_color_image(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_reports_faults_and_exhaustion() {
        let mut src = MemorySource::new(vec![ColorImage::new(4, 3)]);
        src.push_fault();
        assert!(src.capture().is_ok());
        assert!(matches!(src.capture(), Err(FrameError::Unavailable(_))));
        assert!(matches!(src.capture(), Err(FrameError::Exhausted)));
    }

    #[test]
    fn looping_memory_source_wraps() {
        let mut src = MemorySource::new(vec![ColorImage::filled(2, 2, [1, 2, 3])]).looping(true);
        for _ in 0..5 {
            assert_eq!(src.capture().unwrap().pixel(0, 0), [1, 2, 3]);
        }
        let mut empty = MemorySource::default().looping(true);
        assert!(matches!(empty.capture(), Err(FrameError::Exhausted)));
    }

    #[cfg(feature = "image")]
    #[test]
    fn image_sequence_is_sorted_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        for (name, v) in [("b.png", 20u8), ("a.png", 10), ("c.png", 30)] {
            let img = image::RgbImage::from_pixel(3, 2, image::Rgb([v, v, v]));
            img.save(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let mut src = ImageSequenceSource::open(dir.path()).unwrap();
        assert_eq!(src.len(), 3);
        let firsts: Vec<u8> = (0..3).map(|_| src.capture().unwrap().pixel(0, 0)[0]).collect();
        assert_eq!(firsts, vec![10, 20, 30]);
        assert!(matches!(src.capture(), Err(FrameError::Exhausted)));
    }

    #[cfg(feature = "image")]
    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageSequenceSource::open(dir.path()).unwrap_err();
        assert!(matches!(err, FrameError::Empty(_)));
        assert!(err.is_fatal());
    }
}
