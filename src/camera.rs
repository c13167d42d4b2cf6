use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classifier::Detection;
use crate::error::ImageError;

const FRAME_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Camera feed backed by a directory of still frames.
///
/// Frames are served in file-name order and the feed wraps around when it
/// reaches the end, so a small directory of captures can drive the monitor
/// indefinitely.
pub struct CameraFeed {
    source_dir: PathBuf,
    frame_paths: Vec<PathBuf>,
    current_index: usize,
    flip_vertical: bool,
}

impl CameraFeed {
    /// Create a feed from every image file in `dir`.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding camera frames
    /// * `flip_vertical` - Whether to flip each frame vertically after loading
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be read
    /// - The directory holds no jpg, jpeg, png or bmp files
    pub fn from_dir(dir: impl AsRef<Path>, flip_vertical: bool) -> Result<Self, ImageError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| ImageError::SourceUnavailable {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut frame_paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_frame_file(path))
            .collect();
        frame_paths.sort();

        Self::from_paths(dir, frame_paths, flip_vertical)
    }

    /// Create a feed from an explicit list of frame files.
    pub fn from_paths(
        source_dir: impl Into<PathBuf>,
        frame_paths: Vec<PathBuf>,
        flip_vertical: bool,
    ) -> Result<Self, ImageError> {
        let source_dir = source_dir.into();
        if frame_paths.is_empty() {
            return Err(ImageError::NoFrames {
                path: source_dir.display().to_string(),
            });
        }

        debug!(
            "Camera feed {} has {} frame(s)",
            source_dir.display(),
            frame_paths.len()
        );

        Ok(Self {
            source_dir,
            frame_paths,
            current_index: 0,
            flip_vertical,
        })
    }

    /// Load the next frame and advance the feed.
    ///
    /// The feed advances even when decoding fails, so one bad file does not
    /// stall the monitor.
    pub fn next_frame(&mut self) -> Result<DynamicImage, ImageError> {
        let path = self.frame_paths[self.current_index].clone();
        self.current_index = (self.current_index + 1) % self.frame_paths.len();

        let frame = image::open(&path).map_err(|e| {
            warn!("Skipping unreadable frame {}: {}", path.display(), e);
            ImageError::ReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self::apply_image_transformations(frame, self.flip_vertical))
    }

    /// Apply configured transformations to a frame.
    pub fn apply_image_transformations(frame: DynamicImage, flip_vertical: bool) -> DynamicImage {
        if flip_vertical { frame.flipv() } else { frame }
    }

    /// Draw detection boxes onto a copy of the frame.
    ///
    /// Detection boxes are given as centre and size relative to the frame, so
    /// they are scaled to pixels here. Each box is drawn three pixels thick in
    /// yellow.
    pub fn annotate_frame(frame: &DynamicImage, detections: &[Detection]) -> RgbImage {
        let mut rgb_image = frame.to_rgb8();
        let (image_width, image_height) = rgb_image.dimensions();
        let yellow = Rgb([255, 255, 0]);

        for detection in detections {
            let center_x = detection.center_x() * image_width as f32;
            let center_y = detection.center_y() * image_height as f32;
            let width = detection.width() * image_width as f32;
            let height = detection.height() * image_height as f32;

            let x = (center_x - width / 2.0).max(0.0) as i32;
            let y = (center_y - height / 2.0).max(0.0) as i32;
            let w = width.max(1.0) as u32;
            let h = height.max(1.0) as u32;

            for thickness in 0..3 {
                let thick_x = x - thickness;
                let thick_y = y - thickness;
                if thick_x < 0 || thick_y < 0 {
                    continue;
                }

                let max_w = image_width.saturating_sub(thick_x as u32);
                let max_h = image_height.saturating_sub(thick_y as u32);
                let thick_w = (w + 2 * thickness as u32).min(max_w);
                let thick_h = (h + 2 * thickness as u32).min(max_h);
                if thick_w == 0 || thick_h == 0 {
                    continue;
                }

                let rect = Rect::at(thick_x, thick_y).of_size(thick_w, thick_h);
                draw_hollow_rect_mut(&mut rgb_image, rect, yellow);
            }
        }

        rgb_image
    }

    /// Save a frame as a timestamped JPEG in `output_dir` and return its path.
    pub fn save_snapshot(output_dir: &Path, frame: &RgbImage) -> Result<PathBuf, ImageError> {
        let save_failed = |path: &Path, reason: String| ImageError::SaveFailed {
            path: path.display().to_string(),
            reason,
        };

        fs::create_dir_all(output_dir).map_err(|e| save_failed(output_dir, e.to_string()))?;

        let filename = format!(
            "cat_sighting_{}.jpg",
            chrono::Local::now().format("%Y%m%d_%H%M%S_%3f")
        );
        let path = output_dir.join(filename);
        frame
            .save_with_format(&path, image::ImageFormat::Jpeg)
            .map_err(|e| save_failed(&path, e.to_string()))?;

        Ok(path)
    }

    pub fn get_source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn get_frame_paths(&self) -> &[PathBuf] {
        &self.frame_paths
    }

    /// Path of the frame `next_frame` will load.
    pub fn get_current_frame_path(&self) -> &Path {
        &self.frame_paths[self.current_index]
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
