//! Runtime configuration shared by every demo.
//!
//! Defaults reproduce the fixed parameters of the demos. A JSON file can
//! override any subset of fields; missing fields keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FunsetError, Result};

const IMAGES_DIR: &str = "test_images";
const OUTPUT_DIR: &str = "output";
const KMEANS_ROUNDS: usize = 3;
const KMEANS_SEED: u64 = 12345;
const JPEG_QUALITY: u8 = 95;
const VIDEO_FRAMES: usize = 50;
const MAX_VIDEO_FRAMES: usize = 100_000;
const VIDEO_FPS: f64 = 25.0;
const VIDEO_WIDTH: u32 = 640;
const VIDEO_HEIGHT: u32 = 480;
const REMAP_FRAMES: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Directory the demos read their input images from.
    pub images_dir: PathBuf,
    /// Directory every written artifact lands in.
    pub output_dir: PathBuf,
    pub kmeans_rounds: usize,
    pub kmeans_seed: u64,
    pub jpeg_quality: u8,
    /// Frames appended after the first one when writing demo videos.
    pub video_frames: usize,
    pub video_fps: f64,
    pub video_width: u32,
    pub video_height: u32,
    pub remap_frames: usize,
    /// Synthesize missing input images before running.
    pub generate_fixtures: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from(IMAGES_DIR),
            output_dir: PathBuf::from(OUTPUT_DIR),
            kmeans_rounds: KMEANS_ROUNDS,
            kmeans_seed: KMEANS_SEED,
            jpeg_quality: JPEG_QUALITY,
            video_frames: VIDEO_FRAMES,
            video_fps: VIDEO_FPS,
            video_width: VIDEO_WIDTH,
            video_height: VIDEO_HEIGHT,
            remap_frames: REMAP_FRAMES,
            generate_fixtures: true,
        }
    }
}

impl DemoConfig {
    /// Reads a JSON config file. Fields absent from the file keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: DemoConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.video_width == 0 || self.video_height == 0 {
            return Err(FunsetError::InvalidArgument(format!(
                "video size must be non-zero, got {}x{}",
                self.video_width, self.video_height
            )));
        }
        if !(self.video_fps.is_finite() && self.video_fps > 0.0) {
            return Err(FunsetError::InvalidArgument(format!(
                "video fps must be positive, got {}",
                self.video_fps
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(FunsetError::InvalidArgument(format!(
                "jpeg quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.video_frames > MAX_VIDEO_FRAMES {
            return Err(FunsetError::InvalidArgument(format!(
                "video_frames must be at most {MAX_VIDEO_FRAMES}, got {}",
                self.video_frames
            )));
        }
        if self.kmeans_rounds == 0 {
            return Err(FunsetError::InvalidArgument(
                "kmeans_rounds must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn image_path(&self, name: &str) -> PathBuf {
        self.images_dir.join(name)
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DemoConfig =
            serde_json::from_str(r#"{ "kmeans_rounds": 7, "images_dir": "imgs" }"#).unwrap();
        assert_eq!(config.kmeans_rounds, 7);
        assert_eq!(config.images_dir, PathBuf::from("imgs"));
        assert_eq!(config.output_dir, PathBuf::from(OUTPUT_DIR));
        assert_eq!(config.video_width, VIDEO_WIDTH);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = DemoConfig::default();
        assert!(config.validate().is_ok());
        config.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.video_fps = 0.0;
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.video_height = 0;
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.video_frames = usize::MAX;
        assert!(config.validate().is_err());
    }
}
