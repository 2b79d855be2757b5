//! One function per demo, plus the registry the CLI dispatches through.
//!
//! Every demo reads its fixed input from the images directory, runs one or
//! two operations and returns a [`DemoReport`] with the values it computed
//! and the files it wrote.

pub mod clustering;
pub mod color;
pub mod filtering;
pub mod io;
pub mod matrix;
pub mod transform;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use clap::builder::PossibleValue;
use image::{DynamicImage, GrayImage, RgbImage};
use log::{debug, warn};

use crate::codec::{ReadMode, imread, imwrite};
use crate::config::DemoConfig;
use crate::error::{FunsetError, Result};

/// What a demo computed and where it put its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoReport {
    pub demo: &'static str,
    pub lines: Vec<String>,
    pub written: Vec<PathBuf>,
}

impl DemoReport {
    pub fn new(demo: &'static str) -> Self {
        Self {
            demo,
            lines: Vec::new(),
            written: Vec::new(),
        }
    }

    pub fn line(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!("{}: {line}", self.demo);
        self.lines.push(line);
    }
}

/// The demo name, each printed line, then one `wrote` line per artifact.
impl fmt::Display for DemoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {}", self.demo)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        for path in &self.written {
            writeln!(f, "wrote {}", path.display())?;
        }
        Ok(())
    }
}

/// Shared, read-only inputs for a demo run.
#[derive(Debug, Clone, Default)]
pub struct DemoContext {
    pub config: DemoConfig,
}

impl DemoContext {
    pub fn new(config: DemoConfig) -> Self {
        Self { config }
    }

    pub fn input(&self, name: &str) -> PathBuf {
        self.config.image_path(name)
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.config.output_path(name)
    }

    pub fn load_rgb(&self, name: &str) -> Result<RgbImage> {
        Ok(imread(&self.input(name), ReadMode::Color)?.to_rgb8())
    }

    pub fn load_gray(&self, name: &str) -> Result<GrayImage> {
        Ok(imread(&self.input(name), ReadMode::Grayscale)?.to_luma8())
    }

    /// Writes `img` into the output directory and records it on the report.
    pub fn save(&self, report: &mut DemoReport, name: &str, img: &DynamicImage) -> Result<PathBuf> {
        let path = self.output(name);
        imwrite(&path, img, self.config.jpeg_quality)?;
        debug!("saved {}", path.display());
        report.written.push(path.clone());
        Ok(path)
    }
}

/// Every demo the crate ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Demo {
    Kmeans,
    Laplacian,
    Pca,
    CalcCovar,
    MeanStdDev,
    Trace,
    PseudoInverse,
    Svd,
    Eigen,
    Norm,
    Inverse,
    Determinant,
    ReadWriteVideo,
    EncodeDecode,
    Resize,
    CvtColor,
    Split,
    Merge,
    WarpAffine,
    Remap,
    Rotate,
    WarpPerspective,
    Dilate,
    Erode,
    MorphologyEx,
    Threshold,
    Transpose,
    Flip,
    Dft,
    Filter2d,
}

impl Demo {
    pub const ALL: [Demo; 30] = [
        Demo::Kmeans,
        Demo::Laplacian,
        Demo::Pca,
        Demo::CalcCovar,
        Demo::MeanStdDev,
        Demo::Trace,
        Demo::PseudoInverse,
        Demo::Svd,
        Demo::Eigen,
        Demo::Norm,
        Demo::Inverse,
        Demo::Determinant,
        Demo::ReadWriteVideo,
        Demo::EncodeDecode,
        Demo::Resize,
        Demo::CvtColor,
        Demo::Split,
        Demo::Merge,
        Demo::WarpAffine,
        Demo::Remap,
        Demo::Rotate,
        Demo::WarpPerspective,
        Demo::Dilate,
        Demo::Erode,
        Demo::MorphologyEx,
        Demo::Threshold,
        Demo::Transpose,
        Demo::Flip,
        Demo::Dft,
        Demo::Filter2d,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Demo::Kmeans => "kmeans",
            Demo::Laplacian => "laplacian",
            Demo::Pca => "pca",
            Demo::CalcCovar => "calc_covar",
            Demo::MeanStdDev => "mean_std_dev",
            Demo::Trace => "trace",
            Demo::PseudoInverse => "pseudo_inverse",
            Demo::Svd => "svd",
            Demo::Eigen => "eigen",
            Demo::Norm => "norm",
            Demo::Inverse => "inverse",
            Demo::Determinant => "determinant",
            Demo::ReadWriteVideo => "read_write_video",
            Demo::EncodeDecode => "encode_decode",
            Demo::Resize => "resize",
            Demo::CvtColor => "cvt_color",
            Demo::Split => "split",
            Demo::Merge => "merge",
            Demo::WarpAffine => "warp_affine",
            Demo::Remap => "remap",
            Demo::Rotate => "rotate",
            Demo::WarpPerspective => "warp_perspective",
            Demo::Dilate => "dilate",
            Demo::Erode => "erode",
            Demo::MorphologyEx => "morphology_ex",
            Demo::Threshold => "threshold",
            Demo::Transpose => "transpose",
            Demo::Flip => "flip",
            Demo::Dft => "dft",
            Demo::Filter2d => "filter2d",
        }
    }

    pub fn run(self, ctx: &DemoContext) -> Result<DemoReport> {
        debug!("running demo {}", self.name());
        match self {
            Demo::Kmeans => clustering::kmeans(ctx),
            Demo::Laplacian => filtering::laplacian(ctx),
            Demo::Pca => clustering::pca(ctx),
            Demo::CalcCovar => matrix::calc_covar(ctx),
            Demo::MeanStdDev => matrix::mean_std_dev(ctx),
            Demo::Trace => matrix::trace(ctx),
            Demo::PseudoInverse => matrix::pseudo_inverse(ctx),
            Demo::Svd => matrix::svd(ctx),
            Demo::Eigen => matrix::eigen(ctx),
            Demo::Norm => matrix::norm(ctx),
            Demo::Inverse => matrix::inverse(ctx),
            Demo::Determinant => matrix::determinant(ctx),
            Demo::ReadWriteVideo => io::read_write_video(ctx),
            Demo::EncodeDecode => io::encode_decode(ctx),
            Demo::Resize => transform::resize(ctx),
            Demo::CvtColor => color::cvt_color(ctx),
            Demo::Split => color::split(ctx),
            Demo::Merge => color::merge(ctx),
            Demo::WarpAffine => transform::warp_affine(ctx),
            Demo::Remap => transform::remap(ctx),
            Demo::Rotate => transform::rotate(ctx),
            Demo::WarpPerspective => transform::warp_perspective(ctx),
            Demo::Dilate => filtering::dilate(ctx),
            Demo::Erode => filtering::erode(ctx),
            Demo::MorphologyEx => filtering::morphology_ex(ctx),
            Demo::Threshold => filtering::threshold(ctx),
            Demo::Transpose => transform::transpose(ctx),
            Demo::Flip => transform::flip(ctx),
            Demo::Dft => filtering::dft(ctx),
            Demo::Filter2d => filtering::filter2d(ctx),
        }
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Demo {
    type Err = FunsetError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Demo::ALL
            .into_iter()
            .find(|d| d.name() == wanted)
            .ok_or_else(|| FunsetError::InvalidArgument(format!("unknown demo {s:?}")))
    }
}

impl ValueEnum for Demo {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(PossibleValue::new(self.name()))
    }
}

/// Runs `demos` in order, carrying on past failures.
pub fn run_demos(ctx: &DemoContext, demos: &[Demo]) -> Vec<(Demo, Result<DemoReport>)> {
    demos
        .iter()
        .map(|&demo| {
            let result = demo.run(ctx);
            if let Err(e) = &result {
                warn!("demo {demo} failed: {e}");
            }
            (demo, result)
        })
        .collect()
}

pub fn run_all(ctx: &DemoContext) -> Vec<(Demo, Result<DemoReport>)> {
    run_demos(ctx, &Demo::ALL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_parse_back() {
        let mut names: Vec<_> = Demo::ALL.iter().map(|d| d.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Demo::ALL.len());
        for demo in Demo::ALL {
            assert_eq!(demo.name().parse::<Demo>().unwrap(), demo);
        }
        assert_eq!("Warp-Affine".parse::<Demo>().unwrap(), Demo::WarpAffine);
        assert!("nope".parse::<Demo>().is_err());
    }

    #[test]
    fn saved_files_are_listed_once() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = DemoContext::new(DemoConfig {
            output_dir: dir.path().to_path_buf(),
            ..DemoConfig::default()
        });
        let mut report = DemoReport::new("flip");
        report.line("flipped around both axes");
        let img = DynamicImage::ImageLuma8(GrayImage::new(4, 3));
        let path = ctx.save(&mut report, "flip.png", &img).unwrap();
        assert!(path.exists());

        let text = report.to_string();
        assert_eq!(text.matches("wrote").count(), 1);
        assert_eq!(
            text,
            format!("== flip\nflipped around both axes\nwrote {}\n", path.display())
        );
    }

    #[test]
    fn value_enum_matches_names() {
        let parsed = <Demo as ValueEnum>::from_str("filter2d", false).unwrap();
        assert_eq!(parsed, Demo::Filter2d);
    }

    #[test]
    fn missing_input_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = DemoContext::new(DemoConfig {
            images_dir: dir.path().join("none"),
            output_dir: dir.path().join("out"),
            ..DemoConfig::default()
        });
        assert!(matches!(
            Demo::Laplacian.run(&ctx),
            Err(FunsetError::Read { .. })
        ));
    }
}
