//! Clustering and principal component demos.

use image::DynamicImage;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{DemoContext, DemoReport};
use crate::cluster::{self, KMeansInit, TermCriteria};
use crate::error::Result;
use crate::fixtures::PCA_SHAPES;
use crate::imgproc::contours::{
    CONTOUR_COLOR, contour_area, draw_contour, draw_orientation, find_contours, orientation,
};
use crate::imgproc::threshold::{ThresholdType, threshold};
use crate::imgproc::to_gray;
use crate::plot::{CLUSTER_COLORS, render_clusters};

const CANVAS: u32 = 500;
const MAX_CLUSTERS: usize = 5;
const MAX_SAMPLES: usize = 1000;
const BLOB_SIGMA: f64 = 0.05;
const ATTEMPTS: usize = 3;

const MIN_AREA: f64 = 1e2;
const MAX_AREA: f64 = 1e5;

/// Clusters random Gaussian blobs once per configured round.
pub fn kmeans(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("kmeans");
    let mut rng = StdRng::seed_from_u64(ctx.config.kmeans_seed);

    for round in 0..ctx.config.kmeans_rounds {
        let samples = rng.gen_range(1..=MAX_SAMPLES);
        let clusters = rng.gen_range(2..=MAX_CLUSTERS).min(samples);

        let points =
            cluster::sample_gaussian_blobs(&mut rng, samples, clusters, CANVAS, CANVAS, BLOB_SIGMA)?;
        let data = cluster::points_to_matrix(&points);
        let result = cluster::kmeans(
            &data,
            clusters,
            TermCriteria::new(10, 1.0),
            ATTEMPTS,
            KMeansInit::PlusPlus,
            &mut rng,
        )?;

        let canvas = render_clusters(CANVAS, CANVAS, &points, &result.labels, &CLUSTER_COLORS)?;
        ctx.save(
            &mut report,
            &format!("kmeans_round_{round}.png"),
            &DynamicImage::ImageRgb8(canvas),
        )?;
        report.line(format!(
            "round {round}: {samples} samples, {clusters} clusters, compactness {:.3}",
            result.compactness
        ));
    }
    Ok(report)
}

/// Finds the principal axes of every mid-sized blob in the shapes image.
pub fn pca(ctx: &DemoContext) -> Result<DemoReport> {
    let mut report = DemoReport::new("pca");
    let mut src = ctx.load_rgb(PCA_SHAPES)?;
    let gray = to_gray(&src)?;
    let (level, binary) = threshold(&gray, 50.0, 255.0, ThresholdType::Binary, true)?;
    debug!("pca: binarized at {level}");

    for (i, contour) in find_contours(&binary).iter().enumerate() {
        let area = contour_area(contour);
        if !(MIN_AREA..=MAX_AREA).contains(&area) {
            continue;
        }
        draw_contour(&mut src, contour, CONTOUR_COLOR);
        let o = orientation(contour)?;
        draw_orientation(&mut src, &o);
        report.line(format!(
            "contour {i}: area {area:.1}, center ({:.1}, {:.1}), angle {:.2} deg",
            o.center.x,
            o.center.y,
            o.angle.to_degrees()
        ));
    }

    ctx.save(&mut report, "pca_output.png", &DynamicImage::ImageRgb8(src))?;
    Ok(report)
}
