use std::path::Path;

use cv_funset::demos::{self, Demo, DemoContext};
use cv_funset::fixtures::ensure_fixtures;
use cv_funset::{DemoConfig, FunsetError};

fn context(root: &Path) -> DemoContext {
    let config = DemoConfig {
        images_dir: root.join("images"),
        output_dir: root.join("out"),
        kmeans_rounds: 2,
        video_frames: 3,
        video_width: 64,
        video_height: 48,
        remap_frames: 4,
        ..DemoConfig::default()
    };
    ensure_fixtures(&config.images_dir, config.jpeg_quality).expect("fixtures");
    DemoContext::new(config)
}

#[test]
fn every_demo_runs_on_generated_fixtures() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    for (demo, result) in demos::run_all(&ctx) {
        let report = result.unwrap_or_else(|e| panic!("{demo} failed: {e}"));
        assert_eq!(report.demo, demo.name());
        for path in &report.written {
            assert!(path.is_file(), "{demo} did not write {}", path.display());
            assert!(path.starts_with(dir.path().join("out")));
        }
    }
}

#[test]
fn video_demo_reports_both_frame_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let report = Demo::ReadWriteVideo.run(&ctx).unwrap();
    assert_eq!(
        report.lines,
        vec!["src frame size: (64, 48)".to_string(), "dst frame size: (64, 48)".to_string()]
    );
    assert_eq!(report.written.len(), 2);
}

#[test]
fn encode_decode_writes_three_identical_copies() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let report = Demo::EncodeDecode.run(&ctx).unwrap();
    let names: Vec<_> = report
        .written
        .iter()
        .filter_map(|p| p.file_name()?.to_str().map(str::to_owned))
        .collect();
    assert_eq!(names, ["1_1.jpg", "2_1.jpg", "2_2.jpg"]);
    assert_eq!(
        report.lines.last().map(String::as_str),
        Some("test image encode/decode, imread/imwrite finish")
    );
}

#[test]
fn kmeans_writes_one_plot_per_round() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let report = Demo::Kmeans.run(&ctx).unwrap();
    assert_eq!(report.written.len(), 2);
    assert!(report.written[1].ends_with("kmeans_round_1.png"));
    let plot = image::open(&report.written[0]).unwrap();
    assert_eq!((plot.width(), plot.height()), (500, 500));
}

#[test]
fn pca_finds_the_four_ellipses() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let report = Demo::Pca.run(&ctx).unwrap();
    assert_eq!(report.lines.len(), 4, "{:?}", report.lines);
    assert!(report.written[0].ends_with("pca_output.png"));
}

#[test]
fn demos_fail_cleanly_without_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = DemoContext::new(DemoConfig {
        images_dir: dir.path().join("empty"),
        output_dir: dir.path().join("out"),
        ..DemoConfig::default()
    });

    for demo in [Demo::Resize, Demo::Dft, Demo::ReadWriteVideo, Demo::EncodeDecode] {
        assert!(
            matches!(demo.run(&ctx), Err(FunsetError::Read { .. })),
            "{demo} should report the missing input"
        );
    }
    // Matrix demos need no files.
    assert!(Demo::Determinant.run(&ctx).is_ok());
}
