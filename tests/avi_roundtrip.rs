use cv_funset::video::{AviReader, AviWriter, FourCc, VideoCapture};
use image::{DynamicImage, Rgb, RgbImage};

fn frame(width: u32, height: u32, shade: u8) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 20) as u8, (y * 30) as u8, shade])
    })
}

#[test]
fn raw_frames_come_back_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clips/raw.avi");
    let frames: Vec<_> = (0..3).map(|i| frame(7, 5, i * 80)).collect();

    let mut writer = AviWriter::create(&path, FourCc::RAW, 10.0, (7, 5), true, 90).unwrap();
    for f in &frames {
        writer.write(&DynamicImage::ImageRgb8(f.clone())).unwrap();
    }
    writer.finish().unwrap();
    assert!(!writer.is_opened());

    let mut reader = AviReader::open(&path).unwrap();
    assert_eq!(reader.frame_size(), (7, 5));
    assert_eq!(reader.frame_count(), 3);
    assert_eq!(reader.fourcc(), FourCc::RAW);
    assert!((reader.fps() - 10.0).abs() < 1e-9);

    for expected in &frames {
        let got = reader.read().unwrap().expect("frame");
        assert_eq!(&got, expected);
    }
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn mjpg_frames_keep_their_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mjpg.avi");

    {
        let mut writer = AviWriter::create(&path, FourCc::MJPG, 25.0, (32, 24), true, 95).unwrap();
        for i in 0..4 {
            writer.write(&DynamicImage::ImageRgb8(frame(32, 24, i * 50))).unwrap();
        }
        assert_eq!(writer.frame_count(), 4);
        // Dropping finishes the file.
    }

    let mut reader = AviReader::open(&path).unwrap();
    assert_eq!(reader.fourcc(), FourCc::MJPG);
    let mut count = 0;
    while let Some(f) = reader.read().unwrap() {
        assert_eq!(f.dimensions(), (32, 24));
        count += 1;
    }
    assert_eq!(count, 4);
}

#[test]
fn wrong_frame_size_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.avi");
    let mut writer = AviWriter::create(&path, FourCc::MJPG, 25.0, (16, 16), true, 90).unwrap();
    let err = writer
        .write(&DynamicImage::ImageRgb8(frame(8, 8, 0)))
        .unwrap_err();
    assert!(err.to_string().contains("8x8"));
}

#[test]
fn truncated_file_is_a_video_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.avi");
    {
        let mut writer = AviWriter::create(&path, FourCc::RAW, 5.0, (4, 4), true, 90).unwrap();
        writer.write(&DynamicImage::ImageRgb8(frame(4, 4, 1))).unwrap();
    }
    let bytes = std::fs::read(&path).unwrap();
    let cut = bytes[..bytes.len() / 2].to_vec();
    assert!(AviReader::from_bytes(cut).is_err());
}
