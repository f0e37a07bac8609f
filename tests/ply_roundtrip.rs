//! End-to-end codec tests on real files.

use polyscan::{read_ply, PlyWriter, Rgb, ScanError, Vertex};
use tempfile::tempdir;

fn sample_vertices(n: usize) -> Vec<Vertex> {
    (0..n)
        .map(|i| {
            Vertex::new(
                i as f64 * 0.25,
                -(i as f64) * 1.5 + 0.125,
                (i as f64).sqrt(),
            )
        })
        .collect()
}

fn sample_colors(n: usize) -> Vec<Rgb> {
    (0..n)
        .map(|i| Rgb::new((i * 7 % 256) as u8, (i * 31 % 256) as u8, (255 - i % 256) as u8))
        .collect()
}

fn assert_colors_close(written: &[Rgb], read: &[Rgb]) {
    assert_eq!(written.len(), read.len());
    for (w, r) in written.iter().zip(read) {
        // One intensity step of slack for gamma quantization.
        assert!((w.r as i16 - r.r as i16).abs() <= 1, "{w:?} vs {r:?}");
        assert!((w.g as i16 - r.g as i16).abs() <= 1, "{w:?} vs {r:?}");
        assert!((w.b as i16 - r.b as i16).abs() <= 1, "{w:?} vs {r:?}");
    }
}

#[test]
fn round_trip_with_integer_colors() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("cloud.ply");
    let vertices = sample_vertices(100);
    let colors = sample_colors(100);

    let mut writer = PlyWriter::new();
    let report = writer
        .write(&path, &vertices, Some(&colors), true)
        .expect("write");
    assert!(report.colors_written);
    assert!(!report.colors_dropped);

    let cloud = read_ply(&path).expect("read");
    assert_eq!(cloud.vertices, vertices);
    assert_colors_close(&colors, &cloud.colors.expect("colors"));
}

#[test]
fn round_trip_with_float_colors() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("cloud_float.ply");
    let vertices = sample_vertices(64);
    let colors = sample_colors(64);

    let mut writer = PlyWriter::new();
    writer
        .write(&path, &vertices, Some(&colors), false)
        .expect("write");

    let cloud = read_ply(&path).expect("read");
    assert_eq!(cloud.vertices, vertices);
    assert_colors_close(&colors, &cloud.colors.expect("colors"));
}

#[test]
fn round_trip_without_colors() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bare.ply");
    let vertices = sample_vertices(10);

    let mut writer = PlyWriter::new();
    let report = writer.write(&path, &vertices, None, true).expect("write");
    assert!(!report.colors_written);
    assert!(!report.colors_dropped);

    let cloud = read_ply(&path).expect("read");
    assert_eq!(cloud.vertices, vertices);
    assert!(cloud.colors.is_none());
}

#[test]
fn round_trip_empty_cloud() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("empty.ply");

    let mut writer = PlyWriter::new();
    writer.write(&path, &[], Some(&[]), true).expect("write");

    let cloud = read_ply(&path).expect("read");
    assert!(cloud.is_empty());
}

#[test]
fn mismatched_color_count_drops_colors() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("mismatch.ply");
    let vertices = sample_vertices(5);
    let colors = sample_colors(3);

    let mut writer = PlyWriter::new();
    let report = writer
        .write(&path, &vertices, Some(&colors), true)
        .expect("write");
    assert!(!report.colors_written);
    assert!(report.colors_dropped);

    let content = std::fs::read_to_string(&path).expect("read back");
    assert!(!content.contains("property uchar red"));

    // Vertices alone still round-trip.
    let cloud = read_ply(&path).expect("read");
    assert_eq!(cloud.vertices, vertices);
    assert!(cloud.colors.is_none());
}

#[test]
fn last_written_survives_failed_write() {
    let dir = tempdir().expect("tempdir");
    let good = dir.path().join("good.ply");
    let vertices = sample_vertices(2);

    let mut writer = PlyWriter::new();
    writer.write(&good, &vertices, None, true).expect("write");
    assert_eq!(writer.last_written(), Some(good.as_path()));

    let bad = dir.path().join("missing").join("bad.ply");
    let err = writer.write(&bad, &vertices, None, true).unwrap_err();
    assert!(matches!(err, ScanError::DirectoryMissing(_)));

    // The failed write leaves the previous result in place.
    assert_eq!(writer.last_written(), Some(good.as_path()));
}

#[test]
fn declared_count_drives_the_read() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("extra.ply");
    let vertices = sample_vertices(3);

    let mut writer = PlyWriter::new();
    writer.write(&path, &vertices, None, true).expect("write");

    // Junk after the declared data lines is ignored.
    let mut content = std::fs::read_to_string(&path).expect("read back");
    content.push_str("this line is not part of the cloud\n");
    std::fs::write(&path, content).expect("rewrite");

    let cloud = read_ply(&path).expect("read");
    assert_eq!(cloud.len(), 3);
}
