//! ASCII point-cloud reader.

use crate::color;
use crate::error::{Result, ScanError};
use crate::ply::{PointCloud, Rgb, Vertex};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// How vertex colors are stored in the file, decided by the first color
/// property line of the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ColorMode {
    /// No color properties; data lines carry positions only.
    None,
    /// `property uchar …`: colors stored as integers 0–255.
    Integer,
    /// `property float32 …`: colors stored as floats in `[0, 1]`.
    Float,
}

/// Reads a point cloud from `path`.
///
/// The header must match the writer's grammar line for line; any deviation
/// fails with [`ScanError::Format`] carrying the offending line. A data
/// section shorter than the declared vertex count is also a format error.
/// A missing or unreadable file surfaces as [`ScanError::Io`].
///
/// Colors, when present, are normalized to `[0, 1]` (dividing by 255 for
/// integer files) and gamma-decoded back to stored 8-bit intensities.
pub fn read_ply(path: impl AsRef<Path>) -> Result<PointCloud> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    expect_line(&mut lines, "ply", "first line must be \"ply\"")?;
    expect_line(
        &mut lines,
        "format ascii 1.0",
        "format line must be \"format ascii 1.0\"",
    )?;
    let vertex_count = parse_vertex_count(&next_line(&mut lines)?)?;
    expect_line(&mut lines, "property float32 x", "expected x property")?;
    expect_line(&mut lines, "property float32 y", "expected y property")?;
    expect_line(&mut lines, "property float32 z", "expected z property")?;

    // The line after the position properties decides the color mode. In a
    // colorless file it is already the header terminator.
    let line = next_line(&mut lines)?;
    let mode = match line.as_str() {
        "property uchar red" => ColorMode::Integer,
        "property float32 red" => ColorMode::Float,
        "end_header" => ColorMode::None,
        other => {
            return Err(ScanError::format(
                other,
                "expected a red color property or \"end_header\"",
            ))
        }
    };
    if mode != ColorMode::None {
        // Green and blue property lines are consumed without inspection;
        // the writer grammar fixes their content.
        next_line(&mut lines)?;
        next_line(&mut lines)?;
        expect_line(&mut lines, "end_header", "expected \"end_header\"")?;
    }

    let mut vertices = Vec::with_capacity(vertex_count);
    let mut colors = Vec::with_capacity(if mode == ColorMode::None {
        0
    } else {
        vertex_count
    });

    for _ in 0..vertex_count {
        let line = match lines.next().transpose()? {
            Some(line) => line,
            None => {
                return Err(ScanError::format(
                    "",
                    format!(
                        "file ends before the declared {} vertices",
                        vertex_count
                    ),
                ))
            }
        };
        let fields: Vec<&str> = line.split(' ').collect();
        vertices.push(Vertex {
            x: parse_field(&line, &fields, 0)?,
            y: parse_field(&line, &fields, 1)?,
            z: parse_field(&line, &fields, 2)?,
        });
        if mode != ColorMode::None {
            colors.push(parse_color(&line, &fields, mode)?);
        }
    }

    debug!(
        "read {} vertices ({} colors) from {}",
        vertices.len(),
        colors.len(),
        path.display()
    );

    Ok(PointCloud {
        vertices,
        colors: if mode == ColorMode::None {
            None
        } else {
            Some(colors)
        },
    })
}

fn next_line(lines: &mut impl Iterator<Item = std::io::Result<String>>) -> Result<String> {
    match lines.next().transpose()? {
        Some(line) => Ok(line),
        None => Err(ScanError::format("", "unexpected end of file in header")),
    }
}

fn expect_line(
    lines: &mut impl Iterator<Item = std::io::Result<String>>,
    expected: &str,
    reason: &str,
) -> Result<()> {
    let line = next_line(lines)?;
    if line != expected {
        return Err(ScanError::format(line, reason));
    }
    Ok(())
}

fn parse_vertex_count(line: &str) -> Result<usize> {
    let fields: Vec<&str> = line.split(' ').collect();
    if fields.len() != 3 || fields[0] != "element" || fields[1] != "vertex" {
        return Err(ScanError::format(line, "expected \"element vertex <N>\""));
    }
    fields[2]
        .parse::<usize>()
        .map_err(|_| ScanError::format(line, "vertex count is not a non-negative integer"))
}

fn parse_field(line: &str, fields: &[&str], index: usize) -> Result<f64> {
    fields
        .get(index)
        .and_then(|f| f.parse::<f64>().ok())
        .ok_or_else(|| ScanError::format(line, format!("bad numeric field {}", index)))
}

fn parse_color(line: &str, fields: &[&str], mode: ColorMode) -> Result<Rgb> {
    let channel = |index: usize| -> Result<u8> {
        let mut value = parse_field(line, fields, index)?;
        if mode == ColorMode::Integer {
            value /= 255.0;
        }
        Ok(color::decode(value))
    };
    Ok(Rgb {
        r: channel(3)?,
        g: channel(4)?,
        b: channel(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write");
        file
    }

    #[test]
    fn test_rejects_wrong_magic() {
        let file = file_with("plx\nformat ascii 1.0\n");
        let err = read_ply(file.path()).unwrap_err();
        match err {
            ScanError::Format { line, .. } => assert_eq!(line, "plx"),
            other => panic!("expected format error, got {other}"),
        }
    }

    #[test]
    fn test_rejects_wrong_format_line() {
        let file = file_with("ply\nformat binary_little_endian 1.0\n");
        assert!(matches!(
            read_ply(file.path()),
            Err(ScanError::Format { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_vertex_count() {
        let file = file_with("ply\nformat ascii 1.0\nelement vertex -3\n");
        assert!(matches!(
            read_ply(file.path()),
            Err(ScanError::Format { .. })
        ));
    }

    #[test]
    fn test_reads_colorless_cloud() {
        let file = file_with(
            "ply\nformat ascii 1.0\nelement vertex 2\n\
             property float32 x\nproperty float32 y\nproperty float32 z\n\
             end_header\n1 2 3\n4.5 -6 7e2\n",
        );
        let pc = read_ply(file.path()).expect("read");
        assert_eq!(pc.len(), 2);
        assert!(pc.colors.is_none());
        assert_eq!(pc.vertices[1], Vertex::new(4.5, -6.0, 700.0));
    }

    #[test]
    fn test_reads_integer_colors() {
        let file = file_with(
            "ply\nformat ascii 1.0\nelement vertex 1\n\
             property float32 x\nproperty float32 y\nproperty float32 z\n\
             property uchar red\nproperty uchar green\nproperty uchar blue\n\
             end_header\n0 0 0 255 0 186\n",
        );
        let pc = read_ply(file.path()).expect("read");
        let colors = pc.colors.expect("colors");
        assert_eq!(colors[0].r, 255);
        assert_eq!(colors[0].g, 0);
        // 186 is the gamma-encoded form of a stored 128 (within truncation).
        assert!((colors[0].b as i16 - 128).abs() <= 1);
    }

    #[test]
    fn test_reads_float_colors() {
        let file = file_with(
            "ply\nformat ascii 1.0\nelement vertex 1\n\
             property float32 x\nproperty float32 y\nproperty float32 z\n\
             property float32 red\nproperty float32 green\nproperty float32 blue\n\
             end_header\n0 0 0 1 0 0.5\n",
        );
        let pc = read_ply(file.path()).expect("read");
        let colors = pc.colors.expect("colors");
        assert_eq!(colors[0].r, 255);
        assert_eq!(colors[0].g, 0);
        // 0.5^2.2 * 255 ≈ 55.4, truncated.
        assert_eq!(colors[0].b, 55);
    }

    #[test]
    fn test_truncated_data_section() {
        let file = file_with(
            "ply\nformat ascii 1.0\nelement vertex 5\n\
             property float32 x\nproperty float32 y\nproperty float32 z\n\
             end_header\n1 2 3\n4 5 6\n7 8 9\n",
        );
        assert!(matches!(
            read_ply(file.path()),
            Err(ScanError::Format { .. })
        ));
    }

    #[test]
    fn test_zero_vertices() {
        let file = file_with(
            "ply\nformat ascii 1.0\nelement vertex 0\n\
             property float32 x\nproperty float32 y\nproperty float32 z\n\
             end_header\n",
        );
        let pc = read_ply(file.path()).expect("read");
        assert!(pc.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            read_ply("/no/such/file.ply"),
            Err(ScanError::Io(_))
        ));
    }

    #[test]
    fn test_legacy_malformed_color_header_rejected() {
        // The historic exporter never produced this spelling; the reader
        // does not tolerate it.
        let file = file_with(
            "ply\nformat ascii 1.0\nelement vertex 1\n\
             property float32 x\nproperty float32 y\nproperty float32 z\n\
             property uchar float32\nproperty uchar green\nproperty uchar blue\n\
             end_header\n0 0 0 1 2 3\n",
        );
        assert!(matches!(
            read_ply(file.path()),
            Err(ScanError::Format { .. })
        ));
    }
}
