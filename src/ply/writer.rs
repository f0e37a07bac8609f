//! ASCII point-cloud writer.

use crate::color;
use crate::error::{Result, ScanError};
use crate::ply::{Rgb, Vertex};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File buffer size, matches a comfortable chunk for multi-million-point
/// clouds.
const WRITE_BUFFER_BYTES: usize = 512 * 1024;

/// Outcome of a successful write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteReport {
    /// The path that was written.
    pub path: PathBuf,
    /// True when per-vertex colors were emitted alongside positions.
    pub colors_written: bool,
    /// True when colors were supplied but dropped because their count did
    /// not match the vertex count. A warning, not an error: vertices are
    /// still written.
    pub colors_dropped: bool,
}

/// Writer for the ASCII point-cloud format.
///
/// Holds the last successfully written path across calls, so a host that
/// skips a write (e.g. an inactive toggle) can still report the previous
/// result.
#[derive(Debug, Default)]
pub struct PlyWriter {
    last_written: Option<PathBuf>,
}

impl PlyWriter {
    /// Creates a writer with no write history.
    pub fn new() -> Self {
        Self::default()
    }

    /// The path of the most recent successful write, if any.
    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }

    /// Writes `vertices` (and optionally `colors`) to `path`.
    ///
    /// The parent directory must already exist; this writer never creates
    /// it. Colors are emitted only when their count matches the vertex
    /// count — a mismatch drops them with a warning and is flagged in the
    /// returned [`WriteReport`]. In integer mode colors become `uchar`
    /// values 0–255; otherwise `float32` values in `[0, 1]`. Both modes
    /// gamma-encode first (see [`crate::color`]).
    ///
    /// There is no atomic-write guarantee: an I/O failure mid-write can
    /// leave a partial file behind, and the last-written path is only
    /// updated on success.
    pub fn write(
        &mut self,
        path: impl AsRef<Path>,
        vertices: &[Vertex],
        colors: Option<&[Rgb]>,
        colors_as_int: bool,
    ) -> Result<WriteReport> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(ScanError::DirectoryMissing(parent.to_path_buf()));
            }
        }

        let matched = colors.map(|c| c.len() == vertices.len()).unwrap_or(false);
        let dropped = colors.is_some() && !matched;
        if dropped {
            warn!(
                "color count {} does not match vertex count {}; writing positions only",
                colors.map(|c| c.len()).unwrap_or(0),
                vertices.len()
            );
        }
        let colors = if matched { colors } else { None };

        let file = File::create(path)?;
        let mut out = BufWriter::with_capacity(WRITE_BUFFER_BYTES, file);
        write_header(&mut out, vertices.len(), colors.is_some(), colors_as_int)?;
        write_vertices(&mut out, vertices, colors, colors_as_int)?;
        out.flush()?;

        self.last_written = Some(path.to_path_buf());
        debug!("wrote {} vertices to {}", vertices.len(), path.display());

        Ok(WriteReport {
            path: path.to_path_buf(),
            colors_written: colors.is_some(),
            colors_dropped: dropped,
        })
    }
}

fn write_header(
    out: &mut impl Write,
    vertex_count: usize,
    with_colors: bool,
    colors_as_int: bool,
) -> Result<()> {
    out.write_all(b"ply\n")?;
    out.write_all(b"format ascii 1.0\n")?;
    writeln!(out, "element vertex {}", vertex_count)?;
    out.write_all(b"property float32 x\n")?;
    out.write_all(b"property float32 y\n")?;
    out.write_all(b"property float32 z\n")?;
    if with_colors {
        let ty = if colors_as_int { "uchar" } else { "float32" };
        writeln!(out, "property {} red", ty)?;
        writeln!(out, "property {} green", ty)?;
        writeln!(out, "property {} blue", ty)?;
    }
    out.write_all(b"end_header\n")?;
    Ok(())
}

fn write_vertices(
    out: &mut impl Write,
    vertices: &[Vertex],
    colors: Option<&[Rgb]>,
    colors_as_int: bool,
) -> Result<()> {
    match colors {
        Some(colors) => {
            for (v, c) in vertices.iter().zip(colors) {
                let r = color::encode(c.r);
                let g = color::encode(c.g);
                let b = color::encode(c.b);
                if colors_as_int {
                    writeln!(
                        out,
                        "{} {} {} {} {} {}",
                        v.x, v.y, v.z, r as u32, g as u32, b as u32
                    )?;
                } else {
                    writeln!(
                        out,
                        "{} {} {} {} {} {}",
                        v.x,
                        v.y,
                        v.z,
                        r / 255.0,
                        g / 255.0,
                        b / 255.0
                    )?;
                }
            }
        }
        None => {
            for v in vertices {
                writeln!(out, "{} {} {}", v.x, v.y, v.z)?;
            }
        }
    }
    Ok(())
}
