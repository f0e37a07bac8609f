//! ASCII point-cloud data model and codec.
//!
//! The on-disk format is a small, deliberately brittle subset of the common
//! "Polygon File Format": a fixed ASCII header, `\n` line endings, and one
//! space-separated data line per vertex. Colors are optional and, when
//! present, are stored gamma-encoded (see [`crate::color`]) either as
//! `uchar` integers or as `float32` values in `[0, 1]`.
//!
//! ```text
//! ply
//! format ascii 1.0
//! element vertex <N>
//! property float32 x
//! property float32 y
//! property float32 z
//! [property {uchar|float32} red
//!  property {uchar|float32} green
//!  property {uchar|float32} blue]
//! end_header
//! <N data lines: "x y z [r g b]">
//! ```
//!
//! The codec reproduces this grammar exactly; it is not a permissive PLY
//! parser. See [`writer::PlyWriter`] and [`reader::read_ply`].

pub mod reader;
pub mod writer;

use serde::{Deserialize, Serialize};

/// A single point: three double-precision coordinates, no identity beyond
/// position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Vertex {
    /// Creates a vertex from its three coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// An 8-bit RGB color associated with a vertex by array index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel, stored intensity 0–255.
    pub r: u8,
    /// Green channel, stored intensity 0–255.
    pub g: u8,
    /// Blue channel, stored intensity 0–255.
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its three channels.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// An ordered sequence of vertices with an optional parallel color sequence.
///
/// When `colors` is present its length equals `vertices.len()`; association
/// is purely by index. Produced by [`reader::read_ply`] or assembled by the
/// caller for [`writer::PlyWriter::write`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    /// Vertices in file order.
    pub vertices: Vec<Vertex>,
    /// Per-vertex colors, or `None` when the file carried no color
    /// properties.
    pub colors: Option<Vec<Rgb>>,
}

impl PointCloud {
    /// Number of vertices in the cloud.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the cloud contains no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_cloud_len() {
        let pc = PointCloud {
            vertices: vec![Vertex::new(0.0, 1.0, 2.0)],
            colors: None,
        };
        assert_eq!(pc.len(), 1);
        assert!(!pc.is_empty());
    }
}
