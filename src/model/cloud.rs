use glam::Vec3;
use thiserror::Error;

/// Color used for points when no color buffer has been applied.
pub const DEFAULT_POINT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Up-axis convention of an incoming position buffer.
///
/// The viewer is Y-up. Buffers exported from Z-up tools (astronomy dumps,
/// most survey pipelines) are remapped on load so their vertical axis lands
/// on the viewer's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisConvention {
    /// Triplets are stored as-is.
    YUp,
    /// Input `(x, y, z)` is stored as `(x, z, -y)`.
    #[default]
    ZUp,
}

impl AxisConvention {
    fn remap(self, [x, y, z]: [f32; 3]) -> Vec3 {
        match self {
            AxisConvention::YUp => Vec3::new(x, y, z),
            AxisConvention::ZUp => Vec3::new(x, z, -y),
        }
    }
}

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("position buffer is {0} bytes, not a multiple of 12 (x,y,z f32 triplets)")]
    MalformedPositions(usize),
    #[error("color buffer is {0} bytes, not a multiple of 12 (r,g,b f32 triplets)")]
    MalformedColors(usize),
}

/// An unordered-for-rendering collection of 3D points, optionally colored.
///
/// Replaced wholesale on every position load; never updated incrementally.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    pub colors: Option<Vec<[f32; 3]>>,
}

/// Parse raw little-endian f32 triplets. No header, no length prefix;
/// the point count is the byte count divided by 12.
fn read_triplets(bytes: &[u8]) -> Option<Vec<[f32; 3]>> {
    if bytes.len() % 12 != 0 {
        return None;
    }
    let triplets = bytes
        .chunks_exact(12)
        .map(|t| {
            [
                f32::from_le_bytes([t[0], t[1], t[2], t[3]]),
                f32::from_le_bytes([t[4], t[5], t[6], t[7]]),
                f32::from_le_bytes([t[8], t[9], t[10], t[11]]),
            ]
        })
        .collect();
    Some(triplets)
}

impl PointCloud {
    /// Build a cloud from a raw position buffer, applying the axis remap.
    pub fn from_le_positions(bytes: &[u8], axes: AxisConvention) -> Result<Self, CloudError> {
        let triplets =
            read_triplets(bytes).ok_or(CloudError::MalformedPositions(bytes.len()))?;
        Ok(Self {
            positions: triplets.into_iter().map(|t| axes.remap(t)).collect(),
            colors: None,
        })
    }

    /// Apply a raw color buffer. Colors are used as-is (no axis handling).
    ///
    /// A point-count mismatch leaves the cloud on the default color and
    /// returns `Ok(false)`; a mismatch is a skip, not an error.
    pub fn apply_le_colors(&mut self, bytes: &[u8]) -> Result<bool, CloudError> {
        let triplets = read_triplets(bytes).ok_or(CloudError::MalformedColors(bytes.len()))?;
        if triplets.len() != self.positions.len() {
            tracing::warn!(
                colors = triplets.len(),
                points = self.positions.len(),
                "color count does not match point count, keeping default color"
            );
            return Ok(false);
        }
        self.colors = Some(triplets);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Per-point color, falling back to the default when none was loaded.
    pub fn color(&self, index: usize) -> [f32; 3] {
        self.colors
            .as_ref()
            .map(|c| c[index])
            .unwrap_or(DEFAULT_POINT_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triplet_bytes(values: &[[f32; 3]]) -> Vec<u8> {
        values
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    #[test]
    fn test_single_point_passthrough() {
        let bytes = triplet_bytes(&[[1.0, 0.0, 0.0]]);
        assert_eq!(bytes.len(), 12);

        let cloud = PointCloud::from_le_positions(&bytes, AxisConvention::YUp).unwrap();
        assert_eq!(cloud.len(), 1);
        assert_eq!(cloud.positions[0], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(cloud.color(0), DEFAULT_POINT_COLOR);
    }

    #[test]
    fn test_z_up_remap() {
        let bytes = triplet_bytes(&[[1.0, 2.0, 3.0]]);
        let cloud = PointCloud::from_le_positions(&bytes, AxisConvention::ZUp).unwrap();
        assert_eq!(cloud.positions[0], Vec3::new(1.0, 3.0, -2.0));

        // A point on the shared X axis is unchanged by the remap
        let bytes = triplet_bytes(&[[1.0, 0.0, 0.0]]);
        let cloud = PointCloud::from_le_positions(&bytes, AxisConvention::ZUp).unwrap();
        assert_eq!(cloud.positions[0], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_malformed_position_buffer() {
        let err = PointCloud::from_le_positions(&[0u8; 13], AxisConvention::YUp).unwrap_err();
        assert!(matches!(err, CloudError::MalformedPositions(13)));
    }

    #[test]
    fn test_matching_colors_apply() {
        let positions = triplet_bytes(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let mut cloud = PointCloud::from_le_positions(&positions, AxisConvention::YUp).unwrap();

        let colors = triplet_bytes(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(cloud.apply_le_colors(&colors).unwrap());
        assert_eq!(cloud.color(0), [1.0, 0.0, 0.0]);
        assert_eq!(cloud.color(1), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_mismatched_colors_skip() {
        let positions = triplet_bytes(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let mut cloud = PointCloud::from_le_positions(&positions, AxisConvention::YUp).unwrap();

        let colors = triplet_bytes(&[[1.0, 0.0, 0.0]]);
        assert!(!cloud.apply_le_colors(&colors).unwrap());
        assert!(cloud.colors.is_none());
        assert_eq!(cloud.color(1), DEFAULT_POINT_COLOR);
    }

    #[test]
    fn test_empty_buffer_is_empty_cloud() {
        let cloud = PointCloud::from_le_positions(&[], AxisConvention::ZUp).unwrap();
        assert!(cloud.is_empty());
    }
}
