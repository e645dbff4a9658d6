use crate::model::{AxisConvention, PointCloud};

/// Everything the frame loop renders and the control panels edit.
///
/// One instance, owned by the app struct; event callbacks and the frame
/// loop share it under the single-threaded cooperative scheduler.
pub struct Scene {
    /// Current cloud, if any. `None` renders an empty frame.
    pub cloud: Option<PointCloud>,
    /// Clear color behind the points.
    pub background: [f32; 3],
    /// Point sprite diameter in screen pixels (before device pixel ratio).
    pub point_size: f32,
    /// Up-axis convention applied to subsequent position loads.
    pub axes: AxisConvention,
    /// Last load outcome, shown in the UI.
    pub status: String,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            cloud: None,
            background: [0.0, 0.0, 0.0],
            point_size: 0.5,
            axes: AxisConvention::default(),
            status: String::new(),
        }
    }

    pub fn point_count(&self) -> usize {
        self.cloud.as_ref().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
