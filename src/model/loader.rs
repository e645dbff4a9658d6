use crate::model::{PointCloud, Scene};

/// Which of the two raw buffers a load produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Positions,
    Colors,
}

/// A finished asynchronous load, queued for the frame loop to apply.
#[derive(Debug)]
pub struct LoadResult {
    pub kind: LoadKind,
    pub generation: u64,
    /// File name or URL, for the status line.
    pub source: String,
    pub data: Result<Vec<u8>, String>,
}

/// Sequences overlapping loads: last-started-wins.
///
/// Every started load takes a generation per kind; a completion is applied
/// only while its generation is still the newest started of that kind. A
/// slow load started first is discarded when a later load finished before
/// it, regardless of completion order.
#[derive(Debug, Default)]
pub struct LoadTracker {
    started: [u64; 2],
}

impl LoadTracker {
    fn slot(kind: LoadKind) -> usize {
        match kind {
            LoadKind::Positions => 0,
            LoadKind::Colors => 1,
        }
    }

    /// Register a new load and return its generation.
    pub fn begin(&mut self, kind: LoadKind) -> u64 {
        self.started[Self::slot(kind)] += 1;
        self.started[Self::slot(kind)]
    }

    pub fn is_current(&self, kind: LoadKind, generation: u64) -> bool {
        self.started[Self::slot(kind)] == generation
    }
}

/// Apply one finished load to the scene. Returns true when the cloud
/// geometry or colors changed and the GPU buffer must be re-uploaded.
///
/// Failures never tear down the viewer: they land in `scene.status` and the
/// log, and the previous cloud keeps rendering.
pub fn apply(scene: &mut Scene, tracker: &LoadTracker, result: LoadResult) -> bool {
    if !tracker.is_current(result.kind, result.generation) {
        tracing::debug!(source = %result.source, "discarding superseded load");
        return false;
    }

    let bytes = match result.data {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(source = %result.source, error = %e, "load failed");
            scene.status = format!("failed to load {}: {e}", result.source);
            return false;
        }
    };

    match result.kind {
        LoadKind::Positions => match PointCloud::from_le_positions(&bytes, scene.axes) {
            Ok(cloud) => {
                tracing::info!(points = cloud.len(), source = %result.source, "loaded positions");
                scene.status = format!("{}: {} points", result.source, cloud.len());
                scene.cloud = Some(cloud);
                true
            }
            Err(e) => {
                tracing::error!(source = %result.source, error = %e, "malformed position buffer");
                scene.status = format!("{}: {e}", result.source);
                false
            }
        },
        LoadKind::Colors => {
            let Some(cloud) = scene.cloud.as_mut() else {
                scene.status = format!("{}: load positions first", result.source);
                return false;
            };
            match cloud.apply_le_colors(&bytes) {
                Ok(true) => {
                    tracing::info!(points = cloud.len(), source = %result.source, "loaded colors");
                    scene.status = format!("{}: colored {} points", result.source, cloud.len());
                    true
                }
                Ok(false) => {
                    scene.status =
                        format!("{}: color count does not match point count", result.source);
                    false
                }
                Err(e) => {
                    scene.status = format!("{}: {e}", result.source);
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AxisConvention;

    fn position_bytes(n: usize) -> Vec<u8> {
        (0..n)
            .flat_map(|i| {
                [i as f32, 0.0, 0.0]
                    .into_iter()
                    .flat_map(|v| v.to_le_bytes())
            })
            .collect()
    }

    fn result(kind: LoadKind, generation: u64, data: Vec<u8>) -> LoadResult {
        LoadResult {
            kind,
            generation,
            source: "test.bin".to_string(),
            data: Ok(data),
        }
    }

    #[test]
    fn test_load_replaces_cloud() {
        let mut scene = Scene::new();
        scene.axes = AxisConvention::YUp;
        let mut tracker = LoadTracker::default();

        let gen = tracker.begin(LoadKind::Positions);
        assert!(apply(&mut scene, &tracker, result(LoadKind::Positions, gen, position_bytes(3))));
        assert_eq!(scene.point_count(), 3);

        let gen = tracker.begin(LoadKind::Positions);
        assert!(apply(&mut scene, &tracker, result(LoadKind::Positions, gen, position_bytes(5))));
        assert_eq!(scene.point_count(), 5);
    }

    #[test]
    fn test_last_started_wins() {
        let mut scene = Scene::new();
        let mut tracker = LoadTracker::default();

        // Slow load started first, fast load started second and completing first
        let slow = tracker.begin(LoadKind::Positions);
        let fast = tracker.begin(LoadKind::Positions);

        assert!(apply(&mut scene, &tracker, result(LoadKind::Positions, fast, position_bytes(2))));
        assert_eq!(scene.point_count(), 2);

        // The slow result arrives late and is discarded
        assert!(!apply(&mut scene, &tracker, result(LoadKind::Positions, slow, position_bytes(9))));
        assert_eq!(scene.point_count(), 2);
    }

    #[test]
    fn test_failed_load_surfaces_status() {
        let mut scene = Scene::new();
        let mut tracker = LoadTracker::default();

        let gen = tracker.begin(LoadKind::Positions);
        let failed = LoadResult {
            kind: LoadKind::Positions,
            generation: gen,
            source: "demo.bin".to_string(),
            data: Err("fetch failed".to_string()),
        };
        assert!(!apply(&mut scene, &tracker, failed));
        assert!(scene.status.contains("demo.bin"));
        assert!(scene.cloud.is_none());
    }

    #[test]
    fn test_colors_without_positions() {
        let mut scene = Scene::new();
        let mut tracker = LoadTracker::default();

        let gen = tracker.begin(LoadKind::Colors);
        assert!(!apply(&mut scene, &tracker, result(LoadKind::Colors, gen, position_bytes(2))));
        assert!(scene.status.contains("positions first"));
    }

    #[test]
    fn test_color_generations_independent_of_positions() {
        let mut scene = Scene::new();
        scene.axes = AxisConvention::YUp;
        let mut tracker = LoadTracker::default();

        let pos_gen = tracker.begin(LoadKind::Positions);
        let col_gen = tracker.begin(LoadKind::Colors);

        assert!(apply(&mut scene, &tracker, result(LoadKind::Positions, pos_gen, position_bytes(2))));
        assert!(apply(&mut scene, &tracker, result(LoadKind::Colors, col_gen, position_bytes(2))));
        assert!(scene.cloud.as_ref().unwrap().colors.is_some());
    }
}
