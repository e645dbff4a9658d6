// MODEL: Viewer state and data
pub mod camera;
pub mod cloud;
pub mod loader;
pub mod scene;

pub use camera::Camera;
pub use cloud::{AxisConvention, CloudError, PointCloud, DEFAULT_POINT_COLOR};
pub use loader::{LoadKind, LoadResult, LoadTracker};
pub use scene::Scene;
