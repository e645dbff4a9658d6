// CONTROLLER: Input handling and per-frame update
pub mod camera_controller;
#[cfg(target_arch = "wasm32")]
pub mod frame_loop;
pub mod input;

pub use camera_controller::{CameraController, MoveIntent};
#[cfg(target_arch = "wasm32")]
pub use frame_loop::FrameLoopContext;
pub use input::{InputProcessor, InputState, KeyBindings};
