use egui::Context;
use glam::Vec3;

use crate::controller::CameraController;
use crate::model::{AxisConvention, Camera, Scene};

/// Per-frame numbers the panels display.
pub struct FrameStats {
    pub dt: f32,
    /// Platform-specific hint for how to load files.
    pub file_hint: &'static str,
}

/// Draw the viewer panels. Shared by the native and wasm frame paths; the
/// caller owns the `egui::Context::run` wrapping.
pub fn draw(
    ctx: &Context,
    camera: &mut Camera,
    controller: &CameraController,
    scene: &mut Scene,
    stats: &FrameStats,
) {
    draw_controls_window(ctx, camera, controller, scene);
    draw_debug_window(ctx, camera, scene, stats);
}

fn draw_controls_window(
    ctx: &Context,
    camera: &mut Camera,
    controller: &CameraController,
    scene: &mut Scene,
) {
    egui::Window::new("Controls")
        .default_pos([8.0, 8.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("Point size").small());
            ui.add(egui::Slider::new(&mut scene.point_size, 0.05..=10.0));

            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Background").small());
                ui.color_edit_button_rgb(&mut scene.background);
            });

            let mut z_up = scene.axes == AxisConvention::ZUp;
            if ui.checkbox(&mut z_up, "Z-up input").changed() {
                scene.axes = if z_up {
                    AxisConvention::ZUp
                } else {
                    AxisConvention::YUp
                };
            }

            ui.separator();
            if ui.button("Reset position").clicked() {
                camera.eye = Vec3::ZERO;
            }
            if ui.button("Reset view").clicked() {
                controller.set_orientation(camera, 0.0, 0.0);
            }

            if !scene.status.is_empty() {
                ui.separator();
                ui.label(egui::RichText::new(scene.status.as_str()).small());
            }
        });
}

fn draw_debug_window(ctx: &Context, camera: &Camera, scene: &Scene, stats: &FrameStats) {
    egui::Window::new("Debug")
        .default_pos([8.0, 260.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "FPS: {:.0}",
                    if stats.dt > 0.0 { 1.0 / stats.dt } else { 0.0 }
                ))
                .small(),
            );
            ui.label(
                egui::RichText::new(format!(
                    "Pos: x: {:.1} y: {:.1} z: {:.1}",
                    camera.eye.x, camera.eye.y, camera.eye.z
                ))
                .small(),
            );
            ui.label(
                egui::RichText::new(format!(
                    "Yaw: {:.1} Pitch: {:.1}",
                    camera.yaw.to_degrees(),
                    camera.pitch.to_degrees()
                ))
                .small(),
            );
            ui.label(egui::RichText::new(format!("Points: {}", scene.point_count())).small());
            ui.separator();
            ui.label(egui::RichText::new("Controls:").small());
            ui.label(egui::RichText::new("Click - Look (Esc releases)").small());
            ui.label(egui::RichText::new("WASD - Move").small());
            ui.label(egui::RichText::new("Space - Up").small());
            ui.label(egui::RichText::new("Shift - Down").small());
            ui.label(egui::RichText::new(stats.file_hint).small());
        });
}
