use std::cell::RefCell;
use std::rc::Rc;
use web_sys::Window;
use wgpu::{Device, Queue, Surface, TextureView};

use crate::controller::{CameraController, InputProcessor, InputState, MoveIntent};
use crate::model::{loader, Camera, LoadResult, LoadTracker, Scene};
use crate::ui;
use crate::utils::{upload_cloud, CloudBuffer};
use crate::view::render::{CameraUniform, PointParamsUniform, RenderState};

/// Per-frame state and update logic for the browser build.
///
/// Everything is `Rc<RefCell<…>>` because the DOM event closures hold the
/// other handles; the browser event queue serializes all access.
pub struct FrameLoopContext {
    pub cam: Rc<RefCell<Camera>>,
    pub cam_buf: wgpu::Buffer,
    pub cam_buf_data: Rc<RefCell<CameraUniform>>,
    pub params_buf: wgpu::Buffer,
    pub params_buf_data: Rc<RefCell<PointParamsUniform>>,
    pub depth_view_cell: Rc<RefCell<TextureView>>,
    pub scene: Rc<RefCell<Scene>>,
    pub cloud_buffer: Rc<RefCell<Option<CloudBuffer>>>,
    pub pending_loads: Rc<RefCell<Vec<LoadResult>>>,
    pub load_tracker: Rc<RefCell<LoadTracker>>,
    pub input_state: Rc<RefCell<InputState>>,
    pub input_processor: InputProcessor,
    pub camera_controller: CameraController,
    pub egui_ctx: egui::Context,
    pub egui_events: Rc<RefCell<Vec<egui::Event>>>,
    pub last_time: Rc<RefCell<f64>>,
}

impl FrameLoopContext {
    /// Advance input, loads, uniforms and UI for one frame.
    pub fn update(
        &mut self,
        device: &Device,
        queue: &Queue,
        window: &Window,
        surface: &Surface,
        render_state: &mut RenderState,
    ) {
        // Time step
        let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
        let mut last = self.last_time.borrow_mut();
        let dt = ((now - *last) / 1000.0).clamp(0.0, 0.1) as f32;
        *last = now;
        drop(last);

        // Mouse look, then keyboard movement on the updated orientation
        let (dx, dy) = self.input_state.borrow_mut().consume_look();
        self.camera_controller
            .apply_look(&mut self.cam.borrow_mut(), dx, dy);

        let intent = MoveIntent::from_input(&self.input_processor, &self.input_state.borrow());
        self.camera_controller
            .apply_movement(&mut self.cam.borrow_mut(), intent, dt);

        // Apply finished loads; the loop keeps rendering the previous cloud
        // until a completion survives the last-started-wins check
        let results: Vec<LoadResult> = self.pending_loads.borrow_mut().drain(..).collect();
        if !results.is_empty() {
            let mut scene = self.scene.borrow_mut();
            let tracker = self.load_tracker.borrow();
            let mut changed = false;
            for result in results {
                changed |= loader::apply(&mut scene, &tracker, result);
            }
            if changed {
                *self.cloud_buffer.borrow_mut() =
                    scene.cloud.as_ref().map(|cloud| upload_cloud(device, cloud));
            }
        }

        // Resize handling
        self.handle_resize(window, device, surface, render_state);

        // Camera uniform
        self.cam_buf_data.borrow_mut().view_proj =
            self.cam.borrow().view_proj().to_cols_array_2d();
        queue.write_buffer(
            &self.cam_buf,
            0,
            bytemuck::bytes_of(&*self.cam_buf_data.borrow()),
        );

        // Point parameters and clear color from the scene
        let dpr = window.device_pixel_ratio() as f32;
        {
            let scene = self.scene.borrow();
            let mut params = self.params_buf_data.borrow_mut();
            params.viewport = [render_state.width as f32, render_state.height as f32];
            params.size = scene.point_size;
            params.pixel_ratio = dpr;
            render_state.background = scene.background;
        }
        queue.write_buffer(
            &self.params_buf,
            0,
            bytemuck::bytes_of(&*self.params_buf_data.borrow()),
        );

        // Build egui input from queued events
        let mut raw_input = egui::RawInput::default();
        raw_input.time = Some(now / 1000.0);
        raw_input.screen_rect = Some(egui::Rect::from_min_size(
            egui::Pos2::new(0.0, 0.0),
            egui::vec2(
                render_state.width as f32 / dpr,
                render_state.height as f32 / dpr,
            ),
        ));
        raw_input
            .events
            .extend(self.egui_events.borrow_mut().drain(..));
        self.egui_ctx.set_pixels_per_point(dpr);

        let stats = ui::FrameStats {
            dt,
            file_hint: "Load files with the pickers above the canvas",
        };
        let mut full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui::draw(
                ctx,
                &mut self.cam.borrow_mut(),
                &self.camera_controller,
                &mut self.scene.borrow_mut(),
                &stats,
            );
        });

        // Tessellate and store for rendering in the draw step
        let primitives = self
            .egui_ctx
            .tessellate(std::mem::take(&mut full_output.shapes), dpr);
        render_state.egui_primitives = Some(primitives);
        render_state.egui_full_output = Some(full_output);
        render_state.egui_dpr = dpr;
    }

    fn handle_resize(
        &self,
        window: &Window,
        device: &Device,
        surface: &Surface,
        render_state: &mut RenderState,
    ) {
        if let (Ok(w), Ok(h)) = (window.inner_width(), window.inner_height()) {
            let nw = w.as_f64().unwrap_or(800.0) as u32;
            let nh = h.as_f64().unwrap_or(600.0) as u32;
            if nw != render_state.width || nh != render_state.height {
                self.cam.borrow_mut().set_aspect(nw, nh);
                render_state.width = nw;
                render_state.height = nh;

                let config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format: render_state.format,
                    width: nw,
                    height: nh,
                    present_mode: wgpu::PresentMode::Fifo,
                    alpha_mode: render_state.alpha_mode,
                    view_formats: vec![],
                    desired_maximum_frame_latency: 2,
                };
                surface.configure(device, &config);

                let (_, depth_view) = crate::view::render::create_depth_texture(device, nw, nh);
                *self.depth_view_cell.borrow_mut() = depth_view;
            }
        }
    }
}
