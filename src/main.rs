use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

// Import from the library crate
use cloudview::{controller, logging, model, ui, utils, view};

use controller::{CameraController, MoveIntent};
use model::{loader, Camera, LoadKind, LoadResult, LoadTracker, Scene};
use utils::CloudBuffer;
use view::render::{self, CameraUniform, PointParamsUniform};
use view::GpuContext;

struct App {
    // Core GPU resources
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    window: Arc<Window>,

    // Rendering state
    pipeline: wgpu::RenderPipeline,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    camera_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    cloud_buffer: Option<CloudBuffer>,

    // egui
    egui_renderer: egui_wgpu::Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    // Viewer state
    camera: Camera,
    scene: Scene,
    camera_controller: CameraController,
    load_tracker: LoadTracker,

    // Input handling
    pressed_keys: HashSet<KeyCode>,
    mouse_locked: bool,

    // Frame timing
    last_frame_time: std::time::Instant,
    last_dt: f32,
}

impl App {
    async fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();

        let gpu = GpuContext::new_native(window.clone(), size.width, size.height).await;

        let device = gpu.device.clone();
        let queue = gpu.queue.clone();
        let config = gpu.config.clone();

        // Create depth texture
        let depth_format = wgpu::TextureFormat::Depth32Float;
        let (depth_texture, depth_view) =
            render::create_depth_texture(&device, size.width, size.height);

        // Camera: yaw 0 faces the origin from the default eye
        let camera = Camera::new(size.width, size.height);
        let scene = Scene::new();

        // Camera + point-parameter buffers & bind group
        let camera_resources = render::create_camera_resources(&device);
        let camera_buffer = camera_resources.camera_buffer;
        let params_buffer = camera_resources.params_buffer;
        let bind_group = camera_resources.bind_group;

        let cam_buf_data = CameraUniform {
            view_proj: camera.view_proj().to_cols_array_2d(),
        };
        queue.write_buffer(&camera_buffer, 0, bytemuck::bytes_of(&cam_buf_data));

        let params_buf_data = PointParamsUniform {
            viewport: [size.width as f32, size.height as f32],
            size: scene.point_size,
            pixel_ratio: window.scale_factor() as f32,
        };
        queue.write_buffer(&params_buffer, 0, bytemuck::bytes_of(&params_buf_data));

        // Point sprite pipeline
        let pipeline = render::create_point_pipeline(
            &device,
            config.format,
            &camera_resources.bind_group_layout,
            depth_format,
        );

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            config.format,
            egui_wgpu::RendererOptions::default(),
        );

        Self {
            surface: gpu.surface,
            device,
            queue,
            config,
            size,
            window,
            pipeline,
            depth_texture,
            depth_view,
            camera_buffer,
            params_buffer,
            bind_group,
            cloud_buffer: None,
            egui_renderer,
            egui_state,
            egui_ctx,
            camera,
            scene,
            camera_controller: CameraController::new(),
            load_tracker: LoadTracker::default(),
            pressed_keys: HashSet::new(),
            mouse_locked: false,
            last_frame_time: std::time::Instant::now(),
            last_dt: 0.0,
        }
    }

    /// Load a dropped or CLI-provided file. Names containing `color` stand
    /// in for the color picker, everything else for the position picker.
    fn load_path(&mut self, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let kind = if name.to_lowercase().contains("color") {
            LoadKind::Colors
        } else {
            LoadKind::Positions
        };

        let generation = self.load_tracker.begin(kind);
        let result = LoadResult {
            kind,
            generation,
            source: name,
            data: std::fs::read(path).map_err(|e| e.to_string()),
        };
        if loader::apply(&mut self.scene, &self.load_tracker, result) {
            self.cloud_buffer = self
                .scene
                .cloud
                .as_ref()
                .map(|cloud| utils::upload_cloud(&self.device, cloud));
        }
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        // First let egui process the event
        let egui_captured = self
            .egui_state
            .on_window_event(self.window.as_ref(), event)
            .consumed;
        if egui_captured {
            return true;
        }

        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    state,
                    physical_key,
                    ..
                },
                ..
            } => {
                if let PhysicalKey::Code(code) = physical_key {
                    match state {
                        ElementState::Pressed => {
                            self.pressed_keys.insert(*code);

                            // Release the mouse on Escape
                            if *code == KeyCode::Escape {
                                self.mouse_locked = false;
                                let _ = self.window.set_cursor_visible(true);
                                let _ = self
                                    .window
                                    .set_cursor_grab(winit::window::CursorGrabMode::None);
                            }
                        }
                        ElementState::Released => {
                            self.pressed_keys.remove(code);
                        }
                    }
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if *state == ElementState::Pressed
                    && *button == MouseButton::Left
                    && !self.egui_ctx.wants_pointer_input()
                {
                    self.mouse_locked = true;
                    let _ = self.window.set_cursor_visible(false);
                    let _ = self
                        .window
                        .set_cursor_grab(winit::window::CursorGrabMode::Locked);
                }
                true
            }
            WindowEvent::DroppedFile(path) => {
                self.load_path(path);
                true
            }
            WindowEvent::Focused(false) => {
                self.pressed_keys.clear();
                true
            }
            _ => false,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            let (depth_texture, depth_view) =
                render::create_depth_texture(&self.device, new_size.width, new_size.height);
            self.depth_texture = depth_texture;
            self.depth_view = depth_view;
            self.camera.set_aspect(new_size.width, new_size.height);
        }
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.mouse_locked {
            self.camera_controller
                .apply_look(&mut self.camera, dx as f32, dy as f32);
        }
    }

    fn update(&mut self, dt: f32) {
        self.last_dt = dt;

        // Keyboard movement: normalized intent on the camera's horizontal
        // basis, world-vertical ascend/descend
        let intent = MoveIntent::from_flags(
            self.pressed_keys.contains(&KeyCode::KeyW),
            self.pressed_keys.contains(&KeyCode::KeyS),
            self.pressed_keys.contains(&KeyCode::KeyA),
            self.pressed_keys.contains(&KeyCode::KeyD),
            self.pressed_keys.contains(&KeyCode::Space),
            self.pressed_keys.contains(&KeyCode::ShiftLeft)
                || self.pressed_keys.contains(&KeyCode::ShiftRight),
        );
        self.camera_controller
            .apply_movement(&mut self.camera, intent, dt);

        // Camera + point-parameter uniforms
        let cam_buf_data = CameraUniform {
            view_proj: self.camera.view_proj().to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&cam_buf_data));

        let params_buf_data = PointParamsUniform {
            viewport: [self.config.width as f32, self.config.height as f32],
            size: self.scene.point_size,
            pixel_ratio: self.window.scale_factor() as f32,
        };
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params_buf_data));
    }

    fn render_ui(&mut self) -> (Vec<egui::epaint::ClippedShape>, egui::TexturesDelta) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let stats = ui::FrameStats {
            dt: self.last_dt,
            file_hint: "Drop .bin files to load (name with 'color' for colors)",
        };
        let output = self.egui_ctx.run(raw_input, |ctx| {
            ui::draw(
                ctx,
                &mut self.camera,
                &self.camera_controller,
                &mut self.scene,
                &stats,
            );
        });

        self.egui_state
            .handle_platform_output(&self.window, output.platform_output);
        (output.shapes, output.textures_delta)
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (shapes, textures_delta) = self.render_ui();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let primitives = self
            .egui_ctx
            .tessellate(shapes, self.window.scale_factor() as f32);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        // Upload egui textures
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("points_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: self.scene.background[0] as f64,
                            g: self.scene.background[1] as f64,
                            b: self.scene.background[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);

            // One quad instance per point; nothing to draw without a cloud
            if let Some(cloud) = &self.cloud_buffer {
                if cloud.count > 0 {
                    render_pass.set_vertex_buffer(0, cloud.vertex_buffer.slice(..));
                    render_pass.draw(0..4, 0..cloud.count);
                }
            }
        }

        // Render egui on top
        {
            let egui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer.render(
                &mut egui_pass.forget_lifetime(),
                &primitives,
                &screen_descriptor,
            );
        }

        // Cleanup egui textures
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn main() {
    logging::init();

    let event_loop = EventLoop::new().unwrap();
    let window_attributes = Window::default_attributes()
        .with_title("cloudview")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = event_loop.create_window(window_attributes).unwrap();
    let window = Arc::new(window);

    let mut app = pollster::block_on(App::new(window.clone()));

    // Demo data: optional positions and colors paths on the command line
    let args: Vec<String> = std::env::args().skip(1).collect();
    for arg in &args {
        app.load_path(Path::new(arg));
    }
    if app.scene.cloud.is_none() && !args.is_empty() {
        tracing::warn!("no point cloud loaded from command-line arguments");
    }

    event_loop
        .run(move |event, elwt| {
            match event {
                Event::WindowEvent {
                    ref event,
                    window_id,
                } if window_id == app.window.id() => {
                    if !app.input(event) {
                        match event {
                            WindowEvent::CloseRequested => elwt.exit(),
                            WindowEvent::Resized(physical_size) => {
                                app.resize(*physical_size);
                            }
                            WindowEvent::RedrawRequested => {
                                let now = std::time::Instant::now();
                                let dt = (now - app.last_frame_time).as_secs_f32().clamp(0.0, 0.1);
                                app.last_frame_time = now;

                                app.update(dt);

                                match app.render() {
                                    Ok(_) => {}
                                    Err(wgpu::SurfaceError::Lost) => app.resize(app.size),
                                    Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                                    Err(e) => tracing::error!("{e:?}"),
                                }
                            }
                            _ => {}
                        }
                    }
                }
                Event::DeviceEvent {
                    event: winit::event::DeviceEvent::MouseMotion { delta },
                    ..
                } => {
                    app.handle_mouse_motion(delta.0, delta.1);
                }
                Event::AboutToWait => {
                    app.window.request_redraw();
                }
                _ => {}
            }
        })
        .unwrap();
}
