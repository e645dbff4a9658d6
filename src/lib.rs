// Re-export all public modules so they can be used from main.rs
pub mod logging;
pub mod ui;
pub mod utils;

// MVC Architecture
pub mod controller;
pub mod model;
pub mod view;

// Common imports
#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{
    Document, Event, HtmlCanvasElement, HtmlElement, HtmlInputElement, KeyboardEvent, MouseEvent,
    Window,
};

#[cfg(target_arch = "wasm32")]
use controller::{CameraController, FrameLoopContext, InputProcessor, InputState};
#[cfg(target_arch = "wasm32")]
use model::{Camera, LoadKind, LoadResult, LoadTracker, Scene};
#[cfg(target_arch = "wasm32")]
use view::render::{self, CameraUniform, PointParamsUniform};
#[cfg(target_arch = "wasm32")]
use view::GpuContext;

/// Well-known demo resources fetched on startup, positions first.
#[cfg(target_arch = "wasm32")]
const DEMO_POSITIONS_URL: &str = "data/positions.bin";
#[cfg(target_arch = "wasm32")]
const DEMO_COLORS_URL: &str = "data/colors.bin";

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    logging::init();
    let (window, document, canvas) = init_canvas()?;
    setup_app(&window, &document, &canvas).await
}

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    // Initialize GPU
    let gpu = GpuContext::new(canvas, canvas.width(), canvas.height())
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e:?}")))?;

    let width = gpu.config.width;
    let height = gpu.config.height;

    // Camera: yaw 0 faces the origin from the default eye
    let cam = Rc::new(RefCell::new(Camera::new(width, height)));

    // Camera + point-parameter buffers & bind group
    let camera_resources = render::create_camera_resources(gpu.device.as_ref());
    let cam_buf = camera_resources.camera_buffer;
    let params_buf = camera_resources.params_buffer;
    let bind_group = camera_resources.bind_group;

    let cam_buf_data = Rc::new(RefCell::new(CameraUniform {
        view_proj: cam.borrow().view_proj().to_cols_array_2d(),
    }));
    gpu.queue.as_ref().write_buffer(
        &cam_buf,
        0,
        bytemuck::bytes_of(&*cam_buf_data.borrow()),
    );

    let dpr = window.device_pixel_ratio() as f32;
    let params_buf_data = Rc::new(RefCell::new(PointParamsUniform {
        viewport: [width as f32, height as f32],
        size: 0.5,
        pixel_ratio: dpr,
    }));
    gpu.queue.as_ref().write_buffer(
        &params_buf,
        0,
        bytemuck::bytes_of(&*params_buf_data.borrow()),
    );

    // Depth texture
    let depth_format = wgpu::TextureFormat::Depth32Float;
    let (_depth_tex, depth_view) = render::create_depth_texture(gpu.device.as_ref(), width, height);
    let depth_view_cell: Rc<RefCell<wgpu::TextureView>> = Rc::new(RefCell::new(depth_view));

    // Point sprite pipeline
    let pipeline = render::create_point_pipeline(
        gpu.device.as_ref(),
        gpu.format,
        &camera_resources.bind_group_layout,
        depth_format,
    );

    // Viewer state
    let scene = Rc::new(RefCell::new(Scene::new()));
    let cloud_buffer: Rc<RefCell<Option<utils::CloudBuffer>>> = Rc::new(RefCell::new(None));
    let pending_loads: Rc<RefCell<Vec<LoadResult>>> = Rc::new(RefCell::new(Vec::new()));
    let load_tracker = Rc::new(RefCell::new(LoadTracker::default()));
    let input_state = Rc::new(RefCell::new(InputState::new()));
    let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));

    // egui setup
    let egui_ctx = egui::Context::default();
    let egui_renderer = egui_wgpu::Renderer::new(
        gpu.device.as_ref(),
        gpu.format,
        egui_wgpu::RendererOptions::default(),
    );

    // File pickers above the canvas, then keyboard/mouse listeners
    setup_file_inputs(document, pending_loads.clone(), load_tracker.clone())?;
    setup_input_listeners(
        document,
        window,
        canvas,
        input_state.clone(),
        egui_events.clone(),
        egui_ctx.clone(),
    )?;

    // Kick off the demo data fetch; the loop renders an empty scene until
    // the buffers arrive
    fetch_demo_data(pending_loads.clone(), load_tracker.clone());

    // Create render state
    let mut render_state = render::RenderState {
        format: gpu.format,
        alpha_mode: gpu.config.alpha_mode,
        width,
        height,
        pipeline,
        background: scene.borrow().background,
        egui_renderer,
        egui_primitives: None,
        egui_full_output: None,
        egui_dpr: dpr,
    };

    // Setup frame loop
    let mut frame_ctx = FrameLoopContext {
        cam: cam.clone(),
        cam_buf,
        cam_buf_data,
        params_buf,
        params_buf_data,
        depth_view_cell,
        scene,
        cloud_buffer,
        pending_loads,
        load_tracker,
        input_state,
        input_processor: InputProcessor::default(),
        camera_controller: CameraController::new(),
        egui_ctx,
        egui_events,
        last_time: Rc::new(RefCell::new(
            window.performance().map(|p| p.now()).unwrap_or(0.0),
        )),
    };

    // Continuous redraw using requestAnimationFrame
    let f = RcCellCallback::new(window.clone(), {
        let window_for_loop = window.clone();

        move || {
            frame_ctx.update(
                gpu.device.as_ref(),
                gpu.queue.as_ref(),
                &window_for_loop,
                &gpu.surface,
                &mut render_state,
            );

            // Draw frame
            let cloud = frame_ctx.cloud_buffer.borrow();
            let dv = frame_ctx.depth_view_cell.borrow();
            render_state.draw_frame(
                gpu.device.as_ref(),
                gpu.queue.as_ref(),
                &gpu.surface,
                cloud.as_ref(),
                &dv,
                &bind_group,
            );
        }
    });
    f.start();

    Ok(())
}

/// Create the position and color file pickers and queue their reads.
///
/// An empty selection is a silent no-op; read results (or failures) land in
/// the pending queue for the frame loop to apply.
#[cfg(target_arch = "wasm32")]
fn setup_file_inputs(
    document: &Document,
    pending: Rc<RefCell<Vec<LoadResult>>>,
    tracker: Rc<RefCell<LoadTracker>>,
) -> Result<(), JsValue> {
    create_file_input(document, "Positions (.bin)", LoadKind::Positions, pending.clone(), tracker.clone())?;
    create_file_input(document, "Colors (.bin)", LoadKind::Colors, pending, tracker)?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn create_file_input(
    document: &Document,
    title: &str,
    kind: LoadKind,
    pending: Rc<RefCell<Vec<LoadResult>>>,
    tracker: Rc<RefCell<LoadTracker>>,
) -> Result<(), JsValue> {
    let body = document.body().ok_or(js_error("no body on document"))?;
    let input: HtmlInputElement = document
        .create_element("input")?
        .dyn_into()
        .map_err(|_| js_error("failed to create file input"))?;
    input.set_type("file");
    input.set_title(title);
    body.append_child(&input)?;

    let input_el = input.clone();
    let onchange = Closure::wrap(Box::new(move |_e: Event| {
        let Some(file) = input_el.files().and_then(|list| list.get(0)) else {
            return;
        };
        // The load is "started" now; later picks supersede this one
        let generation = tracker.borrow_mut().begin(kind);
        let name = file.name();

        let reader = match web_sys::FileReader::new() {
            Ok(reader) => reader,
            Err(e) => {
                tracing::error!(?e, "FileReader unavailable");
                return;
            }
        };

        {
            let pending = pending.clone();
            let reader_done = reader.clone();
            let name = name.clone();
            let onload = Closure::wrap(Box::new(move |_e: web_sys::ProgressEvent| {
                let data = reader_done
                    .result()
                    .ok()
                    .map(|buf| js_sys::Uint8Array::new(&buf).to_vec())
                    .ok_or_else(|| "file read produced no buffer".to_string());
                pending.borrow_mut().push(LoadResult {
                    kind,
                    generation,
                    source: name.clone(),
                    data,
                });
            }) as Box<dyn FnMut(web_sys::ProgressEvent)>);
            reader.set_onload(Some(onload.as_ref().unchecked_ref()));
            onload.forget();
        }

        {
            let pending = pending.clone();
            let name = name.clone();
            let onerror = Closure::wrap(Box::new(move |_e: web_sys::ProgressEvent| {
                pending.borrow_mut().push(LoadResult {
                    kind,
                    generation,
                    source: name.clone(),
                    data: Err("file read failed".to_string()),
                });
            }) as Box<dyn FnMut(web_sys::ProgressEvent)>);
            reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            onerror.forget();
        }

        if let Err(e) = reader.read_as_array_buffer(&file) {
            tracing::error!(?e, "failed to start file read");
        }
    }) as Box<dyn FnMut(Event)>);
    input.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
    onchange.forget();

    Ok(())
}

/// Fetch the demo buffers, positions before colors so the color apply has a
/// cloud to land on.
#[cfg(target_arch = "wasm32")]
fn fetch_demo_data(pending: Rc<RefCell<Vec<LoadResult>>>, tracker: Rc<RefCell<LoadTracker>>) {
    let pos_gen = tracker.borrow_mut().begin(LoadKind::Positions);
    let col_gen = tracker.borrow_mut().begin(LoadKind::Colors);

    wasm_bindgen_futures::spawn_local(async move {
        let data = fetch_binary(DEMO_POSITIONS_URL)
            .await
            .map_err(|e| format!("{e:?}"));
        pending.borrow_mut().push(LoadResult {
            kind: LoadKind::Positions,
            generation: pos_gen,
            source: DEMO_POSITIONS_URL.to_string(),
            data,
        });

        let data = fetch_binary(DEMO_COLORS_URL)
            .await
            .map_err(|e| format!("{e:?}"));
        pending.borrow_mut().push(LoadResult {
            kind: LoadKind::Colors,
            generation: col_gen,
            source: DEMO_COLORS_URL.to_string(),
            data,
        });
    });
}

#[cfg(target_arch = "wasm32")]
async fn fetch_binary(url: &str) -> Result<Vec<u8>, JsValue> {
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()
        .map_err(|_| js_error("fetch returned a non-Response"))?;
    if !response.ok() {
        return Err(js_error(format!("HTTP {}", response.status())));
    }
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Setup all input event listeners with platform-agnostic abstractions
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    document: &web_sys::Document,
    window: &web_sys::Window,
    canvas: &web_sys::HtmlCanvasElement,
    input_state: Rc<RefCell<InputState>>,
    egui_events: Rc<RefCell<Vec<egui::Event>>>,
    egui_ctx: egui::Context,
) -> Result<(), JsValue> {
    let input_processor = InputProcessor::default();

    // Keyboard down
    {
        let input_state = input_state.clone();
        let document_for_exit = document.clone();
        let input_processor = input_processor.clone();
        let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            let key = e.key();

            if input_processor.is_escape(&key) {
                document_for_exit.exit_pointer_lock();
            }

            if input_processor.is_navigation_key(&key) {
                e.prevent_default();
            }

            input_state.borrow_mut().pressed_keys.insert(key);
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // Keyboard up
    {
        let input_state = input_state.clone();
        let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            input_state.borrow_mut().pressed_keys.remove(e.key().as_str());
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }

    // Focus loss - clear all keys
    {
        let input_state = input_state.clone();
        let blur = Closure::wrap(Box::new(move |_e: Event| {
            input_state.borrow_mut().clear_keys();
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }

    // Visibility change - clear all keys
    {
        let input_state = input_state.clone();
        let visibility = Closure::wrap(Box::new(move |_e: Event| {
            input_state.borrow_mut().clear_keys();
        }) as Box<dyn FnMut(Event)>);
        document
            .add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
        visibility.forget();
    }

    // Pointer lock change
    {
        let input_state = input_state.clone();
        let doc_pl = document.clone();
        let plc = Closure::wrap(Box::new(move |_e: Event| {
            input_state.borrow_mut().pointer_locked = doc_pl.pointer_lock_element().is_some();
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("pointerlockchange", plc.as_ref().unchecked_ref())?;
        plc.forget();
    }

    // Canvas click to enter pointer lock, unless the UI wants the pointer
    {
        let canvas_click = canvas.clone();
        let egui_ctx_click = egui_ctx.clone();
        let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
            if egui_ctx_click.wants_pointer_input() {
                return;
            }
            if let Ok(html_el) = canvas_click.clone().dyn_into::<HtmlElement>() {
                html_el.request_pointer_lock();
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();
    }

    // Mouse move: look delta while locked, egui pointer otherwise
    {
        let input_state = input_state.clone();
        let egui_events_q = egui_events.clone();
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            if input_state.borrow().pointer_locked {
                let dx = e.movement_x() as f32;
                let dy = e.movement_y() as f32;
                input_state.borrow_mut().look_delta.0 += dx;
                input_state.borrow_mut().look_delta.1 += dy;
            } else {
                let px = e.client_x() as f32;
                let py = e.client_y() as f32;
                egui_events_q
                    .borrow_mut()
                    .push(egui::Event::PointerMoved(egui::pos2(px, py)));
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    // Mouse buttons feed egui while the pointer is free
    {
        let input_state = input_state.clone();
        let egui_events_q = egui_events.clone();
        let mousedown = Closure::wrap(Box::new(move |e: MouseEvent| {
            if !input_state.borrow().pointer_locked {
                egui_events_q.borrow_mut().push(egui::Event::PointerButton {
                    pos: egui::pos2(e.client_x() as f32, e.client_y() as f32),
                    button: egui::PointerButton::Primary,
                    pressed: true,
                    modifiers: egui::Modifiers::default(),
                });
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }

    {
        let input_state = input_state.clone();
        let egui_events_q = egui_events.clone();
        let mouseup = Closure::wrap(Box::new(move |e: MouseEvent| {
            if !input_state.borrow().pointer_locked {
                egui_events_q.borrow_mut().push(egui::Event::PointerButton {
                    pos: egui::pos2(e.client_x() as f32, e.client_y() as f32),
                    button: egui::PointerButton::Primary,
                    pressed: false,
                    modifiers: egui::Modifiers::default(),
                });
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;

    let width = window
        .inner_width()?
        .as_f64()
        .unwrap_or(800.0) as u32;
    let height = window
        .inner_height()?
        .as_f64()
        .unwrap_or(600.0) as u32;

    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    canvas_el.set_width(width.max(1));
    canvas_el.set_height(height.max(1));
    body.append_child(&canvas_el)?;
    Ok((window, document, canvas_el))
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

#[cfg(target_arch = "wasm32")]
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();

            // Recursively schedule next frame
            let cb_ref = callback_clone.borrow();
            window
                .request_animation_frame(cb_ref.as_ref().unwrap().as_ref().unchecked_ref())
                .expect("RAF failed");
        }) as Box<dyn FnMut()>));

        self.window
            .request_animation_frame(
                callback.borrow().as_ref().unwrap().as_ref().unchecked_ref(),
            )
            .expect("RAF start failed");

        // Leak the closure to keep it alive
        std::mem::forget(callback);
    }
}
