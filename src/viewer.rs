//! Viewer application and event loop.
//!
//! Drives one [`Stage`] through its lifecycle:
//! 1. Window creation and GPU [`Context`] setup
//! 2. Stage assembly (camera, lights, glow) and the async model load
//! 3. The per-frame loop: advance damping and the entrance tween, write
//!    buffers, render, request the next frame
//! 4. Teardown on close: cancel the load, release resources, exit
//!
//! The load completes on the event-loop thread via a user event, so the
//! asset is attached in one synchronous step between frames; a render pass
//! never observes a half-built pivot.

use std::sync::Arc;

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::Context,
    data_structures::{scene_graph::SceneNode, transform::Transform},
    render::render_stage,
    resources::load_model_gltf,
    stage::{Stage, StageOptions},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) enum ViewerEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    ModelLoaded(anyhow::Result<SceneNode>),
}

impl std::fmt::Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::ModelLoaded(result) => f
                .debug_tuple("ModelLoaded")
                .field(&result.as_ref().map(|node| &node.name))
                .finish(),
        }
    }
}

/// Application state bundle: GPU context, stage, and surface status.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    pub(crate) stage: Stage,
    is_surface_configured: bool,
    mouse_pressed: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, options: StageOptions) -> anyhow::Result<Self> {
        let mut ctx = Context::new(window).await?;
        let stage = Stage::new(options);

        ctx.camera.controller.auto_rotate = stage.options().auto_rotate;
        ctx.camera.controller.auto_rotate_speed = stage.options().auto_rotate_speed;
        ctx.camera.controller.set_target(stage.orbit_target());
        let light_uniform = stage.light_uniform();
        ctx.light.write(&ctx.queue, light_uniform);

        Ok(Self {
            ctx,
            stage,
            is_surface_configured: false,
            mouse_pressed: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.is_surface_configured = true;
            self.ctx.resize(width, height);
        }
    }

    fn render(&mut self, dt: Duration) -> Result<(), wgpu::SurfaceError> {
        // Invoke the next iteration of the render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        // Entrance animation, then camera damping
        self.stage.update(dt);
        self.ctx
            .camera
            .controller
            .update(&mut self.ctx.camera.camera, dt);
        self.ctx
            .camera
            .uniform
            .update_view_proj(&self.ctx.camera.camera, &self.ctx.projection);
        self.ctx.queue.write_buffer(
            &self.ctx.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.ctx.camera.uniform]),
        );

        // Upload whatever the graph acquired since the last frame
        if let Err(e) = self.stage.root_mut().upload(
            &self.ctx.device,
            &self.ctx.queue,
            &self.ctx.material_layout,
            &self.ctx.sprite_layout,
        ) {
            log::error!("failed to upload scene resources: {:#}", e);
        }
        self.stage
            .root()
            .write_world_transforms(&self.ctx.queue, &Transform::default());

        render_stage(&self.ctx, &self.stage)
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<ViewerEvent>,
    state: Option<AppState>,
    // Consumed by `resumed`; `Option` so it can be `take()`n once.
    options: Option<StageOptions>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, options: StageOptions) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            options: Some(options),
            last_time: Instant::now(),
        })
    }

    /// Kick off the asynchronous model load.
    ///
    /// The result is posted back to the event loop; a completion that loses
    /// the race against teardown is dropped by the stage.
    fn spawn_load(&self, stage: &Stage) {
        let token = stage.load_token();
        let path = stage.options().model_path.clone();
        let proxy = self.proxy.clone();

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(async move {
            let result = load_model_gltf(&path).await;
            if token.is_cancelled() {
                log::info!("model load finished after cancellation");
                return;
            }
            if proxy.send_event(ViewerEvent::ModelLoaded(result)).is_err() {
                log::warn!("event loop closed before the model could be delivered");
            }
        });

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            let result = load_model_gltf(&path).await;
            if token.is_cancelled() {
                log::info!("model load finished after cancellation");
                return;
            }
            let _ = proxy.send_event(ViewerEvent::ModelLoaded(result));
        });
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let options = self.options.take().unwrap_or_default();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let app_state = self.async_runtime.block_on(AppState::new(window, options));
            match app_state {
                Ok(app_state) => {
                    self.spawn_load(&app_state.stage);
                    self.state = Some(app_state);
                }
                Err(e) => {
                    log::error!("viewer initialization failed: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match AppState::new(window, options).await {
                    Ok(app_state) => assert!(
                        proxy
                            .send_event(ViewerEvent::Initialized(Box::new(app_state)))
                            .is_ok()
                    ),
                    Err(e) => log::error!("viewer initialization failed: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Initialized(app_state) => {
                // This is the message from our wasm `spawn_local`
                self.spawn_load(&app_state.stage);
                self.state = Some(*app_state);

                let state = self.state.as_mut().unwrap();
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
            }
            ViewerEvent::ModelLoaded(result) => {
                let state = match &mut self.state {
                    Some(state) => state,
                    None => return,
                };
                match result {
                    Ok(asset) => {
                        // Attaching is one synchronous step: recenter, wrap,
                        // place, retarget the orbit.
                        state.stage.attach_model(asset);
                        state
                            .ctx
                            .camera
                            .controller
                            .set_target(state.stage.orbit_target());
                    }
                    Err(e) => state.stage.on_load_failure(&e),
                }
                state.ctx.window.request_redraw();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if state.mouse_pressed {
                state.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => {
                // Cancel the loop and the load before releasing resources
                state.stage.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(dt) {
                    Ok(_) => (),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => {
                state.mouse_pressed = button_state.is_pressed();
            }
            _ => {}
        }
    }
}

/// Open a window and run the viewer until it is closed.
pub fn run(options: StageOptions) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, options)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
