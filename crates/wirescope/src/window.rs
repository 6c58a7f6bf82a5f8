//! The viewer window and its event loop.
//!
//! [`ViewerApp`] implements [`winit::application::ApplicationHandler`]: it
//! opens the window, brings up the GPU, forwards mouse and keyboard input to
//! the camera and settings, hands files to the background loader and renders
//! one frame per redraw.
//!
//! Files come from the command line or from drag-and-drop. winit reports a
//! multi-file drop as one `DroppedFile` event per file, all before the loop
//! next goes idle, so drops are collected and sent as a single request from
//! `about_to_wait`. That keeps a `.gltf` together with its `.bin` and images.

use std::path::PathBuf;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::asset::NamedFile;
use crate::camera::OrbitCamera;
use crate::error::{DeviceInitError, RunError};
use crate::input::{OrbitInput, key_update};
use crate::loader::{AssetLoader, LoadResult};
use crate::render::{GraphicsContext, Renderer};
use crate::settings::{RenderSettings, SettingsUpdate};
use crate::time::FrameClock;

pub const DEFAULT_TITLE: &str = "wirescope";

/// Window, GPU and renderer. Exists from the first `resumed` on.
struct Session {
    window: Arc<Window>,
    gpu: GraphicsContext,
    renderer: Renderer,
}

/// Viewer state driven by the winit event loop.
pub struct ViewerApp {
    session: Option<Session>,
    camera: OrbitCamera,
    input: OrbitInput,
    loader: AssetLoader,
    clock: FrameClock,
    /// Paths queued before the window existed or dropped since the last idle.
    pending: Vec<PathBuf>,
    model_name: Option<String>,
    title: String,
    fatal: Option<DeviceInitError>,
}

impl ViewerApp {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            session: None,
            camera: OrbitCamera::new(),
            input: OrbitInput::default(),
            loader: AssetLoader::new(),
            clock: FrameClock::new(),
            pending: paths,
            model_name: None,
            title: DEFAULT_TITLE.to_string(),
            fatal: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), DeviceInitError> {
        let attrs = Window::default_attributes()
            .with_title(DEFAULT_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let gpu = GraphicsContext::new(window.clone())?;
        let renderer = Renderer::new(&gpu);
        let (width, height) = gpu.surface_size();
        self.camera.set_aspect(width, height);
        sync_camera(&mut self.camera, renderer.settings());

        window.request_redraw();
        self.session = Some(Session {
            window,
            gpu,
            renderer,
        });
        Ok(())
    }

    /// Send queued paths to the loader as one request.
    fn flush_pending(&mut self) {
        if self.pending.is_empty() || self.session.is_none() {
            return;
        }
        let files: Vec<NamedFile> = self
            .pending
            .drain(..)
            .filter_map(|path| match NamedFile::read(&path) {
                Ok(file) => Some(file),
                Err(e) => {
                    log::error!("cannot read {}: {e}", path.display());
                    None
                }
            })
            .collect();
        if !files.is_empty() {
            self.loader.request(files);
        }
    }

    fn apply_update(&mut self, update: SettingsUpdate) {
        let Some(session) = &mut self.session else {
            return;
        };
        let delta = session.renderer.update_settings(&session.gpu, update);
        sync_camera(&mut self.camera, session.renderer.settings());
        if delta.rotation_axis {
            self.camera.reset_model_rotation();
        }
    }

    fn finish_load(&mut self, result: LoadResult) {
        let Some(session) = &mut self.session else {
            return;
        };
        match result.outcome {
            Ok(mesh) => {
                self.camera.fit_to_mesh(mesh.center, mesh.radius);
                self.camera.reset_model_rotation();
                session.renderer.upload_mesh(&session.gpu, mesh);
                self.model_name = result.files.into_iter().find(|name| {
                    let lower = name.to_ascii_lowercase();
                    lower.ends_with(".glb") || lower.ends_with(".gltf")
                });
                // Keep the upload out of the next frame delta.
                self.clock.reset();
            }
            Err(e) => log::error!("load #{} failed: {e}", result.request),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.clock.tick();
        if let Some(result) = self.loader.poll() {
            self.finish_load(result);
        }
        self.camera.update(self.clock.delta_secs());

        let Some(session) = &mut self.session else {
            return;
        };
        let scale_factor = session.window.scale_factor() as f32;
        match session.renderer.render(&session.gpu, &self.camera, scale_factor) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                session.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("surface error: {e:?}"),
        }

        let title = window_title(
            self.model_name.as_deref(),
            session.renderer.mesh_stats(),
            self.clock.fps(),
            self.loader.is_loading(),
        );
        if title != self.title {
            session.window.set_title(&title);
            self.title = title;
        }
        session.window.request_redraw();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            log::error!("{e}");
            self.fatal = Some(e);
            event_loop.exit();
            return;
        }
        self.flush_pending();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested, exiting");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(session) = &mut self.session {
                    session
                        .renderer
                        .resize(&mut session.gpu, size.width, size.height);
                    self.camera.set_aspect(size.width, size.height);
                    log::info!("resized to {}x{}", size.width, size.height);
                }
            }

            WindowEvent::DroppedFile(path) => self.pending.push(path),

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                let update = self
                    .session
                    .as_ref()
                    .and_then(|s| key_update(key, s.renderer.settings()));
                if let Some(update) = update {
                    self.apply_update(update);
                }
            }

            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => {
                    if self.input.press(button, &mut self.camera) {
                        self.apply_update(SettingsUpdate {
                            auto_rotate: Some(false),
                            ..Default::default()
                        });
                    }
                }
                ElementState::Released => self.input.release(button),
            },

            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .cursor_moved(position.x, position.y, &mut self.camera);
            }

            WindowEvent::CursorLeft { .. } => self.input.cursor_left(),

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll_up = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32,
                };
                self.input.wheel(scroll_up, &mut self.camera);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.flush_pending();
    }
}

/// Copy the rotation settings onto the camera.
fn sync_camera(camera: &mut OrbitCamera, settings: &RenderSettings) {
    camera.auto_rotate = settings.auto_rotate;
    camera.rotation_speed = settings.rotation_speed;
    camera.rotation_axis = settings.rotation_axis;
}

/// `"wirescope"` until a model is shown, then its name and statistics.
pub fn window_title(
    model: Option<&str>,
    stats: Option<crate::mesh::MeshStats>,
    fps: u32,
    loading: bool,
) -> String {
    let mut title = match (model, stats) {
        (Some(model), Some(stats)) => format!(
            "{DEFAULT_TITLE} - {model} | {} vertices, {} edges, {} triangles | {fps} fps",
            stats.vertices, stats.edges, stats.triangles
        ),
        _ => DEFAULT_TITLE.to_string(),
    };
    if loading {
        title.push_str(" (loading...)");
    }
    title
}

/// Open the viewer on `paths` and run until the window closes.
pub fn run(paths: Vec<PathBuf>) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = ViewerApp::new(paths);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
