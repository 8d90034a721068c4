//! Window and event loop.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::TreeCounts;
use crate::error::AppError;
use crate::gpu::{BatchId, FrameUniforms, GpuState, OrbitCamera};
use crate::input::{Interaction, PointerAction};
use crate::particle::{Formation, ParticleKind};
use crate::scene::{self, SceneConfig};
use crate::spawn::SpawnContext;
use crate::time::FrameClock;
use crate::visuals::Material;
use crate::world::World;

/// Seconds between FPS reports in the debug log.
const FPS_REPORT_INTERVAL: f32 = 5.0;

/// GPU state plus the handles of every batch registered with it.
struct Renderer {
    gpu: GpuState,
    kinds: Vec<BatchId>,
    star: BatchId,
    dust: BatchId,
    star_core: BatchId,
}

impl Renderer {
    fn new(mut gpu: GpuState, world: &World) -> Self {
        let kinds = ParticleKind::ALL
            .iter()
            .map(|&kind| {
                gpu.add_batch(
                    &scene::particle_mesh(kind),
                    &scene::particle_material(kind),
                    world.tree().batch(kind),
                )
            })
            .collect();

        let speck = scene::speck_mesh();
        let star = gpu.add_batch(&speck, &Material::star(), world.star().batch());
        let dust = gpu.add_batch(
            &speck,
            &Material::sparkle(world.dust().config()),
            world.dust().batch(),
        );
        let star_core = gpu.add_batch(
            &speck,
            &Material::sparkle(world.star_core().config()),
            world.star_core().batch(),
        );

        Self {
            gpu,
            kinds,
            star,
            dust,
            star_core,
        }
    }

    /// Push this frame's instance data and visibility to the GPU.
    fn upload(&mut self, world: &mut World, formation: Formation) {
        for (&kind, &id) in ParticleKind::ALL.iter().zip(&self.kinds) {
            self.gpu.upload(id, world.tree_mut().batch_mut(kind));
        }
        self.gpu.upload(self.star, world.star_mut().batch_mut());
        self.gpu.upload(self.dust, world.dust_mut().batch_mut());
        self.gpu.upload(self.star_core, world.star_core_mut().batch_mut());
        self.gpu
            .set_visible(self.star_core, World::star_core_visible(formation));
    }
}

pub struct App {
    scene: SceneConfig,
    world: World,
    input: Interaction,
    camera: OrbitCamera,
    clock: FrameClock,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    error: Option<AppError>,
    last_fps_report: f32,
}

impl App {
    pub fn new(scene: SceneConfig, world: World) -> Self {
        let camera = OrbitCamera::new(&scene.camera, scene.orbit);
        Self {
            scene,
            world,
            input: Interaction::new(),
            camera,
            clock: FrameClock::new(),
            window: None,
            renderer: None,
            error: None,
            last_fps_report: 0.0,
        }
    }

    /// Record a fatal error for [`run`] to return and stop the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        self.error = Some(error);
        event_loop.exit();
    }

    fn apply(&mut self, action: PointerAction) {
        match action {
            PointerAction::Toggle(formation) => {
                log::info!("formation -> {formation:?}");
                if let Some(window) = &self.window {
                    window.set_title(&scene::window_title(formation));
                }
            }
            PointerAction::Orbit(delta) => {
                let height = self
                    .renderer
                    .as_ref()
                    .map_or(0.0, |r| r.gpu.config.height as f32);
                self.camera.orbit(delta, height);
            }
            PointerAction::Zoom(lines) => self.camera.zoom(lines),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        let (time, delta) = self.clock.tick();
        let formation = self.input.formation();

        self.camera.auto_rotate(delta, formation);
        self.world.update(time, formation, &self.scene);
        renderer.upload(&mut self.world, formation);

        let lights = self.world.lights(time, &self.scene);
        let uniforms = FrameUniforms::new(
            self.camera.view_proj(renderer.gpu.aspect()),
            self.camera.position(),
            self.scene.lights.ambient,
            self.scene.lights.ambient_intensity,
            &lights,
        );
        renderer.gpu.write_frame(&uniforms);

        match renderer.gpu.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("dropped frame: {e:?}"),
        }

        if time - self.last_fps_report >= FPS_REPORT_INTERVAL {
            log::debug!("{:.1} fps (frame {})", self.clock.fps(), self.clock.frame());
            self.last_fps_report = time;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(scene::window_title(self.input.formation()))
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match pollster::block_on(GpuState::new(window.clone(), &self.scene)) {
            Ok(gpu) => {
                self.renderer = Some(Renderer::new(gpu, &self.world));
                self.window = Some(window.clone());
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.gpu.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            other => {
                if let Some(action) = self.input.handle_event(&other) {
                    self.apply(action);
                }
            }
        }
    }
}

/// Generate the scene, open the window and run until it closes.
pub fn run() -> Result<(), AppError> {
    let scene = SceneConfig::default();
    let mut ctx = SpawnContext::from_clock();
    let world = World::generate(&TreeCounts::DEFAULT, &mut ctx);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(scene, world);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
