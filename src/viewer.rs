//! Interactive depth-cloud viewer.
//!
//! The viewer is the render host: it owns the window, the orbit camera, the
//! clock and the live [`FrameParams`], and each frame publishes one immutable
//! [`FrameSnapshot`] to the GPU before drawing.
//!
//! # Example
//!
//! ```ignore
//! use depthcloud::prelude::*;
//!
//! Viewer::new()
//!     .with_map_files("portrait.png", "portrait_depth.png")
//!     .with_grid_size(280)
//!     .run()?;
//! ```
//!
//! # Keys
//!
//! | key | action |
//! |---|---|
//! | `1`..`9` | apply preset |
//! | `R` | reset parameters to defaults, and the camera |
//! | `Space` | pause / resume time |
//! | `I` `S` `B` `W` `T` | toggle depthReverse, useSprite, additive, depthWrite, depthTest |
//! | `Up` / `Down` | morph ± 0.05 |
//! | `Left` / `Right` | focus ∓ 0.02 |
//! | `Esc` | quit |
//!
//! Dropping two image files on the window replaces the portrait: the first
//! is taken as the color map, the second as the depth map.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::error::ViewerError;
use crate::gpu::camera::OrbitCamera;
use crate::gpu::GpuState;
use crate::input::{Input, KeyCode};
use crate::layout::{self, ParticleAttributes, DEFAULT_GRID_SIZE};
use crate::params::{FrameParams, ParamKey};
use crate::presets::PresetLibrary;
use crate::program::{evaluate_frame, FrameStats};
use crate::sprite::{SpriteMask, DEFAULT_SPRITE_SIZE};
use crate::textures::SourceMaps;
use crate::time::Clock;
use crate::uniforms::FrameSnapshot;

/// Background behind the cloud.
pub const CLEAR_COLOR: [f64; 3] = [0.02, 0.03, 0.04];
pub const MORPH_STEP: f32 = 0.05;
pub const FOCUS_STEP: f32 = 0.02;
/// Minimum time between two frame statistics log lines.
const STATS_INTERVAL: Duration = Duration::from_millis(250);

/// Something the user asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Apply the preset at this index.
    ApplyPreset(usize),
    Reset,
    TogglePause,
    Toggle(ParamKey),
    Nudge(ParamKey, f32),
    Quit,
}

/// Keyboard binding for `key`, if any.
pub fn action_for_key(key: KeyCode) -> Option<Action> {
    let action = match key {
        KeyCode::Digit(d @ 1..=9) => Action::ApplyPreset(d as usize - 1),
        KeyCode::R => Action::Reset,
        KeyCode::Space => Action::TogglePause,
        KeyCode::I => Action::Toggle(ParamKey::DepthReverse),
        KeyCode::S => Action::Toggle(ParamKey::UseSprite),
        KeyCode::B => Action::Toggle(ParamKey::Additive),
        KeyCode::W => Action::Toggle(ParamKey::DepthWrite),
        KeyCode::T => Action::Toggle(ParamKey::DepthTest),
        KeyCode::Up => Action::Nudge(ParamKey::Morph, MORPH_STEP),
        KeyCode::Down => Action::Nudge(ParamKey::Morph, -MORPH_STEP),
        KeyCode::Left => Action::Nudge(ParamKey::Focus, -FOCUS_STEP),
        KeyCode::Right => Action::Nudge(ParamKey::Focus, FOCUS_STEP),
        KeyCode::Escape => Action::Quit,
        _ => return None,
    };
    Some(action)
}

/// Window-independent viewer state.
pub struct Session {
    particles: Vec<ParticleAttributes>,
    maps: SourceMaps,
    params: FrameParams,
    presets: PresetLibrary,
    pub clock: Clock,
    pub camera: OrbitCamera,
    /// Parameters or maps changed since the last statistics pass.
    dirty: bool,
}

impl Session {
    pub fn new(particles: Vec<ParticleAttributes>, maps: SourceMaps, params: FrameParams, presets: PresetLibrary) -> Self {
        Self {
            particles,
            maps,
            params,
            presets,
            clock: Clock::new(),
            camera: OrbitCamera::new(),
            dirty: true,
        }
    }

    pub fn particles(&self) -> &[ParticleAttributes] {
        &self.particles
    }

    pub fn maps(&self) -> &SourceMaps {
        &self.maps
    }

    pub fn params(&self) -> &FrameParams {
        &self.params
    }

    /// Edit parameters in place. Marks the frame statistics stale.
    pub fn params_mut(&mut self) -> &mut FrameParams {
        self.dirty = true;
        &mut self.params
    }

    pub fn presets(&self) -> &PresetLibrary {
        &self.presets
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Swap the source maps. The caller uploads them to the GPU between frames.
    pub fn replace_maps(&mut self, maps: SourceMaps) {
        self.maps = maps;
        self.dirty = true;
    }

    /// Apply an action. Returns false when the viewer should close.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::ApplyPreset(index) => match self.presets.get(index) {
                Some(preset) => {
                    preset.values.apply(&mut self.params);
                    self.dirty = true;
                    log::info!("applied preset '{}'", preset.name);
                }
                None => log::debug!("no preset in slot {}", index + 1),
            },
            Action::Reset => {
                self.params = FrameParams::default();
                self.camera.reset();
                self.dirty = true;
                log::info!("reset parameters");
            }
            Action::TogglePause => {
                let paused = self.clock.toggle_pause();
                log::info!("{}", if paused { "paused" } else { "resumed" });
            }
            Action::Toggle(key) => {
                if let Some(on) = self.params.toggle(key) {
                    self.dirty = true;
                    log::info!("{} = {}", key.name(), on);
                }
            }
            Action::Nudge(key, delta) => {
                if let Some(v) = self.params.nudge(key, delta) {
                    self.dirty = true;
                    log::debug!("{} = {:.2}", key.name(), v);
                }
            }
            Action::Quit => return false,
        }
        true
    }

    /// Freeze the current parameters, time and camera into one snapshot.
    pub fn publish(&self, viewport: Vec2) -> FrameSnapshot {
        let aspect = if viewport.y > 0.0 { viewport.x / viewport.y } else { 1.0 };
        FrameSnapshot::new(
            self.params,
            self.clock.elapsed(),
            self.camera.view_matrix(),
            self.camera.projection(aspect),
            viewport,
        )
    }

    /// Evaluate `snapshot` on the CPU and clear the stale flag.
    pub fn frame_stats(&mut self, snapshot: &FrameSnapshot) -> FrameStats {
        self.dirty = false;
        FrameStats::from_points(&evaluate_frame(&self.particles, &self.maps, snapshot))
    }
}

/// Pairs up files dropped on the window, color first, then depth.
#[derive(Debug, Default)]
pub struct MapDrop {
    color: Option<PathBuf>,
}

impl MapDrop {
    /// Record a dropped file. Returns the complete `(color, depth)` pair once
    /// the second file arrives.
    pub fn push(&mut self, path: PathBuf) -> Option<(PathBuf, PathBuf)> {
        match self.color.take() {
            Some(color) => Some((color, path)),
            None => {
                self.color = Some(path);
                None
            }
        }
    }

    pub fn pending_color(&self) -> Option<&PathBuf> {
        self.color.as_ref()
    }
}

enum MapSource {
    Loaded(SourceMaps),
    Files(PathBuf, PathBuf),
}

/// Builder for the viewer window.
pub struct Viewer {
    maps: Option<MapSource>,
    grid_size: u32,
    sprite_size: u32,
    params: FrameParams,
    presets: PresetLibrary,
    title: String,
    window_size: (u32, u32),
}

impl Viewer {
    pub fn new() -> Self {
        Self {
            maps: None,
            grid_size: DEFAULT_GRID_SIZE,
            sprite_size: DEFAULT_SPRITE_SIZE,
            params: FrameParams::default(),
            presets: PresetLibrary::builtin(),
            title: "depthcloud".to_string(),
            window_size: (1280, 720),
        }
    }

    /// Use an already loaded color/depth pair.
    pub fn with_maps(mut self, maps: SourceMaps) -> Self {
        self.maps = Some(MapSource::Loaded(maps));
        self
    }

    /// Load the color/depth pair from disk when the viewer starts.
    pub fn with_map_files(mut self, color: impl Into<PathBuf>, depth: impl Into<PathBuf>) -> Self {
        self.maps = Some(MapSource::Files(color.into(), depth.into()));
        self
    }

    /// Particle grid edge length (`S`, giving `S²` particles).
    pub fn with_grid_size(mut self, size: u32) -> Self {
        self.grid_size = size;
        self
    }

    pub fn with_sprite_size(mut self, size: u32) -> Self {
        self.sprite_size = size;
        self
    }

    /// Starting parameters. Reset still returns to the defaults.
    pub fn with_params(mut self, params: FrameParams) -> Self {
        self.params = params;
        self
    }

    /// Add presets after the built-in ones (same names replace them).
    pub fn with_presets(mut self, presets: PresetLibrary) -> Self {
        self.presets.extend(presets);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Open the window and run until it is closed.
    pub fn run(self) -> Result<(), ViewerError> {
        let maps = match self.maps {
            Some(MapSource::Loaded(maps)) => maps,
            Some(MapSource::Files(color, depth)) => SourceMaps::load(color, depth)?,
            None => return Err(ViewerError::MissingMaps),
        };
        let particles = layout::generate(self.grid_size)?;
        let sprite = SpriteMask::generate(self.sprite_size);
        log::info!(
            "{} particles from a {}x{} grid, maps {}x{}",
            particles.len(),
            self.grid_size,
            self.grid_size,
            maps.width(),
            maps.height()
        );

        let session = Session::new(particles, maps, self.params, self.presets);
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = App {
            title: self.title,
            window_size: self.window_size,
            window: None,
            gpu: None,
            input: Input::new(),
            dropped: MapDrop::default(),
            session,
            sprite,
            last_stats: None,
            error: None,
            #[cfg(feature = "egui")]
            egui: None,
        };
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    title: String,
    window_size: (u32, u32),
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    input: Input,
    dropped: MapDrop,
    session: Session,
    sprite: SpriteMask,
    last_stats: Option<Instant>,
    /// First fatal error; returned from `Viewer::run`.
    error: Option<ViewerError>,
    #[cfg(feature = "egui")]
    egui: Option<crate::gpu::egui_integration::EguiIntegration>,
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        log::error!("{}", err);
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let (width, height) = self.window_size;
        let window_attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.session.particles(),
            self.session.maps(),
            &self.sprite,
            CLEAR_COLOR,
        ))?;

        #[cfg(feature = "egui")]
        {
            self.egui = Some(crate::gpu::egui_integration::EguiIntegration::new(
                &gpu.device,
                gpu.config.format,
                &window,
            ));
        }

        window.request_redraw();
        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    fn file_dropped(&mut self, path: PathBuf) {
        let Some((color, depth)) = self.dropped.push(path) else {
            if let Some(color) = self.dropped.pending_color() {
                log::info!("color map '{}' queued; drop the depth map next", color.display());
            }
            return;
        };
        match SourceMaps::load(&color, &depth) {
            Ok(maps) => {
                // Between frames, so the next render sees the whole new pair
                if let Some(gpu) = &mut self.gpu {
                    if let Err(err) = gpu.replace_maps(&maps) {
                        log::warn!("keeping current maps: {}", err);
                        return;
                    }
                }
                self.session.replace_maps(maps);
            }
            Err(err) => log::warn!("keeping current maps: {}", err),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(gpu)) = (self.window.clone(), self.gpu.as_mut()) else {
            return;
        };

        self.session.clock.tick();

        let viewport = Vec2::new(gpu.config.width as f32, gpu.config.height as f32);
        let keys: Vec<KeyCode> = self.input.pressed_keys().collect();
        for action in keys.into_iter().filter_map(action_for_key) {
            if !self.session.apply(action) {
                event_loop.exit();
                return;
            }
        }
        self.session.camera.rotate_by_pixels(self.input.drag_delta(), viewport.y);
        self.session.camera.dolly(self.input.scroll_delta());
        self.input.begin_frame();
        let moving = self.session.camera.update();

        #[cfg(feature = "egui")]
        let egui_output = match self.egui.as_mut() {
            Some(egui) => {
                let session = &mut self.session;
                let mut actions = Vec::new();
                let output = egui.run(&window, |ctx| controls_panel(ctx, session, &mut actions));
                for action in actions {
                    session.apply(action);
                }
                Some(output)
            }
            None => None,
        };

        let snapshot = self.session.publish(viewport);
        let stats_due = self.last_stats.map_or(true, |t| t.elapsed() >= STATS_INTERVAL);
        if self.session.is_dirty() && stats_due {
            let stats = self.session.frame_stats(&snapshot);
            log::info!("frame: {}", stats);
            self.last_stats = Some(Instant::now());
        }

        #[cfg(feature = "egui")]
        let result = gpu.render(
            &snapshot.uniforms(),
            snapshot.params.render_state(),
            self.egui.as_mut().zip(egui_output.as_ref()),
        );
        #[cfg(not(feature = "egui"))]
        let result = gpu.render(&snapshot.uniforms(), snapshot.params.render_state());

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = window.inner_size();
                gpu.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }

        // Render on demand once time is frozen and the camera has settled.
        if !self.session.clock.is_paused() || moving || self.session.is_dirty() {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.create_window(event_loop) {
                self.fail(event_loop, err);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        if let (Some(egui), Some(window)) = (self.egui.as_mut(), self.window.as_ref()) {
            let consumed = egui.on_window_event(window, &event);
            if consumed || egui.wants_input() {
                window.request_redraw();
                if !matches!(
                    event,
                    WindowEvent::RedrawRequested | WindowEvent::Resized(_) | WindowEvent::DroppedFile(_)
                ) {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::DroppedFile(path) => {
                self.file_dropped(path);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            other => {
                self.input.handle_event(&other);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
        }
    }
}

#[cfg(feature = "egui")]
fn controls_panel(ctx: &egui::Context, session: &mut Session, actions: &mut Vec<Action>) {
    egui::Window::new("Controls")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                for (index, preset) in session.presets().iter().enumerate() {
                    if ui.button(&preset.name).on_hover_text(&preset.description).clicked() {
                        actions.push(Action::ApplyPreset(index));
                    }
                }
            });
            ui.separator();

            let mut params = *session.params();
            let mut changed = false;
            for key in ParamKey::ALL {
                match key.spec() {
                    Some(spec) => {
                        if let Some(value) = params.float_mut(key) {
                            let slider = egui::Slider::new(value, spec.min..=spec.max)
                                .step_by(spec.step as f64)
                                .text(spec.label);
                            changed |= ui.add(slider).on_hover_text(spec.description).changed();
                        }
                    }
                    None => {
                        if let Some(on) = params.toggle_mut(key) {
                            changed |= ui.checkbox(on, key.label()).changed();
                        }
                    }
                }
            }
            if changed {
                *session.params_mut() = params;
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Reset").clicked() {
                    actions.push(Action::Reset);
                }
                let label = if session.clock.is_paused() { "Resume" } else { "Pause" };
                if ui.button(label).clicked() {
                    actions.push(Action::TogglePause);
                }
                ui.label(format!("{:.0} fps", session.clock.fps()));
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textures::TextureConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session() -> Session {
        let color = TextureConfig::solid(4, 4, [128, 128, 128, 255]).unwrap();
        let depth = TextureConfig::solid(4, 4, [153, 153, 153, 255]).unwrap();
        let maps = SourceMaps::new(color, depth).unwrap();
        let particles = layout::generate_with_rng(4, &mut StdRng::seed_from_u64(7)).unwrap();
        Session::new(particles, maps, FrameParams::default(), PresetLibrary::builtin())
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(action_for_key(KeyCode::Digit(1)), Some(Action::ApplyPreset(0)));
        assert_eq!(action_for_key(KeyCode::Digit(9)), Some(Action::ApplyPreset(8)));
        assert_eq!(action_for_key(KeyCode::Digit(0)), None);
        assert_eq!(action_for_key(KeyCode::B), Some(Action::Toggle(ParamKey::Additive)));
        assert_eq!(action_for_key(KeyCode::Down), Some(Action::Nudge(ParamKey::Morph, -0.05)));
        assert_eq!(action_for_key(KeyCode::Other), None);
    }

    #[test]
    fn test_preset_then_reset() {
        let mut s = session();
        assert!(s.apply(Action::ApplyPreset(2)));
        assert_eq!(s.params().morph, 0.2);
        assert!(!s.params().use_sprite);

        // empty slot is ignored
        assert!(s.apply(Action::ApplyPreset(7)));
        assert_eq!(s.params().morph, 0.2);

        s.apply(Action::Reset);
        assert_eq!(*s.params(), FrameParams::default());
    }

    #[test]
    fn test_reset_ignores_starting_params() {
        let mut s = session();
        let start = FrameParams {
            focus: 0.9,
            depth_scale: 2.5,
            ..FrameParams::default()
        };
        s = Session::new(s.particles.clone(), s.maps.clone(), start, PresetLibrary::builtin());
        assert_eq!(s.params().focus, 0.9);

        s.apply(Action::Reset);
        assert_eq!(*s.params(), FrameParams::default());
    }

    #[test]
    fn test_toggle_and_nudge() {
        let mut s = session();
        s.apply(Action::Toggle(ParamKey::Additive));
        assert!(s.params().additive);
        s.apply(Action::Nudge(ParamKey::Morph, MORPH_STEP));
        assert_eq!(s.params().morph, 1.0);
        s.apply(Action::Nudge(ParamKey::Focus, -FOCUS_STEP));
        assert!((s.params().focus - 0.48).abs() < 1e-6);
        assert!(!s.apply(Action::Quit));
    }

    #[test]
    fn test_pause_action() {
        let mut s = session();
        s.apply(Action::TogglePause);
        assert!(s.clock.is_paused());
        s.clock.advance(1.0);
        assert_eq!(s.publish(Vec2::new(640.0, 480.0)).elapsed, 0.0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut s = session();
        let snapshot = s.publish(Vec2::new(640.0, 480.0));
        s.params_mut().focus = 0.9;
        assert_eq!(snapshot.params.focus, 0.5);
        assert_eq!(s.params().focus, 0.9);
    }

    #[test]
    fn test_map_drop_pairs_color_then_depth() {
        let mut drop = MapDrop::default();
        assert_eq!(drop.push("face.png".into()), None);
        assert_eq!(drop.pending_color(), Some(&PathBuf::from("face.png")));
        assert_eq!(
            drop.push("face_depth.png".into()),
            Some((PathBuf::from("face.png"), PathBuf::from("face_depth.png")))
        );
        assert_eq!(drop.pending_color(), None);
    }

    #[test]
    fn test_replace_maps_marks_dirty() {
        let mut s = session();
        let snapshot = s.publish(Vec2::new(640.0, 480.0));
        s.frame_stats(&snapshot);

        let color = TextureConfig::solid(2, 2, [0, 0, 0, 255]).unwrap();
        let depth = TextureConfig::solid(2, 2, [255, 255, 255, 255]).unwrap();
        s.replace_maps(SourceMaps::new(color, depth).unwrap());
        assert!(s.is_dirty());
        assert_eq!(s.maps().width(), 2);
        // black color map falls under the density cut everywhere
        assert_eq!(s.frame_stats(&snapshot).visible, 0);
    }

    #[test]
    fn test_stats_clear_dirty_flag() {
        let mut s = session();
        assert!(s.is_dirty());
        let snapshot = s.publish(Vec2::new(640.0, 480.0));
        let stats = s.frame_stats(&snapshot);
        assert_eq!(stats.total, 16);
        assert_eq!(stats.visible, 16);
        assert!(!s.is_dirty());

        s.params_mut().depth_cut = 0.9;
        let stats = s.frame_stats(&s.publish(Vec2::new(640.0, 480.0)));
        assert_eq!(stats.visible, 0);
    }
}
