//! Window, event loop and per-frame orchestration.
//!
//! Each frame runs PollInput (winit events), UpdateMIDI, Update, Draw,
//! ShaderPass and Present, paced to the configured frame rate.

pub mod clock;
pub mod overlay;
pub mod stage;

pub use clock::FrameClock;
pub use overlay::{hud_title, HudInfo};
pub use stage::Stage;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::audio::{AudioOutput, SampleLibrary};
use crate::cli::Presentation;
use crate::config::{ConfigError, SynthConfig};
use crate::gpu::{load_shader_source, validate_wgsl, Display, DisplayError, ShaderError};
use crate::midi::{MidiInputPort, MidiRouter, CC_MAX};
use crate::visualizations::{build_registry, RegistryError, Switcher, SynthContext};

/// Failures that abort startup. Everything after the first frame degrades
/// instead.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("Display setup failed: {0}")]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Everything a running session owns.
pub struct App {
    config: SynthConfig,
    presentation: Presentation,
    shader_source: String,
    stage: Stage,
    clock: FrameClock,
    overlay: bool,
    brightness: Arc<AtomicU32>,
    midi: Option<Arc<MidiRouter>>,
    _midi_port: Option<MidiInputPort>,
    _audio: Option<AudioOutput>,
    window: Option<Arc<Window>>,
    display: Option<Display>,
    title: String,
    startup_error: Option<StartupError>,
}

impl App {
    /// Connect devices, build the registry and validate the shader. The
    /// window is created later, when the event loop resumes.
    pub fn new(config: SynthConfig, presentation: Presentation) -> Result<Self, StartupError> {
        config.validate()?;

        let shader_source = load_shader_source(config.shader_path.as_deref())?;
        validate_wgsl(&shader_source)?;

        let router = Arc::new(MidiRouter::new());
        let (midi, midi_port) =
            match MidiInputPort::connect(&router, config.midi_port_hint.as_deref()) {
                Ok(port) => (Some(router), port),
                Err(e) => {
                    log::warn!("MIDI unavailable: {e}");
                    (None, None)
                }
            };

        let brightness = Arc::new(AtomicU32::new(1.0f32.to_bits()));
        if let Some(midi) = &midi {
            let level = Arc::clone(&brightness);
            midi.register_cc_callback(config.brightness_cc, move |cc, value, _| {
                let value = value as f32 / CC_MAX as f32;
                level.store(value.to_bits(), Ordering::Relaxed);
                log::info!("Brightness (CC{cc}): {value:.2}");
            });
        }

        let audio = match AudioOutput::open() {
            Ok(output) => Some(output),
            Err(e) => {
                log::warn!("Audio output unavailable: {e}");
                None
            }
        };

        let samples = SampleLibrary::scan(&config.samples_dir).unwrap_or_else(|e| {
            log::warn!("Sample scan failed: {e}");
            SampleLibrary::default()
        });

        let mut context = SynthContext::new(config.width, config.height)
            .with_samples(samples)
            .with_images_dir(config.images_dir.clone());
        if let Some(midi) = &midi {
            context = context.with_midi(Arc::clone(midi));
        }
        if let Some(output) = &audio {
            context = context.with_audio(output.playback());
        }

        let registry = build_registry(config.visualizations.as_deref())?;
        let stage = Stage::new(Switcher::new(registry, context)?);
        log::info!("Visualizations: {}", stage.switcher().names().join(", "));

        Ok(Self {
            clock: FrameClock::new(config.step, config.target_fps, Instant::now()),
            overlay: config.show_overlay,
            config,
            presentation,
            shader_source,
            stage,
            brightness,
            midi,
            _midi_port: midi_port,
            _audio: audio,
            window: None,
            display: None,
            title: String::new(),
            startup_error: None,
        })
    }

    /// Stop the loop with a fatal startup error, returned from [`run`].
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: StartupError) {
        log::error!("{error}");
        self.startup_error = Some(error);
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::F1 => {
                self.overlay = !self.overlay;
                log::info!("Overlay {}", if self.overlay { "on" } else { "off" });
            }
            KeyCode::ArrowLeft => self.stage.previous(),
            KeyCode::ArrowRight => self.stage.next(),
            _ => {}
        }
    }

    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick(Instant::now());

        let canvas = self.stage.frame(dt);

        if let (Some(display), Some(canvas)) = (self.display.as_mut(), canvas) {
            if let Err(e) = display.present(canvas, self.clock.elapsed(), self.overlay) {
                log::error!("Present failed: {e}");
                if matches!(e, DisplayError::Surface(wgpu::SurfaceError::OutOfMemory)) {
                    event_loop.exit();
                    return;
                }
            }
        }

        self.update_title();
    }

    fn update_title(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let device = self.midi.as_ref().and_then(|m| m.device());
        let info = HudInfo {
            visualization: self.stage.current_name(),
            fps: self.clock.fps(),
            width: self.config.width,
            height: self.config.height,
            midi_device: device.as_deref(),
            last_cc: self.midi.as_ref().and_then(|m| m.last_cc()),
            brightness: f32::from_bits(self.brightness.load(Ordering::Relaxed)),
        };
        let title = hud_title(self.overlay.then_some(&info));
        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attributes = Window::default_attributes()
            .with_title(overlay::BASE_TITLE)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        if self.presentation == Presentation::Fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        window.set_cursor_visible(false);

        let display = match Display::new(
            Arc::clone(&window),
            self.config.width,
            self.config.height,
            &self.shader_source,
            self.config.grid_spacing as f32,
        ) {
            Ok(display) => display,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        log::info!(
            "Running {:?} on {}. F1 overlay, Left/Right switch, Esc quit",
            self.presentation,
            display.adapter_info().name
        );
        window.request_redraw();
        self.window = Some(window);
        self.display = Some(display);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code),
            WindowEvent::Resized(size) => {
                if let Some(display) = self.display.as_mut() {
                    display.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };
        let deadline = self.clock.next_deadline();
        if Instant::now() >= deadline {
            window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
    }
}

/// Run until Escape or window close.
pub fn run(config: SynthConfig, presentation: Presentation) -> Result<(), StartupError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, presentation)?;
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(error) => Err(error),
        None => {
            log::info!("Shutting down");
            Ok(())
        }
    }
}
