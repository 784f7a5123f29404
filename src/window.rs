use std::{
    collections::HashSet,
    num::NonZeroU32,
    panic::{self, AssertUnwindSafe},
    time::Duration,
};

use glutin::{
    config::{Config, ConfigTemplateBuilder, GlConfig},
    context::{
        ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentContext, PossiblyCurrentContext,
        Version,
    },
    display::GetGlDisplay,
    prelude::{GlDisplay, NotCurrentGlContext},
    surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow as _};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    raw_window_handle::HasWindowHandle,
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::{AppConfig, WindowConfig},
    error::InitError,
    frame_loop::{Platform, PlatformEvent},
    renderer::Renderer,
};

/// A winit window with a current OpenGL context, driven by pumping the event
/// loop once per frame.
pub struct GlWindow {
    state: WindowState,
    event_loop: EventLoop<()>,
}

// Surface and context are dropped before the window they draw into.
struct WindowState {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    config: Config,
    window: Window,
    pressed: HashSet<KeyCode>,
    should_close: bool,
    pending: Vec<PlatformEvent>,
}

impl GlWindow {
    pub fn new(window_config: &WindowConfig) -> Result<Self, InitError> {
        let event_loop = EventLoop::builder().build()?;

        let config_picker = |configs: Box<dyn Iterator<Item = Config> + '_>| {
            most_samples(configs, |config| config.num_samples())
                .unwrap_or_else(|| panic::panic_any(NoGlConfigs))
        };
        let window_attributes = WindowAttributes::default()
            .with_title(window_config.title.as_str())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));

        let (window, config) = catch_missing_config(|| {
            DisplayBuilder::default()
                .with_window_attributes(Some(window_attributes))
                .build(&event_loop, ConfigTemplateBuilder::default(), config_picker)
        })?
        .map_err(InitError::window)?;
        let window =
            window.ok_or_else(|| InitError::window("display builder returned no window"))?;

        let context = create_context(&window, &config, window_config)?;
        let surface = create_window_surface(&window, &config)?;
        let context = context.make_current(&surface).map_err(InitError::window)?;

        if window_config.vsync {
            let interval = SwapInterval::Wait(NonZeroU32::MIN);
            if let Err(err) = surface.set_swap_interval(&context, interval) {
                log::warn!("failed to enable vsync: {err}");
            }
        }

        let (major, minor) = window_config.gl_version;
        log::debug!(
            "created {}x{} window with OpenGL {major}.{minor} core context",
            window_config.width,
            window_config.height
        );

        Ok(GlWindow {
            state: WindowState {
                surface,
                context,
                config,
                window,
                pressed: HashSet::new(),
                should_close: false,
                pending: Vec::new(),
            },
            event_loop,
        })
    }

    /// The renderer can't be created until the context is current.
    pub fn create_gl_renderer(&self, config: &AppConfig) -> Result<Renderer, InitError> {
        Renderer::new(&self.state.config.display(), config)
    }
}

/// Unwinds out of the config picker, which has to return a `Config`.
struct NoGlConfigs;

fn most_samples<C>(configs: impl Iterator<Item = C>, samples: impl Fn(&C) -> u8) -> Option<C> {
    configs.reduce(|acc, config| {
        if samples(&config) > samples(&acc) {
            config
        } else {
            acc
        }
    })
}

fn catch_missing_config<T>(build: impl FnOnce() -> T) -> Result<T, InitError> {
    match panic::catch_unwind(AssertUnwindSafe(build)) {
        Ok(value) => Ok(value),
        Err(payload) if payload.is::<NoGlConfigs>() => {
            Err(InitError::window("display offered no GL configs"))
        }
        Err(payload) => panic::resume_unwind(payload),
    }
}

fn create_context(
    window: &Window,
    config: &Config,
    window_config: &WindowConfig,
) -> Result<NotCurrentContext, InitError> {
    let window_handle = window.window_handle().map_err(InitError::window)?.as_raw();
    let (major, minor) = window_config.gl_version;
    let context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
        .with_profile(GlProfile::Core)
        .with_debug(window_config.debug_context)
        .build(Some(window_handle));
    let gl_display = config.display();
    unsafe { gl_display.create_context(config, &context_attributes) }.map_err(InitError::window)
}

fn create_window_surface(
    window: &Window,
    config: &Config,
) -> Result<Surface<WindowSurface>, InitError> {
    let display = config.display();
    let surface_attributes = window
        .build_surface_attributes(SurfaceAttributesBuilder::new())
        .map_err(InitError::window)?;
    unsafe { display.create_window_surface(config, &surface_attributes) }.map_err(InitError::window)
}

impl Platform for GlWindow {
    fn key_pressed(&self, key: KeyCode) -> bool {
        self.state.pressed.contains(&key)
    }

    fn should_close(&self) -> bool {
        self.state.should_close
    }

    fn set_should_close(&mut self, value: bool) {
        self.state.should_close = value;
    }

    fn swap_buffers(&mut self) {
        if let Err(err) = self.state.surface.swap_buffers(&self.state.context) {
            log::warn!("failed to swap buffers: {err}");
        }
    }

    fn poll_events(&mut self, on_event: &mut dyn FnMut(PlatformEvent)) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state);
        if let PumpStatus::Exit(code) = status {
            log::debug!("event loop exited with code {code}");
            self.state.should_close = true;
        }
        for event in self.state.pending.drain(..) {
            on_event(event);
        }
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if window_id != self.window.id() {
            return;
        }
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.should_close = true;
            }
            WindowEvent::Resized(size) => {
                if let (Some(width), Some(height)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                {
                    self.surface.resize(&self.context, width, height);
                }
                self.pending.push(PlatformEvent::FramebufferResized {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    self.pressed.insert(code);
                }
                ElementState::Released => {
                    self.pressed.remove(&code);
                }
            },
            WindowEvent::Focused(false) => self.pressed.clear(),
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_config_with_most_samples() {
        let samples = [(0, 0u8), (1, 4), (2, 2), (3, 4)];
        let picked = most_samples(samples.into_iter(), |&(_, samples)| samples);
        assert_eq!(picked, Some((1, 4)));
    }

    #[test]
    fn no_configs_picks_nothing() {
        assert_eq!(most_samples(std::iter::empty::<(u8, u8)>(), |&(_, s)| s), None);
    }

    #[test]
    fn missing_config_is_a_window_creation_error() {
        let result = catch_missing_config(|| -> u32 { panic::panic_any(NoGlConfigs) });
        match result {
            Err(InitError::WindowCreation(message)) => {
                assert_eq!(message, "display offered no GL configs")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn successful_build_passes_through() {
        assert!(matches!(catch_missing_config(|| 7), Ok(7)));
    }

    #[test]
    #[should_panic(expected = "unrelated")]
    fn other_panics_keep_unwinding() {
        let _ = catch_missing_config(|| panic!("unrelated"));
    }
}
