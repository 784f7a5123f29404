//! The per-frame control loop: input, clear, present, poll.

use std::io::Write;

use glam::Vec4;
use winit::keyboard::KeyCode;

use crate::error::InitError;

/// Events a [`Platform`] hands back from [`Platform::poll_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    FramebufferResized { width: u32, height: u32 },
}

/// The window and its event queue.
pub trait Platform {
    fn key_pressed(&self, key: KeyCode) -> bool;
    fn should_close(&self) -> bool;
    /// Idempotent: repeated calls with `true` behave like a single call.
    fn set_should_close(&mut self, value: bool);
    fn swap_buffers(&mut self);
    /// Processes pending events without blocking. Every event is handed to
    /// `on_event` before this returns.
    fn poll_events(&mut self, on_event: &mut dyn FnMut(PlatformEvent));
}

/// Whatever the frame is drawn into.
pub trait FrameTarget {
    fn clear(&self, color: Vec4);
    fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
}

// Field order is drop order: the target goes before the window that owns
// its context.
pub struct FrameLoop<P, T, W> {
    target: T,
    platform: P,
    out: W,
    clear_color: Vec4,
    frames: u64,
    state: LoopState,
}

impl<P: Platform, T: FrameTarget, W: Write> FrameLoop<P, T, W> {
    pub fn new(platform: P, target: T, clear_color: Vec4, out: W) -> Self {
        Self {
            target,
            platform,
            out,
            clear_color,
            frames: 0,
            state: LoopState::Running,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Runs one iteration. Once terminated this does nothing.
    pub fn step(&mut self) -> LoopState {
        if self.state == LoopState::Terminated {
            return self.state;
        }

        self.frames += 1;

        if self.platform.key_pressed(KeyCode::Escape) {
            self.platform.set_should_close(true);
        }

        self.target.clear(self.clear_color);
        self.platform.swap_buffers();

        let target = &self.target;
        let out = &mut self.out;
        self.platform.poll_events(&mut |event| dispatch(target, out, event));

        if self.platform.should_close() {
            self.state = LoopState::Terminated;
        }
        self.state
    }

    /// Steps until the platform asks to close, prints the frame count and
    /// releases the window.
    pub fn run(mut self) -> u64 {
        if self.platform.should_close() {
            self.state = LoopState::Terminated;
        }
        while self.state == LoopState::Running {
            self.step();
        }
        log::debug!("frame loop terminated");

        let written = writeln!(self.out, "Frames: {}", self.frames).and_then(|()| self.out.flush());
        if let Err(err) = written {
            log::warn!("failed to write frame count {}: {err}", self.frames);
        }
        self.frames
    }
}

fn dispatch<T: FrameTarget, W: Write>(target: &T, out: &mut W, event: PlatformEvent) {
    match event {
        PlatformEvent::FramebufferResized { width, height } => {
            target.set_viewport(0, 0, width as i32, height as i32);
            if let Err(err) = writeln!(out, "Framebuffer resize: {width}, {height}") {
                log::warn!("failed to report framebuffer resize: {err}");
            }
        }
    }
}

/// Initializes the platform and target with `init`, then runs the loop to
/// completion. Nothing is stepped if `init` fails.
pub fn launch<P, T, W, F>(init: F, clear_color: Vec4, out: W) -> anyhow::Result<u64>
where
    P: Platform,
    T: FrameTarget,
    W: Write,
    F: FnOnce() -> Result<(P, T), InitError>,
{
    let (platform, target) = init()?;
    Ok(FrameLoop::new(platform, target, clear_color, out).run())
}
