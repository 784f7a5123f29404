use std::{
    ffi::{c_void, CString},
    ptr,
};

use glam::Vec4;
use glutin::prelude::GlDisplay;

use crate::{
    config::AppConfig,
    debug::{debug_message_callback, DebugReporter},
    error::InitError,
    frame_loop::FrameTarget,
    gl::{self, get_gl_string, types::GLenum},
};

/// Hooks around every GL call the renderer makes.
pub trait CallObserver {
    fn before_call(&self, name: &str, arg_count: usize);
    /// `error` is the value of `glGetError` right after the call.
    fn after_call(&self, name: &str, error: GLenum);
}

pub struct LogCallObserver;

impl CallObserver for LogCallObserver {
    fn before_call(&self, name: &str, arg_count: usize) {
        log::trace!("calling {name} with {arg_count} args");
    }

    fn after_call(&self, name: &str, error: GLenum) {
        if error != gl::NO_ERROR {
            log::error!("GL error {} ({error:#06x}) in {name}", error_label(error));
        }
    }
}

pub fn error_label(error: GLenum) -> &'static str {
    match error {
        gl::NO_ERROR => "NO_ERROR",
        gl::INVALID_ENUM => "INVALID_ENUM",
        gl::INVALID_VALUE => "INVALID_VALUE",
        gl::INVALID_OPERATION => "INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "STACK_OVERFLOW",
        _ => "UNKNOWN",
    }
}

fn load_gl_fn_ptrs<D: GlDisplay>(gl_display: &D) -> Result<gl::Gl, InitError> {
    let gl = gl::Gl::load_with(|symbol| match CString::new(symbol) {
        Ok(symbol) => gl_display.get_proc_address(symbol.as_c_str()).cast(),
        Err(_) => ptr::null(),
    });

    let required = [
        ("glClear", gl.Clear.is_loaded()),
        ("glClearColor", gl.ClearColor.is_loaded()),
        ("glViewport", gl.Viewport.is_loaded()),
        ("glGetError", gl.GetError.is_loaded()),
        ("glGetString", gl.GetString.is_loaded()),
        ("glEnable", gl.Enable.is_loaded()),
        ("glDebugMessageCallback", gl.DebugMessageCallback.is_loaded()),
        ("glDebugMessageControl", gl.DebugMessageControl.is_loaded()),
    ];
    if let Some((name, _)) = required.iter().find(|(_, loaded)| !loaded) {
        return Err(InitError::Loader(format!("{name} could not be resolved")));
    }

    if let Some(renderer) = get_gl_string(&gl, gl::RENDERER) {
        log::info!("Running on {}", renderer.to_string_lossy());
    }
    if let Some(version) = get_gl_string(&gl, gl::VERSION) {
        log::info!("OpenGL Version {}", version.to_string_lossy());
    }
    if let Some(shaders_version) = get_gl_string(&gl, gl::SHADING_LANGUAGE_VERSION) {
        log::info!("Shaders version on {}", shaders_version.to_string_lossy());
    }

    Ok(gl)
}

pub struct Renderer {
    gl: gl::Gl,
    observer: Option<Box<dyn CallObserver>>,
    // Boxed so the pointer handed to the driver stays put.
    reporter: Option<Box<DebugReporter>>,
}

impl Renderer {
    /// The context must be current on this thread.
    pub fn new<D: GlDisplay>(gl_display: &D, config: &AppConfig) -> Result<Self, InitError> {
        let gl = load_gl_fn_ptrs(gl_display)?;
        let observer: Option<Box<dyn CallObserver>> = if config.trace_gl_calls {
            Some(Box::new(LogCallObserver))
        } else {
            None
        };

        let mut renderer = Self {
            gl,
            observer,
            reporter: None,
        };
        if config.window.debug_context {
            renderer.install_debug_reporter(DebugReporter::new(
                config.suppressed_debug_ids.clone(),
            ));
        }
        Ok(renderer)
    }

    fn install_debug_reporter(&mut self, reporter: DebugReporter) {
        let reporter = Box::new(reporter);
        let user_param = &*reporter as *const DebugReporter as *const c_void;
        self.traced("glEnable", 1, |gl| unsafe { gl.Enable(gl::DEBUG_OUTPUT) });
        self.traced("glEnable", 1, |gl| unsafe {
            gl.Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS)
        });
        self.traced("glDebugMessageCallback", 2, |gl| unsafe {
            gl.DebugMessageCallback(Some(debug_message_callback), user_param)
        });
        self.traced("glDebugMessageControl", 6, |gl| unsafe {
            gl.DebugMessageControl(
                gl::DONT_CARE,
                gl::DONT_CARE,
                gl::DONT_CARE,
                0,
                ptr::null(),
                gl::TRUE,
            )
        });
        self.reporter = Some(reporter);
    }

    fn traced<R>(&self, name: &str, arg_count: usize, call: impl FnOnce(&gl::Gl) -> R) -> R {
        let Some(observer) = &self.observer else {
            return call(&self.gl);
        };
        observer.before_call(name, arg_count);
        let result = call(&self.gl);
        let error = unsafe { self.gl.GetError() };
        observer.after_call(name, error);
        result
    }
}

impl FrameTarget for Renderer {
    fn clear(&self, color: Vec4) {
        self.traced("glClearColor", 4, |gl| unsafe {
            gl.ClearColor(color.x, color.y, color.z, color.w)
        });
        self.traced("glClear", 1, |gl| unsafe { gl.Clear(gl::COLOR_BUFFER_BIT) });
    }

    fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.traced("glViewport", 4, |gl| unsafe {
            gl.Viewport(x, y, width, height)
        });
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if self.reporter.is_some() {
            unsafe {
                self.gl.DebugMessageCallback(None, ptr::null());
                self.gl.Disable(gl::DEBUG_OUTPUT);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_labels() {
        assert_eq!(error_label(gl::NO_ERROR), "NO_ERROR");
        assert_eq!(error_label(gl::INVALID_ENUM), "INVALID_ENUM");
        assert_eq!(error_label(gl::INVALID_OPERATION), "INVALID_OPERATION");
        assert_eq!(error_label(gl::OUT_OF_MEMORY), "OUT_OF_MEMORY");
        assert_eq!(error_label(0x1234), "UNKNOWN");
    }
}
