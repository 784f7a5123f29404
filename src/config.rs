//! Hardcoded startup configuration. Nothing here is read from the command
//! line or the environment.

use std::collections::HashSet;

use glam::{vec4, Vec4};

/// Debug message id the NVIDIA driver emits for every buffer allocation.
pub const BUFFER_DETAILED_INFO_ID: u32 = 131185;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Requested OpenGL (major, minor) version of a core profile context.
    pub gl_version: (u8, u8),
    pub debug_context: bool,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            title: "LearnOpenGL".to_owned(),
            gl_version: (4, 6),
            debug_context: true,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub clear_color: Vec4,
    /// Debug message ids that are dropped before formatting.
    pub suppressed_debug_ids: HashSet<u32>,
    /// Report every GL call made by the renderer and check `glGetError`
    /// after it.
    pub trace_gl_calls: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            clear_color: vec4(0.2, 0.3, 0.3, 1.0),
            suppressed_debug_ids: HashSet::from([BUFFER_DETAILED_INFO_ID]),
            trace_gl_calls: cfg!(debug_assertions),
        }
    }
}
