use thiserror::Error;

/// Fatal startup failures. None of them are retried; the loop never starts.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("windowing platform failed to initialize: {0}")]
    Platform(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    WindowCreation(String),
    #[error("failed to load OpenGL functions: {0}")]
    Loader(String),
}

impl InitError {
    pub(crate) fn window(err: impl std::fmt::Display) -> Self {
        Self::WindowCreation(err.to_string())
    }
}
