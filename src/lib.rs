pub mod config;
pub mod debug;
pub mod error;
pub mod frame_loop;
pub mod gl;
pub mod renderer;
pub mod window;
