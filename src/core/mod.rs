pub mod frame_buffer;
pub mod rasterizer;
pub mod renderer;
