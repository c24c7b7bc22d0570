//! GPU post-processing and presentation using wgpu.
//!
//! The visualizations draw on a CPU canvas; this module uploads it each
//! frame, runs the scanline fragment pass and presents to the window. The
//! same pass can render offscreen for tests, and `effect` holds a CPU
//! reference of its math.

pub mod context;
pub mod display;
pub mod effect;
pub mod layouts;
pub mod offscreen;
pub mod postprocess;
pub mod shader;
pub mod textures;

pub use context::{GpuContext, GpuError};
pub use display::{Display, DisplayError};
pub use offscreen::OffscreenRenderer;
pub use postprocess::ScanlinePass;
pub use shader::{load_shader_source, validate_wgsl, ShaderError, SCANLINE_WGSL};
