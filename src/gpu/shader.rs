//! Post-processing shader source loading and validation.
//!
//! The scanline shader is embedded at build time; a config may point at a
//! replacement WGSL file. Either way the source is parsed and validated with
//! naga before any pipeline is built, so a broken shader fails startup with a
//! readable message instead of a device error.

use std::path::{Path, PathBuf};

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::ShaderStage;
use thiserror::Error;

use super::layouts::check_bindings;

/// Embedded scanline shader.
pub const SCANLINE_WGSL: &str = include_str!("shaders/scanlines.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Errors loading or validating a shader.
#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("Failed to read shader {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Shader parse error:\n{0}")]
    Parse(String),

    #[error("Shader validation error:\n{0}")]
    Validation(String),

    #[error("Shader binding mismatch: {0}")]
    Binding(String),

    #[error("Shader has no {stage:?} entry point named '{name}'")]
    MissingEntryPoint { stage: ShaderStage, name: &'static str },
}

/// The shader to use: `path` when given, otherwise the embedded one.
pub fn load_shader_source(path: Option<&Path>) -> Result<String, ShaderError> {
    match path {
        None => Ok(SCANLINE_WGSL.to_string()),
        Some(path) => {
            let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            log::info!("Using shader from {}", path.display());
            Ok(source)
        }
    }
}

/// Parse and validate WGSL, and check the entry points and bindings fit
/// the pass.
pub fn validate_wgsl(source: &str) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderError::Parse(e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| ShaderError::Validation(e.emit_to_string(source)))?;

    for (stage, name) in [
        (ShaderStage::Vertex, VERTEX_ENTRY),
        (ShaderStage::Fragment, FRAGMENT_ENTRY),
    ] {
        let found = module
            .entry_points
            .iter()
            .any(|ep| ep.stage == stage && ep.name == name);
        if !found {
            return Err(ShaderError::MissingEntryPoint { stage, name });
        }
    }
    check_bindings(&module)?;
    Ok(module)
}
