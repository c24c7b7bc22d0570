//! Resource bindings shared by the scanline pass and its shader.
//!
//! The pipeline layout is fixed, so a replacement shader may only declare
//! resources that line up with [`FrameBinding`] in group 0.

use naga::{AddressSpace, Module, TypeInner};
use wgpu::{BindGroupLayout, BindGroupLayoutEntry, Device, ShaderStages};

use super::shader::ShaderError;

/// The one bind group the pass uses.
pub const FRAME_GROUP: u32 = 0;

/// Slots in [`FRAME_GROUP`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBinding {
    Uniforms,
    Frame,
    Sampler,
}

impl FrameBinding {
    pub const ALL: [Self; 3] = [Self::Uniforms, Self::Frame, Self::Sampler];

    pub fn index(self) -> u32 {
        match self {
            Self::Uniforms => 0,
            Self::Frame => 1,
            Self::Sampler => 2,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.index() == index)
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Uniforms => "uniform buffer",
            Self::Frame => "2D float texture",
            Self::Sampler => "filtering sampler",
        }
    }

    fn layout_entry(self) -> BindGroupLayoutEntry {
        let ty = match self {
            Self::Uniforms => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            Self::Frame => wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            Self::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        };
        BindGroupLayoutEntry {
            binding: self.index(),
            visibility: ShaderStages::FRAGMENT,
            ty,
            count: None,
        }
    }

    /// Whether a shader global of this address space and type fits the slot.
    fn accepts(self, space: AddressSpace, inner: &TypeInner) -> bool {
        match self {
            Self::Uniforms => space == AddressSpace::Uniform,
            Self::Frame => matches!(
                inner,
                TypeInner::Image {
                    dim: naga::ImageDimension::D2,
                    arrayed: false,
                    class: naga::ImageClass::Sampled {
                        kind: naga::ScalarKind::Float,
                        multi: false,
                    },
                }
            ),
            Self::Sampler => matches!(inner, TypeInner::Sampler { comparison: false }),
        }
    }
}

/// Layout for [`FRAME_GROUP`].
pub fn create_scanline_layout(device: &Device) -> BindGroupLayout {
    let entries = FrameBinding::ALL.map(FrameBinding::layout_entry);
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scanline_bind_group_layout"),
        entries: &entries,
    })
}

/// Check every resource the shader declares against the fixed layout.
/// Slots the shader leaves out are fine.
pub fn check_bindings(module: &Module) -> Result<(), ShaderError> {
    for (_, global) in module.global_variables.iter() {
        let Some(binding) = &global.binding else {
            continue;
        };
        let name = global.name.clone().unwrap_or_else(|| "<unnamed>".to_string());
        let slot = (binding.group == FRAME_GROUP)
            .then(|| FrameBinding::from_index(binding.binding))
            .flatten();
        let Some(slot) = slot else {
            return Err(ShaderError::Binding(format!(
                "'{name}' at group {} binding {} is not provided by the pass",
                binding.group, binding.binding
            )));
        };
        if !slot.accepts(global.space, &module.types[global.ty].inner) {
            return Err(ShaderError::Binding(format!(
                "'{name}' at binding {} must be a {}",
                binding.binding,
                slot.describe()
            )));
        }
    }
    Ok(())
}
