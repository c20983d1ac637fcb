//! Render pipelines.
//!
//! Every pipeline shares the same bind group convention: group 0 is a
//! single-texture material (see [`crate::data_structures::material::texture_layout`]),
//! group 1 the camera uniform.

use crate::data_structures::texture::Texture;

pub mod environment;
pub mod matcap;
pub mod unlit;

/// The pipelines used to draw a frame, created once per surface format.
#[derive(Debug)]
pub struct Pipelines {
    pub environment: wgpu::RenderPipeline,
    pub unlit: wgpu::RenderPipeline,
    pub matcap: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        texture_layout: &wgpu::BindGroupLayout,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            environment: environment::mk_environment_pipeline(
                device,
                color_format,
                texture_layout,
                camera_layout,
            ),
            unlit: unlit::mk_unlit_pipeline(device, color_format, texture_layout, camera_layout),
            matcap: matcap::mk_matcap_pipeline(device, color_format, texture_layout, camera_layout),
        }
    }
}

/// How a pipeline uses the depth buffer.
#[derive(Debug, Clone, Copy)]
pub struct DepthMode {
    pub write: bool,
    pub compare: wgpu::CompareFunction,
}

impl DepthMode {
    pub const OPAQUE: Self = Self {
        write: true,
        compare: wgpu::CompareFunction::Less,
    };
    /// Drawn behind everything else without touching the depth buffer.
    pub const BACKDROP: Self = Self {
        write: false,
        compare: wgpu::CompareFunction::Always,
    };
}

pub(crate) fn mk_pipeline_layout(
    device: &wgpu::Device,
    label: &str,
    texture_layout: &wgpu::BindGroupLayout,
    camera_layout: &wgpu::BindGroupLayout,
) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[texture_layout, camera_layout],
        immediate_size: 0,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth: DepthMode,
    cull_mode: Option<wgpu::Face>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: depth.write,
            depth_compare: depth.compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
