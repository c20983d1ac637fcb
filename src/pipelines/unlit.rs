use crate::{
    data_structures::{
        instance::InstanceRaw,
        mesh::{MeshVertex, Vertex},
    },
    pipelines::{DepthMode, mk_pipeline_layout, mk_render_pipeline},
};

/// Instanced meshes showing their texture as is, used for the video background.
pub fn mk_unlit_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    texture_layout: &wgpu::BindGroupLayout,
    camera_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(device, "Unlit Pipeline Layout", texture_layout, camera_layout);

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Unlit Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("unlit.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        "Unlit Pipeline",
        &layout,
        color_format,
        Some(wgpu::BlendState::REPLACE),
        DepthMode::OPAQUE,
        None,
        &[MeshVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
