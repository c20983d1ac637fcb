use crate::{
    data_structures::{
        instance::InstanceRaw,
        mesh::{MeshVertex, Vertex},
    },
    pipelines::{DepthMode, mk_pipeline_layout, mk_render_pipeline},
};

/// Instanced meshes shaded by looking up the view space normal in a matcap texture.
///
/// Faces are not culled: the extruded text only has walls, so both sides must draw.
pub fn mk_matcap_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    texture_layout: &wgpu::BindGroupLayout,
    camera_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(device, "Matcap Pipeline Layout", texture_layout, camera_layout);

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Matcap Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("matcap.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        "Matcap Pipeline",
        &layout,
        color_format,
        Some(wgpu::BlendState::REPLACE),
        DepthMode::OPAQUE,
        None,
        &[MeshVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
