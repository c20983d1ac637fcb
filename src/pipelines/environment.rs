use crate::pipelines::{DepthMode, mk_pipeline_layout, mk_render_pipeline};

/// Full screen triangle sampling the equirectangular environment map along the view ray.
///
/// Needs no vertex buffers: draw three vertices with the environment material
/// in group 0.
pub fn mk_environment_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    texture_layout: &wgpu::BindGroupLayout,
    camera_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Environment Pipeline Layout",
        texture_layout,
        camera_layout,
    );

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Environment Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("environment.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        "Environment Pipeline",
        &layout,
        color_format,
        None,
        DepthMode::BACKDROP,
        None,
        &[],
        shader,
    )
}
