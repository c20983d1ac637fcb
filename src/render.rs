//! Render composition and pipeline batching.
//!
//! The scene describes what it wants drawn as a [`Render`] tree. The render loop
//! flattens it into one batch per pipeline and draws the batches in a fixed order:
//! environment first, then unlit meshes, then matcap meshes.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the enum describing render operations
//! - [`Instanced<'a>`] contains data for instanced rendering (mesh, material and instance buffer)
//! - [`FrameTarget<'a>`] names the attachments [`encode_frame`] draws into, a
//!   surface texture or an offscreen one

use std::iter;

use crate::{context::Gpu, data_structures::mesh::Mesh, pipelines::Pipelines};

/// Data for instanced rendering: a mesh drawn once per instance with one material.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a Mesh,
    pub material: &'a wgpu::BindGroup,
    pub amount: usize,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `Environment(group)` fills the background with an environment map material
/// - `Unlit(Instanced)` renders textured meshes without shading
/// - `Matcap(Instanced)` renders meshes shaded by a matcap material
/// - `Matcaps(Vec<Instanced>)` renders a batch of matcap meshes
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
pub enum Render<'a> {
    Environment(&'a wgpu::BindGroup),
    Unlit(Instanced<'a>),
    Matcap(Instanced<'a>),
    Matcaps(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a>>),
}

/// Draw lists, one per pipeline.
#[derive(Default)]
pub struct Batches<'a> {
    pub environment: Option<&'a wgpu::BindGroup>,
    pub unlit: Vec<Instanced<'a>>,
    pub matcap: Vec<Instanced<'a>>,
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(self, batches: &mut Batches<'a>) {
        match self {
            Render::Environment(group) => {
                if batches.environment.replace(group).is_some() {
                    log::warn!("more than one environment requested, drawing the last one");
                }
            }
            Render::Unlit(instanced) => batches.unlit.push(instanced),
            Render::Matcap(instanced) => batches.matcap.push(instanced),
            Render::Matcaps(mut vec) => batches.matcap.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(batches)),
        }
    }

    pub fn into_batches(self) -> Batches<'a> {
        let mut batches = Batches::default();
        self.set_pipelines(&mut batches);
        batches
    }
}

impl<'a> Batches<'a> {
    /// Record the draw calls for every batch into `render_pass`.
    ///
    /// # Arguments
    ///
    /// * `pipelines` - must target the formats of the pass attachments
    /// * `camera` - bind group of the camera uniform, bound as group 1
    /// * `render_pass` - an open pass with a colour and a depth attachment
    pub fn draw(
        self,
        pipelines: &Pipelines,
        camera: &wgpu::BindGroup,
        render_pass: &mut wgpu::RenderPass<'_>,
    ) {
        if let Some(group) = self.environment {
            render_pass.set_pipeline(&pipelines.environment);
            render_pass.set_bind_group(0, group, &[]);
            render_pass.set_bind_group(1, camera, &[]);
            render_pass.draw(0..3, 0..1);
        }

        render_pass.set_pipeline(&pipelines.unlit);
        draw_instanced(camera, render_pass, self.unlit);

        render_pass.set_pipeline(&pipelines.matcap);
        draw_instanced(camera, render_pass, self.matcap);
    }
}

/// Attachments of one frame.
pub struct FrameTarget<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
    pub clear_colour: wgpu::Color,
}

/// Clear `target` and draw `render` into it, returning the encoded commands.
///
/// The same path serves the window surface and offscreen textures, the caller
/// decides when to submit.
pub fn encode_frame(
    gpu: &Gpu,
    target: &FrameTarget<'_>,
    camera: &wgpu::BindGroup,
    render: Render<'_>,
) -> wgpu::CommandBuffer {
    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(target.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        });

        render
            .into_batches()
            .draw(&gpu.pipelines, camera, &mut render_pass);
    }
    encoder.finish()
}

/// Encode and submit one frame.
pub fn submit_frame(
    gpu: &Gpu,
    target: &FrameTarget<'_>,
    camera: &wgpu::BindGroup,
    render: Render<'_>,
) {
    let commands = encode_frame(gpu, target, camera, render);
    gpu.queue.submit(iter::once(commands));
}

fn draw_instanced(
    camera: &wgpu::BindGroup,
    render_pass: &mut wgpu::RenderPass<'_>,
    batch: Vec<Instanced<'_>>,
) {
    for instanced in batch {
        if instanced.amount == 0 || instanced.mesh.num_elements == 0 {
            log::debug!("skipping empty draw of {}", instanced.mesh.name);
            continue;
        }
        render_pass.set_bind_group(0, instanced.material, &[]);
        render_pass.set_bind_group(1, camera, &[]);
        render_pass.set_vertex_buffer(0, instanced.mesh.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
        render_pass.set_index_buffer(
            instanced.mesh.index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        render_pass.draw_indexed(
            0..instanced.mesh.num_elements,
            0,
            0..instanced.amount as u32,
        );
    }
}
