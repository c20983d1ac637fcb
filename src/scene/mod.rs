//! The showcase scene: environment, video background, matcap tori and text.
//!
//! [`SceneBuilder`] decides where things go on the CPU. [`Scene`] owns the GPU
//! side and swaps real textures in as assets arrive; until then every material
//! shows a 1x1 placeholder so the scene draws from the first frame.

use std::time::Duration;

use wgpu::util::DeviceExt;

use crate::{
    context::Gpu,
    data_structures::{
        instance::{Instance, InstanceRaw},
        material::Material,
        mesh::Mesh,
        texture::{self, Texture},
    },
    render::{Instanced, Render},
    resources::{Asset, VideoFrames},
};

mod builder;

pub use builder::{SceneBuilder, SceneLayout, TorusPlacement, scatter};

const MATCAP_PLACEHOLDER: [u8; 4] = [128, 128, 128, 255];
const VIDEO_PLACEHOLDER: [u8; 4] = [8, 8, 8, 255];

/// Instances of one mesh sharing a material.
#[derive(Debug)]
struct InstanceBatch {
    buffer: wgpu::Buffer,
    amount: usize,
    material: usize,
}

#[derive(Debug)]
struct Video {
    frames: VideoFrames,
    shown: usize,
}

#[derive(Debug)]
pub struct Scene {
    layout: SceneLayout,
    torus_mesh: Mesh,
    plane_mesh: Mesh,
    text_mesh: Option<Mesh>,
    torus_batches: Vec<InstanceBatch>,
    background_instance: wgpu::Buffer,
    text_instance: wgpu::Buffer,
    matcaps: Vec<Material>,
    video_material: Material,
    environment: Material,
    video: Option<Video>,
}

fn instance_buffer(device: &wgpu::Device, label: &str, instances: &[Instance]) -> wgpu::Buffer {
    let raw: Vec<InstanceRaw> = instances.iter().map(Instance::to_raw).collect();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&raw),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

impl Scene {
    /// Upload the meshes and instances of `layout` and give every material a
    /// placeholder texture.
    ///
    /// # Arguments
    ///
    /// * `gpu` - device the buffers and textures are created on
    /// * `layout` - CPU side placement, kept for text updates later on
    pub fn new(gpu: &Gpu, layout: SceneLayout) -> Self {
        let device = &gpu.device;
        let texture_layout = &gpu.texture_layout;

        let matcaps = (0..layout.matcap_slots)
            .map(|slot| {
                let name = format!("matcap {}", slot);
                let placeholder = Texture::solid(device, &gpu.queue, MATCAP_PLACEHOLDER, &name);
                Material::new(device, &name, placeholder, texture_layout)
            })
            .collect();
        let video_material = Material::new(
            device,
            "video",
            Texture::solid(device, &gpu.queue, VIDEO_PLACEHOLDER, "video"),
            texture_layout,
        );
        let environment = Material::new(
            device,
            "environment",
            Texture::hdr_placeholder(device, &gpu.queue),
            texture_layout,
        );

        let torus_batches = layout
            .tori_by_matcap()
            .into_iter()
            .enumerate()
            .filter(|(_, instances)| !instances.is_empty())
            .map(|(slot, instances)| InstanceBatch {
                buffer: instance_buffer(device, &format!("tori {}", slot), &instances),
                amount: instances.len(),
                material: slot,
            })
            .collect();

        let text_mesh = layout
            .text
            .as_ref()
            .map(|text| Mesh::from_geometry(device, "text", text));

        Self {
            torus_mesh: Mesh::from_geometry(device, "torus", &layout.torus_geometry),
            plane_mesh: Mesh::from_geometry(device, "background", &layout.background_geometry),
            text_mesh,
            torus_batches,
            background_instance: instance_buffer(
                device,
                "background instance",
                std::slice::from_ref(&layout.background),
            ),
            text_instance: instance_buffer(device, "text instance", &[Instance::new()]),
            matcaps,
            video_material,
            environment,
            video: None,
            layout,
        }
    }

    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    /// Attach a resolved asset in place.
    ///
    /// Images larger than the device's texture limit are scaled down first.
    pub fn apply(&mut self, gpu: &Gpu, asset: Asset) {
        let device = &gpu.device;
        let texture_layout = &gpu.texture_layout;
        let max = device.limits().max_texture_dimension_2d;
        match asset {
            Asset::Environment(img) => {
                let img = texture::fit_hdr_to_limit(img, max, "environment");
                let texture = Texture::from_hdr(device, &gpu.queue, &img, "environment");
                self.environment.set_texture(device, texture, texture_layout);
            }
            Asset::Matcap { slot, image } => match self.matcaps.get_mut(slot) {
                Some(material) => {
                    let image = texture::fit_to_limit(image, max, &material.name);
                    let texture =
                        Texture::from_rgba(device, &gpu.queue, &image, Some(&material.name));
                    material.set_texture(device, texture, texture_layout);
                }
                None => log::warn!("no material uses matcap slot {}", slot),
            },
            Asset::Font(font) => match self.layout.set_font(&font) {
                Ok(text) => self.text_mesh = Some(Mesh::from_geometry(device, "text", text)),
                Err(e) => self.layout.font_failed(&e.to_string()),
            },
            Asset::Video(frames) => {
                let frames = frames.fit_to_limit(max, "video");
                let Some(first) = frames.frame(0) else {
                    log::warn!("video without frames ignored");
                    return;
                };
                let texture = Texture::from_rgba(device, &gpu.queue, &first.image, Some("video"));
                self.video_material.set_texture(device, texture, texture_layout);
                self.video = Some(Video { frames, shown: 0 });
            }
        }
    }

    pub fn font_failed(&mut self, reason: &str) {
        self.layout.font_failed(reason);
    }

    /// Advance time dependent state. Only uploads a video frame when it changes.
    pub fn update(&mut self, gpu: &Gpu, elapsed: Duration) {
        let Some(video) = &mut self.video else {
            return;
        };
        let index = video.frames.frame_index_at(elapsed);
        if index == video.shown {
            return;
        }
        if let Some(frame) = video.frames.frame(index) {
            self.video_material.texture.write_rgba(&gpu.queue, &frame.image);
            video.shown = index;
        }
    }

    pub fn render(&self) -> Render<'_> {
        let mut renders = Vec::with_capacity(4);

        if self.environment.loaded {
            renders.push(Render::Environment(&self.environment.bind_group));
        }

        renders.push(Render::Unlit(Instanced {
            instance: &self.background_instance,
            mesh: &self.plane_mesh,
            material: &self.video_material.bind_group,
            amount: 1,
        }));

        renders.push(Render::Matcaps(
            self.torus_batches
                .iter()
                .map(|batch| Instanced {
                    instance: &batch.buffer,
                    mesh: &self.torus_mesh,
                    material: &self.matcaps[batch.material].bind_group,
                    amount: batch.amount,
                })
                .collect(),
        ));

        if let Some(text) = &self.text_mesh {
            renders.push(Render::Matcap(Instanced {
                instance: &self.text_instance,
                mesh: text,
                material: &self.matcaps[self.layout.text_matcap].bind_group,
                amount: 1,
            }));
        }

        Render::Composed(renders)
    }
}
