//! Vertex layouts, CPU-side geometry and GPU meshes.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

/// Anything that can describe itself as a vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Bounds {
    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// Triangle list geometry kept on the CPU until it is uploaded as a [`Mesh`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// `None` for geometry without vertices.
    pub fn bounding_box(&self) -> Option<Bounds> {
        let first: Vector3<f32> = self.vertices.first()?.position.into();
        let bounds = self.vertices.iter().fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, v| Bounds {
                min: Vector3::new(
                    b.min.x.min(v.position[0]),
                    b.min.y.min(v.position[1]),
                    b.min.z.min(v.position[2]),
                ),
                max: Vector3::new(
                    b.max.x.max(v.position[0]),
                    b.max.y.max(v.position[1]),
                    b.max.z.max(v.position[2]),
                ),
            },
        );
        Some(bounds)
    }

    /// Translate every vertex so the bounding box is centered on the origin.
    pub fn center(&mut self) {
        if let Some(bounds) = self.bounding_box() {
            let offset = bounds.center();
            self.translate(-offset);
        }
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        for v in &mut self.vertices {
            v.position = (Vector3::from(v.position) + offset).into();
        }
    }

    pub(crate) fn push_quad(&mut self, corners: [MeshVertex; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Unit normal of a direction, falling back to +z for degenerate input.
pub(crate) fn safe_normal(v: Vector3<f32>) -> [f32; 3] {
    if v.magnitude2() > f32::EPSILON {
        v.normalize().into()
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Geometry uploaded to the GPU.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl Mesh {
    pub fn from_geometry(device: &wgpu::Device, name: &str, geometry: &Geometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: geometry.indices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(p: [f32; 3]) -> MeshVertex {
        MeshVertex {
            position: p,
            ..Default::default()
        }
    }

    #[test]
    fn center_moves_bounding_box_to_origin() {
        let mut geometry = Geometry {
            vertices: vec![vertex([1.0, 2.0, 0.0]), vertex([3.0, 6.0, 0.2])],
            indices: vec![],
        };
        geometry.center();
        let bounds = geometry.bounding_box().unwrap();
        assert!(bounds.center().magnitude() < 1e-6);
        assert!((bounds.size() - Vector3::new(2.0, 4.0, 0.2)).magnitude() < 1e-6);
    }

    #[test]
    fn empty_geometry_has_no_bounds() {
        let mut geometry = Geometry::default();
        assert!(geometry.bounding_box().is_none());
        geometry.center();
        assert!(geometry.is_empty());
    }
}
