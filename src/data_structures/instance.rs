//! Placement of one drawn copy of a mesh.
//!
//! Every torus sharing a matcap is drawn by a single instanced call; the
//! transforms travel in a per-instance vertex buffer of [`InstanceRaw`].

use cgmath::{Array, Euler, Matrix3, Matrix4, One, Quaternion, Rad, Vector3, Zero};

use crate::data_structures::mesh::Vertex;

/// Per-instance transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// Identity placement at the origin.
    pub fn new() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Quaternion::one(),
            scale: Vector3::from_value(1.0),
        }
    }

    /// Build an instance from XYZ euler angles (radians) and a uniform scale factor.
    pub fn from_euler(position: Vector3<f32>, angles: [f32; 3], scale: f32) -> Self {
        Self {
            position,
            rotation: Euler::new(Rad(angles[0]), Rad(angles[1]), Rad(angles[2])).into(),
            scale: Vector3::from_value(scale),
        }
    }

    /// Scale, then rotate, then translate.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let Vector3 { x, y, z } = self.scale;
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(x, y, z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            // scaling is uniform everywhere in the scene, so the rotation is the normal matrix
            normal: Matrix3::from(self.rotation).into(),
        }
    }
}

impl From<Vector3<f32>> for Instance {
    fn from(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-instance data as uploaded: the model matrix and the rotation part used
/// to bring normals into world space.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl InstanceRaw {
    // Locations 0..5 belong to the mesh vertex. A matrix spans one slot per column.
    const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x3,
        10 => Float32x3,
        11 => Float32x3,
    ];
}

impl Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // advance once per instance rather than once per vertex
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3, Vector4};

    #[test]
    fn matrix_applies_scale_then_rotation_then_translation() {
        let instance = Instance::from_euler(
            Vector3::new(1.0, 2.0, 3.0),
            [0.0, std::f32::consts::FRAC_PI_2, 0.0],
            0.5,
        );
        let p = instance.to_matrix() * Vector4::new(2.0, 0.0, 0.0, 1.0);
        // (2,0,0) scaled to (1,0,0), rotated about y to (0,0,-1), then translated
        assert!((p.truncate() - Vector3::new(1.0, 2.0, 2.0)).magnitude() < 1e-5);
    }

    #[test]
    fn raw_layout_matches_vertex_stride() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 25 * 4);
        assert_eq!(
            InstanceRaw::desc().array_stride,
            std::mem::size_of::<InstanceRaw>() as u64
        );
    }
}
