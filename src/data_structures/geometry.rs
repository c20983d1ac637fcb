//! Procedural geometry for the scene primitives.

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Vector2, Vector3};

use crate::data_structures::mesh::{Geometry, MeshVertex, safe_normal};

/// A closed polyline in the xy plane. The closing edge back to the first
/// point is implicit.
pub type Contour = Vec<Vector2<f32>>;

/// A torus around the z axis.
///
/// `radius` is the distance from the center to the middle of the tube, `tube`
/// the tube radius. Produces `(radial + 1) * (tubular + 1)` vertices so the
/// seams carry their own texture coordinates.
pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Geometry {
    let radial = radial_segments.max(3);
    let tubular = tubular_segments.max(3);
    let mut geometry = Geometry::default();

    for j in 0..=radial {
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * TAU;
            let v = j as f32 / radial as f32 * TAU;

            let position = Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);

            geometry.vertices.push(MeshVertex {
                position: position.into(),
                normal: safe_normal(position - center),
                uv: [i as f32 / tubular as f32, j as f32 / radial as f32],
            });
        }
    }

    let row = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            geometry.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    geometry
}

/// A `width` x `height` quad in the xy plane facing +z.
///
/// Texture coordinates follow wgpu's convention: v = 0 is the top edge.
pub fn plane(width: f32, height: f32) -> Geometry {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let normal = [0.0, 0.0, 1.0];
    let corner = |x: f32, y: f32, u: f32, v: f32| MeshVertex {
        position: [x, y, 0.0],
        normal,
        uv: [u, v],
    };
    Geometry {
        vertices: vec![
            corner(-hw, hh, 0.0, 0.0),
            corner(hw, hh, 1.0, 0.0),
            corner(-hw, -hh, 0.0, 1.0),
            corner(hw, -hh, 1.0, 1.0),
        ],
        indices: vec![0, 2, 1, 2, 3, 1],
    }
}

/// Twice the signed area of a contour, positive for counter-clockwise winding.
pub fn signed_area(contour: &[Vector2<f32>]) -> f32 {
    contour
        .iter()
        .zip(contour.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum()
}

/// Extrude glyph outlines along +z from `0` to `depth`.
///
/// Only the side walls are generated. Each shape is a list of contours where the
/// one with the largest area is the outer boundary; its winding decides which side
/// of every contour in the shape is solid, so wall normals point away from the
/// glyph for outer contours and holes alike.
pub fn extrude_outlines(shapes: &[Vec<Contour>], depth: f32) -> Geometry {
    let mut geometry = Geometry::default();

    for shape in shapes {
        let outer_area = shape
            .iter()
            .map(|contour| signed_area(contour))
            .fold(0.0_f32, |best, area| {
                if area.abs() > best.abs() { area } else { best }
            });
        // solid on the left of travel when the outer boundary winds counter-clockwise
        let solid_on_left = outer_area >= 0.0;

        for contour in shape.iter().filter(|c| c.len() >= 3) {
            let perimeter: f32 = contour
                .iter()
                .zip(contour.iter().cycle().skip(1))
                .map(|(a, b)| (b - a).magnitude())
                .sum();
            let mut travelled = 0.0;

            for (&a, &b) in contour.iter().zip(contour.iter().cycle().skip(1)) {
                let edge = b - a;
                let length = edge.magnitude();
                if length <= f32::EPSILON {
                    continue;
                }
                let right = Vector3::new(edge.y, -edge.x, 0.0);
                let normal = safe_normal(if solid_on_left { right } else { -right });
                let (u0, u1) = if perimeter > 0.0 {
                    (travelled / perimeter, (travelled + length) / perimeter)
                } else {
                    (0.0, 1.0)
                };
                travelled += length;

                let corner = |p: Vector2<f32>, z: f32, u: f32, v: f32| MeshVertex {
                    position: [p.x, p.y, z],
                    normal,
                    uv: [u, v],
                };
                let (near_a, near_b) = (corner(a, 0.0, u0, 1.0), corner(b, 0.0, u1, 1.0));
                let (far_a, far_b) = (corner(a, depth, u0, 0.0), corner(b, depth, u1, 0.0));
                // counter-clockwise when seen from the side the normal points to
                if solid_on_left {
                    geometry.push_quad([near_a, near_b, far_b, far_a]);
                } else {
                    geometry.push_quad([near_b, near_a, far_a, far_b]);
                }
            }
        }
    }

    geometry
}
