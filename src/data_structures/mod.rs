//! Engine data structures: geometry, meshes, instances, textures and materials.
//!
//! - `geometry` builds the procedural primitives (torus, plane)
//! - `mesh` holds vertex layouts, CPU geometry and GPU meshes
//! - `instance` holds per-instance transformation data
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `material` binds a texture and sampler for the shaders

pub mod geometry;
pub mod instance;
pub mod material;
pub mod mesh;
pub mod texture;
