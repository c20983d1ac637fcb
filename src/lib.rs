//! matcap-scene
//!
//! A small cross-platform showcase rendered with wgpu: an HDR environment map,
//! a looping video backdrop, a field of randomly scattered tori and a line of
//! extruded 3D text, all shaded with matcaps and viewed through orbit
//! controls. Runs natively and in the browser (WebGL2).
//!
//! High-level modules
//! - `camera`: perspective camera, orbit controls and the camera uniform
//! - `config`: serde backed scene configuration
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: geometry, meshes, instances, textures and materials
//! - `flow`: the winit event loop driving loading, input and rendering
//! - `pipelines`: environment, unlit and matcap render pipelines
//! - `resources`: asynchronous asset loaders (images, fonts, video)
//! - `render`: render composition for efficient pipeline reuse
//! - `resize`: keeps camera and drawing buffer in step with the window
//! - `scene`: scene layout and its GPU counterpart
//!

pub mod camera;
pub mod clock;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resize;
pub mod resources;
pub mod scene;

pub use config::SceneConfig;
pub use error::ResourceError;
pub use flow::run;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point of the web build. The host page provides `<canvas class="webgl">`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run(SceneConfig::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
