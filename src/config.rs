//! Scene configuration.
//!
//! Every field has a default matching the stock showcase, so a config file only
//! needs to name what it changes:
//!
//! ```json
//! { "tori": { "count": 100 }, "text": { "content": "wgpu" } }
//! ```

use serde::{Deserialize, Serialize};

/// Top-level configuration handed to [`crate::flow::run`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub tori: ToriConfig,
    pub text: TextConfig,
    pub background: BackgroundConfig,
    pub assets: AssetsConfig,
    /// Upper bound for the device pixel ratio used to size the drawing buffer.
    pub max_pixel_ratio: f64,
    /// Linear RGBA clear colour, visible until the environment map resolves.
    pub clear_colour: [f64; 4],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            tori: ToriConfig::default(),
            text: TextConfig::default(),
            background: BackgroundConfig::default(),
            assets: AssetsConfig::default(),
            max_pixel_ratio: 2.0,
            clear_colour: [0.02, 0.02, 0.03, 1.0],
        }
    }
}

impl SceneConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The effective configuration as one line of JSON, for the startup log.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?;
        Self::from_json(&json)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: [1.0, 1.0, 2.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToriConfig {
    pub count: usize,
    /// Edge length of the cube the tori are scattered in, centered on the origin.
    pub spread: f32,
    pub radius: f32,
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
    /// Fixed PRNG seed. `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for ToriConfig {
    fn default() -> Self {
        Self {
            count: 40,
            spread: 10.0,
            radius: 0.3,
            tube: 0.2,
            radial_segments: 20,
            tubular_segments: 45,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub content: String,
    pub size: f32,
    /// Extrusion depth along +z before centering.
    pub depth: f32,
    pub curve_segments: u32,
    /// Matcap slot used by the text material.
    pub matcap: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: "Matcap Scene".to_string(),
            size: 0.5,
            depth: 0.2,
            curve_segments: 12,
            matcap: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub width: f32,
    pub height: f32,
    pub offset: [f32; 3],
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            width: 16.0,
            height: 9.0,
            offset: [0.0, 0.0, -8.0],
        }
    }
}

/// Asset locations, relative to the assets root of the platform.
///
/// Natively the paths are files below [`AssetsConfig::root`]. On the web they
/// are fetched from the page origin below [`AssetsConfig::web_root`], which is
/// empty by default so `textures/matcaps/1.png` resolves to
/// `<origin>/textures/matcaps/1.png`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Native only: directory the relative paths below are resolved against.
    pub root: String,
    /// Web only: URL path below the page origin the assets are served from.
    pub web_root: String,
    pub environment: String,
    pub matcaps: Vec<String>,
    pub font: String,
    pub video: String,
}

impl AssetsConfig {
    /// Base the asset paths resolve against on the current platform.
    pub fn base(&self) -> &str {
        #[cfg(target_arch = "wasm32")]
        {
            &self.web_root
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            &self.root
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
            web_root: String::new(),
            environment: "textures/environmentMap/2k.hdr".to_string(),
            matcaps: (1..=3)
                .map(|i| format!("textures/matcaps/{i}.png"))
                .collect(),
            font: "fonts/helvetiker_regular.typeface.json".to_string(),
            video: "video/background.gif".to_string(),
        }
    }
}
