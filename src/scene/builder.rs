//! CPU side of the scene: where everything goes, independent of the GPU.

use std::f32::consts::PI;

use cgmath::Vector3;
use rand::Rng;

use crate::{
    config::{BackgroundConfig, SceneConfig, TextConfig, ToriConfig},
    data_structures::{
        geometry::{self, extrude_outlines},
        instance::Instance,
        mesh::Geometry,
    },
    error::ResourceError,
    resources::Font,
};

/// One torus of the scene and the matcap slot it is drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct TorusPlacement {
    pub instance: Instance,
    pub matcap: usize,
}

/// Everything the scene root holds, before it is uploaded.
#[derive(Debug, Clone)]
pub struct SceneLayout {
    pub background: Instance,
    pub background_geometry: Geometry,
    pub torus_geometry: Geometry,
    pub tori: Vec<TorusPlacement>,
    /// Absent until a font has been applied.
    pub text: Option<Geometry>,
    pub text_matcap: usize,
    pub matcap_slots: usize,
    text_config: TextConfig,
}

impl SceneLayout {
    /// Build the text mesh from `font`, centered on the origin.
    ///
    /// Calling it again replaces the previous text.
    pub fn set_font(&mut self, font: &Font) -> Result<&Geometry, ResourceError> {
        let config = &self.text_config;
        let shapes = font.layout(&config.content, config.size, config.curve_segments)?;
        let mut text = extrude_outlines(&shapes, config.depth);
        text.center();
        log::info!(
            "text {:?} in {}: {} vertices",
            config.content,
            font.family_name,
            text.vertices.len()
        );
        Ok(self.text.insert(text))
    }

    /// The font could not be loaded. The rest of the scene stays as it is.
    pub fn font_failed(&mut self, reason: &str) {
        log::warn!("font failed to load, showing the scene without text: {}", reason);
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Torus instances grouped by matcap slot, one entry per slot.
    pub fn tori_by_matcap(&self) -> Vec<Vec<Instance>> {
        let mut groups = vec![Vec::new(); self.matcap_slots];
        for torus in &self.tori {
            groups[torus.matcap % self.matcap_slots].push(torus.instance.clone());
        }
        groups
    }
}

/// Places the background and scatters the tori.
#[derive(Debug, Clone)]
pub struct SceneBuilder<'c> {
    config: &'c SceneConfig,
}

impl<'c> SceneBuilder<'c> {
    pub fn new(config: &'c SceneConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, rng: &mut impl Rng) -> SceneLayout {
        let ToriConfig {
            count,
            spread,
            radius,
            tube,
            radial_segments,
            tubular_segments,
            ..
        } = self.config.tori;
        let BackgroundConfig {
            width,
            height,
            offset,
        } = self.config.background;
        let matcap_slots = self.config.assets.matcaps.len().max(1);

        let tori = (0..count)
            .map(|i| TorusPlacement {
                instance: scatter(rng, spread),
                matcap: i % matcap_slots,
            })
            .collect();
        log::debug!("scattered {} tori over {} matcaps", count, matcap_slots);

        SceneLayout {
            background: Instance::from(Vector3::from(offset)),
            background_geometry: geometry::plane(width, height),
            torus_geometry: geometry::torus(radius, tube, radial_segments, tubular_segments),
            tori,
            text: None,
            text_matcap: self.config.text.matcap % matcap_slots,
            matcap_slots,
            text_config: self.config.text.clone(),
        }
    }
}

/// A random placement inside a cube of edge `spread` around the origin, with a
/// random tilt about x and y and a uniform scale in `[0, 1)`.
pub fn scatter(rng: &mut impl Rng, spread: f32) -> Instance {
    let mut r = || rng.random::<f32>();
    let position = Vector3::new((r() - 0.5) * spread, (r() - 0.5) * spread, (r() - 0.5) * spread);
    let angles = [r() * PI, r() * PI, 0.0];
    let scale = r();
    Instance::from_euler(position, angles, scale)
}
