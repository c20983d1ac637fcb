#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{
    Delay, Frame, Rgb, Rgba, RgbaImage,
    codecs::{gif::GifEncoder, hdr::HdrEncoder},
};
use matcap_scene::{SceneConfig, resize::RenderSurface};

/// Two square glyphs, one with a hole, plus the fallback and a space.
pub const BOX_FONT: &str = r#"{
    "familyName": "Boxes",
    "resolution": 1000,
    "underlineThickness": 50,
    "boundingBox": { "xMin": 0, "yMin": -200, "xMax": 1000, "yMax": 1000 },
    "glyphs": {
        "o": { "ha": 1000, "x_min": 0, "x_max": 800, "o": "m 0 0 l 800 0 l 800 800 l 0 800 m 200 200 l 200 600 l 600 600 l 600 200" },
        "i": { "ha": 400, "x_min": 0, "x_max": 200, "o": "m 0 0 l 200 0 l 200 800 l 0 800" },
        "?": { "ha": 600, "x_min": 0, "x_max": 500, "o": "m 0 0 q 500 0 250 -100 l 250 500" },
        " ": { "ha": 500, "x_min": 0, "x_max": 0 }
    }
}"#;

pub fn config_with_text(text: &str) -> SceneConfig {
    let mut config = SceneConfig::default();
    config.text.content = text.to_string();
    config
}

/// A fresh directory under the system temp dir, unique per test and process.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("matcap-scene-it-{}-{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Writes every default asset of [`SceneConfig`] below `root`.
pub fn write_default_assets(root: &Path, config: &SceneConfig) {
    let assets = &config.assets;
    let create = |path: &str| {
        let file = root.join(path);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        file
    };

    let sky: Vec<Rgb<f32>> = (0..8).map(|i| Rgb([i as f32, 0.5, 2.0])).collect();
    let writer = std::fs::File::create(create(&assets.environment)).unwrap();
    HdrEncoder::new(writer).encode(&sky, 4, 2).unwrap();

    for (i, path) in assets.matcaps.iter().enumerate() {
        let shade = 60 * (i as u8 + 1);
        RgbaImage::from_pixel(8, 8, Rgba([shade, shade, shade, 255]))
            .save(create(path))
            .unwrap();
    }

    std::fs::write(create(&assets.font), BOX_FONT).unwrap();

    let writer = std::fs::File::create(create(&assets.video)).unwrap();
    let mut encoder = GifEncoder::new(writer);
    for colour in [[255, 0, 0, 255], [0, 0, 255, 255]] {
        let frame = Frame::from_parts(
            RgbaImage::from_pixel(4, 4, Rgba(colour)),
            0,
            0,
            Delay::from_numer_denom_ms(200, 1),
        );
        encoder.encode_frame(frame).unwrap();
    }
}

/// A drawing buffer that only records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ratios: Vec<f64>,
    pub sizes: Vec<(u32, u32)>,
}

impl RenderSurface for RecordingSurface {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.ratios.push(ratio);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.sizes.push((width, height));
    }
}
