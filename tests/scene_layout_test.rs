use matcap_scene::{
    SceneConfig,
    resources::Font,
    scene::{SceneBuilder, SceneLayout},
};
use rand::{SeedableRng, rngs::StdRng};

use crate::common::test_utils::{BOX_FONT, config_with_text};

mod common;

fn build(config: &SceneConfig, seed: u64) -> SceneLayout {
    SceneBuilder::new(config).build(&mut StdRng::seed_from_u64(seed))
}

#[test]
fn default_scene_has_background_and_forty_tori() {
    let config = SceneConfig::default();
    let layout = build(&config, 1);

    assert_eq!(layout.tori.len(), 40);
    assert_eq!(
        layout.background.position,
        cgmath::Vector3::from(config.background.offset)
    );
    assert!(!layout.background_geometry.indices.is_empty());
    assert!(!layout.torus_geometry.indices.is_empty());
    assert!(!layout.has_text());
}

#[test]
fn tori_are_scattered_inside_the_spread() {
    for seed in 0..20 {
        let layout = build(&SceneConfig::default(), seed);
        for torus in &layout.tori {
            let p = torus.instance.position;
            for c in [p.x, p.y, p.z] {
                assert!((-5.0..5.0).contains(&c), "seed {}: component {}", seed, c);
            }
            let s = torus.instance.scale;
            assert!((0.0..1.0).contains(&s.x), "seed {}: scale {}", seed, s.x);
            assert_eq!(s.x, s.y);
            assert_eq!(s.y, s.z);
        }
    }
}

#[test]
fn same_seed_same_scene() {
    let config = SceneConfig::default();
    assert_eq!(build(&config, 42).tori, build(&config, 42).tori);
    assert_ne!(build(&config, 42).tori, build(&config, 43).tori);
}

#[test]
fn font_adds_one_centered_text_mesh() {
    let mut layout = build(&config_with_text("oi o"), 3);
    let font = Font::from_json(BOX_FONT).unwrap();

    layout.set_font(&font).unwrap();
    // a second font replaces the text rather than adding another
    layout.set_font(&font).unwrap();

    let text = layout.text.as_ref().unwrap();
    assert!(!text.vertices.is_empty());
    let center = text.bounding_box().unwrap().center();
    assert!(center.x.abs() < 1e-4 && center.y.abs() < 1e-4 && center.z.abs() < 1e-4);
    assert_eq!(layout.tori.len(), 40);
}

#[test]
fn failed_font_leaves_the_rest_of_the_scene() {
    let mut layout = build(&SceneConfig::default(), 5);
    let tori = layout.tori.clone();

    layout.font_failed("404 Not Found");

    assert!(!layout.has_text());
    assert_eq!(layout.tori, tori);
    assert!(!layout.background_geometry.vertices.is_empty());
}

#[test]
fn broken_font_is_an_error_not_a_panic() {
    let mut layout = build(&config_with_text("o"), 5);
    let broken = BOX_FONT.replace("l 800 0 l 800 800", "l 800 x");
    let font = Font::from_json(&broken).unwrap();

    assert!(layout.set_font(&font).is_err());
    assert!(!layout.has_text());
}
