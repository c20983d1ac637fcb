#![cfg(feature = "integration-tests")]

use matcap_scene::{
    SceneConfig,
    camera::CameraRig,
    context::Gpu,
    data_structures::texture::Texture,
    render::{self, FrameTarget, Render},
    resources::{Asset, Font},
    scene::{Scene, SceneBuilder},
};
use rand::{SeedableRng, rngs::StdRng};
use wgpu::Color;

use crate::common::test_utils::{BOX_FONT, config_with_text};

mod common;

const SIZE: u32 = 64;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

async fn scene(config: &SceneConfig) -> (Gpu, Scene) {
    let gpu = Gpu::headless(FORMAT).await.unwrap();
    let layout = SceneBuilder::new(config).build(&mut StdRng::seed_from_u64(7));
    let scene = Scene::new(&gpu, layout);
    (gpu, scene)
}

fn camera(gpu: &Gpu, config: &SceneConfig) -> CameraRig {
    CameraRig::new(
        &gpu.device,
        &gpu.camera_layout,
        &config.camera,
        &config.controls,
        1.0,
    )
}

fn offscreen_target(gpu: &Gpu) -> wgpu::Texture {
    gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Copy `texture` back to the CPU. `SIZE * 4` is already a multiple of the row alignment.
fn read_back(gpu: &Gpu, texture: &wgpu::Texture) -> image::RgbaImage {
    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: (SIZE * SIZE * 4) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(SIZE * 4),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).ok();
    });
    gpu.device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .unwrap();
    rx.recv().unwrap().unwrap();
    let pixels = slice.get_mapped_range().to_vec();
    image::RgbaImage::from_raw(SIZE, SIZE, pixels).unwrap()
}

#[tokio::test]
async fn tori_draw_before_the_font_and_text_joins_after() {
    let config = config_with_text("oi");
    let (gpu, mut scene) = scene(&config).await;
    assert_eq!(scene.layout().tori.len(), 40);

    let batches = scene.render().into_batches();
    assert!(batches.environment.is_none());
    assert_eq!(batches.unlit.len(), 1);
    assert_eq!(batches.unlit[0].amount, 1);
    assert_eq!(batches.matcap.len(), 3);
    assert_eq!(batches.matcap.iter().map(|b| b.amount).sum::<usize>(), 40);

    scene.apply(&gpu, Asset::Font(Font::from_json(BOX_FONT).unwrap()));
    assert!(scene.layout().has_text());

    let batches = scene.render().into_batches();
    assert_eq!(batches.unlit.len(), 1);
    assert_eq!(batches.matcap.len(), 4);
    assert_eq!(batches.matcap[3].amount, 1);
    assert_eq!(batches.matcap.iter().map(|b| b.amount).sum::<usize>(), 41);
}

#[tokio::test]
async fn failed_font_keeps_the_rest_of_the_scene() {
    let config = config_with_text("oi");
    let (_gpu, mut scene) = scene(&config).await;
    scene.font_failed("404");

    let batches = scene.render().into_batches();
    assert_eq!(batches.unlit.len(), 1);
    assert_eq!(batches.matcap.len(), 3);
    assert_eq!(scene.layout().tori.len(), 40);
}

#[tokio::test]
async fn environment_is_drawn_only_once_applied() {
    let config = SceneConfig::default();
    let (gpu, mut scene) = scene(&config).await;
    assert!(scene.render().into_batches().environment.is_none());

    let sky = image::Rgb32FImage::from_pixel(8, 4, image::Rgb([0.2, 0.4, 3.0]));
    scene.apply(&gpu, Asset::Environment(sky));
    assert!(scene.render().into_batches().environment.is_some());
}

#[tokio::test]
async fn oversized_matcap_is_scaled_instead_of_rejected() {
    let config = SceneConfig::default();
    let (gpu, mut scene) = scene(&config).await;
    let max = gpu.device.limits().max_texture_dimension_2d;

    let image = image::RgbaImage::from_pixel(max + 1, 2, image::Rgba([200, 100, 50, 255]));
    scene.apply(&gpu, Asset::Matcap { slot: 0, image });
    // out of range slots are ignored
    scene.apply(
        &gpu,
        Asset::Matcap {
            slot: 99,
            image: image::RgbaImage::new(1, 1),
        },
    );
    assert_eq!(scene.render().into_batches().matcap.len(), 3);
}

#[tokio::test]
async fn empty_render_shows_the_clear_colour() {
    let config = SceneConfig::default();
    let (gpu, _scene) = scene(&config).await;
    let camera = camera(&gpu, &config);
    let target = offscreen_target(&gpu);
    let color = target.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = Texture::create_depth_texture(&gpu.device, [SIZE, SIZE], "depth");

    render::submit_frame(
        &gpu,
        &FrameTarget {
            color: &color,
            depth: &depth.view,
            clear_colour: Color::WHITE,
        },
        &camera.bind_group,
        Render::Composed(vec![]),
    );

    let frame = read_back(&gpu, &target);
    assert!(frame.pixels().all(|p| *p == image::Rgba([255, 255, 255, 255])));
}

#[tokio::test]
async fn full_scene_frame_draws_over_the_clear_colour() {
    let config = config_with_text("oi");
    let (gpu, mut scene) = scene(&config).await;
    scene.apply(&gpu, Asset::Font(Font::from_json(BOX_FONT).unwrap()));
    let sky = image::Rgb32FImage::from_pixel(8, 4, image::Rgb([0.2, 0.4, 3.0]));
    scene.apply(&gpu, Asset::Environment(sky));

    let camera = camera(&gpu, &config);
    let target = offscreen_target(&gpu);
    let color = target.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = Texture::create_depth_texture(&gpu.device, [SIZE, SIZE], "depth");

    render::submit_frame(
        &gpu,
        &FrameTarget {
            color: &color,
            depth: &depth.view,
            clear_colour: Color::WHITE,
        },
        &camera.bind_group,
        scene.render(),
    );

    // the environment covers the whole frame
    let frame = read_back(&gpu, &target);
    assert!(frame.pixels().all(|p| *p != image::Rgba([255, 255, 255, 255])));
}
