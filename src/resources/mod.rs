//! Asset loading.
//!
//! Every loader resolves to a CPU-side [`Asset`]. GPU upload happens later on
//! the event loop thread, so loaders can run on any executor and finish in any
//! order.

use futures::FutureExt;

use crate::{config::AssetsConfig, error::ResourceError};

pub mod fetch;
pub mod font;
pub mod video;

pub use fetch::{load_binary, load_string};
pub use font::Font;
pub use video::VideoFrames;

/// A decoded asset, ready to be attached to the scene.
#[derive(Debug)]
pub enum Asset {
    /// Equirectangular HDR background in linear float RGB.
    Environment(image::Rgb32FImage),
    Matcap { slot: usize, image: image::RgbaImage },
    Font(Font),
    Video(VideoFrames),
}

impl Asset {
    pub fn kind(&self) -> &'static str {
        match self {
            Asset::Environment(_) => "environment map",
            Asset::Matcap { .. } => "matcap",
            Asset::Font(_) => "font",
            Asset::Video(_) => "video",
        }
    }
}

/// Which of the scene's assets a load is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Environment,
    Matcap(usize),
    Font,
    Video,
}

#[cfg(not(target_arch = "wasm32"))]
pub type LoadFuture = futures::future::BoxFuture<'static, anyhow::Result<Asset>>;
#[cfg(target_arch = "wasm32")]
pub type LoadFuture = futures::future::LocalBoxFuture<'static, anyhow::Result<Asset>>;

/// A pending asset load, spawned independently by the render loop.
pub struct Load {
    pub kind: AssetKind,
    pub path: String,
    pub future: LoadFuture,
}

pub async fn load_environment(root: &str, path: &str) -> anyhow::Result<Asset> {
    let bytes = load_binary(root, path).await?;
    let img = decode_image(&bytes, path)?;
    Ok(Asset::Environment(img.into_rgb32f()))
}

pub async fn load_matcap(root: &str, slot: usize, path: &str) -> anyhow::Result<Asset> {
    let bytes = load_binary(root, path).await?;
    let img = decode_image(&bytes, path)?;
    Ok(Asset::Matcap {
        slot,
        image: img.to_rgba8(),
    })
}

pub async fn load_font(root: &str, path: &str) -> anyhow::Result<Asset> {
    let json = load_string(root, path).await?;
    Ok(Asset::Font(Font::from_json(&json)?))
}

pub async fn load_video(root: &str, path: &str) -> anyhow::Result<Asset> {
    let bytes = load_binary(root, path).await?;
    match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Gif) => Ok(Asset::Video(VideoFrames::decode_gif(&bytes, path)?)),
        _ => Err(ResourceError::UnknownFormat(path.to_string()).into()),
    }
}

fn decode_image(bytes: &[u8], path: &str) -> Result<image::DynamicImage, ResourceError> {
    let format = image::ImageFormat::from_path(path)
        .or_else(|_| image::guess_format(bytes))
        .map_err(|_| ResourceError::UnknownFormat(path.to_string()))?;
    Ok(image::load_from_memory_with_format(bytes, format)?)
}

#[cfg(not(target_arch = "wasm32"))]
fn boxed(
    future: impl std::future::Future<Output = anyhow::Result<Asset>> + Send + 'static,
) -> LoadFuture {
    future.boxed()
}

#[cfg(target_arch = "wasm32")]
fn boxed(future: impl std::future::Future<Output = anyhow::Result<Asset>> + 'static) -> LoadFuture {
    future.boxed_local()
}

/// One load per configured asset: environment, every matcap slot, font and video.
pub fn loaders(assets: &AssetsConfig) -> Vec<Load> {
    let root = assets.base().to_string();
    let mut loads = Vec::with_capacity(assets.matcaps.len() + 3);

    let path = assets.environment.clone();
    loads.push(Load {
        kind: AssetKind::Environment,
        path: path.clone(),
        future: boxed({
            let root = root.clone();
            async move { load_environment(&root, &path).await }
        }),
    });

    for (slot, path) in assets.matcaps.iter().cloned().enumerate() {
        loads.push(Load {
            kind: AssetKind::Matcap(slot),
            path: path.clone(),
            future: boxed({
                let root = root.clone();
                async move { load_matcap(&root, slot, &path).await }
            }),
        });
    }

    let path = assets.font.clone();
    loads.push(Load {
        kind: AssetKind::Font,
        path: path.clone(),
        future: boxed({
            let root = root.clone();
            async move { load_font(&root, &path).await }
        }),
    });

    let path = assets.video.clone();
    loads.push(Load {
        kind: AssetKind::Video,
        path: path.clone(),
        future: boxed(async move { load_video(&root, &path).await }),
    });

    loads
}
