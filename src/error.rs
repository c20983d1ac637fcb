//! Failures raised while turning fetched bytes into scene assets.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("unknown asset format for {0}")]
    UnknownFormat(String),

    #[error("malformed glyph outline for {glyph:?}: {reason}")]
    MalformedOutline { glyph: char, reason: String },

    #[error("font has no glyphs")]
    EmptyFont,

    #[error("video {0} contains no frames")]
    EmptyVideo(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
