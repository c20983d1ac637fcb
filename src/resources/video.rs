//! Looping background video decoded from an animated GIF.

use std::{io::Cursor, time::Duration};

use image::{AnimationDecoder, RgbaImage, codecs::gif::GifDecoder};

use crate::{
    data_structures::texture::{fit_to_limit, fit_within},
    error::ResourceError,
};

/// Frames without a delay are shown for this long, as browsers do.
const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub image: RgbaImage,
    pub delay: Duration,
}

/// Fully decoded video. Every frame has the size of the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrames {
    frames: Vec<VideoFrame>,
    total: Duration,
}

impl VideoFrames {
    pub fn decode_gif(bytes: &[u8], name: &str) -> Result<Self, ResourceError> {
        let decoder = GifDecoder::new(Cursor::new(bytes))?;
        let frames = decoder
            .into_frames()
            .map(|frame| {
                let frame = frame?;
                let (numer, denom) = frame.delay().numer_denom_ms();
                let millis = if denom == 0 { 0 } else { numer / denom };
                Ok(VideoFrame {
                    delay: Duration::from_millis(millis as u64),
                    image: frame.into_buffer(),
                })
            })
            .collect::<Result<Vec<_>, image::ImageError>>()?;
        Self::from_frames(frames, name)
    }

    pub fn from_frames(mut frames: Vec<VideoFrame>, name: &str) -> Result<Self, ResourceError> {
        let first = frames
            .first()
            .ok_or_else(|| ResourceError::EmptyVideo(name.to_string()))?;
        let dimensions = first.image.dimensions();
        let before = frames.len();
        frames.retain(|f| f.image.dimensions() == dimensions);
        if frames.len() != before {
            log::warn!(
                "{}: dropped {} frames that do not match {:?}",
                name,
                before - frames.len(),
                dimensions
            );
        }
        for frame in &mut frames {
            if frame.delay.is_zero() {
                frame.delay = DEFAULT_FRAME_DELAY;
            }
        }
        let total = frames.iter().map(|f| f.delay).sum();
        log::info!("{}: {} frames, {:?} per loop", name, frames.len(), total);

        Ok(Self { frames, total })
    }

    /// Scale every frame down when the video exceeds a `max` x `max` texture.
    pub fn fit_to_limit(self, max: u32, name: &str) -> Self {
        if fit_within(self.dimensions(), max).is_none() {
            return self;
        }
        let frames = self
            .frames
            .into_iter()
            .map(|frame| VideoFrame {
                image: fit_to_limit(frame.image, max, name),
                delay: frame.delay,
            })
            .collect();
        Self {
            frames,
            total: self.total,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.total
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frames
            .first()
            .map(|f| f.image.dimensions())
            .unwrap_or((1, 1))
    }

    pub fn frame(&self, index: usize) -> Option<&VideoFrame> {
        self.frames.get(index)
    }

    /// Index of the frame showing `elapsed` after playback started, looping forever.
    pub fn frame_index_at(&self, elapsed: Duration) -> usize {
        if self.total.is_zero() {
            return 0;
        }
        let mut t = Duration::from_nanos((elapsed.as_nanos() % self.total.as_nanos()) as u64);
        for (i, frame) in self.frames.iter().enumerate() {
            if t < frame.delay {
                return i;
            }
            t -= frame.delay;
        }
        self.frames.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Delay, Frame, Rgba, codecs::gif::GifEncoder};

    #[test]
    fn oversized_video_frames_are_scaled_together() {
        let frames = vec![
            VideoFrame {
                image: solid(3000, 30, 10),
                delay: Duration::from_millis(40),
            },
            VideoFrame {
                image: solid(3000, 30, 200),
                delay: Duration::from_millis(60),
            },
        ];
        let video = VideoFrames::from_frames(frames, "clip")
            .unwrap()
            .fit_to_limit(2048, "clip");
        assert_eq!(video.len(), 2);
        assert_eq!(video.dimensions(), (2048, 20));
        assert_eq!(video.frame(1).unwrap().image.dimensions(), (2048, 20));
        assert_eq!(video.duration(), Duration::from_millis(100));
    }

    fn solid(width: u32, height: u32, v: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([v, v, v, 255]))
    }

    fn frames(delays_ms: &[u64]) -> Vec<VideoFrame> {
        delays_ms
            .iter()
            .map(|&ms| VideoFrame {
                image: solid(2, 2, 0),
                delay: Duration::from_millis(ms),
            })
            .collect()
    }

    #[test]
    fn frame_index_loops() {
        let video = VideoFrames::from_frames(frames(&[100, 50, 200]), "clip").unwrap();
        assert_eq!(video.duration(), Duration::from_millis(350));
        let at = |ms| video.frame_index_at(Duration::from_millis(ms));
        assert_eq!(at(0), 0);
        assert_eq!(at(99), 0);
        assert_eq!(at(100), 1);
        assert_eq!(at(149), 1);
        assert_eq!(at(150), 2);
        assert_eq!(at(349), 2);
        assert_eq!(at(350), 0);
        assert_eq!(at(3 * 350 + 120), 1);
    }

    #[test]
    fn zero_delays_get_a_default() {
        let video = VideoFrames::from_frames(frames(&[0, 0]), "clip").unwrap();
        assert_eq!(video.duration(), 2 * DEFAULT_FRAME_DELAY);
        assert_eq!(video.frame_index_at(DEFAULT_FRAME_DELAY), 1);
    }

    #[test]
    fn mismatched_frames_are_dropped() {
        let mut all = frames(&[10, 10]);
        all.push(VideoFrame {
            image: solid(3, 3, 0),
            delay: Duration::from_millis(10),
        });
        let video = VideoFrames::from_frames(all, "clip").unwrap();
        assert_eq!(video.len(), 2);
        assert_eq!(video.dimensions(), (2, 2));
    }

    #[test]
    fn no_frames_is_an_error() {
        let err = VideoFrames::from_frames(Vec::new(), "clip").unwrap_err();
        assert!(matches!(err, ResourceError::EmptyVideo(name) if name == "clip"));
    }

    #[test]
    fn decodes_animated_gif() {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            for v in [0u8, 255] {
                let frame =
                    Frame::from_parts(solid(4, 2, v), 0, 0, Delay::from_numer_denom_ms(80, 1));
                encoder.encode_frame(frame).unwrap();
            }
        }
        let video = VideoFrames::decode_gif(&bytes, "clip.gif").unwrap();
        assert_eq!(video.len(), 2);
        assert_eq!(video.dimensions(), (4, 2));
        assert_eq!(video.frame(1).unwrap().image.get_pixel(0, 0)[0], 255);
        assert_eq!(video.frame_index_at(Duration::from_millis(90)), 1);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(VideoFrames::decode_gif(b"not a gif", "clip.gif").is_err());
    }
}
