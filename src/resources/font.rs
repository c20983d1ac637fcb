//! Typeface JSON fonts.
//!
//! A typeface file maps every character to its advance (`ha`) and an outline
//! string `o` made of move (`m x y`), line (`l x y`), quadratic
//! (`q x y cx cy`) and cubic (`b x y c1x c1y c2x c2y`) commands in font units.
//! Note that the end point comes *before* the control points.

use std::collections::HashMap;

use cgmath::Vector2;
use serde::Deserialize;

use crate::{data_structures::geometry::Contour, error::ResourceError};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Glyph {
    #[serde(default)]
    pub ha: f32,
    #[serde(default)]
    pub x_min: f32,
    #[serde(default)]
    pub x_max: f32,
    /// Absent for blank glyphs such as the space.
    #[serde(default)]
    pub o: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontBounds {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypefaceJson {
    glyphs: HashMap<String, Glyph>,
    #[serde(default)]
    family_name: String,
    resolution: f32,
    #[serde(default)]
    bounding_box: FontBounds,
    #[serde(default)]
    underline_thickness: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family_name: String,
    pub resolution: f32,
    pub bounding_box: FontBounds,
    pub underline_thickness: f32,
    glyphs: HashMap<char, Glyph>,
}

/// Outlines of one laid-out glyph, already scaled and offset.
pub type GlyphShape = Vec<Contour>;

impl Font {
    pub fn from_json(json: &str) -> Result<Self, ResourceError> {
        let raw: TypefaceJson = serde_json::from_str(json)?;
        let glyphs: HashMap<char, Glyph> = raw
            .glyphs
            .into_iter()
            .filter_map(|(key, glyph)| {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some((c, glyph)),
                    _ => {
                        log::debug!("skipping multi-character glyph key {:?}", key);
                        None
                    }
                }
            })
            .collect();
        if glyphs.is_empty() {
            return Err(ResourceError::EmptyFont);
        }
        let resolution = if raw.resolution > 0.0 {
            raw.resolution
        } else {
            1000.0
        };
        Ok(Self {
            family_name: raw.family_name,
            resolution,
            bounding_box: raw.bounding_box,
            underline_thickness: raw.underline_thickness,
            glyphs,
        })
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c)
    }

    /// Distance between baselines for text of the given size.
    pub fn line_height(&self, size: f32) -> f32 {
        let b = self.bounding_box;
        (b.y_max - b.y_min + self.underline_thickness) * size / self.resolution
    }

    /// Lay out `text` left to right starting at the origin, one glyph shape per
    /// drawn character. `\n` starts a new line below the previous one.
    ///
    /// Characters the font lacks are drawn as `?`, or skipped if that is missing too.
    pub fn layout(
        &self,
        text: &str,
        size: f32,
        curve_segments: u32,
    ) -> Result<Vec<GlyphShape>, ResourceError> {
        let scale = size / self.resolution;
        let line_height = self.line_height(size);
        let mut offset = Vector2::new(0.0, 0.0);
        let mut shapes = Vec::new();

        for c in text.chars() {
            if c == '\n' {
                offset.x = 0.0;
                offset.y -= line_height;
                continue;
            }
            let (drawn, glyph) = match self.glyph(c) {
                Some(glyph) => (c, glyph),
                None => match self.glyph('?') {
                    Some(glyph) => {
                        log::warn!(
                            "character {:?} does not exist in font family {}",
                            c,
                            self.family_name
                        );
                        ('?', glyph)
                    }
                    None => {
                        log::warn!(
                            "character {:?} does not exist in font family {} and there is no '?' fallback",
                            c,
                            self.family_name
                        );
                        continue;
                    }
                },
            };
            if let Some(outline) = &glyph.o {
                let contours = parse_outline(drawn, outline, scale, offset, curve_segments)?;
                if !contours.is_empty() {
                    shapes.push(contours);
                }
            }
            offset.x += glyph.ha * scale;
        }

        Ok(shapes)
    }
}

struct Tokens<'a> {
    glyph: char,
    inner: std::str::SplitWhitespace<'a>,
    scale: f32,
    offset: Vector2<f32>,
}

impl<'a> Tokens<'a> {
    fn point(&mut self) -> Result<Vector2<f32>, ResourceError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Vector2::new(x, y) * self.scale + self.offset)
    }

    fn number(&mut self) -> Result<f32, ResourceError> {
        let token = self.inner.next().ok_or_else(|| ResourceError::MalformedOutline {
            glyph: self.glyph,
            reason: "outline ends in the middle of a command".to_string(),
        })?;
        token
            .parse::<f32>()
            .map_err(|e| ResourceError::MalformedOutline {
                glyph: self.glyph,
                reason: format!("{:?} is not a number: {}", token, e),
            })
    }
}

/// Flatten a glyph outline into closed polylines.
pub(crate) fn parse_outline(
    glyph: char,
    outline: &str,
    scale: f32,
    offset: Vector2<f32>,
    curve_segments: u32,
) -> Result<Vec<Contour>, ResourceError> {
    let segments = curve_segments.max(1);
    let mut tokens = Tokens {
        glyph,
        inner: outline.split_whitespace(),
        scale,
        offset,
    };
    let mut contours: Vec<Contour> = Vec::new();
    let mut current: Contour = Vec::new();

    let require_start = |current: &Contour| -> Result<Vector2<f32>, ResourceError> {
        current
            .last()
            .copied()
            .ok_or_else(|| ResourceError::MalformedOutline {
                glyph,
                reason: "drawing command before the first move".to_string(),
            })
    };

    while let Some(command) = tokens.inner.next() {
        match command {
            "m" => {
                let start = tokens.point()?;
                finish_contour(&mut contours, std::mem::take(&mut current));
                current.push(start);
            }
            "l" => {
                require_start(&current)?;
                let p = tokens.point()?;
                current.push(p);
            }
            "q" => {
                let p0 = require_start(&current)?;
                let end = tokens.point()?;
                let control = tokens.point()?;
                for k in 1..=segments {
                    let t = k as f32 / segments as f32;
                    let u = 1.0 - t;
                    current.push(p0 * (u * u) + control * (2.0 * u * t) + end * (t * t));
                }
            }
            "b" => {
                let p0 = require_start(&current)?;
                let end = tokens.point()?;
                let c1 = tokens.point()?;
                let c2 = tokens.point()?;
                for k in 1..=segments {
                    let t = k as f32 / segments as f32;
                    let u = 1.0 - t;
                    current.push(
                        p0 * (u * u * u)
                            + c1 * (3.0 * u * u * t)
                            + c2 * (3.0 * u * t * t)
                            + end * (t * t * t),
                    );
                }
            }
            other => {
                return Err(ResourceError::MalformedOutline {
                    glyph,
                    reason: format!("unknown command {:?}", other),
                });
            }
        }
    }
    finish_contour(&mut contours, current);

    Ok(contours)
}

fn finish_contour(contours: &mut Vec<Contour>, mut contour: Contour) {
    contour.dedup_by(|a, b| (*a - *b).x.abs() < 1e-6 && (*a - *b).y.abs() < 1e-6);
    if let (Some(&first), Some(&last)) = (contour.first(), contour.last()) {
        let gap = first - last;
        if contour.len() > 1 && gap.x.abs() < 1e-6 && gap.y.abs() < 1e-6 {
            contour.pop();
        }
    }
    if contour.len() >= 3 {
        contours.push(contour);
    }
}
