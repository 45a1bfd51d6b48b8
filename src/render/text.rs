//! Rasterize text with `rusttype` into images `raqote` can draw.

use crate::render::constants;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use log::{debug, warn};
use raqote::{DrawOptions, DrawTarget, Image, Point};
use rusttype::{point, Font, Scale};
use std::path::Path;

/// Text and its size in font points.
#[derive(Clone, Debug, PartialEq)]
pub struct TextProps {
    pub text: String,
    pub size: f32,
}

/// Premultiplied ARGB pixels of rendered text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextBuffer {
    pub width: i32,
    pub height: i32,
    pub data: Vec<u32>,
}

/// Read a TrueType font, from `path` or else from the first system font found.
///
/// Returns `None` when no font is configured and none is found.
pub fn load_font(path: Option<&Path>) -> Result<Option<Font<'static>>, Report> {
    if let Some(path) = path {
        let data = std::fs::read(path).wrap_err_with(|| format!("Failed to read font: {path:?}"))?;
        let font = Font::try_from_vec(data).ok_or_else(|| eyre!("Failed to parse font: {path:?}"))?;
        return Ok(Some(font));
    }

    for path in constants::FONT_PATHS.iter().map(Path::new).filter(|p| p.exists()) {
        if let Some(font) = std::fs::read(path).ok().and_then(Font::try_from_vec) {
            debug!("Using font: {path:?}");
            return Ok(Some(font));
        }
    }
    warn!("No font found, the figure will be drawn without text.");
    Ok(None)
}

/// Render one line of text in `color` (RGBA).
pub fn text(font: &Font, props: &TextProps, color: [u8; 4]) -> TextBuffer {
    let scale = Scale::uniform(props.size * constants::PX_PER_PT);
    let v_metrics = font.v_metrics(scale);
    let glyphs = font.layout(&props.text, scale, point(0., v_metrics.ascent)).collect::<Vec<_>>();

    let width = glyphs
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.)
        .ceil() as i32;
    let height = (v_metrics.ascent - v_metrics.descent).ceil() as i32;
    let mut data = vec![0_u32; (width.max(0) * height.max(0)) as usize];

    let [r, g, b, a] = color;
    for glyph in &glyphs {
        let Some(bounds) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|x, y, coverage| {
            let x = x as i32 + bounds.min.x;
            let y = y as i32 + bounds.min.y;
            if x < 0 || y < 0 || x >= width || y >= height {
                return;
            }
            let alpha = (coverage * a as f32).round() as u32;
            let pixel = &mut data[(y * width + x) as usize];
            // overlapping glyphs keep the stronger coverage
            if alpha > *pixel >> 24 {
                let premultiply = |c: u8| c as u32 * alpha / 255;
                *pixel = (alpha << 24) | (premultiply(r) << 16) | (premultiply(g) << 8) | premultiply(b);
            }
        });
    }

    TextBuffer { width, height, data }
}

impl TextBuffer {
    /// Rotate 90 degrees counter-clockwise, so text reads bottom to top.
    pub fn rotate(&self) -> TextBuffer {
        let (width, height) = (self.height, self.width);
        let mut data = vec![0_u32; self.data.len()];
        for y in 0..height {
            for x in 0..width {
                data[(y * width + x) as usize] = self.data[(x * self.width + (self.width - 1 - y)) as usize];
            }
        }
        TextBuffer { width, height, data }
    }

    /// Draw with the top left corner at `point`.
    pub fn render(&self, canvas: &mut DrawTarget, point: Point) {
        if self.width <= 0 || self.height <= 0 {
            return;
        }
        let image = Image { width: self.width, height: self.height, data: &self.data };
        canvas.draw_image_at(point.x, point.y, &image, &DrawOptions::new());
    }
}
