//! Deterministic placeholder stills for shots without a usable visual.
//!
//! The same `(shot_id, width, height, color)` always produces the same PNG bytes: fixed
//! colors, fixed layout, and an encoder configured without adaptive filtering.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::{Rgb, RgbImage};

use crate::foundation::error::{ShotreelError, ShotreelResult};
use crate::foundation::hash::sha256_text;
use crate::model::plan::{DEFAULT_PLACEHOLDER_COLOR, DEFAULT_PLACEHOLDER_FONT_SIZE};

mod builtin_font;

const FALLBACK_RGB: [u8; 3] = [26, 26, 46];
const TEXT_RGB: [u8; 3] = [220, 220, 220];
const SHADOW_RGB: [u8; 3] = [0, 0, 0];
const SHADOW_OFFSET_PX: i32 = 2;
const CACHE_KEY_HEX_CHARS: usize = 16;

/// Parameters for one placeholder image.
#[derive(Clone, Debug)]
pub struct PlaceholderSpec {
    pub shot_id: String,
    pub width: u32,
    pub height: u32,
    /// `#RRGGBB`.
    pub color: String,
    /// Overrides the default `"{shot_id}\nPLACEHOLDER"` label.
    pub label: Option<String>,
    pub font_path: Option<PathBuf>,
    pub font_size: u32,
    /// Exact destination. Takes precedence over `cache_dir`.
    pub output_path: Option<PathBuf>,
    /// Directory for content-addressed caching.
    pub cache_dir: Option<PathBuf>,
}

impl PlaceholderSpec {
    pub fn new(shot_id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            shot_id: shot_id.into(),
            width,
            height,
            color: DEFAULT_PLACEHOLDER_COLOR.to_string(),
            label: None,
            font_path: None,
            font_size: DEFAULT_PLACEHOLDER_FONT_SIZE,
            output_path: None,
            cache_dir: None,
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn font(mut self, path: impl Into<PathBuf>, size: u32) -> Self {
        self.font_path = Some(path.into());
        self.font_size = size;
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }
}

/// Cache key for a placeholder: first 16 hex chars of `sha256("{shot_id}|{w}|{h}|{color}")`.
pub fn cache_key(shot_id: &str, width: u32, height: u32, color: &str) -> String {
    let mut key = sha256_text(&format!("{shot_id}|{width}|{height}|{color}"));
    key.truncate(CACHE_KEY_HEX_CHARS);
    key
}

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Write the placeholder PNG described by `spec` and return its path.
///
/// An existing destination file, explicit or cached, is returned untouched.
pub fn generate_placeholder(spec: &PlaceholderSpec) -> ShotreelResult<PathBuf> {
    if spec.width == 0 || spec.height == 0 {
        return Err(ShotreelError::placeholder(
            "placeholder width/height must be non-zero",
        ));
    }
    let path = match (&spec.output_path, &spec.cache_dir) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => {
            let key = cache_key(&spec.shot_id, spec.width, spec.height, &spec.color);
            dir.join(format!("placeholder_{key}.png"))
        }
        (None, None) => {
            return Err(ShotreelError::placeholder(
                "either output_path or cache_dir must be provided",
            ));
        }
    };
    if path.exists() {
        tracing::debug!(path = %path.display(), "placeholder already present");
        return Ok(path);
    }

    let png = render_png(spec)?;
    write_atomically(&path, &png)?;
    tracing::debug!(shot_id = %spec.shot_id, path = %path.display(), "wrote placeholder");
    Ok(path)
}

/// Encoded PNG bytes for `spec` (no filesystem access besides reading the font).
pub fn render_png(spec: &PlaceholderSpec) -> ShotreelResult<Vec<u8>> {
    let bg = parse_hex_color(&spec.color).unwrap_or_else(|| {
        tracing::warn!(
            color = %spec.color,
            fallback = DEFAULT_PLACEHOLDER_COLOR,
            "invalid placeholder color; using fallback"
        );
        FALLBACK_RGB
    });
    let mut img = RgbImage::from_pixel(spec.width, spec.height, Rgb(bg));

    let label = spec
        .label
        .clone()
        .unwrap_or_else(|| format!("{}\nPLACEHOLDER", spec.shot_id));
    let font = LabelFont::load(spec.font_path.as_deref());
    // Never larger than the frame.
    let px = spec.font_size.clamp(1, spec.height);
    font.draw(&mut img, &label, px, SHADOW_OFFSET_PX, SHADOW_RGB);
    font.draw(&mut img, &label, px, 0, TEXT_RGB);

    encode_png(&img)
}

enum LabelFont {
    TrueType(fontdue::Font),
    Builtin,
}

impl LabelFont {
    fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::Builtin;
        };
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(font = %path.display(), error = %e, "font unreadable; using built-in glyphs");
                return Self::Builtin;
            }
        };
        match fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()) {
            Ok(font) => Self::TrueType(font),
            Err(e) => {
                tracing::debug!(font = %path.display(), error = e, "font unparseable; using built-in glyphs");
                Self::Builtin
            }
        }
    }

    /// Draw `label` centered on `img`, shifted by `offset` pixels on both axes.
    fn draw(&self, img: &mut RgbImage, label: &str, px: u32, offset: i32, rgb: [u8; 3]) {
        match self {
            Self::TrueType(font) => draw_truetype(img, font, label, px as f32, offset, rgb),
            Self::Builtin => draw_builtin(img, label, px, offset, rgb),
        }
    }
}

fn draw_truetype(
    img: &mut RgbImage,
    font: &fontdue::Font,
    label: &str,
    px: f32,
    offset: i32,
    rgb: [u8; 3],
) {
    use fontdue::layout::{
        CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign,
        WrapStyle,
    };

    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings {
        x: 0.0,
        y: 0.0,
        max_width: Some(img.width() as f32),
        max_height: Some(img.height() as f32),
        horizontal_align: HorizontalAlign::Center,
        vertical_align: VerticalAlign::Middle,
        line_height: 1.0,
        wrap_style: WrapStyle::Word,
        wrap_hard_breaks: true,
    });
    layout.append(&[font], &TextStyle::new(label, px, 0));

    for glyph in layout.glyphs() {
        if glyph.width == 0 || glyph.height == 0 {
            continue;
        }
        let (_, coverage) = font.rasterize_config(glyph.key);
        let x0 = glyph.x.round() as i32 + offset;
        let y0 = glyph.y.round() as i32 + offset;
        for row in 0..glyph.height {
            for col in 0..glyph.width {
                let alpha = coverage[row * glyph.width + col];
                blend(img, x0 + col as i32, y0 + row as i32, rgb, alpha);
            }
        }
    }
}

fn draw_builtin(img: &mut RgbImage, label: &str, px: u32, offset: i32, rgb: [u8; 3]) {
    use builtin_font::{ADVANCE_COLS, GLYPH_COLS, GLYPH_ROWS, LINE_ROWS};

    let (width, height) = (i64::from(img.width()), i64::from(img.height()));
    let scale = i64::from((px / 8).max(1));
    let (advance, glyph_cols) = (i64::from(ADVANCE_COLS), i64::from(GLYPH_COLS));
    let (line_rows, glyph_rows) = (i64::from(LINE_ROWS), i64::from(GLYPH_ROWS));
    let offset = i64::from(offset);

    let lines = label.split('\n').collect::<Vec<_>>();
    let line_h = line_rows.saturating_mul(scale);
    let block_h = line_h
        .saturating_mul(lines.len() as i64)
        .saturating_sub((line_rows - glyph_rows).saturating_mul(scale));
    let top = (height - block_h) / 2 + offset;

    for (li, line) in lines.iter().enumerate() {
        let n = line.chars().count() as i64;
        let line_w = if n == 0 {
            0
        } else {
            n.saturating_mul(advance)
                .saturating_sub(advance - glyph_cols)
                .saturating_mul(scale)
        };
        let left = (width - line_w) / 2 + offset;
        let y_line = top.saturating_add((li as i64).saturating_mul(line_h));
        for (ci, c) in line.chars().enumerate() {
            let x_char = left.saturating_add((ci as i64).saturating_mul(advance * scale));
            for row in 0..GLYPH_ROWS {
                for col in 0..GLYPH_COLS {
                    if !builtin_font::is_set(c, col, row) {
                        continue;
                    }
                    // Only the part of the scaled cell that lands on the image is visited.
                    let x0 = x_char.saturating_add(i64::from(col) * scale);
                    let y0 = y_line.saturating_add(i64::from(row) * scale);
                    let xs = x0.max(0)..x0.saturating_add(scale).min(width);
                    let ys = y0.max(0)..y0.saturating_add(scale).min(height);
                    for y in ys {
                        for x in xs.clone() {
                            blend(img, x as i32, y as i32, rgb, 255);
                        }
                    }
                }
            }
        }
    }
}

fn blend(img: &mut RgbImage, x: i32, y: i32, rgb: [u8; 3], alpha: u8) {
    if alpha == 0 || x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let a = u16::from(alpha);
    let inv = 255 - a;
    let dst = img.get_pixel_mut(x as u32, y as u32);
    for (d, s) in dst.0.iter_mut().zip(rgb) {
        *d = ((u16::from(s) * a + u16::from(*d) * inv + 127) / 255) as u8;
    }
}

fn encode_png(img: &RgbImage) -> ShotreelResult<Vec<u8>> {
    use image::ImageEncoder as _;
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};

    let mut buf = Vec::new();
    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::NoFilter)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ShotreelError::placeholder(format!("png encoding failed: {e}")))?;
    Ok(buf)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> ShotreelResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create placeholder directory '{}'", parent.display())
        })?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".partial");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)
        .with_context(|| format!("failed to write placeholder '{}'", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move placeholder into '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/placeholder.rs"]
mod tests;
