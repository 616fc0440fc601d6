//! MSDF fonts and text layout
//!
//! A [`Font`] pairs an already-generated MSDF atlas texture with the glyph
//! metrics produced alongside it. Plane bounds are in em units relative to
//! the pen position on the baseline; atlas bounds are in atlas pixels.
//! [`layout_text`] turns a string into positioned glyph quads without
//! touching the GPU.

use std::collections::HashMap;
use std::rc::Rc;

use crate::render::resources::Texture2D;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphBounds {
    /// Left edge
    pub left: f32,
    /// Bottom edge
    pub bottom: f32,
    /// Right edge
    pub right: f32,
    /// Top edge
    pub top: f32,
}

impl GlyphBounds {
    /// Bounds from edges
    pub const fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }
}

/// Metrics of one glyph
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Glyph {
    /// Pen advance in em units
    pub advance: f32,
    /// Quad placement, `None` for whitespace
    pub plane_bounds: Option<GlyphBounds>,
    /// Atlas region in pixels, `None` for whitespace
    pub atlas_bounds: Option<GlyphBounds>,
}

/// Vertical font metrics in em units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Distance between baselines
    pub line_height: f32,
    /// Baseline to top of the tallest glyph
    pub ascender: f32,
    /// Baseline to bottom of the lowest glyph, negative below the baseline
    pub descender: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            line_height: 1.2,
            ascender: 0.9,
            descender: -0.3,
        }
    }
}

/// Loaded MSDF font
#[derive(Debug)]
pub struct Font {
    atlas: Rc<Texture2D>,
    metrics: FontMetrics,
    glyphs: HashMap<char, Glyph>,
    kerning: HashMap<(char, char), f32>,
}

impl Font {
    /// Font over `atlas` with no glyphs yet
    pub fn new(atlas: Rc<Texture2D>, metrics: FontMetrics) -> Self {
        Self {
            atlas,
            metrics,
            glyphs: HashMap::new(),
            kerning: HashMap::new(),
        }
    }

    /// Register a glyph
    pub fn add_glyph(&mut self, character: char, glyph: Glyph) {
        self.glyphs.insert(character, glyph);
    }

    /// Register a kerning adjustment applied between `left` and `right`
    pub fn add_kerning(&mut self, left: char, right: char, adjustment: f32) {
        self.kerning.insert((left, right), adjustment);
    }

    /// Glyph for `character`
    pub fn glyph(&self, character: char) -> Option<&Glyph> {
        self.glyphs.get(&character)
    }

    /// Pen advance from `character` to `next`, kerning included
    pub fn advance(&self, character: char, next: Option<char>) -> f32 {
        let base = self.glyph(character).map_or(0.0, |g| g.advance);
        let kerning = next
            .and_then(|next| self.kerning.get(&(character, next)))
            .copied()
            .unwrap_or(0.0);
        base + kerning
    }

    /// Atlas texture
    pub fn atlas(&self) -> &Rc<Texture2D> {
        &self.atlas
    }

    /// Vertical metrics
    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }
}

/// Per-string text settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextParams {
    /// RGBA color
    pub color: [f32; 4],
    /// Extra horizontal space after every glyph, in em units
    pub kerning: f32,
    /// Extra vertical space between lines, in em units
    pub line_spacing: f32,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            color: [1.0; 4],
            kerning: 0.0,
            line_spacing: 0.0,
        }
    }
}

/// One glyph quad in text space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    /// Placement in text space
    pub plane: GlyphBounds,
    /// Normalized atlas coordinates
    pub tex: GlyphBounds,
}

const TAB_WIDTH: usize = 4;
const FALLBACK: char = '?';

/// Lay out `text` with `font`
///
/// Text space has its origin on the first baseline and is scaled so that
/// ascender to descender spans one unit. `\n` starts a new line, `\r` is
/// ignored, a tab advances by four spaces, and characters missing from the
/// font fall back to `?` (or are skipped if that is missing too).
pub fn layout_text(font: &Font, text: &str, params: &TextParams) -> Vec<GlyphQuad> {
    let metrics = font.metrics();
    let em_height = metrics.ascender - metrics.descender;
    let scale = if em_height > 0.0 { 1.0 / em_height } else { 1.0 };
    let texel_width = 1.0 / font.atlas().width() as f32;
    let texel_height = 1.0 / font.atlas().height() as f32;

    let chars: Vec<char> = text.chars().collect();
    let mut quads = Vec::with_capacity(chars.len());
    let mut x = 0.0f32;
    let mut y = 0.0f32;

    for (i, &character) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        match character {
            '\r' => continue,
            '\n' => {
                x = 0.0;
                y -= scale * metrics.line_height + params.line_spacing;
                continue;
            }
            ' ' => {
                x += scale * font.advance(' ', next) + params.kerning;
                continue;
            }
            '\t' => {
                x += TAB_WIDTH as f32 * (scale * font.advance(' ', None) + params.kerning);
                continue;
            }
            _ => {}
        }

        let (shown, glyph) = match font.glyph(character) {
            Some(glyph) => (character, glyph),
            None => match font.glyph(FALLBACK) {
                Some(glyph) => (FALLBACK, glyph),
                None => {
                    log::trace!("No glyph for {character:?} and no fallback glyph");
                    continue;
                }
            },
        };

        if let (Some(plane), Some(atlas)) = (glyph.plane_bounds, glyph.atlas_bounds) {
            quads.push(GlyphQuad {
                plane: GlyphBounds::new(
                    plane.left * scale + x,
                    plane.bottom * scale + y,
                    plane.right * scale + x,
                    plane.top * scale + y,
                ),
                tex: GlyphBounds::new(
                    atlas.left * texel_width,
                    atlas.bottom * texel_height,
                    atlas.right * texel_width,
                    atlas.top * texel_height,
                ),
            });
        }

        x += scale * font.advance(shown, next) + params.kerning;
    }

    quads
}
