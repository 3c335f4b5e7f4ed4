//! Font management for the location and distance labels
//!
//! Provides the glyph metrics oracle the wrapper measures with, the concrete
//! font kinds the display can load, and the per-id font set built from the
//! layout configuration.

use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::bdf::BdfFont;
use crate::config::{FontSource, LayoutConfig};

/// Handles for the fonts the display renders text with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontId {
    LocationLarge,
    LocationMedium,
    LocationSmall,
    NumericLarge,
    NumericSmall,
}

impl FontId {
    pub const ALL: [FontId; 5] = [
        FontId::LocationLarge,
        FontId::LocationMedium,
        FontId::LocationSmall,
        FontId::NumericLarge,
        FontId::NumericSmall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FontId::LocationLarge => "location_large",
            FontId::LocationMedium => "location_medium",
            FontId::LocationSmall => "location_small",
            FontId::NumericLarge => "numeric_large",
            FontId::NumericSmall => "numeric_small",
        }
    }
}

impl fmt::Display for FontId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Answers whether a font can draw a code point without substitution.
pub trait GlyphCoverage {
    fn contains_glyph(&self, ch: char) -> bool;
}

/// Glyph metrics oracle.
///
/// Some fonts only know their glyph metrics after `load_glyphs` has been
/// called for the text being measured; callers load before they measure.
pub trait GlyphMetrics: GlyphCoverage {
    /// Make the glyphs used by `text` available for measurement.
    fn load_glyphs(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    /// Horizontal advance of `ch` in pixels, `None` if the font has no glyph.
    fn advance(&self, ch: char) -> Result<Option<u32>>;

    /// Width of `text` in pixels. Characters without a glyph add nothing.
    fn text_width(&self, text: &str) -> Result<u32> {
        let mut width = 0u32;
        for ch in text.chars() {
            if let Some(advance) = self.advance(ch)? {
                width = width.saturating_add(advance);
            }
        }
        Ok(width)
    }
}

/// Printable ASCII, the subset every display font carries
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiCoverage;

impl GlyphCoverage for AsciiCoverage {
    fn contains_glyph(&self, ch: char) -> bool {
        matches!(ch, ' '..='~')
    }
}

/// A font where every covered glyph has the same advance.
///
/// The built-in terminal font is one of these.
#[derive(Debug, Clone)]
pub struct FixedWidthFont {
    advance: u32,
    ranges: Vec<RangeInclusive<char>>,
}

impl FixedWidthFont {
    /// Fixed-advance font covering printable ASCII.
    pub fn new(advance: u32) -> Self {
        Self::with_ranges(advance, vec![' '..='~'])
    }

    pub fn with_ranges(advance: u32, ranges: Vec<RangeInclusive<char>>) -> Self {
        Self { advance, ranges }
    }
}

impl GlyphCoverage for FixedWidthFont {
    fn contains_glyph(&self, ch: char) -> bool {
        self.ranges.iter().any(|range| range.contains(&ch))
    }
}

impl GlyphMetrics for FixedWidthFont {
    fn advance(&self, ch: char) -> Result<Option<u32>> {
        Ok(self.contains_glyph(ch).then_some(self.advance))
    }
}

/// TrueType/OpenType font rasterized at a fixed pixel size
#[derive(Clone)]
pub struct TrueTypeFont {
    font: Font,
    name: String,
    size_px: f32,
    // Advance cache, filled by load_glyphs
    advances: HashMap<char, Option<u32>>,
}

impl TrueTypeFont {
    pub fn from_bytes(name: &str, data: Vec<u8>, size_px: f32) -> Result<Self> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| anyhow!("Failed to load font {}: {}", name, e))?;
        Ok(Self {
            font,
            name: name.to_string(),
            size_px,
            advances: HashMap::new(),
        })
    }

    /// Load the first candidate path that exists.
    pub fn from_candidates<P: AsRef<Path>>(candidates: &[P], size_px: f32) -> Result<Self> {
        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                info!("Loading font {} at {}px", path.display(), size_px);
                let data = std::fs::read(path)
                    .with_context(|| format!("reading font {}", path.display()))?;
                return Self::from_bytes(&path.display().to_string(), data, size_px);
            }
        }

        Err(anyhow!("No suitable font found among {} candidates", candidates.len()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn measure_glyph(&self, ch: char) -> Option<u32> {
        if !self.contains_glyph(ch) {
            return None;
        }
        let metrics = self.font.metrics(ch, self.size_px);
        Some(metrics.advance_width.round().max(0.0) as u32)
    }
}

impl GlyphCoverage for TrueTypeFont {
    fn contains_glyph(&self, ch: char) -> bool {
        self.font.lookup_glyph_index(ch) != 0
    }
}

impl GlyphMetrics for TrueTypeFont {
    fn load_glyphs(&mut self, text: &str) -> Result<()> {
        for ch in text.chars() {
            if !self.advances.contains_key(&ch) {
                let advance = self.measure_glyph(ch);
                self.advances.insert(ch, advance);
            }
        }
        Ok(())
    }

    fn advance(&self, ch: char) -> Result<Option<u32>> {
        match self.advances.get(&ch) {
            Some(advance) => Ok(*advance),
            None => Ok(self.measure_glyph(ch)),
        }
    }
}

/// Every font the display uses, keyed by id
#[derive(Default)]
pub struct FontSet {
    fonts: HashMap<FontId, Box<dyn GlyphMetrics>>,
    // Fonts a string must render in to count as natively printable
    coverage: Vec<FontId>,
}

impl FontSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every font named by the configuration.
    ///
    /// Relative font paths are resolved against `base_dir`.
    pub fn initialize_fonts(config: &LayoutConfig, base_dir: &Path) -> Result<Self> {
        let mut set = Self::new();

        for spec in &config.fonts {
            let font: Box<dyn GlyphMetrics> = match &spec.source {
                FontSource::Bdf { path } => {
                    let path = base_dir.join(path);
                    Box::new(BdfFont::from_file(&path)?)
                }
                FontSource::TrueType { candidates, size_px } => {
                    let candidates: Vec<_> = candidates.iter().map(|p| base_dir.join(p)).collect();
                    Box::new(
                        TrueTypeFont::from_candidates(&candidates, *size_px)
                            .with_context(|| format!("loading {}", spec.id))?,
                    )
                }
                FontSource::FixedWidth { advance } => Box::new(FixedWidthFont::new(*advance)),
            };
            debug!("Registered font {}", spec.id);
            set.fonts.insert(spec.id, font);
        }

        set.set_coverage_fonts(config.location_tiers.iter().map(|tier| tier.font).collect());
        info!("Loaded {} fonts", set.fonts.len());
        Ok(set)
    }

    pub fn insert(&mut self, id: FontId, font: impl GlyphMetrics + 'static) {
        self.fonts.insert(id, Box::new(font));
    }

    pub fn contains(&self, id: FontId) -> bool {
        self.fonts.contains_key(&id)
    }

    pub fn get(&self, id: FontId) -> Option<&dyn GlyphMetrics> {
        self.fonts.get(&id).map(|font| font.as_ref())
    }

    pub fn get_mut(&mut self, id: FontId) -> Option<&mut (dyn GlyphMetrics + 'static)> {
        self.fonts.get_mut(&id).map(|font| font.as_mut())
    }

    /// Choose which fonts decide native printability.
    pub fn set_coverage_fonts(&mut self, ids: Vec<FontId>) {
        self.coverage = ids;
    }
}

impl GlyphCoverage for FontSet {
    fn contains_glyph(&self, ch: char) -> bool {
        if self.coverage.is_empty() {
            return !self.fonts.is_empty() && self.fonts.values().all(|f| f.contains_glyph(ch));
        }
        self.coverage
            .iter()
            .all(|id| self.fonts.get(id).is_some_and(|font| font.contains_glyph(ch)))
    }
}

/// Load the fonts for a configuration, resolving paths from the working directory.
pub fn initialize_fonts(config: &LayoutConfig) -> Result<FontSet> {
    FontSet::initialize_fonts(config, Path::new("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_measures_covered_glyphs_only() {
        let font = FixedWidthFont::new(6);
        assert_eq!(font.text_width("abc").unwrap(), 18);
        assert_eq!(font.text_width("a\u{00E9}b").unwrap(), 12);
        assert_eq!(font.advance('\u{4E1C}').unwrap(), None);
    }

    #[test]
    fn ascii_coverage_excludes_controls_and_accents() {
        assert!(AsciiCoverage.contains_glyph('~'));
        assert!(AsciiCoverage.contains_glyph(' '));
        assert!(!AsciiCoverage.contains_glyph('\n'));
        assert!(!AsciiCoverage.contains_glyph('\u{014D}'));
    }

    #[test]
    fn font_set_coverage_is_intersection_of_coverage_fonts() {
        let mut set = FontSet::new();
        set.insert(FontId::LocationLarge, FixedWidthFont::new(8));
        set.insert(
            FontId::LocationSmall,
            FixedWidthFont::with_ranges(6, vec!['a'..='z']),
        );
        set.set_coverage_fonts(vec![FontId::LocationLarge, FontId::LocationSmall]);

        assert!(set.contains_glyph('q'));
        assert!(!set.contains_glyph('Q'));

        set.set_coverage_fonts(vec![FontId::LocationLarge]);
        assert!(set.contains_glyph('Q'));
    }

    #[test]
    fn empty_font_set_covers_nothing() {
        assert!(!FontSet::new().contains_glyph('a'));
    }

    const TEST_FACE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts/DejaVuSansMono.ttf");

    #[test]
    fn truetype_measures_rounded_advances() {
        let mut font = TrueTypeFont::from_candidates(&["/nonexistent/font.ttf", TEST_FACE], 16.0).unwrap();
        assert!(font.name().ends_with("DejaVuSansMono.ttf"));
        assert!(font.contains_glyph('H'));
        assert!(font.contains_glyph('\u{00E9}'));
        assert!(!font.contains_glyph('\u{4E2D}'));
        assert_eq!(font.advance('\u{4E2D}').unwrap(), None);

        let uncached = font.advance('H').unwrap().unwrap();
        assert!(uncached > 0);
        font.load_glyphs("Hello").unwrap();
        assert_eq!(font.advance('H').unwrap(), Some(uncached));

        // Monospaced: every glyph shares one advance
        assert_eq!(font.text_width("Hello").unwrap(), 5 * uncached);
        assert_eq!(font.text_width("He\u{4E2D}llo").unwrap(), 5 * uncached);
    }

    #[test]
    fn truetype_advance_grows_with_size() {
        let small = TrueTypeFont::from_candidates(&[TEST_FACE], 12.0).unwrap();
        let large = TrueTypeFont::from_candidates(&[TEST_FACE], 32.0).unwrap();
        assert!(large.text_width("408").unwrap() > small.text_width("408").unwrap());
    }

    #[test]
    fn missing_truetype_candidates_are_an_error() {
        let err = TrueTypeFont::from_candidates(&["/nonexistent/font.ttf"], 14.0)
            .err()
            .unwrap();
        assert!(err.to_string().contains("No suitable font"));
    }
}
