//! Layout configuration
//!
//! Every field has a default matching the e-paper display; a JSON file only
//! needs to name what it changes.

use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::fonts::FontId;
use crate::printable::DEFAULT_FALLBACK;

/// Screen geometry in pixels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenLayout {
    pub display_width: u32,
    pub display_height: u32,
    pub map_width: u32,
    pub map_height: u32,
    pub text_left_margin: u32,
    pub location_name_y_offset: u32,
}

impl Default for ScreenLayout {
    fn default() -> Self {
        Self {
            display_width: 296,
            display_height: 128,
            map_width: 192,
            map_height: 128,
            text_left_margin: 2,
            location_name_y_offset: 52,
        }
    }
}

impl ScreenLayout {
    /// Width left for text beside the map.
    pub fn info_panel_width(&self) -> u32 {
        self.display_width
            .saturating_sub(self.map_width)
            .saturating_sub(self.text_left_margin)
    }
}

/// One rung of the location text fallback ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontTier {
    pub font: FontId,
    pub max_lines: usize,
    pub line_height: u32,
}

impl FontTier {
    pub const fn new(font: FontId, max_lines: usize, line_height: u32) -> Self {
        Self {
            font,
            max_lines,
            line_height,
        }
    }
}

/// Where a font's glyphs come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontSource {
    Bdf { path: PathBuf },
    TrueType { candidates: Vec<PathBuf>, size_px: f32 },
    FixedWidth { advance: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub id: FontId,
    pub source: FontSource,
}

impl FontSpec {
    fn bdf(id: FontId, path: &str) -> Self {
        Self {
            id,
            source: FontSource::Bdf { path: PathBuf::from(path) },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub screen: ScreenLayout,
    /// Largest font first; the last tier truncates instead of failing.
    pub location_tiers: Vec<FontTier>,
    pub distance_fonts: Vec<FontId>,
    pub fallback_glyph: char,
    pub fonts: Vec<FontSpec>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            screen: ScreenLayout::default(),
            location_tiers: vec![
                FontTier::new(FontId::LocationLarge, 4, 21),
                FontTier::new(FontId::LocationMedium, 5, 17),
                FontTier::new(FontId::LocationSmall, 6, 14),
            ],
            distance_fonts: vec![FontId::NumericLarge, FontId::NumericSmall],
            fallback_glyph: DEFAULT_FALLBACK,
            fonts: vec![
                FontSpec::bdf(FontId::LocationLarge, "assets/fonts/helvR18.bdf"),
                FontSpec::bdf(FontId::LocationMedium, "assets/fonts/helvR14.bdf"),
                FontSpec::bdf(FontId::LocationSmall, "assets/fonts/helvR12.bdf"),
                FontSpec::bdf(FontId::NumericLarge, "assets/fonts/helvR32-num.bdf"),
                FontSpec::bdf(FontId::NumericSmall, "assets/fonts/helvR28-num.bdf"),
            ],
        }
    }
}

impl LayoutConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("parsing layout configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading layout configuration {}", path.display()))?;
        let config = Self::from_json_str(&json)
            .with_context(|| format!("in {}", path.display()))?;
        info!(
            "Loaded layout configuration from {} ({} tiers)",
            path.display(),
            config.location_tiers.len()
        );
        Ok(config)
    }

    /// Reject configurations the layout engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.location_tiers.is_empty() {
            bail!("at least one location tier is required");
        }
        for tier in &self.location_tiers {
            if tier.max_lines == 0 {
                bail!("tier {} allows zero lines", tier.font);
            }
            if tier.line_height == 0 {
                bail!("tier {} has zero line height", tier.font);
            }
        }
        if self.distance_fonts.is_empty() {
            bail!("at least one distance font is required");
        }

        let mut seen = HashSet::new();
        for spec in &self.fonts {
            if !seen.insert(spec.id) {
                bail!("font {} is configured twice", spec.id);
            }
        }
        let used = self
            .location_tiers
            .iter()
            .map(|tier| tier.font)
            .chain(self.distance_fonts.iter().copied());
        for id in used {
            if !seen.contains(&id) {
                bail!("font {} is used but not configured", id);
            }
        }
        Ok(())
    }
}
