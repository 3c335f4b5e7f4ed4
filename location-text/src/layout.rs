//! Location label layout
//!
//! Tries the configured font tiers in order and returns the first wrap that
//! fits, truncating with an ellipsis at the last tier. Measurement failures
//! only disqualify the tier they happen in.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;

use crate::config::{FontTier, LayoutConfig};
use crate::country::CountryAbbreviations;
use crate::fonts::{FontId, FontSet, GlyphMetrics};
use crate::geodata::{build_location_name, GeodataRecord};
use crate::printable::Transliterator;
use crate::wrap::{split_fragments, wrap_to_pixels, WrapOptions};

pub const ELLIPSIS: &str = "...";

/// Lines ready for the renderer, top to bottom
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapResult {
    pub lines: Vec<String>,
    pub font: FontId,
    pub line_height: u32,
    /// Lines were dropped and the last one ends in an ellipsis.
    pub truncated: bool,
}

impl WrapResult {
    /// Baseline y of each line, starting at `origin_y`.
    pub fn line_offsets(&self, origin_y: i32) -> impl Iterator<Item = (i32, &str)> + '_ {
        let step = i32::try_from(self.line_height).unwrap_or(i32::MAX);
        self.lines.iter().enumerate().map(move |(i, line)| {
            let index = i32::try_from(i).unwrap_or(i32::MAX);
            (origin_y.saturating_add(step.saturating_mul(index)), line.as_str())
        })
    }
}

/// Lay out `text` with the first tier that can hold it.
///
/// Returns `None` for empty text, or when even the truncated last tier
/// cannot produce lines within `max_width`.
pub fn layout_location(
    text: &str,
    tiers: &[FontTier],
    max_width: u32,
    fonts: &mut FontSet,
) -> Option<WrapResult> {
    if text.is_empty() || tiers.is_empty() {
        return None;
    }
    let last = tiers.len() - 1;

    let probed = probe_tier(text, tiers, max_width, fonts);
    if let Some(index) = probed {
        debug!("Every fragment fits at {}", tiers[index].font);
        if let Some(result) = try_tier(text, &tiers[index], max_width, fonts, index == last) {
            return Some(result);
        }
    }

    for (index, tier) in tiers.iter().enumerate() {
        if probed == Some(index) {
            continue;
        }
        if let Some(result) = try_tier(text, tier, max_width, fonts, index == last) {
            return Some(result);
        }
    }

    warn!("No layout fits {:?} within {}px", text, max_width);
    None
}

/// First tier where no single fragment is wider than the budget.
fn probe_tier(text: &str, tiers: &[FontTier], max_width: u32, fonts: &mut FontSet) -> Option<usize> {
    let fragments = split_fragments(text);
    tiers.iter().position(|tier| {
        let fits = fonts
            .get_mut(tier.font)
            .ok_or_else(|| anyhow!("font {} is not loaded", tier.font))
            .and_then(|font| {
                font.load_glyphs(text)?;
                for fragment in &fragments {
                    if font.text_width(fragment)? > max_width {
                        return Ok(false);
                    }
                }
                Ok(true)
            });
        match fits {
            Ok(fits) => fits,
            Err(err) => {
                warn!("Probing {} failed: {:#}", tier.font, err);
                false
            }
        }
    })
}

fn try_tier(
    text: &str,
    tier: &FontTier,
    max_width: u32,
    fonts: &mut FontSet,
    truncate: bool,
) -> Option<WrapResult> {
    match attempt_tier(text, tier, max_width, fonts, truncate) {
        Ok(Some(result)) => {
            debug!(
                "Laid out {} lines at {}{}",
                result.lines.len(),
                tier.font,
                if result.truncated { " (truncated)" } else { "" }
            );
            Some(result)
        }
        Ok(None) => {
            debug!("Text does not fit {} in {} lines", tier.font, tier.max_lines);
            None
        }
        Err(err) => {
            warn!("Tier {} failed: {:#}", tier.font, err);
            None
        }
    }
}

fn attempt_tier(
    text: &str,
    tier: &FontTier,
    max_width: u32,
    fonts: &mut FontSet,
    truncate: bool,
) -> Result<Option<WrapResult>> {
    let font = fonts
        .get_mut(tier.font)
        .ok_or_else(|| anyhow!("font {} is not loaded", tier.font))?;

    let lines = wrap_to_pixels(text, max_width, font, &WrapOptions::new())?;
    let (lines, truncated) = if lines.len() <= tier.max_lines {
        (lines, false)
    } else if truncate {
        match truncate_with_ellipsis(lines, tier.max_lines, max_width, font)? {
            Some(lines) => (lines, true),
            None => return Ok(None),
        }
    } else {
        return Ok(None);
    };

    for line in &lines {
        if font.text_width(line)? > max_width {
            debug!("{:?} is wider than {}px at {}", line, max_width, tier.font);
            return Ok(None);
        }
    }

    Ok(Some(WrapResult {
        lines,
        font: tier.font,
        line_height: tier.line_height,
        truncated,
    }))
}

/// Keep the first `max_lines` lines and end the last one with an ellipsis.
fn truncate_with_ellipsis(
    mut lines: Vec<String>,
    max_lines: usize,
    max_width: u32,
    font: &mut dyn GlyphMetrics,
) -> Result<Option<Vec<String>>> {
    lines.truncate(max_lines);
    let Some(last) = lines.pop() else {
        return Ok(None);
    };
    font.load_glyphs(ELLIPSIS)?;

    Ok(ellipsize(&last, max_width, font)?.map(|last| {
        lines.push(last);
        lines
    }))
}

fn trim_for_ellipsis(text: &str) -> &str {
    text.trim_end_matches(|c: char| c == '.' || c == '-' || c.is_whitespace())
}

fn ellipsize(line: &str, max_width: u32, font: &mut dyn GlyphMetrics) -> Result<Option<String>> {
    let base = trim_for_ellipsis(line);
    let candidate = format!("{}{}", base, ELLIPSIS);
    if font.text_width(&candidate)? <= max_width {
        return Ok(Some(candidate));
    }

    // Prefer cutting at the fragment boundary the wrapper would choose
    let rewrapped = wrap_to_pixels(&candidate, max_width, font, &WrapOptions::new())?;
    let mut base = rewrapped
        .into_iter()
        .next()
        .map(|first| trim_for_ellipsis(&first).to_string())
        .unwrap_or_default();

    loop {
        let candidate = format!("{}{}", base, ELLIPSIS);
        if font.text_width(&candidate)? <= max_width {
            return Ok(Some(candidate));
        }
        if base.pop().is_none() {
            return Ok(None);
        }
        base = trim_for_ellipsis(&base).to_string();
    }
}

/// The first candidate font that fits `text` on one line, else the last.
pub fn font_for_distance_text(
    text: &str,
    candidates: &[FontId],
    max_width: u32,
    fonts: &mut FontSet,
) -> Option<FontId> {
    let (&smallest, larger) = candidates.split_last()?;
    for &id in larger {
        let lines = fonts
            .get_mut(id)
            .ok_or_else(|| anyhow!("font {} is not loaded", id))
            .and_then(|font| wrap_to_pixels(text, max_width, font, &WrapOptions::new()));
        match lines {
            Ok(lines) if lines.len() <= 1 => return Some(id),
            Ok(_) => debug!("{:?} does not fit one line at {}", text, id),
            Err(err) => warn!("Measuring distance text at {} failed: {:#}", id, err),
        }
    }
    Some(smallest)
}

/// Fonts, configuration and lookup tables for the location panel
pub struct LocationTextEngine {
    config: LayoutConfig,
    fonts: FontSet,
    abbreviations: CountryAbbreviations,
    max_width: u32,
}

impl LocationTextEngine {
    pub fn new(config: LayoutConfig, fonts: FontSet) -> Self {
        let max_width = config.screen.info_panel_width();
        Self {
            config,
            fonts,
            abbreviations: CountryAbbreviations::builtin().clone(),
            max_width,
        }
    }

    /// Validate `config` and load its fonts, resolving paths from `base_dir`.
    pub fn from_config(config: LayoutConfig, base_dir: &Path) -> Result<Self> {
        config.validate()?;
        let fonts = FontSet::initialize_fonts(&config, base_dir)?;
        info!(
            "Location text ready: {} tiers, {}px wide",
            config.location_tiers.len(),
            config.screen.info_panel_width()
        );
        Ok(Self::new(config, fonts))
    }

    #[must_use]
    pub fn with_abbreviations(mut self, abbreviations: CountryAbbreviations) -> Self {
        self.abbreviations = abbreviations;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    pub fn set_max_width(&mut self, max_width: u32) {
        self.max_width = max_width;
    }

    /// Resolver against the fonts every location tier shares.
    pub fn transliterator(&self) -> Transliterator<'_> {
        Transliterator::new(&self.fonts)
    }

    pub fn location_name(&self, record: &GeodataRecord) -> Option<String> {
        let name = build_location_name(
            record,
            &self.transliterator(),
            &self.abbreviations,
            self.config.fallback_glyph,
        );
        if name.is_none() {
            warn!("Geodata has no usable name, location label stays blank");
        }
        name
    }

    pub fn layout_location(&mut self, text: &str) -> Option<WrapResult> {
        layout_location(text, &self.config.location_tiers, self.max_width, &mut self.fonts)
    }

    pub fn font_for_distance_text(&mut self, text: &str) -> Option<FontId> {
        font_for_distance_text(text, &self.config.distance_fonts, self.max_width, &mut self.fonts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdf::tests::bdf_source;
    use crate::bdf::BdfFont;
    use crate::fonts::FixedWidthFont;

    fn tiers() -> Vec<FontTier> {
        vec![
            FontTier::new(FontId::LocationLarge, 2, 21),
            FontTier::new(FontId::LocationSmall, 3, 14),
        ]
    }

    fn fonts() -> FontSet {
        let mut fonts = FontSet::new();
        fonts.insert(FontId::LocationLarge, FixedWidthFont::new(10));
        fonts.insert(FontId::LocationSmall, FixedWidthFont::new(5));
        fonts
    }

    #[test]
    fn empty_text_has_no_layout() {
        assert_eq!(layout_location("", &tiers(), 100, &mut fonts()), None);
    }

    #[test]
    fn short_text_stays_at_the_largest_tier() {
        let result = layout_location("Lima, Peru", &tiers(), 120, &mut fonts()).unwrap();
        assert_eq!(result.font, FontId::LocationLarge);
        assert_eq!(result.lines, vec!["Lima, Peru"]);
        assert!(!result.truncated);
    }

    #[test]
    fn long_word_moves_to_a_tier_where_it_fits() {
        // 12 glyphs are 120px at the large font and 60px at the small one
        let result = layout_location("Ouagadougou!", &tiers(), 100, &mut fonts()).unwrap();
        assert_eq!(result.font, FontId::LocationSmall);
        assert_eq!(result.lines, vec!["Ouagadougou!"]);
    }

    #[test]
    fn full_width_words_keep_the_largest_tier() {
        // Each word is exactly 50px at the large font
        let result = layout_location("abcde fghij", &tiers(), 50, &mut fonts()).unwrap();
        assert_eq!(result.font, FontId::LocationLarge);
        assert_eq!(result.lines, vec!["abcde", "fghij"]);
        assert!(!result.truncated);
    }

    #[test]
    fn too_many_lines_fall_through_to_smaller_tier() {
        // Three 5-glyph words need three lines at 10px but one at 5px
        let result = layout_location("aaaaa bbbbb ccccc", &tiers(), 90, &mut fonts()).unwrap();
        assert_eq!(result.font, FontId::LocationSmall);
        assert_eq!(result.lines, vec!["aaaaa bbbbb ccccc"]);
    }

    #[test]
    fn last_tier_truncates_with_ellipsis() {
        let text = "one two three four five six seven eight nine ten";
        let result = layout_location(text, &tiers(), 40, &mut fonts()).unwrap();
        assert_eq!(result.font, FontId::LocationSmall);
        assert!(result.truncated);
        assert_eq!(result.lines.len(), 3);
        assert!(result.lines[2].ends_with(ELLIPSIS));
        assert!(!result.lines[2].ends_with("...."));
        let font = FixedWidthFont::new(5);
        for line in &result.lines {
            assert!(font.text_width(line).unwrap() <= 40);
        }
    }

    #[test]
    fn impossible_budget_has_no_layout() {
        // A single 5px glyph cannot fit in 3px
        assert_eq!(layout_location("abc def", &tiers(), 3, &mut fonts()), None);
    }

    #[test]
    fn ellipsis_replaces_trailing_characters_when_needed() {
        let mut font = FixedWidthFont::new(5);
        // "abcdef..." is 45px, over the 30px budget
        let line = ellipsize("abcdef", 30, &mut font).unwrap().unwrap();
        assert_eq!(line, "abc...");
        assert_eq!(ellipsize("ab.", 30, &mut font).unwrap().unwrap(), "ab...");
        assert_eq!(ellipsize("abc", 10, &mut font).unwrap(), None);
    }

    #[test]
    fn ellipsis_prefers_fragment_boundaries() {
        let mut font = FixedWidthFont::new(5);
        let line = ellipsize("ab cdefgh", 45, &mut font).unwrap().unwrap();
        assert_eq!(line, "ab...");
    }

    #[test]
    fn failing_tier_falls_back_to_the_next() {
        let mut fonts = fonts();
        // A record whose bitmap is corrupt fails when the text is measured
        let source = bdf_source(&[('a', 6), ('b', 6)]).replace("81\n", "zz\n");
        fonts.insert(FontId::LocationLarge, BdfFont::parse("broken", source).unwrap());

        let result = layout_location("ab", &tiers(), 100, &mut fonts).unwrap();
        assert_eq!(result.font, FontId::LocationSmall);
    }

    #[test]
    fn missing_font_disqualifies_its_tier() {
        let mut fonts = FontSet::new();
        fonts.insert(FontId::LocationSmall, FixedWidthFont::new(5));
        let result = layout_location("Oslo", &tiers(), 100, &mut fonts).unwrap();
        assert_eq!(result.font, FontId::LocationSmall);
    }

    #[test]
    fn distance_font_shrinks_when_text_wraps() {
        let mut fonts = FontSet::new();
        fonts.insert(FontId::NumericLarge, FixedWidthFont::new(20));
        fonts.insert(FontId::NumericSmall, FixedWidthFont::new(15));
        let candidates = [FontId::NumericLarge, FontId::NumericSmall];

        assert_eq!(
            font_for_distance_text("1234", &candidates, 100, &mut fonts),
            Some(FontId::NumericLarge)
        );
        assert_eq!(
            font_for_distance_text("1234 km", &candidates, 100, &mut fonts),
            Some(FontId::NumericSmall)
        );
        assert_eq!(font_for_distance_text("1", &[], 100, &mut fonts), None);
    }

    #[test]
    fn line_offsets_step_by_line_height() {
        let result = WrapResult {
            lines: vec!["a".into(), "b".into(), "c".into()],
            font: FontId::LocationMedium,
            line_height: 17,
            truncated: false,
        };
        let offsets: Vec<_> = result.line_offsets(52).collect();
        assert_eq!(offsets, vec![(52, "a"), (69, "b"), (86, "c")]);
    }

    #[test]
    fn engine_uses_the_info_panel_width() {
        let mut config = LayoutConfig::default();
        config.location_tiers = tiers();
        let mut engine = LocationTextEngine::new(config, fonts());
        assert_eq!(engine.max_width(), 102);

        let record = GeodataRecord {
            city: Some("Reykjav\u{00ED}k".into()),
            country: Some("Iceland".into()),
            ..GeodataRecord::default()
        };
        let name = engine.location_name(&record).unwrap();
        assert_eq!(name, "Reykjavik, Iceland");

        let result = engine.layout_location(&name).unwrap();
        assert_eq!(result.font, FontId::LocationLarge);
        assert_eq!(result.lines, vec!["Reykjavik,", "Iceland"]);

        engine.set_max_width(20);
        assert_eq!(engine.max_width(), 20);
    }
}
