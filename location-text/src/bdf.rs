//! Bitmap fonts in BDF form
//!
//! The display's label fonts are bitmap fonts. Opening one only indexes where
//! each glyph record lives; records are parsed when `load_glyphs` asks for
//! them, so a font with thousands of glyphs costs little until it is used.

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

use crate::fonts::{GlyphCoverage, GlyphMetrics};

/// Lazily loaded BDF bitmap font
#[derive(Debug, Clone)]
pub struct BdfFont {
    name: String,
    source: String,
    // Code point -> byte offset of its STARTCHAR line
    index: HashMap<char, usize>,
    // Font-wide DWIDTH, used by glyphs without their own
    default_advance: Option<u32>,
    loaded: HashMap<char, u32>,
}

impl BdfFont {
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading BDF font {}", path.display()))?;
        let font = Self::parse(&path.display().to_string(), source)?;
        info!("Indexed {} glyphs in {}", font.index.len(), font.name);
        Ok(font)
    }

    /// Index the glyph records of a BDF document.
    pub fn parse(name: &str, source: String) -> Result<Self> {
        if !source.trim_start().starts_with("STARTFONT") {
            bail!("{} is not a BDF font (missing STARTFONT)", name);
        }

        let mut index = HashMap::new();
        let mut default_advance = None;
        let mut record_start = None;
        let mut offset = 0usize;

        for line in source.split_inclusive('\n') {
            let trimmed = line.trim();
            let mut fields = trimmed.split_whitespace();

            match fields.next() {
                Some("STARTCHAR") => record_start = Some(offset),
                Some("ENCODING") => {
                    let start = record_start
                        .ok_or_else(|| anyhow!("{}: ENCODING outside a glyph record", name))?;
                    let code: i64 = fields
                        .next()
                        .and_then(|value| value.parse().ok())
                        .ok_or_else(|| anyhow!("{}: malformed ENCODING line {:?}", name, trimmed))?;
                    // Negative encodings are unmapped glyphs
                    if let Some(ch) = u32::try_from(code).ok().and_then(char::from_u32) {
                        index.insert(ch, start);
                    }
                }
                Some("DWIDTH") if record_start.is_none() => {
                    default_advance = fields.next().and_then(|value| value.parse().ok());
                }
                Some("ENDCHAR") => record_start = None,
                _ => {}
            }

            offset += line.len();
        }

        Ok(Self {
            name: name.to_string(),
            source,
            index,
            default_advance,
            loaded: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn glyph_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_loaded(&self, ch: char) -> bool {
        self.loaded.contains_key(&ch)
    }

    /// Parse one glyph record and return its advance.
    fn parse_glyph(&self, ch: char, start: usize) -> Result<u32> {
        let mut advance = None;
        let mut rows_expected = None;
        let mut rows_seen = 0usize;
        let mut in_bitmap = false;

        for line in self.source[start..].lines() {
            let trimmed = line.trim();
            if trimmed == "ENDCHAR" {
                let advance = advance
                    .or(self.default_advance)
                    .ok_or_else(|| anyhow!("glyph has no DWIDTH"))?;
                if let Some(expected) = rows_expected {
                    if rows_seen != expected {
                        bail!("bitmap has {} rows, BBX declares {}", rows_seen, expected);
                    }
                }
                return Ok(advance);
            }

            if in_bitmap {
                if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
                    bail!("bitmap row {:?} is not hexadecimal", trimmed);
                }
                rows_seen += 1;
                continue;
            }

            let mut fields = trimmed.split_whitespace();
            match fields.next() {
                Some("DWIDTH") => {
                    let value = fields
                        .next()
                        .and_then(|value| value.parse::<i64>().ok())
                        .ok_or_else(|| anyhow!("malformed DWIDTH {:?}", trimmed))?;
                    advance = Some(u32::try_from(value).context("negative DWIDTH")?);
                }
                Some("BBX") => {
                    let height = fields
                        .nth(1)
                        .and_then(|value| value.parse::<usize>().ok())
                        .ok_or_else(|| anyhow!("malformed BBX {:?}", trimmed))?;
                    rows_expected = Some(height);
                }
                Some("BITMAP") => in_bitmap = true,
                Some("STARTCHAR") if advance.is_some() || in_bitmap => {
                    bail!("record is missing ENDCHAR");
                }
                _ => {}
            }
        }

        Err(anyhow!("record for U+{:04X} runs past the end of the font", ch as u32))
    }
}

impl GlyphCoverage for BdfFont {
    fn contains_glyph(&self, ch: char) -> bool {
        self.index.contains_key(&ch)
    }
}

impl GlyphMetrics for BdfFont {
    fn load_glyphs(&mut self, text: &str) -> Result<()> {
        let mut newly_loaded = 0;
        for ch in text.chars() {
            if self.loaded.contains_key(&ch) {
                continue;
            }
            let Some(&start) = self.index.get(&ch) else {
                continue;
            };
            let advance = self
                .parse_glyph(ch, start)
                .with_context(|| format!("glyph U+{:04X} in {}", ch as u32, self.name))?;
            self.loaded.insert(ch, advance);
            newly_loaded += 1;
        }
        if newly_loaded > 0 {
            debug!("Loaded {} glyphs from {}", newly_loaded, self.name);
        }
        Ok(())
    }

    fn advance(&self, ch: char) -> Result<Option<u32>> {
        if let Some(&advance) = self.loaded.get(&ch) {
            return Ok(Some(advance));
        }
        if self.index.contains_key(&ch) {
            return Err(anyhow!(
                "glyph U+{:04X} in {} measured before it was loaded",
                ch as u32,
                self.name
            ));
        }
        Ok(None)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A small BDF document with one record per (char, advance) pair.
    pub(crate) fn bdf_source(glyphs: &[(char, u32)]) -> String {
        let mut source = String::from(
            "STARTFONT 2.1\nFONT -test-fixed\nSIZE 8 75 75\nFONTBOUNDINGBOX 8 2 0 0\n",
        );
        source.push_str(&format!("CHARS {}\n", glyphs.len()));
        for (ch, advance) in glyphs {
            source.push_str(&format!(
                "STARTCHAR U{:04X}\nENCODING {}\nSWIDTH 500 0\nDWIDTH {} 0\nBBX 8 2 0 0\nBITMAP\nFF\n81\nENDCHAR\n",
                *ch as u32, *ch as u32, advance
            ));
        }
        source.push_str("ENDFONT\n");
        source
    }

    #[test]
    fn coverage_is_known_before_loading() {
        let font = BdfFont::parse("test", bdf_source(&[('A', 7), ('b', 5)])).unwrap();
        assert_eq!(font.glyph_count(), 2);
        assert!(font.contains_glyph('A'));
        assert!(!font.contains_glyph('Z'));
        assert!(!font.is_loaded('A'));
    }

    #[test]
    fn measuring_requires_loading() {
        let mut font = BdfFont::parse("test", bdf_source(&[('A', 7), ('b', 5)])).unwrap();
        assert!(font.text_width("Ab").is_err());

        font.load_glyphs("Ab").unwrap();
        assert_eq!(font.text_width("Ab").unwrap(), 12);
        // Glyphs the font lacks measure as zero
        assert_eq!(font.text_width("A?b").unwrap(), 12);
    }

    #[test]
    fn font_wide_dwidth_applies_to_records_without_one() {
        let source = "STARTFONT 2.1\nDWIDTH 4 0\nCHARS 1\nSTARTCHAR x\nENCODING 120\nBBX 4 1 0 0\nBITMAP\n0F\nENDCHAR\nENDFONT\n";
        let mut font = BdfFont::parse("test", source.to_string()).unwrap();
        font.load_glyphs("x").unwrap();
        assert_eq!(font.advance('x').unwrap(), Some(4));
    }

    #[test]
    fn malformed_bitmap_fails_on_load() {
        let source = bdf_source(&[('A', 7)]).replace("81\n", "zz\n");
        let mut font = BdfFont::parse("test", source).unwrap();
        let err = font.load_glyphs("A").unwrap_err();
        assert!(format!("{:#}", err).contains("not hexadecimal"));
    }

    #[test]
    fn short_bitmap_fails_on_load() {
        let source = bdf_source(&[('A', 7)]).replace("BBX 8 2 0 0", "BBX 8 3 0 0");
        let mut font = BdfFont::parse("test", source).unwrap();
        assert!(font.load_glyphs("A").is_err());
    }

    #[test]
    fn negative_encodings_are_not_indexed() {
        let source = bdf_source(&[('A', 7)]).replace("ENCODING 65", "ENCODING -1");
        let font = BdfFont::parse("test", source).unwrap();
        assert_eq!(font.glyph_count(), 0);
    }

    #[test]
    fn rejects_non_bdf_input() {
        assert!(BdfFont::parse("test", "hello".to_string()).is_err());
    }
}
