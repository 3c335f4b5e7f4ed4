//! Pixel-width word wrapping
//!
//! Text is split into paragraphs on `\n`, words on spaces, and words again
//! after each `-` or `/` so "Saint-Louis" can break as "Saint-" / "Louis".
//! Fragments are placed greedily. A fragment too wide for a line of its own
//! is broken between grapheme clusters, with a hyphen on every forced break
//! but the last.

use anyhow::Result;
use unicode_segmentation::UnicodeSegmentation;

use crate::fonts::GlyphMetrics;

const HYPHEN: &str = "-";
const SPACE: &str = " ";

/// Indentation applied to wrapped lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapOptions {
    /// Prefix of the first line.
    pub first_line_indent: String,
    /// Prefix of every line after the first.
    pub continuation_indent: String,
}

impl WrapOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn first_line_indent(mut self, indent: impl Into<String>) -> Self {
        self.first_line_indent = indent.into();
        self
    }

    #[must_use]
    pub fn continuation_indent(mut self, indent: impl Into<String>) -> Self {
        self.continuation_indent = indent.into();
        self
    }
}

fn is_break_suffix(ch: char) -> bool {
    ch == '-' || ch == '/'
}

/// Wrap candidates of one paragraph. A run of spaces yields empty fragments.
fn paragraph_fragments(paragraph: &str) -> impl Iterator<Item = &str> {
    paragraph.split(' ').flat_map(|word| {
        let pieces: Vec<&str> = if word.is_empty() {
            vec![word]
        } else {
            word.split_inclusive(is_break_suffix).collect()
        };
        pieces
    })
}

/// Every wrap candidate in `text`, across all paragraphs.
pub fn split_fragments(text: &str) -> Vec<&str> {
    text.split('\n').flat_map(paragraph_fragments).collect()
}

/// Wrap `text` so each line measures less than `max_width` pixels in `font`.
///
/// Lines only exceed the budget when a single glyph is wider than it.
/// Empty input yields one line holding the first-line indent.
pub fn wrap_to_pixels(
    text: &str,
    max_width: u32,
    font: &mut dyn GlyphMetrics,
    options: &WrapOptions,
) -> Result<Vec<String>> {
    font.load_glyphs(text)?;
    font.load_glyphs(" -")?;
    font.load_glyphs(&options.first_line_indent)?;
    font.load_glyphs(&options.continuation_indent)?;

    let mut builder = LineBuilder::new(&*font, max_width, options)?;
    for (i, paragraph) in text.split('\n').enumerate() {
        if i > 0 {
            builder.flush();
        }
        for fragment in paragraph_fragments(paragraph) {
            builder.push_fragment(fragment)?;
        }
    }
    Ok(builder.finish())
}

struct LineBuilder<'a> {
    font: &'a dyn GlyphMetrics,
    max_width: u32,
    continuation_indent: &'a str,
    continuation_width: u32,
    space_width: u32,
    hyphen_width: u32,
    lines: Vec<String>,
    text: String,
    width: u32,
    has_fragment: bool,
}

impl<'a> LineBuilder<'a> {
    fn new(font: &'a dyn GlyphMetrics, max_width: u32, options: &'a WrapOptions) -> Result<Self> {
        Ok(Self {
            font,
            max_width,
            continuation_indent: &options.continuation_indent,
            continuation_width: font.text_width(&options.continuation_indent)?,
            space_width: font.text_width(SPACE)?,
            hyphen_width: font.text_width(HYPHEN)?,
            lines: Vec::new(),
            text: options.first_line_indent.clone(),
            width: font.text_width(&options.first_line_indent)?,
            has_fragment: false,
        })
    }

    /// Separator placed before the next fragment on the current line.
    fn separator(&self) -> (&'static str, u32) {
        if !self.has_fragment || self.text.ends_with(is_break_suffix) {
            ("", 0)
        } else {
            (SPACE, self.space_width)
        }
    }

    fn fits(&self, fragment_width: u32) -> bool {
        let (_, sep_width) = self.separator();
        self.width + sep_width + fragment_width < self.max_width
    }

    fn append(&mut self, fragment: &str, fragment_width: u32) {
        let (sep, sep_width) = self.separator();
        self.text.push_str(sep);
        self.text.push_str(fragment);
        self.width += sep_width + fragment_width;
        self.has_fragment = true;
    }

    fn flush(&mut self) {
        let line = std::mem::replace(&mut self.text, self.continuation_indent.to_string());
        self.lines.push(line);
        self.width = self.continuation_width;
        self.has_fragment = false;
    }

    fn push_fragment(&mut self, fragment: &str) -> Result<()> {
        let fragment_width = self.font.text_width(fragment)?;
        if self.fits(fragment_width) {
            self.append(fragment, fragment_width);
            return Ok(());
        }

        // Wider than any line: fill what is left of this one first
        if fragment_width > self.max_width {
            return self.hard_break(fragment);
        }

        if self.has_fragment {
            self.flush();
        }
        // A fragment alone on its line may fill it exactly
        if self.width + fragment_width <= self.max_width {
            self.append(fragment, fragment_width);
            Ok(())
        } else {
            self.hard_break(fragment)
        }
    }

    fn hard_break(&mut self, fragment: &str) -> Result<()> {
        let graphemes: Vec<&str> = fragment.graphemes(true).collect();
        let mut piece = String::new();
        let mut piece_width = 0u32;

        for (i, grapheme) in graphemes.iter().enumerate() {
            let grapheme_width = self.font.text_width(grapheme)?;
            let reserve = if i + 1 < graphemes.len() { self.hyphen_width } else { 0 };

            loop {
                let (_, lead_width) = self.separator();
                let projected = self.width + lead_width + piece_width + grapheme_width + reserve;
                let fresh = piece.is_empty() && !self.has_fragment;
                if projected < self.max_width || fresh {
                    piece.push_str(grapheme);
                    piece_width += grapheme_width;
                    break;
                }

                if piece.is_empty() {
                    self.flush();
                    continue;
                }

                let used = self.width + lead_width + piece_width;
                self.append(&piece, piece_width);
                if used + self.hyphen_width <= self.max_width {
                    self.text.push_str(HYPHEN);
                }
                self.flush();
                piece.clear();
                piece_width = 0;
            }
        }

        if !piece.is_empty() {
            self.append(&piece, piece_width);
        }
        Ok(())
    }

    fn finish(mut self) -> Vec<String> {
        self.lines.push(self.text);
        self.lines
    }
}
