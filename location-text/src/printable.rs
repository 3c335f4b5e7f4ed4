//! Printability checks and ASCII transliteration for location names
//!
//! Location names arrive in whatever script the geocoder answers in, while the
//! display's bitmap fonts only carry a small Latin subset. Each character is
//! resolved to its own glyph when the font has one, to an ASCII approximation
//! when the substitution table has one, and otherwise left for the caller to
//! replace with a placeholder.

use log::debug;
use unicode_script::UnicodeScript;

use crate::fonts::GlyphCoverage;

/// Glyph used for characters that can be neither drawn nor substituted
pub const DEFAULT_FALLBACK: char = '?';

/// Code point to ASCII replacement, strictly sorted by code point.
static CODE_POINT_MAP: &[(char, &str)] = &[
    ('\u{00A0}', " "), // no-break space

    // Latin-1 letters
    ('\u{00C0}', "A"), // À
    ('\u{00C1}', "A"), // Á
    ('\u{00C2}', "A"), // Â
    ('\u{00C3}', "A"), // Ã
    ('\u{00C4}', "A"), // Ä
    ('\u{00C5}', "A"), // Å
    ('\u{00C6}', "AE"), // Æ
    ('\u{00C7}', "C"), // Ç
    ('\u{00C8}', "E"), // È
    ('\u{00C9}', "E"), // É
    ('\u{00CA}', "E"), // Ê
    ('\u{00CB}', "E"), // Ë
    ('\u{00CC}', "I"), // Ì
    ('\u{00CD}', "I"), // Í
    ('\u{00CE}', "I"), // Î
    ('\u{00CF}', "I"), // Ï
    ('\u{00D0}', "D"), // Ð
    ('\u{00D1}', "N"), // Ñ
    ('\u{00D2}', "O"), // Ò
    ('\u{00D3}', "O"), // Ó
    ('\u{00D4}', "O"), // Ô
    ('\u{00D5}', "O"), // Õ
    ('\u{00D6}', "O"), // Ö
    ('\u{00D8}', "O"), // Ø
    ('\u{00D9}', "U"), // Ù
    ('\u{00DA}', "U"), // Ú
    ('\u{00DB}', "U"), // Û
    ('\u{00DC}', "U"), // Ü
    ('\u{00DD}', "Y"), // Ý
    ('\u{00DE}', "Th"), // Þ
    ('\u{00DF}', "ss"), // ß
    ('\u{00E0}', "a"), // à
    ('\u{00E1}', "a"), // á
    ('\u{00E2}', "a"), // â
    ('\u{00E3}', "a"), // ã
    ('\u{00E4}', "a"), // ä
    ('\u{00E5}', "a"), // å
    ('\u{00E6}', "ae"), // æ
    ('\u{00E7}', "c"), // ç
    ('\u{00E8}', "e"), // è
    ('\u{00E9}', "e"), // é
    ('\u{00EA}', "e"), // ê
    ('\u{00EB}', "e"), // ë
    ('\u{00EC}', "i"), // ì
    ('\u{00ED}', "i"), // í
    ('\u{00EE}', "i"), // î
    ('\u{00EF}', "i"), // ï
    ('\u{00F0}', "d"), // ð
    ('\u{00F1}', "n"), // ñ
    ('\u{00F2}', "o"), // ò
    ('\u{00F3}', "o"), // ó
    ('\u{00F4}', "o"), // ô
    ('\u{00F5}', "o"), // õ
    ('\u{00F6}', "o"), // ö
    ('\u{00F8}', "o"), // ø
    ('\u{00F9}', "u"), // ù
    ('\u{00FA}', "u"), // ú
    ('\u{00FB}', "u"), // û
    ('\u{00FC}', "u"), // ü
    ('\u{00FD}', "y"), // ý
    ('\u{00FE}', "th"), // þ
    ('\u{00FF}', "y"), // ÿ

    // Latin Extended-A
    ('\u{0100}', "A"), // Ā
    ('\u{0101}', "a"), // ā
    ('\u{0102}', "A"), // Ă
    ('\u{0103}', "a"), // ă
    ('\u{0104}', "A"), // Ą
    ('\u{0105}', "a"), // ą
    ('\u{0106}', "C"), // Ć
    ('\u{0107}', "c"), // ć
    ('\u{0108}', "C"), // Ĉ
    ('\u{0109}', "c"), // ĉ
    ('\u{010A}', "C"), // Ċ
    ('\u{010B}', "c"), // ċ
    ('\u{010C}', "C"), // Č
    ('\u{010D}', "c"), // č
    ('\u{010E}', "D"), // Ď
    ('\u{010F}', "d"), // ď
    ('\u{0110}', "D"), // Đ
    ('\u{0111}', "d"), // đ
    ('\u{0112}', "E"), // Ē
    ('\u{0113}', "e"), // ē
    ('\u{0114}', "E"), // Ĕ
    ('\u{0115}', "e"), // ĕ
    ('\u{0116}', "E"), // Ė
    ('\u{0117}', "e"), // ė
    ('\u{0118}', "E"), // Ę
    ('\u{0119}', "e"), // ę
    ('\u{011A}', "E"), // Ě
    ('\u{011B}', "e"), // ě
    ('\u{011C}', "G"), // Ĝ
    ('\u{011D}', "g"), // ĝ
    ('\u{011E}', "G"), // Ğ
    ('\u{011F}', "g"), // ğ
    ('\u{0120}', "G"), // Ġ
    ('\u{0121}', "g"), // ġ
    ('\u{0122}', "G"), // Ģ
    ('\u{0123}', "g"), // ģ
    ('\u{0124}', "H"), // Ĥ
    ('\u{0125}', "h"), // ĥ
    ('\u{0126}', "H"), // Ħ
    ('\u{0127}', "h"), // ħ
    ('\u{0128}', "I"), // Ĩ
    ('\u{0129}', "i"), // ĩ
    ('\u{012A}', "I"), // Ī
    ('\u{012B}', "i"), // ī
    ('\u{012C}', "I"), // Ĭ
    ('\u{012D}', "i"), // ĭ
    ('\u{012E}', "I"), // Į
    ('\u{012F}', "i"), // į
    ('\u{0130}', "I"), // İ
    ('\u{0131}', "i"), // ı
    ('\u{0132}', "IJ"), // Ĳ
    ('\u{0133}', "ij"), // ĳ
    ('\u{0134}', "J"), // Ĵ
    ('\u{0135}', "j"), // ĵ
    ('\u{0136}', "K"), // Ķ
    ('\u{0137}', "k"), // ķ
    ('\u{0138}', "k"), // ĸ
    ('\u{0139}', "L"), // Ĺ
    ('\u{013A}', "l"), // ĺ
    ('\u{013B}', "L"), // Ļ
    ('\u{013C}', "l"), // ļ
    ('\u{013D}', "L"), // Ľ
    ('\u{013E}', "l"), // ľ
    ('\u{013F}', "L"), // Ŀ
    ('\u{0140}', "l"), // ŀ
    ('\u{0141}', "L"), // Ł
    ('\u{0142}', "l"), // ł
    ('\u{0143}', "N"), // Ń
    ('\u{0144}', "n"), // ń
    ('\u{0145}', "N"), // Ņ
    ('\u{0146}', "n"), // ņ
    ('\u{0147}', "N"), // Ň
    ('\u{0148}', "n"), // ň
    ('\u{0149}', "n"), // ŉ
    ('\u{014A}', "N"), // Ŋ
    ('\u{014B}', "n"), // ŋ
    ('\u{014C}', "O"), // Ō
    ('\u{014D}', "o"), // ō
    ('\u{014E}', "O"), // Ŏ
    ('\u{014F}', "o"), // ŏ
    ('\u{0150}', "O"), // Ő
    ('\u{0151}', "o"), // ő
    ('\u{0152}', "OE"), // Œ
    ('\u{0153}', "oe"), // œ
    ('\u{0154}', "R"), // Ŕ
    ('\u{0155}', "r"), // ŕ
    ('\u{0156}', "R"), // Ŗ
    ('\u{0157}', "r"), // ŗ
    ('\u{0158}', "R"), // Ř
    ('\u{0159}', "r"), // ř
    ('\u{015A}', "S"), // Ś
    ('\u{015B}', "s"), // ś
    ('\u{015C}', "S"), // Ŝ
    ('\u{015D}', "s"), // ŝ
    ('\u{015E}', "S"), // Ş
    ('\u{015F}', "s"), // ş
    ('\u{0160}', "S"), // Š
    ('\u{0161}', "s"), // š
    ('\u{0162}', "T"), // Ţ
    ('\u{0163}', "t"), // ţ
    ('\u{0164}', "T"), // Ť
    ('\u{0165}', "t"), // ť
    ('\u{0166}', "T"), // Ŧ
    ('\u{0167}', "t"), // ŧ
    ('\u{0168}', "U"), // Ũ
    ('\u{0169}', "u"), // ũ
    ('\u{016A}', "U"), // Ū
    ('\u{016B}', "u"), // ū
    ('\u{016C}', "U"), // Ŭ
    ('\u{016D}', "u"), // ŭ
    ('\u{016E}', "U"), // Ů
    ('\u{016F}', "u"), // ů
    ('\u{0170}', "U"), // Ű
    ('\u{0171}', "u"), // ű
    ('\u{0172}', "U"), // Ų
    ('\u{0173}', "u"), // ų
    ('\u{0174}', "W"), // Ŵ
    ('\u{0175}', "w"), // ŵ
    ('\u{0176}', "Y"), // Ŷ
    ('\u{0177}', "y"), // ŷ
    ('\u{0178}', "Y"), // Ÿ
    ('\u{0179}', "Z"), // Ź
    ('\u{017A}', "z"), // ź
    ('\u{017B}', "Z"), // Ż
    ('\u{017C}', "z"), // ż
    ('\u{017D}', "Z"), // Ž
    ('\u{017E}', "z"), // ž

    // Romanian comma-below letters
    ('\u{0218}', "S"), // Ș
    ('\u{0219}', "s"), // ș
    ('\u{021A}', "T"), // Ț
    ('\u{021B}', "t"), // ț

    // Modifier apostrophes (Hawaiian okina, Polynesian glottal stop)
    ('\u{02BB}', "'"), // ʻ
    ('\u{02BC}', "'"), // ʼ

    // Greek
    ('\u{0386}', "A"), // Ά
    ('\u{0388}', "E"), // Έ
    ('\u{0389}', "H"), // Ή
    ('\u{038A}', "I"), // Ί
    ('\u{038C}', "O"), // Ό
    ('\u{038E}', "Y"), // Ύ
    ('\u{038F}', "O"), // Ώ
    ('\u{0390}', "i"), // ΐ
    ('\u{0391}', "A"), // Α
    ('\u{0392}', "B"), // Β
    ('\u{0393}', "G"), // Γ
    ('\u{0394}', "D"), // Δ
    ('\u{0395}', "E"), // Ε
    ('\u{0396}', "Z"), // Ζ
    ('\u{0397}', "H"), // Η
    ('\u{0398}', "Th"), // Θ
    ('\u{0399}', "I"), // Ι
    ('\u{039A}', "K"), // Κ
    ('\u{039B}', "L"), // Λ
    ('\u{039C}', "M"), // Μ
    ('\u{039D}', "N"), // Ν
    ('\u{039E}', "X"), // Ξ
    ('\u{039F}', "O"), // Ο
    ('\u{03A0}', "P"), // Π
    ('\u{03A1}', "R"), // Ρ
    ('\u{03A3}', "S"), // Σ
    ('\u{03A4}', "T"), // Τ
    ('\u{03A5}', "Y"), // Υ
    ('\u{03A6}', "Ph"), // Φ
    ('\u{03A7}', "Ch"), // Χ
    ('\u{03A8}', "Ps"), // Ψ
    ('\u{03A9}', "O"), // Ω
    ('\u{03AA}', "I"), // Ϊ
    ('\u{03AB}', "Y"), // Ϋ
    ('\u{03AC}', "a"), // ά
    ('\u{03AD}', "e"), // έ
    ('\u{03AE}', "h"), // ή
    ('\u{03AF}', "i"), // ί
    ('\u{03B0}', "y"), // ΰ
    ('\u{03B1}', "a"), // α
    ('\u{03B2}', "b"), // β
    ('\u{03B3}', "g"), // γ
    ('\u{03B4}', "d"), // δ
    ('\u{03B5}', "e"), // ε
    ('\u{03B6}', "z"), // ζ
    ('\u{03B7}', "h"), // η
    ('\u{03B8}', "th"), // θ
    ('\u{03B9}', "i"), // ι
    ('\u{03BA}', "k"), // κ
    ('\u{03BB}', "l"), // λ
    ('\u{03BC}', "m"), // μ
    ('\u{03BD}', "n"), // ν
    ('\u{03BE}', "x"), // ξ
    ('\u{03BF}', "o"), // ο
    ('\u{03C0}', "p"), // π
    ('\u{03C1}', "r"), // ρ
    ('\u{03C2}', "s"), // ς
    ('\u{03C3}', "s"), // σ
    ('\u{03C4}', "t"), // τ
    ('\u{03C5}', "y"), // υ
    ('\u{03C6}', "ph"), // φ
    ('\u{03C7}', "ch"), // χ
    ('\u{03C8}', "ps"), // ψ
    ('\u{03C9}', "o"), // ω
    ('\u{03CA}', "i"), // ϊ
    ('\u{03CB}', "y"), // ϋ
    ('\u{03CC}', "o"), // ό
    ('\u{03CD}', "y"), // ύ
    ('\u{03CE}', "o"), // ώ

    // Cyrillic
    ('\u{0400}', "E"), // Ѐ
    ('\u{0401}', "Yo"), // Ё
    ('\u{0402}', "Dj"), // Ђ
    ('\u{0403}', "G"), // Ѓ
    ('\u{0404}', "Ye"), // Є
    ('\u{0405}', "Dz"), // Ѕ
    ('\u{0406}', "I"), // І
    ('\u{0407}', "Yi"), // Ї
    ('\u{0408}', "J"), // Ј
    ('\u{0409}', "Lj"), // Љ
    ('\u{040A}', "Nj"), // Њ
    ('\u{040B}', "C"), // Ћ
    ('\u{040C}', "K"), // Ќ
    ('\u{040D}', "I"), // Ѝ
    ('\u{040E}', "U"), // Ў
    ('\u{040F}', "Dz"), // Џ
    ('\u{0410}', "A"), // А
    ('\u{0411}', "B"), // Б
    ('\u{0412}', "V"), // В
    ('\u{0413}', "G"), // Г
    ('\u{0414}', "D"), // Д
    ('\u{0415}', "E"), // Е
    ('\u{0416}', "Zh"), // Ж
    ('\u{0417}', "Z"), // З
    ('\u{0418}', "I"), // И
    ('\u{0419}', "J"), // Й
    ('\u{041A}', "K"), // К
    ('\u{041B}', "L"), // Л
    ('\u{041C}', "M"), // М
    ('\u{041D}', "N"), // Н
    ('\u{041E}', "O"), // О
    ('\u{041F}', "P"), // П
    ('\u{0420}', "R"), // Р
    ('\u{0421}', "S"), // С
    ('\u{0422}', "T"), // Т
    ('\u{0423}', "U"), // У
    ('\u{0424}', "F"), // Ф
    ('\u{0425}', "H"), // Х
    ('\u{0426}', "C"), // Ц
    ('\u{0427}', "Ch"), // Ч
    ('\u{0428}', "Sh"), // Ш
    ('\u{0429}', "Shch"), // Щ
    ('\u{042A}', "'"), // Ъ
    ('\u{042B}', "Y"), // Ы
    ('\u{042C}', "'"), // Ь
    ('\u{042D}', "E"), // Э
    ('\u{042E}', "Yu"), // Ю
    ('\u{042F}', "Ya"), // Я
    ('\u{0430}', "a"), // а
    ('\u{0431}', "b"), // б
    ('\u{0432}', "v"), // в
    ('\u{0433}', "g"), // г
    ('\u{0434}', "d"), // д
    ('\u{0435}', "e"), // е
    ('\u{0436}', "zh"), // ж
    ('\u{0437}', "z"), // з
    ('\u{0438}', "i"), // и
    ('\u{0439}', "j"), // й
    ('\u{043A}', "k"), // к
    ('\u{043B}', "l"), // л
    ('\u{043C}', "m"), // м
    ('\u{043D}', "n"), // н
    ('\u{043E}', "o"), // о
    ('\u{043F}', "p"), // п
    ('\u{0440}', "r"), // р
    ('\u{0441}', "s"), // с
    ('\u{0442}', "t"), // т
    ('\u{0443}', "u"), // у
    ('\u{0444}', "f"), // ф
    ('\u{0445}', "h"), // х
    ('\u{0446}', "c"), // ц
    ('\u{0447}', "ch"), // ч
    ('\u{0448}', "sh"), // ш
    ('\u{0449}', "shch"), // щ
    ('\u{044A}', "'"), // ъ
    ('\u{044B}', "y"), // ы
    ('\u{044C}', "'"), // ь
    ('\u{044D}', "e"), // э
    ('\u{044E}', "yu"), // ю
    ('\u{044F}', "ya"), // я
    ('\u{0450}', "e"), // ѐ
    ('\u{0451}', "yo"), // ё
    ('\u{0452}', "dj"), // ђ
    ('\u{0453}', "g"), // ѓ
    ('\u{0454}', "ye"), // є
    ('\u{0455}', "dz"), // ѕ
    ('\u{0456}', "i"), // і
    ('\u{0457}', "yi"), // ї
    ('\u{0458}', "j"), // ј
    ('\u{0459}', "lj"), // љ
    ('\u{045A}', "nj"), // њ
    ('\u{045B}', "c"), // ћ
    ('\u{045C}', "k"), // ќ
    ('\u{045D}', "i"), // ѝ
    ('\u{045E}', "u"), // ў
    ('\u{045F}', "dz"), // џ
    ('\u{0490}', "G"), // Ґ
    ('\u{0491}', "g"), // ґ

    // Hebrew
    ('\u{05D0}', "A"), // א
    ('\u{05D1}', "B"), // ב
    ('\u{05D2}', "G"), // ג
    ('\u{05D3}', "D"), // ד
    ('\u{05D4}', "H"), // ה
    ('\u{05D5}', "V"), // ו
    ('\u{05D6}', "Z"), // ז
    ('\u{05D7}', "Ch"), // ח
    ('\u{05D8}', "T"), // ט
    ('\u{05D9}', "Y"), // י
    ('\u{05DA}', "K"), // ך
    ('\u{05DB}', "K"), // כ
    ('\u{05DC}', "L"), // ל
    ('\u{05DD}', "M"), // ם
    ('\u{05DE}', "M"), // מ
    ('\u{05DF}', "N"), // ן
    ('\u{05E0}', "N"), // נ
    ('\u{05E1}', "S"), // ס
    ('\u{05E2}', "E"), // ע
    ('\u{05E3}', "F"), // ף
    ('\u{05E4}', "P"), // פ
    ('\u{05E5}', "Ts"), // ץ
    ('\u{05E6}', "Ts"), // צ
    ('\u{05E7}', "Q"), // ק
    ('\u{05E8}', "R"), // ר
    ('\u{05E9}', "Sh"), // ש
    ('\u{05EA}', "T"), // ת

    // Arabic
    ('\u{0621}', "'"), // ء
    ('\u{0622}', "A"), // آ
    ('\u{0623}', "A"), // أ
    ('\u{0624}', "A"), // ؤ
    ('\u{0625}', "E"), // إ
    ('\u{0626}', "E"), // ئ
    ('\u{0627}', "A"), // ا
    ('\u{0628}', "b"), // ب
    ('\u{0629}', "a"), // ة
    ('\u{062A}', "t"), // ت
    ('\u{062B}', "th"), // ث
    ('\u{062C}', "j"), // ج
    ('\u{062D}', "h"), // ح
    ('\u{062E}', "kh"), // خ
    ('\u{062F}', "d"), // د
    ('\u{0630}', "dh"), // ذ
    ('\u{0631}', "r"), // ر
    ('\u{0632}', "z"), // ز
    ('\u{0633}', "s"), // س
    ('\u{0634}', "sh"), // ش
    ('\u{0635}', "s"), // ص
    ('\u{0636}', "d"), // ض
    ('\u{0637}', "t"), // ط
    ('\u{0638}', "z"), // ظ
    ('\u{0639}', "a"), // ع
    ('\u{063A}', "gh"), // غ
    ('\u{0641}', "f"), // ف
    ('\u{0642}', "q"), // ق
    ('\u{0643}', "k"), // ك
    ('\u{0644}', "l"), // ل
    ('\u{0645}', "m"), // م
    ('\u{0646}', "n"), // ن
    ('\u{0647}', "h"), // ه
    ('\u{0648}', "w"), // و
    ('\u{0649}', "y"), // ى
    ('\u{064A}', "y"), // ي

    // Persian letters outside the Arabic core
    ('\u{067E}', "p"), // پ
    ('\u{0686}', "ch"), // چ
    ('\u{0698}', "zh"), // ژ
    ('\u{06A9}', "k"), // ک
    ('\u{06AF}', "g"), // گ
    ('\u{06CC}', "y"), // ی

    // Typographic punctuation
    ('\u{2013}', "-"), // –
    ('\u{2014}', "-"), // —
    ('\u{2018}', "'"), // ‘
    ('\u{2019}', "'"), // ’
    ('\u{201C}', "\""), // “
    ('\u{201D}', "\""), // ”
    ('\u{2026}', "..."), // …
];

/// ASCII replacement for `ch`, if the substitution table has one.
pub fn substitution(ch: char) -> Option<&'static str> {
    CODE_POINT_MAP
        .binary_search_by_key(&ch, |&(from, _)| from)
        .ok()
        .map(|index| CODE_POINT_MAP[index].1)
}

/// How a single character will be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Printable {
    /// The font has a glyph for the character itself.
    Native(char),
    /// The character is replaced by an ASCII approximation.
    Substituted(&'static str),
}

impl Printable {
    pub fn push_to(self, out: &mut String) {
        match self {
            Printable::Native(ch) => out.push(ch),
            Printable::Substituted(text) => out.push_str(text),
        }
    }
}

/// Resolves characters against the glyphs a font can draw.
#[derive(Clone, Copy)]
pub struct Transliterator<'a> {
    coverage: &'a dyn GlyphCoverage,
}

impl<'a> Transliterator<'a> {
    pub fn new(coverage: &'a dyn GlyphCoverage) -> Self {
        Self { coverage }
    }

    /// Resolve one character.
    ///
    /// Substitutions are only offered when the font can draw every character
    /// of the replacement.
    pub fn resolve(&self, ch: char, allow_substitution: bool) -> Option<Printable> {
        if self.coverage.contains_glyph(ch) {
            return Some(Printable::Native(ch));
        }

        if allow_substitution {
            if let Some(text) = substitution(ch) {
                if text.chars().all(|c| self.coverage.contains_glyph(c)) {
                    return Some(Printable::Substituted(text));
                }
            }
        }

        None
    }

    /// True if every character of `text` resolves under the given policy.
    pub fn is_fully_printable(&self, text: &str, allow_substitution: bool) -> bool {
        text.chars()
            .all(|ch| self.resolve(ch, allow_substitution).is_some())
    }

    /// Map every character of `text` to something drawable, using `fallback`
    /// for characters that do not resolve.
    pub fn make_printable(&self, text: &str, allow_substitution: bool, fallback: char) -> String {
        let mut printable = String::with_capacity(text.len());

        for ch in text.chars() {
            match self.resolve(ch, allow_substitution) {
                Some(resolved) => resolved.push_to(&mut printable),
                None => {
                    debug!(
                        "No glyph or substitution for U+{:04X} ({:?} script)",
                        ch as u32,
                        ch.script()
                    );
                    printable.push(fallback);
                }
            }
        }

        printable
    }
}
