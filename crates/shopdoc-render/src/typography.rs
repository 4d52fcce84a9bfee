//! Font selection
//!
//! The engine probes once, at start-up, for a currency-capable font family.
//! When both faces are present they are embedded in every document and every
//! text draw uses them; otherwise the built-in Helvetica faces are used and
//! the rupee sign is spelled `Rs.` since WinAnsi has no glyph for it.
//!
//! All text is written with a single-byte WinAnsi encoding. Embedded fonts
//! re-map code 0x80 to the rupee glyph through an encoding difference.

use crate::config::EngineConfig;
use crate::constants::RUPEE_CODE;
use crate::money::RUPEE_SIGN;
use crate::stream::flate_stream;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;
use std::sync::Arc;

/// Which face a drawing call wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    Regular,
    Bold,
}

impl FontRole {
    /// Resource name used in page content streams
    pub fn resource_name(self) -> &'static str {
        match self {
            FontRole::Regular => "F1",
            FontRole::Bold => "F2",
        }
    }
}

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;

/// Fallback advance for codes outside the Helvetica tables
const DEFAULT_WIDTH: u16 = 556;

/// Helvetica advance widths for codes 32..=126 (1/1000 em)
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for codes 32..=126 (1/1000 em)
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// WinAnsi codes 0x80..=0x9F that differ from Latin-1
const WIN_ANSI_HIGH: [(u8, char); 26] = [
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

// =============================================================================
// Embedded Font Programs
// =============================================================================

/// A TrueType font prepared for embedding, with metrics in 1/1000 em
#[derive(Debug, Clone)]
pub struct FontProgram {
    pub base_name: String,
    data: Arc<Vec<u8>>,
    /// Advance widths for codes FIRST_CHAR..=LAST_CHAR
    widths: Vec<u16>,
    ascent: i32,
    descent: i32,
    cap_height: i32,
    bbox: [i32; 4],
    bold: bool,
}

impl FontProgram {
    /// Parse a TrueType file and capture the metrics needed for embedding
    pub fn load(path: &Path, bold: bool) -> Result<Self> {
        let data = std::fs::read(path)?;
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| {
            RenderError::Font(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        if face.glyph_index(RUPEE_SIGN).is_none() {
            return Err(RenderError::Font(format!(
                "{} has no rupee glyph",
                path.display()
            )));
        }

        let units_per_em = f32::from(face.units_per_em().max(1));
        let scale = |v: f32| (v * 1000.0 / units_per_em).round() as i32;
        let notdef_advance = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .unwrap_or(0);

        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                let advance = win_ansi_char(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .unwrap_or(notdef_advance);
                scale(f32::from(advance)) as u16
            })
            .collect();

        let bbox = face.global_bounding_box();
        let base_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().replace(' ', ""))
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        Ok(Self {
            base_name,
            widths,
            ascent: scale(f32::from(face.ascender())),
            descent: scale(f32::from(face.descender())),
            cap_height: scale(f32::from(
                face.capital_height().unwrap_or(face.ascender()),
            )),
            bbox: [
                scale(f32::from(bbox.x_min)),
                scale(f32::from(bbox.y_min)),
                scale(f32::from(bbox.x_max)),
                scale(f32::from(bbox.y_max)),
            ],
            bold,
            data: Arc::new(data),
        })
    }

    fn width(&self, code: u8) -> u16 {
        if code < FIRST_CHAR {
            return 0;
        }
        self.widths
            .get(usize::from(code - FIRST_CHAR))
            .copied()
            .unwrap_or(DEFAULT_WIDTH)
    }

    /// Add font, descriptor and font file objects to a document
    fn embed(&self, doc: &mut Document) -> Result<ObjectId> {
        let mut file_dict = Dictionary::new();
        file_dict.set("Length1", Object::Integer(self.data.len() as i64));
        let file_id = doc.add_object(flate_stream(file_dict, &self.data)?);

        let descriptor_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"FontDescriptor".to_vec())),
            ("FontName", Object::Name(self.base_name.as_bytes().to_vec())),
            ("Flags", Object::Integer(32)),
            (
                "FontBBox",
                Object::Array(self.bbox.iter().map(|v| Object::Integer(*v as i64)).collect()),
            ),
            ("ItalicAngle", Object::Integer(0)),
            ("Ascent", Object::Integer(self.ascent as i64)),
            ("Descent", Object::Integer(self.descent as i64)),
            ("CapHeight", Object::Integer(self.cap_height as i64)),
            ("StemV", Object::Integer(if self.bold { 120 } else { 80 })),
            ("FontFile2", Object::Reference(file_id)),
        ]));

        let encoding = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Encoding".to_vec())),
            ("BaseEncoding", Object::Name(b"WinAnsiEncoding".to_vec())),
            (
                "Differences",
                Object::Array(vec![
                    Object::Integer(i64::from(RUPEE_CODE)),
                    Object::Name(b"uni20B9".to_vec()),
                ]),
            ),
        ]);

        Ok(doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"TrueType".to_vec())),
            ("BaseFont", Object::Name(self.base_name.as_bytes().to_vec())),
            ("FirstChar", Object::Integer(i64::from(FIRST_CHAR))),
            ("LastChar", Object::Integer(i64::from(LAST_CHAR))),
            (
                "Widths",
                Object::Array(
                    self.widths
                        .iter()
                        .map(|w| Object::Integer(i64::from(*w)))
                        .collect(),
                ),
            ),
            ("FontDescriptor", Object::Reference(descriptor_id)),
            ("Encoding", Object::Dictionary(encoding)),
        ])))
    }
}

/// Regular and bold faces that can draw the rupee sign
#[derive(Debug, Clone)]
pub struct CurrencyFonts {
    pub regular: FontProgram,
    pub bold: FontProgram,
}

// =============================================================================
// Typography Decision
// =============================================================================

/// The font decision shared read-only by every render
#[derive(Debug, Clone, Default)]
pub struct Typography {
    currency: Option<Arc<CurrencyFonts>>,
}

impl Typography {
    /// Built-in Helvetica only
    pub fn standard() -> Self {
        Self { currency: None }
    }

    pub fn with_fonts(fonts: CurrencyFonts) -> Self {
        Self {
            currency: Some(Arc::new(fonts)),
        }
    }

    /// Probe for both currency-capable faces. Any failure falls back to the
    /// standard faces.
    pub fn probe(regular: &Path, bold: &Path) -> Self {
        if !regular.is_file() || !bold.is_file() {
            log::info!(
                "Currency fonts not found ({}, {}), using Helvetica",
                regular.display(),
                bold.display()
            );
            return Self::standard();
        }

        let loaded = FontProgram::load(regular, false)
            .and_then(|regular| Ok(CurrencyFonts {
                regular,
                bold: FontProgram::load(bold, true)?,
            }));

        match loaded {
            Ok(fonts) => {
                log::info!(
                    "Using currency fonts {} / {}",
                    fonts.regular.base_name,
                    fonts.bold.base_name
                );
                Self::with_fonts(fonts)
            }
            Err(e) => {
                log::warn!("Currency fonts unusable, using Helvetica: {e}");
                Self::standard()
            }
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::probe(&config.regular_font_path(), &config.bold_font_path())
    }

    pub fn has_currency_font(&self) -> bool {
        self.currency.is_some()
    }

    /// PostScript name of the face a role resolves to
    pub fn base_font_name(&self, role: FontRole) -> &str {
        match (&self.currency, role) {
            (Some(fonts), FontRole::Regular) => &fonts.regular.base_name,
            (Some(fonts), FontRole::Bold) => &fonts.bold.base_name,
            (None, FontRole::Regular) => "Helvetica",
            (None, FontRole::Bold) => "Helvetica-Bold",
        }
    }

    /// Encode text as single-byte WinAnsi codes for the active faces.
    ///
    /// Characters the encoding cannot express become `?`; the rupee sign
    /// becomes `Rs.` when no currency font is active.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        for ch in text.chars() {
            if ch == RUPEE_SIGN {
                if self.has_currency_font() {
                    out.push(RUPEE_CODE);
                } else {
                    out.extend_from_slice(b"Rs.");
                }
                continue;
            }
            match ch {
                '\t' | '\n' | '\r' => out.push(b' '),
                _ => out.push(win_ansi_code(ch).unwrap_or(b'?')),
            }
        }
        out
    }

    /// Width of text in points
    pub fn measure(&self, role: FontRole, text: &str, size: f32) -> f32 {
        let units: u32 = self
            .encode(text)
            .into_iter()
            .map(|code| u32::from(self.code_width(role, code)))
            .sum();
        units as f32 * size / 1000.0
    }

    fn code_width(&self, role: FontRole, code: u8) -> u16 {
        match (&self.currency, role) {
            (Some(fonts), FontRole::Regular) => fonts.regular.width(code),
            (Some(fonts), FontRole::Bold) => fonts.bold.width(code),
            (None, role) => standard_width(role, code),
        }
    }

    /// Register both faces with a document, returning the font resource
    /// dictionary (`F1` regular, `F2` bold)
    pub(crate) fn register(&self, doc: &mut Document) -> Result<Dictionary> {
        let (regular_id, bold_id) = match &self.currency {
            Some(fonts) => (fonts.regular.embed(doc)?, fonts.bold.embed(doc)?),
            None => (
                doc.add_object(standard_font_dict("Helvetica")),
                doc.add_object(standard_font_dict("Helvetica-Bold")),
            ),
        };

        let mut fonts = Dictionary::new();
        fonts.set(FontRole::Regular.resource_name(), Object::Reference(regular_id));
        fonts.set(FontRole::Bold.resource_name(), Object::Reference(bold_id));
        Ok(fonts)
    }
}

fn standard_font_dict(base_font: &str) -> Dictionary {
    let mut font_dict = Dictionary::new();
    font_dict.set("Type", Object::Name(b"Font".to_vec()));
    font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
    font_dict.set("BaseFont", Object::Name(base_font.as_bytes().to_vec()));
    font_dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    font_dict
}

fn standard_width(role: FontRole, code: u8) -> u16 {
    let table = match role {
        FontRole::Regular => &HELVETICA_WIDTHS,
        FontRole::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    match code {
        32..=126 => table[usize::from(code - 32)],
        _ => DEFAULT_WIDTH,
    }
}

/// Character drawn for a WinAnsi code (0x80 is the rupee in embedded fonts)
fn win_ansi_char(code: u8) -> Option<char> {
    match code {
        32..=126 => Some(char::from(code)),
        RUPEE_CODE => Some(RUPEE_SIGN),
        0x81..=0x9F => WIN_ANSI_HIGH
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, ch)| *ch),
        0xA0..=0xFF => Some(char::from(code)),
        _ => None,
    }
}

fn win_ansi_code(ch: char) -> Option<u8> {
    match ch as u32 {
        32..=126 | 0xA0..=0xFF => Some(ch as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(_, c)| *c == ch)
            .map(|(code, _)| *code),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_encoding_spells_rupee() {
        let typography = Typography::standard();
        assert_eq!(typography.encode("\u{20B9}100"), b"Rs.100".to_vec());
    }

    #[test]
    fn test_encoding_maps_typographic_punctuation() {
        let typography = Typography::standard();
        assert_eq!(typography.encode("a\u{2013}b"), vec![b'a', 0x96, b'b']);
        assert_eq!(typography.encode("caf\u{E9}"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(typography.encode("\u{4E2D}"), vec![b'?']);
    }

    #[test]
    fn test_helvetica_measure() {
        let typography = Typography::standard();
        // "AB" = 667 + 667 units
        let width = typography.measure(FontRole::Regular, "AB", 10.0);
        assert!((width - 13.34).abs() < 0.001);
        assert!(
            typography.measure(FontRole::Bold, "m", 10.0)
                > typography.measure(FontRole::Regular, "m", 10.0)
        );
    }

    #[test]
    fn test_missing_fonts_fall_back() {
        let typography = Typography::probe(
            Path::new("/nonexistent/Regular.ttf"),
            Path::new("/nonexistent/Bold.ttf"),
        );
        assert!(!typography.has_currency_font());
        assert_eq!(typography.base_font_name(FontRole::Bold), "Helvetica-Bold");
    }

    #[test]
    fn test_win_ansi_round_trip_for_high_codes() {
        for (code, ch) in WIN_ANSI_HIGH {
            assert_eq!(win_ansi_code(ch), Some(code));
            assert_eq!(win_ansi_char(code), Some(ch));
        }
    }
}
