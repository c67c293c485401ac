//! Text drawing with the standard Helvetica fonts.
//!
//! Generated pages only ever use Helvetica and Helvetica-Bold with
//! WinAnsiEncoding, so no font program is embedded and text widths come from
//! the fonts' published metrics.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, dictionary};

use crate::error::{BundleError, Result};

/// Helvetica widths for bytes 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold widths for bytes 32..=126, in 1/1000 em.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// WinAnsi code of the horizontal ellipsis.
const ELLIPSIS: u8 = 0x85;

/// Face used for a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    /// Helvetica.
    Regular,
    /// Helvetica-Bold.
    Bold,
}

impl FontStyle {
    /// Name under which the font is registered in page resources.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Regular => "BndF1",
            Self::Bold => "BndF2",
        }
    }

    /// PostScript name of the standard font.
    pub fn base_font(&self) -> &'static str {
        match self {
            Self::Regular => "Helvetica",
            Self::Bold => "Helvetica-Bold",
        }
    }

    /// Font dictionary for this face.
    pub fn font_dictionary(&self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        }
    }

    fn widths(&self) -> &'static [u16; 95] {
        match self {
            Self::Regular => &HELVETICA_WIDTHS,
            Self::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

/// A single line of text placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Text to draw.
    pub text: String,
    /// Baseline start X.
    pub x: f32,
    /// Baseline Y.
    pub y: f32,
    /// Font size in points.
    pub size: f32,
    /// Font face.
    pub style: FontStyle,
}

impl TextRun {
    /// A run in the regular face.
    pub fn regular(text: impl Into<String>, x: f32, y: f32, size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            size,
            style: FontStyle::Regular,
        }
    }

    /// A run in the bold face.
    pub fn bold(text: impl Into<String>, x: f32, y: f32, size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            size,
            style: FontStyle::Bold,
        }
    }

    /// A run horizontally centred on a page of width `page_width`.
    pub fn centred(text: impl Into<String>, page_width: f32, y: f32, size: f32, style: FontStyle) -> Self {
        let text = text.into();
        let x = ((page_width - text_width(&text, size, style)) / 2.0).max(0.0);
        Self {
            text,
            x,
            y,
            size,
            style,
        }
    }

    fn operations(&self) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(self.style.resource_name().as_bytes().to_vec()),
                    self.size.into(),
                ],
            ),
            Operation::new("Td", vec![self.x.into(), self.y.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(&self.text))]),
            Operation::new("ET", vec![]),
        ]
    }
}

/// Encode runs into content stream bytes, filled in black.
///
/// # Errors
///
/// Returns [`BundleError::GenerationFailed`] if the content cannot be encoded.
pub fn encode_runs(runs: &[TextRun]) -> Result<Vec<u8>> {
    let mut operations = vec![Operation::new("g", vec![0.into()])];
    operations.extend(runs.iter().flat_map(TextRun::operations));

    Content { operations }
        .encode()
        .map_err(|e| BundleError::generation_failed(format!("Failed to encode page text: {e}")))
}

/// Encode text in WinAnsiEncoding.
///
/// Characters the encoding cannot represent become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '…' => ELLIPSIS,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        _ => b'?',
    }
}

fn byte_width(byte: u8, style: FontStyle) -> u16 {
    match byte {
        32..=126 => style.widths()[(byte - 32) as usize],
        ELLIPSIS | 0x97 => 1000,
        0x91 | 0x92 => 278,
        0x95 => 350,
        _ => 556,
    }
}

/// Width of `text` in points when drawn at `size`.
pub fn text_width(text: &str, size: f32, style: FontStyle) -> f32 {
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|b| u32::from(byte_width(b, style)))
        .sum();
    units as f32 * size / 1000.0
}

/// Shorten `text` with a trailing ellipsis until it fits in `max_width`.
pub fn truncate_to_width(text: &str, max_width: f32, size: f32, style: FontStyle) -> String {
    if text_width(text, size, style) <= max_width {
        return text.to_string();
    }

    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>().trim_end().to_string() + "…";
        if text_width(&candidate, size, style) <= max_width {
            return candidate;
        }
    }

    "…".to_string()
}
