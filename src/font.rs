use crate::error::CertificateError;
use crate::fit::TextMeasure;
use crate::types::Pt;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub const ALL: [FontStyle; 4] = [
        FontStyle::Regular,
        FontStyle::Bold,
        FontStyle::Italic,
        FontStyle::BoldItalic,
    ];

    fn builtin_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
            FontStyle::Italic => "Helvetica-Oblique",
            FontStyle::BoldItalic => "Helvetica-BoldOblique",
        }
    }

    fn index(self) -> usize {
        match self {
            FontStyle::Regular => 0,
            FontStyle::Bold => 1,
            FontStyle::Italic => 2,
            FontStyle::BoldItalic => 3,
        }
    }

    /// Guesses the style from a font file stem such as `LiberationSans-BoldItalic`.
    fn from_file_stem(stem: &str) -> Option<FontStyle> {
        let lower = stem.to_ascii_lowercase();
        let bold = lower.contains("bold");
        let italic = lower.contains("italic") || lower.contains("oblique");
        match (bold, italic) {
            (true, true) => Some(FontStyle::BoldItalic),
            (true, false) => Some(FontStyle::Bold),
            (false, true) => Some(FontStyle::Italic),
            (false, false) if lower.contains("regular") || !lower.contains('-') => {
                Some(FontStyle::Regular)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FontProgramKind {
    TrueType,
    OpenTypeCff,
}

/// A font program loaded from disk that will be embedded in the output.
#[derive(Debug)]
pub(crate) struct RegisteredFont {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) metrics: FontMetrics,
    pub(crate) program_kind: FontProgramKind,
}

/// Metrics in 1/1000 em for the single-byte code range written to the PDF.
#[derive(Debug)]
pub(crate) struct FontMetrics {
    pub(crate) first_char: u8,
    pub(crate) last_char: u8,
    pub(crate) widths: Vec<u16>,
    pub(crate) ascent: i16,
    pub(crate) descent: i16,
    pub(crate) cap_height: i16,
    pub(crate) italic_angle: i16,
    pub(crate) bbox: (i16, i16, i16, i16),
    pub(crate) missing_width: u16,
    pub(crate) is_fixed_pitch: bool,
}

/// Resolves the four certificate font styles to concrete fonts and measures
/// text with the same metrics the PDF writer declares.
#[derive(Debug)]
pub struct FontRegistry {
    fonts: Vec<RegisteredFont>,
    lookup: HashMap<String, usize>,
    styles: [String; 4],
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            lookup: HashMap::new(),
            styles: FontStyle::ALL.map(|style| style.builtin_name().to_string()),
        }
    }

    pub fn font_for(&self, style: FontStyle) -> &str {
        &self.styles[style.index()]
    }

    /// Loads a TrueType/OpenType file and uses it for `style`.
    pub fn register_file_for(
        &mut self,
        style: FontStyle,
        path: impl AsRef<Path>,
    ) -> Result<String, CertificateError> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|err| CertificateError::Font(format!("{}: {err}", path.display())))?;
        let source = path
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or("EmbeddedFont");
        let name = self.register_bytes(data, source)?;
        self.styles[style.index()] = name.clone();
        Ok(name)
    }

    /// Registers every `.ttf`/`.otf` in `path`, assigning styles from the file
    /// names. Unreadable or unparsable files are skipped. Returns how many
    /// styles were assigned.
    pub fn register_dir(&mut self, path: impl AsRef<Path>) -> usize {
        let Ok(entries) = fs::read_dir(path.as_ref()) else {
            log::warn!("font directory {} is not readable", path.as_ref().display());
            return 0;
        };
        let mut files: Vec<_> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|v| v.to_str())
                        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf"))
                        .unwrap_or(false)
            })
            .collect();
        files.sort();

        let mut assigned = [false; 4];
        for file in files {
            let Some(style) = file
                .file_stem()
                .and_then(|v| v.to_str())
                .and_then(FontStyle::from_file_stem)
            else {
                continue;
            };
            if assigned[style.index()] {
                continue;
            }
            match self.register_file_for(style, &file) {
                Ok(name) => {
                    log::debug!("font {name} assigned to {style:?}");
                    assigned[style.index()] = true;
                }
                Err(err) => log::warn!("skipping font {}: {err}", file.display()),
            }
        }
        assigned.iter().filter(|v| **v).count()
    }

    pub(crate) fn register_bytes(
        &mut self,
        data: Vec<u8>,
        source: &str,
    ) -> Result<String, CertificateError> {
        let Ok(face) = ttf_parser::Face::parse(&data, 0) else {
            return Err(CertificateError::Font(format!(
                "invalid font data for {source}"
            )));
        };
        let name = postscript_name(&face).unwrap_or_else(|| source.to_string());
        let metrics = FontMetrics::from_face(&face);
        let program_kind = if face.tables().cff.is_some() {
            FontProgramKind::OpenTypeCff
        } else {
            FontProgramKind::TrueType
        };
        drop(face);

        let key = normalize_name(&name);
        if let Some(index) = self.lookup.get(&key) {
            return Ok(self.fonts[*index].name.clone());
        }
        self.lookup.insert(key, self.fonts.len());
        self.fonts.push(RegisteredFont {
            name: name.clone(),
            data,
            metrics,
            program_kind,
        });
        Ok(name)
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<&RegisteredFont> {
        self.lookup
            .get(&normalize_name(name))
            .and_then(|index| self.fonts.get(*index))
    }

    pub fn measure_text_width(&self, name: &str, font_size: Pt, text: &str) -> Pt {
        if text.is_empty() {
            return Pt::ZERO;
        }
        let units: i32 = if let Some(font) = self.resolve(name) {
            text.chars()
                .map(|ch| font.metrics.advance_for_char(ch) as i32)
                .fold(0i32, i32::saturating_add)
        } else if let Some(table) = builtin_widths(name) {
            text.chars()
                .map(|ch| builtin_advance(table, ch) as i32)
                .fold(0i32, i32::saturating_add)
        } else {
            let char_width = (font_size * 0.6).max(Pt::from_f32(1.0));
            return Pt::from_milli_i64(
                char_width.to_milli_i64() * text.chars().count() as i64,
            );
        };
        if units <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(units, 1000)
    }
}

impl TextMeasure for FontRegistry {
    fn text_width(&self, font: &str, size: Pt, text: &str) -> Pt {
        self.measure_text_width(font, size, text)
    }
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;
        let first_char = 32u8;
        let last_char = 255u8;
        let widths = (first_char..=last_char)
            .map(|code| {
                let advance = char::from_u32(winansi_to_unicode(code))
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|id| face.glyph_hor_advance(id))
                    .unwrap_or(0);
                ((advance as f32 * scale).round() as i32).clamp(0, u16::MAX as i32) as u16
            })
            .collect::<Vec<_>>();
        let missing_width = widths.first().copied().unwrap_or(0);
        let ascent = scale_i16(face.ascender(), scale);
        let bbox = face.global_bounding_box();

        Self {
            first_char,
            last_char,
            widths,
            ascent,
            descent: scale_i16(face.descender(), scale),
            cap_height: face
                .capital_height()
                .map(|value| scale_i16(value, scale))
                .unwrap_or(ascent),
            italic_angle: face
                .italic_angle()
                .map(|value| value.round() as i16)
                .unwrap_or(0),
            bbox: (
                scale_i16(bbox.x_min, scale),
                scale_i16(bbox.y_min, scale),
                scale_i16(bbox.x_max, scale),
                scale_i16(bbox.y_max, scale),
            ),
            missing_width,
            is_fixed_pitch: face.is_monospaced(),
        }
    }

    fn advance_for_char(&self, ch: char) -> u16 {
        let Some(code) = unicode_to_winansi(ch) else {
            return self.missing_width;
        };
        if code < self.first_char || code > self.last_char {
            return self.missing_width;
        }
        self.widths
            .get((code - self.first_char) as usize)
            .copied()
            .unwrap_or(self.missing_width)
    }
}

/// Maps a character to its WinAnsi (cp1252) byte, the encoding every font in
/// the output uses.
pub(crate) fn unicode_to_winansi(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{0000}'..='\u{007F}' => ch as u8,
        '\u{00A0}'..='\u{00FF}' => ch as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

pub(crate) fn winansi_to_unicode(byte: u8) -> u32 {
    match byte {
        0x80 => 0x20AC,
        0x82 => 0x201A,
        0x83 => 0x0192,
        0x84 => 0x201E,
        0x85 => 0x2026,
        0x86 => 0x2020,
        0x87 => 0x2021,
        0x88 => 0x02C6,
        0x89 => 0x2030,
        0x8A => 0x0160,
        0x8B => 0x2039,
        0x8C => 0x0152,
        0x8E => 0x017D,
        0x91 => 0x2018,
        0x92 => 0x2019,
        0x93 => 0x201C,
        0x94 => 0x201D,
        0x95 => 0x2022,
        0x96 => 0x2013,
        0x97 => 0x2014,
        0x98 => 0x02DC,
        0x99 => 0x2122,
        0x9A => 0x0161,
        0x9B => 0x203A,
        0x9C => 0x0153,
        0x9E => 0x017E,
        0x9F => 0x0178,
        other => other as u32,
    }
}

// Advance widths for codes 32..=126 from the Adobe core font AFM files.
// Oblique variants share the upright widths.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

fn builtin_widths(name: &str) -> Option<&'static [u16; 95]> {
    match normalize_name(name).as_str() {
        "helvetica" | "helvetica-oblique" => Some(&HELVETICA_WIDTHS),
        "helvetica-bold" | "helvetica-boldoblique" => Some(&HELVETICA_BOLD_WIDTHS),
        _ => None,
    }
}

fn builtin_advance(table: &[u16; 95], ch: char) -> u16 {
    let code = ch as u32;
    if (32..=126).contains(&code) {
        return table[(code - 32) as usize];
    }
    match ch {
        '\u{2026}' | '\u{2014}' | '\u{2030}' => 1000,
        '\u{2013}' => 556,
        '\u{2022}' => 350,
        '\u{2018}' | '\u{2019}' | '\u{201A}' => 222,
        '\u{201C}' | '\u{201D}' | '\u{201E}' => 333,
        '\u{00A0}' => table[0],
        _ => 556,
    }
}

pub(crate) fn is_builtin_font(name: &str) -> bool {
    builtin_widths(name).is_some()
}

fn postscript_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    use ttf_parser::name::name_id;

    let mut full = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        match entry.name_id {
            name_id::POST_SCRIPT_NAME => return Some(name),
            name_id::FULL_NAME if full.is_none() => full = Some(name),
            _ => {}
        }
    }
    full
}

fn scale_i16(value: i16, scale: f32) -> i16 {
    let scaled = (value as f32 * scale).round() as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_styles_use_helvetica_family() {
        let fonts = FontRegistry::new();
        assert_eq!(fonts.font_for(FontStyle::Regular), "Helvetica");
        assert_eq!(fonts.font_for(FontStyle::BoldItalic), "Helvetica-BoldOblique");
    }

    #[test]
    fn builtin_widths_follow_afm_metrics() {
        let fonts = FontRegistry::new();
        let size = Pt::from_f32(10.0);
        // H(722) + i(222) = 944 units -> 9.44pt at 10pt.
        assert_eq!(
            fonts.measure_text_width("Helvetica", size, "Hi").to_milli_i64(),
            9_440
        );
        // Bold: H(722) + i(278) = 1000 units.
        assert_eq!(
            fonts
                .measure_text_width("Helvetica-Bold", size, "Hi")
                .to_milli_i64(),
            10_000
        );
        assert_eq!(
            fonts.measure_text_width("Helvetica-Oblique", size, "Hi"),
            fonts.measure_text_width("Helvetica", size, "Hi")
        );
    }

    #[test]
    fn empty_text_has_zero_width() {
        let fonts = FontRegistry::new();
        assert_eq!(
            fonts.measure_text_width("Helvetica", Pt::from_f32(40.0), ""),
            Pt::ZERO
        );
    }

    #[test]
    fn unknown_font_uses_average_char_estimate() {
        let fonts = FontRegistry::new();
        let width = fonts.measure_text_width("NoSuchFont", Pt::from_f32(10.0), "abcd");
        assert_eq!(width.to_milli_i64(), 24_000);
    }

    #[test]
    fn width_scales_linearly_with_size() {
        let fonts = FontRegistry::new();
        let small = fonts.measure_text_width("Helvetica", Pt::from_f32(10.0), "Certificate");
        let large = fonts.measure_text_width("Helvetica", Pt::from_f32(20.0), "Certificate");
        assert_eq!(large.to_milli_i64(), small.to_milli_i64() * 2);
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let mut fonts = FontRegistry::new();
        let err = fonts
            .register_bytes(vec![0, 1, 2, 3], "broken.ttf")
            .expect_err("invalid font");
        assert!(err.to_string().contains("broken.ttf"));
    }

    #[test]
    fn style_is_guessed_from_file_stem() {
        assert_eq!(
            FontStyle::from_file_stem("LiberationSans-BoldItalic"),
            Some(FontStyle::BoldItalic)
        );
        assert_eq!(
            FontStyle::from_file_stem("DejaVuSans-Oblique"),
            Some(FontStyle::Italic)
        );
        assert_eq!(
            FontStyle::from_file_stem("LiberationSans-Regular"),
            Some(FontStyle::Regular)
        );
        assert_eq!(FontStyle::from_file_stem("DejaVuSans"), Some(FontStyle::Regular));
        assert_eq!(FontStyle::from_file_stem("DejaVuSans-Condensed"), None);
    }

    #[test]
    fn winansi_mapping_round_trips_ellipsis() {
        let byte = unicode_to_winansi('\u{2026}').expect("mapped");
        assert_eq!(byte, 0x85);
        assert_eq!(winansi_to_unicode(byte), 0x2026);
        assert_eq!(unicode_to_winansi('\u{4E2D}'), None);
    }
}
