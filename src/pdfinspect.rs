//! Read-back of produced certificates: page count, drawn text and embedded
//! images, recovered with `lopdf`.

use crate::font::winansi_to_unicode;
use lopdf::content::Content;
use lopdf::{Dictionary, Document as LoDocument, Object, ObjectId};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfInspectErrorCode {
    PdfParseFailed,
    PdfEncryptedUnsupported,
    PdfEmptyOrNoPages,
    PdfIoError,
}

impl PdfInspectErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfInspectErrorCode::PdfParseFailed => "PDF_PARSE_FAILED",
            PdfInspectErrorCode::PdfEncryptedUnsupported => "PDF_ENCRYPTED_UNSUPPORTED",
            PdfInspectErrorCode::PdfEmptyOrNoPages => "PDF_EMPTY_OR_NO_PAGES",
            PdfInspectErrorCode::PdfIoError => "PDF_IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", code.as_str())]
pub struct PdfInspectError {
    pub code: PdfInspectErrorCode,
    pub message: String,
}

impl PdfInspectError {
    fn new(code: PdfInspectErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// An image XObject on the first page, with its stream filters undone.
/// JPEG streams are left as JPEG bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfImage {
    pub resource: String,
    pub width: u32,
    pub height: u32,
    pub color_space: String,
    pub filters: Vec<String>,
    pub has_soft_mask: bool,
    pub data: Vec<u8>,
}

impl PdfImage {
    /// Row-major 8-bit gray samples, when the image is stored that way.
    pub fn gray_samples(&self) -> Option<&[u8]> {
        let expected = self.width as usize * self.height as usize;
        (self.color_space == "DeviceGray"
            && !self.filters.iter().any(|f| f == "DCTDecode")
            && self.data.len() == expected)
            .then_some(self.data.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub file_size_bytes: usize,
    pub title: Option<String>,
    /// Strings shown on the first page, in drawing order.
    pub text_runs: Vec<String>,
    pub images: Vec<PdfImage>,
}

impl PdfInspectReport {
    pub fn contains_text(&self, needle: &str) -> bool {
        self.text_runs.iter().any(|run| run.contains(needle))
    }
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> Result<PdfInspectReport, PdfInspectError> {
    let pdf = LoDocument::load_mem(bytes)
        .map_err(|err| PdfInspectError::new(PdfInspectErrorCode::PdfParseFailed, err.to_string()))?;
    if pdf.is_encrypted() {
        return Err(PdfInspectError::new(
            PdfInspectErrorCode::PdfEncryptedUnsupported,
            "encrypted pdf files are not supported",
        ));
    }
    let pages = pdf.get_pages();
    let Some(first_page) = pages.values().next().copied() else {
        return Err(PdfInspectError::new(
            PdfInspectErrorCode::PdfEmptyOrNoPages,
            "pdf has no pages",
        ));
    };

    Ok(PdfInspectReport {
        pdf_version: pdf.version.clone(),
        page_count: pages.len(),
        file_size_bytes: bytes.len(),
        title: info_title(&pdf),
        text_runs: page_text_runs(&pdf, first_page)?,
        images: page_images(&pdf, first_page),
    })
}

pub fn inspect_pdf_path(path: &Path) -> Result<PdfInspectReport, PdfInspectError> {
    let data = std::fs::read(path)
        .map_err(|err| PdfInspectError::new(PdfInspectErrorCode::PdfIoError, err.to_string()))?;
    inspect_pdf_bytes(&data)
}

fn resolve<'a>(pdf: &'a LoDocument, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => pdf.get_object(*id).ok(),
        other => Some(other),
    }
}

fn dict_entry<'a>(pdf: &'a LoDocument, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|object| resolve(pdf, object))
}

fn decode_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter_map(|byte| char::from_u32(winansi_to_unicode(*byte)))
        .collect()
}

fn info_title(pdf: &LoDocument) -> Option<String> {
    let info = dict_entry(pdf, &pdf.trailer, b"Info")?.as_dict().ok()?;
    match dict_entry(pdf, info, b"Title")? {
        Object::String(bytes, _) => Some(decode_text(bytes)),
        _ => None,
    }
}

fn page_text_runs(pdf: &LoDocument, page: ObjectId) -> Result<Vec<String>, PdfInspectError> {
    let raw = pdf
        .get_page_content(page)
        .map_err(|err| PdfInspectError::new(PdfInspectErrorCode::PdfParseFailed, err.to_string()))?;
    let content = Content::decode(&raw)
        .map_err(|err| PdfInspectError::new(PdfInspectErrorCode::PdfParseFailed, err.to_string()))?;

    let mut runs = Vec::new();
    for op in &content.operations {
        match op.operator.as_str() {
            "Tj" | "'" | "\"" => {
                if let Some(Object::String(bytes, _)) = op.operands.last() {
                    runs.push(decode_text(bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let joined: Vec<u8> = items
                        .iter()
                        .filter_map(|item| match item {
                            Object::String(bytes, _) => Some(bytes.as_slice()),
                            _ => None,
                        })
                        .flatten()
                        .copied()
                        .collect();
                    runs.push(decode_text(&joined));
                }
            }
            _ => {}
        }
    }
    Ok(runs)
}

fn page_images(pdf: &LoDocument, page: ObjectId) -> Vec<PdfImage> {
    let Some(page_dict) = pdf.get_object(page).ok().and_then(|o| o.as_dict().ok()) else {
        return Vec::new();
    };
    let Some(resources) = dict_entry(pdf, page_dict, b"Resources").and_then(|o| o.as_dict().ok())
    else {
        return Vec::new();
    };
    let Some(xobjects) = dict_entry(pdf, resources, b"XObject").and_then(|o| o.as_dict().ok())
    else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for (name, object) in xobjects.iter() {
        let Some(stream) = resolve(pdf, object).and_then(|o| o.as_stream().ok()) else {
            continue;
        };
        let dict = &stream.dict;
        if !matches!(dict.get(b"Subtype"), Ok(Object::Name(sub)) if sub == b"Image") {
            continue;
        }
        let filters = stream_filters(dict);
        let Some(data) = undo_filters(&stream.content, &filters) else {
            log::debug!("image {} uses filters that cannot be undone", String::from_utf8_lossy(name));
            continue;
        };
        let number = |key: &[u8]| {
            dict_entry(pdf, dict, key)
                .and_then(|o| o.as_i64().ok())
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0)
        };
        let color_space = match dict_entry(pdf, dict, b"ColorSpace") {
            Some(Object::Name(cs)) => String::from_utf8_lossy(cs).into_owned(),
            _ => String::new(),
        };
        images.push(PdfImage {
            resource: String::from_utf8_lossy(name).into_owned(),
            width: number(b"Width"),
            height: number(b"Height"),
            color_space,
            filters,
            has_soft_mask: dict.has(b"SMask"),
            data,
        });
    }
    images
}

fn stream_filters(dict: &Dictionary) -> Vec<String> {
    let name = |object: &Object| match object {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    };
    match dict.get(b"Filter") {
        Ok(Object::Array(items)) => items.iter().filter_map(name).collect(),
        Ok(other) => name(other).into_iter().collect(),
        Err(_) => Vec::new(),
    }
}

fn undo_filters(raw: &[u8], filters: &[String]) -> Option<Vec<u8>> {
    let mut data = raw.to_vec();
    for filter in filters {
        data = match filter.as_str() {
            "ASCIIHexDecode" => ascii_hex_decode(&data)?,
            "FlateDecode" => {
                let mut out = Vec::new();
                flate2::read::ZlibDecoder::new(data.as_slice())
                    .read_to_end(&mut out)
                    .ok()?;
                out
            }
            "DCTDecode" => return Some(data),
            _ => return None,
        };
    }
    Some(data)
}

fn ascii_hex_decode(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;
    for byte in data {
        if *byte == b'>' {
            break;
        }
        if byte.is_ascii_whitespace() {
            continue;
        }
        let nibble = (*byte as char).to_digit(16)? as u8;
        match high.take() {
            Some(h) => out.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }
    if let Some(h) = high {
        out.push(h << 4);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::font::FontRegistry;
    use crate::pdf::{PdfOptions, document_to_pdf};
    use crate::types::{Pt, Rect, Size};
    use image::{DynamicImage, GrayImage, Luma};
    use std::io::Cursor;

    fn gray_png() -> Vec<u8> {
        let img = GrayImage::from_fn(6, 3, |x, _| Luma([(x * 40) as u8]));
        let mut out = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .expect("png");
        out
    }

    fn sample_pdf() -> Vec<u8> {
        let mut canvas = Canvas::new(Size::a4());
        canvas.draw_string(Pt::from_f32(10.0), Pt::from_f32(10.0), "Ada Lovelace");
        canvas.draw_string(Pt::from_f32(10.0), Pt::from_f32(30.0), "Too long\u{2026}");
        canvas.register_image("code", &gray_png()).expect("decode");
        canvas.draw_image(Rect::new(10.0, 50.0, 60.0, 30.0), "code");
        let options = PdfOptions {
            title: Some("Certificate".to_string()),
            ..PdfOptions::default()
        };
        document_to_pdf(&canvas.finish(), &FontRegistry::new(), &options).expect("pdf")
    }

    #[test]
    fn report_lists_text_runs_and_title() {
        let bytes = sample_pdf();
        let report = inspect_pdf_bytes(&bytes).expect("inspect");
        assert_eq!(report.page_count, 1);
        assert_eq!(report.pdf_version, "1.7");
        assert_eq!(report.file_size_bytes, bytes.len());
        assert_eq!(report.title.as_deref(), Some("Certificate"));
        assert_eq!(report.text_runs, vec!["Ada Lovelace", "Too long\u{2026}"]);
        assert!(report.contains_text("Lovelace"));
    }

    #[test]
    fn report_recovers_image_samples() {
        let report = inspect_pdf_bytes(&sample_pdf()).expect("inspect");
        assert_eq!(report.images.len(), 1);
        let image = &report.images[0];
        assert_eq!((image.width, image.height), (6, 3));
        assert_eq!(image.filters, vec!["ASCIIHexDecode", "FlateDecode"]);
        assert!(!image.has_soft_mask);
        let samples = image.gray_samples().expect("gray");
        assert_eq!(&samples[..6], &[0, 40, 80, 120, 160, 200]);
    }

    #[test]
    fn malformed_bytes_are_a_parse_failure() {
        let err = inspect_pdf_bytes(b"not a pdf").expect_err("invalid");
        assert_eq!(err.code, PdfInspectErrorCode::PdfParseFailed);
        assert!(err.to_string().starts_with("PDF_PARSE_FAILED"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = inspect_pdf_path(&dir.path().join("missing.pdf")).expect_err("missing");
        assert_eq!(err.code, PdfInspectErrorCode::PdfIoError);
    }

    #[test]
    fn ascii_hex_handles_whitespace_and_odd_tail() {
        assert_eq!(ascii_hex_decode(b"0A 1b\n2>"), Some(vec![0x0A, 0x1B, 0x20]));
        assert_eq!(ascii_hex_decode(b"zz>"), None);
    }
}
