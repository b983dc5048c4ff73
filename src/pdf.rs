use crate::assets::{ImageAsset, ImageFilter};
use crate::canvas::{Command, Document, Page};
use crate::font::{
    FontProgramKind, FontRegistry, RegisteredFont, is_builtin_font, unicode_to_winansi,
};
use crate::types::{Color, Pt, Size};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::io::{self, Write};

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;
const PDF_PAGE_ID: usize = 3;
const PDF_CONTENT_ID: usize = 4;
const FIRST_RESOURCE_ID: usize = 5;

#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub producer: String,
    /// Written as `/CreationDate`. Left out when `None`, which keeps output
    /// byte-identical across runs.
    pub creation_date: Option<DateTime<Utc>>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            title: None,
            subject: None,
            producer: concat!("certforge ", env!("CARGO_PKG_VERSION")).to_string(),
            creation_date: None,
        }
    }
}

pub fn document_to_pdf(
    document: &Document,
    fonts: &FontRegistry,
    options: &PdfOptions,
) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    document_to_writer(document, fonts, options, &mut out)?;
    Ok(out)
}

/// Serializes `document` as a single-page PDF 1.7 file.
pub fn document_to_writer<W: Write>(
    document: &Document,
    fonts: &FontRegistry,
    options: &PdfOptions,
    writer: W,
) -> io::Result<()> {
    let mut objects: Vec<String> = Vec::new();
    let mut next_id = FIRST_RESOURCE_ID;

    let font_names = collect_font_names(&document.page);
    let (font_objects, font_resources, font_map, after_fonts) =
        build_font_objects(&font_names, fonts, next_id);
    next_id = after_fonts;

    let (image_objects, image_resources, image_map, after_images) =
        build_image_objects(document, next_id);
    next_id = after_images;

    let (gs_objects, gs_resources, gs_map, after_gs) =
        build_extgstate_objects(&document.page, next_id);
    next_id = after_gs;
    let info_id = next_id;

    let content = render_page(
        &document.page,
        document.page_size.height,
        &font_map,
        &image_map,
        &gs_map,
    );

    objects.push(format!(
        "<< /Type /Catalog /Pages {} 0 R >>",
        PDF_PAGES_ID
    ));
    objects.push(format!(
        "<< /Type /Pages /Kids [{} 0 R] /Count 1 >>",
        PDF_PAGE_ID
    ));
    objects.push(page_object(
        document.page_size,
        &font_resources,
        &image_resources,
        &gs_resources,
    ));
    objects.push(stream_object(&content));
    objects.extend(font_objects);
    objects.extend(image_objects);
    objects.extend(gs_objects);
    objects.push(info_object(options));
    debug_assert_eq!(objects.len(), info_id);

    write_pdf(objects, info_id, writer)
}

fn page_object(
    page_size: Size,
    fonts: &[(String, usize)],
    images: &[(String, usize)],
    states: &[(String, usize)],
) -> String {
    let mut resources = String::from("<<");
    if !fonts.is_empty() {
        resources.push_str(&format!(" /Font {}", resource_dict(fonts)));
    }
    if !images.is_empty() {
        resources.push_str(&format!(" /XObject {}", resource_dict(images)));
    }
    if !states.is_empty() {
        resources.push_str(&format!(" /ExtGState {}", resource_dict(states)));
    }
    resources.push_str(" >>");
    format!(
        "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} /Contents {} 0 R >>",
        PDF_PAGES_ID,
        fmt_pt(page_size.width),
        fmt_pt(page_size.height),
        resources,
        PDF_CONTENT_ID
    )
}

/// Font names in first-use order, following the same save/restore
/// bookkeeping the canvas uses.
fn collect_font_names(page: &Page) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    let mut current = DEFAULT_FONT.to_string();
    let mut stack: Vec<String> = Vec::new();
    for cmd in &page.commands {
        match cmd {
            Command::SaveState => stack.push(current.clone()),
            Command::RestoreState => {
                if let Some(name) = stack.pop() {
                    current = name;
                }
            }
            Command::SetFontName(name) => current = name.clone(),
            Command::DrawString { .. } => {
                if seen.insert(current.clone()) {
                    names.push(current.clone());
                }
            }
            _ => {}
        }
    }
    names
}

const DEFAULT_FONT: &str = "Helvetica";

fn build_font_objects(
    font_names: &[String],
    registry: &FontRegistry,
    start_id: usize,
) -> (
    Vec<String>,
    Vec<(String, usize)>,
    HashMap<String, String>,
    usize,
) {
    let mut objects = Vec::new();
    let mut resources = Vec::new();
    let mut font_map = HashMap::new();
    let mut next_id = start_id;

    for (index, name) in font_names.iter().enumerate() {
        let resource = format!("F{}", index + 1);
        if let Some(font) = registry.resolve(name) {
            let (font_objects, font_id, new_next) = build_truetype_font_objects(font, next_id);
            objects.extend(font_objects);
            resources.push((resource.clone(), font_id));
            next_id = new_next;
        } else {
            if !is_builtin_font(name) {
                log::warn!("font {name} is neither registered nor built in; viewers will substitute");
            }
            objects.push(font_object(name));
            resources.push((resource.clone(), next_id));
            next_id += 1;
        }
        font_map.insert(name.clone(), resource);
    }

    (objects, resources, font_map, next_id)
}

fn build_truetype_font_objects(
    font: &RegisteredFont,
    start_id: usize,
) -> (Vec<String>, usize, usize) {
    let font_file_id = start_id;
    let descriptor_id = start_id + 1;
    let font_id = start_id + 2;
    let font_file = font_file_object(&font.data, font.program_kind);
    let descriptor = font_descriptor_object(font, font_file_id);
    let font_object = truetype_font_object(font, descriptor_id);
    (
        vec![font_file, descriptor, font_object],
        font_id,
        start_id + 3,
    )
}

fn build_image_objects(
    document: &Document,
    start_id: usize,
) -> (
    Vec<String>,
    Vec<(String, usize)>,
    HashMap<String, String>,
    usize,
) {
    let mut objects = Vec::new();
    let mut resources = Vec::new();
    let mut name_map = HashMap::new();
    let mut next_id = start_id;

    for (index, (resource_id, image)) in document.images.iter().enumerate() {
        let smask_id = image.alpha.as_ref().map(|alpha| {
            objects.push(image_smask_object(image, alpha));
            let id = next_id;
            next_id += 1;
            id
        });
        objects.push(image_object(image, smask_id));
        let name = format!("Im{}", index + 1);
        resources.push((name.clone(), next_id));
        next_id += 1;
        name_map.insert(resource_id.to_string(), name);
    }

    (objects, resources, name_map, next_id)
}

fn opacity_key(fill: f32, stroke: f32) -> (u16, u16) {
    let f = ((fill * 1000.0).round() as i32).clamp(0, 1000) as u16;
    let s = ((stroke * 1000.0).round() as i32).clamp(0, 1000) as u16;
    (f, s)
}

fn build_extgstate_objects(
    page: &Page,
    start_id: usize,
) -> (
    Vec<String>,
    Vec<(String, usize)>,
    HashMap<(u16, u16), String>,
    usize,
) {
    // Map (fill_alpha, stroke_alpha) -> /GSn resource.
    let pairs: BTreeSet<(u16, u16)> = page
        .commands
        .iter()
        .filter_map(|cmd| match cmd {
            Command::SetOpacity { fill, stroke } => Some(opacity_key(*fill, *stroke)),
            _ => None,
        })
        .collect();

    let mut objects = Vec::new();
    let mut resources = Vec::new();
    let mut name_map = HashMap::new();
    let mut next_id = start_id;

    for (index, (f, s)) in pairs.into_iter().enumerate() {
        let name = format!("GS{}", index + 1);
        objects.push(format!(
            "<< /Type /ExtGState /ca {} /CA {} >>",
            format_milli(f as i64),
            format_milli(s as i64)
        ));
        resources.push((name.clone(), next_id));
        next_id += 1;
        name_map.insert((f, s), name);
    }

    (objects, resources, name_map, next_id)
}

#[derive(Clone)]
struct TextState {
    font_name: String,
    font_size: Pt,
}

fn render_page(
    page: &Page,
    page_height: Pt,
    font_map: &HashMap<String, String>,
    image_map: &HashMap<String, String>,
    gs_map: &HashMap<(u16, u16), String>,
) -> String {
    let mut out = String::new();
    let mut state = TextState {
        font_name: DEFAULT_FONT.to_string(),
        font_size: Pt::from_f32(12.0),
    };
    let mut stack: Vec<TextState> = Vec::new();

    for cmd in &page.commands {
        match cmd {
            Command::SaveState => {
                stack.push(state.clone());
                out.push_str("q\n");
            }
            Command::RestoreState => {
                if let Some(saved) = stack.pop() {
                    state = saved;
                }
                out.push_str("Q\n");
            }
            Command::Meta { .. } => {}
            Command::SetFillColor(color) => out.push_str(&color_to_pdf_fill(*color)),
            Command::SetStrokeColor(color) => out.push_str(&color_to_pdf_stroke(*color)),
            Command::SetLineWidth(width) => {
                out.push_str(&format!("{} w\n", fmt_pt(*width)));
            }
            Command::SetOpacity { fill, stroke } => {
                if let Some(name) = gs_map.get(&opacity_key(*fill, *stroke)) {
                    out.push_str(&format!("/{} gs\n", name));
                }
            }
            Command::SetFontName(name) => state.font_name = name.clone(),
            Command::SetFontSize(size) => state.font_size = *size,
            Command::ClipRect {
                x,
                y,
                width,
                height,
            } => {
                // Top-left origin in, bottom-left origin out.
                out.push_str(&format!(
                    "{} {} {} {} re\nW\nn\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::MoveTo { x, y } => {
                out.push_str(&format!("{} {} m\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::LineTo { x, y } => {
                out.push_str(&format!("{} {} l\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} {} {} c\n",
                    fmt_pt(*x1),
                    fmt_pt(page_height - *y1),
                    fmt_pt(*x2),
                    fmt_pt(page_height - *y2),
                    fmt_pt(*x),
                    fmt_pt(page_height - *y),
                ));
            }
            Command::ClosePath => out.push_str("h\n"),
            Command::Fill => out.push_str("f\n"),
            Command::Stroke => out.push_str("S\n"),
            Command::FillStroke => out.push_str("B\n"),
            Command::DrawString { x, y, text } => {
                let resource = font_map
                    .get(&state.font_name)
                    .map(String::as_str)
                    .unwrap_or("F1");
                out.push_str("BT\n");
                out.push_str(&format!("/{} {} Tf\n", resource, fmt_pt(state.font_size)));
                out.push_str(&format!(
                    "{} {} Td\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - state.font_size)
                ));
                out.push_str(&format!("({}) Tj\n", encode_winansi_pdf_string(text)));
                out.push_str("ET\n");
            }
            Command::DrawRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nf\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                let Some(name) = image_map.get(resource_id) else {
                    log::warn!("image {resource_id} is not registered; skipping draw");
                    continue;
                };
                out.push_str("q\n");
                out.push_str(&format!(
                    "{} 0 0 {} {} {} cm\n",
                    fmt_pt(*width),
                    fmt_pt(*height),
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height)
                ));
                out.push_str(&format!("/{} Do\n", name));
                out.push_str("Q\n");
            }
        }
    }

    out
}

fn stream_object(content: &str) -> String {
    let length = content.len();
    format!("<< /Length {} >>\nstream\n{}\nendstream", length, content)
}

fn image_object(image: &ImageAsset, smask_id: Option<usize>) -> String {
    let stream_data = encode_stream_data(&image.data);
    let smask = smask_id
        .map(|id| format!(" /SMask {} 0 R", id))
        .unwrap_or_default();
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent {} /Length {} /Filter [/ASCIIHexDecode {}]{} >>\nstream\n{}\nendstream",
        image.width,
        image.height,
        image.color_space,
        image.bits_per_component,
        stream_data.len(),
        image.filter.as_pdf_name(),
        smask,
        stream_data
    )
}

fn image_smask_object(image: &ImageAsset, alpha: &[u8]) -> String {
    let stream_data = encode_stream_data(alpha);
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent 8 /Length {} /Filter [/ASCIIHexDecode {}] >>\nstream\n{}\nendstream",
        image.width,
        image.height,
        stream_data.len(),
        ImageFilter::Flate.as_pdf_name(),
        stream_data
    )
}

fn encode_stream_data(data: &[u8]) -> String {
    let mut hex = ascii_hex_encode(data);
    hex.push('>');
    hex
}

fn ascii_hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2 + data.len() / 32);
    for (index, byte) in data.iter().enumerate() {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02X}", byte);
        if index % 32 == 31 {
            out.push('\n');
        }
    }
    out
}

fn font_object(name: &str) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        sanitize_font_name(name)
    )
}

fn truetype_font_object(font: &RegisteredFont, descriptor_id: usize) -> String {
    let metrics = &font.metrics;
    let subtype = match font.program_kind {
        FontProgramKind::OpenTypeCff => "Type1",
        FontProgramKind::TrueType => "TrueType",
    };
    let widths = metrics
        .widths
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "<< /Type /Font /Subtype /{} /BaseFont /{} /FirstChar {} /LastChar {} /Widths [{}] /FontDescriptor {} 0 R /Encoding /WinAnsiEncoding >>",
        subtype,
        sanitize_font_name(&font.name),
        metrics.first_char,
        metrics.last_char,
        widths,
        descriptor_id
    )
}

fn font_descriptor_object(font: &RegisteredFont, font_file_id: usize) -> String {
    let metrics = &font.metrics;
    let mut flags = 32;
    if metrics.is_fixed_pitch {
        flags |= 1;
    }
    let font_file_entry = match font.program_kind {
        FontProgramKind::OpenTypeCff => "FontFile3",
        FontProgramKind::TrueType => "FontFile2",
    };
    format!(
        "<< /Type /FontDescriptor /FontName /{} /Flags {} /FontBBox [{} {} {} {}] /ItalicAngle {} /Ascent {} /Descent {} /CapHeight {} /StemV 80 /MissingWidth {} /{} {} 0 R >>",
        sanitize_font_name(&font.name),
        flags,
        metrics.bbox.0,
        metrics.bbox.1,
        metrics.bbox.2,
        metrics.bbox.3,
        metrics.italic_angle,
        metrics.ascent,
        metrics.descent,
        metrics.cap_height,
        metrics.missing_width,
        font_file_entry,
        font_file_id
    )
}

fn font_file_object(data: &[u8], kind: FontProgramKind) -> String {
    let mut stream_data = encode_stream_data(data);
    stream_data.push('\n');
    let mut dict = format!(
        "<< /Length {} /Length1 {} /Filter /ASCIIHexDecode",
        stream_data.len(),
        data.len()
    );
    if matches!(kind, FontProgramKind::OpenTypeCff) {
        dict.push_str(" /Subtype /OpenType");
    }
    dict.push_str(" >>\nstream\n");
    format!("{}{}endstream", dict, stream_data)
}

fn resource_dict(entries: &[(String, usize)]) -> String {
    let items = entries
        .iter()
        .map(|(resource, id)| format!("/{} {} 0 R", resource, id))
        .collect::<Vec<_>>()
        .join(" ");
    format!("<< {} >>", items)
}

fn sanitize_font_name(name: &str) -> String {
    let out: String = name
        .chars()
        .filter_map(|ch| match ch {
            c if c.is_ascii_alphanumeric() || c == '-' => Some(c),
            ' ' => Some('-'),
            _ => None,
        })
        .collect();
    if out.is_empty() {
        DEFAULT_FONT.to_string()
    } else {
        out
    }
}

fn info_object(options: &PdfOptions) -> String {
    let mut entries: Vec<String> = Vec::new();
    if let Some(title) = options.title.as_deref() {
        entries.push(format!("/Title ({})", encode_winansi_pdf_string(title)));
    }
    if let Some(subject) = options.subject.as_deref() {
        entries.push(format!("/Subject ({})", encode_winansi_pdf_string(subject)));
    }
    entries.push(format!(
        "/Producer ({})",
        encode_winansi_pdf_string(&options.producer)
    ));
    if let Some(created) = options.creation_date {
        entries.push(format!(
            "/CreationDate (D:{}Z)",
            created.format("%Y%m%d%H%M%S")
        ));
    }
    format!("<< {} >>", entries.join(" "))
}

/// Byte sink that tracks offsets for the xref table and hashes everything
/// written ahead of the trailer.
struct PdfSink<W: Write> {
    writer: W,
    offset: usize,
    digest: Sha256,
}

impl<W: Write> PdfSink<W> {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.digest.update(data);
        self.offset += data.len();
        Ok(())
    }

    fn write_str(&mut self, data: &str) -> io::Result<()> {
        self.write_bytes(data.as_bytes())
    }
}

fn write_pdf<W: Write>(objects: Vec<String>, info_id: usize, writer: W) -> io::Result<()> {
    let mut sink = PdfSink {
        writer,
        offset: 0,
        digest: Sha256::new(),
    };
    sink.write_bytes(b"%PDF-1.7\n")?;
    sink.write_bytes(b"%\xE2\xE3\xCF\xD3\n")?;

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(sink.offset);
        sink.write_str(&format!("{} 0 obj\n", index + 1))?;
        sink.write_str(body)?;
        sink.write_bytes(b"\nendobj\n")?;
    }

    let xref_start = sink.offset;
    sink.write_str(&format!("xref\n0 {}\n", objects.len() + 1))?;
    sink.write_bytes(b"0000000000 65535 f \n")?;
    for offset in offsets {
        sink.write_str(&format!("{:010} 00000 n \n", offset))?;
    }

    let digest = sink.digest.clone().finalize();
    let id: String = digest[..16].iter().map(|b| format!("{:02X}", b)).collect();
    sink.write_str(&format!(
        "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R /ID [<{}> <{}>] >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        PDF_CATALOG_ID,
        info_id,
        id,
        id,
        xref_start
    ))?;
    sink.writer.flush()
}

/// Encodes `input` as the body of a PDF literal string in WinAnsi. Characters
/// outside the code page become `?`.
fn encode_winansi_pdf_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        let byte = unicode_to_winansi(ch).unwrap_or(b'?');
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if !(0x20..0x7f).contains(&b) => out.push_str(&format!("\\{:03o}", b)),
            b => out.push(b as char),
        }
    }
    out
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        return format!("{}{}", sign, int_part);
    }
    let mut s = format!("{}{}.{:03}", sign, int_part, frac_part);
    while s.ends_with('0') {
        s.pop();
    }
    s
}

fn fmt(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    format_milli((value.clamp(0.0, 1.0) * 1000.0).round() as i64)
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli_i64())
}

fn color_to_pdf_fill(color: Color) -> String {
    format!("{} {} {} rg\n", fmt(color.r), fmt(color.g), fmt(color.b))
}

fn color_to_pdf_stroke(color: Color) -> String {
    format!("{} {} {} RG\n", fmt(color.r), fmt(color.g), fmt(color.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::types::Rect;
    use image::{DynamicImage, ImageBuffer, Rgba};
    use std::io::Cursor;

    fn serialize(doc: &Document) -> String {
        let bytes =
            document_to_pdf(doc, &FontRegistry::new(), &PdfOptions::default()).expect("pdf");
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn rgba_png(alpha: u8) -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(4, 4, Rgba([10, 20, 30, alpha]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .expect("png");
        out
    }

    #[test]
    fn text_is_positioned_from_the_top_left() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font("Helvetica-Bold", Pt::from_f32(20.0));
        canvas.draw_string(Pt::from_f32(40.0), Pt::from_f32(100.0), "Hello (world)");
        let pdf = serialize(&canvas.finish());
        assert!(pdf.starts_with("%PDF-1.7"));
        assert!(pdf.contains("/BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding"));
        assert!(pdf.contains("/F1 20 Tf"));
        // 841.89 - 100 - 20
        assert!(pdf.contains("40 721.89 Td"));
        assert!(pdf.contains("(Hello \\(world\\)) Tj"));
    }

    #[test]
    fn font_state_follows_save_and_restore() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.save_state();
        canvas.set_font("Helvetica-Bold", Pt::from_f32(20.0));
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "bold");
        canvas.restore_state();
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "regular");
        let pdf = serialize(&canvas.finish());
        assert!(pdf.contains("/F1 20 Tf"));
        assert!(pdf.contains("/F2 12 Tf"));
        assert!(pdf.contains("/BaseFont /Helvetica /Encoding"));
    }

    #[test]
    fn ellipsis_is_written_as_winansi_byte() {
        assert_eq!(encode_winansi_pdf_string("ab\u{2026}"), "ab\\205");
        assert_eq!(encode_winansi_pdf_string("\u{4E2D}"), "?");
    }

    #[test]
    fn images_become_xobjects_with_soft_masks() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.register_image("opaque", &rgba_png(255)).expect("decode");
        canvas.register_image("translucent", &rgba_png(128)).expect("decode");
        canvas.draw_image(Rect::new(10.0, 10.0, 20.0, 20.0), "opaque");
        canvas.draw_image(Rect::new(40.0, 10.0, 20.0, 20.0), "translucent");
        let pdf = serialize(&canvas.finish());
        assert_eq!(pdf.matches("/Subtype /Image").count(), 3);
        assert_eq!(pdf.matches("/SMask").count(), 1);
        assert!(pdf.contains("/Im1 Do"));
        assert!(pdf.contains("/Im2 Do"));
        assert!(pdf.contains("20 0 0 20 10 811.89 cm"));
    }

    #[test]
    fn opacity_maps_to_shared_extgstate() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_opacity(0.08, 0.08);
        canvas.set_opacity(0.08, 0.08);
        canvas.set_opacity(1.0, 1.0);
        let pdf = serialize(&canvas.finish());
        assert_eq!(pdf.matches("/Type /ExtGState").count(), 2);
        assert!(pdf.contains("/ca 0.08 /CA 0.08"));
        assert_eq!(pdf.matches("/GS1 gs").count(), 2);
    }

    #[test]
    fn clip_rect_is_flipped_to_pdf_space() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.clip_rect(Rect::new(60.0, 374.0, 475.28, 40.0));
        let pdf = serialize(&canvas.finish());
        assert!(pdf.contains("60 427.89 475.28 40 re\nW\nn"));
    }

    #[test]
    fn info_and_trailer_id_are_written() {
        let options = PdfOptions {
            title: Some("Certificate CERT-1".to_string()),
            subject: Some("Ada Lovelace".to_string()),
            creation_date: chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 3, 2, 16, 5, 9)
                .single(),
            ..PdfOptions::default()
        };
        let doc = Canvas::new(Size::a4()).finish();
        let bytes = document_to_pdf(&doc, &FontRegistry::new(), &options).expect("pdf");
        let pdf = String::from_utf8_lossy(&bytes);
        assert!(pdf.contains("/Title (Certificate CERT-1)"));
        assert!(pdf.contains("/Subject (Ada Lovelace)"));
        assert!(pdf.contains("/CreationDate (D:20240302160509Z)"));
        assert!(pdf.contains("/ID [<"));
        assert!(pdf.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn output_is_deterministic() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.draw_string(Pt::from_f32(10.0), Pt::from_f32(10.0), "same");
        let doc = canvas.finish();
        let fonts = FontRegistry::new();
        let a = document_to_pdf(&doc, &fonts, &PdfOptions::default()).expect("pdf");
        let b = document_to_pdf(&doc, &fonts, &PdfOptions::default()).expect("pdf");
        assert_eq!(a, b);
    }

    #[test]
    fn output_parses_with_lopdf() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.draw_string(Pt::from_f32(10.0), Pt::from_f32(10.0), "parse me");
        let bytes = document_to_pdf(&canvas.finish(), &FontRegistry::new(), &PdfOptions::default())
            .expect("pdf");
        let doc = lopdf::Document::load_mem(&bytes).expect("lopdf");
        assert_eq!(doc.get_pages().len(), 1);
    }
}
