//! Draws the certificate template onto a fresh canvas.
//!
//! The drawing order is fixed: later steps paint over earlier ones, and each
//! step opens with a `region` meta marker so the command list can be audited
//! region by region.

use crate::CertificateRequest;
use crate::canvas::{Canvas, Document};
use crate::config::Branding;
use crate::error::CertificateError;
use crate::fit::{self, TextMeasure};
use crate::font::{FontRegistry, FontStyle};
use crate::format::{self, DateStyle};
use crate::layout::{self, Palette, Region};
use crate::qr::VerificationCodeImage;
use crate::resolve::ResolvedImage;
use crate::types::{Color, Pt, Rect, Size};
use chrono::{DateTime, TimeZone};

pub const PHOTO_RESOURCE_ID: &str = "photo";
pub const VERIFICATION_CODE_RESOURCE_ID: &str = "verification-code";

const NO_PHOTO: &str = "No Photo";
const PANEL_PADDING: f32 = 16.0;

/// Lays out one certificate. `photo` of `None` draws the "No Photo"
/// placeholder; photo bytes that fail to decode leave the frame empty. A
/// verification code that cannot be decoded is fatal.
pub fn compose<Tz: TimeZone>(
    request: &CertificateRequest,
    photo: Option<&ResolvedImage>,
    code: &VerificationCodeImage,
    fonts: &FontRegistry,
    branding: &Branding,
    date_style: DateStyle,
    generated_at: &DateTime<Tz>,
) -> Result<Document, CertificateError> {
    let mut composer = Composer {
        canvas: Canvas::new(Size::a4()),
        fonts,
        branding,
    };

    composer.background();
    composer.frames();
    composer.header();
    composer.titles();
    composer.meta_block(request, date_style, generated_at);
    composer.photo_card(photo);
    composer.narrative(request);
    composer.course_panel(request, date_style);
    composer.performance_panel(request);
    composer.qr_card(code)?;
    composer.sign_offs();
    composer.footer();

    Ok(composer.canvas.finish())
}

struct Composer<'a> {
    canvas: Canvas,
    fonts: &'a FontRegistry,
    branding: &'a Branding,
}

impl Composer<'_> {
    fn enter(&mut self, region: Region) {
        log::debug!("compose: {}", region.name());
        self.canvas.meta("region", region.name());
    }

    fn background(&mut self) {
        self.enter(Region::Page);
        self.canvas.set_fill_color(Palette::PAPER);
        self.canvas.draw_rect(Region::Page.rect());

        for (region, color) in [
            (Region::GlowTopLeft, Palette::GOLD),
            (Region::GlowBottomRight, Palette::NAVY),
        ] {
            self.enter(region);
            let rect = region.rect();
            self.canvas.save_state();
            self.canvas
                .set_opacity(layout::GLOW_OPACITY, layout::GLOW_OPACITY);
            self.canvas.set_fill_color(color);
            self.canvas
                .circle_path(rect.center_x(), rect.center_y(), rect.width / 2.0);
            self.canvas.fill();
            self.canvas.restore_state();
        }
    }

    fn frames(&mut self) {
        self.enter(Region::OuterFrame);
        self.canvas.set_stroke_color(Palette::NAVY);
        self.canvas.set_line_width(Pt::from_f32(2.0));
        self.canvas.rounded_rect_path(
            Region::OuterFrame.rect(),
            Pt::from_f32(layout::FRAME_OUTER_RADIUS),
        );
        self.canvas.stroke();

        self.enter(Region::InnerFrame);
        self.canvas.set_stroke_color(Palette::GOLD);
        self.canvas.set_line_width(Pt::from_f32(0.75));
        self.canvas.rounded_rect_path(
            Region::InnerFrame.rect(),
            Pt::from_f32(layout::FRAME_INNER_RADIUS),
        );
        self.canvas.stroke();
    }

    fn header(&mut self) {
        self.enter(Region::HeaderBar);
        let bar = Region::HeaderBar.rect();
        self.card(bar, Palette::NAVY, None);

        let text_box = bar.inset(PANEL_PADDING);
        let bold = self.fonts.font_for(FontStyle::Bold);
        let institution = format::or_placeholder(Some(&self.branding.institution));
        let size = fit::fit_font_size(
            self.fonts,
            bold,
            &institution,
            text_box.width,
            layout::INSTITUTION_FIT.max,
            layout::INSTITUTION_FIT.min,
        );
        self.centered_line(
            FontStyle::Bold,
            size,
            Palette::HEADER_TEXT,
            text_box,
            bar.y + Pt::from_f32(14.0),
            &institution,
        );

        let tagline = self.branding.tagline.clone();
        self.centered_line(
            FontStyle::Regular,
            layout::TAGLINE_SIZE,
            Palette::TAGLINE,
            text_box,
            bar.y + Pt::from_f32(46.0),
            &tagline,
        );
    }

    fn titles(&mut self) {
        self.enter(Region::TitleBlock);
        let block = Region::TitleBlock.rect();
        let section = self.branding.section_title.clone();
        let decorative = self.branding.decorative_title.clone();
        self.centered_line(
            FontStyle::Bold,
            layout::SECTION_TITLE_SIZE,
            Palette::GOLD,
            block,
            block.y,
            &section,
        );
        self.centered_line(
            FontStyle::Italic,
            layout::DECORATIVE_TITLE_SIZE,
            Palette::NAVY,
            block,
            block.y + Pt::from_f32(22.0),
            &decorative,
        );
    }

    fn meta_block<Tz: TimeZone>(
        &mut self,
        request: &CertificateRequest,
        date_style: DateStyle,
        generated_at: &DateTime<Tz>,
    ) {
        self.enter(Region::MetaBlock);
        let block = Region::MetaBlock.rect();
        let rows = [
            (
                "Certificate No.",
                format::or_placeholder(Some(&request.certificate_number)),
            ),
            ("Issued", format::format_date(request.issue_date, date_style)),
            (
                "Generated",
                format::format_timestamp(generated_at, date_style),
            ),
        ];
        let value_x = block.x + Pt::from_f32(layout::META_VALUE_OFFSET);
        let value_width = block.right() - value_x;
        for (idx, (label, value)) in rows.iter().enumerate() {
            let y = block.y + Pt::from_f32(layout::META_ROW_HEIGHT * idx as f32);
            self.line(
                FontStyle::Regular,
                layout::META_SIZE,
                Palette::MUTED,
                block.x,
                y,
                label,
            );
            self.clamped_line(
                FontStyle::Bold,
                layout::META_SIZE,
                Palette::INK,
                value_x,
                y,
                value_width,
                value,
            );
        }
    }

    fn photo_card(&mut self, photo: Option<&ResolvedImage>) {
        self.enter(Region::PhotoCard);
        let card = Region::PhotoCard.rect();
        self.card(card, Palette::PANEL, Some(Palette::RULE));
        let caption = self.branding.photo_caption.clone();
        self.centered_line(
            FontStyle::Bold,
            layout::CAPTION_SIZE,
            Palette::MUTED,
            card,
            card.y + Pt::from_f32(7.0),
            &caption,
        );

        self.enter(Region::PhotoFrame);
        let frame = Region::PhotoFrame.rect();
        self.canvas.set_fill_color(Color::WHITE);
        self.canvas.set_stroke_color(Palette::RULE);
        self.canvas.set_line_width(Pt::from_f32(0.75));
        self.canvas.rounded_rect_path(frame, Pt::from_f32(4.0));
        self.canvas.fill_stroke();

        let Some(photo) = photo else {
            self.centered_line(
                FontStyle::Regular,
                layout::CAPTION_SIZE,
                Palette::MUTED,
                frame,
                middle_line_top(frame, layout::CAPTION_SIZE),
                NO_PHOTO,
            );
            return;
        };

        let target = frame.inset(2.0);
        let placement = self
            .canvas
            .register_image(PHOTO_RESOURCE_ID, &photo.bytes)
            .map(|asset| asset.fit_within(target.width.to_f32(), target.height.to_f32()));
        match placement {
            Some(Some((width, height))) => {
                let width = Pt::from_f32(width);
                let height = Pt::from_f32(height);
                let placed = Rect {
                    x: target.center_x() - width / 2.0,
                    y: target.center_y() - height / 2.0,
                    width,
                    height,
                };
                self.canvas.draw_image(placed, PHOTO_RESOURCE_ID);
            }
            _ => log::warn!(
                "photo ({:?}, {} bytes) could not be drawn; leaving frame empty",
                photo.origin,
                photo.bytes.len()
            ),
        }
    }

    fn narrative(&mut self, request: &CertificateRequest) {
        self.enter(Region::NarrativeColumn);
        let column = Region::NarrativeColumn.rect();
        let intro = self.branding.intro.clone();
        self.centered_line(
            FontStyle::Regular,
            layout::BODY_SIZE,
            Palette::MUTED,
            column,
            column.y,
            &intro,
        );

        self.enter(Region::NameLine);
        let name_box = Region::NameLine.rect();
        let name = format::or_placeholder(Some(&request.student_name));
        let font = self.fonts.font_for(FontStyle::BoldItalic);
        let size = fit::fit_font_size(
            self.fonts,
            font,
            &name,
            name_box.width,
            layout::NAME_FIT.max,
            layout::NAME_FIT.min,
        );
        self.clipped_centered_line(
            FontStyle::BoldItalic,
            size,
            Palette::NAVY,
            name_box,
            &name,
        );
        self.canvas.set_stroke_color(Palette::GOLD);
        self.canvas.set_line_width(Pt::from_f32(0.75));
        let rule_y = name_box.bottom() + Pt::from_f32(2.0);
        let rule_half = Pt::from_f32(120.0);
        self.canvas.move_to(name_box.center_x() - rule_half, rule_y);
        self.canvas.line_to(name_box.center_x() + rule_half, rule_y);
        self.canvas.stroke();

        let continuation = self.branding.continuation.clone();
        let top = name_box.bottom() + Pt::from_f32(8.0);
        let body = Rect {
            x: column.x,
            y: top,
            width: column.width,
            height: column.bottom() - top,
        };
        let regular = self.fonts.font_for(FontStyle::Regular);
        let boxed = fit::fit_lines_in_box(
            self.fonts,
            regular,
            Pt::from_f32(layout::BODY_SIZE),
            Pt::from_f32(layout::BODY_LINE_HEIGHT),
            &continuation,
            body.width,
            body.height,
        );
        for (idx, line) in boxed.lines.iter().enumerate() {
            let y = body.y + Pt::from_f32(layout::BODY_LINE_HEIGHT * idx as f32);
            self.centered_line(
                FontStyle::Regular,
                layout::BODY_SIZE,
                Palette::INK,
                body,
                y,
                line,
            );
        }
    }

    fn course_panel(&mut self, request: &CertificateRequest, date_style: DateStyle) {
        self.enter(Region::CoursePanel);
        let panel = Region::CoursePanel.rect();
        self.card(panel, Palette::PANEL, None);
        let title_box = Region::CourseTitle.rect();
        self.line(
            FontStyle::Bold,
            layout::LABEL_SIZE,
            Palette::MUTED,
            title_box.x,
            panel.y + Pt::from_f32(8.0),
            "COURSE",
        );

        self.enter(Region::CourseTitle);
        let title = format::or_placeholder(Some(&request.course_title));
        let font = self.fonts.font_for(FontStyle::Bold);
        let size = fit::fit_font_size(
            self.fonts,
            font,
            &title,
            title_box.width,
            layout::COURSE_FIT.max,
            layout::COURSE_FIT.min,
        );
        self.canvas.save_state();
        self.canvas.clip_rect(title_box);
        self.line(
            FontStyle::Bold,
            size,
            Palette::NAVY,
            title_box.x,
            middle_line_top(title_box, size),
            &title,
        );
        self.canvas.restore_state();

        let duration = format::format_duration(request.start_date, request.end_date, date_style);
        self.line(
            FontStyle::Regular,
            layout::DURATION_SIZE,
            Palette::MUTED,
            title_box.x,
            title_box.bottom() + Pt::from_f32(10.0),
            &duration,
        );
    }

    fn performance_panel(&mut self, request: &CertificateRequest) {
        self.enter(Region::PerformancePanel);
        let panel = Region::PerformancePanel.rect();
        self.card(panel, Palette::PANEL, None);
        let remarks_box = Region::RemarksBox.rect();
        let x = remarks_box.x;
        let inner_width = remarks_box.width;

        self.line(
            FontStyle::Bold,
            layout::LABEL_SIZE,
            Palette::MUTED,
            x,
            panel.y + Pt::from_f32(12.0),
            "PERFORMANCE",
        );
        let performance = format::or_placeholder(request.performance_label.as_deref());
        self.clamped_line(
            FontStyle::Bold,
            layout::VALUE_SIZE,
            Palette::INK,
            x,
            panel.y + Pt::from_f32(26.0),
            inner_width,
            &performance,
        );
        self.line(
            FontStyle::Bold,
            layout::LABEL_SIZE,
            Palette::MUTED,
            x,
            remarks_box.y - Pt::from_f32(14.0),
            "REMARKS",
        );

        self.enter(Region::RemarksBox);
        let remarks = format::or_placeholder(request.remarks.as_deref());
        let regular = self.fonts.font_for(FontStyle::Regular);
        let boxed = fit::fit_lines_in_box(
            self.fonts,
            regular,
            Pt::from_f32(layout::REMARKS_SIZE),
            Pt::from_f32(layout::REMARKS_LINE_HEIGHT),
            &remarks,
            remarks_box.width,
            remarks_box.height,
        );
        if boxed.truncated {
            log::debug!("remarks truncated to {} lines", boxed.lines.len());
        }
        for (idx, text) in boxed.lines.iter().enumerate() {
            let y = remarks_box.y + Pt::from_f32(layout::REMARKS_LINE_HEIGHT * idx as f32);
            self.line(
                FontStyle::Regular,
                layout::REMARKS_SIZE,
                Palette::INK,
                x,
                y,
                text,
            );
        }
    }

    fn qr_card(&mut self, code: &VerificationCodeImage) -> Result<(), CertificateError> {
        self.enter(Region::QrCard);
        let card = Region::QrCard.rect();
        self.card(card, Color::WHITE, Some(Palette::RULE));

        self.enter(Region::QrImage);
        let square = Region::QrImage.rect();
        if self
            .canvas
            .register_image(VERIFICATION_CODE_RESOURCE_ID, &code.png)
            .is_none()
        {
            return Err(CertificateError::Encoding(
                "verification code image could not be decoded".to_string(),
            ));
        }
        self.canvas.draw_image(square, VERIFICATION_CODE_RESOURCE_ID);

        let caption = self.branding.qr_caption.clone();
        let subtext = self.branding.qr_subtext.clone();
        self.centered_line(
            FontStyle::Bold,
            layout::CAPTION_SIZE,
            Palette::NAVY,
            card,
            square.bottom() + Pt::from_f32(8.0),
            &caption,
        );
        self.centered_line(
            FontStyle::Regular,
            layout::QR_SUBTEXT_SIZE,
            Palette::MUTED,
            card,
            square.bottom() + Pt::from_f32(22.0),
            &subtext,
        );
        Ok(())
    }

    fn sign_offs(&mut self) {
        let captions = [
            (Region::SignatureLeft, self.branding.signatory_caption.clone()),
            (Region::SignatureRight, self.branding.seal_caption.clone()),
        ];
        for (region, caption) in captions {
            self.enter(region);
            let rect = region.rect();
            let rule_y = rect.y + Pt::from_f32(4.0);
            self.canvas.set_stroke_color(Palette::INK);
            self.canvas.set_line_width(Pt::from_f32(0.75));
            self.canvas.move_to(rect.x, rule_y);
            self.canvas.line_to(rect.right(), rule_y);
            self.canvas.stroke();
            self.centered_line(
                FontStyle::Regular,
                layout::CAPTION_SIZE,
                Palette::MUTED,
                rect,
                rect.y + Pt::from_f32(10.0),
                &caption,
            );
        }
    }

    fn footer(&mut self) {
        self.enter(Region::Footer);
        let footer = Region::Footer.rect();
        let text = self.branding.footer.clone();
        self.centered_line(
            FontStyle::Regular,
            layout::FOOTER_SIZE,
            Palette::MUTED,
            footer,
            footer.y,
            &text,
        );
    }

    fn card(&mut self, rect: Rect, fill: Color, border: Option<Color>) {
        self.canvas.set_fill_color(fill);
        self.canvas
            .rounded_rect_path(rect, Pt::from_f32(layout::CARD_RADIUS));
        match border {
            Some(border) => {
                self.canvas.set_stroke_color(border);
                self.canvas.set_line_width(Pt::from_f32(0.75));
                self.canvas.fill_stroke();
            }
            None => self.canvas.fill(),
        }
    }

    fn line(&mut self, style: FontStyle, size: f32, color: Color, x: Pt, y: Pt, text: &str) {
        let font = self.fonts.font_for(style).to_string();
        self.canvas.set_fill_color(color);
        self.canvas.set_font(&font, Pt::from_f32(size));
        self.canvas.draw_string(x, y, text);
    }

    /// Single line cut with an ellipsis at `max_width`.
    #[allow(clippy::too_many_arguments)]
    fn clamped_line(
        &mut self,
        style: FontStyle,
        size: f32,
        color: Color,
        x: Pt,
        y: Pt,
        max_width: Pt,
        text: &str,
    ) {
        let font = self.fonts.font_for(style);
        let text = fit::truncate_with_ellipsis(self.fonts, font, Pt::from_f32(size), text, max_width);
        self.line(style, size, color, x, y, &text);
    }

    /// Horizontally centered in `within`, ellipsized to its width.
    fn centered_line(
        &mut self,
        style: FontStyle,
        size: f32,
        color: Color,
        within: Rect,
        y: Pt,
        text: &str,
    ) {
        let font = self.fonts.font_for(style);
        let size_pt = Pt::from_f32(size);
        let text = fit::truncate_with_ellipsis(self.fonts, font, size_pt, text, within.width);
        let width = self.fonts.text_width(font, size_pt, &text);
        let x = within.center_x() - width / 2.0;
        self.line(style, size, color, x, y, &text);
    }

    /// Centered and clipped to `within`; text that overflows even at the
    /// minimum fit size is left-aligned and cut by the clip.
    fn clipped_centered_line(
        &mut self,
        style: FontStyle,
        size: f32,
        color: Color,
        within: Rect,
        text: &str,
    ) {
        let font = self.fonts.font_for(style);
        let size_pt = Pt::from_f32(size);
        let width = self.fonts.text_width(font, size_pt, text);
        let x = (within.center_x() - width / 2.0).max(within.x);
        self.canvas.save_state();
        self.canvas.clip_rect(within);
        self.line(style, size, color, x, middle_line_top(within, size), text);
        self.canvas.restore_state();
    }
}

fn middle_line_top(rect: Rect, size: f32) -> Pt {
    rect.y + (rect.height - Pt::from_f32(size)) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::qr;
    use crate::resolve::ImageOrigin;
    use chrono::{NaiveDate, Utc};
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::io::Cursor;

    fn request() -> CertificateRequest {
        CertificateRequest {
            output_path: "out/cert.pdf".into(),
            certificate_number: "CERT-2024-0042".to_string(),
            verification_url: "https://verify.example.org/c/CERT-2024-0042".to_string(),
            student_name: "Ada Lovelace".to_string(),
            course_title: "Analytical Engines 101".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            performance_label: Some("Distinction".to_string()),
            ..CertificateRequest::default()
        }
    }

    fn photo_png() -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(40, 60, |x, y| Rgb([(x * 5) as u8, (y * 4) as u8, 90]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .expect("png");
        out
    }

    fn render(req: &CertificateRequest, photo: Option<&ResolvedImage>) -> Document {
        let code = qr::encode(&req.verification_url).expect("qr");
        let at = Utc::now();
        compose(
            req,
            photo,
            &code,
            &FontRegistry::new(),
            &Branding::default(),
            DateStyle::Us,
            &at,
        )
        .expect("compose")
    }

    fn region_order(doc: &Document) -> Vec<String> {
        doc.page
            .commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::Meta { key, value } if key == "region" => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn missing_photo_draws_placeholder_and_duration() {
        let doc = render(&request(), None);
        assert!(doc.contains_text("No Photo"));
        assert!(doc.contains_text("1/1/2024 to 3/1/2024"));
        assert!(doc.contains_text("3/5/2024"));
        assert_eq!(doc.image_draw_count(), 1);
    }

    #[test]
    fn decodable_photo_is_drawn_inside_its_frame() {
        let photo = ResolvedImage {
            bytes: photo_png(),
            origin: ImageOrigin::Local,
        };
        let doc = render(&request(), Some(&photo));
        assert!(!doc.contains_text("No Photo"));
        assert_eq!(doc.image_draw_count(), 2);
        let frame = Region::PhotoFrame.rect();
        let placed = doc
            .page
            .commands
            .iter()
            .find_map(|cmd| match cmd {
                Command::DrawImage {
                    x,
                    y,
                    width,
                    height,
                    resource_id,
                } if resource_id == PHOTO_RESOURCE_ID => Some(Rect {
                    x: *x,
                    y: *y,
                    width: *width,
                    height: *height,
                }),
                _ => None,
            })
            .expect("photo placement");
        assert!(frame.contains(&placed));
    }

    #[test]
    fn undecodable_photo_leaves_frame_empty() {
        let photo = ResolvedImage {
            bytes: b"<html>not an image</html>".to_vec(),
            origin: ImageOrigin::Remote,
        };
        let doc = render(&request(), Some(&photo));
        assert!(!doc.contains_text("No Photo"));
        assert_eq!(doc.image_draw_count(), 1);
        assert!(doc.images.get(PHOTO_RESOURCE_ID).is_none());
    }

    #[test]
    fn absent_optional_fields_show_placeholders() {
        let req = CertificateRequest {
            performance_label: None,
            remarks: None,
            start_date: None,
            end_date: None,
            issue_date: None,
            ..request()
        };
        let doc = render(&req, None);
        assert!(doc.contains_text("- to -"));
        let dashes = doc.strings().filter(|text| *text == "-").count();
        // issue date, performance, remarks
        assert_eq!(dashes, 3);
    }

    #[test]
    fn long_remarks_are_bounded_with_ellipsis() {
        let req = CertificateRequest {
            remarks: Some("Consistently excellent work across every module. ".repeat(40)),
            ..request()
        };
        let doc = render(&req, None);
        let fonts = FontRegistry::new();
        let boxed = fit::fit_lines_in_box(
            &fonts,
            "Helvetica",
            Pt::from_f32(layout::REMARKS_SIZE),
            Pt::from_f32(layout::REMARKS_LINE_HEIGHT),
            req.remarks.as_deref().unwrap_or_default(),
            Region::RemarksBox.rect().width,
            Region::RemarksBox.rect().height,
        );
        assert!(boxed.truncated);
        let last = boxed.lines.last().expect("lines");
        assert!(last.ends_with('\u{2026}'));
        assert!(doc.contains_text(last));
    }

    #[test]
    fn very_long_name_is_clipped_to_its_line() {
        let req = CertificateRequest {
            student_name: "Bartholomew Maximilian Fitzgerald-Worthington ".repeat(4),
            ..request()
        };
        let doc = render(&req, None);
        let commands = &doc.page.commands;
        let clip_at = commands
            .iter()
            .position(|cmd| {
                matches!(cmd, Command::ClipRect { y, .. } if *y == Region::NameLine.rect().y)
            })
            .expect("name clip");
        let name_size = commands[clip_at..]
            .iter()
            .find_map(|cmd| match cmd {
                Command::SetFontSize(size) => Some(size.to_f32()),
                _ => None,
            })
            .expect("name font size");
        assert!((name_size - layout::NAME_FIT.min).abs() < 0.001);
        assert!(matches!(
            commands[clip_at - 1],
            Command::SaveState
        ));
    }

    #[test]
    fn regions_are_drawn_in_template_order() {
        let order = region_order(&render(&request(), None));
        let expected = [
            "page",
            "glow-top-left",
            "glow-bottom-right",
            "outer-frame",
            "inner-frame",
            "header-bar",
            "title-block",
            "meta-block",
            "photo-card",
            "photo-frame",
            "narrative",
            "name-line",
            "course-panel",
            "course-title",
            "performance-panel",
            "remarks-box",
            "qr-card",
            "qr-image",
            "signature-left",
            "signature-right",
            "footer",
        ];
        assert_eq!(order, expected);
    }

    #[test]
    fn sign_off_captions_are_present() {
        let doc = render(&request(), None);
        assert!(doc.contains_text("Authorized Signatory"));
        assert!(doc.contains_text("Seal"));
    }

    #[test]
    fn broken_verification_code_is_fatal() {
        let code = VerificationCodeImage {
            png: vec![1, 2, 3],
            modules: 21,
        };
        let err = compose(
            &request(),
            None,
            &code,
            &FontRegistry::new(),
            &Branding::default(),
            DateStyle::Us,
            &Utc::now(),
        )
        .expect_err("fatal");
        assert!(matches!(err, CertificateError::Encoding(_)));
    }
}
