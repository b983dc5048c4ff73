//! Fixed geometry of the certificate template.
//!
//! Every rectangle the compositor draws into comes from [`Region::rect`];
//! nothing here depends on request data. Coordinates are PDF points on an A4
//! portrait page with the origin at the top-left corner.

use crate::types::{Color, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Page,
    GlowTopLeft,
    GlowBottomRight,
    OuterFrame,
    InnerFrame,
    HeaderBar,
    TitleBlock,
    MetaBlock,
    PhotoCard,
    PhotoFrame,
    NarrativeColumn,
    NameLine,
    CoursePanel,
    CourseTitle,
    PerformancePanel,
    RemarksBox,
    QrCard,
    QrImage,
    SignatureLeft,
    SignatureRight,
    Footer,
}

impl Region {
    /// Primary regions: the cards, panels and lines that must never overlap
    /// one another. Decorative regions and nested sub-regions are excluded.
    pub const PRIMARY: [Region; 11] = [
        Region::HeaderBar,
        Region::TitleBlock,
        Region::MetaBlock,
        Region::PhotoCard,
        Region::NarrativeColumn,
        Region::CoursePanel,
        Region::PerformancePanel,
        Region::QrCard,
        Region::SignatureLeft,
        Region::SignatureRight,
        Region::Footer,
    ];

    pub fn rect(self) -> Rect {
        let (x, y, w, h) = self.bounds();
        Rect::new(x, y, w, h)
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Page => "page",
            Region::GlowTopLeft => "glow-top-left",
            Region::GlowBottomRight => "glow-bottom-right",
            Region::OuterFrame => "outer-frame",
            Region::InnerFrame => "inner-frame",
            Region::HeaderBar => "header-bar",
            Region::TitleBlock => "title-block",
            Region::MetaBlock => "meta-block",
            Region::PhotoCard => "photo-card",
            Region::PhotoFrame => "photo-frame",
            Region::NarrativeColumn => "narrative",
            Region::NameLine => "name-line",
            Region::CoursePanel => "course-panel",
            Region::CourseTitle => "course-title",
            Region::PerformancePanel => "performance-panel",
            Region::RemarksBox => "remarks-box",
            Region::QrCard => "qr-card",
            Region::QrImage => "qr-image",
            Region::SignatureLeft => "signature-left",
            Region::SignatureRight => "signature-right",
            Region::Footer => "footer",
        }
    }

    const fn bounds(self) -> (f32, f32, f32, f32) {
        match self {
            Region::Page => (0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT),
            // Glow circles are inscribed in these squares, centered on the corners.
            Region::GlowTopLeft => (-170.0, -170.0, 340.0, 340.0),
            Region::GlowBottomRight => (PAGE_WIDTH - 200.0, PAGE_HEIGHT - 200.0, 400.0, 400.0),
            Region::OuterFrame => (18.0, 18.0, PAGE_WIDTH - 36.0, PAGE_HEIGHT - 36.0),
            Region::InnerFrame => (28.0, 28.0, PAGE_WIDTH - 56.0, PAGE_HEIGHT - 56.0),
            Region::HeaderBar => (40.0, 40.0, CONTENT_WIDTH, 72.0),
            Region::TitleBlock => (40.0, 124.0, CONTENT_WIDTH, 58.0),
            Region::MetaBlock => (40.0, 196.0, 250.0, 56.0),
            Region::PhotoCard => (435.28, 190.0, 120.0, 150.0),
            Region::PhotoFrame => (447.28, 212.0, 96.0, 116.0),
            Region::NarrativeColumn => (60.0, 352.0, PAGE_WIDTH - 120.0, 120.0),
            Region::NameLine => (60.0, 374.0, PAGE_WIDTH - 120.0, 40.0),
            Region::CoursePanel => (40.0, 484.0, CONTENT_WIDTH, 86.0),
            Region::CourseTitle => (56.0, 506.0, CONTENT_WIDTH - 32.0, 28.0),
            Region::PerformancePanel => (40.0, 582.0, 320.0, 150.0),
            Region::RemarksBox => (56.0, 664.0, 288.0, 56.0),
            Region::QrCard => (372.0, 582.0, 183.28, 150.0),
            Region::QrImage => (415.64, 594.0, 96.0, 96.0),
            Region::SignatureLeft => (70.0, 750.0, 160.0, 24.0),
            Region::SignatureRight => (365.28, 750.0, 160.0, 24.0),
            Region::Footer => (40.0, 788.0, CONTENT_WIDTH, 14.0),
        }
    }
}

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 80.0;

pub const FRAME_OUTER_RADIUS: f32 = 16.0;
pub const FRAME_INNER_RADIUS: f32 = 12.0;
pub const CARD_RADIUS: f32 = 10.0;
pub const GLOW_OPACITY: f32 = 0.08;

/// Inclusive font size range handed to the fit engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRange {
    pub max: f32,
    pub min: f32,
}

pub const INSTITUTION_FIT: FitRange = FitRange { max: 20.0, min: 12.0 };
pub const NAME_FIT: FitRange = FitRange { max: 32.0, min: 18.0 };
pub const COURSE_FIT: FitRange = FitRange { max: 20.0, min: 12.0 };

pub const TAGLINE_SIZE: f32 = 9.5;
pub const SECTION_TITLE_SIZE: f32 = 11.0;
pub const DECORATIVE_TITLE_SIZE: f32 = 28.0;
pub const META_SIZE: f32 = 8.5;
pub const META_ROW_HEIGHT: f32 = 16.0;
pub const META_VALUE_OFFSET: f32 = 92.0;
pub const CAPTION_SIZE: f32 = 8.5;
pub const BODY_SIZE: f32 = 11.0;
pub const BODY_LINE_HEIGHT: f32 = 15.0;
pub const LABEL_SIZE: f32 = 8.0;
pub const VALUE_SIZE: f32 = 12.0;
pub const DURATION_SIZE: f32 = 10.0;
pub const REMARKS_SIZE: f32 = 9.5;
pub const REMARKS_LINE_HEIGHT: f32 = 13.0;
pub const QR_SUBTEXT_SIZE: f32 = 7.5;
pub const FOOTER_SIZE: f32 = 7.5;

pub struct Palette;

impl Palette {
    pub const PAPER: Color = Color::from_rgb8(0xFB, 0xFA, 0xF6);
    pub const NAVY: Color = Color::from_rgb8(0x1B, 0x2A, 0x4A);
    pub const GOLD: Color = Color::from_rgb8(0xC8, 0x9B, 0x3C);
    pub const INK: Color = Color::from_rgb8(0x22, 0x22, 0x22);
    pub const MUTED: Color = Color::from_rgb8(0x6B, 0x72, 0x80);
    pub const PANEL: Color = Color::from_rgb8(0xF3, 0xF0, 0xE6);
    pub const RULE: Color = Color::from_rgb8(0xD8, 0xD2, 0xC0);
    pub const HEADER_TEXT: Color = Color::WHITE;
    pub const TAGLINE: Color = Color::from_rgb8(0xD9, 0xDE, 0xE8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_regions_are_pairwise_disjoint() {
        for (i, a) in Region::PRIMARY.iter().enumerate() {
            for b in &Region::PRIMARY[i + 1..] {
                assert!(
                    !a.rect().intersects(&b.rect()),
                    "{} overlaps {}",
                    a.name(),
                    b.name()
                );
            }
        }
    }

    #[test]
    fn primary_regions_sit_inside_the_inner_frame() {
        let inner = Region::InnerFrame.rect();
        for region in Region::PRIMARY {
            assert!(inner.contains(&region.rect()), "{}", region.name());
        }
    }

    #[test]
    fn nested_regions_sit_inside_their_parents() {
        let pairs = [
            (Region::PhotoCard, Region::PhotoFrame),
            (Region::NarrativeColumn, Region::NameLine),
            (Region::CoursePanel, Region::CourseTitle),
            (Region::PerformancePanel, Region::RemarksBox),
            (Region::QrCard, Region::QrImage),
            (Region::OuterFrame, Region::InnerFrame),
        ];
        for (parent, child) in pairs {
            assert!(
                parent.rect().contains(&child.rect()),
                "{} not inside {}",
                child.name(),
                parent.name()
            );
        }
    }

    #[test]
    fn qr_image_is_square_and_centered_in_its_card() {
        let card = Region::QrCard.rect();
        let image = Region::QrImage.rect();
        assert_eq!(image.width, image.height);
        let drift = (card.center_x().to_f32() - image.center_x().to_f32()).abs();
        assert!(drift < 0.01, "drift {drift}");
    }

    #[test]
    fn glows_are_anchored_on_opposite_corners() {
        let page = Region::Page.rect();
        let tl = Region::GlowTopLeft.rect();
        let br = Region::GlowBottomRight.rect();
        assert_eq!(tl.center_x().to_milli_i64(), 0);
        assert_eq!(tl.center_y().to_milli_i64(), 0);
        assert_eq!(br.center_x(), page.right());
        assert_eq!(br.center_y(), page.bottom());
    }

    #[test]
    fn fit_ranges_are_ordered() {
        for range in [INSTITUTION_FIT, NAME_FIT, COURSE_FIT] {
            assert!(range.min < range.max);
        }
    }
}
