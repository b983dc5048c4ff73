use crate::assets::{AssetBundle, ImageAsset};
use crate::types::{Color, Pt, Rect, Size};

/// Bezier control-point factor for approximating a quarter circle.
const KAPPA: f32 = 0.552_284_75;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveState,
    RestoreState,
    // Non-rendered marker naming the template region the following commands
    // belong to. Ignored by the PDF writer.
    Meta {
        key: String,
        value: String,
    },
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    // Applies both fill and stroke alpha (ca/CA). Values outside 0..1 are clamped.
    SetOpacity {
        fill: f32,
        stroke: f32,
    },
    SetFontName(String),
    SetFontSize(Pt),
    ClipRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    MoveTo {
        x: Pt,
        y: Pt,
    },
    LineTo {
        x: Pt,
        y: Pt,
    },
    CurveTo {
        x1: Pt,
        y1: Pt,
        x2: Pt,
        y2: Pt,
        x: Pt,
        y: Pt,
    },
    ClosePath,
    Fill,
    Stroke,
    FillStroke,
    // `y` is the top of the text line; the writer derives the baseline.
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    DrawRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub commands: Vec<Command>,
}

/// A finished single-page certificate, ready for serialization.
#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub page: Page,
    pub images: AssetBundle,
}

impl Document {
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.page.commands.iter().filter_map(|cmd| match cmd {
            Command::DrawString { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.strings().any(|text| text.contains(needle))
    }

    pub fn image_draw_count(&self) -> usize {
        self.page
            .commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::DrawImage { .. }))
            .count()
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_size: Pt,
    font_name: String,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_size: Pt::from_f32(12.0),
            font_name: "Helvetica".to_string(),
        }
    }
}

/// Mutable page surface owned by exactly one render call. Drawing calls append
/// to a command list; redundant state changes are elided.
pub struct Canvas {
    page_size: Size,
    current: Page,
    images: AssetBundle,
    state_stack: Vec<GraphicsState>,
    current_state: GraphicsState,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            current: Page::default(),
            images: AssetBundle::default(),
            state_stack: Vec::new(),
            current_state: GraphicsState::default(),
        }
    }

    pub fn save_state(&mut self) {
        self.state_stack.push(self.current_state.clone());
        self.current.commands.push(Command::SaveState);
    }

    pub fn restore_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.current_state = state;
            self.current.commands.push(Command::RestoreState);
        }
    }

    pub fn meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.current.commands.push(Command::Meta {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.current_state.fill_color == color {
            return;
        }
        self.current_state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.current_state.stroke_color == color {
            return;
        }
        self.current_state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.current_state.line_width == width {
            return;
        }
        self.current_state.line_width = width;
        self.current.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_opacity(&mut self, fill: f32, stroke: f32) {
        self.current.commands.push(Command::SetOpacity {
            fill: fill.clamp(0.0, 1.0),
            stroke: stroke.clamp(0.0, 1.0),
        });
    }

    pub fn set_font(&mut self, name: &str, size: Pt) {
        if self.current_state.font_name != name {
            self.current_state.font_name = name.to_string();
            self.current
                .commands
                .push(Command::SetFontName(name.to_string()));
        }
        if self.current_state.font_size != size {
            self.current_state.font_size = size;
            self.current.commands.push(Command::SetFontSize(size));
        }
    }

    pub fn clip_rect(&mut self, rect: Rect) {
        self.current.commands.push(Command::ClipRect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        });
    }

    pub fn move_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::LineTo { x, y });
    }

    pub fn curve_to(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt, x: Pt, y: Pt) {
        self.current.commands.push(Command::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    pub fn close_path(&mut self) {
        self.current.commands.push(Command::ClosePath);
    }

    pub fn fill(&mut self) {
        self.current.commands.push(Command::Fill);
    }

    pub fn stroke(&mut self) {
        self.current.commands.push(Command::Stroke);
    }

    pub fn fill_stroke(&mut self) {
        self.current.commands.push(Command::FillStroke);
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.current.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_rect(&mut self, rect: Rect) {
        self.current.commands.push(Command::DrawRect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        });
    }

    pub fn draw_image(&mut self, rect: Rect, resource_id: impl Into<String>) {
        self.current.commands.push(Command::DrawImage {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            resource_id: resource_id.into(),
        });
    }

    /// Decodes `bytes` and registers them under `resource_id`. Returns the
    /// decoded image so callers can size the placement, or `None` when the
    /// data cannot be decoded.
    pub fn register_image(&mut self, resource_id: &str, bytes: &[u8]) -> Option<&ImageAsset> {
        self.images.insert_encoded(resource_id, bytes)
    }

    /// Appends a rounded-rectangle subpath. Radii larger than half the short
    /// side are clamped; a non-positive radius yields a plain rectangle.
    pub fn rounded_rect_path(&mut self, rect: Rect, radius: Pt) {
        let Rect {
            x,
            y,
            width,
            height,
        } = rect;
        let max_r = (width / 2.0).min(height / 2.0);
        let r = radius.min(max_r);
        if r <= Pt::ZERO {
            self.move_to(x, y);
            self.line_to(x + width, y);
            self.line_to(x + width, y + height);
            self.line_to(x, y + height);
            self.close_path();
            return;
        }
        let c = r * KAPPA;
        let right = x + width;
        let bottom = y + height;

        self.move_to(x + r, y);
        self.line_to(right - r, y);
        self.curve_to(right - r + c, y, right, y + r - c, right, y + r);
        self.line_to(right, bottom - r);
        self.curve_to(right, bottom - r + c, right - r + c, bottom, right - r, bottom);
        self.line_to(x + r, bottom);
        self.curve_to(x + r - c, bottom, x, bottom - r + c, x, bottom - r);
        self.line_to(x, y + r);
        self.curve_to(x, y + r - c, x + r - c, y, x + r, y);
        self.close_path();
    }

    /// Appends a circle subpath built from four cubic arcs.
    pub fn circle_path(&mut self, cx: Pt, cy: Pt, radius: Pt) {
        let r = radius.max(Pt::ZERO);
        let c = r * KAPPA;
        self.move_to(cx + r, cy);
        self.curve_to(cx + r, cy + c, cx + c, cy + r, cx, cy + r);
        self.curve_to(cx - c, cy + r, cx - r, cy + c, cx - r, cy);
        self.curve_to(cx - r, cy - c, cx - c, cy - r, cx, cy - r);
        self.curve_to(cx + c, cy - r, cx + r, cy - c, cx + r, cy);
        self.close_path();
    }

    pub fn current_command_count(&self) -> usize {
        self.current.commands.len()
    }

    pub fn finish(self) -> Document {
        Document {
            page_size: self.page_size,
            page: self.current,
            images: self.images,
        }
    }
}
