//! Adaptive text sizing and bounded-box text layout.
//!
//! Everything here is a pure function of its inputs and the metrics behind
//! [`TextMeasure`]: no I/O, no caches, safe to call from concurrent renders.

use crate::types::Pt;

pub const DEFAULT_MIN_FONT_SIZE: f32 = 12.0;

const ELLIPSIS: &str = "\u{2026}";

/// Width source for layout decisions. Must report the same metrics the
/// drawing pass uses for the same font name.
pub trait TextMeasure {
    fn text_width(&self, font: &str, size: Pt, text: &str) -> Pt;
}

/// Largest size in `min_size..=max_size`, stepping down by whole points, at
/// which `text` fits in `max_width`. Stops at `min_size` even if the text still
/// overflows; clipping that overflow is the caller's job. A non-finite bound
/// yields whichever bound is finite, else `min_size`.
pub fn fit_font_size(
    measure: &impl TextMeasure,
    font: &str,
    text: &str,
    max_width: Pt,
    max_size: f32,
    min_size: f32,
) -> f32 {
    if !max_size.is_finite() || !min_size.is_finite() {
        return if max_size.is_finite() { max_size } else { min_size };
    }
    if text.is_empty() || min_size >= max_size {
        return max_size;
    }
    // Count steps in integers; at large magnitudes `size - 1.0 == size`.
    let steps = (max_size - min_size).floor() as u64;
    for step in 0..=steps {
        let size = max_size - step as f32;
        if size <= min_size {
            break;
        }
        if measure.text_width(font, Pt::from_f32(size), text) <= max_width {
            return size;
        }
    }
    min_size
}

/// Shortens `text` to the longest prefix that still fits with a trailing
/// ellipsis. Text that already fits is returned unchanged.
pub fn truncate_with_ellipsis(
    measure: &impl TextMeasure,
    font: &str,
    size: Pt,
    text: &str,
    max_width: Pt,
) -> String {
    if text.is_empty() {
        return String::new();
    }
    if measure.text_width(font, size, text) <= max_width {
        return text.to_string();
    }
    if max_width <= Pt::ZERO {
        return String::new();
    }
    if measure.text_width(font, size, ELLIPSIS) >= max_width {
        return ELLIPSIS.to_string();
    }

    let mut boundaries: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
    boundaries.push(text.len());

    let mut lo = 0usize;
    let mut hi = boundaries.len() - 1;
    let mut best = 0usize;
    while lo <= hi {
        let mid = (lo + hi) / 2;
        let candidate = format!("{}{ELLIPSIS}", text[..boundaries[mid]].trim_end());
        if measure.text_width(font, size, &candidate) <= max_width {
            best = mid;
            lo = mid + 1;
        } else {
            if mid == 0 {
                break;
            }
            hi = mid - 1;
        }
    }

    format!("{}{ELLIPSIS}", text[..boundaries[best]].trim_end())
}

/// Greedy word wrap. Explicit newlines start a new line; a single word wider
/// than `max_width` occupies its own line unbroken.
pub fn wrap_lines(
    measure: &impl TextMeasure,
    font: &str,
    size: Pt,
    text: &str,
    max_width: Pt,
) -> Vec<String> {
    let space_width = measure.text_width(font, size, " ");
    let mut lines = Vec::new();
    for segment in text.split('\n') {
        let mut current = String::new();
        let mut current_width = Pt::ZERO;
        for word in segment.split_whitespace() {
            let word_width = measure.text_width(font, size, word);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_width;
                continue;
            }
            let next_width = current_width + space_width + word_width;
            if next_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width = next_width;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_width;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Wrapped lines that fit in a box of `max_width` x `max_height`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxedText {
    pub lines: Vec<String>,
    pub truncated: bool,
}

/// Wraps `text` into at most `floor(max_height / line_height)` lines. When the
/// text needs more, the last visible line carries the remaining words and is
/// cut with an ellipsis, so the box never grows.
pub fn fit_lines_in_box(
    measure: &impl TextMeasure,
    font: &str,
    size: Pt,
    line_height: Pt,
    text: &str,
    max_width: Pt,
    max_height: Pt,
) -> BoxedText {
    let mut lines = wrap_lines(measure, font, size, text, max_width);
    let capacity = if line_height <= Pt::ZERO {
        0
    } else {
        (max_height.to_f32() / line_height.to_f32()).floor().max(0.0) as usize
    };

    let overflowing = lines.len() > capacity
        || lines
            .iter()
            .take(capacity)
            .any(|line| measure.text_width(font, size, line) > max_width);
    if !overflowing {
        return BoxedText {
            lines,
            truncated: false,
        };
    }
    if capacity == 0 {
        return BoxedText {
            lines: Vec::new(),
            truncated: true,
        };
    }

    let rest = lines.split_off(capacity - 1).join(" ");
    lines = lines
        .into_iter()
        .map(|line| truncate_with_ellipsis(measure, font, size, &line, max_width))
        .collect();
    let mut last = truncate_with_ellipsis(measure, font, size, &rest, max_width);
    if !last.ends_with(ELLIPSIS) {
        // The tail fit on one line only because earlier lines were over-wide.
        last = format!("{}{ELLIPSIS}", last.trim_end());
        if measure.text_width(font, size, &last) > max_width {
            let trimmed: String = {
                let mut chars: Vec<char> = last.chars().collect();
                chars.truncate(chars.len().saturating_sub(2));
                chars.into_iter().collect()
            };
            last = truncate_with_ellipsis(measure, font, size, &trimmed, max_width);
            if !last.ends_with(ELLIPSIS) {
                last = format!("{}{ELLIPSIS}", last.trim_end());
            }
        }
    }
    lines.push(last);
    BoxedText {
        lines,
        truncated: true,
    }
}
