use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER: &str = "-";

/// Short numeric date layout used for every date printed on the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `M/D/YYYY`
    #[default]
    Us,
    /// `D/M/YYYY`
    Gb,
    /// `YYYY-MM-DD`
    Iso,
}

impl DateStyle {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "us" | "en-us" => Some(DateStyle::Us),
            "gb" | "uk" | "en-gb" => Some(DateStyle::Gb),
            "iso" => Some(DateStyle::Iso),
            _ => None,
        }
    }
}

pub fn format_date(date: Option<NaiveDate>, style: DateStyle) -> String {
    let Some(date) = date else {
        return PLACEHOLDER.to_string();
    };
    match style {
        DateStyle::Us => format!("{}/{}/{}", date.month(), date.day(), date.year()),
        DateStyle::Gb => format!("{}/{}/{}", date.day(), date.month(), date.year()),
        DateStyle::Iso => date.format("%Y-%m-%d").to_string(),
    }
}

/// `"<start> to <end>"`, with `-` standing in for either missing end.
pub fn format_duration(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    style: DateStyle,
) -> String {
    format!(
        "{} to {}",
        format_date(start, style),
        format_date(end, style)
    )
}

/// Date plus 12-hour clock time, e.g. `3/2/2024, 4:05:09 PM`.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>, style: DateStyle) -> String {
    let date = format_date(Some(at.date_naive()), style);
    if style == DateStyle::Iso {
        return format!(
            "{date} {:02}:{:02}:{:02}",
            at.hour(),
            at.minute(),
            at.second()
        );
    }
    let (is_pm, hour) = at.hour12();
    format!(
        "{date}, {hour}:{:02}:{:02} {}",
        at.minute(),
        at.second(),
        if is_pm { "PM" } else { "AM" }
    )
}

/// Trimmed text, or the placeholder when the value is absent or blank.
pub fn or_placeholder(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}
