//! Text content of the summary image, plus width heuristics to keep it on canvas.

use super::types::{CANVAS_WIDTH, ROW_FONT_PX, ROW_INDENT, TIMESTAMP_FORMAT};
use crate::models::RankedCountry;
use chrono::{DateTime, Utc};

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Truncate to fit `max_px` and add a single ellipsis if needed.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        let candidate = format!("{out}{ch}…");
        if estimate_text_width_px(&candidate, font_px) > max_px {
            break;
        }
        out.push(ch);
    }
    if out.is_empty() {
        return "…".to_string();
    }
    out.push('…');
    out
}

/// Every string drawn on the summary image.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryText {
    pub title: String,
    pub total_line: String,
    pub heading: String,
    pub rows: Vec<String>,
    pub footer: String,
}

/// `"{rank}. {name} - ${gdp}"` with the name shortened so the GDP stays visible.
pub fn format_row(entry: &RankedCountry, max_px: u32) -> String {
    let prefix = format!("{}. ", entry.rank);
    let suffix = format!(" - ${:.2}", entry.estimated_gdp);
    let fixed = estimate_text_width_px(&prefix, ROW_FONT_PX)
        + estimate_text_width_px(&suffix, ROW_FONT_PX);
    let name = truncate_to_width(&entry.name, ROW_FONT_PX, max_px.saturating_sub(fixed));
    format!("{prefix}{name}{suffix}")
}

pub fn summary_text(
    total_countries: usize,
    top: &[RankedCountry],
    refreshed_at: DateTime<Utc>,
) -> SummaryText {
    let max_row_px = CANVAS_WIDTH.saturating_sub(2 * ROW_INDENT as u32);
    let rows = if top.is_empty() {
        vec!["No estimated GDP available".to_string()]
    } else {
        top.iter().map(|e| format_row(e, max_row_px)).collect()
    };
    SummaryText {
        title: "Country Data Summary".to_string(),
        total_line: format!("Total Countries: {total_countries}"),
        heading: format!("Top {} Countries by Estimated GDP:", crate::stats::TOP_N),
        rows,
        footer: format!("Last Refreshed: {}", refreshed_at.format(TIMESTAMP_FORMAT)),
    }
}
