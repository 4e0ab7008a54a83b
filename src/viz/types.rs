//! Canvas geometry and colors for the summary image.

use plotters::style::RGBColor;

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 600;

pub const HEADER_HEIGHT: i32 = 80;
pub const LEFT_MARGIN: i32 = 50;
pub const ROW_INDENT: i32 = 70;
pub const ROW_START_Y: i32 = 200;
pub const ROW_STEP: i32 = 35;
pub const FOOTER_OFFSET: i32 = 50;

pub const TITLE_FONT_PX: u32 = 32;
pub const TOTAL_FONT_PX: u32 = 24;
pub const HEADING_FONT_PX: u32 = 22;
pub const ROW_FONT_PX: u32 = 18;
pub const FOOTER_FONT_PX: u32 = 16;

/// Alice blue page.
pub const BACKGROUND: RGBColor = RGBColor(240, 248, 255);
/// Steel blue header band.
pub const HEADER: RGBColor = RGBColor(70, 130, 180);
pub const FOOTER_TEXT: RGBColor = RGBColor(100, 100, 100);

/// `strftime` pattern of the footer timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
