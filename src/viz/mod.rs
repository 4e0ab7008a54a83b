//! Summary image: an 800×600 PNG with the country count, the top-5 ranking by
//! estimated GDP and the refresh timestamp.
//!
//! Drawing goes through Plotters' bitmap backend into an in-memory RGB buffer,
//! which is then PNG-encoded and handed to an [`ArtifactStore`]. The exact pixel
//! layout is not a contract; the text content is.

pub mod text;
pub mod types;

pub use text::{SummaryText, summary_text};

use crate::artifact::ArtifactStore;
use crate::error::{Error, Result};
use crate::models::RankedCountry;
use chrono::{DateTime, Utc};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use log::{debug, info};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use plotters_bitmap::BitMapBackend;
use std::sync::{Arc, Once};
use types::*;

/// Produces the summary artifact after a refresh.
pub trait SummaryRenderer: Send + Sync {
    fn render(
        &self,
        total_countries: usize,
        top: &[RankedCountry],
        refreshed_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// One-time registration of the bundled fonts for the `ab_glyph` text path.
/// Required because `ab_glyph` doesn't discover OS fonts.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let _ = plotters::style::register_font(
            "sans-serif",
            FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
        let _ = plotters::style::register_font(
            "sans-serif",
            FontStyle::Bold,
            include_bytes!("../../assets/DejaVuSans-Bold.ttf"),
        );
        let _ = plotters::style::register_font(
            "sans-serif",
            FontStyle::Italic,
            include_bytes!("../../assets/DejaVuSans-Oblique.ttf"),
        );
    });
}

fn draw_err<E: std::fmt::Debug>(e: E) -> Error {
    Error::RenderFailure(format!("{e:?}"))
}

/// Draw the summary onto any Plotters drawing area.
pub fn draw_summary<DB>(root: &DrawingArea<DB, Shift>, content: &SummaryText) -> Result<()>
where
    DB: DrawingBackend,
{
    let (w, h) = root.dim_in_pixel();
    let (w, h) = (w as i32, h as i32);

    root.fill(&BACKGROUND).map_err(draw_err)?;
    root.draw(&Rectangle::new([(0, 0), (w, HEADER_HEIGHT)], HEADER.filled()))
        .map_err(draw_err)?;

    let title = ("sans-serif", TITLE_FONT_PX, FontStyle::Bold)
        .into_font()
        .color(&WHITE);
    root.draw(&Text::new(content.title.as_str(), (LEFT_MARGIN, 22), title))
        .map_err(draw_err)?;

    let total = ("sans-serif", TOTAL_FONT_PX, FontStyle::Bold)
        .into_font()
        .color(&BLACK);
    root.draw(&Text::new(content.total_line.as_str(), (LEFT_MARGIN, 105), total))
        .map_err(draw_err)?;

    let heading = ("sans-serif", HEADING_FONT_PX, FontStyle::Bold)
        .into_font()
        .color(&BLACK);
    root.draw(&Text::new(content.heading.as_str(), (LEFT_MARGIN, 155), heading))
        .map_err(draw_err)?;

    let row_style = ("sans-serif", ROW_FONT_PX).into_font().color(&BLACK);
    for (i, row) in content.rows.iter().enumerate() {
        let y = ROW_START_Y + i as i32 * ROW_STEP;
        root.draw(&Text::new(row.as_str(), (ROW_INDENT, y), row_style.clone()))
            .map_err(draw_err)?;
    }

    let footer = ("sans-serif", FOOTER_FONT_PX, FontStyle::Italic)
        .into_font()
        .color(&FOOTER_TEXT);
    root.draw(&Text::new(
        content.footer.as_str(),
        (LEFT_MARGIN, h - FOOTER_OFFSET),
        footer,
    ))
    .map_err(draw_err)?;

    Ok(())
}

/// Render the summary and return PNG bytes.
pub fn render_png(
    total_countries: usize,
    top: &[RankedCountry],
    refreshed_at: DateTime<Utc>,
) -> Result<Vec<u8>> {
    ensure_fonts_registered();
    let content = summary_text(total_countries, top, refreshed_at);

    let mut rgb = vec![0u8; (CANVAS_WIDTH * CANVAS_HEIGHT * 3) as usize];
    {
        let root =
            BitMapBackend::with_buffer(&mut rgb, (CANVAS_WIDTH, CANVAS_HEIGHT)).into_drawing_area();
        draw_summary(&root, &content)?;
        root.present().map_err(draw_err)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&rgb, CANVAS_WIDTH, CANVAS_HEIGHT, ColorType::Rgb8)
        .map_err(|e| Error::RenderFailure(format!("png encode: {e}")))?;
    debug!("encoded summary image ({} bytes)", png.len());
    Ok(png)
}

/// Renders PNG summaries into an artifact store.
#[derive(Clone)]
pub struct PngSummaryRenderer {
    artifacts: Arc<dyn ArtifactStore>,
}

impl PngSummaryRenderer {
    pub fn new(artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { artifacts }
    }
}

impl SummaryRenderer for PngSummaryRenderer {
    fn render(
        &self,
        total_countries: usize,
        top: &[RankedCountry],
        refreshed_at: DateTime<Utc>,
    ) -> Result<()> {
        let png = render_png(total_countries, top, refreshed_at)?;
        self.artifacts
            .write(&png)
            .map_err(|e| Error::RenderFailure(format!("write summary image: {e}")))?;
        info!("summary image written ({} countries ranked)", top.len());
        Ok(())
    }
}
